//! Integration tests for resolving the trace target from the repository

use lab_trace::commands::resolve_target;
use lab_trace::error::{GitError, LabError};

mod common;

use common::FakeRepo;

fn repo() -> FakeRepo {
    FakeRepo::on_branch("main")
        .with_remote("origin", "git@gitlab.com:team/app.git")
        .with_remote("fork", "https://gitlab.com/me/app.git")
}

#[test]
fn test_defaults_to_current_branch_and_origin() {
    let target = resolve_target(&repo(), None, None).unwrap();

    assert_eq!(target.remote, "origin");
    assert_eq!(target.project_path, "team/app");
    assert_eq!(target.job_ref.branch, "main");
    assert_eq!(target.job_ref.job_name, "");
}

#[test]
fn test_explicit_remote_and_job() {
    let target = resolve_target(&repo(), Some("fork"), Some("build")).unwrap();

    assert_eq!(target.remote, "fork");
    assert_eq!(target.project_path, "me/app");
    assert_eq!(target.job_ref.branch, "main");
    assert_eq!(target.job_ref.job_name, "build");
}

#[test]
fn test_branch_override() {
    let target = resolve_target(&repo(), Some("origin"), Some("feature:build")).unwrap();

    assert_eq!(target.job_ref.branch, "feature");
    assert_eq!(target.job_ref.job_name, "build");
}

#[test]
fn test_unknown_remote_rejected() {
    let result = resolve_target(&repo(), Some("upstream"), None);

    match result {
        Err(LabError::NotARemote { name }) => assert_eq!(name, "upstream"),
        other => panic!("Expected NotARemote, got {:?}", other),
    }
}

#[test]
fn test_push_remote_of_overridden_branch() {
    let repo = repo().with_config("branch.feature.pushRemote", "fork");

    let target = resolve_target(&repo, None, Some("feature:lint")).unwrap();
    assert_eq!(target.remote, "fork");
    assert_eq!(target.project_path, "me/app");

    let target = resolve_target(&repo, None, Some("lint")).unwrap();
    assert_eq!(target.remote, "origin");
}

#[test]
fn test_detached_head_fails() {
    let repo = FakeRepo::detached().with_remote("origin", "git@gitlab.com:team/app.git");

    let result = resolve_target(&repo, None, Some("feature:build"));
    assert!(matches!(result, Err(LabError::Git(GitError::DetachedHead))));
}

#[test]
fn test_unparseable_remote_url() {
    let repo = FakeRepo::on_branch("main").with_remote("origin", "/srv/git/app");

    let result = resolve_target(&repo, None, None);
    assert!(matches!(
        result,
        Err(LabError::Git(GitError::UnsupportedRemoteUrl(_)))
    ));
}
