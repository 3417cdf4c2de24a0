use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use lab_trace::commands::{trace_job, TraceOptions};

/// lab - GitLab from the command line
#[derive(Parser)]
#[command(name = "lab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with GitLab CI pipelines and jobs
    Ci {
        #[command(subcommand)]
        command: CiCommands,
    },
}

#[derive(Subcommand)]
enum CiCommands {
    /// Trace the output of a ci job
    ///
    /// If a job is not specified the latest running job or last job in the pipeline is used
    #[command(visible_alias = "logs")]
    Trace {
        /// Remote to find the project from
        remote: Option<String>,

        /// Job to trace, as `job` or `branch:job`
        #[arg(value_name = "[BRANCH:]JOB")]
        job: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for the job log
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Ci { command } => match command {
            CiCommands::Trace { remote, job } => match std::env::current_dir() {
                Ok(project_root) => trace_job(&project_root, TraceOptions { remote, job }).await,
                Err(e) => Err(e.into()),
            },
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
