//! tutorhq CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod store;

#[derive(Parser)]
#[command(
    name = "tutorhq",
    version,
    about = "Tutoring HQ: scheduled lessons, quizzes and candy rewards"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Catalog file or directory (overrides config)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Data directory for student snapshots (overrides config)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Act as this student instead of the device's own id
    #[arg(long, global = true)]
    student: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create starter config, sample catalog and demo students
    Init,

    /// Validate catalog TOML files
    Validate,

    /// Show lessons, tests and progress for the current student
    Status {
        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Record a finished test run with a final score
    Submit {
        /// Test id
        #[arg(long)]
        test: String,

        /// Correctly answered questions
        #[arg(long)]
        score: u32,

        /// Questions in the run (default: the test's question count)
        #[arg(long)]
        max_score: Option<u32>,
    },

    /// Take a test by giving the chosen option for every question
    Quiz {
        /// Test id
        #[arg(long)]
        test: String,

        /// Zero-based option indexes, comma-separated (e.g. "0,2,1")
        #[arg(long)]
        answers: String,
    },

    /// Set the display nickname
    Nickname {
        /// New nickname (e.g. "Ira_9A")
        name: String,
    },

    /// Clear the current student's progress
    Reset {
        /// Keep the nickname
        #[arg(long)]
        keep_nickname: bool,
    },

    /// Show every student (requires the admin code)
    Admin {
        /// Admin code
        #[arg(long)]
        code: String,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("tutorhq=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let overrides = commands::Overrides {
        config: cli.config,
        catalog: cli.catalog,
        data_dir: cli.data_dir,
        student: cli.student,
    };

    let result = match cli.command {
        Commands::Init => commands::init::execute(&overrides),
        Commands::Validate => commands::validate::execute(&overrides),
        Commands::Status { format } => commands::status::execute(&overrides, format).await,
        Commands::Submit {
            test,
            score,
            max_score,
        } => commands::submit::execute(&overrides, test, score, max_score).await,
        Commands::Quiz { test, answers } => {
            commands::quiz::execute(&overrides, test, answers).await
        }
        Commands::Nickname { name } => commands::profile::nickname(&overrides, name).await,
        Commands::Reset { keep_nickname } => {
            commands::profile::reset(&overrides, keep_nickname).await
        }
        Commands::Admin { code, format } => {
            commands::admin::execute(&overrides, code, format).await
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
