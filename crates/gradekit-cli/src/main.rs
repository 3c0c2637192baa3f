//! gradekit CLI: grade exam submissions from the command line.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gradekit", version, about = "Exam submission grading engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a submission file or a directory of submissions
    Grade {
        /// Answer key JSON
        #[arg(long)]
        answer_key: PathBuf,

        /// Submission JSON file, or a directory of them
        #[arg(long)]
        submission: PathBuf,

        /// Evaluation mode: standard or enhanced (default from config)
        #[arg(long)]
        mode: Option<String>,

        /// Judge to use for enhanced mode (default from config)
        #[arg(long)]
        judge: Option<String>,

        /// Judge model override
        #[arg(long)]
        model: Option<String>,

        /// Max submissions graded at once (default from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Output directory (default from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: table, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Compare two grading results
    Compare {
        /// Baseline result JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current result JSON
        #[arg(long)]
        current: PathBuf,

        /// Mark changes at or below this size are ignored
        #[arg(long, default_value = "0.01")]
        threshold: f64,

        /// Exit code 1 if any marks changed
        #[arg(long)]
        fail_on_change: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Check an answer key for problems
    Validate {
        /// Answer key JSON
        #[arg(long)]
        answer_key: PathBuf,
    },

    /// Create a starter config and sample answer key and submission
    Init,
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "gradekit=info".parse::<tracing_subscriber::filter::Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Grade {
            answer_key,
            submission,
            mode,
            judge,
            model,
            parallelism,
            output,
            format,
            config,
        } => {
            commands::grade::execute(commands::grade::GradeArgs {
                answer_key,
                submission,
                mode,
                judge,
                model,
                parallelism,
                output,
                format,
                config,
            })
            .await
        }
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_change,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_change, format),
        Commands::Validate { answer_key } => commands::validate::execute(answer_key),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
