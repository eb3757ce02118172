mod commands;
mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "crosstab",
    version,
    about = "Rebuild per-teacher cross-tab reports from survey exports"
)]
struct Cli {
    /// Log each heading, table and value decision
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a survey export (DOCX, PDF or TXT) into a cross-tab DOCX report
    Convert {
        /// Path to a .docx, .pdf or .txt file
        input_file: PathBuf,

        /// Write the report to this exact path
        #[arg(short = 'O', long = "out", value_name = "FILE", conflicts_with = "out_dir")]
        out: Option<PathBuf>,

        /// Directory for a uniquely named report (default: current directory)
        #[arg(long, value_name = "DIR")]
        out_dir: Option<PathBuf>,

        /// Custom JSON rule file (default: built-in preset)
        #[arg(short, long, value_name = "FILE")]
        rules: Option<PathBuf>,

        /// PNG or JPEG image placed above the banner
        #[arg(long, value_name = "FILE")]
        banner_image: Option<PathBuf>,
    },
    /// Parse a survey export without rendering a report
    Parse {
        /// Path to a .docx, .pdf or .txt file
        input_file: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the parsed conversion to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,

        /// Custom JSON rule file (default: built-in preset)
        #[arg(short, long, value_name = "FILE")]
        rules: Option<PathBuf>,
    },
    /// Inspect and validate rule sets
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List built-in rule sets
    List,
    /// Print a built-in rule set as JSON
    Show {
        /// Preset name (e.g., "default")
        preset: String,
    },
    /// Validate a custom rule file
    Validate {
        /// Path to JSON rule file
        file: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "crosstab=debug" } else { "crosstab=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Convert {
            input_file,
            out,
            out_dir,
            rules,
            banner_image,
        } => commands::convert::run(input_file, out, out_dir, rules, banner_image),
        Commands::Parse {
            input_file,
            output,
            out,
            rules,
        } => commands::parse::run(input_file, &output, out, rules),
        Commands::Rules { action } => match action {
            RulesAction::List => commands::rules::list(),
            RulesAction::Show { preset } => commands::rules::show(&preset),
            RulesAction::Validate { file } => commands::rules::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
