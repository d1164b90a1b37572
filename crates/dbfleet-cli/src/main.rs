mod cmd;

use clap::{Args, Parser, Subcommand};
use dbfleet_core::target::OperationKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "dbfleet",
    about = "Run schema-migration operations across a fleet of databases",
    version,
    propagate_version = true
)]
struct Cli {
    /// Fleet configuration file
    #[arg(long, global = true, env = "DBFLEET_CONFIG", default_value = "dbfleet.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct OperationArgs {
    /// Suffix used to derive each database's changelog file name
    /// (e.g. -c release-42 -> <name>_changelog_release-42.yaml)
    #[arg(short = 'c', long)]
    changelog_suffix: String,

    /// Databases to operate on ("all" runs every configured database)
    #[arg(short = 'd', long = "databases", num_args = 1.., default_value = "all")]
    databases: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Report pending changesets for each database
    Status {
        #[command(flatten)]
        args: OperationArgs,
    },

    /// Apply pending changesets to each database. This modifies databases!
    Apply {
        #[command(flatten)]
        args: OperationArgs,
    },

    /// Write a changelog of differences against the reference database
    Diff {
        #[command(flatten)]
        args: OperationArgs,
    },

    /// Validate each database's changelog
    Validate {
        #[command(flatten)]
        args: OperationArgs,
    },
}

impl Commands {
    fn into_parts(self) -> (OperationKind, OperationArgs) {
        match self {
            Commands::Status { args } => (OperationKind::Status, args),
            Commands::Apply { args } => (OperationKind::Apply, args),
            Commands::Diff { args } => (OperationKind::Diff, args),
            Commands::Validate { args } => (OperationKind::Validate, args),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let config = cli.config;
    let (kind, args) = cli.command.into_parts();
    let result = cmd::migrate::run(&config, kind, &args.databases, &args.changelog_suffix);

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
