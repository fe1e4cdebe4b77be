use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "dcsplit",
    about = "dcsplit: static partitioning of placement instances",
    version,
    propagate_version = true,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split an instance into partitions and report them.
    ///
    /// Partitioning options come from --config when given, otherwise from
    /// the defaults printed by `dcsplit scaffold`. --size, --random and
    /// --seed override the file.
    Split {
        /// Instance file (JSON)
        #[arg(short, long)]
        instance: PathBuf,
        /// Scheduler configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Switch to fixed-size partitioning with this many nodes per partition
        #[arg(short, long)]
        size: Option<usize>,
        /// Shuffle nodes before grouping them (fixed-size only)
        #[arg(long)]
        random: bool,
        /// Seed for the random grouping
        #[arg(long)]
        seed: Option<u64>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Generate a dcsplit.toml with the default settings
    Scaffold {
        /// Write to this file instead of standard output
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,dcsplit=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Split {
            instance,
            config,
            size,
            random,
            seed,
            format,
        } => {
            let opts = commands::split::SplitOptions {
                config,
                size,
                random,
                seed,
            };
            commands::split::split(&instance, &opts, &format)
        }
        Commands::Scaffold { output } => commands::scaffold::scaffold(output.as_deref()),
    }
}
