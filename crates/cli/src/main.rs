mod render;
mod shell;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use ward_core::{CoreConfig, Hospital};

/// Which desk the operator is working from. Billing and inventory are
/// restricted to the admin role; this is console policy, the domain core
/// takes no role parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Role {
    Doctor,
    Admin,
}

#[derive(Parser)]
#[command(name = "ward")]
#[command(about = "Hospital administration console")]
struct Cli {
    /// Role to run the console as
    #[arg(long, value_enum, default_value = "doctor")]
    role: Role,

    /// Log filter, e.g. "info" or "ward_core=debug"
    #[arg(long)]
    log: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive shell (the default)
    Shell,
    /// Replay a scripted tour of the main workflows
    Demo,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = cli.log.as_deref().unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let hospital = Hospital::with_defaults(&CoreConfig::default());

    match cli.command {
        Some(Commands::Demo) => shell::demo(&hospital),
        Some(Commands::Shell) | None => shell::run(&hospital, cli.role),
    }
}
