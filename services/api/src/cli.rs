use crate::demo::{run_demo, run_steps, DemoArgs, StepsArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tutor_intake::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Tutor Intake",
    about = "Run and demonstrate the student and teacher registration service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the step definitions of a registration form
    Steps(StepsArgs),
    /// Walk a student and a teacher through their forms end to end
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Category CSV export used instead of APP_CATALOG_CSV
    #[arg(long)]
    pub(crate) catalog_csv: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Steps(args) => run_steps(args),
        Command::Demo(args) => run_demo(args),
    }
}
