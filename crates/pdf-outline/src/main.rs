use crate::prelude::*;
use clap::Parser;

mod batch;
mod config;
mod error;
mod extract;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract a document title and an H1-H3 outline from PDF files as JSON"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PDF_OUTLINE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Write one outline JSON file per PDF in a directory
    Batch(crate::batch::BatchOptions),

    /// Print the outline of a single PDF to stdout
    Extract(crate::extract::ExtractOptions),
}

fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Batch(options) => crate::batch::run(options, app.global),
        SubCommands::Extract(options) => crate::extract::run(options, app.global),
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
