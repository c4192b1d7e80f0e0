use crate::prelude::*;
use clap::Parser;

mod client;
mod config;
mod error;
mod ipo;
mod mcp;
mod prelude;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Hong Kong IPO listings, details, grey-market quotes and placing results"
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
    #[clap(long, env = "HKIPO_VERBOSE", global = true, default_value = "false")]
    verbose: bool,

    #[clap(flatten)]
    upstream: config::UpstreamConfig,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Hong Kong IPO lookups
    IPO(crate::ipo::App),

    /// Model Context Protocol server
    MCP(crate::mcp::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let app = App::parse();

    // Logs go to stderr so stdout stays clean for the stdio transport
    let default_filter = if app.global.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match app.command {
        SubCommands::IPO(sub_app) => crate::ipo::run(sub_app, app.global).await,
        SubCommands::MCP(sub_app) => crate::mcp::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
