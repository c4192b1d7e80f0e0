use crate::prelude::{println, *};
use chrono::{SecondsFormat, Utc};

use crate::client::Clients;

pub mod detail;
pub mod list;

// Re-export public data functions
pub use detail::{detail_data, first_day_data, grey_data, placing_data};
pub use list::{list_data, overview_data, search_data};

#[derive(Debug, clap::Parser)]
#[command(name = "ipo")]
#[command(about = "Hong Kong IPO lookups")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List IPOs currently open for subscription
    #[clap(name = "list")]
    List(list::ListOptions),

    /// Show the full detail of a listing
    #[clap(name = "detail")]
    Detail(detail::CodeOptions),

    /// Show the grey-market quote of a listing
    #[clap(name = "grey")]
    Grey(detail::CodeOptions),

    /// Show the placing (allocation) result of a listing
    #[clap(name = "placing")]
    Placing(detail::CodeOptions),

    /// Show the first trading day performance of a listing
    #[clap(name = "first-day")]
    FirstDay(detail::CodeOptions),

    /// Search active IPOs by company name
    #[clap(name = "search")]
    Search(list::SearchOptions),

    /// Aggregate statistics over the active IPOs
    #[clap(name = "overview")]
    Overview(list::OverviewOptions),
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let clients = Clients::from_config(&global.upstream)?;

    if global.verbose {
        for client in [&clients.aipo, &clients.jyb] {
            println!("{} host: {}", client.name(), client.base_url());
        }
        println!();
    }

    match app.command {
        Commands::List(options) => list::run_list(options, &clients).await,
        Commands::Detail(options) => detail::run_detail(options, &clients).await,
        Commands::Grey(options) => detail::run_grey(options, &clients).await,
        Commands::Placing(options) => detail::run_placing(options, &clients).await,
        Commands::FirstDay(options) => detail::run_first_day(options, &clients).await,
        Commands::Search(options) => list::run_search(options, &clients).await,
        Commands::Overview(options) => list::run_overview(options, &clients).await,
    }
}

/// Current time as an RFC 3339 UTC timestamp with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| eyre!("JSON serialization failed: {}", e))?;
    println!("{json}");
    Ok(())
}

/// `-` for empty cells so table columns stay aligned
pub(crate) fn cell(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::client::Clients;
    use crate::config::UpstreamConfig;

    /// Serve `router` on a free local port and point both hosts at it
    pub(crate) async fn serve(router: axum::Router) -> Clients {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = UpstreamConfig {
            aipo_base_url: base_url.clone(),
            jyb_base_url: base_url,
            user_agent: "test".to_string(),
            token: None,
            timeout_secs: 5,
            rate_limit: 100,
            rate_limit_window: 3600,
        };
        Clients::from_config(&config).unwrap()
    }
}
