//! This server publishes the "Guys Having Coffee" meetup as an iCalendar feed.
//!
//! - `/calendar` is the recurring feed, `?exclude=<rule id>` leaves rules out,
//! - `/calendar/next` downloads the next meetup,
//! - `/next` describes the next meetup as JSON.

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use ghc_core::config::MeetupConfig;
use log::info;
use tower_http::services::ServeDir;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

mod route;
mod state;

#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Arguments {
    /// the port to listen on
    #[arg(long, default_value_t = 8008)]
    pub port: u16,
    /// the TOML configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// the URL or file of the cancellation list, overriding the configuration
    #[arg(long)]
    pub cancellations: Option<String>,
    /// a directory of static files served for all other paths
    #[arg(long)]
    pub static_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Arguments::parse();
    let config = match &args.config {
        Some(path) => MeetupConfig::load(path)
            .with_context(|| format!("could not load configuration {}", path.display()))?,
        None => MeetupConfig::default(),
    };
    let state = AppState::new(config, args.cancellations.as_deref())?;
    let mut app = Router::new()
        .route("/calendar", get(route::calendar::handler))
        .route("/calendar/next", get(route::calendar::next::handler))
        .route("/next", get(route::next::handler));
    if let Some(static_dir) = &args.static_dir {
        info!("serving static files from {}", static_dir.display());
        app = app.fallback_service(ServeDir::new(static_dir));
    }
    let app = app.with_state(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    info!("listening on http://{addr}");
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use clap::Parser;

    use crate::Arguments;

    #[test]
    fn test_arguments() {
        let args = Arguments::try_parse_from(["ghc_server"]).unwrap();
        assert_eq!(args.port, 8008);
        assert_eq!(args.static_dir, None);
        let args = Arguments::try_parse_from([
            "ghc_server",
            "--port",
            "3000",
            "--static-dir",
            "public",
            "--cancellations",
            "public/cancellations.txt",
        ])
        .unwrap();
        assert_eq!(args.port, 3000);
        assert_eq!(args.static_dir, Some(PathBuf::from("public")));
        assert_eq!(
            args.cancellations.as_deref(),
            Some("public/cancellations.txt")
        );
    }
}
