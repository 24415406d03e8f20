//! Serves the two-audience filter menu.
//!
//! Run with: cargo run -- --presets presets/demo.json
//! Then open http://127.0.0.1:3000 in your browser

use std::path::PathBuf;

use anyhow::{Context, Result};
use audience_filters::{Catalog, RouterConfig, start_server};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Two-audience filter menu server")]
struct Args {
    /// Address to listen on
    #[arg(long, env = "AUDIENCE_FILTERS_LISTEN", default_value = "127.0.0.1:3000")]
    listen: String,
    /// Preset blob (JSON). Defaults to the bundled demo presets.
    #[arg(long, env = "AUDIENCE_FILTERS_PRESETS")]
    presets: Option<PathBuf>,
    /// Directory holding webui.js and webui.css
    #[arg(long, env = "AUDIENCE_FILTERS_STATIC_DIR", default_value = "static")]
    static_dir: String,
    /// Page title
    #[arg(long, env = "AUDIENCE_FILTERS_TITLE", default_value = "Audience Filters")]
    title: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let catalog = match &args.presets {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("loading presets from {}", path.display()))?,
        None => {
            info!("no preset file given, using the demo presets");
            Catalog::demo()
        }
    };

    let config = RouterConfig::new(catalog)
        .title(args.title)
        .static_dir(args.static_dir);

    start_server(config, &args.listen)
        .await
        .with_context(|| format!("serving on {}", args.listen))
}
