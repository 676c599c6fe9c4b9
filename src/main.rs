use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

use page_mirror::config::AppConfig;
use page_mirror::{mirror_page, Fetcher, FetcherConfig, MirrorError, MirrorResult};

const EXIT_FS_ACCESS: u8 = 2;
const EXIT_RESOURCE_ACCESS: u8 = 3;

#[derive(Parser)]
#[command(name = "page-mirror")]
#[command(about = "Download a web page and its assets for offline use")]
#[command(version)]
struct Cli {
    /// Page URL to mirror
    url: String,

    /// Directory to save the page into
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Path to configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for the saved page path
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting page-mirror v{}", env!("CARGO_PKG_VERSION"));

    match run(cli).await {
        Ok(result) => {
            println!("{}", result.filepath.display());
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("page-mirror: {:#}", error);
            match error.downcast_ref::<MirrorError>() {
                Some(MirrorError::FsAccess { .. }) => ExitCode::from(EXIT_FS_ACCESS),
                Some(MirrorError::ResourceAccess { .. }) => ExitCode::from(EXIT_RESOURCE_ACCESS),
                None => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(cli: Cli) -> Result<MirrorResult> {
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => AppConfig::default(),
    };

    let page_url = Url::parse(&cli.url).with_context(|| format!("Invalid URL: {}", cli.url))?;

    let fetcher = Fetcher::new(FetcherConfig {
        timeout: Duration::from_secs(config.fetch.timeout_seconds),
        user_agent: config.fetch.user_agent,
    })
    .context("Failed to create fetcher")?;

    Ok(mirror_page(&fetcher, &page_url, &cli.output).await?)
}
