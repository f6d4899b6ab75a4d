mod config;
mod crawler;
mod model;
mod normalizer;
mod parser;
mod storage;
mod summarizer;
mod utils;

use config::{AppConfig, SiteConfig, config_path, load_config};
use crawler::{Delivery, Orchestrator, PageTimeouts, RemoteSessionFactory, deliver};
use parser::adapter_for;
use std::sync::Arc;
use std::time::Duration;
use storage::{JsonFileSink, ResultSink, SqliteSink};
use summarizer::{OllamaSummarizer, summarize_offers};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging; RUST_LOG overrides the default filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("job_sniper=info")),
        )
        .init();

    // Set panic hook to log details about any panic
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic occurred: {}", panic_info);
    }));

    let path = config_path();
    let config = match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Config load error ({}): {}", path, e);
            return;
        }
    };

    let factory =
        match RemoteSessionFactory::new(&config.render_service_url, config.request_timeout()) {
            Ok(f) => Arc::new(f),
            Err(e) => {
                error!("Failed to create rendering client: {}", e);
                return;
            }
        };
    let orchestrator = Orchestrator::new(
        factory,
        PageTimeouts {
            overview: config.overview_timeout(),
            detail: config.detail_timeout(),
        },
    );

    let summarizer = config.summarizer.as_ref().and_then(|cfg| {
        let timeout = Duration::from_secs(cfg.timeout_secs);
        match OllamaSummarizer::new(&cfg.endpoint, &cfg.model, timeout) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Summaries disabled: {}", e);
                None
            }
        }
    });

    let sinks = build_sinks(&config);

    for site in &config.sites {
        process_site(site, &config, &orchestrator, summarizer.as_ref(), &sinks).await;
    }

    info!("All sites processed.");
}

fn build_sinks(config: &AppConfig) -> Vec<Box<dyn ResultSink>> {
    let mut sinks: Vec<Box<dyn ResultSink>> = vec![Box::new(JsonFileSink::new(&config.output_dir))];

    if let Some(path) = &config.sqlite_path {
        match SqliteSink::new(path) {
            Ok(sink) => sinks.push(Box::new(sink)),
            Err(e) => warn!("SQLite sink disabled ({}): {}", path, e),
        }
    }

    sinks
}

/// Crawls one site, then summarizes and stores what it found.
async fn process_site(
    site: &SiteConfig,
    config: &AppConfig,
    orchestrator: &Orchestrator,
    summarizer: Option<&OllamaSummarizer>,
    sinks: &[Box<dyn ResultSink>],
) {
    let Some(adapter) = adapter_for(&site.name, config.number_extraction) else {
        error!("No adapter for site {}", site.name);
        return;
    };

    let base_url = site.base_url.as_deref().unwrap_or(adapter.base_url()).to_string();
    let url_pattern = site
        .url_pattern
        .as_deref()
        .unwrap_or(adapter.url_pattern())
        .to_string();

    info!("Processing site: {}", site.name);
    let mut run = match orchestrator
        .run(
            adapter,
            &base_url,
            &url_pattern,
            site.max_pages,
            config.max_concurrency,
        )
        .await
    {
        Ok(run) => run,
        Err(e) => {
            error!("[{}] Run aborted: {}", site.name, e);
            return;
        }
    };

    if let Some(summarizer) = summarizer {
        summarize_offers(&mut run.offers, summarizer).await;
    }

    for sink in sinks {
        match deliver(&run, sink.as_ref()) {
            Ok(Delivery::Written(location)) => {
                info!("[{}] {} results written to {}", site.name, sink.name(), location)
            }
            Ok(Delivery::NoResults) => {
                info!("[{}] No results found", site.name);
                break;
            }
            Err(e) => warn!("[{}] {} sink error: {}", site.name, sink.name(), e),
        }
    }
}
