use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log filter plus the optional Loki endpoint. Loki shipping is on when
/// `LOKI_URL` is set and the `loki` feature is compiled in.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub log_level: String,
    pub loki_url: Option<String>,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            loki_url: lookup("LOKI_URL").filter(|v| !v.trim().is_empty()),
        }
    }
}

pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    #[cfg(feature = "loki")]
    {
        if let Some(loki_url) = config.loki_url.as_deref() {
            return init_with_loki(&config.log_level, loki_url);
        }
    }

    // The JSON run report owns stdout, so log lines go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if config.loki_url.is_some() {
        tracing::warn!("LOKI_URL is set but this build has no `loki` feature");
    }
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(log_level: &str, loki_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", env!("CARGO_PKG_NAME"))?
        .build_url(url)?;

    // Background task that ships buffered events to Loki
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(loki_layer)
        .init();

    tracing::info!("✅ Loki logging initialized at {}", loki_url);
    Ok(())
}
