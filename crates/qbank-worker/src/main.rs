use eyre::Result;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    color_eyre::install()?;

    // Structured JSON logging for the job scheduler's log collector
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let path = qbank_worker::config::config_path()?;
    let config = qbank_worker::config::load_config_from(&path)?;
    tracing::info!(config = %path.display(), "starting reminder run");

    let summary = qbank_worker::job::run(&config, jiff::Timestamp::now())?;
    tracing::info!(
        subjects = summary.subjects,
        queued = summary.queued,
        suspended = summary.suspended,
        failures = summary.failures,
        "reminder run finished"
    );
    Ok(())
}
