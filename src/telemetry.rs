use anyhow::Context;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

pub fn init() -> anyhow::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_env_var("LOG_LEVEL")
        .with_default_directive(LevelFilter::INFO.into())
        .from_env()
        .context("could not get log level")?;

    tracing_subscriber::fmt()
        .json()
        .with_current_span(true)
        .with_target(false)
        .with_env_filter(env_filter)
        .with_ansi(true)
        .try_init()
        .map_err(|error| anyhow::anyhow!("{error}"))
        .context("tracing initialization failed")
}
