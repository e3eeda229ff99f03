mod app;

use anyhow::Result;

use hava_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    hava_core::init()?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("Config directory: {}", config.config_dir.display());

    let mut app = app::App::new(config)?;
    app.start().await;

    tracing::info!("Hava started; press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    app.shutdown().await;
    Ok(())
}
