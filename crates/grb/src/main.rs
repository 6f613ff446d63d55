use std::sync::Arc;

use grb_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), grb_core::Error> {
    grb_core::logging::init("grb")?;

    let cfg = Arc::new(Config::load()?);

    grb_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| grb_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
