use std::sync::Arc;

use kiriban_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), kiriban_core::Error> {
    kiriban_core::logging::init("kiriban")?;

    let cfg = Arc::new(Config::load()?);

    kiriban_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| kiriban_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
