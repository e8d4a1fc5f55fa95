//! Print the default configuration.

use anyhow::Result;
use trading_config::AppConfig;

pub fn run() -> Result<()> {
    print!("{}", AppConfig::default().to_toml()?);
    Ok(())
}
