//! Validate configuration command.

use anyhow::Result;
use std::path::Path;
use trading_config::AppConfig;

/// Loading already validated `config`; this prints what was resolved.
pub fn run(config_path: Option<&Path>, config: &AppConfig) -> Result<()> {
    match config_path {
        Some(path) => println!("Configuration {} is valid", path.display()),
        None => println!("Default configuration is valid"),
    }
    println!();
    println!("App: {} ({})", config.app.name, config.app.environment);
    println!("Symbols: {}", config.app.symbols.join(", "));
    println!(
        "Timeframes: fast {} / slow {}, {} candles (indicators need {})",
        config.timeframes.fast,
        config.timeframes.slow,
        config.timeframes.candle_count,
        config.indicators.min_bars()
    );
    println!("Log level: {}", config.logging.level);
    println!("Initial equity: {}", config.app.initial_equity);

    let leverage = &config.risk.leverage;
    println!(
        "Leverage: base {}x, range {}x to {}x",
        leverage.base_leverage, leverage.min_leverage, leverage.max_leverage
    );
    println!("Risk per trade: {}", config.sizing.risk_per_trade);
    println!(
        "Daily loss limit: {}, max drawdown: {}, emergency daily loss: {}",
        config.risk.limits.max_daily_loss, config.risk.limits.max_drawdown, config.risk.emergency.max_daily_loss
    );
    Ok(())
}
