//! List strategies command.

use anyhow::Result;
use trading_config::AppConfig;
use trading_strategies::StrategySet;

use crate::cli::{OutputFormat, StrategiesArgs};

pub fn run(args: StrategiesArgs, config: &AppConfig) -> Result<()> {
    let set = StrategySet::new(config.trend_following.clone(), config.mean_reversion.clone())?;
    let list = set.list();

    if args.output == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&list)?);
        return Ok(());
    }

    println!("Available Strategies");
    println!("═══════════════════════════════════════════════════════════");
    println!();

    for info in &list {
        println!("  {} ({} regime)", info.name, info.regime);
        println!("  ───────────────────────────────────────────────────────");
        println!("  {}", info.description);
        if let Some(cycles) = info.max_holding_cycles {
            println!("  Positions close after {} cycles", cycles);
        }
        println!();
    }

    println!("The regime classifier selects one strategy per symbol each cycle.");
    Ok(())
}
