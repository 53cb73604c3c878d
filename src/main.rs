//! Levelshare - Entry Point
//!
//! Thin driver over the library: loads the rules, runs one calculation,
//! and prints the result as JSON.

mod cli;

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands};
use levelshare::{run_session, EconomyConfig, SessionRequest};

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::debug!("Starting Levelshare v{}", env!("CARGO_PKG_VERSION"));

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EconomyConfig::load_from(path)?,
        None => EconomyConfig::load(),
    };

    let result = run(&config, cli.command);
    if let Err(ref e) = result {
        log::error!("{}", e);
    }
    result
}

fn run(config: &EconomyConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Table => {
            let engine = config.transfer_engine()?;
            let table = serde_json::json!({
                "level_caps": engine.levels().caps(),
                "scaled_caps": engine.scaled_table().caps(),
            });
            println!("{}", serde_json::to_string_pretty(&table)?);
        }
        Commands::Gift { donor_exp, target_exp } => {
            let engine = config.transfer_engine()?;
            let new_exp = engine.transfer(donor_exp, target_exp);
            let levels = engine.levels();
            let result = serde_json::json!({
                "donor_exp": donor_exp,
                "donor_level": levels.level_from_exp(donor_exp),
                "target_exp": target_exp,
                "target_level": levels.level_from_exp(target_exp),
                "new_exp": new_exp,
                "new_level": levels.level_from_exp(new_exp),
                "received_exp": new_exp - target_exp,
            });
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Session { exp_pool, members, gold, seed, reference_level } => {
            let seed = match seed {
                Some(seed) => seed,
                None => {
                    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();
                    log::info!("No seed given, using {}", now);
                    now
                }
            };

            let request = SessionRequest {
                exp_pool,
                gold_pool: gold,
                members,
                reference_level,
                seed,
            };
            let outcome = run_session(config, &config.level_table()?, &request)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}
