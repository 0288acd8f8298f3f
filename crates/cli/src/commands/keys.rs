//! `missive keys` — List the message key of every contract method.

use missive_config::MissiveConfig;

pub fn run(config: &MissiveConfig) -> anyhow::Result<()> {
    let keys = config.message_keys();
    if keys.is_empty() {
        println!("No contracts configured.");
        return Ok(());
    }

    let width = keys
        .iter()
        .map(|(contract, method, _)| contract.len() + method.len() + 2)
        .max()
        .unwrap_or(0);
    for (contract, method, key) in keys {
        let name = format!("{contract}::{method}");
        println!("{name:<width$}  {}", key.unwrap_or("(none)"));
    }
    Ok(())
}
