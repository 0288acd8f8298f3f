//! `missive check` — Validate a configuration and bind every contract.

use missive_config::MissiveConfig;
use missive_core::Returns;
use missive_standard::TracingSender;

use crate::assembly::{Assembly, CONSOLE_VIEWER};

pub fn run(config: &MissiveConfig) -> anyhow::Result<()> {
    for line in report(config)? {
        println!("{line}");
    }
    Ok(())
}

/// Freeze every contract and describe how each method was bound.
pub fn report(config: &MissiveConfig) -> anyhow::Result<Vec<String>> {
    let assembly = Assembly::new(config)?;
    let mut lines = vec![format!(
        "Configuration OK: {} contract(s), {} declared type(s)",
        config.contracts.len(),
        config.types.len()
    )];

    for contract in &config.contracts {
        let missive = assembly.build(contract, CONSOLE_VIEWER, TracingSender)?;
        lines.push(format!("  {missive}"));

        for bound in missive.configuration().bound_methods() {
            lines.push(format!(
                "    {} -> {} (locator priority {})",
                bound.descriptor.name, bound.message_key, bound.locator_priority
            ));
        }
        for method in contract
            .methods
            .iter()
            .filter(|m| m.returns == Returns::Configuration)
        {
            lines.push(format!("    {} -> configuration", method.name));
        }
    }

    for key in config.keys_without_template() {
        lines.push(format!("  warning: message key '{key}' has no default template"));
    }
    Ok(lines)
}
