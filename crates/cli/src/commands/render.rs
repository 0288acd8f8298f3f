//! `missive render` — Run one contract method from the command line.

use anyhow::Context;
use tracing::debug;

use missive_config::MissiveConfig;
use missive_core::{BoxError, Returns, Sender};

use crate::assembly::{Assembly, CONSOLE_VIEWER, parse_arguments};

/// What to render, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    pub contract: String,
    pub method: String,
    pub args: Vec<(String, String)>,
    pub to: Option<String>,
    pub send: bool,
    pub json: bool,
}

pub fn run(config: &MissiveConfig, request: &RenderRequest) -> anyhow::Result<()> {
    let console = |viewer: &String, message: String| -> Result<(), BoxError> {
        println!("[{viewer}] {message}");
        Ok(())
    };
    if let Some(output) = execute(config, request, console)? {
        println!("{output}");
    }
    Ok(())
}

/// Run the request; returns the text to print, if any.
pub fn execute(
    config: &MissiveConfig,
    request: &RenderRequest,
    sender: impl Sender<String, String> + 'static,
) -> anyhow::Result<Option<String>> {
    let assembly = Assembly::new(config)?;
    let contract = assembly.contract(&request.contract)?;
    let method = contract.find(&request.method).with_context(|| {
        format!(
            "contract '{}' has no method named '{}'",
            request.contract, request.method
        )
    })?;

    let args = parse_arguments(method, &request.args)?;
    let viewer = request.to.as_deref().unwrap_or(CONSOLE_VIEWER);
    let missive = assembly.build(contract, viewer, sender)?;
    debug!(instance = %missive, method = %method.name, fallback_viewer = %viewer, "Rendering");

    if method.returns == Returns::Configuration {
        return Ok(Some(missive.to_string()));
    }

    if request.json {
        let prepared = missive.prepare(&method.name, &args)?;
        return Ok(Some(serde_json::to_string_pretty(&prepared.replacements)?));
    }

    if request.send {
        missive.send(&method.name, args)?;
        return Ok(None);
    }

    Ok(Some(missive.render(&method.name, args)?))
}
