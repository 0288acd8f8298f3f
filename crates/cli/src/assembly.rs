//! Wires a configuration file into callable contract instances.
//!
//! Viewers, templates, messages and replacements are all strings on the
//! command line.

use std::sync::Arc;

use anyhow::{Context, bail};

use missive_config::{MissiveConfig, SupertypePolicy};
use missive_core::{
    Arguments, ContractDescriptor, MethodDescriptor, ParamDescriptor, Sender, SupertypeStrategy,
    TypeGraph, TypeKey, Typed, Value,
};
use missive_engine::{InterfacesFirst, Missive, StandardResolution, SuperclassFirst};
use missive_standard::{
    Catalog, FixedViewerLocator, MarkedParameterLocator, StringComposer, display_resolver,
    identity_resolver,
};

pub type CliMissive = Missive<String, String, String, String>;

/// Viewer used when a method has no viewer parameter and `--to` is absent.
pub const CONSOLE_VIEWER: &str = "console";

const MARKED_LOCATOR_PRIORITY: i32 = 10;

/// Shared pieces derived once from a configuration.
pub struct Assembly<'a> {
    config: &'a MissiveConfig,
    graph: Arc<TypeGraph>,
    catalog: Catalog<String>,
}

impl<'a> Assembly<'a> {
    pub fn new(config: &'a MissiveConfig) -> anyhow::Result<Self> {
        let graph = Arc::new(config.type_graph()?);

        let mut catalog = Catalog::new();
        for (key, template) in &config.templates {
            catalog.insert(key.clone(), template.clone());
        }
        for (viewer, overrides) in &config.viewers {
            for (key, template) in &overrides.templates {
                catalog.insert_for(viewer.clone(), key.clone(), template.clone());
            }
        }

        Ok(Self {
            config,
            graph,
            catalog,
        })
    }

    pub fn config(&self) -> &MissiveConfig {
        self.config
    }

    pub fn contract(&self, name: &str) -> anyhow::Result<&'a ContractDescriptor> {
        match self.config.contract(name) {
            Some(contract) => Ok(contract),
            None => bail!("no contract named '{name}' in the configuration"),
        }
    }

    /// Freeze an instance of `contract` that delivers through `sender`.
    ///
    /// Methods with a `viewer`-marked parameter read the viewer from that
    /// argument; every other method goes to `fallback_viewer`.
    pub fn build(
        &self,
        contract: &ContractDescriptor,
        fallback_viewer: &str,
        sender: impl Sender<String, String> + 'static,
    ) -> anyhow::Result<CliMissive> {
        let composer = StringComposer::new().delimiters(
            self.config.composer.prefix.clone(),
            self.config.composer.suffix.clone(),
        );

        let mut builder = CliMissive::builder(contract.clone())
            .locator_resolver(MARKED_LOCATOR_PRIORITY, MarkedParameterLocator::new())
            .locator_resolver(i32::MIN, FixedViewerLocator::new(fallback_viewer.to_string()))
            .template_source(self.catalog.clone())
            .composer(composer)
            .sender(sender)
            .resolution(self.resolution())
            .resolver(String::type_key(), 0, identity_resolver::<String, String>())
            .resolver(i64::type_key(), 0, display_resolver::<String, i64>())
            .resolver(f64::type_key(), 0, display_resolver::<String, f64>())
            .resolver(bool::type_key(), 0, display_resolver::<String, bool>());

        // Arguments of declared types arrive as tagged strings.
        for declared in self.declared_types() {
            builder = builder.resolver(declared, i32::MIN, identity_resolver::<String, String>());
        }

        builder
            .freeze()
            .with_context(|| format!("failed to configure contract '{}'", contract.name))
    }

    fn resolution(&self) -> StandardResolution {
        let settings = &self.config.resolution;
        let graph = Arc::clone(&self.graph);
        let strategy: Arc<dyn SupertypeStrategy> = match settings.strategy {
            SupertypePolicy::SuperclassFirst => {
                Arc::new(SuperclassFirst::new(graph).root_last(settings.root_last))
            }
            SupertypePolicy::InterfacesFirst => {
                Arc::new(InterfacesFirst::new(graph).root_last(settings.root_last))
            }
        };

        let resolution = StandardResolution::new(strategy);
        match settings.max_steps {
            Some(limit) => resolution.with_max_steps(limit),
            None => resolution,
        }
    }

    fn declared_types(&self) -> Vec<TypeKey> {
        let mut types: Vec<TypeKey> = self
            .config
            .types
            .iter()
            .map(|t| TypeKey::new(t.name.clone()))
            .chain(self.graph.root().cloned())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}

/// Split a `name=value` command-line pair.
pub fn parse_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got '{raw}'")),
    }
}

/// Build positional arguments for `method` from named pairs.
///
/// Parameters without a pair are passed as null; a later pair for the same
/// name wins.
pub fn parse_arguments(method: &MethodDescriptor, pairs: &[(String, String)]) -> anyhow::Result<Arguments> {
    if let Some((name, _)) = pairs
        .iter()
        .find(|(name, _)| !method.params.iter().any(|p| p.name == *name))
    {
        bail!("method '{}' has no parameter named '{name}'", method.name);
    }

    method
        .params
        .iter()
        .map(|param| {
            pairs
                .iter()
                .rev()
                .find(|(name, _)| *name == param.name)
                .map(|(_, raw)| parse_value(param, raw))
                .transpose()
        })
        .collect()
}

fn parse_value(param: &ParamDescriptor, raw: &str) -> anyhow::Result<Value> {
    let expects = |ty: &str| format!("parameter '{}' expects {ty}, got '{raw}'", param.name);

    let value = match param.declared.as_str() {
        "string" => Value::new(raw.to_string()),
        "i64" => Value::new(raw.parse::<i64>().with_context(|| expects("an integer"))?),
        "f64" => Value::new(raw.parse::<f64>().with_context(|| expects("a number"))?),
        "bool" => Value::new(raw.parse::<bool>().with_context(|| expects("true or false"))?),
        _ => Value::tagged(param.declared.clone(), raw.to_string()),
    };
    Ok(value)
}
