//! Contract descriptors.
//!
//! A contract is described explicitly: its name, and for every method the
//! message key, the parameters (with template-argument and marker tags) and
//! what the method returns. Descriptors are plain data and deserialise from
//! configuration files as well as being built in code.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::types::TypeKey;
use crate::viewer::ViewerLocator;

/// A declared contract: a named set of methods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractDescriptor {
    pub name: TypeKey,

    #[serde(default)]
    pub methods: Vec<MethodDescriptor>,
}

impl ContractDescriptor {
    pub fn new(name: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Find a method by name.
    pub fn find(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// What a contract method hands back to its caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Returns {
    /// Nothing: the composed message is sent to the viewer.
    #[default]
    Unit,
    /// The composed message itself; nothing is sent.
    Message,
    /// The frozen configuration behind the contract instance.
    Configuration,
}

/// One declared method of a contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub name: String,

    /// Key of the template to look up. Required unless the method has a
    /// default body or returns the configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_key: Option<String>,

    #[serde(default)]
    pub params: Vec<ParamDescriptor>,

    #[serde(default)]
    pub returns: Returns,

    /// The method carries its own implementation and bypasses templating.
    #[serde(default)]
    pub default_body: bool,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message_key: None,
            params: Vec::new(),
            returns: Returns::Unit,
            default_body: false,
        }
    }

    pub fn key(mut self, message_key: impl Into<String>) -> Self {
        self.message_key = Some(message_key.into());
        self
    }

    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    pub fn returns(mut self, returns: Returns) -> Self {
        self.returns = returns;
        self
    }

    pub fn with_default_body(mut self) -> Self {
        self.default_body = true;
        self
    }

    /// Whether calls to this method go through the templating pipeline.
    pub fn is_templated(&self) -> bool {
        !self.default_body && self.returns != Returns::Configuration
    }

    /// Index of the first parameter carrying `marker`.
    pub fn marked_param(&self, marker: &str) -> Option<usize> {
        self.params.iter().position(|p| p.has_marker(marker))
    }
}

/// One declared parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDescriptor {
    pub name: String,

    /// The statically declared type of the parameter.
    #[serde(rename = "type")]
    pub declared: TypeKey,

    /// Present when the argument takes part in variable resolution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_argument: Option<TemplateArgument>,

    /// Free-form tags read by locator resolvers (e.g. `"viewer"`).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<String>,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, declared: impl Into<TypeKey>) -> Self {
        Self {
            name: name.into(),
            declared: declared.into(),
            template_argument: None,
            markers: Vec::new(),
        }
    }

    /// Resolve this argument under the parameter's own name.
    pub fn template(mut self) -> Self {
        self.template_argument = Some(TemplateArgument::default());
        self
    }

    /// Resolve this argument under an explicit name.
    pub fn template_named(mut self, name: impl Into<String>) -> Self {
        self.template_argument = Some(TemplateArgument {
            name: Some(name.into()),
        });
        self
    }

    pub fn marker(mut self, marker: impl Into<String>) -> Self {
        self.markers.push(marker.into());
        self
    }

    pub fn has_marker(&self, marker: &str) -> bool {
        self.markers.iter().any(|m| m == marker)
    }

    /// The name this argument resolves under, if it is a template argument.
    /// An empty explicit name falls back to the parameter name.
    pub fn resolution_name(&self) -> Option<&str> {
        let argument = self.template_argument.as_ref()?;
        match argument.name.as_deref() {
            Some(name) if !name.is_empty() => Some(name),
            _ => Some(&self.name),
        }
    }
}

/// Marks a parameter as a template argument.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateArgument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A templated method pre-bound to its message key and viewer locator.
///
/// Computed once when a configuration is frozen.
pub struct BoundMethod<V> {
    pub descriptor: MethodDescriptor,
    pub message_key: String,
    pub locator: Arc<dyn ViewerLocator<V>>,
    /// Priority of the locator resolver that accepted the method.
    pub locator_priority: i32,
}

impl<V> fmt::Debug for BoundMethod<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethod")
            .field("method", &self.descriptor.name)
            .field("message_key", &self.message_key)
            .field("locator_priority", &self.locator_priority)
            .finish()
    }
}
