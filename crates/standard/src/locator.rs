//! Viewer locators.

use std::any::Any;
use std::sync::Arc;

use missive_core::{Invocation, LocatorResolver, MethodDescriptor, TypeKey, ViewerLocator, ViewerNotFound};

/// Marker that flags the viewer parameter of a method.
pub const VIEWER_MARKER: &str = "viewer";

/// Accepts methods that have a parameter carrying a marker and reads the
/// viewer out of that argument.
///
/// Declines methods without such a parameter, so a lower-priority resolver
/// (e.g. a [`FixedViewerLocator`]) can take them.
#[derive(Debug, Clone)]
pub struct MarkedParameterLocator {
    marker: String,
}

impl MarkedParameterLocator {
    pub fn new() -> Self {
        Self::with_marker(VIEWER_MARKER)
    }

    pub fn with_marker(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for MarkedParameterLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LocatorResolver<V> for MarkedParameterLocator
where
    V: Any + Clone + Send + Sync,
{
    fn resolve(&self, method: &MethodDescriptor, _contract: &TypeKey) -> Option<Arc<dyn ViewerLocator<V>>> {
        let index = method.marked_param(&self.marker)?;
        Some(Arc::new(ArgumentViewer { index }))
    }
}

/// Reads the viewer from one positional argument.
#[derive(Debug, Clone, Copy)]
struct ArgumentViewer {
    index: usize,
}

impl<V> ViewerLocator<V> for ArgumentViewer
where
    V: Any + Clone + Send + Sync,
{
    fn lookup(&self, invocation: &Invocation<'_>) -> Result<V, ViewerNotFound> {
        let param = invocation
            .method
            .params
            .get(self.index)
            .map_or("?", |p| p.name.as_str());

        let value = invocation.args.get(self.index).ok_or_else(|| {
            ViewerNotFound::new(format!("viewer argument '{param}' (#{}) is absent", self.index))
        })?;

        value.downcast_ref::<V>().cloned().ok_or_else(|| {
            ViewerNotFound::new(format!(
                "viewer argument '{param}' (#{}) holds a {}, not a viewer",
                self.index,
                value.type_key()
            ))
        })
    }
}

/// Yields the same viewer for every method.
#[derive(Debug, Clone)]
pub struct FixedViewerLocator<V> {
    viewer: V,
}

impl<V> FixedViewerLocator<V> {
    pub fn new(viewer: V) -> Self {
        Self { viewer }
    }
}

impl<V> ViewerLocator<V> for FixedViewerLocator<V>
where
    V: Clone + Send + Sync,
{
    fn lookup(&self, _invocation: &Invocation<'_>) -> Result<V, ViewerNotFound> {
        Ok(self.viewer.clone())
    }
}

impl<V> LocatorResolver<V> for FixedViewerLocator<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn resolve(&self, _method: &MethodDescriptor, _contract: &TypeKey) -> Option<Arc<dyn ViewerLocator<V>>> {
        Some(Arc::new(self.clone()))
    }
}
