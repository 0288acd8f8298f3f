//! Message senders.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::info;

use missive_core::{BoxError, Sender};

/// Records every delivery instead of sending it anywhere.
///
/// Clones share one delivery log.
#[derive(Debug)]
pub struct CollectingSender<V, M> {
    deliveries: Arc<Mutex<Vec<(V, M)>>>,
}

impl<V, M> Clone for CollectingSender<V, M> {
    fn clone(&self) -> Self {
        Self {
            deliveries: Arc::clone(&self.deliveries),
        }
    }
}

impl<V, M> Default for CollectingSender<V, M> {
    fn default() -> Self {
        Self {
            deliveries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<V: Clone, M: Clone> CollectingSender<V, M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything delivered so far, oldest first.
    pub fn deliveries(&self) -> Vec<(V, M)> {
        self.lock().clone()
    }

    /// Messages delivered so far, oldest first.
    pub fn messages(&self) -> Vec<M> {
        self.lock().iter().map(|(_, m)| m.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(V, M)>> {
        self.deliveries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<V, M> Sender<V, M> for CollectingSender<V, M>
where
    V: Clone + Send,
    M: Send,
{
    fn send(&self, viewer: &V, message: M) -> Result<(), BoxError> {
        self.deliveries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((viewer.clone(), message));
        Ok(())
    }
}

/// Logs every message at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSender;

impl<V, M> Sender<V, M> for TracingSender
where
    V: fmt::Debug,
    M: fmt::Display,
{
    fn send(&self, viewer: &V, message: M) -> Result<(), BoxError> {
        info!(viewer = ?viewer, message = %message, "Delivered message");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_delivery_log() {
        let sender: CollectingSender<String, String> = CollectingSender::new();
        let handle = sender.clone();

        sender.send(&"ada".to_string(), "hello".to_string()).unwrap();
        sender.send(&"grace".to_string(), "hi".to_string()).unwrap();

        assert_eq!(handle.len(), 2);
        assert_eq!(handle.messages(), ["hello", "hi"]);
        assert_eq!(handle.deliveries()[1].0, "grace");
    }

    #[test]
    fn tracing_sender_never_fails() {
        assert!(TracingSender.send(&"ada", "hello").is_ok());
    }
}
