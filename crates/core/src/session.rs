//! Per-deployment table of metadata published by build units.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use jaxscope_api::{DeploymentMetadata, MetadataLookup};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared metadata table scoped to one deployment.
///
/// Created when the deployment starts, written once per unit, and cleared
/// when the deployment completes or is rolled back. Cloning shares the table.
#[derive(Debug, Clone)]
pub struct DeploymentSession {
    name: Arc<str>,
    table: Arc<DashMap<String, Arc<DeploymentMetadata>>>,
    closed: Arc<AtomicBool>,
}

impl DeploymentSession {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: Arc::from(name),
            table: Arc::new(DashMap::new()),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Publishes `metadata` under `unit_id` unless the unit already published.
    ///
    /// Returns `false` when the key was taken or the session is closed.
    pub fn publish(&self, unit_id: &str, metadata: DeploymentMetadata) -> bool {
        if self.is_closed() {
            tracing::warn!(
                "session {} is closed, dropping metadata for {}",
                self.name,
                unit_id
            );
            return false;
        }
        match self.table.entry(unit_id.to_string()) {
            Entry::Occupied(_) => {
                tracing::warn!("unit {} already published its metadata", unit_id);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Arc::new(metadata));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Tears the table down after a successful deployment.
    pub fn complete(&self) {
        self.close("completed");
    }

    /// Tears the table down after a failed deployment.
    pub fn rollback(&self) {
        self.close("rolled back");
    }

    fn close(&self, reason: &str) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(
                "session {} {}, releasing {} entries",
                self.name,
                reason,
                self.table.len()
            );
            self.table.clear();
        }
    }
}

impl MetadataLookup for DeploymentSession {
    fn lookup(&self, unit_id: &str) -> Option<Arc<DeploymentMetadata>> {
        self.table.get(unit_id).map(|entry| Arc::clone(entry.value()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rayon::prelude::*;

    fn with_resource(name: &str) -> DeploymentMetadata {
        let mut md = DeploymentMetadata::default();
        md.resource_classes.insert(name.to_string());
        md
    }

    #[test]
    fn first_publish_wins() {
        let session = DeploymentSession::new("app.ear");
        assert!(session.publish("lib.jar", with_resource("a.First")));
        assert!(!session.publish("lib.jar", with_resource("a.Second")));

        let stored = session.lookup("lib.jar").unwrap();
        assert!(stored.resource_classes.contains("a.First"));
        assert!(session.lookup("other.jar").is_none());
    }

    #[test]
    fn concurrent_publishers_never_overwrite() {
        let session = DeploymentSession::new("app.ear");
        let accepted: usize = (0..64)
            .into_par_iter()
            .map(|i| {
                let unit = format!("unit-{}.jar", i % 8);
                usize::from(session.publish(&unit, with_resource(&format!("a.R{}", i))))
            })
            .sum();

        assert_eq!(accepted, 8);
        assert_eq!(session.len(), 8);
    }

    #[test]
    fn closed_session_is_empty_and_rejects_writes() {
        let session = DeploymentSession::new("app.ear");
        session.publish("lib.jar", DeploymentMetadata::default());
        let shared = session.clone();

        session.rollback();

        assert!(shared.is_closed());
        assert!(shared.is_empty());
        assert!(!shared.publish("late.jar", DeploymentMetadata::default()));
    }
}
