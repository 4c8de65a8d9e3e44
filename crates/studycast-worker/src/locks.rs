//! Per-artifact request exclusion.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use studycast_models::ArtifactKey;

use crate::error::{WorkerError, WorkerResult};

/// Set of artifact keys with a generation in flight.
///
/// A second request for the same key is rejected instead of queued, so two
/// pipelines never write the same output path.
#[derive(Debug, Clone, Default)]
pub struct RequestLocks {
    inner: Arc<Mutex<HashSet<ArtifactKey>>>,
}

impl RequestLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or fail with `AlreadyInProgress`.
    pub fn try_acquire(&self, key: &ArtifactKey) -> WorkerResult<InFlightGuard> {
        let mut held = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !held.insert(key.clone()) {
            return Err(WorkerError::AlreadyInProgress(key.to_string()));
        }
        Ok(InFlightGuard {
            locks: self.inner.clone(),
            key: key.clone(),
        })
    }

    pub fn is_held(&self, key: &ArtifactKey) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases its key when dropped, whatever way the request ends.
#[derive(Debug)]
pub struct InFlightGuard {
    locks: Arc<Mutex<HashSet<ArtifactKey>>>,
    key: ArtifactKey,
}

impl InFlightGuard {
    pub fn key(&self) -> &ArtifactKey {
        &self.key
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studycast_models::ArtifactKind;

    fn key(sub: usize) -> ArtifactKey {
        ArtifactKey::new("u", "p", 0, sub, ArtifactKind::Video)
    }

    #[test]
    fn test_second_acquire_is_rejected() {
        let locks = RequestLocks::new();
        let guard = locks.try_acquire(&key(0)).unwrap();

        let err = locks.try_acquire(&key(0)).unwrap_err();
        assert!(matches!(err, WorkerError::AlreadyInProgress(_)));
        // Different subtopic is independent
        let _other = locks.try_acquire(&key(1)).unwrap();

        drop(guard);
        assert!(!locks.is_held(&key(0)));
        assert!(locks.try_acquire(&key(0)).is_ok());
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let locks = RequestLocks::new();
        let _video = locks.try_acquire(&key(0)).unwrap();
        let notes = ArtifactKey::new("u", "p", 0, 0, ArtifactKind::Notes);
        assert!(locks.try_acquire(&notes).is_ok());
    }
}
