//! Index lifecycle state.
//!
//! Every backend instance moves through `Empty → Populating → Ready`.
//! [`IndexStateHandle`] publishes the current state over a watch channel so
//! callers can observe transitions or block until the index is ready.
//!
//! ```rust
//! use quarry_core::state::{IndexState, IndexStateHandle};
//!
//! let handle = IndexStateHandle::new("default");
//! assert_eq!(handle.state(), IndexState::Empty);
//!
//! handle.set_state(IndexState::Populating);
//! handle.set_state(IndexState::Ready);
//! assert!(handle.state().is_ready());
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

// ============================================================================
// IndexState
// ============================================================================

/// Lifecycle state of a backend's index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexState {
    /// No documents; freshly created or just reset.
    Empty,
    /// Types or documents staged but not yet committed.
    Populating,
    /// All staged writes committed and visible to queries.
    Ready,
}

impl IndexState {
    /// Returns `true` if every staged write is visible.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Returns `true` if writes are waiting for a refresh.
    pub fn has_pending(&self) -> bool {
        matches!(self, Self::Populating)
    }
}

impl fmt::Display for IndexState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Populating => write!(f, "populating"),
            Self::Ready => write!(f, "ready"),
        }
    }
}

// ============================================================================
// IndexStateHandle
// ============================================================================

/// Thread-safe handle for observing and updating index state.
///
/// Cheap to clone (Arc internals). State changes are broadcast
/// to all subscribers via a watch channel.
#[derive(Clone)]
pub struct IndexStateHandle {
    inner: Arc<IndexStateInner>,
}

struct IndexStateInner {
    name: String,
    tx: watch::Sender<IndexState>,
}

impl IndexStateHandle {
    /// Create a new handle in [`IndexState::Empty`].
    pub fn new(name: impl Into<String>) -> Self {
        let (tx, _rx) = watch::channel(IndexState::Empty);
        Self {
            inner: Arc::new(IndexStateInner {
                name: name.into(),
                tx,
            }),
        }
    }

    /// Name of the backend this handle tracks.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current state.
    pub fn state(&self) -> IndexState {
        *self.inner.tx.borrow()
    }

    /// Update the state, notifying subscribers when it changes.
    pub fn set_state(&self, state: IndexState) {
        let previous = self.inner.tx.send_replace(state);
        if previous != state {
            log::info!("Index '{}': {previous} → {state}", self.inner.name);
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<IndexState> {
        self.inner.tx.subscribe()
    }

    /// Wait until the index reaches Ready, or fail after `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.subscribe();
        match tokio::time::timeout(timeout, rx.wait_for(IndexState::is_ready)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(_)) => Err(Error::engine(format!(
                "Index '{}' state channel closed",
                self.inner.name
            ))),
            Err(_) => Err(Error::engine(format!(
                "Index '{}' not ready after {timeout:?} (state: {})",
                self.inner.name,
                self.state()
            ))),
        }
    }
}

impl fmt::Debug for IndexStateHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexStateHandle")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
