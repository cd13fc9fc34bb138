//! Explicit connection context.
//!
//! Every component that issues ledger calls receives a [`ConnectionContext`]
//! by reference. The context moves through `Connecting -> Ready` or
//! `Connecting -> Failed` exactly once, at [`ConnectionContext::establish`] or
//! [`ConnectionContext::fail`].

use crate::config::ClientSettings;
use holonotes_core::{NotesError, NotesResult, StoreError};
use holonotes_store::RecordStore;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Ready,
    Failed(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Ready => write!(f, "ready"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

struct ContextInner {
    settings: ClientSettings,
    store: OnceLock<Arc<dyn RecordStore>>,
    state: watch::Sender<ConnectionState>,
}

/// Shared handle on the ledger connection. Cloning is cheap.
#[derive(Clone)]
pub struct ConnectionContext {
    inner: Arc<ContextInner>,
}

impl ConnectionContext {
    /// A context in the `Connecting` state.
    pub fn new(settings: ClientSettings) -> Self {
        let (state, _) = watch::channel(ConnectionState::Connecting);
        Self {
            inner: Arc::new(ContextInner {
                settings,
                store: OnceLock::new(),
                state,
            }),
        }
    }

    /// Shorthand for `new` followed by `establish`.
    pub fn ready(settings: ClientSettings, store: Arc<dyn RecordStore>) -> NotesResult<Self> {
        let ctx = Self::new(settings);
        ctx.establish(store)?;
        Ok(ctx)
    }

    /// Bind the store and move to `Ready`. Only valid while `Connecting`.
    pub fn establish(&self, store: Arc<dyn RecordStore>) -> NotesResult<()> {
        let current = self.state();
        if current != ConnectionState::Connecting {
            return Err(NotesError::invalid_argument(
                "connection",
                format!("cannot establish a connection that is {current}"),
            ));
        }
        let agent = store.agent();
        if self.inner.store.set(store).is_err() {
            return Err(NotesError::invalid_argument(
                "connection",
                "store already bound",
            ));
        }
        self.inner.state.send_replace(ConnectionState::Ready);
        tracing::info!(
            role = %self.inner.settings.role_name,
            zome = %self.inner.settings.zome_name,
            agent = %agent.short(),
            "connection established"
        );
        Ok(())
    }

    /// Record that the connection could not be made. Only valid while
    /// `Connecting`.
    pub fn fail(&self, reason: impl Into<String>) -> NotesResult<()> {
        let current = self.state();
        if current != ConnectionState::Connecting {
            return Err(NotesError::invalid_argument(
                "connection",
                format!("cannot fail a connection that is {current}"),
            ));
        }
        let reason = reason.into();
        tracing::error!(reason = %reason, "connection failed");
        self.inner.state.send_replace(ConnectionState::Failed(reason));
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.state.borrow().clone()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.inner.settings
    }

    /// Watch lifecycle transitions.
    pub fn watch(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Wait until the context leaves `Connecting`.
    pub async fn wait_ready(&self) -> NotesResult<()> {
        let mut rx = self.watch();
        let state = rx
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map(|state| state.clone())
            .map_err(|_| unavailable("connection context dropped".to_string()))?;
        match state {
            ConnectionState::Ready => Ok(()),
            ConnectionState::Failed(reason) => Err(unavailable(reason)),
            ConnectionState::Connecting => Err(unavailable("still connecting".to_string())),
        }
    }

    /// The bound store, or a transport fault when not `Ready`.
    pub fn store(&self) -> NotesResult<Arc<dyn RecordStore>> {
        match self.inner.store.get() {
            Some(store) => Ok(Arc::clone(store)),
            None => Err(unavailable(format!("connection is {}", self.state()))),
        }
    }
}

impl fmt::Debug for ConnectionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionContext")
            .field("settings", &self.inner.settings)
            .field("state", &self.state())
            .finish()
    }
}

fn unavailable(reason: String) -> NotesError {
    NotesError::Transport(StoreError::Unavailable { reason })
}
