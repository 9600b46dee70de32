//! Engine factory
//!
//! The factory owns the pieces shared by every connection: the designated
//! engine worker thread, the capture driver, and the constructor for
//! session drivers. Embedders replace the loopback defaults through the
//! builder to bind a real engine.

use std::sync::Arc;

use crate::capture::CaptureDriver;
use crate::connection::{PeerConnection, SessionDriver};
use crate::dispatch::ConnectionEvents;
use crate::error::Result;
use crate::types::PeerConnectionConfiguration;
use crate::worker::EngineWorker;

/// Shared engine state handed to every connection
pub struct EngineContext {
    /// The designated execution thread
    pub worker: EngineWorker,
    /// The capture subsystem
    pub capture: Arc<dyn CaptureDriver>,
}

/// Constructor for session drivers, one call per connection
pub type SessionFactoryFn = dyn Fn(Arc<ConnectionEvents>, &PeerConnectionConfiguration) -> Result<Arc<dyn SessionDriver>>
    + Send
    + Sync;

/// Factory for peer connections bound to one engine
pub struct EngineFactory {
    context: Arc<EngineContext>,
    sessions: Box<SessionFactoryFn>,
}

impl EngineFactory {
    /// Start building a factory
    pub fn builder() -> EngineFactoryBuilder {
        EngineFactoryBuilder::default()
    }

    /// Factory bound to the loopback engine
    #[cfg(feature = "loopback")]
    pub fn loopback() -> Result<Self> {
        Self::builder().build()
    }

    /// The shared engine state
    pub fn context(&self) -> &Arc<EngineContext> {
        &self.context
    }

    /// The capture driver
    pub fn capture_driver(&self) -> Arc<dyn CaptureDriver> {
        Arc::clone(&self.context.capture)
    }

    /// The designated execution thread
    pub fn worker(&self) -> &EngineWorker {
        &self.context.worker
    }

    /// Create a new peer connection
    pub fn create_peer_connection(
        &self,
        config: &PeerConnectionConfiguration,
    ) -> Result<Arc<PeerConnection>> {
        let events = ConnectionEvents::new();
        let driver = (self.sessions)(Arc::clone(&events), config)?;
        tracing::debug!(ice_servers = config.ice_servers.len(), "peer connection created");
        Ok(PeerConnection::new(events, driver, Arc::clone(&self.context)))
    }
}

/// Builder for [`EngineFactory`]
#[derive(Default)]
pub struct EngineFactoryBuilder {
    capture: Option<Arc<dyn CaptureDriver>>,
    sessions: Option<Box<SessionFactoryFn>>,
}

impl EngineFactoryBuilder {
    /// Use a specific capture driver instead of the default
    #[must_use]
    pub fn with_capture_driver(mut self, capture: Arc<dyn CaptureDriver>) -> Self {
        self.capture = Some(capture);
        self
    }

    /// Use a specific session-driver constructor instead of the default
    #[must_use]
    pub fn with_session_factory<F>(mut self, sessions: F) -> Self
    where
        F: Fn(Arc<ConnectionEvents>, &PeerConnectionConfiguration) -> Result<Arc<dyn SessionDriver>>
            + Send
            + Sync
            + 'static,
    {
        self.sessions = Some(Box::new(sessions));
        self
    }

    /// Spawn the worker thread and build the factory
    ///
    /// Without the `loopback` feature both drivers must have been supplied.
    pub fn build(self) -> Result<EngineFactory> {
        let worker = EngineWorker::spawn()?;

        #[cfg(feature = "loopback")]
        let capture = self
            .capture
            .unwrap_or_else(|| Arc::new(crate::loopback::LoopbackCapture::new()));
        #[cfg(not(feature = "loopback"))]
        let capture = self.capture.ok_or_else(|| {
            crate::error::Error::InvalidOperation("no capture driver configured".into())
        })?;

        #[cfg(feature = "loopback")]
        let sessions = self.sessions.unwrap_or_else(|| {
            Box::new(|events, _config| {
                let driver: Arc<dyn SessionDriver> = crate::loopback::LoopbackSession::new(events);
                Ok(driver)
            })
        });
        #[cfg(not(feature = "loopback"))]
        let sessions = self.sessions.ok_or_else(|| {
            crate::error::Error::InvalidOperation("no session factory configured".into())
        })?;

        Ok(EngineFactory {
            context: Arc::new(EngineContext { worker, capture }),
            sessions,
        })
    }
}
