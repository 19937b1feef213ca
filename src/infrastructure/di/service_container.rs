//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use crate::application::services::{ExportService, RpcService, SessionService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, HttpTransport, RealFileSystem, UreqTransport};

/// Container holding shared dependencies and building services on demand.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// HTTP transport abstraction
    pub http: Arc<dyn HttpTransport>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(
            settings,
            Arc::new(RealFileSystem),
            Arc::new(UreqTransport::new()),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        http: Arc<dyn HttpTransport>,
    ) -> Self {
        let settings = Arc::new(settings);

        Self { settings, fs, http }
    }

    pub fn session_service(&self) -> SessionService {
        SessionService::new(Arc::clone(&self.http))
    }

    pub fn rpc_service(&self) -> RpcService {
        RpcService::new(Arc::clone(&self.http))
    }

    pub fn export_service(&self) -> ExportService {
        ExportService::new(Arc::clone(&self.http), Arc::clone(&self.fs))
    }
}
