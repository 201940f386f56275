use std::sync::Arc;

use invoicer_engine::{BulkRunner, JobRegistry};
use invoicer_inventory::Gateway;

use crate::config::ServerConfig;
use crate::profiles::ProfileStore;
use crate::ws::WsManager;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
    /// Control state of every running bulk job.
    pub registry: Arc<JobRegistry>,
    /// Starts bulk jobs against `gateway` and `registry`.
    pub runner: BulkRunner,
    /// Inventory API access shared by every job and request.
    pub gateway: Arc<dyn Gateway>,
    /// Named profiles on disk.
    pub profiles: Arc<ProfileStore>,
}

impl AppState {
    /// Wire up state around an existing gateway.
    pub fn new(config: ServerConfig, gateway: Arc<dyn Gateway>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let runner = BulkRunner::new(Arc::clone(&gateway), Arc::clone(&registry));
        let profiles = Arc::new(ProfileStore::new(config.profiles_path.clone()));
        Self {
            config: Arc::new(config),
            ws_manager: Arc::new(WsManager::new()),
            registry,
            runner,
            gateway,
            profiles,
        }
    }
}
