use std::sync::Arc;
use tokio::sync::Mutex;
use windpower::WindPower;

/// Shared by every handler.
///
/// `pipeline` serialises estimation runs: they all write the same chart file.
#[derive(Clone)]
pub struct AppState {
    pub client: WindPower,
    pub pipeline: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(client: WindPower) -> Self {
        Self {
            client,
            pipeline: Arc::new(Mutex::new(())),
        }
    }
}
