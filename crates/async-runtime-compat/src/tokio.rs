//! Tokio runtime spawner implementation

use crate::{BoxedTask, Spawner};

/// Spawner for the ambient Tokio runtime
#[derive(Debug, Clone, Copy)]
pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, future: BoxedTask) {
        // The JoinHandle detaches when dropped
        tokio::spawn(future);
    }
}
