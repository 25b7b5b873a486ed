//! Smol runtime spawner implementation

use crate::{BoxedTask, Spawner};

/// Spawner for smol's global executor
#[derive(Debug, Clone, Copy)]
pub struct SmolSpawner;

impl Spawner for SmolSpawner {
    fn spawn(&self, future: BoxedTask) {
        smol::spawn(future).detach();
    }
}
