//! Runtime-agnostic async utilities
//!
//! The deploy orchestrator never talks to an executor directly. It hands
//! futures to a [`Spawner`] and, when it needs the value a future produces,
//! uses [`spawn_output`] to run it detached and receive the output through a
//! channel.
//!
//! # Examples
//!
//! ```no_run
//! use async_runtime_compat::prelude::*;
//!
//! async fn example(spawner: &dyn Spawner) -> Option<u32> {
//!     let output = spawn_output(spawner, async { 40 + 2 });
//!     output.wait().await
//! }
//! ```

#![warn(missing_docs)]

use std::future::Future;
use std::pin::Pin;

/// A boxed, sendable unit of background work
pub type BoxedTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A spawner that can spawn futures on an async runtime
pub trait Spawner: Send + Sync {
    /// Spawn a future on the runtime
    ///
    /// The future runs to completion in the background even if nobody
    /// observes its result.
    fn spawn(&self, future: BoxedTask);
}

/// Receiving side of a future started with [`spawn_output`]
#[derive(Debug)]
pub struct TaskOutput<T> {
    rx: async_channel::Receiver<T>,
}

impl<T> TaskOutput<T> {
    /// Wait for the spawned future to produce its output
    ///
    /// Returns `None` when the task ended without delivering a value, which
    /// happens if it panicked or the runtime dropped it.
    pub async fn wait(self) -> Option<T> {
        self.rx.recv().await.ok()
    }
}

/// Spawn `future` detached and return a handle to its eventual output
///
/// Dropping the returned [`TaskOutput`] does not stop the task. It keeps
/// running on the runtime and its output is discarded.
pub fn spawn_output<T, F>(spawner: &dyn Spawner, future: F) -> TaskOutput<T>
where
    F: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = async_channel::bounded(1);
    spawner.spawn(Box::pin(async move {
        let output = future.await;
        // Nobody is listening any more if the caller gave up on the join
        let _ = tx.send(output).await;
    }));
    TaskOutput { rx }
}

#[cfg(feature = "tokio")]
pub mod tokio;

#[cfg(feature = "smol")]
pub mod smol;

pub mod runtime_utils;

/// Prelude for common imports
pub mod prelude {
    pub use crate::{BoxedTask, Spawner, TaskOutput, spawn_output};

    #[cfg(any(feature = "smol", feature = "tokio"))]
    pub use crate::runtime_utils::sleep;

    #[cfg(feature = "tokio")]
    pub use crate::tokio::TokioSpawner;

    #[cfg(feature = "smol")]
    pub use crate::smol::SmolSpawner;
}
