//! Runtime-agnostic utility functions

use std::time::Duration;

/// Sleep for the specified duration using the compiled-in runtime
///
/// smol is preferred when both runtime features are enabled.
#[cfg(feature = "smol")]
pub async fn sleep(duration: Duration) {
    smol::Timer::after(duration).await;
}

/// Sleep for the specified duration using the compiled-in runtime
#[cfg(all(feature = "tokio", not(feature = "smol")))]
pub async fn sleep(duration: Duration) {
    tokio::time::sleep(duration).await;
}
