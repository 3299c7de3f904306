//! Background-remover capability trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// The externally supplied background-removal capability.
///
/// A single call can take seconds; callers bound concurrent invocations with
/// the shared inference guard rather than relying on the implementation.
#[async_trait]
pub trait BackgroundRemover: Send + Sync + std::fmt::Debug {
    /// Remove the background from an image, returning PNG bytes.
    async fn remove(&self, image: Bytes) -> AppResult<Bytes>;
}
