//! Camera port

use async_trait::async_trait;

use crate::domain::result::Result;
use crate::domain::FacingMode;

/// An acquired camera stream
///
/// Not `Clone`: releasing consumes the handle, so a stream can only be
/// stopped once.
#[derive(Debug, PartialEq, Eq)]
pub struct StreamHandle {
    pub id: u64,
    pub facing: FacingMode,
}

/// Camera device abstraction
#[async_trait]
pub trait CaptureDevice: Send + Sync {
    /// Open a stream on the requested camera. Fails when permission is
    /// denied or no matching camera exists.
    async fn acquire(&self, facing: FacingMode) -> Result<StreamHandle>;

    /// Grab the current frame as an encoded still image
    fn grab_frame(&self, stream: &StreamHandle) -> Result<Vec<u8>>;

    /// Stop every track of the stream. Must not fail; called from `Drop`.
    fn release(&self, stream: StreamHandle);
}

/// Turns a frame of the QR target into the encoded text
pub trait CodeReader: Send + Sync {
    fn decode(&self, frame: &[u8]) -> Option<String>;
}
