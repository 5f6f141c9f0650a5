//! Camera capture sessions
//!
//! A [`CaptureSession`] owns an acquired camera stream and releases it
//! exactly once: on `close()`, or on drop if nobody closed it.
//! [`CaptureService`] holds at most one session at a time.

use std::sync::Arc;

use tracing::debug;

use crate::domain::result::{Error, Result};
use crate::domain::{CaptureTarget, CapturedImage};
use crate::ports::{CaptureDevice, CodeReader, StreamHandle};

/// Scoped ownership of a camera stream
pub struct CaptureSession {
    target: CaptureTarget,
    device: Arc<dyn CaptureDevice>,
    stream: Option<StreamHandle>,
}

impl CaptureSession {
    /// Open the camera that `target` needs
    pub async fn acquire(device: Arc<dyn CaptureDevice>, target: CaptureTarget) -> Result<Self> {
        let stream = device.acquire(target.facing_mode()).await?;
        debug!(capture = %target, stream = stream.id, "camera stream acquired");
        Ok(Self {
            target,
            device,
            stream: Some(stream),
        })
    }

    pub fn target(&self) -> CaptureTarget {
        self.target
    }

    pub fn grab_frame(&self) -> Result<Vec<u8>> {
        match &self.stream {
            Some(stream) => self.device.grab_frame(stream),
            None => Err(Error::CaptureUnavailable(format!("{} stream already released", self.target))),
        }
    }

    /// Release the stream now
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            debug!(capture = %self.target, stream = stream.id, "camera stream released");
            self.device.release(stream);
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("target", &self.target)
            .field("stream", &self.stream)
            .finish()
    }
}

/// Owner of the single camera slot
pub struct CaptureService {
    device: Arc<dyn CaptureDevice>,
    reader: Arc<dyn CodeReader>,
    active: Option<CaptureSession>,
}

impl CaptureService {
    pub fn new(device: Arc<dyn CaptureDevice>, reader: Arc<dyn CodeReader>) -> Self {
        Self {
            device,
            reader,
            active: None,
        }
    }

    pub fn active_target(&self) -> Option<CaptureTarget> {
        self.active.as_ref().map(|s| s.target())
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Open a session. Fails with `CaptureBusy` while another one is open.
    pub async fn open(&mut self, target: CaptureTarget) -> Result<()> {
        if let Some(active) = self.active_target() {
            return Err(Error::CaptureBusy(active.to_string()));
        }
        let session = CaptureSession::acquire(Arc::clone(&self.device), target).await?;
        self.active = Some(session);
        Ok(())
    }

    /// Release the open session, if any. Returns whether one was open.
    pub fn close(&mut self) -> bool {
        match self.active.take() {
            Some(session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Grab a still from the open session
    pub fn grab(&self) -> Result<CapturedImage> {
        let session = self
            .active
            .as_ref()
            .ok_or_else(|| Error::CaptureUnavailable("no capture session is open".to_string()))?;
        Ok(CapturedImage::jpeg(session.target(), session.grab_frame()?))
    }

    /// Decode a QR frame
    pub fn decode(&self, frame: &[u8]) -> Option<String> {
        self.reader.decode(frame)
    }
}
