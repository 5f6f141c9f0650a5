//! Mock camera and QR reader for tests and headless hosts
//!
//! The camera hands out numbered streams and counts every acquire and
//! release, so tests can check that no stream is ever leaked or stopped
//! twice.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::result::{Error, Result};
use crate::domain::FacingMode;
use crate::ports::{CaptureDevice, CodeReader, StreamHandle};

/// A fake JPEG frame (SOI marker + facing tag + EOI marker)
fn fake_frame(facing: FacingMode) -> Vec<u8> {
    let tag: &[u8] = match facing {
        FacingMode::User => b"user",
        FacingMode::Environment => b"environment",
    };
    let mut frame = vec![0xff, 0xd8];
    frame.extend_from_slice(tag);
    frame.extend_from_slice(&[0xff, 0xd9]);
    frame
}

#[derive(Debug, Default)]
pub struct MockCamera {
    next_id: AtomicU64,
    denied: AtomicBool,
    acquired: AtomicU64,
    released: AtomicU64,
    open: Mutex<HashSet<u64>>,
}

impl MockCamera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the user refusing camera permission
    pub fn set_denied(&self, denied: bool) {
        self.denied.store(denied, Ordering::SeqCst);
    }

    /// Number of streams ever opened
    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Number of streams ever stopped
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Streams currently open
    pub fn open_streams(&self) -> usize {
        self.open.lock().map(|open| open.len()).unwrap_or(0)
    }
}

#[async_trait]
impl CaptureDevice for MockCamera {
    async fn acquire(&self, facing: FacingMode) -> Result<StreamHandle> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(Error::CaptureUnavailable("permission denied".to_string()));
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.open
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?
            .insert(id);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(StreamHandle { id, facing })
    }

    fn grab_frame(&self, stream: &StreamHandle) -> Result<Vec<u8>> {
        let open = self
            .open
            .lock()
            .map_err(|e| Error::Other(format!("Lock poisoned: {}", e)))?;
        if !open.contains(&stream.id) {
            return Err(Error::CaptureUnavailable(format!("stream {} is not open", stream.id)));
        }
        Ok(fake_frame(stream.facing))
    }

    fn release(&self, stream: StreamHandle) {
        if let Ok(mut open) = self.open.lock() {
            open.remove(&stream.id);
        }
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// QR reader that recognises every frame as the same payment node
#[derive(Debug, Clone)]
pub struct FixedCodeReader {
    payload: String,
}

impl FixedCodeReader {
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
        }
    }
}

impl Default for FixedCodeReader {
    fn default() -> Self {
        Self::new("qr_node_8812")
    }
}

impl CodeReader for FixedCodeReader {
    fn decode(&self, frame: &[u8]) -> Option<String> {
        if frame.is_empty() {
            None
        } else {
            Some(self.payload.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_acquire_and_release_are_counted() {
        let camera = MockCamera::new();
        let stream = camera.acquire(FacingMode::User).await.unwrap();
        assert_eq!(camera.open_streams(), 1);

        let frame = camera.grab_frame(&stream).unwrap();
        assert_eq!(&frame[..2], &[0xff, 0xd8]);

        camera.release(stream);
        assert_eq!(camera.acquired(), 1);
        assert_eq!(camera.released(), 1);
        assert_eq!(camera.open_streams(), 0);
    }

    #[tokio::test]
    async fn test_denied_camera() {
        let camera = MockCamera::new();
        camera.set_denied(true);
        let result = camera.acquire(FacingMode::Environment).await;
        assert!(matches!(result, Err(Error::CaptureUnavailable(_))));
        assert_eq!(camera.acquired(), 0);
    }

    #[test]
    fn test_fixed_reader() {
        let reader = FixedCodeReader::default();
        assert_eq!(reader.decode(b"frame").as_deref(), Some("qr_node_8812"));
        assert_eq!(reader.decode(&[]), None);
    }
}
