//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - In-memory fixture backend for the data store ports
//! - In-memory and JSON-file flag stores for the session flags
//! - Simulated camera and QR reader for the capture ports
//! - Recording host for alerts, haptics and scrolling

pub mod file_flags;
pub mod memory_flags;
pub mod mock_api;
pub mod mock_camera;
pub mod recording_host;

pub use file_flags::FileFlagStore;
pub use memory_flags::MemoryFlagStore;
pub use mock_api::{MockApi, MockConfig};
pub use mock_camera::{FixedCodeReader, MockCamera};
pub use recording_host::{FeedbackEvent, RecordingHost};
