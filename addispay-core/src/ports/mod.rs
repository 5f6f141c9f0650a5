//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. The core domain
//! depends only on these traits, not on concrete implementations.

mod capture_device;
mod data_service;
pub mod flag_store;
mod host;

pub use capture_device::{CaptureDevice, CodeReader, StreamHandle};
pub use data_service::{AdminDataStore, CardMovement, CardStore, ProfileStore};
pub use flag_store::FlagStore;
pub use host::{Haptic, HostFeedback};
