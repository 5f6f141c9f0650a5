//! Service layer - state transitions and use-case orchestration
//!
//! Services coordinate domain logic and port interactions. Each service
//! focuses on a specific feature area; the [`crate::controller`] wires
//! them together behind one entry point.

pub mod admin;
pub mod capture;
pub mod logging;
pub mod navigation;
mod session;
pub mod wallet;

pub use admin::{AdminMetrics, AdminService, AdminState, StatusFilter};
pub use capture::{CaptureService, CaptureSession};
pub use logging::{init_tracing, ActivityLog, EntryPoint, LogEntry, LogEvent};
pub use navigation::{transition, Effect, NavEvent, NavigationState, Transition, VERIFICATION_REQUIRED};
pub use session::{Session, SessionService};
pub use wallet::{WalletService, WalletState};
