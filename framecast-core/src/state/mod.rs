pub mod phase;

pub use phase::{ReceiverPhase, ReceiverStats, ReceiverStatus};
