//! Device setup wizard: scan the base station, pick its location, scan
//! addon sensors (with substrate where needed) and assign one to a plant.

pub mod flow;
pub mod qr;
pub mod session;

pub use flow::{apply, FlowError, FlowEvent};
pub use qr::{ScanError, ScannedCode};
pub use session::{Camera, ProvisioningSession, ScannedSensor, Step};
