//! Session state and the save workflow that links RTC work items to Git
//! host artifacts.

pub mod gather;
pub mod orchestrator;
pub mod probe;
pub mod service;
pub mod session;

pub use gather::gather_all;
pub use orchestrator::{BackLinkOutcome, LinkOrchestrator, LinkSelection, SaveReport, SaveState};
pub use probe::{HostProbe, HttpHostProbe};
pub use service::WorkItemService;
pub use session::{SelectionTicket, SessionContext, TokenStatus};
