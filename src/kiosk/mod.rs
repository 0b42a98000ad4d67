//! Self-service kiosk
//!
//! Interprets the stream of scans arriving at a shared terminal: identify a
//! member, confirm with a second card scan, then borrow or return items. The
//! terminal falls back to idle after a quiet period so the next patron never
//! inherits the previous one's session.

pub mod collaborators;
pub mod feedback;
pub mod machine;
/// Test support, see the module docs
pub mod memory;
pub mod scanner;
pub mod state;
pub mod timer;
pub mod transition;

pub use collaborators::{Classification, CodeClassifier, Collaborators, LoanLedger, VisitLog};
pub use feedback::{spawn_feedback, Cue, FeedbackSink, LogFeedback};
pub use machine::{spawn_kiosk, KioskHandle, ScanReceipt};
pub use scanner::run_scanner;
pub use state::{Outcome, OutcomeKind, OutcomeMessage, PatronSession, TerminalState};
