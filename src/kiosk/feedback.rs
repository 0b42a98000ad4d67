//! Patron feedback
//!
//! A subscriber task turns each published terminal state into a cue for the
//! sink. The sink is called from that task only, never from the machine, so a
//! slow speaker or display cannot hold up the next scan.

use std::sync::Arc;
use tokio::{sync::watch, task::JoinHandle};

use super::state::{OutcomeKind, TerminalState};

/// Audible/visual signal for the patron
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// Back to the neutral screen
    Ready,
    Welcome,
    BorrowMode,
    Success,
    Error,
}

impl Cue {
    /// `None` for transient states that need no signal
    pub fn for_state(state: &TerminalState) -> Option<Cue> {
        match state {
            TerminalState::Idle => Some(Cue::Ready),
            TerminalState::Resolving => None,
            TerminalState::MemberIdentified(_) => Some(Cue::Welcome),
            TerminalState::BorrowMode(_) => Some(Cue::BorrowMode),
            TerminalState::Outcome(outcome) => Some(match outcome.kind {
                OutcomeKind::Success => Cue::Success,
                OutcomeKind::Error => Cue::Error,
            }),
        }
    }
}

/// Fire-and-forget output device
pub trait FeedbackSink: Send + Sync {
    fn emit(&self, cue: Cue, state: &TerminalState);
}

/// Sink that reports cues through the log
pub struct LogFeedback {
    terminal_id: String,
}

impl LogFeedback {
    pub fn new(terminal_id: impl Into<String>) -> Self {
        Self {
            terminal_id: terminal_id.into(),
        }
    }
}

impl FeedbackSink for LogFeedback {
    fn emit(&self, cue: Cue, state: &TerminalState) {
        match state {
            TerminalState::Outcome(outcome) => tracing::info!(
                terminal_id = %self.terminal_id,
                cue = ?cue,
                message = %outcome.message,
                detail = outcome.detail.as_deref().unwrap_or(""),
                "Feedback"
            ),
            TerminalState::MemberIdentified(session) | TerminalState::BorrowMode(session) => {
                tracing::info!(
                    terminal_id = %self.terminal_id,
                    cue = ?cue,
                    member = %session.member.display_name,
                    active_loans = session.loan_count(),
                    "Feedback"
                )
            }
            _ => tracing::info!(terminal_id = %self.terminal_id, cue = ?cue, "Feedback"),
        }
    }
}

/// Forward every state change to the sink until the kiosk stops
pub fn spawn_feedback(
    mut states: watch::Receiver<TerminalState>,
    sink: Arc<dyn FeedbackSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            if let Some(cue) = Cue::for_state(&state) {
                sink.emit(cue, &state);
            }
        }
    })
}
