//! Terminal interaction state
//!
//! What the kiosk currently believes is happening at the terminal. The value
//! lives only in memory; the loan ledger stays the source of truth for who
//! holds which item.

use serde::{Serialize, Serializer};
use std::fmt;

use crate::models::{Loan, Member};

/// An identified member together with the open loans fetched for them
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatronSession {
    pub member: Member,
    pub active_loans: Vec<Loan>,
}

impl PatronSession {
    pub fn new(member: Member, active_loans: Vec<Loan>) -> Self {
        Self {
            member,
            active_loans,
        }
    }

    pub fn loan_count(&self) -> usize {
        self.active_loans.len()
    }

    pub fn at_borrow_limit(&self) -> bool {
        self.loan_count() >= self.member.borrow_limit()
    }

    pub fn is_member(&self, member_id: i32) -> bool {
        self.member.id == member_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    Error,
}

/// Patron-facing message of an outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeMessage {
    Borrowed,
    Returned,
    ScanMemberCardFirst,
    ScanCardAgain,
    UnrecognizedCode,
    HeldByAnotherMember,
    BorrowLimitReached,
    SystemError,
}

impl OutcomeMessage {
    pub fn text(&self) -> &'static str {
        match self {
            OutcomeMessage::Borrowed => "borrowed",
            OutcomeMessage::Returned => "returned",
            OutcomeMessage::ScanMemberCardFirst => "scan member card first",
            OutcomeMessage::ScanCardAgain => "scan card again to enter borrow mode",
            OutcomeMessage::UnrecognizedCode => "unrecognized code",
            OutcomeMessage::HeldByAnotherMember => "item held by another member",
            OutcomeMessage::BorrowLimitReached => "borrow limit reached",
            OutcomeMessage::SystemError => "system error",
        }
    }
}

impl fmt::Display for OutcomeMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl Serialize for OutcomeMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.text())
    }
}

/// Result of the last action, displayed until the next scan or the idle timeout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub kind: OutcomeKind,
    pub message: OutcomeMessage,
    pub detail: Option<String>,
    /// Borrow session still in effect, when the outcome was produced in borrow mode
    pub session: Option<PatronSession>,
}

impl Outcome {
    pub fn success(
        message: OutcomeMessage,
        detail: impl Into<String>,
        session: PatronSession,
    ) -> Self {
        Self {
            kind: OutcomeKind::Success,
            message,
            detail: Some(detail.into()),
            session: Some(session),
        }
    }

    pub fn error(message: OutcomeMessage, session: Option<PatronSession>) -> Self {
        Self {
            kind: OutcomeKind::Error,
            message,
            detail: None,
            session,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TerminalState {
    Idle,
    Resolving,
    MemberIdentified(PatronSession),
    BorrowMode(PatronSession),
    Outcome(Outcome),
}

/// The part of a state that matters when interpreting the next scan
#[derive(Debug, Clone, Copy)]
pub enum ScanContext<'a> {
    Neutral,
    Identified(&'a PatronSession),
    Borrowing(&'a PatronSession),
}

impl ScanContext<'_> {
    /// Borrow session to keep attached to an error outcome
    pub fn borrow_session(&self) -> Option<PatronSession> {
        match self {
            ScanContext::Borrowing(session) => Some((*session).clone()),
            _ => None,
        }
    }
}

impl TerminalState {
    pub fn name(&self) -> &'static str {
        match self {
            TerminalState::Idle => "idle",
            TerminalState::Resolving => "resolving",
            TerminalState::MemberIdentified(_) => "member_identified",
            TerminalState::BorrowMode(_) => "borrow_mode",
            TerminalState::Outcome(_) => "outcome",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, TerminalState::Idle)
    }

    /// Outcomes keep borrow mode alive only when they carry a session
    pub fn context(&self) -> ScanContext<'_> {
        match self {
            TerminalState::Idle | TerminalState::Resolving => ScanContext::Neutral,
            TerminalState::MemberIdentified(session) => ScanContext::Identified(session),
            TerminalState::BorrowMode(session) => ScanContext::Borrowing(session),
            TerminalState::Outcome(outcome) => match &outcome.session {
                Some(session) => ScanContext::Borrowing(session),
                None => ScanContext::Neutral,
            },
        }
    }

    /// Member currently attributed to the terminal, if any
    pub fn member(&self) -> Option<&Member> {
        match self.context() {
            ScanContext::Neutral => None,
            ScanContext::Identified(session) | ScanContext::Borrowing(session) => {
                Some(&session.member)
            }
        }
    }
}
