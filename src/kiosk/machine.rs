//! Kiosk machine task and its handle
//!
//! One tokio task owns the terminal state and processes commands strictly one
//! at a time. Scans submitted while another scan is resolving are dropped.
//! Idle timer expiries are delivered to the same loop, so they never interleave
//! with a scan being resolved.

use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::sync::{mpsc, oneshot, watch};

use crate::{
    config::KioskConfig,
    error::{AppError, AppResult},
};

use super::{
    collaborators::{normalize_code, Classification, Collaborators},
    state::{Outcome, OutcomeMessage, ScanContext, TerminalState},
    timer::IdleTimer,
    transition::{decide, settle_lend, settle_return, Decision, ItemHolding, ItemLookup, ScanFacts},
};

enum Command {
    Scan {
        code: String,
        reply: oneshot::Sender<TerminalState>,
    },
    SignOff {
        reply: oneshot::Sender<TerminalState>,
    },
}

/// What happened to a submitted scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanReceipt {
    /// The scan was interpreted; carries the resulting state
    Processed(TerminalState),
    /// Another scan was still resolving
    Dropped,
}

/// Cloneable entry point to a running kiosk
#[derive(Clone)]
pub struct KioskHandle {
    commands: mpsc::UnboundedSender<Command>,
    states: watch::Receiver<TerminalState>,
    resolving: Arc<AtomicBool>,
}

impl KioskHandle {
    pub fn current_state(&self) -> TerminalState {
        self.states.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<TerminalState> {
        self.states.clone()
    }

    /// Submit one scanned code and wait for the state it leads to
    pub async fn submit_scan(&self, raw_code: &str) -> AppResult<ScanReceipt> {
        if self
            .resolving
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("Scan dropped, previous scan still resolving");
            return Ok(ScanReceipt::Dropped);
        }

        let (reply, response) = oneshot::channel();
        let command = Command::Scan {
            code: raw_code.to_string(),
            reply,
        };
        if self.commands.send(command).is_err() {
            self.resolving.store(false, Ordering::Release);
            return Err(stopped());
        }

        response.await.map(ScanReceipt::Processed).map_err(|_| stopped())
    }

    /// Patron-initiated return to idle
    pub async fn sign_off(&self) -> AppResult<TerminalState> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(Command::SignOff { reply })
            .map_err(|_| stopped())?;
        response.await.map_err(|_| stopped())
    }
}

fn stopped() -> AppError {
    AppError::KioskUnavailable("kiosk machine has stopped".to_string())
}

/// Start the kiosk machine on the current tokio runtime
///
/// The task ends once every [`KioskHandle`] has been dropped.
pub fn spawn_kiosk(collaborators: Collaborators, config: &KioskConfig) -> KioskHandle {
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (expirations_tx, expirations_rx) = mpsc::unbounded_channel();
    let (states_tx, states_rx) = watch::channel(TerminalState::Idle);
    let resolving = Arc::new(AtomicBool::new(false));

    let machine = KioskMachine {
        state: TerminalState::Idle,
        collaborators,
        timer: IdleTimer::new(config.idle_timeout(), expirations_tx),
        resolve_timeout: config.resolve_timeout(),
        terminal_id: config.terminal_id.clone(),
        states: states_tx,
        resolving: Arc::clone(&resolving),
    };

    tracing::info!(
        terminal_id = %config.terminal_id,
        idle_timeout_secs = config.idle_timeout_secs,
        "Kiosk machine started"
    );
    tokio::spawn(machine.run(commands_rx, expirations_rx));

    KioskHandle {
        commands: commands_tx,
        states: states_rx,
        resolving,
    }
}

struct KioskMachine {
    state: TerminalState,
    collaborators: Collaborators,
    timer: IdleTimer,
    resolve_timeout: Duration,
    terminal_id: String,
    states: watch::Sender<TerminalState>,
    resolving: Arc<AtomicBool>,
}

impl KioskMachine {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut expirations: mpsc::UnboundedReceiver<u64>,
    ) {
        loop {
            tokio::select! {
                command = commands.recv() => match command {
                    Some(command) => self.handle(command).await,
                    None => break,
                },
                Some(generation) = expirations.recv() => self.expire(generation),
            }
        }

        self.timer.disarm();
        tracing::info!(terminal_id = %self.terminal_id, "Kiosk machine stopped");
    }

    async fn handle(&mut self, command: Command) {
        match command {
            Command::Scan { code, reply } => {
                let next = self.resolve_scan(&code).await;
                self.transition(next);
                self.resolving.store(false, Ordering::Release);
                let _ = reply.send(self.state.clone());
            }
            Command::SignOff { reply } => {
                if let Some(member) = self.state.member() {
                    tracing::info!(member_id = member.id, "Patron signed off");
                }
                self.transition(TerminalState::Idle);
                let _ = reply.send(self.state.clone());
            }
        }
    }

    fn expire(&mut self, generation: u64) {
        if !self.timer.is_current(generation) {
            tracing::debug!(generation, "Ignoring stale idle timer expiry");
            return;
        }

        tracing::info!(
            terminal_id = %self.terminal_id,
            from = self.state.name(),
            idle_secs = self.timer.duration().as_secs(),
            "Idle timeout, discarding terminal context"
        );
        self.transition(TerminalState::Idle);
    }

    /// Install a new state, rearm or disarm the idle timer and notify subscribers
    fn transition(&mut self, next: TerminalState) {
        if next.is_idle() {
            self.timer.disarm();
        } else {
            self.timer.rearm();
        }

        tracing::debug!(
            terminal_id = %self.terminal_id,
            from = self.state.name(),
            to = next.name(),
            "Terminal state changed"
        );

        self.state = next.clone();
        self.states.send_replace(next);
    }

    /// The deadline bounds classification and lookups only. A lend or return
    /// already issued to the ledger is always awaited to completion.
    async fn resolve_scan(&mut self, code: &str) -> TerminalState {
        let previous = std::mem::replace(&mut self.state, TerminalState::Resolving);
        self.states.send_replace(TerminalState::Resolving);

        let lookup = prepare(&self.collaborators, previous.context(), code);
        let decision = match tokio::time::timeout(self.resolve_timeout, lookup).await {
            Ok(decision) => decision,
            Err(_) => {
                tracing::error!(
                    terminal_id = %self.terminal_id,
                    timeout_secs = self.resolve_timeout.as_secs(),
                    "Scan resolution timed out"
                );
                system_error(previous.context())
            }
        };

        execute(&self.collaborators, decision).await
    }
}

fn system_error(context: ScanContext<'_>) -> Decision {
    Decision::Settle(TerminalState::Outcome(Outcome::error(
        OutcomeMessage::SystemError,
        context.borrow_session(),
    )))
}

/// Classify a scan and consult the ledger to decide what it means
async fn prepare(collaborators: &Collaborators, context: ScanContext<'_>, code: &str) -> Decision {
    let classification = match normalize_code(code) {
        Some(code) => collaborators.classifier.classify(code).await,
        None => Classification::Unrecognized,
    };

    match gather(collaborators, context, classification).await {
        Ok(facts) => decide(context, facts),
        Err(e) => {
            tracing::error!(error = %e, "Ledger lookup failed");
            system_error(context)
        }
    }
}

/// Carry out a decision against the ledger
async fn execute(collaborators: &Collaborators, decision: Decision) -> TerminalState {
    match decision {
        Decision::Settle(next) => next,
        Decision::Identify(session) => {
            tracing::info!(
                member_id = session.member.id,
                active_loans = session.loan_count(),
                "Member identified"
            );
            collaborators.record_visit(session.member.id);
            TerminalState::MemberIdentified(session)
        }
        Decision::Lend { session, item } => {
            let result = collaborators
                .ledger
                .create_loan(session.member.id, item.id)
                .await;
            match &result {
                Ok(loan) => tracing::info!(
                    loan_id = loan.id,
                    member_id = session.member.id,
                    item_id = item.id,
                    "Item borrowed"
                ),
                Err(e) if e.is_rejection() => {
                    tracing::warn!(item_id = item.id, error = %e, "Ledger rejected loan")
                }
                Err(e) => tracing::error!(item_id = item.id, error = %e, "Failed to create loan"),
            }
            settle_lend(session, &item, result)
        }
        Decision::Return { session, item, loan } => {
            let result = collaborators.ledger.close_loan(loan.id).await;
            match &result {
                Ok(_) => tracing::info!(
                    loan_id = loan.id,
                    member_id = session.member.id,
                    item_id = item.id,
                    "Item returned"
                ),
                Err(e) => tracing::error!(loan_id = loan.id, error = %e, "Failed to close loan"),
            }
            settle_return(session, &item, result)
        }
    }
}

/// Fetch the ledger facts a classified scan needs in this context
async fn gather(
    collaborators: &Collaborators,
    context: ScanContext<'_>,
    classification: Classification,
) -> AppResult<ScanFacts> {
    let ledger = &collaborators.ledger;

    let facts = match classification {
        Classification::Unrecognized => ScanFacts::Unrecognized,
        Classification::Member(member) => {
            let active_loans = ledger.active_loans(member.id).await?;
            ScanFacts::Member {
                member,
                active_loans,
            }
        }
        Classification::Item(item) => {
            let lookup = match context {
                ScanContext::Borrowing(session) => {
                    let open_loan = ledger.open_loan_for_item(item.id).await?;
                    let member_loans = ledger.active_loans(session.member.id).await?;
                    Some(ItemLookup {
                        holding: ItemHolding::from_ledger(&item, open_loan),
                        member_loans,
                    })
                }
                ScanContext::Neutral | ScanContext::Identified(_) => None,
            };
            ScanFacts::Item { item, lookup }
        }
    };

    Ok(facts)
}
