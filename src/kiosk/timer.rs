//! Idle timer
//!
//! A single-shot countdown owned by the kiosk machine. Every arming gets a new
//! generation number and the expiry is delivered as that number on a channel
//! read by the machine loop, so an expiry racing with a newer transition is
//! recognised as stale and ignored.

use std::time::Duration;
use tokio::{
    sync::{mpsc, oneshot},
    time::Instant,
};

pub struct IdleTimer {
    duration: Duration,
    generation: u64,
    /// Cancels the running countdown; `None` while disarmed
    cancel_tx: Option<oneshot::Sender<()>>,
    expirations: mpsc::UnboundedSender<u64>,
}

impl IdleTimer {
    pub fn new(duration: Duration, expirations: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            duration,
            generation: 0,
            cancel_tx: None,
            expirations,
        }
    }

    /// Restart the countdown from the full duration
    pub fn rearm(&mut self) {
        self.disarm();
        self.generation += 1;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        self.cancel_tx = Some(cancel_tx);

        tokio::spawn(countdown(
            self.generation,
            Instant::now() + self.duration,
            self.expirations.clone(),
            cancel_rx,
        ));
    }

    /// Stop the countdown, if any
    pub fn disarm(&mut self) {
        if let Some(tx) = self.cancel_tx.take() {
            // The countdown may already have fired
            let _ = tx.send(());
        }
    }

    pub fn is_armed(&self) -> bool {
        self.cancel_tx.is_some()
    }

    /// True when `generation` belongs to the countdown currently armed
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_armed() && generation == self.generation
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

async fn countdown(
    generation: u64,
    deadline: Instant,
    expirations: mpsc::UnboundedSender<u64>,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    tokio::select! {
        _ = tokio::time::sleep_until(deadline) => {
            let _ = expirations.send(generation);
        }
        _ = &mut cancel_rx => {}
    }
}
