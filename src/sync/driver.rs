//! Polling driver: the long-lived background loop.
//!
//! Uses a background tokio task; the public API talks to it over an mpsc
//! command channel. A restart or stop drops whatever the loop is awaiting,
//! which cancels the in-flight refresh or delay immediately.

use super::coordinator::SyncCoordinator;

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delay between availability probes and between live-rate refreshes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum DriverPhase {
    Stopped = 0,
    CheckingAvailability = 1,
    /// At least one of coins, currencies or history has not loaded yet.
    Loading = 2,
    Updating = 3,
}

impl From<u8> for DriverPhase {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::CheckingAvailability,
            2 => Self::Loading,
            3 => Self::Updating,
            _ => Self::Stopped,
        }
    }
}

// ─── Commands from public API to background task ─────────────────────────────

enum Command {
    Restart,
    Stop,
}

/// Why the inner cycle returned.
enum Interrupt {
    Restart,
    Stop,
}

struct TaskState {
    coordinator: SyncCoordinator,
    interval: Duration,
    cmd_rx: mpsc::Receiver<Command>,
    phase: Arc<AtomicU8>,
}

impl TaskState {
    fn set_phase(&self, phase: DriverPhase) {
        self.phase.store(phase as u8, Ordering::SeqCst);
    }
}

// ─── Public PollingDriver ────────────────────────────────────────────────────

/// Restartable polling loop over a `SyncCoordinator`.
pub struct PollingDriver {
    coordinator: SyncCoordinator,
    interval: Duration,
    cmd_tx: Option<mpsc::Sender<Command>>,
    task_handle: Option<JoinHandle<()>>,
    phase: Arc<AtomicU8>,
}

impl PollingDriver {
    /// Create a driver. Does not start polling yet.
    pub fn new(coordinator: SyncCoordinator, interval: Duration) -> Self {
        Self {
            coordinator,
            interval,
            cmd_tx: None,
            task_handle: None,
            phase: Arc::new(AtomicU8::new(DriverPhase::Stopped as u8)),
        }
    }

    /// Spawn the background loop. No-op when already running.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        self.cmd_tx = Some(cmd_tx);
        self.phase
            .store(DriverPhase::CheckingAvailability as u8, Ordering::SeqCst);

        let state = TaskState {
            coordinator: self.coordinator.clone(),
            interval: self.interval,
            cmd_rx,
            phase: Arc::clone(&self.phase),
        };
        self.task_handle = Some(tokio::spawn(run_task(state)));
        tracing::info!(interval = ?self.interval, "Polling started");
    }

    /// Stop the loop, then wait for pending cache writes.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.cmd_tx.take() {
            let _ = tx.send(Command::Stop).await;
        }

        if let Some(handle) = self.task_handle.take() {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    tracing::warn!("Polling task ended abnormally: {}", e);
                }
            }
        }

        self.phase.store(DriverPhase::Stopped as u8, Ordering::SeqCst);
        self.coordinator.flush_cache().await;
        tracing::info!("Polling stopped");
    }

    /// Cancel the current cycle and start over at the availability check.
    pub fn on_selection_changed(&self) {
        if let Some(tx) = &self.cmd_tx {
            if let Err(mpsc::error::TrySendError::Full(_)) = tx.try_send(Command::Restart) {
                tracing::debug!("Restart already queued");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn phase(&self) -> DriverPhase {
        DriverPhase::from(self.phase.load(Ordering::SeqCst))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl Drop for PollingDriver {
    fn drop(&mut self) {
        if let Some(handle) = self.task_handle.take() {
            handle.abort();
        }
    }
}

// ─── Background task ─────────────────────────────────────────────────────────

async fn run_task(mut state: TaskState) {
    loop {
        match run_cycle(&mut state).await {
            Interrupt::Restart => {
                tracing::debug!("Polling cycle restarted");
                // Collapse a burst of selection changes into one restart.
                while let Ok(cmd) = state.cmd_rx.try_recv() {
                    if matches!(cmd, Command::Stop) {
                        state.set_phase(DriverPhase::Stopped);
                        return;
                    }
                }
            }
            Interrupt::Stop => break,
        }
    }
    state.set_phase(DriverPhase::Stopped);
}

/// One pass from the availability gate into the steady loop. Only returns
/// when a command interrupts it.
async fn run_cycle(state: &mut TaskState) -> Interrupt {
    let coordinator = state.coordinator.clone();

    // ── 1. Wait for the source ───────────────────────────────────────────
    state.set_phase(DriverPhase::CheckingAvailability);
    loop {
        match interruptible(&mut state.cmd_rx, coordinator.check_availability()).await {
            Err(interrupt) => return interrupt,
            Ok(true) => break,
            Ok(false) => {
                if let Err(interrupt) =
                    interruptible(&mut state.cmd_rx, tokio::time::sleep(state.interval)).await
                {
                    return interrupt;
                }
            }
        }
    }

    // ── 2. Steady cycle ──────────────────────────────────────────────────
    loop {
        let loaded = coordinator.loaded().await;
        if !loaded.all() {
            state.set_phase(DriverPhase::Loading);
            let load = async {
                tokio::join!(
                    async {
                        if !loaded.coins {
                            coordinator.refresh_coins().await;
                        }
                    },
                    async {
                        if !loaded.currencies {
                            coordinator.refresh_currencies().await;
                        }
                    },
                    async {
                        if !loaded.history {
                            coordinator.refresh_history().await;
                        }
                    },
                )
            };
            if let Err(interrupt) = interruptible(&mut state.cmd_rx, load).await {
                return interrupt;
            }
        }
        if coordinator.loaded().await.all() {
            state.set_phase(DriverPhase::Updating);
        }

        if let Err(interrupt) =
            interruptible(&mut state.cmd_rx, coordinator.refresh_current_rate()).await
        {
            return interrupt;
        }

        if let Err(interrupt) =
            interruptible(&mut state.cmd_rx, tokio::time::sleep(state.interval)).await
        {
            return interrupt;
        }
    }
}

/// Run `fut` unless a command arrives first. A closed channel counts as stop.
async fn interruptible<F: Future>(
    cmd_rx: &mut mpsc::Receiver<Command>,
    fut: F,
) -> Result<F::Output, Interrupt> {
    tokio::select! {
        out = fut => Ok(out),
        cmd = cmd_rx.recv() => Err(match cmd {
            Some(Command::Restart) => Interrupt::Restart,
            Some(Command::Stop) | None => Interrupt::Stop,
        }),
    }
}
