use chrono::{DateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::config::TrackingConfig;
use crate::notify::SlackNotifier;
use crate::passes::{PassSource, TrackingPass};
use crate::rotor::Rotor;

use super::signal::{self, SignalReceiver, SignalSender};
use super::tracker::{PassTracker, TrackError, TrackOutcome, TrackerPhase};

/// Exclusivity flag for the tracking slot. `try_engage` either claims the
/// slot or reports it busy; the returned guard releases the slot exactly
/// once, when dropped.
#[derive(Clone, Default)]
pub struct Engagement {
    flag: Arc<AtomicBool>,
}

impl Engagement {
    pub fn is_engaged(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn try_engage(&self) -> Option<EngagementGuard> {
        self.flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| EngagementGuard {
                flag: self.flag.clone(),
            })
    }
}

pub struct EngagementGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for EngagementGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub enum ExecutorMode {
    Idle,
    Tracking {
        pass_id: String,
        spacecraft: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        phase: TrackerPhase,
    },
}

impl ExecutorMode {
    pub(crate) fn tracking(pass: &TrackingPass, phase: TrackerPhase) -> Self {
        ExecutorMode::Tracking {
            pass_id: pass.id().to_string(),
            spacecraft: pass.spacecraft().to_string(),
            start: pass.start_time(),
            end: pass.end_time(),
            phase,
        }
    }
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ExecutorStatus {
    pub engaged: bool,
    pub mode: ExecutorMode,
}

struct Shared {
    mode: ExecutorMode,
    abort_tx: Option<oneshot::Sender<()>>,
}

/// Cloneable view of the executor for API handlers and the tracker worker.
#[derive(Clone)]
pub struct ExecutorHandle {
    engagement: Engagement,
    shared: Arc<StdMutex<Shared>>,
}

impl ExecutorHandle {
    fn new() -> Self {
        ExecutorHandle {
            engagement: Engagement::default(),
            shared: Arc::new(StdMutex::new(Shared {
                mode: ExecutorMode::Idle,
                abort_tx: None,
            })),
        }
    }

    pub fn is_engaged(&self) -> bool {
        self.engagement.is_engaged()
    }

    pub fn status(&self) -> ExecutorStatus {
        ExecutorStatus {
            engaged: self.engagement.is_engaged(),
            mode: self.shared.lock().unwrap().mode.clone(),
        }
    }

    /// Hands an abort over to the running tracker. Returns false when no
    /// pass is engaged or the signal could not be delivered.
    pub fn request_abort(&self) -> bool {
        if !self.engagement.is_engaged() {
            return false;
        }
        let tx = self.shared.lock().unwrap().abort_tx.take();
        match tx {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    fn begin(&self, pass: &TrackingPass, abort_tx: oneshot::Sender<()>) {
        let mut shared = self.shared.lock().unwrap();
        shared.mode = ExecutorMode::tracking(pass, TrackerPhase::Pending);
        shared.abort_tx = Some(abort_tx);
    }

    pub(crate) fn set_mode(&self, mode: ExecutorMode) {
        self.shared.lock().unwrap().mode = mode;
    }

    /// Resets the tracking slot to idle and drops any unclaimed abort
    /// sender. Safe to call more than once.
    pub(crate) fn finish(&self) {
        let mut shared = self.shared.lock().unwrap();
        shared.mode = ExecutorMode::Idle;
        shared.abort_tx = None;
    }

    fn engagement(&self) -> &Engagement {
        &self.engagement
    }
}

/// Scheduler loop: keeps one upcoming pass cached and hands it to a
/// tracker worker shortly before its start time.
pub struct Executor {
    rotor: Arc<Rotor>,
    source: Arc<dyn PassSource>,
    notifier: SlackNotifier,
    config: TrackingConfig,
    updates: SignalReceiver,
    handle: ExecutorHandle,
    next: Option<TrackingPass>,
    worker: Option<JoinHandle<Result<TrackOutcome, TrackError>>>,
}

impl Executor {
    pub fn new(
        rotor: Arc<Rotor>,
        source: Arc<dyn PassSource>,
        notifier: SlackNotifier,
        config: TrackingConfig,
    ) -> (Self, ExecutorHandle, SignalSender) {
        let (updates_tx, updates_rx) = signal::channel();
        let handle = ExecutorHandle::new();
        let executor = Executor {
            rotor,
            source,
            notifier,
            config,
            updates: updates_rx,
            handle: handle.clone(),
            next: None,
            worker: None,
        };
        (executor, handle, updates_tx)
    }

    /// Runs until the surrounding task is dropped.
    pub async fn run(mut self) {
        self.refetch();
        loop {
            self.harvest().await;

            if self.updates.try_take() {
                self.refetch();
                continue;
            }

            if self.should_launch() {
                self.launch();
                continue;
            }

            if !self.handle.is_engaged() && self.next_has_elapsed() {
                // The cached pass started while the scheduler slot was
                // free; it can no longer be tracked from the beginning.
                if let Some(ref pass) = self.next {
                    warn!("Skipping pass that already started: {}", pass);
                }
                self.next = None;
                self.refetch();
                continue;
            }

            sleep(self.config.scheduler_poll).await;
        }
    }

    /// Collects the result of a finished tracker worker and looks up the
    /// pass after it.
    async fn harvest(&mut self) {
        if !self.worker.as_ref().is_some_and(|w| w.is_finished()) {
            return;
        }
        if let Some(worker) = self.worker.take() {
            // The worker logs its own outcome; only a panic is news here.
            if let Err(e) = worker.await {
                error!("Tracker task panicked: {}", e);
            }
            self.handle.finish();
            self.refetch();
        }
    }

    fn refetch(&mut self) {
        match self.source.next_pass() {
            Ok(Some(pass)) => {
                info!("Next pass: {}", pass);
                self.next = Some(pass);
            }
            Ok(None) => {
                info!("No upcoming passes");
                self.next = None;
            }
            Err(e) => {
                // Keeps whatever was cached; the next update retries.
                warn!("Failed to fetch next pass: {}", e);
            }
        }
    }

    fn should_launch(&self) -> bool {
        let pass = match self.next {
            Some(ref pass) => pass,
            None => return false,
        };
        if self.handle.is_engaged() {
            return false;
        }
        let now = Utc::now();
        if now >= pass.start_time() {
            return false;
        }
        (pass.start_time() - now)
            .to_std()
            .is_ok_and(|until_start| until_start <= self.config.lookahead)
    }

    fn launch(&mut self) {
        let pass = match self.next.clone() {
            Some(pass) => pass,
            None => return,
        };
        let guard = match self.handle.engagement().try_engage() {
            Some(guard) => guard,
            None => return,
        };

        info!("Engaging tracker for pass {}", pass);

        let (abort_tx, abort_rx) = oneshot::channel();
        self.handle.begin(&pass, abort_tx);

        let notifier = self.notifier.clone();
        let announced = pass.clone();
        tokio::spawn(async move { notifier.send_pass_starting(&announced).await });

        let tracker = PassTracker::new(
            self.rotor.clone(),
            pass,
            self.config.clone(),
            self.handle.clone(),
            guard,
            abort_rx,
        );
        self.worker = Some(tokio::spawn(tracker.run()));
    }

    fn next_has_elapsed(&self) -> bool {
        self.next
            .as_ref()
            .is_some_and(|pass| pass.start_time() <= Utc::now())
    }
}
