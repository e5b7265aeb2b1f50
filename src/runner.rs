use crate::cv::net::PersonDetector;
use crate::cv::{CaptureBackend, CaptureDevice, grab_frame};
use crate::journal::Journal;
use anyhow::Result;
use log::{debug, error, info, warning};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task;

/// Result of one capture-and-detect run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Counted(usize),
    NoCamera,
    Failed(String),
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Counted(n) => write!(f, "Number of people detected: {n}"),
            Outcome::NoCamera => write!(f, "Error: No camera detected."),
            Outcome::Failed(reason) => write!(f, "Error: {reason}"),
        }
    }
}

/// Grabs a frame from one camera and counts the people in it.
pub struct PeopleCounter<B, D> {
    backend: B,
    detector: Mutex<D>,
    camera_index: i32,
}

impl<B, D> PeopleCounter<B, D>
where
    B: CaptureBackend,
    D: PersonDetector<<B::Device as CaptureDevice>::Frame>,
{
    pub fn new(backend: B, detector: D, camera_index: i32) -> Self {
        Self {
            backend,
            detector: Mutex::new(detector),
            camera_index,
        }
    }

    pub fn count(&self) -> Result<Outcome> {
        let Some(frame) = grab_frame(&self.backend, self.camera_index)? else {
            return Ok(Outcome::NoCamera);
        };

        let mut detector = match self.detector.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                debug!("Poisoned detector");
                poisoned.into_inner()
            }
        };
        let people = detector.count_people(&frame)?;
        Ok(Outcome::Counted(people))
    }
}

type Job = Arc<dyn Fn() -> Result<Outcome> + Send + Sync>;
type Notifier = Arc<dyn Fn() + Send + Sync>;

/// Runs at most one job at a time off the UI thread.
///
/// `busy` is set by [`Dispatcher::trigger`] and cleared by
/// [`Dispatcher::poll`] once the outcome has been written to the journal.
pub struct Dispatcher {
    runtime: Handle,
    job: Job,
    busy: Arc<AtomicBool>,
    done_tx: mpsc::UnboundedSender<Outcome>,
    done_rx: mpsc::UnboundedReceiver<Outcome>,
    notify: Notifier,
}

impl Dispatcher {
    pub fn new<F>(runtime: Handle, job: F) -> Self
    where
        F: Fn() -> Result<Outcome> + Send + Sync + 'static,
    {
        let (done_tx, done_rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            job: Arc::new(job),
            busy: Arc::new(AtomicBool::new(false)),
            done_tx,
            done_rx,
            notify: Arc::new(|| {}),
        }
    }

    /// Called from the worker side after an outcome is queued.
    pub fn set_notifier<F>(&mut self, notify: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.notify = Arc::new(notify);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Starts a run unless one is already in flight.
    pub fn trigger(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("Run requested while busy, ignoring");
            return false;
        }

        info!("Starting capture");
        let job = self.job.clone();
        let done_tx = self.done_tx.clone();
        let notify = self.notify.clone();

        self.runtime.spawn(async move {
            let outcome = match task::spawn_blocking(move || job()).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(e)) => {
                    error!("Capture failed: {:#}", e);
                    Outcome::Failed(format!("{e:#}"))
                }
                Err(e) => {
                    error!("Capture worker did not finish: {}", e);
                    Outcome::Failed("capture worker stopped unexpectedly".into())
                }
            };

            if done_tx.send(outcome).is_err() {
                warning!("Capture finished after the window closed");
            }
            notify();
        });

        true
    }

    /// Writes finished runs to `journal` and re-arms the trigger.
    ///
    /// Returns how many runs completed.
    pub fn poll(&mut self, journal: &mut Journal) -> usize {
        let mut completed = 0;
        while let Ok(outcome) = self.done_rx.try_recv() {
            info!("{}", outcome);
            journal.append(&outcome.to_string());
            self.busy.store(false, Ordering::Release);
            completed += 1;
        }
        completed
    }
}
