use crate::locator::ClasspathLocator;
use crate::registry::ClassRegistry;
use cs_model::LoaderConfig;
use cs_parser::LoadError;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

/// Outcome of loading one class, sent back to whoever called `submit`.
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded { name: String },
    Failed { name: String, error: LoadError },
}

enum Job {
    Load(String),
    Shutdown,
}

/// A fixed-size pool of worker threads, each running the full
/// locate -> parse -> format-check -> register pipeline independently.
/// Workers share no state beyond the locator and registry handles: one
/// task per class, never shared parser state, per the "fleet of workers"
/// design.
pub struct Fleet {
    jobs: Sender<Job>,
    results: Receiver<LoadOutcome>,
    workers: Vec<JoinHandle<()>>,
}

impl Fleet {
    pub fn new(
        num_workers: usize,
        locator: Arc<dyn ClasspathLocator>,
        registry: Arc<dyn ClassRegistry>,
        config: LoaderConfig,
    ) -> Self {
        assert!(num_workers > 0, "fleet needs at least one worker");

        let (job_tx, job_rx) = mpsc::channel::<Job>();
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (result_tx, result_rx) = mpsc::channel::<LoadOutcome>();

        let mut workers = Vec::with_capacity(num_workers);
        for id in 0..num_workers {
            let job_rx = Arc::clone(&job_rx);
            let result_tx = result_tx.clone();
            let locator = Arc::clone(&locator);
            let registry = Arc::clone(&registry);

            let handle = thread::Builder::new()
                .name(format!("cs-vm-worker-{}", id))
                .spawn(move || worker_loop(job_rx, result_tx, locator, registry, config))
                .expect("failed to spawn worker thread");
            workers.push(handle);
        }

        Self {
            jobs: job_tx,
            results: result_rx,
            workers,
        }
    }

    /// Queues a class name for loading. Returns an error only if every
    /// worker has already terminated.
    pub fn submit(&self, name: impl Into<String>) -> Result<(), &'static str> {
        self.jobs
            .send(Job::Load(name.into()))
            .map_err(|_| "fleet workers have shut down")
    }

    /// Blocks for the next completed load. Returns `None` once all
    /// outstanding jobs have been drained and the fleet has shut down.
    pub fn recv(&self) -> Option<LoadOutcome> {
        self.results.recv().ok()
    }

    /// Signals every worker to stop after draining queued jobs, then
    /// waits for them to exit.
    pub fn shutdown(mut self) {
        for _ in &self.workers {
            let _ = self.jobs.send(Job::Shutdown);
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(
    job_rx: Arc<Mutex<Receiver<Job>>>,
    result_tx: Sender<LoadOutcome>,
    locator: Arc<dyn ClasspathLocator>,
    registry: Arc<dyn ClassRegistry>,
    config: LoaderConfig,
) {
    loop {
        let job = {
            let rx = job_rx.lock().unwrap();
            rx.recv()
        };

        let name = match job {
            Ok(Job::Load(name)) => name,
            Ok(Job::Shutdown) | Err(_) => break,
        };

        let outcome = match locator.locate(&name) {
            Ok(bytes) => match cs_parser::load_class_file(&bytes, &config) {
                Ok(class) => {
                    registry.insert(name.clone(), Arc::new(class));
                    LoadOutcome::Loaded { name }
                }
                Err(error) => LoadOutcome::Failed { name, error },
            },
            Err(locate_err) => LoadOutcome::Failed {
                name: name.clone(),
                error: LoadError::Io {
                    name,
                    message: locate_err.to_string(),
                },
            },
        };

        if result_tx.send(outcome).is_err() {
            break;
        }
    }
}
