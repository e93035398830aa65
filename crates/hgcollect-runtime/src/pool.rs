use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed-size pool of worker threads with backpressure on submit.
///
/// Jobs are handed over a rendezvous channel: `execute` blocks the
/// submitting thread until a worker is free to take the job, so at most
/// `size` jobs are ever in flight. `join` is the drain barrier.
pub struct WorkerPool {
    tx: Option<SyncSender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> std::io::Result<Self> {
        let size = size.max(1);
        let (tx, rx) = mpsc::sync_channel::<Job>(0);
        let rx = Arc::new(Mutex::new(rx));

        let mut workers = Vec::with_capacity(size);
        for i in 0..size {
            let rx = Arc::clone(&rx);
            let handle = std::thread::Builder::new()
                .name(format!("collect-worker-{i}"))
                .spawn(move || worker_loop(rx))?;
            workers.push(handle);
        }

        Ok(Self {
            tx: Some(tx),
            workers,
        })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Submit one job, blocking while every worker is busy.
    pub fn execute<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        if let Some(tx) = &self.tx {
            // Fails only once every worker has exited, which cannot happen
            // while the pool still owns the sender.
            let _ = tx.send(Box::new(job));
        }
    }

    /// Drain barrier: returns once every dispatched job has completed.
    pub fn join(mut self) {
        self.tx.take();
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

fn worker_loop(rx: Arc<Mutex<Receiver<Job>>>) {
    loop {
        let job = {
            let guard = rx.lock().unwrap_or_else(|e| e.into_inner());
            guard.recv()
        };
        match job {
            Ok(job) => job(),
            // Channel closed: the pool is draining.
            Err(_) => break,
        }
    }
}
