//! Background work for map surfaces.
//!
//! Jobs run on a rayon pool and hand their result back through a one-shot
//! `crossbeam_channel`. The thread that owns the map surface drains it.

use crossbeam_channel::{Receiver, TryRecvError};
use log::{debug, error};

use crate::errors::{Error, Result};

pub struct Dispatcher {
    pool: rayon::ThreadPool,
}

impl Dispatcher {
    /// `threads == 0` lets rayon pick one thread per core.
    pub fn new(threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|index| format!("landmarks-worker-{}", index))
            // Without a handler rayon aborts the process on a panicking job.
            .panic_handler(|_| error!("Background job panicked"))
            .build()
            .map_err(|err| Error::configuration(format!("could not start worker pool: {}", err)))?;
        debug!(threads = pool.current_num_threads(); "Worker pool started");
        Ok(Dispatcher { pool })
    }

    pub fn submit<T, F>(&self, job: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = crossbeam_channel::bounded(1);
        self.pool.spawn(move || {
            // The receiver may already be gone if the view was torn down.
            let _ = tx.send(job());
        });
        Completion { rx }
    }
}

/// Result of one submitted job, delivered to the submitting thread.
#[derive(Debug)]
pub struct Completion<T> {
    rx: Receiver<T>,
}

impl<T> Completion<T> {
    /// Blocks until the job finishes.
    pub fn wait(&self) -> Result<T> {
        self.rx.recv().map_err(|_| Error::resource_load("background job ended without a result"))
    }

    /// `None` while the job is still running.
    pub fn try_take(&self) -> Option<Result<T>> {
        match self.rx.try_recv() {
            Ok(value) => Some(Ok(value)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                Some(Err(Error::resource_load("background job ended without a result")))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn result_arrives_on_the_submitting_thread() {
        let dispatcher = Dispatcher::new(2).unwrap();
        let caller = thread::current().id();

        let completion = dispatcher.submit(move || thread::current().id() != caller);
        assert!(completion.wait().unwrap());
    }

    #[test]
    fn try_take_eventually_yields() {
        let dispatcher = Dispatcher::new(1).unwrap();
        let completion = dispatcher.submit(|| 21 * 2);

        let value = loop {
            if let Some(result) = completion.try_take() {
                break result.unwrap();
            }
            thread::yield_now();
        };
        assert_eq!(value, 42);
    }

    #[test]
    fn panicking_job_reports_an_error() {
        let dispatcher = Dispatcher::new(1).unwrap();
        let completion = dispatcher.submit(|| -> u8 { panic!("boom") });
        assert!(completion.wait().is_err());
    }
}
