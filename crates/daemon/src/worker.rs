//! crates/daemon/src/worker.rs
//!
//! Worker threads that serve upcalls.
//!
//! The serving thread pulls requests from the transport and hands them to a
//! fixed set of workers over a bounded channel, which applies backpressure
//! when every worker is busy. Each worker owns its reply buffer, dispatches
//! the request and sends the reply itself. Upcalls never share mutable state.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{Receiver, Sender, bounded};
use logging::trace_upcall;

use crate::config::DaemonConfig;
use crate::dispatcher::UpcallDispatcher;
use crate::transport::UpcallTransport;

const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Counters describing what a pool did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct PoolStats {
    /// Upcalls answered with a reply.
    pub replied: u64,
    /// Requests whose envelope could not be processed.
    pub failed: u64,
    /// Requests refused for exceeding the size limit.
    pub rejected: u64,
    /// Replies the transport failed to deliver.
    pub send_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    replied: AtomicU64,
    failed: AtomicU64,
    rejected: AtomicU64,
    send_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> PoolStats {
        PoolStats {
            replied: self.replied.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

/// A running set of upcall workers.
pub struct UpcallWorkerPool {
    sender: Sender<Vec<u8>>,
    workers: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
    max_request: usize,
}

// Manual Debug impl because JoinHandle doesn't implement Debug
impl std::fmt::Debug for UpcallWorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpcallWorkerPool")
            .field("num_workers", &self.workers.len())
            .field("max_request", &self.max_request)
            .field("stats", &self.counters.snapshot())
            .finish()
    }
}

impl UpcallWorkerPool {
    /// Spawns `config.workers()` workers replying through `transport`.
    pub fn spawn<T>(
        config: &DaemonConfig,
        dispatcher: Arc<UpcallDispatcher>,
        transport: Arc<T>,
    ) -> io::Result<Self>
    where
        T: UpcallTransport + ?Sized + 'static,
    {
        let workers = config.workers().get();
        let (sender, receiver) = bounded(workers * QUEUE_DEPTH_PER_WORKER);
        let counters = Arc::new(Counters::default());

        let mut handles = Vec::with_capacity(workers);
        for index in 0..workers {
            let context = WorkerContext {
                receiver: receiver.clone(),
                dispatcher: Arc::clone(&dispatcher),
                transport: Arc::clone(&transport),
                counters: Arc::clone(&counters),
                reply: vec![0u8; config.reply_buffer()],
            };
            let handle = thread::Builder::new()
                .name(format!("upcall-worker-{index}"))
                .spawn(move || context.run())?;
            handles.push(handle);
        }

        Ok(Self {
            sender,
            workers: handles,
            counters,
            max_request: config.max_request(),
        })
    }

    /// Queues one request, blocking while every worker is busy.
    pub fn submit(&self, request: Vec<u8>) -> io::Result<()> {
        if request.len() > self.max_request {
            self.counters.rejected.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(
                target: "upcalld::upcall",
                len = request.len(),
                limit = self.max_request,
                "request exceeds size limit"
            );
            return Ok(());
        }
        self.sender.send(request).map_err(|_| {
            io::Error::new(
                io::ErrorKind::BrokenPipe,
                "upcall worker threads have terminated",
            )
        })
    }

    /// Number of worker threads.
    #[must_use]
    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot()
    }

    /// Lets queued requests finish, then joins every worker.
    pub fn shutdown(self) -> io::Result<PoolStats> {
        let Self {
            sender,
            workers,
            counters,
            ..
        } = self;
        drop(sender);
        for handle in workers {
            handle
                .join()
                .map_err(|_| io::Error::other("upcall worker thread panicked"))?;
        }
        Ok(counters.snapshot())
    }

    /// Serves `transport` until it reports end of stream.
    pub fn serve<T>(
        config: &DaemonConfig,
        dispatcher: Arc<UpcallDispatcher>,
        transport: Arc<T>,
    ) -> io::Result<PoolStats>
    where
        T: UpcallTransport + ?Sized + 'static,
    {
        let pool = Self::spawn(config, dispatcher, Arc::clone(&transport))?;
        tracing::info!(
            target: "upcalld::upcall",
            workers = pool.num_workers(),
            "serving upcalls"
        );

        let received = loop {
            match transport.recv() {
                Ok(Some(request)) => {
                    if let Err(err) = pool.submit(request) {
                        break Err(err);
                    }
                }
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        let stats = pool.shutdown()?;
        received?;
        tracing::info!(target: "upcalld::upcall", ?stats, "transport closed");
        Ok(stats)
    }
}

struct WorkerContext<T: ?Sized> {
    receiver: Receiver<Vec<u8>>,
    dispatcher: Arc<UpcallDispatcher>,
    transport: Arc<T>,
    counters: Arc<Counters>,
    reply: Vec<u8>,
}

impl<T: UpcallTransport + ?Sized> WorkerContext<T> {
    fn run(mut self) {
        while let Ok(request) = self.receiver.recv() {
            match self.dispatcher.process(&request, &mut self.reply) {
                Ok(len) => {
                    if let Err(err) = self.transport.send(&self.reply[..len]) {
                        self.counters.send_failures.fetch_add(1, Ordering::Relaxed);
                        tracing::warn!(target: "upcalld::upcall", error = %err, "reply not delivered");
                    } else {
                        self.counters.replied.fetch_add(1, Ordering::Relaxed);
                    }
                }
                Err(err) => {
                    self.counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        target: "upcalld::upcall",
                        error = %err,
                        len = request.len(),
                        "dropping unreadable upcall"
                    );
                }
            }
        }
        trace_upcall!("worker exiting");
    }
}
