//! WebSocket Server
//!
//! Accepts connections and dispatches them to worker threads.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, TrySendError};
use parking_lot::Mutex;

use crate::config::Config;
use crate::error::Result;

use super::Connection;

/// How long the accept loop sleeps when no connection is pending
const ACCEPT_POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Totals across every connection the server handled
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServeSummary {
    /// Connections that closed cleanly
    pub connections: u64,

    /// Connections that ended with an error
    pub failed_connections: u64,

    /// Requests processed across all sessions
    pub messages_processed: u64,

    /// At least one one-shot session reached completion
    pub completed: bool,
}

/// Cloneable handle that stops a running server
#[derive(Debug, Clone)]
pub struct ShutdownHandle(Arc<AtomicBool>);

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_shutdown(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// WebSocket server for wsdsp
///
/// ## Threading:
/// - One acceptor (the thread calling `run`), polling a non-blocking listener
/// - `max_connections` workers, each owning one connection at a time
/// - Accepted sockets reach workers over a bounded crossbeam channel
pub struct Server {
    config: Config,
    listener: TcpListener,
    shutdown: ShutdownHandle,
    summary: Arc<Mutex<ServeSummary>>,
}

impl Server {
    /// Validate the config and bind the listen address
    pub fn bind(config: Config) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            listener,
            shutdown: ShutdownHandle(Arc::new(AtomicBool::new(false))),
            summary: Arc::new(Mutex::new(ServeSummary::default())),
        })
    }

    /// Address actually bound (useful with port 0)
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Start the server (blocking)
    ///
    /// Returns after shutdown once every worker has finished its current
    /// connection.
    pub fn run(&self) -> Result<ServeSummary> {
        tracing::info!(
            "Listening on {} with {} workers",
            self.local_addr()?,
            self.config.max_connections
        );

        let (tx, rx) = channel::bounded::<TcpStream>(self.config.max_connections);

        let mut workers = Vec::with_capacity(self.config.max_connections);
        for index in 0..self.config.max_connections {
            workers.push(self.spawn_worker(index, rx.clone())?);
        }
        drop(rx);

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    tracing::trace!("Accepted connection from {}", addr);
                    match tx.try_send(stream) {
                        Ok(()) => {}
                        Err(TrySendError::Full(_)) => {
                            tracing::warn!("All workers busy, refusing connection from {}", addr);
                        }
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL_INTERVAL);
                }
            }
        }

        tracing::info!("Shutting down, waiting for workers");
        drop(tx);
        for worker in workers {
            if worker.join().is_err() {
                tracing::error!("Worker thread panicked");
            }
        }

        Ok(self.summary.lock().clone())
    }

    fn spawn_worker(&self, index: usize, rx: Receiver<TcpStream>) -> Result<JoinHandle<()>> {
        let config = self.config.clone();
        let shutdown = self.shutdown.clone();
        let summary = Arc::clone(&self.summary);

        let handle = thread::Builder::new()
            .name(format!("wsdsp-worker-{}", index))
            .spawn(move || {
                for stream in rx.iter() {
                    let outcome = Connection::accept(stream, &config).and_then(Connection::handle);

                    {
                        let mut summary = summary.lock();
                        match outcome {
                            Ok(session) => {
                                summary.connections += 1;
                                summary.messages_processed += session.stats.messages_processed;
                                summary.completed |= session.completed;
                            }
                            Err(e) => {
                                tracing::debug!("Connection ended with error: {}", e);
                                summary.failed_connections += 1;
                            }
                        }
                    }

                    if config.exit_after_response {
                        tracing::info!("One-shot connection closed, stopping server");
                        shutdown.shutdown();
                    }
                }
            })?;

        Ok(handle)
    }
}
