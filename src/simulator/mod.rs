//! # Legacy System Simulator
//!
//! A TCP server that speaks the legacy line protocol well enough to run the bridge end to
//! end without the real warehouse system. Each accepted connection gets its own task and
//! may carry any number of request/reply exchanges. Package state lives in a ledger actor
//! created on start and dropped on shutdown.
//!
//! Newly created packages advance through `PICKED`, `PACKED`, `SHIPPED` and `DELIVERED`
//! in the background according to a [`ProgressionSchedule`].

pub mod handler;
pub mod ledger;
pub mod schedule;

pub use handler::Dispatcher;
pub use ledger::{LedgerClient, LedgerStatus, SimulatedPackage};
pub use schedule::ProgressionSchedule;

use keyed_actor::ActorClient;
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct SimulatorSettings {
    pub host: String,
    /// 0 picks a free port.
    pub port: u16,
    pub schedule: ProgressionSchedule,
    pub channel_buffer: usize,
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9999,
            schedule: ProgressionSchedule::default(),
            channel_buffer: 256,
        }
    }
}

pub struct LegacySimulator;

impl LegacySimulator {
    /// Binds the listener and starts serving.
    pub async fn start(settings: SimulatorSettings) -> io::Result<SimulatorHandle> {
        let listener = TcpListener::bind((settings.host.as_str(), settings.port)).await?;
        let local_addr = listener.local_addr()?;

        let (ledger_actor, ledger) = ledger::new(settings.channel_buffer);
        let ledger_task = tokio::spawn(ledger_actor.run(()));

        let shutdown = CancellationToken::new();
        let tasks = TaskTracker::new();
        let dispatcher = Dispatcher::new(
            ledger.clone(),
            settings.schedule,
            tasks.clone(),
            shutdown.clone(),
        );

        let accept = tokio::spawn(accept_loop(
            listener,
            dispatcher,
            tasks.clone(),
            shutdown.clone(),
        ));
        info!(%local_addr, "Legacy simulator listening");

        Ok(SimulatorHandle {
            local_addr,
            ledger,
            shutdown,
            tasks,
            accept,
            ledger_task,
        })
    }
}

/// A running simulator. Dropping it without [`SimulatorHandle::shutdown`] leaves it running.
pub struct SimulatorHandle {
    local_addr: SocketAddr,
    ledger: LedgerClient,
    shutdown: CancellationToken,
    tasks: TaskTracker,
    accept: JoinHandle<()>,
    ledger_task: JoinHandle<()>,
}

impl SimulatorHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn is_running(&self) -> bool {
        !self.shutdown.is_cancelled() && !self.accept.is_finished()
    }

    /// Number of packages in the ledger, 0 if the ledger is gone.
    pub async fn package_count(&self) -> usize {
        self.ledger.count().await.unwrap_or(0)
    }

    pub fn ledger(&self) -> &LedgerClient {
        &self.ledger
    }

    /// Stops accepting, closes open connections, abandons progressions and waits for the
    /// ledger actor to exit. The listening socket is released before this returns.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        info!(local_addr = %self.local_addr, "Stopping legacy simulator");
        self.shutdown.cancel();
        self.accept.await?;

        self.tasks.close();
        self.tasks.wait().await;

        drop(self.ledger);
        self.ledger_task.await?;
        info!("Legacy simulator stopped");
        Ok(())
    }
}

async fn accept_loop(
    listener: TcpListener,
    dispatcher: Dispatcher,
    tasks: TaskTracker,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "Connection accepted");
                    tasks.spawn(serve_connection(stream, dispatcher.clone(), shutdown.clone()));
                }
                Err(e) => error!(error = %e, "Error accepting connection"),
            }
        }
    }
}

async fn serve_connection(stream: TcpStream, dispatcher: Dispatcher, shutdown: CancellationToken) {
    let peer = stream.peer_addr().ok();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();

    loop {
        buffer.clear();
        let read = tokio::select! {
            _ = shutdown.cancelled() => break,
            read = reader.read_until(b'\n', &mut buffer) => read,
        };
        match read {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                debug!(?peer, error = %e, "Connection closed");
                break;
            }
        }

        let text = String::from_utf8_lossy(&buffer);
        let line = text.trim_end_matches(['\r', '\n']);
        debug!(?peer, line, "Received");

        let reply = dispatcher.handle_line(line).await.encode();
        debug!(?peer, reply = %reply, "Replying");
        let written = async {
            writer.write_all(reply.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await
        }
        .await;
        if let Err(e) = written {
            warn!(?peer, error = %e, "Failed to write reply");
            break;
        }
    }
    debug!(?peer, "Connection finished");
}
