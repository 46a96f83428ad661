//! UDP reflector engine.
//!
//! # Responsibilities
//! - Expand and bind every configured address
//! - Echo datagrams back to their sender until shutdown
//! - Drop datagrams longer than `max_length`
//! - Report listener lifecycle through the configured event handler
//!
//! # Design Decisions
//! - One task per bound socket, joined before `listen_and_serve` returns
//! - `--thread` moves each socket onto its own OS thread with a
//!   current-thread runtime instead of the shared worker pool
//! - ECN mode never replies over UDP
//! - A socket error stops every listener and fails the serve call

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread;

use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinSet;

use super::{BindSpec, Engine, EngineError};
use crate::config::ServerConfig;
use crate::events::{Event, EventCode};
use crate::lifecycle::shutdown::{Shutdown, ShutdownListener};

/// Largest UDP payload.
const MAX_DATAGRAM: usize = 64 * 1024;

/// Default engine: a UDP echo server.
#[derive(Debug, Clone)]
pub struct Reflector {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    config: ServerConfig,
    shutdown: Shutdown,
}

impl Reflector {
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    async fn bind_all(&self) -> Result<Vec<UdpSocket>, EngineError> {
        let config = &self.inner.config;
        let mut sockets = Vec::new();
        for raw in &config.addrs {
            let spec = BindSpec::parse(raw)?;
            for addr in spec.expand(raw, config.ip_version).await? {
                let socket = UdpSocket::bind(addr)
                    .await
                    .map_err(|source| EngineError::Bind { addr, source })?;
                if config.ttl > 0 {
                    socket.set_ttl(config.ttl)?;
                }
                sockets.push(socket);
            }
        }
        Ok(sockets)
    }
}

impl Engine for Reflector {
    fn construct(config: ServerConfig) -> Result<Self, EngineError> {
        // validate addresses up front so typos fail before serving
        for raw in &config.addrs {
            BindSpec::parse(raw)?;
        }
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                shutdown: Shutdown::new(),
            }),
        })
    }

    fn listen_and_serve(&self) -> impl std::future::Future<Output = Result<(), EngineError>> + Send {
        let this = self.clone();
        async move {
            let sockets = this.bind_all().await?;
            let inner = &this.inner;
            inner.config.emit(Event::new(
                EventCode::ServerStart,
                format!("starting with {} listener(s)", sockets.len()),
            ));

            let mut tasks = JoinSet::new();
            for socket in sockets {
                let listener = inner.shutdown.subscribe();
                if inner.config.thread_lock {
                    if let Err(e) = spawn_pinned(&mut tasks, this.inner.clone(), socket, listener) {
                        inner.shutdown.trigger();
                        while tasks.join_next().await.is_some() {}
                        return Err(e);
                    }
                } else {
                    tasks.spawn(serve_socket(this.inner.clone(), socket, listener));
                }
            }

            let mut result = Ok(());
            while let Some(joined) = tasks.join_next().await {
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(e) => Err(EngineError::Io(std::io::Error::other(e))),
                };
                if let Err(e) = outcome {
                    if result.is_ok() {
                        // stop the remaining listeners, keep the first error
                        inner.shutdown.trigger();
                        result = Err(e);
                    }
                }
            }

            inner
                .config
                .emit(Event::new(EventCode::ServerStop, "server stopped"));
            result
        }
    }

    fn shutdown(&self) {
        if self.inner.shutdown.trigger() {
            tracing::info!("Graceful shutdown requested");
        }
    }
}

/// Serve `socket` on a dedicated thread; the returned task resolves when it exits.
fn spawn_pinned(
    tasks: &mut JoinSet<Result<(), EngineError>>,
    inner: Arc<Inner>,
    socket: UdpSocket,
    shutdown: ShutdownListener,
) -> Result<(), EngineError> {
    let socket = socket.into_std()?;
    let local = socket.local_addr()?;
    let (done_tx, done_rx) = oneshot::channel();

    thread::Builder::new()
        .name(format!("listener-{local}"))
        .spawn(move || {
            let outcome = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(EngineError::Io)
                .and_then(|rt| {
                    rt.block_on(async move {
                        let socket = UdpSocket::from_std(socket)?;
                        serve_socket(inner, socket, shutdown).await
                    })
                });
            let _ = done_tx.send(outcome);
        })?;
    tracing::debug!(%local, "Listener pinned to its own thread");

    tasks.spawn(async move {
        done_rx.await.unwrap_or_else(|_| {
            Err(EngineError::Io(std::io::Error::other("listener thread exited")))
        })
    });
    Ok(())
}

async fn serve_socket(
    inner: Arc<Inner>,
    socket: UdpSocket,
    mut shutdown: ShutdownListener,
) -> Result<(), EngineError> {
    let config = &inner.config;
    let local = socket.local_addr()?;
    config.emit(Event::new(EventCode::ListenerStart, "listener started").with_local(local));

    let limit = if config.max_length > 0 {
        config.max_length
    } else {
        MAX_DATAGRAM
    };
    // one extra byte so oversized datagrams are detectable
    let mut buf = vec![0u8; (limit + 1).min(MAX_DATAGRAM)];

    let result = loop {
        tokio::select! {
            _ = shutdown.wait() => break Ok(()),
            received = socket.recv_from(&mut buf) => match received {
                Ok((n, peer)) => {
                    if let Err(e) = reflect(config, &socket, &buf[..n], local, peer).await {
                        break Err(e);
                    }
                }
                Err(e) => break Err(e),
            },
        }
    };

    match result {
        Ok(()) => {
            config.emit(Event::new(EventCode::ListenerStop, "listener stopped").with_local(local));
            Ok(())
        }
        Err(e) => {
            config.emit(
                Event::new(EventCode::ListenerError, format!("listener failed: {e}"))
                    .with_local(local),
            );
            Err(EngineError::Io(e))
        }
    }
}

async fn reflect(
    config: &ServerConfig,
    socket: &UdpSocket,
    payload: &[u8],
    local: SocketAddr,
    peer: SocketAddr,
) -> std::io::Result<()> {
    if config.max_length > 0 && payload.len() > config.max_length {
        config.emit(
            Event::new(
                EventCode::Drop,
                format!("dropped {} byte datagram, max {}", payload.len(), config.max_length),
            )
            .with_local(local)
            .with_remote(peer),
        );
        return Ok(());
    }
    if config.ecn {
        return Ok(());
    }
    socket.send_to(payload, peer).await?;
    Ok(())
}
