// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! TCP accept loop.
//!
//! Each accepted connection gets its own task running a [`Dispatcher`].
//! Cancelling the shutdown token stops accepting and tells every open
//! connection to close after its current message.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::dispatch::Dispatcher;
use crate::operations::Operations;
use crate::session::Connection;

pub struct Server {
    listener: TcpListener,
    config: ServerConfig,
    operations: Arc<dyn Operations>,
}

impl Server {
    pub async fn bind(config: ServerConfig, operations: Arc<dyn Operations>) -> io::Result<Self> {
        // Host names resolve here; the first address that binds wins.
        let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
        Ok(Self {
            listener,
            config,
            operations,
        })
    }

    /// Address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            host = %self.config.host,
            port = self.config.port,
            handshake_timeout_secs = self.config.handshake_timeout.as_secs(),
            idle_timeout_secs = self.config.idle_timeout.as_secs(),
            "Command server starting"
        );

        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Command server shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let connection = Connection::new(stream)
                            .with_max_frame_bytes(self.config.max_frame_bytes);
                        let dispatcher = Dispatcher::new(connection, Arc::clone(&self.operations))
                            .with_peer(peer.to_string())
                            .with_timeouts(self.config.handshake_timeout, self.config.idle_timeout);
                        connections.spawn(dispatcher.run(shutdown.child_token()));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        warn!(error = %e, "connection task failed");
                    }
                }
            }
        }

        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                warn!(error = %e, "connection task failed");
            }
        }
        info!("Command server stopped");
    }
}
