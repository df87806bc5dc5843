// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::io;
use std::sync::Arc;

use carelink::config::{LogFormat, ServerConfig, DEFAULT_LOG_FILTER};
use carelink::server::Server;
use carelink::store::InMemoryStore;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = fmt().with_env_filter(filter);
    let result = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };
    // No subscriber is installed on failure, so report on stderr.
    if let Err(e) = result {
        eprintln!("tracing init failed: {e}");
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = ServerConfig::from_env().map_err(io::Error::other)?;
    init_tracing(config.log_format);

    // Records live in memory only; the first client provisions the administrator.
    let operations = Arc::new(InMemoryStore::new());
    let server = Server::bind(config, operations).await?;
    info!(addr = %server.local_addr()?, "Carelink server listening");

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl-C received, shutting down"),
            Err(e) => warn!(error = %e, "could not listen for Ctrl-C, shutting down"),
        }
        signal_token.cancel();
    });

    server.run(shutdown).await;
    Ok(())
}
