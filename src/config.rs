// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the server. Configuration is loaded from the environment
//! once at startup into a [`ServerConfig`].
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind host, an IP literal or a resolvable name | `0.0.0.0` |
//! | `PORT` | Server bind port | `7420` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |
//! | `HANDSHAKE_TIMEOUT_SECS` | Limit for completing the key exchange | `30` |
//! | `IDLE_TIMEOUT_SECS` | Limit between two inbound messages | `900` |
//! | `MAX_FRAME_BYTES` | Largest accepted wire frame | `16777216` |
//!
//! Host names such as `localhost` are resolved when the server binds.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

/// Environment variable name for the bind host.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the log output format.
///
/// `json` selects structured output for log shippers, anything else the
/// human-readable format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

/// Environment variable name for the key exchange limit, in seconds.
pub const HANDSHAKE_TIMEOUT_ENV: &str = "HANDSHAKE_TIMEOUT_SECS";

/// Environment variable name for the idle limit, in seconds.
///
/// A connection that sends nothing for this long is closed.
pub const IDLE_TIMEOUT_ENV: &str = "IDLE_TIMEOUT_SECS";

/// Environment variable name for the frame size limit, in bytes.
pub const MAX_FRAME_BYTES_ENV: &str = "MAX_FRAME_BYTES";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 7420;
pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_HANDSHAKE_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 900;

/// How long a client waits for the answer to one command.
pub const DEFAULT_RESPONSE_TIMEOUT_SECS: u64 = 30;

/// Largest frame a connection reads or writes (16 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("{host:?} is not a valid bind host")]
    BindAddress { host: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Settings the server runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// IP literal or host name, resolved at bind time.
    pub host: String,
    pub port: u16,
    pub log_format: LogFormat,
    pub handshake_timeout: Duration,
    pub idle_timeout: Duration,
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_format: LogFormat::Pretty,
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ServerConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load through `lookup`, which returns the value of a variable if set.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = match lookup(HOST_ENV) {
            None => DEFAULT_HOST.to_string(),
            Some(value) => parse_host(&value).ok_or(ConfigError::BindAddress { host: value })?,
        };
        let port: u16 = parse_or(&lookup, PORT_ENV, DEFAULT_PORT, "a port number")?;

        let log_format = lookup(LOG_FORMAT_ENV)
            .map(|value| LogFormat::parse(&value))
            .unwrap_or(LogFormat::Pretty);

        let handshake_secs = parse_or(
            &lookup,
            HANDSHAKE_TIMEOUT_ENV,
            DEFAULT_HANDSHAKE_TIMEOUT_SECS,
            "a whole number of seconds",
        )?;
        let idle_secs = parse_or(
            &lookup,
            IDLE_TIMEOUT_ENV,
            DEFAULT_IDLE_TIMEOUT_SECS,
            "a whole number of seconds",
        )?;
        let max_frame_bytes = parse_or(
            &lookup,
            MAX_FRAME_BYTES_ENV,
            DEFAULT_MAX_FRAME_BYTES,
            "a byte count",
        )?;
        if max_frame_bytes == 0 {
            return Err(ConfigError::Invalid {
                name: MAX_FRAME_BYTES_ENV,
                value: "0".to_string(),
                expected: "a positive byte count",
            });
        }

        Ok(Self {
            host,
            port,
            log_format,
            handshake_timeout: Duration::from_secs(handshake_secs),
            idle_timeout: Duration::from_secs(idle_secs),
            max_frame_bytes,
        })
    }
}

/// Strip IPv6 brackets and refuse values that cannot name a host.
fn parse_host(value: &str) -> Option<String> {
    let host = value.trim();
    let host = host
        .strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(host);
    let valid = !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | ':' | '_'));
    valid.then(|| host.to_string())
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError> {
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value,
            expected,
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        assert_eq!(load(&[]).unwrap(), ServerConfig::default());
    }

    #[test]
    fn overrides_are_read() {
        let config = load(&[
            (HOST_ENV, "127.0.0.1"),
            (PORT_ENV, "9000"),
            (LOG_FORMAT_ENV, "JSON"),
            (IDLE_TIMEOUT_ENV, "5"),
            (MAX_FRAME_BYTES_ENV, "1024"),
        ])
        .unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9000);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.idle_timeout, Duration::from_secs(5));
        assert_eq!(config.max_frame_bytes, 1024);
    }

    #[test]
    fn bad_numbers_fail_startup() {
        let err = load(&[(PORT_ENV, "eighty")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: PORT_ENV,
                value: "eighty".into(),
                expected: "a port number"
            }
        );
        assert!(load(&[(MAX_FRAME_BYTES_ENV, "0")]).is_err());
    }

    #[test]
    fn bad_host_is_reported() {
        let err = load(&[(HOST_ENV, "not a host")]).unwrap_err();
        assert!(matches!(err, ConfigError::BindAddress { .. }));
        assert!(load(&[(HOST_ENV, "")]).is_err());
    }

    #[test]
    fn host_names_and_bracketed_ipv6_are_accepted() {
        assert_eq!(load(&[(HOST_ENV, "localhost")]).unwrap().host, "localhost");
        assert_eq!(load(&[(HOST_ENV, "[::1]")]).unwrap().host, "::1");
    }
}
