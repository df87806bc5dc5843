// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Façade
//!
//! Typed request helpers over a [`Connection`]. Every call returns the
//! record type of the command's family, a list of them, or an error:
//!
//! | Server answer              | [`Client::send`]           | [`Client::fetch_list`]     |
//! |----------------------------|----------------------------|----------------------------|
//! | entity of the family       | `Ok(record)`               | `WrongObjectType`          |
//! | list of the family         | `WrongObjectType`          | `Ok(records)`              |
//! | other family               | `WrongObjectType`          | `WrongObjectType`          |
//! | error                      | `Remote`                   | `Remote`                   |

use std::time::Duration;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

use crate::config::DEFAULT_RESPONSE_TIMEOUT_SECS;
use crate::error::RemoteError;
use crate::models::{user, User};
use crate::protocol::{Command, FamilyCommand, Record, Response, WireMessage};
use crate::session::{Connection, TransportError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The server answered with an error value.
    #[error("server error: {0}")]
    Remote(RemoteError),

    #[error("expected {expected}, got {actual}")]
    WrongObjectType { expected: String, actual: String },

    #[error("unexpected {0} message from server")]
    UnexpectedMessage(&'static str),
}

impl ClientError {
    pub fn remote(&self) -> Option<&RemoteError> {
        match self {
            ClientError::Remote(remote) => Some(remote),
            _ => None,
        }
    }
}

pub struct Client<S> {
    connection: Connection<S>,
    response_timeout: Duration,
}

impl Client<TcpStream> {
    /// Open a TCP connection and run the key exchange.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await.map_err(TransportError::from)?;
        let mut client = Self::new(stream);
        client.handshake().await?;
        Ok(client)
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap a stream without encrypting it yet.
    pub fn new(stream: S) -> Self {
        Self {
            connection: Connection::new(stream),
            response_timeout: Duration::from_secs(DEFAULT_RESPONSE_TIMEOUT_SECS),
        }
    }

    /// Limit for the answer to each command.
    pub fn with_response_timeout(mut self, limit: Duration) -> Self {
        self.response_timeout = limit;
        self
    }

    pub async fn handshake(&mut self) -> Result<(), ClientError> {
        self.connection.initiate_handshake().await?;
        debug!("client handshake complete");
        Ok(())
    }

    pub fn is_encrypted(&self) -> bool {
        self.connection.is_encrypted()
    }

    pub async fn login(
        &mut self,
        username: impl Into<String>,
        password: impl Into<user::Password>,
    ) -> Result<User, ClientError> {
        self.send(user::Command::LoginUser {
            username: username.into(),
            password: password.into(),
        })
        .await
    }

    /// Provision the first administrator on a server without users.
    pub async fn bootstrap(&mut self, request: user::CreateFull) -> Result<User, ClientError> {
        self.send(user::Command::CreateFull(request)).await
    }

    /// Send a command answered by a single record.
    pub async fn send<C: FamilyCommand>(&mut self, command: C) -> Result<C::Record, ClientError> {
        match self.request(command.into()).await? {
            Response::Entity(entity) => C::Record::from_entity(entity).map_err(|other| {
                ClientError::WrongObjectType {
                    expected: format!("{:?}", C::Record::FAMILY),
                    actual: format!("{:?}", other.family()),
                }
            }),
            Response::List(list) => Err(ClientError::WrongObjectType {
                expected: format!("{:?}", C::Record::FAMILY),
                actual: format!("list of {:?}", list.family()),
            }),
            Response::Error(remote) => Err(ClientError::Remote(remote)),
        }
    }

    /// Send a query answered by a list of records.
    pub async fn fetch_list<C: FamilyCommand>(
        &mut self,
        command: C,
    ) -> Result<Vec<C::Record>, ClientError> {
        match self.request(command.into()).await? {
            Response::List(list) => C::Record::from_list(list).map_err(|other| {
                ClientError::WrongObjectType {
                    expected: format!("list of {:?}", C::Record::FAMILY),
                    actual: format!("list of {:?}", other.family()),
                }
            }),
            Response::Entity(entity) => Err(ClientError::WrongObjectType {
                expected: format!("list of {:?}", C::Record::FAMILY),
                actual: format!("{:?}", entity.family()),
            }),
            Response::Error(remote) => Err(ClientError::Remote(remote)),
        }
    }

    /// `false` once the connection is lost.
    pub async fn probe(&mut self) -> bool {
        self.connection.probe().await
    }

    async fn request(&mut self, command: Command) -> Result<Response, ClientError> {
        let kind = command.kind();
        self.connection.send(&WireMessage::Command(command)).await?;

        loop {
            let received = tokio::time::timeout(self.response_timeout, self.connection.receive())
                .await
                .map_err(|_| TransportError::Timeout("response"))??;
            match received {
                WireMessage::Response(response) => {
                    debug!(command = ?kind, "response received");
                    return Ok(response);
                }
                WireMessage::ConnectionTest => continue,
                other => return Err(ClientError::UnexpectedMessage(other.label())),
            }
        }
    }
}
