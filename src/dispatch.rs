// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Server-Side Command Dispatcher
//!
//! One [`Dispatcher`] drives one connection. Messages are handled strictly
//! in order: the reply to a command is written before the next frame is
//! read.
//!
//! ## Session States
//!
//! | State             | Accepted                                          |
//! |-------------------|---------------------------------------------------|
//! | `Unauthenticated` | key exchange, `User::LoginUser`, bootstrap `User::CreateFull` |
//! | `Authenticated`   | every command the acting role is allowed to run   |
//! | `Closed`          | nothing                                           |
//!
//! A rejected command is answered with an error response and the session
//! stays where it was. Only transport failures end the connection.
//!
//! The acting user is set once, by login or bootstrap, and never replaced.
//! Changes to the user's own record take effect at the next login.
//!
//! ## Limits
//!
//! Until the key exchange completes, each read must arrive within the
//! handshake timeout; afterwards within the idle timeout.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::{ActingUser, AuthError, AuthorizationPolicy, AUDIT_TARGET};
use crate::config::{DEFAULT_HANDSHAKE_TIMEOUT_SECS, DEFAULT_IDLE_TIMEOUT_SECS};
use crate::error::{ErrorKind, RemoteError};
use crate::models::user;
use crate::operations::{OperationError, Operations, Outcome};
use crate::protocol::{Command, Entity, Response, WireMessage};
use crate::session::{Connection, TransportError, TransportResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated(ActingUser),
    Closed,
}

pub struct Dispatcher<S> {
    connection: Connection<S>,
    operations: Arc<dyn Operations>,
    state: SessionState,
    peer: String,
    handshake_timeout: Duration,
    idle_timeout: Duration,
}

impl<S> Dispatcher<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(connection: Connection<S>, operations: Arc<dyn Operations>) -> Self {
        Self {
            connection,
            operations,
            state: SessionState::Unauthenticated,
            peer: "unknown".to_string(),
            handshake_timeout: Duration::from_secs(DEFAULT_HANDSHAKE_TIMEOUT_SECS),
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
        }
    }

    /// Label used in log fields for this connection.
    pub fn with_peer(mut self, peer: impl Into<String>) -> Self {
        self.peer = peer.into();
        self
    }

    pub fn with_timeouts(mut self, handshake: Duration, idle: Duration) -> Self {
        self.handshake_timeout = handshake;
        self.idle_timeout = idle;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Serve the connection until the peer leaves, a transport failure
    /// occurs, or `shutdown` is cancelled.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!(peer = %self.peer, "connection opened");

        loop {
            let (limit, waiting_for) = if self.connection.is_encrypted() {
                (self.idle_timeout, "next message")
            } else {
                (self.handshake_timeout, "key exchange")
            };

            let received = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!(peer = %self.peer, "connection shutting down");
                    break;
                }
                received = tokio::time::timeout(limit, self.connection.receive()) => {
                    received.unwrap_or(Err(TransportError::Timeout(waiting_for)))
                }
            };

            let outcome = match received {
                Ok(message) => self.handle_message(message).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {}
                Err(TransportError::UnknownCommand(detail)) => {
                    warn!(peer = %self.peer, error = %detail, "unknown command");
                    let refusal = WireMessage::Response(Response::Error(RemoteError::new(
                        ErrorKind::IllegalProcess,
                        format!("unknown command: {detail}"),
                    )));
                    if let Err(e) = self.connection.send(&refusal).await {
                        debug!(peer = %self.peer, error = %e, "could not refuse unknown command");
                        break;
                    }
                }
                Err(e) if e.is_recoverable() => {
                    warn!(peer = %self.peer, error = %e, "ignoring unknown message");
                }
                Err(TransportError::Closed) => {
                    debug!(peer = %self.peer, "peer closed the connection");
                    break;
                }
                Err(e) => {
                    warn!(
                        peer = %self.peer,
                        error = %e,
                        error_code = e.error_code(),
                        "transport failure"
                    );
                    let report = WireMessage::Response(Response::Error(e.to_remote()));
                    if let Err(send_err) = self.connection.send(&report).await {
                        debug!(peer = %self.peer, error = %send_err, "could not report failure");
                    }
                    break;
                }
            }
        }

        self.state = SessionState::Closed;
        info!(peer = %self.peer, "connection closed");
    }

    async fn handle_message(&mut self, message: WireMessage) -> TransportResult<()> {
        match message {
            WireMessage::PublicKey(remote) => {
                self.connection.accept_handshake(&remote).await?;
                info!(peer = %self.peer, "key exchange complete");
                Ok(())
            }
            WireMessage::ConnectionTest => {
                debug!(peer = %self.peer, "connection test");
                Ok(())
            }
            WireMessage::Command(command) => {
                let response = self.dispatch(command).await;
                self.connection.send(&WireMessage::Response(response)).await
            }
            other @ (WireMessage::Response(_) | WireMessage::Envelope(_)) => {
                warn!(peer = %self.peer, message = other.label(), "ignoring unexpected message");
                Ok(())
            }
        }
    }

    /// Run one command through the authentication gate and the policy.
    async fn dispatch(&mut self, command: Command) -> Response {
        let acting = match &self.state {
            SessionState::Authenticated(acting) => acting.clone(),
            SessionState::Unauthenticated => return self.dispatch_unauthenticated(command).await,
            SessionState::Closed => {
                return Response::Error(RemoteError::new(ErrorKind::Io, "session is closed"));
            }
        };

        let kind = command.kind();
        if let Err(denied) = AuthorizationPolicy::global().authorize(&acting, kind) {
            warn!(
                target: AUDIT_TARGET,
                peer = %self.peer,
                user_id = %acting.id,
                role = %acting.role,
                command = ?kind,
                "command denied"
            );
            return Response::Error(denied.to_remote());
        }

        if let Command::User(user::Command::LoginUser { username, password }) = command {
            if username != acting.id.value() {
                let err = AuthError::IllegalProcess(format!(
                    "session already belongs to {}",
                    acting.id
                ));
                return Response::Error(err.to_remote());
            }
            return self.confirm_login(&acting, username, password).await;
        }

        let operations = Arc::clone(&self.operations);
        let acting_ref = acting.reference();
        let result = blocking(move || operations.process(command, &acting_ref)).await;

        match result {
            Ok(outcome) => {
                debug!(
                    peer = %self.peer,
                    user_id = %acting.id,
                    command = ?kind,
                    result = outcome_label(&outcome),
                    "command processed"
                );
                outcome.into()
            }
            Err(e) => {
                info!(
                    peer = %self.peer,
                    user_id = %acting.id,
                    command = ?kind,
                    error_code = e.error_code(),
                    "command rejected"
                );
                Response::Error(e.to_remote())
            }
        }
    }

    async fn dispatch_unauthenticated(&mut self, command: Command) -> Response {
        match command {
            Command::User(user::Command::LoginUser { username, password }) => {
                self.login(username, password).await
            }
            Command::User(user::Command::CreateFull(request)) => self.bootstrap(request).await,
            other => {
                debug!(peer = %self.peer, command = ?other.kind(), "command before login");
                Response::Error(AuthError::UserNotProvided.to_remote())
            }
        }
    }

    async fn login(&mut self, username: String, password: user::Password) -> Response {
        let operations = Arc::clone(&self.operations);
        let name = username.clone();
        let result = blocking(move || operations.login(&name, &password)).await;

        match result {
            Ok(user) => {
                let acting = ActingUser::from(&user);
                info!(
                    peer = %self.peer,
                    user_id = %acting.id,
                    role = %acting.role,
                    "login succeeded"
                );
                self.state = SessionState::Authenticated(acting);
                Response::Entity(Entity::User(user))
            }
            Err(OperationError::WrongCredentials) => {
                warn!(
                    target: AUDIT_TARGET,
                    peer = %self.peer,
                    username = %username,
                    "login failed"
                );
                Response::Error(AuthError::WrongCredentials.to_remote())
            }
            Err(e) => {
                warn!(peer = %self.peer, error_code = e.error_code(), "login error");
                Response::Error(e.to_remote())
            }
        }
    }

    /// Repeated login of the session's own user. Credentials are checked
    /// again but the session keeps the identity and role it already has.
    async fn confirm_login(
        &self,
        acting: &ActingUser,
        username: String,
        password: user::Password,
    ) -> Response {
        let operations = Arc::clone(&self.operations);
        let result = blocking(move || operations.login(&username, &password)).await;

        match result {
            Ok(user) => {
                debug!(peer = %self.peer, user_id = %acting.id, "repeated login ignored");
                Response::Entity(Entity::User(user))
            }
            Err(OperationError::WrongCredentials) => {
                warn!(
                    target: AUDIT_TARGET,
                    peer = %self.peer,
                    user_id = %acting.id,
                    "repeated login failed"
                );
                Response::Error(AuthError::WrongCredentials.to_remote())
            }
            Err(e) => Response::Error(e.to_remote()),
        }
    }

    async fn bootstrap(&mut self, request: user::CreateFull) -> Response {
        let operations = Arc::clone(&self.operations);
        let username = request.username.clone();
        let result = blocking(move || operations.bootstrap(request)).await;

        match result {
            Ok(user) => {
                let acting = ActingUser::from(&user);
                info!(
                    target: AUDIT_TARGET,
                    peer = %self.peer,
                    user_id = %acting.id,
                    role = %acting.role,
                    "initial administrator created"
                );
                self.state = SessionState::Authenticated(acting);
                Response::Entity(Entity::User(user))
            }
            Err(e) => {
                warn!(
                    target: AUDIT_TARGET,
                    peer = %self.peer,
                    username = %username,
                    error_code = e.error_code(),
                    "bootstrap refused"
                );
                Response::Error(e.to_remote())
            }
        }
    }
}

fn outcome_label(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::Entity(_) => "entity",
        Outcome::List(_) => "list",
    }
}

/// Run a store call off the async workers.
async fn blocking<T, F>(call: F) -> Result<T, OperationError>
where
    F: FnOnce() -> Result<T, OperationError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| OperationError::Processing(format!("operation task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::io::{duplex, DuplexStream};

    use rsa::RsaPublicKey;

    use super::*;
    use crate::auth::UserRole;
    use crate::config::DEFAULT_MAX_FRAME_BYTES as MAX_FRAME;
    use crate::crypto::{Envelope, KeyPair};
    use crate::fixtures::{login, sample_command, user_request};
    use crate::session::{read_frame, write_frame};
    use crate::models::{address, Id, Reference, User};
    use crate::protocol::{CommandKind, EntityList};
    use crate::store::InMemoryStore;

    /// Accepts every command and records what reached it.
    #[derive(Default)]
    struct RecordingOperations {
        processed: Mutex<Vec<CommandKind>>,
    }

    impl Operations for RecordingOperations {
        fn login(&self, username: &str, _: &user::Password) -> Result<User, OperationError> {
            Err(OperationError::UserNotFound {
                user: username.to_string(),
            })
        }

        fn bootstrap(&self, _: user::CreateFull) -> Result<User, OperationError> {
            Err(OperationError::IllegalProcess("not supported".into()))
        }

        fn process(
            &self,
            command: Command,
            _: &Reference<User>,
        ) -> Result<Outcome, OperationError> {
            self.processed
                .lock()
                .map_err(|_| OperationError::Processing("poisoned".into()))?
                .push(command.kind());
            Ok(Outcome::List(EntityList::Address(Vec::new())))
        }
    }

    fn dispatcher(operations: Arc<dyn Operations>) -> (Dispatcher<DuplexStream>, DuplexStream) {
        let (server, client) = duplex(64 * 1024);
        (Dispatcher::new(Connection::new(server), operations), client)
    }

    fn seeded_store() -> Arc<InMemoryStore> {
        let store = InMemoryStore::new();
        store
            .bootstrap(user_request("alice", "correct", UserRole::SuperUser))
            .unwrap();
        Arc::new(store)
    }

    fn error_kind(response: &Response) -> Option<&ErrorKind> {
        match response {
            Response::Error(remote) => Some(&remote.kind),
            _ => None,
        }
    }

    fn list_addresses() -> Command {
        address::Command::GetList {
            filter: address::Filter::default(),
        }
        .into()
    }

    #[tokio::test]
    async fn commands_before_login_are_refused() {
        let (mut dispatcher, _client) = dispatcher(seeded_store());

        let response = dispatcher.dispatch(list_addresses()).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::UserNotProvided));
        assert_eq!(dispatcher.state(), &SessionState::Unauthenticated);

        let response = dispatcher.dispatch(login("alice", "correct")).await;
        assert!(matches!(response, Response::Entity(Entity::User(_))));

        let response = dispatcher.dispatch(list_addresses()).await;
        assert!(matches!(response, Response::List(EntityList::Address(_))));
    }

    #[tokio::test]
    async fn bad_credentials_leave_the_session_unauthenticated() {
        let (mut dispatcher, _client) = dispatcher(seeded_store());

        let response = dispatcher.dispatch(login("alice", "wrong")).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::WrongCredentials));
        assert_eq!(dispatcher.state(), &SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn bootstrap_authenticates_the_first_administrator() {
        let (mut dispatcher, _client) = dispatcher(Arc::new(InMemoryStore::new()));

        let bootstrap = user::Command::CreateFull(user_request("root", "pw", UserRole::SuperUser));
        let response = dispatcher.dispatch(bootstrap.into()).await;
        assert!(matches!(response, Response::Entity(Entity::User(_))));
        assert_eq!(
            dispatcher.state(),
            &SessionState::Authenticated(ActingUser {
                id: Id::new("root"),
                role: UserRole::SuperUser
            })
        );
    }

    #[tokio::test]
    async fn second_bootstrap_is_refused() {
        let (mut dispatcher, _client) = dispatcher(seeded_store());

        let bootstrap = user::Command::CreateFull(user_request("eve", "pw", UserRole::SuperUser));
        let response = dispatcher.dispatch(bootstrap.into()).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::IllegalProcess));
        assert_eq!(dispatcher.state(), &SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn login_as_another_user_is_illegal() {
        let (mut dispatcher, _client) = dispatcher(seeded_store());
        dispatcher.dispatch(login("alice", "correct")).await;

        let response = dispatcher.dispatch(login("bob", "pw")).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::IllegalProcess));
    }

    #[tokio::test]
    async fn policy_decides_what_reaches_the_operations() {
        for role in UserRole::ALL {
            let operations = Arc::new(RecordingOperations::default());
            let (mut dispatcher, _client) = dispatcher(operations.clone());
            let acting = ActingUser {
                id: Id::new("alice"),
                role,
            };

            for kind in CommandKind::ALL {
                if kind == CommandKind::UserLoginUser {
                    continue;
                }
                dispatcher.state = SessionState::Authenticated(acting.clone());
                let response = dispatcher.dispatch(sample_command(kind, "alice")).await;

                let denied = matches!(
                    error_kind(&response),
                    Some(ErrorKind::UserNotAllowed { .. })
                );
                let allowed = AuthorizationPolicy::global().is_allowed(role, kind);
                assert_eq!(denied, !allowed, "{role} running {kind:?}");
            }

            let reached = operations.processed.lock().unwrap().clone();
            let expected: Vec<_> = CommandKind::ALL
                .into_iter()
                .filter(|kind| *kind != CommandKind::UserLoginUser)
                .filter(|kind| AuthorizationPolicy::global().is_allowed(role, *kind))
                .collect();
            assert_eq!(reached, expected, "{role}");
        }
    }

    #[tokio::test]
    async fn denial_names_the_acting_user_and_role() {
        let (mut dispatcher, _client) = dispatcher(Arc::new(RecordingOperations::default()));
        dispatcher.state = SessionState::Authenticated(ActingUser {
            id: Id::new("tom"),
            role: UserRole::TransportUser,
        });

        let response = dispatcher
            .dispatch(sample_command(CommandKind::PatientDelete, "tom"))
            .await;
        assert_eq!(
            error_kind(&response),
            Some(&ErrorKind::UserNotAllowed {
                user: "tom".into(),
                role: UserRole::TransportUser
            })
        );
    }

    #[tokio::test]
    async fn renaming_yourself_leaves_the_session_as_it_was() {
        let (mut dispatcher, _client) = dispatcher(seeded_store());
        dispatcher.dispatch(login("alice", "correct")).await;

        let rename = user::Command::UpdateCredentials {
            id: Id::new("alice"),
            new_username: "alice.m".into(),
            old_password: "correct".into(),
            new_password: "better".into(),
        };
        let response = dispatcher.dispatch(rename.into()).await;
        assert!(matches!(response, Response::Entity(Entity::User(_))));
        assert_eq!(
            dispatcher.state(),
            &SessionState::Authenticated(ActingUser {
                id: Id::new("alice"),
                role: UserRole::SuperUser
            })
        );
    }

    #[tokio::test]
    async fn admins_cannot_promote_themselves() {
        let store = seeded_store();
        store
            .process(
                user::Command::CreateFull(user_request("ha", "pw", UserRole::HealthcareAdmin))
                    .into(),
                &Reference::to("alice"),
            )
            .unwrap();
        let (mut dispatcher, _client) = dispatcher(store);
        dispatcher.dispatch(login("ha", "pw")).await;
        let delete_patient = || sample_command(CommandKind::PatientDelete, "ha");

        let response = dispatcher.dispatch(delete_patient()).await;
        assert!(matches!(error_kind(&response), Some(ErrorKind::UserNotAllowed { .. })));

        let promote = user::Command::UpdateRole {
            id: Id::new("ha"),
            role: UserRole::SuperUser,
        };
        let response = dispatcher.dispatch(promote.into()).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::IllegalProcess));

        let response = dispatcher.dispatch(delete_patient()).await;
        assert!(matches!(error_kind(&response), Some(ErrorKind::UserNotAllowed { .. })));
        assert_eq!(
            dispatcher.state(),
            &SessionState::Authenticated(ActingUser {
                id: Id::new("ha"),
                role: UserRole::HealthcareAdmin
            })
        );
    }

    /// Answers every login and user command with a super user record.
    struct PromotingOperations;

    fn super_user(name: &str) -> User {
        User {
            id: Id::new(name),
            last_name: "Hansen".into(),
            first_name: "Hanna".into(),
            address: Reference::to("a1"),
            service_provider: Reference::to("sp1"),
            role: UserRole::SuperUser,
        }
    }

    impl Operations for PromotingOperations {
        fn login(&self, username: &str, _: &user::Password) -> Result<User, OperationError> {
            Ok(super_user(username))
        }

        fn bootstrap(&self, _: user::CreateFull) -> Result<User, OperationError> {
            Err(OperationError::IllegalProcess("not supported".into()))
        }

        fn process(&self, _: Command, acting: &Reference<User>) -> Result<Outcome, OperationError> {
            Ok(Outcome::entity(super_user(acting.id().value())))
        }
    }

    #[tokio::test]
    async fn session_role_is_fixed_at_login() {
        let (mut dispatcher, _client) = dispatcher(Arc::new(PromotingOperations));
        let admin = ActingUser {
            id: Id::new("ha"),
            role: UserRole::HealthcareAdmin,
        };
        dispatcher.state = SessionState::Authenticated(admin.clone());

        let promote = user::Command::UpdateRole {
            id: Id::new("ha"),
            role: UserRole::SuperUser,
        };
        let response = dispatcher.dispatch(promote.into()).await;
        assert!(matches!(response, Response::Entity(Entity::User(_))));
        assert_eq!(dispatcher.state(), &SessionState::Authenticated(admin.clone()));

        let response = dispatcher.dispatch(login("ha", "pw")).await;
        assert!(matches!(response, Response::Entity(Entity::User(_))));
        assert_eq!(dispatcher.state(), &SessionState::Authenticated(admin));

        let response = dispatcher
            .dispatch(sample_command(CommandKind::PatientDelete, "ha"))
            .await;
        assert!(matches!(error_kind(&response), Some(ErrorKind::UserNotAllowed { .. })));
    }

    #[tokio::test]
    async fn repeated_login_with_a_wrong_password_keeps_the_session() {
        let (mut dispatcher, _client) = dispatcher(seeded_store());
        dispatcher.dispatch(login("alice", "correct")).await;

        let response = dispatcher.dispatch(login("alice", "wrong")).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::WrongCredentials));
        assert!(matches!(dispatcher.state(), SessionState::Authenticated(_)));
    }

    #[tokio::test]
    async fn list_results_arrive_over_the_wire_as_one_list() {
        let store = seeded_store();
        let (dispatcher, client) = dispatcher(store);
        let shutdown = CancellationToken::new();
        let server = tokio::spawn(dispatcher.run(shutdown.clone()));

        let mut client = Connection::new(client);
        client.initiate_handshake().await.unwrap();
        client
            .send(&WireMessage::Command(login("alice", "correct")))
            .await
            .unwrap();
        assert!(matches!(
            client.receive().await.unwrap(),
            WireMessage::Response(Response::Entity(Entity::User(_)))
        ));

        for city in ["Hamburg", "Hamburg", "Bremen"] {
            let create = address::Command::Create(crate::fixtures::address_request(city));
            client
                .send(&WireMessage::Command(create.into()))
                .await
                .unwrap();
            client.receive().await.unwrap();
        }

        client
            .send(&WireMessage::Command(list_addresses()))
            .await
            .unwrap();
        match client.receive().await.unwrap() {
            // Two addresses from the bootstrap plus three created here.
            WireMessage::Response(Response::List(EntityList::Address(found))) => {
                assert_eq!(found.len(), 5);
            }
            other => panic!("expected an address list, got {}", other.label()),
        }

        shutdown.cancel();
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_tests_and_unknown_messages_are_ignored() {
        use tokio::io::AsyncWriteExt;

        let (dispatcher, client) = dispatcher(seeded_store());
        let server = tokio::spawn(dispatcher.run(CancellationToken::new()));

        let mut client = Connection::new(client);
        assert!(client.probe().await);
        client.send(&WireMessage::Command(login("alice", "correct"))).await.unwrap();
        assert!(matches!(
            client.receive().await.unwrap(),
            WireMessage::Response(Response::Entity(_))
        ));

        let mut raw = client.into_inner();
        let body = br#"{"type":"telemetry","body":{}}"#;
        raw.write_all(&(body.len() as u32).to_be_bytes()).await.unwrap();
        raw.write_all(body).await.unwrap();

        let mut client = Connection::new(raw);
        client.send(&WireMessage::Command(list_addresses())).await.unwrap();
        assert!(matches!(
            client.receive().await.unwrap(),
            WireMessage::Response(Response::List(_))
        ));

        drop(client);
        server.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn silent_peer_is_dropped_after_the_handshake_timeout() {
        let (dispatcher, client) = dispatcher(seeded_store());
        let dispatcher = dispatcher.with_timeouts(Duration::from_secs(5), Duration::from_secs(60));
        let server = tokio::spawn(dispatcher.run(CancellationToken::new()));

        let mut client = Connection::new(client);
        match client.receive().await.unwrap() {
            WireMessage::Response(Response::Error(remote)) => {
                assert_eq!(remote.kind, ErrorKind::Io);
                assert!(remote.detail.contains("key exchange"));
            }
            other => panic!("expected timeout report, got {}", other.label()),
        }
        server.await.unwrap();
    }

    /// Run the key exchange by hand so tests can write raw envelopes.
    async fn raw_handshake(raw: &mut DuplexStream) -> (KeyPair, RsaPublicKey) {
        let own = KeyPair::generate().unwrap();
        let hello = serde_json::to_vec(&WireMessage::PublicKey(own.announce().unwrap())).unwrap();
        write_frame(raw, &hello, MAX_FRAME).await.unwrap();

        let reply = read_frame(raw, MAX_FRAME).await.unwrap();
        match serde_json::from_slice::<WireMessage>(&reply).unwrap() {
            WireMessage::PublicKey(key) => (own, key.to_key().unwrap()),
            other => panic!("expected public key, got {}", other.label()),
        }
    }

    async fn write_envelope(raw: &mut DuplexStream, envelope: Envelope) {
        let body = serde_json::to_vec(&WireMessage::Envelope(envelope)).unwrap();
        write_frame(raw, &body, MAX_FRAME).await.unwrap();
    }

    async fn read_sealed_response(raw: &mut DuplexStream, own: &KeyPair) -> Response {
        let body = read_frame(raw, MAX_FRAME).await.unwrap();
        let envelope = match serde_json::from_slice::<WireMessage>(&body).unwrap() {
            WireMessage::Envelope(envelope) => envelope,
            other => panic!("expected envelope, got {}", other.label()),
        };
        let opened = envelope.open(own.private_key()).unwrap();
        match serde_json::from_slice::<WireMessage>(&opened).unwrap() {
            WireMessage::Response(response) => response,
            other => panic!("expected response, got {}", other.label()),
        }
    }

    #[tokio::test]
    async fn unknown_commands_are_answered_and_the_session_goes_on() {
        let (dispatcher, mut raw) = dispatcher(seeded_store());
        let server = tokio::spawn(dispatcher.run(CancellationToken::new()));
        let (own, server_key) = raw_handshake(&mut raw).await;

        let unknown = br#"{"type":"Command","body":{"Address":{"Archive":{"id":"a1"}}}}"#;
        write_envelope(&mut raw, Envelope::seal(unknown, &server_key).unwrap()).await;
        let response = read_sealed_response(&mut raw, &own).await;
        assert_eq!(error_kind(&response), Some(&ErrorKind::IllegalProcess));

        let command = serde_json::to_vec(&WireMessage::Command(login("alice", "correct"))).unwrap();
        write_envelope(&mut raw, Envelope::seal(&command, &server_key).unwrap()).await;
        let response = read_sealed_response(&mut raw, &own).await;
        assert!(matches!(response, Response::Entity(Entity::User(_))));

        drop(raw);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn unknown_plaintext_command_is_answered() {
        let (dispatcher, mut raw) = dispatcher(seeded_store());
        let server = tokio::spawn(dispatcher.run(CancellationToken::new()));

        let unknown = br#"{"type":"Command","body":{"Address":{"Archive":{"id":"a1"}}}}"#;
        write_frame(&mut raw, unknown, MAX_FRAME).await.unwrap();

        let mut client = Connection::new(raw);
        match client.receive().await.unwrap() {
            WireMessage::Response(Response::Error(remote)) => {
                assert_eq!(remote.kind, ErrorKind::IllegalProcess);
                assert!(remote.detail.contains("unknown command"), "{}", remote.detail);
            }
            other => panic!("expected error response, got {}", other.label()),
        }

        drop(client);
        server.await.unwrap();
    }

    #[tokio::test]
    async fn undecryptable_envelopes_are_reported_then_the_session_closes() {
        let command = serde_json::to_vec(&WireMessage::Command(login("alice", "correct"))).unwrap();
        let wrong_key = |_: &RsaPublicKey| {
            let stranger = KeyPair::generate().unwrap();
            Envelope::seal(&command, stranger.public_key()).unwrap()
        };
        let tampered = |server_key: &RsaPublicKey| {
            let mut envelope = Envelope::seal(&command, server_key).unwrap();
            let mut payload: Vec<char> = envelope.payload.chars().collect();
            payload[0] = if payload[0] == 'A' { 'B' } else { 'A' };
            envelope.payload = payload.into_iter().collect();
            envelope
        };
        let forgeries: [&dyn Fn(&RsaPublicKey) -> Envelope; 2] = [&wrong_key, &tampered];

        for forge in forgeries {
            let (dispatcher, mut raw) = dispatcher(seeded_store());
            let server = tokio::spawn(dispatcher.run(CancellationToken::new()));
            let (own, server_key) = raw_handshake(&mut raw).await;

            write_envelope(&mut raw, forge(&server_key)).await;
            let response = read_sealed_response(&mut raw, &own).await;
            assert_eq!(error_kind(&response), Some(&ErrorKind::Encryption));

            assert!(matches!(
                read_frame(&mut raw, MAX_FRAME).await,
                Err(TransportError::Closed)
            ));
            server.await.unwrap();
        }
    }
}
