// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! russh-backed [`RemoteShell`].
//!
//! Each call dials the endpoint, authenticates through ssh-agent, opens one
//! session channel, runs the command and tears everything down again.

use async_trait::async_trait;
use russh::client::{Config, Handle};
use russh::{ChannelMsg, Disconnect};
use std::io;
use std::sync::Arc;

use super::handler::ClientHandler;
use super::known_hosts::{get_check_method, StrictHostKeyChecking};
use super::{CommandOutput, Error, RemoteExit, RemoteShell};
use crate::endpoint::Endpoint;
use crate::error::JobError;

/// Initial capacity of the combined output buffer (one SSH channel window packet).
const SSH_CMD_BUFFER_SIZE: usize = 8192;

/// Extended data type code for stderr (RFC 4254 section 5.2)
const SSH_EXTENDED_DATA_STDERR: u32 = 1;

/// SSH implementation of [`RemoteShell`] authenticating through ssh-agent.
pub struct SshShell {
    config: Arc<Config>,
    strict_mode: StrictHostKeyChecking,
}

impl SshShell {
    pub fn new(strict_mode: StrictHostKeyChecking) -> Self {
        Self {
            config: Arc::new(Config::default()),
            strict_mode,
        }
    }

    /// Dial and authenticate.
    ///
    /// Every resolved address is tried in turn until one completes the
    /// handshake; authentication runs on the first successful connection only.
    async fn connect(&self, endpoint: &Endpoint) -> Result<Connection, Error> {
        let socket_addrs = tokio::net::lookup_host((endpoint.host.as_str(), endpoint.port))
            .await
            .map_err(Error::AddressInvalid)?;

        let server_check = get_check_method(self.strict_mode);
        let mut connect_res = Err(Error::AddressInvalid(io::Error::new(
            io::ErrorKind::InvalidInput,
            "could not resolve to any addresses",
        )));
        for socket_addr in socket_addrs {
            tracing::debug!(endpoint = %endpoint, address = %socket_addr, "Dialing the host");
            let handler =
                ClientHandler::new(endpoint.host.clone(), endpoint.port, server_check.clone());
            match russh::client::connect(Arc::clone(&self.config), socket_addr, handler).await {
                Ok(handle) => {
                    connect_res = Ok(handle);
                    break;
                }
                Err(e) => connect_res = Err(e),
            }
        }
        let mut handle = connect_res?;
        tracing::debug!(endpoint = %endpoint, "Dialed to host successfully");

        authenticate_with_agent(&mut handle, &endpoint.user).await?;

        Ok(Connection { handle })
    }
}

#[async_trait]
impl RemoteShell for SshShell {
    async fn run(&self, endpoint: &Endpoint, command: &str) -> Result<CommandOutput, JobError> {
        let connection = self.connect(endpoint).await.map_err(JobError::Connection)?;
        let outcome = connection.execute(command).await;
        connection.close().await;
        outcome
    }
}

/// An authenticated connection, owned by a single job.
///
/// `close` disconnects politely; dropping it without `close` (timeout,
/// cancellation) tears the session down as well.
struct Connection {
    handle: Handle<ClientHandler>,
}

impl Connection {
    /// Run `command` on a fresh session channel, collecting stdout and stderr
    /// into one buffer in arrival order.
    async fn execute(&self, command: &str) -> Result<CommandOutput, JobError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| JobError::Session(e.into()))?;
        channel
            .exec(true, command)
            .await
            .map_err(|e| JobError::Session(e.into()))?;

        let mut output = Vec::with_capacity(SSH_CMD_BUFFER_SIZE);
        let mut exit_status: Option<u32> = None;
        let mut exit_signal: Option<String> = None;

        while let Some(msg) = channel.wait().await {
            match msg {
                ChannelMsg::Data { ref data } => output.extend_from_slice(data),
                ChannelMsg::ExtendedData { ref data, ext } if ext == SSH_EXTENDED_DATA_STDERR => {
                    output.extend_from_slice(data)
                }
                // The exit status may arrive before the last data packet, so keep
                // reading until the channel closes.
                ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
                ChannelMsg::ExitSignal { signal_name, .. } => {
                    exit_signal = Some(format!("{signal_name:?}"))
                }
                _ => {}
            }
        }

        let exit = match (exit_status, exit_signal) {
            (Some(status), _) => RemoteExit::Status(status),
            (None, Some(signal)) => RemoteExit::Signal(signal),
            (None, None) => RemoteExit::Missing,
        };

        Ok(CommandOutput::new(output, exit))
    }

    async fn close(self) {
        if let Err(e) = self
            .handle
            .disconnect(Disconnect::ByApplication, "", "")
            .await
        {
            tracing::debug!("Error while disconnecting: {e}");
        }
    }
}

#[cfg(not(target_os = "windows"))]
async fn authenticate_with_agent(
    handle: &mut Handle<ClientHandler>,
    username: &str,
) -> Result<(), Error> {
    let mut agent = russh::keys::agent::client::AgentClient::connect_env()
        .await
        .map_err(|_| Error::AgentConnectionFailed)?;

    let identities = agent
        .request_identities()
        .await
        .map_err(|_| Error::AgentRequestIdentitiesFailed)?;

    if identities.is_empty() {
        return Err(Error::AgentNoIdentities);
    }

    for identity in identities {
        let result = handle
            .authenticate_publickey_with(
                username,
                identity.clone(),
                handle.best_supported_rsa_hash().await?.flatten(),
                &mut agent,
            )
            .await;

        if let Ok(auth_result) = result {
            if auth_result.success() {
                return Ok(());
            }
        }
    }

    Err(Error::AgentAuthenticationFailed(username.to_string()))
}

#[cfg(target_os = "windows")]
async fn authenticate_with_agent(
    _handle: &mut Handle<ClientHandler>,
    _username: &str,
) -> Result<(), Error> {
    Err(Error::AgentUnsupported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unresolvable_host_is_a_connection_error() {
        let shell = SshShell::new(StrictHostKeyChecking::No);
        let endpoint = Endpoint::new("user", "nonexistent.invalid", 22);

        let err = shell.run(&endpoint, "true").await.unwrap_err();
        assert!(matches!(err, JobError::Connection(_)));
        assert!(err.to_string().starts_with("could not ssh into server"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_a_connection_error() {
        // Bind then drop to get a local port with nothing listening on it.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let shell = SshShell::new(StrictHostKeyChecking::No);
        let endpoint = Endpoint::new("user", "127.0.0.1", port);

        let err = shell.run(&endpoint, "true").await.unwrap_err();
        assert!(matches!(err, JobError::Connection(_)));
    }
}
