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

use std::io;

use thiserror::Error;

/// Transport-level failures of the SSH primitive.
#[derive(Debug, Error)]
pub enum Error {
    #[error("could not resolve address: {0}")]
    AddressInvalid(#[source] io::Error),

    #[error("{0}")]
    SshError(#[from] russh::Error),

    #[error("host key verification failed")]
    ServerCheckFailed,

    #[error("failed to connect to ssh-agent (is SSH_AUTH_SOCK set?)")]
    AgentConnectionFailed,

    #[error("failed to list ssh-agent identities")]
    AgentRequestIdentitiesFailed,

    #[error("ssh-agent has no identities")]
    AgentNoIdentities,

    #[error("ssh-agent authentication failed for user '{0}'")]
    AgentAuthenticationFailed(String),

    #[error("ssh-agent authentication is not supported on this platform")]
    AgentUnsupported,
}
