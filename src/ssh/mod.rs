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

//! Remote shell primitive.
//!
//! The executor only sees [`RemoteShell`]: connect to an endpoint, run one
//! command, hand back its combined output and how it ended. [`SshShell`] is
//! the russh-backed implementation used by the binary.

pub mod client;
pub mod error;
pub mod handler;
pub mod known_hosts;

use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::error::JobError;

pub use client::SshShell;
pub use error::Error;
pub use handler::ClientHandler;

/// How a remote command ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteExit {
    /// Exit status reported by the server
    Status(u32),
    /// Terminated by the named signal
    Signal(String),
    /// The channel closed without an exit status or signal
    Missing,
}

/// Combined stdout/stderr of a remote command plus how it ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: Vec<u8>,
    pub exit: RemoteExit,
}

impl CommandOutput {
    pub fn new(output: impl Into<Vec<u8>>, exit: RemoteExit) -> Self {
        Self {
            output: output.into(),
            exit,
        }
    }
}

/// Connect-and-run primitive driven by the execution workers.
///
/// Implementations own the connection and session for the duration of one
/// call and must release both before returning. Dropping the returned future
/// must also release them, since workers abandon jobs on timeout or
/// cancellation.
#[async_trait]
pub trait RemoteShell: Send + Sync + 'static {
    /// Run `command` on `endpoint`.
    ///
    /// Returns `Err` only when no command could be started (connection or
    /// session failure); a command that ran and failed is an `Ok` whose
    /// [`RemoteExit`] says so.
    async fn run(&self, endpoint: &Endpoint, command: &str) -> Result<CommandOutput, JobError>;
}
