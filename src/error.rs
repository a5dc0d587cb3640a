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

//! Error types for mssh.
//!
//! # Error Categories
//!
//! - [`ConfigError`]: fatal startup failures, raised before any job is dispatched
//! - [`JobError`]: per-host failures, captured in that host's result and never fatal

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::ssh;

/// Errors that abort the run before any job is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The invoking OS user could not be determined and a host had no explicit user
    #[error("could not resolve the current user: {0}")]
    CurrentUser(String),

    /// The host list file could not be read
    #[error("could not read host file '{}'", path.display())]
    HostFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A host list token could not be turned into an endpoint
    #[error("invalid host '{token}': {reason}")]
    InvalidHost { token: String, reason: String },

    /// Concurrency cap of zero
    #[error("maxflight must be at least 1")]
    InvalidMaxFlight,
}

/// Failure of a single job. Stored in the job's result and shown in the report.
#[derive(Debug, Error)]
pub enum JobError {
    /// Dial, handshake, host key check or authentication failed
    #[error("could not ssh into server: {0}")]
    Connection(ssh::Error),

    /// The connection was up but no session could be opened or the exec request failed
    #[error("could not open session: {0}")]
    Session(ssh::Error),

    /// The remote command exited with a non-zero status
    #[error("Process exited with status {status}")]
    Command { status: u32 },

    /// The remote command was terminated by a signal
    #[error("Process exited with signal {signal}")]
    Signal { signal: String },

    /// The channel closed without reporting how the command ended
    #[error("remote command exited without exit status or exit signal")]
    ExitMissing,

    /// The per-job deadline elapsed before connect+execute finished
    #[error("job did not finish within {} seconds", .0.as_secs())]
    Timeout(Duration),

    /// The run was stopped (global deadline or interrupt) before this job finished
    #[error("job cancelled before completion")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidHost {
            token: "alice@".to_string(),
            reason: "host is empty".to_string(),
        };
        assert_eq!(err.to_string(), "invalid host 'alice@': host is empty");

        let err = ConfigError::HostFile {
            path: PathBuf::from("/nonexistent/hosts"),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        };
        assert_eq!(
            err.to_string(),
            "could not read host file '/nonexistent/hosts'"
        );
    }

    #[test]
    fn test_job_error_display() {
        assert_eq!(
            JobError::Command { status: 2 }.to_string(),
            "Process exited with status 2"
        );
        assert_eq!(
            JobError::Timeout(Duration::from_secs(60)).to_string(),
            "job did not finish within 60 seconds"
        );
        assert_eq!(
            JobError::Connection(ssh::Error::AgentNoIdentities).to_string(),
            "could not ssh into server: ssh-agent has no identities"
        );
    }
}
