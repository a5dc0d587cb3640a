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

//! Units of work and their outcomes.

use std::sync::Arc;

use crate::endpoint::Endpoint;
use crate::error::JobError;
use crate::ssh::{CommandOutput, RemoteExit};

/// One command bound to one endpoint.
#[derive(Debug, Clone)]
pub struct Job {
    pub endpoint: Endpoint,
    pub command: Arc<str>,
}

impl Job {
    pub fn new(endpoint: Endpoint, command: Arc<str>) -> Self {
        Self { endpoint, command }
    }
}

/// Result of executing a job on a single endpoint.
///
/// The endpoint is always present, whatever stage the job failed at.
#[derive(Debug)]
pub struct ExecutionResult {
    pub endpoint: Endpoint,
    pub output: Vec<u8>,
    pub error: Option<JobError>,
}

impl ExecutionResult {
    pub fn success(endpoint: Endpoint, output: Vec<u8>) -> Self {
        Self {
            endpoint,
            output,
            error: None,
        }
    }

    pub fn failure(endpoint: Endpoint, error: JobError, output: Vec<u8>) -> Self {
        Self {
            endpoint,
            output,
            error: Some(error),
        }
    }

    /// Build a result from what the remote shell returned for `endpoint`.
    pub fn from_outcome(endpoint: Endpoint, outcome: Result<CommandOutput, JobError>) -> Self {
        match outcome {
            Ok(CommandOutput { output, exit }) => match exit {
                RemoteExit::Status(0) => Self::success(endpoint, output),
                RemoteExit::Status(status) => {
                    Self::failure(endpoint, JobError::Command { status }, output)
                }
                RemoteExit::Signal(signal) => {
                    Self::failure(endpoint, JobError::Signal { signal }, output)
                }
                RemoteExit::Missing => Self::failure(endpoint, JobError::ExitMissing, output),
            },
            Err(error) => Self::failure(endpoint, error, Vec::new()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// Text used to compare results in collapse mode: the error text followed
    /// by the output for failures, the output alone otherwise.
    pub fn report_body(&self) -> Vec<u8> {
        match &self.error {
            Some(error) => {
                let mut body = error.to_string().into_bytes();
                body.extend_from_slice(&self.output);
                body
            }
            None => self.output.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ssh;

    fn endpoint() -> Endpoint {
        Endpoint::new("user", "test.com", 22)
    }

    #[test]
    fn test_zero_exit_is_success() {
        let result = ExecutionResult::from_outcome(
            endpoint(),
            Ok(CommandOutput::new(b"Hello World\n".to_vec(), RemoteExit::Status(0))),
        );
        assert!(result.is_success());
        assert_eq!(result.output, b"Hello World\n");
        assert_eq!(result.report_body(), b"Hello World\n");
    }

    #[test]
    fn test_non_zero_exit_keeps_output() {
        let result = ExecutionResult::from_outcome(
            endpoint(),
            Ok(CommandOutput::new(b"not found\n".to_vec(), RemoteExit::Status(127))),
        );
        assert!(!result.is_success());
        assert!(matches!(result.error, Some(JobError::Command { status: 127 })));
        assert_eq!(result.output, b"not found\n");
        assert_eq!(
            result.report_body(),
            b"Process exited with status 127not found\n"
        );
    }

    #[test]
    fn test_signal_and_missing_exit() {
        let result = ExecutionResult::from_outcome(
            endpoint(),
            Ok(CommandOutput::new(Vec::new(), RemoteExit::Signal("KILL".to_string()))),
        );
        assert!(matches!(result.error, Some(JobError::Signal { .. })));

        let result = ExecutionResult::from_outcome(
            endpoint(),
            Ok(CommandOutput::new(Vec::new(), RemoteExit::Missing)),
        );
        assert!(matches!(result.error, Some(JobError::ExitMissing)));
    }

    #[test]
    fn test_connection_failure_carries_endpoint() {
        let result = ExecutionResult::from_outcome(
            endpoint(),
            Err(JobError::Connection(ssh::Error::AgentConnectionFailed)),
        );
        assert_eq!(result.endpoint, endpoint());
        assert!(result.output.is_empty());
        assert!(!result.is_success());
    }

    #[test]
    fn test_utf8_output_is_kept_verbatim() {
        let result = ExecutionResult::success(endpoint(), "한글 테스트\n".as_bytes().to_vec());
        assert_eq!(result.report_body(), "한글 테스트\n".as_bytes());
    }
}
