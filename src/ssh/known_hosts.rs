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

use directories::BaseDirs;
use std::path::PathBuf;
use std::sync::Once;

static NO_CHECK_WARNING: Once = Once::new();

/// Mode for host key checking
///
/// Verification is off unless asked for. Any server key is accepted in
/// [`StrictHostKeyChecking::No`], which leaves connections open to
/// man-in-the-middle attacks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum StrictHostKeyChecking {
    /// Verify server keys against ~/.ssh/known_hosts (fail on unknown/changed)
    Yes,
    /// Accept any server key
    #[default]
    No,
}

/// Server host key verification methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerCheckMethod {
    /// No verification - accept any host key
    NoCheck,
    /// Use default known_hosts file (~/.ssh/known_hosts)
    DefaultKnownHostsFile,
    /// Use a specific known_hosts file path
    KnownHostsFile(PathBuf),
}

/// Get the default known_hosts file path
pub fn get_default_known_hosts_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".ssh").join("known_hosts"))
}

/// Create a ServerCheckMethod based on strict host key checking mode
pub fn get_check_method(strict_mode: StrictHostKeyChecking) -> ServerCheckMethod {
    match strict_mode {
        StrictHostKeyChecking::Yes => match get_default_known_hosts_path() {
            Some(path) => {
                tracing::debug!("Using known_hosts file: {:?} (strict mode)", path);
                ServerCheckMethod::KnownHostsFile(path)
            }
            None => ServerCheckMethod::DefaultKnownHostsFile,
        },
        StrictHostKeyChecking::No => {
            NO_CHECK_WARNING.call_once(|| {
                tracing::warn!(
                    "Host key verification is disabled; use --strict-host-key-checking yes to enable it"
                );
            });
            ServerCheckMethod::NoCheck
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_check_by_default() {
        assert_eq!(
            get_check_method(StrictHostKeyChecking::default()),
            ServerCheckMethod::NoCheck
        );
    }

    #[test]
    fn test_strict_mode_uses_known_hosts() {
        let method = get_check_method(StrictHostKeyChecking::Yes);
        match method {
            ServerCheckMethod::KnownHostsFile(path) => {
                assert!(path.ends_with(".ssh/known_hosts"));
            }
            ServerCheckMethod::DefaultKnownHostsFile => {}
            ServerCheckMethod::NoCheck => panic!("strict mode must not disable checking"),
        }
    }
}
