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

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set
///
/// 0 shows warnings only (the host-key warning among them), 1 is `--verbose`,
/// 2 and up is `--debug`.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "mssh=warn",
        1 => "mssh=info",
        // Include russh debug logs for SSH troubleshooting
        _ => "mssh=debug,russh=debug",
    }
}

/// Create an environment filter based on verbosity level
pub fn create_env_filter(verbosity: u8) -> EnvFilter {
    if std::env::var("RUST_LOG").is_ok() {
        // Use RUST_LOG if set (allows debugging russh and other dependencies)
        EnvFilter::from_default_env()
    } else {
        EnvFilter::new(default_directive(verbosity))
    }
}

/// Initialize logging to stderr, keeping stdout for the report.
pub fn init_logging(verbosity: u8) {
    let filter = create_env_filter(verbosity);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_per_verbosity() {
        assert_eq!(default_directive(0), "mssh=warn");
        assert_eq!(default_directive(1), "mssh=info");
        assert_eq!(default_directive(2), "mssh=debug,russh=debug");
        assert_eq!(default_directive(7), "mssh=debug,russh=debug");
    }

    #[test]
    fn test_default_directive_parses() {
        for verbosity in 0..3 {
            assert!(EnvFilter::try_new(default_directive(verbosity)).is_ok());
        }
    }
}
