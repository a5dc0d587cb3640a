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

//! Terminal detection for report coloring.

use std::io::IsTerminal;

/// Environment variables set by common CI runners.
const CI_MARKERS: [&str; 4] = ["CI", "GITHUB_ACTIONS", "GITLAB_CI", "JENKINS_URL"];

fn stdout_is_interactive() -> bool {
    std::io::stdout().is_terminal() && !CI_MARKERS.iter().any(|var| std::env::var_os(var).is_some())
}

/// Whether the report should color OK/FAILED.
///
/// Requires an interactive stdout, no `NO_COLOR`, and a `TERM` other than `dumb`.
pub fn should_use_colors() -> bool {
    stdout_is_interactive()
        && std::env::var_os("NO_COLOR").is_none()
        && std::env::var("TERM").map_or(true, |term| term != "dumb")
}
