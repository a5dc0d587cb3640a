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

use clap::Parser;
use std::path::PathBuf;

use crate::config::{
    Config, GroupingMode, DEFAULT_GLOBAL_TIMEOUT_SECS, DEFAULT_MAX_FLIGHT, DEFAULT_TIMEOUT_SECS,
};
use crate::error::ConfigError;
use crate::ssh::known_hosts::StrictHostKeyChecking;

#[derive(Parser, Debug)]
#[command(
    name = "mssh",
    version,
    about = "A tool for running multiple commands and ssh jobs in parallel, and easily collecting the results",
    long_about = "mssh runs one command on many hosts over SSH in parallel and prints a report grouped per host,\nor grouped by identical output with --collapse. Authentication goes through the running ssh-agent\n(SSH_AUTH_SOCK). Per-host failures are reported, never fatal.",
    after_help = "EXAMPLES:\n  Run on two hosts:             mssh --hosts \"alice@web1,web2:2222\" \"uptime\"\n  Hosts from a file, collapsed:  mssh -f hosts.txt -c \"cat /etc/os-release\"\n  Hosts from stdin:              cat hosts.txt | mssh -f /dev/stdin -m 10 \"df -h\""
)]
pub struct Cli {
    #[arg(
        long,
        default_value = "",
        help = "Comma separated list of hostnames to execute on (format [user@]host[:port])\nUser defaults to the current user. Port defaults to 22."
    )]
    pub hosts: String,

    #[arg(
        short = 'f',
        long,
        help = "List of hostnames in a file (/dev/stdin for reading from stdin)\nHost names can be separated by commas or whitespace. Overrides --hosts."
    )]
    pub file: Option<PathBuf>,

    #[arg(
        short = 'm',
        long,
        default_value_t = DEFAULT_MAX_FLIGHT,
        help = "Maximum number of concurrent connections"
    )]
    pub maxflight: usize,

    #[arg(
        short = 't',
        long,
        default_value_t = DEFAULT_TIMEOUT_SECS,
        help = "How many seconds may each individual call take? 0 for no timeout"
    )]
    pub timeout: u64,

    #[arg(
        short = 'g',
        long = "timeout_global",
        default_value_t = DEFAULT_GLOBAL_TIMEOUT_SECS,
        help = "How many seconds for all calls to take? 0 for no timeout"
    )]
    pub timeout_global: u64,

    #[arg(short = 'c', long, help = "Collapse similar output")]
    pub collapse: bool,

    #[arg(short = 'v', long, help = "Verbose output (INFO level)")]
    pub verbose: bool,

    #[arg(short = 'd', long, help = "Debug output (DEBUG level)")]
    pub debug: bool,

    #[arg(
        long,
        value_enum,
        default_value_t = StrictHostKeyChecking::No,
        help = "Host key checking mode\n  no  - Accept any host key (insecure, the default)\n  yes - Verify against ~/.ssh/known_hosts"
    )]
    pub strict_host_key_checking: StrictHostKeyChecking,

    #[arg(help = "Command to execute on every host")]
    pub command: String,
}

impl Cli {
    /// Logging verbosity: 0 quiet, 1 verbose, 2 debug
    pub fn verbosity(&self) -> u8 {
        if self.debug {
            2
        } else if self.verbose {
            1
        } else {
            0
        }
    }

    pub fn to_config(&self) -> Result<Config, ConfigError> {
        let grouping = if self.collapse {
            GroupingMode::Collapse
        } else {
            GroupingMode::PerHost
        };

        Ok(Config::new(self.maxflight)?
            .with_job_timeout_secs(self.timeout)
            .with_global_timeout_secs(self.timeout_global)
            .with_grouping(grouping)
            .with_host_key_checking(self.strict_host_key_checking))
    }

    /// Raw host list: the file's literal content when `--file` is given, `--hosts` otherwise.
    pub fn host_list(&self) -> Result<String, ConfigError> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path).map_err(|source| ConfigError::HostFile {
                path: path.clone(),
                source,
            }),
            None => Ok(self.hosts.clone()),
        }
    }
}
