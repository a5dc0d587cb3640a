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
use mssh::config::GroupingMode;
use mssh::endpoint::{parse_host_list_with, Endpoint};
use mssh::error::ConfigError;
use mssh::ssh::known_hosts::StrictHostKeyChecking;
use mssh::Cli;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let cli = Cli::try_parse_from(["mssh", "uptime"]).unwrap();

    assert_eq!(cli.command, "uptime");
    assert_eq!(cli.hosts, "");
    assert!(cli.file.is_none());
    assert_eq!(cli.verbosity(), 0);
    assert_eq!(cli.strict_host_key_checking, StrictHostKeyChecking::No);

    let config = cli.to_config().unwrap();
    assert_eq!(config.max_flight(), 50);
    assert_eq!(config.job_timeout(), Some(Duration::from_secs(60)));
    assert_eq!(config.global_timeout(), Some(Duration::from_secs(600)));
    assert_eq!(config.grouping(), GroupingMode::PerHost);
}

#[test]
fn test_short_flags() {
    let cli = Cli::try_parse_from([
        "mssh", "-m", "4", "-t", "5", "-g", "30", "-c", "-v", "echo hi",
    ])
    .unwrap();

    assert_eq!(cli.verbosity(), 1);
    let config = cli.to_config().unwrap();
    assert_eq!(config.max_flight(), 4);
    assert_eq!(config.job_timeout(), Some(Duration::from_secs(5)));
    assert_eq!(config.global_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.grouping(), GroupingMode::Collapse);
}

#[test]
fn test_long_flags() {
    let cli = Cli::try_parse_from([
        "mssh",
        "--hosts",
        "a,b",
        "--maxflight",
        "2",
        "--timeout_global",
        "9",
        "--collapse",
        "--debug",
        "--strict-host-key-checking",
        "yes",
        "hostname",
    ])
    .unwrap();

    assert_eq!(cli.hosts, "a,b");
    assert_eq!(cli.verbosity(), 2);
    assert_eq!(cli.strict_host_key_checking, StrictHostKeyChecking::Yes);
    let config = cli.to_config().unwrap();
    assert_eq!(config.global_timeout(), Some(Duration::from_secs(9)));
    assert_eq!(config.host_key_checking(), StrictHostKeyChecking::Yes);
}

#[test]
fn test_debug_wins_over_verbose() {
    let cli = Cli::try_parse_from(["mssh", "-v", "-d", "true"]).unwrap();
    assert_eq!(cli.verbosity(), 2);
}

#[test]
fn test_zero_timeouts_disable_limits() {
    let cli = Cli::try_parse_from(["mssh", "-t", "0", "-g", "0", "true"]).unwrap();
    let config = cli.to_config().unwrap();

    assert_eq!(config.job_timeout(), None);
    assert_eq!(config.global_timeout(), None);
}

#[test]
fn test_zero_maxflight_rejected() {
    let cli = Cli::try_parse_from(["mssh", "-m", "0", "true"]).unwrap();
    assert!(matches!(cli.to_config(), Err(ConfigError::InvalidMaxFlight)));
}

#[test]
fn test_command_required() {
    assert!(Cli::try_parse_from(["mssh", "--hosts", "a"]).is_err());
}

#[test]
fn test_host_list_from_hosts_flag() {
    let cli = Cli::try_parse_from(["mssh", "--hosts", "web1,bob@web2:2222", "true"]).unwrap();
    let endpoints = parse_host_list_with(&cli.host_list().unwrap(), || Ok("me".into())).unwrap();

    assert_eq!(
        endpoints,
        vec![
            Endpoint::new("me", "web1", 22),
            Endpoint::new("bob", "web2", 2222),
        ]
    );
}

#[test]
fn test_host_file_overrides_hosts_flag() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "alice@db1, db2:2200").unwrap();
    writeln!(file, "db3").unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let cli = Cli::try_parse_from(["mssh", "--hosts", "ignored", "-f", &path, "true"]).unwrap();
    let endpoints = parse_host_list_with(&cli.host_list().unwrap(), || Ok("me".into())).unwrap();

    assert_eq!(
        endpoints,
        vec![
            Endpoint::new("alice", "db1", 22),
            Endpoint::new("me", "db2", 2200),
            Endpoint::new("me", "db3", 22),
        ]
    );
}

#[test]
fn test_missing_host_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.txt");
    let path = path.to_str().unwrap();

    let cli = Cli::try_parse_from(["mssh", "-f", path, "true"]).unwrap();
    let err = cli.host_list().unwrap_err();

    assert!(matches!(err, ConfigError::HostFile { .. }));
    assert!(err.to_string().contains("absent.txt"));
}
