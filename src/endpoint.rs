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

//! Host list parsing.

use std::fmt;

use crate::error::ConfigError;

pub const DEFAULT_SSH_PORT: u16 = 22;

/// A parsed remote target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub user: String,
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(user: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            user: user.into(),
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "{}@[{}]:{}", self.user, self.host, self.port)
        } else {
            write!(f, "{}@{}:{}", self.user, self.host, self.port)
        }
    }
}

/// Split a host list on whitespace and commas, dropping empty tokens.
pub fn split_host_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
}

/// Parse a host list, defaulting the user to the invoking OS user.
pub fn parse_host_list(list: &str) -> Result<Vec<Endpoint>, ConfigError> {
    parse_host_list_with(list, current_user)
}

/// Parse a host list with a custom default-user resolver.
///
/// Tokens have the form `[user@]host[:port]`. `resolve_user` runs at most once,
/// and only when some token has no user. A port that does not parse as
/// 1-65535 is dropped and the default port kept.
pub fn parse_host_list_with<F>(list: &str, mut resolve_user: F) -> Result<Vec<Endpoint>, ConfigError>
where
    F: FnMut() -> Result<String, ConfigError>,
{
    let mut default_user: Option<String> = None;
    let mut endpoints = Vec::new();

    for token in split_host_list(list) {
        let (user, host, port) = split_token(token)?;

        let user = match user {
            Some(user) => user.to_string(),
            None => match &default_user {
                Some(user) => user.clone(),
                None => {
                    let user = resolve_user()?;
                    default_user = Some(user.clone());
                    user
                }
            },
        };

        endpoints.push(Endpoint::new(user, host, port));
    }

    Ok(endpoints)
}

/// Resolve the invoking OS user.
pub fn current_user() -> Result<String, ConfigError> {
    let user =
        whoami::fallible::username().map_err(|e| ConfigError::CurrentUser(e.to_string()))?;
    if user.is_empty() {
        return Err(ConfigError::CurrentUser("empty user name".to_string()));
    }
    Ok(user)
}

fn split_token(token: &str) -> Result<(Option<&str>, &str, u16), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidHost {
        token: token.to_string(),
        reason: reason.to_string(),
    };

    let (user, rest) = match token.split_once('@') {
        Some((user, rest)) => (Some(user).filter(|u| !u.is_empty()), rest),
        None => (None, token),
    };

    let (host, port) = if let Some(bracketed) = rest.strip_prefix('[') {
        // [v6addr] or [v6addr]:port
        let (host, tail) = bracketed
            .split_once(']')
            .ok_or_else(|| invalid("unclosed '[' in IPv6 literal"))?;
        let port = tail.strip_prefix(':').map(|p| port_or_default(token, p));
        (host, port.unwrap_or(DEFAULT_SSH_PORT))
    } else {
        match rest.split_once(':') {
            Some((host, port)) if !port.contains(':') => (host, port_or_default(token, port)),
            // Bare IPv6 literal
            _ => (rest, DEFAULT_SSH_PORT),
        }
    };

    if host.is_empty() {
        return Err(invalid("host is empty"));
    }
    if host.contains('@') {
        return Err(invalid("more than one '@'"));
    }

    Ok((user, host, port))
}

fn port_or_default(token: &str, port: &str) -> u16 {
    match port.parse::<u16>() {
        Ok(port) if port != 0 => port,
        _ => {
            tracing::debug!(token, "ignoring malformed port, using {}", DEFAULT_SSH_PORT);
            DEFAULT_SSH_PORT
        }
    }
}
