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

//! Result aggregation and the grouped report.
//!
//! Results are grouped as they arrive, either per endpoint or, in collapse
//! mode, by byte-identical result body. Groups keep the order in which they
//! were first created and members keep arrival order. Each group prints as:
//!
//! ```text
//! ===================================
//! host: alice@a:22, alice@b:22
//! result: FAILED
//! mssh error: Process exited with status 1
//! command output: ...
//! ```
//!
//! Status, error and output come from the group's first-arriving result.

use std::collections::HashMap;
use std::io::{self, Write};

use owo_colors::OwoColorize;
use tokio::sync::mpsc;

use crate::config::GroupingMode;
use crate::executor::ExecutionResult;

pub const OUTPUT_BAR: &str = "===================================";

/// Results sharing one grouping key.
#[derive(Debug)]
pub struct ReportGroup {
    members: Vec<ExecutionResult>,
}

impl ReportGroup {
    fn new(first: ExecutionResult) -> Self {
        Self {
            members: vec![first],
        }
    }

    /// Members in arrival order.
    pub fn members(&self) -> &[ExecutionResult] {
        &self.members
    }

    /// The first-arriving member; its status and output represent the group.
    pub fn first(&self) -> &ExecutionResult {
        &self.members[0]
    }

    /// Member identities joined by ", " in arrival order.
    pub fn hosts(&self) -> String {
        self.members
            .iter()
            .map(|r| r.endpoint.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Grouped results of one run.
#[derive(Debug)]
pub struct Report {
    mode: GroupingMode,
    groups: Vec<ReportGroup>,
    index: HashMap<Vec<u8>, usize>,
    results: usize,
}

impl Report {
    pub fn new(mode: GroupingMode) -> Self {
        Self {
            mode,
            groups: Vec::new(),
            index: HashMap::new(),
            results: 0,
        }
    }

    fn key_for(&self, result: &ExecutionResult) -> Vec<u8> {
        match self.mode {
            GroupingMode::PerHost => result.endpoint.to_string().into_bytes(),
            GroupingMode::Collapse => result.report_body(),
        }
    }

    /// Add a result to its group, creating the group on first sight of its key.
    pub fn push(&mut self, result: ExecutionResult) {
        self.results += 1;
        let key = self.key_for(&result);
        match self.index.get(&key) {
            Some(&i) => self.groups[i].members.push(result),
            None => {
                self.index.insert(key, self.groups.len());
                self.groups.push(ReportGroup::new(result));
            }
        }
    }

    pub fn groups(&self) -> &[ReportGroup] {
        &self.groups
    }

    pub fn result_count(&self) -> usize {
        self.results
    }

    pub fn failure_count(&self) -> usize {
        self.groups
            .iter()
            .flat_map(|g| g.members.iter())
            .filter(|r| !r.is_success())
            .count()
    }

    /// Write every group in creation order.
    pub fn render<W: Write>(&self, out: &mut W, colors: bool) -> io::Result<()> {
        for group in &self.groups {
            writeln!(out, "{OUTPUT_BAR}")?;
            writeln!(out, "host: {}", group.hosts())?;

            let first = group.first();
            match &first.error {
                Some(error) => {
                    if colors {
                        writeln!(out, "result: {}", "FAILED".red())?;
                    } else {
                        writeln!(out, "result: FAILED")?;
                    }
                    writeln!(out, "mssh error: {error}")?;
                }
                None => {
                    if colors {
                        writeln!(out, "result: {}", "OK".green())?;
                    } else {
                        writeln!(out, "result: OK")?;
                    }
                }
            }

            out.write_all(b"command output: ")?;
            out.write_all(&first.output)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Consumes results until the channel closes, then prints the report.
pub struct Aggregator<W> {
    mode: GroupingMode,
    writer: W,
    colors: bool,
}

impl<W: Write + Send + 'static> Aggregator<W> {
    pub fn new(mode: GroupingMode, writer: W) -> Self {
        Self {
            mode,
            writer,
            colors: false,
        }
    }

    pub fn with_colors(mut self, colors: bool) -> Self {
        self.colors = colors;
        self
    }

    /// Drain `results` until every sender is gone, print, and hand back the report.
    pub async fn run(mut self, mut results: mpsc::Receiver<ExecutionResult>) -> io::Result<Report> {
        let mut report = Report::new(self.mode);

        while let Some(result) = results.recv().await {
            tracing::debug!(
                endpoint = %result.endpoint,
                success = result.is_success(),
                "Received result"
            );
            report.push(result);
        }

        report.render(&mut self.writer, self.colors)?;
        self.writer.flush()?;
        Ok(report)
    }
}
