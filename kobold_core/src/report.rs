//! Human-readable mismatch reports.

use crate::compare::Diff;
use kobold_common::KoboldError;
use similar::{ChangeTag, TextDiff};
use std::fmt::Write;

/// Pretty-printed sides of a diff
#[derive(Debug, Clone)]
pub struct MismatchReport {
    pub expected: String,
    pub actual: String,
}

impl MismatchReport {
    pub fn new(diff: &Diff) -> Result<Self, KoboldError> {
        Ok(Self {
            expected: pretty(&diff.expected.to_json())?,
            actual: pretty(&diff.actual.to_json())?,
        })
    }

    /// Both sides, one after the other
    pub fn render(&self) -> String {
        format!("Expected:\n{}\n\nBut got:\n{}\n", self.expected, self.actual)
    }

    /// Line diff between the two pretty-printed sides
    pub fn unified(&self) -> String {
        let diff = TextDiff::from_lines(&self.expected, &self.actual);
        let mut out = String::new();
        let _ = writeln!(out, "--- expected");
        let _ = writeln!(out, "+++ actual");
        for change in diff.iter_all_changes() {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            let _ = write!(out, "{}{}", sign, change);
            if change.missing_newline() {
                out.push('\n');
            }
        }
        out
    }

    /// Number of lines that differ between the two sides
    pub fn changed_lines(&self) -> usize {
        TextDiff::from_lines(&self.expected, &self.actual)
            .iter_all_changes()
            .filter(|c| c.tag() != ChangeTag::Equal)
            .count()
    }
}

fn pretty(json: &serde_json::Value) -> Result<String, KoboldError> {
    serde_json::to_string_pretty(json).map_err(|e| KoboldError::Serialization(e.to_string()))
}
