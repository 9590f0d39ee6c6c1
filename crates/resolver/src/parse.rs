//! Parsers for the model's labeled replies.
//!
//! Both stages answer with `Label: value` lines. A reply either matches its
//! expected shape exactly or is reported as [`ParsedReply::Malformed`] with a
//! reason; nothing here indexes past the end of a reply.

use crate::ResolvedQuery;

pub const METRIC_LABEL: &str = "Metric:";
pub const GROUP_BYS_LABEL: &str = "GroupBys:";
pub const FILTERS_LABEL: &str = "Filters:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedReply<T> {
    WellFormed(T),
    Malformed { reason: String },
}

impl<T> ParsedReply<T> {
    fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }
}

/// Stage 1: exactly one line, `Metric: <phrase>`. The phrase must be non-empty.
pub fn parse_extraction(reply: &str) -> ParsedReply<String> {
    let lines: Vec<&str> = reply.trim().lines().collect();
    let [line] = lines.as_slice() else {
        return ParsedReply::malformed(format!("expected 1 line, got {}", lines.len()));
    };
    let Some(rest) = line.strip_prefix(METRIC_LABEL) else {
        return ParsedReply::malformed(format!("reply does not start with '{METRIC_LABEL}'"));
    };
    let metric = rest.trim();
    if metric.is_empty() {
        return ParsedReply::malformed("metric is empty");
    }
    ParsedReply::WellFormed(metric.to_string())
}

/// Stage 2: exactly three lines, `Metric:`, `GroupBys:`, `Filters:`, in that order.
///
/// An empty metric value is still well-formed here; the assembler rejects it.
pub fn parse_shape(reply: &str) -> ParsedReply<ResolvedQuery> {
    let lines: Vec<&str> = reply.trim().lines().collect();
    let [metric, group_bys, filters] = lines.as_slice() else {
        return ParsedReply::malformed(format!("expected 3 lines, got {}", lines.len()));
    };

    let metric = match labeled(metric, METRIC_LABEL) {
        Ok(value) => value,
        Err(reason) => return ParsedReply::malformed(reason),
    };
    let group_bys = match labeled(group_bys, GROUP_BYS_LABEL) {
        Ok(value) => value,
        Err(reason) => return ParsedReply::malformed(reason),
    };
    let filters = match labeled(filters, FILTERS_LABEL) {
        Ok(value) => value,
        Err(reason) => return ParsedReply::malformed(reason),
    };

    ParsedReply::WellFormed(ResolvedQuery {
        metric: metric.to_string(),
        group_bys: split_list(group_bys),
        filters: split_list(filters),
    })
}

fn labeled<'a>(line: &'a str, label: &str) -> Result<&'a str, String> {
    line.trim_start()
        .strip_prefix(label)
        .map(str::trim)
        .ok_or_else(|| format!("line '{line}' does not start with '{label}'"))
}

/// Comma-split, trimmed, empties dropped.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
