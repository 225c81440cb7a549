//! Response page normalization
//!
//! The listing endpoints answer in two shapes: a bare JSON array, or an
//! envelope `{"results": [...], "count": N, "next": url}`. [`Page::from_body`]
//! folds both into one struct and treats anything else as an empty final
//! page, so pagination ends quietly instead of crashing mid-download.

use serde_json::Value;
use tracing::warn;

use crate::Record;

/// One page of list results in normalized form
#[derive(Debug, Default)]
pub struct Page {
    /// Records on this page, in server order
    pub records: Vec<Record>,
    /// Server-reported total count, when the envelope carries one
    pub count: Option<u64>,
    /// Locator of the next page; `None` on the last page
    pub next: Option<String>,
}

impl Page {
    /// Normalize a decoded response body into a page.
    ///
    /// - A bare array is a complete single page
    /// - An envelope contributes `results`, `count`, and `next`
    /// - A `next` of `null` or `""` means there is no next page
    /// - Any other shape normalizes to an empty final page
    pub fn from_body(body: Value) -> Self {
        match body {
            Value::Array(items) => Page {
                records: collect_records(items),
                count: None,
                next: None,
            },
            Value::Object(mut map) => {
                let Some(results) = map.remove("results") else {
                    warn!("Response object has no results array, ending pagination");
                    return Page::default();
                };
                let Value::Array(items) = results else {
                    warn!("Response results field is not an array, ending pagination");
                    return Page::default();
                };

                let count = map.get("count").and_then(Value::as_u64);
                let next = match map.remove("next") {
                    Some(Value::String(url)) if !url.is_empty() => Some(url),
                    _ => None,
                };

                Page {
                    records: collect_records(items),
                    count,
                    next,
                }
            }
            other => {
                warn!(
                    "Unexpected response shape ({}), ending pagination",
                    json_type(&other)
                );
                Page::default()
            }
        }
    }

    /// True when the page carries no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn collect_records(items: Vec<Value>) -> Vec<Record> {
    let mut records = Vec::with_capacity(items.len());
    let mut dropped = 0usize;
    for item in items {
        match item {
            Value::Object(map) => records.push(map),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!("Dropped {dropped} non-object entries from results page");
    }
    records
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
