#![allow(dead_code)]

use std::cell::Cell;

use serde_json::{Map, Value, json};
use tabmap_llm::{GenerationError, PromptRequest};
use tabmap_model::{CellValue, Table};

/// Which built-in strategy produced a request, judged by its closing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Transform,
    Reconcile,
    Refine,
    Apply,
    Narrate,
}

pub fn call_of(request: &PromptRequest) -> Call {
    let human = request.human.trim_end();
    if human.ends_with("Transformed chunk:") {
        Call::Apply
    } else if human.ends_with("Restyled row:") {
        Call::Reconcile
    } else if human.ends_with("Corrected row:") {
        Call::Refine
    } else if human.ends_with("Message:") {
        Call::Narrate
    } else {
        Call::Transform
    }
}

/// The column JSON a propagation request carries.
pub fn chunk_of(request: &PromptRequest) -> Map<String, Value> {
    let after = request
        .human
        .split("Chunk:\n")
        .nth(1)
        .expect("request has a chunk");
    let body = after
        .split("\n\nTransformed chunk:")
        .next()
        .expect("chunk is terminated");
    match serde_json::from_str(body).expect("chunk is JSON") {
        Value::Object(map) => map,
        other => panic!("chunk is not an object: {other}"),
    }
}

/// Answers a propagation request by renaming chunk columns.
pub fn rename_chunk(request: &PromptRequest, renames: &[(&str, &str)]) -> String {
    let chunk = chunk_of(request);
    let mut out = Map::new();
    for (from, to) in renames {
        out.insert((*to).to_string(), chunk.get(*from).cloned().unwrap_or(json!([])));
    }
    Value::Object(out).to_string()
}

/// `rows` x `columns` table with cells `r{row}c{col}`.
pub fn grid(rows: usize, columns: usize) -> Table {
    Table::from_columns(
        (0..columns)
            .map(|c| {
                (
                    format!("c{c}"),
                    (0..rows).map(|r| CellValue::text(format!("r{r}c{c}"))).collect::<Vec<_>>(),
                )
            })
            .collect(),
    )
    .unwrap()
}

/// Fails the `n`th propagation call (1-based), echoing the others.
pub struct FailOnCall {
    pub n: usize,
    pub seen: Cell<usize>,
}

impl FailOnCall {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            seen: Cell::new(0),
        }
    }

    pub fn answer(
        &self,
        request: &PromptRequest,
        renames: &[(&str, &str)],
    ) -> Result<String, GenerationError> {
        let call = self.seen.get() + 1;
        self.seen.set(call);
        if call == self.n {
            Err(GenerationError::Timeout(std::time::Duration::from_secs(30)))
        } else {
            Ok(rename_chunk(request, renames))
        }
    }
}
