//! Few-shot examples built from target rows.
//!
//! Every example drops a random share of the row's columns so the
//! transformer learns to work from partial information. Narrow targets are
//! rendered as bare values; wide targets spell out `column is value`
//! because a long list of bare values is ambiguous.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{Map, Value};
use tabmap_model::{Row, Table};

use crate::config::PipelineConfig;

/// Rendered few-shot examples and the columns the transformer must produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleSet {
    pub text: String,
    pub columns: Vec<String>,
    pub count: usize,
}

/// A seeded generator, or one drawn from the OS when `seed` is unset.
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Builds examples from the leading rows of `target`.
pub fn select_examples<R: Rng + ?Sized>(
    target: &Table,
    config: &PipelineConfig,
    rng: &mut R,
) -> ExampleSet {
    let columns = target.column_names();
    let plan = config.example_plan(columns.len());
    let count = plan.count.min(target.row_count());

    let mut text = String::new();
    for row in target.rows().take(count) {
        let kept = rand::seq::index::sample(rng, columns.len(), plan.kept_columns);
        let picked: Vec<&str> = kept.iter().map(|idx| columns[idx].as_str()).collect();
        text.push_str(&render_example(&row, &picked, plan.wide));
        text.push('\n');
    }

    tracing::debug!(
        examples = count,
        kept_columns = plan.kept_columns,
        wide = plan.wide,
        "few-shot examples selected"
    );

    ExampleSet {
        text,
        columns,
        count,
    }
}

/// One `Elements:`/`JSON:` pair over the `picked` columns, in picked order.
pub fn render_example(row: &Row, picked: &[&str], wide: bool) -> String {
    let mut json = Map::new();
    let mut elements = Vec::with_capacity(picked.len());
    for &column in picked {
        let value = row.get(column).map(|v| v.render()).unwrap_or_default();
        if wide {
            elements.push(format!("{column} is {value}"));
        } else {
            elements.push(value.clone());
        }
        json.insert(column.to_string(), Value::String(value));
    }
    let separator = if wide { ", " } else { " " };
    format!(
        "Elements: {}\nJSON: {}\n",
        elements.join(separator),
        Value::Object(json)
    )
}

/// The transformer's textual view of a source row: its values, space-joined.
pub fn row_text(row: &Row) -> String {
    row.iter()
        .map(|(_, value)| value.render())
        .collect::<Vec<_>>()
        .join(" ")
}
