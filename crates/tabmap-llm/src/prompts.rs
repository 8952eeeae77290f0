//! Built-in prompting strategies used by the mapping pipeline.
//!
//! | Strategy           | Variables                                                | Policy              |
//! |--------------------|----------------------------------------------------------|---------------------|
//! | `row_transformer`  | `columns`, `examples`, `row`                             | `JsonObject`        |
//! | `cell_reconciler`  | `columns`, `reference_rows`, `row`                       | `JsonObject`        |
//! | `mapping_narrator` | `original_row`, `transformed_row`                        | `FreeText`          |
//! | `feedback_refiner` | `columns`, `source_row`, `result_row`, `relations`, `feedback` | `KeyFilteredObject` |
//! | `batch_applier`    | `example_source`, `example_target`, `chunk`              | `FrameFromJson`     |

use crate::strategy::{OutputPolicy, PromptStrategy};
use crate::template::PromptTemplate;

const ROW_TRANSFORMER_SYSTEM: &str = "\
You convert a loose list of table elements into one JSON object.
The object may only use these keys: {columns}
Use a value from the elements for a key only when it clearly belongs there.
Leave a key out when nothing in the elements fits it.
Answer with the JSON object and nothing else.

Examples of elements and the expected object:
{examples}";

const ROW_TRANSFORMER_HUMAN: &str = "\
Elements: {row}
JSON:";

const CELL_RECONCILER_SYSTEM: &str = "\
You restyle the values of a JSON row so they look like they were taken from a reference table.
Keys: {columns}
Keep every key as it is. Do not add information that is not already in the row.
Change only formats: dates, identifiers, casing, units and recurring text patterns.
A key whose value is an empty string stays an empty string.
Answer with the JSON object and nothing else. Use \"\" instead of null.";

const CELL_RECONCILER_HUMAN: &str = "\
Reference rows:
{reference_rows}

Row to restyle:
{row}

Restyled row:";

const MAPPING_NARRATOR_SYSTEM: &str = "\
You tell a user how a table row was reorganized.
You get the first row of the original table and the same row after it was mapped
into a new layout, both as JSON. Describe which original columns ended up in which
new columns, one line per new column, in the form `new column <- original column`.
Finish by asking whether the mapping looks right.";

const MAPPING_NARRATOR_HUMAN: &str = "\
Original row: {original_row}

Mapped row: {transformed_row}

Message:";

const FEEDBACK_REFINER_SYSTEM: &str = "\
You correct a JSON row that was produced from a source row, following the user's feedback.
The row may only use these keys: {columns}
Apply the feedback exactly. Keep values the feedback does not mention.
Answer with the corrected JSON object and nothing else. Only include non-empty values.";

const FEEDBACK_REFINER_HUMAN: &str = "\
Source row:
{source_row}

Current result:
{result_row}

Detected relations:
{relations}

Feedback: {feedback}

Corrected row:";

const BATCH_APPLIER_SYSTEM: &str = "\
You repeat one row transformation on many rows.
Example source is a row of the first table; example target is the same row
after it was transformed into the layout of the second table.
Apply exactly the same transformation to every row of the chunk.
Keys that are absent from the example target must stay absent.
Answer with column-oriented JSON of the form {{\"column\": [value, ...]}},
one value per chunk row, in chunk order. Use \"\" instead of null.";

const BATCH_APPLIER_HUMAN: &str = "\
Example source:
{example_source}

Example target:
{example_target}

Chunk:
{chunk}

Transformed chunk:";

fn strategy(
    name: &'static str,
    system: &str,
    human: &str,
    policy: OutputPolicy,
) -> PromptStrategy {
    PromptStrategy::new(name, PromptTemplate::new(system), PromptTemplate::new(human), policy)
}

/// Maps a textual row rendering onto the target columns.
pub fn row_transformer() -> PromptStrategy {
    strategy(
        "row_transformer",
        ROW_TRANSFORMER_SYSTEM,
        ROW_TRANSFORMER_HUMAN,
        OutputPolicy::JsonObject,
    )
}

/// Restyles a transformed row after reference rows of the target.
pub fn cell_reconciler() -> PromptStrategy {
    strategy(
        "cell_reconciler",
        CELL_RECONCILER_SYSTEM,
        CELL_RECONCILER_HUMAN,
        OutputPolicy::JsonObject,
    )
}

/// Writes a short human-readable account of a column mapping.
pub fn mapping_narrator() -> PromptStrategy {
    strategy(
        "mapping_narrator",
        MAPPING_NARRATOR_SYSTEM,
        MAPPING_NARRATOR_HUMAN,
        OutputPolicy::FreeText,
    )
}

/// Patches a transformed row according to user feedback.
pub fn feedback_refiner() -> PromptStrategy {
    strategy(
        "feedback_refiner",
        FEEDBACK_REFINER_SYSTEM,
        FEEDBACK_REFINER_HUMAN,
        OutputPolicy::KeyFilteredObject,
    )
}

/// Applies a confirmed example transformation to a chunk of rows.
pub fn batch_applier() -> PromptStrategy {
    strategy(
        "batch_applier",
        BATCH_APPLIER_SYSTEM,
        BATCH_APPLIER_HUMAN,
        OutputPolicy::FrameFromJson,
    )
}
