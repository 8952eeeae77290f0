//! Pipeline tuning (`[pipeline]` in `tabmap.toml`).

use serde::{Deserialize, Serialize};

/// Size-adaptive knobs of the mapping pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Target tables with at least this many (reduced) columns count as wide.
    pub wide_table_threshold: usize,
    /// Example sizing below the threshold (`[pipeline.narrow]`).
    pub narrow: ExampleProfile,
    /// Example sizing at or above the threshold (`[pipeline.wide]`).
    pub wide: ExampleProfile,
    /// Column count from which fewer style reference rows are sent.
    pub style_wide_threshold: usize,
    pub style_examples_narrow: usize,
    pub style_examples_wide: usize,
    /// Upper bound on source cells embedded in one propagation call.
    pub cell_budget: usize,
    /// Seed for example sampling. Unset draws from the OS.
    pub seed: Option<u64>,
    /// Ask the service for a prose description of each proposed mapping.
    pub narrate_mapping: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            wide_table_threshold: 20,
            narrow: ExampleProfile {
                few_shot_count: 6,
                retention: 0.8,
            },
            wide: ExampleProfile {
                few_shot_count: 3,
                retention: 0.6,
            },
            style_wide_threshold: 30,
            style_examples_narrow: 5,
            style_examples_wide: 3,
            cell_budget: 200,
            seed: None,
            narrate_mapping: false,
        }
    }
}

/// Example count and column retention for one table size class.
///
/// A profile table in `tabmap.toml` must give both keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExampleProfile {
    pub few_shot_count: usize,
    /// Fraction of columns kept per example.
    pub retention: f64,
}

/// How many examples to build and how many columns each keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExamplePlan {
    pub count: usize,
    pub kept_columns: usize,
    pub wide: bool,
}

impl PipelineConfig {
    #[must_use]
    pub fn is_wide(&self, columns: usize) -> bool {
        columns >= self.wide_table_threshold
    }

    /// Example count and kept columns for a target with `columns` columns.
    #[must_use]
    pub fn example_plan(&self, columns: usize) -> ExamplePlan {
        let wide = self.is_wide(columns);
        let profile = if wide { self.wide } else { self.narrow };
        ExamplePlan {
            count: profile.few_shot_count,
            kept_columns: kept_columns(columns, profile.retention),
            wide,
        }
    }

    /// Style reference rows sent to the reconciler.
    #[must_use]
    pub fn style_example_count(&self, columns: usize) -> usize {
        if columns >= self.style_wide_threshold {
            self.style_examples_wide
        } else {
            self.style_examples_narrow
        }
    }

    /// Source rows per propagation call: `max(1, cell_budget / source_columns)`.
    #[must_use]
    pub fn rows_per_chunk(&self, source_columns: usize) -> usize {
        self.cell_budget
            .checked_div(source_columns)
            .unwrap_or(self.cell_budget)
            .max(1)
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn kept_columns(columns: usize, retention: f64) -> usize {
    let retention = if retention.is_finite() {
        retention.clamp(0.0, 1.0)
    } else {
        1.0
    };
    ((columns as f64) * retention).floor() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow_and_wide_plans() {
        let config = PipelineConfig::default();
        assert_eq!(
            config.example_plan(10),
            ExamplePlan {
                count: 6,
                kept_columns: 8,
                wide: false
            }
        );
        assert_eq!(
            config.example_plan(25),
            ExamplePlan {
                count: 3,
                kept_columns: 15,
                wide: true
            }
        );
    }

    #[test]
    fn style_rows_shrink_for_wide_targets() {
        let config = PipelineConfig::default();
        assert_eq!(config.style_example_count(29), 5);
        assert_eq!(config.style_example_count(30), 3);
    }

    #[test]
    fn chunk_size_is_at_least_one() {
        let config = PipelineConfig {
            cell_budget: 50,
            ..PipelineConfig::default()
        };
        assert_eq!(config.rows_per_chunk(10), 5);
        assert_eq!(config.rows_per_chunk(80), 1);
        assert_eq!(config.rows_per_chunk(0), 50);
    }

    #[test]
    fn retention_is_clamped() {
        assert_eq!(kept_columns(4, 1.7), 4);
        assert_eq!(kept_columns(4, -0.5), 0);
        assert_eq!(kept_columns(5, 0.6), 3);
    }
}
