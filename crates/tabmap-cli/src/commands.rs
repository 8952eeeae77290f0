use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tabmap_cli::config::{AppConfig, Overrides};
use tabmap_cli::display::groups_table;
use tabmap_cli::review::{ReviewOutcome, review};
use tabmap_ingest::{read_table, write_csv_path};
use tabmap_llm::{OpenAiClient, TextGenerator};
use tabmap_map::{MappingSession, group_columns};

use crate::cli::{GroupsArgs, MapArgs};

pub fn run_map(args: &MapArgs, config: AppConfig) -> Result<ReviewOutcome> {
    let config = config.with_overrides(Overrides {
        model: args.model.clone(),
        base_url: args.base_url.clone(),
        cell_budget: args.cell_budget,
        seed: args.seed,
        narrate: args.narrate,
    });
    let source = read_table(&args.source)
        .with_context(|| format!("failed to read source table {}", args.source.display()))?;
    let target = read_table(&args.target)
        .with_context(|| format!("failed to read target table {}", args.target.display()))?;
    let client =
        OpenAiClient::new(config.provider).context("failed to set up the generation client")?;

    let mut session = MappingSession::new(client, config.pipeline);
    session.register_tables(source, target);

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut stderr = io::stderr();
    let outcome = review(&mut session, &mut input, &mut stderr, args.yes)?;
    if outcome == ReviewOutcome::Abandoned {
        eprintln!("Mapping abandoned; nothing written.");
        return Ok(outcome);
    }

    propagate(&mut session)?;
    match &args.output {
        Some(path) => {
            let table = session.final_table()?;
            write_csv_path(table, path)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} rows to {}", table.row_count(), path.display());
        }
        None => session
            .write_csv(io::stdout().lock())
            .context("failed to write the result")?,
    }
    Ok(outcome)
}

fn propagate<G: TextGenerator>(session: &mut MappingSession<G>) -> Result<()> {
    let bar = progress_bar();
    let result = session.confirm_with(|progress| {
        bar.set_position(u64::from(progress.percent));
        bar.set_message(format!("{}/{} rows", progress.rows_processed, progress.total_rows));
    });
    match result {
        Ok(_) => {
            bar.finish_and_clear();
            Ok(())
        }
        Err(err) => {
            bar.abandon();
            Err(err).context("propagation failed")
        }
    }
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    if !io::stderr().is_terminal() {
        bar.set_draw_target(ProgressDrawTarget::hidden());
    }
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

pub fn run_groups(args: &GroupsArgs) -> Result<()> {
    let target = read_table(&args.target)
        .with_context(|| format!("failed to read {}", args.target.display()))?;
    let grouping = group_columns(&target);
    println!(
        "{} columns, {} after merging identical ones",
        target.column_count(),
        grouping.reduced().column_count()
    );
    println!("{}", groups_table(&grouping));
    Ok(())
}
