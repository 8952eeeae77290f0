//! The confirm/refine conversation with the user.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tabmap_llm::TextGenerator;
use tabmap_map::{MapError, MappingPreview, MappingSession};

use crate::display::render_preview;

/// What the user answered to a proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Confirm,
    Refine(String),
    Quit,
}

/// How the review ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The session is awaiting confirmation with the accepted proposal.
    Accepted,
    Abandoned,
}

/// Interprets one answer line. `None` asks again.
///
/// `y`/`yes` confirms, `q`/`quit` quits, `n`/`no` asks for feedback, and
/// any other text is taken as the feedback itself.
pub fn parse_answer(line: &str) -> Option<Decision> {
    let answer = line.trim();
    match answer.to_ascii_lowercase().as_str() {
        "" => None,
        "y" | "yes" => Some(Decision::Confirm),
        "q" | "quit" => Some(Decision::Quit),
        "n" | "no" => Some(Decision::Refine(String::new())),
        _ => Some(Decision::Refine(answer.to_string())),
    }
}

/// Reads the user's decision. End of input quits.
pub fn ask<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Decision> {
    loop {
        write!(out, "Accept this mapping? [y]es / [n]o / [q]uit: ")?;
        out.flush()?;
        let Some(line) = read_line(input)? else {
            return Ok(Decision::Quit);
        };
        match parse_answer(&line) {
            Some(Decision::Refine(feedback)) if feedback.is_empty() => {
                return ask_feedback(input, out)
                    .map(|fb| fb.map_or(Decision::Quit, Decision::Refine));
            }
            Some(decision) => return Ok(decision),
            None => {}
        }
    }
}

/// Reads a non-empty feedback line; `None` on end of input or an empty line.
pub fn ask_feedback<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<Option<String>> {
    write!(out, "What should change? (empty line quits): ")?;
    out.flush()?;
    Ok(read_line(input)?
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty()))
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read answer")?;
    Ok((read > 0).then_some(line))
}

/// Proposes a mapping and loops over feedback until the user accepts or
/// quits. With `auto_confirm` the first proposal is accepted.
///
/// Retryable service failures are reported and the user is asked again;
/// anything else aborts the review.
pub fn review<G, R, W>(
    session: &mut MappingSession<G>,
    input: &mut R,
    out: &mut W,
    auto_confirm: bool,
) -> Result<ReviewOutcome>
where
    G: TextGenerator,
    R: BufRead,
    W: Write,
{
    let mut preview = propose(session, input, out)?;
    loop {
        let Some(shown) = preview.as_ref() else {
            return Ok(ReviewOutcome::Abandoned);
        };
        writeln!(out, "{}", render_preview(shown))?;
        if auto_confirm {
            return Ok(ReviewOutcome::Accepted);
        }
        let feedback = match ask(input, out)? {
            Decision::Confirm => return Ok(ReviewOutcome::Accepted),
            Decision::Quit => return Ok(ReviewOutcome::Abandoned),
            Decision::Refine(feedback) => feedback,
        };
        session.reject()?;
        preview = refine(session, feedback, input, out)?;
    }
}

fn propose<G, R, W>(
    session: &mut MappingSession<G>,
    input: &mut R,
    out: &mut W,
) -> Result<Option<MappingPreview>>
where
    G: TextGenerator,
    R: BufRead,
    W: Write,
{
    loop {
        match session.request_mapping() {
            Ok(preview) => return Ok(Some(preview)),
            Err(err) => {
                report(err, out)?;
                if !ask_retry(input, out)? {
                    return Ok(None);
                }
            }
        }
    }
}

/// Submits feedback until it succeeds. The session stays awaiting feedback
/// between attempts, so only new feedback or quitting is possible there.
fn refine<G, R, W>(
    session: &mut MappingSession<G>,
    mut feedback: String,
    input: &mut R,
    out: &mut W,
) -> Result<Option<MappingPreview>>
where
    G: TextGenerator,
    R: BufRead,
    W: Write,
{
    loop {
        match session.submit_feedback(&feedback) {
            Ok(preview) => return Ok(Some(preview)),
            Err(err) => {
                report(err, out)?;
                match ask_feedback(input, out)? {
                    Some(next) => feedback = next,
                    None => return Ok(None),
                }
            }
        }
    }
}

fn report<W: Write>(err: MapError, out: &mut W) -> Result<()> {
    if !err.is_retryable() {
        return Err(err.into());
    }
    tracing::warn!(error = %err, "service call failed");
    writeln!(out, "The service call failed: {err}")?;
    Ok(())
}

fn ask_retry<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "Try again? [y/n]: ")?;
    out.flush()?;
    Ok(read_line(input)?
        .is_some_and(|line| matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn answers_are_interpreted() {
        assert_eq!(parse_answer("Y\n"), Some(Decision::Confirm));
        assert_eq!(parse_answer("  quit "), Some(Decision::Quit));
        assert_eq!(parse_answer(""), None);
        assert_eq!(
            parse_answer("dates as ISO\n"),
            Some(Decision::Refine("dates as ISO".to_string()))
        );
    }

    #[test]
    fn no_asks_for_feedback() {
        let mut input = Cursor::new("n\nuse upper case\n");
        let mut out = Vec::new();
        let decision = ask(&mut input, &mut out).unwrap();
        assert_eq!(decision, Decision::Refine("use upper case".to_string()));
        assert!(String::from_utf8(out).unwrap().contains("What should change?"));
    }

    #[test]
    fn end_of_input_quits() {
        let mut input = Cursor::new("\n");
        let mut out = Vec::new();
        assert_eq!(ask(&mut input, &mut out).unwrap(), Decision::Quit);
    }
}
