//! Interactive terminal adapter over a [`QuizSession`].
use anyhow::{Context, Result};
use colored::Colorize;
use histquiz_game::{
    AdvanceTimer, ChoiceShuffler, NodeView, PendingAdvance, QuizSession, Resolution,
    SessionStatus,
};
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

/// How an interactive run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaySummary {
    pub status: SessionStatus,
    pub answered: usize,
    pub correct: usize,
}

/// Parse a 1-based menu selection into a choice position.
pub fn parse_selection(line: &str, len: usize) -> Option<usize> {
    let picked = line.trim().parse::<usize>().ok()?;
    (1..=len).contains(&picked).then(|| picked - 1)
}

/// Drive one session from `input` until it ends, the input closes, or the
/// player interrupts a pending advance.
pub async fn run<S, R, W>(session: &mut QuizSession<S>, input: R, out: &mut W) -> Result<PlaySummary>
where
    S: ChoiceShuffler,
    R: AsyncBufRead + Unpin,
    W: Write,
{
    session.start().context("failed to start session")?;
    let mut lines = input.lines();

    loop {
        let view = session.present_node().context("failed to present node")?;
        render_view(out, &view)?;
        if view.choices.is_empty() {
            writeln!(out, "{}", "This scene has no choices. Session ended.".yellow())?;
            break;
        }

        let Some(position) = read_selection(&mut lines, out, view.choices.len()).await? else {
            writeln!(out)?;
            writeln!(out, "{}", "Input closed. Session abandoned.".yellow())?;
            session.reset();
            break;
        };

        let resolution = match session.resolve_choice(view.choices[position].choice_ref) {
            Ok(resolution) => resolution,
            Err(err) => {
                log::error!("choice resolution failed: {err}");
                writeln!(out, "{}", format!("Session ended: {err}").red())?;
                break;
            }
        };
        render_resolution(out, &view, position, &resolution)?;

        let Some(pending) = resolution.pending else {
            break;
        };
        out.flush()?;
        if !wait_for_advance(session, &pending).await {
            writeln!(out, "{}", "Advance cancelled. Session abandoned.".yellow())?;
            session.reset();
            break;
        }
    }

    let state = session.state();
    let summary = PlaySummary {
        status: state.status(),
        answered: state.history().len(),
        correct: state.correct_answers(),
    };
    log::info!(
        "session finished as {} after {} answers",
        summary.status,
        summary.answered
    );
    writeln!(
        out,
        "{}",
        format!(
            "Final status: {} ({}/{} correct)",
            summary.status, summary.correct, summary.answered
        )
        .bold()
    )?;
    out.flush()?;
    Ok(summary)
}

fn render_view<W: Write>(out: &mut W, view: &NodeView) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", view.description.bright_white().bold())?;
    for (position, choice) in view.choices.iter().enumerate() {
        writeln!(out, "  {}. {}", position + 1, choice.text)?;
    }
    Ok(())
}

async fn read_selection<R, W>(lines: &mut Lines<R>, out: &mut W, len: usize) -> Result<Option<usize>>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            return Ok(None);
        };
        if let Some(position) = parse_selection(&line, len) {
            return Ok(Some(position));
        }
        writeln!(out, "{}", format!("Enter a number between 1 and {len}.").yellow())?;
    }
}

/// Echo the answered view with every option locked.
fn render_resolution<W: Write>(
    out: &mut W,
    view: &NodeView,
    position: usize,
    resolution: &Resolution,
) -> Result<()> {
    writeln!(out)?;
    for (index, choice) in view.choices.iter().enumerate() {
        let line = format!("  {}. {}", index + 1, choice.text);
        if index == position {
            let marked = if resolution.outcome.is_correct() {
                line.green().bold()
            } else {
                line.red().bold()
            };
            writeln!(out, "{marked}")?;
        } else {
            writeln!(out, "{}", line.dimmed())?;
        }
    }
    let message = if resolution.outcome.is_correct() {
        resolution.message.green()
    } else {
        resolution.message.red()
    };
    writeln!(out, "{message}")?;
    Ok(())
}

async fn wait_for_advance<S: ChoiceShuffler>(
    session: &QuizSession<S>,
    pending: &PendingAdvance,
) -> bool {
    let mut timer = AdvanceTimer::start(pending);
    let fired = tokio::select! {
        fired = timer.wait() => fired,
        _ = tokio::signal::ctrl_c() => {
            log::info!("interrupted while waiting to advance to '{}'", pending.next_node_id);
            None
        }
    };
    if fired.is_none() {
        timer.cancel();
    }
    fired.is_some_and(|advance| session.engine().is_pending_current(&advance))
}
