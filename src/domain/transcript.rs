//! Markdown transcript stored with each reservation

use crate::domain::conversation::{CallSession, Speaker};
use chrono::{DateTime, Utc};
use std::fmt::Write;

/// Render the call as markdown: header, collected data, numbered turns and
/// a one-line summary.
pub fn render_transcript(session: &CallSession, outcome: &str, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let language = session
        .language()
        .map(|l| l.to_string())
        .unwrap_or_else(|| "-".to_string());
    let history = session.history();

    let _ = writeln!(out, "# Call {}", session.call_id());
    let _ = writeln!(out);
    let _ = writeln!(out, "- Language: {}", language);
    let _ = writeln!(out, "- Started: {}", session.created_at().to_rfc3339());
    let _ = writeln!(out, "- Generated: {}", generated_at.to_rfc3339());
    let _ = writeln!(out, "- Turns: {}", history.len());
    let _ = writeln!(out);

    let slots = session.slots();
    let or_dash = |v: Option<String>| v.unwrap_or_else(|| "-".to_string());
    let _ = writeln!(out, "## Reservation");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Field | Value |");
    let _ = writeln!(out, "|---|---|");
    let _ = writeln!(out, "| People | {} |", or_dash(slots.party_size.map(|p| p.to_string())));
    let _ = writeln!(out, "| Date | {} |", or_dash(slots.date.map(|d| d.to_string())));
    let _ = writeln!(
        out,
        "| Time | {} |",
        or_dash(slots.time.map(|t| t.format("%H:%M").to_string()))
    );
    let _ = writeln!(out, "| Name | {} |", or_dash(slots.name.clone()));
    let _ = writeln!(out, "| Phone | {} |", or_dash(slots.phone.clone()));
    let _ = writeln!(out);

    let _ = writeln!(out, "## Conversation");
    let _ = writeln!(out);
    for (i, turn) in history.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. **{}** ({}): {}",
            i + 1,
            turn.speaker.as_str(),
            turn.timestamp.format("%H:%M:%S"),
            turn.text
        );
    }
    let _ = writeln!(out);

    let caller_turns = history
        .iter()
        .filter(|t| t.speaker == Speaker::Caller)
        .count();
    let _ = writeln!(out, "## Summary");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "{} caller turns, {} assistant turns, outcome: {}",
        caller_turns,
        history.len() - caller_turns,
        outcome
    );

    out
}
