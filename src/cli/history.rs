use crossterm::style::Stylize;

use crate::ledger::LedgerEntry;

const TIME_WIDTH: usize = 32;
const TAG_WIDTH: usize = 30;
const LEVEL_WIDTH: usize = 30;
const USER_WIDTH: usize = 20;
const CURRENT_MARK: &str = " (current)";

/// Renders the ledger history (newest first) as a table.
///
/// The first row is the current state and is marked, and highlighted when
/// `color` is set.
pub fn render_history(entries: &[LedgerEntry], color: bool) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "\n| {:<tw$} | {:<gw$} | {:<lw$} | {:<uw$} |\n",
        "DATETIME HISTORY",
        "TAG",
        "LEVEL (State)",
        "USER",
        tw = TIME_WIDTH,
        gw = TAG_WIDTH,
        lw = LEVEL_WIDTH + CURRENT_MARK.len(),
        uw = USER_WIDTH
    ));
    out.push_str(&format!(
        "| {} | {} | {} | {} |\n",
        "-".repeat(TIME_WIDTH),
        "-".repeat(TAG_WIDTH),
        "-".repeat(LEVEL_WIDTH + CURRENT_MARK.len()),
        "-".repeat(USER_WIDTH)
    ));

    for (i, entry) in entries.iter().enumerate() {
        let current = i == 0;
        let mark = if current { CURRENT_MARK } else { "" };
        let row = format!(
            "| {:<tw$} | {:<gw$} | {:<lw$}{:<mw$} | {:<uw$} |",
            entry.created_at.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
            entry.tag,
            entry.level,
            mark,
            entry.operator,
            tw = TIME_WIDTH,
            gw = TAG_WIDTH,
            lw = LEVEL_WIDTH,
            mw = CURRENT_MARK.len(),
            uw = USER_WIDTH
        );
        if current && color {
            out.push_str(&format!("{}\n", row.yellow()));
        } else {
            out.push_str(&row);
            out.push('\n');
        }
    }

    out
}
