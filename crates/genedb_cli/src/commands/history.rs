//! History command implementation.

use super::open_read_only;
use chrono::DateTime;
use std::path::Path;

/// Prints the undo history, newest first.
pub fn run(path: &Path, limit: Option<usize>) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_read_only(path)?;
    let history = db.history();

    println!("Undo History ({} transaction(s))", history.len());
    println!("============");

    for txn in history.iter().rev().take(limit.unwrap_or(usize::MAX)) {
        let when = DateTime::from_timestamp(txn.timestamp, 0)
            .map_or_else(|| txn.timestamp.to_string(), |t| t.format("%Y-%m-%d %H:%M:%S").to_string());
        let kinds: Vec<String> = txn.kinds().iter().map(ToString::to_string).collect();
        println!(
            "  {:<10} {when}  {}{} [{} change(s): {}]",
            txn.id.to_string(),
            txn.label,
            if txn.batch { " (batch)" } else { "" },
            txn.entries.len(),
            kinds.join(", ")
        );
    }

    Ok(())
}
