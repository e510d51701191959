//! Inspect command implementation.

use super::open_read_only;
use genedb_core::{DbRead, DbSummary};
use serde::Serialize;
use std::path::Path;

/// Database inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Counts and history sizes.
    #[serde(flatten)]
    pub summary: DbSummary,
    /// Public id of the home person.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_person: Option<String>,
    /// Surnames (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname_list: Option<Vec<String>>,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_surnames: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let db = open_read_only(path)?;
    let result = InspectResult {
        summary: db.summary(),
        home_person: db.default_person().map(|p| p.gramps_id),
        surname_list: show_surnames.then(|| db.surnames()),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(path, &result),
    }

    Ok(())
}

fn print_text_output(path: &Path, result: &InspectResult) {
    let summary = &result.summary;
    println!("GeneDB Database: {}", path.display());
    println!("================");
    println!("  Schema version: {}", summary.schema_version);
    println!();
    println!("Records:");
    for (kind, count) in &summary.counts {
        println!("  {:<12} {count}", format!("{kind}:"));
    }
    println!();
    println!("  Surnames:     {}", summary.surnames);
    println!("  Undo entries: {}", summary.undo_len);
    if let Some(id) = &result.home_person {
        println!("  Home person:  {id}");
    }

    if let Some(surnames) = &result.surname_list {
        println!();
        println!("Surnames:");
        for surname in surnames {
            println!("  {surname}");
        }
    }
}
