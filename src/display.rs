//! Colored terminal output for the process surface.
//!
//! Status lines go to stdout ahead of the raw model answer so a user can
//! always tell whether the document was saved.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::bridge::Answer;
use crate::store::Catalog;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Status line text for a persistence outcome.
#[must_use]
pub fn status_label(saved: bool) -> &'static str {
    if saved {
        "[SAVED]"
    } else {
        "[NOT SAVED]"
    }
}

/// Print the outcome of a processed question followed by the raw answer.
pub fn print_answer(answer: &Answer) {
    if answer.saved {
        println!(
            "{} {} Output document updated",
            timestamp().dimmed(),
            status_label(true).green().bold()
        );
    } else {
        println!(
            "{} {} The answer is not valid JSON; output left unchanged",
            timestamp().dimmed(),
            status_label(false).yellow().bold()
        );
    }
    print_raw_answer(&answer.raw);
}

/// Print the model answer verbatim.
pub fn print_raw_answer(raw: &str) {
    println!("{raw}");
    let _ = io::stdout().flush();
}

/// Print an error that aborted the current question.
pub fn print_error(message: &str) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[ERROR]".red().bold(),
        message.red()
    );
    let _ = io::stdout().flush();
}

/// Print the interactive prompt without a newline.
pub fn print_question_prompt() {
    print!("\n{} ", "Question:".cyan().bold());
    let _ = io::stdout().flush();
}

/// Print the resources and tools a Store exposes.
pub fn print_catalog(catalog: &Catalog) {
    println!("{}", "Resources".bold());
    for resource in &catalog.resources {
        println!(
            "  {}  {}",
            resource.uri.cyan(),
            resource.description.dimmed()
        );
    }
    println!("{}", "Tools".bold());
    for tool in &catalog.tools {
        println!(
            "  {}({})  {}",
            tool.name.cyan(),
            tool.arguments.join(", "),
            tool.description.dimmed()
        );
    }
    let _ = io::stdout().flush();
}
