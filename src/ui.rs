//! Terminal reporting for the release pipeline.
//!
//! Formatting only; nothing here mutates state. Credentials never pass
//! through this module.

use crate::orchestrator::{ReleaseOutcome, StageFailure};
use anyhow::Result;
use console::style;
use std::io::{self, Write};

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display the planned release before anything is mutated.
pub fn display_release_plan(
    current: &str,
    target: &str,
    tag: &str,
    branch: &str,
    remote: &str,
) {
    println!("\n{}", style("Planned release:").bold());
    println!("  Version: {} -> {}", style(current).red(), style(target).green());
    println!("  Commit:  Bump commit on '{}' pushed to '{}'", branch, remote);
    println!("  Tag:     {}", style(tag).green());
}

/// Display the result of a completed run.
pub fn display_outcome(outcome: &ReleaseOutcome) {
    if outcome.resumed {
        display_success(&format!(
            "Resumed publish of version {} succeeded",
            outcome.version
        ));
    } else if let Some(record) = &outcome.record {
        display_success(&format!(
            "Released version {}: commit {} on '{}', tag '{}'",
            outcome.version,
            short_oid(&record.commit.to_string()),
            record.branch,
            record.tag
        ));
    }

    if let Some(id) = &outcome.publish.registry_id {
        display_status(&format!("Registry assigned identifier: {}", id));
    }
}

/// Display a stage failure and, where one exists, the reconciliation path.
///
/// A publish failure after recording deliberately leaves the commit and tag
/// in place; the operator re-runs just the publish step.
pub fn display_failure(failure: &StageFailure, target: &str) {
    display_error(&failure.to_string());

    if matches!(failure.stage, crate::orchestrator::Stage::Publishing) {
        println!(
            "\n{} The version commit and tag remain pushed. Once the cause is fixed, re-run:\n  {}",
            style("→").yellow(),
            style(format!("release-publish {} --resume-publish", target)).cyan()
        );
    }
}

fn short_oid(hash: &str) -> &str {
    if hash.len() > 7 {
        &hash[..7]
    } else {
        hash
    }
}

/// Prompts user to confirm an action with a yes/no prompt.
///
/// Accepts "y" or "yes" (case-insensitive); default is "no" on Enter.
pub fn confirm_action(prompt: &str) -> Result<bool> {
    print!("\n{} (y/N): ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let response = input.trim().to_lowercase();
    Ok(response == "y" || response == "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_oid_truncates() {
        assert_eq!(short_oid("0123456789abcdef"), "0123456");
        assert_eq!(short_oid("abc"), "abc");
    }

    #[test]
    fn test_display_helpers() {
        // Visual verification test - output is printed to the terminal
        display_error("test error");
        display_success("test success");
        display_status("test status");
        display_release_plan("0.4.1", "0.4.2", "version/0.4.2", "main", "origin");
    }
}
