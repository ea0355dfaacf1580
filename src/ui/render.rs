// Mon Oct 19 2026 - Alex

use crate::analysis::{BudgetOutcome, TypeReport};
use crate::diff::{ChangeSeverity, DiffResult};
use crate::error::Diagnostic;
use colored::Colorize;

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for diagnostic in diagnostics {
        eprintln!("{} {}", "[!]".yellow(), diagnostic);
    }
}

pub fn print_reports(reports: &[TypeReport]) {
    for report in reports {
        let ratio = format!("{:.1}%", report.padding_ratio * 100.0);
        let ratio = if report.excessive_padding {
            ratio.red()
        } else if report.padding_bytes > 0 {
            ratio.yellow()
        } else {
            ratio.green()
        };

        println!(
            "{} {} size {} align {} padding {} ({}) lines {}",
            report.kind.to_string().blue(),
            report.name.cyan(),
            report.size,
            report.align,
            report.padding_bytes,
            ratio,
            report.cache_lines_spanned
        );

        if let Some(reorder) = &report.reorder {
            let order: Vec<&str> = reorder.members.iter().map(|m| m.name.as_str()).collect();
            println!(
                "    {} reorder saves {} bytes: {}",
                "[+]".green(),
                reorder.savings_bytes,
                order.join(", ")
            );
        }
        if report.cache_unfriendly {
            println!(
                "    {} cache-unfriendly: {} lines at {:.0}% density",
                "[!]".yellow(),
                report.cache_lines_spanned,
                report.cache_line_density * 100.0
            );
        }
        if report.is_packed {
            println!("    {} packed", "[*]".blue());
        }
        for warning in &report.false_sharing {
            println!("    {} {}", "[!]".yellow(), warning);
        }
        for member in &report.unresolved_members {
            println!("    {} unresolved member {}", "[?]".red(), member);
        }
    }

    let wasted = reports.iter().fold(0u64, |acc, r| acc.saturating_add(r.padding_bytes));
    println!(
        "{} {} types, {} padding bytes, {} reorderable",
        "[+]".green(),
        reports.len(),
        wasted,
        reports.iter().filter(|r| r.reorderable).count()
    );
}

pub fn print_budget_outcome(outcome: &BudgetOutcome) {
    for name in &outcome.unmatched_names {
        eprintln!("{} budget for {} matches no type", "[!]".yellow(), name);
    }
    for pattern in &outcome.unmatched_patterns {
        eprintln!("{} budget pattern {} matches no type", "[!]".yellow(), pattern);
    }

    if outcome.passed() {
        println!("{} {} types within budget", "[+]".green(), outcome.checked);
        return;
    }
    for violation in &outcome.violations {
        println!("{} {}", "[-]".red(), violation);
    }
    println!(
        "{} {} violations across {} checked types",
        "[-]".red(),
        outcome.violations.len(),
        outcome.checked
    );
}

pub fn print_diff(result: &DiffResult) {
    for name in &result.added {
        println!("{} {}", "+".green(), name);
    }
    for name in &result.removed {
        println!("{} {}", "-".red(), name.red());
    }
    for diff in result.changed.values() {
        print!("{} {}", "~".yellow(), diff.name.cyan());
        if diff.old_size != diff.new_size {
            print!(" (size {} -> {}, {:+})", diff.old_size, diff.new_size, diff.size_delta());
        }
        println!();
        for change in &diff.changes {
            let tag = match change.severity() {
                ChangeSeverity::Breaking => "breaking".red(),
                ChangeSeverity::Minor => "minor".yellow(),
                ChangeSeverity::Informational => "info".normal(),
            };
            println!("    [{}] {}", tag, change);
        }
    }

    let summary = format!(
        "{} added, {} removed, {} changed",
        result.added.len(),
        result.removed.len(),
        result.changed.len()
    );
    if result.has_breaking_changes() {
        println!("{} {} (breaking)", "[!]".red(), summary);
    } else {
        println!("{} {}", "[+]".green(), summary);
    }
}
