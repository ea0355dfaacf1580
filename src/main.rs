// Mon Oct 19 2026 - Alex

use colored::Colorize;
use std::process::ExitCode;
use struct_layout_auditor::ui::cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "[!]".red(), e);
            for cause in e.chain().skip(1) {
                eprintln!("    {} {}", "caused by:".dimmed(), cause);
            }
            ExitCode::from(2)
        }
    }
}
