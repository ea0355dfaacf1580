// Mon Oct 19 2026 - Alex

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "struct-layout-auditor")]
#[command(author = "Alex")]
#[command(version)]
#[command(about = "Audit and diff struct layouts from DWARF debug info", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: String,

    /// JSON config file; flags below override it.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(long, global = true)]
    pub cache_line: Option<u64>,

    /// Hot path type pattern (`*` and `?` wildcards); repeatable.
    #[arg(long = "hot", global = true)]
    pub hot: Vec<String>,

    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[arg(long, global = true)]
    pub no_color: bool,

    #[arg(long, global = true)]
    pub no_progress: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Padding and cache-fit report for every type in a binary.
    Inspect(InspectArgs),
    /// Compare the layouts of two builds.
    Diff(DiffArgs),
    /// Extract and store a snapshot for later diffs.
    Snapshot(SnapshotArgs),
    /// Hold every type to the budgets in the config file.
    Check(CheckArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortKey {
    Name,
    Size,
    Padding,
    Ratio,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    pub binary: PathBuf,

    /// Only types whose name contains this text.
    #[arg(short, long)]
    pub filter: Option<String>,

    #[arg(long, value_enum, default_value = "name")]
    pub sort_by: SortKey,

    #[arg(long, default_value = "0")]
    pub min_padding: u64,

    #[arg(long)]
    pub json: bool,

    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// Binary or saved snapshot (`.json`).
    pub old: PathBuf,

    /// Binary or saved snapshot (`.json`).
    pub new: PathBuf,

    #[arg(long)]
    pub json: bool,

    /// Exit with status 1 when any change is ABI-breaking.
    #[arg(long)]
    pub fail_on_breaking: bool,
}

#[derive(Parser, Debug)]
pub struct SnapshotArgs {
    pub binary: PathBuf,

    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Parser, Debug)]
pub struct CheckArgs {
    /// Binary or saved snapshot (`.json`).
    pub binary: PathBuf,

    #[arg(long)]
    pub json: bool,
}

impl InspectArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.binary.exists() {
            return Err(format!("Binary does not exist: {:?}", self.binary));
        }
        Ok(())
    }
}

impl DiffArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.old.exists() {
            return Err(format!("Old file does not exist: {:?}", self.old));
        }
        if !self.new.exists() {
            return Err(format!("New file does not exist: {:?}", self.new));
        }
        Ok(())
    }
}

impl CheckArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.binary.exists() {
            return Err(format!("Binary does not exist: {:?}", self.binary));
        }
        Ok(())
    }
}

impl SnapshotArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.binary.exists() {
            return Err(format!("Binary does not exist: {:?}", self.binary));
        }
        if self.out.is_file() {
            return Err(format!("Snapshot directory is a file: {:?}", self.out));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_diff() {
        let args = Args::try_parse_from([
            "struct-layout-auditor",
            "diff",
            "old.so",
            "new.so",
            "--fail-on-breaking",
            "--hot",
            "net::*",
            "--hot",
            "HotOrder",
        ])
        .unwrap();
        assert_eq!(args.hot, vec!["net::*".to_string(), "HotOrder".to_string()]);
        match args.command {
            Command::Diff(diff) => assert!(diff.fail_on_breaking),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_inspect_defaults() {
        let args = Args::try_parse_from(["struct-layout-auditor", "inspect", "a.out", "--sort-by", "padding"]).unwrap();
        assert_eq!(args.log_level, "warn");
        match args.command {
            Command::Inspect(inspect) => {
                assert_eq!(inspect.sort_by, SortKey::Padding);
                assert_eq!(inspect.min_padding, 0);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_check() {
        let args = Args::try_parse_from([
            "struct-layout-auditor",
            "check",
            "a.out",
            "--config",
            "budgets.json",
            "--json",
        ])
        .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("budgets.json")));
        match args.command {
            Command::Check(check) => assert!(check.json),
            other => panic!("unexpected {:?}", other),
        }
    }
}
