// Mon Oct 19 2026 - Alex

use super::args::{Args, CheckArgs, Command, DiffArgs, InspectArgs, SnapshotArgs, SortKey};
use crate::analysis::TypeReport;
use crate::config::AuditConfig;
use crate::engine::AuditPipeline;
use crate::structure::{Snapshot, SnapshotStore};
use crate::ui::progress::ProgressManager;
use crate::ui::render;
use anyhow::Context;
use colored::Colorize;
use std::path::Path;
use std::process::ExitCode;

pub struct CommandHandler {
    progress: ProgressManager,
}

impl CommandHandler {
    pub fn new() -> Self {
        Self {
            progress: ProgressManager::new(),
        }
    }

    pub fn execute(&mut self, args: Args) -> anyhow::Result<ExitCode> {
        self.setup_logging(&args)?;
        if args.no_color {
            colored::control::set_override(false);
        }
        self.progress = ProgressManager::new().with_enabled(!args.no_progress);

        let config = self.load_config(&args)?;
        let pipeline = AuditPipeline::new(config).context("invalid configuration")?;

        match args.command {
            Command::Inspect(inspect) => self.handle_inspect(&pipeline, inspect),
            Command::Diff(diff) => self.handle_diff(&pipeline, diff),
            Command::Snapshot(snapshot) => self.handle_snapshot(&pipeline, snapshot),
            Command::Check(check) => self.handle_check(&pipeline, check),
        }
    }

    fn setup_logging(&self, args: &Args) -> anyhow::Result<()> {
        let level = match args.log_level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "info" => log::LevelFilter::Info,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Warn,
        };

        env_logger::Builder::new()
            .filter_level(level)
            .format_timestamp(None)
            .try_init()
            .context("logger already initialized")?;

        Ok(())
    }

    fn load_config(&self, args: &Args) -> anyhow::Result<AuditConfig> {
        let mut config = match &args.config {
            Some(path) => AuditConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => AuditConfig::default(),
        };
        if let Some(line) = args.cache_line {
            config = config.with_cache_line_size(line);
        }
        if !args.hot.is_empty() {
            config = config.with_hot_path_tags(args.hot.iter().cloned());
        }
        if let Some(threads) = args.threads {
            config = config.with_max_threads(threads);
        }
        Ok(config)
    }

    fn load_snapshot(&self, pipeline: &AuditPipeline, path: &Path) -> anyhow::Result<Snapshot> {
        if path.extension().is_some_and(|ext| ext == "json") {
            return SnapshotStore::load_file(path).with_context(|| format!("reading snapshot {}", path.display()));
        }

        let output = self
            .progress
            .run(&format!("Extracting {}", path.display()), || pipeline.cached_snapshot(path))
            .with_context(|| format!("extracting layouts from {}", path.display()))?;
        render::print_diagnostics(&output.diagnostics);
        Ok(output.snapshot)
    }

    fn handle_inspect(&self, pipeline: &AuditPipeline, args: InspectArgs) -> anyhow::Result<ExitCode> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        let snapshot = self.load_snapshot(pipeline, &args.binary)?;
        let mut reports = select_reports(pipeline.analyze(&snapshot)?, args.filter.as_deref(), args.min_padding);
        sort_reports(&mut reports, args.sort_by);

        if args.json {
            let json = serde_json::to_string_pretty(&reports)?;
            match &args.output {
                Some(path) => std::fs::write(path, json).with_context(|| format!("writing {}", path.display()))?,
                None => println!("{}", json),
            }
        } else {
            render::print_reports(&reports);
        }
        Ok(ExitCode::SUCCESS)
    }

    fn handle_diff(&self, pipeline: &AuditPipeline, args: DiffArgs) -> anyhow::Result<ExitCode> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        let before = self.load_snapshot(pipeline, &args.old)?;
        let after = self.load_snapshot(pipeline, &args.new)?;
        let result = pipeline.diff(&before, &after);

        if args.json {
            println!("{}", result.to_json()?);
        } else {
            render::print_diff(&result);
        }

        if args.fail_on_breaking && result.has_breaking_changes() {
            return Ok(ExitCode::from(1));
        }
        Ok(ExitCode::SUCCESS)
    }

    fn handle_check(&self, pipeline: &AuditPipeline, args: CheckArgs) -> anyhow::Result<ExitCode> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        if pipeline.config().budgets.is_empty() {
            log::warn!("no budgets configured; pass --config with a \"budgets\" table");
            return Ok(ExitCode::SUCCESS);
        }

        let snapshot = self.load_snapshot(pipeline, &args.binary)?;
        let outcome = pipeline.check(&snapshot)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        } else {
            render::print_budget_outcome(&outcome);
        }

        if !outcome.passed() {
            return Ok(ExitCode::from(1));
        }
        Ok(ExitCode::SUCCESS)
    }

    fn handle_snapshot(&self, pipeline: &AuditPipeline, args: SnapshotArgs) -> anyhow::Result<ExitCode> {
        args.validate().map_err(|e| anyhow::anyhow!(e))?;

        let output = self
            .progress
            .run(&format!("Extracting {}", args.binary.display()), || {
                pipeline.snapshot_from_path(&args.binary)
            })
            .with_context(|| format!("extracting layouts from {}", args.binary.display()))?;
        render::print_diagnostics(&output.diagnostics);

        let path = SnapshotStore::new(&args.out)
            .save(&output.snapshot)
            .with_context(|| format!("writing snapshot to {}", args.out.display()))?;
        println!(
            "{} {} types saved to {}",
            "[+]".green(),
            output.snapshot.len(),
            path.display()
        );
        Ok(ExitCode::SUCCESS)
    }
}

impl Default for CommandHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Reports whose name contains `filter` and that carry at least `min_padding` bytes of padding.
fn select_reports(reports: Vec<TypeReport>, filter: Option<&str>, min_padding: u64) -> Vec<TypeReport> {
    reports
        .into_iter()
        .filter(|r| filter.map_or(true, |text| r.name.contains(text)))
        .filter(|r| r.padding_bytes >= min_padding)
        .collect()
}

fn sort_reports(reports: &mut [TypeReport], key: SortKey) {
    match key {
        SortKey::Name => reports.sort_by(|a, b| a.name.cmp(&b.name)),
        SortKey::Size => reports.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.name.cmp(&b.name))),
        SortKey::Padding => {
            reports.sort_by(|a, b| b.padding_bytes.cmp(&a.padding_bytes).then_with(|| a.name.cmp(&b.name)))
        }
        SortKey::Ratio => reports.sort_by(|a, b| {
            b.padding_ratio
                .total_cmp(&a.padding_ratio)
                .then_with(|| a.name.cmp(&b.name))
        }),
    }
}
