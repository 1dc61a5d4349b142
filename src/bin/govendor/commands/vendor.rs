//! Default `govendor` command: generate or check manifests.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};

use crate::cli::Cli;
use govendor::core::platform::parse_platforms;
use govendor::ops::{
    ensure_success, render_results, vendor, VendorOptions, VendorResult, VendorStatus,
};
use govendor::resolver::{GoCommand, DEFAULT_JOBS};
use govendor::util::config::{global_config_path, load_config, project_config_path};
use govendor::util::shell::{format_duration, Status};
use govendor::util::Shell;

pub fn execute(cli: Cli, shell: &Shell) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let config = load_config(global_config_path().as_deref(), &project_config_path(&cwd))?;

    let requested = if cli.include_platforms.is_empty() {
        &config.vendor.include_platforms
    } else {
        &cli.include_platforms
    };
    let include_platforms = parse_platforms(requested.as_slice())?;

    let go = GoCommand::discover(cli.go.clone().or_else(|| config.go.binary.clone()))
        .with_timeout(config.go_timeout());

    let opts = VendorOptions {
        vendored_version: Some(cli.vendored_version()),
        paths: cli.paths,
        check: cli.check,
        force: cli.force,
        strict: cli.strict || config.vendor.strict,
        recursive: cli.recursive,
        max_depth: cli.depth.unwrap_or(0),
        workspace: cli.workspace,
        include_platforms,
        jobs: cli.jobs.or(config.vendor.jobs).unwrap_or(DEFAULT_JOBS),
    };

    let (status, verb) = if opts.check {
        (Status::Checking, "checking")
    } else {
        (Status::Vendoring, "vendoring")
    };
    shell.status(status, "Go dependencies");

    let start = Instant::now();
    let spinner = shell.spinner(format!("{} Go dependencies", verb));
    let results = vendor(&opts, Arc::new(go));
    spinner.finish();
    let results = results?;

    let shown: Vec<VendorResult> = if shell.is_quiet() {
        results
            .iter()
            .filter(|r| r.status.is_failure())
            .cloned()
            .collect()
    } else {
        results.clone()
    };
    if !shown.is_empty() {
        shell.print(&render_results(&shown, shell.use_color()));
    }

    let warnings = results
        .iter()
        .filter(|r| r.status == VendorStatus::Warning)
        .count();
    if warnings > 0 {
        shell.warn(format!(
            "{} manifest(s) recorded by a different govendor version",
            warnings
        ));
    }

    shell.status(
        Status::Finished,
        format!(
            "{} target(s) in {}",
            results.len(),
            format_duration(start.elapsed())
        ),
    );

    ensure_success(&results)?;
    Ok(())
}
