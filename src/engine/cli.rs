//! CLI command handler: stream matching paths by default; --summary runs all three stages.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::io::{BufWriter, Write};

use crate::Opts;
use crate::engine::arg_parser::Cli;
use crate::pipeline::{Orchestrator, ScanSummary};
use crate::utils::config::Tuning;
use crate::utils::pathscan_toml::{apply_file_to_opts, load_config_file, load_pathscan_toml};
use crate::utils::setup_logging;
use crate::workers::CountingSink;

/// Config file first (explicit `--config` must load), then CLI flags on top.
fn setup_opts(cli: &Cli) -> Result<Opts> {
    let mut opts = Opts {
        tuning: Tuning::from_env(),
        ..Opts::default()
    };
    let file = match &cli.config {
        Some(path) => Some(load_config_file(path)?),
        None => load_pathscan_toml(&cli.dir),
    };
    if let Some(file) = &file {
        apply_file_to_opts(file, &mut opts);
    }
    opts.rules.extend(cli.filter_rules());
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    if let Some(v) = cli.summary {
        opts.summary = v;
    }
    if let Some(v) = cli.filter_debug {
        opts.tuning.filter_debug = v;
    }
    setup_logging(opts.verbose);
    if file.is_some() {
        debug!("Loaded config from {}", cli.config_path().display());
    }
    Ok(opts)
}

fn print_summary(summary: &ScanSummary, sink: &CountingSink) {
    println!("directories: {}", sink.dirs());
    println!("files:       {}", sink.files());
    for (component, count) in &summary.final_counts {
        debug!("{component} pushed {count} items");
    }
}

/// Scan `cli.dir`. Ctrl+C cancels the pipeline cleanly and turns into an error.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let opts = setup_opts(cli)?;
    let orchestrator = Orchestrator::new(&cli.dir, &opts.rules)?.with_tuning(opts.tuning.clone());

    let cancel = orchestrator.cancel_flag();
    ctrlc::set_handler(move || cancel.set()).context("set Ctrl+C handler")?;

    let (summary, scanned, stdout_closed) = if opts.summary {
        let sink = CountingSink::new();
        let summary = orchestrator.with_sink(Box::new(sink.clone())).run()?;
        print_summary(&summary, &sink);
        (summary, sink.total(), false)
    } else {
        let mut stream = orchestrator.stream()?;
        let mut stdout_closed = false;
        let stdout = std::io::stdout();
        let mut out = BufWriter::new(stdout.lock());
        while let Some(entry) = stream.next() {
            if let Err(e) = writeln!(out, "{} {}", entry.entry_type.marker(), entry.path.display())
            {
                // Broken pipe (e.g. `| head`): stop scanning, not an error.
                debug!("stdout closed: {e}");
                stdout_closed = true;
                stream.cancel();
                break;
            }
        }
        let _ = out.flush();
        drop(out);
        let summary = stream.finish()?;
        let scanned = summary.emitted;
        (summary, scanned, stdout_closed)
    };

    info!("Scanned {scanned} entries.");
    if summary.cancelled && !stdout_closed {
        warn!("Scan cancelled before completion.");
        anyhow::bail!("Scan cancelled by user; output is partial");
    }
    Ok(())
}
