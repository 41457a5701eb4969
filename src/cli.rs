//! Native CLI support for the tdz binary.

use crate::compiler::{CompileOptions, compile_file};
use clap::Parser;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::error;

/// Exit status codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_DIAGNOSTICS: i32 = 1;

#[derive(Parser, Debug)]
#[command(
    name = "tdz",
    version,
    about = "Rewrites typedData<T>() marker calls into literal property arrays"
)]
pub struct CliArgs {
    /// Files to transform.
    #[arg(required = true, value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Write transformed files into this directory (same file names).
    /// Without it, transformed source goes to stdout.
    #[arg(long, value_name = "DIR")]
    pub out_dir: Option<PathBuf>,

    /// Extra module name whose `typedData` export counts as the marker.
    /// Repeatable; the built-in names stay recognized.
    #[arg(long = "marker-module", value_name = "NAME")]
    pub marker_modules: Vec<String>,

    /// Disable colored diagnostics.
    #[arg(long)]
    pub no_color: bool,
}

impl CliArgs {
    pub fn compile_options(&self) -> CompileOptions {
        let mut options = CompileOptions::default();
        for name in &self.marker_modules {
            if !options.marker_modules.contains(name) {
                options.marker_modules.push(name.clone());
            }
        }
        options
    }
}

/// Transform every input file; report failures to stderr and keep going.
/// Returns the process exit code.
pub fn run(args: &CliArgs) -> i32 {
    let options = args.compile_options();
    let color = !args.no_color;
    let mut failed = false;

    for file in &args.files {
        match compile_file(file, &options) {
            Ok(output) => {
                if let Err(err) = emit_output(args, file, &output) {
                    report_failure(&err, color);
                    failed = true;
                }
            }
            Err(err) => {
                report_failure(&err, color);
                failed = true;
            }
        }
    }

    if failed { EXIT_DIAGNOSTICS } else { EXIT_SUCCESS }
}

fn emit_output(args: &CliArgs, file: &Path, output: &str) -> anyhow::Result<()> {
    use anyhow::Context as _;

    let Some(dir) = &args.out_dir else {
        print!("{output}");
        return Ok(());
    };
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let file_name = file
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("out.ts"));
    let target = dir.join(file_name);
    fs::write(&target, output).with_context(|| format!("failed to write {}", target.display()))?;
    Ok(())
}

fn report_failure(err: &anyhow::Error, color: bool) {
    error!(error = %err, "transform failed");
    let prefix = if color {
        "error".red().bold().to_string()
    } else {
        "error".to_string()
    };
    // Diagnostic lists render one message per line below the context line.
    match err.downcast_ref::<crate::diagnostics::CompileError>() {
        Some(compile_err) => {
            eprintln!("{prefix}: {err}");
            for line in compile_err.to_string().lines() {
                eprintln!("  {line}");
            }
        }
        None => eprintln!("{prefix}: {err:#}"),
    }
}
