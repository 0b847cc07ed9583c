//! protoc-gen-protonorm - Generate normalize-and-validate routines for prost messages
//!
//! Invoked without descriptor inputs, this is a protoc plugin: it reads a
//! `CodeGeneratorRequest` from stdin and writes a `CodeGeneratorResponse` to
//! stdout. Given `--descriptor-set` or `--descriptor-dir` it generates
//! offline from descriptor sets written by `protoc --descriptor_set_out`.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use prost::Message;
use protonorm_core::{plugin, SynthesizedFile, SynthesizerConfig};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Generate normalize-and-validate routines for prost messages
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-protonorm")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Serialized FileDescriptorSet to generate from (repeatable).
    /// Without any descriptor input the tool runs as a protoc plugin.
    #[arg(long = "descriptor-set", value_name = "FILE")]
    descriptor_sets: Vec<PathBuf>,

    /// Directory searched recursively for descriptor sets
    /// (*.pb, *.binpb, *.desc, *.protoset)
    #[arg(long = "descriptor-dir", value_name = "DIR")]
    descriptor_dirs: Vec<PathBuf>,

    /// Proto file to generate for (repeatable). Defaults to every file that
    /// carries protonorm rules.
    #[arg(short, long = "file", value_name = "NAME")]
    files: Vec<String>,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Generator parameter, same syntax as `--protonorm_opt`
    /// (e.g. `runtime_path=crate::norm,file_suffix=.norm.rs`)
    #[arg(long, env = "PROTONORM_PARAMETER", default_value = "")]
    parameter: String,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// What to do with generated files
    #[arg(long, value_enum, default_value = "write")]
    mode: WriteMode,
}

/// What to do with generated files in offline mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WriteMode {
    /// Write files whose content changed
    Write,
    /// Only print the files that would be written
    DryRun,
    /// Fail if any file is missing or out of date
    Check,
}

/// Result of handling one generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    /// Already up to date
    Unchanged,
    /// Written to disk
    Written,
    /// Missing or different, but left alone
    Stale,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct OutputStats {
    generated: usize,
    unchanged: usize,
    written: usize,
    stale: usize,
}

impl OutputStats {
    fn record(&mut self, outcome: Outcome) {
        self.generated += 1;
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Written => self.written += 1,
            Outcome::Stale => self.stale += 1,
        }
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} generated, {} unchanged, {} written, {} stale",
            self.generated, self.unchanged, self.written, self.stale
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout carries the plugin response
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_env("PROTONORM_LOG").add_directive(level.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    if cli.descriptor_sets.is_empty() && cli.descriptor_dirs.is_empty() {
        return run_plugin();
    }

    let stats = run_offline(&cli)?;
    stats.print_summary();
    if cli.mode == WriteMode::Check && stats.stale > 0 {
        bail!("{} generated file(s) are out of date", stats.stale);
    }
    Ok(())
}

/// Answer one protoc request over stdin/stdout
fn run_plugin() -> Result<()> {
    let mut request = Vec::new();
    io::stdin()
        .lock()
        .read_to_end(&mut request)
        .context("Failed to read CodeGeneratorRequest from stdin")?;
    debug!("Read {} byte request", request.len());

    // Generation errors travel inside the response
    let response = plugin::run(&request);

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(&response.encode_to_vec())
        .context("Failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush().context("Failed to flush stdout")?;
    Ok(())
}

/// Generate from descriptor sets on disk
fn run_offline(cli: &Cli) -> Result<OutputStats> {
    let config = SynthesizerConfig::from_parameter(&cli.parameter)
        .with_context(|| format!("Invalid parameter: {}", cli.parameter))?;

    let paths = collect_descriptor_sets(&cli.descriptor_sets, &cli.descriptor_dirs)?;
    if paths.is_empty() {
        bail!("No descriptor sets found");
    }

    let mut sets = Vec::with_capacity(paths.len());
    for path in &paths {
        trace!("Reading {}", path.display());
        let data = fs::read(path)
            .with_context(|| format!("Failed to read descriptor set: {}", path.display()))?;
        sets.push(data);
    }
    info!("Loaded {} descriptor set(s)", sets.len());

    let generated = plugin::generate_from_descriptor_sets(&sets, &cli.files, &config)
        .context("Code generation failed")?;
    if generated.is_empty() {
        warn!("No file carries protonorm rules; nothing to generate");
    }

    let mut stats = OutputStats::default();
    for file in &generated {
        stats.record(emit(&cli.output, file, cli.mode)?);
    }
    Ok(stats)
}

/// Explicit descriptor files first, then directory matches in file name order
fn collect_descriptor_sets(files: &[PathBuf], dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for file in files {
        if !file.is_file() {
            bail!("Descriptor set does not exist: {}", file.display());
        }
        paths.push(file.clone());
    }

    for dir in dirs {
        if !dir.is_dir() {
            bail!("Path is not a directory: {}", dir.display());
        }

        info!("Scanning directory: {}", dir.display());
        for entry in WalkDir::new(dir)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            // Skip hidden files
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with('.'))
                .unwrap_or(false)
            {
                continue;
            }

            if !is_descriptor_set(path) {
                trace!("Skipping: {}", path.display());
                continue;
            }
            paths.push(path.to_path_buf());
        }
    }

    Ok(paths)
}

/// Whether a path looks like a serialized descriptor set
fn is_descriptor_set(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| {
            matches!(
                ext.to_lowercase().as_str(),
                "pb" | "binpb" | "desc" | "protoset"
            )
        })
        .unwrap_or(false)
}

/// Handle one generated file according to `mode`
fn emit(output_dir: &Path, file: &SynthesizedFile, mode: WriteMode) -> Result<Outcome> {
    let path = output_dir.join(&file.name);
    let outcome = write_output(&path, &file.content, mode)?;

    match outcome {
        Outcome::Unchanged => debug!("Up to date: {}", path.display()),
        Outcome::Written => println!("Wrote {}", path.display()),
        Outcome::Stale if mode == WriteMode::Check => warn!("Out of date: {}", path.display()),
        Outcome::Stale => println!("Would write: {}", path.display()),
    }
    Ok(outcome)
}

/// Write `content` to `path` unless it already holds exactly that content
fn write_output(path: &Path, content: &str, mode: WriteMode) -> Result<Outcome> {
    match fs::read_to_string(path) {
        Ok(existing) if existing == content => return Ok(Outcome::Unchanged),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read {}", path.display()));
        }
    }

    if mode != WriteMode::Write {
        return Ok(Outcome::Stale);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    Ok(Outcome::Written)
}
