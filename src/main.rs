//! CLI entry point for sharewalk

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::Parser;
use sharewalk::logging::init_logging;
use sharewalk::{
    Entry, Limits, LocalConfig, LocalWalker, Snapshot, WalkStats, build_tree, dump_diff,
    dump_full, dump_reverse, load_previous, print_json, print_stats, print_stats_json, probe,
    release, replay,
};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sharewalk")]
#[command(about = "Walk a shared directory tree and write a replayable dump")]
#[command(version)]
struct Args {
    /// Directory to walk
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Print every path with its size instead of a reverse dump
    #[arg(long, group = "mode")]
    full: bool,

    /// Print the whole tree as JSON
    #[arg(long, group = "mode")]
    json: bool,

    /// Write a patch against the snapshot in OLD, followed by a fresh dump
    #[arg(long, value_name = "OLD", group = "mode")]
    diff: Option<PathBuf>,

    /// Only check whether the directory lists anything
    #[arg(long, group = "mode")]
    probe: bool,

    /// Re-emit the snapshot in SNAP as a reverse dump (PATH is not walked)
    #[arg(long, value_name = "SNAP", group = "mode")]
    replay: Option<PathBuf>,

    /// Leave directories numbered above N unread
    #[arg(long = "max-dirs", value_name = "N")]
    max_dirs: Option<u64>,

    /// Read at most N entries from one directory
    #[arg(long = "max-items", value_name = "N")]
    max_items: Option<usize>,

    /// Number of matching items below a directory that counts as a loop
    #[arg(long = "recursion-threshold", value_name = "N")]
    recursion_threshold: Option<u32>,

    /// Ignore entries whose name matches pattern (can be used multiple times)
    #[arg(short = 'I', long = "ignore")]
    ignore: Vec<String>,

    /// Descend into symbolic links
    #[arg(long = "follow-symlinks")]
    follow_symlinks: bool,

    /// Print walk statistics to stderr when done (as JSON with --json)
    #[arg(long)]
    stats: bool,

    /// Log per-directory progress
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn limits(&self) -> Limits {
        let defaults = Limits::default();
        Limits {
            max_dirs: self.max_dirs.unwrap_or(defaults.max_dirs),
            max_items_in_dir: self.max_items.unwrap_or(defaults.max_items_in_dir),
            recursion_threshold: self
                .recursion_threshold
                .unwrap_or(defaults.recursion_threshold),
        }
    }

    fn local_config(&self) -> LocalConfig {
        LocalConfig {
            follow_symlinks: self.follow_symlinks,
            ignore_patterns: self.ignore.clone(),
        }
    }
}

/// Name the root entry carries in paths: the argument as given, without a
/// trailing slash.
fn root_name(path: &Path) -> Result<String> {
    let Some(text) = path.to_str() else {
        bail!("path '{}' is not valid UTF-8", path.display());
    };
    if text.contains('\n') {
        bail!("path {:?} contains a newline", text);
    }
    let trimmed = text.trim_end_matches('/');
    Ok(if trimmed.is_empty() { text } else { trimmed }.to_string())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("sharewalk: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<ExitCode> {
    let started = Instant::now();
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    if let Some(snap) = &args.replay {
        let snapshot = Snapshot::open(snap)
            .with_context(|| format!("cannot read snapshot '{}'", snap.display()))?;
        let counts = replay(snapshot.root, &mut out).context("error writing output")?;
        out.flush().context("error writing output")?;
        info!(lines = counts.plain, "snapshot replayed");
        return Ok(ExitCode::SUCCESS);
    }

    let name = root_name(&args.path)?;
    let mut walker = LocalWalker::new(&args.path, &args.local_config());

    if args.probe {
        let reachable = probe(&mut walker);
        writeln!(out, "{}", if reachable { "reachable" } else { "empty" })?;
        out.flush()?;
        return Ok(if reachable {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    if !args.path.is_dir() {
        bail!(
            "cannot access '{}': No such directory",
            args.path.display()
        );
    }

    let limits = args.limits();
    let root = Entry::root(name);
    let stats = if args.full {
        dump_full(&mut walker, root, limits, &mut out).context("walk failed")?
    } else if args.json {
        let (tree, stats) = build_tree(&mut walker, root, limits).context("walk failed")?;
        print_json(&tree, &mut out).context("error writing output")?;
        release(tree);
        stats
    } else if let Some(old) = &args.diff {
        let previous = load_previous(old)
            .with_context(|| format!("cannot read snapshot '{}'", old.display()))?;
        dump_diff(&mut walker, root, previous, limits, &mut out).context("walk failed")?
    } else {
        dump_reverse(&mut walker, root, limits, &mut out).context("walk failed")?
    };
    out.flush().context("error writing output")?;

    finish(args, &stats, started.elapsed())?;
    Ok(ExitCode::SUCCESS)
}

fn finish(args: &Args, stats: &WalkStats, elapsed: Duration) -> Result<()> {
    stats.log_summary();
    let elapsed = Duration::from_millis(elapsed.as_millis() as u64);
    info!(elapsed = %humantime::format_duration(elapsed), "done");

    if args.stats {
        let mut err = io::stderr().lock();
        if args.json {
            print_stats_json(&mut err, stats)?;
        } else {
            print_stats(&mut err, stats)?;
        }
    }
    Ok(())
}
