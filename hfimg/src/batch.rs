//! Input expansion, parallel execution and batch reporting.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use heifconv::{FormatSet, FormatTag};

/// Expand input patterns into a deduplicated, sorted list of image files.
///
/// Glob patterns and directories only pick up files whose extension maps to
/// a format in `sources`, so earlier outputs sitting next to their inputs are
/// not fed back in. Plain paths are taken as given, so a mislabeled file
/// still reaches the converter and gets a proper format error.
pub fn expand_inputs(patterns: &[String], sources: FormatSet) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            for entry in glob::glob(pattern)? {
                let path = entry?;
                if path.is_file() && is_image(&path, sources) {
                    push_unique(path, &mut seen, &mut files);
                }
            }
        } else {
            let path = PathBuf::from(pattern);
            if path.is_dir() {
                for_each_image_in_dir(&path, sources, &mut seen, &mut files);
            } else if path.is_file() {
                push_unique(path, &mut seen, &mut files);
            } else {
                anyhow::bail!("not a file or directory: {}", path.display());
            }
        }
    }

    // Largest first keeps the worker pool busy until the end
    files.sort_by_key(|p| std::cmp::Reverse(p.metadata().map(|m| m.len()).unwrap_or(0)));

    Ok(files)
}

/// Check if a file path has an image extension of one of `sources`.
pub fn is_image(path: &Path, sources: FormatSet) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(FormatTag::from_extension)
        .is_some_and(|format| sources.contains(format))
}

fn push_unique(path: PathBuf, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    if let Ok(canonical) = path.canonicalize() {
        if seen.insert(canonical) {
            files.push(path);
        }
    }
}

fn for_each_image_in_dir(
    dir: &Path,
    sources: FormatSet,
    seen: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return,
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            for_each_image_in_dir(&path, sources, seen, files);
        } else if path.is_file() && is_image(&path, sources) {
            push_unique(path, seen, files);
        }
    }
}

/// Result of converting a single file.
#[derive(Debug)]
pub struct FileResult {
    pub input_path: PathBuf,
    pub input_size: u64,
    pub output_path: Option<PathBuf>,
    pub output_size: Option<u64>,
    pub error: Option<String>,
    pub duration: Duration,
}

/// Accumulated batch summary.
#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<FileResult>,
}

impl BatchSummary {
    pub fn push(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_none()).count()
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    /// Print a human-readable summary table.
    pub fn print_report(&self) {
        if self.results.is_empty() {
            println!("No files processed.");
            return;
        }

        println!(
            "{:<40} {:>10} {:>10} {:>8}",
            "File", "Input", "Output", "Time"
        );
        println!("{}", "-".repeat(72));

        for r in &self.results {
            let name = r
                .input_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?");
            let name = short_name(name, 38);

            match (&r.error, r.output_size) {
                (Some(err), _) => {
                    println!("{:<40} {:>10} {}", name, format_size(r.input_size), err)
                }
                (None, Some(out_size)) => println!(
                    "{:<40} {:>10} {:>10} {:>8}",
                    name,
                    format_size(r.input_size),
                    format_size(out_size),
                    format_duration(r.duration),
                ),
                (None, None) => println!("{:<40} {:>10}", name, format_size(r.input_size)),
            }
        }

        println!("{}", "-".repeat(72));
        println!(
            "{} converted, {} errors",
            self.success_count(),
            self.error_count(),
        );
    }
}

/// Run `job` over `files`, in parallel with a progress bar when there is
/// more than one. Errors are collected rather than aborting the batch.
pub fn run<F>(files: &[PathBuf], jobs: Option<usize>, job: F) -> anyhow::Result<BatchSummary>
where
    F: Fn(&Path) -> anyhow::Result<(PathBuf, u64)> + Sync,
{
    let summary = Mutex::new(BatchSummary::default());
    let run_one = |path: &Path| {
        let start = Instant::now();
        let input_size = path.metadata().map(|m| m.len()).unwrap_or(0);
        let (output_path, output_size, error) = match job(path) {
            Ok((out, size)) => (Some(out), Some(size), None),
            Err(e) => (None, None, Some(format!("{e:#}"))),
        };
        FileResult {
            input_path: path.to_path_buf(),
            input_size,
            output_path,
            output_size,
            error,
            duration: start.elapsed(),
        }
    };
    let push = |result: FileResult| {
        if let Ok(mut summary) = summary.lock() {
            summary.push(result);
        }
    };

    if let [single] = files {
        let result = run_one(single.as_path());
        match (&result.error, &result.output_path, result.output_size) {
            (Some(err), _, _) => eprintln!("error: {}: {err}", single.display()),
            (None, Some(out), Some(size)) => eprintln!(
                "{} -> {} ({})",
                single.display(),
                out.display(),
                format_size(size)
            ),
            _ => {}
        }
        push(result);
    } else {
        let jobs = jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        pool.install(|| {
            files.par_iter().for_each(|path| {
                let result = run_one(path.as_path());
                if let Some(ref err) = result.error {
                    pb.println(format!("error: {}: {err}", path.display()));
                }
                push(result);
                pb.inc(1);
            });
        });

        pb.finish_and_clear();
    }

    summary
        .into_inner()
        .map_err(|_| anyhow::anyhow!("a worker panicked while recording results"))
}

/// Format a byte size into a human-readable string.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Keep the tail of long names, which usually carries the distinguishing part.
fn short_name(name: &str, max: usize) -> String {
    let len = name.chars().count();
    if len <= max {
        return name.to_string();
    }
    let tail: String = name.chars().skip(len - (max - 2)).collect();
    format!("..{tail}")
}

fn format_duration(duration: Duration) -> String {
    let ms = duration.as_millis();
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}
