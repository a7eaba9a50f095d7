use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use super::planner::RenamePlan;
use crate::error::Error;
use crate::platform;
use crate::progress::ProgressReporter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenameMode {
    #[default]
    Symlink,
    Copy,
}

impl fmt::Display for RenameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenameMode::Symlink => f.write_str("symlink"),
            RenameMode::Copy => f.write_str("copy"),
        }
    }
}

impl FromStr for RenameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "symlink" => Ok(RenameMode::Symlink),
            "copy" => Ok(RenameMode::Copy),
            other => Err(format!("unknown rename mode: {:?}", other)),
        }
    }
}

/// Applies planned operations to the filesystem.
pub trait Executor {
    fn create_directory(&self, dir: &Path) -> io::Result<()>;
    fn apply(&self, source: &Path, destination: &Path) -> io::Result<()>;
}

/// Symlinks or copies files. With `write` off nothing is touched.
#[derive(Debug, Clone)]
pub struct FsExecutor {
    mode: RenameMode,
    write: bool,
}

impl FsExecutor {
    pub fn new(mode: RenameMode, write: bool) -> Self {
        Self { mode, write }
    }

    pub fn dry_run(mode: RenameMode) -> Self {
        Self::new(mode, false)
    }

    pub fn is_dry_run(&self) -> bool {
        !self.write
    }

    fn symlink(&self, source: &Path, destination: &Path) -> io::Result<()> {
        let source = std::path::absolute(source)?;
        let link_dir = match destination.parent() {
            Some(parent) => std::path::absolute(parent)?,
            None => std::path::absolute(".")?,
        };
        let target = platform::relative_path(&source, &link_dir);
        debug!("Linking {} -> {}", destination.display(), target.display());
        platform::symlink_file(&target, destination)
    }

    fn copy(&self, source: &Path, destination: &Path) -> io::Result<()> {
        let metadata = fs::metadata(source)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a regular file", source.display()),
            ));
        }
        fs::copy(source, destination)?;
        Ok(())
    }
}

impl Executor for FsExecutor {
    fn create_directory(&self, dir: &Path) -> io::Result<()> {
        if !self.write {
            return Ok(());
        }
        fs::create_dir_all(dir)
    }

    fn apply(&self, source: &Path, destination: &Path) -> io::Result<()> {
        if !self.write {
            return Ok(());
        }
        if fs::symlink_metadata(destination).is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", destination.display()),
            ));
        }
        match self.mode {
            RenameMode::Symlink => self.symlink(source, destination),
            RenameMode::Copy => self.copy(source, destination),
        }
    }
}

#[derive(Debug)]
pub struct ExecutionFailure {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub error: io::Error,
}

#[derive(Debug, Default)]
pub struct ExecutionReport {
    pub directories_created: usize,
    pub applied: Vec<(PathBuf, PathBuf)>,
    pub failures: Vec<ExecutionFailure>,
    pub duration: Duration,
}

/// Creates the plan's directories, then applies every planned entry.
/// A directory that cannot be created stops the run; a failed entry does not.
pub fn execute_plan(
    executor: &dyn Executor,
    plan: &RenamePlan,
    reporter: &dyn ProgressReporter,
) -> Result<ExecutionReport, Error> {
    let start = Instant::now();
    let mut report = ExecutionReport::default();

    for dir in &plan.directories {
        executor
            .create_directory(dir)
            .map_err(|source| Error::DirectoryCreate {
                path: dir.clone(),
                source,
            })?;
        report.directories_created += 1;
    }

    let planned: Vec<(&Path, &Path)> = plan.planned().collect();
    let total = planned.len();
    reporter.on_execute_start(total);

    for (done, (source, destination)) in planned.into_iter().enumerate() {
        match executor.apply(source, destination) {
            Ok(()) => report
                .applied
                .push((source.to_path_buf(), destination.to_path_buf())),
            Err(e) => {
                error!(
                    "Failed {} -> {}: {}",
                    source.display(),
                    destination.display(),
                    e
                );
                report.failures.push(ExecutionFailure {
                    source: source.to_path_buf(),
                    destination: destination.to_path_buf(),
                    error: e,
                });
            }
        }
        reporter.on_execute_progress(done + 1, total);
    }

    report.duration = start.elapsed();
    reporter.on_execute_complete(
        report.applied.len(),
        report.failures.len(),
        report.duration.as_secs_f64(),
    );
    info!(
        "Applied {} of {} operations in {:.2}s",
        report.applied.len(),
        total,
        report.duration.as_secs_f64()
    );

    Ok(report)
}
