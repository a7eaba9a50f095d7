use std::path::Path;

/// Trait for reporting run progress.
///
/// The CLI implements it with indicatif. All methods have default no-op
/// implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_scan_start(&self, _root: &Path) {}
    fn on_entry_resolved(&self, _path: &Path, _resolved: bool) {}
    fn on_scan_complete(&self, _root: &Path, _nodes: usize, _duration_secs: f64) {}
    fn on_plan_complete(&self, _entries: usize, _directories: usize) {}
    fn on_execute_start(&self, _total: usize) {}
    fn on_execute_progress(&self, _done: usize, _total: usize) {}
    fn on_execute_complete(&self, _applied: usize, _failed: usize, _duration_secs: f64) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
