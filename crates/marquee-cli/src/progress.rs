use indicatif::{ProgressBar, ProgressStyle};
use marquee_core::ProgressReporter;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

const TICK_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Scan phase: spinner (number of entries unknown upfront)
/// - Execute phase: progress bar over the planned operations
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
    resolved: AtomicUsize,
    failed: AtomicUsize,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
            resolved: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        }
    }

    fn set_bar(&self, pb: ProgressBar) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(old) = guard.take() {
            old.finish_and_clear();
        }
        *guard = Some(pb);
    }

    fn finish_bar(&self) {
        let mut guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.take() {
            pb.finish_and_clear();
        }
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.bar.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pb) = guard.as_ref() {
            f(pb);
        }
    }

    fn spinner(message: String) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            pb.set_style(style.tick_chars(TICK_CHARS));
        }
        pb.set_message(message);
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    }
}

impl ProgressReporter for CliReporter {
    fn on_scan_start(&self, root: &Path) {
        self.set_bar(Self::spinner(format!("Scanning {}...", root.display())));
    }

    fn on_entry_resolved(&self, path: &Path, resolved: bool) {
        if resolved {
            self.resolved.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        let resolved = self.resolved.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.with_bar(|pb| {
            pb.set_message(format!(
                "Resolving... {} found, {} unresolved ({})",
                resolved, failed, name
            ))
        });
    }

    fn on_scan_complete(&self, root: &Path, nodes: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Scan of {} complete: {} entries in {:.2}s",
            root.display(),
            nodes,
            duration_secs
        );
    }

    fn on_plan_complete(&self, entries: usize, directories: usize) {
        eprintln!(
            "  \x1b[32m✓\x1b[0m Plan complete: {} entries, {} directories to create",
            entries, directories
        );
    }

    fn on_execute_start(&self, total: usize) {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "  {spinner:.cyan} Applying [{bar:30.cyan/dim}] {pos}/{len} ({eta} remaining)",
        ) {
            pb.set_style(style.progress_chars("━╸─").tick_chars(TICK_CHARS));
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        self.set_bar(pb);
    }

    fn on_execute_progress(&self, done: usize, _total: usize) {
        self.with_bar(|pb| pb.set_position(done as u64));
    }

    fn on_execute_complete(&self, applied: usize, failed: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Applied {} operations, {} failed in {:.2}s",
            applied, failed, duration_secs
        );
    }
}
