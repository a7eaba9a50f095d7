use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

use crate::config::{self, AppConfig};
use crate::error::Error;
use crate::language::LanguageDetector;
use crate::parser::FilenameParser;
use crate::plan::{execute_plan, ExecutionReport, Executor, Formatter, JellyfinFormatter};
use crate::plan::{PathPlanner, RenamePlan};
use crate::progress::ProgressReporter;
use crate::provider::Provider;
use crate::resolver::{ResolvedNode, Resolver};

pub struct RenameEngine {
    config: AppConfig,
    resolver: Resolver,
    formatter: Box<dyn Formatter>,
}

/// Scan outcome of one root path.
#[derive(Debug)]
pub struct RootScan {
    pub root: PathBuf,
    pub output: PathBuf,
    pub nodes: Result<Vec<ResolvedNode>, Error>,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct RunSummary {
    pub scan_duration: Duration,
    pub plan_duration: Duration,
    pub roots_scanned: usize,
    pub roots_failed: usize,
    pub nodes_resolved: usize,
    pub nodes_failed: usize,
    pub planned: usize,
    pub plan_failures: usize,
    pub excluded: usize,
    pub plan: RenamePlan,
    pub execution: ExecutionReport,
}

impl RenameEngine {
    pub fn new(config: AppConfig, providers: Vec<Arc<dyn Provider>>) -> Self {
        let resolver = Resolver::new(providers)
            .with_default_language(&config.default_language)
            .with_ignore_patterns(&config.ignore_patterns);
        Self {
            config,
            resolver,
            formatter: Box::new(JellyfinFormatter::new()),
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn FilenameParser>) -> Self {
        self.resolver = self.resolver.with_parser(parser);
        self
    }

    pub fn with_language_detector(mut self, detector: Box<dyn LanguageDetector>) -> Self {
        self.resolver = self.resolver.with_language_detector(detector);
        self
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Configured roots made absolute, without roots nested in other roots.
    pub fn roots(&self) -> Result<Vec<PathBuf>, Error> {
        if self.config.root_paths.is_empty() {
            return Err(Error::Other("no root paths configured".to_string()));
        }
        let absolute = self
            .config
            .root_paths
            .iter()
            .map(|p| std::path::absolute(p))
            .collect::<Result<Vec<_>, _>>()?;
        let roots = config::non_overlapping_directories(absolute);
        info!("Processing directories: {:?}", roots);
        Ok(roots)
    }

    /// Absolute output root for a scanned root: the configured output, else
    /// the root's parent directory.
    pub fn output_for(&self, root: &Path) -> Result<PathBuf, Error> {
        match &self.config.output {
            Some(output) => Ok(std::path::absolute(output)?),
            None => Ok(root.parent().unwrap_or(root).to_path_buf()),
        }
    }

    /// Resolve every root in parallel. A failing root does not affect the
    /// others.
    pub fn scan(&self, reporter: &dyn ProgressReporter) -> Result<Vec<RootScan>, Error> {
        let roots = self
            .roots()?
            .into_iter()
            .map(|root| self.output_for(&root).map(|output| (root, output)))
            .collect::<Result<Vec<_>, _>>()?;
        let scans = roots
            .into_par_iter()
            .map(|(root, output)| {
                reporter.on_scan_start(&root);
                let start = Instant::now();
                let nodes = self.resolver.scan(&root, reporter);
                let duration = start.elapsed();
                match &nodes {
                    Ok(nodes) => {
                        debug!(
                            "Scanned {} in {:.2}s, {} nodes",
                            root.display(),
                            duration.as_secs_f64(),
                            nodes.len()
                        );
                        reporter.on_scan_complete(&root, nodes.len(), duration.as_secs_f64());
                    }
                    Err(e) => {
                        error!("Scan of {} failed: {}", root.display(), e);
                        reporter.on_scan_complete(&root, 0, duration.as_secs_f64());
                    }
                }
                RootScan {
                    root,
                    output,
                    nodes,
                    duration,
                }
            })
            .collect();
        Ok(scans)
    }

    /// Plan all roots against one set of destinations, root by root.
    pub fn plan(&self, scans: &[RootScan], reporter: &dyn ProgressReporter) -> RenamePlan {
        let mut planner = PathPlanner::new(self.formatter.as_ref());
        for scan in scans {
            if let Ok(nodes) = &scan.nodes {
                planner.plan_nodes(nodes, &scan.output);
            }
        }
        let plan = planner.into_plan();
        reporter.on_plan_complete(plan.entries.len(), plan.directories.len());
        plan
    }

    /// Scan, plan and execute.
    pub fn run(
        &self,
        executor: &dyn Executor,
        reporter: &dyn ProgressReporter,
    ) -> Result<RunSummary, Error> {
        info!("Scanning...");
        let scan_start = Instant::now();
        let scans = self.scan(reporter)?;
        let scan_duration = scan_start.elapsed();

        info!("Planning...");
        let plan_start = Instant::now();
        let plan = self.plan(&scans, reporter);
        let plan_duration = plan_start.elapsed();

        info!("Executing...");
        let execution = execute_plan(executor, &plan, reporter)?;

        let mut summary = RunSummary::from_parts(&scans, plan, execution);
        summary.scan_duration = scan_duration;
        summary.plan_duration = plan_duration;
        Ok(summary)
    }
}

impl RunSummary {
    fn from_parts(scans: &[RootScan], plan: RenamePlan, execution: ExecutionReport) -> Self {
        let mut roots_failed = 0;
        let mut nodes_resolved = 0;
        let mut nodes_failed = 0;
        for scan in scans {
            match &scan.nodes {
                Ok(nodes) => {
                    let resolved = nodes.iter().filter(|n| n.is_resolved()).count();
                    nodes_resolved += resolved;
                    nodes_failed += nodes.len() - resolved;
                }
                Err(_) => roots_failed += 1,
            }
        }

        RunSummary {
            scan_duration: Duration::ZERO,
            plan_duration: Duration::ZERO,
            roots_scanned: scans.len(),
            roots_failed,
            nodes_resolved,
            nodes_failed,
            planned: plan.planned().count(),
            plan_failures: plan.failures().count(),
            excluded: plan.excluded.len(),
            plan,
            execution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(root_paths: &[&str], output: Option<&str>) -> RenameEngine {
        let config = AppConfig {
            root_paths: root_paths.iter().map(|s| s.to_string()).collect(),
            output: output.map(str::to_string),
            ..AppConfig::default()
        };
        RenameEngine::new(config, Vec::new())
    }

    #[test]
    fn test_output_defaults_to_parent() {
        let engine = engine(&["/media/in"], None);
        assert_eq!(
            engine.output_for(Path::new("/media/in")).unwrap(),
            PathBuf::from("/media")
        );
    }

    #[test]
    fn test_output_override() {
        let engine = engine(&["/media/in"], Some("/library"));
        assert_eq!(
            engine.output_for(Path::new("/media/in")).unwrap(),
            PathBuf::from("/library")
        );
    }

    #[test]
    fn test_relative_output_is_made_absolute() {
        let current = engine(&["/media/in"], Some("."));
        let output = current.output_for(Path::new("/media/in")).unwrap();
        assert!(output.is_absolute());
        assert_eq!(output, std::env::current_dir().unwrap());

        let nested = engine(&["/media/in"], Some("library"));
        assert_eq!(
            nested.output_for(Path::new("/media/in")).unwrap(),
            std::env::current_dir().unwrap().join("library")
        );
    }

    #[test]
    fn test_roots_drop_nested() {
        let engine = engine(&["/media", "/media/tv", "/srv"], None);
        assert_eq!(
            engine.roots().unwrap(),
            vec![PathBuf::from("/media"), PathBuf::from("/srv")]
        );
    }

    #[test]
    fn test_no_roots_is_an_error() {
        assert!(matches!(engine(&[], None).roots(), Err(Error::Other(_))));
    }
}
