use std::collections::{BTreeSet, HashSet};
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::format::Formatter;
use crate::error::{PlanError, ResolveError};
use crate::resolver::ResolvedNode;

/// Extra attempts made after the first collision.
pub const DEDUPLICATION_ATTEMPT_LIMIT: usize = 2;
pub const DEDUPLICATION_SUFFIX: &str = "_";

#[derive(Debug, Clone, PartialEq)]
pub struct RenameEntry {
    pub source: PathBuf,
    pub outcome: Result<PathBuf, PlanError>,
}

#[derive(Debug, Clone, Default)]
pub struct RenamePlan {
    /// Sorted, without duplicates.
    pub directories: Vec<PathBuf>,
    pub entries: Vec<RenameEntry>,
    /// Entries left out because their name could not be parsed.
    pub excluded: Vec<PathBuf>,
}

impl RenamePlan {
    pub fn planned(&self) -> impl Iterator<Item = (&Path, &Path)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            Ok(destination) => Some((e.source.as_path(), destination.as_path())),
            Err(_) => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&Path, &PlanError)> {
        self.entries.iter().filter_map(|e| match &e.outcome {
            Ok(_) => None,
            Err(err) => Some((e.source.as_path(), err)),
        })
    }
}

/// Maps resolved nodes to unique destinations. Destinations assigned by
/// earlier calls are kept, so several roots can share one planner.
pub struct PathPlanner<'a> {
    formatter: &'a dyn Formatter,
    assigned: HashSet<PathBuf>,
    sources: HashSet<PathBuf>,
    directories: BTreeSet<PathBuf>,
    entries: Vec<RenameEntry>,
    excluded: Vec<PathBuf>,
}

impl<'a> PathPlanner<'a> {
    pub fn new(formatter: &'a dyn Formatter) -> Self {
        Self {
            formatter,
            assigned: HashSet::new(),
            sources: HashSet::new(),
            directories: BTreeSet::new(),
            entries: Vec::new(),
            excluded: Vec::new(),
        }
    }

    /// Plans nodes in source path order.
    pub fn plan_nodes(&mut self, nodes: &[ResolvedNode], output: &Path) {
        let mut ordered: Vec<&ResolvedNode> = nodes.iter().collect();
        ordered.sort_by(|a, b| a.path().cmp(b.path()));

        for node in ordered {
            let outcome = match &node.outcome {
                Err(ResolveError::ParseFailure(reason)) => {
                    debug!("Excluding {}: {}", node.path().display(), reason);
                    self.excluded.push(node.path().to_path_buf());
                    continue;
                }
                Err(err) => Err(PlanError::from(err.clone())),
                Ok(identity) => {
                    let components = self.formatter.components(identity);
                    let extension = if node.entry.is_dir {
                        None
                    } else {
                        node.path().extension()
                    };
                    self.plan_destination(node.path(), output, &components, extension)
                }
            };
            if let Err(err) = &outcome {
                warn!("Not renaming {}: {}", node.path().display(), err);
            }
            self.entries.push(RenameEntry {
                source: node.path().to_path_buf(),
                outcome,
            });
        }
    }

    /// Destination for one source. Pure apart from the destinations and
    /// sources already planned.
    pub fn plan_destination(
        &mut self,
        source: &Path,
        output: &Path,
        components: &[String],
        extension: Option<&OsStr>,
    ) -> Result<PathBuf, PlanError> {
        let Some((last, parents)) = components.split_last() else {
            return Err(PlanError::NoComponents);
        };

        let mut base = output.to_path_buf();
        base.extend(parents);

        let mut stem = OsString::from(last);
        let destination = with_extension(&base, &stem, extension);
        if destination == source {
            return Err(PlanError::IdenticalSourceDestination);
        }
        if self.sources.contains(source) {
            return Err(PlanError::DuplicateSource);
        }

        let mut candidate = destination;
        for _ in 0..=DEDUPLICATION_ATTEMPT_LIMIT {
            if !self.assigned.contains(&candidate) {
                if !parents.is_empty() {
                    self.directories.insert(base.clone());
                }
                self.assigned.insert(candidate.clone());
                self.sources.insert(source.to_path_buf());
                return Ok(candidate);
            }
            stem.push(DEDUPLICATION_SUFFIX);
            candidate = with_extension(&base, &stem, extension);
        }

        Err(PlanError::DeduplicationExhausted)
    }

    pub fn into_plan(self) -> RenamePlan {
        RenamePlan {
            directories: self.directories.into_iter().collect(),
            entries: self.entries,
            excluded: self.excluded,
        }
    }
}

/// `base/stem.ext`, appending rather than replacing so dots in the stem
/// survive.
fn with_extension(base: &Path, stem: &OsString, extension: Option<&OsStr>) -> PathBuf {
    let mut file = stem.clone();
    if let Some(ext) = extension {
        file.push(".");
        file.push(ext);
    }
    base.join(file)
}
