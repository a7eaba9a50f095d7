pub mod config;
pub mod engine;
pub mod error;
pub mod identity;
pub mod language;
pub mod parser;
pub mod plan;
pub mod platform;
pub mod progress;
pub mod provider;
pub mod resolver;

pub use config::AppConfig;
pub use engine::{RenameEngine, RootScan, RunSummary};
pub use error::{Error, PlanError, ResolveError};
pub use identity::{Identity, MediaKind};
pub use plan::{FsExecutor, RenameMode, RenamePlan};
pub use progress::{ProgressReporter, SilentReporter};
pub use provider::{Provider, ProviderError, Request, ResponseCache, TmdbProvider};
pub use resolver::{ResolvedNode, Resolver};
