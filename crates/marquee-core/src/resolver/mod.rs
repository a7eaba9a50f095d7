pub mod fuzzy;
pub mod tv;
pub mod walk;

use glob::Pattern;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{Error, ResolveError};
use crate::identity::{Identity, MediaKind, Movie, TvShow};
use crate::language::{LanguageDetector, LanguageResolver, WhatlangDetector};
use crate::parser::{FilenameParser, ParsedInfo, SceneParser};
use crate::progress::ProgressReporter;
use crate::provider::{Provider, ProviderError, Request};

pub use walk::Entry;

/// Outcome of resolving one scanned entry.
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub entry: Entry,
    pub info: ParsedInfo,
    /// Language the entry was looked up in.
    pub language: String,
    pub outcome: Result<Identity, ResolveError>,
}

impl ResolvedNode {
    pub fn path(&self) -> &Path {
        &self.entry.path
    }

    pub fn is_resolved(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Work item of the traversal: an entry and what it inherits.
struct Pending {
    entry: Entry,
    parent: Option<Identity>,
    language: Option<String>,
}

/// Walks a root path and resolves every entry to a canonical identity,
/// carrying each directory's identity down to its children.
pub struct Resolver {
    providers: Vec<Arc<dyn Provider>>,
    parser: Box<dyn FilenameParser>,
    languages: LanguageResolver,
    ignore: Vec<Pattern>,
}

impl Resolver {
    /// Providers are tried in order until one succeeds.
    pub fn new(providers: Vec<Arc<dyn Provider>>) -> Self {
        Self {
            providers,
            parser: Box::new(SceneParser::new()),
            languages: LanguageResolver::new("en", Box::new(WhatlangDetector::new())),
            ignore: Vec::new(),
        }
    }

    pub fn with_parser(mut self, parser: Box<dyn FilenameParser>) -> Self {
        self.parser = parser;
        self
    }

    pub fn with_language_detector(mut self, detector: Box<dyn LanguageDetector>) -> Self {
        self.languages = self.languages.with_detector(detector);
        self
    }

    pub fn with_default_language(mut self, language: &str) -> Self {
        self.languages = self.languages.with_default_language(language);
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: &[String]) -> Self {
        self.ignore = walk::compile_patterns(patterns);
        self
    }

    /// Resolve every entry under `root`, depth first, parents before
    /// children, siblings in name order.
    ///
    /// Fails when the root itself or any directory below it cannot be read.
    pub fn scan(
        &self,
        root: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<Vec<ResolvedNode>, Error> {
        let root_entry = Entry::from_path(root).map_err(|source| Error::DirectoryRead {
            path: root.to_path_buf(),
            source,
        })?;
        let mut nodes = Vec::new();
        let mut stack = vec![Pending {
            entry: root_entry,
            parent: None,
            language: None,
        }];

        while let Some(Pending {
            entry,
            parent,
            language,
        }) = stack.pop()
        {
            if walk::is_ignored(&entry.path, &self.ignore) {
                debug!("Ignoring {}", entry.path.display());
                continue;
            }

            let language = self.languages.request_language(language.as_deref());

            let info = match self.parser.parse(&entry.name) {
                Ok(info) => info,
                Err(e) => {
                    warn!("Cannot parse '{}': {}", entry.name, e);
                    reporter.on_entry_resolved(&entry.path, false);
                    nodes.push(ResolvedNode {
                        entry,
                        info: ParsedInfo::default(),
                        language,
                        outcome: Err(ResolveError::ParseFailure(e.to_string())),
                    });
                    continue;
                }
            };

            // Listed before resolution: children names drive language detection.
            let children: Vec<Entry> = if entry.is_dir {
                match walk::list_children(&entry.path) {
                    Ok(children) => children
                        .into_iter()
                        .filter(|c| !walk::is_ignored(&c.path, &self.ignore))
                        .collect(),
                    Err(err) => {
                        return Err(Error::DirectoryRead {
                            path: entry.path,
                            source: err,
                        })
                    }
                }
            } else {
                Vec::new()
            };

            let request = Request {
                parent,
                ..Request::new(info.clone(), entry.is_dir, language.clone())
            };
            debug!(
                path = %entry.path.display(),
                language = %language,
                parent = request.parent.is_some(),
                "Searching"
            );

            let outcome = self.find(&request);
            reporter.on_entry_resolved(&entry.path, outcome.is_ok());
            match &outcome {
                Ok(identity) => {
                    info!("Found {} '{}' for {}", identity.kind(), identity, entry.path.display())
                }
                Err(err) => warn!("Could not resolve {}: {}", entry.path.display(), err),
            }

            let descend = entry.is_dir
                && !children.is_empty()
                && !matches!(outcome, Err(ResolveError::ParseFailure(_)));
            if !descend {
                nodes.push(ResolvedNode {
                    entry,
                    info,
                    language,
                    outcome,
                });
                continue;
            }

            let (parent, child_language) = match outcome {
                Ok(identity) => {
                    let names: Vec<String> = children.iter().map(|c| c.name.clone()).collect();
                    let detected = self.languages.children_language(&names);
                    if let Some(detected) = &detected {
                        debug!("Detected '{}' below {}", detected, entry.path.display());
                    }
                    (Some(identity), detected.unwrap_or_else(|| language.clone()))
                }
                Err(err) => {
                    // Still walked, but children start over without a parent.
                    nodes.push(ResolvedNode {
                        entry,
                        info,
                        language: language.clone(),
                        outcome: Err(err),
                    });
                    (None, language)
                }
            };

            for child in children.into_iter().rev() {
                stack.push(Pending {
                    entry: child,
                    parent: parent.clone(),
                    language: Some(child_language.clone()),
                });
            }
        }

        Ok(nodes)
    }

    /// Resolve a request against each provider in turn. A `NoResult` never
    /// hides a more specific failure from an earlier provider.
    pub fn find(&self, request: &Request) -> Result<Identity, ResolveError> {
        let mut last_error = ResolveError::NoResult;
        for provider in &self.providers {
            match self.find_with(provider, request) {
                Ok(identity) => return Ok(identity),
                Err(err @ ResolveError::ParseFailure(_)) => return Err(err),
                Err(err) => {
                    debug!(provider = provider.name(), error = %err, "Provider search failed");
                    if err != ResolveError::NoResult || last_error == ResolveError::NoResult {
                        last_error = err;
                    }
                }
            }
        }
        Err(last_error)
    }

    fn find_with(
        &self,
        provider: &Arc<dyn Provider>,
        request: &Request,
    ) -> Result<Identity, ResolveError> {
        let Some(parent) = &request.parent else {
            return self.find_detached(provider, request);
        };

        match parent.in_language(&request.language)? {
            Identity::Movie(movie) => self.inherit_movie(provider, movie, request),
            Identity::TvShow(show) => tv::select_child(&show, request),
            Identity::TvSeason(season) => tv::select_episode_in_season(&season, request),
            Identity::TvEpisode(episode) => {
                let season = Identity::TvSeason(episode.season().clone());
                self.find_with(provider, &request.with_parent(season))
            }
        }
    }

    /// Lookup without an inherited identity.
    fn find_detached(
        &self,
        provider: &Arc<dyn Provider>,
        request: &Request,
    ) -> Result<Identity, ResolveError> {
        if request.query.is_empty() {
            return Err(ResolveError::ParseFailure("no title".to_string()));
        }

        if request.info.season.is_some() || request.info.episode.is_some() {
            let record = provider.search_tv(request)?;
            let show = TvShow::new(record, request.language.clone(), Arc::clone(provider));
            return tv::select_child(&show, request);
        }

        self.search_by_popularity(provider, request)
    }

    /// Ask for both a movie and a show; the more popular one wins, a tie
    /// goes to the movie.
    fn search_by_popularity(
        &self,
        provider: &Arc<dyn Provider>,
        request: &Request,
    ) -> Result<Identity, ResolveError> {
        let movie = optional(provider.search_movie(request))?
            .map(|r| Movie::new(r, request.language.clone(), Arc::clone(provider)));
        let show = optional(provider.search_tv(request))?
            .map(|r| TvShow::new(r, request.language.clone(), Arc::clone(provider)));

        match (movie, show) {
            (Some(movie), Some(show)) => {
                debug!(
                    movie = movie.popularity(),
                    show = show.popularity(),
                    "Choosing by popularity for '{}'",
                    request.query
                );
                if movie.popularity() >= show.popularity() {
                    Ok(Identity::Movie(movie))
                } else {
                    Ok(Identity::TvShow(show))
                }
            }
            (Some(movie), None) => Ok(Identity::Movie(movie)),
            (None, Some(show)) => Ok(Identity::TvShow(show)),
            (None, None) => Err(ResolveError::NoResult),
        }
    }

    /// Entries below a movie are that movie, unless they name a different
    /// year, in which case they are looked up on their own.
    fn inherit_movie(
        &self,
        provider: &Arc<dyn Provider>,
        movie: Movie,
        request: &Request,
    ) -> Result<Identity, ResolveError> {
        let movie_year = Identity::Movie(movie.clone()).year();
        match (request.year, movie_year) {
            (Some(year), Some(parent_year)) if year != parent_year => {
                match self.find_detached(provider, &request.detached()) {
                    Ok(Identity::Movie(other)) => Ok(Identity::Movie(other)),
                    Ok(other) => Err(ResolveError::MediaTypeConflict {
                        expected: MediaKind::Movie,
                        found: other.kind(),
                    }),
                    Err(err) => {
                        debug!("Keeping parent movie for '{}': {}", request.query, err);
                        Ok(Identity::Movie(movie))
                    }
                }
            }
            _ => Ok(Identity::Movie(movie)),
        }
    }
}

fn optional<T>(result: Result<T, ProviderError>) -> Result<Option<T>, ProviderError> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ProviderError::NoResult) => Ok(None),
        Err(err) => Err(err),
    }
}
