pub mod records;

use chrono::{Datelike, NaiveDate};
use dashmap::DashMap;
use std::fmt;
use std::sync::Arc;

use crate::provider::{Provider, ProviderError};
use records::{compute_popularity, EpisodeRecord, MovieRecord, SeasonRecord, ShowRecord};

/// A record viewed in one language, sharing a per-identity cache of the
/// record in every language requested so far.
pub struct Localized<T> {
    language: String,
    record: Arc<T>,
    views: Arc<DashMap<String, Arc<T>>>,
    source: Arc<dyn Provider>,
}

impl<T> Clone for Localized<T> {
    fn clone(&self) -> Self {
        Self {
            language: self.language.clone(),
            record: Arc::clone(&self.record),
            views: Arc::clone(&self.views),
            source: Arc::clone(&self.source),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Localized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Localized")
            .field("language", &self.language)
            .field("record", &self.record)
            .field("source", &self.source.name())
            .finish()
    }
}

impl<T> Localized<T> {
    pub fn new(record: T, language: impl Into<String>, source: Arc<dyn Provider>) -> Self {
        let language = language.into();
        let record = Arc::new(record);
        let views = DashMap::new();
        views.insert(language.clone(), Arc::clone(&record));
        Self {
            language,
            record,
            views: Arc::new(views),
            source,
        }
    }

    pub fn record(&self) -> &T {
        &self.record
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Number of languages this identity has been loaded in.
    pub fn cached_languages(&self) -> usize {
        self.views.len()
    }

    fn view<F>(&self, language: &str, fetch: F) -> Result<Self, ProviderError>
    where
        F: FnOnce(&dyn Provider) -> Result<T, ProviderError>,
    {
        if language == self.language {
            return Ok(self.clone());
        }

        // The read guard must be released before inserting into the same shard.
        let cached = self.views.get(language).map(|entry| Arc::clone(entry.value()));
        let record = match cached {
            Some(record) => record,
            None => {
                let fetched = Arc::new(fetch(self.source.as_ref())?);
                self.views
                    .insert(language.to_string(), Arc::clone(&fetched));
                fetched
            }
        };

        Ok(Self {
            language: language.to_string(),
            record,
            views: Arc::clone(&self.views),
            source: Arc::clone(&self.source),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Movie,
    TvShow,
    TvSeason,
    TvEpisode,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MediaKind::Movie => "movie",
            MediaKind::TvShow => "tv show",
            MediaKind::TvSeason => "tv season",
            MediaKind::TvEpisode => "tv episode",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone)]
pub struct Movie(Localized<MovieRecord>);

impl Movie {
    pub fn new(record: MovieRecord, language: impl Into<String>, source: Arc<dyn Provider>) -> Self {
        Movie(Localized::new(record, language, source))
    }

    pub fn record(&self) -> &MovieRecord {
        self.0.record()
    }

    pub fn id(&self) -> u64 {
        self.record().id
    }

    pub fn name(&self) -> &str {
        &self.record().title
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record().release_date
    }

    pub fn popularity(&self) -> i64 {
        let r = self.record();
        compute_popularity(r.popularity, r.vote_average, r.vote_count)
    }

    pub fn language(&self) -> &str {
        self.0.language()
    }

    pub fn cached_languages(&self) -> usize {
        self.0.cached_languages()
    }

    pub fn in_language(&self, language: &str) -> Result<Movie, ProviderError> {
        let id = self.id();
        self.0
            .view(language, |provider| provider.movie_details(id, language))
            .map(Movie)
    }
}

#[derive(Debug, Clone)]
pub struct TvShow(Localized<ShowRecord>);

impl TvShow {
    pub fn new(record: ShowRecord, language: impl Into<String>, source: Arc<dyn Provider>) -> Self {
        TvShow(Localized::new(record, language, source))
    }

    pub fn record(&self) -> &ShowRecord {
        self.0.record()
    }

    pub fn id(&self) -> u64 {
        self.record().id
    }

    pub fn name(&self) -> &str {
        &self.record().name
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record().first_air_date
    }

    pub fn popularity(&self) -> i64 {
        let r = self.record();
        compute_popularity(r.popularity, r.vote_average, r.vote_count)
    }

    pub fn language(&self) -> &str {
        self.0.language()
    }

    pub fn cached_languages(&self) -> usize {
        self.0.cached_languages()
    }

    pub fn season_count(&self) -> usize {
        self.record().seasons.len()
    }

    pub fn seasons(&self) -> Vec<TvSeason> {
        (0..self.season_count())
            .map(|index| TvSeason {
                show: self.clone(),
                index,
            })
            .collect()
    }

    pub fn season(&self, number: u32) -> Option<TvSeason> {
        self.record()
            .seasons
            .iter()
            .position(|s| s.season_number == number)
            .map(|index| TvSeason {
                show: self.clone(),
                index,
            })
    }

    pub fn in_language(&self, language: &str) -> Result<TvShow, ProviderError> {
        let id = self.id();
        self.0
            .view(language, |provider| provider.show_details(id, language))
            .map(TvShow)
    }
}

#[derive(Debug, Clone)]
pub struct TvSeason {
    show: TvShow,
    index: usize,
}

impl TvSeason {
    pub fn record(&self) -> &SeasonRecord {
        &self.show.record().seasons[self.index]
    }

    pub fn show(&self) -> &TvShow {
        &self.show
    }

    pub fn id(&self) -> u64 {
        self.record().id
    }

    pub fn name(&self) -> &str {
        &self.record().name
    }

    pub fn number(&self) -> u32 {
        self.record().season_number
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record().air_date
    }

    /// Seasons carry no vote count and never win a popularity contest.
    pub fn popularity(&self) -> i64 {
        0
    }

    pub fn language(&self) -> &str {
        self.show.language()
    }

    pub fn episode_count(&self) -> usize {
        self.record().episodes.len()
    }

    pub fn episodes(&self) -> Vec<TvEpisode> {
        (0..self.episode_count())
            .map(|index| TvEpisode {
                season: self.clone(),
                index,
            })
            .collect()
    }

    pub fn episode(&self, number: u32) -> Option<TvEpisode> {
        self.record()
            .episodes
            .iter()
            .position(|e| e.episode_number == number)
            .map(|index| TvEpisode {
                season: self.clone(),
                index,
            })
    }

    pub fn in_language(&self, language: &str) -> Result<TvSeason, ProviderError> {
        let number = self.number();
        self.show
            .in_language(language)?
            .season(number)
            .ok_or_else(|| ProviderError::NotFound(format!("season {} in {}", number, language)))
    }
}

#[derive(Debug, Clone)]
pub struct TvEpisode {
    season: TvSeason,
    index: usize,
}

impl TvEpisode {
    pub fn record(&self) -> &EpisodeRecord {
        &self.season.record().episodes[self.index]
    }

    pub fn season(&self) -> &TvSeason {
        &self.season
    }

    pub fn show(&self) -> &TvShow {
        self.season.show()
    }

    pub fn id(&self) -> u64 {
        self.record().id
    }

    pub fn name(&self) -> &str {
        &self.record().name
    }

    pub fn number(&self) -> u32 {
        self.record().episode_number
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.record().air_date
    }

    pub fn popularity(&self) -> i64 {
        let r = self.record();
        compute_popularity(0.0, r.vote_average, r.vote_count)
    }

    pub fn language(&self) -> &str {
        self.season.language()
    }

    pub fn in_language(&self, language: &str) -> Result<TvEpisode, ProviderError> {
        let number = self.number();
        let season = self.season.in_language(language)?;
        season.episode(number).ok_or_else(|| {
            ProviderError::NotFound(format!(
                "episode {} of season {} in {}",
                number,
                season.number(),
                language
            ))
        })
    }
}

/// The canonical identity of a scanned entry.
#[derive(Debug, Clone)]
pub enum Identity {
    Movie(Movie),
    TvShow(TvShow),
    TvSeason(TvSeason),
    TvEpisode(TvEpisode),
}

impl Identity {
    pub fn kind(&self) -> MediaKind {
        match self {
            Identity::Movie(_) => MediaKind::Movie,
            Identity::TvShow(_) => MediaKind::TvShow,
            Identity::TvSeason(_) => MediaKind::TvSeason,
            Identity::TvEpisode(_) => MediaKind::TvEpisode,
        }
    }

    pub fn id(&self) -> u64 {
        match self {
            Identity::Movie(m) => m.id(),
            Identity::TvShow(s) => s.id(),
            Identity::TvSeason(s) => s.id(),
            Identity::TvEpisode(e) => e.id(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Identity::Movie(m) => m.name(),
            Identity::TvShow(s) => s.name(),
            Identity::TvSeason(s) => s.name(),
            Identity::TvEpisode(e) => e.name(),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Identity::Movie(m) => m.date(),
            Identity::TvShow(s) => s.date(),
            Identity::TvSeason(s) => s.date(),
            Identity::TvEpisode(e) => e.date(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.date().map(|d| d.year())
    }

    pub fn popularity(&self) -> i64 {
        match self {
            Identity::Movie(m) => m.popularity(),
            Identity::TvShow(s) => s.popularity(),
            Identity::TvSeason(s) => s.popularity(),
            Identity::TvEpisode(e) => e.popularity(),
        }
    }

    pub fn language(&self) -> &str {
        match self {
            Identity::Movie(m) => m.language(),
            Identity::TvShow(s) => s.language(),
            Identity::TvSeason(s) => s.language(),
            Identity::TvEpisode(e) => e.language(),
        }
    }

    pub fn in_language(&self, language: &str) -> Result<Identity, ProviderError> {
        Ok(match self {
            Identity::Movie(m) => Identity::Movie(m.in_language(language)?),
            Identity::TvShow(s) => Identity::TvShow(s.in_language(language)?),
            Identity::TvSeason(s) => Identity::TvSeason(s.in_language(language)?),
            Identity::TvEpisode(e) => Identity::TvEpisode(e.in_language(language)?),
        })
    }
}

fn fmt_titled(f: &mut fmt::Formatter<'_>, name: &str, date: Option<NaiveDate>) -> fmt::Result {
    match date {
        Some(date) => write!(f, "{} ({})", name, date.year()),
        None => f.write_str(name),
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identity::Movie(m) => fmt_titled(f, m.name(), m.date()),
            Identity::TvShow(s) => fmt_titled(f, s.name(), s.date()),
            Identity::TvSeason(s) => {
                fmt_titled(f, s.show().name(), s.show().date())?;
                write!(f, " / {}", s.name())
            }
            Identity::TvEpisode(e) => {
                fmt_titled(f, e.show().name(), e.show().date())?;
                write!(
                    f,
                    " / S{:02}E{:02} {}",
                    e.season().number(),
                    e.number(),
                    e.name()
                )
            }
        }
    }
}
