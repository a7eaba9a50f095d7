//! TMDB (The Movie Database) v3 client.
//!
//! Base URL: https://api.themoviedb.org/3

use chrono::NaiveDate;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{Provider, ProviderError, Request, ResponseCache};
use crate::identity::records::{EpisodeRecord, MovieRecord, SeasonRecord, ShowRecord};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

pub struct TmdbProvider {
    client: Client,
    base_url: String,
    api_key: String,
    cache: Option<ResponseCache>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct SearchPage<T> {
    #[serde(default)]
    results: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TmdbShow {
    id: u64,
    name: Option<String>,
    first_air_date: Option<String>,
    popularity: Option<f64>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    #[serde(default)]
    seasons: Vec<TmdbSeasonSummary>,
}

#[derive(Debug, Deserialize)]
struct TmdbSeasonSummary {
    season_number: u32,
}

#[derive(Debug, Deserialize)]
struct TmdbSeason {
    id: u64,
    name: Option<String>,
    season_number: u32,
    air_date: Option<String>,
    vote_average: Option<f64>,
    #[serde(default)]
    episodes: Vec<TmdbEpisode>,
}

#[derive(Debug, Deserialize)]
struct TmdbEpisode {
    id: u64,
    name: Option<String>,
    season_number: u32,
    episode_number: u32,
    air_date: Option<String>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
}

impl From<TmdbMovie> for MovieRecord {
    fn from(m: TmdbMovie) -> Self {
        MovieRecord {
            id: m.id,
            title: m.title.unwrap_or_default(),
            release_date: parse_date(m.release_date.as_deref()),
            popularity: m.popularity.unwrap_or(0.0),
            vote_average: m.vote_average.unwrap_or(0.0),
            vote_count: m.vote_count.unwrap_or(0),
        }
    }
}

impl From<TmdbEpisode> for EpisodeRecord {
    fn from(e: TmdbEpisode) -> Self {
        EpisodeRecord {
            id: e.id,
            name: e.name.unwrap_or_default(),
            season_number: e.season_number,
            episode_number: e.episode_number,
            air_date: parse_date(e.air_date.as_deref()),
            vote_average: e.vote_average.unwrap_or(0.0),
            vote_count: e.vote_count.unwrap_or(0),
        }
    }
}

impl From<TmdbSeason> for SeasonRecord {
    fn from(s: TmdbSeason) -> Self {
        SeasonRecord {
            id: s.id,
            name: s.name.unwrap_or_default(),
            season_number: s.season_number,
            air_date: parse_date(s.air_date.as_deref()),
            vote_average: s.vote_average.unwrap_or(0.0),
            episodes: s.episodes.into_iter().map(EpisodeRecord::from).collect(),
        }
    }
}

fn show_record(show: TmdbShow, seasons: Vec<SeasonRecord>) -> ShowRecord {
    ShowRecord {
        id: show.id,
        name: show.name.unwrap_or_default(),
        first_air_date: parse_date(show.first_air_date.as_deref()),
        popularity: show.popularity.unwrap_or(0.0),
        vote_average: show.vote_average.unwrap_or(0.0),
        vote_count: show.vote_count.unwrap_or(0),
        seasons,
    }
}

/// Empty or malformed dates are treated as unknown.
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

impl TmdbProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey("tmdb".to_string()));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("marquee/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            cache: None,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// URL identifying a request, without the API key.
    fn cache_key(&self, path: &str, params: &[(&str, String)]) -> String {
        let query: Vec<String> = params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        format!("{}/{}?{}", self.base_url, path, query.join("&"))
    }

    fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError> {
        let key = self.cache_key(path, params);

        if let Some(cache) = &self.cache {
            match cache.get(&key) {
                Ok(Some(body)) => return Ok(serde_json::from_str(&body)?),
                Ok(None) => {}
                Err(e) => warn!("Response cache read failed for {}: {}", key, e),
            }
        }

        let url = format!("{}/{}", self.base_url, path);
        debug!("GET {}", key);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("api_key", self.api_key.as_str())])
            .send()?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ProviderError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text()?;
        let value = serde_json::from_str(&body)?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.put(&key, &body) {
                warn!("Response cache write failed for {}: {}", key, e);
            }
        }

        Ok(value)
    }

    fn search_params(request: &Request, year_key: &'static str) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("query", request.query.clone()),
            ("language", request.language.clone()),
        ];
        if let Some(year) = request.year {
            params.push((year_key, year.to_string()));
        }
        params
    }
}

impl Provider for TmdbProvider {
    fn name(&self) -> &str {
        "tmdb"
    }

    fn search_movie(&self, request: &Request) -> Result<MovieRecord, ProviderError> {
        let params = Self::search_params(request, "year");
        let page: SearchPage<TmdbMovie> = self.get("search/movie", &params)?;
        page.results
            .into_iter()
            .next()
            .map(MovieRecord::from)
            .ok_or(ProviderError::NoResult)
    }

    fn search_tv(&self, request: &Request) -> Result<ShowRecord, ProviderError> {
        let params = Self::search_params(request, "first_air_date_year");
        let page: SearchPage<TmdbShow> = self.get("search/tv", &params)?;
        let first = page.results.into_iter().next().ok_or(ProviderError::NoResult)?;
        self.show_details(first.id, &request.language)
    }

    fn movie_details(&self, id: u64, language: &str) -> Result<MovieRecord, ProviderError> {
        let params = [("language", language.to_string())];
        let movie: TmdbMovie = self.get(&format!("movie/{}", id), &params)?;
        Ok(movie.into())
    }

    fn show_details(&self, id: u64, language: &str) -> Result<ShowRecord, ProviderError> {
        let params = [("language", language.to_string())];
        let mut show: TmdbShow = self.get(&format!("tv/{}", id), &params)?;

        let summaries = std::mem::take(&mut show.seasons);
        let mut seasons = Vec::with_capacity(summaries.len());
        for summary in summaries {
            let season: TmdbSeason =
                self.get(&format!("tv/{}/season/{}", id, summary.season_number), &params)?;
            seasons.push(season.into());
        }
        debug!("Loaded show {} with {} seasons in {}", id, seasons.len(), language);

        Ok(show_record(show, seasons))
    }
}
