#![allow(dead_code)]

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use marquee_core::identity::records::{EpisodeRecord, MovieRecord, SeasonRecord, ShowRecord};
use marquee_core::language::LanguageDetector;
use marquee_core::provider::{Provider, ProviderError, Request};

/// In-memory provider matching titles case-insensitively, and the year when
/// the request carries one.
#[derive(Default)]
pub struct FakeProvider {
    movies: Vec<MovieRecord>,
    shows: Vec<ShowRecord>,
    translations: HashMap<(u64, String), String>,
    detail_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_movie(mut self, movie: MovieRecord) -> Self {
        self.movies.push(movie);
        self
    }

    pub fn with_show(mut self, show: ShowRecord) -> Self {
        self.shows.push(show);
        self
    }

    /// Name returned by detail lookups of `id` in `language`.
    pub fn with_translation(mut self, id: u64, language: &str, name: &str) -> Self {
        self.translations
            .insert((id, language.to_string()), name.to_string());
        self
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    fn translated(&self, id: u64, language: &str, name: &str) -> String {
        self.translations
            .get(&(id, language.to_string()))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

fn matches(request: &Request, name: &str, date: Option<NaiveDate>) -> bool {
    if !name.eq_ignore_ascii_case(&request.query) {
        return false;
    }
    match (request.year, date) {
        (Some(year), Some(date)) => date.year() == year,
        (Some(_), None) => false,
        (None, _) => true,
    }
}

impl Provider for FakeProvider {
    fn name(&self) -> &str {
        "fake"
    }

    fn search_movie(&self, request: &Request) -> Result<MovieRecord, ProviderError> {
        self.movies
            .iter()
            .find(|m| matches(request, &m.title, m.release_date))
            .cloned()
            .ok_or(ProviderError::NoResult)
    }

    fn search_tv(&self, request: &Request) -> Result<ShowRecord, ProviderError> {
        self.shows
            .iter()
            .find(|s| matches(request, &s.name, s.first_air_date))
            .cloned()
            .ok_or(ProviderError::NoResult)
    }

    fn movie_details(&self, id: u64, language: &str) -> Result<MovieRecord, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let mut movie = self
            .movies
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("movie {}", id)))?;
        movie.title = self.translated(id, language, &movie.title);
        Ok(movie)
    }

    fn show_details(&self, id: u64, language: &str) -> Result<ShowRecord, ProviderError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let mut show = self
            .shows
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("show {}", id)))?;
        show.name = self.translated(id, language, &show.name);
        Ok(show)
    }
}

/// Provider whose every call fails with a server error.
#[derive(Default)]
pub struct BrokenProvider {
    calls: AtomicUsize,
}

impl BrokenProvider {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> Result<T, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ProviderError::Status {
            status: 503,
            url: "http://broken.invalid".to_string(),
        })
    }
}

impl Provider for BrokenProvider {
    fn name(&self) -> &str {
        "broken"
    }

    fn search_movie(&self, _request: &Request) -> Result<MovieRecord, ProviderError> {
        self.fail()
    }

    fn search_tv(&self, _request: &Request) -> Result<ShowRecord, ProviderError> {
        self.fail()
    }

    fn movie_details(&self, _id: u64, _language: &str) -> Result<MovieRecord, ProviderError> {
        self.fail()
    }

    fn show_details(&self, _id: u64, _language: &str) -> Result<ShowRecord, ProviderError> {
        self.fail()
    }
}

/// Detector that always answers the same.
pub struct FixedDetector(pub Option<&'static str>);

impl LanguageDetector for FixedDetector {
    fn detect(&self, _text: &str) -> Option<String> {
        self.0.map(str::to_string)
    }
}

fn jan_first(year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
}

pub fn movie(id: u64, title: &str, year: i32, popularity: f64) -> MovieRecord {
    MovieRecord {
        id,
        title: title.to_string(),
        release_date: jan_first(year),
        popularity,
        vote_average: 0.0,
        vote_count: 0,
    }
}

/// Show whose seasons are numbered from one, each given by its episode names.
pub fn show(id: u64, name: &str, year: i32, popularity: f64, seasons: &[&[&str]]) -> ShowRecord {
    let seasons = seasons
        .iter()
        .enumerate()
        .map(|(i, episodes)| {
            let number = i as u32 + 1;
            SeasonRecord {
                id: id * 100 + number as u64,
                name: format!("Season {}", number),
                season_number: number,
                air_date: jan_first(year + i as i32),
                vote_average: 0.0,
                episodes: episodes
                    .iter()
                    .enumerate()
                    .map(|(j, episode)| EpisodeRecord {
                        id: id * 10_000 + number as u64 * 100 + j as u64 + 1,
                        name: episode.to_string(),
                        season_number: number,
                        episode_number: j as u32 + 1,
                        air_date: None,
                        vote_average: 0.0,
                        vote_count: 0,
                    })
                    .collect(),
            }
        })
        .collect();
    ShowRecord {
        id,
        name: name.to_string(),
        first_air_date: jan_first(year),
        popularity,
        vote_average: 0.0,
        vote_count: 0,
        seasons,
    }
}

pub fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut file = File::create(path).unwrap();
    file.write_all(b"media").unwrap();
}
