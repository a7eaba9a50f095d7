use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Movie data as returned by a provider for one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieRecord {
    pub id: u64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u64,
}

/// TV show data for one language, including every season and episode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShowRecord {
    pub id: u64,
    pub name: String,
    pub first_air_date: Option<NaiveDate>,
    pub popularity: f64,
    pub vote_average: f64,
    pub vote_count: u64,
    pub seasons: Vec<SeasonRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRecord {
    pub id: u64,
    pub name: String,
    pub season_number: u32,
    pub air_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub episodes: Vec<EpisodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    pub id: u64,
    pub name: String,
    pub season_number: u32,
    pub episode_number: u32,
    pub air_date: Option<NaiveDate>,
    pub vote_average: f64,
    pub vote_count: u64,
}

/// Ranking number used to pick between a movie and a show with the same
/// query. Raw popularity wins when present, otherwise the vote average is
/// weighted by the log of the vote count.
pub fn compute_popularity(popularity: f64, vote_average: f64, vote_count: u64) -> i64 {
    if popularity > 0.0 {
        return popularity as i64;
    }
    if vote_count == 0 {
        return 0;
    }
    (vote_average * (vote_count as f64).ln()).round() as i64
}
