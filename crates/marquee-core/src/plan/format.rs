use chrono::Datelike;
use chrono::NaiveDate;
use sanitize_filename::sanitize;

use crate::identity::{Identity, Movie, TvEpisode, TvSeason, TvShow};

/// Turns an identity into destination path components, outermost first.
/// The last component is the file stem for files.
pub trait Formatter: Send + Sync {
    fn movie(&self, movie: &Movie) -> Vec<String>;
    fn tv_show(&self, show: &TvShow) -> Vec<String>;
    fn tv_season(&self, season: &TvSeason) -> Vec<String>;
    fn tv_episode(&self, episode: &TvEpisode) -> Vec<String>;

    fn components(&self, identity: &Identity) -> Vec<String> {
        match identity {
            Identity::Movie(m) => self.movie(m),
            Identity::TvShow(s) => self.tv_show(s),
            Identity::TvSeason(s) => self.tv_season(s),
            Identity::TvEpisode(e) => self.tv_episode(e),
        }
    }
}

/// Layout expected by Jellyfin:
///
/// ```text
/// Movie (2021)/Movie (2021).mkv
/// Show (2019)/Season 01/Show S01E01 - Pilot.mkv
/// ```
#[derive(Debug, Default, Clone)]
pub struct JellyfinFormatter;

impl JellyfinFormatter {
    pub fn new() -> Self {
        Self
    }
}

fn titled(name: &str, date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => sanitize(format!("{} ({})", name, date.year())),
        None => sanitize(name),
    }
}

/// Zero padding wide enough for `count`, never below two digits.
fn padding(count: usize) -> usize {
    count.to_string().len().max(2)
}

fn season_folder(season: &TvSeason) -> String {
    let width = padding(season.show().season_count());
    format!("Season {:0width$}", season.number(), width = width)
}

impl Formatter for JellyfinFormatter {
    fn movie(&self, movie: &Movie) -> Vec<String> {
        let name = titled(movie.name(), movie.date());
        vec![name.clone(), name]
    }

    fn tv_show(&self, show: &TvShow) -> Vec<String> {
        vec![titled(show.name(), show.date())]
    }

    fn tv_season(&self, season: &TvSeason) -> Vec<String> {
        let mut components = self.tv_show(season.show());
        components.push(season_folder(season));
        components
    }

    fn tv_episode(&self, episode: &TvEpisode) -> Vec<String> {
        let season = episode.season();
        let show = season.show();
        let mut components = self.tv_season(season);

        let mut file = format!(
            "{} S{:0sw$}E{:0ew$}",
            show.name(),
            season.number(),
            episode.number(),
            sw = padding(show.season_count()),
            ew = padding(season.episode_count()),
        );
        if !episode.name().is_empty() {
            file.push_str(" - ");
            file.push_str(episode.name());
        }
        components.push(sanitize(file));
        components
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::records::{EpisodeRecord, MovieRecord, SeasonRecord, ShowRecord};
    use crate::provider::{Provider, ProviderError, Request};
    use std::sync::Arc;

    struct Offline;

    impl Provider for Offline {
        fn name(&self) -> &str {
            "offline"
        }
        fn search_movie(&self, _: &Request) -> Result<MovieRecord, ProviderError> {
            Err(ProviderError::NoResult)
        }
        fn search_tv(&self, _: &Request) -> Result<ShowRecord, ProviderError> {
            Err(ProviderError::NoResult)
        }
        fn movie_details(&self, _: u64, _: &str) -> Result<MovieRecord, ProviderError> {
            Err(ProviderError::NoResult)
        }
        fn show_details(&self, _: u64, _: &str) -> Result<ShowRecord, ProviderError> {
            Err(ProviderError::NoResult)
        }
    }

    fn show(seasons: u32, episodes: u32, episode_name: &str) -> TvShow {
        let record = ShowRecord {
            id: 1,
            name: "Show Name".to_string(),
            first_air_date: NaiveDate::from_ymd_opt(2019, 9, 1),
            popularity: 1.0,
            vote_average: 0.0,
            vote_count: 0,
            seasons: (1..=seasons)
                .map(|s| SeasonRecord {
                    id: s as u64,
                    name: format!("Season {}", s),
                    season_number: s,
                    air_date: None,
                    vote_average: 0.0,
                    episodes: (1..=episodes)
                        .map(|e| EpisodeRecord {
                            id: (s * 1000 + e) as u64,
                            name: episode_name.to_string(),
                            season_number: s,
                            episode_number: e,
                            air_date: None,
                            vote_average: 0.0,
                            vote_count: 0,
                        })
                        .collect(),
                })
                .collect(),
        };
        TvShow::new(record, "en", Arc::new(Offline))
    }

    #[test]
    fn test_movie_components() {
        let movie = Movie::new(
            MovieRecord {
                id: 1,
                title: "Movie".to_string(),
                release_date: NaiveDate::from_ymd_opt(2021, 1, 1),
                popularity: 1.0,
                vote_average: 0.0,
                vote_count: 0,
            },
            "en",
            Arc::new(Offline),
        );
        let components = JellyfinFormatter::new().components(&Identity::Movie(movie));
        assert_eq!(components, vec!["Movie (2021)", "Movie (2021)"]);
    }

    #[test]
    fn test_episode_components() {
        let show = show(2, 8, "Pilot");
        let episode = show.season(1).and_then(|s| s.episode(1)).unwrap();
        let components = JellyfinFormatter::new().components(&Identity::TvEpisode(episode));
        assert_eq!(
            components,
            vec!["Show Name (2019)", "Season 01", "Show Name S01E01 - Pilot"]
        );
    }

    #[test]
    fn test_wide_padding() {
        let show = show(1, 120, "");
        let episode = show.season(1).and_then(|s| s.episode(7)).unwrap();
        let components = JellyfinFormatter::new().tv_episode(&episode);
        assert_eq!(components[2], "Show Name S01E007", "no name suffix when empty");
    }

    #[test]
    fn test_show_and_season_components() {
        let show = show(3, 1, "x");
        let formatter = JellyfinFormatter::new();
        assert_eq!(formatter.tv_show(&show), vec!["Show Name (2019)"]);
        assert_eq!(
            formatter.tv_season(&show.season(3).unwrap()),
            vec!["Show Name (2019)", "Season 03"]
        );
    }

    #[test]
    fn test_unsafe_characters_are_removed() {
        assert_eq!(titled("AC/DC: Live", None), "ACDC Live");
    }
}
