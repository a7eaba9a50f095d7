//! Selection of a season or episode below an already resolved show or season.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use super::fuzzy::FuzzyMatcher;
use crate::error::ResolveError;
use crate::identity::{Identity, TvEpisode, TvSeason, TvShow};
use crate::provider::Request;

lazy_static! {
    static ref NUMBER_RE: Regex = Regex::new(r"[0-9]+").unwrap();
    static ref LEADING_EPISODE_RE: Regex = Regex::new(r"^([0-9]+)\s").unwrap();
}

/// Resolves an entry below a show to one of its seasons or episodes.
pub fn select_child(show: &TvShow, request: &Request) -> Result<Identity, ResolveError> {
    if let Some(found) = select_by_number(show, request.info.season, request.info.episode)? {
        return Ok(found);
    }

    if request.query.is_empty() {
        return Err(ResolveError::MissingSelector(
            "no season or episode information".to_string(),
        ));
    }

    if request.is_dir {
        if let Some(number) = last_number(&request.query) {
            match show.season(number) {
                Some(season) => return Ok(Identity::TvSeason(season)),
                None => debug!("Season {} not in '{}', matching by name", number, show.name()),
            }
        }
    } else if let Some(number) = leading_episode_number(&request.query) {
        match find_episode(show, number) {
            Some(episode) => return Ok(Identity::TvEpisode(episode)),
            None => debug!("Episode {} not in '{}', matching by name", number, show.name()),
        }
    }

    best_season_or_episode(show, &request.query)
}

/// Resolves an entry below a season to one of its episodes.
pub fn select_episode_in_season(
    season: &TvSeason,
    request: &Request,
) -> Result<Identity, ResolveError> {
    if let Some(number) = request.info.episode {
        return season.episode(number).map(Identity::TvEpisode).ok_or_else(|| {
            ResolveError::NotFound(format!(
                "episode {} of season {}",
                number,
                season.number()
            ))
        });
    }

    if request.query.is_empty() {
        return Err(ResolveError::MissingSelector(
            "no episode information".to_string(),
        ));
    }

    FuzzyMatcher::new(&request.query)
        .best(season.episodes(), |e| e.name())
        .map(|(episode, score)| {
            debug!(query = %request.query, episode = episode.name(), score, "Fuzzy episode match");
            Identity::TvEpisode(episode)
        })
        .ok_or_else(|| ResolveError::NotFound(format!("no episode matches '{}'", request.query)))
}

fn select_by_number(
    show: &TvShow,
    season: Option<u32>,
    episode: Option<u32>,
) -> Result<Option<Identity>, ResolveError> {
    match (season, episode) {
        (Some(season_number), episode_number) => {
            let season = show
                .season(season_number)
                .ok_or_else(|| ResolveError::NotFound(format!("season {}", season_number)))?;
            match episode_number {
                Some(number) => season
                    .episode(number)
                    .map(|e| Some(Identity::TvEpisode(e)))
                    .ok_or_else(|| {
                        ResolveError::NotFound(format!(
                            "episode {} of season {}",
                            number, season_number
                        ))
                    }),
                None => Ok(Some(Identity::TvSeason(season))),
            }
        }
        (None, Some(number)) => find_episode(show, number)
            .map(|e| Some(Identity::TvEpisode(e)))
            .ok_or_else(|| ResolveError::NotFound(format!("episode {}", number))),
        (None, None) => Ok(None),
    }
}

/// First season, in show order, containing the episode number.
fn find_episode(show: &TvShow, number: u32) -> Option<TvEpisode> {
    show.seasons().into_iter().find_map(|s| s.episode(number))
}

fn last_number(text: &str) -> Option<u32> {
    NUMBER_RE
        .find_iter(text)
        .last()
        .and_then(|m| m.as_str().parse().ok())
}

fn leading_episode_number(text: &str) -> Option<u32> {
    LEADING_EPISODE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Seasons are ranked alongside their episodes, each season before its own
/// episodes.
fn best_season_or_episode(show: &TvShow, query: &str) -> Result<Identity, ResolveError> {
    let mut candidates = Vec::new();
    for season in show.seasons() {
        let episodes = season.episodes();
        candidates.push(Identity::TvSeason(season));
        candidates.extend(episodes.into_iter().map(Identity::TvEpisode));
    }

    FuzzyMatcher::new(query)
        .best(candidates, |c| c.name())
        .map(|(identity, score)| {
            debug!(query = query, matched = %identity, score, "Fuzzy season/episode match");
            identity
        })
        .ok_or_else(|| ResolveError::NotFound(format!("nothing in '{}' matches '{}'", show.name(), query)))
}
