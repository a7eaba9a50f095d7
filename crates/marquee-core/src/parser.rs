//! Filename parser for scene-style release names.
//!
//! Handles names like:
//! - "The.Expanse.S02E05.720p.WEB.h264-GRP.mkv"
//! - "Movie Title (2021).mkv"
//! - "Show Name (2019)"
//! - "S01E01 - Pilot.mkv"

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

/// Information extracted from one file or directory name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedInfo {
    pub title: String,
    pub year: Option<i32>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// ISO 639-1 code of a release language tag such as `FRENCH`.
    pub language: Option<String>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("empty name")]
    Empty,
}

pub trait FilenameParser: Send + Sync {
    fn parse(&self, name: &str) -> Result<ParsedInfo, ParseError>;
}

lazy_static! {
    static ref EXTENSION_RE: Regex = Regex::new(
        r"(?i)\.(mkv|mp4|avi|m4v|mov|wmv|flv|webm|mpg|mpeg|ts|m2ts|iso|divx|ogm)$"
    )
    .unwrap();
    static ref BRACKET_TAG_RE: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref LANGUAGE_TAG_RE: Regex =
        Regex::new(r"(?i)\b(TRUEFRENCH|FRENCH|VOSTFR|VFF|GERMAN|SPANISH|CASTELLANO)\b").unwrap();
    static ref SXXEXX_RE: Regex = Regex::new(r"(?i)\bS(\d{1,3}) ?E(\d{1,4})\b").unwrap();
    static ref NXNN_RE: Regex = Regex::new(r"(?i)\b(\d{1,2})x(\d{2,3})\b").unwrap();
    static ref SEASON_ONLY_RE: Regex = Regex::new(r"(?i)\bS(\d{1,3})\b").unwrap();
    static ref EPISODE_ONLY_RE: Regex = Regex::new(r"(?i)\b(?:E|Ep|Episode) ?(\d{1,4})\b").unwrap();
    static ref YEAR_RE: Regex = Regex::new(r"\b((?:19|20)\d{2})\b").unwrap();
    static ref QUALITY_RE: Regex = Regex::new(
        r"(?i)\b(2160p|1080p|720p|576p|480p|4k|uhd|bluray|blu-ray|brrip|bdrip|web-dl|webdl|webrip|hdtv|dvdrip|hdrip|x264|x265|h264|h265|hevc|xvid|remux|proper|repack)\b"
    )
    .unwrap();
    static ref BRACKETS_RE: Regex = Regex::new(r"[()\[\]{}]").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Regex parser for the naming conventions found on typical media shares.
#[derive(Debug, Default, Clone)]
pub struct SceneParser;

impl SceneParser {
    pub fn new() -> Self {
        Self
    }
}

impl FilenameParser for SceneParser {
    fn parse(&self, name: &str) -> Result<ParsedInfo, ParseError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::Empty);
        }

        let stem = EXTENSION_RE.replace(name, "");
        let stem = BRACKET_TAG_RE.replace_all(&stem, " ");
        let text = stem.replace(['.', '_'], " ");

        let mut info = ParsedInfo::default();
        // Byte offsets where the title ends.
        let mut cuts: Vec<usize> = Vec::new();
        let mut marker_end: Option<usize> = None;

        if let Some(m) = LANGUAGE_TAG_RE.find(&text) {
            info.language = language_for_tag(m.as_str());
            cuts.push(m.start());
        }

        if let Some(caps) = SXXEXX_RE.captures(&text).or_else(|| NXNN_RE.captures(&text)) {
            let whole = caps.get(0).map(|m| (m.start(), m.end()));
            info.season = caps.get(1).and_then(|m| m.as_str().parse().ok());
            info.episode = caps.get(2).and_then(|m| m.as_str().parse().ok());
            if let Some((start, end)) = whole {
                cuts.push(start);
                marker_end = Some(end);
            }
        } else {
            if let Some(caps) = SEASON_ONLY_RE.captures(&text) {
                info.season = caps.get(1).and_then(|m| m.as_str().parse().ok());
                if let Some(m) = caps.get(0) {
                    cuts.push(m.start());
                    marker_end = Some(m.end());
                }
            }
            if let Some(caps) = EPISODE_ONLY_RE.captures(&text) {
                info.episode = caps.get(1).and_then(|m| m.as_str().parse().ok());
                if let Some(m) = caps.get(0) {
                    cuts.push(m.start());
                    marker_end = Some(marker_end.map_or(m.end(), |end| end.max(m.end())));
                }
            }
        }

        // A year at the very start is part of the title ("2012", "1917").
        if let Some(m) = YEAR_RE.find_iter(&text).filter(|m| m.start() > 0).last() {
            info.year = m.as_str().parse().ok();
            cuts.push(m.start());
        }

        if let Some(m) = QUALITY_RE.find(&text) {
            cuts.push(m.start());
        }

        let end = cuts.into_iter().min().unwrap_or(text.len());
        let mut title = clean_title(&text[..end]);

        // "S01E01 - Pilot": the title follows the episode marker.
        if title.is_empty() {
            if let Some(start) = marker_end {
                let rest = &text[start..];
                let rest_end = QUALITY_RE
                    .find(rest)
                    .into_iter()
                    .chain(LANGUAGE_TAG_RE.find(rest))
                    .map(|m| m.start())
                    .min()
                    .unwrap_or(rest.len());
                title = clean_title(&rest[..rest_end]);
            }
        }
        info.title = title;

        trace!(
            name = name,
            title = %info.title,
            year = ?info.year,
            season = ?info.season,
            episode = ?info.episode,
            "Parsed name"
        );

        Ok(info)
    }
}

fn language_for_tag(tag: &str) -> Option<String> {
    let code = match tag.to_uppercase().as_str() {
        "TRUEFRENCH" | "FRENCH" | "VOSTFR" | "VFF" => "fr",
        "GERMAN" => "de",
        "SPANISH" | "CASTELLANO" => "es",
        _ => return None,
    };
    Some(code.to_string())
}

fn clean_title(raw: &str) -> String {
    let without_brackets = BRACKETS_RE.replace_all(raw, " ");
    let collapsed = SPACES_RE.replace_all(&without_brackets, " ");
    collapsed
        .trim_matches(|c: char| c.is_whitespace() || c == '-')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> ParsedInfo {
        SceneParser::new().parse(name).expect("name should parse")
    }

    #[test]
    fn test_movie_with_dotted_year() {
        let info = parse("Movie.2021.mkv");
        assert_eq!(info.title, "Movie");
        assert_eq!(info.year, Some(2021));
        assert_eq!(info.season, None);
        assert_eq!(info.episode, None);
    }

    #[test]
    fn test_movie_with_parenthesized_year() {
        let info = parse("Movie (2021).mkv");
        assert_eq!(info.title, "Movie");
        assert_eq!(info.year, Some(2021));
    }

    #[test]
    fn test_scene_release() {
        let info = parse("The.Expanse.S02E05.720p.WEB.h264-GRP.mkv");
        assert_eq!(info.title, "The Expanse");
        assert_eq!(info.season, Some(2));
        assert_eq!(info.episode, Some(5));
    }

    #[test]
    fn test_episode_title_after_marker() {
        let info = parse("S01E01 - Pilot.mkv");
        assert_eq!(info.title, "Pilot");
        assert_eq!(info.season, Some(1));
        assert_eq!(info.episode, Some(1));
    }

    #[test]
    fn test_bare_marker_has_empty_title() {
        let info = parse("S01E01.mkv");
        assert_eq!(info.title, "");
        assert_eq!(info.season, Some(1));
        assert_eq!(info.episode, Some(1));
    }

    #[test]
    fn test_cross_format() {
        let info = parse("Show 3x07.avi");
        assert_eq!(info.title, "Show");
        assert_eq!(info.season, Some(3));
        assert_eq!(info.episode, Some(7));
    }

    #[test]
    fn test_season_directory_stays_in_title() {
        let info = parse("Season 2");
        assert_eq!(info.title, "Season 2");
        assert_eq!(info.season, None);
    }

    #[test]
    fn test_short_season_marker() {
        let info = parse("S03");
        assert_eq!(info.season, Some(3));
        assert_eq!(info.title, "");
    }

    #[test]
    fn test_leading_year_is_title() {
        let info = parse("2012.mkv");
        assert_eq!(info.title, "2012");
        assert_eq!(info.year, None);
    }

    #[test]
    fn test_last_year_wins() {
        let info = parse("Blade Runner 2049 (2017).mkv");
        assert_eq!(info.title, "Blade Runner 2049");
        assert_eq!(info.year, Some(2017));
    }

    #[test]
    fn test_show_directory() {
        let info = parse("Show Name (2019)");
        assert_eq!(info.title, "Show Name");
        assert_eq!(info.year, Some(2019));
    }

    #[test]
    fn test_language_tag() {
        let info = parse("Le.Film.2010.FRENCH.1080p.BluRay.mkv");
        assert_eq!(info.title, "Le Film");
        assert_eq!(info.year, Some(2010));
        assert_eq!(info.language.as_deref(), Some("fr"));
    }

    #[test]
    fn test_numbered_episode_file_keeps_number() {
        let info = parse("03 - The Third One.mkv");
        assert_eq!(info.title, "03 - The Third One");
    }

    #[test]
    fn test_bracket_tags_removed() {
        let info = parse("[Group] Some Anime - E12 [1080p].mkv");
        assert_eq!(info.title, "Some Anime");
        assert_eq!(info.episode, Some(12));
    }

    #[test]
    fn test_empty_name() {
        assert_eq!(SceneParser::new().parse("   "), Err(ParseError::Empty));
    }
}
