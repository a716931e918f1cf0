use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A playable source for a movie or an episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub number: i64,
    pub title: String,
    #[serde(default)]
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Series,
    Anime,
    AnimeMovie,
    ForeignSeries,
    AsianSeries,
    Documentary,
}

impl MediaType {
    pub const ALL: [MediaType; 7] = [
        MediaType::Movie,
        MediaType::Series,
        MediaType::Anime,
        MediaType::AnimeMovie,
        MediaType::ForeignSeries,
        MediaType::AsianSeries,
        MediaType::Documentary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
            MediaType::Anime => "anime",
            MediaType::AnimeMovie => "anime_movie",
            MediaType::ForeignSeries => "foreign_series",
            MediaType::AsianSeries => "asian_series",
            MediaType::Documentary => "documentary",
        }
    }

    /// Storage partition this type is routed to
    pub fn partition(&self) -> Partition {
        match self {
            MediaType::Movie => Partition::Movies,
            MediaType::Anime => Partition::Anime,
            MediaType::Series | MediaType::ForeignSeries | MediaType::AsianSeries => {
                Partition::Series
            }
            MediaType::AnimeMovie | MediaType::Documentary => Partition::Other,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaType {
    type Err = String;

    /// Case-insensitive; "Anime-Movie" and "anime movie" both read as `anime_movie`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace(['-', ' '], "_");
        MediaType::ALL
            .into_iter()
            .find(|t| t.as_str() == key)
            .ok_or_else(|| format!("unknown media type '{}'", s))
    }
}

/// The four type-based collections that make up the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    Movies,
    Series,
    Anime,
    Other,
}

impl Partition {
    /// Order used for the combined view and for exports
    pub const ALL: [Partition; 4] = [
        Partition::Movies,
        Partition::Series,
        Partition::Anime,
        Partition::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Movies => "movies",
            Partition::Series => "series",
            Partition::Anime => "anime",
            Partition::Other => "other",
        }
    }
}

impl FromStr for Partition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movies" | "movie" => Ok(Partition::Movies),
            "series" => Ok(Partition::Series),
            "anime" => Ok(Partition::Anime),
            "other" => Ok(Partition::Other),
            other => Err(format!("unknown partition '{}'", other)),
        }
    }
}

/// Canonical catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub description_ar: Option<String>,
    #[serde(default)]
    pub poster: String,
    pub backdrop: Option<String>,
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub genre: Option<String>,
    pub category: Option<String>,
    pub year: String,
    pub rating: Option<String>,
    pub duration: Option<String>,
    pub watch_url: Option<String>,
    pub trailer_url: Option<String>,
    pub servers: Option<Vec<Server>>,
    pub episodes: Option<Vec<Episode>>,
    pub episode_count: Option<i64>,
    pub seasons: Option<i64>,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
}

impl Media {
    /// A record with every optional field unset
    pub fn new(id: impl Into<String>, title: impl Into<String>, media_type: MediaType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
            description_ar: None,
            poster: String::new(),
            backdrop: None,
            media_type,
            genre: None,
            category: None,
            year: "2024".to_string(),
            rating: None,
            duration: None,
            watch_url: None,
            trailer_url: None,
            servers: None,
            episodes: None,
            episode_count: None,
            seasons: None,
            is_new: false,
            is_trending: false,
            is_popular: false,
            is_featured: false,
            created_at: Utc::now(),
        }
    }

    pub fn partition(&self) -> Partition {
        self.media_type.partition()
    }

    /// Numeric rating used for ordering; absent or unparseable ratings count as 0
    pub fn rating_value(&self) -> f64 {
        self.rating.as_deref().map(parse_rating).unwrap_or(0.0)
    }

    pub fn episode(&self, number: i64) -> Option<&Episode> {
        self.episodes
            .as_ref()?
            .iter()
            .find(|episode| episode.number == number)
    }
}

/// Reads the leading decimal number of a rating string ("8.5/10" -> 8.5)
pub fn parse_rating(raw: &str) -> f64 {
    let trimmed = raw.trim_start();
    let mut end = 0;
    let mut seen_digit = false;
    let mut seen_dot = false;

    for (i, c) in trimmed.char_indices() {
        match c {
            '+' | '-' if i == 0 => {}
            '0'..='9' => seen_digit = true,
            '.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end = i + c.len_utf8();
    }

    if !seen_digit {
        return 0.0;
    }

    trimmed[..end]
        .trim_end_matches('.')
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}
