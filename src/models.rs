use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Marker ids are numeric on the site, but the feed occasionally carries
/// string ids, so both are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerId {
    Int(i64),
    Str(String),
}

impl MarkerId {
    /// Numeric when the whole string parses as an integer.
    pub fn parse(raw: &str) -> Self {
        raw.parse::<i64>()
            .map(MarkerId::Int)
            .unwrap_or_else(|_| MarkerId::Str(raw.to_string()))
    }
}

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerId::Int(id) => write!(f, "{}", id),
            MarkerId::Str(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// A user entry from a search listing or a friends list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub id: u64,
    pub name: String,
    #[serde(rename = "profileURL")]
    pub profile_url: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub species: Option<String>,
    pub marker_count: u32,
}

/// A marker scraped from HTML (search results, profile pages).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    pub id: MarkerId,
    pub is_home: bool,
    pub user_name: String,
    pub description: String,
    pub location: Location,
}

/// A marker from the JSON feed. This is the shape persisted in the cache
/// file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerFeedEntry {
    pub id: MarkerId,
    #[serde(default)]
    pub is_home: bool,
    pub user_name: String,
    pub description: String,
    pub location: Location,
    pub opacity_factor: i64,
    #[serde(rename = "profileURL")]
    pub profile_url: String,
    #[serde(
        rename = "profileImageURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub other_nicknames: Option<String>,
    pub relationship_status: Option<String>,
    pub species: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phones {
    pub mobile: Option<String>,
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub real_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub location: Option<Vec<String>>,
    pub phones: Phones,
}

/// Everything on a profile page. Sections are `None` when their heading is
/// missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FullProfile {
    pub about: Option<About>,
    pub contact: Option<Contact>,
    pub messengers: Option<BTreeMap<String, String>>,
    pub websites: Option<BTreeMap<String, String>>,
    pub markers: Vec<Marker>,
    pub friends: Vec<ProfileSummary>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub users: Vec<ProfileSummary>,
    pub markers: Vec<Marker>,
}

/// What the search form matches the query against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchFilter {
    #[default]
    Nickname,
    Species,
    Location,
}

impl SearchFilter {
    pub fn as_form_value(self) -> &'static str {
        match self {
            SearchFilter::Nickname => "nickname",
            SearchFilter::Species => "species",
            SearchFilter::Location => "location",
        }
    }
}

impl std::str::FromStr for SearchFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nickname" | "name" => Ok(SearchFilter::Nickname),
            "species" => Ok(SearchFilter::Species),
            "location" => Ok(SearchFilter::Location),
            other => Err(format!("unknown search filter: {}", other)),
        }
    }
}

pub(crate) fn avatar_url(id: u64) -> String {
    format!("/images/avatar/{}.png", id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_id_parse() {
        assert_eq!(MarkerId::parse("42"), MarkerId::Int(42));
        assert_eq!(MarkerId::parse("h42"), MarkerId::Str("h42".into()));
    }

    #[test]
    fn feed_entry_omits_missing_image() {
        let entry = MarkerFeedEntry {
            id: MarkerId::Int(1),
            is_home: false,
            user_name: "fox".into(),
            description: "den".into(),
            location: Location {
                longitude: 13.4,
                latitude: 52.5,
                country: None,
                height: None,
            },
            opacity_factor: 3,
            profile_url: "/profile/fox".into(),
            profile_image_url: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("profileImageURL").is_none());
        assert_eq!(json["profileURL"], "/profile/fox");
        assert_eq!(json["opacityFactor"], 3);
        assert!(json["location"].get("country").is_none());
    }

    #[test]
    fn search_filter_from_str() {
        assert_eq!("Species".parse::<SearchFilter>(), Ok(SearchFilter::Species));
        assert!("colour".parse::<SearchFilter>().is_err());
        assert_eq!(SearchFilter::default().as_form_value(), "nickname");
    }
}
