use std::collections::BTreeMap;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use super::{markers, summaries};
use crate::error::Result;
use crate::geo::CountryLookup;
use crate::models::{About, Contact, FullProfile, Phones};
use crate::parser::dom::{self, selector};

static REGION: LazyLock<Selector> = LazyLock::new(|| selector("#profile"));
static HEADING: LazyLock<Selector> = LazyLock::new(|| selector("h2"));
static LABEL: LazyLock<Selector> = LazyLock::new(|| selector("b"));
static LINK: LazyLock<Selector> = LazyLock::new(|| selector("a"));

static AGE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)").unwrap());

const BIRTHDAY_FORMATS: &[&str] = &["%d.%m.%Y", "%Y-%m-%d"];

/// How an entry's value is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Direct text next to the label.
    Text,
    /// Text of the entry's link.
    LinkText,
    /// Target of the entry's link.
    LinkHref,
}

/// Extract a profile page. `today` anchors birth dates computed from an age.
pub fn extract(doc: &Html, lookup: &dyn CountryLookup, today: NaiveDate) -> Result<FullProfile> {
    let region = doc
        .select(&REGION)
        .next()
        .ok_or_else(|| dom::missing("profile content region"))?;

    let about = section_entries(region, "About", ValueKind::Text).map(|e| about(&e));
    let contact = section_entries(region, "Reallife", ValueKind::Text).map(|e| contact(&e, today));
    let messengers = section_entries(region, "Messenger", ValueKind::LinkText).map(into_map);
    let websites = section_entries(region, "Websites", ValueKind::LinkHref).map(into_map);

    Ok(FullProfile {
        about,
        contact,
        messengers,
        websites,
        markers: markers::extract(doc, lookup)?,
        friends: summaries::extract(doc)?,
    })
}

/// Heading (`h2`) in `region` whose text contains `title`.
pub fn find_heading<'a>(region: ElementRef<'a>, title: &str) -> Option<ElementRef<'a>> {
    region
        .select(&HEADING)
        .find(|h| dom::text(*h).contains(title))
}

/// Key/value pairs of the block following the `title` heading, or `None`
/// when the page has no such heading.
pub fn section_entries(
    region: ElementRef<'_>,
    title: &str,
    kind: ValueKind,
) -> Option<Vec<(String, String)>> {
    let heading = find_heading(region, title)?;
    let Some(body) = dom::next_element(heading).filter(|el| el.value().name() != "h2") else {
        return Some(Vec::new());
    };

    let entries = body
        .children()
        .filter_map(ElementRef::wrap)
        .filter_map(|entry| {
            let label = entry.select(&LABEL).next()?;
            let value = match kind {
                ValueKind::Text => dom::pure_text(entry),
                ValueKind::LinkText => entry.select(&LINK).next().map(dom::text)?,
                ValueKind::LinkHref => entry
                    .select(&LINK)
                    .next()
                    .and_then(|a| dom::attr(a, "href"))?,
            };
            Some((label_key(&dom::text(label)), value))
        })
        .collect();
    Some(entries)
}

/// `"Real name: "` -> `"real name"`.
pub fn label_key(label: &str) -> String {
    label
        .trim()
        .trim_end_matches(':')
        .trim_end()
        .to_lowercase()
}

fn get(entries: &[(String, String)], key: &str) -> Option<String> {
    entries
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.clone())
        .filter(|v| !v.is_empty())
}

fn into_map(entries: Vec<(String, String)>) -> BTreeMap<String, String> {
    entries.into_iter().collect()
}

fn about(entries: &[(String, String)]) -> About {
    About {
        other_nicknames: get(entries, "other nicknames"),
        relationship_status: get(entries, "relationship status"),
        species: get(entries, "species"),
    }
}

fn contact(entries: &[(String, String)], today: NaiveDate) -> Contact {
    let birth_date = get(entries, "birthday")
        .and_then(|b| parse_birthday(&b))
        .or_else(|| get(entries, "age").and_then(|a| birth_date_from_age(&a, today)));

    Contact {
        real_name: get(entries, "real name"),
        birth_date,
        location: get(entries, "location").map(|l| split_location(&l)),
        phones: Phones {
            mobile: get(entries, "mobile"),
            home: get(entries, "phone"),
        },
    }
}

pub fn parse_birthday(raw: &str) -> Option<NaiveDate> {
    BIRTHDAY_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw.trim(), fmt).ok())
}

/// Subtracts the age from `today`'s year and keeps month and day. This is
/// off by up to a year for anyone whose birthday hasn't come yet.
pub fn birth_date_from_age(raw: &str, today: NaiveDate) -> Option<NaiveDate> {
    let age: i32 = AGE_RE.captures(raw.trim())?[1].parse().ok()?;
    let year = today.year() - age;
    NaiveDate::from_ymd_opt(year, today.month(), today.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, today.month(), 28))
}

pub fn split_location(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// ── Tests ──
