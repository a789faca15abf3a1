use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::models::{avatar_url, ProfileSummary};
use crate::parser::dom::{self, selector};

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector(r#"[id^="userlocation_"]"#));
static USER_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[id^="user_"]"#));
static ANCHOR: LazyLock<Selector> = LazyLock::new(|| selector("a[href]"));
static FLAG: LazyLock<Selector> = LazyLock::new(|| selector(r#"img[src*="/flags/"]"#));

static MARKER_COUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<species>.+?),\s*)?(?P<count>\d+)\s+markers?$").unwrap()
});

/// Extract every user listing (`userlocation_<id>`) on a search or profile page.
pub fn extract(doc: &Html) -> Result<Vec<ProfileSummary>> {
    doc.select(&CONTAINER).map(summary).collect()
}

fn summary(container: ElementRef<'_>) -> Result<ProfileSummary> {
    let link = user_link(container)?;
    let id: u64 = dom::parse_num(
        dom::id_suffix(link, "user_").unwrap_or_default(),
        "user id",
    )?;
    let (species, marker_count) = species_and_count(container)?;

    Ok(ProfileSummary {
        id,
        name: dom::text(link),
        profile_url: profile_url(container).unwrap_or_default(),
        avatar_url: avatar_url(id),
        gender: gender(link),
        country: country(container),
        species,
        marker_count,
    })
}

pub fn user_link(container: ElementRef<'_>) -> Result<ElementRef<'_>> {
    container
        .select(&USER_LINK)
        .next()
        .ok_or_else(|| dom::missing("user link in listing"))
}

/// Target of the first anchor in the listing.
pub fn profile_url(container: ElementRef<'_>) -> Option<String> {
    container
        .select(&ANCHOR)
        .next()
        .and_then(|a| dom::attr(a, "href"))
}

/// Alt text of the image right after the user link.
pub fn gender(link: ElementRef<'_>) -> Option<String> {
    dom::next_element(link)
        .filter(|el| el.value().name() == "img")
        .and_then(|img| dom::attr(img, "alt"))
        .filter(|alt| !alt.is_empty())
}

pub fn country(container: ElementRef<'_>) -> Option<String> {
    container
        .select(&FLAG)
        .next()
        .and_then(|img| dom::attr(img, "title"))
        .filter(|t| !t.is_empty())
}

/// Parse the trailing `"<species>, <N> markers"` / `"<N> markers"` text.
pub fn species_and_count(container: ElementRef<'_>) -> Result<(Option<String>, u32)> {
    let trailing = dom::text_nodes(container).pop().unwrap_or_default();
    parse_marker_count(&trailing)
}

pub fn parse_marker_count(text: &str) -> Result<(Option<String>, u32)> {
    let caps = MARKER_COUNT_RE
        .captures(text.trim())
        .ok_or_else(|| Error::parse(format!("unexpected marker count text: {:?}", text)))?;
    let species = caps
        .name("species")
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty());
    let count = dom::parse_num(&caps["count"], "marker count")?;
    Ok((species, count))
}

// ── Tests ──
