use std::sync::LazyLock;

use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::error::{Error, Result};
use crate::geo::CountryLookup;
use crate::models::{Location, Marker, MarkerId};
use crate::parser::dom::{self, selector};

static CONTAINER: LazyLock<Selector> = LazyLock::new(|| selector(r#"[id^="marker_"]"#));
static MAP_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="maps.google"]"#));
static HOME_ICON: LazyLock<Selector> = LazyLock::new(|| selector(r#"img[src$="home.png"]"#));
static BOLD: LazyLock<Selector> = LazyLock::new(|| selector("b"));
static PROFILE_LINK: LazyLock<Selector> = LazyLock::new(|| selector(r#"a[href*="/profile/"]"#));

/// Base for map links written as `//maps.google.com/...` or `/maps?...`.
static MAP_BASE: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://maps.google.com/").unwrap());

/// Extract every marker (`marker_<id>`) on the page. `lookup` supplies the
/// country for each marker's coordinates.
pub fn extract(doc: &Html, lookup: &dyn CountryLookup) -> Result<Vec<Marker>> {
    doc.select(&CONTAINER)
        .map(|container| marker(container, lookup))
        .collect()
}

fn marker(container: ElementRef<'_>, lookup: &dyn CountryLookup) -> Result<Marker> {
    let id = dom::id_suffix(container, "marker_")
        .map(MarkerId::parse)
        .ok_or_else(|| dom::missing("marker id"))?;

    let href = map_link(container)?;
    let (latitude, longitude, height) = parse_map_link(&href)?;

    Ok(Marker {
        id,
        is_home: is_home(container),
        user_name: user_name(container).unwrap_or_default(),
        description: description(container).unwrap_or_default(),
        location: Location {
            longitude,
            latitude,
            country: lookup.lookup(longitude, latitude),
            height,
        },
    })
}

pub fn map_link(container: ElementRef<'_>) -> Result<String> {
    container
        .select(&MAP_LINK)
        .next()
        .and_then(|a| dom::attr(a, "href"))
        .ok_or_else(|| dom::missing("map link in marker"))
}

/// Read `(latitude, longitude, height)` from a map link's query string.
///
/// `daddr` is written as `lat,lon`: the first component is the latitude.
/// Relative links are resolved against the maps host.
pub fn parse_map_link(href: &str) -> Result<(f64, f64, Option<f64>)> {
    let url = MAP_BASE
        .join(href)
        .map_err(|e| Error::parse(format!("invalid map link {:?}: {}", href, e)))?;

    let mut daddr = None;
    let mut height = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "daddr" => daddr = Some(value.into_owned()),
            "z" => height = value.trim().parse::<f64>().ok(),
            _ => {}
        }
    }

    let daddr = daddr.ok_or_else(|| dom::missing("daddr in map link"))?;
    let mut parts = daddr.split(',');
    let latitude = dom::parse_num(parts.next().unwrap_or_default(), "latitude")?;
    let longitude = dom::parse_num(parts.next().unwrap_or_default(), "longitude")?;
    Ok((latitude, longitude, height))
}

pub fn is_home(container: ElementRef<'_>) -> bool {
    container.select(&HOME_ICON).next().is_some()
}

/// Bold text with its leading `": "` removed.
pub fn description(container: ElementRef<'_>) -> Option<String> {
    container.select(&BOLD).next().map(|b| {
        let text = dom::text(b);
        text.strip_prefix(':')
            .map(str::trim_start)
            .unwrap_or(&text)
            .to_string()
    })
}

pub fn user_name(container: ElementRef<'_>) -> Option<String> {
    container
        .select(&PROFILE_LINK)
        .next()
        .map(dom::text)
        .filter(|name| !name.is_empty())
}
