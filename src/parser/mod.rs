pub mod dom;
pub mod extract;
pub mod forms;

use chrono::NaiveDate;
use scraper::Html;

use crate::error::Result;
use crate::geo::CountryLookup;
use crate::models::{FullProfile, SearchResult};

/// Parse a search results page body into users and markers.
pub fn search_page(body: &str, lookup: &dyn CountryLookup) -> Result<SearchResult> {
    let doc = Html::parse_document(body);
    extract::extract_search(&doc, lookup)
}

/// Parse a profile page body.
pub fn profile_page(body: &str, lookup: &dyn CountryLookup, today: NaiveDate) -> Result<FullProfile> {
    let doc = Html::parse_document(body);
    extract::profile::extract(&doc, lookup, today)
}
