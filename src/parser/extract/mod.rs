pub mod markers;
pub mod profile;
pub mod summaries;

use scraper::Html;

use crate::error::Result;
use crate::geo::CountryLookup;
use crate::models::SearchResult;

/// A search results page carries both a user listing and a marker listing.
pub fn extract_search(doc: &Html, lookup: &dyn CountryLookup) -> Result<SearchResult> {
    let users = summaries::extract(doc)?;
    let markers = markers::extract(doc, lookup)?;
    Ok(SearchResult { users, markers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::NoCountryLookup;

    #[test]
    fn search_page() {
        let html = std::fs::read_to_string("tests/fixtures/search.html").unwrap();
        let result = extract_search(&Html::parse_document(&html), &NoCountryLookup).unwrap();
        assert_eq!(result.users.len(), 2);
        assert_eq!(result.markers.len(), 2);
    }

    #[test]
    fn empty_page() {
        let doc = Html::parse_document("<html><body></body></html>");
        let result = extract_search(&doc, &NoCountryLookup).unwrap();
        assert!(result.users.is_empty());
        assert!(result.markers.is_empty());
    }
}
