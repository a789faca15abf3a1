use std::sync::LazyLock;

use scraper::{Html, Selector};

use crate::error::Result;
use crate::parser::dom::{self, selector};

pub const LOGIN_TOKEN_FIELD: &str = "signin[_csrf_token]";
pub const SEARCH_TOKEN_FIELD: &str = "search[_csrf_token]";

static ERROR_LIST: LazyLock<Selector> = LazyLock::new(|| selector(".error_list"));
static ERROR_ITEM: LazyLock<Selector> = LazyLock::new(|| selector("li"));

/// Value of the hidden CSRF input named `field`.
pub fn csrf_token(doc: &Html, field: &str) -> Result<String> {
    let css = format!(r#"input[name="{}"]"#, field);
    doc.select(&selector(&css))
        .next()
        .and_then(|input| dom::attr(input, "value"))
        .filter(|v| !v.is_empty())
        .ok_or_else(|| dom::missing(&format!("csrf token {}", field)))
}

/// Messages of the form error list, or `None` when the page has none.
pub fn error_list(doc: &Html) -> Option<Vec<String>> {
    let list = doc.select(&ERROR_LIST).next()?;
    let items: Vec<String> = list
        .select(&ERROR_ITEM)
        .map(dom::text)
        .filter(|t| !t.is_empty())
        .collect();
    if items.is_empty() {
        Some(vec![dom::text(list)])
    } else {
        Some(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn login_token() {
        let html = std::fs::read_to_string("tests/fixtures/login.html").unwrap();
        let doc = Html::parse_document(&html);
        assert_eq!(csrf_token(&doc, LOGIN_TOKEN_FIELD).unwrap(), "login-token-1");
        assert!(matches!(csrf_token(&doc, SEARCH_TOKEN_FIELD), Err(Error::Parse(_))));
        assert!(error_list(&doc).is_none());
    }

    #[test]
    fn login_errors() {
        let html = std::fs::read_to_string("tests/fixtures/login_error.html").unwrap();
        let errors = error_list(&Html::parse_document(&html)).unwrap();
        assert_eq!(errors, vec!["The username and/or password is invalid."]);
    }

    #[test]
    fn bare_error_list() {
        let doc = Html::parse_document(r#"<div class="error_list">Account locked</div>"#);
        assert_eq!(error_list(&doc).unwrap(), vec!["Account locked"]);
    }
}
