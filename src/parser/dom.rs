use scraper::{ElementRef, Node, Selector};

use crate::error::{Error, Result};

/// Parse a selector literal. Only called with compile-time constants.
pub fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector {:?}: {:?}", css, e))
}

/// Text owned directly by `el`, excluding text of descendant elements.
/// Labels and values are usually siblings inside one tag
/// (`<p><b>Species: </b>Fox</p>`), so `text()` alone would merge them.
pub fn pure_text(el: ElementRef<'_>) -> String {
    let joined: String = el
        .children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => Some(&**t),
            _ => None,
        })
        .collect();
    joined.trim().to_string()
}

/// Direct text nodes of `el`, trimmed, empties dropped.
pub fn text_nodes(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => Some(t.trim().to_string()),
            _ => None,
        })
        .filter(|t| !t.is_empty())
        .collect()
}

/// All descendant text, whitespace-trimmed.
pub fn text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

pub fn attr(el: ElementRef<'_>, name: &str) -> Option<String> {
    el.value().attr(name).map(|v| v.to_string())
}

/// `user_42` with prefix `user_` -> `"42"`.
pub fn id_suffix<'a>(el: ElementRef<'a>, prefix: &str) -> Option<&'a str> {
    el.value().id().and_then(|id| id.strip_prefix(prefix))
}

/// First element sibling after `el`.
pub fn next_element<'a>(el: ElementRef<'a>) -> Option<ElementRef<'a>> {
    el.next_siblings().find_map(ElementRef::wrap)
}

pub fn missing(what: &str) -> Error {
    Error::parse(format!("missing {}", what))
}

/// Parse `value` as `T` or fail with a parse error naming `what`.
pub fn parse_num<T: std::str::FromStr>(value: &str, what: &str) -> Result<T> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| Error::parse(format!("invalid {}: {:?}", what, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn first<'a>(doc: &'a Html, css: &str) -> ElementRef<'a> {
        doc.select(&selector(css)).next().unwrap()
    }

    #[test]
    fn pure_text_skips_children() {
        let doc = Html::parse_fragment("<p><b>Species: </b> Fox <i>ignored</i></p>");
        assert_eq!(pure_text(first(&doc, "p")), "Fox");
        assert_eq!(text(first(&doc, "p")), "Species:  Fox ignored");
    }

    #[test]
    fn text_nodes_keeps_order() {
        let doc = Html::parse_fragment("<div>one<br>two <span>x</span> three</div>");
        assert_eq!(text_nodes(first(&doc, "div")), vec!["one", "two", "three"]);
    }

    #[test]
    fn id_suffix_matches_prefix() {
        let doc = Html::parse_fragment(r#"<a id="user_42">x</a>"#);
        assert_eq!(id_suffix(first(&doc, "a"), "user_"), Some("42"));
        assert_eq!(id_suffix(first(&doc, "a"), "marker_"), None);
    }

    #[test]
    fn next_element_skips_text() {
        let doc = Html::parse_fragment(r#"<div><a>x</a> text <img alt="male"></div>"#);
        let img = next_element(first(&doc, "a")).unwrap();
        assert_eq!(attr(img, "alt").as_deref(), Some("male"));
    }

    #[test]
    fn parse_num_reports_field() {
        assert_eq!(parse_num::<u32>(" 7 ", "count").unwrap(), 7);
        let err = parse_num::<u32>("seven", "count").unwrap_err();
        assert!(err.to_string().contains("count"));
    }
}
