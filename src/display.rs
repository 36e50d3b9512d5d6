//! Presentation-facing items: what the app shows, in display order.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Serialize;

use crate::ingest::types::FeedItem;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedItem {
    pub source_item: FeedItem,
    /// Thumbnail hint; `None` is a valid outcome.
    pub image_url: Option<String>,
    pub source_link: String,
}

impl RankedItem {
    pub fn from_item(item: FeedItem) -> Self {
        let image_url = extract_image_url(item.description.as_deref());
        let source_link = item.source_link.clone();
        Self {
            source_item: item,
            image_url,
            source_link,
        }
    }
}

/// Build the displayed list from candidates and an index order.
pub fn render(candidates: &[FeedItem], order: &[usize]) -> Vec<RankedItem> {
    order
        .iter()
        .filter_map(|&i| candidates.get(i))
        .cloned()
        .map(RankedItem::from_item)
        .collect()
}

/// First http/https/ftp URL in the text, with HTML entities decoded.
pub fn extract_image_url(text: Option<&str>) -> Option<String> {
    static RE_URL: OnceCell<Regex> = OnceCell::new();
    let re = RE_URL.get_or_init(|| {
        Regex::new(r"(?:https?|ftp)://[\w-]+(?:\.[\w-]+)+(?:[\w.,@?^=%&;:/~+#-]*[\w@?^=%&;/~+#-])?")
            .unwrap()
    });

    let m = re.find(text?)?;
    Some(html_escape::decode_html_entities(m.as_str()).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_url_wins_and_entities_decode() {
        let d = r#"<img src="https://img.example.se/a.jpg?w=1&amp;h=2" /> more at http://other.example.se/x"#;
        assert_eq!(
            extract_image_url(Some(d)).as_deref(),
            Some("https://img.example.se/a.jpg?w=1&h=2")
        );
    }

    #[test]
    fn ftp_and_trailing_punctuation() {
        assert_eq!(
            extract_image_url(Some("see ftp://files.example.org/p.png.")).as_deref(),
            Some("ftp://files.example.org/p.png")
        );
    }

    #[test]
    fn no_url_or_no_description_is_none() {
        assert!(extract_image_url(Some("plain text, no links")).is_none());
        assert!(extract_image_url(Some("http://localhost/x")).is_none());
        assert!(extract_image_url(None).is_none());
    }

    #[test]
    fn render_follows_order() {
        let mk = |id: &str| FeedItem {
            id: id.to_string(),
            title: None,
            author: None,
            description: None,
            link: None,
            published_at: None,
            source_link: format!("src-{id}"),
        };
        let c = vec![mk("a"), mk("b")];
        let out = render(&c, &[1, 0]);
        assert_eq!(out[0].source_item.id, "b");
        assert_eq!(out[0].source_link, "src-b");
        assert!(out[0].image_url.is_none());
    }
}
