//! Syndication document parsing: RSS 2.0, RSS 1.0 (RDF) and Atom.
//!
//! Every item comes out tagged with the link of the feed it was parsed from,
//! so attribution never has to be re-derived later.

use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use time::format_description::well_known::{Rfc2822, Rfc3339};
use time::OffsetDateTime;

use crate::error::FeedError;
use crate::ingest::types::{FeedItem, FetchedFeed};

// ---- RSS 2.0 ----

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

// The channel link is read by `rss_channel_link`: `<link>` and `<atom:link>`
// share a local name and cannot both land in one serde field.
#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    #[serde(rename = "@about")]
    about: Option<String>,
    guid: Option<TextNode>,
    title: Option<String>,
    link: Option<String>,
    description: Option<String>,
    author: Option<String>,
    // dc:creator
    creator: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    // dc:date
    date: Option<String>,
}

// ---- RSS 1.0 ----

#[derive(Debug, Deserialize)]
struct Rdf {
    channel: Option<RdfChannel>,
    #[serde(rename = "item", default)]
    item: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RdfChannel {
    link: Option<String>,
}

// ---- Atom ----

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(default)]
    link: Vec<LinkNode>,
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: Option<String>,
    title: Option<TextNode>,
    #[serde(default)]
    link: Vec<LinkNode>,
    summary: Option<TextNode>,
    content: Option<TextNode>,
    published: Option<String>,
    updated: Option<String>,
    #[serde(default)]
    author: Vec<AtomPerson>,
}

#[derive(Debug, Deserialize)]
struct AtomPerson {
    name: Option<String>,
}

// ---- shared nodes ----

#[derive(Debug, Default, Deserialize)]
struct LinkNode {
    #[serde(rename = "@href")]
    href: Option<String>,
    #[serde(rename = "@rel")]
    rel: Option<String>,
    #[serde(rename = "$text")]
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct TextNode {
    #[serde(rename = "$text")]
    value: Option<String>,
}

/// Parse a feed document of any supported flavour.
///
/// `fallback_link` is used as the feed link when the document carries none.
pub fn parse_feed(xml: &str, fallback_link: &str) -> Result<FetchedFeed, FeedError> {
    let xml = scrub_html_entities_for_xml(xml);
    let feed = match root_name(&xml)?.as_str() {
        "rss" => parse_rss(&xml, fallback_link)?,
        "RDF" => parse_rdf(&xml, fallback_link)?,
        "feed" => parse_atom(&xml, fallback_link)?,
        other => {
            return Err(FeedError::Parse(format!("unsupported feed root <{other}>")));
        }
    };
    Ok(feed)
}

fn parse_rss(xml: &str, fallback_link: &str) -> Result<FetchedFeed, FeedError> {
    let rss: Rss = from_str(xml).map_err(|e| FeedError::Parse(format!("rss: {e}")))?;
    let link = rss_channel_link(xml)?.unwrap_or_else(|| fallback_link.to_string());
    let items = collect_items(rss.channel.item, &link);
    Ok(FetchedFeed { link, items })
}

fn parse_rdf(xml: &str, fallback_link: &str) -> Result<FetchedFeed, FeedError> {
    let rdf: Rdf = from_str(xml).map_err(|e| FeedError::Parse(format!("rdf: {e}")))?;
    let link = non_empty(rdf.channel.and_then(|c| c.link))
        .unwrap_or_else(|| fallback_link.to_string());
    let items = collect_items(rdf.item, &link);
    Ok(FetchedFeed { link, items })
}

fn parse_atom(xml: &str, fallback_link: &str) -> Result<FetchedFeed, FeedError> {
    let feed: AtomFeed = from_str(xml).map_err(|e| FeedError::Parse(format!("atom: {e}")))?;
    let link = pick_link(&feed.link).unwrap_or_else(|| fallback_link.to_string());

    let total = feed.entry.len();
    let items: Vec<FeedItem> = feed
        .entry
        .into_iter()
        .filter_map(|e| atom_item(e, &link))
        .collect();
    log_dropped(total, items.len(), &link);
    Ok(FetchedFeed { link, items })
}

fn collect_items(raw: Vec<RssItem>, feed_link: &str) -> Vec<FeedItem> {
    let total = raw.len();
    let items: Vec<FeedItem> = raw
        .into_iter()
        .filter_map(|it| rss_item(it, feed_link))
        .collect();
    log_dropped(total, items.len(), feed_link);
    items
}

fn log_dropped(total: usize, kept: usize, feed_link: &str) {
    if kept < total {
        tracing::debug!(
            feed = feed_link,
            dropped = total - kept,
            "items without a usable id dropped"
        );
    }
}

fn rss_item(it: RssItem, feed_link: &str) -> Option<FeedItem> {
    let link = non_empty(it.link);
    let id = it
        .guid
        .and_then(|g| non_empty(g.value))
        .or_else(|| link.clone())
        .or_else(|| non_empty(it.about))?;

    Some(FeedItem {
        id,
        title: non_empty(it.title),
        author: non_empty(it.author).or_else(|| non_empty(it.creator)),
        description: non_empty(it.description),
        link,
        published_at: it
            .pub_date
            .as_deref()
            .or(it.date.as_deref())
            .and_then(parse_timestamp),
        source_link: feed_link.to_string(),
    })
}

fn atom_item(e: AtomEntry, feed_link: &str) -> Option<FeedItem> {
    let link = pick_href(&e.link);
    let id = non_empty(e.id).or_else(|| link.clone())?;

    let author = e
        .author
        .into_iter()
        .find_map(|p| non_empty(p.name));
    let description = e
        .summary
        .and_then(|s| non_empty(s.value))
        .or_else(|| e.content.and_then(|c| non_empty(c.value)));

    Some(FeedItem {
        id,
        title: e.title.and_then(|t| non_empty(t.value)),
        author,
        description,
        link,
        published_at: e
            .published
            .as_deref()
            .or(e.updated.as_deref())
            .and_then(parse_timestamp),
        source_link: feed_link.to_string(),
    })
}

/// Channel link: text of a plain `<link>` first, then an alternate `href`.
fn pick_link(nodes: &[LinkNode]) -> Option<String> {
    nodes
        .iter()
        .find_map(|n| non_empty(n.text.clone()))
        .or_else(|| pick_href(nodes))
}

fn pick_href(nodes: &[LinkNode]) -> Option<String> {
    nodes
        .iter()
        .filter(|n| matches!(n.rel.as_deref(), None | Some("alternate")))
        .find_map(|n| non_empty(n.href.clone()))
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// RFC 2822 (`pubDate`) first, then RFC 3339 (`dc:date`, Atom). Unparsable → `None`.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    let ts = ts.trim();
    let parsed = OffsetDateTime::parse(ts, &Rfc2822)
        .or_else(|_| OffsetDateTime::parse(ts, &Rfc3339))
        .ok()?;
    DateTime::from_timestamp(parsed.unix_timestamp(), parsed.nanosecond())
}

/// Direct `<channel>` child `<link>` text; an `<atom:link>` alternate `href`
/// when the plain link is missing or empty.
fn rss_channel_link(xml: &str) -> Result<Option<String>, FeedError> {
    let mut reader = Reader::from_str(xml);
    let mut depth = 0usize;
    let mut in_channel = false;
    let mut alternate: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                let is_link = e.local_name().as_ref() == b"link";
                if depth == 2 && e.local_name().as_ref() == b"channel" {
                    in_channel = true;
                } else if in_channel && depth == 3 && is_link {
                    if e.name().prefix().is_none() {
                        let end = e.to_end().into_owned();
                        let text = reader
                            .read_text(end.name())
                            .map_err(|err| FeedError::Parse(format!("rss channel link: {err}")))?;
                        // read_text consumed the closing tag
                        depth -= 1;
                        if let Some(link) = non_empty(Some(text.into_owned())) {
                            return Ok(Some(link));
                        }
                    } else if alternate.is_none() {
                        alternate = alternate_href(&e);
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if in_channel
                    && depth == 2
                    && e.local_name().as_ref() == b"link"
                    && alternate.is_none()
                {
                    alternate = alternate_href(&e);
                }
            }
            Ok(Event::End(_)) => {
                if in_channel && depth == 2 {
                    in_channel = false;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => return Ok(alternate),
            Ok(_) => continue,
            Err(e) => return Err(FeedError::Parse(e.to_string())),
        }
    }
}

fn alternate_href(e: &BytesStart<'_>) -> Option<String> {
    let rel = e
        .try_get_attribute("rel")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    if !matches!(rel.as_deref(), None | Some("alternate")) {
        return None;
    }
    let href = e
        .try_get_attribute("href")
        .ok()
        .flatten()
        .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
    non_empty(href)
}

fn root_name(xml: &str) -> Result<String, FeedError> {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                return Ok(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Eof) => return Err(FeedError::Parse("empty document".to_string())),
            Ok(_) => continue,
            Err(e) => return Err(FeedError::Parse(e.to_string())),
        }
    }
}

// HTML entities that XML does not define; feeds leak them into descriptions.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&hellip;", "...")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
}
