//! RSS/XML feed parsing into raw news records.

use quick_xml::events::Event;
use quick_xml::Reader;
use serde_json::{Map, Value};

use super::RawItem;
use crate::error::SentimentError;

/// Child elements of `<item>` copied into the raw record.
const ITEM_FIELDS: &[&str] = &["title", "link", "description", "pubDate", "source", "guid"];

/// Parse an RSS XML feed into raw news records.
///
/// Each `<item>` becomes a JSON object keyed by its child element names
/// (`title`, `link`, `description`, `pubDate`, `source`, `guid`). Text inside
/// nested tags in `<description>` is accumulated. Stops after `max_items`.
pub(crate) fn parse_rss_items(xml: &str, max_items: usize) -> Result<Vec<RawItem>, SentimentError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut items = Vec::new();
    let mut in_item = false;
    let mut in_description = false;
    let mut current_tag = String::new();
    let mut fields: Map<String, Value> = Map::new();
    let mut description = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("").to_string();
                if name == "item" {
                    in_item = true;
                    in_description = false;
                    fields.clear();
                    description.clear();
                } else if name == "description" && in_item {
                    in_description = true;
                }
                current_tag = name;
            }
            Ok(Event::End(e)) => {
                let name_buf = e.name().as_ref().to_vec();
                let name = std::str::from_utf8(&name_buf).unwrap_or("");
                if name == "description" {
                    in_description = false;
                }
                if name == "item" && in_item {
                    in_item = false;
                    if !description.is_empty() {
                        fields.insert(
                            "description".to_string(),
                            Value::String(std::mem::take(&mut description)),
                        );
                    }
                    if !fields.is_empty() {
                        items.push(Value::Object(std::mem::take(&mut fields)));
                        if items.len() >= max_items {
                            break;
                        }
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Text(e)) if in_item => {
                let text = e.unescape().unwrap_or_default().into_owned();
                capture(&mut fields, &mut description, &current_tag, in_description, text);
            }
            Ok(Event::CData(e)) if in_item => {
                let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                capture(&mut fields, &mut description, &current_tag, in_description, text);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(SentimentError::Xml(e)),
            _ => {}
        }
    }

    Ok(items)
}

fn capture(
    fields: &mut Map<String, Value>,
    description: &mut String,
    current_tag: &str,
    in_description: bool,
    text: String,
) {
    if in_description {
        // Accumulate all text nodes inside <description>, including those
        // emitted after nested tags like <b>.
        if !description.is_empty() {
            description.push(' ');
        }
        description.push_str(&text);
    } else if ITEM_FIELDS.contains(&current_tag) {
        fields.insert(current_tag.to_string(), Value::String(text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Google News</title>
    <item>
      <title>Nike Unveils New Running Line - Reuters</title>
      <link>https://example.com/nike-news-1</link>
      <guid isPermaLink="false">CBMi123</guid>
      <pubDate>Sat, 01 Mar 2025 10:00:00 GMT</pubDate>
      <description><![CDATA[<a href="https://example.com">Nike has a great new line</a>]]></description>
      <source url="https://reuters.com">Reuters</source>
    </item>
    <item>
      <title>Sportswear Market Growing</title>
      <link>https://example.com/market</link>
      <description>The sector is <b>expanding</b> rapidly.</description>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn parses_items_into_raw_records() {
        let items = parse_rss_items(SAMPLE_RSS, 10).expect("should parse valid RSS");
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "Nike Unveils New Running Line - Reuters");
        assert_eq!(items[0]["link"], "https://example.com/nike-news-1");
        assert_eq!(items[0]["guid"], "CBMi123");
        assert_eq!(items[0]["pubDate"], "Sat, 01 Mar 2025 10:00:00 GMT");
        assert_eq!(items[0]["source"], "Reuters");
        assert!(items[0]["description"]
            .as_str()
            .unwrap()
            .contains("great new line"));
    }

    #[test]
    fn accumulates_text_around_nested_description_tags() {
        let items = parse_rss_items(SAMPLE_RSS, 10).unwrap();
        assert_eq!(items[1]["description"], "The sector is expanding rapidly.");
        assert!(items[1].get("pubDate").is_none());
    }

    #[test]
    fn stops_at_max_items() {
        let items = parse_rss_items(SAMPLE_RSS, 1).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn channel_title_is_not_an_item_field() {
        let items = parse_rss_items(SAMPLE_RSS, 10).unwrap();
        assert!(items
            .iter()
            .all(|i| i["title"] != "Google News"));
    }

    #[test]
    fn empty_feed_returns_empty_vec() {
        let xml = r#"<?xml version="1.0"?><rss version="2.0"><channel></channel></rss>"#;
        let items = parse_rss_items(xml, 10).expect("should parse empty RSS");
        assert!(items.is_empty());
    }

    #[test]
    fn malformed_xml_is_handled() {
        let xml = "<rss><channel><item><title>Unclosed";
        // quick-xml reads until EOF so this may succeed; either outcome is fine
        // as long as no partial item is emitted.
        match parse_rss_items(xml, 10) {
            Ok(items) => assert!(items.is_empty()),
            Err(SentimentError::Xml(_)) => {}
            Err(e) => panic!("unexpected error type: {e}"),
        }
    }
}
