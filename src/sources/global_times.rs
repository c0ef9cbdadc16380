//! Global Times column adapter.
//!
//! Column lists and articles are both rendered pages. Article text is laid
//! out as bare text runs separated by `<br>` inside the article body, so the
//! extractor collects the text that follows each line break.

use crate::crawler::{FetchTarget, ScrollPolicy};
use crate::output::OutputUnit;
use crate::sources::parse::{select_first, selector, trimmed_text};
use crate::sources::{AdapterKind, ContentLink, ContentRecord, ListItem, SourceAdapter, Unit};
use scraper::{Html, Node};
use url::Url;

pub struct GlobalTimes {
    base_url: Url,
}

impl GlobalTimes {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    fn column_url(&self, column: &str, page: u32) -> Option<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let mut url = Url::parse(&format!("{}/{}", base, column)).ok()?;
        if page > 1 {
            url.query_pairs_mut().append_pair("page", &page.to_string());
        }
        Some(url)
    }
}

impl SourceAdapter for GlobalTimes {
    fn kind(&self) -> AdapterKind {
        AdapterKind::GlobalTimes
    }

    fn list_target(&self, unit: &Unit, page: u32) -> Option<FetchTarget> {
        let Unit::Named(column) = unit else {
            return None;
        };
        let url = self.column_url(column, page)?;
        Some(FetchTarget::rendered(url, ScrollPolicy::None))
    }

    fn parse_list(&self, raw: &str, _page_url: &Url) -> Vec<ListItem> {
        let document = Html::parse_document(raw);
        let Some(link_selector) = selector("div.level01_list div.list_info > a") else {
            return Vec::new();
        };

        document
            .select(&link_selector)
            .map(|link| {
                let href = link.value().attr("href").unwrap_or_default();
                ListItem::new(Some(trimmed_text(link)), href)
            })
            .collect()
    }

    fn content_target(&self, url: Url) -> FetchTarget {
        FetchTarget::rendered(url, ScrollPolicy::None)
    }

    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord> {
        let document = Html::parse_document(raw);
        let body = select_first(
            &document,
            "div.article_page div.article_content div.article_right",
        )?;

        let mut lines = Vec::new();
        let mut after_break = false;
        for child in body.children() {
            match child.value() {
                Node::Element(element) => after_break = element.name() == "br",
                Node::Text(text) => {
                    if after_break {
                        let line = text.trim();
                        if !line.is_empty() {
                            lines.push(line.to_string());
                        }
                    }
                    after_break = false;
                }
                _ => {}
            }
        }

        Some(ContentRecord::new(lines.join("\n")).with_title(link.title.clone()))
    }

    fn output_unit(&self, unit: &Unit, _link: &ContentLink, _record: &ContentRecord) -> OutputUnit {
        OutputUnit::new(&format!("{}_news", unit))
    }

    fn needs_render(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchMode;

    fn adapter() -> GlobalTimes {
        GlobalTimes::new(Url::parse("https://www.globaltimes.cn/china").unwrap())
    }

    fn link() -> ContentLink {
        ContentLink {
            title: Some("Carrier drills".to_string()),
            url: Url::parse("https://www.globaltimes.cn/page/202401/1.shtml").unwrap(),
        }
    }

    #[test]
    fn test_list_target_per_page() {
        let column = Unit::Named("military".to_string());
        let first = adapter().list_target(&column, 1).unwrap();
        assert_eq!(first.url.as_str(), "https://www.globaltimes.cn/china/military");
        assert_eq!(first.mode, FetchMode::Rendered(ScrollPolicy::None));

        let third = adapter().list_target(&column, 3).unwrap();
        assert_eq!(
            third.url.as_str(),
            "https://www.globaltimes.cn/china/military?page=3"
        );

        assert!(adapter().list_target(&Unit::All, 1).is_none());
    }

    #[test]
    fn test_parse_list() {
        let html = r#"
            <div class="level01_list">
              <div class="list_info"><a href="https://www.globaltimes.cn/page/1.shtml"> First </a></div>
              <div class="list_info"><span>no link</span></div>
              <div class="list_info"><a href="/page/2.shtml">Second</a></div>
            </div>
            <div class="list_info"><a href="/page/3.shtml">Outside list</a></div>
        "#;
        let page = Url::parse("https://www.globaltimes.cn/china/military").unwrap();
        let items = adapter().parse_list(html, &page);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title.as_deref(), Some("First"));
        assert_eq!(items[1].href, "/page/2.shtml");
    }

    #[test]
    fn test_parse_list_missing_block_is_empty() {
        let page = Url::parse("https://www.globaltimes.cn/china/military").unwrap();
        assert!(adapter().parse_list("<html><body></body></html>", &page).is_empty());
        assert!(!adapter().has_more(&Unit::Named("military".to_string()), 1, &[]));
    }

    #[test]
    fn test_parse_content_reads_text_after_breaks() {
        let html = r#"
            <div class="article_page"><div class="article_content"><div class="article_right">
              Lead-in without break
              <br>First paragraph.
              <br>
              <br> Second paragraph. <span>inline</span>
            </div></div></div>
        "#;
        let record = adapter().parse_content(html, &link()).unwrap();
        assert_eq!(record.body, "First paragraph.\nSecond paragraph.");
        assert_eq!(record.title.as_deref(), Some("Carrier drills"));
    }

    #[test]
    fn test_parse_content_missing_container() {
        let html = r#"<div class="article_page"><p>teaser</p></div>"#;
        assert!(adapter().parse_content(html, &link()).is_none());
    }

    #[test]
    fn test_output_unit_per_column() {
        let unit = adapter().output_unit(
            &Unit::Named("science".to_string()),
            &link(),
            &ContentRecord::new("x"),
        );
        assert_eq!(unit.file_name(), "science_news.txt");
    }
}
