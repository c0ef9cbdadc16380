//! The Paper homepage adapter.
//!
//! The homepage is an infinite-scroll feed: it is rendered and scrolled until
//! the document stops growing, then every headline on it is collected. There
//! is no second page. Articles are rendered too, and each is written to its
//! own file named after the headline.

use crate::crawler::{FetchTarget, ScrollPolicy};
use crate::output::OutputUnit;
use crate::sources::parse::{block_text, select_within, selector, trimmed_text};
use crate::sources::{AdapterKind, ContentLink, ContentRecord, ListItem, SourceAdapter, Unit};
use scraper::{ElementRef, Html};
use url::Url;

const MAX_TITLE_CHARS: usize = 50;
const ARTICLE_CONTAINER: &str =
    "main > div:nth-of-type(4) > div:nth-of-type(1) > div:nth-of-type(1) > div";

pub struct ThePaper {
    base_url: Url,
}

impl ThePaper {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }
}

/// Second `<div>` child of the article container
fn body_block(container: ElementRef<'_>) -> Option<ElementRef<'_>> {
    container
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "div")
        .nth(1)
}

impl SourceAdapter for ThePaper {
    fn kind(&self) -> AdapterKind {
        AdapterKind::ThePaper
    }

    fn list_target(&self, _unit: &Unit, page: u32) -> Option<FetchTarget> {
        (page == 1).then(|| FetchTarget::rendered(self.base_url.clone(), ScrollPolicy::UntilStable))
    }

    fn parse_list(&self, raw: &str, _page_url: &Url) -> Vec<ListItem> {
        let document = Html::parse_document(raw);
        let Some(link_selector) = selector("div.news_li > h2 > a") else {
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

    fn has_more(&self, _unit: &Unit, _page: u32, _items: &[ListItem]) -> bool {
        false
    }

    fn content_target(&self, url: Url) -> FetchTarget {
        FetchTarget::rendered(url, ScrollPolicy::None)
    }

    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord> {
        let document = Html::parse_document(raw);
        let container_selector = selector(ARTICLE_CONTAINER)?;

        // Sibling blocks (share bar, author card) match the same path; the
        // article is the one carrying the headline
        let (container, headline) = document
            .select(&container_selector)
            .find_map(|c| select_within(c, "h1").map(|h1| (c, h1)))?;
        let body = body_block(container)?;

        let title = Some(trimmed_text(headline))
            .filter(|t| !t.is_empty())
            .or_else(|| link.title.clone());

        Some(ContentRecord::new(block_text(body)).with_title(title))
    }

    fn output_unit(&self, _unit: &Unit, _link: &ContentLink, record: &ContentRecord) -> OutputUnit {
        OutputUnit::slug(record.title.as_deref().unwrap_or("article"), MAX_TITLE_CHARS)
    }

    fn needs_render(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::FetchMode;

    fn adapter() -> ThePaper {
        ThePaper::new(Url::parse("https://www.thepaper.cn/").unwrap())
    }

    fn link(title: Option<&str>) -> ContentLink {
        ContentLink {
            title: title.map(String::from),
            url: Url::parse("https://www.thepaper.cn/newsDetail_forward_1").unwrap(),
        }
    }

    fn article(headline: &str, body: &str) -> String {
        format!(
            r#"<html><body><main>
                <div>nav</div><div>banner</div><div>ticker</div>
                <div><div><div>
                  <div><span>share</span></div>
                  <div>
                    <h1>{}</h1>
                    <div class="meta">澎湃新闻记者</div>
                    <div class="body">{}</div>
                  </div>
                </div></div></div>
            </main></body></html>"#,
            headline, body
        )
    }

    #[test]
    fn test_homepage_scrolls_until_stable() {
        let target = adapter().list_target(&Unit::All, 1).unwrap();
        assert_eq!(target.url.as_str(), "https://www.thepaper.cn/");
        assert_eq!(target.mode, FetchMode::Rendered(ScrollPolicy::UntilStable));
        assert!(adapter().list_target(&Unit::All, 2).is_none());

        let content = adapter().content_target(link(None).url);
        assert_eq!(content.mode, FetchMode::Rendered(ScrollPolicy::None));
    }

    #[test]
    fn test_parse_list() {
        let html = r#"
            <div class="news_li"><h2><a href="newsDetail_forward_1">要闻一</a></h2></div>
            <div class="news_li"><h3><a href="newsDetail_forward_2">not a headline</a></h3></div>
            <div class="news_li"><h2><a href="https://www.thepaper.cn/newsDetail_forward_3"> 要闻三 </a></h2></div>
        "#;
        let page = Url::parse("https://www.thepaper.cn/").unwrap();
        let items = adapter().parse_list(html, &page);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].href, "newsDetail_forward_1");
        assert_eq!(items[1].title.as_deref(), Some("要闻三"));
        assert!(!adapter().has_more(&Unit::All, 1, &items));
    }

    #[test]
    fn test_parse_content_title_and_body() {
        let html = article("澎湃头条", "<p>第一段</p>\n<p>第二段</p>");
        let record = adapter().parse_content(&html, &link(Some("列表标题"))).unwrap();
        assert_eq!(record.title.as_deref(), Some("澎湃头条"));
        assert_eq!(record.body, "第一段\n第二段");
    }

    #[test]
    fn test_parse_content_missing_layout() {
        let html = "<html><body><main><div><h1>only</h1></div></main></body></html>";
        assert!(adapter().parse_content(html, &link(None)).is_none());
    }

    #[test]
    fn test_output_unit_truncates_title() {
        let long_title = "长".repeat(80);
        let record = ContentRecord::new("x").with_title(Some(long_title));
        let unit = adapter().output_unit(&Unit::All, &link(None), &record);
        assert_eq!(unit.file_name(), format!("{}.txt", "长".repeat(50)));

        let untitled = adapter().output_unit(&Unit::All, &link(None), &ContentRecord::new("x"));
        assert_eq!(untitled.file_name(), "article.txt");
    }
}
