//! Southern Weekly (infzm) term adapter.
//!
//! List pages come from a JSON endpoint paginated by `term_id` and `page`;
//! articles are static HTML at `{base}/{id}`.

use crate::crawler::FetchTarget;
use crate::output::OutputUnit;
use crate::sources::parse::{select_first, select_within, selector, element_text};
use crate::sources::{AdapterKind, ContentLink, ContentRecord, ListItem, SourceAdapter, Unit};
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

#[derive(Debug, Deserialize)]
struct ListResponse {
    data: ListData,
}

#[derive(Debug, Deserialize)]
struct ListData {
    #[serde(default)]
    contents: Vec<ListEntry>,
}

#[derive(Debug, Deserialize)]
struct ListEntry {
    #[serde(default)]
    id: Value,
    #[serde(default)]
    subject: Option<String>,
}

pub struct SouthernWeekly {
    base_url: Url,
}

impl SouthernWeekly {
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    fn article_href(&self, id: &Value) -> String {
        let id = match id {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s.trim().to_string(),
            _ => String::new(),
        };
        if id.is_empty() {
            // Discarded by the coordinator before any fetch
            return String::new();
        }
        format!("{}/{}", self.base_url.as_str().trim_end_matches('/'), id)
    }
}

impl SourceAdapter for SouthernWeekly {
    fn kind(&self) -> AdapterKind {
        AdapterKind::SouthernWeekly
    }

    fn list_target(&self, unit: &Unit, page: u32) -> Option<FetchTarget> {
        let Unit::Named(term_id) = unit else {
            return None;
        };
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("term_id", term_id)
            .append_pair("page", &page.to_string())
            .append_pair("format", "json");
        Some(FetchTarget::http(url))
    }

    fn parse_list(&self, raw: &str, page_url: &Url) -> Vec<ListItem> {
        match serde_json::from_str::<ListResponse>(raw) {
            Ok(response) => response
                .data
                .contents
                .iter()
                .map(|entry| ListItem::new(entry.subject.clone(), self.article_href(&entry.id)))
                .collect(),
            Err(e) => {
                tracing::warn!("Unreadable term list at {}: {}", page_url, e);
                Vec::new()
            }
        }
    }

    fn parse_content(&self, raw: &str, link: &ContentLink) -> Option<ContentRecord> {
        let document = Html::parse_document(raw);
        let content = select_first(&document, "div.nfzm-content__content")?;

        let lead = select_within(content, "blockquote.nfzm-bq").map(element_text);
        let paragraphs: Vec<String> = match (
            select_within(content, "div.nfzm-content__fulltext"),
            selector("p"),
        ) {
            (Some(fulltext), Some(p)) => fulltext
                .select(&p)
                .map(element_text)
                .filter(|text| !text.trim().is_empty())
                .collect(),
            _ => Vec::new(),
        };

        let mut body = match lead {
            Some(lead) => format!("{}\n", lead),
            None => String::new(),
        };
        body.push_str(&paragraphs.join("\n"));

        Some(ContentRecord::new(body).with_title(link.title.clone()))
    }

    fn output_unit(&self, unit: &Unit, _link: &ContentLink, _record: &ContentRecord) -> OutputUnit {
        OutputUnit::new(&format!("term_{}", unit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> SouthernWeekly {
        SouthernWeekly::new(Url::parse("http://www.infzm.com/contents").unwrap())
    }

    fn page_url() -> Url {
        Url::parse("http://www.infzm.com/contents?term_id=2&page=1&format=json").unwrap()
    }

    #[test]
    fn test_list_target_query() {
        let target = adapter()
            .list_target(&Unit::Named("2".to_string()), 4)
            .unwrap();
        assert_eq!(
            target.url.as_str(),
            "http://www.infzm.com/contents?term_id=2&page=4&format=json"
        );
        assert!(adapter().list_target(&Unit::Year(2015), 1).is_none());
    }

    #[test]
    fn test_parse_list_reads_ids_and_subjects() {
        let raw = r#"{"code":200,"data":{"contents":[
            {"id":123,"subject":"长江观察","publish_time":"2024-01-01"},
            {"id":"456","subject":"  "},
            {"subject":"no id"}
        ]}}"#;
        let items = adapter().parse_list(raw, &page_url());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].href, "http://www.infzm.com/contents/123");
        assert_eq!(items[0].title.as_deref(), Some("长江观察"));
        assert_eq!(items[1].href, "http://www.infzm.com/contents/456");
        assert_eq!(items[1].title, None);
        assert_eq!(items[2].href, "");
    }

    #[test]
    fn test_parse_list_empty_contents_stops() {
        let raw = r#"{"data":{"contents":[]}}"#;
        let items = adapter().parse_list(raw, &page_url());
        assert!(items.is_empty());
        assert!(!adapter().has_more(&Unit::Named("2".to_string()), 3, &items));
    }

    #[test]
    fn test_parse_list_malformed_is_empty() {
        assert!(adapter().parse_list("<html>blocked</html>", &page_url()).is_empty());
        assert!(adapter().parse_list(r#"{"msg":"x"}"#, &page_url()).is_empty());
    }

    #[test]
    fn test_parse_content_lead_and_paragraphs() {
        let html = r#"
            <div class="nfzm-content__content">
              <blockquote class="nfzm-bq">导语</blockquote>
              <div class="nfzm-content__fulltext">
                <p>第一段</p><p>  </p><p>第二段</p>
              </div>
            </div>
        "#;
        let link = ContentLink {
            title: Some("长江观察".to_string()),
            url: Url::parse("http://www.infzm.com/contents/123").unwrap(),
        };
        let record = adapter().parse_content(html, &link).unwrap();
        assert_eq!(record.body, "导语\n第一段\n第二段");
        assert_eq!(record.title.as_deref(), Some("长江观察"));
    }

    #[test]
    fn test_parse_content_missing_container() {
        let link = ContentLink {
            title: None,
            url: Url::parse("http://www.infzm.com/contents/123").unwrap(),
        };
        assert!(adapter()
            .parse_content("<div class='paywall'>登录</div>", &link)
            .is_none());
    }

    #[test]
    fn test_output_unit_per_term() {
        let link = ContentLink {
            title: None,
            url: Url::parse("http://www.infzm.com/contents/123").unwrap(),
        };
        let unit = adapter().output_unit(
            &Unit::Named("7".to_string()),
            &link,
            &ContentRecord::new("x"),
        );
        assert_eq!(unit.file_name(), "term_7.txt");
    }
}
