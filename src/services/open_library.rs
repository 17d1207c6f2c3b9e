//! External catalog lookup against the Open Library books API.
//!
//! Transport or decoding failures are reported as a miss: the caller treats
//! an unreachable catalog the same as an unknown ISBN and surfaces not-found.

use serde::Deserialize;

use crate::{
    config::OpenLibraryConfig,
    error::AppResult,
    models::book::BookPayload,
};

/// Book metadata as returned by the Open Library `data` view
#[derive(Debug, Clone, Deserialize)]
pub struct BookInfo {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    #[serde(default)]
    pub publishers: Vec<NamedEntry>,
    pub publish_date: Option<String>,
    pub number_of_pages: Option<i32>,
    #[serde(default)]
    pub authors: Vec<NamedEntry>,
    pub cover: Option<Cover>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cover {
    pub small: Option<String>,
    pub medium: Option<String>,
    pub large: Option<String>,
}

/// Pull the four-digit publication year out of a free-form date string
/// such as "May 1, 1997"
fn extract_year(publish_date: &str) -> Option<String> {
    let mut run = String::new();
    for c in publish_date.chars() {
        if c.is_ascii_digit() {
            run.push(c);
            if run.len() == 4 {
                return Some(run);
            }
        } else {
            run.clear();
        }
    }
    None
}

/// Decode one lookup response body into the metadata for `isbn`, if present
fn parse_response(body: &serde_json::Value, isbn: &str) -> Option<BookInfo> {
    let entry = body.get(format!("ISBN:{}", isbn))?;
    serde_json::from_value(entry.clone()).ok()
}

/// Map fetched metadata onto a book payload. Title, pages and a parseable
/// publication year are required; descriptive fields the catalog does not
/// carry fall back to placeholders so the record still validates.
fn payload_from_info(isbn: &str, info: &BookInfo) -> Option<BookPayload> {
    let title = info.title.clone().filter(|t| !t.is_empty())?;
    let pages = info.number_of_pages.filter(|p| *p > 0)?;
    let year = extract_year(info.publish_date.as_deref()?)?;

    let author = info
        .authors
        .first()
        .map(|a| a.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let publisher = info
        .publishers
        .first()
        .map(|p| p.name.clone())
        .unwrap_or_else(|| "Unknown".to_string());
    let image = info
        .cover
        .as_ref()
        .and_then(|c| c.medium.clone().or_else(|| c.large.clone()).or_else(|| c.small.clone()))
        .unwrap_or_else(|| format!("https://covers.openlibrary.org/b/isbn/{}-M.jpg", isbn));
    let subtitle = info.subtitle.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| "-".to_string());

    Some(BookPayload {
        id: None,
        genre: "Unknown".to_string(),
        author,
        image,
        title,
        subtitle,
        publisher,
        year,
        pages,
        isbn: isbn.to_string(),
    })
}

#[derive(Clone)]
pub struct OpenLibraryService {
    client: reqwest::Client,
    base_url: String,
}

impl OpenLibraryService {
    pub fn new(config: OpenLibraryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url,
        }
    }

    /// Look up a book by ISBN; `None` when the catalog does not know it or
    /// cannot be reached
    pub async fn lookup(&self, isbn: &str) -> AppResult<Option<BookPayload>> {
        let url = format!(
            "{}?bibkeys=ISBN:{}&format=json&jscmd=data",
            self.base_url, isbn
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("Open Library lookup failed for isbn {}: {}", isbn, e);
                return Ok(None);
            }
        };

        let body: serde_json::Value = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Open Library returned undecodable body for isbn {}: {}", isbn, e);
                return Ok(None);
            }
        };

        Ok(parse_response(&body, isbn).and_then(|info| payload_from_info(isbn, &info)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_body() -> serde_json::Value {
        json!({
            "ISBN:0-7475-3269-9": {
                "title": "Harry Potter and the Philosopher's Stone",
                "publishers": [{"name": "Bloomsbury"}],
                "publish_date": "June 26, 1997",
                "number_of_pages": 223,
                "authors": [{"name": "J. K. Rowling"}],
                "cover": {"medium": "https://covers.openlibrary.org/b/id/1-M.jpg"}
            }
        })
    }

    #[test]
    fn parses_keyed_response() {
        let info = parse_response(&sample_body(), "0-7475-3269-9").unwrap();
        assert_eq!(info.title.as_deref(), Some("Harry Potter and the Philosopher's Stone"));
        assert_eq!(info.number_of_pages, Some(223));
    }

    #[test]
    fn miss_when_key_absent() {
        assert!(parse_response(&sample_body(), "no-such-isbn").is_none());
    }

    #[test]
    fn builds_a_valid_payload_with_fallbacks() {
        let info = parse_response(&sample_body(), "0-7475-3269-9").unwrap();
        let payload = payload_from_info("0-7475-3269-9", &info).unwrap();
        assert_eq!(payload.year, "1997");
        assert_eq!(payload.publisher, "Bloomsbury");
        // Missing subtitle and genre fall back to placeholders
        assert_eq!(payload.subtitle, "-");
        assert_eq!(payload.genre, "Unknown");
        assert!(crate::models::book::Book::from_payload(&payload).is_ok());
    }

    #[test]
    fn incomplete_metadata_is_a_miss() {
        let body = json!({
            "ISBN:123": { "title": "No pages, no date" }
        });
        let info = parse_response(&body, "123").unwrap();
        assert!(payload_from_info("123", &info).is_none());
    }

    #[test]
    fn year_extraction() {
        assert_eq!(extract_year("May 1, 1988").as_deref(), Some("1988"));
        assert_eq!(extract_year("1997"), Some("1997".to_string()));
        assert_eq!(extract_year("n.d."), None);
    }
}
