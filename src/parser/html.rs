// file: src/parser/html.rs
// description: article field extraction from news html pages
// reference: https://docs.rs/regex

use crate::error::{NewsError, Result};
use crate::models::Article;
use crate::parser::date::parse_timestamp;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref HTML_TAG: Regex = Regex::new(r"(?is)<html[\s>]").expect("HTML_TAG regex is valid");

    static ref HEAD: Regex =
        Regex::new(r"(?is)<head(?:\s[^>]*)?>(.*?)</head>").expect("HEAD regex is valid");

    static ref BODY: Regex =
        Regex::new(r"(?is)<body(?:\s[^>]*)?>(.*?)</body>").expect("BODY regex is valid");

    static ref ARTICLE: Regex =
        Regex::new(r"(?is)<article(?:\s[^>]*)?>(.*?)</article>").expect("ARTICLE regex is valid");

    static ref META: Regex = Regex::new(r"(?is)<meta\b([^>]*)>").expect("META regex is valid");

    static ref ATTRIBUTE: Regex = Regex::new(
        r#"(?is)([a-z_:\-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#
    ).expect("ATTRIBUTE regex is valid");

    static ref PARAGRAPH: Regex =
        Regex::new(r"(?is)<p(?:\s[^>]*)?>(.*?)</p>").expect("PARAGRAPH regex is valid");

    static ref AUTHOR_LINK: Regex = Regex::new(
        r#"(?is)<a\b[^>]*\brel\s*=\s*["']author["'][^>]*>(.*?)</a>"#
    ).expect("AUTHOR_LINK regex is valid");

    static ref TIME_DATETIME: Regex = Regex::new(
        r#"(?is)<time\b[^>]*\bdatetime\s*=\s*["']([^"']+)["']"#
    ).expect("TIME_DATETIME regex is valid");

    static ref TITLE: Regex =
        Regex::new(r"(?is)<title(?:\s[^>]*)?>(.*?)</title>").expect("TITLE regex is valid");

    static ref TAG: Regex = Regex::new(r"(?s)<[^>]*>").expect("TAG regex is valid");

    static ref NUMERIC_ENTITY: Regex =
        Regex::new(r"&#([xX]?)([0-9a-fA-F]+);").expect("NUMERIC_ENTITY regex is valid");

    static ref WHITESPACE: Regex = Regex::new(r"\s+").expect("WHITESPACE regex is valid");
}

pub struct HtmlExtractor;

impl HtmlExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, name: &str, html: &str) -> Result<Article> {
        if !HTML_TAG.is_match(html) {
            return Err(NewsError::malformed(name, "missing <html> element"));
        }

        let head = capture_inner(&HEAD, html)
            .ok_or_else(|| NewsError::malformed(name, "missing <head> element"))?;

        let meta = parse_meta(head);
        if meta.is_empty() {
            return Err(NewsError::malformed(name, "no <meta> tags in <head>"));
        }

        let body = capture_inner(&BODY, html)
            .ok_or_else(|| NewsError::malformed(name, "missing <body> element"))?;

        let article_html = capture_inner(&ARTICLE, body)
            .ok_or_else(|| NewsError::malformed(name, "missing <article> element"))?;

        let title = meta
            .get("og:title")
            .cloned()
            .or_else(|| capture_inner(&TITLE, head).map(clean_text))
            .unwrap_or_default();

        let published_at = meta
            .get("article:published_time")
            .and_then(|value| parse_timestamp(value))
            .or_else(|| {
                TIME_DATETIME
                    .captures(article_html)
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| parse_timestamp(m.as_str()))
            });

        let author = AUTHOR_LINK
            .captures(article_html)
            .and_then(|caps| caps.get(1))
            .map(|m| clean_text(m.as_str()))
            .filter(|author| !author.is_empty());

        Ok(Article {
            url: meta.get("og:url").cloned().unwrap_or_default(),
            site_name: meta.get("og:site_name").cloned().unwrap_or_default(),
            title,
            description: meta.get("og:description").cloned().unwrap_or_default(),
            text: article_text(article_html),
            author,
            published_at,
        })
    }
}

impl Default for HtmlExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn capture_inner<'a>(pattern: &Regex, haystack: &'a str) -> Option<&'a str> {
    pattern
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Maps `property`/`name` to `content` for every meta tag. First occurrence wins.
fn parse_meta(head: &str) -> HashMap<String, String> {
    let mut meta = HashMap::new();

    for tag in META.captures_iter(head) {
        let attributes: HashMap<String, String> = ATTRIBUTE
            .captures_iter(&tag[1])
            .map(|caps| {
                let value = caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or_default();
                (caps[1].to_ascii_lowercase(), decode_entities(value))
            })
            .collect();

        let key = attributes
            .get("property")
            .or_else(|| attributes.get("name"));

        if let (Some(key), Some(content)) = (key, attributes.get("content")) {
            meta.entry(key.to_ascii_lowercase())
                .or_insert_with(|| content.trim().to_string());
        }
    }

    meta
}

fn article_text(article_html: &str) -> String {
    let paragraphs: Vec<String> = PARAGRAPH
        .captures_iter(article_html)
        .map(|caps| clean_text(&caps[1]))
        .filter(|p| !p.is_empty())
        .collect();

    if paragraphs.is_empty() {
        clean_text(article_html)
    } else {
        paragraphs.join("\n")
    }
}

fn clean_text(fragment: &str) -> String {
    let stripped = TAG.replace_all(fragment, " ");
    let decoded = decode_entities(&stripped);
    WHITESPACE.replace_all(decoded.trim(), " ").into_owned()
}

fn decode_entities(text: &str) -> String {
    let numeric = NUMERIC_ENTITY.replace_all(text, |caps: &Captures| {
        let radix = if caps[1].is_empty() { 10 } else { 16 };
        u32::from_str_radix(&caps[2], radix)
            .ok()
            .and_then(char::from_u32)
            .map(String::from)
            .unwrap_or_else(|| caps[0].to_string())
    });

    numeric
        .replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <meta charset="utf-8"/>
    <meta property="og:url" content="https://www.example.com/news/final"/>
    <meta property="og:site_name" content="Example News"/>
    <meta property="article:published_time" content="2020-05-01T12:00:00+03:00"/>
    <meta property="og:title" content="Cup final ends in a draw"/>
    <meta property="og:description" content="Both teams scored &amp; the coach resigned."/>
  </head>
  <body>
    <article>
      <h1>Cup final ends in a draw</h1>
      <address><time datetime="2020-05-01T10:00:00+00:00">May 1</time> by <a rel="author">Jane Roe</a></address>
      <p>The <b>match</b> finished 1:1.</p>
      <p>Fans   left the stadium&nbsp;early.</p>
    </article>
  </body>
</html>"#;

    #[test]
    fn test_extracts_meta_and_text() {
        let article = HtmlExtractor::new().extract("final.html", PAGE).unwrap();

        assert_eq!(article.url, "https://www.example.com/news/final");
        assert_eq!(article.site_name, "Example News");
        assert_eq!(article.title, "Cup final ends in a draw");
        assert_eq!(article.description, "Both teams scored & the coach resigned.");
        assert_eq!(article.published_at, Some(1_588_323_600));
        assert_eq!(article.author.as_deref(), Some("Jane Roe"));
        assert_eq!(
            article.text,
            "The match finished 1:1.\nFans left the stadium early."
        );
    }

    #[test]
    fn test_falls_back_to_time_element() {
        let page = PAGE.replace(
            r#"<meta property="article:published_time" content="2020-05-01T12:00:00+03:00"/>"#,
            "",
        );
        let article = HtmlExtractor::new().extract("final.html", &page).unwrap();
        assert_eq!(article.published_at, Some(1_588_327_200));
    }

    #[test]
    fn test_rejects_missing_article() {
        let page = "<html><head><meta property=\"og:title\" content=\"x\"></head><body><div>x</div></body></html>";
        let err = HtmlExtractor::new().extract("x.html", page).unwrap_err();
        assert!(matches!(err, NewsError::MalformedInput { .. }));
    }

    #[test]
    fn test_rejects_non_html() {
        let err = HtmlExtractor::new().extract("x.html", "plain text").unwrap_err();
        assert!(err.to_string().contains("<html>"));
    }

    #[test]
    fn test_decodes_numeric_entities() {
        assert_eq!(decode_entities("caf&#233; &#x41;"), "café A");
    }
}
