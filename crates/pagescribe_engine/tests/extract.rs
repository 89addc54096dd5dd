use std::sync::Arc;

use engine_logging::{Level, MemorySink};
use pagescribe_core::ContentFormat;
use pagescribe_engine::{
    ConvertError, Converter, ExtractError, Html2MdConverter, PageExtractor,
};
use pretty_assertions::assert_eq;

struct FailingConverter;

impl Converter for FailingConverter {
    fn to_markdown(&self, _html: &str) -> Result<String, ConvertError> {
        Err(ConvertError::Failed("unsupported markup".to_string()))
    }
}

fn html2md() -> PageExtractor {
    PageExtractor::new(Arc::new(Html2MdConverter))
}

#[test]
fn converts_body_to_markdown_without_scripts() {
    let html = r#"<html><head><title>T</title><style>p{}</style></head>
        <body><h1>Heading</h1><p>Some <strong>bold</strong> text.</p>
        <script>var tracker = 1;</script></body></html>"#;
    let log = MemorySink::new();

    let page = html2md().extract(html, &log).unwrap();
    assert_eq!(page.format, ContentFormat::Markdown);
    assert!(page.content.contains("Heading"));
    assert!(page.content.contains("**bold**"));
    assert!(!page.content.contains("tracker"));
}

#[test]
fn failed_conversion_falls_back_to_visible_text() {
    let html = r#"<html><body>
        <div>First paragraph</div>
        <script>secretTracker()</script>
        <p style="display: none">hidden copy</p>
        <p aria-hidden="true">decoration</p>
        <p>Second paragraph</p>
        </body></html>"#;
    let log = MemorySink::new();
    let extractor = PageExtractor::new(Arc::new(FailingConverter));

    let page = extractor.extract(html, &log).unwrap();
    assert_eq!(page.format, ContentFormat::Text);
    assert!(page
        .content
        .starts_with("**Note: Markdown conversion failed, falling back to plain text**"));
    assert!(page.content.contains("unsupported markup"));
    assert!(page.content.ends_with("First paragraph\nSecond paragraph"));
    assert!(!page.content.contains("secretTracker"));
    assert!(!page.content.contains("hidden copy"));
    assert!(!page.content.contains("decoration"));

    let errors = log.messages_at(Level::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("markdown conversion failed"));
}

#[test]
fn nothing_visible_after_failed_conversion_is_an_error() {
    let html = r#"<html><body><div hidden>gone</div><img src="a.png"></body></html>"#;
    let extractor = PageExtractor::new(Arc::new(FailingConverter));
    let err = extractor.extract(html, &MemorySink::new()).unwrap_err();
    assert!(matches!(err, ExtractError::NothingVisible { .. }));
}

#[test]
fn challenge_page_is_detected() {
    let html = r#"<html><body><form id="challenge-form"><input></form></body></html>"#;
    let err = html2md().extract(html, &MemorySink::new()).unwrap_err();
    assert_eq!(err, ExtractError::ChallengeDetected);
}

#[test]
fn empty_body_is_reported() {
    let html = "<html><body>  <script>only()</script> </body></html>";
    let err = html2md().extract(html, &MemorySink::new()).unwrap_err();
    assert_eq!(err, ExtractError::EmptyDocument);
}
