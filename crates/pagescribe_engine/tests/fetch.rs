use std::time::Duration;

use pagescribe_engine::{FailureKind, FetchSettings, HttpPageSource, PageSource};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HTML: &str = "text/html; charset=utf-8";

#[tokio::test]
async fn loads_html_with_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<html>ok</html>", HTML))
        .mount(&server)
        .await;

    let source = HttpPageSource::new(FetchSettings::default());
    let url = format!("{}/doc", server.uri());
    let page = source.load(&url).await.expect("load ok");

    assert_eq!(page.status, 200);
    assert!(page.is_success());
    assert_eq!(page.html, "<html>ok</html>");
    assert_eq!(page.metadata.original_url, url);
    assert_eq!(page.metadata.final_url, url);
    assert_eq!(page.metadata.redirect_count, 0);
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429).set_body_raw("slow down", "text/plain"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let source = HttpPageSource::new(FetchSettings::default());
    let busy = source
        .load(&format!("{}/busy", server.uri()))
        .await
        .expect("429 is a page");
    assert_eq!(busy.status, 429);
    assert_eq!(busy.html, "slow down");

    let broken = source
        .load(&format!("{}/broken", server.uri()))
        .await
        .expect("500 is a page");
    assert_eq!(broken.status, 500);
    assert!(!broken.is_success());
}

#[tokio::test]
async fn follows_redirects_and_counts_them() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", format!("{}/new", server.uri())),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>moved</p>", HTML))
        .mount(&server)
        .await;

    let source = HttpPageSource::new(FetchSettings::default());
    let page = source.load(&format!("{}/old", server.uri())).await.unwrap();
    assert_eq!(page.metadata.final_url, format!("{}/new", server.uri()));
    assert_eq!(page.metadata.redirect_count, 1);
}

#[tokio::test]
async fn rejects_non_html_documents() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF", "application/pdf"))
        .mount(&server)
        .await;

    let source = HttpPageSource::new(FetchSettings::default());
    let err = source
        .load(&format!("{}/file.pdf", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(
        err.kind,
        FailureKind::UnsupportedContentType { .. }
    ));
}

#[tokio::test]
async fn enforces_size_limit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/big"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("x".repeat(64), HTML))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 16,
        ..FetchSettings::default()
    };
    let source = HttpPageSource::new(settings);
    let err = source
        .load(&format!("{}/big", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 16, .. }));
}

#[tokio::test]
async fn slow_responses_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>late</p>", HTML)
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let source = HttpPageSource::new(settings);
    let err = source
        .load(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn invalid_url_is_classified() {
    let source = HttpPageSource::new(FetchSettings::default());
    let err = source.load("not a url").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}
