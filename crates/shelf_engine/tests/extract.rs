use pretty_assertions::assert_eq;
use shelf_core::ArticleMetadata;
use shelf_engine::{
    FailureKind, FetchSettings, HtmlMetadataExtractor, MetadataSource, ReqwestFetcher,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn extractor() -> HtmlMetadataExtractor<ReqwestFetcher> {
    HtmlMetadataExtractor::new(ReqwestFetcher::new(FetchSettings::default()).expect("client"))
}

#[tokio::test]
async fn extracts_metadata_from_served_page() {
    let server = MockServer::start().await;
    let html = r#"<!doctype html><html><head>
        <title>Fallback title</title>
        <meta name="twitter:title" content="A post">
        <meta name="description" content="Plain description">
        <meta name="twitter:image" content="/cover.jpg">
    </head><body></body></html>"#;
    Mock::given(method("GET"))
        .and(path("/post"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html; charset=utf-8"))
        .mount(&server)
        .await;

    let meta = extractor()
        .extract(&format!("{}/post", server.uri()))
        .await
        .expect("extract ok");

    assert_eq!(
        meta,
        ArticleMetadata {
            title: Some("A post".into()),
            description: Some("Plain description".into()),
            image: Some(format!("{}/cover.jpg", server.uri())),
        }
    );
}

#[tokio::test]
async fn page_without_metadata_yields_all_absent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/bare"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<p>no head</p>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let meta = extractor()
        .extract(&format!("{}/bare", server.uri()))
        .await
        .expect("extract ok");
    assert_eq!(meta, ArticleMetadata::default());
}

#[tokio::test]
async fn error_kinds_are_distinguishable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/garbled"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"<p>\xff\xfd</p>".to_vec(), "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let gone = extractor()
        .extract(&format!("{}/gone", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(gone.kind, FailureKind::HttpStatus(410));

    let garbled = extractor()
        .extract(&format!("{}/garbled", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(garbled.kind, FailureKind::Markup);
}
