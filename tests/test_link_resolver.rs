use dinner_decider::config::FetchConfig;
use dinner_decider::fetchers::RequestFetcher;
use dinner_decider::{LinkResolver, ResolveOutcome};

// mockito listens on 127.0.0.1, which stands in for the share-link host
fn resolver() -> LinkResolver {
    let fetcher = RequestFetcher::from_config(&FetchConfig::default()).unwrap();
    LinkResolver::new(fetcher, vec!["127.0.0.1".to_string()])
}

#[tokio::test]
async fn test_short_link_resolves_to_json_ld_url() {
    let mut server = mockito::Server::new_async().await;
    let _short = server
        .mock("GET", "/abc")
        .with_status(302)
        .with_header("location", "/pin/123")
        .create_async()
        .await;
    let pin_page = format!(
        r#"<html><head>
        <script type="application/ld+json">{{"@type": "WebPage", "url": "{}/pin/123"}}</script>
        <script type="application/ld+json">{{"@type": "CreativeWork", "url": "https://www.seriouseats.com/chili"}}</script>
        </head></html>"#,
        server.url()
    );
    let _pin = server
        .mock("GET", "/pin/123")
        .with_status(200)
        .with_body(pin_page)
        .create_async()
        .await;

    let outcome = resolver().resolve(&format!("{}/abc", server.url())).await;
    match outcome {
        ResolveOutcome::Canonical(url) => assert_eq!(url, "https://www.seriouseats.com/chili"),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_short_link_falls_back_to_meta_tag() {
    let mut server = mockito::Server::new_async().await;
    let _m = server
        .mock("GET", "/meta")
        .with_status(200)
        .with_body(
            r#"<html><head>
            <meta property="og:see_also" content="/relative/link">
            <meta property="pinterestapp:source" content="https://cooking.example.org/lasagna">
            </head></html>"#,
        )
        .create_async()
        .await;

    let outcome = resolver().resolve(&format!("{}/meta", server.url())).await;
    assert!(matches!(outcome, ResolveOutcome::AlternateLink(_)));
    assert_eq!(outcome.effective_url(), "https://cooking.example.org/lasagna");
}

#[tokio::test]
async fn test_short_link_without_metadata_uses_redirect_target() {
    let mut server = mockito::Server::new_async().await;
    let _short = server
        .mock("GET", "/xyz")
        .with_status(301)
        .with_header("location", "/landing")
        .create_async()
        .await;
    let _landing = server
        .mock("GET", "/landing")
        .with_status(200)
        .with_body("<html><body>Just a page</body></html>")
        .create_async()
        .await;

    let url = resolver().resolve_url(&format!("{}/xyz", server.url())).await;
    assert_eq!(url, format!("{}/landing", server.url()));
}

#[tokio::test]
async fn test_unreachable_short_link_is_returned_unchanged() {
    // Nothing listens on port 1
    let url = "http://127.0.0.1:1/abc";
    let outcome = resolver().resolve(url).await;

    assert!(matches!(outcome, ResolveOutcome::Failed { .. }));
    assert_eq!(outcome.into_effective_url(), url);
}

#[tokio::test]
async fn test_regular_link_makes_no_request() {
    let mut server = mockito::Server::new_async().await;
    let m = server
        .mock("GET", "/recipe")
        .expect(0)
        .create_async()
        .await;

    let fetcher = RequestFetcher::from_config(&FetchConfig::default()).unwrap();
    let resolver = LinkResolver::new(fetcher, vec!["pin.it".to_string()]);
    let url = format!("{}/recipe", server.url());

    assert_eq!(resolver.resolve_url(&url).await, url);
    m.assert_async().await;
}
