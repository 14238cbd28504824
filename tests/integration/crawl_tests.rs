//! Integration tests for the crawl controller
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! gate -> fetch -> extract -> paginate cycle end-to-end.

use std::net::IpAddr;
use std::sync::Arc;

use sumi_harvest::config::{Config, CrawlerConfig};
use sumi_harvest::jobs::{JobSpec, SelectorSpec};
use sumi_harvest::safety::{SafetyViolation, StaticResolver};
use sumi_harvest::{CrawlController, HarvestError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Address the mock server's host pretends to resolve to
const PUBLIC_ADDR: &str = "93.184.216.34";

fn test_config() -> Config {
    Config {
        crawler: CrawlerConfig {
            request_timeout_secs: 5,
            request_delay_ms: 0,
            max_pagination_links: 5,
        },
        ..Config::default()
    }
}

fn controller_resolving_to(addr: &str) -> CrawlController {
    let addr: IpAddr = addr.parse().expect("valid address");
    CrawlController::new(&test_config())
        .expect("Failed to build controller")
        .with_resolver(Arc::new(StaticResolver::always(addr)))
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

const PRODUCTS: &str = r#"
    <div class="product"><h3>Alpha Lamp</h3><span class="price">$10.00</span></div>
    <div class="product"><h3>Beta Lamp</h3><span class="price">$12.00</span></div>
"#;

#[tokio::test]
async fn test_private_seed_refused_without_any_request() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(html(PRODUCTS))
        .expect(0)
        .mount(&mock_server)
        .await;

    let controller = controller_resolving_to("127.0.0.1");
    let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1");

    let err = controller.crawl(&spec).await.unwrap_err();

    assert!(matches!(
        err,
        HarvestError::Safety(SafetyViolation::PrivateAddress { .. })
    ));
    assert!(err.to_string().contains("private or local IP address"));
}

#[tokio::test]
async fn test_robots_disallow_refuses_seed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/list", PRODUCTS, 0).await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1");

    let err = controller.crawl(&spec).await.unwrap_err();
    assert!(matches!(
        err,
        HarvestError::Safety(SafetyViolation::RobotsDisallowed { .. })
    ));
}

#[tokio::test]
async fn test_robots_group_naming_bot_refuses_seed() {
    for group in ["ProScrape Bot", "ProScrape"] {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "User-agent: {}\nDisallow: /\n\nUser-agent: *\nAllow: /",
                group
            )))
            .expect(1)
            .mount(&mock_server)
            .await;
        mount_page(&mock_server, "/list", PRODUCTS, 0).await;

        let controller = controller_resolving_to(PUBLIC_ADDR);
        let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1");

        let err = controller.crawl(&spec).await.unwrap_err();
        assert!(
            matches!(
                err,
                HarvestError::Safety(SafetyViolation::RobotsDisallowed { .. })
            ),
            "group {:?} should refuse the seed",
            group
        );
    }
}

#[tokio::test]
async fn test_robots_for_other_agent_allows() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: OtherBot\nDisallow: /"),
        )
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/list", PRODUCTS, 1).await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1");

    let outcome = controller.crawl(&spec).await.unwrap();
    assert_eq!(outcome.records.len(), 2);
}

#[tokio::test]
async fn test_missing_robots_allows_and_extracts() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/list", PRODUCTS, 1).await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1");

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.records.len(), 2);
    assert_eq!(outcome.records[0].text("title"), Some("Alpha Lamp"));
    assert_eq!(outcome.records[1].text("price"), Some("$12.00"));
}

#[tokio::test]
async fn test_budget_of_one_never_follows_next_link() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/list",
        &format!(r#"{}<a class="next" href="/list/2">next</a>"#, PRODUCTS),
        1,
    )
    .await;
    mount_page(&mock_server, "/list/2", PRODUCTS, 0).await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1").with_max_pages(1);

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.visited.len(), 1);
}

#[tokio::test]
async fn test_pagination_never_refetches_visited_pages() {
    let mock_server = MockServer::start().await;
    let base = mock_server.uri();

    mount_page(
        &mock_server,
        "/p1",
        &format!(r#"{}<ul class="pagination"><li><a href="/p2">2</a></li></ul>"#, PRODUCTS),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/p2",
        &format!(
            r#"{}<ul class="pagination"><li><a href="{}/p1">1</a></li><li><a href="/p3">3</a></li></ul>"#,
            PRODUCTS, base
        ),
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/p3",
        &format!(
            r#"{}<ul class="pagination"><li><a href="/p1">1</a></li><li><a href="/p2">2</a></li></ul>"#,
            PRODUCTS
        ),
        1,
    )
    .await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/p1", base), "u1").with_max_pages(10);

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.pages_fetched, 3);
    assert_eq!(outcome.records.len(), 6);
    let visited: Vec<String> = outcome.visited.iter().map(|u| u.path().to_string()).collect();
    assert_eq!(visited, vec!["/p1", "/p2", "/p3"]);
}

#[tokio::test]
async fn test_budget_limits_pages_fetched() {
    let mock_server = MockServer::start().await;

    for (page, next) in [("/p1", "/p2"), ("/p2", "/p3"), ("/p3", "/p4")] {
        let hits = if page == "/p3" { 0 } else { 1 };
        mount_page(
            &mock_server,
            page,
            &format!(r#"{}<a rel="next" href="{}">next</a>"#, PRODUCTS, next),
            hits,
        )
        .await;
    }

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/p1", mock_server.uri()), "u1").with_max_pages(2);

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 4);
}

#[tokio::test]
async fn test_off_host_pagination_ignored() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/list",
        &format!(
            r#"{}<div class="pagination"><a href="http://elsewhere.invalid/list/2">2</a></div>"#,
            PRODUCTS
        ),
        1,
    )
    .await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/list", mock_server.uri()), "u1").with_max_pages(5);

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.pages_fetched, 1);
    assert_eq!(outcome.visited.len(), 1);
}

#[tokio::test]
async fn test_seed_failure_is_fatal() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/gone", mock_server.uri()), "u1");

    let err = controller.crawl(&spec).await.unwrap_err();
    assert!(matches!(err, HarvestError::Fetch(_)));
    assert!(err.to_string().contains("HTTP 404"));
}

#[tokio::test]
async fn test_later_page_failure_is_skipped() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/p1",
        &format!(
            r#"{}<nav class="pagination"><a href="/broken">2</a><a href="/p3">3</a></nav>"#,
            PRODUCTS
        ),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/p3", PRODUCTS, 1).await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/p1", mock_server.uri()), "u1").with_max_pages(3);

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.pages_fetched, 2);
    assert_eq!(outcome.records.len(), 4);
    assert_eq!(outcome.visited.len(), 3);
}

#[tokio::test]
async fn test_explicit_container_selectors() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/catalog",
        r#"
        <div class="item"><h3>One</h3><span class="price">$1</span></div>
        <div class="item"><h3>Two</h3><span class="price">$2</span></div>
        <div class="item"><h3>Three</h3><span class="price">$3</span></div>
        "#,
        1,
    )
    .await;

    let selectors = SelectorSpec::from_json(
        r#"{"container": ".item", "title": "h3", "price": ".price"}"#,
    )
    .unwrap();
    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/catalog", mock_server.uri()), "u1").with_selectors(selectors);

    let outcome = controller.crawl(&spec).await.unwrap();

    assert_eq!(outcome.records.len(), 3);
    assert_eq!(outcome.records[2].text("title"), Some("Three"));
    assert_eq!(outcome.records[2].text("price"), Some("$3"));
}

#[tokio::test]
async fn test_invalid_selector_on_seed_fails_crawl() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/catalog", "<h1>Catalog</h1>", 1).await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/catalog", mock_server.uri()), "u1")
        .with_selectors(SelectorSpec::new().with_field("title", "h1["));

    let err = controller.crawl(&spec).await.unwrap_err();
    assert!(matches!(err, HarvestError::HtmlParse { .. }));
}

#[tokio::test]
async fn test_cross_host_redirect_not_followed() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/moved"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "http://elsewhere.invalid/"),
        )
        .mount(&mock_server)
        .await;

    let controller = controller_resolving_to(PUBLIC_ADDR);
    let spec = JobSpec::new(format!("{}/moved", mock_server.uri()), "u1");

    let err = controller.crawl(&spec).await.unwrap_err();
    assert!(err.to_string().contains("HTTP 302"));
}
