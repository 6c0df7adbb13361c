//! Integration tests for the scraper
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full fetch-and-extract cycle end-to-end.

use ripple_scrape::output::{write_records, OutputFormat};
use ripple_scrape::{
    scrape, FailureKind, Outcome, Pipeline, ScrapeConfig, ScrapeError, SelectorRule, TargetState,
};
use std::time::{Duration, Instant};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with a short timeout and a recognizable agent
fn create_test_config() -> ScrapeConfig {
    ScrapeConfig {
        concurrency: 5,
        timeout: Duration::from_secs(5),
        user_agent: "TestBot/1.0".to_string(),
        ..ScrapeConfig::default()
    }
}

fn page(title: &str, h1: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>{}</title></head><body><h1>{}</h1></body></html>",
            title, h1
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(response)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_two_urls_titles_in_input_order() {
    let server = MockServer::start().await;
    mount_page(&server, "/a", page("Alpha", "First")).await;
    mount_page(&server, "/b", page("Beta", "Second")).await;

    let urls = vec![format!("{}/a", server.uri()), format!("{}/b", server.uri())];
    let config = ScrapeConfig {
        concurrency: 2,
        selectors: vec![SelectorRule::text("title", "title")],
        ..create_test_config()
    };

    let records = scrape(&urls, config).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].url, urls[0]);
    assert_eq!(records[1].url, urls[1]);

    for (record, expected) in records.iter().zip(["Alpha", "Beta"]) {
        assert_eq!(record.outcome, Outcome::Ok);
        assert_eq!(record.state, TargetState::Done);
        let data = record.data.as_ref().unwrap();
        assert_eq!(data.len(), 1);
        assert_eq!(data.get("title"), Some(&[expected.to_string()][..]));
    }
}

#[tokio::test]
async fn test_default_rules_extract_title_and_h1() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page("Home", "Welcome")).await;

    let records = scrape(&[server.uri()], create_test_config()).await.unwrap();

    let data = records[0].data.as_ref().unwrap();
    let names: Vec<&str> = data.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["title", "h1"]);
    assert_eq!(data.get("h1"), Some(&["Welcome".to_string()][..]));
}

#[tokio::test]
async fn test_every_url_yields_exactly_one_record() {
    let server = MockServer::start().await;
    mount_page(&server, "/ok", page("Ok", "Ok")).await;
    mount_page(&server, "/missing", ResponseTemplate::new(404)).await;
    mount_page(&server, "/broken", ResponseTemplate::new(500)).await;

    let urls: Vec<String> = ["/ok", "/missing", "/broken", "/ok"]
        .iter()
        .map(|route| format!("{}{}", server.uri(), route))
        .collect();

    let records = scrape(&urls, create_test_config()).await.unwrap();

    assert_eq!(records.len(), urls.len());
    let indices: Vec<usize> = records.iter().map(|r| r.index).collect();
    assert_eq!(indices, vec![0, 1, 2, 3]);
    assert!(records.iter().all(|r| r.state.is_terminal()));

    assert!(records[0].is_ok());
    assert_eq!(records[1].error.as_ref().unwrap().kind, FailureKind::Http(404));
    assert_eq!(records[2].error.as_ref().unwrap().kind, FailureKind::Http(500));
    assert!(records[3].is_ok());
}

#[tokio::test]
async fn test_timeout_on_one_url_does_not_affect_another() {
    let server = MockServer::start().await;
    mount_page(&server, "/fast", page("Fast", "Fast")).await;
    mount_page(
        &server,
        "/slow",
        page("Slow", "Slow").set_delay(Duration::from_secs(5)),
    )
    .await;

    let urls = vec![
        format!("{}/fast", server.uri()),
        format!("{}/slow", server.uri()),
    ];
    let config = ScrapeConfig {
        timeout: Duration::from_millis(500),
        ..create_test_config()
    };

    let records = scrape(&urls, config).await.unwrap();

    assert!(records[0].is_ok());
    assert_eq!(records[1].outcome, Outcome::Error);
    assert_eq!(records[1].state, TargetState::FetchFailed);
    assert_eq!(records[1].error.as_ref().unwrap().kind, FailureKind::Timeout);
}

#[tokio::test]
async fn test_robots_blocked_url_is_never_fetched() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(page("Secret", "Secret"))
        .expect(0)
        .mount(&server)
        .await;

    mount_page(&server, "/public", page("Public", "Public")).await;

    let urls = vec![
        format!("{}/private", server.uri()),
        format!("{}/public", server.uri()),
    ];
    let config = ScrapeConfig {
        respect_robots: true,
        ..create_test_config()
    };

    let records = scrape(&urls, config).await.unwrap();

    assert_eq!(records[0].outcome, Outcome::Blocked);
    assert_eq!(records[0].state, TargetState::Blocked);
    assert_eq!(records[0].attempts, 0);
    assert_eq!(
        records[0].error.as_ref().unwrap().kind,
        FailureKind::RobotsBlocked
    );
    assert!(records[1].is_ok());
}

#[tokio::test]
async fn test_blocked_url_does_not_wait_for_a_slot() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /blocked"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/open",
        page("Open", "Open").set_delay(Duration::from_millis(800)),
    )
    .await;

    let urls = vec![
        format!("{}/open", server.uri()),
        format!("{}/blocked", server.uri()),
    ];
    let config = ScrapeConfig {
        concurrency: 1,
        respect_robots: true,
        preserve_order: false,
        ..create_test_config()
    };

    let records = scrape(&urls, config).await.unwrap();

    assert_eq!(records[0].url, urls[1]);
    assert_eq!(records[0].outcome, Outcome::Blocked);
    assert!(records[1].is_ok());
}

#[tokio::test]
async fn test_robots_ignored_when_disabled() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/page", page("Page", "Page")).await;

    let records = scrape(&[format!("{}/page", server.uri())], create_test_config())
        .await
        .unwrap();

    assert!(records[0].is_ok());
}

#[tokio::test]
async fn test_robots_unavailable_allows_all() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    mount_page(&server, "/page", page("Page", "Page")).await;

    let config = ScrapeConfig {
        respect_robots: true,
        ..create_test_config()
    };
    let records = scrape(&[format!("{}/page", server.uri())], config)
        .await
        .unwrap();

    assert!(records[0].is_ok());
}

#[tokio::test]
async fn test_robots_fetched_once_per_host() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("User-agent: *\nAllow: /")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/1", page("1", "1")).await;
    mount_page(&server, "/2", page("2", "2")).await;
    mount_page(&server, "/3", page("3", "3")).await;

    let urls: Vec<String> = (1..=3).map(|i| format!("{}/{}", server.uri(), i)).collect();
    let config = ScrapeConfig {
        respect_robots: true,
        ..create_test_config()
    };

    let records = scrape(&urls, config).await.unwrap();
    assert!(records.iter().all(|r| r.is_ok()));
}

#[tokio::test]
async fn test_malformed_html_still_succeeds() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/broken",
        ResponseTemplate::new(200)
            .set_body_string("<html><head><title>Messy</title><body><h1>Heading<div><p>no closing tags"),
    )
    .await;

    let records = scrape(&[format!("{}/broken", server.uri())], create_test_config())
        .await
        .unwrap();

    assert!(records[0].is_ok());
    let data = records[0].data.as_ref().unwrap();
    assert_eq!(data.get("title"), Some(&["Messy".to_string()][..]));
    assert_eq!(data.get("h1").map(|values| values.len()), Some(1));
}

#[tokio::test]
async fn test_preserve_order_with_out_of_order_completion() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/slow",
        page("Slow", "Slow").set_delay(Duration::from_millis(400)),
    )
    .await;
    mount_page(&server, "/fast", page("Fast", "Fast")).await;

    let urls = vec![
        format!("{}/slow", server.uri()),
        format!("{}/fast", server.uri()),
    ];

    let records = scrape(&urls, create_test_config()).await.unwrap();
    assert_eq!(records[0].url, urls[0]);
    assert_eq!(records[1].url, urls[1]);

    let config = ScrapeConfig {
        preserve_order: false,
        ..create_test_config()
    };
    let records = scrape(&urls, config).await.unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].url, urls[1]);
}

#[tokio::test]
async fn test_global_delay_spaces_requests() {
    let server = MockServer::start().await;
    mount_page(&server, "/page", page("Page", "Page")).await;

    let urls: Vec<String> = (0..3).map(|_| format!("{}/page", server.uri())).collect();
    let config = ScrapeConfig {
        delay: Duration::from_millis(300),
        ..create_test_config()
    };

    let start = Instant::now();
    let records = scrape(&urls, config).await.unwrap();

    assert!(records.iter().all(|r| r.is_ok()));
    assert!(start.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_per_host_delay_does_not_block_other_hosts() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_page(&first, "/page", page("First", "First")).await;
    mount_page(&second, "/page", page("Second", "Second")).await;

    let urls = vec![
        format!("{}/page", first.uri()),
        format!("{}/page", second.uri()),
    ];
    let config = ScrapeConfig {
        delay: Duration::from_secs(3),
        per_host: true,
        ..create_test_config()
    };

    let start = Instant::now();
    let records = scrape(&urls, config).await.unwrap();

    assert!(records.iter().all(|r| r.is_ok()));
    assert!(start.elapsed() < Duration::from_secs(3));
}

#[tokio::test]
async fn test_concurrency_limit_bounds_parallelism() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/page",
        page("Page", "Page").set_delay(Duration::from_millis(300)),
    )
    .await;

    let urls: Vec<String> = (0..4).map(|_| format!("{}/page", server.uri())).collect();
    let config = ScrapeConfig {
        concurrency: 2,
        ..create_test_config()
    };

    let start = Instant::now();
    let records = scrape(&urls, config).await.unwrap();

    assert_eq!(records.len(), 4);
    assert!(start.elapsed() >= Duration::from_millis(600));
}

#[tokio::test]
async fn test_deadline_cancels_unfinished_urls() {
    let server = MockServer::start().await;
    mount_page(&server, "/fast", page("Fast", "Fast")).await;
    mount_page(
        &server,
        "/stuck",
        page("Stuck", "Stuck").set_delay(Duration::from_secs(10)),
    )
    .await;

    let urls = vec![
        format!("{}/fast", server.uri()),
        format!("{}/stuck", server.uri()),
    ];
    let config = ScrapeConfig {
        timeout: Duration::from_secs(30),
        deadline: Some(Duration::from_millis(800)),
        ..create_test_config()
    };

    let start = Instant::now();
    let records = scrape(&urls, config).await.unwrap();

    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(records.len(), 2);
    assert!(records[0].is_ok());
    assert_eq!(records[1].state, TargetState::Cancelled);
    assert_eq!(records[1].error.as_ref().unwrap().kind, FailureKind::Cancelled);
}

#[tokio::test]
async fn test_retry_recovers_from_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", page("Back", "Back")).await;

    let config = ScrapeConfig {
        retries: 3,
        retry_backoff: Duration::from_millis(20),
        ..create_test_config()
    };
    let records = scrape(&[format!("{}/flaky", server.uri())], config)
        .await
        .unwrap();

    assert!(records[0].is_ok());
    assert_eq!(records[0].attempts, 3);
}

#[tokio::test]
async fn test_invalid_config_fails_before_network() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(page("x", "x"))
        .expect(0)
        .mount(&server)
        .await;

    let config = ScrapeConfig {
        selectors: vec![SelectorRule::text("bad", "div[")],
        ..create_test_config()
    };
    let result = scrape(&[server.uri()], config).await;
    assert!(matches!(result, Err(ScrapeError::Config(_))));

    let result = scrape(&[server.uri(), "not a url".to_string()], create_test_config()).await;
    assert!(matches!(result, Err(ScrapeError::UrlError(_))));
}

#[tokio::test]
async fn test_empty_input_yields_no_records() {
    let urls: Vec<String> = Vec::new();
    let records = scrape(&urls, create_test_config()).await.unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn test_each_run_fetches_robots_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(404))
        .expect(2)
        .mount(&server)
        .await;
    mount_page(&server, "/page", page("Page", "Page")).await;

    let config = ScrapeConfig {
        respect_robots: true,
        ..create_test_config()
    };
    let pipeline = Pipeline::new(config).unwrap();
    let targets = ripple_scrape::url::parse_targets(&[format!("{}/page", server.uri())]).unwrap();

    assert!(pipeline.run(targets.clone()).await[0].is_ok());
    assert!(pipeline.run(targets).await[0].is_ok());
}

#[tokio::test]
async fn test_robots_fetches_bounded_by_concurrency() {
    let mut urls = Vec::new();
    let mut servers = Vec::new();
    for i in 0..4 {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/robots.txt"))
            .respond_with(ResponseTemplate::new(404).set_delay(Duration::from_millis(300)))
            .expect(1)
            .mount(&server)
            .await;
        mount_page(&server, "/", page(&format!("Site {}", i), "Home")).await;
        urls.push(format!("{}/", server.uri()));
        servers.push(server);
    }

    let config = ScrapeConfig {
        concurrency: 1,
        respect_robots: true,
        ..create_test_config()
    };

    let start = Instant::now();
    let records = scrape(&urls, config).await.unwrap();

    assert!(records.iter().all(|r| r.is_ok()));
    // One robots.txt request at a time
    assert!(start.elapsed() >= Duration::from_millis(1200));
}

#[tokio::test]
async fn test_record_url_is_the_input_string() {
    let server = MockServer::start().await;
    mount_page(&server, "/page", page("Page", "Page")).await;

    let urls = vec![format!("http://LOCALHOST:{}/page", server.address().port())];
    let records = scrape(&urls, create_test_config()).await.unwrap();

    assert!(records[0].is_ok());
    assert_eq!(records[0].url, urls[0]);
}

#[tokio::test]
async fn test_csv_output_end_to_end() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/list",
        ResponseTemplate::new(200).set_body_string(
            r#"<html><body><a class="item" href="/x">X</a><a class="item" href="/y">Y</a></body></html>"#,
        ),
    )
    .await;
    mount_page(&server, "/gone", ResponseTemplate::new(404)).await;

    let urls = vec![
        format!("{}/list", server.uri()),
        format!("{}/gone", server.uri()),
    ];
    let rules = vec![SelectorRule::attribute("links", "a.item", "href")];
    let config = ScrapeConfig {
        selectors: rules.clone(),
        ..create_test_config()
    };
    let records = scrape(&urls, config).await.unwrap();

    let dir = TempDir::new().unwrap();
    let out = dir.path().join("results.csv");
    let columns: Vec<String> = rules.iter().map(|r| r.name.clone()).collect();
    write_records(&out, OutputFormat::Csv, &records, &columns).unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[0], "url,links");
    assert_eq!(lines[1], format!("{}/list,/x | /y", server.uri()));
    assert!(lines[2].starts_with(&format!("{}/gone,ERROR: HTTP 404", server.uri())));
}
