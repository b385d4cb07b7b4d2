//! Integration tests for the network-fetch path
//!
//! Uses a wiremock server in place of real sites.

use sdk::types::{HistoryAction, Task, TaskKind, TaskStatus};
use std::time::Duration;
use wiremock::{
    matchers::{header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use taskflow_engine::conductor::{Component, NetworkFetchExecutor, OrchestrationState};
use taskflow_engine::config::WebConfig;
use taskflow_engine::tools::{FetchError, WebFetcher};

const ARTICLE_PAGE: &str = r#"<!doctype html>
<html>
  <head><title>Release Notes</title><style>body { color: red; }</style></head>
  <body>
    <nav><a href="/">Home</a> <a href="/blog">Blog</a></nav>
    <div class="main-content">
      <h1>Version 2.0</h1>
      <p>This release adds faster builds.</p>
      <p>It also removes the legacy flag.</p>
    </div>
    <footer>Copyright</footer>
  </body>
</html>"#;

async fn serve(body: &str, route: &str) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(route.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn test_fetch_extracts_title_and_main_content() {
    let server = serve(ARTICLE_PAGE, "/notes").await;
    let fetcher = WebFetcher::new(&WebConfig::default()).unwrap();

    let page = fetcher.fetch(&format!("{}/notes", server.uri())).await.unwrap();

    assert_eq!(page.title, "Release Notes");
    assert!(page.content.contains("This release adds faster builds."));
    assert!(page.content.contains("It also removes the legacy flag."));
    assert!(!page.content.contains("Copyright"));
    assert!(!page.content.contains("color: red"));
    assert_eq!(page.url, format!("{}/notes", server.uri()));
}

#[tokio::test]
async fn test_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header("user-agent", "Mozilla/5.0 AI Research Agent"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>ok</p>", "text/html"))
        .mount(&server)
        .await;

    let fetcher = WebFetcher::new(&WebConfig::default()).unwrap();
    let page = fetcher.fetch(&server.uri()).await.unwrap();
    assert_eq!(page.content, "ok");
}

#[tokio::test]
async fn test_content_is_truncated_to_budget() {
    let long_page = format!("<html><body><p>{}</p></body></html>", "word ".repeat(2000));
    let server = serve(&long_page, "/long").await;
    let config = WebConfig {
        max_content_chars: 50,
        ..WebConfig::default()
    };
    let fetcher = WebFetcher::new(&config).unwrap();

    let page = fetcher.fetch(&format!("{}/long", server.uri())).await.unwrap();

    assert_eq!(page.content.chars().count(), 53);
    assert!(page.content.ends_with("..."));
}

#[tokio::test]
async fn test_error_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let fetcher = WebFetcher::new(&WebConfig::default()).unwrap();
    let result = fetcher.fetch(&format!("{}/missing", server.uri())).await;

    match result {
        Err(FetchError::Status(status)) => assert!(status.starts_with("404")),
        other => panic!("Expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_server_times_out_and_fails_the_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<p>late</p>", "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = WebConfig {
        timeout_secs: 1,
        ..WebConfig::default()
    };
    let url = format!("{}/slow", server.uri());
    let fetcher = WebFetcher::new(&config).unwrap();
    assert!(matches!(fetcher.fetch(&url).await, Err(FetchError::Timeout)));

    let task = Task::with_param(TaskKind::NetworkFetch, "Read the slow page", "url", url.clone());
    let state = OrchestrationState {
        current_task_id: Some(task.id().to_string()),
        tasks: vec![task],
        ..OrchestrationState::new("read the slow page")
    };
    let executor = NetworkFetchExecutor::new(WebFetcher::new(&config).unwrap());
    let next = state.clone().apply(executor.run(&state).await);

    assert_eq!(next.tasks[0].status(), TaskStatus::Failed);
    assert_eq!(
        next.tasks[0].result(),
        Some(format!("Failed to fetch {}: Request timed out", url).as_str())
    );
    assert_eq!(next.execution_history[0].result_summary, "failed: Read the slow page");
}

#[tokio::test]
async fn test_executor_records_successful_fetch() {
    let server = serve(ARTICLE_PAGE, "/notes").await;
    let url = format!("{}/notes", server.uri());
    let task = Task::with_param(TaskKind::NetworkFetch, "Read the notes", "url", url.clone());
    let state = OrchestrationState {
        current_task_id: Some(task.id().to_string()),
        tasks: vec![task],
        ..OrchestrationState::new("read the release notes")
    };

    let executor = NetworkFetchExecutor::new(WebFetcher::new(&WebConfig::default()).unwrap());
    let next = state.clone().apply(executor.run(&state).await);

    let task = &next.tasks[0];
    assert_eq!(task.status(), TaskStatus::Completed);
    assert!(task
        .result()
        .is_some_and(|r| r.starts_with(&format!("Fetched {}\n\nTitle: Release Notes\n\n", url))));
    assert_eq!(next.execution_history[0].action, HistoryAction::NetworkFetch);
    assert_eq!(next.execution_history[0].result_summary, "succeeded: Read the notes");
    assert!(next
        .last_message()
        .is_some_and(|m| m.content.starts_with("Network fetch result: Fetched")));
    assert!(next.current_task_id.is_none());
}
