//! End-to-end collection tests against a mocked API and a temp store.

use serde_json::json;
use tempfile::TempDir;
use threads_post_archiver::api::ApiClient;
use threads_post_archiver::collect::collect;
use threads_post_archiver::config::Config;
use threads_post_archiver::store::load_partition;
use threads_post_archiver::threads::ThreadsClient;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post_json(id: &str, timestamp: &str) -> serde_json::Value {
    json!({
        "id": id,
        "media_product_type": "THREADS",
        "media_type": "TEXT_POST",
        "permalink": format!("https://www.threads.net/@tester/post/{id}"),
        "owner": {"id": "42"},
        "username": "tester",
        "text": format!("post {id}"),
        "timestamp": timestamp,
    })
}

fn page_json(posts: Vec<serde_json::Value>) -> serde_json::Value {
    json!({
        "data": posts,
        "paging": {"cursors": {"before": "", "after": ""}},
    })
}

/// Threads page of 2 (one quoting Q1), replies page of 1, plus the profile
/// and the Q1 point lookup.
async fn mount_api(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "username": "tester",
            "name": "Tester",
            "threads_profile_picture_url": "https://cdn.example/tester.jpg",
            "threads_biography": "testing",
        })))
        .mount(server)
        .await;

    let mut quoting = post_json("1", "2025-02-11T10:00:00+0000");
    quoting["is_quote_post"] = json!(true);
    quoting["quoted_post"] = json!({"id": "Q1"});

    Mock::given(method("GET"))
        .and(path("/me/threads"))
        .and(query_param("since", "2025-02-11"))
        .and(query_param("until", "2025-02-12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(page_json(vec![
            quoting,
            post_json("2", "2025-02-11T11:00:00+0000"),
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/me/replies"))
        .and(query_param("since", "2025-02-11"))
        .and(query_param("until", "2025-02-12"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(page_json(vec![post_json("3", "2025-02-11T12:00:00+0000")])),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/Q1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(post_json("Q1", "2025-02-10T09:00:00+0000")),
        )
        .mount(server)
        .await;
}

fn test_setup(server: &MockServer, dir: &TempDir) -> (Config, ThreadsClient) {
    let config = Config {
        api_base: server.uri(),
        output_dir: dir.path().to_path_buf(),
        ..Config::for_testing()
    };
    let client = ThreadsClient::new(ApiClient::new(&config), &config);
    (config, client)
}

#[tokio::test]
async fn test_collect_stores_three_posts_with_resolved_quote() {
    let server = MockServer::start().await;
    mount_api(&server).await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (config, client) = test_setup(&server, &dir);

    let stats = collect(&client, &config, Some("2025-02-11"), Some("2025-02-12"))
        .await
        .expect("collect failed");

    assert_eq!(stats.fetched, 3);
    assert_eq!(stats.years_written, 1);
    assert_eq!(stats.empty_ids, 0);

    let posts = load_partition(&dir.path().join("posts_2025.jsonl"))
        .await
        .expect("partition should exist");
    assert_eq!(posts.len(), 3);

    let quoting = posts
        .iter()
        .find(|p| p.quoted_post_id == "Q1")
        .expect("quoting post should be stored");
    let quoted = quoting
        .quoted_post
        .as_ref()
        .expect("quoted post should be resolved");
    assert_eq!(quoted.id, "Q1");
    assert_eq!(quoted.username, "tester");
    assert!(quoted.quoted_post.is_none(), "resolution stops at depth one");
}

#[tokio::test]
async fn test_collect_twice_is_idempotent() {
    let server = MockServer::start().await;
    mount_api(&server).await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (config, client) = test_setup(&server, &dir);

    collect(&client, &config, Some("2025-02-11"), Some("2025-02-12"))
        .await
        .expect("first collect failed");
    let first = load_partition(&dir.path().join("posts_2025.jsonl"))
        .await
        .expect("partition should exist");

    collect(&client, &config, Some("2025-02-11"), Some("2025-02-12"))
        .await
        .expect("second collect failed");
    let second = load_partition(&dir.path().join("posts_2025.jsonl"))
        .await
        .expect("partition should exist");

    assert_eq!(first, second);
    assert_eq!(second.len(), 3);
}

#[tokio::test]
async fn test_collect_fails_when_profile_fetch_fails() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    let dir = TempDir::new().expect("Failed to create temp dir");
    let (config, client) = test_setup(&server, &dir);

    let result = collect(&client, &config, None, None).await;
    assert!(result.is_err(), "an auth failure should abort the run");
}
