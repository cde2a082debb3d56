mod common;

use axum::http::StatusCode;
use axum_test::TestServer;
use common::auth_header;

async fn setup() -> (TestServer, sqlx::SqlitePool) {
    let pool = common::setup_test_db().await;
    let app = common::create_test_app(pool.clone());
    let server = TestServer::new(app).unwrap();
    (server, pool)
}

#[tokio::test]
async fn conversations_summarize_each_counterparty() {
    let (server, pool) = setup().await;
    let (me, token) = common::create_test_user(&pool, "me@test.com", "maya", "client").await;
    let (x, _) = common::create_test_user(&pool, "x@test.com", "xavier", "talent").await;
    let (y, _) = common::create_test_user(&pool, "y@test.com", "yara", "talent").await;

    common::insert_message(&pool, &x, &me, "x1", 0, true).await;
    common::insert_message(&pool, &x, &me, "x2", 1, false).await;
    common::insert_message(&pool, &me, &x, "reply", 2, false).await;
    common::insert_message(&pool, &x, &me, "x3", 3, false).await;
    common::insert_message(&pool, &me, &y, "hello yara", 5, false).await;

    let (h, v) = auth_header(&token);
    let res = server.get("/api/conversations").add_header(h, v).await;

    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    let list = body.as_array().unwrap();
    assert_eq!(list.len(), 2);

    assert_eq!(list[0]["id"], y);
    assert_eq!(list[0]["name"], "yara");
    assert_eq!(list[0]["unreadCount"], 0);
    assert_eq!(list[0]["lastMessage"], "hello yara");

    assert_eq!(list[1]["id"], x);
    assert_eq!(list[1]["role"], "talent");
    assert_eq!(list[1]["avatar"], "https://cdn.test/xavier.png");
    assert_eq!(list[1]["unreadCount"], 2);
    assert_eq!(list[1]["lastMessage"], "x3");
}

#[tokio::test]
async fn conversations_skip_unknown_counterparties() {
    let (server, pool) = setup().await;
    let (me, token) = common::create_test_user(&pool, "me@test.com", "maya", "client").await;

    common::insert_message(&pool, "gone", &me, "orphan", 0, false).await;

    let (h, v) = auth_header(&token);
    let res = server.get("/api/conversations").add_header(h, v).await;

    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn thread_is_oldest_first_and_excludes_other_pairs() {
    let (server, pool) = setup().await;
    let (me, token) = common::create_test_user(&pool, "me@test.com", "maya", "client").await;
    let (x, _) = common::create_test_user(&pool, "x@test.com", "xavier", "talent").await;
    let (y, _) = common::create_test_user(&pool, "y@test.com", "yara", "talent").await;

    common::insert_message(&pool, &x, &me, "b", 1, false).await;
    common::insert_message(&pool, &me, &x, "a", 0, false).await;
    common::insert_message(&pool, &me, &y, "not here", 2, false).await;
    common::insert_message(&pool, &x, &y, "nor here", 3, false).await;
    common::insert_message(&pool, &me, &x, "c", 4, false).await;

    let (h, v) = auth_header(&token);
    let res = server
        .get(&format!("/api/conversations/{}/messages", x))
        .add_header(h, v)
        .await;

    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    let contents: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["a", "b", "c"]);
}

#[tokio::test]
async fn thread_limit_keeps_most_recent_page() {
    let (server, pool) = setup().await;
    let (me, token) = common::create_test_user(&pool, "me@test.com", "maya", "client").await;
    let (x, _) = common::create_test_user(&pool, "x@test.com", "xavier", "talent").await;

    for i in 0..5 {
        common::insert_message(&pool, &x, &me, &format!("m{}", i), i, false).await;
    }

    let (h, v) = auth_header(&token);
    let res = server
        .get(&format!("/api/conversations/{}/messages?limit=2", x))
        .add_header(h, v)
        .await;

    res.assert_status_ok();
    let body: serde_json::Value = res.json();
    let contents: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["m3", "m4"]);
}

#[tokio::test]
async fn thread_with_self_is_rejected() {
    let (server, pool) = setup().await;
    let (me, token) = common::create_test_user(&pool, "me@test.com", "maya", "client").await;

    let (h, v) = auth_header(&token);
    let res = server
        .get(&format!("/api/conversations/{}/messages", me))
        .add_header(h, v)
        .await;

    res.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unread_backlog_past_one_thread_page_can_be_cleared() {
    let (server, pool) = setup().await;
    let (me, token) = common::create_test_user(&pool, "me@test.com", "maya", "client").await;
    let (x, _) = common::create_test_user(&pool, "x@test.com", "xavier", "talent").await;

    for i in 0..201 {
        common::insert_message(&pool, &x, &me, &format!("m{}", i), i, false).await;
    }

    let (h, v) = auth_header(&token);
    let thread: serde_json::Value = server
        .get(&format!("/api/conversations/{}/messages", x))
        .add_header(h.clone(), v.clone())
        .await
        .json();
    assert_eq!(thread.as_array().unwrap().len(), 200);

    // The full message list is not paged, so it carries every unread id.
    let all: serde_json::Value = server.get("/api/messages").add_header(h.clone(), v.clone()).await.json();
    let ids: Vec<i64> = all
        .as_array()
        .unwrap()
        .iter()
        .filter(|m| m["senderId"] == x && m["isRead"] == false)
        .map(|m| m["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids.len(), 201);

    let res = server
        .post("/api/messages/read")
        .add_header(h.clone(), v.clone())
        .json(&serde_json::json!({ "ids": ids }))
        .await;
    res.assert_status_ok();
    assert_eq!(res.json::<serde_json::Value>()["updated"], 201);

    let list: serde_json::Value = server.get("/api/conversations").add_header(h, v).await.json();
    assert_eq!(list[0]["unreadCount"], 0);
}
