use std::fs;

use huddle_server::ServerConfig;
use uuid::Uuid;

use crate::integration::{init_tracing, spawn_test_server};
use crate::utils::{header, http_get, status_line};

#[tokio::test]
async fn test_http_routes() {
    init_tracing();

    let (addr, _service, _shutdown) = spawn_test_server(ServerConfig::default()).await;

    let landing = http_get(addr, "/").await.expect("landing");
    assert!(status_line(&landing).contains("200"));
    assert!(landing.contains("href=\"/create\""));

    let created = http_get(addr, "/create").await.expect("create");
    assert!(status_line(&created).contains("303"), "{created}");
    let location = header(&created, "location").expect("location header");
    let room_id = location.trim_start_matches('/');
    assert!(!room_id.is_empty());

    let page = http_get(addr, location).await.expect("room page");
    assert!(status_line(&page).contains("200"));
    assert!(page.contains(&format!("const roomId = \"{room_id}\"")));

    let bad = http_get(addr, "/bad.room").await.expect("bad room");
    assert!(status_line(&bad).contains("400"), "{bad}");

    let health = http_get(addr, "/healthz").await.expect("healthz");
    assert!(status_line(&health).contains("200"));
    assert!(health.ends_with("ok"));
}

#[tokio::test]
async fn test_static_files_are_served_from_configured_dir() {
    init_tracing();

    let dir = std::env::temp_dir().join(format!("huddle-static-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create static dir");
    fs::write(dir.join("hello.txt"), "hello from disk").expect("write static file");

    let (addr, _service, _shutdown) = spawn_test_server(ServerConfig {
        static_dir: Some(dir.clone()),
        ..ServerConfig::default()
    })
    .await;

    let response = http_get(addr, "/static/hello.txt").await.expect("static file");
    assert!(status_line(&response).contains("200"));
    assert!(response.ends_with("hello from disk"));

    let _ = fs::remove_dir_all(dir);
}
