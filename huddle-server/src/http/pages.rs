use axum::extract::Path;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use huddle_core::RoomId;
use tracing::{debug, info};

const LANDING_PAGE: &str = include_str!("../../assets/index.html");
const ROOM_PAGE: &str = include_str!("../../assets/room.html");

pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// Mints a fresh room id and sends the browser there.
pub async fn create_room() -> Redirect {
    let room_id = RoomId::generate();
    info!("Created room link {}", room_id);
    Redirect::to(&format!("/{room_id}"))
}

pub async fn room_page(Path(room): Path<String>) -> Response {
    match RoomId::parse(&room) {
        Ok(room_id) => Html(render_room(&room_id)).into_response(),
        Err(e) => {
            debug!("Rejected room page request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Room ids are restricted to `[A-Za-z0-9_-]`, so no escaping is needed.
pub fn render_room(room_id: &RoomId) -> String {
    ROOM_PAGE.replace("{{ROOM_ID}}", room_id.as_str())
}
