pub mod test_http_routes;
pub mod test_websocket_session;
