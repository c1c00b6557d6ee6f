use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use webapp_http::{Address, HttpFactory, Response, Router, Server, StatusCode};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut router = Router::new();
    router
        .add_handler_for("/", |_, req, resp| {
            let name = match req.get("name") {
                "" => "world",
                name => name,
            };

            resp.set_header(StatusCode::Ok, Response::header_for_text("plain", ""))
                .set_body(format!("Hello, {name}!"));
            true
        })
        .unwrap();

    let mut server = Server::builder()
        .protocol(HttpFactory::new(Arc::new(router)))
        .build();

    server.bind_to(Address::LOOPBACK, 8080).await.unwrap();
    server.launch().await;
}
