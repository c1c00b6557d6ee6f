use std::{env, sync::Arc};
use tracing_subscriber::EnvFilter;
use webapp_http::{Address, HttpFactory, Router, Server};

// cargo run --example static_files -- ./public
#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let dir = env::args().nth(1).unwrap_or_else(|| ".".to_string());

    let mut router = Router::with_root("/site");
    router.add_directory_for("/", dir).unwrap();

    let mut server = Server::builder()
        .protocol(HttpFactory::new(Arc::new(router)))
        .build();

    server.bind_to(Address::ALL_IPV4, 8080).await.unwrap();
    server.launch().await;
}
