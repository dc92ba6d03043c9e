//! HTTP server for the order cache.
//!
//! Used for deployment: Kubernetes probes hit `/health`; clients submit and
//! cancel orders via the REST routes and stream match updates over
//! `/ws/matches`. Cache behavior is configured from the environment (see
//! [`order_cache::CacheConfig::from_env`]).

use order_cache::api;
use order_cache::CacheConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);

    let config = CacheConfig::from_env();
    let app = api::create_router(config);

    let addr = format!("0.0.0.0:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("bind");
    eprintln!("listening on http://{}", addr);
    axum::serve(listener, app).await.expect("serve");
}
