//! Kraken's coordination-tier binary: boots configuration, tracing, and the
//! tracker/announce HTTP server.
use kraken::bootstrap;

#[tokio::main]
async fn main() {
    let config = bootstrap::app::config(std::path::Path::new(bootstrap::config::DEFAULT_PATH_CONFIG));
    let state = bootstrap::app::build(&config);

    let server = kraken::app::start(&config, state);

    let _ = server.await;
}
