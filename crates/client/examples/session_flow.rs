//! Example: wiring the client into an application shell
//!
//! Demonstrates constructing the client from environment configuration,
//! probing backend health, and sharing one `AuthSession` between the client
//! and the rest of the application.
//!
//! Run against a local backend:
//! ```bash
//! STOCKARC_API_BASE_URL=http://localhost:8080/api \
//!     cargo run --example session_flow
//! ```

use std::sync::Arc;

use stockarc_client::{ApiClient, AuthSession, ClientConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("StockArc client example");
    println!("=======================\n");

    let config = ClientConfig::from_env()?;
    println!("✓ Configuration loaded");
    println!("  Base URL: {}", config.base_url);
    println!("  Timeout:  {:?}\n", config.timeout);

    // Share one session between the client and the rest of the app so a
    // refresh performed inside the pipeline is visible everywhere.
    let session = Arc::new(AuthSession::new());
    let client = ApiClient::builder()
        .config(config)
        .session(session.clone())
        .build()?;
    println!("✓ Client constructed");
    println!("  Authenticated: {}\n", session.is_authenticated());

    if std::env::var("STOCKARC_API_BASE_URL").is_ok() {
        println!("🔎 Probing backend health");
        match client.health_check().await {
            Ok(true) => println!("✓ Backend healthy\n"),
            Ok(false) => println!("✗ Backend reachable but unhealthy\n"),
            Err(e) => println!("✗ Health check failed: {e}\n"),
        }
    } else {
        println!("ℹ️  STOCKARC_API_BASE_URL not set, skipping health check");
        println!("   To use: export STOCKARC_API_BASE_URL=http://localhost:8080/api\n");
    }

    println!("📚 Next steps:");
    println!("  1. Point STOCKARC_API_BASE_URL at a running backend");
    println!("  2. Log in via POST /auth/login to populate the session");
    println!("  3. Issue requests with client.get / client.post — expired");
    println!("     sessions and rotated CSRF tokens are handled for you");

    Ok(())
}
