#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if let Err(e) = konvite::run().await {
        tracing::error!("Startup failed: {}", e);
        eprintln!("konvite: {}", e);
        std::process::exit(1);
    }
}
