use quizforge::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("QUIZFORGE_ADDR").ok())
        .unwrap_or_else(|| DEFAULT_ADDR.to_string());

    let provider = match std::env::var("QUIZFORGE_BANKS") {
        Ok(path) => {
            let json = std::fs::read_to_string(&path)?;
            let provider = StaticBankProvider::from_json(&json)?;
            tracing::info!(%path, banks = provider.len(), "loaded question banks");
            provider
        }
        Err(_) => StaticBankProvider::default(),
    };

    let server = QuizServerBuilder::new().bind(&addr).build(provider).await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await?;
    Ok(())
}
