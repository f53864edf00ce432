use tokio_util::sync::CancellationToken;

use netwarden::{create_app, init_tracing, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_tracing(&config.logging);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let docs = config.server.enable_docs;

    let app = create_app(config);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "netwarden listening");
    if docs {
        tracing::info!("API docs available at /docs");
    }

    let token = app.shutdown_token.clone();
    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal(token))
        .await?;

    tracing::info!("netwarden stopped");
    Ok(())
}

async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
    token.cancel();
}
