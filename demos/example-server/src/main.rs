use axum::Router;
use error_interceptor::prelude::*;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod modules;

use modules::product::{self, InMemoryProductRepository, ProductService};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,error_interceptor=debug")),
        )
        .init();

    tracing::info!("🚀 Starting Example Server...");

    // 1. Resolve the disclosure policy once at startup
    let config = ConfigService::new();
    let environment = match config.environment() {
        Ok(environment) => environment,
        Err(e) => {
            tracing::error!("{}, falling back to production", e);
            Environment::Production
        }
    };
    tracing::info!(%environment, "error disclosure policy");

    // 2. Build the interceptor: specific classifiers first
    let interceptor = ErrorInterceptor::builder()
        .environment(environment)
        .classifier(product::product_classifier)
        .build();

    // 3. Create Router
    let service = Arc::new(ProductService::new(Arc::new(InMemoryProductRepository::default())));
    // Unmatched paths get the JSON 404 as well
    let router = interceptor
        .apply(Router::new().nest("/products", product::router(service)))
        .layer(TraceLayer::new_for_http());

    // 4. Start server
    let host = config.get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
    let port = config.get("PORT").unwrap_or_else(|| "3000".to_string());
    let addr = format!("{}:{}", host, port);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            return;
        }
    };

    tracing::info!("✅ Server running on http://127.0.0.1:{}", port);

    if let Err(e) = axum::serve(listener, router).await {
        tracing::error!("Server error: {}", e);
    }

    tracing::info!("👋 Server stopped");
}
