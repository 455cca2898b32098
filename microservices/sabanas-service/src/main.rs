//! Sabanas ingestion service
//!
//! Carrier CDR ("sabana") ETL pipeline for the VAS platform:
//! - FTP-delivered spreadsheet ingestion across four carrier feeds
//! - Per-carrier field normalization and row filtering
//! - Transactional bulk load into the canonical record store
//! - A single-owner, compare-and-set job lifecycle over HTTP

#![allow(dead_code)]

use std::sync::Arc;

use brivas_core::{BrivasService, HealthStatus, MicroserviceRuntime, ReadinessStatus};
use tracing::info;

mod api;
mod carriers;
mod config;
mod dispatcher;
mod domain;
mod engine;
mod error;
mod ftp;
mod normalize;
mod repository;
mod sheet;

use config::SabanasConfig;
use repository::SabanasRepository;

#[tokio::main]
async fn main() -> brivas_core::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sabanas_service=debug".parse().expect("valid tracing directive")),
        )
        .json()
        .init();

    info!("Starting Sabanas service");

    let service = Arc::new(SabanasService::new().await?);
    MicroserviceRuntime::run(service).await
}

pub struct SabanasService {
    config: Arc<SabanasConfig>,
    repo: Arc<SabanasRepository>,
    start_time: std::time::Instant,
}

impl SabanasService {
    pub async fn new() -> brivas_core::Result<Self> {
        let config = SabanasConfig::from_env()
            .map_err(|e| brivas_core::BrivasError::Config(e.to_string()))?;

        let pool_config = brivas_lumadb::PoolConfig { url: config.database_url.clone(), ..Default::default() };
        let pool = brivas_lumadb::LumaDbPool::new(pool_config)
            .await
            .map_err(|e| brivas_core::BrivasError::Database(e.to_string()))?;

        Ok(Self {
            config: Arc::new(config),
            repo: Arc::new(SabanasRepository::new(pool)),
            start_time: std::time::Instant::now(),
        })
    }
}

#[async_trait::async_trait]
impl BrivasService for SabanasService {
    fn service_id(&self) -> &'static str {
        "sabanas-service"
    }

    async fn health(&self) -> HealthStatus {
        HealthStatus {
            healthy: true,
            service_id: self.service_id().to_string(),
            version: self.version().to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    async fn ready(&self) -> ReadinessStatus {
        ReadinessStatus {
            ready: true,
            dependencies: vec![brivas_core::DependencyStatus {
                name: "lumadb".to_string(),
                available: true,
                latency_ms: Some(1),
            }],
        }
    }

    async fn shutdown(&self) -> brivas_core::Result<()> {
        info!("Shutting down Sabanas service");
        Ok(())
    }

    async fn start(&self) -> brivas_core::Result<()> {
        info!(http = %self.config.http_bind, "Starting Sabanas HTTP server");

        let router = api::rest::create_router(self.repo.clone(), self.config.clone());

        let listener = tokio::net::TcpListener::bind(&self.config.http_bind).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
