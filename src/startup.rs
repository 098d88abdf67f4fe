//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::application::commands::{RegisterAccount, RegisterAccountCommand};
use crate::config::{DatabaseBackend, Settings};
use crate::domain::{CredentialHasher, IdGenerator};
use crate::infrastructure::database::{self, PgUnitOfWork};
use crate::infrastructure::repositories::{InMemoryAccountStore, PgAccountRepository};
use crate::infrastructure::security::{Argon2CredentialHasher, UuidGenerator};
use crate::presentation::http::{create_router, handlers::health};
use crate::presentation::middleware::create_trace_layer;
use crate::shared::error::AppError;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub registration: Arc<dyn RegisterAccount>,
    /// Present only for the postgres backend.
    pub db: Option<PgPool>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// State backed by the PostgreSQL pool.
    pub fn postgres(settings: Settings, db: PgPool) -> Result<Self, AppError> {
        let (hasher, ids) = collaborators(&settings)?;
        let registration = RegisterAccountCommand::new(
            Arc::new(PgUnitOfWork::new(db.clone())),
            Arc::new(PgAccountRepository::new(db.clone())),
            hasher,
            ids,
        );
        Ok(Self {
            registration: Arc::new(registration),
            db: Some(db),
            settings: Arc::new(settings),
        })
    }

    /// State backed by `store`. The caller keeps a handle to inspect it.
    pub fn in_memory(settings: Settings, store: Arc<InMemoryAccountStore>) -> Result<Self, AppError> {
        let (hasher, ids) = collaborators(&settings)?;
        let registration =
            RegisterAccountCommand::new(Arc::clone(&store), store, hasher, ids);
        Ok(Self {
            registration: Arc::new(registration),
            db: None,
            settings: Arc::new(settings),
        })
    }

    /// Build the state for the configured backend, connecting and migrating
    /// when that backend is PostgreSQL.
    pub async fn build(settings: Settings) -> Result<Self> {
        match settings.database.backend {
            DatabaseBackend::Postgres => {
                let db = database::create_pool(&settings.database).await?;
                tracing::info!("Database connection pool created");
                if settings.database.run_migrations {
                    database::run_migrations(&db).await?;
                    tracing::info!("Database migrations applied");
                }
                Ok(Self::postgres(settings, db)?)
            }
            DatabaseBackend::Memory => {
                tracing::warn!("Using the in-memory account store; data is not persisted");
                Ok(Self::in_memory(settings, Arc::new(InMemoryAccountStore::new()))?)
            }
        }
    }
}

fn collaborators(
    settings: &Settings,
) -> Result<(Arc<dyn CredentialHasher>, Arc<dyn IdGenerator>), AppError> {
    let hasher = Argon2CredentialHasher::new(&settings.hashing)?;
    Ok((Arc::new(hasher), Arc::new(UuidGenerator)))
}

/// Router with the middleware stack applied.
pub fn build_router(state: AppState) -> Router {
    create_router(state).layer(create_trace_layer())
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        let addr = settings.server.socket_addr()?;
        let state = AppState::build(settings).await?;
        let router = build_router(state);

        // Bind to address
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
