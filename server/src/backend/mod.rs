//! # Backend Module
//!
//! Everything behind the HTTP surface of the health journal, layered as
//!
//! ```text
//! IO Layer (REST API, push transport)
//!     ↓
//! Domain Layer (services, reconciler, state machine, aggregation)
//!     ↓
//! Storage Layer (SQLite repositories)
//! ```
//!
//! `initialize_backend` wires the layers into an `AppState`, and
//! `create_router` exposes it under `/api`.

pub mod domain;
pub mod io;
pub mod storage;

use anyhow::{Context, Result};
use axum::{
    http::{HeaderValue, Method},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::backend::domain::{
    CalendarService, ChildService, HealthEventService, IntakeLogService, NotificationService,
    ReminderService, ScheduleService, SubstanceService,
};
use crate::backend::io::push::{PushTransport, RelayPushTransport};
use crate::backend::storage::DbConnection;
use crate::config::Config;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub child_service: ChildService<DbConnection>,
    pub substance_service: SubstanceService<DbConnection>,
    pub schedule_service: ScheduleService<DbConnection>,
    pub intake_log_service: IntakeLogService<DbConnection>,
    pub health_event_service: HealthEventService<DbConnection>,
    pub calendar_service: CalendarService<DbConnection>,
    pub notification_service: NotificationService<DbConnection>,
    pub reminder_service: ReminderService<DbConnection>,
    /// Header carrying the authenticated user id
    pub principal_header: String,
    /// Bearer token for the send and reminder triggers; open when `None`
    pub dispatch_token: Option<String>,
}

impl AppState {
    pub fn new(db: DbConnection, transport: Option<Arc<dyn PushTransport>>, config: &Config) -> Self {
        let connection = Arc::new(db);

        let child_service = ChildService::new(connection.clone());
        let substance_service = SubstanceService::new(connection.clone(), child_service.clone());
        let schedule_service = ScheduleService::new(connection.clone(), child_service.clone());
        let intake_log_service = IntakeLogService::new(connection.clone(), child_service.clone());
        let health_event_service = HealthEventService::new(connection.clone(), child_service.clone());
        let calendar_service = CalendarService::new(connection.clone(), child_service.clone());
        let notification_service = NotificationService::new(connection, transport);
        let reminder_service = ReminderService::new(
            intake_log_service.clone(),
            schedule_service.clone(),
            notification_service.clone(),
        );

        Self {
            child_service,
            substance_service,
            schedule_service,
            intake_log_service,
            health_event_service,
            calendar_service,
            notification_service,
            reminder_service,
            principal_header: config.principal_header.to_ascii_lowercase(),
            dispatch_token: config.dispatch_token.clone(),
        }
    }
}

/// Initialize the backend with all required services
pub async fn initialize_backend(config: &Config) -> Result<AppState> {
    info!("Setting up database");
    let db = DbConnection::new(&config.resolved_database_url()).await?;

    let transport: Option<Arc<dyn PushTransport>> = match &config.push_relay_url {
        Some(url) => {
            info!("Push notifications go through relay {}", url);
            Some(Arc::new(RelayPushTransport::new(url.clone(), config.push_relay_token.clone())))
        }
        None => {
            warn!("PUSH_RELAY_URL not set, push notifications are disabled");
            None
        }
    };
    if config.dispatch_token.is_none() {
        warn!("DISPATCH_TOKEN not set, notification triggers accept any caller");
    }

    info!("Setting up application state");
    Ok(AppState::new(db, transport, config))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState, cors_origin: &str) -> Result<Router> {
    let origin = cors_origin
        .parse::<HeaderValue>()
        .with_context(|| format!("Invalid CORS origin: {}", cors_origin))?;

    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    Ok(Router::new()
        .nest("/api", io::rest::api_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state))
}
