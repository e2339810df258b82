use crate::config::Config;
use crate::errors::{DashboardError, Result};
use crate::models::query::{Query, QueryInput};
use crate::providers::{Geocoder, MarketData};
use crate::render::{RenderedFragments, Renderer};
use crate::services::controller::{CycleOutcome, PublishedView, ViewController};
use crate::view::View;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use log::{debug, info};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Shared state of the web dashboard
pub struct AppState {
    config: Config,
    market: Arc<dyn MarketData + Send + Sync>,
    geocoder: Arc<dyn Geocoder + Send + Sync>,
    renderer: Renderer,
    sessions: Mutex<Sessions>,
}

#[derive(Default)]
struct Sessions {
    entries: HashMap<String, SessionEntry>,
    clock: u64,
}

struct SessionEntry {
    controller: Arc<ViewController>,
    last_used: u64,
}

impl AppState {
    pub fn new(
        config: Config,
        market: Arc<dyn MarketData + Send + Sync>,
        geocoder: Arc<dyn Geocoder + Send + Sync>,
    ) -> Result<Self> {
        Ok(Self {
            config,
            market,
            geocoder,
            renderer: Renderer::new()?,
            sessions: Mutex::new(Sessions::default()),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Controller of a session, created on first use. When the table is full
    /// the least recently used idle session is dropped; sessions with a cycle
    /// in flight are only evicted if every session is busy, in which case a
    /// later `GET .../view` for the evicted id answers 404.
    pub fn controller(&self, session: &str) -> Arc<ViewController> {
        let mut sessions = self.lock_sessions();
        sessions.clock += 1;
        let now = sessions.clock;

        if let Some(entry) = sessions.entries.get_mut(session) {
            entry.last_used = now;
            return Arc::clone(&entry.controller);
        }

        if sessions.entries.len() >= self.config.max_sessions {
            let oldest = sessions
                .entries
                .iter()
                .min_by_key(|(_, entry)| (entry.controller.is_running(), entry.last_used))
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                debug!("Evicting idle session {}", oldest);
                sessions.entries.remove(&oldest);
            }
        }

        let controller = Arc::new(ViewController::new(
            &self.config,
            Arc::clone(&self.market),
            Arc::clone(&self.geocoder),
        ));
        sessions.entries.insert(
            session.to_string(),
            SessionEntry {
                controller: Arc::clone(&controller),
                last_used: now,
            },
        );
        info!("New session {} ({} live)", session, sessions.entries.len());
        controller
    }

    pub fn existing(&self, session: &str) -> Option<Arc<ViewController>> {
        self.lock_sessions()
            .entries
            .get(session)
            .map(|entry| Arc::clone(&entry.controller))
    }

    pub fn session_count(&self) -> usize {
        self.lock_sessions().entries.len()
    }

    fn lock_sessions(&self) -> std::sync::MutexGuard<'_, Sessions> {
        match self.sessions.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ViewResponse {
    pub superseded: bool,
    pub cycle: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view: Option<View>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<RenderedFragments>,
}

impl ViewResponse {
    fn published(published: &PublishedView, renderer: &Renderer) -> Result<Self> {
        Ok(Self {
            superseded: false,
            cycle: published.cycle,
            view: Some(published.view.clone()),
            html: Some(renderer.fragments(&published.view)?),
        })
    }

    fn superseded(cycle: u64) -> Self {
        Self {
            superseded: true,
            cycle,
            view: None,
            html: None,
        }
    }
}

impl IntoResponse for DashboardError {
    fn into_response(self) -> Response {
        let status = match self {
            DashboardError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
            DashboardError::Timeout(..) => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({"error": self.to_string()}))).into_response()
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/api/defaults", get(defaults))
        .route("/api/session/:id/query", post(submit_query))
        .route("/api/session/:id/view", get(current_view))
        .with_state(state)
}

/// Bind the configured address and serve until the process stops.
pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr).await?;
    info!("Dashboard listening on http://{}", listener.local_addr()?);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn check_session_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(DashboardError::InvalidQuery(format!("invalid session id `{}`", id)))
    }
}

async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>> {
    let page = state.renderer.index(&state.config, Local::now().date_naive())?;
    Ok(Html(page))
}

async fn defaults(State(state): State<Arc<AppState>>) -> Json<Query> {
    Json(Query::default_at(&state.config, Local::now().date_naive()))
}

async fn submit_query(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(input): Json<QueryInput>,
) -> Result<Json<ViewResponse>> {
    check_session_id(&id)?;
    let query = Query::try_from(input)?;
    let controller = state.controller(&id);

    let response = match controller.submit(query).await {
        CycleOutcome::Published(published) => ViewResponse::published(&published, &state.renderer)?,
        CycleOutcome::Superseded { cycle } => ViewResponse::superseded(cycle),
    };
    Ok(Json(response))
}

async fn current_view(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    if let Err(e) = check_session_id(&id) {
        return e.into_response();
    }
    match state.existing(&id).and_then(|controller| controller.visible()) {
        Some(published) => match ViewResponse::published(&published, &state.renderer) {
            Ok(response) => Json(response).into_response(),
            Err(e) => e.into_response(),
        },
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": format!("session `{}` has no view yet", id)})),
        )
            .into_response(),
    }
}
