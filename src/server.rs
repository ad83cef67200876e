use axum::{
    Form, Json, Router,
    extract::{Path, State, rejection::FormRejection},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::AppState;
use crate::client::{HttpQueryClient, QueryClient};
use crate::config::AppConfig;
use crate::render;
use crate::store::WidgetStore;
use crate::widget::{Message, WidgetHandle};

/// Start the Axum server with the provided configuration.
pub async fn start_server(config: Arc<AppConfig>) -> anyhow::Result<()> {
    let endpoint = config.query_endpoint()?;
    let client = match config.query_timeout() {
        Some(timeout) => HttpQueryClient::with_timeout(endpoint, timeout)?,
        None => HttpQueryClient::with_client(endpoint, reqwest::Client::new()),
    };

    info!(
        name: "query.config.loaded",
        endpoint = %client.endpoint(),
        timeout_secs = ?config.query.timeout_secs,
        "Query endpoint configured"
    );

    let client: Arc<dyn QueryClient> = Arc::new(client);
    let limits = config.store_limits();
    let widgets = WidgetStore::with_limits(client, limits);
    // Sweep twice per idle period so nothing outlives it by more than half.
    let _sweeper = widgets.spawn_sweeper(limits.idle_timeout / 2);
    let state = AppState::new(widgets, Arc::clone(&config));

    let app = router(state).nest_service("/static", ServeDir::new("static"));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(
        name: "server.started",
        address = %addr,
        "Server started"
    );

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

/// Build the widget routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        // HTML pages and fragments
        .route("/", get(index_handler))
        .route("/widget/{id}/toggle", post(toggle_handler))
        .route("/widget/{id}/close", post(close_handler))
        .route("/widget/{id}/draft", post(draft_handler))
        .route("/widget/{id}/send", post(send_handler))
        .route("/widget/{id}/keypress", post(keypress_handler))
        .route("/widget/{id}/messages", get(messages_handler))
        .route("/widget/{id}/unmount", post(unmount_handler))
        // JSON API
        .route("/api/widgets/{id}", get(api_get_widget))
        .route("/api/widgets/{id}", delete(api_delete_widget))
        .route("/health", get(|| async { "ok" }))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTML Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Form body carrying the input field.
#[derive(Debug, Deserialize)]
struct DraftForm {
    #[serde(default)]
    message: String,
}

/// Form body sent with the panel buttons; carries the input field when the
/// button includes it.
#[derive(Debug, Deserialize)]
struct PanelForm {
    message: Option<String>,
}

/// Form body for a key press in the input field.
#[derive(Debug, Deserialize)]
struct KeyPressForm {
    key: String,
    #[serde(default)]
    message: String,
}

fn lookup(state: &AppState, id: Uuid) -> Result<WidgetHandle, StatusCode> {
    state.widgets.get(id).ok_or(StatusCode::NOT_FOUND)
}

/// Keep whatever the input field held when a panel button was pressed.
fn keep_draft(widget: &WidgetHandle, form: Result<Form<PanelForm>, FormRejection>) {
    if let Ok(Form(PanelForm {
        message: Some(message),
    })) = form
    {
        widget.set_draft(message);
    }
}

fn widget_fragment(state: &AppState, id: Uuid, widget: &WidgetHandle) -> Html<String> {
    Html(render::widget(id, &widget.snapshot(), &state.settings))
}

/// GET / - Mount a new widget and return the host page.
async fn index_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (id, widget) = state.widgets.create();
    Html(render::page(id, &widget.snapshot(), &state.settings))
}

/// POST /widget/:id/toggle - Open or close the panel.
async fn toggle_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: Result<Form<PanelForm>, FormRejection>,
) -> Result<Html<String>, StatusCode> {
    let widget = lookup(&state, id)?;
    keep_draft(&widget, form);
    widget.toggle();
    Ok(widget_fragment(&state, id, &widget))
}

/// POST /widget/:id/close - Close the panel.
async fn close_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    form: Result<Form<PanelForm>, FormRejection>,
) -> Result<Html<String>, StatusCode> {
    let widget = lookup(&state, id)?;
    keep_draft(&widget, form);
    widget.close();
    Ok(widget_fragment(&state, id, &widget))
}

/// POST /widget/:id/draft - Store the draft without submitting.
async fn draft_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<DraftForm>,
) -> Result<StatusCode, StatusCode> {
    lookup(&state, id)?.set_draft(form.message);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /widget/:id/send - Submit the input field.
async fn send_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<DraftForm>,
) -> Result<Html<String>, StatusCode> {
    let widget = lookup(&state, id)?;
    // The reply settles in the background; the fragment polls for it.
    let _ = widget.send_draft(form.message);
    Ok(widget_fragment(&state, id, &widget))
}

/// POST /widget/:id/keypress - Key press in the input field.
async fn keypress_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Form(form): Form<KeyPressForm>,
) -> Result<Html<String>, StatusCode> {
    let widget = lookup(&state, id)?;
    let _ = widget.key_press_with_draft(&form.key, form.message);
    Ok(widget_fragment(&state, id, &widget))
}

/// GET /widget/:id/messages - Message list fragment.
async fn messages_handler(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Html<String>, StatusCode> {
    let widget = lookup(&state, id)?;
    Ok(Html(render::message_list(
        id,
        &widget.snapshot(),
        &state.settings,
    )))
}

/// POST /widget/:id/unmount - Page is going away; drop its widget.
///
/// Sent with `navigator.sendBeacon`, which can only POST.
async fn unmount_handler(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    unmount(&state, id)
}

fn unmount(state: &AppState, id: Uuid) -> StatusCode {
    match state.widgets.remove(id) {
        Some(_) => StatusCode::NO_CONTENT,
        None => StatusCode::NOT_FOUND,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Widget DTO for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct WidgetDto {
    pub id: Uuid,
    pub open: bool,
    pub loading: bool,
    pub draft: String,
    pub messages: Vec<MessageDto>,
}

/// Message DTO for API responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageDto {
    pub sender: String,
    pub text: String,
}

impl From<&Message> for MessageDto {
    fn from(message: &Message) -> Self {
        Self {
            sender: message.sender().as_str().to_string(),
            text: message.text().to_string(),
        }
    }
}

/// GET /api/widgets/:id - Current widget state.
async fn api_get_widget(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WidgetDto>, StatusCode> {
    let snapshot = lookup(&state, id)?.snapshot();
    Ok(Json(WidgetDto {
        id,
        open: snapshot.is_open(),
        loading: snapshot.is_loading(),
        draft: snapshot.draft().to_string(),
        messages: snapshot.messages().iter().map(MessageDto::from).collect(),
    }))
}

/// DELETE /api/widgets/:id - Unmount a widget.
async fn api_delete_widget(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    unmount(&state, id)
}
