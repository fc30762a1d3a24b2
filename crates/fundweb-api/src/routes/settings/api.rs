//! Settings API endpoints

use crate::AppState;
use axum::extract::State;
use axum::Json;
use fundweb_config::Config;
use fundweb_core::{InitiativeEditor, TransactionEditor, TransactionType, Viewer};
use serde::Serialize;

pub async fn api_settings(State(state): State<AppState>) -> Json<Config> {
    Json(state.config.clone())
}

/// What the initiative editor accepts
#[derive(Debug, Serialize)]
pub struct EditorInfo {
    pub application_class: &'static str,
    pub objects_description: &'static str,
    pub transaction_types: Vec<TransactionType>,
}

pub async fn api_editor(State(state): State<AppState>) -> Json<EditorInfo> {
    let store = state.store.read().await;
    let editor = InitiativeEditor::new(
        Viewer::omnipotent(),
        store.directory(),
        store.directory(),
        store.default_currency(),
    );
    Json(EditorInfo {
        application_class: editor.application_class(),
        objects_description: editor.objects_description(),
        transaction_types: editor.transaction_types(),
    })
}
