//! Initiative API endpoints - JSON API
//!
//! Endpoints:
//! - api_initiatives: list initiatives
//! - api_initiative_detail: single initiative
//! - api_initiative_create: create an initiative from a batch of transactions
//! - api_initiative_transactions: transaction log of an initiative
//! - api_initiative_edit: apply a batch of transactions

use crate::{ApiError, AppState};
use axum::extract::{Path, State};
use axum::Json;
use fundweb_config::CurrencyConfig;
use fundweb_core::{
    CoreError, DefaultErrorLogger, ErrorContext, ErrorLogger, Initiative, Phid, Transaction, TransactionType,
    TransactionValue, Viewer,
};
use serde::{Deserialize, Serialize};

/// Initiative with its total pre-formatted for display
#[derive(Debug, Serialize)]
pub struct InitiativeView {
    #[serde(flatten)]
    pub initiative: Initiative,
    pub total_display: String,
}

impl InitiativeView {
    fn new(initiative: &Initiative, currency: &CurrencyConfig) -> Self {
        Self {
            total_display: initiative.total.format(currency),
            initiative: initiative.clone(),
        }
    }
}

/// One proposed change in an edit request
#[derive(Debug, Deserialize)]
pub struct TransactionRequest {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    #[serde(default = "null_value")]
    pub value: TransactionValue,
}

fn null_value() -> TransactionValue {
    TransactionValue::Null
}

/// Body of create and edit requests
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    /// User performing the edit
    pub actor: Phid,
    pub transactions: Vec<TransactionRequest>,
}

impl EditRequest {
    fn into_parts(self) -> Result<(Viewer, Vec<Transaction>), ApiError> {
        if self.actor.is_empty() {
            return Err(ApiError::BadRequest {
                message: "actor is required".to_string(),
            });
        }
        let transactions = self
            .transactions
            .into_iter()
            .map(|t| Transaction::new(t.transaction_type, t.value))
            .collect();
        Ok((Viewer::new(self.actor), transactions))
    }
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub initiative: InitiativeView,
    pub transactions: Vec<Transaction>,
}

fn report(error: CoreError, context: &ErrorContext) -> ApiError {
    DefaultErrorLogger.log_error(&error, context);
    ApiError::Core(error)
}

pub async fn api_initiatives(State(state): State<AppState>) -> Json<Vec<InitiativeView>> {
    let store = state.store.read().await;
    Json(
        store
            .initiatives()
            .into_iter()
            .map(|i| InitiativeView::new(i, &state.config.currency))
            .collect(),
    )
}

pub async fn api_initiative_detail(
    State(state): State<AppState>,
    Path(phid): Path<String>,
) -> Result<Json<InitiativeView>, ApiError> {
    let store = state.store.read().await;
    let phid = Phid::new(phid);
    let initiative = store
        .initiative(&phid)
        .ok_or_else(|| CoreError::InitiativeNotFound { phid: phid.clone() })?;
    Ok(Json(InitiativeView::new(initiative, &state.config.currency)))
}

pub async fn api_initiative_transactions(
    State(state): State<AppState>,
    Path(phid): Path<String>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let store = state.store.read().await;
    let transactions = store.transactions(&Phid::new(phid))?;
    Ok(Json(transactions.to_vec()))
}

pub async fn api_initiative_create(
    State(state): State<AppState>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    let (actor, xactions) = request.into_parts()?;
    let context = ErrorContext::new("create_initiative").with_actor(actor.phid.clone());

    let mut store = state.store.write().await;
    let (initiative, transactions) = store
        .create_initiative(actor, xactions)
        .map_err(|e| report(e, &context))?;

    Ok(Json(EditResponse {
        initiative: InitiativeView::new(&initiative, &state.config.currency),
        transactions,
    }))
}

pub async fn api_initiative_edit(
    State(state): State<AppState>,
    Path(phid): Path<String>,
    Json(request): Json<EditRequest>,
) -> Result<Json<EditResponse>, ApiError> {
    let phid = Phid::new(phid);
    let (actor, xactions) = request.into_parts()?;
    let context = ErrorContext::new("edit_initiative")
        .with_actor(actor.phid.clone())
        .with_object(phid.clone());

    let mut store = state.store.write().await;
    let transactions = store
        .edit_initiative(actor, &phid, xactions)
        .map_err(|e| report(e, &context))?;
    let initiative = store.initiative(&phid).ok_or_else(|| ApiError::NotFound {
        resource: phid.to_string(),
    })?;

    Ok(Json(EditResponse {
        initiative: InitiativeView::new(initiative, &state.config.currency),
        transactions,
    }))
}
