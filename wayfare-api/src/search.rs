use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use wayfare_catalog::Offering;
use wayfare_core::{SearchQuery, SortKey, TravelMode};
use wayfare_offer::SearchOutcome;
use wayfare_order::BookingSession;

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ResultsResponse {
    pub query: Option<SearchQuery>,
    pub outcome: SearchOutcome,
    pub sort: SortKey,
    pub count: usize,
    pub results: Vec<Offering>,
}

#[derive(Debug, Deserialize)]
pub struct ResultsParams {
    pub sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ClassesResponse {
    pub mode: TravelMode,
    pub classes: Vec<&'static str>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/search", post(search))
        .route("/v1/results", get(results))
        .route("/v1/classes/{mode}", get(classes))
}

fn results_view(session: &BookingSession, sort: SortKey) -> Result<ResultsResponse, AppError> {
    let results = session.results(sort)?;
    Ok(ResultsResponse {
        query: session.search_query().cloned(),
        outcome: session.search_outcome().clone(),
        sort,
        count: results.len(),
        results,
    })
}

/// Run a search and return its results sorted by price.
///
/// A search that was overtaken while the catalog was read returns whatever
/// the newer search has produced so far.
async fn search(
    State(state): State<AppState>,
    Json(query): Json<SearchQuery>,
) -> Result<Json<ResultsResponse>, AppError> {
    let ticket = state.session.lock().await.begin_search(query, state.today())?;

    let result = state.engine.execute(ticket.query()).await;

    let mut session = state.session.lock().await;
    if !session.complete_search(&ticket, result.clone()) {
        debug!("Search generation {} superseded", ticket.generation());
        return Ok(Json(results_view(&session, SortKey::default())?));
    }
    result?;

    info!("Search generation {} ready", ticket.generation());
    Ok(Json(results_view(&session, SortKey::default())?))
}

async fn results(
    State(state): State<AppState>,
    Query(params): Query<ResultsParams>,
) -> Result<Json<ResultsResponse>, AppError> {
    let sort = match params.sort.as_deref() {
        Some(raw) => raw.parse::<SortKey>()?,
        None => SortKey::default(),
    };
    let session = state.session.lock().await;
    Ok(Json(results_view(&session, sort)?))
}

async fn classes(Path(mode): Path<TravelMode>) -> Json<ClassesResponse> {
    Json(ClassesResponse {
        mode,
        classes: mode.classes().to_vec(),
    })
}
