use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use wayfare_order::{Booking, TicketView};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BookingsResponse {
    pub count: usize,
    /// Newest first.
    pub bookings: Vec<Booking>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", get(list_bookings))
        .route("/v1/bookings/{id}", get(get_booking))
        .route("/v1/bookings/{id}/cancel", post(cancel_booking))
        .route("/v1/bookings/{id}/ticket", get(get_ticket))
}

async fn list_bookings(State(state): State<AppState>) -> Json<BookingsResponse> {
    let bookings = state.session.lock().await.bookings();
    Json(BookingsResponse {
        count: bookings.len(),
        bookings,
    })
}

async fn get_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let session = state.session.lock().await;
    Ok(Json(session.lookup(&id)?.clone()))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.session.lock().await.cancel_booking(&id)?))
}

async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    Ok(Json(state.session.lock().await.ticket(&id)?))
}
