use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use wayfare_catalog::{FareBreakdown, SeatMapView, SeatToggle};
use wayfare_order::{Booking, BookingDraft, Passenger, PassengerUpdate, Step, TripDetails};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SelectOfferingRequest {
    pub offering_id: String,
}

#[derive(Debug, Deserialize)]
pub struct AttachPassengersRequest {
    /// Replaces the form rows when present.
    pub passengers: Option<Vec<Passenger>>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ToggleSeatRequest {
    pub seat: String,
}

#[derive(Debug, Serialize)]
pub struct DraftResponse {
    pub draft: BookingDraft,
    /// `price x passengers`, before taxes.
    pub running_total: f64,
}

impl From<&BookingDraft> for DraftResponse {
    fn from(draft: &BookingDraft) -> Self {
        Self {
            draft: draft.clone(),
            running_total: draft.total_amount(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ToggleSeatResponse {
    pub seat: String,
    pub action: SeatToggle,
    pub selected: Vec<String>,
    pub required: usize,
}

#[derive(Debug, Serialize)]
pub struct PaymentSummaryResponse {
    pub trip: TripDetails,
    pub passengers: Vec<Passenger>,
    pub seats: Vec<String>,
    pub fare: FareBreakdown,
}

#[derive(Debug, Serialize)]
pub struct BookingCreatedResponse {
    pub booking: Booking,
    pub ticket_url: String,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/draft", post(select_offering).get(get_draft).delete(reset_draft))
        .route("/v1/draft/passengers", post(add_passenger).put(attach_passengers))
        .route("/v1/draft/passengers/{passenger_id}", patch(update_passenger).delete(remove_passenger))
        .route("/v1/draft/seats", get(seat_map))
        .route("/v1/draft/seats/toggle", post(toggle_seat))
        .route("/v1/draft/seats/confirm", post(confirm_seats))
        .route("/v1/draft/payment", get(payment_summary).post(pay))
}

async fn select_offering(
    State(state): State<AppState>,
    Json(req): Json<SelectOfferingRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let mut session = state.session.lock().await;
    let draft = session.select_offering(&req.offering_id)?;
    Ok(Json(draft.into()))
}

async fn get_draft(State(state): State<AppState>) -> Result<Json<DraftResponse>, AppError> {
    let session = state.session.lock().await;
    session.guard(Step::Passengers)?;
    let draft = session.draft().ok_or_else(|| AppError::NotFound("No booking in progress".to_string()))?;
    Ok(Json(draft.into()))
}

async fn reset_draft(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.session.lock().await.reset_draft()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_passenger(State(state): State<AppState>) -> Result<(StatusCode, Json<Passenger>), AppError> {
    let passenger = state.session.lock().await.add_passenger()?;
    Ok((StatusCode::CREATED, Json(passenger)))
}

async fn update_passenger(
    State(state): State<AppState>,
    Path(passenger_id): Path<String>,
    Json(update): Json<PassengerUpdate>,
) -> Result<Json<DraftResponse>, AppError> {
    let mut session = state.session.lock().await;
    session.update_passenger(&passenger_id, update)?;
    let draft = session.draft().ok_or_else(|| AppError::NotFound("No booking in progress".to_string()))?;
    Ok(Json(draft.into()))
}

async fn remove_passenger(
    State(state): State<AppState>,
    Path(passenger_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.session.lock().await.remove_passenger(&passenger_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn attach_passengers(
    State(state): State<AppState>,
    Json(req): Json<AttachPassengersRequest>,
) -> Result<Json<DraftResponse>, AppError> {
    let mut session = state.session.lock().await;
    session.attach_passengers(req.passengers)?;
    if req.email.is_some() || req.phone.is_some() {
        session.set_contact(req.email, req.phone)?;
    }
    let draft = session.draft().ok_or_else(|| AppError::NotFound("No booking in progress".to_string()))?;
    Ok(Json(draft.into()))
}

async fn seat_map(State(state): State<AppState>) -> Result<Json<SeatMapView>, AppError> {
    Ok(Json(state.session.lock().await.open_seat_map()?))
}

async fn toggle_seat(
    State(state): State<AppState>,
    Json(req): Json<ToggleSeatRequest>,
) -> Result<Json<ToggleSeatResponse>, AppError> {
    let mut session = state.session.lock().await;
    let action = session.toggle_seat(&req.seat)?;
    let map = session
        .seat_map()
        .ok_or_else(|| AppError::NotFound("Seat map is not open".to_string()))?;
    Ok(Json(ToggleSeatResponse {
        seat: req.seat,
        action,
        selected: map.selected().to_vec(),
        required: map.required(),
    }))
}

async fn confirm_seats(State(state): State<AppState>) -> Result<Json<DraftResponse>, AppError> {
    let mut session = state.session.lock().await;
    let draft = session.confirm_seats()?;
    Ok(Json(draft.into()))
}

async fn payment_summary(State(state): State<AppState>) -> Result<Json<PaymentSummaryResponse>, AppError> {
    let session = state.session.lock().await;
    let fare = session.payment_summary()?;
    let draft = session.draft().ok_or_else(|| AppError::NotFound("No booking in progress".to_string()))?;
    Ok(Json(PaymentSummaryResponse {
        trip: draft.trip().clone(),
        passengers: draft.passengers().to_vec(),
        seats: draft.seats().to_vec(),
        fare,
    }))
}

/// Lock the draft, run the simulated charge with the session released, then
/// issue the booking. The charge runs on its own task so a dropped request
/// still settles or unlocks the draft.
async fn pay(State(state): State<AppState>) -> Result<(StatusCode, Json<BookingCreatedResponse>), AppError> {
    let ticket = state.session.lock().await.begin_payment()?;

    let task_state = state.clone();
    let payment = tokio::spawn(async move {
        match task_state.payments.settle(&ticket).await {
            Ok(confirmation) => {
                let issued = task_state.session.lock().await.complete_payment(&ticket, confirmation);
                if let Ok(booking) = &issued {
                    info!("Booking {} confirmed ({})", booking.id, booking.pnr);
                }
                issued.map_err(AppError::from)
            }
            Err(e) => {
                warn!("Payment {} failed, unlocking draft", ticket.intent.id);
                task_state.session.lock().await.abort_payment(&ticket);
                Err(AppError::from(e))
            }
        }
    });

    let booking = payment
        .await
        .map_err(|e| AppError::from(anyhow::Error::new(e).context("payment task failed")))??;

    let ticket_url = format!("/v1/bookings/{}/ticket", booking.id);
    Ok((StatusCode::CREATED, Json(BookingCreatedResponse { booking, ticket_url })))
}
