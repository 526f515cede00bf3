use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wayfare_api::{app, AppState};
use wayfare_catalog::{InMemoryCatalog, Offering};
use wayfare_core::TravelMode;
use wayfare_order::{BookingSession, SessionOptions, SimulatedPaymentAdapter};

fn flight(id: &str, from: &str, to: &str, class: &str, price: f64) -> Offering {
    Offering {
        id: id.to_string(),
        mode: TravelMode::Flight,
        carrier: "Atlantic Air".to_string(),
        service_number: "AA100".to_string(),
        from: from.to_string(),
        from_code: "JFK".to_string(),
        to: to.to_string(),
        to_code: "LHR".to_string(),
        departure: "08:00".to_string(),
        arrival: "20:00".to_string(),
        duration: "7h 00m".to_string(),
        travel_class: class.to_string(),
        price,
        available_seats: 42,
    }
}

fn test_app(catalog: InMemoryCatalog) -> Router {
    test_app_with_payment_delay(catalog, Duration::from_millis(1))
}

fn test_app_with_payment_delay(catalog: InMemoryCatalog, delay: Duration) -> Router {
    let session = BookingSession::new(SessionOptions {
        seed: Some(9),
        ..SessionOptions::default()
    });
    let state = AppState::new(
        session,
        Arc::new(catalog),
        Arc::new(SimulatedPaymentAdapter::new(delay)),
    )
    .with_today(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
    app(state)
}

fn catalog() -> InMemoryCatalog {
    InMemoryCatalog::new()
        .with_offering(flight("FL001", "New York (NYC)", "London (LON)", "Economy", 500.0))
        .with_offering(flight("FL002", "New York (NYC)", "London (LON)", "Business", 1500.0))
}

fn search_body() -> Value {
    json!({
        "from": "NYC",
        "to": "LON",
        "date": "2025-06-01",
        "class": "Economy",
        "type": "flight"
    })
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Option<String>, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let location = response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, location, json)
}

#[tokio::test]
async fn test_full_booking_flow() {
    let app = test_app(catalog());

    let (status, _, body) = send(&app, "POST", "/v1/search", Some(search_body())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["outcome"]["state"], "ready");
    // Cheapest first
    assert_eq!(body["results"][0]["id"], "FL001");

    let (status, _, body) = send(&app, "POST", "/v1/draft", Some(json!({"offering_id": "FL001"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["status"], "OFFERING_SELECTED");
    assert_eq!(body["draft"]["passengers"].as_array().unwrap().len(), 1);

    let (status, _, body) = send(
        &app,
        "PUT",
        "/v1/draft/passengers",
        Some(json!({
            "passengers": [
                {"name": "Jane Doe", "age": 34, "gender": "female"},
                {"name": "John Doe", "age": 36, "gender": "male"}
            ],
            "email": "jane@example.com"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["status"], "PASSENGERS_ATTACHED");
    assert_eq!(body["running_total"], 1000.0);

    let (status, _, body) = send(&app, "GET", "/v1/draft/seats", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["required"], 2);
    assert_eq!(body["rows"].as_array().unwrap().len(), 20);
    let available: Vec<String> = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row["seats"].as_array().unwrap().iter())
        .filter(|seat| seat["status"] == "available")
        .take(3)
        .map(|seat| seat["id"].as_str().unwrap().to_string())
        .collect();

    for seat in &available[..2] {
        let (status, _, body) = send(&app, "POST", "/v1/draft/seats/toggle", Some(json!({"seat": seat}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "selected");
    }
    // Third seat exceeds the passenger count
    let (status, _, _) = send(&app, "POST", "/v1/draft/seats/toggle", Some(json!({"seat": available[2]}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, "POST", "/v1/draft/seats/confirm", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["status"], "SEATS_ATTACHED");

    let (status, _, body) = send(&app, "GET", "/v1/draft/payment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["fare"]["base"], 1000.0);
    assert_eq!(body["fare"]["total"], 1100.0);

    let (status, _, body) = send(&app, "POST", "/v1/draft/payment", None).await;
    assert_eq!(status, StatusCode::CREATED);
    let booking = &body["booking"];
    assert_eq!(booking["total_amount"], 1000.0);
    assert_eq!(booking["status"], "confirmed");
    assert!(booking["pnr"].as_str().unwrap().starts_with("PNR"));
    assert_eq!(booking["seats"].as_array().unwrap().len(), 2);
    let id = booking["id"].as_str().unwrap().to_string();

    // Draft is gone
    let (status, location, _) = send(&app, "GET", "/v1/draft/payment", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));

    let (status, _, body) = send(&app, "GET", &format!("/v1/bookings/{}/ticket", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let qr: Value = serde_json::from_str(body["qr_payload"].as_str().unwrap()).unwrap();
    assert_eq!(qr["from"], "JFK");
    assert_eq!(qr["date"], "2025-06-01");

    let (status, _, body) = send(&app, "POST", &format!("/v1/bookings/{}/cancel", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _, body) = send(&app, "GET", &format!("/v1/bookings/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "cancelled");

    let (status, _, body) = send(&app, "GET", "/v1/bookings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);

    let (status, _, _) = send(&app, "GET", &format!("/v1/bookings/{}/ticket", id), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_steps_redirect_without_state() {
    let app = test_app(catalog());

    for uri in ["/v1/results", "/v1/draft", "/v1/draft/seats", "/v1/draft/payment"] {
        let (status, location, body) = send(&app, "GET", uri, None).await;
        assert_eq!(status, StatusCode::SEE_OTHER, "{}", uri);
        assert_eq!(location.as_deref(), Some("/"));
        assert_eq!(body["redirect"], "/");
    }

    let (status, location, _) = send(&app, "GET", "/v1/bookings/BK1/ticket", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/my-bookings"));

    let (status, _, _) = send(&app, "POST", "/v1/bookings/BK1/cancel", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_search_validation_and_sorting() {
    let app = test_app(catalog());

    let mut past = search_body();
    past["date"] = json!("2024-12-31");
    let (status, _, _) = send(&app, "POST", "/v1/search", Some(past)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut blank = search_body();
    blank["from"] = json!("");
    let (status, _, _) = send(&app, "POST", "/v1/search", Some(blank)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    send(&app, "POST", "/v1/search", Some(search_body())).await;
    let (status, _, body) = send(&app, "GET", "/v1/results?sort=departure", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sort"], "departure");

    let (status, _, _) = send(&app, "GET", "/v1/results?sort=nonsense", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, "GET", "/v1/classes/train", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["classes"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_unavailable_catalog() {
    let app = test_app(InMemoryCatalog::offline());

    let (status, _, _) = send(&app, "POST", "/v1/search", Some(search_body())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // The failed search still leaves an empty result set to show
    let (status, _, body) = send(&app, "GET", "/v1/results", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["outcome"]["state"], "failed");
}

#[tokio::test]
async fn test_passenger_form_editing() {
    let app = test_app(catalog());
    send(&app, "POST", "/v1/search", Some(search_body())).await;
    let (_, _, body) = send(&app, "POST", "/v1/draft", Some(json!({"offering_id": "FL001"}))).await;
    let first = body["draft"]["passengers"][0]["id"].as_str().unwrap().to_string();

    // Can't remove the only passenger
    let (status, _, _) = send(&app, "DELETE", &format!("/v1/draft/passengers/{}", first), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, added) = send(&app, "POST", "/v1/draft/passengers", None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(added["age"], 18);

    // Blank names are rejected on attach
    let (status, _, _) = send(&app, "PUT", "/v1/draft/passengers", Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(
        &app,
        "PATCH",
        &format!("/v1/draft/passengers/{}", first),
        Some(json!({"name": "Jane Doe"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["passengers"][0]["name"], "Jane Doe");
    assert_eq!(body["running_total"], 1000.0);

    let (status, _, _) = send(&app, "DELETE", &format!("/v1/draft/passengers/{}", added["id"].as_str().unwrap()), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _, _) = send(&app, "DELETE", "/v1/draft", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, _) = send(&app, "GET", "/v1/draft", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
}

async fn drive_to_payment(app: &Router) {
    let (status, _, _) = send(app, "POST", "/v1/search", Some(search_body())).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(app, "POST", "/v1/draft", Some(json!({"offering_id": "FL001"}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(
        app,
        "PUT",
        "/v1/draft/passengers",
        Some(json!({"passengers": [{"name": "Jane Doe", "age": 34, "gender": "female"}]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(app, "GET", "/v1/draft/seats", None).await;
    let seat = body["rows"]
        .as_array()
        .unwrap()
        .iter()
        .flat_map(|row| row["seats"].as_array().unwrap().iter())
        .find(|seat| seat["status"] == "available")
        .map(|seat| seat["id"].as_str().unwrap().to_string())
        .unwrap();
    let (status, _, _) = send(app, "POST", "/v1/draft/seats/toggle", Some(json!({"seat": seat}))).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _, _) = send(app, "POST", "/v1/draft/seats/confirm", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_dropped_payment_request_still_settles() {
    let app = test_app_with_payment_delay(catalog(), Duration::from_millis(200));
    drive_to_payment(&app).await;

    // Client gives up long before the charge completes
    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        send(&app, "POST", "/v1/draft/payment", None),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(600)).await;

    let (status, _, body) = send(&app, "GET", "/v1/bookings", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["bookings"][0]["status"], "confirmed");

    // Session is usable again
    let (status, _, _) = send(&app, "DELETE", "/v1/draft", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _, body) = send(&app, "POST", "/v1/draft", Some(json!({"offering_id": "FL001"}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["status"], "OFFERING_SELECTED");
}

#[tokio::test]
async fn test_toggle_after_confirm_requires_reconfirm() {
    let app = test_app(catalog());
    drive_to_payment(&app).await;

    let (_, _, body) = send(&app, "GET", "/v1/draft", None).await;
    let seat = body["draft"]["seats"][0].as_str().unwrap().to_string();

    let (status, _, body) = send(&app, "POST", "/v1/draft/seats/toggle", Some(json!({"seat": seat}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["action"], "deselected");

    let (status, _, body) = send(&app, "GET", "/v1/draft", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["draft"]["status"], "PASSENGERS_ATTACHED");
    assert_eq!(body["draft"]["seats"].as_array().unwrap().len(), 0);

    let (status, location, _) = send(&app, "POST", "/v1/draft/payment", None).await;
    assert_eq!(status, StatusCode::SEE_OTHER);
    assert_eq!(location.as_deref(), Some("/"));
}
