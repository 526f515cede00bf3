use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wayfare_api::{app, AppState};
use wayfare_catalog::FareConfig;
use wayfare_order::{BookingSession, SessionOptions, SimulatedPaymentAdapter};
use wayfare_store::{Config, JsonCatalogSource};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wayfare_api=debug,wayfare_order=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!("Starting Wayfare API on port {}", config.server.port);
    tracing::info!("Reading catalog from {}", config.catalog.data_dir.display());

    let booking = &config.booking;
    let session = BookingSession::new(SessionOptions {
        seat_capacity: booking.seat_capacity,
        prebooked_ratio: booking.prebooked_ratio,
        seed: booking.seat_seed,
        fare: FareConfig {
            tax_rate: booking.tax_rate,
            currency: booking.currency.clone(),
        },
    });

    let app_state = AppState::new(
        session,
        Arc::new(JsonCatalogSource::new(config.catalog.data_dir.clone())),
        Arc::new(SimulatedPaymentAdapter::new(Duration::from_millis(booking.payment_delay_ms))),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(app_state)).await?;
    Ok(())
}
