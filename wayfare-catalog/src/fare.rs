use serde::{Deserialize, Serialize};

/// Presentation-time pricing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FareConfig {
    /// Surcharge shown on top of the stored amount (0.10 = 10%).
    pub tax_rate: f64,
    pub currency: String,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            tax_rate: 0.10,
            currency: "USD".to_string(),
        }
    }
}

/// What the payment and ticket screens display for a stored amount.
///
/// The stored booking total is always `base`; taxes exist only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FareBreakdown {
    pub unit_price: f64,
    pub passengers: usize,
    pub base: f64,
    pub taxes: f64,
    pub total: f64,
    pub currency: String,
}

impl FareBreakdown {
    pub fn new(unit_price: f64, passengers: usize, config: &FareConfig) -> Self {
        let base = unit_price * passengers as f64;
        Self {
            unit_price,
            passengers,
            base,
            taxes: round_cents(base * config.tax_rate),
            total: round_cents(base * (1.0 + config.tax_rate)),
            currency: config.currency.clone(),
        }
    }
}

/// Stored amount for a booking: price times head count, no surcharge.
pub fn base_amount(unit_price: f64, passengers: usize) -> f64 {
    unit_price * passengers as f64
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}
