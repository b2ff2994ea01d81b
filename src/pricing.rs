//! Money rounding and the order total check.
//!
//! Order totals are computed by the client and accepted as submitted unless a
//! stricter [`TotalVerifier`] is installed on the application state.

use std::{fmt, str::FromStr, sync::Arc};

use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Round to whole cents, half away from zero.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Current catalog price for one ordered book id, `None` when the book is gone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricedLine {
    pub book_id: Uuid,
    pub price: Option<f64>,
}

/// Decides the total that gets persisted for a new order.
pub trait TotalVerifier: Send + Sync {
    /// Whether [`TotalVerifier::verify`] needs current catalog prices.
    fn requires_prices(&self) -> bool {
        false
    }

    fn verify(&self, submitted: f64, lines: &[PricedLine]) -> AppResult<f64>;
}

/// Keeps the client-submitted total untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct TrustSubmitted;

impl TotalVerifier for TrustSubmitted {
    fn verify(&self, submitted: f64, _lines: &[PricedLine]) -> AppResult<f64> {
        Ok(submitted)
    }
}

/// Replaces the submitted total with the sum of current `newPrice` values.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecomputeFromCatalog;

impl TotalVerifier for RecomputeFromCatalog {
    fn requires_prices(&self) -> bool {
        true
    }

    fn verify(&self, submitted: f64, lines: &[PricedLine]) -> AppResult<f64> {
        let mut total = 0.0;
        for line in lines {
            match line.price {
                Some(price) => total += price,
                None => {
                    return Err(AppError::validation(format!(
                        "order references unknown book {}",
                        line.book_id
                    )));
                }
            }
        }
        let total = round_to_cents(total);
        if round_to_cents(submitted) != total {
            tracing::warn!(submitted, recomputed = total, "submitted order total replaced");
        }
        Ok(total)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TotalPolicy {
    #[default]
    Trust,
    Recompute,
}

impl FromStr for TotalPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(TotalPolicy::Trust),
            "recompute" => Ok(TotalPolicy::Recompute),
            other => Err(anyhow::anyhow!(
                "ORDER_TOTAL_POLICY must be `trust` or `recompute`, got {other:?}"
            )),
        }
    }
}

impl fmt::Display for TotalPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TotalPolicy::Trust => f.write_str("trust"),
            TotalPolicy::Recompute => f.write_str("recompute"),
        }
    }
}

pub fn verifier_for(policy: TotalPolicy) -> Arc<dyn TotalVerifier> {
    match policy {
        TotalPolicy::Trust => Arc::new(TrustSubmitted),
        TotalPolicy::Recompute => Arc::new(RecomputeFromCatalog),
    }
}
