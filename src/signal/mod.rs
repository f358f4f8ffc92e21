// Signal records and the per-cycle engine
pub mod composer;
pub mod engine;

pub use composer::{compose, SignalQuality};
pub use engine::SignalEngine;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::confirmation::Confirmation;
use crate::models::Direction;

/// Why a cycle produced no trade. These are normal outcomes, not errors.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    InsufficientConfirmations,
    DirectionalConflict,
    DailyTradeCapReached,
    DailyLossCapReached,
    RiskRewardBelowMinimum,
    StopBelowMinimumDistance,
}

impl RejectionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::InsufficientConfirmations => "insufficient_confirmations",
            RejectionReason::DirectionalConflict => "directional_conflict",
            RejectionReason::DailyTradeCapReached => "daily_trade_cap_reached",
            RejectionReason::DailyLossCapReached => "daily_loss_cap_reached",
            RejectionReason::RiskRewardBelowMinimum => "risk_reward_below_minimum",
            RejectionReason::StopBelowMinimumDistance => "stop_below_minimum_distance",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rejection {
    pub reasons: BTreeSet<RejectionReason>,
    pub confirmation_count: usize,
}

impl Rejection {
    pub fn new(reason: RejectionReason, confirmation_count: usize) -> Self {
        Self {
            reasons: BTreeSet::from([reason]),
            confirmation_count,
        }
    }

    pub fn has(&self, reason: RejectionReason) -> bool {
        self.reasons.contains(&reason)
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reasons: Vec<&str> = self.reasons.iter().map(|r| r.as_str()).collect();
        write!(
            f,
            "REJECTED [{}] ({} confirmations)",
            reasons.join(", "),
            self.confirmation_count
        )
    }
}

/// A fully sized trade idea. Never mutated after composition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_price: f64,
    pub stop_distance_pips: f64,
    pub target_prices: Vec<f64>, // nearest first
    pub position_size_lots: f64,
    pub risk_amount: f64,
    pub risk_reward_ratio: f64,
    pub confirmations_used: Vec<Confirmation>,
    pub confidence_score: f64, // 0..=1
    pub quality: SignalQuality,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let targets: Vec<String> = self
            .target_prices
            .iter()
            .map(|t| format!("{:.2}", t))
            .collect();
        write!(
            f,
            "{:?} @ {:.2} | SL {:.2} ({:.0} pips) | TP {} | {:.2} lots | R:R {:.2} | conf {:.0}% | {:?}",
            self.direction,
            self.entry_price,
            self.stop_price,
            self.stop_distance_pips,
            targets.join(" / "),
            self.position_size_lots,
            self.risk_reward_ratio,
            self.confidence_score * 100.0,
            self.quality
        )
    }
}

/// Result of one analysis cycle: exactly one of the two
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Signal(Signal),
    Rejection(Rejection),
}

impl Outcome {
    pub fn signal(&self) -> Option<&Signal> {
        match self {
            Outcome::Signal(s) => Some(s),
            Outcome::Rejection(_) => None,
        }
    }

    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Outcome::Signal(_) => None,
            Outcome::Rejection(r) => Some(r),
        }
    }

    pub fn is_signal(&self) -> bool {
        matches!(self, Outcome::Signal(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Signal(s) => s.fmt(f),
            Outcome::Rejection(r) => r.fmt(f),
        }
    }
}
