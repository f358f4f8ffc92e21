use serde::{Deserialize, Serialize};

use crate::confirmation::Confirmation;
use crate::models::Direction;

/// Weighted tally of a cycle's confirmations
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AggregateScore {
    pub bullish_weight: f64,
    pub bearish_weight: f64,
    pub confirmations: Vec<Confirmation>, // extraction order
    pub net_direction: Option<Direction>, // None on a tie
    pub conflict_ratio: f64,              // minority / majority weight, 0..=1
}

impl AggregateScore {
    pub fn count(&self) -> usize {
        self.confirmations.len()
    }

    pub fn total_weight(&self) -> f64 {
        self.bullish_weight + self.bearish_weight
    }

    pub fn weight_for(&self, direction: Direction) -> f64 {
        match direction {
            Direction::Bullish => self.bullish_weight,
            Direction::Bearish => self.bearish_weight,
        }
    }

    /// Confirmations agreeing with `direction`, heaviest first.
    /// Equal weights keep extraction order.
    pub fn ranked(&self, direction: Direction) -> Vec<Confirmation> {
        let mut agreeing: Vec<Confirmation> = self
            .confirmations
            .iter()
            .filter(|c| c.direction == direction)
            .cloned()
            .collect();
        agreeing.sort_by(|a, b| b.weight.total_cmp(&a.weight));
        agreeing
    }
}

/// Sum weights per direction and pick the heavier side
pub fn aggregate(confirmations: Vec<Confirmation>) -> AggregateScore {
    let (mut bullish_weight, mut bearish_weight) = (0.0, 0.0);
    for c in &confirmations {
        match c.direction {
            Direction::Bullish => bullish_weight += c.weight,
            Direction::Bearish => bearish_weight += c.weight,
        }
    }

    let net_direction = if bullish_weight > bearish_weight {
        Some(Direction::Bullish)
    } else if bearish_weight > bullish_weight {
        Some(Direction::Bearish)
    } else {
        None
    };

    let majority = f64::max(bullish_weight, bearish_weight);
    let conflict_ratio = if majority > 0.0 {
        f64::min(bullish_weight, bearish_weight) / majority
    } else {
        0.0
    };

    AggregateScore {
        bullish_weight,
        bearish_weight,
        confirmations,
        net_direction,
        conflict_ratio,
    }
}
