use serde::{Deserialize, Serialize};

use crate::confirmation::{AggregateScore, Confirmation};
use crate::models::Direction;
use crate::risk::sizing::round_ratio;
use crate::risk::{RiskCalculator, SizingPlan};
use crate::signal::Signal;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl SignalQuality {
    /// Points: agreeing count (>=5: 3, >=4: 2, >=3: 1), confidence
    /// (>=0.8: 2, >=0.6: 1), structural evidence 2, best R:R >= 2.5 1
    pub fn grade(agreeing: &[Confirmation], confidence: f64, risk_reward: f64) -> Self {
        let mut points = match agreeing.len() {
            n if n >= 5 => 3,
            4 => 2,
            3 => 1,
            _ => 0,
        };

        if confidence >= 0.8 {
            points += 2;
        } else if confidence >= 0.6 {
            points += 1;
        }

        if agreeing.iter().any(|c| c.source.is_structural()) {
            points += 2;
        }

        if risk_reward >= 2.5 {
            points += 1;
        }

        match points {
            p if p >= 7 => SignalQuality::Excellent,
            p if p >= 5 => SignalQuality::Good,
            p if p >= 3 => SignalQuality::Fair,
            _ => SignalQuality::Poor,
        }
    }
}

/// Share of the total weight behind `direction`
pub fn confidence(score: &AggregateScore, direction: Direction) -> f64 {
    let total = score.total_weight();
    if total > 0.0 {
        score.weight_for(direction) / total
    } else {
        0.0
    }
}

/// R:R at the last target. The first target always sits at the minimum ratio.
fn farthest_risk_reward(plan: &SizingPlan, entry_price: f64) -> f64 {
    plan.target_prices.last().map_or(plan.risk_reward_ratio, |&target| {
        round_ratio(RiskCalculator::risk_reward(entry_price, plan.stop_price, target))
    })
}

/// Fold a gate pass and its sizing plan into the final record
pub fn compose(
    direction: Direction,
    score: &AggregateScore,
    plan: SizingPlan,
    entry_price: f64,
) -> Signal {
    let confidence_score = confidence(score, direction);
    let agreeing: Vec<Confirmation> = score
        .confirmations
        .iter()
        .filter(|c| c.direction == direction)
        .cloned()
        .collect();
    let quality = SignalQuality::grade(
        &agreeing,
        confidence_score,
        farthest_risk_reward(&plan, entry_price),
    );

    Signal {
        direction,
        entry_price,
        stop_price: plan.stop_price,
        stop_distance_pips: plan.stop_distance_pips,
        target_prices: plan.target_prices,
        position_size_lots: plan.position_size_lots,
        risk_amount: plan.risk_amount,
        risk_reward_ratio: plan.risk_reward_ratio,
        confirmations_used: score.confirmations.clone(),
        confidence_score,
        quality,
    }
}
