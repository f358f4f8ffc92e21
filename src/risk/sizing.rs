use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::Direction;
use crate::risk::RiskContext;
use crate::signal::RejectionReason;

/// Tolerance for comparing prices that went through float arithmetic
const PRICE_EPSILON: f64 = 1e-9;

/// Psychological levels for gold sit on whole dollars
const WHOLE_DOLLAR: f64 = 1.0;

/// Stop, targets and size for a trade that passed the gate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SizingPlan {
    pub stop_price: f64,
    pub stop_distance_pips: f64,
    pub target_prices: Vec<f64>, // nearest first
    pub position_size_lots: f64,
    pub risk_amount: f64, // with the rounded lot size
    pub risk_reward_ratio: f64,
}

/// Risk-reward ratios are compared and reported at this precision
pub fn round_ratio(ratio: f64) -> f64 {
    (ratio * 1e6).round() / 1e6
}

/// Gold position sizing and stop/target placement
///
/// # Formula
/// ```text
/// risk_amount = balance * risk_percentage / 100
/// lots        = risk_amount / (stop_distance * contract_multiplier)
/// ```
///
/// # Example
/// - Balance: $10,000, risk 2% ($200)
/// - Stop distance: $1.50 (150 pips)
/// - Lots: $200 / ($1.50 * 100 oz) = 1.33 lots
#[derive(Debug, Clone)]
pub struct RiskCalculator {
    config: EngineConfig,
}

impl RiskCalculator {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn size(
        &self,
        direction: Direction,
        entry: f64,
        levels: &[f64],
        risk: &RiskContext,
    ) -> Result<SizingPlan, RejectionReason> {
        let stop_price = self.place_stop(direction, entry, levels)?;
        let stop_distance = (entry - stop_price).abs();

        let first_target = entry + direction.sign() * self.config.min_risk_reward * stop_distance;

        if self.config.require_structural_room {
            if let Some(blocking) = self.blocking_level(direction, entry, first_target, levels) {
                let achievable = round_ratio(Self::risk_reward(entry, stop_price, blocking));
                tracing::debug!(
                    "Level {:.2} blocks the path to {:.2}: achievable R:R {:.2} < {:.2}",
                    blocking,
                    first_target,
                    achievable,
                    self.config.min_risk_reward
                );
                return Err(RejectionReason::RiskRewardBelowMinimum);
            }
        }

        let risk_reward_ratio = round_ratio(Self::risk_reward(entry, stop_price, first_target));
        if risk_reward_ratio < self.config.min_risk_reward {
            return Err(RejectionReason::RiskRewardBelowMinimum);
        }

        if first_target <= 0.0 {
            tracing::debug!("First target {:.2} is not a valid price", first_target);
            return Err(RejectionReason::RiskRewardBelowMinimum);
        }

        let target_prices = self.targets(direction, first_target, levels);
        let position_size_lots = self.position_size(stop_distance, risk);
        let risk_amount = position_size_lots * stop_distance * self.config.contract_multiplier;

        Ok(SizingPlan {
            stop_price,
            stop_distance_pips: self.config.price_to_pips(stop_distance),
            target_prices,
            position_size_lots,
            risk_amount,
            risk_reward_ratio,
        })
    }

    /// Structural stop, nudged off psychological levels, kept within the
    /// configured minimum and maximum distance from entry.
    pub fn place_stop(
        &self,
        direction: Direction,
        entry: f64,
        levels: &[f64],
    ) -> Result<f64, RejectionReason> {
        let min_distance = self.config.pips_to_price(self.config.min_stop_distance_pips);
        let max_distance = self.config.pips_to_price(self.config.max_stop_distance_pips);

        let raw = self.structural_stop(direction, entry, levels);
        let mut stop = self.adjust_for_psychological_level(direction, raw);

        if (entry - stop).abs() > max_distance {
            tracing::debug!(
                "Stop {:.2} wider than {} pips, tightening",
                stop,
                self.config.max_stop_distance_pips
            );
            stop = entry - direction.sign() * max_distance;
            // Tightening can land on a whole dollar; step back inside it
            if let Some(level) = self.nearby_whole_dollar(stop) {
                let buffer = self.config.pips_to_price(self.config.psychological_buffer_pips);
                stop = level + direction.sign() * buffer;
                tracing::debug!("Tightened stop sits on ${:.0}, moved to {:.2}", level, stop);
            }
        }

        if (entry - stop).abs() < min_distance - PRICE_EPSILON {
            if min_distance > max_distance + PRICE_EPSILON {
                tracing::warn!(
                    "Minimum stop distance ({} pips) exceeds the maximum ({} pips)",
                    self.config.min_stop_distance_pips,
                    self.config.max_stop_distance_pips
                );
                return Err(RejectionReason::StopBelowMinimumDistance);
            }
            tracing::debug!(
                "Stop {:.2} only {:.1} pips from entry, pushing out to {} pips",
                stop,
                self.config.price_to_pips((entry - stop).abs()),
                self.config.min_stop_distance_pips
            );
            stop = entry - direction.sign() * min_distance;
            // Pushing out can land on a whole dollar; step further past it
            let nudged = self.adjust_for_psychological_level(direction, stop);
            if (entry - nudged).abs() <= max_distance + PRICE_EPSILON {
                stop = nudged;
            }
        }

        if stop <= 0.0 {
            return Err(RejectionReason::StopBelowMinimumDistance);
        }

        Ok(stop)
    }

    /// Nearest level beyond entry on the losing side, or the default distance
    pub fn structural_stop(&self, direction: Direction, entry: f64, levels: &[f64]) -> f64 {
        let nearest = match direction {
            Direction::Bullish => levels
                .iter()
                .copied()
                .filter(|&l| l < entry)
                .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.max(l)))),
            Direction::Bearish => levels
                .iter()
                .copied()
                .filter(|&l| l > entry)
                .fold(None, |acc: Option<f64>, l| Some(acc.map_or(l, |a| a.min(l)))),
        };

        nearest.unwrap_or_else(|| {
            entry
                - direction.sign()
                    * self
                        .config
                        .pips_to_price(self.config.default_stop_distance_pips)
        })
    }

    /// Whole-dollar levels attract stop hunts; move a stop sitting near one
    /// to the far side of it.
    pub fn adjust_for_psychological_level(&self, direction: Direction, stop: f64) -> f64 {
        let Some(level) = self.nearby_whole_dollar(stop) else {
            return stop;
        };

        let buffer = self.config.pips_to_price(self.config.psychological_buffer_pips);
        let nudged = match direction {
            Direction::Bullish => stop.min(level - buffer),
            Direction::Bearish => stop.max(level + buffer),
        };
        if nudged != stop {
            tracing::debug!("Stop {:.2} near ${:.0}, moved to {:.2}", stop, level, nudged);
        }
        nudged
    }

    /// Whole-dollar level within the psychological tolerance of `price`
    fn nearby_whole_dollar(&self, price: f64) -> Option<f64> {
        let level = (price / WHOLE_DOLLAR).round() * WHOLE_DOLLAR;
        let tolerance = self.config.pips_to_price(self.config.psychological_tolerance_pips);
        ((price - level).abs() <= tolerance + PRICE_EPSILON).then_some(level)
    }

    /// First opposing level on the winning side that price meets before the first target
    fn blocking_level(
        &self,
        direction: Direction,
        entry: f64,
        first_target: f64,
        levels: &[f64],
    ) -> Option<f64> {
        let sign = direction.sign();
        levels
            .iter()
            .copied()
            .filter(|&l| (l - entry) * sign > PRICE_EPSILON)
            .filter(|&l| (first_target - l) * sign > PRICE_EPSILON)
            .fold(None, |acc: Option<f64>, l| match acc {
                Some(a) if (a - entry).abs() <= (l - entry).abs() => Some(a),
                _ => Some(l),
            })
    }

    /// First target plus structural levels beyond it, padded with fixed extensions
    pub fn targets(&self, direction: Direction, first_target: f64, levels: &[f64]) -> Vec<f64> {
        let sign = direction.sign();

        let mut beyond: Vec<f64> = levels
            .iter()
            .copied()
            .filter(|&l| (l - first_target) * sign > PRICE_EPSILON)
            .collect();
        beyond.sort_by(|a, b| ((a - first_target) * sign).total_cmp(&((b - first_target) * sign)));
        beyond.dedup_by(|a, b| (*a - *b).abs() <= PRICE_EPSILON);

        let extension = self.config.pips_to_price(self.config.target_extension_pips);
        let mut targets = Vec::with_capacity(self.config.extra_targets + 1);
        targets.push(first_target);

        let mut structural = beyond.into_iter();
        while targets.len() < self.config.extra_targets + 1 {
            let previous = targets[targets.len() - 1];
            let next = structural
                .next()
                .unwrap_or(previous + sign * extension);
            targets.push(next);
        }

        // Short extensions can run below zero near the floor
        targets.retain(|&t| t > 0.0);
        targets
    }

    /// Lots for the given stop distance, rounded down to the lot step and
    /// clamped to the instrument's minimum and the balance-based maximum.
    pub fn position_size(&self, stop_distance: f64, risk: &RiskContext) -> f64 {
        let raw = risk.risk_amount() / (stop_distance * self.config.contract_multiplier);
        let max_lots = self.floor_to_step(risk.account_balance / self.config.balance_per_max_lot);

        let mut lots = self.floor_to_step(raw);
        if lots > max_lots {
            tracing::warn!("Position size capped at {:.2} lots (balance limit)", max_lots);
            lots = max_lots;
        }
        if lots < self.config.min_lots {
            tracing::warn!(
                "Position size {:.4} lots below minimum, using {:.2}",
                raw,
                self.config.min_lots
            );
            lots = self.config.min_lots;
        }
        lots
    }

    fn floor_to_step(&self, lots: f64) -> f64 {
        let steps = (lots / self.config.lot_step + PRICE_EPSILON).floor();
        // Strip the float noise left by the multiplication
        ((steps * self.config.lot_step) * 1e8).round() / 1e8
    }

    pub fn risk_reward(entry: f64, stop: f64, target: f64) -> f64 {
        let risk = (entry - stop).abs();
        if risk == 0.0 {
            return 0.0;
        }
        (target - entry).abs() / risk
    }
}
