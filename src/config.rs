use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::Timeframe;

/// Environment variables with this prefix override file and default values,
/// e.g. `GOLDSIGNAL_MIN_CONFIRMATIONS=4`
pub const ENV_PREFIX: &str = "GOLDSIGNAL";

/// Engine configuration. Every key has a default tuned for XAU/USD.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    // Gate
    pub min_confirmations: usize,
    pub max_conflict_ratio: f64, // opposing weight / dominant weight
    pub news_veto_high_impact: u32, // high-impact items for opposing news to block

    // Extraction
    pub rsi_bullish_above: f64,
    pub rsi_bearish_below: f64,
    pub proximity_tolerance_pips: f64,
    pub news_sentiment_weight: f64,
    pub entry_timeframe: Timeframe,

    // Instrument
    pub pip_size: f64,            // $0.01 for gold
    pub contract_multiplier: f64, // ounces per standard lot
    pub lot_step: f64,
    pub min_lots: f64,
    pub balance_per_max_lot: f64, // 1 lot allowed per this much balance

    // Stops
    pub min_stop_distance_pips: f64,
    pub max_stop_distance_pips: f64,
    pub default_stop_distance_pips: f64, // used when no structural level is available
    pub psychological_tolerance_pips: f64,
    pub psychological_buffer_pips: f64,

    // Targets
    pub min_risk_reward: f64,
    pub extra_targets: usize,
    pub target_extension_pips: f64,
    pub require_structural_room: bool,

    // Risk context defaults for callers building a fresh day
    pub account_balance: f64,
    pub risk_percentage: f64,
    pub max_daily_trades: u32,
    pub max_daily_loss_percent: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_confirmations: 3,
            max_conflict_ratio: 0.5,
            news_veto_high_impact: 2,

            rsi_bullish_above: 55.0,
            rsi_bearish_below: 45.0,
            proximity_tolerance_pips: 20.0,
            news_sentiment_weight: 0.3,
            entry_timeframe: Timeframe::M15,

            pip_size: 0.01,
            contract_multiplier: 100.0,
            lot_step: 0.01,
            min_lots: 0.01,
            balance_per_max_lot: 5000.0,

            min_stop_distance_pips: 150.0, // $1.50
            max_stop_distance_pips: 1000.0,
            default_stop_distance_pips: 300.0,
            psychological_tolerance_pips: 10.0,
            psychological_buffer_pips: 20.0,

            min_risk_reward: 2.0,
            extra_targets: 2,
            target_extension_pips: 50.0,
            require_structural_room: true,

            account_balance: 10000.0,
            risk_percentage: 2.0,
            max_daily_trades: 5,
            max_daily_loss_percent: 5.0,
        }
    }
}

impl EngineConfig {
    /// Layer defaults, an optional config file (format from its extension)
    /// and `GOLDSIGNAL_*` environment variables, then validate.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .context("failed to read engine configuration")?;

        let engine_config: EngineConfig = settings
            .try_deserialize()
            .context("failed to parse engine configuration")?;
        engine_config.validate()?;

        Ok(engine_config)
    }

    pub fn pips_to_price(&self, pips: f64) -> f64 {
        pips * self.pip_size
    }

    pub fn price_to_pips(&self, distance: f64) -> f64 {
        distance / self.pip_size
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let invalid = |msg: &str| Err(EngineError::InvalidConfig(msg.to_string()));

        let positive = [
            ("pip_size", self.pip_size),
            ("contract_multiplier", self.contract_multiplier),
            ("lot_step", self.lot_step),
            ("min_lots", self.min_lots),
            ("balance_per_max_lot", self.balance_per_max_lot),
            ("min_stop_distance_pips", self.min_stop_distance_pips),
            ("max_stop_distance_pips", self.max_stop_distance_pips),
            ("default_stop_distance_pips", self.default_stop_distance_pips),
            ("min_risk_reward", self.min_risk_reward),
            ("target_extension_pips", self.target_extension_pips),
            ("account_balance", self.account_balance),
            ("risk_percentage", self.risk_percentage),
            ("max_daily_loss_percent", self.max_daily_loss_percent),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }

        let non_negative = [
            ("proximity_tolerance_pips", self.proximity_tolerance_pips),
            ("news_sentiment_weight", self.news_sentiment_weight),
            ("psychological_tolerance_pips", self.psychological_tolerance_pips),
            ("psychological_buffer_pips", self.psychological_buffer_pips),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} must be zero or positive, got {value}"
                )));
            }
        }

        if self.min_confirmations == 0 {
            return invalid("min_confirmations must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.max_conflict_ratio) {
            return invalid("max_conflict_ratio must be within [0, 1]");
        }
        if self.rsi_bearish_below > self.rsi_bullish_above {
            return invalid("rsi_bearish_below must not exceed rsi_bullish_above");
        }
        if self.risk_percentage > 100.0 {
            return invalid("risk_percentage must not exceed 100");
        }

        Ok(())
    }
}
