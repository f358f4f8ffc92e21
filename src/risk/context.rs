use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Account state and daily limits for one cycle.
///
/// The engine only reads this. The orchestrating caller owns the counters and
/// mutates them between cycles (after a trade is actually taken or closed).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskContext {
    pub account_balance: f64,
    pub risk_percentage: f64, // of balance, per trade
    pub trades_today: u32,
    pub daily_pnl_percent: f64,
    pub max_daily_trades: u32,
    pub max_daily_loss_percent: f64,
    #[serde(default = "today")]
    pub trading_day: NaiveDate,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

impl RiskContext {
    /// Fresh day with the default caps (5 trades, -5% loss)
    pub fn new(account_balance: f64, risk_percentage: f64) -> Self {
        Self {
            account_balance,
            risk_percentage,
            trades_today: 0,
            daily_pnl_percent: 0.0,
            max_daily_trades: 5,
            max_daily_loss_percent: 5.0,
            trading_day: today(),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            max_daily_trades: config.max_daily_trades,
            max_daily_loss_percent: config.max_daily_loss_percent,
            ..Self::new(config.account_balance, config.risk_percentage)
        }
    }

    /// Account currency put at risk by a full-size trade
    pub fn risk_amount(&self) -> f64 {
        self.account_balance * self.risk_percentage / 100.0
    }

    /// Reset the same-day counters when the trading day changes.
    /// Returns true if a reset happened.
    pub fn roll_over(&mut self, day: NaiveDate) -> bool {
        if day == self.trading_day {
            return false;
        }

        tracing::info!(
            "New trading day {} (previous {}: {} trades, {:+.2}% P&L)",
            day,
            self.trading_day,
            self.trades_today,
            self.daily_pnl_percent
        );
        self.trading_day = day;
        self.trades_today = 0;
        self.daily_pnl_percent = 0.0;
        true
    }

    /// Called by the delivery side once a signal is actually acted upon
    pub fn record_trade_opened(&mut self) {
        self.trades_today += 1;
    }

    pub fn record_realized_pnl(&mut self, pnl_percent: f64) {
        self.daily_pnl_percent += pnl_percent;
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.account_balance.is_finite() && self.account_balance > 0.0) {
            return Err(EngineError::InvalidRiskContext(format!(
                "account_balance must be positive, got {}",
                self.account_balance
            )));
        }
        if !(self.risk_percentage.is_finite()
            && self.risk_percentage > 0.0
            && self.risk_percentage <= 100.0)
        {
            return Err(EngineError::InvalidRiskContext(format!(
                "risk_percentage must be within (0, 100], got {}",
                self.risk_percentage
            )));
        }
        if !self.daily_pnl_percent.is_finite() {
            return Err(EngineError::InvalidRiskContext(
                "daily_pnl_percent is not finite".to_string(),
            ));
        }
        if !(self.max_daily_loss_percent.is_finite() && self.max_daily_loss_percent >= 0.0) {
            return Err(EngineError::InvalidRiskContext(format!(
                "max_daily_loss_percent must be zero or positive, got {}",
                self.max_daily_loss_percent
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_amount() {
        let ctx = RiskContext::new(10000.0, 2.0);
        assert_eq!(ctx.risk_amount(), 200.0);
    }

    #[test]
    fn test_from_config_uses_configured_caps() {
        let config = EngineConfig {
            max_daily_trades: 3,
            max_daily_loss_percent: 2.5,
            ..Default::default()
        };
        let ctx = RiskContext::from_config(&config);
        assert_eq!(ctx.max_daily_trades, 3);
        assert_eq!(ctx.max_daily_loss_percent, 2.5);
        assert_eq!(ctx.account_balance, 10000.0);
    }

    #[test]
    fn test_roll_over_resets_counters_on_new_day() {
        let mut ctx = RiskContext::new(10000.0, 2.0);
        ctx.trading_day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        ctx.record_trade_opened();
        ctx.record_trade_opened();
        ctx.record_realized_pnl(-1.2);

        assert!(!ctx.roll_over(NaiveDate::from_ymd_opt(2024, 3, 4).unwrap()));
        assert_eq!(ctx.trades_today, 2);

        assert!(ctx.roll_over(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()));
        assert_eq!(ctx.trades_today, 0);
        assert_eq!(ctx.daily_pnl_percent, 0.0);
    }

    #[test]
    fn test_validate_rejects_zero_balance() {
        let ctx = RiskContext::new(0.0, 2.0);
        assert!(matches!(
            ctx.validate(),
            Err(EngineError::InvalidRiskContext(_))
        ));
    }

    #[test]
    fn test_validate_rejects_risk_over_hundred_percent() {
        let ctx = RiskContext::new(10000.0, 150.0);
        assert!(ctx.validate().is_err());
    }
}
