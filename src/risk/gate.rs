use crate::confirmation::AggregateScore;
use crate::models::{Direction, NewsSentiment};
use crate::risk::RiskContext;
use crate::signal::RejectionReason;

/// Hard pass/reject gate in front of sizing.
///
/// Checks run in a fixed order and the first failure wins. There is no
/// scoring here: a tripped risk limit stops the cycle regardless of how
/// strong the evidence is.
#[derive(Debug, Clone)]
pub struct SignalGate {
    pub min_confirmations: usize,
    pub max_conflict_ratio: f64,
    pub news_veto_high_impact: u32,
}

impl Default for SignalGate {
    fn default() -> Self {
        Self {
            min_confirmations: 3,
            max_conflict_ratio: 0.5,
            news_veto_high_impact: 2,
        }
    }
}

impl SignalGate {
    pub fn new(min_confirmations: usize, max_conflict_ratio: f64) -> Self {
        Self {
            min_confirmations,
            max_conflict_ratio,
            ..Default::default()
        }
    }

    pub fn with_news_veto(mut self, min_high_impact: u32) -> Self {
        self.news_veto_high_impact = min_high_impact;
        self
    }

    pub fn check(
        &self,
        score: &AggregateScore,
        risk: &RiskContext,
        news: Option<&NewsSentiment>,
    ) -> Result<Direction, RejectionReason> {
        self.check_confirmation_count(score)?;
        let direction = self.check_direction(score)?;
        self.check_news(direction, news)?;
        Self::check_trade_cap(risk)?;
        Self::check_loss_cap(risk)?;
        Ok(direction)
    }

    pub fn check_confirmation_count(&self, score: &AggregateScore) -> Result<(), RejectionReason> {
        if score.confirmations.len() < self.min_confirmations {
            return Err(RejectionReason::InsufficientConfirmations);
        }
        Ok(())
    }

    pub fn check_direction(&self, score: &AggregateScore) -> Result<Direction, RejectionReason> {
        match score.net_direction {
            Some(direction) if score.conflict_ratio <= self.max_conflict_ratio => Ok(direction),
            _ => Err(RejectionReason::DirectionalConflict),
        }
    }

    /// Heavy high-impact news against the technical direction counts as a conflict
    pub fn check_news(
        &self,
        direction: Direction,
        news: Option<&NewsSentiment>,
    ) -> Result<(), RejectionReason> {
        match news {
            Some(n) if n.vetoes(direction, self.news_veto_high_impact) => {
                tracing::warn!(
                    "News ({} bullish / {} bearish, {} high impact) opposes {:?} setup",
                    n.bullish_count,
                    n.bearish_count,
                    n.high_impact_count,
                    direction
                );
                Err(RejectionReason::DirectionalConflict)
            }
            _ => Ok(()),
        }
    }

    pub fn check_trade_cap(risk: &RiskContext) -> Result<(), RejectionReason> {
        if risk.trades_today >= risk.max_daily_trades {
            return Err(RejectionReason::DailyTradeCapReached);
        }
        Ok(())
    }

    pub fn check_loss_cap(risk: &RiskContext) -> Result<(), RejectionReason> {
        if risk.daily_pnl_percent <= -risk.max_daily_loss_percent {
            return Err(RejectionReason::DailyLossCapReached);
        }
        Ok(())
    }
}
