use crate::config::EngineConfig;
use crate::confirmation::{aggregate, extract_cycle, AggregateScore, ExtractionRules};
use crate::error::EngineError;
use crate::models::{CycleInput, Timeframe};
use crate::risk::{RiskCalculator, SignalGate};
use crate::signal::{compose, Outcome, Rejection, RejectionReason};

/// One analysis cycle: extract -> aggregate -> gate -> size -> compose.
///
/// Holds only configuration, so a single engine can be shared across cycles
/// and threads. Account counters live in the caller's `RiskContext`.
#[derive(Debug, Clone)]
pub struct SignalEngine {
    config: EngineConfig,
    rules: ExtractionRules,
    gate: SignalGate,
    calculator: RiskCalculator,
}

impl SignalEngine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            rules: ExtractionRules::from_config(&config),
            gate: SignalGate::new(config.min_confirmations, config.max_conflict_ratio)
                .with_news_veto(config.news_veto_high_impact),
            calculator: RiskCalculator::new(config.clone()),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn evaluate(&self, input: &CycleInput) -> Result<Outcome, EngineError> {
        input.validate()?;

        let entry_price = input
            .snapshot(self.config.entry_timeframe)
            .map(|s| s.current_price)
            .ok_or(EngineError::MissingTimeframe(self.config.entry_timeframe))?;

        let score = aggregate(extract_cycle(input, &self.rules));
        tracing::debug!(
            "Aggregate: {} confirmations, bullish {:.2} vs bearish {:.2}, conflict {:.2}",
            score.count(),
            score.bullish_weight,
            score.bearish_weight,
            score.conflict_ratio
        );

        let direction = match self.gate.check(&score, &input.risk, input.news.as_ref()) {
            Ok(direction) => direction,
            Err(reason) => return Ok(Self::reject(reason, &score)),
        };

        let levels = support_resistance_union(input);
        let plan = match self
            .calculator
            .size(direction, entry_price, &levels, &input.risk)
        {
            Ok(plan) => plan,
            Err(reason) => return Ok(Self::reject(reason, &score)),
        };

        let signal = compose(direction, &score, plan, entry_price);
        tracing::info!("📈 Signal: {}", signal);
        Ok(Outcome::Signal(signal))
    }

    fn reject(reason: RejectionReason, score: &AggregateScore) -> Outcome {
        let rejection = Rejection::new(reason, score.count());
        tracing::info!("⏸️  {}", rejection);
        Outcome::Rejection(rejection)
    }
}

/// Every timeframe's S/R levels, highest timeframe first
fn support_resistance_union(input: &CycleInput) -> Vec<f64> {
    Timeframe::ALL
        .iter()
        .filter_map(|&tf| input.snapshot(tf))
        .flat_map(|s| s.support_resistance_levels.iter().copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Direction, NewsSentiment, TimeframeSnapshot, TrendDirection};
    use crate::risk::RiskContext;

    fn input() -> CycleInput {
        CycleInput {
            snapshots: Timeframe::ALL
                .iter()
                .map(|&tf| TimeframeSnapshot::neutral(tf, 2000.0))
                .collect(),
            risk: RiskContext::new(10000.0, 2.0),
            news: None,
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = EngineConfig {
            min_confirmations: 0,
            ..Default::default()
        };
        assert!(matches!(
            SignalEngine::new(config),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_timeframe_is_an_error_not_a_rejection() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let mut cycle = input();
        cycle.snapshots.retain(|s| s.timeframe != Timeframe::H1);

        assert_eq!(
            engine.evaluate(&cycle),
            Err(EngineError::MissingTimeframe(Timeframe::H1))
        );
    }

    #[test]
    fn test_quiet_market_is_rejected() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let outcome = engine.evaluate(&input()).unwrap();

        let rejection = outcome.rejection().unwrap();
        assert!(rejection.has(RejectionReason::InsufficientConfirmations));
        assert_eq!(rejection.confirmation_count, 0);
    }

    #[test]
    fn test_news_counts_toward_confirmations() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let mut cycle = input();
        for s in cycle.snapshots.iter_mut() {
            if matches!(s.timeframe, Timeframe::D1 | Timeframe::H4) {
                s.trend_direction = TrendDirection::Up;
            }
        }

        let outcome = engine.evaluate(&cycle).unwrap();
        assert!(!outcome.is_signal());

        cycle.news = Some(NewsSentiment {
            bullish_count: 6,
            bearish_count: 2,
            high_impact_count: 1,
        });
        let outcome = engine.evaluate(&cycle).unwrap();
        let signal = outcome.signal().unwrap();
        assert_eq!(signal.direction, Direction::Bullish);
        assert_eq!(signal.confirmations_used.len(), 3);
    }

    #[test]
    fn test_high_impact_news_against_setup_rejects() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let mut cycle = input();
        for s in cycle.snapshots.iter_mut() {
            match s.timeframe {
                Timeframe::D1 | Timeframe::H4 => s.trend_direction = TrendDirection::Up,
                Timeframe::H1 => s.momentum.rsi = 62.0,
                Timeframe::M15 => {}
            }
        }
        cycle.news = Some(NewsSentiment {
            bullish_count: 0,
            bearish_count: 8,
            high_impact_count: 5,
        });

        let outcome = engine.evaluate(&cycle).unwrap();
        let rejection = outcome.rejection().unwrap();
        assert!(rejection.has(RejectionReason::DirectionalConflict));

        // Same headlines without high-impact items only weigh in as evidence
        cycle.news = Some(NewsSentiment {
            bullish_count: 0,
            bearish_count: 8,
            high_impact_count: 1,
        });
        assert!(engine.evaluate(&cycle).unwrap().is_signal());
    }

    #[test]
    fn test_levels_from_every_timeframe_feed_the_stop() {
        let engine = SignalEngine::new(EngineConfig::default()).unwrap();
        let mut cycle = input();
        for s in cycle.snapshots.iter_mut() {
            match s.timeframe {
                Timeframe::D1 | Timeframe::H4 => s.trend_direction = TrendDirection::Up,
                Timeframe::H1 => s.momentum.rsi = 62.0,
                Timeframe::M15 => {}
            }
            // Support only on the daily chart
            if s.timeframe == Timeframe::D1 {
                s.support_resistance_levels = vec![1997.40];
            }
        }

        let outcome = engine.evaluate(&cycle).unwrap();
        let signal = outcome.signal().unwrap();
        assert!((signal.stop_price - 1997.40).abs() < 1e-9);
        assert!((signal.stop_distance_pips - 260.0).abs() < 1e-6);
    }
}
