use crate::config::EngineConfig;
use crate::confirmation::{Confirmation, ConfirmationSource};
use crate::models::{CycleInput, Direction, MomentumState, PriceZone, Timeframe, TimeframeSnapshot};

const MOMENTUM_WEIGHT: f64 = 1.0;
const STRUCTURE_WEIGHT: f64 = 1.5;
const ZONE_WEIGHT: f64 = 1.0;
const PROXIMITY_WEIGHT: f64 = 0.5; // supportive only

/// Thresholds the per-source rules need, resolved to price units
#[derive(Debug, Clone)]
pub struct ExtractionRules {
    pub rsi_bullish_above: f64,
    pub rsi_bearish_below: f64,
    pub proximity_tolerance: f64, // price units
    pub news_sentiment_weight: f64,
}

impl Default for ExtractionRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

impl ExtractionRules {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            rsi_bullish_above: config.rsi_bullish_above,
            rsi_bearish_below: config.rsi_bearish_below,
            proximity_tolerance: config.pips_to_price(config.proximity_tolerance_pips),
            news_sentiment_weight: config.news_sentiment_weight,
        }
    }

    /// Direction the given source reads from this snapshot, if any
    pub fn evaluate(
        &self,
        source: ConfirmationSource,
        snapshot: &TimeframeSnapshot,
    ) -> Option<Direction> {
        let price = snapshot.current_price;
        match source {
            ConfirmationSource::Trend => snapshot.trend_direction.bias(),
            ConfirmationSource::Momentum => self.momentum(&snapshot.momentum),
            ConfirmationSource::Structure => snapshot.market_structure_break,
            ConfirmationSource::OrderBlock => zone_bias(&snapshot.order_blocks, price),
            ConfirmationSource::Fvg => zone_bias(&snapshot.fair_value_gaps, price),
            ConfirmationSource::Liquidity => snapshot.liquidity_sweep,
            ConfirmationSource::SrLevel => {
                self.support_resistance(&snapshot.support_resistance_levels, price)
            }
            ConfirmationSource::Fibonacci => nearest_bias(
                snapshot
                    .fibonacci_levels
                    .iter()
                    .map(|l| ((l.price - price).abs(), l.bias))
                    .filter(|(d, _)| self.within_tolerance(*d)),
            ),
            ConfirmationSource::Candlestick => nearest_bias(
                snapshot
                    .candlestick_patterns
                    .iter()
                    .filter_map(|p| p.pattern.bias().map(|b| ((p.price - price).abs(), b)))
                    .filter(|(d, _)| self.within_tolerance(*d)),
            ),
            // Cycle-level, see extract_cycle
            ConfirmationSource::NewsSentiment => None,
        }
    }

    /// Weight of a confirmation from `source`. Only news has no timeframe.
    pub fn weight(&self, source: ConfirmationSource, timeframe: Option<Timeframe>) -> f64 {
        match source {
            ConfirmationSource::Trend => timeframe.map_or(0.0, Timeframe::trend_weight),
            ConfirmationSource::Momentum => MOMENTUM_WEIGHT,
            ConfirmationSource::Structure => STRUCTURE_WEIGHT,
            ConfirmationSource::OrderBlock
            | ConfirmationSource::Fvg
            | ConfirmationSource::Liquidity => ZONE_WEIGHT,
            ConfirmationSource::SrLevel
            | ConfirmationSource::Fibonacci
            | ConfirmationSource::Candlestick => PROXIMITY_WEIGHT,
            ConfirmationSource::NewsSentiment => self.news_sentiment_weight,
        }
    }

    /// RSI outside its neutral band and the MACD histogram sign each vote;
    /// a split vote is ambiguous
    fn momentum(&self, momentum: &MomentumState) -> Option<Direction> {
        let rsi = if momentum.rsi > self.rsi_bullish_above {
            Some(Direction::Bullish)
        } else if momentum.rsi < self.rsi_bearish_below {
            Some(Direction::Bearish)
        } else {
            None
        };

        let macd = if momentum.macd_histogram > 0.0 {
            Some(Direction::Bullish)
        } else if momentum.macd_histogram < 0.0 {
            Some(Direction::Bearish)
        } else {
            None
        };

        match (rsi, macd) {
            (Some(a), Some(b)) if a != b => None,
            (Some(a), _) => Some(a),
            (None, b) => b,
        }
    }

    /// Support (level at or below price) is bullish, resistance above is bearish
    fn support_resistance(&self, levels: &[f64], price: f64) -> Option<Direction> {
        nearest_bias(
            levels
                .iter()
                .map(|&level| {
                    let bias = if level <= price {
                        Direction::Bullish
                    } else {
                        Direction::Bearish
                    };
                    ((level - price).abs(), bias)
                })
                .filter(|(d, _)| self.within_tolerance(*d)),
        )
    }

    fn within_tolerance(&self, distance: f64) -> bool {
        distance <= self.proximity_tolerance + 1e-9
    }
}

/// Untested zones in price's favor; the nearest one decides
fn zone_bias(zones: &[PriceZone], price: f64) -> Option<Direction> {
    nearest_bias(
        zones
            .iter()
            .filter(|z| !z.tested && z.favors_price(price))
            .map(|z| (z.distance_to(price), z.bias)),
    )
}

/// Bias of the closest candidate. Opposite biases at the same distance cancel out.
fn nearest_bias(candidates: impl Iterator<Item = (f64, Direction)>) -> Option<Direction> {
    let mut best: Option<(f64, Option<Direction>)> = None;

    for (distance, bias) in candidates {
        match best {
            None => best = Some((distance, Some(bias))),
            Some((d, _)) if distance < d => best = Some((distance, Some(bias))),
            Some((d, Some(b))) if distance == d && b != bias => best = Some((d, None)),
            _ => {}
        }
    }

    best.and_then(|(_, bias)| bias)
}

/// Confirmations for one timeframe, at most one per source
pub fn extract(snapshot: &TimeframeSnapshot, rules: &ExtractionRules) -> Vec<Confirmation> {
    ConfirmationSource::PER_TIMEFRAME
        .iter()
        .filter_map(|&source| {
            rules.evaluate(source, snapshot).map(|direction| {
                let timeframe = Some(snapshot.timeframe);
                Confirmation::new(source, timeframe, direction, rules.weight(source, timeframe))
            })
        })
        .collect()
}

/// All confirmations for a cycle: timeframes highest first, news last
pub fn extract_cycle(input: &CycleInput, rules: &ExtractionRules) -> Vec<Confirmation> {
    let mut confirmations = Vec::new();

    for timeframe in Timeframe::ALL {
        if let Some(snapshot) = input.snapshot(timeframe) {
            let found = extract(snapshot, rules);
            tracing::debug!(
                "{}: {} confirmation(s) [{}]",
                timeframe,
                found.len(),
                found
                    .iter()
                    .map(|c| format!("{:?}", c.source))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            confirmations.extend(found);
        }
    }

    if let Some(direction) = input.news.as_ref().and_then(|n| n.bias()) {
        let weight = rules.weight(ConfirmationSource::NewsSentiment, None);
        if weight > 0.0 {
            confirmations.push(Confirmation::new(
                ConfirmationSource::NewsSentiment,
                None,
                direction,
                weight,
            ));
        }
    }

    confirmations
}
