// Confirmation extraction and multi-timeframe aggregation
pub mod aggregator;
pub mod extractor;

pub use aggregator::{aggregate, AggregateScore};
pub use extractor::{extract, extract_cycle, ExtractionRules};

use serde::{Deserialize, Serialize};

use crate::models::{Direction, Timeframe};

/// Closed set of evidence sources. Each has exactly one extraction rule.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationSource {
    Trend,
    Momentum,
    Structure,
    #[serde(rename = "orderblock")]
    OrderBlock,
    Fvg,
    Liquidity,
    SrLevel,
    Fibonacci,
    Candlestick,
    NewsSentiment,
}

impl ConfirmationSource {
    /// Per-timeframe sources in extraction order
    pub const PER_TIMEFRAME: [ConfirmationSource; 9] = [
        ConfirmationSource::Trend,
        ConfirmationSource::Momentum,
        ConfirmationSource::Structure,
        ConfirmationSource::OrderBlock,
        ConfirmationSource::Fvg,
        ConfirmationSource::Liquidity,
        ConfirmationSource::SrLevel,
        ConfirmationSource::Fibonacci,
        ConfirmationSource::Candlestick,
    ];

    /// Market-structure evidence, as opposed to indicators and sentiment
    pub fn is_structural(self) -> bool {
        matches!(
            self,
            ConfirmationSource::Structure
                | ConfirmationSource::OrderBlock
                | ConfirmationSource::Fvg
                | ConfirmationSource::Liquidity
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    Low,
    Medium,
    High,
    Critical,
}

/// One piece of directional evidence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Confirmation {
    pub source: ConfirmationSource,
    pub timeframe: Option<Timeframe>, // None only for news sentiment
    pub direction: Direction,
    pub weight: f64,
}

impl Confirmation {
    pub fn new(
        source: ConfirmationSource,
        timeframe: Option<Timeframe>,
        direction: Direction,
        weight: f64,
    ) -> Self {
        Self {
            source,
            timeframe,
            direction,
            weight,
        }
    }

    pub fn importance(&self) -> Importance {
        if self.weight >= 1.3 {
            Importance::Critical
        } else if self.weight >= 1.0 {
            Importance::High
        } else if self.weight >= 0.8 {
            Importance::Medium
        } else {
            Importance::Low
        }
    }
}

impl std::fmt::Display for Confirmation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let timeframe = self.timeframe.map_or("--", |tf| tf.label());
        write!(
            f,
            "{:?} {} {:?} ({:.1})",
            self.source, timeframe, self.direction, self.weight
        )
    }
}
