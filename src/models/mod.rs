use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::risk::RiskContext;

/// Chart timeframe the external provider computes indicators on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timeframe {
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    /// Canonical extraction order: highest timeframe first
    pub const ALL: [Timeframe; 4] = [Timeframe::D1, Timeframe::H4, Timeframe::H1, Timeframe::M15];

    /// Trend weight, scaled by timeframe authority
    pub fn trend_weight(self) -> f64 {
        match self {
            Timeframe::D1 => 3.0,
            Timeframe::H4 => 2.0,
            Timeframe::H1 => 1.5,
            Timeframe::M15 => 1.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Directional bias of a piece of evidence or of a trade
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn opposite(self) -> Self {
        match self {
            Direction::Bullish => Direction::Bearish,
            Direction::Bearish => Direction::Bullish,
        }
    }

    /// +1.0 for bullish, -1.0 for bearish (price moves in this sign when the trade wins)
    pub fn sign(self) -> f64 {
        match self {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Up,
    Down,
    Range,
}

impl TrendDirection {
    pub fn bias(self) -> Option<Direction> {
        match self {
            TrendDirection::Up => Some(Direction::Bullish),
            TrendDirection::Down => Some(Direction::Bearish),
            TrendDirection::Range => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct MomentumState {
    pub rsi: f64,
    pub macd_histogram: f64,
}

/// Bollinger bands as computed by the provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VolatilityBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

/// Order block or fair value gap
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceZone {
    pub low: f64,
    pub high: f64,
    pub bias: Direction,
    #[serde(default)]
    pub tested: bool, // price has already returned into the zone
}

impl PriceZone {
    /// Distance from price to the zone, zero when price is inside it
    pub fn distance_to(&self, price: f64) -> f64 {
        if price < self.low {
            self.low - price
        } else if price > self.high {
            price - self.high
        } else {
            0.0
        }
    }

    /// A bullish zone at or below price, or a bearish zone at or above price
    pub fn favors_price(&self, price: f64) -> bool {
        match self.bias {
            Direction::Bullish => self.low <= price,
            Direction::Bearish => self.high >= price,
        }
    }
}

/// Price level with the bias the provider assigned to it (e.g. a Fibonacci retracement)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BiasedLevel {
    pub price: f64,
    pub bias: Direction,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CandlestickPattern {
    Doji,
    Hammer,
    ShootingStar,
    EngulfingBullish,
    EngulfingBearish,
    MorningStar,
    EveningStar,
    ThreeWhiteSoldiers,
    ThreeBlackCrows,
}

impl CandlestickPattern {
    /// Doji is indecision and carries no bias
    pub fn bias(self) -> Option<Direction> {
        match self {
            CandlestickPattern::Doji => None,
            CandlestickPattern::Hammer
            | CandlestickPattern::EngulfingBullish
            | CandlestickPattern::MorningStar
            | CandlestickPattern::ThreeWhiteSoldiers => Some(Direction::Bullish),
            CandlestickPattern::ShootingStar
            | CandlestickPattern::EngulfingBearish
            | CandlestickPattern::EveningStar
            | CandlestickPattern::ThreeBlackCrows => Some(Direction::Bearish),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DetectedPattern {
    pub pattern: CandlestickPattern,
    pub price: f64, // close of the pattern's final candle
}

/// Already-computed indicator bundle for one timeframe
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeframeSnapshot {
    pub timeframe: Timeframe,
    pub current_price: f64,
    pub trend_direction: TrendDirection,
    pub momentum: MomentumState,
    pub volatility_bands: VolatilityBands,
    #[serde(default)]
    pub support_resistance_levels: Vec<f64>,
    #[serde(default)]
    pub order_blocks: Vec<PriceZone>,
    #[serde(default)]
    pub fair_value_gaps: Vec<PriceZone>,
    #[serde(default)]
    pub liquidity_sweep: Option<Direction>,
    #[serde(default)]
    pub market_structure_break: Option<Direction>,
    #[serde(default)]
    pub fibonacci_levels: Vec<BiasedLevel>,
    #[serde(default)]
    pub candlestick_patterns: Vec<DetectedPattern>,
}

impl TimeframeSnapshot {
    /// Snapshot with neutral readings everywhere; tests and demos fill in what they need
    pub fn neutral(timeframe: Timeframe, price: f64) -> Self {
        Self {
            timeframe,
            current_price: price,
            trend_direction: TrendDirection::Range,
            momentum: MomentumState {
                rsi: 50.0,
                macd_histogram: 0.0,
            },
            volatility_bands: VolatilityBands {
                upper: price + 10.0,
                middle: price,
                lower: price - 10.0,
            },
            support_resistance_levels: Vec::new(),
            order_blocks: Vec::new(),
            fair_value_gaps: Vec::new(),
            liquidity_sweep: None,
            market_structure_break: None,
            fibonacci_levels: Vec::new(),
            candlestick_patterns: Vec::new(),
        }
    }

    /// Reject values the provider should never hand over
    pub fn validate(&self) -> Result<(), EngineError> {
        let tf = self.timeframe;
        let finite = |field: &'static str, value: f64| {
            if value.is_finite() {
                Ok(())
            } else {
                Err(EngineError::NonFiniteValue {
                    timeframe: tf,
                    field,
                })
            }
        };

        finite("current_price", self.current_price)?;
        if self.current_price <= 0.0 {
            return Err(EngineError::NonPositivePrice {
                timeframe: tf,
                price: self.current_price,
            });
        }

        finite("momentum.rsi", self.momentum.rsi)?;
        finite("momentum.macd_histogram", self.momentum.macd_histogram)?;

        let bands = &self.volatility_bands;
        finite("volatility_bands.upper", bands.upper)?;
        finite("volatility_bands.middle", bands.middle)?;
        finite("volatility_bands.lower", bands.lower)?;
        if !(bands.lower <= bands.middle && bands.middle <= bands.upper) {
            return Err(EngineError::InvalidBands { timeframe: tf });
        }

        for level in &self.support_resistance_levels {
            finite("support_resistance_levels", *level)?;
        }
        for level in &self.fibonacci_levels {
            finite("fibonacci_levels", level.price)?;
        }
        for pattern in &self.candlestick_patterns {
            finite("candlestick_patterns", pattern.price)?;
        }

        let zones = self
            .order_blocks
            .iter()
            .map(|z| ("order_blocks", z))
            .chain(self.fair_value_gaps.iter().map(|z| ("fair_value_gaps", z)));
        for (field, zone) in zones {
            finite(field, zone.low)?;
            finite(field, zone.high)?;
            if zone.low > zone.high {
                return Err(EngineError::InvalidZone {
                    timeframe: tf,
                    field,
                    low: zone.low,
                    high: zone.high,
                });
            }
        }

        Ok(())
    }
}

/// Headline sentiment tallied by the news collaborator
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct NewsSentiment {
    pub bullish_count: u32,
    pub bearish_count: u32,
    #[serde(default)]
    pub high_impact_count: u32,
}

impl NewsSentiment {
    /// One side must outnumber the other by 1.5x to count as a bias
    pub fn bias(&self) -> Option<Direction> {
        let bullish = self.bullish_count as f64;
        let bearish = self.bearish_count as f64;
        if bullish > bearish * 1.5 {
            Some(Direction::Bullish)
        } else if bearish > bullish * 1.5 {
            Some(Direction::Bearish)
        } else {
            None
        }
    }

    /// Overall sentiment runs against `direction` and is backed by at least
    /// `min_high_impact` high-impact headlines
    pub fn vetoes(&self, direction: Direction, min_high_impact: u32) -> bool {
        self.bias() == Some(direction.opposite()) && self.high_impact_count >= min_high_impact
    }
}

/// Everything one analysis cycle needs, handed over in a single call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleInput {
    pub snapshots: Vec<TimeframeSnapshot>,
    pub risk: RiskContext,
    #[serde(default)]
    pub news: Option<NewsSentiment>,
}

impl CycleInput {
    pub fn snapshot(&self, timeframe: Timeframe) -> Option<&TimeframeSnapshot> {
        self.snapshots.iter().find(|s| s.timeframe == timeframe)
    }

    /// Exactly one snapshot per timeframe, each internally consistent
    pub fn validate(&self) -> Result<(), EngineError> {
        for (i, snapshot) in self.snapshots.iter().enumerate() {
            if self.snapshots[..i]
                .iter()
                .any(|s| s.timeframe == snapshot.timeframe)
            {
                return Err(EngineError::DuplicateTimeframe(snapshot.timeframe));
            }
        }

        for timeframe in Timeframe::ALL {
            if self.snapshot(timeframe).is_none() {
                return Err(EngineError::MissingTimeframe(timeframe));
            }
        }

        for snapshot in &self.snapshots {
            snapshot.validate()?;
        }

        self.risk.validate()
    }
}
