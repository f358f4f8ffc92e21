// Risk gate, account context and position sizing
pub mod context;
pub mod gate;
pub mod sizing;

pub use context::RiskContext;
pub use gate::SignalGate;
pub use sizing::{RiskCalculator, SizingPlan};
