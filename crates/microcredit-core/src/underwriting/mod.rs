//! Automated underwriting: banded sub-scores, a total, and a decision.

pub mod factors;
pub mod policy;
pub mod scorer;

pub use factors::{BandTier, Factor, FactorCategory, FactorLists, Sentiment};
pub use policy::{
    Band, BandTable, BusinessType, Comparison, ConfidenceCurve, CreditTable, DecisionThresholds,
    Grade, HistoryTable, ScreeningRules, SectorPoints, SectorTable, UnderwritingPolicy,
    MAX_TOTAL_POINTS,
};
pub use scorer::{
    classify, guidelines, score, underwrite, FactorWeights, Recommendation, RiskTier,
    ScoreBreakdown, UnderwritingGuidelines, UnderwritingInput, UnderwritingResult,
};
