//! Scoring tables and decision thresholds.
//!
//! Every cut-off here encodes risk appetite, so all of it is data: the
//! defaults reproduce the house policy and any of it can be replaced from a
//! policy file.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::factors::{BandTier, Sentiment};
use crate::{types::*, MicroCreditError, MicroCreditResult};

// ---------------------------------------------------------------------------
// Business type
// ---------------------------------------------------------------------------

/// Sector the applicant trades in. Labels outside the known set are kept
/// verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BusinessType {
    RetailTrade,
    FoodBeverage,
    Manufacturing,
    Services,
    Technology,
    Agriculture,
    Transportation,
    Healthcare,
    Other(String),
}

impl BusinessType {
    pub fn label(&self) -> &str {
        match self {
            Self::RetailTrade => "Retail & Trade",
            Self::FoodBeverage => "Food & Beverage",
            Self::Manufacturing => "Manufacturing",
            Self::Services => "Services",
            Self::Technology => "Technology",
            Self::Agriculture => "Agriculture",
            Self::Transportation => "Transportation",
            Self::Healthcare => "Healthcare",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for BusinessType {
    fn from(label: &str) -> Self {
        let trimmed = label.trim();
        let known = [
            Self::RetailTrade,
            Self::FoodBeverage,
            Self::Manufacturing,
            Self::Services,
            Self::Technology,
            Self::Agriculture,
            Self::Transportation,
            Self::Healthcare,
        ];
        known
            .into_iter()
            .find(|bt| bt.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or_else(|| Self::Other(trimmed.to_string()))
    }
}

impl From<String> for BusinessType {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<BusinessType> for String {
    fn from(bt: BusinessType) -> Self {
        bt.label().to_string()
    }
}

impl std::fmt::Display for BusinessType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorPoints {
    pub business_type: BusinessType,
    pub points: Points,
}

/// Points per sector; sectors not listed score `default_points`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorTable {
    pub sectors: Vec<SectorPoints>,
    pub default_points: Points,
}

impl SectorTable {
    pub fn points(&self, business_type: &BusinessType) -> Points {
        self.sectors
            .iter()
            .find(|s| &s.business_type == business_type)
            .map_or(self.default_points, |s| s.points)
    }

    pub fn max_points(&self) -> Points {
        self.sectors
            .iter()
            .map(|s| s.points)
            .fold(self.default_points, Points::max)
    }
}

impl Default for SectorTable {
    fn default() -> Self {
        let entry = |business_type, points| SectorPoints {
            business_type,
            points,
        };
        Self {
            sectors: vec![
                entry(BusinessType::RetailTrade, 20),
                entry(BusinessType::FoodBeverage, 18),
                entry(BusinessType::Manufacturing, 22),
                entry(BusinessType::Services, 21),
                entry(BusinessType::Technology, 24),
                entry(BusinessType::Agriculture, 19),
                entry(BusinessType::Transportation, 17),
                entry(BusinessType::Healthcare, 23),
            ],
            default_points: 15,
        }
    }
}

// ---------------------------------------------------------------------------
// Band tables
// ---------------------------------------------------------------------------

/// How a table's thresholds are compared against the observed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    /// First band whose threshold is <= the value (higher is better).
    AtLeast,
    /// First band whose threshold is >= the value (lower is better).
    AtMost,
}

/// Outcome of landing in a band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub points: Points,
    pub tier: BandTier,
    #[serde(default)]
    pub sentiment: Sentiment,
}

impl Grade {
    pub const fn new(points: Points, tier: BandTier, sentiment: Sentiment) -> Self {
        Self {
            points,
            tier,
            sentiment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub threshold: Decimal,
    #[serde(flatten)]
    pub grade: Grade,
}

/// Ordered `(threshold, grade)` rows evaluated top-down, with a catch-all
/// grade for values that match no row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandTable {
    pub comparison: Comparison,
    pub bands: Vec<Band>,
    pub otherwise: Grade,
}

impl BandTable {
    /// Grade for `value`. `None` (an undefined measurement) always lands in
    /// the catch-all.
    pub fn grade(&self, value: Option<Decimal>) -> Grade {
        let Some(value) = value else {
            return self.otherwise;
        };
        self.bands
            .iter()
            .find(|b| match self.comparison {
                Comparison::AtLeast => value >= b.threshold,
                Comparison::AtMost => value <= b.threshold,
            })
            .map_or(self.otherwise, |b| b.grade)
    }

    pub fn max_points(&self) -> Points {
        self.bands
            .iter()
            .map(|b| b.grade.points)
            .fold(self.otherwise.points, Points::max)
    }

    fn validate(&self, name: &str) -> MicroCreditResult<()> {
        if self.bands.is_empty() {
            return Err(MicroCreditError::InvalidPolicy(format!(
                "{name}: band table has no bands"
            )));
        }
        let ordered = self.bands.windows(2).all(|w| match self.comparison {
            Comparison::AtLeast => w[0].threshold > w[1].threshold,
            Comparison::AtMost => w[0].threshold < w[1].threshold,
        });
        if !ordered {
            let order = match self.comparison {
                Comparison::AtLeast => "strictly descending",
                Comparison::AtMost => "strictly ascending",
            };
            return Err(MicroCreditError::InvalidPolicy(format!(
                "{name}: band thresholds must be {order}"
            )));
        }
        Ok(())
    }
}

fn band(threshold: Decimal, points: Points, tier: BandTier, sentiment: Sentiment) -> Band {
    Band {
        threshold,
        grade: Grade::new(points, tier, sentiment),
    }
}

/// Credit bureau bands plus the neutral grade for applicants with no score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTable {
    #[serde(flatten)]
    pub table: BandTable,
    pub unrated: Grade,
}

/// Prior-loan bands plus the grade that overrides them after a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTable {
    #[serde(flatten)]
    pub table: BandTable,
    pub defaulted: Grade,
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// Minimum totals for each outcome; anything under `review` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionThresholds {
    pub approve: Points,
    pub review: Points,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            approve: 80,
            review: 60,
        }
    }
}

/// Display heuristic: `min(cap, base + total / 100 * span)`, whole percent.
/// Not a calibrated probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceCurve {
    pub base: Decimal,
    pub span: Decimal,
    pub cap: Decimal,
}

impl Default for ConfidenceCurve {
    fn default() -> Self {
        Self {
            base: dec!(70),
            span: dec!(25),
            cap: dec!(95),
        }
    }
}

impl ConfidenceCurve {
    pub fn confidence(&self, total: Points) -> Decimal {
        let raw = self.base + Decimal::from(total) / dec!(100) * self.span;
        raw.min(self.cap)
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
    }
}

/// Published screening minimums. They do not move the score; breaches are
/// reported as warnings on the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRules {
    pub minimum_business_age_years: Decimal,
    pub minimum_annual_revenue: Money,
    pub maximum_loan_to_revenue: Decimal,
}

impl Default for ScreeningRules {
    fn default() -> Self {
        Self {
            minimum_business_age_years: dec!(0.5),
            minimum_annual_revenue: dec!(10_000),
            maximum_loan_to_revenue: dec!(1.0),
        }
    }
}

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnderwritingPolicy {
    pub business_type: SectorTable,
    pub loan_to_revenue: BandTable,
    pub business_age: BandTable,
    pub revenue: BandTable,
    pub credit_score: CreditTable,
    pub loan_history: HistoryTable,
    pub thresholds: DecisionThresholds,
    pub confidence: ConfidenceCurve,
    pub screening: ScreeningRules,
}

impl Default for UnderwritingPolicy {
    fn default() -> Self {
        use BandTier::*;
        use Sentiment::*;

        Self {
            business_type: SectorTable::default(),
            loan_to_revenue: BandTable {
                comparison: Comparison::AtMost,
                bands: vec![
                    band(dec!(0.25), 20, Strong, Positive),
                    band(dec!(0.5), 16, Good, Positive),
                    band(dec!(0.75), 12, Moderate, Neutral),
                ],
                otherwise: Grade::new(8, Weak, Warning),
            },
            business_age: BandTable {
                comparison: Comparison::AtLeast,
                bands: vec![
                    band(dec!(5), 15, Strong, Positive),
                    band(dec!(3), 12, Good, Positive),
                    band(dec!(1), 8, Moderate, Neutral),
                ],
                otherwise: Grade::new(4, Weak, Negative),
            },
            revenue: BandTable {
                comparison: Comparison::AtLeast,
                bands: vec![
                    band(dec!(100_000), 15, Strong, Positive),
                    band(dec!(50_000), 12, Good, Positive),
                    band(dec!(20_000), 8, Moderate, Neutral),
                ],
                otherwise: Grade::new(4, Weak, Negative),
            },
            credit_score: CreditTable {
                table: BandTable {
                    comparison: Comparison::AtLeast,
                    bands: vec![
                        band(dec!(750), 15, Strong, Positive),
                        band(dec!(650), 12, Good, Positive),
                        band(dec!(550), 8, Moderate, Neutral),
                    ],
                    otherwise: Grade::new(3, Weak, Negative),
                },
                unrated: Grade::new(10, Unrated, Neutral),
            },
            loan_history: HistoryTable {
                table: BandTable {
                    comparison: Comparison::AtLeast,
                    bands: vec![
                        band(dec!(3), 10, Strong, Positive),
                        band(dec!(1), 7, Good, Positive),
                    ],
                    otherwise: Grade::new(5, Moderate, Neutral),
                },
                defaulted: Grade::new(2, Defaulted, Negative),
            },
            thresholds: DecisionThresholds::default(),
            confidence: ConfidenceCurve::default(),
            screening: ScreeningRules::default(),
        }
    }
}

/// Ceiling on the best achievable total of any valid policy.
pub const MAX_TOTAL_POINTS: Points = 100;

impl UnderwritingPolicy {
    /// Best achievable total under this policy. Saturates rather than
    /// wrapping; [`validate`](Self::validate) refuses anything over
    /// [`MAX_TOTAL_POINTS`].
    pub fn max_score(&self) -> Points {
        [
            self.business_type.max_points(),
            self.loan_to_revenue.max_points(),
            self.business_age.max_points(),
            self.revenue.max_points(),
            self.credit_score
                .table
                .max_points()
                .max(self.credit_score.unrated.points),
            self.loan_history
                .table
                .max_points()
                .max(self.loan_history.defaulted.points),
        ]
        .into_iter()
        .fold(0, Points::saturating_add)
    }

    pub fn validate(&self) -> MicroCreditResult<()> {
        self.loan_to_revenue.validate("loan_to_revenue")?;
        self.business_age.validate("business_age")?;
        self.revenue.validate("revenue")?;
        self.credit_score.table.validate("credit_score")?;
        self.loan_history.table.validate("loan_history")?;

        let max_score = self.max_score();
        if max_score > MAX_TOTAL_POINTS {
            return Err(MicroCreditError::InvalidPolicy(format!(
                "best achievable score ({max_score}) exceeds {MAX_TOTAL_POINTS}"
            )));
        }
        if self.thresholds.approve <= self.thresholds.review {
            return Err(MicroCreditError::InvalidPolicy(format!(
                "approve threshold ({}) must be above review threshold ({})",
                self.thresholds.approve, self.thresholds.review
            )));
        }
        if self.confidence.cap < Decimal::ZERO || self.confidence.cap > dec!(100) {
            return Err(MicroCreditError::InvalidPolicy(
                "confidence cap must be between 0 and 100".into(),
            ));
        }
        Ok(())
    }
}
