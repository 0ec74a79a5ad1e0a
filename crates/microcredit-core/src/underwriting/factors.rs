//! Explanatory factors attached to an underwriting decision.
//!
//! Factors are tags plus the observed value that placed the applicant in a
//! band. Turning them into sentences is left to [`Factor::describe`] and the
//! `Display` impl so callers can localise or restyle the wording.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The sub-score a factor explains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorCategory {
    LoanAmount,
    BusinessAge,
    Revenue,
    CreditScore,
    LoanHistory,
    /// Standalone flag raised whenever the applicant has defaulted before.
    PriorDefault,
}

/// Position of a band within its table, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandTier {
    Strong,
    Good,
    Moderate,
    Weak,
    /// No data to band on (missing credit score).
    Unrated,
    /// Overridden by a prior default.
    Defaulted,
}

/// Which factor list a band's factor is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Warning,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factor {
    pub category: FactorCategory,
    pub tier: BandTier,
    /// Value the band was chosen from (ratio, years, revenue, score, loan count).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observed: Option<Decimal>,
}

impl Factor {
    pub fn new(category: FactorCategory, tier: BandTier, observed: Option<Decimal>) -> Self {
        Self {
            category,
            tier,
            observed,
        }
    }

    /// Default English wording for the factor, without the observed value.
    pub fn describe(&self) -> &'static str {
        use BandTier::*;
        use FactorCategory::*;

        match (self.category, self.tier) {
            (PriorDefault, _) => "Previous loan default detected",
            (_, Defaulted) => "Previous loan default",

            (LoanAmount, Strong) => "Conservative loan amount",
            (LoanAmount, Good) => "Moderate loan amount",
            (LoanAmount, Moderate) => "High loan amount relative to revenue",
            (LoanAmount, _) => "Very high loan amount relative to revenue",

            (BusinessAge, Strong) => "Established business",
            (BusinessAge, Good) => "Mature business",
            (BusinessAge, Moderate) => "Newer business",
            (BusinessAge, _) => "Very new business",

            (Revenue, Strong) => "Strong annual revenue",
            (Revenue, Good) => "Good annual revenue",
            (Revenue, Moderate) => "Moderate annual revenue",
            (Revenue, _) => "Low annual revenue",

            (CreditScore, Unrated) => "No credit score available",
            (CreditScore, Strong) => "Excellent credit score",
            (CreditScore, Good) => "Good credit score",
            (CreditScore, Moderate) => "Fair credit score",
            (CreditScore, _) => "Poor credit score",

            (LoanHistory, Strong) => "Strong loan repayment history",
            (LoanHistory, Good) => "Some loan repayment history",
            (LoanHistory, _) => "No previous loan history",
        }
    }
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.describe())?;
        let Some(v) = self.observed else {
            return Ok(());
        };
        match self.category {
            FactorCategory::LoanAmount => write!(f, " (loan-to-revenue {})", v.round_dp(2)),
            FactorCategory::BusinessAge => write!(f, " ({} years)", v.normalize()),
            FactorCategory::Revenue => write!(f, " ({})", v.round_dp(2)),
            FactorCategory::CreditScore => write!(f, " ({v})"),
            FactorCategory::LoanHistory => write!(f, " ({v} prior loans)"),
            FactorCategory::PriorDefault => Ok(()),
        }
    }
}

/// Factors grouped by how they bear on the decision.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactorLists {
    pub positive: Vec<Factor>,
    pub negative: Vec<Factor>,
    pub warnings: Vec<Factor>,
}

impl FactorLists {
    /// File a factor according to its band's sentiment. Neutral factors are dropped.
    pub fn push(&mut self, sentiment: Sentiment, factor: Factor) {
        match sentiment {
            Sentiment::Positive => self.positive.push(factor),
            Sentiment::Negative => self.negative.push(factor),
            Sentiment::Warning => self.warnings.push(factor),
            Sentiment::Neutral => {}
        }
    }

    pub fn len(&self) -> usize {
        self.positive.len() + self.negative.len() + self.warnings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_display_includes_observed_value() {
        let f = Factor::new(FactorCategory::BusinessAge, BandTier::Strong, Some(dec!(6.0)));
        assert_eq!(f.to_string(), "Established business (6 years)");

        let f = Factor::new(FactorCategory::LoanAmount, BandTier::Weak, Some(dec!(0.8333)));
        assert_eq!(
            f.to_string(),
            "Very high loan amount relative to revenue (loan-to-revenue 0.83)"
        );
    }

    #[test]
    fn test_prior_default_wording() {
        let flag = Factor::new(FactorCategory::PriorDefault, BandTier::Defaulted, None);
        assert_eq!(flag.to_string(), "Previous loan default detected");
        let history = Factor::new(FactorCategory::LoanHistory, BandTier::Defaulted, Some(dec!(4)));
        assert_eq!(history.describe(), "Previous loan default");
    }

    #[test]
    fn test_neutral_factors_are_dropped() {
        let mut lists = FactorLists::default();
        let f = Factor::new(FactorCategory::Revenue, BandTier::Moderate, None);
        lists.push(Sentiment::Neutral, f.clone());
        assert!(lists.is_empty());
        lists.push(Sentiment::Warning, f);
        assert_eq!(lists.warnings.len(), 1);
    }
}
