use microcredit_core::underwriting::{
    score, underwrite, BandTier, BusinessType, FactorCategory, Recommendation, RiskTier,
    UnderwritingInput, UnderwritingPolicy,
};
use microcredit_core::PolicyConfig;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn applicant(
    business_type: &str,
    loan_amount: Decimal,
    annual_revenue: Decimal,
    business_age_years: Decimal,
    credit_score: Option<u32>,
    previous_loans: u32,
) -> UnderwritingInput {
    UnderwritingInput {
        application_id: None,
        business_type: BusinessType::from(business_type),
        loan_amount,
        business_age_years,
        annual_revenue,
        credit_score,
        previous_loans,
        default_history: false,
    }
}

// ===========================================================================
// Decision boundaries through real applications
// ===========================================================================

#[test]
fn test_total_of_80_is_approved() {
    // 20 + 20 + 15 + 15 + 3 + 7
    let input = applicant("Retail & Trade", dec!(20_000), dec!(100_000), dec!(6), Some(500), 1);
    let result = score(&input, &UnderwritingPolicy::default()).unwrap();
    assert_eq!(result.total_score, 80);
    assert_eq!(result.recommendation, Recommendation::Approve);
    assert_eq!(result.risk_tier, RiskTier::Low);
}

#[test]
fn test_total_of_79_goes_to_review() {
    // 19 + 20 + 15 + 15 + 3 + 7
    let input = applicant("Agriculture", dec!(20_000), dec!(100_000), dec!(6), Some(500), 1);
    let result = score(&input, &UnderwritingPolicy::default()).unwrap();
    assert_eq!(result.total_score, 79);
    assert_eq!(result.recommendation, Recommendation::Review);
    assert_eq!(result.risk_tier, RiskTier::Medium);
}

#[test]
fn test_total_of_60_goes_to_review() {
    // unknown sector 15 + 16 + 8 + 8 + 8 + 5
    let input = applicant("Mining", dec!(15_000), dec!(40_000), dec!(2), Some(600), 0);
    let result = score(&input, &UnderwritingPolicy::default()).unwrap();
    assert_eq!(result.breakdown.business_type, 15);
    assert_eq!(result.total_score, 60);
    assert_eq!(result.recommendation, Recommendation::Review);
    assert_eq!(result.risk_tier, RiskTier::Medium);
}

#[test]
fn test_total_of_59_is_rejected() {
    // 17 + 16 + 8 + 8 + 3 + 7
    let input = applicant("Transportation", dec!(15_000), dec!(40_000), dec!(2), Some(500), 1);
    let result = score(&input, &UnderwritingPolicy::default()).unwrap();
    assert_eq!(result.total_score, 59);
    assert_eq!(result.recommendation, Recommendation::Reject);
    assert_eq!(result.risk_tier, RiskTier::High);
}

// ===========================================================================
// Factor categorisation
// ===========================================================================

#[test]
fn test_weak_applicant_factors() {
    let mut input = applicant("Food & Beverage", dec!(30_000), dec!(15_000), dec!(0.5), Some(480), 0);
    input.default_history = true;
    let result = score(&input, &UnderwritingPolicy::default()).unwrap();

    let negatives: Vec<_> = result
        .factors
        .negative
        .iter()
        .map(|f| (f.category, f.tier))
        .collect();
    assert_eq!(
        negatives,
        vec![
            (FactorCategory::BusinessAge, BandTier::Weak),
            (FactorCategory::Revenue, BandTier::Weak),
            (FactorCategory::CreditScore, BandTier::Weak),
            (FactorCategory::LoanHistory, BandTier::Defaulted),
            (FactorCategory::PriorDefault, BandTier::Defaulted),
        ]
    );
    assert_eq!(result.factors.warnings.len(), 1);
    assert_eq!(result.factors.warnings[0].observed, Some(dec!(2)));
    assert!(result.factors.positive.is_empty());

    let rendered: Vec<String> = result.factors.negative.iter().map(|f| f.to_string()).collect();
    assert_eq!(rendered[3], "Previous loan default (0 prior loans)");
    assert_eq!(rendered[4], "Previous loan default detected");
}

#[test]
fn test_result_serializes_lowercase_labels() {
    let input = applicant("Technology", dec!(20_000), dec!(100_000), dec!(6), Some(700), 2);
    let out = underwrite(&input, &UnderwritingPolicy::default()).unwrap();
    let json = serde_json::to_value(&out.result).unwrap();
    assert_eq!(json["recommendation"], "approve");
    assert_eq!(json["risk_tier"], "low");
    assert_eq!(json["total_score"], 93);
    assert_eq!(json["factors"]["positive"][0]["category"], "loan_amount");
}

// ===========================================================================
// Policy from configuration
// ===========================================================================

#[test]
fn test_stricter_policy_from_json() {
    let config = PolicyConfig::from_json(
        r#"{
            "underwriting": {
                "thresholds": { "approve": 95, "review": 70 },
                "business_type": {
                    "sectors": [ { "business_type": "Mining", "points": 25 } ],
                    "default_points": 10
                }
            }
        }"#,
    )
    .unwrap();

    let mining = applicant("mining", dec!(20_000), dec!(100_000), dec!(6), Some(700), 2);
    let result = score(&mining, &config.underwriting).unwrap();
    // "mining" does not match the configured "Mining" label exactly
    assert_eq!(result.breakdown.business_type, 10);

    let mining = applicant("Mining", dec!(20_000), dec!(100_000), dec!(6), Some(700), 2);
    let result = score(&mining, &config.underwriting).unwrap();
    assert_eq!(result.breakdown.business_type, 25);
    assert_eq!(result.total_score, 94);
    assert_eq!(result.recommendation, Recommendation::Review);
}

#[test]
fn test_invalid_policy_refused_by_underwrite() {
    let mut policy = UnderwritingPolicy::default();
    policy.business_age.bands.reverse();
    let input = applicant("Services", dec!(1_000), dec!(50_000), dec!(4), None, 0);
    assert!(underwrite(&input, &policy).is_err());
}

// ===========================================================================
// Properties
// ===========================================================================

fn any_applicant() -> impl Strategy<Value = UnderwritingInput> {
    (
        prop::sample::select(vec![
            "Retail & Trade",
            "Technology",
            "Healthcare",
            "Agriculture",
            "Mining",
        ]),
        0i64..5_000_000,
        0i64..5_000_000,
        0i64..400,
        prop::option::of(300u32..850),
        0u32..8,
        any::<bool>(),
    )
        .prop_map(|(bt, loan, revenue, age_tenths, credit, loans, defaulted)| UnderwritingInput {
            application_id: None,
            business_type: BusinessType::from(bt),
            loan_amount: Decimal::from(loan),
            business_age_years: Decimal::new(age_tenths, 1),
            annual_revenue: Decimal::from(revenue),
            credit_score: credit,
            previous_loans: loans,
            default_history: defaulted,
        })
}

proptest! {
    #[test]
    fn scoring_is_deterministic(input in any_applicant()) {
        let policy = UnderwritingPolicy::default();
        let first = score(&input, &policy).unwrap();
        let second = score(&input, &policy).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn total_is_sum_of_breakdown(input in any_applicant()) {
        let policy = UnderwritingPolicy::default();
        let result = score(&input, &policy).unwrap();
        let b = result.breakdown;
        let reversed = b.loan_history + b.credit_score + b.revenue + b.business_age + b.loan_amount + b.business_type;
        prop_assert_eq!(result.total_score, reversed);
        prop_assert!(result.total_score <= policy.max_score());
        prop_assert!(result.confidence_pct <= dec!(95));
    }

    #[test]
    fn prior_default_always_flagged(mut input in any_applicant()) {
        input.default_history = true;
        let result = score(&input, &UnderwritingPolicy::default()).unwrap();
        prop_assert_eq!(result.breakdown.loan_history, 2);
        prop_assert!(result.factors.negative.iter().any(|f| f.category == FactorCategory::PriorDefault));
    }
}
