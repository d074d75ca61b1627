use serde::{Deserialize, Serialize};

use crate::catalog::PlanCatalog;
use crate::models::{PlanId, RecommendationResult, RecommendedPlan};

/// One annual-income band of the recommendation table. The same four rows
/// drive both the programmatic policy below and the natural-language rules
/// rendered into the AI system prompt, so the two can never drift apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomeTier {
    Low,
    LowerMiddle,
    UpperMiddle,
    High,
}

pub struct TierRule {
    pub tier: IncomeTier,
    /// Inclusive lower bound on annual income.
    pub min_annual: f64,
    /// Exclusive upper bound, or None for the open top band.
    pub max_annual: Option<f64>,
    pub candidates: [PlanId; 2],
    pub recommended: PlanId,
}

impl IncomeTier {
    pub const ALL: [TierRule; 4] = [
        TierRule {
            tier: IncomeTier::Low,
            min_annual: 0.0,
            max_annual: Some(30_000.0),
            candidates: [PlanId::Budget, PlanId::Essential],
            recommended: PlanId::Budget,
        },
        TierRule {
            tier: IncomeTier::LowerMiddle,
            min_annual: 30_000.0,
            max_annual: Some(60_000.0),
            candidates: [PlanId::Essential, PlanId::Family],
            recommended: PlanId::Essential,
        },
        TierRule {
            tier: IncomeTier::UpperMiddle,
            min_annual: 60_000.0,
            max_annual: Some(100_000.0),
            candidates: [PlanId::Family, PlanId::Premium],
            recommended: PlanId::Family,
        },
        TierRule {
            tier: IncomeTier::High,
            min_annual: 100_000.0,
            max_annual: None,
            candidates: [PlanId::Family, PlanId::Premium],
            recommended: PlanId::Premium,
        },
    ];

    pub fn for_annual_income(annual_income: f64) -> &'static TierRule {
        IncomeTier::ALL
            .iter()
            .find(|rule| {
                annual_income >= rule.min_annual
                    && rule.max_annual.map_or(true, |max| annual_income < max)
            })
            // The top band is open-ended, so the search always terminates there.
            .unwrap_or(&IncomeTier::ALL[3])
    }
}

/// Income-only plan recommendation. `family_size` is collected by the wizard
/// and echoed in its messaging but does not participate in filtering; callers
/// validate `family_size >= 1` and `monthly_income >= 0` before invoking.
pub fn recommend(
    catalog: &PlanCatalog,
    family_size: u32,
    monthly_income: f64,
) -> RecommendationResult {
    let _ = family_size;
    let annual_income = monthly_income * 12.0;
    let rule = IncomeTier::for_annual_income(annual_income);

    let plans = rule
        .candidates
        .iter()
        .filter_map(|id| catalog.get(*id))
        .map(|plan| RecommendedPlan {
            recommended: plan.id == rule.recommended,
            plan: plan.clone(),
        })
        .collect();

    RecommendationResult {
        tier: rule.tier,
        annual_income,
        plans,
    }
}
