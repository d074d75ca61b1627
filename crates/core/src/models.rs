use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanId {
    Ayushman,
    Cghs,
    Esis,
    Rsby,
    Budget,
    Essential,
    Family,
    Premium,
}

impl PlanId {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "ayushman" | "ayushman_bharat" | "pmjay" => Some(Self::Ayushman),
            "cghs" => Some(Self::Cghs),
            "esis" => Some(Self::Esis),
            "rsby" => Some(Self::Rsby),
            "budget" | "budget_care" => Some(Self::Budget),
            "essential" | "essential_care" => Some(Self::Essential),
            "family" | "family_shield" => Some(Self::Family),
            "premium" | "premium_plus" => Some(Self::Premium),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ayushman => "ayushman",
            Self::Cghs => "cghs",
            Self::Esis => "esis",
            Self::Rsby => "rsby",
            Self::Budget => "budget",
            Self::Essential => "essential",
            Self::Family => "family",
            Self::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanCategory {
    Government,
    Private,
}

/// One catalog entry. Financial fields are illustrative constants, not
/// real insurer quotes. `category` is informational only; no computation
/// branches on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub name: String,
    pub type_label: String,
    pub monthly_premium: f64,
    pub co_pay_percent: u8,
    pub deductible: f64,
    pub max_out_of_pocket: f64,
    pub coverage_percent: u8,
    pub category: PlanCategory,
    pub description: String,
    pub coverage_highlights: Vec<String>,
}

/// Projected annual care usage for one estimate. Counts are unsigned so a
/// negative visit count is unrepresentable; currency fields are validated
/// non-negative by callers before an estimate is requested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilizationInput {
    pub doctor_visits: u32,
    pub hospitalizations: u32,
    pub avg_hospitalization_cost: f64,
    pub medication_cost: f64,
    pub diagnostics_cost: f64,
}

impl Default for UtilizationInput {
    fn default() -> Self {
        Self {
            doctor_visits: 4,
            hospitalizations: 0,
            avg_hospitalization_cost: 50_000.0,
            medication_cost: 2_000.0,
            diagnostics_cost: 3_000.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HouseholdProfile {
    pub family_size: u32,
    pub monthly_income: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedPlan {
    pub plan: Plan,
    pub recommended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub tier: crate::recommend::IncomeTier,
    pub annual_income: f64,
    pub plans: Vec<RecommendedPlan>,
}

/// Itemized annual cost projection. All amounts are in base currency units
/// with no rounding; `savings` is negative when the plan costs more than
/// paying for care uninsured, which is a valid displayable outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub annual_premium: f64,
    pub total_healthcare_cost: f64,
    pub deductible_applied: f64,
    pub insurer_paid: f64,
    pub out_of_pocket: f64,
    pub total_annual_cost: f64,
    pub savings: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    AwaitingFamilySize,
    AwaitingIncome,
    ShowingRecommendations,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub at: DateTime<Utc>,
    pub user_text: String,
    pub assistant_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub expires_at: DateTime<Utc>,
    pub turns: Vec<ConversationTurn>,
}
