use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::catalog::PlanCatalog;
use crate::models::{HouseholdProfile, RecommendationResult, WizardStep};
use crate::recommend::recommend;

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    // First number in the text, allowing thousands separators and decimals.
    Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("number pattern is valid")
});

/// Pulls the first numeric value out of free-form wizard input
/// ("we are 4 people" -> 4.0, "about 25,000" -> 25000.0).
pub fn extract_number(text: &str) -> Option<f64> {
    let matched = NUMBER_RE.find(text)?;
    matched.as_str().replace(',', "").parse().ok()
}

/// Outcome of feeding one user message to the wizard. `rejected` marks a
/// validation notice; the step did not advance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardTurn {
    pub message: String,
    pub step: WizardStep,
    pub rejected: bool,
    pub recommendations: Option<RecommendationResult>,
}

/// Linear three-step wizard: family size, then income, then a terminal
/// recommendations view. No backward transitions; input in the terminal
/// state re-renders the same result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WizardSession {
    step: WizardStep,
    family_size: Option<u32>,
    monthly_income: Option<f64>,
    recommendations: Option<RecommendationResult>,
}

impl WizardSession {
    pub fn new() -> Self {
        Self {
            step: WizardStep::AwaitingFamilySize,
            family_size: None,
            monthly_income: None,
            recommendations: None,
        }
    }

    pub fn greeting() -> &'static str {
        "Hello! I'm your Health Insurance Assistant. I'll help you find the \
         perfect insurance plan for your family.\n\nTo get started, how many \
         people are in your family?"
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn profile(&self) -> Option<HouseholdProfile> {
        Some(HouseholdProfile {
            family_size: self.family_size?,
            monthly_income: self.monthly_income?,
        })
    }

    pub fn handle_input(&mut self, catalog: &PlanCatalog, text: &str) -> WizardTurn {
        match self.step {
            WizardStep::AwaitingFamilySize => self.handle_family_size(text),
            WizardStep::AwaitingIncome => self.handle_income(catalog, text),
            WizardStep::ShowingRecommendations => self.rerender(),
        }
    }

    fn handle_family_size(&mut self, text: &str) -> WizardTurn {
        let value = extract_number(text);
        let Some(size) = value.filter(|v| *v >= 1.0).map(|v| v as u32) else {
            return self.reject("Please enter a valid number of family members.");
        };

        self.family_size = Some(size);
        self.step = WizardStep::AwaitingIncome;
        WizardTurn {
            message: format!(
                "Great! You have {} {} in your family.\n\nWhat is your \
                 approximate monthly family income?",
                size,
                if size == 1 { "person" } else { "people" }
            ),
            step: self.step,
            rejected: false,
            recommendations: None,
        }
    }

    fn handle_income(&mut self, catalog: &PlanCatalog, text: &str) -> WizardTurn {
        let Some(income) = extract_number(text).filter(|v| *v >= 0.0) else {
            return self.reject("Please enter a valid income amount.");
        };
        // family_size was set when this step was entered.
        let family_size = self.family_size.unwrap_or(1);

        self.monthly_income = Some(income);
        let result = recommend(catalog, family_size, income);
        self.recommendations = Some(result.clone());
        self.step = WizardStep::ShowingRecommendations;

        WizardTurn {
            message: format!(
                "Thank you! Based on your family size of {} and monthly income \
                 of {}, I've found the best insurance plans for you.\n\nHere \
                 are my recommendations:",
                family_size, income
            ),
            step: self.step,
            rejected: false,
            recommendations: Some(result),
        }
    }

    fn rerender(&self) -> WizardTurn {
        WizardTurn {
            message: "Here are your recommendations again:".to_string(),
            step: self.step,
            rejected: false,
            recommendations: self.recommendations.clone(),
        }
    }

    fn reject(&self, notice: &str) -> WizardTurn {
        WizardTurn {
            message: notice.to_string(),
            step: self.step,
            rejected: true,
            recommendations: None,
        }
    }
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlanId;

    #[test]
    fn extracts_numbers_from_free_text() {
        assert_eq!(extract_number("we are 4 people"), Some(4.0));
        assert_eq!(extract_number("about 25,000 per month"), Some(25_000.0));
        assert_eq!(extract_number("1500.50"), Some(1_500.5));
        assert_eq!(extract_number("no idea"), None);
    }

    #[test]
    fn walks_the_full_wizard_flow() {
        let catalog = PlanCatalog::standard();
        let mut session = WizardSession::new();
        assert_eq!(session.step(), WizardStep::AwaitingFamilySize);

        let turn = session.handle_input(&catalog, "4");
        assert!(!turn.rejected);
        assert_eq!(turn.step, WizardStep::AwaitingIncome);

        let turn = session.handle_input(&catalog, "2000");
        assert_eq!(turn.step, WizardStep::ShowingRecommendations);
        let result = turn.recommendations.expect("terminal turn carries plans");
        assert_eq!(result.plans.len(), 2);
        assert_eq!(
            result.plans.iter().find(|p| p.recommended).unwrap().plan.id,
            PlanId::Budget
        );
    }

    #[test]
    fn invalid_input_does_not_advance_the_step() {
        let catalog = PlanCatalog::standard();
        let mut session = WizardSession::new();

        let turn = session.handle_input(&catalog, "zero people? none");
        assert!(turn.rejected);
        assert_eq!(session.step(), WizardStep::AwaitingFamilySize);

        let turn = session.handle_input(&catalog, "0");
        assert!(turn.rejected);
        assert_eq!(session.step(), WizardStep::AwaitingFamilySize);

        session.handle_input(&catalog, "3");
        let turn = session.handle_input(&catalog, "not telling");
        assert!(turn.rejected);
        assert_eq!(session.step(), WizardStep::AwaitingIncome);
    }

    #[test]
    fn terminal_state_is_idempotent() {
        let catalog = PlanCatalog::standard();
        let mut session = WizardSession::new();
        session.handle_input(&catalog, "2");
        let first = session.handle_input(&catalog, "2500");
        let again = session.handle_input(&catalog, "9999");

        assert_eq!(again.step, WizardStep::ShowingRecommendations);
        let ids = |turn: &WizardTurn| {
            turn.recommendations
                .as_ref()
                .unwrap()
                .plans
                .iter()
                .map(|p| (p.plan.id, p.recommended))
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&again));
    }
}
