use crate::models::{Plan, PlanCategory, PlanId};

/// Immutable plan reference table. Built once at startup and handed to the
/// orchestrator as a value, so tests can substitute alternate catalogs
/// without process-wide side effects.
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    pub fn get(&self, id: PlanId) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.id == id)
    }

    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// The standard eight-plan catalog: four government schemes and four
    /// private tiers. Premiums and limits are illustrative.
    pub fn standard() -> Self {
        Self::new(vec![
            Plan {
                id: PlanId::Ayushman,
                name: "Ayushman Bharat PM-JAY".to_string(),
                type_label: "Government Scheme".to_string(),
                monthly_premium: 0.0,
                co_pay_percent: 0,
                deductible: 0.0,
                max_out_of_pocket: 0.0,
                coverage_percent: 100,
                category: PlanCategory::Government,
                description: "Free cashless hospitalization for eligible low-income families"
                    .to_string(),
                coverage_highlights: vec![
                    "Cashless hospitalization".to_string(),
                    "Secondary and tertiary care".to_string(),
                    "No premium for eligible families".to_string(),
                ],
            },
            Plan {
                id: PlanId::Cghs,
                name: "CGHS".to_string(),
                type_label: "Government Scheme".to_string(),
                monthly_premium: 500.0,
                co_pay_percent: 0,
                deductible: 0.0,
                max_out_of_pocket: 10_000.0,
                coverage_percent: 90,
                category: PlanCategory::Government,
                description: "Comprehensive OPD and IPD cover for government employees"
                    .to_string(),
                coverage_highlights: vec![
                    "Outpatient consultations".to_string(),
                    "Inpatient treatment".to_string(),
                    "Subsidized medicines".to_string(),
                ],
            },
            Plan {
                id: PlanId::Esis,
                name: "ESIS".to_string(),
                type_label: "Government Scheme".to_string(),
                monthly_premium: 350.0,
                co_pay_percent: 0,
                deductible: 0.0,
                max_out_of_pocket: 5_000.0,
                coverage_percent: 100,
                category: PlanCategory::Government,
                description: "Wage-linked cover for salaried workers, including maternity"
                    .to_string(),
                coverage_highlights: vec![
                    "Full medical care".to_string(),
                    "Maternity benefits".to_string(),
                    "Disability support".to_string(),
                ],
            },
            Plan {
                id: PlanId::Rsby,
                name: "RSBY".to_string(),
                type_label: "Government Scheme".to_string(),
                monthly_premium: 30.0,
                co_pay_percent: 0,
                deductible: 0.0,
                max_out_of_pocket: 0.0,
                coverage_percent: 100,
                category: PlanCategory::Government,
                description: "Smart-card hospitalization cover for below-poverty-line families"
                    .to_string(),
                coverage_highlights: vec![
                    "Covers five family members".to_string(),
                    "Cashless hospitalization".to_string(),
                    "Minimal enrollment fee".to_string(),
                ],
            },
            Plan {
                id: PlanId::Budget,
                name: "Budget Care".to_string(),
                type_label: "Subsidized Coverage".to_string(),
                monthly_premium: 1_500.0,
                co_pay_percent: 10,
                deductible: 5_000.0,
                max_out_of_pocket: 50_000.0,
                coverage_percent: 80,
                category: PlanCategory::Private,
                description: "Affordable option for low-income families".to_string(),
                coverage_highlights: vec![
                    "Essential health services".to_string(),
                    "Emergency care".to_string(),
                    "Basic prescription coverage".to_string(),
                    "Preventive care".to_string(),
                ],
            },
            Plan {
                id: PlanId::Essential,
                name: "Essential Care".to_string(),
                type_label: "Basic Coverage".to_string(),
                monthly_premium: 3_500.0,
                co_pay_percent: 10,
                deductible: 10_000.0,
                max_out_of_pocket: 75_000.0,
                coverage_percent: 85,
                category: PlanCategory::Private,
                description: "Perfect for individuals and small families with basic healthcare needs"
                    .to_string(),
                coverage_highlights: vec![
                    "Annual health checkups".to_string(),
                    "Emergency care coverage".to_string(),
                    "Generic prescription drugs".to_string(),
                    "Preventive care services".to_string(),
                ],
            },
            Plan {
                id: PlanId::Family,
                name: "Family Shield".to_string(),
                type_label: "Comprehensive Coverage".to_string(),
                monthly_premium: 8_000.0,
                co_pay_percent: 5,
                deductible: 15_000.0,
                max_out_of_pocket: 100_000.0,
                coverage_percent: 90,
                category: PlanCategory::Private,
                description: "Ideal for families seeking comprehensive protection".to_string(),
                coverage_highlights: vec![
                    "Specialist consultations".to_string(),
                    "Maternity and newborn care".to_string(),
                    "Mental health services".to_string(),
                    "Dental and vision care".to_string(),
                ],
            },
            Plan {
                id: PlanId::Premium,
                name: "Premium Plus".to_string(),
                type_label: "Premium Coverage".to_string(),
                monthly_premium: 15_000.0,
                co_pay_percent: 0,
                deductible: 20_000.0,
                max_out_of_pocket: 150_000.0,
                coverage_percent: 95,
                category: PlanCategory::Private,
                description: "Top-tier coverage with minimal out-of-pocket costs".to_string(),
                coverage_highlights: vec![
                    "Private hospital rooms".to_string(),
                    "International coverage".to_string(),
                    "No referral needed for specialists".to_string(),
                    "Wellness programs".to_string(),
                ],
            },
        ])
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_catalog_has_all_eight_plans() {
        let catalog = PlanCatalog::standard();
        assert_eq!(catalog.plans().len(), 8);
        for id in [
            PlanId::Ayushman,
            PlanId::Cghs,
            PlanId::Esis,
            PlanId::Rsby,
            PlanId::Budget,
            PlanId::Essential,
            PlanId::Family,
            PlanId::Premium,
        ] {
            assert!(catalog.get(id).is_some(), "missing plan {:?}", id);
        }
    }

    #[test]
    fn percent_fields_stay_in_range() {
        for plan in PlanCatalog::standard().plans() {
            assert!(plan.co_pay_percent <= 100);
            assert!(plan.coverage_percent <= 100);
            assert!(plan.monthly_premium >= 0.0);
            assert!(plan.deductible >= 0.0);
            assert!(plan.max_out_of_pocket >= 0.0);
        }
    }
}
