use thiserror::Error;

use crate::models::{CostBreakdown, Plan, UtilizationInput};

/// Assumed cost per doctor visit, in base currency units.
pub const DOCTOR_VISIT_COST: f64 = 500.0;

#[derive(Debug, Error)]
pub enum EstimateError {
    #[error("unknown plan id: {0}")]
    UnknownPlan(String),
    #[error("negative amount for {field}: {value}")]
    NegativeAmount { field: &'static str, value: f64 },
}

/// Boundary check used by API and CLI callers. The estimator itself is a
/// total function and assumes these held.
pub fn validate_utilization(input: &UtilizationInput) -> Result<(), EstimateError> {
    let checks = [
        ("avg_hospitalization_cost", input.avg_hospitalization_cost),
        ("medication_cost", input.medication_cost),
        ("diagnostics_cost", input.diagnostics_cost),
    ];
    for (field, value) in checks {
        if value < 0.0 {
            return Err(EstimateError::NegativeAmount { field, value });
        }
    }
    Ok(())
}

/// Deterministic annual cost breakdown for one plan and one utilization
/// projection.
///
/// When a plan carries a co-pay percentage, the co-pay alone determines the
/// patient share of post-deductible cost; it replaces the coverage-percent
/// complement rather than combining with it. The out-of-pocket cap is the
/// final clamp, so a cap of zero means zero patient liability no matter how
/// large the utilization.
pub fn estimate(plan: &Plan, utilization: &UtilizationInput) -> CostBreakdown {
    let annual_premium = plan.monthly_premium * 12.0;

    let total_healthcare_cost = f64::from(utilization.doctor_visits) * DOCTOR_VISIT_COST
        + f64::from(utilization.hospitalizations) * utilization.avg_hospitalization_cost
        + utilization.medication_cost
        + utilization.diagnostics_cost;

    let cost_after_deductible = (total_healthcare_cost - plan.deductible).max(0.0);

    let insurer_paid = cost_after_deductible * (f64::from(plan.coverage_percent) / 100.0);

    let mut patient_portion = cost_after_deductible - insurer_paid;
    if plan.co_pay_percent > 0 {
        patient_portion = cost_after_deductible * (f64::from(plan.co_pay_percent) / 100.0);
    }

    let out_of_pocket = (patient_portion + plan.deductible).min(plan.max_out_of_pocket);

    let total_annual_cost = annual_premium + out_of_pocket;

    CostBreakdown {
        annual_premium,
        total_healthcare_cost,
        deductible_applied: plan.deductible,
        insurer_paid,
        out_of_pocket,
        total_annual_cost,
        savings: total_healthcare_cost - total_annual_cost,
    }
}
