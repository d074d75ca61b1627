use suraksha_core::models::PlanCategory;
use suraksha_core::recommend::IncomeTier;
use suraksha_core::PlanCatalog;

/// Renders the assistant system prompt from the live catalog and the
/// income-tier table. The tier rules the model sees are generated from the
/// same `IncomeTier::ALL` rows the programmatic policy evaluates, so the
/// prompt cannot drift from the code.
pub fn build_system_prompt(catalog: &PlanCatalog, search_context: Option<&str>) -> String {
    let mut sections = vec![
        "You are a friendly AI assistant for Indian health insurance and hospital recommendations."
            .to_string(),
        COMMUNICATION_STYLE.to_string(),
        INSURANCE_ASSISTANCE.to_string(),
        render_catalog(catalog),
        render_tier_rules(catalog),
        HOSPITAL_GUIDANCE.to_string(),
        "Be friendly and conversational. Use simple language. No markdown formatting. \
         Guide users naturally."
            .to_string(),
    ];

    if let Some(context) = search_context {
        sections.push(format!("Recent information from web search:\n{context}"));
    }

    sections.join("\n\n")
}

fn render_catalog(catalog: &PlanCatalog) -> String {
    let mut out = String::from("Available Plans:\n\nGovernment Schemes:\n");
    let mut index = 0usize;

    for category in [PlanCategory::Government, PlanCategory::Private] {
        if category == PlanCategory::Private {
            out.push_str("\nPrivate Plans:\n");
        }
        for plan in catalog.plans().iter().filter(|p| p.category == category) {
            index += 1;
            let premium = if plan.monthly_premium == 0.0 {
                "free".to_string()
            } else {
                format!("Rs {:.0}/month", plan.monthly_premium)
            };
            out.push_str(&format!(
                "{}. {}: {}, {}\n",
                index,
                plan.name,
                premium,
                plan.coverage_highlights.join(", ")
            ));
        }
    }

    out.push_str("\nFormat for each plan:\nPlan Name: Monthly cost, Key features (2-3 words)");
    out
}

fn render_tier_rules(catalog: &PlanCatalog) -> String {
    let mut out = String::from("Plan Selection by Annual Household Income:\n");

    for rule in &IncomeTier::ALL {
        let band = match (rule.min_annual, rule.max_annual) {
            (min, Some(max)) if min == 0.0 => format!("Below {max:.0}"),
            (min, Some(max)) => format!("{min:.0} to under {max:.0}"),
            (min, None) => format!("{min:.0} and above"),
        };

        let names: Vec<&str> = rule
            .candidates
            .iter()
            .filter_map(|id| catalog.get(*id))
            .map(|plan| plan.name.as_str())
            .collect();
        let recommended = catalog
            .get(rule.recommended)
            .map(|plan| plan.name.as_str())
            .unwrap_or(rule.recommended.as_str());

        out.push_str(&format!(
            "- {}: suggest {}; recommend {} first\n",
            band,
            names.join(" and "),
            recommended
        ));
    }

    out.push_str("Always state which single plan you recommend most for the stated income.");
    out
}

const COMMUNICATION_STYLE: &str = "COMMUNICATION STYLE:\n\
- Keep responses short and conversational\n\
- No markdown formatting (no **, no ##, no bold)\n\
- Ask simple, direct questions\n\
- Use plain text only\n\
- Be concise and friendly";

const INSURANCE_ASSISTANCE: &str = "INSURANCE ASSISTANCE:\n\
1. Help families find the right health insurance plan based on their size and income\n\
2. Ask simple questions about family size, income, health needs, and preferences\n\
3. Explain insurance terms in simple language\n\
4. Inform users about Indian government health insurance schemes they may be eligible for\n\
\n\
When asking for information, use this simple format:\n\
- How many people are in your family?\n\
- What is your approximate monthly household income?\n\
- Are you aware of government schemes like Ayushman Bharat? (just yes or no)\n\
- Do you have any specific health coverage needs? (example: maternity, pre-existing conditions, cashless hospitalization)";

const HOSPITAL_GUIDANCE: &str = "HOSPITAL RECOMMENDATIONS:\n\
1. Identify the issue and specialty needed (no diagnosis)\n\
2. Ask for city if not provided\n\
3. Recommend 3-6 hospitals with: name, specialty, reason, cost range, cashless availability\n\
4. Always add: \"This is not medical advice. Please consult a doctor.\"";

#[cfg(test)]
mod tests {
    use super::*;
    use suraksha_core::models::PlanId;

    #[test]
    fn prompt_lists_every_catalog_plan() {
        let catalog = PlanCatalog::standard();
        let prompt = build_system_prompt(&catalog, None);
        for plan in catalog.plans() {
            assert!(prompt.contains(&plan.name), "missing {}", plan.name);
        }
    }

    #[test]
    fn prompt_tier_rules_come_from_the_policy_table() {
        let catalog = PlanCatalog::standard();
        let prompt = build_system_prompt(&catalog, None);

        // The low band recommends Budget Care first, same as recommend().
        let budget = catalog.get(PlanId::Budget).unwrap();
        assert!(prompt.contains(&format!("recommend {} first", budget.name)));
        assert!(prompt.contains("Below 30000"));
        assert!(prompt.contains("100000 and above"));
    }

    #[test]
    fn search_context_is_appended_when_present() {
        let catalog = PlanCatalog::standard();
        let without = build_system_prompt(&catalog, None);
        let with = build_system_prompt(&catalog, Some("- IRDAI update: snippet"));
        assert!(!without.contains("web search"));
        assert!(with.contains("Recent information from web search"));
        assert!(with.contains("IRDAI update"));
    }
}
