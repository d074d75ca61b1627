use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use suraksha_agents::{AiChatInput, ChatOrchestrator, WizardInput};
use suraksha_core::estimate::{estimate, validate_utilization};
use suraksha_core::models::{PlanId, UtilizationInput};
use suraksha_core::recommend::recommend;
use suraksha_core::{PlanCatalog, WizardSession};
use suraksha_llm::{GatewayClient, GatewayConfig, SearchClient, SearchConfig};
use suraksha_observability::{init_tracing, AppMetrics};

#[derive(Debug, Parser)]
#[command(name = "suraksha")]
#[command(about = "Suraksha Concierge CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rule-based wizard chat in the terminal.
    Chat,
    /// Free-form AI chat through the model gateway.
    Ai {
        #[arg(long, default_value_t = false)]
        search: bool,
    },
    /// Recommend plans for a household profile.
    Recommend {
        #[arg(long)]
        family_size: u32,
        #[arg(long)]
        monthly_income: f64,
    },
    /// Annual cost breakdown for one plan.
    Estimate {
        plan: String,
        #[arg(long, default_value_t = 4)]
        doctor_visits: u32,
        #[arg(long, default_value_t = 0)]
        hospitalizations: u32,
        #[arg(long, default_value_t = 50_000.0)]
        avg_hospitalization_cost: f64,
        #[arg(long, default_value_t = 2_000.0)]
        medication_cost: f64,
        #[arg(long, default_value_t = 3_000.0)]
        diagnostics_cost: f64,
    },
    /// Print the plan catalog.
    Plans,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("suraksha_cli");
    let cli = Cli::parse();
    let catalog = PlanCatalog::standard();

    match cli.command {
        Command::Chat => run_wizard_chat(build_agent(catalog))?,
        Command::Ai { search } => run_ai_chat(build_agent(catalog), search).await?,
        Command::Recommend {
            family_size,
            monthly_income,
        } => {
            if family_size < 1 {
                bail!("--family-size must be at least 1");
            }
            if monthly_income < 0.0 || !monthly_income.is_finite() {
                bail!("--monthly-income must be a non-negative number");
            }
            let result = recommend(&catalog, family_size, monthly_income);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Estimate {
            plan,
            doctor_visits,
            hospitalizations,
            avg_hospitalization_cost,
            medication_cost,
            diagnostics_cost,
        } => {
            let plan_id = PlanId::parse(&plan)
                .with_context(|| format!("unknown plan id: {plan}"))?;
            let plan = catalog
                .get(plan_id)
                .with_context(|| format!("plan missing from catalog: {}", plan_id.as_str()))?;

            let utilization = UtilizationInput {
                doctor_visits,
                hospitalizations,
                avg_hospitalization_cost,
                medication_cost,
                diagnostics_cost,
            };
            validate_utilization(&utilization)?;

            let breakdown = estimate(plan, &utilization);
            println!("{}", serde_json::to_string_pretty(&breakdown)?);
        }
        Command::Plans => {
            println!("{}", serde_json::to_string_pretty(catalog.plans())?);
        }
    }

    Ok(())
}

fn build_agent(catalog: PlanCatalog) -> ChatOrchestrator {
    let gateway = GatewayConfig::from_env()
        .and_then(|config| GatewayClient::new(config).ok());
    let search = SearchConfig::from_env().map(|config| {
        let http = reqwest_client();
        SearchClient::new(http, config)
    });

    ChatOrchestrator::new(catalog, gateway, search, AppMetrics::shared())
}

fn run_wizard_chat(agent: ChatOrchestrator) -> Result<()> {
    let mut session_id: Option<String> = None;

    println!("Suraksha Concierge wizard. type 'exit' to quit.");
    println!("\n{}\n", WizardSession::greeting());

    loop {
        let Some(message) = read_line()? else {
            break;
        };

        let reply = agent.handle_wizard(WizardInput {
            session_id: session_id.clone(),
            text: message,
        });
        session_id = Some(reply.session_id.clone());

        println!("\n{}\n", reply.message);

        if let Some(result) = reply.recommendations {
            for entry in &result.plans {
                let marker = if entry.recommended { " (recommended)" } else { "" };
                println!("- {}{}", entry.plan.name, marker);
            }
            println!();
        }
    }

    Ok(())
}

async fn run_ai_chat(agent: ChatOrchestrator, use_search: bool) -> Result<()> {
    if !agent.ai_mode_enabled() {
        bail!("AI mode needs SURAKSHA_GATEWAY_API_KEY to be set");
    }

    let agent = Arc::new(agent);
    let mut session_id: Option<String> = None;

    println!("Suraksha Concierge AI chat. type 'exit' to quit.");

    loop {
        let Some(message) = read_line()? else {
            break;
        };

        let result = agent
            .handle_ai_chat(AiChatInput {
                session_id: session_id.clone(),
                text: message,
                use_search,
            })
            .await;

        match result {
            Ok(reply) => {
                session_id = Some(reply.session_id.clone());
                println!("\n{}\n", reply.message);
            }
            Err(error) => {
                println!("\n{error}\n");
            }
        }
    }

    Ok(())
}

/// Reads one trimmed line; None means EOF or an exit command.
fn read_line() -> Result<Option<String>> {
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            return Ok(None);
        }
        if message.is_empty() {
            continue;
        }
        return Ok(Some(message.to_string()));
    }
}

fn reqwest_client() -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(6))
        .timeout(Duration::from_secs(20))
        .build()
        .unwrap_or_default()
}
