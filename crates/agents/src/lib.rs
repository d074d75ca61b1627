use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use suraksha_core::models::{
    ChatMessage, ConversationSession, ConversationTurn, RecommendationResult, Role, WizardStep,
};
use suraksha_core::{PlanCatalog, WizardSession};
use suraksha_llm::{GatewayClient, LlmError, SearchClient};
use suraksha_observability::AppMetrics;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const SESSION_TTL_HOURS: i64 = 24;
const MAX_TRANSCRIPT_TURNS: usize = 40;

#[derive(Debug, Clone, Deserialize)]
pub struct WizardInput {
    pub session_id: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct WizardReply {
    pub session_id: String,
    pub message: String,
    pub step: WizardStep,
    pub rejected: bool,
    pub recommendations: Option<RecommendationResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiChatInput {
    pub session_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub use_search: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiChatReply {
    pub session_id: String,
    pub message: String,
    pub search_augmented: bool,
}

#[derive(Debug, Error)]
pub enum AiChatError {
    /// A request for this session is already in flight; the send is
    /// dropped, not queued.
    #[error("a response is already being generated for this session")]
    Busy,
    #[error("AI mode is not configured")]
    Disabled,
    #[error(transparent)]
    Llm(#[from] LlmError),
}

struct WizardEntry {
    session: WizardSession,
    expires_at: DateTime<Utc>,
}

/// Owns conversation state for both chat modes: the rule-based wizard and
/// the AI mode that delegates to the remote gateway. All state is in-memory
/// and expires after 24 hours.
pub struct ChatOrchestrator {
    catalog: PlanCatalog,
    gateway: Option<GatewayClient>,
    search: Option<SearchClient>,
    wizards: RwLock<HashMap<String, WizardEntry>>,
    conversations: RwLock<HashMap<String, ConversationSession>>,
    in_flight: Arc<Mutex<HashSet<String>>>,
    metrics: Arc<AppMetrics>,
}

impl ChatOrchestrator {
    pub fn new(
        catalog: PlanCatalog,
        gateway: Option<GatewayClient>,
        search: Option<SearchClient>,
        metrics: Arc<AppMetrics>,
    ) -> Self {
        Self {
            catalog,
            gateway,
            search,
            wizards: RwLock::new(HashMap::new()),
            conversations: RwLock::new(HashMap::new()),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
            metrics,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    pub fn ai_mode_enabled(&self) -> bool {
        self.gateway.is_some()
    }

    pub fn search_enabled(&self) -> bool {
        self.search.is_some()
    }

    /// One turn of the rule-based wizard. Creates the session on first
    /// contact; invalid input surfaces a notice without advancing the step.
    #[instrument(skip(self, input))]
    pub fn handle_wizard(&self, input: WizardInput) -> WizardReply {
        let started = Instant::now();
        self.metrics.inc_request();

        let session_id = input
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut wizards = self.wizards.write();
        let entry = wizards.entry(session_id.clone()).or_insert_with(|| WizardEntry {
            session: WizardSession::new(),
            expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
        });
        entry.expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);

        let turn = entry.session.handle_input(&self.catalog, &input.text);
        drop(wizards);

        if turn.step == WizardStep::ShowingRecommendations && turn.recommendations.is_some() {
            self.metrics.inc_wizard_completed();
        }
        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            step = ?turn.step,
            rejected = turn.rejected,
            "wizard turn handled"
        );

        WizardReply {
            session_id,
            message: turn.message,
            step: turn.step,
            rejected: turn.rejected,
            recommendations: turn.recommendations,
        }
    }

    /// One AI-mode turn. The full transcript is replayed to the gateway
    /// under a system prompt rendered from the catalog; at most one request
    /// per session is in flight, and gateway failure ends the turn without
    /// falling back to the wizard.
    #[instrument(skip(self, input))]
    pub async fn handle_ai_chat(&self, input: AiChatInput) -> Result<AiChatReply, AiChatError> {
        let started = Instant::now();
        self.metrics.inc_request();

        let Some(gateway) = self.gateway.as_ref() else {
            return Err(AiChatError::Disabled);
        };

        let session_id = input
            .session_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        let _guard = match InFlightGuard::acquire(self.in_flight.clone(), &session_id) {
            Some(guard) => guard,
            None => {
                self.metrics.inc_suppressed_send();
                warn!(session_id = %session_id, "send suppressed, request already in flight");
                return Err(AiChatError::Busy);
            }
        };

        let mut transcript = self.transcript_for(&session_id);
        transcript.push(ChatMessage {
            role: Role::User,
            content: input.text.clone(),
        });

        let search_context = if input.use_search {
            match self.search.as_ref() {
                Some(search) => {
                    let context = search.context_for(&input.text).await;
                    if context.is_some() {
                        self.metrics.inc_search_augmented();
                    }
                    context
                }
                None => None,
            }
        } else {
            None
        };

        self.metrics.inc_llm_request();
        let message = match gateway
            .complete(&self.catalog, &transcript, search_context.as_deref())
            .await
        {
            Ok(message) => message,
            Err(error) => {
                self.metrics.inc_llm_failure();
                warn!(session_id = %session_id, %error, "gateway turn failed");
                return Err(error.into());
            }
        };

        self.persist_turn(&session_id, &input.text, &message);
        self.metrics.observe_latency(started.elapsed());
        info!(
            session_id = %session_id,
            model = gateway.model(),
            search_augmented = search_context.is_some(),
            "ai chat turn handled"
        );

        Ok(AiChatReply {
            session_id,
            message,
            search_augmented: search_context.is_some(),
        })
    }

    pub fn purge_expired(&self) -> u64 {
        let now = Utc::now();
        let mut removed = 0_u64;

        self.wizards.write().retain(|_, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        self.conversations.write().retain(|_, session| {
            let keep = session.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });

        removed
    }

    fn transcript_for(&self, session_id: &str) -> Vec<ChatMessage> {
        let conversations = self.conversations.read();
        let Some(session) = conversations.get(session_id) else {
            return Vec::new();
        };

        let mut messages = Vec::with_capacity(session.turns.len() * 2);
        for turn in &session.turns {
            messages.push(ChatMessage {
                role: Role::User,
                content: turn.user_text.clone(),
            });
            messages.push(ChatMessage {
                role: Role::Assistant,
                content: turn.assistant_text.clone(),
            });
        }
        messages
    }

    fn persist_turn(&self, session_id: &str, user_text: &str, assistant_text: &str) {
        let mut conversations = self.conversations.write();
        let session = conversations
            .entry(session_id.to_string())
            .or_insert_with(|| ConversationSession {
                session_id: session_id.to_string(),
                expires_at: Utc::now() + Duration::hours(SESSION_TTL_HOURS),
                turns: Vec::new(),
            });

        session.expires_at = Utc::now() + Duration::hours(SESSION_TTL_HOURS);
        session.turns.push(ConversationTurn {
            at: Utc::now(),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
        });

        if session.turns.len() > MAX_TRANSCRIPT_TURNS {
            let keep_from = session.turns.len() - MAX_TRANSCRIPT_TURNS;
            session.turns = session.turns.split_off(keep_from);
        }
    }
}

/// Marks a session as having an outstanding gateway request; cleared on
/// drop so a panic or early return cannot wedge the session.
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl InFlightGuard {
    fn acquire(in_flight: Arc<Mutex<HashSet<String>>>, session_id: &str) -> Option<Self> {
        if !in_flight.lock().insert(session_id.to_string()) {
            return None;
        }
        Some(Self {
            in_flight,
            session_id: session_id.to_string(),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use suraksha_core::models::PlanId;

    fn orchestrator() -> ChatOrchestrator {
        ChatOrchestrator::new(PlanCatalog::standard(), None, None, AppMetrics::shared())
    }

    #[test]
    fn wizard_runs_to_recommendations_across_turns() {
        let agent = orchestrator();

        let first = agent.handle_wizard(WizardInput {
            session_id: None,
            text: "4".to_string(),
        });
        assert_eq!(first.step, WizardStep::AwaitingIncome);

        let second = agent.handle_wizard(WizardInput {
            session_id: Some(first.session_id.clone()),
            text: "2000".to_string(),
        });
        assert_eq!(second.step, WizardStep::ShowingRecommendations);
        let result = second.recommendations.expect("terminal reply carries plans");
        assert_eq!(
            result.plans.iter().find(|p| p.recommended).unwrap().plan.id,
            PlanId::Budget
        );
    }

    #[test]
    fn separate_sessions_do_not_share_state() {
        let agent = orchestrator();

        let a = agent.handle_wizard(WizardInput {
            session_id: None,
            text: "2".to_string(),
        });
        let b = agent.handle_wizard(WizardInput {
            session_id: None,
            text: "not a number at all".to_string(),
        });

        assert_ne!(a.session_id, b.session_id);
        assert_eq!(a.step, WizardStep::AwaitingIncome);
        assert_eq!(b.step, WizardStep::AwaitingFamilySize);
        assert!(b.rejected);
    }

    #[tokio::test]
    async fn ai_mode_without_gateway_is_disabled() {
        let agent = orchestrator();
        let result = agent
            .handle_ai_chat(AiChatInput {
                session_id: None,
                text: "which plan suits me?".to_string(),
                use_search: false,
            })
            .await;
        assert!(matches!(result, Err(AiChatError::Disabled)));
    }

    #[test]
    fn in_flight_guard_suppresses_second_acquire() {
        let in_flight = Arc::new(Mutex::new(HashSet::new()));
        let guard = InFlightGuard::acquire(in_flight.clone(), "s1");
        assert!(guard.is_some());
        assert!(InFlightGuard::acquire(in_flight.clone(), "s1").is_none());

        drop(guard);
        assert!(InFlightGuard::acquire(in_flight, "s1").is_some());
    }

    #[test]
    fn purge_removes_expired_wizard_sessions() {
        let agent = orchestrator();
        let reply = agent.handle_wizard(WizardInput {
            session_id: None,
            text: "3".to_string(),
        });

        agent
            .wizards
            .write()
            .get_mut(&reply.session_id)
            .unwrap()
            .expires_at = Utc::now() - Duration::hours(1);

        assert_eq!(agent.purge_expired(), 1);
        assert!(agent.wizards.read().is_empty());
    }
}
