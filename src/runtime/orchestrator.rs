use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    app::{Config, MissingModelPolicy},
    constants::ECHO_REPLY_MARKER,
    models::{ChatModel, ModelFactory, Turn},
    session::{HistoryStore, OrderSummary},
    utils::WaiterError,
};

/// Outcome of one chat turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Trimmed assistant text, order block included
    pub reply: String,
    pub session_id: String,
    /// True when the reply is the echo fallback rather than a model answer
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

impl ChatReply {
    /// Parse the structured order block out of the reply, if present
    pub fn orders(&self) -> Option<OrderSummary> {
        OrderSummary::from_reply(&self.reply)
    }
}

/// Runs one user message through history and the chat model
pub struct TurnOrchestrator {
    store: Arc<HistoryStore>,
    model: Option<Arc<dyn ChatModel>>,
    policy: MissingModelPolicy,
    timeout: Duration,
}

impl TurnOrchestrator {
    pub fn new(
        store: Arc<HistoryStore>,
        model: Option<Arc<dyn ChatModel>>,
        policy: MissingModelPolicy,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            model,
            policy,
            timeout,
        }
    }

    /// Wire the configured chat model to `store`
    pub fn from_config(config: &Config, store: Arc<HistoryStore>) -> Result<Self> {
        let model = ModelFactory::from_config(config)?;
        Ok(Self::new(
            store,
            model,
            config.fallback.policy,
            config.openai.request_timeout(),
        ))
    }

    pub fn store(&self) -> &Arc<HistoryStore> {
        &self.store
    }

    /// Whether a chat model credential is available
    pub fn is_configured(&self) -> bool {
        self.model.is_some()
    }

    /// Handle one inbound chat message
    ///
    /// The session lock is held from the user append until the assistant
    /// append, so turns on one session never interleave. A failed or timed
    /// out model call leaves the user turn in place and appends nothing else.
    pub async fn handle_message(
        &self,
        session_id: Option<String>,
        user_text: &str,
    ) -> Result<ChatReply, WaiterError> {
        let session_id = session_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        let Some(model) = &self.model else {
            return match self.policy {
                MissingModelPolicy::FailFast => Err(WaiterError::NotConfigured("chat model")),
                MissingModelPolicy::Echo => {
                    debug!(session_id = %session_id, "No chat model, echoing message");
                    Ok(ChatReply {
                        reply: format!("{ECHO_REPLY_MARKER}{user_text}"),
                        session_id,
                        fallback: true,
                    })
                }
            };
        };

        let mut session = self.store.lock(&session_id).await;

        session.append(Turn::user(user_text));
        let context = session.turns().to_vec();
        debug!(
            session_id = %session_id,
            turns = context.len(),
            "Calling chat model"
        );

        let response = match tokio::time::timeout(self.timeout, model.chat(&context)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!(session_id = %session_id, error = %e, "Chat model call failed");
                return Err(WaiterError::UpstreamUnavailable(format!("{e:#}")));
            }
            Err(_) => {
                warn!(session_id = %session_id, timeout = ?self.timeout, "Chat model call timed out");
                return Err(WaiterError::UpstreamUnavailable(format!(
                    "model did not respond within {:?}",
                    self.timeout
                )));
            }
        };

        let reply = response.content.trim().to_string();
        if reply.is_empty() {
            warn!(session_id = %session_id, "Chat model returned an empty reply");
            return Err(WaiterError::UpstreamUnavailable(
                "model returned an empty reply".to_string(),
            ));
        }

        let turns = session.append(Turn::assistant(reply.clone()));
        info!(
            session_id = %session_id,
            turns,
            model = %response.model_name,
            "Chat turn completed"
        );

        Ok(ChatReply {
            reply,
            session_id,
            fallback: false,
        })
    }
}
