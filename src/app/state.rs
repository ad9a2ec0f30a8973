use anyhow::Result;
use std::sync::Arc;

use crate::app::Config;
use crate::runtime::TurnOrchestrator;
use crate::session::{HistoryLimits, HistoryStore};
use crate::transcription::TranscriptionService;

/// Shared application state
///
/// Built once at startup and handed to every request handler by clone.
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: Arc<Config>,
    /// Chat turn handling, owns the history store
    pub orchestrator: Arc<TurnOrchestrator>,
    /// Audio side channel
    pub transcription: Arc<TranscriptionService>,
}

impl AppState {
    /// Create new app state from explicit parts
    pub fn new(
        config: Config,
        orchestrator: TurnOrchestrator,
        transcription: TranscriptionService,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            transcription: Arc::new(transcription),
        }
    }

    /// Build the history store and provider clients from configuration
    pub fn from_config(config: Config) -> Result<Self> {
        let store = Arc::new(HistoryStore::new(
            crate::session::SYSTEM_PROMPT,
            HistoryLimits::from(&config.history),
        ));
        let orchestrator = TurnOrchestrator::from_config(&config, store)?;
        let transcription = TranscriptionService::from_config(&config)?;
        Ok(Self::new(config, orchestrator, transcription))
    }

    /// Direct access to the history store
    pub fn store(&self) -> &Arc<HistoryStore> {
        self.orchestrator.store()
    }
}
