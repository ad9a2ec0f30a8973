pub mod app;
pub mod cli;
pub mod constants;
pub mod models;
pub mod runtime;
pub mod server;
pub mod session;
pub mod transcription;
pub mod utils;

pub use app::{load_config, AppState, Config};
pub use models::{ChatModel, ModelFactory, Role, Turn};
pub use runtime::{ChatReply, TurnOrchestrator};
pub use session::{HistoryStore, OrderSummary};
pub use transcription::TranscriptionService;
pub use utils::WaiterError;
