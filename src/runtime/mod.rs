/// Runtime module - Gateway

mod orchestrator;
mod sweeper;

pub use orchestrator::{ChatReply, TurnOrchestrator};
pub use sweeper::spawn_idle_sweeper;
