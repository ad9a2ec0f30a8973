// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod factory;
mod openai;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use factory::ModelFactory;
pub use openai::OpenAiChatModel;
pub use traits::ChatModel;
#[cfg(test)]
pub use traits::MockChatModel;
pub use types::{ModelConfig, ModelResponse, Role, TokenUsage, Turn};
