/// Session management module - Gateway

mod history;
mod orders;
mod prompt;
mod store;

pub use history::{History, HistoryLimits};
pub use orders::{OrderItem, OrderSummary};
pub use prompt::{MENU_TEXT, SYSTEM_PROMPT};
pub use store::{HistoryStore, SessionGuard};
