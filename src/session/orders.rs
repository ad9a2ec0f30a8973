use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fenced ```json blocks, lazily matched so adjacent blocks stay separate
static FENCED_JSON: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fenced-json regex")
});

/// Start of a bare `{"orders": ...}` object
static BARE_ORDERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\{\s*"orders"\s*:"#).expect("valid bare-orders regex"));

/// One ordered menu item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub qty: u32,
}

/// The structured order block the preamble asks the model to append
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub orders: Vec<OrderItem>,
}

impl OrderSummary {
    /// Extract the order block from a model reply
    ///
    /// Prefers the last fenced json block; falls back to a bare
    /// `{"orders": [...]}` object anywhere in the text. Returns `None` when
    /// no parseable block is present. The reply itself is never modified.
    pub fn from_reply(reply: &str) -> Option<Self> {
        let fenced = FENCED_JSON
            .captures_iter(reply)
            .filter_map(|caps| caps.get(1))
            .filter_map(|m| serde_json::from_str::<OrderSummary>(m.as_str()).ok())
            .last();
        if fenced.is_some() {
            return fenced;
        }

        BARE_ORDERS
            .find_iter(reply)
            .filter_map(|m| {
                // Parse one JSON value and ignore whatever text follows it
                serde_json::Deserializer::from_str(&reply[m.start()..])
                    .into_iter::<OrderSummary>()
                    .next()
                    .and_then(|parsed| parsed.ok())
            })
            .last()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn total_items(&self) -> u32 {
        self.orders.iter().map(|item| item.qty).sum()
    }
}

impl fmt::Display for OrderSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.orders.is_empty() {
            return f.write_str("no items");
        }
        let items: Vec<String> = self
            .orders
            .iter()
            .map(|item| format!("{} x{}", item.name, item.qty))
            .collect();
        f.write_str(&items.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parses_fenced_block() {
        let reply = "Sure! One chicken rice coming up.\n```json\n{\"orders\":[{\"name\":\"Hainanese Chicken Rice\",\"qty\":1}]}\n```";
        let summary = OrderSummary::from_reply(reply).unwrap();
        assert_eq!(
            summary.orders,
            vec![OrderItem {
                name: "Hainanese Chicken Rice".to_string(),
                qty: 1
            }]
        );
        assert_eq!(summary.to_string(), "Hainanese Chicken Rice x1");
    }

    #[test]
    fn test_empty_order_list() {
        let reply = "Hello! What would you like?\n```json\n{\"orders\":[]}\n```";
        let summary = OrderSummary::from_reply(reply).unwrap();
        assert!(summary.is_empty());
        assert_eq!(summary.to_string(), "no items");
    }

    #[test]
    fn test_last_block_wins() {
        let reply = "```json\n{\"orders\":[]}\n```\nActually:\n```json\n{\"orders\":[{\"name\":\"Iced Lemon Tea\",\"qty\":2},{\"name\":\"Penang Char Kuey Teow\",\"qty\":1}]}\n```";
        let summary = OrderSummary::from_reply(reply).unwrap();
        assert_eq!(summary.orders.len(), 2);
        assert_eq!(summary.total_items(), 3);
    }

    #[test]
    fn test_bare_object_without_fence() {
        let reply = "Two teas. {\"orders\":[{\"name\":\"Iced Lemon Tea\",\"qty\":2}]} Enjoy!";
        let summary = OrderSummary::from_reply(reply).unwrap();
        assert_eq!(summary.orders[0].qty, 2);
    }

    #[test]
    fn test_missing_or_malformed_block() {
        assert!(OrderSummary::from_reply("Just chatting, no block.").is_none());
        assert!(OrderSummary::from_reply("```json\n{\"orders\": \"lots\"}\n```").is_none());
    }
}
