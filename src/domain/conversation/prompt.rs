//! System prompt composition and visitor personalization.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Placeholder replaced by the visitor's display name in welcome messages.
pub const NAME_PLACEHOLDER: &str = "{name}";

/// One line item of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub quantity: u32,
    pub name: String,
}

/// Summary of a past order, as shown to the completion provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSummary {
    pub number: String,
    pub placed_on: NaiveDate,
    pub status: String,
    /// Pre-formatted total including currency, e.g. `"৳1,250.00"`.
    pub total: String,
    pub items: Vec<OrderItem>,
}

impl OrderSummary {
    fn render(&self) -> String {
        let items: Vec<String> = self
            .items
            .iter()
            .map(|item| format!("{}x {}", item.quantity, item.name))
            .collect();
        format!(
            "Order #{} placed on {}\nStatus: {}\nTotal: {}\nItems: {}",
            self.number,
            self.placed_on.format("%B %-d, %Y"),
            self.status,
            self.total,
            items.join(", ")
        )
    }
}

/// Known facts about an identified visitor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisitorProfile {
    pub display_name: String,
    pub recent_orders: Vec<OrderSummary>,
}

impl VisitorProfile {
    /// Context block appended to the system prompt.
    pub fn context_block(&self) -> String {
        let mut block = String::new();
        if !self.display_name.trim().is_empty() {
            block.push_str(&format!("The visitor's name is {}.\n\n", self.display_name.trim()));
        }
        if self.recent_orders.is_empty() {
            block.push_str("No order history available.");
        } else {
            block.push_str(&format!(
                "Here are the last {} orders:\n\n",
                self.recent_orders.len()
            ));
            let orders: Vec<String> = self.recent_orders.iter().map(OrderSummary::render).collect();
            block.push_str(&orders.join("\n\n"));
        }
        block
    }
}

/// Builds the system prompt sent ahead of the history.
pub fn compose_system_prompt(base: &str, profile: Option<&VisitorProfile>) -> String {
    match profile {
        Some(profile) => format!("{}\n\n{}", base.trim_end(), profile.context_block()),
        None => base.to_string(),
    }
}

/// Picks the greeting for the widget.
pub fn welcome_message(guest: &str, known: &str, profile: Option<&VisitorProfile>) -> String {
    match profile {
        Some(p) if !p.display_name.trim().is_empty() => {
            known.replace(NAME_PLACEHOLDER, p.display_name.trim())
        }
        _ => guest.to_string(),
    }
}
