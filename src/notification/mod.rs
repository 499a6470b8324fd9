//! Notification layer - turn a decoded crash record into a webhook payload
//!
//! Split by concern:
//! - `embed`: field formatting and the per-field/per-title length budgets
//! - `webhook`: blocking HTTP transport, status code in, status code out
//! - `discord`: submission pipeline (announce, embed, attachment, warning)

pub mod discord;
pub mod embed;
pub mod webhook;

pub use discord::{DiscordHandler, DiscordOptions};
pub use webhook::{WebhookClient, WebhookConfig, ACCEPTED_STATUS};
