//! crash-relay - extract framed crash dumps from server logs and relay them
//! to a Discord webhook

pub mod config;
pub mod crash_test;
pub mod dump;
pub mod notification;
pub mod sweeper;

pub use config::RelayConfig;
pub use crash_test::CrashTester;
pub use dump::{CrashDumpReader, CrashRecord, BEGIN_MARKER, END_MARKER};
pub use notification::{DiscordHandler, DiscordOptions, WebhookClient, WebhookConfig};
