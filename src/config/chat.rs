//! Chat Config

use clap::Args;
use jiff::SignedDuration;

/// Chat behaviour settings.
#[derive(Debug, Clone, Args)]
pub struct ChatConfig {
    /// Window within which identical messages are treated as one
    #[arg(long, env = "BAZAAR_CHAT_ECHO_TOLERANCE_MS", default_value_t = 2_000_i64)]
    pub echo_tolerance_ms: i64,
}

impl ChatConfig {
    /// The duplicate-detection window.
    pub fn echo_tolerance(&self) -> SignedDuration {
        SignedDuration::from_millis(self.echo_tolerance_ms.max(0))
    }
}
