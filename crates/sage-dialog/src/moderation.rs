//! Moderation gate applied to note content before generation.
//!
//! Unsafe content never reaches the generation collaborator. Flagged
//! content aborts the flow with a generic notice (never echoing the
//! content back) and, when an administrative recipient is configured,
//! emits a best-effort notification carrying the user id and a truncated
//! excerpt for manual review.

use std::sync::Arc;

use async_trait::async_trait;

use sage_core::text::truncate_with_suffix;
use sage_core::{Result, UserId};

use crate::sources::{AdminNotifier, Moderator};

/// Longest excerpt of flagged content included in an admin notification.
const EXCERPT_BYTES: usize = 80;

/// Gate that screens content through the moderation collaborator.
pub struct ModerationGate {
    moderator: Arc<dyn Moderator>,
    notifier: Arc<dyn AdminNotifier>,
    /// Whether an admin recipient is configured; when false the
    /// notification side effect is a no-op.
    admin_configured: bool,
}

impl ModerationGate {
    pub fn new(
        moderator: Arc<dyn Moderator>,
        notifier: Arc<dyn AdminNotifier>,
        admin_configured: bool,
    ) -> Self {
        Self {
            moderator,
            notifier,
            admin_configured,
        }
    }

    /// Screen `text` on behalf of `user_id`. Returns true when flagged.
    ///
    /// A moderation transport failure fails open with a warning: blocking
    /// a student's own study notes over an outage is the worse trade.
    pub async fn check(&self, user_id: UserId, text: &str) -> bool {
        match self.moderator.moderate(text).await {
            Ok(false) => false,
            Ok(true) => {
                tracing::warn!(user_id, "content flagged by moderation");
                if self.admin_configured {
                    let excerpt = truncate_with_suffix(text, EXCERPT_BYTES, "...");
                    let message = format!(
                        "User {} submitted content that failed moderation: {}",
                        user_id, excerpt
                    );
                    self.notifier.notify(&message).await;
                }
                true
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "moderation check failed, failing open");
                false
            }
        }
    }
}

/// Deny-list [`Moderator`] flagging text that contains any configured term.
///
/// Matching is case-insensitive substring containment. Useful for demos
/// and as a local backstop in front of a remote moderation service.
pub struct KeywordModerator {
    terms: Vec<String>,
}

impl KeywordModerator {
    pub fn new(terms: Vec<String>) -> Self {
        let terms = terms.into_iter().map(|t| t.to_lowercase()).collect();
        Self { terms }
    }
}

#[async_trait]
impl Moderator for KeywordModerator {
    async fn moderate(&self, text: &str) -> Result<bool> {
        let lowered = text.to_lowercase();
        Ok(self.terms.iter().any(|t| lowered.contains(t.as_str())))
    }
}
