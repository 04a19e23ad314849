//! Client configuration.

use parley_core::{DEFAULT_EMPTY_PREVIEW, MergePolicy};
use parley_proto::ParticipantId;

/// Settings fixed for the lifetime of a [`Client`](crate::Client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Local participant. Must not be empty.
    pub identity: ParticipantId,
    /// How server messages are reconciled with optimistic entries.
    pub merge_policy: MergePolicy,
    /// Preview shown for conversations with no known message.
    pub empty_preview: String,
}

impl ClientConfig {
    /// Configuration for `identity` with default settings.
    pub fn new(identity: impl Into<ParticipantId>) -> Self {
        Self {
            identity: identity.into(),
            merge_policy: MergePolicy::default(),
            empty_preview: DEFAULT_EMPTY_PREVIEW.to_owned(),
        }
    }

    /// Use `policy` for timeline reconciliation.
    #[must_use]
    pub fn with_merge_policy(mut self, policy: MergePolicy) -> Self {
        self.merge_policy = policy;
        self
    }

    /// Show `preview` for conversations with no message.
    #[must_use]
    pub fn with_empty_preview(mut self, preview: impl Into<String>) -> Self {
        self.empty_preview = preview.into();
        self
    }
}
