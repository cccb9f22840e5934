// Remote storage seam for the shared translate-chat log.

use async_trait::async_trait;
use homeroom_core::chat::ChatEntry;

/// Where the translate chat log lives. Implementations swallow their own
/// failures: `load` degrades to an empty list and `save` to `false`.
#[async_trait]
pub trait ChatLogStore: Send + Sync {
    /// The most recent entries, oldest first.
    async fn load(&self) -> Vec<ChatEntry>;

    /// Overwrite the stored log with (the tail of) `history`. Returns whether
    /// the write was accepted.
    async fn save(&self, history: &[ChatEntry]) -> bool;
}
