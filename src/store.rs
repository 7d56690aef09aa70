use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{HistoryEntry, Label, PersonalityResult, UserId};

/// Append-only storage for quiz results.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append_result(&self, user_id: UserId, label: Label) -> AppResult<PersonalityResult>;

    /// Results for one user, newest first.
    async fn list_history(&self, user_id: UserId) -> AppResult<Vec<HistoryEntry>>;

    /// Result counts across all users. Labels nobody received are absent.
    async fn label_counts(&self) -> AppResult<BTreeMap<Label, i64>>;
}

#[cfg(test)]
pub use memory::MemoryResultStore;
