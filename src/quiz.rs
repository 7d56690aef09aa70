use std::collections::BTreeMap;

use crate::error::{AppError, AppResult};
use crate::models::{HistoryEntry, Label, PersonalityResult, UserId};
use crate::personality;
use crate::store::ResultStore;

fn require_user(user_id: Option<UserId>) -> AppResult<UserId> {
    user_id.ok_or(AppError::Unauthenticated)
}

/// Scores a submission and appends it to the user's history.
pub async fn submit(
    store: &dyn ResultStore,
    user_id: Option<UserId>,
    raw: [Option<&str>; 5],
) -> AppResult<PersonalityResult> {
    let user_id = require_user(user_id)?;
    let label = personality::score_raw(raw)?;
    store.append_result(user_id, label).await
}

pub async fn history(store: &dyn ResultStore, user_id: Option<UserId>) -> AppResult<Vec<HistoryEntry>> {
    let user_id = require_user(user_id)?;
    store.list_history(user_id).await
}

/// Global label counts. Not tied to any user.
pub async fn summary(store: &dyn ResultStore) -> AppResult<BTreeMap<Label, i64>> {
    store.label_counts().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryResultStore;

    const TIE: [Option<&str>; 5] = [
        Some("Disagree"),
        Some("Agree"),
        Some("Disagree"),
        Some("Agree"),
        Some("Agree"),
    ];

    #[tokio::test]
    async fn anonymous_submission_is_rejected() {
        let store = MemoryResultStore::new();
        let result = submit(&store, None, TIE).await;
        assert!(matches!(result, Err(AppError::Unauthenticated)));
        assert!(store.label_counts().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn anonymous_history_is_rejected() {
        let store = MemoryResultStore::new();
        assert!(matches!(history(&store, None).await, Err(AppError::Unauthenticated)));
    }

    #[tokio::test]
    async fn incomplete_submission_stores_nothing() {
        let store = MemoryResultStore::new();
        let raw = [Some("Agree"), Some("Agree"), None, Some("Agree"), Some("Agree")];
        let result = submit(&store, Some(UserId(3)), raw).await;
        assert!(matches!(result, Err(AppError::IncompleteAnswers { .. })));
        assert!(history(&store, Some(UserId(3))).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_appears_first_in_history() {
        let store = MemoryResultStore::new();
        let user = Some(UserId(3));
        store.append_result(UserId(3), Label::Responder).await.unwrap();

        let stored = submit(&store, user, TIE).await.unwrap();
        assert_eq!(stored.label, Label::Follower);

        let entries = history(&store, user).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].label, Label::Follower);
    }

    #[tokio::test]
    async fn summary_counts_repeated_labels_across_users() {
        let store = MemoryResultStore::new();
        for user in 10..13 {
            submit(&store, Some(UserId(user)), TIE).await.unwrap();
        }
        let counts = summary(&store).await.unwrap();
        assert_eq!(counts, BTreeMap::from([(Label::Follower, 3)]));
    }
}
