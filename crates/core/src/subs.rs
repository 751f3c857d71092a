use crate::config::Settings;
use anyhow::Context;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tokio::sync::Mutex;

const DEFAULT_PATH: &str = "subscribed_chats.json";

/// Persisted set of chat ids subscribed to periodic updates.
///
/// The whole set is rewritten on every change. The file is tiny and changes
/// are rare, so a full rewrite keeps the on-disk state trivially consistent.
/// Access goes through the internal mutex; the periodic job and command
/// handlers share one store.
#[derive(Debug)]
pub struct SubscriberStore {
    path: PathBuf,
    chats: Mutex<BTreeSet<i64>>,
}

impl SubscriberStore {
    pub fn from_settings(settings: &Settings) -> Self {
        let path = settings
            .subscriptions_path
            .clone()
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        Self::load(path)
    }

    /// A missing or corrupt file is not fatal: the bot starts with an empty
    /// set and overwrites the file on the next change.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let chats: BTreeSet<i64> = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Vec<i64>>(&raw) {
                Ok(ids) => ids.into_iter().collect(),
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "subscription file is not valid JSON; starting empty");
                    BTreeSet::new()
                }
            },
            Err(_) => BTreeSet::new(),
        };

        tracing::info!(path = %path.display(), count = chats.len(), "subscriptions loaded");
        Self {
            path,
            chats: Mutex::new(chats),
        }
    }

    /// Flip the subscription state for a chat. Returns true when the chat
    /// ended up subscribed.
    pub async fn toggle(&self, chat_id: i64) -> anyhow::Result<bool> {
        let mut chats = self.chats.lock().await;
        let subscribed = if chats.remove(&chat_id) {
            false
        } else {
            chats.insert(chat_id);
            true
        };
        self.save(&chats)?;
        Ok(subscribed)
    }

    /// Returns true when the chat was present.
    pub async fn remove(&self, chat_id: i64) -> anyhow::Result<bool> {
        let mut chats = self.chats.lock().await;
        let removed = chats.remove(&chat_id);
        if removed {
            self.save(&chats)?;
        }
        Ok(removed)
    }

    pub async fn contains(&self, chat_id: i64) -> bool {
        self.chats.lock().await.contains(&chat_id)
    }

    pub async fn snapshot(&self) -> Vec<i64> {
        self.chats.lock().await.iter().copied().collect()
    }

    fn save(&self, chats: &BTreeSet<i64>) -> anyhow::Result<()> {
        let ids: Vec<i64> = chats.iter().copied().collect();
        let raw = serde_json::to_string(&ids).context("serialize subscriptions failed")?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("write {} failed", self.path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn toggle_subscribes_then_unsubscribes() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(dir.path().join("subs.json"));

        assert!(store.toggle(42).await.unwrap());
        assert!(store.contains(42).await);

        assert!(!store.toggle(42).await.unwrap());
        assert!(!store.contains(42).await);
    }

    #[tokio::test]
    async fn state_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");

        {
            let store = SubscriberStore::load(&path);
            store.toggle(1).await.unwrap();
            store.toggle(7).await.unwrap();
            store.toggle(3).await.unwrap();
            store.toggle(7).await.unwrap();
        }

        let reloaded = SubscriberStore::load(&path);
        assert_eq!(reloaded.snapshot().await, vec![1, 3]);
    }

    #[tokio::test]
    async fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("subs.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = SubscriberStore::load(&path);
        assert!(store.snapshot().await.is_empty());

        // The next change overwrites the corrupt file.
        store.toggle(9).await.unwrap();
        let reloaded = SubscriberStore::load(&path);
        assert_eq!(reloaded.snapshot().await, vec![9]);
    }

    #[tokio::test]
    async fn remove_reports_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = SubscriberStore::load(dir.path().join("subs.json"));

        store.toggle(5).await.unwrap();
        assert!(store.remove(5).await.unwrap());
        assert!(!store.remove(5).await.unwrap());
    }
}
