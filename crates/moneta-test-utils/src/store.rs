use async_trait::async_trait;
use moneta_core::store::{ChatStore, StoreError};
use moneta_core::types::{Message, Role};
use parking_lot::Mutex;
use std::collections::HashMap;

/// In-memory chat store for engine tests.
#[derive(Default)]
pub struct MemoryChatStore {
    messages: Mutex<Vec<Message>>,
    meta: Mutex<HashMap<String, String>>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ChatStore for MemoryChatStore {
    async fn append_message(&self, role: Role, content: &str) -> Result<Message, StoreError> {
        let message = Message::now(role, content);
        self.messages.lock().push(message.clone());
        Ok(message)
    }

    async fn list_messages(&self) -> Result<Vec<Message>, StoreError> {
        Ok(self.messages.lock().clone())
    }

    async fn set_meta(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.meta.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_meta(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.meta.lock().get(key).cloned())
    }

    async fn clear_all(&self) -> Result<(), StoreError> {
        self.messages.lock().clear();
        self.meta.lock().clear();
        Ok(())
    }
}
