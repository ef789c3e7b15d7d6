use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CredentialStore, TaskStore};
use crate::error::AppError;
use crate::models::{NewUser, Page, Task, UserRecord};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<Vec<UserRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<UserRecord>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.username == username || user.email == email)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<UserRecord, AppError> {
        // Check and insert under one write lock.
        let mut users = self.users.write().await;
        if users
            .iter()
            .any(|existing| existing.username == user.username || existing.email == user.email)
        {
            return Err(AppError::DuplicateUser);
        }
        let record = UserRecord::new(user);
        users.push(record.clone());
        Ok(record)
    }
}

#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    tasks: RwLock<HashMap<Uuid, Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn create(&self, task: Task) -> Result<Task, AppError> {
        self.tasks.write().await.insert(task.id, task.clone());
        Ok(task)
    }

    async fn list(
        &self,
        user_id: Uuid,
        page: Page,
        search: Option<&str>,
    ) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        let mut owned: Vec<&Task> = tasks
            .values()
            .filter(|task| task.user_id == user_id)
            .filter(|task| search.map_or(true, |term| task.matches(term)))
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(owned
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .cloned()
            .collect())
    }

    async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        Ok(self
            .tasks
            .read()
            .await
            .get(&id)
            .filter(|task| task.user_id == user_id)
            .cloned())
    }

    async fn update(&self, user_id: Uuid, id: Uuid, text: &str) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks
            .get_mut(&id)
            .filter(|task| task.user_id == user_id)
            .map(|task| {
                task.task = text.to_string();
                task.updated_at = Utc::now();
                task.clone()
            }))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        match tasks.get(&id) {
            Some(task) if task.user_id == user_id => {
                tasks.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskInput;
    use std::sync::Arc;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
        }
    }

    #[actix_rt::test]
    async fn test_insert_and_lookup() {
        let store = MemoryCredentialStore::new();
        let alice = store.insert(new_user("alice", "a@x.com")).await.unwrap();

        let found = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(found.id, alice.id);
        assert!(store.find_by_username("bob").await.unwrap().is_none());

        let by_email = store
            .find_by_username_or_email("someone-else", "a@x.com")
            .await
            .unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(alice.id));
    }

    #[actix_rt::test]
    async fn test_duplicate_username_or_email_is_rejected() {
        let store = MemoryCredentialStore::new();
        store.insert(new_user("alice", "a@x.com")).await.unwrap();

        assert!(matches!(
            store.insert(new_user("alice", "other@x.com")).await,
            Err(AppError::DuplicateUser)
        ));
        assert!(matches!(
            store.insert(new_user("alice2", "a@x.com")).await,
            Err(AppError::DuplicateUser)
        ));
        assert_eq!(store.len().await, 1);
    }

    #[actix_rt::test]
    async fn test_concurrent_duplicate_registrations_yield_one_record() {
        let store = Arc::new(MemoryCredentialStore::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert(new_user("alice", "a@x.com")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.len().await, 1);
    }

    fn task(owner: Uuid, text: &str) -> Task {
        Task::new(TaskInput { task: text.into() }, owner)
    }

    #[actix_rt::test]
    async fn test_tasks_are_scoped_to_owner() {
        let store = MemoryTaskStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        let created = store.create(task(alice, "alice's task")).await.unwrap();

        assert!(store.get(alice, created.id).await.unwrap().is_some());
        assert!(store.get(bob, created.id).await.unwrap().is_none());
        assert!(store.update(bob, created.id, "hijack").await.unwrap().is_none());
        assert!(!store.delete(bob, created.id).await.unwrap());

        let updated = store.update(alice, created.id, "renamed").await.unwrap().unwrap();
        assert_eq!(updated.task, "renamed");
        assert!(updated.updated_at >= updated.created_at);

        assert!(store.delete(alice, created.id).await.unwrap());
        assert!(store.get(alice, created.id).await.unwrap().is_none());
    }

    #[actix_rt::test]
    async fn test_list_paginates_and_searches() {
        let store = MemoryTaskStore::new();
        let owner = Uuid::new_v4();
        for i in 0..5 {
            store.create(task(owner, &format!("chore {}", i))).await.unwrap();
        }
        store.create(task(owner, "Buy milk")).await.unwrap();
        store.create(task(Uuid::new_v4(), "not mine")).await.unwrap();

        let all = store
            .list(owner, Page { offset: 0, limit: 100 }, None)
            .await
            .unwrap();
        assert_eq!(all.len(), 6);
        assert!(all.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        let second_page = store
            .list(owner, Page { offset: 4, limit: 4 }, None)
            .await
            .unwrap();
        assert_eq!(second_page.len(), 2);

        let found = store
            .list(owner, Page { offset: 0, limit: 10 }, Some("MILK"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].task, "Buy milk");
    }
}
