use crate::{error::*, models::*};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; the email must not be taken
    async fn create_user(&self, user: &User) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Batch lookup for view stitching; unknown ids are skipped
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>>;
    /// Overwrite name, specialization, hash and `updated_at` of an existing account
    async fn update_user(&self, user: &User) -> Result<User>;
}

/// In-memory implementation for development/testing
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create_user(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        if users.values().any(|existing| existing.email.eq_ignore_ascii_case(&user.email)) {
            return Err(IdentityError::EmailAlreadyInUse);
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn update_user(&self, user: &User) -> Result<User> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&user.id).ok_or(IdentityError::UserNotFound)?;
        stored.name.clone_from(&user.name);
        stored.specialization.clone_from(&user.specialization);
        stored.password_hash.clone_from(&user.password_hash);
        stored.updated_at = user.updated_at;
        Ok(stored.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Someone".to_string(),
            email: email.to_string(),
            password_hash: String::new(),
            role: Role::Employee,
            specialization: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected_case_insensitively() {
        let repo = InMemoryUserRepository::new();
        repo.create_user(&user("a@example.org")).await.unwrap();

        let result = repo.create_user(&user("A@Example.org")).await;
        assert!(matches!(result, Err(IdentityError::EmailAlreadyInUse)));
    }

    #[tokio::test]
    async fn find_many_skips_unknown_ids() {
        let repo = InMemoryUserRepository::new();
        let stored = repo.create_user(&user("b@example.org")).await.unwrap();

        let found = repo.find_many(&[stored.id, Uuid::new_v4()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found.first().map(|u| u.id), Some(stored.id));
    }

    #[tokio::test]
    async fn update_keeps_email_and_role() {
        let repo = InMemoryUserRepository::new();
        let stored = repo.create_user(&user("c@example.org")).await.unwrap();

        let mut changed = stored.clone();
        changed.name = "Renamed".to_string();
        changed.email = "other@example.org".to_string();
        changed.role = Role::Admin;
        let updated = repo.update_user(&changed).await.unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.email, "c@example.org");
        assert_eq!(updated.role, Role::Employee);

        let missing = repo.update_user(&user("d@example.org")).await;
        assert!(matches!(missing, Err(IdentityError::UserNotFound)));
    }
}
