use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::{NewUser, StoreError, User, UserChanges, UserStore};

/// In-process `UserStore` used by handler tests; enforces the same phone
/// uniqueness as the `users_phone_key` index.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_phone(&self, phone: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.phone == phone).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, StoreError> {
        let users = self.users.lock().unwrap();
        Ok(users
            .iter()
            .rev()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.phone == new.phone) {
            return Err(StoreError::DuplicatePhone);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            phone: new.phone,
            password_hash: new.password_hash,
            role: new.role,
            created_at: OffsetDateTime::now_utc(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, StoreError> {
        let mut users = self.users.lock().unwrap();
        if let Some(phone) = &changes.phone {
            if users.iter().any(|u| u.id != id && &u.phone == phone) {
                return Err(StoreError::DuplicatePhone);
            }
        }
        let Some(user) = users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(phone) = changes.phone {
            user.phone = phone;
        }
        Ok(Some(user.clone()))
    }

    async fn delete_many(&self, ids: &[Uuid]) -> Result<u64, StoreError> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| !ids.contains(&u.id));
        Ok((before - users.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(phone: &str) -> NewUser {
        NewUser {
            name: "A".into(),
            phone: phone.into(),
            password_hash: "$argon2id$placeholder".into(),
            role: "user".into(),
        }
    }

    #[tokio::test]
    async fn duplicate_phone_leaves_first_record_untouched() {
        let store = MemoryUserStore::new();
        let first = store.create(new_user("9999999999")).await.unwrap();

        let mut second = new_user("9999999999");
        second.name = "B".into();
        let err = store.create(second).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePhone));

        let stored = store.find_by_phone("9999999999").await.unwrap().unwrap();
        assert_eq!(stored.id, first.id);
        assert_eq!(stored.name, "A");
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn delete_many_counts_only_existing_ids() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("9000000001")).await.unwrap();
        let b = store.create(new_user("9000000002")).await.unwrap();

        let removed = store
            .delete_many(&[a.id, Uuid::new_v4()])
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.find_by_id(a.id).await.unwrap().is_none());
        assert!(store.find_by_id(b.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn update_rejects_phone_owned_by_another_user() {
        let store = MemoryUserStore::new();
        let a = store.create(new_user("9000000001")).await.unwrap();
        store.create(new_user("9000000002")).await.unwrap();

        let err = store
            .update(
                a.id,
                UserChanges {
                    phone: Some("9000000002".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicatePhone));
    }
}
