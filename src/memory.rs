// In-memory storage backend
//
// Implements the user, note and expense stores over plain vectors behind one
// lock. Used when no DATABASE_URL is configured and by the test suite.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::auth::models::{NewUser, Role, User, UserChanges, UserResponse};
use crate::auth::repository::UserStore;
use crate::error::StoreError;
use crate::expenses::models::{Expense, NewExpense};
use crate::expenses::repository::ExpenseStore;
use crate::notes::models::Note;
use crate::notes::repository::NoteStore;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    notes: Vec<Note>,
    expenses: Vec<Expense>,
    next_user_id: i32,
    next_note_id: i32,
    next_expense_id: i32,
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Volatile store for users, notes and expenses
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_admin(&self) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.role == Role::Admin).cloned())
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::UniqueViolation("username"));
        }

        let user = User {
            id: next_id(&mut tables.next_user_id),
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            active: user.active,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn update_by_id(
        &self,
        id: i32,
        changes: UserChanges,
    ) -> Result<Option<UserResponse>, StoreError> {
        let mut tables = self.tables.write().await;

        if let Some(username) = &changes.username {
            if tables.users.iter().any(|u| u.id != id && &u.username == username) {
                return Err(StoreError::UniqueViolation("username"));
            }
        }

        let Some(user) = tables.users.iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            user.username = username;
        }
        if let Some(password_hash) = changes.password_hash {
            user.password_hash = password_hash;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(active) = changes.active {
            user.active = active;
        }

        Ok(Some(UserResponse::from(user.clone())))
    }

    async fn list_all(&self) -> Result<Vec<UserResponse>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().cloned().map(UserResponse::from).collect())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<Note>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .notes
            .iter()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn insert(&self, user_id: i32, title: &str, note: &str) -> Result<Note, StoreError> {
        let mut tables = self.tables.write().await;
        let note = Note {
            id: next_id(&mut tables.next_note_id),
            user_id,
            title: title.to_string(),
            note: note.to_string(),
            created_at: Utc::now(),
        };
        tables.notes.push(note.clone());
        Ok(note)
    }
}

#[async_trait]
impl ExpenseStore for MemoryStore {
    async fn list_for_user(&self, user_id: i32) -> Result<Vec<Expense>, StoreError> {
        let tables = self.tables.read().await;
        let mut expenses: Vec<Expense> = tables
            .expenses
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| (e.date, e.id));
        Ok(expenses)
    }

    async fn insert(&self, expense: NewExpense) -> Result<Expense, StoreError> {
        let mut tables = self.tables.write().await;
        let expense = Expense {
            id: next_id(&mut tables.next_expense_id),
            user_id: expense.user_id,
            category: expense.category,
            amount: expense.amount,
            date: expense.date,
            note: expense.note,
            person: expense.person,
            account: expense.account,
            created_at: Utc::now(),
        };
        tables.expenses.push(expense.clone());
        Ok(expense)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> NewUser {
        NewUser::member(name.to_string(), "hash".to_string())
    }

    #[tokio::test]
    async fn test_usernames_are_unique() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("alice")).await.unwrap();

        let duplicate = UserStore::insert(&store, new_user("alice")).await;
        assert!(matches!(duplicate, Err(StoreError::UniqueViolation("username"))));
    }

    #[tokio::test]
    async fn test_update_missing_user_is_none() {
        let store = MemoryStore::new();
        let result = store.update_by_id(404, UserChanges::default()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_rename_to_taken_name_conflicts() {
        let store = MemoryStore::new();
        UserStore::insert(&store, new_user("alice")).await.unwrap();
        let bob = UserStore::insert(&store, new_user("bob")).await.unwrap();

        let changes = UserChanges {
            username: Some("alice".to_string()),
            ..Default::default()
        };
        let result = store.update_by_id(bob.id, changes).await;
        assert!(matches!(result, Err(StoreError::UniqueViolation("username"))));

        // Renaming to one's own name is fine
        let same = UserChanges {
            username: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(store.update_by_id(bob.id, same).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let store = MemoryStore::new();
        let alice = UserStore::insert(&store, new_user("alice")).await.unwrap();

        let changes = UserChanges {
            role: Some(Role::Admin),
            ..Default::default()
        };
        let updated = store.update_by_id(alice.id, changes).await.unwrap().unwrap();

        assert_eq!(updated.role, Role::Admin);
        assert_eq!(updated.username, "alice");
        assert!(updated.active);
        let stored = store.find_by_id(alice.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "hash");
    }

    #[tokio::test]
    async fn test_notes_are_scoped_by_owner() {
        let store = MemoryStore::new();
        NoteStore::insert(&store, 1, "mine", "a").await.unwrap();
        NoteStore::insert(&store, 2, "theirs", "b").await.unwrap();
        NoteStore::insert(&store, 1, "mine too", "c").await.unwrap();

        let mine = NoteStore::list_for_user(&store, 1).await.unwrap();
        assert_eq!(mine.len(), 2);
        assert!(mine.iter().all(|n| n.user_id == 1));
        assert!(NoteStore::list_for_user(&store, 3).await.unwrap().is_empty());
    }
}
