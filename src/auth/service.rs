// Authentication service - business logic layer

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::auth::{
    models::{CredentialsRequest, Identity, NewUser, Role},
    password::PasswordService,
    repository::UserStore,
    token::{TokenError, TokenService},
};
use crate::error::ApiError;

/// Username given to the seeded administrator
pub const ADMIN_USERNAME: &str = "admin";

/// Authentication service coordinating the credential store, hasher and tokens
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserStore>,
    passwords: PasswordService,
    tokens: TokenService,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(users: Arc<dyn UserStore>, passwords: PasswordService, tokens: TokenService) -> Self {
        Self {
            users,
            passwords,
            tokens,
        }
    }

    /// Fail with 409 when the username is already registered
    ///
    /// This lookup is the only pre-check of a signup. It gives the early answer;
    /// two concurrent signups for the same name are settled by the store's
    /// unique constraint in `signup`.
    pub async fn ensure_username_free(&self, username: &str) -> Result<(), ApiError> {
        if self.users.find_by_username(username).await?.is_some() {
            debug!("Signup rejected, username taken: {}", username);
            return Err(ApiError::username_taken());
        }
        Ok(())
    }

    /// Register a new user and return a token for it
    ///
    /// A duplicate username surfaces as the store's unique violation (409).
    pub async fn signup(&self, request: &CredentialsRequest) -> Result<String, ApiError> {
        let password_hash = self.passwords.hash(&request.password).await?;
        let user = self
            .users
            .insert(NewUser::member(request.username.clone(), password_hash))
            .await?;

        info!("Registered user {} with id {}", user.username, user.id);
        Ok(self.tokens.issue(&user)?)
    }

    /// Check credentials and return a token
    ///
    /// Unknown usernames, wrong passwords and inactive accounts all fail with the
    /// same `AuthenticationFailed`, each after exactly one hash verification.
    pub async fn login(&self, request: &CredentialsRequest) -> Result<String, ApiError> {
        let Some(user) = self.users.find_by_username(&request.username).await? else {
            self.passwords.verify_dummy(&request.password).await?;
            return Err(ApiError::AuthenticationFailed);
        };

        let matches = self.passwords.verify(&request.password, &user.password_hash).await?;
        if !matches || !user.active {
            return Err(ApiError::AuthenticationFailed);
        }

        debug!("User {} logged in", user.id);
        Ok(self.tokens.issue(&user)?)
    }

    /// Hash a password for storage
    pub async fn hash_password(&self, password: &str) -> Result<String, ApiError> {
        Ok(self.passwords.hash(password).await?)
    }

    /// Decode a bearer token into an identity, or `None` when it does not verify
    pub fn identify(&self, token: &str) -> Option<Identity> {
        match self.tokens.verify(token) {
            Ok(claims) => Some(claims.into()),
            Err(TokenError::Expired) => {
                debug!("Ignoring expired token");
                None
            }
            Err(e) => {
                debug!("Ignoring unverifiable token: {}", e);
                None
            }
        }
    }

    /// Create the `admin` account unless some admin already exists
    ///
    /// Returns true when an account was created.
    pub async fn ensure_admin(&self, password: &str) -> Result<bool, ApiError> {
        if let Some(admin) = self.users.find_admin().await? {
            info!("Admin user already exists (id {})", admin.id);
            return Ok(false);
        }

        let password_hash = self.passwords.hash(password).await?;
        let admin = NewUser {
            username: ADMIN_USERNAME.to_string(),
            password_hash,
            role: Role::Admin,
            active: true,
        };

        match self.users.insert(admin).await {
            Ok(user) => {
                info!("Admin user created with id {}", user.id);
                Ok(true)
            }
            Err(e) => {
                warn!("Could not create admin user: {}", e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordConfig;
    use crate::memory::MemoryStore;

    fn test_service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let passwords = PasswordService::new(PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        })
        .unwrap();
        let service = AuthService::new(store.clone(), passwords, TokenService::new("service-secret"));
        (service, store)
    }

    fn credentials(username: &str, password: &str) -> CredentialsRequest {
        CredentialsRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_signup_stores_hash_and_issues_token() {
        let (service, store) = test_service();

        let token = service.signup(&credentials("alice", "password1")).await.unwrap();
        let identity = service.identify(&token).unwrap();
        let stored = store.find_by_username("alice").await.unwrap().unwrap();

        assert_eq!(identity.username, "alice");
        assert_eq!(identity.id, stored.id);
        assert_eq!(stored.role, Role::User);
        assert_ne!(stored.password_hash, "password1");
        assert!(stored.active);
    }

    #[tokio::test]
    async fn test_signup_duplicate_is_conflict() {
        let (service, _) = test_service();
        service.signup(&credentials("alice", "password1")).await.unwrap();

        let result = service.signup(&credentials("alice", "different")).await;
        assert!(matches!(result, Err(ApiError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_username_precheck() {
        let (service, _) = test_service();
        assert!(service.ensure_username_free("alice").await.is_ok());

        service.signup(&credentials("alice", "password1")).await.unwrap();
        let result = service.ensure_username_free("alice").await;
        assert!(matches!(result, Err(ApiError::Conflict { .. })));
    }

    #[tokio::test]
    async fn test_password_is_hashed_as_sent() {
        let (service, _) = test_service();
        service.signup(&credentials("dave", "  secret12  ")).await.unwrap();

        assert!(service.login(&credentials("dave", "  secret12  ")).await.is_ok());
        let trimmed = service.login(&credentials("dave", "secret12")).await;
        assert!(matches!(trimmed, Err(ApiError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (service, _) = test_service();
        service.signup(&credentials("alice", "password1")).await.unwrap();

        let wrong_password = service.login(&credentials("alice", "password2")).await;
        let unknown_user = service.login(&credentials("bob", "password1")).await;

        assert!(matches!(wrong_password, Err(ApiError::AuthenticationFailed)));
        assert!(matches!(unknown_user, Err(ApiError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_inactive_user_cannot_login() {
        let (service, store) = test_service();
        service.signup(&credentials("carol", "password1")).await.unwrap();
        let carol = store.find_by_username("carol").await.unwrap().unwrap();
        store
            .update_by_id(
                carol.id,
                crate::auth::models::UserChanges {
                    active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let result = service.login(&credentials("carol", "password1")).await;
        assert!(matches!(result, Err(ApiError::AuthenticationFailed)));
    }

    #[tokio::test]
    async fn test_ensure_admin_is_idempotent() {
        let (service, store) = test_service();

        assert!(service.ensure_admin("adminpass").await.unwrap());
        assert!(!service.ensure_admin("adminpass").await.unwrap());

        let admin = store.find_by_username(ADMIN_USERNAME).await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);

        let token = service.login(&credentials("admin", "adminpass")).await.unwrap();
        assert_eq!(service.identify(&token).unwrap().id, admin.id);
    }

    #[test]
    fn test_identify_rejects_garbage() {
        let (service, _) = test_service();
        assert!(service.identify("garbage").is_none());
    }
}
