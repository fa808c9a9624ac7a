use crate::{config::*, error::*, models::*, repository::*, tokens::*};
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
use chrono::Utc;
use error_common::FieldErrors;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct IdentityService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenService,
    config: IdentityConfig,
    argon2: Argon2<'static>,
}

impl IdentityService {
    /// # Errors
    ///
    /// Returns [`IdentityError::Configuration`] for unusable Argon2 parameters.
    pub fn new(user_repo: Arc<dyn UserRepository>, config: IdentityConfig) -> Result<Self> {
        let params = Params::new(config.hash_memory_kib, config.hash_iterations, 1, None)
            .map_err(|e| IdentityError::Configuration(e.to_string()))?;

        Ok(Self {
            user_repo,
            tokens: TokenService::new(&config),
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            config,
        })
    }

    pub fn users(&self) -> Arc<dyn UserRepository> {
        Arc::clone(&self.user_repo)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse> {
        let mut errors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if request.password.chars().count() < self.config.password_min_length {
            errors.add(
                "password",
                format!(
                    "Password must be at least {} characters",
                    self.config.password_min_length
                ),
            );
        }
        errors.into_result().map_err(IdentityError::Validation)?;

        let email = request.email.trim().to_lowercase();
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(IdentityError::EmailAlreadyInUse);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: request.name.trim().to_string(),
            email,
            password_hash: self.hash_password(&request.password)?,
            role: request.role.unwrap_or(Role::Employee),
            specialization: request.specialization,
            created_at: now,
            updated_at: now,
        };

        let user = self.user_repo.create_user(&user).await?;
        info!(user_id = %user.id, role = %user.role, "User registered");
        self.respond(&user)
    }

    pub async fn authenticate(&self, request: LoginRequest) -> Result<AuthResponse> {
        request.validate()?;

        let Some(user) = self.user_repo.find_by_email(request.email.trim()).await? else {
            warn!(
                email = %logger_redacted::redact(&request.email),
                "Login attempt for unknown account"
            );
            return Err(IdentityError::InvalidCredentials);
        };

        self.verify_password(&request.password, &user.password_hash)?;
        info!(user_id = %user.id, "User logged in");
        self.respond(&user)
    }

    /// Resolve a bearer token to the stored account
    pub async fn resolve_token(&self, token: &str) -> Result<User> {
        let claims = self.tokens.verify(token)?;
        self.user_repo
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| IdentityError::InvalidToken("user no longer exists".to_string()))
    }

    pub async fn profile(&self, user_id: Uuid) -> Result<UserSummary> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .map(|user| UserSummary::from(&user))
            .ok_or(IdentityError::UserNotFound)
    }

    /// Rename the account or change its specialization; a blank
    /// specialization clears it
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserSummary> {
        let mut errors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        let name = request.name.as_deref().map(str::trim);
        if name == Some("") && errors.get("name").is_none() {
            errors.add("name", "Name cannot be empty");
        }
        errors.into_result().map_err(IdentityError::Validation)?;

        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;
        if let Some(name) = name {
            user.name = name.to_string();
        }
        if let Some(specialization) = request.specialization {
            let specialization = specialization.trim();
            user.specialization =
                (!specialization.is_empty()).then(|| specialization.to_string());
        }
        user.updated_at = Utc::now();

        let user = self.user_repo.update_user(&user).await?;
        info!(user_id = %user.id, "Profile updated");
        Ok(UserSummary::from(&user))
    }

    /// Replace the password after checking the current one
    pub async fn change_password(
        &self,
        user_id: Uuid,
        request: ChangePasswordRequest,
    ) -> Result<()> {
        let mut errors = match request.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => FieldErrors::from(e),
        };
        if request.new_password.chars().count() < self.config.password_min_length {
            errors.add(
                "newPassword",
                format!(
                    "Password must be at least {} characters",
                    self.config.password_min_length
                ),
            );
        }
        errors.into_result().map_err(IdentityError::Validation)?;

        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(IdentityError::UserNotFound)?;
        match self.verify_password(&request.current_password, &user.password_hash) {
            Ok(()) => {}
            Err(IdentityError::InvalidCredentials) => {
                warn!(user_id = %user.id, "Password change with wrong current password");
                return Err(IdentityError::Validation(FieldErrors::single(
                    "currentPassword",
                    "Current password is incorrect",
                )));
            }
            Err(e) => return Err(e),
        }

        user.password_hash = self.hash_password(&request.new_password)?;
        user.updated_at = Utc::now();
        self.user_repo.update_user(&user).await?;
        info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    fn respond(&self, user: &User) -> Result<AuthResponse> {
        let issued = self.tokens.issue(user)?;
        Ok(AuthResponse {
            user: UserSummary::from(user),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|_| IdentityError::HashingError)?
            .to_string();
        Ok(password_hash)
    }

    fn verify_password(&self, password: &str, hash: &str) -> Result<()> {
        let parsed_hash = PasswordHash::new(hash).map_err(|_| IdentityError::HashingError)?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| IdentityError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn service() -> IdentityService {
        let config = IdentityConfig {
            jwt_secret: SecretString::new("test-secret".to_string()),
            jwt_expiration_hours: 1,
            issuer: "carebook".to_string(),
            password_min_length: 6,
            hash_memory_kib: 1024,
            hash_iterations: 1,
        };
        IdentityService::new(Arc::new(InMemoryUserRepository::new()), config).unwrap()
    }

    fn register_request(email: &str, role: Option<Role>) -> RegisterRequest {
        RegisterRequest {
            name: "Meredith Grey".to_string(),
            email: email.to_string(),
            password: "hunter22".to_string(),
            role,
            specialization: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_and_resolve() {
        let service = service();
        let registered = service
            .register(register_request("Grey@Example.org", Some(Role::Doctor)))
            .await
            .unwrap();
        assert_eq!(registered.user.email, "grey@example.org");
        assert_eq!(registered.user.role, Role::Doctor);

        let login = service
            .authenticate(LoginRequest {
                email: "grey@example.org".to_string(),
                password: "hunter22".to_string(),
            })
            .await
            .unwrap();

        let user = service.resolve_token(&login.token).await.unwrap();
        assert_eq!(user.id, registered.user.id);
    }

    #[tokio::test]
    async fn role_defaults_to_employee() {
        let response = service().register(register_request("e@example.org", None)).await.unwrap();
        assert_eq!(response.user.role, Role::Employee);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let service = service();
        service.register(register_request("x@example.org", None)).await.unwrap();

        let result = service
            .authenticate(LoginRequest {
                email: "x@example.org".to_string(),
                password: "wrong-password".to_string(),
            })
            .await;
        assert!(matches!(result, Err(IdentityError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn short_password_and_bad_email_are_field_errors() {
        let mut request = register_request("not-an-email", None);
        request.password = "abc".to_string();

        match service().register(request).await {
            Err(IdentityError::Validation(errors)) => {
                assert!(errors.get("email").is_some());
                assert!(errors.get("password").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let service = service();
        service.register(register_request("dup@example.org", None)).await.unwrap();
        let result = service.register(register_request("DUP@example.org", None)).await;
        assert!(matches!(result, Err(IdentityError::EmailAlreadyInUse)));
    }

    #[tokio::test]
    async fn profile_update_trims_and_clears() {
        let service = service();
        let mut request = register_request("doc@example.org", Some(Role::Doctor));
        request.specialization = Some("cardiology".to_string());
        let registered = service.register(request).await.unwrap();

        let renamed = service
            .update_profile(
                registered.user.id,
                UpdateProfileRequest {
                    name: Some("  Meredith Shepherd ".to_string()),
                    specialization: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Meredith Shepherd");
        assert_eq!(renamed.specialization.as_deref(), Some("cardiology"));

        let cleared = service
            .update_profile(
                registered.user.id,
                UpdateProfileRequest {
                    name: None,
                    specialization: Some(" ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.name, "Meredith Shepherd");
        assert_eq!(cleared.specialization, None);

        let blank = service
            .update_profile(
                registered.user.id,
                UpdateProfileRequest {
                    name: Some("   ".to_string()),
                    specialization: None,
                },
            )
            .await;
        match blank {
            Err(IdentityError::Validation(errors)) => assert!(errors.get("name").is_some()),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn changed_password_replaces_the_old_one() {
        let service = service();
        let registered = service.register(register_request("pw@example.org", None)).await.unwrap();

        service
            .change_password(
                registered.user.id,
                ChangePasswordRequest {
                    current_password: "hunter22".to_string(),
                    new_password: "correct-horse".to_string(),
                },
            )
            .await
            .unwrap();

        let old = service
            .authenticate(LoginRequest {
                email: "pw@example.org".to_string(),
                password: "hunter22".to_string(),
            })
            .await;
        assert!(matches!(old, Err(IdentityError::InvalidCredentials)));

        let new = service
            .authenticate(LoginRequest {
                email: "pw@example.org".to_string(),
                password: "correct-horse".to_string(),
            })
            .await;
        assert!(new.is_ok());
    }

    #[tokio::test]
    async fn password_change_checks_current_and_length() {
        let service = service();
        let registered = service.register(register_request("chk@example.org", None)).await.unwrap();

        let wrong = service
            .change_password(
                registered.user.id,
                ChangePasswordRequest {
                    current_password: "not-it".to_string(),
                    new_password: "long-enough".to_string(),
                },
            )
            .await;
        match wrong {
            Err(IdentityError::Validation(errors)) => {
                assert_eq!(
                    errors.first_message(),
                    Some("Current password is incorrect")
                );
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        let short = service
            .change_password(
                registered.user.id,
                ChangePasswordRequest {
                    current_password: "hunter22".to_string(),
                    new_password: "abc".to_string(),
                },
            )
            .await;
        match short {
            Err(IdentityError::Validation(errors)) => {
                assert!(errors.get("newPassword").is_some());
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }
}
