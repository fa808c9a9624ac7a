use config_engine::AuthSettings;
use secrecy::SecretString;

#[derive(Debug, Clone)]
pub struct IdentityConfig {
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub issuer: String,
    pub password_min_length: usize,
    pub hash_memory_kib: u32,
    pub hash_iterations: u32,
}

impl From<&AuthSettings> for IdentityConfig {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            jwt_secret: settings.jwt_secret.clone(),
            jwt_expiration_hours: settings.token_ttl_hours,
            issuer: settings.issuer.clone(),
            password_min_length: settings.password_min_length,
            hash_memory_kib: settings.password_hash_memory_kib,
            hash_iterations: settings.password_hash_iterations,
        }
    }
}
