use config::{Config, Environment as EnvSource, File, FileFormat};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;
use crate::settings::ServiceConfig;

pub const ENV_PREFIX: &str = "CAREBOOK";

/// Builds a [`ServiceConfig`] from built-in defaults, an optional YAML file and
/// the environment, in increasing order of precedence.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<String>,
    load_dotenv: bool,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            file: None,
            load_dotenv: true,
        }
    }

    /// YAML file to layer over the defaults; skipped if it does not exist
    pub fn with_file(mut self, path: impl Into<String>) -> Self {
        self.file = Some(path.into());
        self
    }

    pub fn without_dotenv(mut self) -> Self {
        self.load_dotenv = false;
        self
    }

    /// Load and validate.
    ///
    /// `CAREBOOK__SECTION__KEY` variables override file values. The bare
    /// `DATABASE_URL` and `JWT_SECRET` variables override everything else.
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be parsed or the result does not validate.
    pub fn load(self) -> Result<ServiceConfig> {
        if self.load_dotenv {
            match dotenvy::dotenv() {
                Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
                Err(e) if e.not_found() => {}
                Err(e) => tracing::warn!(error = %e, "Ignoring unreadable .env file"),
            }
        }

        let mut builder = Config::builder();

        if let Some(path) = &self.file {
            if Path::new(path).exists() {
                info!(path = %path, "Loading configuration file");
            }
            builder = builder.add_source(File::new(path, FileFormat::Yaml).required(false));
        }

        let config = builder
            .add_source(
                EnvSource::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", std::env::var("JWT_SECRET").ok())?
            .build()?;

        let settings: ServiceConfig = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }
}

/// Parse configuration from a YAML string without touching the environment
///
/// # Errors
///
/// Fails when the YAML cannot be parsed or the result does not validate.
pub fn from_yaml_str(yaml: &str) -> Result<ServiceConfig> {
    let settings: ServiceConfig = Config::builder()
        .add_source(File::from_str(yaml, FileFormat::Yaml))
        .build()?
        .try_deserialize()?;
    settings.validate()?;
    Ok(settings)
}
