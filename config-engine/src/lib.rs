//! Configuration management for Carebook Engine
//!
//! Settings are layered, each source overriding the previous one:
//!
//! 1. Built-in defaults (`ServiceConfig::default()`)
//! 2. An optional YAML file (`carebook.yaml` by default)
//! 3. `CAREBOOK__SECTION__KEY` environment variables (after reading `.env`)
//! 4. The conventional `DATABASE_URL` and `JWT_SECRET` variables
//!
//! # Example
//!
//! ```rust,no_run
//! use config_engine::ConfigLoader;
//!
//! let config = ConfigLoader::new().with_file("carebook.yaml").load()?;
//! println!("listening on {}:{}", config.server.host, config.server.port);
//! # Ok::<(), config_engine::ConfigError>(())
//! ```

pub mod error;
pub mod loader;
pub mod settings;

pub use error::*;
pub use loader::*;
pub use settings::*;
