//! Typed configuration for Fratily applications.
//!
//! Configuration is layered: built-in defaults (or a preset), then TOML
//! or JSON files, then a `.env` file, then process environment variables.
//! Each layer only needs the keys it changes. Unknown keys are an error
//! at every layer.
//!
//! # Example
//!
//! ```no_run
//! use fratily_config::ConfigLoader;
//!
//! # fn main() -> Result<(), fratily_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_production()
//!     .with_optional_file("fratily.toml")?
//!     .with_dotenv()
//!     .load()?;
//!
//! println!("listening on {}", config.server.http_addr);
//! # Ok(())
//! # }
//! ```
//!
//! # File format
//!
//! ```toml
//! [app]
//! name = "shop"
//! debug = false
//!
//! [server]
//! http_addr = "0.0.0.0:8080"
//! request_timeout_secs = 10
//! timeout_status = 503
//!
//! [sender]
//! chunk_size = 8192
//!
//! [routing]
//! not_found_mode = "fault"
//!
//! [logging]
//! level = "info,fratily=debug"
//! format = "json"
//! ```
//!
//! # Environment variables
//!
//! Variables are `PREFIX__SECTION__KEY`, with `FRATILY` as the default
//! prefix:
//!
//! - `FRATILY__SERVER__HTTP_ADDR=0.0.0.0:9000`
//! - `FRATILY__APP__DEBUG=true`
//! - `FRATILY__SENDER__CHUNK_SIZE=4096`

#![warn(missing_docs)]

mod config;
mod error;
mod loader;
mod schema;
mod view;

pub use config::FratilyConfig;
pub use error::ConfigError;
pub use loader::{ConfigLoader, DEFAULT_ENV_PREFIX, ENV_SEPARATOR};
pub use schema::{
    AppSection, LogFormat, LoggingSection, NotFoundPolicy, RoutingSection, SenderSection,
    ServerSection,
};
pub use view::ConfigView;
