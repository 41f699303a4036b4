//! Rule bundle loading for Regent
//!
//! A bundle is a read-only file tree holding rule modules (`*.rego` by
//! default, arbitrarily nested) and exactly one configuration document at a
//! well-known relative path (`data.json` by default).
//!
//! Bundles are explicit handles implementing [`Bundle`], so tests and hosts
//! can supply their own file trees instead of relying on process-wide state.
//!
//! # Quick Start
//!
//! ```no_run
//! use regent_core::Cancellation;
//! use regent_repository::{BundleConfig, BundleLoader};
//!
//! #[tokio::main]
//! async fn main() -> regent_core::Result<()> {
//!     let loader = BundleLoader::from_config(&BundleConfig::file_system("policies"))?;
//!     let bundle = loader.load_all(&Cancellation::new()).await?;
//!
//!     println!("Loaded {} modules", bundle.modules.len());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────┐
//! │        BundleLoader                    │
//! │  - enumerate rule modules              │
//! │  - parse configuration document        │
//! └──────────────┬─────────────────────────┘
//!                │ Bundle trait
//!       ┌────────┴────────┐
//!       ↓                 ↓
//! ┌──────────────┐  ┌──────────────────┐
//! │ FileSystem   │  │  Memory          │
//! │ Bundle       │  │  Bundle          │
//! └──────────────┘  └──────────────────┘
//! ```

pub mod bundle;
pub mod config;
pub mod error;
pub mod file_system;
pub mod loader;
pub mod memory;

// Re-exports - Configuration
pub use config::{BundleConfig, BundleSource, ConfigError};

// Re-exports - Bundles
pub use bundle::Bundle;
pub use file_system::FileSystemBundle;
pub use memory::MemoryBundle;

// Re-exports - Loader
pub use loader::{BundleLayout, BundleLoader, LoadedBundle};
