//! Protocol-switching FileIO.
//!
//! Table metadata written on one platform is full of absolute locations
//! (`s3://...`, `gs://...`) that do not resolve on another. This crate
//! provides a [`FileIo`] adapter that rewrites those logical locations to
//! physical ones with ordered regex rules, hands the physical location to a
//! delegate backend, and wraps the returned handles so callers keep seeing the
//! location they asked for.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │  Caller (logical locations)                          │
//! │                      │                               │
//! │                      ▼                               │
//! │            ┌───────────────────┐                     │
//! │            │  SwitchingFileIo  │                     │
//! │            └─────────┬─────────┘                     │
//! │          ┌───────────┼───────────────┐               │
//! │          ▼           ▼               ▼               │
//! │  ┌──────────────┐ ┌───────────┐ ┌──────────────────┐ │
//! │  │LocationRewri-│ │ delegate  │ │ Switched*File    │ │
//! │  │ter (RuleSet) │ │ dyn FileIo│ │ (logical ident.) │ │
//! │  └──────────────┘ └─────▲─────┘ └──────────────────┘ │
//! │                         │                            │
//! │   BackendBinder ── BackendRegistry + ConfigDeriver   │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! # Configuration
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `io-impl-delegate` | Registered name of the delegate backend (required) |
//! | `protocol.mapping.<regex>` | Rewrite rule; value is the replacement template |
//! | `adls.sas-token.<account>` | SAS token; also exposed under the blob endpoint key |
//!
//! Every other key is passed to the delegate unchanged.
//!
//! # Quick Start
//!
//! ```
//! use locswitch::{FileIo, MemoryStore, BackendRegistry, Properties, SwitchingFileIo};
//! use tokio::io::AsyncWriteExt;
//!
//! # async fn example() -> locswitch::Result<()> {
//! let store = MemoryStore::new();
//! let mut registry = BackendRegistry::new();
//! registry.register_memory_store("memory", store.clone());
//!
//! let mut io = SwitchingFileIo::with_registry(registry);
//! io.initialize(
//!     Properties::new()
//!         .with("io-impl-delegate", "memory")
//!         .with("protocol.mapping.^s3://", "mem://"),
//! )?;
//!
//! let output = io.new_output_file("s3://bucket/data.parquet")?;
//! let mut stream = output.create().await?;
//! stream.write_all(b"rows").await?;
//! stream.shutdown().await?;
//!
//! assert_eq!(output.location(), "s3://bucket/data.parquet");
//! assert!(store.contains("mem://bucket/data.parquet"));
//! # Ok(())
//! # }
//! ```

pub mod binder;
pub mod derive;
pub mod error;
pub mod handle;
pub mod io;
pub mod memory;
pub mod properties;
pub mod registry;
pub mod rewrite;
pub mod switching;

pub use binder::{BackendBinder, DELEGATE_FILE_IO_KEY};
pub use derive::{ConfigDeriver, BLOB_ENDPOINT_SUFFIX, DFS_ENDPOINT_SUFFIX, SAS_TOKEN_PREFIX};
pub use error::{BoxError, FileIoError, Result};
pub use handle::{SwitchedInputFile, SwitchedOutputFile};
pub use io::{
    FileIo, InputFile, InputStream, ManifestFile, OutputFile, OutputStream, PositionWrite,
    SeekableRead,
};
pub use memory::{MemoryFileIo, MemoryStore};
pub use properties::Properties;
pub use registry::{BackendRegistry, FileIoFactory, MEMORY_BACKEND};
pub use rewrite::{LocationRewriter, RewriteRule, RuleSet, PROTOCOL_MAPPING_PREFIX};
pub use switching::SwitchingFileIo;

// Re-export commonly used types
pub use bytes::Bytes;
