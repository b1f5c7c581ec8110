//! Delegate backend binding.

use tracing::{debug, info};

use crate::derive::ConfigDeriver;
use crate::error::{FileIoError, Result};
use crate::io::FileIo;
use crate::properties::Properties;
use crate::registry::BackendRegistry;

/// Property naming the delegate backend.
pub const DELEGATE_FILE_IO_KEY: &str = "io-impl-delegate";

/// Resolves, constructs and initializes the delegate FileIO.
///
/// This is the only place a backend name is resolved; everything after it
/// works against `dyn FileIo`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendBinder;

impl BackendBinder {
    /// Bind the backend named by `io-impl-delegate`.
    ///
    /// The backend is initialized with `properties` plus derived entries
    /// (see [`ConfigDeriver`]).
    ///
    /// # Errors
    ///
    /// * `FileIoError::Config` - `io-impl-delegate` is missing, empty, or names
    ///   no registered backend
    /// * `FileIoError::BackendConstruction` - the factory or the backend's own
    ///   `initialize` failed
    pub fn bind(registry: &BackendRegistry, properties: &Properties) -> Result<Box<dyn FileIo>> {
        let name = Self::delegate_name(properties)?;

        let factory = registry.get(name).ok_or_else(|| {
            FileIoError::Config(format!(
                "Unknown FileIO '{}' in '{}' (registered: {})",
                name,
                DELEGATE_FILE_IO_KEY,
                registry.names().join(", ")
            ))
        })?;

        let mut delegate = factory().map_err(|e| FileIoError::BackendConstruction {
            backend: name.to_string(),
            source: Box::new(e),
        })?;

        let derived = ConfigDeriver::derive(properties);
        debug!(
            "Initializing delegate '{}' with {} properties ({} derived)",
            name,
            derived.len(),
            derived.len() - properties.len()
        );

        delegate
            .initialize(derived)
            .map_err(|e| FileIoError::BackendConstruction {
                backend: name.to_string(),
                source: Box::new(e),
            })?;

        info!("Bound delegate FileIO '{}' ({})", name, delegate.name());
        Ok(delegate)
    }

    /// Read the mandatory delegate name.
    pub fn delegate_name(properties: &Properties) -> Result<&str> {
        match properties.get(DELEGATE_FILE_IO_KEY).map(str::trim) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(FileIoError::Config(format!(
                "Delegate FileIO name must be specified in property '{}'",
                DELEGATE_FILE_IO_KEY
            ))),
        }
    }
}
