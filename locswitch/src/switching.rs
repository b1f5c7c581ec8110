//! Protocol-switching FileIO.
//!
//! `SwitchingFileIo` sits in front of a delegate backend and rewrites every
//! location it is handed before passing it on. Handles coming back from the
//! delegate are wrapped so callers keep seeing the location they asked for.
//!
//! ```text
//! caller ── s3://bucket/key ──▶ SwitchingFileIo
//!                                   │ LocationRewriter
//!                                   ▼
//!                          delegate ◀── mem://bucket/key
//!                                   │
//! caller ◀── Switched*File(location = s3://bucket/key)
//! ```

use async_trait::async_trait;
use std::borrow::Cow;
use tracing::{debug, info, instrument};

use crate::binder::BackendBinder;
use crate::error::{FileIoError, Result};
use crate::handle::{SwitchedInputFile, SwitchedOutputFile};
use crate::io::{FileIo, InputFile, ManifestFile, OutputFile};
use crate::properties::Properties;
use crate::registry::BackendRegistry;
use crate::rewrite::LocationRewriter;

/// Everything fixed by a successful `initialize`.
struct Bound {
    delegate_name: String,
    delegate: Box<dyn FileIo>,
    rewriter: LocationRewriter,
}

/// FileIO that rewrites locations and forwards to a configured delegate.
///
/// # Lifecycle
///
/// The adapter is unusable until [`FileIo::initialize`] succeeds; every
/// operation before that fails with `FileIoError::NotInitialized`. A failed
/// `initialize` leaves it uninitialized and may be retried; a second
/// successful one is rejected with `FileIoError::AlreadyInitialized`.
///
/// # Example
///
/// ```
/// use locswitch::{FileIo, Properties, SwitchingFileIo};
///
/// let props = Properties::new()
///     .with("io-impl-delegate", "memory")
///     .with("protocol.mapping.^s3://", "mem://");
/// let io = SwitchingFileIo::from_properties(props)?;
///
/// let output = io.new_output_file("s3://bucket/key")?;
/// assert_eq!(output.location(), "s3://bucket/key");
/// assert_eq!(io.physical_location("s3://bucket/key")?, "mem://bucket/key");
/// # Ok::<(), locswitch::FileIoError>(())
/// ```
pub struct SwitchingFileIo {
    registry: BackendRegistry,
    bound: Option<Bound>,
}

impl SwitchingFileIo {
    /// Create an uninitialized adapter that resolves delegates from
    /// [`BackendRegistry::with_defaults`].
    pub fn new() -> Self {
        Self::with_registry(BackendRegistry::with_defaults())
    }

    /// Create an uninitialized adapter that resolves delegates from `registry`.
    pub fn with_registry(registry: BackendRegistry) -> Self {
        Self {
            registry,
            bound: None,
        }
    }

    /// Create and initialize an adapter using the default registry.
    pub fn from_properties(properties: Properties) -> Result<Self> {
        let mut io = Self::new();
        io.initialize(properties)?;
        Ok(io)
    }

    /// Whether `initialize` has succeeded.
    pub fn is_initialized(&self) -> bool {
        self.bound.is_some()
    }

    /// Configured delegate name (the `io-impl-delegate` value).
    pub fn delegate_name(&self) -> Option<&str> {
        self.bound.as_ref().map(|b| b.delegate_name.as_str())
    }

    /// Active rewrite rules.
    pub fn rewriter(&self) -> Option<&LocationRewriter> {
        self.bound.as_ref().map(|b| &b.rewriter)
    }

    /// Location the delegate would be handed for `location`.
    pub fn physical_location<'a>(&self, location: &'a str) -> Result<Cow<'a, str>> {
        self.bound()?.rewriter.rewrite(location)
    }

    fn bound(&self) -> Result<&Bound> {
        self.bound.as_ref().ok_or(FileIoError::NotInitialized)
    }
}

impl Default for SwitchingFileIo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileIo for SwitchingFileIo {
    #[instrument(skip(self, properties), fields(properties = properties.len()))]
    fn initialize(&mut self, properties: Properties) -> Result<()> {
        if self.bound.is_some() {
            return Err(FileIoError::AlreadyInitialized);
        }

        let rewriter = LocationRewriter::from_properties(&properties)?;
        if rewriter.is_empty() {
            debug!("No protocol mapping rules configured; locations pass through unchanged");
        }
        let delegate = BackendBinder::bind(&self.registry, &properties)?;
        let delegate_name = BackendBinder::delegate_name(&properties)?.to_string();

        info!(
            "Initialized protocol switching FileIO with delegate '{}' and {} mapping rule(s)",
            delegate_name,
            rewriter.rules().len()
        );

        self.bound = Some(Bound {
            delegate_name,
            delegate,
            rewriter,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    fn new_input_file(&self, location: &str) -> Result<Box<dyn InputFile>> {
        debug!("Creating new InputFile for location: {}", location);
        let bound = self.bound()?;
        let physical = bound.rewriter.rewrite(location)?;
        let inner = bound.delegate.new_input_file(&physical)?;
        Ok(Box::new(SwitchedInputFile::new(inner, location)))
    }

    #[instrument(skip(self))]
    fn new_input_file_with_length(
        &self,
        location: &str,
        length: u64,
    ) -> Result<Box<dyn InputFile>> {
        debug!("Creating new InputFile for location: {} (length {})", location, length);
        let bound = self.bound()?;
        let physical = bound.rewriter.rewrite(location)?;
        let inner = bound.delegate.new_input_file_with_length(&physical, length)?;
        Ok(Box::new(SwitchedInputFile::new(inner, location)))
    }

    #[instrument(skip(self))]
    fn new_output_file(&self, location: &str) -> Result<Box<dyn OutputFile>> {
        debug!("Creating new OutputFile for location: {}", location);
        let bound = self.bound()?;
        let physical = bound.rewriter.rewrite(location)?;
        let inner = bound.delegate.new_output_file(&physical)?;
        Ok(Box::new(SwitchedOutputFile::new(inner, location)))
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, location: &str) -> Result<()> {
        debug!("Deleting file at location: {}", location);
        let bound = self.bound()?;
        let physical = bound.rewriter.rewrite(location)?;
        bound.delegate.delete_file(&physical).await
    }

    #[instrument(skip(self, manifest), fields(path = manifest.path()))]
    fn new_manifest_input_file(&self, manifest: &ManifestFile) -> Result<Box<dyn InputFile>> {
        debug!("Creating new InputFile for manifest path: {}", manifest.path());
        let bound = self.bound()?;
        let physical = bound.rewriter.rewrite(manifest.path())?;
        let inner = bound
            .delegate
            .new_input_file_with_length(&physical, manifest.length())?;
        Ok(Box::new(SwitchedInputFile::new(inner, manifest.path())))
    }

    fn name(&self) -> &'static str {
        "protocol-switching"
    }
}

impl std::fmt::Debug for SwitchingFileIo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchingFileIo")
            .field("registry", &self.registry)
            .field("delegate", &self.delegate_name())
            .field("rules", &self.rewriter().map(|r| r.rules().len()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::DELEGATE_FILE_IO_KEY;
    use crate::memory::MemoryStore;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn adapter(store: &MemoryStore, rules: &[(&str, &str)]) -> SwitchingFileIo {
        let mut registry = BackendRegistry::new();
        registry.register_memory_store("memory", store.clone());

        let mut props = Properties::new().with(DELEGATE_FILE_IO_KEY, "memory");
        for (pattern, replacement) in rules {
            props.insert(format!("protocol.mapping.{}", pattern), *replacement);
        }

        let mut io = SwitchingFileIo::with_registry(registry);
        io.initialize(props).unwrap();
        io
    }

    #[tokio::test]
    async fn test_output_file_rewrites_and_keeps_identity() {
        let store = MemoryStore::new();
        let io = adapter(&store, &[("^s3://", "mem://")]);

        let output = io.new_output_file("s3://bucket/key").unwrap();
        assert_eq!(output.location(), "s3://bucket/key");

        let mut stream = output.create().await.unwrap();
        stream.write_all(b"hello").await.unwrap();
        stream.shutdown().await.unwrap();

        assert_eq!(store.locations(), vec!["mem://bucket/key"]);

        let input = output.to_input_file();
        assert_eq!(input.location(), "s3://bucket/key");
        assert_eq!(input.length().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_input_file_reads_physical_object() {
        let store = MemoryStore::new();
        store.put("mem://bucket/key", "payload");
        let io = adapter(&store, &[("^s3://", "mem://")]);

        let input = io.new_input_file("s3://bucket/key").unwrap();
        assert_eq!(input.location(), "s3://bucket/key");

        let mut buf = String::new();
        input
            .new_stream()
            .await
            .unwrap()
            .read_to_string(&mut buf)
            .await
            .unwrap();
        assert_eq!(buf, "payload");
    }

    #[tokio::test]
    async fn test_manifest_uses_known_length() {
        let store = MemoryStore::new();
        let io = adapter(&store, &[("^s3://", "mem://")]);

        let manifest = ManifestFile::new("s3://bucket/metadata/m0.avro", 1234);
        let input = io.new_manifest_input_file(&manifest).unwrap();

        assert_eq!(input.location(), "s3://bucket/metadata/m0.avro");
        // Not in the store; the length comes from the manifest.
        assert_eq!(input.length().await.unwrap(), 1234);
    }

    #[tokio::test]
    async fn test_delete_rewrites_and_propagates_errors() {
        let store = MemoryStore::new();
        store.put("mem://bucket/key", "x");
        let io = adapter(&store, &[("^s3://", "mem://")]);

        io.delete_file("s3://bucket/key").await.unwrap();
        assert!(store.is_empty());

        let err = io.delete_file("s3://bucket/key").await.unwrap_err();
        assert!(matches!(err, FileIoError::NotFound(ref loc) if loc == "mem://bucket/key"));
    }

    #[test]
    fn test_unmatched_location_passes_through() {
        let store = MemoryStore::new();
        let io = adapter(&store, &[("^s3://", "mem://")]);

        let physical = io.physical_location("file:///tmp/x").unwrap();
        assert!(matches!(physical, Cow::Borrowed("file:///tmp/x")));
    }

    #[tokio::test]
    async fn test_operations_before_initialize_fail() {
        let io = SwitchingFileIo::new();
        assert!(!io.is_initialized());

        assert!(matches!(
            io.new_input_file("s3://a").unwrap_err(),
            FileIoError::NotInitialized
        ));
        assert!(matches!(
            io.new_output_file("s3://a").unwrap_err(),
            FileIoError::NotInitialized
        ));
        assert!(matches!(
            io.delete_file("s3://a").await.unwrap_err(),
            FileIoError::NotInitialized
        ));
        assert!(matches!(
            io.physical_location("s3://a").unwrap_err(),
            FileIoError::NotInitialized
        ));
    }

    #[test]
    fn test_failed_initialize_can_be_retried() {
        let mut io = SwitchingFileIo::new();

        let err = io.initialize(Properties::new()).unwrap_err();
        assert!(err.is_config());
        assert!(!io.is_initialized());

        io.initialize(Properties::new().with(DELEGATE_FILE_IO_KEY, "memory"))
            .unwrap();
        assert_eq!(io.delegate_name(), Some("memory"));
    }

    #[test]
    fn test_invalid_rule_leaves_adapter_uninitialized() {
        let mut io = SwitchingFileIo::new();
        let props = Properties::new()
            .with(DELEGATE_FILE_IO_KEY, "memory")
            .with("protocol.mapping.^s3://(", "mem://");

        assert!(io.initialize(props).unwrap_err().is_config());
        assert!(io.rewriter().is_none());
    }

    #[test]
    fn test_double_initialize_rejected() {
        let store = MemoryStore::new();
        let mut io = adapter(&store, &[("^s3://", "mem://")]);

        let err = io
            .initialize(Properties::new().with(DELEGATE_FILE_IO_KEY, "memory"))
            .unwrap_err();
        assert!(matches!(err, FileIoError::AlreadyInitialized));
        // First configuration still in effect
        assert_eq!(io.rewriter().unwrap().rules().len(), 1);
    }

    #[test]
    fn test_debug() {
        let store = MemoryStore::new();
        let io = adapter(&store, &[("^s3://", "mem://")]);
        let debug = format!("{:?}", io);
        assert!(debug.contains("SwitchingFileIo"));
        assert!(debug.contains("memory"));
    }
}
