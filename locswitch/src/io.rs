//! Core FileIO trait definitions.
//!
//! `FileIo` is the storage-access abstraction the switching layer both
//! consumes (as its delegate) and implements. Handles returned by a `FileIo`
//! are lightweight references to locations; bytes only move through the
//! streams they open.

use async_trait::async_trait;
use std::fmt;
use tokio::io::{AsyncRead, AsyncSeek, AsyncWrite};

use crate::error::Result;
use crate::properties::Properties;

/// Seekable byte source opened from an [`InputFile`].
pub trait SeekableRead: AsyncRead + AsyncSeek + Send + Unpin {}

impl<T: AsyncRead + AsyncSeek + Send + Unpin> SeekableRead for T {}

/// Byte sink opened from an [`OutputFile`] that knows how much it has written.
pub trait PositionWrite: AsyncWrite + Send + Unpin {
    /// Number of bytes written to the stream so far.
    fn position(&self) -> u64;
}

/// Boxed input stream.
pub type InputStream = Box<dyn SeekableRead>;

/// Boxed output stream.
pub type OutputStream = Box<dyn PositionWrite>;

/// Reference to a manifest file: a path plus its known byte length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestFile {
    path: String,
    length: u64,
}

impl ManifestFile {
    /// Create a manifest reference.
    pub fn new(path: impl Into<String>, length: u64) -> Self {
        Self {
            path: path.into(),
            length,
        }
    }

    /// Location of the manifest.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Length of the manifest in bytes.
    pub fn length(&self) -> u64 {
        self.length
    }
}

/// A readable location.
#[async_trait]
pub trait InputFile: Send + Sync {
    /// Location this handle reports to its caller.
    fn location(&self) -> &str;

    /// Total length of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns `FileIoError::NotFound` if the file does not exist.
    async fn length(&self) -> Result<u64>;

    /// Check whether the file exists.
    async fn exists(&self) -> Result<bool>;

    /// Open a seekable stream over the file contents.
    async fn new_stream(&self) -> Result<InputStream>;
}

/// A writable location.
#[async_trait]
pub trait OutputFile: Send + Sync {
    /// Location this handle reports to its caller.
    fn location(&self) -> &str;

    /// Create the file and open a stream for writing.
    ///
    /// # Errors
    ///
    /// Returns `FileIoError::AlreadyExists` if the file exists.
    async fn create(&self) -> Result<OutputStream>;

    /// Create the file, replacing any existing content.
    async fn create_or_overwrite(&self) -> Result<OutputStream>;

    /// Convert to a readable handle for the same location.
    fn to_input_file(&self) -> Box<dyn InputFile>;
}

/// Pluggable storage access.
///
/// # Lifecycle
///
/// `initialize` is called exactly once, before any other method, with the
/// full property map. Implementations may reject a second call.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; an initialized `FileIo` is shared
/// across tasks behind an `Arc`.
#[async_trait]
pub trait FileIo: Send + Sync {
    /// Configure the FileIO.
    fn initialize(&mut self, properties: Properties) -> Result<()>;

    /// Get a readable handle for `location`.
    fn new_input_file(&self, location: &str) -> Result<Box<dyn InputFile>>;

    /// Get a readable handle for `location` whose length is already known.
    fn new_input_file_with_length(&self, location: &str, length: u64)
        -> Result<Box<dyn InputFile>>;

    /// Get a writable handle for `location`.
    fn new_output_file(&self, location: &str) -> Result<Box<dyn OutputFile>>;

    /// Delete the file at `location`.
    async fn delete_file(&self, location: &str) -> Result<()>;

    /// Get a readable handle for a manifest.
    fn new_manifest_input_file(&self, manifest: &ManifestFile) -> Result<Box<dyn InputFile>> {
        self.new_input_file_with_length(manifest.path(), manifest.length())
    }

    /// Get a human-readable name for this FileIO.
    fn name(&self) -> &'static str;
}

impl fmt::Debug for dyn InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputFile({})", self.location())
    }
}

impl fmt::Debug for dyn OutputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputFile({})", self.location())
    }
}

impl fmt::Debug for dyn FileIo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileIo({})", self.name())
    }
}
