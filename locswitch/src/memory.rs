//! In-memory FileIO backend.
//!
//! Objects live in a [`MemoryStore`] shared by every handle created from the
//! same `MemoryFileIo`. Output streams buffer writes and publish the object
//! when the stream is shut down, so readers never observe partial content.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::{self, Cursor};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::io::AsyncWrite;
use tracing::{debug, instrument};

use crate::error::{FileIoError, Result};
use crate::io::{FileIo, InputFile, InputStream, OutputFile, OutputStream, PositionWrite};
use crate::properties::Properties;

/// Shared object map behind a [`MemoryFileIo`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    objects: Arc<RwLock<HashMap<String, Bytes>>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the contents stored at `location`.
    pub fn get(&self, location: &str) -> Option<Bytes> {
        self.objects.read().get(location).cloned()
    }

    /// Store `data` at `location`, replacing any previous contents.
    pub fn put(&self, location: impl Into<String>, data: impl Into<Bytes>) {
        self.objects.write().insert(location.into(), data.into());
    }

    /// Remove the object at `location`, returning its contents.
    pub fn remove(&self, location: &str) -> Option<Bytes> {
        self.objects.write().remove(location)
    }

    /// Whether an object exists at `location`.
    pub fn contains(&self, location: &str) -> bool {
        self.objects.read().contains_key(location)
    }

    /// All stored locations, sorted.
    pub fn locations(&self) -> Vec<String> {
        let mut locations: Vec<String> = self.objects.read().keys().cloned().collect();
        locations.sort_unstable();
        locations
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }
}

/// FileIO that keeps every object in memory.
#[derive(Debug, Default)]
pub struct MemoryFileIo {
    store: MemoryStore,
    properties: Option<Properties>,
}

impl MemoryFileIo {
    /// Create a FileIO over a fresh store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a FileIO over an existing store.
    pub fn with_store(store: MemoryStore) -> Self {
        Self {
            store,
            properties: None,
        }
    }

    /// The backing store.
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Properties passed to `initialize`, if it has been called.
    pub fn properties(&self) -> Option<&Properties> {
        self.properties.as_ref()
    }

    fn input_file(&self, location: &str, known_length: Option<u64>) -> Box<dyn InputFile> {
        Box::new(MemoryInputFile {
            store: self.store.clone(),
            location: location.to_string(),
            known_length,
        })
    }
}

#[async_trait]
impl FileIo for MemoryFileIo {
    fn initialize(&mut self, properties: Properties) -> Result<()> {
        if self.properties.is_some() {
            return Err(FileIoError::AlreadyInitialized);
        }
        debug!("MemoryFileIo initialized with {} properties", properties.len());
        self.properties = Some(properties);
        Ok(())
    }

    fn new_input_file(&self, location: &str) -> Result<Box<dyn InputFile>> {
        Ok(self.input_file(location, None))
    }

    fn new_input_file_with_length(
        &self,
        location: &str,
        length: u64,
    ) -> Result<Box<dyn InputFile>> {
        Ok(self.input_file(location, Some(length)))
    }

    fn new_output_file(&self, location: &str) -> Result<Box<dyn OutputFile>> {
        Ok(Box::new(MemoryOutputFile {
            store: self.store.clone(),
            location: location.to_string(),
        }))
    }

    #[instrument(skip(self))]
    async fn delete_file(&self, location: &str) -> Result<()> {
        debug!("Deleting {}", location);
        match self.store.remove(location) {
            Some(_) => Ok(()),
            None => Err(FileIoError::NotFound(location.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Readable handle into a [`MemoryStore`].
#[derive(Debug)]
struct MemoryInputFile {
    store: MemoryStore,
    location: String,
    known_length: Option<u64>,
}

impl MemoryInputFile {
    fn contents(&self) -> Result<Bytes> {
        self.store
            .get(&self.location)
            .ok_or_else(|| FileIoError::NotFound(self.location.clone()))
    }
}

#[async_trait]
impl InputFile for MemoryInputFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn length(&self) -> Result<u64> {
        match self.known_length {
            Some(length) => Ok(length),
            None => Ok(self.contents()?.len() as u64),
        }
    }

    async fn exists(&self) -> Result<bool> {
        Ok(self.store.contains(&self.location))
    }

    async fn new_stream(&self) -> Result<InputStream> {
        Ok(Box::new(Cursor::new(self.contents()?)))
    }
}

/// Writable handle into a [`MemoryStore`].
#[derive(Debug)]
struct MemoryOutputFile {
    store: MemoryStore,
    location: String,
}

impl MemoryOutputFile {
    fn stream(&self) -> OutputStream {
        Box::new(MemoryOutputStream {
            store: self.store.clone(),
            location: self.location.clone(),
            buffer: Vec::new(),
            closed: false,
        })
    }
}

#[async_trait]
impl OutputFile for MemoryOutputFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn create(&self) -> Result<OutputStream> {
        if self.store.contains(&self.location) {
            return Err(FileIoError::AlreadyExists(self.location.clone()));
        }
        Ok(self.stream())
    }

    async fn create_or_overwrite(&self) -> Result<OutputStream> {
        Ok(self.stream())
    }

    fn to_input_file(&self) -> Box<dyn InputFile> {
        Box::new(MemoryInputFile {
            store: self.store.clone(),
            location: self.location.clone(),
            known_length: None,
        })
    }
}

/// Buffers writes and publishes them to the store on shutdown.
struct MemoryOutputStream {
    store: MemoryStore,
    location: String,
    buffer: Vec<u8>,
    closed: bool,
}

impl MemoryOutputStream {
    fn closed_error(&self) -> io::Error {
        io::Error::new(
            io::ErrorKind::BrokenPipe,
            format!("stream for {} is closed", self.location),
        )
    }
}

impl AsyncWrite for MemoryOutputStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if this.closed {
            return Poll::Ready(Err(this.closed_error()));
        }
        this.buffer.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if !this.closed {
            this.closed = true;
            let data = Bytes::copy_from_slice(&this.buffer);
            debug!("Committing {} bytes to {}", data.len(), this.location);
            this.store.put(this.location.clone(), data);
        }
        Poll::Ready(Ok(()))
    }
}

impl PositionWrite for MemoryOutputStream {
    fn position(&self) -> u64 {
        self.buffer.len() as u64
    }
}
