//! Location-preserving handle wrappers.
//!
//! The delegate sees physical locations, but callers must only ever see the
//! logical location they asked for. These wrappers override `location()` and
//! forward everything else to the delegate's handle unchanged.

use async_trait::async_trait;

use crate::error::Result;
use crate::io::{InputFile, InputStream, OutputFile, OutputStream};

/// Readable handle reporting the caller's logical location.
pub struct SwitchedInputFile {
    inner: Box<dyn InputFile>,
    location: String,
}

impl SwitchedInputFile {
    /// Wrap `inner`, reporting `location` instead of its own.
    pub fn new(inner: Box<dyn InputFile>, location: impl Into<String>) -> Self {
        Self {
            inner,
            location: location.into(),
        }
    }

    /// Location the delegate handle was opened at.
    pub fn physical_location(&self) -> &str {
        self.inner.location()
    }
}

#[async_trait]
impl InputFile for SwitchedInputFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn length(&self) -> Result<u64> {
        self.inner.length().await
    }

    async fn exists(&self) -> Result<bool> {
        self.inner.exists().await
    }

    async fn new_stream(&self) -> Result<InputStream> {
        self.inner.new_stream().await
    }
}

impl std::fmt::Debug for SwitchedInputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchedInputFile")
            .field("location", &self.location)
            .field("physical_location", &self.physical_location())
            .finish()
    }
}

/// Writable handle reporting the caller's logical location.
pub struct SwitchedOutputFile {
    inner: Box<dyn OutputFile>,
    location: String,
}

impl SwitchedOutputFile {
    /// Wrap `inner`, reporting `location` instead of its own.
    pub fn new(inner: Box<dyn OutputFile>, location: impl Into<String>) -> Self {
        Self {
            inner,
            location: location.into(),
        }
    }

    /// Location the delegate handle was opened at.
    pub fn physical_location(&self) -> &str {
        self.inner.location()
    }
}

#[async_trait]
impl OutputFile for SwitchedOutputFile {
    fn location(&self) -> &str {
        &self.location
    }

    async fn create(&self) -> Result<OutputStream> {
        self.inner.create().await
    }

    async fn create_or_overwrite(&self) -> Result<OutputStream> {
        self.inner.create_or_overwrite().await
    }

    fn to_input_file(&self) -> Box<dyn InputFile> {
        Box::new(SwitchedInputFile::new(
            self.inner.to_input_file(),
            self.location.clone(),
        ))
    }
}

impl std::fmt::Debug for SwitchedOutputFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwitchedOutputFile")
            .field("location", &self.location)
            .field("physical_location", &self.physical_location())
            .finish()
    }
}
