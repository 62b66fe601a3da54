//! Loading jobs.

/// Where a job's pixel data comes from.
pub enum JobSource {
    /// A loose file on disk, interned in the cache's string arena.
    File { path: &'static str },
    /// An archive entry extracted into memory.
    Blob { name: String, data: Vec<u8> },
}

impl std::fmt::Debug for JobSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { path } => f.debug_struct("File").field("path", path).finish(),
            Self::Blob { name, data } => f
                .debug_struct("Blob")
                .field("name", name)
                .field("len", &data.len())
                .finish(),
        }
    }
}

/// One unit of work for the pipeline.
#[derive(Debug)]
pub struct Job {
    /// Name identifier for files, content identifier for archive blobs.
    pub hash: u32,
    pub source: JobSource,
}

impl Job {
    /// Human-readable source label for logging.
    pub fn source_name(&self) -> &str {
        match &self.source {
            JobSource::File { path } => path,
            JobSource::Blob { name, .. } => name,
        }
    }
}
