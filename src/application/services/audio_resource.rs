use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tempfile::NamedTempFile;

const FILE_PREFIX: &str = "audio_";

/// Local materialization of fetched audio, owned by a single invocation.
///
/// The backing file is removed when the resource is released or dropped, so an
/// early return, a panic, or cancellation of the owning future all clean up.
#[derive(Debug)]
pub struct AudioResource {
    file: NamedTempFile,
}

impl AudioResource {
    /// Writes `bytes` into a fresh file under `dir`, keeping the extension of
    /// `file_name` so decoders can use it as a format hint.
    pub async fn materialize(dir: &Path, file_name: &str, bytes: Bytes) -> io::Result<Self> {
        let dir = dir.to_path_buf();
        let suffix = extension_suffix(file_name);

        let file = tokio::task::spawn_blocking(move || -> io::Result<NamedTempFile> {
            std::fs::create_dir_all(&dir)?;
            let mut file = tempfile::Builder::new()
                .prefix(FILE_PREFIX)
                .suffix(&suffix)
                .tempfile_in(&dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file)
        })
        .await
        .map_err(io::Error::other)??;

        tracing::debug!(path = %file.path().display(), "Audio resource materialized");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Runs `use_block` against the resource path, then releases the resource
    /// regardless of the block's outcome.
    pub async fn scoped<F, Fut, T>(self, use_block: F) -> T
    where
        F: FnOnce(PathBuf) -> Fut,
        Fut: Future<Output = T>,
    {
        let output = use_block(self.path().to_path_buf()).await;
        self.release();
        output
    }

    fn release(self) {
        let path = self.file.path().to_path_buf();
        match self.file.close() {
            Ok(()) => tracing::debug!(path = %path.display(), "Audio resource released"),
            Err(e) => tracing::warn!(
                error = %e,
                path = %path.display(),
                "Failed to remove audio resource"
            ),
        }
    }
}

fn extension_suffix(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default()
}
