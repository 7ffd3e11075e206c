//! FileListener - appends messages to a JSON lines file

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use contracts::{Listener, ListenerResult, Message};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Listener that writes each message as one JSON line
pub struct FileListener {
    name: String,
    path: PathBuf,
    file: Mutex<tokio::fs::File>,
}

impl FileListener {
    /// Open (or create) `path` for appending. Parent directories are created.
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            file: Mutex::new(tokio::fs::File::from_std(file)),
        })
    }

    /// Create from params map (for factory). Requires `path`.
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let path = params.get("path").ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "missing param 'path'")
        })?;
        Self::new(name, path)
    }

    /// Listener name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Output file path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Listener for FileListener {
    #[instrument(name = "file_listener_on_message", skip(self, message), fields(listener = %self.name))]
    async fn on_message(&self, message: &Message) -> ListenerResult {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;

        debug!(path = %self.path.display(), bytes = line.len(), "Message written");
        Ok(())
    }
}
