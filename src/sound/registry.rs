use super::buffer::SoundBuffer;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to read asset directory {}: {source}", path.display())]
    AssetDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Every clip the daemon can play, decoded once at startup.
///
/// Sounds are looked up by their identifier, the file name without the
/// registry's extension. The extension is only reattached when reporting
/// file names back to callers.
#[derive(Debug)]
pub struct SoundRegistry {
    extension: String,
    order: Vec<String>,
    sounds: HashMap<String, SoundBuffer>,
}

impl SoundRegistry {
    pub fn empty(extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_string(),
            order: Vec::new(),
            sounds: HashMap::new(),
        }
    }

    /// Loads every `*.<extension>` file directly under `dir`, in file name order.
    ///
    /// Only an unreadable directory is an error. Files that cannot be read or
    /// decoded are logged and left out.
    pub fn load_dir(dir: &Path, extension: &str) -> Result<Self, RegistryError> {
        let entries = fs::read_dir(dir).map_err(|source| RegistryError::AssetDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RegistryError::AssetDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if !path.is_file() {
                tracing::debug!(path = %path.display(), "Skipping non-file asset entry");
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => files.push((name, path)),
                Err(name) => {
                    tracing::warn!(filename = ?name, "Skipping asset with non UTF-8 name");
                }
            }
        }
        files.sort_by(|a, b| a.0.cmp(&b.0));

        let mut registry = Self::empty(extension);
        for (name, path) in files {
            if registry.identifier_for(&name).is_none() {
                tracing::debug!(filename = %name, "Skipping asset with foreign extension");
                continue;
            }
            match fs::read(&path) {
                Ok(data) => registry.insert(name, data),
                Err(err) => {
                    tracing::error!(filename = %name, error = %err, "Failed to open sfx file");
                }
            }
        }

        tracing::info!(
            directory = %dir.display(),
            loaded = registry.len(),
            "Sound library loaded"
        );
        Ok(registry)
    }

    /// Builds a registry from already-read `(file name, bytes)` pairs,
    /// keeping their order.
    pub fn from_assets<I>(extension: &str, assets: I) -> Self
    where
        I: IntoIterator<Item = (String, Vec<u8>)>,
    {
        let mut registry = Self::empty(extension);
        for (name, data) in assets {
            registry.insert(name, data);
        }
        registry
    }

    fn insert(&mut self, file_name: String, data: Vec<u8>) {
        let Some(id) = self.identifier_for(&file_name).map(str::to_string) else {
            tracing::debug!(filename = %file_name, "Skipping asset with foreign extension");
            return;
        };
        if self.sounds.contains_key(&id) {
            tracing::warn!(filename = %file_name, "Duplicate sound name, keeping the first one");
            return;
        }
        match SoundBuffer::decode(data) {
            Ok(buffer) => {
                tracing::debug!(
                    filename = %file_name,
                    channels = buffer.channels(),
                    sample_rate = buffer.sample_rate(),
                    duration_ms = buffer.duration().as_millis() as u64,
                    "Decoded sound"
                );
                self.sounds.insert(id, buffer);
                self.order.push(file_name);
            }
            Err(err) => {
                tracing::error!(filename = %file_name, error = %err, "Failed to decode sound");
            }
        }
    }

    fn identifier_for<'a>(&self, file_name: &'a str) -> Option<&'a str> {
        let id = file_name
            .strip_suffix(self.extension.as_str())?
            .strip_suffix('.')?;
        (!id.is_empty()).then_some(id)
    }

    /// File name a sound identifier resolves to, e.g. `boop` -> `boop.wav`.
    pub fn file_name(&self, id: &str) -> String {
        format!("{}.{}", id, self.extension)
    }

    pub fn lookup(&self, id: &str) -> Option<&SoundBuffer> {
        self.sounds.get(id)
    }

    /// File names of every loaded sound, in load order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Drops every decoded buffer. Taking `self` keeps this from racing lookups.
    pub fn release_all(mut self) -> usize {
        let released = self.sounds.len();
        self.sounds.clear();
        self.order.clear();
        tracing::debug!(released, "Released sound buffers");
        released
    }
}
