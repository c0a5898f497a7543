//! Module handling persistence of rendered images.

mod ids;

pub use self::ids::{is_artifact_id, ArtifactIds};


use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::caption::CaptionOutput;


/// File extension of stored artifacts.
pub const ARTIFACT_EXTENSION: &'static str = "jpg";


/// A rendered image that has been persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    /// Identifier of the form `{templateId}-{timestamp}`.
    pub id: String,
    /// Where the artifact has been stored, if it's a file.
    pub path: Option<PathBuf>,
    /// Public URL of the artifact.
    pub url: String,
}


/// Write-once storage of rendered images.
pub trait Storage: Send + Sync {
    /// Persist the output of captioning given template,
    /// returning the newly created artifact.
    fn store(&self, template_id: &str, output: &CaptionOutput) -> io::Result<Artifact>;
}


/// Storage that writes artifacts as files into a directory.
#[derive(Debug)]
pub struct FileStorage {
    directory: PathBuf,
    url_prefix: String,
    ids: ArtifactIds,
}

impl FileStorage {
    /// Create the storage, which will expose the files under given URL prefix.
    ///
    /// The directory is created on the first write if it doesn't exist.
    pub fn new<D: AsRef<Path>, U: Into<String>>(directory: D, url_prefix: U) -> Self {
        let url_prefix = url_prefix.into().trim_end_matches('/').to_owned();
        FileStorage{
            directory: directory.as_ref().to_owned(),
            url_prefix,
            ids: ArtifactIds::new(),
        }
    }
}

impl FileStorage {
    #[inline]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    #[inline]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Path to the file of artifact with given ID.
    pub fn path_for(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", id, ARTIFACT_EXTENSION))
    }

    /// Read the content of a stored artifact.
    /// IDs which don't look like artifact IDs are rejected.
    pub fn read(&self, id: &str) -> io::Result<Vec<u8>> {
        if !is_artifact_id(id) {
            return Err(io::Error::new(io::ErrorKind::InvalidInput,
                format!("invalid artifact ID `{}`", id)));
        }
        fs::read(self.path_for(id))
    }
}

impl Storage for FileStorage {
    fn store(&self, template_id: &str, output: &CaptionOutput) -> io::Result<Artifact> {
        fs::create_dir_all(&self.directory).map_err(|e| {
            error!("Failed to create storage directory {}: {}", self.directory.display(), e); e
        })?;

        let id = self.ids.next(template_id);
        let path = self.path_for(&id);
        if path.exists() {
            return Err(io::Error::new(io::ErrorKind::AlreadyExists,
                format!("artifact file {} already exists", path.display())));
        }

        // Write to a temporary file first, so that readers never see a partial image.
        let temp_path = self.directory.join(format!(".{}.{}.tmp", id, ARTIFACT_EXTENSION));
        trace!("Writing {} byte(s) to {}", output.len(), temp_path.display());
        let written = OpenOptions::new().write(true).create_new(true).open(&temp_path)
            .and_then(|mut file| { file.write_all(output.bytes())?; file.sync_all() })
            .and_then(|_| fs::rename(&temp_path, &path));
        if let Err(e) = written {
            error!("Failed to store artifact {}: {}", id, e);
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        let url = format!("{}/{}.{}", self.url_prefix, id, ARTIFACT_EXTENSION);
        info!("Stored artifact {} at {}", id, path.display());
        Ok(Artifact{id, path: Some(path), url})
    }
}


#[cfg(test)]
mod tests {
    use std::fs;
    use tempfile::TempDir;
    use crate::caption::CaptionOutput;
    use super::{FileStorage, Storage};

    fn output() -> CaptionOutput {
        CaptionOutput::new(b"\xff\xd8not quite a jpeg".to_vec(), (1, 1), None)
    }

    #[test]
    fn store_writes_file() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path().join("generated"), "/generated/");

        let artifact = storage.store("181913649", &output()).unwrap();
        assert!(artifact.id.starts_with("181913649-"));
        assert_eq!(format!("/generated/{}.jpg", artifact.id), artifact.url);

        let path = artifact.path.unwrap();
        assert_eq!(output().bytes(), &fs::read(&path).unwrap()[..]);
        assert_eq!(output().bytes(), &storage.read(&artifact.id).unwrap()[..]);
    }

    #[test]
    fn no_temporary_files_left() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path(), "");
        storage.store("a", &output()).unwrap();
        storage.store("a", &output()).unwrap();

        let names: Vec<_> = fs::read_dir(dir.path()).unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(2, names.len());
        assert!(names.iter().all(|n| n.ends_with(".jpg") && !n.starts_with('.')));
    }

    #[test]
    fn distinct_ids_for_same_template() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path(), "");
        let first = storage.store("a", &output()).unwrap();
        let second = storage.store("a", &output()).unwrap();
        assert_ne!(first.id, second.id);
        assert_ne!(first.url, second.url);
    }

    #[test]
    fn read_rejects_bad_ids() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(dir.path(), "");
        assert!(storage.read("../secret").is_err());
        assert!(storage.read("missing-123").is_err());
    }

    #[test]
    fn unwritable_directory() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, b"").unwrap();
        let storage = FileStorage::new(blocker.join("generated"), "");
        assert!(storage.store("a", &output()).is_err());
    }
}
