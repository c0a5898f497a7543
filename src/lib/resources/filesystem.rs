//! Module implementing loaders of resources stored as files.

use std::fmt;
use std::fs;
use std::iter;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;


use super::Loader;


/// Loader that resolves resource names into paths of files in a directory.
///
/// Resource names are either file stems (`drake`), matched against files
/// in the directory regardless of their extension, or relative paths
/// with an extension (`memes/drake.jpg`), which must point to an existing file.
/// Only files accepted by the loader's predicate are ever resolved.
pub struct PathLoader<'pl> {
    directory: PathBuf,
    predicate: Arc<dyn Fn(&Path) -> bool + Send + Sync + 'pl>,
}

impl<'pl> PathLoader<'pl> {
    /// Loader accepting any file.
    #[inline]
    pub fn new<D: AsRef<Path>>(directory: D) -> Self {
        Self::with_predicate(directory, |_| true)
    }

    /// Loader accepting files with any of the given extensions (case insensitive).
    pub fn for_extensions<D: AsRef<Path>, I, S>(directory: D, extensions: I) -> Self
        where I: IntoIterator<Item=S>, S: AsRef<str>
    {
        let allowed: Vec<String> = extensions.into_iter()
            .map(|e| e.as_ref().trim().to_lowercase())
            .collect();
        Self::with_predicate(directory, move |path: &Path| {
            match path.extension().and_then(|e| e.to_str()) {
                Some(ext) => allowed.iter().any(|a| a.eq_ignore_ascii_case(ext.trim())),
                None => false,
            }
        })
    }

    pub fn with_predicate<D, P>(directory: D, predicate: P) -> Self
        where D: AsRef<Path>, P: Fn(&Path) -> bool + Send + Sync + 'pl
    {
        PathLoader{
            directory: directory.as_ref().to_owned(),
            predicate: Arc::new(predicate),
        }
    }
}

impl<'pl> PathLoader<'pl> {
    /// Resolve a resource name that is a relative path to a file.
    fn load_relative_path(&self, name: &str) -> io::Result<PathBuf> {
        let relative = Path::new(name.trim_start_matches('/'));
        let escapes = relative.components().any(|c| match c {
            Component::Normal(_) | Component::CurDir => false,
            _ => true,
        });
        if escapes {
            return Err(io::Error::new(io::ErrorKind::InvalidInput,
                format!("resource path `{}` points outside of {}",
                    name, self.directory.display())));
        }

        let path = self.directory.join(relative);
        trace!("Checking for file {}", path.display());
        if !path.is_file() || !(self.predicate)(&path) {
            return Err(io::Error::new(io::ErrorKind::NotFound,
                format!("resource `{}` not found in {}", name, self.directory.display())));
        }
        Ok(path)
    }

    /// Resolve a resource name that is a file stem, by globbing over the directory.
    fn load_stem(&self, name: &str) -> io::Result<PathBuf> {
        let directory = glob::Pattern::escape(&self.directory.to_string_lossy());
        let file_part = format!("{}.*", glob::Pattern::escape(name));
        let pattern = format!("{}", Path::new(&directory).join(file_part).display());
        trace!("Globbing with {}", pattern);

        let paths = glob::glob(&pattern).map_err(|e| {
            error!("Failed to glob over files with {}: {}", pattern, e);
            io::Error::new(io::ErrorKind::Other, e)
        })?;
        let mut matches: Vec<_> = paths
            .filter_map(|r| r.map_err(|e| warn!("Error while globbing: {}", e)).ok())
            .filter(|f| (self.predicate)(f))
            .collect();

        match matches.pop() {
            Some(path) if matches.is_empty() => Ok(path),
            Some(_) => Err(io::Error::new(io::ErrorKind::InvalidInput,
                format!("ambiguous resource name `{}` matching {} files in {}",
                    name, matches.len() + 1, self.directory.display()))),
            None => Err(io::Error::new(io::ErrorKind::NotFound,
                format!("resource `{}` not found in {}", name, self.directory.display()))),
        }
    }
}

impl<'pl> Loader for PathLoader<'pl> {
    type Item = PathBuf;
    type Err = io::Error;

    /// "Load" a path "resource" from the loader's directory.
    fn load<'n>(&self, name: &'n str) -> Result<Self::Item, Self::Err> {
        if Path::new(name).extension().is_some() {
            self.load_relative_path(name)
        } else {
            self.load_stem(name)
        }
    }
}

impl<'pl> fmt::Debug for PathLoader<'pl> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("PathLoader")
            .field("directory", &self.directory)
            .finish()
    }
}


/// Loader of whole file contents, for files resolved by a `PathLoader`.
#[derive(Debug)]
pub struct BytesLoader<'pl> {
    paths: PathLoader<'pl>,
}

impl<'pl> BytesLoader<'pl> {
    #[inline]
    pub fn new(paths: PathLoader<'pl>) -> Self {
        BytesLoader{paths}
    }

    /// Loader of files with given extension.
    #[inline]
    pub fn for_extension<D: AsRef<Path>>(directory: D, extension: &str) -> Self {
        Self::new(PathLoader::for_extensions(directory, iter::once(extension)))
    }
}

impl<'pl> Loader for BytesLoader<'pl> {
    type Item = Vec<u8>;
    type Err = io::Error;

    fn load<'n>(&self, name: &'n str) -> Result<Self::Item, Self::Err> {
        let path = self.paths.load(name)?;
        let bytes = fs::read(&path)?;
        trace!("Read {} byte(s) of resource `{}` from {}", bytes.len(), name, path.display());
        Ok(bytes)
    }
}


#[cfg(test)]
mod tests {
    use std::fs;
    use std::io;
    use tempfile::TempDir;
    use super::{BytesLoader, Loader, PathLoader};

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("drake.jpg"), b"jpeg").unwrap();
        fs::write(dir.path().join("ambiguous.png"), b"png").unwrap();
        fs::write(dir.path().join("ambiguous.gif"), b"gif").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        fs::create_dir(dir.path().join("memes")).unwrap();
        fs::write(dir.path().join("memes").join("handshake.png"), b"png").unwrap();
        dir
    }

    #[test]
    fn load_by_stem() {
        let dir = fixture();
        let loader = PathLoader::for_extensions(dir.path(), &["jpg", "png", "gif"]);
        assert_eq!(dir.path().join("drake.jpg"), loader.load("drake").unwrap());
    }

    #[test]
    fn load_by_relative_path() {
        let dir = fixture();
        let loader = PathLoader::for_extensions(dir.path(), &["jpg", "png", "gif"]);
        let expected = dir.path().join("memes").join("handshake.png");
        assert_eq!(expected, loader.load("memes/handshake.png").unwrap());
        assert_eq!(expected, loader.load("/memes/handshake.png").unwrap());
    }

    #[test]
    fn load_by_stem_from_directory_with_glob_characters() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("memes [old] *");
        fs::create_dir(&data).unwrap();
        fs::write(data.join("drake.jpg"), b"jpeg").unwrap();

        let loader = PathLoader::for_extensions(&data, &["jpg"]);
        assert_eq!(data.join("drake.jpg"), loader.load("drake").unwrap());
        assert_eq!(io::ErrorKind::NotFound, loader.load("nope").unwrap_err().kind());
    }

    #[test]
    fn extension_filter() {
        let dir = fixture();
        let loader = PathLoader::for_extensions(dir.path(), &["jpg", "png", "gif"]);
        let err = loader.load("notes").unwrap_err();
        assert_eq!(io::ErrorKind::NotFound, err.kind());
        assert!(loader.load("notes.txt").is_err());
    }

    #[test]
    fn ambiguous_stem() {
        let dir = fixture();
        let loader = PathLoader::new(dir.path());
        let err = loader.load("ambiguous").unwrap_err();
        assert_eq!(io::ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn no_escaping_the_directory() {
        let dir = fixture();
        let loader = PathLoader::new(dir.path().join("memes"));
        let err = loader.load("../drake.jpg").unwrap_err();
        assert_eq!(io::ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn bytes_loader() {
        let dir = fixture();
        let loader = BytesLoader::for_extension(dir.path(), "jpg");
        assert_eq!(b"jpeg".to_vec(), loader.load("drake").unwrap());
        assert!(loader.load("ambiguous").is_err());
    }
}
