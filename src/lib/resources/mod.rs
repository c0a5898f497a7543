//! Module handling the resources used for captioning.

mod filesystem;
mod fonts;
mod templates;


pub use self::filesystem::{BytesLoader, PathLoader};
pub use self::fonts::{Font, FontError, FontLoader, FILE_EXTENSION as FONT_FILE_EXTENSION};
pub use self::templates::{IMAGE_FORMAT_EXTENSIONS,
                          Template, TemplateLoader, TemplateError};


use std::error::Error;
use std::fmt;
use std::sync::Arc;

use crate::util::cache::ThreadSafeCache;


/// Loader of resources from some external source.
pub trait Loader {
    /// Type of resources that this loader can load.
    type Item;
    /// Error that may occur while loading the resource.
    type Err: Error + Send + Sync + 'static;

    /// Load a resource of given name.
    fn load<'n>(&self, name: &'n str) -> Result<Self::Item, Self::Err>;
}


/// Loader wrapper which hands out resources as `Arc`s,
/// keeping them in an LRU cache unless created with `uncached`.
pub struct CachingLoader<L: Loader> {
    inner: L,
    cache: Option<ThreadSafeCache<String, L::Item>>,
}

impl<L: Loader> CachingLoader<L> {
    #[inline]
    pub fn new(inner: L, capacity: usize) -> Self {
        CachingLoader{inner, cache: Some(ThreadSafeCache::new(capacity))}
    }

    /// Wrap a loader without caching anything,
    /// for loaders that take care of caching themselves (or don't need it).
    #[inline]
    pub fn uncached(inner: L) -> Self {
        CachingLoader{inner, cache: None}
    }

    #[inline]
    pub fn cache(&self) -> Option<&ThreadSafeCache<String, L::Item>> {
        self.cache.as_ref()
    }
}

impl<L: Loader> Loader for CachingLoader<L> {
    type Item = Arc<L::Item>;
    type Err = L::Err;

    /// Load the resource, going to the wrapped loader only on a cache miss.
    /// Failures are not cached.
    fn load<'n>(&self, name: &'n str) -> Result<Self::Item, Self::Err> {
        let cache = match self.cache {
            Some(ref cache) => cache,
            None => return self.inner.load(name).map(Arc::new),
        };
        match cache.get(name) {
            Some(resource) => Ok(resource),
            None => {
                trace!("Cache miss for resource `{}`", name);
                let resource = self.inner.load(name)?;
                Ok(cache.put(name.to_owned(), resource))
            },
        }
    }
}

impl<L: Loader> fmt::Debug for CachingLoader<L> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("CachingLoader")
            .field("cache", &self.cache)
            .finish()
    }
}


#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io;
    use super::{CachingLoader, Loader};

    /// Loader that counts how many times it's been asked for something.
    struct CountingLoader {
        calls: Cell<usize>,
    }

    impl Loader for CountingLoader {
        type Item = String;
        type Err = io::Error;

        fn load<'n>(&self, name: &'n str) -> Result<String, io::Error> {
            self.calls.set(self.calls.get() + 1);
            if name.is_empty() {
                return Err(io::Error::new(io::ErrorKind::NotFound, "empty name"));
            }
            Ok(name.to_uppercase())
        }
    }

    #[test]
    fn caching_loader_caches() {
        let loader = CachingLoader::new(CountingLoader{calls: Cell::new(0)}, 4);
        assert_eq!("FOO", *loader.load("foo").unwrap());
        assert_eq!("FOO", *loader.load("foo").unwrap());
        assert_eq!(1, loader.inner.calls.get());
        assert_eq!(1, loader.cache().unwrap().hits());
        assert_eq!(1, loader.cache().unwrap().misses());
    }

    #[test]
    fn caching_loader_does_not_cache_errors() {
        let loader = CachingLoader::new(CountingLoader{calls: Cell::new(0)}, 4);
        assert!(loader.load("").is_err());
        assert!(loader.load("").is_err());
        assert_eq!(2, loader.inner.calls.get());
        assert!(loader.cache().unwrap().is_empty());
    }

    #[test]
    fn uncached_loader() {
        let loader = CachingLoader::uncached(CountingLoader{calls: Cell::new(0)});
        loader.load("foo").unwrap();
        loader.load("foo").unwrap();
        assert_eq!(2, loader.inner.calls.get());
        assert!(loader.cache().is_none());
    }
}
