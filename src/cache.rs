//! Disk cache of resized variants, keyed by breakpoint resolution.
//!
//! The cache directory is the index: a variant for `(source, resolution)`
//! lives at exactly `{cache_root}/{resolution}/{mirrored source path}`, same
//! file name and extension as the source. That layout is load-bearing —
//! existing caches written by other implementations resolve identically.
//!
//! # Freshness
//!
//! Staleness is time-based: with watching enabled, a variant is valid only
//! while `mtime(variant) >= mtime(source)`. A stale variant is deleted
//! *before* regeneration, so no entry ever sits in a known-stale state. With
//! watching disabled, an existing file is trusted unconditionally.
//!
//! # Concurrency
//!
//! Two requests may race to generate the same variant; both render, both
//! publish, last rename wins. The rename is the hardening that matters: a
//! variant becomes visible at its final path only as a complete file, so
//! concurrent readers never observe partial bytes.

use crate::resample::{
    BackendError, Quality, RenderParams, ResampleBackend, VariantFormat, plan_resize,
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Resample(#[from] BackendError),
}

/// Outcome of resolving one `(source, resolution)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// An existing variant passed the freshness check.
    Hit(PathBuf),
    /// A variant was (re)generated on this call.
    Generated(PathBuf),
    /// The source is at or below the target width; serve it unmodified.
    Source,
}

impl Resolved {
    /// The variant path, when one applies.
    pub fn variant(&self) -> Option<&Path> {
        match self {
            Resolved::Hit(path) | Resolved::Generated(path) => Some(path),
            Resolved::Source => None,
        }
    }
}

/// Filesystem cache of resized variants.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_root: PathBuf,
    watch: bool,
    quality: Quality,
}

impl CacheStore {
    pub fn new(cache_root: impl Into<PathBuf>, watch: bool, quality: Quality) -> Self {
        Self {
            cache_root: cache_root.into(),
            watch,
            quality,
        }
    }

    /// Deterministic variant path for a logical source path at a resolution.
    pub fn variant_path(&self, source_rel: &Path, resolution: u32) -> PathBuf {
        self.cache_root.join(resolution.to_string()).join(source_rel)
    }

    /// Locate or produce the variant for `(source, resolution)`.
    ///
    /// `source` is the absolute path to the image; `source_rel` is its
    /// logical path under the source root, mirrored into the cache tree.
    pub fn resolve(
        &self,
        backend: &impl ResampleBackend,
        source: &Path,
        source_rel: &Path,
        resolution: u32,
    ) -> Result<Resolved, CacheError> {
        let cached = self.variant_path(source_rel, resolution);
        if cached.is_file() {
            if !self.watch || is_fresh(&cached, source)? {
                debug!(variant = %cached.display(), "cache hit");
                return Ok(Resolved::Hit(cached));
            }
            debug!(variant = %cached.display(), "stale variant, regenerating");
            fs::remove_file(&cached)?;
        }
        self.generate(backend, source, &cached, resolution)
    }

    fn generate(
        &self,
        backend: &impl ResampleBackend,
        source: &Path,
        cached: &Path,
        resolution: u32,
    ) -> Result<Resolved, CacheError> {
        let dims = backend.identify(source)?;
        let Some(plan) = plan_resize((dims.width, dims.height), resolution) else {
            debug!(
                source = %source.display(),
                width = dims.width,
                "source at or below target width, serving unmodified"
            );
            return Ok(Resolved::Source);
        };

        let bytes = backend.render(&RenderParams {
            source: source.to_path_buf(),
            width: plan.width,
            height: plan.height,
            format: VariantFormat::from_source(source),
            quality: self.quality,
        })?;
        write_atomic(cached, &bytes)?;
        info!(
            variant = %cached.display(),
            width = plan.width,
            height = plan.height,
            "generated variant"
        );
        Ok(Resolved::Generated(cached.to_path_buf()))
    }
}

/// A variant is fresh while its mtime is at or after the source's.
fn is_fresh(cached: &Path, source: &Path) -> io::Result<bool> {
    let cached_mtime = fs::metadata(cached)?.modified()?;
    let source_mtime = fs::metadata(source)?.modified()?;
    Ok(cached_mtime >= source_mtime)
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Publish bytes at `path` without ever exposing a partial file: write a
/// uniquely-named sibling in the same directory, then rename into place.
fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(
        ".{file_name}.{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::Dimensions;
    use crate::resample::backend::tests::{MockBackend, RecordedOp};
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn store(root: &Path, watch: bool) -> CacheStore {
        CacheStore::new(root, watch, Quality::default())
    }

    fn write_source(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"source bytes").unwrap();
        path
    }

    fn set_mtime(path: &Path, time: SystemTime) {
        let file = fs::OpenOptions::new().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn variant_path_namespaces_by_resolution() {
        let cache = store(Path::new("/cache"), false);
        assert_eq!(
            cache.variant_path(Path::new("albums/dawn.jpg"), 768),
            PathBuf::from("/cache/768/albums/dawn.jpg")
        );
    }

    #[test]
    fn miss_generates_and_writes_variant() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(tmp.path(), "photo.jpg");
        let cache_root = tmp.path().join("cache");
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1000,
            height: 500,
        }]);

        let resolved = store(&cache_root, true)
            .resolve(&backend, &source, Path::new("photo.jpg"), 768)
            .unwrap();

        let expected = cache_root.join("768").join("photo.jpg");
        assert_eq!(resolved, Resolved::Generated(expected.clone()));
        assert_eq!(fs::read(&expected).unwrap(), b"variant 768x384");

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 2);
        assert!(matches!(
            &ops[1],
            RecordedOp::Render {
                width: 768,
                height: 384,
                ..
            }
        ));
    }

    #[test]
    fn existing_variant_is_trusted_without_watching() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(tmp.path(), "photo.jpg");
        let cache_root = tmp.path().join("cache");
        let variant = cache_root.join("768").join("photo.jpg");
        fs::create_dir_all(variant.parent().unwrap()).unwrap();
        fs::write(&variant, b"old bytes").unwrap();
        // Older than the source, but watching is off.
        set_mtime(&variant, SystemTime::now() - Duration::from_secs(3600));

        let backend = MockBackend::new();
        let resolved = store(&cache_root, false)
            .resolve(&backend, &source, Path::new("photo.jpg"), 768)
            .unwrap();

        assert_eq!(resolved, Resolved::Hit(variant.clone()));
        assert_eq!(fs::read(&variant).unwrap(), b"old bytes");
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn fresh_variant_is_a_hit_with_watching() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(tmp.path(), "photo.jpg");
        let cache_root = tmp.path().join("cache");
        let variant = cache_root.join("480").join("photo.jpg");
        fs::create_dir_all(variant.parent().unwrap()).unwrap();
        fs::write(&variant, b"fresh bytes").unwrap();
        set_mtime(&source, SystemTime::now() - Duration::from_secs(3600));

        let backend = MockBackend::new();
        let resolved = store(&cache_root, true)
            .resolve(&backend, &source, Path::new("photo.jpg"), 480)
            .unwrap();

        assert_eq!(resolved, Resolved::Hit(variant));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn stale_variant_is_deleted_and_regenerated() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(tmp.path(), "photo.jpg");
        let cache_root = tmp.path().join("cache");
        let variant = cache_root.join("480").join("photo.jpg");
        fs::create_dir_all(variant.parent().unwrap()).unwrap();
        fs::write(&variant, b"stale bytes").unwrap();
        set_mtime(&variant, SystemTime::now() - Duration::from_secs(3600));

        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1000,
            height: 500,
        }]);
        let resolved = store(&cache_root, true)
            .resolve(&backend, &source, Path::new("photo.jpg"), 480)
            .unwrap();

        assert_eq!(resolved, Resolved::Generated(variant.clone()));
        assert_eq!(fs::read(&variant).unwrap(), b"variant 480x240");
        let variant_mtime = fs::metadata(&variant).unwrap().modified().unwrap();
        let source_mtime = fs::metadata(&source).unwrap().modified().unwrap();
        assert!(variant_mtime >= source_mtime);
    }

    #[test]
    fn small_source_is_served_unmodified_and_never_cached() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(tmp.path(), "small.jpg");
        let cache_root = tmp.path().join("cache");
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 400,
            height: 300,
        }]);

        let resolved = store(&cache_root, true)
            .resolve(&backend, &source, Path::new("small.jpg"), 480)
            .unwrap();

        assert_eq!(resolved, Resolved::Source);
        assert!(!cache_root.join("480").join("small.jpg").exists());
        // identify ran, render did not
        assert_eq!(backend.get_operations().len(), 1);
    }

    #[test]
    fn nested_source_paths_mirror_into_the_cache() {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("albums/travel");
        fs::create_dir_all(&album).unwrap();
        let source = write_source(&album, "tokyo.jpg");
        let cache_root = tmp.path().join("cache");
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 2000,
            height: 1000,
        }]);

        let resolved = store(&cache_root, true)
            .resolve(&backend, &source, Path::new("albums/travel/tokyo.jpg"), 992)
            .unwrap();

        assert_eq!(
            resolved,
            Resolved::Generated(cache_root.join("992/albums/travel/tokyo.jpg"))
        );
    }

    #[test]
    fn no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let source = write_source(tmp.path(), "photo.jpg");
        let cache_root = tmp.path().join("cache");
        let backend = MockBackend::with_dimensions(vec![Dimensions {
            width: 1000,
            height: 500,
        }]);

        store(&cache_root, true)
            .resolve(&backend, &source, Path::new("photo.jpg"), 768)
            .unwrap();

        let entries: Vec<_> = fs::read_dir(cache_root.join("768"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries, vec!["photo.jpg"]);
    }

    #[test]
    fn resolved_variant_accessor() {
        assert_eq!(
            Resolved::Hit(PathBuf::from("/a")).variant(),
            Some(Path::new("/a"))
        );
        assert_eq!(
            Resolved::Generated(PathBuf::from("/b")).variant(),
            Some(Path::new("/b"))
        );
        assert_eq!(Resolved::Source.variant(), None);
    }
}
