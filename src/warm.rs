//! Cache pre-warming: generate every breakpoint variant ahead of traffic.
//!
//! Walks the source tree for decodable images and resolves each
//! `(image × breakpoint)` pair through the same cache store the request path
//! uses, so a warmed cache is byte-identical to one grown organically.
//! Encoding dominates the cost, so the flattened job list runs across a
//! rayon pool.

use crate::cache::{CacheStore, Resolved};
use crate::config::{ConfigError, ServerConfig};
use crate::resample::{Quality, ResampleBackend, RustBackend, supported_source_extensions};
use rayon::prelude::*;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Summary of one warming run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WarmStats {
    /// Variants rendered on this run.
    pub generated: u32,
    /// Variants already present and fresh.
    pub cached: u32,
    /// Pairs where the source is at or below the tier width (nothing to do).
    pub skipped: u32,
    /// Pairs that failed to decode, encode, or write.
    pub failed: u32,
}

impl WarmStats {
    pub fn total(&self) -> u32 {
        self.generated + self.cached + self.skipped + self.failed
    }
}

impl fmt::Display for WarmStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} generated, {} cached, {} skipped, {} failed ({} total)",
            self.generated,
            self.cached,
            self.skipped,
            self.failed,
            self.total()
        )
    }
}

/// Warm the cache with the production backend.
pub fn warm(config: &ServerConfig) -> Result<WarmStats, ConfigError> {
    warm_with_backend(&RustBackend::new(), config)
}

/// Warm the cache using a specific backend (allows testing with a mock).
pub fn warm_with_backend(
    backend: &impl ResampleBackend,
    config: &ServerConfig,
) -> Result<WarmStats, ConfigError> {
    config.validate()?;
    let breakpoints = config.breakpoint_set()?;
    let cache = CacheStore::new(
        &config.cache_root,
        config.watch_cache,
        Quality::new(config.jpeg_quality),
    );
    let source_root = Path::new(&config.source_root);
    let cache_root = Path::new(&config.cache_root);

    let sources = discover_sources(source_root, cache_root);
    let jobs: Vec<(&PathBuf, u32)> = sources
        .iter()
        .flat_map(|source| breakpoints.tiers().iter().map(move |&tier| (source, tier)))
        .collect();

    let outcomes: Vec<Outcome> = jobs
        .par_iter()
        .map(|&(source, tier)| {
            let rel = source.strip_prefix(source_root).unwrap_or(source.as_path());
            match cache.resolve(backend, source, rel, tier) {
                Ok(Resolved::Generated(_)) => Outcome::Generated,
                Ok(Resolved::Hit(_)) => Outcome::Cached,
                Ok(Resolved::Source) => Outcome::Skipped,
                Err(e) => {
                    warn!(source = %source.display(), tier, error = %e, "warm failed");
                    Outcome::Failed
                }
            }
        })
        .collect();

    let mut stats = WarmStats::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Generated => stats.generated += 1,
            Outcome::Cached => stats.cached += 1,
            Outcome::Skipped => stats.skipped += 1,
            Outcome::Failed => stats.failed += 1,
        }
    }
    Ok(stats)
}

enum Outcome {
    Generated,
    Cached,
    Skipped,
    Failed,
}

/// All decodable images under the source root, skipping the cache tree when
/// it is nested inside the source root.
fn discover_sources(source_root: &Path, cache_root: &Path) -> Vec<PathBuf> {
    WalkDir::new(source_root)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| !path.starts_with(cache_root))
        .filter(|path| has_supported_extension(path))
        .collect()
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            supported_source_extensions()
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::fs;
    use tempfile::TempDir;

    fn write_image(path: &Path, width: u32, height: u32) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 64])
        });
        img.save(path).unwrap();
    }

    fn test_config(tmp: &TempDir, breakpoints: Vec<u32>) -> ServerConfig {
        ServerConfig {
            source_root: tmp.path().join("images").to_string_lossy().into_owned(),
            cache_root: tmp.path().join("cache").to_string_lossy().into_owned(),
            breakpoints,
            ..ServerConfig::default()
        }
    }

    #[test]
    fn warms_every_applicable_pair() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        write_image(&images.join("wide.png"), 300, 200);
        write_image(&images.join("albums/narrow.jpg"), 150, 100);
        fs::write(images.join("notes.txt"), "not an image").unwrap();

        let config = test_config(&tmp, vec![100, 200]);
        let stats = warm(&config).unwrap();

        // wide: both tiers; narrow: 100 only (150 < 200 skips).
        assert_eq!(stats.generated, 3);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 0);
        assert!(tmp.path().join("cache/100/wide.png").is_file());
        assert!(tmp.path().join("cache/200/wide.png").is_file());
        assert!(tmp.path().join("cache/100/albums/narrow.jpg").is_file());
        assert!(!tmp.path().join("cache/200/albums/narrow.jpg").exists());
    }

    #[test]
    fn second_run_reports_cached() {
        let tmp = TempDir::new().unwrap();
        write_image(&tmp.path().join("images/photo.jpg"), 300, 200);

        let config = test_config(&tmp, vec![100, 200]);
        warm(&config).unwrap();
        let stats = warm(&config).unwrap();

        assert_eq!(
            stats,
            WarmStats {
                generated: 0,
                cached: 2,
                skipped: 0,
                failed: 0
            }
        );
    }

    #[test]
    fn corrupt_source_counts_as_failed() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        fs::create_dir_all(&images).unwrap();
        fs::write(images.join("broken.jpg"), b"not a jpeg").unwrap();

        let config = test_config(&tmp, vec![100]);
        let stats = warm(&config).unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.generated, 0);
    }

    #[test]
    fn nested_cache_root_is_not_rewarmed() {
        let tmp = TempDir::new().unwrap();
        let images = tmp.path().join("images");
        write_image(&images.join("photo.jpg"), 300, 200);

        let config = ServerConfig {
            source_root: images.to_string_lossy().into_owned(),
            cache_root: images.join("ai-cache").to_string_lossy().into_owned(),
            breakpoints: vec![100],
            ..ServerConfig::default()
        };
        warm(&config).unwrap();
        let stats = warm(&config).unwrap();

        // The variant written under images/ai-cache must not become a source.
        assert_eq!(stats.total(), 1);
        assert_eq!(stats.cached, 1);
    }

    #[test]
    fn stats_display_reads_naturally() {
        let stats = WarmStats {
            generated: 3,
            cached: 2,
            skipped: 1,
            failed: 0,
        };
        assert_eq!(
            format!("{stats}"),
            "3 generated, 2 cached, 1 skipped, 0 failed (6 total)"
        );
    }
}
