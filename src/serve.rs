//! Per-request orchestration.
//!
//! [`ImageServer::serve`] walks one request through the whole pipeline:
//! resolve the client signal, pick a breakpoint, consult the cache,
//! regenerate on miss or staleness, and hand back a path the transport layer
//! can stream. Every failure folds into [`ServeError`] — the transport layer
//! passes its message to the diagnostic renderer instead of exposing a raw
//! fault.

use crate::breakpoints::BreakpointSet;
use crate::cache::{CacheError, CacheStore, Resolved};
use crate::client::{self, Delivery, DeviceClassifier, PreferenceIntent, SignatureClassifier};
use crate::config::{ConfigError, ServerConfig};
use crate::resample::{Quality, ResampleBackend, RustBackend};
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ServeError {
    #[error("Source image not found: {0}")]
    SourceNotFound(PathBuf),
    #[error("Invalid image path: {0}")]
    InvalidPath(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// One inbound request, as handed over by the transport layer.
#[derive(Debug, Clone)]
pub struct ServeRequest<'a> {
    /// Logical image path, relative to the configured source root.
    pub path: &'a str,
    /// Raw stored width preference, if the client sent one.
    pub preference: Option<&'a str>,
    /// Request signature used for device-class inference.
    pub signature: &'a str,
}

/// Successful outcome: what to stream and how to treat the preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeResponse {
    /// File to serve — a cached variant, or the source image itself.
    pub file: PathBuf,
    /// Suggested browser cache duration in seconds.
    pub cache_seconds: u64,
    /// Whether the transport layer should expire the stored preference.
    pub preference: PreferenceIntent,
}

/// The assembled pipeline. Construct once, serve many requests.
pub struct ImageServer<B, C> {
    config: ServerConfig,
    breakpoints: BreakpointSet,
    cache: CacheStore,
    backend: B,
    classifier: C,
}

impl ImageServer<RustBackend, SignatureClassifier> {
    /// Production server: pure Rust backend, signature-based classifier.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        Self::with_parts(config, RustBackend::new(), SignatureClassifier)
    }
}

impl<B: ResampleBackend, C: DeviceClassifier> ImageServer<B, C> {
    /// Assemble a server from explicit parts (testing, custom classifiers).
    pub fn with_parts(config: ServerConfig, backend: B, classifier: C) -> Result<Self, ConfigError> {
        config.validate()?;
        let breakpoints = config.breakpoint_set()?;
        let cache = CacheStore::new(
            &config.cache_root,
            config.watch_cache,
            Quality::new(config.jpeg_quality),
        );
        Ok(Self {
            config,
            breakpoints,
            cache,
            backend,
            classifier,
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Serve one request.
    pub fn serve(&self, request: &ServeRequest<'_>) -> Result<ServeResponse, ServeError> {
        let rel = sanitize(request.path)?;
        let source = Path::new(&self.config.source_root).join(&rel);
        if !source.is_file() {
            return Err(ServeError::SourceNotFound(source));
        }

        let (signal, intent) =
            client::resolve_signal(request.preference, request.signature, &self.classifier);
        let delivery = client::choose_delivery(
            &signal,
            &self.breakpoints,
            self.config.mobile_first,
            self.config.default_raw,
        );

        let file = match delivery {
            Delivery::Source => {
                debug!(source = %source.display(), "client wider than largest tier, serving raw");
                source
            }
            Delivery::Resolution(tier) => {
                match self.cache.resolve(&self.backend, &source, &rel, tier)? {
                    Resolved::Hit(path) | Resolved::Generated(path) => path,
                    Resolved::Source => source,
                }
            }
        };

        Ok(ServeResponse {
            file,
            cache_seconds: self.config.browser_cache_seconds,
            preference: intent,
        })
    }
}

/// Normalize a logical request path and keep it inside the source root.
///
/// Rejects empty paths and anything with parent or rooted components; the
/// transport layer hands over whatever the client asked for, so the core is
/// the place that refuses traversal.
fn sanitize(raw: &str) -> Result<PathBuf, ServeError> {
    let trimmed = raw.trim_start_matches('/');
    let mut clean = PathBuf::new();
    for component in Path::new(trimmed).components() {
        match component {
            Component::Normal(part) => clean.push(part),
            Component::CurDir => {}
            _ => return Err(ServeError::InvalidPath(raw.to_string())),
        }
    }
    if clean.as_os_str().is_empty() {
        return Err(ServeError::InvalidPath(raw.to_string()));
    }
    Ok(clean)
}
