//! # Adaptive Images
//!
//! Server-side core for breakpoint-keyed responsive image delivery. Given a
//! logical image path and whatever width signal the client left behind (a
//! stored preference, or failing that a user-agent string), it picks one
//! breakpoint resolution, locates or generates the cached variant at that
//! resolution, and hands back a filesystem path ready to stream.
//!
//! # Architecture: One-Way Request Pipeline
//!
//! Every request flows through the same four stages, each owned by one module:
//!
//! ```text
//! 1. Signal      preference / signature  →  client width        (client)
//! 2. Selection   client width            →  breakpoint tier     (breakpoints)
//! 3. Cache       (source, tier)          →  variant path        (cache)
//! 4. Resample    miss / stale            →  encoded variant     (resample)
//! ```
//!
//! The [`serve`] module composes the stages; nothing flows backwards. The HTTP
//! transport (reading cookies, setting headers, streaming bytes) and the
//! diagnostic error-image renderer sit outside this crate — the core returns
//! paths, durations, and intents, never response objects.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`breakpoints`] | Ordered breakpoint tiers, smallest-tier-at-or-above-width selection |
//! | [`client`] | Width preference parsing, device-class inference, delivery policy |
//! | [`cache`] | Per-resolution disk cache: freshness checks, atomic variant publication |
//! | [`resample`] | Dimension planning and the actual decode → downscale → encode work |
//! | [`serve`] | Per-request orchestration and the failure surface for diagnostics |
//! | [`config`] | `adaptive-images.toml` loading, validation, stock config generation |
//! | [`warm`] | Batch pre-generation of every (image × breakpoint) variant |
//! | [`logging`] | Tracing subscriber setup for the CLI |
//!
//! # Design Decisions
//!
//! ## Time-Based Staleness, Path-Based Identity
//!
//! A cached variant is identified by `(source path, resolution)` and trusted
//! while its modification time is at or after the source's. No content hashes,
//! no manifest: the cache directory itself is the index, laid out as
//! `{cache_root}/{resolution}/{mirrored source path}` so existing caches stay
//! interoperable. Stale entries are deleted before regeneration — there is no
//! "known stale but retained" state.
//!
//! ## Atomic Variant Publication
//!
//! Two concurrent requests may race to generate the same variant. The cache
//! tolerates the duplicate work but never the torn result: variants are
//! encoded into a temporary sibling file and renamed over the final path, so
//! a concurrent reader sees either the old complete file or the new one.
//!
//! ## Formats Round-Trip the Source Extension
//!
//! A `.png` source caches as PNG, a `.gif` as GIF, and everything else as
//! JPEG at the configured quality. The variant keeps the source's file name,
//! so whatever content type the transport layer inferred for the original
//! stays correct for the variant.
//!
//! ## Never Upscale
//!
//! A source already at or below the selected width is served as-is and no
//! cache entry is written. Downscales use Lanczos3 resampling — visual
//! quality is the reason this system exists, so a cheap filter would defeat
//! the point.
//!
//! ## Pluggable Device Classification
//!
//! Substring-matching a user agent is fragile by nature, so the heuristic
//! lives behind [`client::DeviceClassifier`] and can be swapped without
//! touching the orchestrator.

pub mod breakpoints;
pub mod cache;
pub mod client;
pub mod config;
pub mod logging;
pub mod resample;
pub mod serve;
pub mod warm;
