//! Client width signal resolution and delivery policy.
//!
//! The client's width arrives one of two ways:
//!
//! 1. A **stored preference** — a cookie value the client set on a prior
//!    visit. Parses as a positive integer or it doesn't count; a malformed
//!    value is treated as absent and reported back as a
//!    [`PreferenceIntent::Clear`] so the transport layer can expire it.
//! 2. A **device-class inference** from the request signature (user agent),
//!    used only when no usable preference exists.
//!
//! Policy then turns the signal into a [`Delivery`]: a concrete breakpoint
//! resolution, or the raw source when the client out-sizes every tier and
//! `default_raw` allows it.
//!
//! Clearing the mangled preference is modeled as a returned intent rather
//! than a mutation — the core never touches transport state.

use crate::breakpoints::{BreakpointSet, Selection};

/// Desktop-OS substrings checked against the request signature.
const DESKTOP_OS_TOKENS: &[&str] = &["macintosh", "windows nt", "x11", "cros"];

/// Coarse device class inferred from the request signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Desktop,
    Mobile,
}

/// Classifies a request signature into a device class.
///
/// Substring sniffing is inherently fragile, so the heuristic sits behind
/// this trait; the orchestrator only sees the class.
pub trait DeviceClassifier: Sync {
    fn classify(&self, signature: &str) -> DeviceClass;
}

/// Default classifier: case-insensitive desktop-OS token match.
///
/// Anything that doesn't look like a desktop OS is treated as mobile — the
/// conservative direction, since mobile clients get the smaller default.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureClassifier;

impl DeviceClassifier for SignatureClassifier {
    fn classify(&self, signature: &str) -> DeviceClass {
        let signature = signature.to_ascii_lowercase();
        if DESKTOP_OS_TOKENS.iter().any(|t| signature.contains(t)) {
            DeviceClass::Desktop
        } else {
            DeviceClass::Mobile
        }
    }
}

/// What the transport layer should do with the stored preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceIntent {
    /// Preference was absent or usable; leave it alone.
    Keep,
    /// Preference was present but malformed; expire it.
    Clear,
}

/// Per-request width signal, derived once and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientSignal {
    /// Width from a usable stored preference, if any.
    pub width: Option<u32>,
    /// Whether the request signature looks desktop-class.
    pub desktop: bool,
}

/// Where the bytes for this request should come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Resize to (or serve the cached variant at) this breakpoint width.
    Resolution(u32),
    /// Serve the source image untouched.
    Source,
}

/// Parse a stored width preference.
///
/// Strictly a positive base-10 integer; anything else present (empty,
/// non-numeric, zero, trailing garbage) is malformed and yields
/// `(None, Clear)` so the bad value heals itself on the next response.
pub fn parse_preference(raw: Option<&str>) -> (Option<u32>, PreferenceIntent) {
    match raw {
        None => (None, PreferenceIntent::Keep),
        Some(value) => match value.parse::<u32>() {
            Ok(width) if width > 0 => (Some(width), PreferenceIntent::Keep),
            _ => (None, PreferenceIntent::Clear),
        },
    }
}

/// Derive the per-request signal from the preference and signature.
pub fn resolve_signal(
    preference: Option<&str>,
    signature: &str,
    classifier: &impl DeviceClassifier,
) -> (ClientSignal, PreferenceIntent) {
    let (width, intent) = parse_preference(preference);
    let desktop = classifier.classify(signature) == DeviceClass::Desktop;
    (ClientSignal { width, desktop }, intent)
}

/// Width to hand to breakpoint selection.
///
/// A stored preference always wins. Otherwise, `mobile_first` narrows the
/// default for inferred non-desktop clients to the smallest tier; desktop
/// clients (and everyone, when `mobile_first` is off) default to the largest.
pub fn decide_width(signal: &ClientSignal, tiers: &BreakpointSet, mobile_first: bool) -> u32 {
    if let Some(width) = signal.width {
        return width;
    }
    if mobile_first && !signal.desktop {
        tiers.min()
    } else {
        tiers.max()
    }
}

/// Apply selection plus the default-raw policy.
///
/// A client wider than the largest tier gets the raw source when
/// `default_raw` is on (avoids serving a variant narrower than the client's
/// true width), and the largest tier otherwise.
pub fn choose_delivery(
    signal: &ClientSignal,
    tiers: &BreakpointSet,
    mobile_first: bool,
    default_raw: bool,
) -> Delivery {
    let width = decide_width(signal, tiers, mobile_first);
    match tiers.select(width) {
        Selection::Tier(tier) => Delivery::Resolution(tier),
        Selection::Source if default_raw => Delivery::Source,
        Selection::Source => Delivery::Resolution(tiers.max()),
    }
}
