//! User-Agent classification.
//!
//! # Responsibilities
//! - Turn a raw `User-Agent` string into a [`Capability`] mask
//! - Memoize results so repeated agents skip regex evaluation
//!
//! # Design Decisions
//! - Classification sits behind a trait so callers can inject their own
//! - Unknown browsers get the empty mask and fall through to fallback builds
//! - The memo is bounded and simply cleared when full

use dashmap::DashMap;
use regex::Regex;

use super::Capability;

/// Anything that can map a user agent to a capability mask.
pub trait Classifier: Send + Sync {
    fn classify(&self, user_agent: &str) -> Capability;
}

impl<F> Classifier for F
where
    F: Fn(&str) -> Capability + Send + Sync,
{
    fn classify(&self, user_agent: &str) -> Capability {
        self(user_agent)
    }
}

/// Minimum `(major, minor)` version per browser family for one feature.
type Support = &'static [(&'static str, u32, u32)];

const SUPPORT: &[(Capability, Support)] = &[
    (
        Capability::ES2015,
        &[
            ("Chrome", 49, 0),
            ("Chromium", 49, 0),
            ("OPR", 36, 0),
            ("Vivaldi", 1, 0),
            ("Mobile Safari", 10, 0),
            ("Safari", 10, 0),
            ("Edge", 14, 0),
            ("Firefox", 51, 0),
        ],
    ),
    (
        Capability::PUSH,
        &[
            ("Chrome", 41, 0),
            ("Chromium", 41, 0),
            ("OPR", 28, 0),
            ("Vivaldi", 1, 0),
            ("Mobile Safari", 12, 0),
            ("Safari", 12, 0),
            ("Edge", 15, 0),
            // Firefox accepts pushes but cannot cache them.
        ],
    ),
    (
        Capability::SERVICE_WORKER,
        &[
            ("Chrome", 45, 0),
            ("Chromium", 45, 0),
            ("OPR", 32, 0),
            ("Vivaldi", 1, 0),
            ("Mobile Safari", 11, 3),
            ("Safari", 11, 1),
            ("Edge", 17, 0),
            ("Firefox", 44, 0),
        ],
    ),
    (
        Capability::MODULES,
        &[
            ("Chrome", 61, 0),
            ("Chromium", 61, 0),
            ("OPR", 48, 0),
            ("Mobile Safari", 10, 3),
            ("Safari", 10, 1),
            ("Edge", 16, 0),
            ("Firefox", 60, 0),
        ],
    ),
];

/// Family patterns, most specific first: many agents also advertise `Chrome/`
/// or `Safari/`.
const FAMILIES: &[(&str, &str)] = &[
    ("Edge", r"Edge/(\d+)(?:\.(\d+))?"),
    ("Chrome", r"Edg(?:A|iOS)?/(\d+)(?:\.(\d+))?"),
    ("OPR", r"OPR/(\d+)(?:\.(\d+))?"),
    ("Vivaldi", r"Vivaldi/(\d+)(?:\.(\d+))?"),
    ("Chromium", r"Chromium/(\d+)(?:\.(\d+))?"),
    ("Chrome", r"Chrome/(\d+)(?:\.(\d+))?"),
    ("Firefox", r"Firefox/(\d+)(?:\.(\d+))?"),
    ("Mobile Safari", r"Version/(\d+)(?:\.(\d+))?.* Mobile/\S+ Safari/"),
    ("Safari", r"Version/(\d+)(?:\.(\d+))?.* Safari/"),
];

/// Detected browser family and version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserVersion {
    pub family: &'static str,
    pub major: u32,
    pub minor: u32,
}

/// Regex-based classifier covering the major evergreen browsers.
#[derive(Debug)]
pub struct UserAgentClassifier {
    families: Vec<(&'static str, Regex)>,
}

impl UserAgentClassifier {
    pub fn new() -> Self {
        let families = FAMILIES
            .iter()
            .filter_map(|(family, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((*family, re)),
                Err(e) => {
                    tracing::error!(family = %family, error = %e, "Invalid user agent pattern");
                    None
                }
            })
            .collect();
        Self { families }
    }

    /// Detect the browser family and version, if recognised.
    pub fn browser(&self, user_agent: &str) -> Option<BrowserVersion> {
        self.families.iter().find_map(|(family, re)| {
            let caps = re.captures(user_agent)?;
            let major = caps.get(1)?.as_str().parse().ok()?;
            let minor = caps
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(0);
            Some(BrowserVersion {
                family: *family,
                major,
                minor,
            })
        })
    }
}

impl Default for UserAgentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for UserAgentClassifier {
    fn classify(&self, user_agent: &str) -> Capability {
        let Some(browser) = self.browser(user_agent) else {
            return Capability::NONE;
        };

        SUPPORT
            .iter()
            .filter(|(_, support)| {
                support.iter().any(|(family, major, minor)| {
                    *family == browser.family && (browser.major, browser.minor) >= (*major, *minor)
                })
            })
            .fold(Capability::NONE, |mask, (cap, _)| mask | *cap)
    }
}

/// Memoizes another classifier by exact user agent string.
pub struct CachingClassifier<C> {
    inner: C,
    cache: DashMap<String, Capability>,
    capacity: usize,
}

impl<C: Classifier> CachingClassifier<C> {
    pub fn new(inner: C, capacity: usize) -> Self {
        Self {
            inner,
            cache: DashMap::new(),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

impl<C: Classifier> Classifier for CachingClassifier<C> {
    fn classify(&self, user_agent: &str) -> Capability {
        if let Some(cap) = self.cache.get(user_agent) {
            return *cap;
        }

        let cap = self.inner.classify(user_agent);
        if self.cache.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "User agent cache full; clearing");
            self.cache.clear();
        }
        self.cache.insert(user_agent.to_string(), cap);
        cap
    }
}
