//! Browser capability model.
//!
//! # Data Flow
//! ```text
//! User-Agent header
//!     → classifier.rs (browser family + version → feature bits)
//!     → Capability (bitmask)
//!     → build::registry (containment check against each build's requirements)
//! ```
//!
//! # Design Decisions
//! - A capability set is a plain bitmask; matching is bit containment only
//! - Population count ranks builds, it never decides a match
//! - The empty mask is a valid requirement set and serves every client

pub mod classifier;

pub use classifier::{CachingClassifier, Classifier, UserAgentClassifier};

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

/// A set of browser features, one bit per feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Capability(u32);

/// Config token for each known feature bit.
const TOKENS: &[(&str, Capability)] = &[
    ("es2015", Capability::ES2015),
    ("push", Capability::PUSH),
    ("serviceworker", Capability::SERVICE_WORKER),
    ("modules", Capability::MODULES),
];

impl Capability {
    /// No special requirements.
    pub const NONE: Capability = Capability(0);
    /// ECMAScript 2015 syntax.
    pub const ES2015: Capability = Capability(1 << 0);
    /// Usable HTTP/2 server push.
    pub const PUSH: Capability = Capability(1 << 1);
    /// Service worker registration.
    pub const SERVICE_WORKER: Capability = Capability(1 << 2);
    /// `<script type="module">`.
    pub const MODULES: Capability = Capability(1 << 3);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Number of features in the set. Used for ranking builds only.
    pub const fn size(self) -> u32 {
        self.0.count_ones()
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns true if every bit of `required` is also set in `self`.
    pub const fn contains(self, required: Capability) -> bool {
        self.0 & required.0 == required.0
    }

    /// Look up a single config token such as `"es2015"`.
    pub fn from_token(token: &str) -> Option<Capability> {
        TOKENS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(token))
            .map(|(_, cap)| *cap)
    }

    /// Translate a list of declared tokens into a mask.
    ///
    /// Unknown tokens contribute nothing and are logged.
    pub fn from_tokens<I, S>(tokens: I) -> Capability
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        tokens.into_iter().fold(Capability::NONE, |mask, token| {
            let token = token.as_ref();
            match Capability::from_token(token) {
                Some(cap) => mask | cap,
                None => {
                    tracing::warn!(token = %token, "Unknown browser capability; ignoring");
                    mask
                }
            }
        })
    }
}

impl BitOr for Capability {
    type Output = Capability;

    fn bitor(self, rhs: Capability) -> Capability {
        Capability(self.0 | rhs.0)
    }
}

impl BitOrAssign for Capability {
    fn bitor_assign(&mut self, rhs: Capability) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Capability {
    type Output = Capability;

    fn bitand(self, rhs: Capability) -> Capability {
        Capability(self.0 & rhs.0)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for (name, cap) in TOKENS {
            if self.contains(*cap) {
                if !first {
                    write!(f, "|")?;
                }
                write!(f, "{}", name)?;
                first = false;
            }
        }
        let unknown = self.0 & !TOKENS.iter().fold(0, |acc, (_, cap)| acc | cap.0);
        if unknown != 0 {
            if !first {
                write!(f, "|")?;
            }
            write!(f, "{:#x}", unknown)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_containment_law() {
        for client in 0u32..16 {
            for required in 0u32..16 {
                let c = Capability::from_bits(client);
                let r = Capability::from_bits(required);
                assert_eq!(c.contains(r), (client & required) == required);
            }
            assert!(Capability::from_bits(client).contains(Capability::NONE));
        }
    }

    #[test]
    fn test_size_is_popcount() {
        assert_eq!(Capability::NONE.size(), 0);
        assert_eq!((Capability::ES2015 | Capability::MODULES).size(), 2);
        assert_eq!(Capability::from_bits(0b1011).size(), 3);
    }

    #[test]
    fn test_from_tokens() {
        let mask = Capability::from_tokens(["es2015", "push", "bogus"]);
        assert_eq!(mask, Capability::ES2015 | Capability::PUSH);
        assert_eq!(Capability::from_tokens(Vec::<String>::new()), Capability::NONE);
        assert_eq!(Capability::from_token("ServiceWorker"), Some(Capability::SERVICE_WORKER));
    }

    #[test]
    fn test_display() {
        assert_eq!(Capability::NONE.to_string(), "none");
        assert_eq!((Capability::ES2015 | Capability::MODULES).to_string(), "es2015|modules");
        assert_eq!(Capability::from_bits(1 << 8).to_string(), "0x100");
    }
}
