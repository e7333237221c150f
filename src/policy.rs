//! Eviction policy selection.

use crate::error::Error;
use core::fmt;
use core::str::FromStr;

/// Which index supplies the victim when a full cache must make room.
///
/// Both indices are kept current regardless of the active policy, so the
/// policy can be changed at any time without touching stored entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionPolicy {
    /// Evict the least recently used entry.
    #[default]
    Lru,
    /// Evict the least frequently used entry, oldest first on ties.
    Lfu,
}

impl EvictionPolicy {
    /// Short upper-case name, also used as the metrics algorithm name.
    pub const fn as_str(self) -> &'static str {
        match self {
            EvictionPolicy::Lru => "LRU",
            EvictionPolicy::Lfu => "LFU",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EvictionPolicy {
    type Err = Error;

    /// Parses `lru` or `lfu`, ignoring ASCII case and surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("lru") {
            Ok(EvictionPolicy::Lru)
        } else if trimmed.eq_ignore_ascii_case("lfu") {
            Ok(EvictionPolicy::Lfu)
        } else {
            Err(Error::UnknownPolicy(s.into()))
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("lru".parse(), Ok(EvictionPolicy::Lru));
        assert_eq!("LFU".parse(), Ok(EvictionPolicy::Lfu));
        assert_eq!(" Lfu\n".parse(), Ok(EvictionPolicy::Lfu));
    }

    #[test]
    fn test_parse_rejects_unknown_names() {
        let err = "arc".parse::<EvictionPolicy>().unwrap_err();
        assert_eq!(err, Error::UnknownPolicy("arc".into()));
        assert_eq!(
            err.to_string(),
            "unknown eviction policy `arc`, expected `lru` or `lfu`"
        );
    }

    #[test]
    fn test_display_round_trips() {
        for policy in [EvictionPolicy::Lru, EvictionPolicy::Lfu] {
            assert_eq!(policy.to_string().parse(), Ok(policy));
        }
        assert_eq!(EvictionPolicy::default(), EvictionPolicy::Lru);
    }
}
