//! Request sequencing
//!
//! Each load takes a token before awaiting; when the response arrives the
//! token is compared against the latest one issued and stale results are
//! dropped.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifier of one issued load
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Monotonic token issuer
#[derive(Debug, Default)]
pub struct RequestSequence {
    latest: AtomicU64,
}

impl RequestSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token newer than every previous one
    pub fn next(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Whether no newer token has been issued since `token`
    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::Acquire) == token.0
    }

    /// Invalidate every outstanding token
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let seq = RequestSequence::new();
        let a = seq.next();
        let b = seq.next();
        assert!(b > a);
        assert!(!seq.is_latest(a));
        assert!(seq.is_latest(b));
    }

    #[test]
    fn test_cancel_all_invalidates_latest() {
        let seq = RequestSequence::new();
        let t = seq.next();
        seq.cancel_all();
        assert!(!seq.is_latest(t));
        assert!(seq.is_latest(seq.next()));
    }
}
