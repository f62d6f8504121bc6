//! Layer 0: Time primitives
//!
//! Wall-clock milliseconds are the only ordering primitive: this is a pure
//! LWW design, so stamps from different replicas are compared directly and
//! the larger one wins. No hybrid or logical clock here; roughly
//! synchronized clocks are an assumption of the model.

use serde::{Deserialize, Serialize};

/// Wall-clock stamp in milliseconds since the Unix epoch.
///
/// Signed so [`WallClock::MIN`] can act as the "no record" sentinel in
/// max-based joins. Copy is fine - it's just a measurement, not causality.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct WallClock(pub i64);

impl WallClock {
    /// Sentinel that compares below every stamp a clock can produce.
    pub const MIN: WallClock = WallClock(i64::MIN);

    pub fn now() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as i64;
        Self(ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_follows_millis() {
        assert!(WallClock(5) < WallClock(6));
        assert_eq!(WallClock(5).max(WallClock(6)), WallClock(6));
        assert_eq!(WallClock(7).max(WallClock(7)), WallClock(7));
    }

    #[test]
    fn min_is_below_any_stamp() {
        assert!(WallClock::MIN < WallClock(i64::MIN + 1));
        assert!(WallClock::MIN < WallClock(0));
        assert!(WallClock::MIN < WallClock::now());
    }
}
