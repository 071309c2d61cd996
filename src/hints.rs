use std::time::Duration;

use crate::kind::Kind;

pub const DEFAULT_CONNECTION: &str = "default";

/// Per-call options read by the accessor and the ranking board.
///
/// Nothing here is shared state; build one per call or keep one around and clone it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hints {
    /// Structure override. Only honored when the value's shape allows it.
    pub kind: Option<Kind>,
    /// First index of a ranged list or sorted-set read (default 0).
    pub start: Option<i64>,
    /// Last index, inclusive, of a ranged read (default -1, the end).
    pub stop: Option<i64>,
    /// Sorted-set read order (default `true`: highest score first).
    pub reverse: Option<bool>,
    /// Named connection to use (default `"default"`).
    pub connection: Option<String>,
    /// Deadline applied to every store round trip of the call.
    pub timeout: Option<Duration>,
}

impl Hints {
    pub fn new() -> Hints {
        Hints::default()
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn range(mut self, start: i64, stop: i64) -> Self {
        self.start = Some(start);
        self.stop = Some(stop);
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.reverse = Some(reverse);
        self
    }

    pub fn connection(mut self, name: impl Into<String>) -> Self {
        self.connection = Some(name.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn start_or_default(&self) -> i64 {
        self.start.unwrap_or(0)
    }

    pub fn stop_or_default(&self) -> i64 {
        self.stop.unwrap_or(-1)
    }

    pub fn reverse_or_default(&self) -> bool {
        self.reverse.unwrap_or(true)
    }

    pub fn connection_or_default(&self) -> &str {
        self.connection.as_deref().unwrap_or(DEFAULT_CONNECTION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let hints = Hints::new();
        assert_eq!(hints.start_or_default(), 0);
        assert_eq!(hints.stop_or_default(), -1);
        assert!(hints.reverse_or_default());
        assert_eq!(hints.connection_or_default(), "default");
    }

    #[test]
    fn builder() {
        let hints = Hints::new()
            .kind(Kind::List)
            .range(1, 3)
            .reverse(false)
            .connection("cache");

        assert_eq!(hints.kind, Some(Kind::List));
        assert_eq!((hints.start_or_default(), hints.stop_or_default()), (1, 3));
        assert!(!hints.reverse_or_default());
        assert_eq!(hints.connection_or_default(), "cache");
    }
}
