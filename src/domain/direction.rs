//! Relay direction between the two configured chains.

use std::fmt;

/// Which way a message travels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Emitted on the source chain, delivered to the destination chain.
    Forward,
    /// Emitted on the destination chain, delivered back to the source chain.
    Reverse,
}

impl Direction {
    /// Stable label used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forward => "forward",
            Self::Reverse => "reverse",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
