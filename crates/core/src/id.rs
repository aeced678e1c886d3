//! Unique identifiers for units of work.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for a unit of work node.
///
/// Every [`TaskState`](crate::TaskState) gets one at construction; it shows up
/// in log fields so a single run can be followed through a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UnitId(Ulid);

impl UnitId {
    /// Generate a new UnitId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for UnitId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UnitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for UnitId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_id_unique() {
        assert_ne!(UnitId::new(), UnitId::new());
    }

    #[test]
    fn test_unit_id_parse_roundtrip() {
        let id = UnitId::new();
        let parsed: UnitId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
