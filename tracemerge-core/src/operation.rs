use strum::{Display, EnumString};

/// Reads and deletes.
pub const DEFAULT_OPERATIONS: [&str; 3] = ["get", "gets", "delete"];

/// Mutations, accepted only with `FilterPolicy::IncludeWrites`.
pub const WRITE_OPERATIONS: [&str; 8] = [
    "set", "cas", "add", "replace", "incr", "decr", "prepend", "append",
];

/// Which operation class passes the filter.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum FilterPolicy {
    /// `get`, `gets`, `delete`.
    #[default]
    Default,

    /// `Default` plus every operation in `WRITE_OPERATIONS`.
    IncludeWrites,
}

impl FilterPolicy {
    pub fn from_include_writes(include_writes: bool) -> Self {
        if include_writes {
            FilterPolicy::IncludeWrites
        } else {
            FilterPolicy::Default
        }
    }

    #[inline]
    pub fn accepts(&self, op: &str) -> bool {
        accepts(op, *self)
    }
}

/// Whether a row with operation `op` is kept under `policy`.
///
/// Matching is exact and case sensitive, unknown operations are rejected.
#[inline]
pub fn accepts(op: &str, policy: FilterPolicy) -> bool {
    if DEFAULT_OPERATIONS.contains(&op) {
        return true;
    }

    match policy {
        FilterPolicy::Default => false,
        FilterPolicy::IncludeWrites => WRITE_OPERATIONS.contains(&op),
    }
}
