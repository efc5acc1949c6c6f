use std::fmt;

use crate::merge_frontier::HeapOrderKey;

/// Names of the on-disk columns, in order.
pub const FIELD_NAMES: [&str; 7] = [
    "timestamp",
    "key",
    "key_size",
    "value_size",
    "client_id",
    "operation",
    "ttl",
];

/// One access-trace record.
///
/// `source_index` is not part of the record format. It is stamped by the
/// `MergeFrontier` so the merger knows which source to refill after a pop.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub timestamp: u64,
    pub key: String,
    pub key_size: u32,
    pub value_size: u32,
    pub client_id: u64,
    pub operation: String,
    pub ttl: u64,
    pub source_index: usize,
}

impl Row {
    pub fn new(
        timestamp: u64,
        key: &str,
        key_size: u32,
        value_size: u32,
        client_id: u64,
        operation: &str,
        ttl: u64,
    ) -> Self {
        Self {
            timestamp,
            key: key.to_string(),
            key_size,
            value_size,
            client_id,
            operation: operation.to_string(),
            ttl,
            source_index: 0,
        }
    }
}

/// Serialized as the 7 comma-joined columns, without line terminator.
impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{},{}",
            self.timestamp,
            self.key,
            self.key_size,
            self.value_size,
            self.client_id,
            self.operation,
            self.ttl
        )
    }
}

/// Rows from different sources with the same timestamp are ordered by source index.
impl HeapOrderKey for Row {
    type Key = (u64, usize);

    fn key(&self) -> Self::Key {
        (self.timestamp, self.source_index)
    }
}
