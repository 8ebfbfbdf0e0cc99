#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TableId(pub u32);

/// A raw 32-bit transaction counter, as stamped on stored row versions.
///
/// The value is an opaque counter, not a sequence number: it wraps around,
/// and the engine passes it through without reinterpretation. Zero is the
/// reserved "not set" marker used for the deleter slot of live versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct TransactionId(pub u32);

impl TransactionId {
    /// Marker for "no deleting transaction": the version is live.
    pub const NONE: Self = Self(0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PageId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SlotId(pub u16);
