//! 状态层
//!
//! 集合的唯一权威状态。只有纯状态变换，不做 I/O。

pub mod collection;

pub use collection::{BlockReason, CollectionState, DocumentTicket};
