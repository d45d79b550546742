//! Mapping store and resolution
//!
//! Mappings are the user-authored rules binding effect conditions to
//! visual outcomes. The store holds the merged global + per-token rule
//! lists; resolution turns one token's active effect set plus a delta into
//! a single deterministic visual outcome.

mod resolve;
mod store;


pub use resolve::{
    CONTINUATION_MARKER, Resolution, ScriptBatch, ScriptCall, ScriptKind, resolve,
};
pub(crate) use resolve::mapping_fires;
pub use store::MappingStore;
