//! Variation allocation: server-pre-resolved pass-through, or client-side
//! weighted random selection with persisted stickiness.

pub mod engine;
pub mod store;

pub use engine::{
    AllocationEngine, DrawSource, FixedDraw, RandomDraw, VisitorIdentity, MAX_ALLOCATION,
};
pub use store::{AllocationKey, AllocationStore, InMemoryAllocationStore};
