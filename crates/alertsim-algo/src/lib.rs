//! Cache replacement policies and the priority-forecast learner.
//!
//! The [`policy::CachePolicy`] sum type covers the four disciplines the
//! engine compares (recency-only, TTL/FIFO, priority+freshness, and
//! frequency-gated TinyLFU admission). [`forecast::PfModel`] is the online
//! logistic learner the PriorityFresh policy optionally composes for
//! eviction boosts and the engine consults for push gating.

pub mod forecast;
pub mod policy;

pub use forecast::{PfHyper, PfModel, PfSample, PfScore, PfState, BASE_FEATURES};
pub use policy::{
    CachePolicy, LruPolicy, PolicyKind, PriorityFreshPolicy, ScoreWeights, TinyLfuPolicy,
    TtlOnlyPolicy,
};
