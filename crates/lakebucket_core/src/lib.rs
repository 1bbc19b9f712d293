//! Deterministic hashing of values into partition buckets, and projection of
//! predicates onto bucket partitions.
pub mod expr;
pub mod hash;
pub mod parse;
pub mod transform;
pub mod types;
