#![doc = include_str!("../README.md")]

//! Trace normalization and invariant verification for Trunkline.
//!
//! Every operation here is a pure function of its inputs. The only fallible
//! entry point is [`loader`]; invariant violations are reported as data.

pub mod audit;
pub mod diff;
pub mod geometry;
pub mod invariants;
pub mod loader;
pub mod moves;
pub mod normalizer;
pub mod report;
pub mod view;

pub use loader::{load_trace_str, load_trace_value, LoadError};
pub use normalizer::{normalize, EmptyMovesPolicy, NormalizeOptions, Normalizer};
