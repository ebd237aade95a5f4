//! Utility Module
//!
//! # String Interning
//!
//! The interner module provides efficient string storage for frequently
//! used identifiers like GPU stat names. Interned strings (Symbols) can
//! be compared in O(1) time, which keeps the per-scope overhead of the
//! profiler's hot path flat regardless of name length.
//!
//! ```rust,ignore
//! use vesper::utils::interner;
//!
//! let sym1 = interner::intern("Opaque");
//! let sym2 = interner::intern("Opaque");
//! assert_eq!(sym1, sym2); // O(1) comparison
//! ```

pub mod interner;

pub use interner::Symbol;
