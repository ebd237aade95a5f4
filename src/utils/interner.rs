//! Global String Interner
//!
//! Provides a high-performance string interning service that maps strings
//! to compact integer Symbols for comparison and hashing. Scope names pass
//! through here on every `push_event` call, so interning keeps the
//! profiler's per-scope cost independent of name length.

use lasso::{Spur, ThreadedRodeo};
use once_cell::sync::Lazy;

/// Global interner instance.
static INTERNER: Lazy<ThreadedRodeo> = Lazy::new(ThreadedRodeo::new);

/// Symbol type alias.
///
/// A Symbol is a compact integer identifier that supports cheap comparison
/// and hashing.
pub type Symbol = Spur;

/// Interns a string and returns its Symbol.
///
/// If the string is already present in the intern pool, the existing
/// Symbol is returned; otherwise the string is added first.
#[inline]
#[must_use]
pub fn intern(s: &str) -> Symbol {
    INTERNER.get_or_intern(s)
}

/// Looks up the Symbol of an already-interned string.
///
/// Returns `None` if the string has never been interned. Never allocates.
#[inline]
#[must_use]
pub fn get(s: &str) -> Option<Symbol> {
    INTERNER.get(s)
}

/// Resolves a Symbol back to its string.
///
/// # Panics
/// Panics if the Symbol is invalid (cannot happen for Symbols produced by
/// [`intern`]).
#[inline]
#[must_use]
pub fn resolve(sym: Symbol) -> &'static str {
    INTERNER.resolve(&sym)
}

/// Pre-interns the well-known GPU stat names.
///
/// Called once during renderer start-up so the steady-state frame loop
/// never takes the interner's write path for the built-in passes.
pub fn preload_common_stats() {
    let common = [
        // Scene passes
        "Prepass",
        "Shadows",
        "Opaque",
        "Transparent",
        "Skybox",
        // Post-processing
        "Bloom",
        "Fxaa",
        "ToneMapping",
        // Compute
        "Cull",
        "IblCompute",
        "MipmapGen",
        // Compositing
        "Ui",
        "Present",
    ];

    for name in common {
        INTERNER.get_or_intern_static(name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_stable() {
        let a = intern("Opaque");
        let b = intern("Opaque");
        assert_eq!(a, b);
        assert_eq!(resolve(a), "Opaque");
    }

    #[test]
    fn get_does_not_intern() {
        assert!(get("NeverInternedStatName_XYZ").is_none());
        let sym = intern("NowInterned");
        assert_eq!(get("NowInterned"), Some(sym));
    }

    #[test]
    fn preload_makes_names_resolvable() {
        preload_common_stats();
        assert!(get("Shadows").is_some());
        assert!(get("Bloom").is_some());
    }
}
