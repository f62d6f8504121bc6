//! Layer 1: CRDT trait
//!
//! The fundamental merge primitive for replicated state.

/// A Conflict-Free Replicated Data Type.
///
/// CRDTs support merging concurrent updates deterministically.
///
/// Properties:
/// - Commutative: join(a, b) == join(b, a)
/// - Associative: join(join(a, b), c) == join(a, join(b, c))
/// - Idempotent: join(a, a) == a
pub trait Crdt: Sized {
    /// Merge two states into a new state that includes information from both.
    ///
    /// Neither input is mutated.
    fn join(&self, other: &Self) -> Self;
}

#[cfg(test)]
pub(crate) mod laws {
    use super::*;
    use std::fmt::Debug;

    /// verify CRDT laws: associativity, commutativity, idempotence.
    pub fn check_join_laws<T: Crdt + PartialEq + Clone + Debug>(a: T, b: T, c: T) {
        // Idempotence
        assert_eq!(a.join(&a), a, "idempotence failed for {a:?}");
        assert_eq!(
            a.join(&b).join(&b),
            a.join(&b),
            "re-join idempotence failed for {a:?} and {b:?}"
        );

        // Commutativity
        assert_eq!(
            a.join(&b),
            b.join(&a),
            "commutativity failed for {a:?} and {b:?}"
        );

        // Associativity
        assert_eq!(
            a.join(&b).join(&c),
            a.join(&b.join(&c)),
            "associativity failed for {a:?}, {b:?}, {c:?}"
        );
    }
}
