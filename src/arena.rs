//! Bump arena backing one compilation.
//!
//! Uses bumpalo for fast bump allocation. Every datum the pipeline derives
//! from a source string (interned lexemes, AST nodes, decorated names, TAC
//! label names) is allocated here and released in one step when the arena
//! drops. No individual object is freed; lifetimes are uniform across a
//! compilation.
//!
//! Containers that do not outlive their stage (token vectors, scope stacks,
//! instruction lists) are ordinary owned `Vec`s whose payload lives in the
//! arena; dropping the arena still releases everything arena-resident.
//!
//! Callers wanting parallel compilations instantiate independent arenas;
//! nothing is shared.

use bumpalo::Bump;
use std::fmt;
use std::fmt::Write as _;

/// Region allocator with a lifetime equal to one compilation.
#[derive(Default)]
pub struct Arena {
    bump: Bump,
}

impl Arena {
    pub fn new() -> Self {
        Arena { bump: Bump::new() }
    }

    /// Pre-size the backing store for the expected working set.
    pub fn with_capacity(bytes: usize) -> Self {
        Arena {
            bump: Bump::with_capacity(bytes),
        }
    }

    /// Move `value` into the arena and return a shared reference to it.
    pub fn alloc<T>(&self, value: T) -> &T {
        self.bump.alloc(value)
    }

    /// Intern a string slice.
    pub fn alloc_str(&self, s: &str) -> &str {
        self.bump.alloc_str(s)
    }

    /// Copy a slice of `Copy` data into the arena.
    pub fn alloc_slice_copy<T: Copy>(&self, slice: &[T]) -> &[T] {
        self.bump.alloc_slice_copy(slice)
    }

    /// Format directly into an arena-resident string and return it.
    ///
    /// The backing buffer is a `bumpalo::collections::String` that doubles
    /// its capacity inside the arena on overflow; abandoned blocks are
    /// reclaimed when the arena drops. Used for decorated names and label
    /// names: `arena.alloc_format(format_args!("{}.{}", name, id))`.
    pub fn alloc_format(&self, args: fmt::Arguments<'_>) -> &str {
        let mut buf = bumpalo::collections::String::new_in(&self.bump);
        buf.write_fmt(args)
            .expect("a formatting trait implementation returned an error");
        buf.into_bump_str()
    }

    /// Reuse the backing store without releasing it.
    pub fn reset(&mut self) {
        self.bump.reset();
    }

    /// Bytes currently allocated, including block overhead.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.allocated_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_value() {
        let arena = Arena::new();
        let n = arena.alloc(42_i64);
        assert_eq!(*n, 42);
    }

    #[test]
    fn test_alloc_str_interns() {
        let arena = Arena::new();
        let s = arena.alloc_str("main");
        assert_eq!(s, "main");
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn test_alloc_slice_copy() {
        let arena = Arena::new();
        let slice = arena.alloc_slice_copy(&[1_u32, 2, 3]);
        assert_eq!(slice, &[1, 2, 3]);
    }

    #[test]
    fn test_alloc_format() {
        let arena = Arena::new();
        let decorated = arena.alloc_format(format_args!("{}.{}", "x", 3));
        assert_eq!(decorated, "x.3");
        let label = arena.alloc_format(format_args!("L{}", 0));
        assert_eq!(label, "L0");
    }

    #[test]
    fn test_reset_reuses_backing_store() {
        let mut arena = Arena::new();
        for i in 0..1000 {
            arena.alloc_format(format_args!("temporary.{}", i));
        }
        let before = arena.allocated_bytes();
        arena.reset();
        let after = arena.allocated_bytes();
        // Reset keeps the largest block but discards the rest.
        assert!(
            after < before,
            "arena should shrink after reset (before: {}, after: {})",
            before,
            after
        );
        // The arena is usable again after reset.
        assert_eq!(arena.alloc_str("again"), "again");
    }
}
