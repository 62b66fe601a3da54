//! Process-lifetime string arena.
//!
//! Path strings referenced by cache entries must stay valid for as long as any
//! concurrent reader might hold them, and entry churn during startup would
//! fragment a general-purpose allocator. Both problems go away with a
//! monotonic bump arena that is never freed: the arena is leaked at creation
//! and reclaimed only at process exit, so interned strings are `&'static str`
//! and no reader can ever observe freed memory.

use bumpalo::Bump;
use parking_lot::Mutex;

/// Monotonic arena for interning path strings.
///
/// Only obtainable in leaked form via [`StringArena::leaked`]; there is
/// deliberately no way to construct one with a shorter lifetime.
pub struct StringArena {
    bump: Mutex<Bump>,
}

impl StringArena {
    /// Create a process-lifetime arena.
    pub fn leaked() -> &'static StringArena {
        Box::leak(Box::new(StringArena {
            bump: Mutex::new(Bump::new()),
        }))
    }

    /// Copy `s` into the arena and return the interned string.
    pub fn intern(&'static self, s: &str) -> &'static str {
        let bump = self.bump.lock();
        let interned: &str = bump.alloc_str(s);
        // SAFETY: the arena is leaked (the only constructor returns
        // `&'static Self`), the `Bump` never moves out from behind it, and
        // bump allocations are stable and never individually freed. The
        // reference therefore remains valid for the life of the process,
        // beyond the lock guard's scope.
        unsafe { &*(interned as *const str) }
    }

    /// Total bytes handed out so far, for diagnostics.
    pub fn allocated_bytes(&self) -> usize {
        self.bump.lock().allocated_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intern_returns_equal_string() {
        let arena = StringArena::leaked();
        let s = arena.intern("textures/road_diffuse.dds");
        assert_eq!(s, "textures/road_diffuse.dds");
    }

    #[test]
    fn test_interned_strings_are_distinct_allocations() {
        let arena = StringArena::leaked();
        let a = arena.intern("same");
        let b = arena.intern("same");
        // No deduplication; two inserts mean two allocations.
        assert_ne!(a.as_ptr(), b.as_ptr());
        assert_eq!(a, b);
    }

    #[test]
    fn test_survives_many_inserts() {
        let arena = StringArena::leaked();
        let first = arena.intern("first");
        for i in 0..10_000 {
            arena.intern(&format!("path/{i}.dds"));
        }
        // Earlier allocations stay valid while the arena grows.
        assert_eq!(first, "first");
        assert!(arena.allocated_bytes() > 0);
    }

    #[test]
    fn test_concurrent_intern() {
        let arena = StringArena::leaked();
        std::thread::scope(|scope| {
            for t in 0..4 {
                scope.spawn(move || {
                    for i in 0..1_000 {
                        let s = arena.intern(&format!("t{t}/{i}"));
                        assert_eq!(s, format!("t{t}/{i}"));
                    }
                });
            }
        });
    }
}
