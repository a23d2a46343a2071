//! The typedef-name table: the side channel that lets a context-free C
//! grammar consume a context-sensitive token stream.
//!
//! When the grammar engine reduces `typedef int Foo;` it registers `Foo`
//! here; from that point on the tokenizer classifies `Foo` as a type-name
//! token instead of a plain identifier, so `Foo * x;` parses as a
//! declaration rather than a multiplication.

use rustc_hash::FxHashSet;

/// Set of identifier names introduced by `typedef` declarations.
///
/// Append-only for the duration of one parse: C does not permit
/// un-typedef-ing a name within a translation unit, so no removal
/// operation is exposed.  [`clear`] exists solely for session restart.
///
/// Block-scope shadowing is not modeled; a registered name stays a type
/// name for the rest of the file.
///
/// [`clear`]: TypedefTable::clear
#[derive(Debug, Default)]
pub struct TypedefTable {
    names: FxHashSet<String>,
}

impl TypedefTable {
    pub fn new() -> Self {
        Self {
            names: FxHashSet::default(),
        }
    }

    /// Whether `name` was previously registered.  Pure query; safe to call
    /// before any registration.
    pub fn is_type_name(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Insert `name`.  Registering the same name twice is not an error and
    /// leaves the set unchanged beyond the first insertion.
    pub fn register_type_name(&mut self, name: &str) {
        if !self.names.contains(name) {
            self.names.insert(name.to_owned());
        }
    }

    /// Remove all entries.  Only valid at session (re)start.
    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_table_answers_false() {
        let table = TypedefTable::new();
        assert!(!table.is_type_name("Foo"));
        assert!(!table.is_type_name(""));
    }

    #[test]
    fn test_register_then_query() {
        let mut table = TypedefTable::new();
        table.register_type_name("size_t");
        assert!(table.is_type_name("size_t"));
        assert!(!table.is_type_name("sizet"));
    }

    #[test]
    fn test_registration_order_is_irrelevant() {
        let mut forward = TypedefTable::new();
        forward.register_type_name("A");
        forward.register_type_name("B");
        forward.register_type_name("C");

        let mut backward = TypedefTable::new();
        backward.register_type_name("C");
        backward.register_type_name("B");
        backward.register_type_name("A");

        for name in ["A", "B", "C"] {
            assert!(forward.is_type_name(name));
            assert!(backward.is_type_name(name));
        }
        assert!(!forward.is_type_name("D"));
        assert!(!backward.is_type_name("D"));
    }

    #[test]
    fn test_duplicate_registration_is_idempotent() {
        let mut table = TypedefTable::new();
        table.register_type_name("Foo");
        table.register_type_name("Foo");
        assert!(table.is_type_name("Foo"));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_clear_removes_everything() {
        let mut table = TypedefTable::new();
        table.register_type_name("Foo");
        table.register_type_name("Bar");
        table.clear();
        assert!(table.is_empty());
        assert!(!table.is_type_name("Foo"));
        assert!(!table.is_type_name("Bar"));
    }
}
