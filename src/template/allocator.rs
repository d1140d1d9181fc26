//! Container-wide index counter

use std::collections::HashSet;

use tracing::trace;

use super::registry::{TemplateError, TemplateName};

/// Hands out strictly increasing indices to every template of one container
///
/// All templates of a container write into the same collection, so they
/// share a single counter. It starts at the largest registered start value
/// and only moves forward, so an index is never reused within one container,
/// even after removals and undos.
#[derive(Debug, Default)]
pub struct IndexAllocator {
    registered: HashSet<TemplateName>,
    next: u64,
    exhausted: bool,
}

impl IndexAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, raising the shared counter to at least `start`
    ///
    /// A second call for the same name is ignored.
    pub fn register(&mut self, name: TemplateName, start: u64) {
        if self.registered.insert(name) && start > self.next {
            self.next = start;
        }
    }

    /// Return the current index, then advance the shared counter
    pub fn next_index(&mut self, name: &TemplateName) -> Result<u64, TemplateError> {
        if !self.registered.contains(name) {
            return Err(TemplateError::NotFound { name: name.clone() });
        }
        if self.exhausted {
            return Err(TemplateError::IndexOverflow { name: name.clone() });
        }
        let index = self.next;
        match index.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
        trace!(index, "allocated index");
        Ok(index)
    }

    /// The index the next call to `next_index` would return
    pub fn peek(&self, name: &TemplateName) -> Option<u64> {
        if self.registered.contains(name) && !self.exhausted {
            Some(self.next)
        } else {
            None
        }
    }

    /// Move the counter past an index that is already in use
    pub fn observe(&mut self, name: &TemplateName, index: u64) {
        if !self.registered.contains(name) || self.exhausted || self.next > index {
            return;
        }
        match index.checked_add(1) {
            Some(next) => self.next = next,
            None => self.exhausted = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(name: &str) -> TemplateName {
        Some(name.to_string())
    }

    #[test]
    fn test_strictly_increasing() {
        let mut alloc = IndexAllocator::new();
        alloc.register(None, 7);
        let taken: Vec<_> = (0..4).map(|_| alloc.next_index(&None).unwrap()).collect();
        assert_eq!(taken, vec![7, 8, 9, 10]);
    }

    #[test]
    fn test_register_twice_keeps_counter() {
        let mut alloc = IndexAllocator::new();
        alloc.register(None, 5);
        alloc.next_index(&None).unwrap();
        alloc.register(None, 5);
        assert_eq!(alloc.peek(&None), Some(6));
    }

    #[test]
    fn test_names_share_one_counter() {
        let mut alloc = IndexAllocator::new();
        alloc.register(named("a"), 5);
        alloc.register(named("b"), 10);
        assert_eq!(alloc.next_index(&named("a")).unwrap(), 10);
        assert_eq!(alloc.next_index(&named("b")).unwrap(), 11);
        assert_eq!(alloc.next_index(&named("a")).unwrap(), 12);
        assert_eq!(alloc.peek(&named("b")), Some(13));
    }

    #[test]
    fn test_late_register_never_moves_back() {
        let mut alloc = IndexAllocator::new();
        alloc.register(named("a"), 8);
        alloc.next_index(&named("a")).unwrap();
        alloc.register(named("b"), 5);
        assert_eq!(alloc.next_index(&named("b")).unwrap(), 9);
    }

    #[test]
    fn test_unknown_name() {
        let mut alloc = IndexAllocator::new();
        alloc.register(named("a"), 5);
        assert!(matches!(
            alloc.next_index(&named("x")),
            Err(TemplateError::NotFound { .. })
        ));
    }

    #[test]
    fn test_observe_skips_past_used_index() {
        let mut alloc = IndexAllocator::new();
        alloc.register(None, 5);
        alloc.observe(&None, 3);
        assert_eq!(alloc.peek(&None), Some(5));
        alloc.observe(&None, 12);
        assert_eq!(alloc.next_index(&None).unwrap(), 13);
    }

    #[test]
    fn test_last_index_then_exhausted() {
        let mut alloc = IndexAllocator::new();
        alloc.register(None, u64::MAX - 1);
        assert_eq!(alloc.next_index(&None).unwrap(), u64::MAX - 1);
        assert_eq!(alloc.next_index(&None).unwrap(), u64::MAX);
        assert_eq!(
            alloc.next_index(&None),
            Err(TemplateError::IndexOverflow { name: None })
        );
        assert_eq!(alloc.peek(&None), None);
    }

    #[test]
    fn test_observe_at_max_exhausts() {
        let mut alloc = IndexAllocator::new();
        alloc.register(None, 5);
        alloc.observe(&None, u64::MAX);
        assert!(alloc.next_index(&None).is_err());
    }
}
