//! A computed value together with the input it was computed from.

/// Cache slot with an explicit dirty bit.
///
/// The value is reused while the input compares equal to the snapshot and
/// nobody called [`invalidate`](Self::invalidate) since.
#[derive(Debug, Clone)]
pub struct Cached<I, T> {
    entry: Option<(I, T)>,
    dirty: bool,
}

impl<I, T> Default for Cached<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, T> Cached<I, T> {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entry: None,
            dirty: true,
        }
    }

    /// Mark the value stale; the next lookup recomputes.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// True if a lookup would recompute regardless of input.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The cached value if it is still valid.
    #[must_use]
    pub fn get(&self) -> Option<&T> {
        match &self.entry {
            Some((_, value)) if !self.dirty => Some(value),
            _ => None,
        }
    }
}

impl<I: PartialEq + Clone, T> Cached<I, T> {
    /// The value for `input`, recomputing with `compute` if the slot is
    /// dirty or was filled for a different input.
    pub fn get_or_update(&mut self, input: &I, compute: impl FnOnce(&I) -> T) -> &T {
        let fresh = !self.dirty && matches!(&self.entry, Some((snapshot, _)) if snapshot == input);
        if !fresh {
            self.entry = None;
            self.dirty = false;
        }
        &self
            .entry
            .get_or_insert_with(|| (input.clone(), compute(input)))
            .1
    }
}
