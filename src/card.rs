//! Per-card UI state: image gallery stepping and optimistic toggles.

/// Index into a listing's images, always within `[0, len - 1]`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Gallery {
    active: usize,
    len: usize,
}

impl Gallery {
    pub fn new(len: usize) -> Self {
        Self { active: 0, len }
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn can_next(&self) -> bool {
        self.len > 1 && self.active + 1 < self.len
    }

    pub fn can_back(&self) -> bool {
        self.len > 1 && self.active > 0
    }

    /// Step forward. Returns whether the index moved.
    pub fn next(&mut self) -> bool {
        if !self.can_next() {
            return false;
        }
        self.active += 1;
        true
    }

    /// Step back. Returns whether the index moved.
    pub fn back(&mut self) -> bool {
        if !self.can_back() {
            return false;
        }
        self.active -= 1;
        true
    }

    /// Jump to an image, clamping out-of-range indices.
    pub fn select(&mut self, index: usize) {
        self.active = index.min(self.len.saturating_sub(1));
    }

    /// Adopt a new image count, e.g. after the listing was edited.
    pub fn resize(&mut self, len: usize) {
        self.len = len;
        self.select(self.active);
    }
}

/// A local change applied before the server confirmed it.
///
/// `settle` yields the value the caller should keep: the proposed one when
/// the confirmation succeeded, the previous one otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pending<T> {
    previous: T,
    proposed: T,
}

impl<T: Clone> Pending<T> {
    pub fn new(previous: T, proposed: T) -> Self {
        Self { previous, proposed }
    }

    pub fn previous(&self) -> &T {
        &self.previous
    }

    pub fn proposed(&self) -> &T {
        &self.proposed
    }

    pub fn settle<R, E>(self, outcome: &Result<R, E>) -> T {
        match outcome {
            Ok(_) => self.proposed,
            Err(_) => self.previous,
        }
    }
}

impl Pending<bool> {
    /// Tentatively flip a boolean.
    pub fn flip(previous: bool) -> Self {
        Self::new(previous, !previous)
    }
}
