/// Index of the question currently on screen, bounded to `[0, len - 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationCursor {
    index: usize,
    len: usize,
}

impl NavigationCursor {
    /// `len` must be at least 1; the session validates that before building one.
    pub fn new(len: usize) -> Self {
        Self {
            index: 0,
            len: len.max(1),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn count(&self) -> usize {
        self.len
    }

    pub fn last(&self) -> usize {
        self.len - 1
    }

    /// Moves to `index`. Anything outside `[0, last]` is ignored and the
    /// cursor stays where it is.
    pub fn go_to(&mut self, index: i64) -> usize {
        if let Ok(idx) = usize::try_from(index) {
            if idx < self.len {
                self.index = idx;
            }
        }
        self.index
    }

    pub fn next(&mut self) -> usize {
        self.go_to(self.index as i64 + 1)
    }

    pub fn previous(&mut self) -> usize {
        self.go_to(self.index as i64 - 1)
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index == self.last()
    }
}
