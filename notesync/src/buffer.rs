//! EditBuffer - the text the user currently sees
//!
//! Pure state holder. The session actor owns the only mutable reference;
//! the UI layer reaches it exclusively through session messages.

/// In-memory representation of the visible note text plus focus state
#[derive(Debug, Clone, Default)]
pub struct EditBuffer {
    text: String,
    focused: bool,
    dirty: bool,
}

impl EditBuffer {
    /// Buffer seeded from the document loaded at session open
    pub fn from_remote(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            focused: false,
            dirty: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn focused(&self) -> bool {
        self.focused
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// User edit: replace the text and mark the buffer dirty
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = true;
    }

    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    /// Engine-applied remote value (snapshot apply); clears the dirty marker
    pub fn apply_remote(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = false;
    }

    /// Confirmation that the current text was persisted
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Forcible reset after a failed write; clears the dirty marker so the
    /// session settles into a stable state instead of re-arming forever
    pub fn rollback(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edit_marks_dirty() {
        let mut buffer = EditBuffer::from_remote("hello");
        assert!(!buffer.dirty());

        buffer.set_text("hello world");
        assert!(buffer.dirty());
        assert_eq!(buffer.text(), "hello world");
    }

    #[test]
    fn test_apply_remote_clears_dirty() {
        let mut buffer = EditBuffer::from_remote("a");
        buffer.set_text("b");
        buffer.apply_remote("c");

        assert_eq!(buffer.text(), "c");
        assert!(!buffer.dirty());
    }

    #[test]
    fn test_rollback_restores_and_cleans() {
        let mut buffer = EditBuffer::from_remote("old");
        buffer.set_text("new");
        buffer.rollback("old");

        assert_eq!(buffer.text(), "old");
        assert!(!buffer.dirty());
    }

    #[test]
    fn test_focus_does_not_touch_dirty() {
        let mut buffer = EditBuffer::from_remote("x");
        buffer.set_focused(true);
        assert!(buffer.focused());
        assert!(!buffer.dirty());

        buffer.set_focused(false);
        assert!(!buffer.focused());
    }
}
