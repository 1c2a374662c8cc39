//! Computer keyboard to button mapping.

/// Default layout: the number row, `'1'` is button 0.
pub const DEFAULT_LAYOUT: &str = "12345678";

/// Maps typed characters to button indices by position in a layout string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyboardMap {
    layout: Vec<char>,
}

impl KeyboardMap {
    pub fn new(layout: &str) -> Self {
        Self {
            layout: layout.chars().collect(),
        }
    }

    pub fn button(&self, c: char) -> Option<usize> {
        self.layout.iter().position(|&k| k == c)
    }

    pub fn num_buttons(&self) -> usize {
        self.layout.len()
    }
}

impl Default for KeyboardMap {
    fn default() -> Self {
        Self::new(DEFAULT_LAYOUT)
    }
}
