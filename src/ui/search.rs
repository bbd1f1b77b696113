use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

/// Single-line search field.
#[derive(Default)]
pub struct SearchBox {
    input: Input,
}

impl SearchBox {
    pub fn new(initial: &str) -> Self {
        Self {
            input: Input::new(initial.to_string()),
        }
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    /// Returns true when the key changed the text, not just the cursor.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        self.input
            .handle_event(&Event::Key(key))
            .map(|change| change.value)
            .unwrap_or(false)
    }
}
