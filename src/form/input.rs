use std::sync::{Arc, RwLock};

use super::binding::{BoundValue, ErrorState, FormResult, read_lock, write_lock};
use super::validation::{EditAction, InputPolicy, Keystroke};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Validity {
    Untouched,
    Valid,
    Invalid,
}

/// Single-line editable control bound to one text cell. Keystrokes run
/// through the policy's pre-commit filter; focus loss runs the authoritative
/// check and drives the error slot and the visual error flag.
pub struct TextEntry {
    value: BoundValue<String>,
    error: ErrorState,
    policy: Box<dyn InputPolicy>,
    validity: Validity,
    error_flagged: bool,
}

impl TextEntry {
    pub fn new(value: BoundValue<String>, error: ErrorState, policy: Box<dyn InputPolicy>) -> Self {
        Self {
            value,
            error,
            policy,
            validity: Validity::Untouched,
            error_flagged: false,
        }
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }

    /// Whether the control is currently drawn in its error color.
    pub fn is_error_flagged(&self) -> bool {
        self.error_flagged
    }

    pub fn content(&self) -> FormResult<String> {
        self.value.get()
    }

    /// Proposes inserting `ch` at character `index`. Returns whether the edit
    /// was accepted; a rejected edit leaves the committed content untouched.
    pub fn insert_char(&mut self, index: usize, ch: char) -> FormResult<bool> {
        let current = self.value.get()?;
        let index = index.min(current.chars().count());
        let mut proposed: String = current.chars().take(index).collect();
        proposed.push(ch);
        proposed.extend(current.chars().skip(index));
        let keystroke = Keystroke {
            proposed: &proposed,
            ch,
            index,
            action: EditAction::Insert,
        };
        if !self.policy.validate_keystroke(keystroke) {
            return Ok(false);
        }
        self.value.set(proposed)?;
        Ok(true)
    }

    /// Proposes removing the character at `index`. Deleting past the end is a
    /// no-op that still counts as accepted.
    pub fn delete_char(&mut self, index: usize) -> FormResult<bool> {
        let current = self.value.get()?;
        let chars: Vec<char> = current.chars().collect();
        let Some(ch) = chars.get(index).copied() else {
            return Ok(true);
        };
        let proposed: String = chars
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != index)
            .map(|(_, ch)| *ch)
            .collect();
        let keystroke = Keystroke {
            proposed: &proposed,
            ch,
            index,
            action: EditAction::Delete,
        };
        if !self.policy.validate_keystroke(keystroke) {
            return Ok(false);
        }
        self.value.set(proposed)?;
        Ok(true)
    }

    /// Runs focus-loss validation against the committed content. Error state
    /// and the visual flag are cleared at the start of every pass.
    pub fn focus_lost(&mut self) -> FormResult<bool> {
        self.error.clear()?;
        self.error_flagged = false;
        let content = self.value.get()?;
        match self.policy.validate_focusout(&content) {
            Ok(()) => {
                self.validity = Validity::Valid;
                Ok(true)
            }
            Err(message) => {
                self.validity = Validity::Invalid;
                self.error.set(message)?;
                self.error_flagged = true;
                Ok(false)
            }
        }
    }

    /// Forces the focus-loss check without the control ever holding focus.
    pub fn trigger_focusout_validation(&mut self) -> FormResult<bool> {
        self.focus_lost()
    }

    pub(super) fn reset_validity(&mut self) -> FormResult<()> {
        self.validity = Validity::Untouched;
        self.error_flagged = false;
        self.error.clear()
    }
}

/// Multi-line text control with a two-way binding to its cell: writes through
/// the cell are mirrored into the control's displayed content.
pub struct TextArea {
    value: BoundValue<String>,
    error: ErrorState,
    display: Arc<RwLock<String>>,
}

impl TextArea {
    pub fn new(value: BoundValue<String>, error: ErrorState) -> FormResult<Self> {
        let display = Arc::new(RwLock::new(value.get()?));
        let mirror = display.clone();
        value.subscribe(move |next: &String| {
            if let Ok(mut content) = mirror.write() {
                *content = next.clone();
            }
        })?;
        Ok(Self {
            value,
            error,
            display,
        })
    }

    pub fn set_content(&mut self, content: impl Into<String>) -> FormResult<()> {
        self.value.set(content.into())
    }

    pub fn displayed_content(&self) -> FormResult<String> {
        Ok(read_lock(&self.display, "reading text area content")?.clone())
    }

    pub(super) fn reset_validity(&mut self) -> FormResult<()> {
        write_lock(&self.display, "resetting text area content")?.clear();
        self.error.clear()
    }
}

/// Boolean toggle; carries no validation.
pub struct Toggle {
    value: BoundValue<bool>,
    error: ErrorState,
}

impl Toggle {
    pub fn new(value: BoundValue<bool>, error: ErrorState) -> Self {
        Self { value, error }
    }

    pub fn set_checked(&mut self, checked: bool) -> FormResult<()> {
        self.value.set(checked)
    }

    pub fn is_checked(&self) -> FormResult<bool> {
        self.value.get()
    }

    pub(super) fn reset_validity(&mut self) -> FormResult<()> {
        self.error.clear()
    }
}

/// The concrete input variants a composite can instantiate.
pub enum InputControl {
    Entry(TextEntry),
    Area(TextArea),
    Toggle(Toggle),
}

impl InputControl {
    /// Forces focus-loss validation where the variant defines one; variants
    /// without a focus-loss check always count as valid.
    pub fn trigger_focusout_validation(&mut self) -> FormResult<bool> {
        match self {
            InputControl::Entry(entry) => entry.trigger_focusout_validation(),
            InputControl::Area(_) | InputControl::Toggle(_) => Ok(true),
        }
    }

    pub fn as_entry(&self) -> Option<&TextEntry> {
        match self {
            InputControl::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_entry_mut(&mut self) -> Option<&mut TextEntry> {
        match self {
            InputControl::Entry(entry) => Some(entry),
            _ => None,
        }
    }

    pub fn as_area(&self) -> Option<&TextArea> {
        match self {
            InputControl::Area(area) => Some(area),
            _ => None,
        }
    }

    pub fn as_toggle_mut(&mut self) -> Option<&mut Toggle> {
        match self {
            InputControl::Toggle(toggle) => Some(toggle),
            _ => None,
        }
    }

    pub(super) fn reset_validity(&mut self) -> FormResult<()> {
        match self {
            InputControl::Entry(entry) => entry.reset_validity(),
            InputControl::Area(area) => area.reset_validity(),
            InputControl::Toggle(toggle) => toggle.reset_validity(),
        }
    }
}
