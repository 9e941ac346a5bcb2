use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%d.%m.%Y";

pub const MSG_VALUE_REQUIRED: &str = "A value is required";
pub const MSG_DATE_REQUIRED: &str = "Datum je potrebno vnesti";
pub const MSG_INVALID_INPUT: &str = "Nepravilen vnos";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EditAction {
    Insert,
    Delete,
}

/// One proposed single-character edit, handed to the keystroke filter before
/// the edit is committed.
#[derive(Clone, Copy, Debug)]
pub struct Keystroke<'a> {
    /// Content the control would hold if the edit were applied.
    pub proposed: &'a str,
    /// Character being inserted or removed.
    pub ch: char,
    /// Character index the edit affects.
    pub index: usize,
    pub action: EditAction,
}

/// Validation contract of one input variant: a best-effort keystroke mask and
/// the authoritative focus-loss check.
pub trait InputPolicy: Send + Sync {
    /// Pre-commit filter; returning `false` leaves the committed content
    /// unchanged. Accepts everything by default.
    fn validate_keystroke(&self, _keystroke: Keystroke<'_>) -> bool {
        true
    }

    /// Judges the committed content; the error carries the message shown in
    /// the field's error slot.
    fn validate_focusout(&self, content: &str) -> Result<(), String>;
}

/// Rejects an empty committed value.
pub struct RequiredText;

impl InputPolicy for RequiredText {
    fn validate_focusout(&self, content: &str) -> Result<(), String> {
        if content.is_empty() {
            Err(MSG_VALUE_REQUIRED.to_string())
        } else {
            Ok(())
        }
    }
}

/// Enforces the ten-character `DD.MM.YYYY` mask one keystroke at a time and
/// requires a real calendar date on focus loss.
pub struct DateText;

impl InputPolicy for DateText {
    fn validate_keystroke(&self, keystroke: Keystroke<'_>) -> bool {
        if keystroke.action == EditAction::Delete {
            return true;
        }
        match keystroke.index {
            0 | 1 | 3 | 4 | 6 | 7 | 8 | 9 => keystroke.ch.is_ascii_digit(),
            2 | 5 => keystroke.ch == '.',
            _ => false,
        }
    }

    fn validate_focusout(&self, content: &str) -> Result<(), String> {
        if content.is_empty() {
            return Err(MSG_DATE_REQUIRED.to_string());
        }
        match NaiveDate::parse_from_str(content, DATE_FORMAT) {
            Ok(_) => Ok(()),
            Err(_) => Err(MSG_INVALID_INPUT.to_string()),
        }
    }
}

/// No constraints at all; used for the free-form multi-line field.
pub struct FreeText;

impl InputPolicy for FreeText {
    fn validate_focusout(&self, _content: &str) -> Result<(), String> {
        Ok(())
    }
}
