//! Incremental score entry: left-to-right digits, backspace, commit.

/// One score field of a session, modelled so an uncommitted score cannot reach
/// confirmation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ScoreField {
    /// No digit entered yet.
    #[default]
    Unset,
    /// Digits entered, not yet committed.
    Entering(u32),
    /// Frozen final value.
    Committed(u32),
}

impl ScoreField {
    /// Append a decimal digit. An unset or zero field becomes the digit
    /// itself; otherwise the value shifts left. Saturates instead of
    /// overflowing on absurdly long entries. Committed fields ignore digits.
    pub fn push_digit(&mut self, digit: u8) {
        let digit = u32::from(digit.min(9));
        *self = match *self {
            ScoreField::Unset | ScoreField::Entering(0) => ScoreField::Entering(digit),
            ScoreField::Entering(value) => ScoreField::Entering(
                value
                    .checked_mul(10)
                    .and_then(|shifted| shifted.checked_add(digit))
                    .unwrap_or(value),
            ),
            committed @ ScoreField::Committed(_) => committed,
        };
    }

    /// Drop the last entered digit. No-op on unset, zero, or committed fields.
    pub fn delete_digit(&mut self) {
        if let ScoreField::Entering(value) = *self {
            *self = ScoreField::Entering(value / 10);
        }
    }

    /// Freeze the field; an unset field commits as 0. Returns the final value.
    pub fn commit(&mut self) -> u32 {
        let value = match *self {
            ScoreField::Unset => 0,
            ScoreField::Entering(value) | ScoreField::Committed(value) => value,
        };
        *self = ScoreField::Committed(value);
        value
    }

    /// Value shown on the keypad while entering, if any digit was pressed.
    pub fn entered(&self) -> Option<u32> {
        match *self {
            ScoreField::Unset => None,
            ScoreField::Entering(value) | ScoreField::Committed(value) => Some(value),
        }
    }

    /// Final value once committed.
    pub fn committed(&self) -> Option<u32> {
        match *self {
            ScoreField::Committed(value) => Some(value),
            _ => None,
        }
    }
}
