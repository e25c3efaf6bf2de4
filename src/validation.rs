//! Input rules applied where a student form is submitted.
//!
//! The stores themselves accept any identifier; these checks live at the
//! request boundary.

use thiserror::Error;

pub const ID_LENGTH: usize = 14;
pub const ID_ERROR_MESSAGE: &str = "يجب أن يتكون رقم التعريف من 14 رقم";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", ID_ERROR_MESSAGE)]
pub struct InvalidStudentId {
    pub value: String,
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_digit() || c == 'X'
}

/// Per-keystroke cleanup: uppercase, keep digits and `X`, cap at 14 characters.
pub fn normalize_id_input(raw: &str) -> String {
    raw.to_uppercase()
        .chars()
        .filter(|c| is_id_char(*c))
        .take(ID_LENGTH)
        .collect()
}

pub fn validate_id(id: &str) -> Result<(), InvalidStudentId> {
    if id.chars().count() == ID_LENGTH && id.chars().all(is_id_char) {
        Ok(())
    } else {
        Err(InvalidStudentId {
            value: id.to_string(),
        })
    }
}

/// Bring a birth date into the stored `YYYY/MM/DD` form.
///
/// Accepts `DD/MM/YYYY`, `YYYY-MM-DD` and `YYYY/MM/DD`; anything else is
/// returned trimmed but otherwise untouched.
pub fn normalize_birth_date(raw: &str) -> String {
    let s = raw.trim();
    let parts: Vec<&str> = s.split(|c: char| c == '/' || c == '-').collect();
    let all_digits = |p: &str| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit());
    if parts.len() != 3 || !parts.iter().copied().all(all_digits) {
        return s.to_string();
    }

    match (parts[0].len(), parts[1].len(), parts[2].len()) {
        (4, 2, 2) => format!("{}/{}/{}", parts[0], parts[1], parts[2]),
        (2, 2, 4) if s.contains('/') => format!("{}/{}/{}", parts[2], parts[1], parts[0]),
        _ => s.to_string(),
    }
}
