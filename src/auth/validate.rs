use lazy_static::lazy_static;
use regex::Regex;

use crate::error::FieldError;

pub const NAME_REQUIRED: &str = "Name is required";
pub const ROLE_REQUIRED: &str = "Role is required";
pub const PHONE_REQUIRED: &str = "Phone number is required";
pub const PASSWORD_REQUIRED: &str = "Please enter a password";

pub const MIN_PASSWORD_LEN: usize = 6;

/// Returns the 10-digit national number for an Indian mobile number,
/// accepting an optional `+91`, `91` or `0` prefix.
pub fn normalize_phone(raw: &str) -> Option<String> {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^(?:\+?91|0)?([6-9][0-9]{9})$").unwrap();
    }
    PHONE_RE
        .captures(raw.trim())
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

pub fn check_name(name: &str, errors: &mut Vec<FieldError>) {
    if name.trim().is_empty() {
        errors.push(FieldError::field("name", NAME_REQUIRED));
    }
}

pub fn check_role(role: &str, errors: &mut Vec<FieldError>) {
    if role.trim().is_empty() {
        errors.push(FieldError::field("role", ROLE_REQUIRED));
    }
}

/// Pushes an error and returns `None` if `raw` is not a valid phone.
pub fn check_phone(raw: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    let phone = normalize_phone(raw);
    if phone.is_none() {
        errors.push(FieldError::field("phone", PHONE_REQUIRED));
    }
    phone
}

pub fn check_new_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::field("password", PASSWORD_REQUIRED));
    }
}

pub fn check_login_password(password: &str, errors: &mut Vec<FieldError>) {
    if password.is_empty() {
        errors.push(FieldError::field("password", PASSWORD_REQUIRED));
    }
}
