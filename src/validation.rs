//! Form validation
//!
//! Checks run before any request is sent. Each returns every failing field at
//! once as [`ClientError::Validation`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::auth::models::Address;
use crate::error::{ClientError, FieldErrors};

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$").expect("email pattern is valid")
});

static ZIPCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("zipcode pattern is valid"));

// Login keeps the older, longer minimum.
pub const LOGIN_PASSWORD_MIN: usize = 8;
pub const REGISTER_PASSWORD_MIN: usize = 7;
pub const NAME_MIN: usize = 2;

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

fn check_email(errors: &mut FieldErrors, email: &str) {
    if email.trim().is_empty() {
        errors.add("email", "Email is required");
    } else if !is_valid_email(email.trim()) {
        errors.add("email", "Invalid email address");
    }
}

/// Registration/new-password rule: long enough and at least one letter.
fn check_new_password(errors: &mut FieldErrors, field: &'static str, password: &str) {
    if password.is_empty() {
        errors.add(field, "Password is required");
    } else if password.chars().count() < REGISTER_PASSWORD_MIN {
        errors.add(field, "Password must be at least 7 characters");
    } else if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        errors.add(field, "Password must contain at least one letter");
    }
}

/// Login form: a well-formed email and a password of at least
/// [`LOGIN_PASSWORD_MIN`] characters.
pub fn validate_login(email: &str, password: &str) -> Result<(), ClientError> {
    let mut errors = FieldErrors::new();
    check_email(&mut errors, email);
    if password.is_empty() {
        errors.add("password", "Password is required");
    } else if password.chars().count() < LOGIN_PASSWORD_MIN {
        errors.add("password", "Password must be at least 8 characters");
    }
    errors.into_result()
}

/// Registration form. All failing fields are reported together.
pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
    confirm: &str,
) -> Result<(), ClientError> {
    let mut errors = FieldErrors::new();
    let name = name.trim();
    if name.is_empty() {
        errors.add("name", "Name is required");
    } else if name.chars().count() < NAME_MIN {
        errors.add("name", "Name must be at least 2 characters");
    }
    check_email(&mut errors, email);
    check_new_password(&mut errors, "password", password);
    if confirm.is_empty() {
        errors.add("confirm_password", "Please confirm your password");
    } else if confirm != password {
        errors.add("confirm_password", "Passwords do not match");
    }
    errors.into_result()
}

pub fn validate_new_password(password: &str) -> Result<(), ClientError> {
    let mut errors = FieldErrors::new();
    check_new_password(&mut errors, "new_password", password);
    errors.into_result()
}

pub fn validate_address(address: &Address) -> Result<(), ClientError> {
    let mut errors = FieldErrors::new();
    if address.address_line.trim().is_empty() {
        errors.add("address_line", "Address is required");
    }
    if address.city.trim().is_empty() {
        errors.add("city", "City is required");
    }
    if address.province.trim().is_empty() {
        errors.add("province", "Province is required");
    }
    if address.zipcode.trim().is_empty() {
        errors.add("zipcode", "Zipcode is required");
    } else if !ZIPCODE.is_match(address.zipcode.trim()) {
        errors.add("zipcode", "Zipcode must be 5 digits");
    }
    if address.country.trim().is_empty() {
        errors.add("country", "Please select a country");
    }
    errors.into_result()
}
