//! Field validation shared by request handlers.
//!
//! Each check returns `Err(message)`; [`FieldErrors`] gathers them per field
//! and turns the batch into one `VALIDATION_FAILED` response.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{ApiError, validation_error};

static USERNAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").expect("username pattern compiles"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern compiles")
});
static CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0[1-9]|1[0-2]):([0-5][0-9])(AM|PM)$").expect("clock pattern compiles")
});
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9][0-9 -]{5,18}$").expect("phone pattern compiles"));

const WEEK_DAY_LETTERS: &str = "MTWHFS";

/// Collected per-field validation failures.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the failure of `result` against `field`; keeps the first
    /// message for a field.
    pub fn check(&mut self, field: &str, result: Result<(), String>) -> &mut Self {
        if let Err(message) = result {
            self.errors.entry(field.to_string()).or_insert(message);
        }
        self
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_result(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(validation_error(
                "Validation failed",
                serde_json::to_value(self.errors).unwrap_or_default(),
            ))
        }
    }
}

pub fn required(value: &str, max_len: usize) -> Result<(), String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("This field may not be blank.".to_string());
    }
    if value.chars().count() > max_len {
        return Err(format!(
            "Ensure this field has no more than {} characters.",
            max_len
        ));
    }
    Ok(())
}

pub fn username(value: &str) -> Result<(), String> {
    required(value, 150)?;
    if !USERNAME.is_match(value) {
        return Err(
            "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters."
                .to_string(),
        );
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), String> {
    required(value, 254)?;
    if !EMAIL.is_match(value) {
        return Err("Enter a valid email address.".to_string());
    }
    Ok(())
}

pub fn password(value: &str) -> Result<(), String> {
    if value.chars().count() < 8 {
        return Err("This password is too short. It must contain at least 8 characters.".to_string());
    }
    if value.chars().all(|c| c.is_ascii_digit()) {
        return Err("This password is entirely numeric.".to_string());
    }
    Ok(())
}

/// School years are identified by their four-digit starting year.
pub fn school_year(year: i32) -> Result<(), String> {
    if !(1000..=9999).contains(&year) {
        return Err("School year must be exactly 4 digits.".to_string());
    }
    Ok(())
}

pub fn term(value: &str) -> Result<(), String> {
    if !crate::models::semester::TERMS.contains(&value) {
        return Err(format!(
            "\"{}\" is not a valid choice. Expected one of first, second, summer.",
            value
        ));
    }
    Ok(())
}

/// Parses `HH:MMAM`/`HH:MMPM` into minutes after midnight.
pub fn clock_time(value: &str) -> Result<u32, String> {
    let captures = CLOCK_TIME
        .captures(value)
        .ok_or_else(|| "Time must look like 08:30AM.".to_string())?;

    let hour: u32 = captures[1].parse().map_err(|_| "Invalid hour.".to_string())?;
    let minute: u32 = captures[2].parse().map_err(|_| "Invalid minute.".to_string())?;
    let hour24 = match (&captures[3], hour) {
        ("AM", 12) => 0,
        ("AM", h) => h,
        ("PM", 12) => 12,
        (_, h) => h + 12,
    };
    Ok(hour24 * 60 + minute)
}

pub fn class_time_range(start: &str, end: &str) -> Result<(), String> {
    let start = clock_time(start)?;
    let end = clock_time(end)?;
    if end <= start {
        return Err("End time must be after start time.".to_string());
    }
    Ok(())
}

pub fn week_days(value: &str) -> Result<(), String> {
    if value.is_empty() || value.len() > 6 {
        return Err("Week days must be 1 to 6 letters from MTWHFS.".to_string());
    }
    let mut seen = String::new();
    for day in value.chars() {
        if !WEEK_DAY_LETTERS.contains(day) {
            return Err(format!("'{}' is not a week day letter (MTWHFS).", day));
        }
        if seen.contains(day) {
            return Err(format!("'{}' is repeated.", day));
        }
        seen.push(day);
    }
    Ok(())
}

/// Budgets are non-negative, below one million and have at most two decimals.
pub fn budget(value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err("Budget must be a non-negative number.".to_string());
    }
    if value >= 1_000_000.0 {
        return Err("Ensure that there are no more than 8 digits in total.".to_string());
    }
    let cents = value * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        return Err("Ensure that there are no more than 2 decimal places.".to_string());
    }
    Ok(())
}

pub fn in_range(value: i32, min: i32, max: i32) -> Result<(), String> {
    if value < min || value > max {
        return Err(format!("Must be between {} and {}.", min, max));
    }
    Ok(())
}

pub fn gender(value: &str) -> Result<(), String> {
    match value {
        "M" | "F" | "O" => Ok(()),
        _ => Err("Gender must be one of M, F, O.".to_string()),
    }
}

pub fn phone(value: &str) -> Result<(), String> {
    if !PHONE.is_match(value) {
        return Err("Enter a valid phone number.".to_string());
    }
    Ok(())
}

pub fn attendance_mark(value: &str) -> Result<(), String> {
    if !crate::models::attendance::MARKS.contains(&value) {
        return Err("Mark must be one of P, A, E, T.".to_string());
    }
    Ok(())
}

pub fn section_name(value: &str) -> Result<(), String> {
    required(value, 2)
}

/// Component scores are percentages.
pub fn score(value: f64) -> Result<(), String> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err("Score must be between 0 and 100.".to_string());
    }
    Ok(())
}
