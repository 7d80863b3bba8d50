//! Identifier validation and output path sanitization
//!
//! Validators for user-supplied identifiers (email addresses, Austrian
//! social-security numbers, tax IDs) and helpers that keep document
//! output paths inside their target directory.
//!
//! Every validator comes in two forms: `check_*` returns the reason for a
//! rejection, `validate_*` collapses it into a plain `bool`.

use anyhow::Result;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why an identifier was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("SV-number must be 8 digits, one letter and 3 digits, got '{0}'")]
    SvFormat(String),

    #[error("birth date '{0}' is not a YYYY-MM-DD date")]
    InvalidBirthDate(String),

    #[error("SV-number encodes birth date {encoded}, expected {expected}")]
    BirthDateMismatch { encoded: String, expected: String },

    #[error("tax ID must be exactly 11 digits, got '{0}'")]
    TaxIdFormat(String),
}

fn is_email_local_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '%' | '+' | '-')
}

fn is_email_domain_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '-')
}

/// Checks an address against `local@domain.tld`
///
/// The local part may contain letters, digits and `._%+-`; the domain
/// letters, digits, `.` and `-`; the top-level domain at least two
/// letters.
pub fn check_email(email: &str) -> Result<(), ValidationError> {
    let invalid = || ValidationError::InvalidEmail(email.to_string());

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || !local.chars().all(is_email_local_char) {
        return Err(invalid());
    }

    // The TLD cannot contain a dot, so it starts after the last one.
    let (host, tld) = domain.rsplit_once('.').ok_or_else(invalid)?;
    if host.is_empty() || !host.chars().all(is_email_domain_char) {
        return Err(invalid());
    }
    if tld.len() < 2 || !tld.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_email(email: &str) -> bool {
    check_email(email).is_ok()
}

/// Validates an optional email field
///
/// A missing or empty value is accepted; anything else must be a valid
/// address.
pub fn validate_or_empty_email(email: Option<&str>) -> bool {
    match email {
        None | Some("") => true,
        Some(address) => validate_email(address),
    }
}

/// Removes spaces and upper-cases, the form identifiers are compared in
fn normalize_identifier(input: &str) -> String {
    input.replace(' ', "").to_ascii_uppercase()
}

/// Checks an Austrian SV-number against the holder's birth date
///
/// The normalized number must be 2 digits, the 6-digit birth date as
/// `DDMMYY`, one letter and 3 digits. The embedded date has to match
/// `birthday`, given as ISO `YYYY-MM-DD`.
///
/// # Arguments
/// - `sv_number` - The SV-number, spaces and lower case allowed
/// - `birthday` - The holder's birth date
pub fn check_sv_number(sv_number: &str, birthday: &str) -> Result<(), ValidationError> {
    let normalized = normalize_identifier(sv_number);
    let bytes = normalized.as_bytes();

    let well_formed = bytes.len() == 12
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[8].is_ascii_uppercase()
        && bytes[9..].iter().all(u8::is_ascii_digit);
    if !well_formed {
        return Err(ValidationError::SvFormat(normalized));
    }

    let birth_date = NaiveDate::parse_from_str(birthday, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidBirthDate(birthday.to_string()))?;
    let expected = birth_date.format("%d%m%y").to_string();
    let encoded = &normalized[2..8];

    if encoded != expected {
        return Err(ValidationError::BirthDateMismatch {
            encoded: encoded.to_string(),
            expected,
        });
    }

    Ok(())
}

pub fn validate_sv_number(sv_number: &str, birthday: &str) -> bool {
    check_sv_number(sv_number, birthday).is_ok()
}

/// Checks that a tax ID is exactly 11 digits once spaces are removed
pub fn check_tax_id(tax_id: &str) -> Result<(), ValidationError> {
    let normalized = tax_id.replace(' ', "");
    if normalized.len() == 11 && normalized.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(ValidationError::TaxIdFormat(normalized))
    }
}

pub fn validate_tax_id(tax_id: &str) -> bool {
    check_tax_id(tax_id).is_ok()
}

/// Sanitizes a string to be safe for use as a filename
///
/// Replaces path separators, wildcards, drive colons and control
/// characters with underscores so a document filename taken from a
/// request can never leave its output directory.
pub fn sanitize_filename(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Validates that a file path is within a given directory
///
/// # Errors
/// Returns an error if `allowed_dir` cannot be resolved or the parent of
/// `file_path` lies outside it.
pub fn validate_path_within_directory(file_path: &Path, allowed_dir: &Path) -> Result<()> {
    let canonical_dir = allowed_dir.canonicalize()?;

    if let Some(parent) = file_path.parent() {
        let canonical_parent = parent
            .canonicalize()
            .unwrap_or_else(|_| parent.to_path_buf());

        if !canonical_parent.starts_with(&canonical_dir) {
            anyhow::bail!(
                "Refusing to write {:?}: outside of {:?}",
                file_path,
                allowed_dir
            );
        }
    }

    Ok(())
}

/// Joins `dir` with the sanitized form of `filename`
pub fn build_safe_filepath(dir: &Path, filename: &str) -> PathBuf {
    dir.join(sanitize_filename(filename))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_accepts_common_addresses() {
        assert!(validate_email("a@b.co"));
        assert!(validate_email("first.last+tag@mail.example.com"));
        assert!(validate_email("user_%x-y@sub-domain.at"));
    }

    #[test]
    fn test_validate_email_rejects_malformed_addresses() {
        assert!(!validate_email("bad@"));
        assert!(!validate_email("@example.com"));
        assert!(!validate_email("user@example"));
        assert!(!validate_email("user@example.c"));
        assert!(!validate_email("user@.com"));
        assert!(!validate_email("user@example.c0m"));
        assert!(!validate_email("us er@example.com"));
        assert!(!validate_email("a@b@c.com"));
        assert!(!validate_email(""));
    }

    #[test]
    fn test_check_email_reports_address() {
        assert_eq!(
            check_email("bad@"),
            Err(ValidationError::InvalidEmail("bad@".to_string()))
        );
    }

    #[test]
    fn test_validate_or_empty_email() {
        assert!(validate_or_empty_email(None));
        assert!(validate_or_empty_email(Some("")));
        assert!(validate_or_empty_email(Some("a@b.co")));
        assert!(!validate_or_empty_email(Some("nope")));
    }

    #[test]
    fn test_sv_number_matching_birth_date() {
        assert!(validate_sv_number("12 150385 a 123", "1985-03-15"));
        assert!(validate_sv_number("12150385A123", "1985-03-15"));
    }

    #[test]
    fn test_sv_number_wrong_length() {
        assert_eq!(
            check_sv_number("1234567890A123", "1985-03-15"),
            Err(ValidationError::SvFormat("1234567890A123".to_string()))
        );
    }

    #[test]
    fn test_sv_number_letter_in_wrong_place() {
        assert!(!validate_sv_number("1215038A5123", "1985-03-15"));
    }

    #[test]
    fn test_sv_number_mismatched_birth_date() {
        assert_eq!(
            check_sv_number("12150385A123", "1985-03-16"),
            Err(ValidationError::BirthDateMismatch {
                encoded: "150385".to_string(),
                expected: "160385".to_string(),
            })
        );
    }

    #[test]
    fn test_sv_number_unparseable_birth_date() {
        assert!(matches!(
            check_sv_number("12150385A123", "15.03.1985"),
            Err(ValidationError::InvalidBirthDate(_))
        ));
        assert!(!validate_sv_number("12310285A123", "1985-02-31"));
    }

    #[test]
    fn test_validate_tax_id() {
        assert!(validate_tax_id("12345678901"));
        assert!(validate_tax_id("123 456 789 01"));
        assert!(!validate_tax_id("1234"));
        assert!(!validate_tax_id("123456789012"));
        assert!(!validate_tax_id("1234567890a"));
    }

    #[test]
    fn test_validators_are_repeatable() {
        for _ in 0..3 {
            assert!(validate_email("a@b.co"));
            assert!(!validate_tax_id("1234"));
        }
    }

    #[test]
    fn test_sanitize_filename_removes_separators() {
        assert_eq!(sanitize_filename("../invoices/2024.pdf"), ".._invoices_2024.pdf");
        assert_eq!(sanitize_filename("C:\\tmp\\a.pdf"), "C__tmp_a.pdf");
    }

    #[test]
    fn test_sanitize_filename_removes_control_chars() {
        assert_eq!(sanitize_filename("offer\0\n.pdf"), "offer__.pdf");
    }

    #[test]
    fn test_path_outside_directory_is_rejected() {
        let root = std::env::temp_dir().join(format!("fliix_helpers_paths_{}", std::process::id()));
        let allowed = root.join("documents");
        std::fs::create_dir_all(&allowed).unwrap();

        assert!(validate_path_within_directory(&allowed.join("offer.pdf"), &allowed).is_ok());
        assert!(validate_path_within_directory(&root.join("offer.pdf"), &allowed).is_err());
        assert!(
            validate_path_within_directory(&allowed.join("../escape.pdf"), &allowed).is_err()
        );

        let _ = std::fs::remove_dir_all(&root);
    }

    #[test]
    fn test_build_safe_filepath() {
        let dir = Path::new("/tmp/documents");
        let path = build_safe_filepath(dir, "../../etc/passwd");
        assert_eq!(path, Path::new("/tmp/documents/.._.._etc_passwd"));
    }
}
