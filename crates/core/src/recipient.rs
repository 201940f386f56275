//! Recipient list helpers.

/// Display name for a new contact: the local part of the address.
///
/// Addresses without an `@` are used whole.
pub fn contact_name_from_email(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Trim every entry and drop blanks, keeping input order.
pub fn normalize_recipients<S: AsRef<str>>(emails: &[S]) -> Vec<String> {
    emails
        .iter()
        .map(|e| e.as_ref().trim())
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}
