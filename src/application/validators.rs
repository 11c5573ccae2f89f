use validator::ValidateEmail;

/// Validates that the input looks like a valid email address
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    !email.is_empty() && email.validate_email()
}

/// Exactly ten ASCII digits, no separators.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == 10 && phone.chars().all(|c| c.is_ascii_digit())
}

/// At least three characters once surrounding whitespace is removed.
pub fn is_valid_full_name(name: &str) -> bool {
    name.trim().chars().count() >= 3
}

/// Plan names are shown on bills, keep them short.
pub fn is_valid_plan_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name.chars().count() <= 100
}
