//! Field-level validation: CPF checksum, password policy, email shape.
//!
//! These are plain predicates; payload-level validation in the API layer
//! composes them into violation lists.

/// Password length bounds.
pub const PASSWORD_MIN: usize = 8;
pub const PASSWORD_MAX: usize = 64;

/// Validate a CPF (Brazilian government ID) by its two mod-11 check digits.
///
/// Formatting characters are stripped, so `"529.982.247-25"` and
/// `"52998224725"` are equivalent. Repeated-digit strings such as
/// `"11111111111"` pass the arithmetic but are rejected as known-invalid.
pub fn is_valid_cpf(cpf: &str) -> bool {
  let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();

  if digits.len() != 11 {
    return false;
  }
  if digits.iter().all(|&d| d == digits[0]) {
    return false;
  }

  let check = |take: usize| -> u32 {
    let sum: u32 = digits[..take]
      .iter()
      .enumerate()
      .map(|(i, &d)| d * (take as u32 + 1 - i as u32))
      .sum();
    let digit = (sum * 10) % 11;
    if digit == 10 { 0 } else { digit }
  };

  check(9) == digits[9] && check(10) == digits[10]
}

/// Check a password against the policy: length within bounds, at least one
/// uppercase letter, one lowercase letter, one digit and one special
/// character. Returns the violated rules as messages.
pub fn password_violations(password: &str) -> Vec<String> {
  let mut violations = Vec::new();

  let len = password.chars().count();
  if !(PASSWORD_MIN..=PASSWORD_MAX).contains(&len) {
    violations.push(format!(
      "the password must be between {PASSWORD_MIN} and {PASSWORD_MAX} characters"
    ));
  }
  if !password.chars().any(|c| c.is_ascii_uppercase()) {
    violations.push("the password must contain at least one uppercase letter".to_owned());
  }
  if !password.chars().any(|c| c.is_ascii_lowercase()) {
    violations.push("the password must contain at least one lowercase letter".to_owned());
  }
  if !password.chars().any(|c| c.is_ascii_digit()) {
    violations.push("the password must contain at least one digit".to_owned());
  }
  if !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
    violations.push("the password must contain at least one special character".to_owned());
  }

  violations
}

/// Minimal email shape check: one `@` with a non-empty local part and a
/// domain containing a dot. Deliverability is not this layer's concern.
pub fn is_email(value: &str) -> bool {
  let Some((local, domain)) = value.split_once('@') else {
    return false;
  };
  !local.is_empty()
    && !domain.is_empty()
    && !domain.starts_with('.')
    && !domain.ends_with('.')
    && domain.contains('.')
    && !value.chars().any(char::is_whitespace)
}
