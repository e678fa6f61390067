use crate::application_port::AuthError;

const MAX_EMAIL_LEN: usize = 254;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_PASSWORD_LEN: usize = 128;

/// Trim and lowercase an email, rejecting anything without a local part and a
/// dotted domain.
pub fn normalize_email(email: &str) -> Result<String, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(AuthError::InvalidInput("email length".to_string()));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(AuthError::InvalidInput("email contains whitespace".to_string()));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(AuthError::InvalidInput("email is missing '@'".to_string()));
    };
    let domain_ok = domain.contains('.')
        && !domain.contains('@')
        && !domain.starts_with('.')
        && !domain.ends_with('.');
    if local.is_empty() || !domain_ok {
        return Err(AuthError::InvalidInput("malformed email".to_string()));
    }
    Ok(email)
}

pub fn check_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AuthError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AuthError::InvalidInput(format!(
            "password must be at most {MAX_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
