mod address;

pub use address::{is_valid_uk_postcode, normalize_country, normalize_postcode};

/// Very loose sanity check on email addresses. The payment providers do the real validation.
pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.') && !domain.ends_with('.'),
        None => false,
    }
}
