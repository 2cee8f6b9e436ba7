//! Local input validation for forms that do not autosave

use crate::error::ValidationError;
use crate::model::Role;

/// Trim `value` and reject it when empty
pub fn require_non_empty<'a>(
    field: &'static str,
    value: &'a str,
) -> Result<&'a str, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::Empty(field))
    } else {
        Ok(trimmed)
    }
}

/// Parse an assignable contributor role
pub fn parse_role(value: &str) -> Result<Role, ValidationError> {
    require_non_empty("role", value)?;
    value.parse()
}

/// Strip the `@` (or URL-encoded `%40`) prefix from a profile handle
pub fn sanitize_username(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix("%40")
        .or_else(|| raw.strip_prefix('@'))
        .unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_non_empty() {
        assert_eq!(require_non_empty("name", "  Ada "), Ok("Ada"));
        assert_eq!(require_non_empty("name", "   "), Err(ValidationError::Empty("name")));
    }

    #[test]
    fn test_parse_role() {
        assert_eq!(parse_role("viewer"), Ok(Role::Viewer));
        assert_eq!(parse_role(""), Err(ValidationError::Empty("role")));
    }

    #[test]
    fn test_sanitize_username() {
        assert_eq!(sanitize_username("%40ada"), "ada");
        assert_eq!(sanitize_username("@ada"), "ada");
        assert_eq!(sanitize_username("ada"), "ada");
    }
}
