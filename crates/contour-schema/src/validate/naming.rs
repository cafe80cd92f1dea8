use crate::{MAX_FIELD_NAME_LEN, MAX_MODEL_NAME_LEN, casing};

/// Ensure model names are non-empty, ASCII, snake_case, and within the
/// maximum length.
pub(crate) fn validate_model_name(name: &str) -> Result<(), String> {
    validate_name("model", name, MAX_MODEL_NAME_LEN)
}

/// Ensure field names meet the same rules as model names.
pub(crate) fn validate_field_name(name: &str) -> Result<(), String> {
    validate_name("field", name, MAX_FIELD_NAME_LEN)
}

fn validate_name(kind: &str, name: &str, max_len: usize) -> Result<(), String> {
    if name.is_empty() {
        return Err(format!("{kind} name is empty"));
    }
    if name.len() > max_len {
        return Err(format!("{kind} name '{name}' exceeds max length {max_len}"));
    }
    if !name.is_ascii() {
        return Err(format!("{kind} name '{name}' must be ASCII"));
    }
    if !casing::is_snake(name) {
        return Err(format!("{kind} name '{name}' must be snake_case"));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_cased_names() {
        assert!(validate_model_name("").is_err(), "empty names should fail");
        assert!(
            validate_model_name("UserAccount").is_err(),
            "non-snake names should be rejected"
        );
        assert!(validate_field_name("émail").is_err(), "non-ASCII rejected");
    }

    #[test]
    fn accepts_snake_case_names() {
        assert!(validate_model_name("user_account").is_ok());
        assert!(validate_field_name("created_at").is_ok());
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(MAX_MODEL_NAME_LEN + 1);
        assert!(validate_model_name(&long).is_err());
    }
}
