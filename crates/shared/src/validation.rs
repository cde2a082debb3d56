use crate::constants::*;

pub fn validate_message_content(content: &str) -> Result<(), String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err("Message content is required".into());
    }
    if trimmed.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(format!(
            "Message must be at most {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    Ok(())
}

pub fn validate_recipient(sender_id: &str, receiver_id: &str) -> Result<(), String> {
    if receiver_id.trim().is_empty() {
        return Err("Recipient is required".into());
    }
    if sender_id == receiver_id {
        return Err("Cannot message yourself".into());
    }
    Ok(())
}

pub fn validate_read_batch(ids: &[i64]) -> Result<(), String> {
    if ids.len() > MAX_READ_BATCH {
        return Err(format!(
            "At most {} messages can be marked read at once",
            MAX_READ_BATCH
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_blank_content() {
        assert!(validate_message_content("   \n").is_err());
        assert!(validate_message_content("hello").is_ok());
    }

    #[test]
    fn rejects_oversized_content() {
        let long = "a".repeat(MAX_MESSAGE_LENGTH + 1);
        assert!(validate_message_content(&long).is_err());
        let exact = "é".repeat(MAX_MESSAGE_LENGTH);
        assert!(validate_message_content(&exact).is_ok());
    }

    #[test]
    fn rejects_self_messages() {
        assert_eq!(
            validate_recipient("u1", "u1").unwrap_err(),
            "Cannot message yourself"
        );
        assert!(validate_recipient("u1", "u2").is_ok());
    }
}
