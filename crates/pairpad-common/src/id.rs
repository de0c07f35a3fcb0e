use uuid::Uuid;

/// Generate an opaque session identifier.
pub fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_id_is_valid_uuid() {
        let id = new_session_id();
        let parsed = Uuid::parse_str(&id);
        assert!(parsed.is_ok());
        assert_eq!(parsed.unwrap().get_version_num(), 4);
    }

    #[test]
    fn new_session_id_is_unique() {
        assert_ne!(new_session_id(), new_session_id());
    }
}
