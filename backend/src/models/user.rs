use serde::Serialize;

/// Per-player record, keyed by the external identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    /// Identity from the login provider
    pub id: String,
    pub username: String,
    pub avatar_url: String,
    /// Accumulated score
    pub points: u64,
    /// Active challenge, empty when none is issued
    pub prompt: String,
    /// Epoch millis of the last prompt change
    pub updated: i64,
}

impl UserRecord {
    /// A fresh record as created on first login.
    pub fn new(id: &str, username: &str, avatar_url: &str) -> Self {
        Self {
            id: id.to_string(),
            username: username.to_string(),
            avatar_url: avatar_url.to_string(),
            points: 0,
            prompt: String::new(),
            updated: 0,
        }
    }

    pub fn has_prompt(&self) -> bool {
        !self.prompt.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_has_no_prompt() {
        let user = UserRecord::new("1234", "ada", "https://example.com/a.png");
        assert_eq!(user.points, 0);
        assert_eq!(user.updated, 0);
        assert!(!user.has_prompt());
    }

    #[test]
    fn test_whitespace_prompt_is_not_active() {
        let mut user = UserRecord::new("1234", "ada", "");
        user.prompt = "   ".to_string();
        assert!(!user.has_prompt());
        user.prompt = "A departures board".to_string();
        assert!(user.has_prompt());
    }
}
