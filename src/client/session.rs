use dashmap::DashMap;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// Key/value session persistence (the browser's local storage, a keyring, a file...).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: String);
    fn remove(&self, key: &str);

    fn token(&self) -> Option<String> {
        self.get(TOKEN_KEY)
    }

    /// Drop the credentials and the cached user.
    fn clear(&self) {
        self.remove(TOKEN_KEY);
        self.remove(USER_KEY);
    }
}

/// Process-local session.
#[derive(Debug, Default)]
pub struct MemorySession {
    entries: DashMap<String, String>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySession {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_removes_token_and_user_only() {
        let session = MemorySession::new();
        session.set(TOKEN_KEY, "abc".to_string());
        session.set(USER_KEY, "{}".to_string());
        session.set("theme", "dark".to_string());

        assert_eq!(session.token().as_deref(), Some("abc"));
        session.clear();
        assert_eq!(session.token(), None);
        assert_eq!(session.get(USER_KEY), None);
        assert_eq!(session.get("theme").as_deref(), Some("dark"));
    }
}
