/// Public placeholder API the directory is read from unless configured otherwise.
pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    pub api_base_url: String,
}

impl DirectoryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: base_url.into(),
        }
    }

    /// `GET` endpoint returning the full user list.
    pub fn users_url(&self) -> String {
        format!("{}/users", self.api_base_url.trim_end_matches('/'))
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_points_at_placeholder_api() {
        let config = DirectoryConfig::default();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(
            config.users_url(),
            "https://jsonplaceholder.typicode.com/users"
        );
    }

    #[test]
    fn test_users_url_tolerates_trailing_slash() {
        let config = DirectoryConfig::new("http://127.0.0.1:8080/");
        assert_eq!(config.users_url(), "http://127.0.0.1:8080/users");
    }
}
