use async_trait::async_trait;
use std::collections::HashMap;

/// HTTP headers to send with the connection upgrade request
pub type Headers = HashMap<String, String>;

/// Trait for providing HTTP headers dynamically
///
/// Called on every connection attempt (including reconnections), so
/// headers carrying tokens or timestamps are regenerated each time.
///
/// # Example
/// ```ignore
/// struct SessionHeaders {
///     cookie: String,
/// }
///
/// #[async_trait::async_trait]
/// impl HeaderProvider for SessionHeaders {
///     async fn get_headers(&self) -> Headers {
///         let mut headers = HashMap::new();
///         headers.insert("Cookie".to_string(), self.cookie.clone());
///         headers
///     }
/// }
/// ```
#[async_trait]
pub trait HeaderProvider: Send + Sync {
    /// Generate headers for the next connection attempt
    async fn get_headers(&self) -> Headers;
}

/// A no-op header provider that doesn't add any headers
pub struct NoHeaders;

#[async_trait]
impl HeaderProvider for NoHeaders {
    async fn get_headers(&self) -> Headers {
        HashMap::new()
    }
}

/// Fixed headers sent unchanged on every attempt
#[derive(Debug, Clone, Default)]
pub struct StaticHeaders {
    headers: Headers,
}

impl StaticHeaders {
    pub fn new(headers: Headers) -> Self {
        Self { headers }
    }

    /// Add a header, replacing an existing one with the same name
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl HeaderProvider for StaticHeaders {
    async fn get_headers(&self) -> Headers {
        self.headers.clone()
    }
}

/// Headers computed by a closure on every attempt
pub struct HeaderFn<F> {
    f: F,
}

impl<F> HeaderFn<F>
where
    F: Fn() -> Headers + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> HeaderProvider for HeaderFn<F>
where
    F: Fn() -> Headers + Send + Sync,
{
    async fn get_headers(&self) -> Headers {
        (self.f)()
    }
}

/// Fill in `defaults` that `headers` does not already carry
///
/// Header names compare case-insensitively, so a caller supplied
/// `origin` suppresses a default `Origin`.
pub fn apply_default_headers(headers: &mut Headers, defaults: &Headers) {
    for (name, value) in defaults {
        let present = headers.keys().any(|key| key.eq_ignore_ascii_case(name));
        if !present {
            headers.insert(name.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> Headers {
        let mut defaults = Headers::new();
        defaults.insert("Origin".to_string(), "https://example.com".to_string());
        defaults.insert("User-Agent".to_string(), "eventsockets".to_string());
        defaults
    }

    #[test]
    fn test_defaults_fill_missing_headers() {
        let mut headers = Headers::new();
        apply_default_headers(&mut headers, &defaults());
        assert_eq!(headers.get("Origin").map(String::as_str), Some("https://example.com"));
        assert_eq!(headers.get("User-Agent").map(String::as_str), Some("eventsockets"));
    }

    #[test]
    fn test_caller_headers_win_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("origin".to_string(), "https://mine.example".to_string());
        apply_default_headers(&mut headers, &defaults());

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get("origin").map(String::as_str), Some("https://mine.example"));
        assert!(!headers.contains_key("Origin"));
    }

    #[tokio::test]
    async fn test_header_fn_runs_per_call() {
        let provider = HeaderFn::new(|| {
            let mut headers = Headers::new();
            headers.insert("X-Attempt".to_string(), "1".to_string());
            headers
        });
        assert_eq!(provider.get_headers().await.len(), 1);
        assert!(NoHeaders.get_headers().await.is_empty());
    }
}
