//! HTTP request type.
//!
//! [`HttpRequest`] mirrors Django's `django.http.HttpRequest`, reduced to what
//! redirect resolution reads: the method, path, query string, host, headers,
//! server metadata, and the subdomain attribute set by the subdomain middleware.

use std::collections::HashMap;

use http::{HeaderMap, Method};

/// An HTTP request, modeled after Django's `HttpRequest`.
///
/// Instances are typically created from an incoming Axum request via
/// [`HttpRequest::from_axum`], or with [`HttpRequest::builder`] in tests.
///
/// # Examples
///
/// ```
/// use djangoseo_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::GET)
///     .path("/old/thing")
///     .query_string("page=1")
///     .build();
///
/// assert_eq!(request.method(), &http::Method::GET);
/// assert_eq!(request.get_full_path(), "/old/thing?page=1");
/// assert_eq!(request.subdomain(), "");
/// ```
#[derive(Debug, Clone)]
pub struct HttpRequest {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    meta: HashMap<String, String>,
    body: Vec<u8>,
    scheme: String,
    subdomain: Option<String>,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`] for constructing an `HttpRequest`.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from an Axum/hyper request and its body bytes.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let method = parts.method;
        let uri = parts.uri;
        let headers = parts.headers;

        let path = uri.path().to_string();
        let query_string = uri.query().unwrap_or("").to_string();

        let mut meta = HashMap::new();

        for (name, value) in &headers {
            let meta_key = format!(
                "HTTP_{}",
                name.as_str().to_uppercase().replace('-', "_")
            );
            if let Ok(v) = value.to_str() {
                meta.insert(meta_key, v.to_string());
            }
        }

        // HTTP/2 requests carry the host in the URI authority instead of a header.
        let host = headers
            .get(http::header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .or_else(|| uri.authority().map(|a| a.as_str().to_string()));
        if let Some(host) = host {
            meta.insert("SERVER_NAME".to_string(), host.clone());
            meta.insert("HTTP_HOST".to_string(), host);
        }

        meta.insert("REQUEST_METHOD".to_string(), method.to_string());
        meta.insert("PATH_INFO".to_string(), path.clone());
        meta.insert("QUERY_STRING".to_string(), query_string.clone());

        let scheme = if headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == "https")
        {
            "https".to_string()
        } else {
            "http".to_string()
        };

        Self {
            method,
            path,
            query_string,
            headers,
            meta,
            body,
            scheme,
            subdomain: None,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the raw query string (without the leading `?`).
    pub fn query_string(&self) -> &str {
        &self.query_string
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the META dictionary containing server-level metadata.
    pub const fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// Returns a mutable reference to the META dictionary.
    pub fn meta_mut(&mut self) -> &mut HashMap<String, String> {
        &mut self.meta
    }

    /// Returns the raw request body bytes.
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Returns the URL scheme (`"http"` or `"https"`).
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns `true` if the request uses HTTPS.
    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    /// Returns the host from the `Host` header or META.
    pub fn get_host(&self) -> &str {
        self.meta
            .get("HTTP_HOST")
            .or_else(|| self.meta.get("SERVER_NAME"))
            .map_or("localhost", String::as_str)
    }

    /// Returns the host without any `:port` suffix, lowercased.
    pub fn get_domain(&self) -> String {
        let host = self.get_host();
        let domain = match host.rsplit_once(':') {
            // Keep bracketed IPv6 literals such as "[::1]" intact.
            Some((name, port)) if !name.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) => {
                name
            }
            _ => host,
        };
        domain.to_ascii_lowercase()
    }

    /// Returns the full path including the query string.
    ///
    /// # Examples
    ///
    /// ```
    /// use djangoseo_http::HttpRequest;
    ///
    /// let request = HttpRequest::builder()
    ///     .path("/articles/")
    ///     .query_string("page=2")
    ///     .build();
    /// assert_eq!(request.get_full_path(), "/articles/?page=2");
    /// ```
    pub fn get_full_path(&self) -> String {
        self.full_path(false)
    }

    /// Returns the full path with a trailing slash forced onto the path part.
    ///
    /// The slash goes before the query string, and is not doubled when the
    /// path already ends with one.
    ///
    /// # Examples
    ///
    /// ```
    /// use djangoseo_http::HttpRequest;
    ///
    /// let request = HttpRequest::builder()
    ///     .path("/foo")
    ///     .query_string("a=1")
    ///     .build();
    /// assert_eq!(request.get_full_path_with_slash(), "/foo/?a=1");
    /// ```
    pub fn get_full_path_with_slash(&self) -> String {
        self.full_path(true)
    }

    fn full_path(&self, force_append_slash: bool) -> String {
        let slash = if force_append_slash && !self.path.ends_with('/') {
            "/"
        } else {
            ""
        };
        if self.query_string.is_empty() {
            format!("{}{slash}", self.path)
        } else {
            format!("{}{slash}?{}", self.path, self.query_string)
        }
    }

    /// Returns the subdomain the request was made on.
    ///
    /// Empty when no subdomain was detected (the bare site domain) or when
    /// no subdomain middleware ran.
    pub fn subdomain(&self) -> &str {
        self.subdomain.as_deref().unwrap_or("")
    }

    /// Returns `true` if a subdomain has been assigned to this request.
    pub const fn has_subdomain(&self) -> bool {
        self.subdomain.is_some()
    }

    /// Sets the subdomain attribute on this request.
    pub fn set_subdomain(&mut self, subdomain: impl Into<String>) {
        self.subdomain = Some(subdomain.into());
    }
}

/// Builder for constructing [`HttpRequest`] instances in tests.
///
/// This provides a fluent API for building requests without needing
/// a full Axum request.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    path: String,
    query_string: String,
    headers: HeaderMap,
    meta: HashMap<String, String>,
    body: Vec<u8>,
    scheme: String,
    subdomain: Option<String>,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            path: "/".to_string(),
            query_string: String::new(),
            headers: HeaderMap::new(),
            meta: HashMap::new(),
            body: Vec::new(),
            scheme: "http".to_string(),
            subdomain: None,
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the request path.
    #[must_use]
    pub fn path(mut self, path: &str) -> Self {
        self.path = path.to_string();
        self
    }

    /// Sets the query string (without leading `?`).
    #[must_use]
    pub fn query_string(mut self, qs: &str) -> Self {
        self.query_string = qs.to_string();
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the `Host` header and the matching META entries.
    #[must_use]
    pub fn host(self, host: &str) -> Self {
        self.header("host", host)
            .meta("HTTP_HOST", host)
            .meta("SERVER_NAME", host)
    }

    /// Adds a META entry.
    #[must_use]
    pub fn meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets the scheme (http or https).
    #[must_use]
    pub fn scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    /// Sets the subdomain attribute.
    #[must_use]
    pub fn subdomain(mut self, subdomain: &str) -> Self {
        self.subdomain = Some(subdomain.to_string());
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        let mut meta = self.meta;
        meta.entry("REQUEST_METHOD".to_string())
            .or_insert_with(|| self.method.to_string());
        meta.entry("PATH_INFO".to_string())
            .or_insert_with(|| self.path.clone());
        meta.entry("QUERY_STRING".to_string())
            .or_insert_with(|| self.query_string.clone());

        HttpRequest {
            method: self.method,
            path: self.path,
            query_string: self.query_string,
            headers: self.headers,
            meta,
            body: self.body,
            scheme: self.scheme,
            subdomain: self.subdomain,
        }
    }
}
