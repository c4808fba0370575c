//! Semantic view of a body part's headers
//!
//! Header tokenization belongs to the host multipart reader. These types
//! only carry the parameters the router needs to make its decision.

use serde::Serialize;

/// The `name` and `filename` parameters of a Content-Disposition header
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ContentDisposition {
    pub name: Option<String>,
    pub filename: Option<String>,
}

impl ContentDisposition {
    /// Disposition for a plain form field
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            filename: None,
        }
    }

    /// Disposition for a file upload
    pub fn file(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            filename: Some(filename.into()),
        }
    }
}

/// Headers describing one MIME body part
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BodyPartHeaders {
    content_disposition: Option<ContentDisposition>,
    content_type: Option<String>,
}

impl BodyPartHeaders {
    pub fn new(content_disposition: Option<ContentDisposition>) -> Self {
        Self {
            content_disposition,
            content_type: None,
        }
    }

    /// Headers of a form field part named `name`
    pub fn field(name: impl Into<String>) -> Self {
        Self::new(Some(ContentDisposition::field(name)))
    }

    /// Headers of a file part named `name` carrying `filename`
    pub fn file(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self::new(Some(ContentDisposition::file(name, filename)))
    }

    /// Headers with no Content-Disposition at all
    pub fn without_disposition() -> Self {
        Self::default()
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn content_disposition(&self) -> Option<&ContentDisposition> {
        self.content_disposition.as_ref()
    }

    pub fn content_disposition_name(&self) -> Option<&str> {
        self.content_disposition.as_ref()?.name.as_deref()
    }

    pub fn content_disposition_filename(&self) -> Option<&str> {
        self.content_disposition.as_ref()?.filename.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// True when the filename parameter is present and non-empty
    pub fn has_filename(&self) -> bool {
        self.content_disposition_filename()
            .map(|f| !f.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_headers() {
        let headers = BodyPartHeaders::field("title");
        assert_eq!(headers.content_disposition_name(), Some("title"));
        assert_eq!(headers.content_disposition_filename(), None);
        assert!(!headers.has_filename());
    }

    #[test]
    fn test_file_headers() {
        let headers = BodyPartHeaders::file("upload", "a.txt").with_content_type("text/plain");
        assert_eq!(headers.content_disposition_filename(), Some("a.txt"));
        assert_eq!(headers.content_type(), Some("text/plain"));
        assert!(headers.has_filename());
    }

    #[test]
    fn test_empty_filename_is_not_a_file() {
        let headers = BodyPartHeaders::file("upload", "");
        assert!(!headers.has_filename());
    }

    #[test]
    fn test_missing_disposition() {
        let headers = BodyPartHeaders::without_disposition();
        assert!(headers.content_disposition().is_none());
        assert_eq!(headers.content_disposition_name(), None);
        assert!(!headers.has_filename());
    }
}
