//! Per-handler response decoration and error page lookup.

use std::sync::Arc;

use serde::Serialize;

use super::{ErrorKind, ErrorTemplates};

/// Descriptive data about the running application, echoed as headers.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct AppMetadata {
    pub name: String,
    pub version: String,
    pub description: String,
}

/// Shared by every exchange dispatched to one handler.
///
/// Holds the application metadata, the handler's declared headers and the
/// error pages of the root the handler was discovered in.
#[derive(Default)]
pub struct Responder {
    metadata: Arc<AppMetadata>,
    headers: Vec<(String, String)>,
    templates: Option<Arc<ErrorTemplates>>,
}

impl Responder {
    pub fn new(metadata: Arc<AppMetadata>) -> Self {
        Self {
            metadata,
            headers: Vec::new(),
            templates: None,
        }
    }

    pub fn with_headers(mut self, headers: Vec<(String, String)>) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_templates(mut self, templates: Option<Arc<ErrorTemplates>>) -> Self {
        self.templates = templates;
        self
    }

    pub fn metadata(&self) -> &AppMetadata {
        &self.metadata
    }

    /// Headers added to every decorated response, names already prefixed.
    pub fn decoration(&self) -> impl Iterator<Item = (String, &str)> + '_ {
        let metadata = [
            ("name", self.metadata.name.as_str()),
            ("version", self.metadata.version.as_str()),
            ("description", self.metadata.description.as_str()),
        ];

        metadata
            .into_iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (decorated_name(name), value))
            .chain(
                self.headers
                    .iter()
                    .map(|(name, value)| (decorated_name(name), value.as_str())),
            )
    }

    /// HTML error page for `kind`, when the root provides one.
    pub fn render_error(&self, kind: ErrorKind, message: Option<&serde_json::Value>) -> Option<String> {
        self.templates.as_ref()?.render(kind, message)
    }
}

/// Prefixes a handler-declared header with `x-`.
///
/// CORS headers are sent untouched; they are meaningless under another name.
pub fn decorated_name(name: &str) -> String {
    let lower = name.to_ascii_lowercase();
    if lower.starts_with("access-control-") || lower.starts_with("x-") {
        lower
    } else {
        format!("x-{lower}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorated_name() {
        assert_eq!(decorated_name("test"), "x-test");
        assert_eq!(decorated_name("X-Already"), "x-already");
        assert_eq!(decorated_name("Access-Control-Allow-Origin"), "access-control-allow-origin");
    }

    #[test]
    fn test_decoration_skips_empty_metadata() {
        let metadata = Arc::new(AppMetadata {
            name: "demo".into(),
            version: String::new(),
            description: "a demo".into(),
        });
        let responder = Responder::new(metadata).with_headers(vec![("test".into(), "1".into())]);

        let headers: Vec<_> = responder
            .decoration()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        assert_eq!(
            headers,
            vec![
                ("x-name".to_string(), "demo".to_string()),
                ("x-description".to_string(), "a demo".to_string()),
                ("x-test".to_string(), "1".to_string()),
            ]
        );
    }
}
