//! Analysis scopes: the unit within which repeat findings collapse.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which body of an operation a scope covers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BodyKind {
    Request,
    Response { status: String },
}

/// Where a property was found.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AnalysisScope {
    /// A shared component schema.
    Schema { name: String },

    /// The request body or one response of an operation, across all its media types.
    Body {
        method: String,
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        operation_id: Option<String>,
        body: BodyKind,
    },
}

impl AnalysisScope {
    pub fn schema(name: impl Into<String>) -> Self {
        Self::Schema { name: name.into() }
    }

    pub fn request(method: &str, path: impl Into<String>) -> Self {
        Self::Body {
            method: method.to_uppercase(),
            path: path.into(),
            operation_id: None,
            body: BodyKind::Request,
        }
    }

    pub fn response(method: &str, path: impl Into<String>, status: impl Into<String>) -> Self {
        Self::Body {
            method: method.to_uppercase(),
            path: path.into(),
            operation_id: None,
            body: BodyKind::Response {
                status: status.into(),
            },
        }
    }

    pub fn with_operation_id(mut self, id: Option<String>) -> Self {
        if let Self::Body { operation_id, .. } = &mut self {
            *operation_id = id;
        }
        self
    }

    /// Short label used in metrics and change ids: `schema`, `request` or `response`.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::Schema { .. } => "schema",
            Self::Body {
                body: BodyKind::Request,
                ..
            } => "request",
            Self::Body {
                body: BodyKind::Response { .. },
                ..
            } => "response",
        }
    }
}

impl fmt::Display for AnalysisScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Schema { name } => write!(f, "schema {}", name),
            Self::Body {
                method, path, body, ..
            } => match body {
                BodyKind::Request => write!(f, "{} {} request", method, path),
                BodyKind::Response { status } => {
                    write!(f, "{} {} response {}", method, path, status)
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_display() {
        assert_eq!(AnalysisScope::schema("Pet").to_string(), "schema Pet");
        assert_eq!(
            AnalysisScope::request("post", "/pets").to_string(),
            "POST /pets request"
        );
        assert_eq!(
            AnalysisScope::response("get", "/pets", "200").to_string(),
            "GET /pets response 200"
        );
    }

    #[test]
    fn test_request_and_response_scopes_differ() {
        let request = AnalysisScope::request("POST", "/pets");
        let ok = AnalysisScope::response("POST", "/pets", "200");
        let created = AnalysisScope::response("POST", "/pets", "201");
        assert_ne!(request, ok);
        assert_ne!(ok, created);
        assert_eq!(request.kind_label(), "request");
        assert_eq!(ok.kind_label(), "response");
    }

    #[test]
    fn test_operation_id_only_applies_to_bodies() {
        let scope = AnalysisScope::request("get", "/pets").with_operation_id(Some("listPets".into()));
        assert!(matches!(
            scope,
            AnalysisScope::Body { operation_id: Some(ref id), .. } if id == "listPets"
        ));

        let schema = AnalysisScope::schema("Pet").with_operation_id(Some("ignored".into()));
        assert_eq!(schema, AnalysisScope::schema("Pet"));
    }
}
