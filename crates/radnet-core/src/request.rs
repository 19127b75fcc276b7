//! The request slice that crosses the bridge boundary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single name/value pair from the server's attribute lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// The part of a request a managed delegate gets to see and amend: the
/// incoming request attributes, plus the reply list that delegate
/// output is appended to.
///
/// This is the bridge's boundary representation, not the server's
/// internal request object.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request: Vec<Attribute>,
    reply: Vec<Attribute>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_request(attributes: Vec<Attribute>) -> Self {
        Self {
            request: attributes,
            reply: Vec::new(),
        }
    }

    /// Appends an attribute to the incoming request list.
    pub fn push_request(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.request.push(Attribute::new(name, value));
    }

    pub fn request(&self) -> &[Attribute] {
        &self.request
    }

    pub fn reply(&self) -> &[Attribute] {
        &self.reply
    }

    /// First request attribute with the given name, if any.
    pub fn request_value(&self, name: &str) -> Option<&str> {
        self.request
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    /// First reply attribute with the given name, if any.
    pub fn reply_value(&self, name: &str) -> Option<&str> {
        self.reply
            .iter()
            .find(|attribute| attribute.name == name)
            .map(|attribute| attribute.value.as_str())
    }

    /// Appends delegate output to the reply list, preserving order.
    pub fn append_reply(&mut self, attributes: impl IntoIterator<Item = Attribute>) {
        self.reply.extend(attributes);
    }
}
