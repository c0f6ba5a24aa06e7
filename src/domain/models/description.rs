//! Framework-native descriptions of suites and tests.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Description of a suite (class) or of one child test.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Description {
    /// Fully-qualified class name.
    pub class_name: String,
    /// Method name, for child descriptions.
    pub method_name: Option<String>,
}

impl Description {
    /// Description of a suite.
    pub fn suite(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: None,
        }
    }

    /// Description of one test of a suite.
    pub fn test(class_name: impl Into<String>, method_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: Some(method_name.into()),
        }
    }

    /// Whether this describes a single test rather than a suite.
    pub const fn is_test(&self) -> bool {
        self.method_name.is_some()
    }

    /// Display name in the host framework's `method(Class)` form.
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method_name {
            Some(method) => write!(f, "{}({})", method, self.class_name),
            None => f.write_str(&self.class_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name() {
        assert_eq!(Description::suite("com.acme.FooTest").display_name(), "com.acme.FooTest");
        assert_eq!(
            Description::test("com.acme.FooTest", "works").display_name(),
            "works(com.acme.FooTest)"
        );
    }

    #[test]
    fn test_serializes_as_json() {
        let json = serde_json::to_string(&Description::test("com.acme.FooTest", "works"))
            .expect("serialize");
        assert_eq!(json, r#"{"class_name":"com.acme.FooTest","method_name":"works"}"#);
    }
}
