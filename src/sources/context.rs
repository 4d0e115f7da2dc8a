//! Ambient lookup context and path interpolation.
//!
//! Backend paths may contain placeholder tokens:
//!
//! | Token | Replaced with |
//! |-------|---------------|
//! | `%e`  | active environment |
//! | `%d`  | datacenter (empty when unset) |
//! | `%t`  | template name (per-template lookups only) |
//!
//! Substitution is a single left-to-right pass, so substituted values are
//! never re-expanded. Unknown tokens are copied through unchanged.

use std::fmt;

/// The active configuration branch for the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Environment(String);

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Environment plus optional secondary scope, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    environment: Environment,
    datacenter: Option<String>,
}

impl Context {
    pub fn new(environment: Environment, datacenter: Option<String>) -> Self {
        Self {
            environment,
            datacenter,
        }
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref()
    }

    /// Substitute `%e` and `%d` in `pattern`.
    pub fn interpolate(&self, pattern: &str) -> String {
        self.substitute(pattern, None)
    }

    /// Substitute `%e`, `%d` and `%t` in `pattern`.
    pub fn interpolate_for_template(&self, pattern: &str, template: &str) -> String {
        self.substitute(pattern, Some(template))
    }

    fn substitute(&self, pattern: &str, template: Option<&str>) -> String {
        let mut out = String::with_capacity(pattern.len());
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                out.push(c);
                continue;
            }
            let replacement = match chars.peek() {
                Some('e') => Some(self.environment.as_str()),
                Some('d') => Some(self.datacenter().unwrap_or("")),
                Some('t') => template,
                _ => None,
            };
            match replacement {
                Some(value) => {
                    out.push_str(value);
                    chars.next();
                }
                None => out.push('%'),
            }
        }

        out
    }
}
