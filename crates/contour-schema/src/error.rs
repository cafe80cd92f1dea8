//! Route-keyed error aggregation for schema validation.

use std::collections::BTreeMap;
use std::fmt::{self, Display};

/// Append a formatted message to an [`ErrorTree`] at the root route.
#[macro_export]
macro_rules! err {
    ($errs:expr, $($arg:tt)*) => {
        $errs.add(format!($($arg)*))
    };
}

///
/// ErrorTree
///
/// Collects validation findings keyed by the schema route they were
/// reported at (for example `user.fields.email`). Routes sort
/// deterministically so rendered output is stable.
///

#[derive(Clone, Debug, Default)]
pub struct ErrorTree {
    errors: BTreeMap<String, Vec<String>>,
}

impl ErrorTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finding at the root route.
    pub fn add(&mut self, message: impl Display) {
        self.add_at("", message);
    }

    /// Record a finding at an explicit route.
    pub fn add_at(&mut self, route: impl Into<String>, message: impl Display) {
        self.errors
            .entry(route.into())
            .or_default()
            .push(message.to_string());
    }

    /// Fold another tree into this one, prefixing its routes.
    pub fn merge_at(&mut self, prefix: &str, other: Self) {
        for (route, messages) in other.errors {
            let key = join_route(prefix, &route);
            self.errors.entry(key).or_default().extend(messages);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Total number of findings across all routes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    /// Ok when no findings were recorded, otherwise the tree itself.
    pub fn result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    /// Iterate findings as (route, message) pairs in route order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().flat_map(|(route, messages)| {
            messages.iter().map(move |m| (route.as_str(), m.as_str()))
        })
    }
}

fn join_route(prefix: &str, route: &str) -> String {
    match (prefix.is_empty(), route.is_empty()) {
        (true, _) => route.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}.{route}"),
    }
}

impl Display for ErrorTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for (route, message) in self.iter() {
            if !first {
                writeln!(f)?;
            }
            first = false;

            if route.is_empty() {
                write!(f, "{message}")?;
            } else {
                write!(f, "{route}: {message}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_tree_is_ok() {
        let errs = ErrorTree::new();
        assert!(errs.is_empty());
        assert!(errs.result().is_ok());
    }

    #[test]
    fn merge_prefixes_routes() {
        let mut inner = ErrorTree::new();
        err!(inner, "bad ident");
        inner.add_at("email", "unknown field");

        let mut outer = ErrorTree::new();
        outer.merge_at("user.fields", inner);

        let routes: Vec<_> = outer.iter().map(|(r, _)| r.to_string()).collect();
        assert_eq!(routes, vec!["user.fields", "user.fields.email"]);
    }

    #[test]
    fn display_renders_route_and_message() {
        let mut errs = ErrorTree::new();
        errs.add_at("user", "display_field 'nope' does not exist");

        let rendered = errs.to_string();
        assert_eq!(rendered, "user: display_field 'nope' does not exist");
    }
}
