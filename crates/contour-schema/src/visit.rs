//! Visitor used to walk the schema node tree with route tracking.

use crate::{error::ErrorTree, node::ValidateNode};

///
/// Visitor
///

pub trait Visitor {
    fn enter(&mut self, node: &dyn ValidateNode);

    fn exit(&mut self, _node: &dyn ValidateNode) {}

    /// Push a route segment before descending into a child.
    fn push(&mut self, _segment: &str) {}

    fn pop(&mut self) {}
}

///
/// ValidateVisitor
///
/// Runs each node's local validation, aggregating findings into a
/// route-keyed [`ErrorTree`] so a failure reads as
/// `user.fields.email: ...`.
///

#[derive(Debug, Default)]
pub struct ValidateVisitor {
    path: Vec<String>,
    pub errors: ErrorTree,
}

impl ValidateVisitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn route(&self) -> String {
        self.path.join(".")
    }
}

impl Visitor for ValidateVisitor {
    fn enter(&mut self, node: &dyn ValidateNode) {
        if let Err(errs) = node.validate() {
            self.errors.merge_at(&self.route(), errs);
        }
    }

    fn push(&mut self, segment: &str) {
        self.path.push(segment.to_string());
    }

    fn pop(&mut self) {
        self.path.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;

    #[test]
    fn routes_follow_the_node_tree() {
        let schema = Schema::new()
            .try_with_model(
                Model::new("user")
                    .try_with_field(Field::new("BadName"))
                    .unwrap(),
            )
            .unwrap();

        let mut visitor = ValidateVisitor::new();
        schema.accept(&mut visitor);

        let err = visitor.errors.result().unwrap_err();
        let routes: Vec<_> = err.iter().map(|(r, _)| r.to_string()).collect();
        assert_eq!(routes, vec!["user.fields.BadName"]);
    }
}
