use crate::{
    db::query::predicate::{Operator, PredicateNode},
    error::Error,
};

/// Strict-mode predicate validation.
///
/// Rejects unrecognized operators anywhere in the tree, and a top-level
/// sequence whose first node is not WHERE / WHERE NOT.
pub(crate) fn validate(nodes: &[PredicateNode]) -> Result<(), Error> {
    if let Some(first) = nodes.first()
        && !first.chain().is_where()
    {
        let property = match first {
            PredicateNode::Leaf(condition) => condition.property.as_str(),
            PredicateNode::Group { .. } => "(group)",
        };

        return Err(Error::malformed_predicate(
            property,
            format!("sequence must open with WHERE, found {}", first.chain()),
        ));
    }

    validate_operators(nodes)
}

fn validate_operators(nodes: &[PredicateNode]) -> Result<(), Error> {
    for node in nodes {
        match node {
            PredicateNode::Group { nodes, .. } => validate_operators(nodes)?,
            PredicateNode::Leaf(condition) => {
                if let Operator::Unrecognized(token) = &condition.operator {
                    return Err(Error::malformed_predicate(
                        &condition.property,
                        format!("unrecognized operator '{token}'"),
                    ));
                }
            }
        }
    }

    Ok(())
}
