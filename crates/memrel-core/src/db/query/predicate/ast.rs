use crate::value::Value;
use std::{convert::Infallible, fmt, str::FromStr};

///
/// Predicate AST
///
/// Flat, chain-marked representation of a WHERE clause as the ORM layer
/// builds it. Nodes are evaluated left to right against a running boolean;
/// each node's chain marker says how it composes with that running result.
///

///
/// Chain
///

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Chain {
    Where,
    WhereNot,
    And,
    AndNot,
    Or,
    OrNot,
}

impl Chain {
    /// WHERE / AND family: cannot resurrect an excluded row.
    #[must_use]
    pub const fn is_and_family(self) -> bool {
        matches!(self, Self::Where | Self::WhereNot | Self::And | Self::AndNot)
    }

    /// OR family: cannot exclude an included row.
    #[must_use]
    pub const fn is_or_family(self) -> bool {
        matches!(self, Self::Or | Self::OrNot)
    }

    #[must_use]
    pub const fn is_negated(self) -> bool {
        matches!(self, Self::WhereNot | Self::AndNot | Self::OrNot)
    }

    #[must_use]
    pub const fn is_where(self) -> bool {
        matches!(self, Self::Where | Self::WhereNot)
    }

    /// Same family, opposite polarity.
    #[must_use]
    pub const fn negated(self) -> Self {
        match self {
            Self::Where => Self::WhereNot,
            Self::WhereNot => Self::Where,
            Self::And => Self::AndNot,
            Self::AndNot => Self::And,
            Self::Or => Self::OrNot,
            Self::OrNot => Self::Or,
        }
    }

    /// Re-anchor a sequence-leading WHERE marker onto `outer`.
    ///
    /// A nested group's first node shares the group's marker; non-WHERE
    /// markers are kept as written.
    #[must_use]
    pub const fn rebase(self, outer: Self) -> Self {
        match self {
            Self::Where => outer,
            Self::WhereNot => outer.negated(),
            other => other,
        }
    }

    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::WhereNot => "WHERE NOT",
            Self::And => "AND",
            Self::AndNot => "AND NOT",
            Self::Or => "OR",
            Self::OrNot => "OR NOT",
        }
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "WHERE" => Ok(Self::Where),
            "WHERE NOT" => Ok(Self::WhereNot),
            "AND" => Ok(Self::And),
            "AND NOT" => Ok(Self::AndNot),
            "OR" => Ok(Self::Or),
            "OR NOT" => Ok(Self::OrNot),
            _ => Err(format!("unknown chain marker '{s}'")),
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

///
/// Operator
///
/// `Unrecognized` keeps whatever token the caller sent; it evaluates to
/// false unless strict predicate validation is enabled.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Operator {
    Lt,
    Lte,
    Gt,
    Gte,
    Ne,
    Eq,
    Between,
    In,
    Is,
    IsNot,
    Like,
    Unrecognized(String),
}

impl Operator {
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Ne => "<>",
            Self::Eq => "=",
            Self::Between => "BETWEEN",
            Self::In => "IN",
            Self::Is => "IS",
            Self::IsNot => "IS NOT",
            Self::Like => "LIKE",
            Self::Unrecognized(token) => token,
        }
    }
}

impl FromStr for Operator {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        let op = match normalized.to_ascii_uppercase().as_str() {
            "<" => Self::Lt,
            "<=" => Self::Lte,
            ">" => Self::Gt,
            ">=" => Self::Gte,
            "<>" | "!=" => Self::Ne,
            "=" => Self::Eq,
            "BETWEEN" => Self::Between,
            "IN" => Self::In,
            "IS" => Self::Is,
            "IS NOT" => Self::IsNot,
            "LIKE" => Self::Like,
            _ => Self::Unrecognized(s.to_string()),
        };

        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

///
/// Condition
///
/// Leaf comparison: `<chain> <property> <operator> <value>`.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    pub chain: Chain,
    pub operator: Operator,
    pub property: String,
    pub value: Value,
}

impl Condition {
    #[must_use]
    pub fn new(
        chain: Chain,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            chain,
            operator,
            property: property.into(),
            value: value.into(),
        }
    }
}

///
/// PredicateNode
///
/// A group shares its chain marker with the parent sequence: the marker
/// decides short-circuiting at the parent level, and the nested nodes then
/// continue from the parent's running result.
///

#[derive(Clone, Debug, PartialEq)]
pub enum PredicateNode {
    Leaf(Condition),
    Group {
        chain: Chain,
        nodes: Vec<Self>,
    },
}

impl PredicateNode {
    #[must_use]
    pub const fn chain(&self) -> Chain {
        match self {
            Self::Leaf(condition) => condition.chain,
            Self::Group { chain, .. } => *chain,
        }
    }

    #[must_use]
    pub fn leaf(
        chain: Chain,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self::Leaf(Condition::new(chain, property, operator, value))
    }

    #[must_use]
    pub const fn group(chain: Chain, nodes: Vec<Self>) -> Self {
        Self::Group { chain, nodes }
    }
}

impl From<Condition> for PredicateNode {
    fn from(condition: Condition) -> Self {
        Self::Leaf(condition)
    }
}

///
/// Predicate
///
/// Builder for a top-level predicate sequence.
///
///   Predicate::where_("Color", Operator::Eq, "Red").and("Year", Operator::Gt, 2020)
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Predicate {
    nodes: Vec<PredicateNode>,
}

impl Predicate {
    /// Empty predicate; matches every row.
    #[must_use]
    pub const fn all() -> Self {
        Self { nodes: Vec::new() }
    }

    #[must_use]
    pub const fn from_nodes(nodes: Vec<PredicateNode>) -> Self {
        Self { nodes }
    }

    #[must_use]
    pub fn where_(property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        Self::all().push(Chain::Where, property, operator, value)
    }

    #[must_use]
    pub fn where_not(
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        Self::all().push(Chain::WhereNot, property, operator, value)
    }

    #[must_use]
    pub fn and(self, property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Chain::And, property, operator, value)
    }

    #[must_use]
    pub fn and_not(
        self,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.push(Chain::AndNot, property, operator, value)
    }

    #[must_use]
    pub fn or(self, property: impl Into<String>, operator: Operator, value: impl Into<Value>) -> Self {
        self.push(Chain::Or, property, operator, value)
    }

    #[must_use]
    pub fn or_not(
        self,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.push(Chain::OrNot, property, operator, value)
    }

    /// Append a nested group under `chain`.
    ///
    /// The nested sequence's leading WHERE marker is rebased onto `chain` so
    /// the group continues from the parent's running result.
    #[must_use]
    pub fn group(mut self, chain: Chain, nested: Self) -> Self {
        let mut nodes = nested.nodes;
        if let Some(first) = nodes.first_mut() {
            match first {
                PredicateNode::Leaf(condition) => condition.chain = condition.chain.rebase(chain),
                PredicateNode::Group { chain: inner, .. } => *inner = inner.rebase(chain),
            }
        }
        self.nodes.push(PredicateNode::group(chain, nodes));
        self
    }

    fn push(
        mut self,
        chain: Chain,
        property: impl Into<String>,
        operator: Operator,
        value: impl Into<Value>,
    ) -> Self {
        self.nodes
            .push(PredicateNode::leaf(chain, property, operator, value));
        self
    }

    #[must_use]
    pub fn nodes(&self) -> &[PredicateNode] {
        &self.nodes
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl From<Vec<PredicateNode>> for Predicate {
    fn from(nodes: Vec<PredicateNode>) -> Self {
        Self::from_nodes(nodes)
    }
}
