use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Binary comparison used by size/time filters and query predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    /// Longest symbols first so prefix matching never splits `>=` into `>`
    const BY_PREFIX: [CompareOp; 6] = [
        CompareOp::Le,
        CompareOp::Ge,
        CompareOp::Ne,
        CompareOp::Eq,
        CompareOp::Gt,
        CompareOp::Lt,
    ];

    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "!=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }

    /// Logical negation: `=`/`!=`, `>=`/`<`, `>`/`<=`
    pub fn inverse(self) -> Self {
        match self {
            CompareOp::Eq => CompareOp::Ne,
            CompareOp::Ne => CompareOp::Eq,
            CompareOp::Gt => CompareOp::Le,
            CompareOp::Le => CompareOp::Gt,
            CompareOp::Ge => CompareOp::Lt,
            CompareOp::Lt => CompareOp::Ge,
        }
    }

    /// Evaluate `lhs <op> rhs`
    pub fn matches<T: PartialOrd>(self, lhs: T, rhs: T) -> bool {
        match self {
            CompareOp::Eq => lhs == rhs,
            CompareOp::Ne => lhs != rhs,
            CompareOp::Gt => lhs > rhs,
            CompareOp::Ge => lhs >= rhs,
            CompareOp::Lt => lhs < rhs,
            CompareOp::Le => lhs <= rhs,
        }
    }

    /// Whether a coarse bucket may hold values satisfying `<op> target`.
    ///
    /// Ordered comparisons keep the target's own bucket since it straddles
    /// the boundary; `!=` keeps every bucket.
    pub fn admits_bucket<T: Ord>(self, bucket: T, target: T) -> bool {
        match self {
            CompareOp::Gt | CompareOp::Ge => bucket >= target,
            CompareOp::Lt | CompareOp::Le => bucket <= target,
            CompareOp::Eq => bucket == target,
            CompareOp::Ne => true,
        }
    }

    /// Split a leading operator off `s`
    pub fn strip_prefix(s: &str) -> Option<(CompareOp, &str)> {
        Self::BY_PREFIX
            .iter()
            .find_map(|&op| s.strip_prefix(op.symbol()).map(|rest| (op, rest)))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error for an operator symbol outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operator: {0:?}")]
pub struct UnknownOperator(pub String);

impl FromStr for CompareOp {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::BY_PREFIX
            .iter()
            .copied()
            .find(|op| op.symbol() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

/// Operator attached to a parsed predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    Cmp(CompareOp),
    /// Value is a comma-separated list the field must be in
    In,
    /// Value is a comma-separated list the field must not be in
    Nin,
}

impl Operator {
    pub const EQ: Operator = Operator::Cmp(CompareOp::Eq);

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Cmp(op) => op.symbol(),
            Operator::In => "in",
            Operator::Nin => "nin",
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            Operator::Cmp(op) => Operator::Cmp(op.inverse()),
            Operator::In => Operator::Nin,
            Operator::Nin => Operator::In,
        }
    }

    /// True for exclusions: `!=` and `nin`
    pub fn is_negative(self) -> bool {
        matches!(self, Operator::Cmp(CompareOp::Ne) | Operator::Nin)
    }

    /// Comparison form, if this is one
    pub fn compare(self) -> Option<CompareOp> {
        match self {
            Operator::Cmp(op) => Some(op),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Operator::In),
            "nin" => Ok(Operator::Nin),
            _ => s.parse().map(Operator::Cmp),
        }
    }
}

impl Serialize for Operator {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}
