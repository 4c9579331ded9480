use std::fmt;

use structq_common::DEFAULT_FIELD;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightKind {
    /// Weighted geometric combination
    Wand,
    /// Weighted arithmetic combination
    Wsum,
}

impl WeightKind {
    #[inline(always)]
    pub(crate) fn identity(self) -> f64 {
        match self {
            WeightKind::Wand => 1.0,
            WeightKind::Wsum => 0.0,
        }
    }

    /// Folds one operand score with its normalized weight into the accumulator.
    #[inline(always)]
    pub(crate) fn combine(self, acc: f64, score: f64, normalized_weight: f64) -> f64 {
        match self {
            WeightKind::Wand => acc * score.powf(normalized_weight),
            WeightKind::Wsum => acc + score * normalized_weight,
        }
    }
}

/// A parsed structured query.
///
/// The tree is immutable once built. TERM, SYN, NEAR and WINDOW produce
/// inverted lists, everything else produces score lists.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryNode {
    Term { term: String, field: String },
    Syn(Vec<QueryNode>),
    Near { distance: u32, children: Vec<QueryNode> },
    Window { distance: u32, children: Vec<QueryNode> },
    And(Vec<QueryNode>),
    Or(Vec<QueryNode>),
    Sum(Vec<QueryNode>),
    /// `weights[i]` belongs to `children[i]`
    Weighted { kind: WeightKind, weights: Vec<f64>, children: Vec<QueryNode> },
    Score(Box<QueryNode>),
}

impl QueryNode {
    pub fn term(term: &str) -> Self {
        QueryNode::field_term(term, DEFAULT_FIELD)
    }

    pub fn field_term(term: &str, field: &str) -> Self {
        QueryNode::Term { term: term.to_owned(), field: field.to_owned() }
    }

    pub fn near(distance: u32, children: Vec<QueryNode>) -> Self {
        QueryNode::Near { distance, children }
    }

    pub fn window(distance: u32, children: Vec<QueryNode>) -> Self {
        QueryNode::Window { distance, children }
    }

    pub fn wand(weighted_children: Vec<(f64, QueryNode)>) -> Self {
        QueryNode::weighted(WeightKind::Wand, weighted_children)
    }

    pub fn wsum(weighted_children: Vec<(f64, QueryNode)>) -> Self {
        QueryNode::weighted(WeightKind::Wsum, weighted_children)
    }

    fn weighted(kind: WeightKind, weighted_children: Vec<(f64, QueryNode)>) -> Self {
        let (weights, children) = weighted_children.into_iter().unzip();
        QueryNode::Weighted { kind, weights, children }
    }

    pub fn score(child: QueryNode) -> Self {
        QueryNode::Score(Box::new(child))
    }

    /// Whether this node evaluates to an inverted list rather than a score list
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            QueryNode::Term { .. } | QueryNode::Syn(_) | QueryNode::Near { .. } | QueryNode::Window { .. }
        )
    }

    pub fn children(&self) -> &[QueryNode] {
        match self {
            QueryNode::Term { .. } => &[],
            QueryNode::Syn(children)
            | QueryNode::And(children)
            | QueryNode::Or(children)
            | QueryNode::Sum(children)
            | QueryNode::Near { children, .. }
            | QueryNode::Window { children, .. }
            | QueryNode::Weighted { children, .. } => children,
            QueryNode::Score(child) => std::slice::from_ref(child.as_ref()),
        }
    }

    /// Operator keyword, e.g. `#NEAR/3`. Terms render as `term.field`.
    pub fn operator_name(&self) -> String {
        match self {
            QueryNode::Term { term, field } => format!("{}.{}", term, field),
            QueryNode::Syn(_) => "#SYN".to_owned(),
            QueryNode::Near { distance, .. } => format!("#NEAR/{}", distance),
            QueryNode::Window { distance, .. } => format!("#WINDOW/{}", distance),
            QueryNode::And(_) => "#AND".to_owned(),
            QueryNode::Or(_) => "#OR".to_owned(),
            QueryNode::Sum(_) => "#SUM".to_owned(),
            QueryNode::Weighted { kind: WeightKind::Wand, .. } => "#WAND".to_owned(),
            QueryNode::Weighted { kind: WeightKind::Wsum, .. } => "#WSUM".to_owned(),
            QueryNode::Score(_) => "#SCORE".to_owned(),
        }
    }
}

impl fmt::Display for QueryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let QueryNode::Term { .. } = self {
            return f.write_str(&self.operator_name());
        }

        write!(f, "{}(", self.operator_name())?;
        if let QueryNode::Weighted { weights, children, .. } = self {
            for (weight, child) in weights.iter().zip(children.iter()) {
                write!(f, " {} {}", weight, child)?;
            }
        } else {
            for child in self.children() {
                write!(f, " {}", child)?;
            }
        }
        f.write_str(" )")
    }
}
