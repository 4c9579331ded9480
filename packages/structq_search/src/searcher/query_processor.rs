mod proximity;
mod scoring;

use structq_common::postings_list::{InvList, Posting};
use structq_common::q_debug;
use structq_common::retrieval_model::RetrievalModel;

use crate::cursor::{min_doc_id, Cursor};
use crate::query_tree::{QueryNode, WeightKind};
use crate::score_list::{DocScore, ScoreList};
use crate::searcher::Searcher;
use crate::QueryError;

pub(crate) use scoring::{DefaultScorer, Scored};

/// Position-level union of the operands, as if they were one term.
fn synonym_union(field: String, lists: &[InvList]) -> InvList {
    let mut result = InvList::empty(&field);

    let mut cursors: Vec<Cursor<Posting>> = lists.iter().map(|l| Cursor::new(&l.postings)).collect();
    while let Some(doc_id) = min_doc_id(&cursors) {
        let mut merged: Option<Posting> = None;
        for cursor in cursors.iter_mut() {
            if let Some(posting) = cursor.take_if_at(doc_id) {
                merged = Some(match merged {
                    Some(acc) => Posting::merge(&acc, posting),
                    None => posting.clone(),
                });
            }
        }

        if let Some(posting) = merged {
            result.append_posting(posting.doc_id, posting.positions);
        }
    }

    result
}

/// Union of score lists, folding the scores of operands that share a document.
fn merge_union(operands: &[Scored], fold: impl Fn(f64, f64) -> f64) -> ScoreList {
    let mut cursors: Vec<Cursor<DocScore>> = operands.iter().map(|o| Cursor::new(&o.scores.scores)).collect();
    let mut scores = ScoreList::with_capacity(operands.iter().map(|o| o.scores.len()).max().unwrap_or(0));

    while let Some(doc_id) = min_doc_id(&cursors) {
        let mut score: Option<f64> = None;
        for cursor in cursors.iter_mut() {
            if let Some(entry) = cursor.take_if_at(doc_id) {
                score = Some(match score {
                    Some(acc) => fold(acc, entry.score),
                    None => entry.score,
                });
            }
        }

        if let Some(score) = score {
            scores.add(doc_id, score);
        }
    }

    scores
}

fn validate_weights(node: &QueryNode, weights: &[f64], children: &[QueryNode]) -> Result<(), QueryError> {
    if weights.len() != children.len() {
        return Err(QueryError::MalformedQuery(format!(
            "{} has {} weights for {} arguments",
            node.operator_name(),
            weights.len(),
            children.len(),
        )));
    }

    if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return Err(QueryError::MalformedQuery(format!(
            "{} weights must be finite and non-negative",
            node.operator_name(),
        )));
    }

    if !children.is_empty() && weights.iter().sum::<f64>() <= 0.0 {
        return Err(QueryError::MalformedQuery(format!("{} weights sum to zero", node.operator_name())));
    }

    Ok(())
}

fn missing_arguments(node: &QueryNode) -> QueryError {
    QueryError::MalformedQuery(format!("{} requires at least one argument", node.operator_name()))
}

impl<'a> Searcher<'a> {
    fn check_supported(&self, node: &QueryNode) -> Result<(), QueryError> {
        let supported = match node {
            QueryNode::And(_) => !matches!(self.model, RetrievalModel::Bm25(_)),
            QueryNode::Or(_) => self.model.is_boolean(),
            QueryNode::Sum(_) => matches!(self.model, RetrievalModel::Bm25(_)),
            QueryNode::Weighted { .. } => matches!(self.model, RetrievalModel::Indri(_)),
            _ => true,
        };

        if supported {
            Ok(())
        } else {
            Err(QueryError::UnsupportedOperator { operator: node.operator_name(), model: self.model.name() })
        }
    }

    pub(crate) fn evaluate_postings(&self, node: &QueryNode) -> Result<InvList, QueryError> {
        let list = match node {
            QueryNode::Term { term, field } => self.index.inverted_list(term, field),
            QueryNode::Syn(children) => {
                let (field, lists) = self.evaluate_operand_lists(node, children)?;
                synonym_union(field, &lists)
            }
            QueryNode::Near { distance, children } => {
                let (field, lists) = self.evaluate_operand_lists(node, children)?;
                proximity::near(field, &lists, *distance)
            }
            QueryNode::Window { distance, children } => {
                let (field, lists) = self.evaluate_operand_lists(node, children)?;
                proximity::window(field, &lists, *distance)
            }
            _ => return Err(QueryError::InvalidArgument { operator: node.operator_name() }),
        };

        q_debug!("{} matched {} documents", node.operator_name(), list.df());

        Ok(list)
    }

    /// Evaluates the operands of a structural operator, which must all be
    /// structural themselves and share one field.
    fn evaluate_operand_lists(
        &self,
        node: &QueryNode,
        children: &[QueryNode],
    ) -> Result<(String, Vec<InvList>), QueryError> {
        let mut lists: Vec<InvList> = Vec::with_capacity(children.len());

        for child in children {
            if !child.is_structural() {
                return Err(QueryError::InvalidArgument { operator: node.operator_name() });
            }

            let list = self.evaluate_postings(child)?;
            if let Some(first) = lists.first() {
                if first.field != list.field {
                    return Err(QueryError::FieldMismatch {
                        operator: node.operator_name(),
                        expected: first.field.clone(),
                        found: list.field,
                    });
                }
            }
            lists.push(list);
        }

        match lists.first() {
            Some(first) => Ok((first.field.clone(), lists)),
            None => Err(missing_arguments(node)),
        }
    }

    pub(crate) fn evaluate_scores(&self, node: &QueryNode) -> Result<Scored, QueryError> {
        self.check_supported(node)?;

        let scored = match node {
            QueryNode::Term { .. } | QueryNode::Syn(_) | QueryNode::Near { .. } | QueryNode::Window { .. } => {
                self.score_postings(&self.evaluate_postings(node)?)
            }
            QueryNode::Score(child) => {
                if child.is_structural() {
                    self.score_postings(&self.evaluate_postings(child)?)
                } else {
                    self.evaluate_scores(child)?
                }
            }
            QueryNode::And(children) => {
                let operands = self.evaluate_operands(node, children)?;
                if let RetrievalModel::Indri(_) = self.model {
                    let weights = vec![1.0; operands.len()];
                    self.combine_weighted(WeightKind::Wand, &weights, operands)
                } else {
                    self.boolean_and(operands)
                }
            }
            QueryNode::Or(children) => {
                let operands = self.evaluate_operands(node, children)?;
                let scores = if let RetrievalModel::RankedBoolean = self.model {
                    merge_union(&operands, f64::max)
                } else {
                    merge_union(&operands, |_, _| 1.0)
                };
                Scored::without_defaults(scores)
            }
            QueryNode::Sum(children) => {
                let operands = self.evaluate_operands(node, children)?;
                Scored::without_defaults(merge_union(&operands, |acc, score| acc + score))
            }
            QueryNode::Weighted { kind, weights, children } => {
                validate_weights(node, weights, children)?;
                let operands = self.evaluate_operands(node, children)?;
                self.combine_weighted(*kind, weights, operands)
            }
        };

        q_debug!("{} scored {} documents", node.operator_name(), scored.scores.len());

        Ok(scored)
    }

    fn evaluate_operands(&self, node: &QueryNode, children: &[QueryNode]) -> Result<Vec<Scored>, QueryError> {
        if children.is_empty() {
            return Err(missing_arguments(node));
        }

        children.iter().map(|child| self.evaluate_scores(child)).collect()
    }

    /// Documents matched by every operand. Unranked boolean scores 1.0,
    /// ranked boolean keeps the lowest operand score.
    fn boolean_and(&self, mut operands: Vec<Scored>) -> Scored {
        let is_ranked = matches!(self.model, RetrievalModel::RankedBoolean);

        // Shortest list drives the loop
        operands.sort_by_key(|operand| operand.scores.len());

        let (shortest, rest) = match operands.split_first() {
            Some(split) => split,
            None => return Scored::without_defaults(ScoreList::new()),
        };

        let mut cursors: Vec<Cursor<DocScore>> = rest.iter().map(|o| Cursor::new(&o.scores.scores)).collect();
        let mut scores = ScoreList::with_capacity(shortest.scores.len());

        'docs: for entry in shortest.scores.scores.iter() {
            let mut score = entry.score;

            for cursor in cursors.iter_mut() {
                cursor.advance_to(entry.doc_id);
                match cursor.current() {
                    None => break 'docs,
                    Some(other) if other.doc_id != entry.doc_id => continue 'docs,
                    Some(other) => score = score.min(other.score),
                }
            }

            scores.add(entry.doc_id, if is_ranked { score } else { 1.0 });
        }

        Scored::without_defaults(scores)
    }

    /// Weighted combination over the union of the operands' documents.
    ///
    /// Operands that do not contain a document contribute their default score for it.
    fn combine_weighted(&self, kind: WeightKind, weights: &[f64], operands: Vec<Scored>) -> Scored {
        let total_weight: f64 = weights.iter().sum();
        let normalized_weights: Vec<f64> = weights.iter().map(|w| w / total_weight).collect();

        let mut cursors: Vec<Cursor<DocScore>> =
            operands.iter().map(|o| Cursor::new(&o.scores.scores)).collect();
        let mut scores = ScoreList::with_capacity(operands.iter().map(|o| o.scores.len()).max().unwrap_or(0));

        while let Some(doc_id) = min_doc_id(&cursors) {
            let mut score = kind.identity();

            for ((cursor, operand), &weight) in cursors.iter_mut().zip(operands.iter()).zip(normalized_weights.iter()) {
                let operand_score = match cursor.take_if_at(doc_id) {
                    Some(entry) => entry.score,
                    None => operand.defaults.score(self.index, doc_id),
                };
                score = kind.combine(score, operand_score, weight);
            }

            scores.add(doc_id, score);
        }

        let defaults = DefaultScorer::Combined {
            kind,
            weights: normalized_weights,
            children: operands.into_iter().map(|operand| operand.defaults).collect(),
        };

        Scored { scores, defaults }
    }

    /// Builds the default score function of a node without scoring its documents.
    pub(crate) fn default_scorer(&self, node: &QueryNode) -> Result<DefaultScorer, QueryError> {
        self.check_supported(node)?;

        match node {
            QueryNode::Term { .. } | QueryNode::Syn(_) | QueryNode::Near { .. } | QueryNode::Window { .. } => {
                Ok(self.postings_default_scorer(&self.evaluate_postings(node)?))
            }
            QueryNode::Score(child) => self.default_scorer(child),
            QueryNode::And(children) => {
                if children.is_empty() {
                    return Err(missing_arguments(node));
                }

                if let RetrievalModel::Indri(_) = self.model {
                    let weight = 1.0 / children.len() as f64;
                    Ok(DefaultScorer::Combined {
                        kind: WeightKind::Wand,
                        weights: vec![weight; children.len()],
                        children: self.default_scorers(children)?,
                    })
                } else {
                    Ok(DefaultScorer::Zero)
                }
            }
            QueryNode::Weighted { kind, weights, children } => {
                validate_weights(node, weights, children)?;
                if children.is_empty() {
                    return Err(missing_arguments(node));
                }

                let total_weight: f64 = weights.iter().sum();
                Ok(DefaultScorer::Combined {
                    kind: *kind,
                    weights: weights.iter().map(|w| w / total_weight).collect(),
                    children: self.default_scorers(children)?,
                })
            }
            QueryNode::Or(_) | QueryNode::Sum(_) => Ok(DefaultScorer::Zero),
        }
    }

    fn default_scorers(&self, children: &[QueryNode]) -> Result<Vec<DefaultScorer>, QueryError> {
        children.iter().map(|child| self.default_scorer(child)).collect()
    }
}
