use structq_common::postings_list::{InvList, Posting};

use crate::cursor::Cursor;

/// Walks the documents present in every operand list, handing each one's
/// postings (in operand order) to `match_positions`.
///
/// The first list drives the loop. Any operand running out ends the walk,
/// since no later document can be shared anymore.
fn intersect_docs(
    field: String,
    lists: &[InvList],
    match_positions: impl Fn(&[&Posting]) -> Vec<u32>,
) -> InvList {
    let mut result = InvList::empty(&field);

    let (first, rest) = match lists.split_first() {
        Some(split) => split,
        None => return result,
    };

    let mut cursors: Vec<Cursor<Posting>> = rest.iter().map(|l| Cursor::new(&l.postings)).collect();
    let mut doc_postings: Vec<&Posting> = Vec::with_capacity(lists.len());

    'docs: for posting in first.postings.iter() {
        doc_postings.clear();
        doc_postings.push(posting);

        for cursor in cursors.iter_mut() {
            cursor.advance_to(posting.doc_id);
            match cursor.current() {
                None => break 'docs,
                Some(other) if other.doc_id != posting.doc_id => continue 'docs,
                Some(other) => doc_postings.push(other),
            }
        }

        let positions = match_positions(&doc_postings);
        if !positions.is_empty() {
            result.append_posting(posting.doc_id, positions);
        }
    }

    result
}

/// `#NEAR/distance`: operands must occur in order, each within `distance`
/// positions after the previous one. Matches are recorded at the first operand's position.
pub fn near(field: String, lists: &[InvList], distance: u32) -> InvList {
    intersect_docs(field, lists, |postings| near_positions(postings, distance))
}

fn near_positions(postings: &[&Posting], distance: u32) -> Vec<u32> {
    let mut matched = Vec::new();

    let (anchor, others) = match postings.split_first() {
        Some(split) => split,
        None => return matched,
    };

    // Next unconsumed position of every non-anchor operand
    let mut next_idx = vec![0; others.len()];

    'anchors: for &anchor_pos in anchor.positions.iter() {
        let mut prev_pos = anchor_pos;

        for (operand_idx, posting) in others.iter().enumerate() {
            let positions = &posting.positions;

            loop {
                let pos = match positions.get(next_idx[operand_idx]) {
                    Some(&pos) => pos,
                    // This operand has nothing left, neither does any later anchor
                    None => break 'anchors,
                };

                if pos <= prev_pos {
                    next_idx[operand_idx] += 1;
                    continue;
                }

                if pos - prev_pos > distance {
                    continue 'anchors;
                }

                prev_pos = pos;
                break;
            }
        }

        matched.push(anchor_pos);
        for idx in next_idx.iter_mut() {
            *idx += 1;
        }
    }

    matched
}

/// `#WINDOW/distance`: all operands occur, in any order, within a span
/// where the last position minus the first is below `distance`.
/// Matches are recorded at the smallest position of the span.
pub fn window(field: String, lists: &[InvList], distance: u32) -> InvList {
    intersect_docs(field, lists, |postings| window_positions(postings, distance))
}

fn window_positions(postings: &[&Posting], distance: u32) -> Vec<u32> {
    let mut matched = Vec::new();

    if postings.is_empty() || postings.iter().any(|posting| posting.positions.is_empty()) {
        return matched;
    }

    let mut next_idx = vec![0; postings.len()];

    'windows: loop {
        // Ties on the smallest position go to the earliest operand
        let mut min_operand = 0;
        let mut min_pos = u32::MAX;
        let mut max_pos = 0u32;
        for (operand_idx, posting) in postings.iter().enumerate() {
            let pos = posting.positions[next_idx[operand_idx]];
            if pos < min_pos {
                min_pos = pos;
                min_operand = operand_idx;
            }
            max_pos = max_pos.max(pos);
        }

        if max_pos - min_pos >= distance {
            next_idx[min_operand] += 1;
            if next_idx[min_operand] >= postings[min_operand].positions.len() {
                break;
            }
            continue;
        }

        matched.push(min_pos);
        for (operand_idx, idx) in next_idx.iter_mut().enumerate() {
            *idx += 1;
            if *idx >= postings[operand_idx].positions.len() {
                break 'windows;
            }
        }
    }

    matched
}
