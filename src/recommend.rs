//! Recommendation engine: scores catalog items against a finished quiz.

use crate::catalog::{Catalog, Item};

/// How many recommendations a completed quiz yields at most.
pub const MAX_RECOMMENDATIONS: usize = 3;

/// An item together with its match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recommendation<'a> {
    pub item: &'a Item,
    pub score: usize,
}

/// Number of questions whose answer is in the item's tag set for that
/// question.
pub fn score(item: &Item, answers: &[usize]) -> usize {
    answers
        .iter()
        .enumerate()
        .filter(|&(question, &answer)| item.matches(question, answer))
        .count()
}

/// Rank the catalog against `answers` and return the best matches.
///
/// Items are ordered by score, highest first; equal scores keep catalog
/// order. The top [`MAX_RECOMMENDATIONS`] are taken and zero-score entries
/// dropped, so the result may be shorter (or empty). It is never padded.
pub fn recommend<'a>(catalog: &'a Catalog, answers: &[usize]) -> Vec<Recommendation<'a>> {
    let mut scored: Vec<Recommendation<'a>> = catalog
        .items
        .iter()
        .map(|item| Recommendation {
            item,
            score: score(item, answers),
        })
        .collect();

    // `sort_by` is stable, which keeps catalog order among ties.
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    scored
        .into_iter()
        .take(MAX_RECOMMENDATIONS)
        .filter(|r| r.score > 0)
        .collect()
}
