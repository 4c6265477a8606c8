use tracing::{debug, info};

use crate::{
    agent::Classifier,
    error::Result,
    model::Paper
};

/// Keeps the papers relevant to at least one interest, in source order.
///
/// Interests are tried in order and the first match wins: a matched paper is
/// not checked against the remaining interests, and is added exactly once.
pub async fn match_papers_with_interests<C>(
    papers: Vec<Paper>,
    interests: &[String],
    classifier: &C
) -> Result<Vec<Paper>>
where
    C: Classifier + ?Sized,
{
    let total = papers.len();
    let mut matched: Vec<Paper> = Vec::new();
    for paper in papers {
        for interest in interests {
            if classifier.is_relevant(&paper.summary, interest).await? {
                debug!(title = %paper.title, interest = %interest, "paper matched");
                matched.push(paper);
                break;
            }
        }
    }
    info!(total, matched = matched.len(), "matched papers against interests");
    Ok(matched)
}
