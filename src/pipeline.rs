use serde::Serialize;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::{
    agent::{Classifier, OpenAIAgent, RelevanceClassifier},
    config::Config,
    error::Result,
    matcher::match_papers_with_interests,
    notify::{notify_all, LogNotifier, Notifier, SlackNotifier},
    parser::{ArxivParser, PaperSource}
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub fetched: usize,
    pub matched: usize,
    pub notified: usize,
    pub failed: usize,
}

/// Wires the arXiv source, the OpenAI classifier and the configured notifier
/// together and runs them once.
pub async fn run(config: &Config) -> Result<RunReport> {
    let source = ArxivParser::new(config.arxiv.clone());
    let classifier = RelevanceClassifier::new(OpenAIAgent::new(&config.classifier)?);
    let notifier: Box<dyn Notifier> = match &config.slack {
        Some(slack) => Box::new(SlackNotifier::new(slack.clone())),
        None => Box::new(LogNotifier),
    };
    run_with(&source, &classifier, notifier.as_ref(), &config.interests).await
}

pub async fn run_with(
    source: &dyn PaperSource,
    classifier: &dyn Classifier,
    notifier: &dyn Notifier,
    interests: &[String]
) -> Result<RunReport> {
    let run_id = Uuid::new_v4();
    execute(run_id, source, classifier, notifier, interests)
        .instrument(info_span!("run", %run_id))
        .await
}

async fn execute(
    run_id: Uuid,
    source: &dyn PaperSource,
    classifier: &dyn Classifier,
    notifier: &dyn Notifier,
    interests: &[String]
) -> Result<RunReport> {
    // no point fetching anything the classifier could never judge.
    classifier.preflight()?;

    let papers = source.fetch_recent_papers().await?;
    let fetched = papers.len();

    let matched = match_papers_with_interests(papers, interests, classifier).await?;
    let delivery = notify_all(notifier, &matched).await;

    let report = RunReport {
        run_id,
        fetched,
        matched: matched.len(),
        notified: delivery.notified,
        failed: delivery.failed
    };
    info!(
        fetched = report.fetched,
        matched = report.matched,
        notified = report.notified,
        failed = report.failed,
        "run finished"
    );
    Ok(report)
}
