use std::fmt;
use std::sync::Arc;

use completion::CompletionClient;
use semantic::Embedder;
use tracing::{debug, warn};

use crate::assemble::assemble;
use crate::parse::{parse_extraction, parse_shape, ParsedReply};
use crate::prompt::{extraction_prompt, shaping_prompt};
use crate::{CatalogIndex, PromptStage, Resolution, ResolveError, ResolverConfig};

/// Pipeline position of one question, for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    Init,
    MetricExtracted,
    CandidatesRanked,
    ShapeResolved,
    Done,
    Failed,
}

impl fmt::Display for ResolveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::MetricExtracted => "metric_extracted",
            Self::CandidatesRanked => "candidates_ranked",
            Self::ShapeResolved => "shape_resolved",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything needed to answer questions against one catalog.
///
/// Built once at start-up and shared; `resolve` takes `&self`.
#[derive(Debug, Clone)]
pub struct ResolverContext {
    index: Arc<CatalogIndex>,
    embedder: Embedder,
    completion: CompletionClient,
    config: ResolverConfig,
}

impl ResolverContext {
    pub fn new(
        index: Arc<CatalogIndex>,
        embedder: Embedder,
        completion: CompletionClient,
        config: ResolverConfig,
    ) -> Result<Self, ResolveError> {
        config.validate()?;
        Ok(Self {
            index,
            embedder,
            completion,
            config,
        })
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Runs both completion rounds for `question` and assembles the query.
    ///
    /// `top_k` falls back to the configured default and is clamped to the
    /// catalog size by the ranking.
    pub async fn resolve(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<Resolution, ResolveError> {
        let result = self.run(question, top_k.unwrap_or(self.config.top_k)).await;
        if let Err(err) = &result {
            warn!(state = %ResolveState::Failed, question, error = %err, "resolution failed");
        }
        result
    }

    async fn run(&self, question: &str, top_k: usize) -> Result<Resolution, ResolveError> {
        debug!(state = %ResolveState::Init, question, top_k, "resolving question");

        let reply = self.ask(&extraction_prompt(question)).await?;
        let extracted_metric = match parse_extraction(&reply) {
            ParsedReply::WellFormed(metric) => metric,
            ParsedReply::Malformed { reason } => {
                return Err(ResolveError::MalformedCompletionResponse {
                    stage: PromptStage::Extraction,
                    reason,
                })
            }
        };
        debug!(state = %ResolveState::MetricExtracted, metric = %extracted_metric, "metric extracted");

        let query = self.embedder.embed(&extracted_metric).await?;
        let candidates = self.index.rank(&query, top_k)?;
        debug!(
            state = %ResolveState::CandidatesRanked,
            candidates = candidates.len(),
            best = candidates.first().map(|c| c.entry.name.as_str()).unwrap_or(""),
            "candidates ranked"
        );

        let reply = self.ask(&shaping_prompt(question, &candidates)).await?;
        let resolved = match parse_shape(&reply) {
            ParsedReply::WellFormed(resolved) => resolved,
            ParsedReply::Malformed { reason } => {
                return Err(ResolveError::MalformedCompletionResponse {
                    stage: PromptStage::Shaping,
                    reason,
                })
            }
        };
        debug!(state = %ResolveState::ShapeResolved, metric = %resolved.metric, "shape resolved");

        if self.config.strict_candidates
            && !resolved.metric.is_empty()
            && !candidates.iter().any(|c| c.entry.name == resolved.metric)
        {
            return Err(ResolveError::UnknownMetricSelection(resolved.metric));
        }

        let descriptor = assemble(&resolved)?;
        debug!(
            state = %ResolveState::Done,
            metric = %descriptor.metric,
            dimensions = %descriptor.dimensions,
            filters = %descriptor.filters,
            "query assembled"
        );

        Ok(Resolution {
            question: question.to_string(),
            extracted_metric,
            candidates,
            resolved,
            descriptor,
        })
    }

    async fn ask(&self, prompt: &str) -> Result<String, ResolveError> {
        self.completion
            .complete(prompt, self.config.max_retries, &self.config.model)
            .await
            .map_err(ResolveError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog::{CatalogSnapshot, MetricEntry};
    use completion::{CompletionError, CompletionService};
    use semantic::SemanticConfig;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct Scripted {
        replies: Mutex<VecDeque<Result<String, CompletionError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(replies: Vec<Result<String, CompletionError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn replying(replies: &[&str]) -> Arc<Self> {
            Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl CompletionService for Scripted {
        async fn complete_once(&self, prompt: &str, _model: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(CompletionError::RateLimited))
        }
    }

    fn snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(vec![
            MetricEntry::new("dau", "Daily active users", ["day", "country"]),
            MetricEntry::new("revenue", "Total revenue", ["region", "day"]),
            MetricEntry::new("churn", "Churn rate", ["month"]),
        ])
    }

    async fn context(service: Arc<Scripted>, config: ResolverConfig) -> ResolverContext {
        let embedder = Embedder::new(SemanticConfig::stub()).unwrap();
        let index = CatalogIndex::build(snapshot(), &embedder).await.unwrap();
        let completion = CompletionClient::new(service, Duration::from_secs(60));
        ResolverContext::new(Arc::new(index), embedder, completion, config).unwrap()
    }

    #[tokio::test]
    async fn resolves_question_end_to_end() {
        let service = Scripted::replying(&[
            "Metric: Total revenue",
            "Metric: revenue\nGroupBys: region, day\nFilters: day='2024-01-01'",
        ]);
        let ctx = context(service.clone(), ResolverConfig::default()).await;

        let resolution = ctx.resolve("revenue by region on new year", None).await.unwrap();
        assert_eq!(resolution.extracted_metric, "Total revenue");
        assert_eq!(resolution.candidates.len(), 3);
        assert_eq!(resolution.candidates[0].entry.name, "revenue");
        assert_eq!(resolution.descriptor.metric, "revenue");
        assert_eq!(resolution.descriptor.dimensions, "region,day");
        assert_eq!(resolution.descriptor.filters, "day='2024-01-01'");

        let prompts = service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("'revenue by region on new year'"));
        assert!(prompts[1].contains("revenue (Total revenue): [region, day]"));
    }

    #[tokio::test]
    async fn top_k_limits_candidates() {
        let service = Scripted::replying(&[
            "Metric: Churn rate",
            "Metric: churn\nGroupBys: month\nFilters: ",
        ]);
        let ctx = context(service.clone(), ResolverConfig::default()).await;

        let resolution = ctx.resolve("monthly churn", Some(1)).await.unwrap();
        assert_eq!(resolution.candidates.len(), 1);
        assert_eq!(resolution.candidates[0].entry.name, "churn");
        assert_eq!(resolution.descriptor.filters, "");

        let prompts = service.prompts.lock().unwrap();
        assert!(!prompts[1].contains("dau (Daily active users)"));
    }

    #[tokio::test]
    async fn stage_one_without_label_never_reaches_stage_two() {
        let service = Scripted::replying(&["revenue", "Metric: revenue\nGroupBys: \nFilters: "]);
        let ctx = context(service.clone(), ResolverConfig::default()).await;

        let err = ctx.resolve("revenue?", None).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MalformedCompletionResponse {
                stage: PromptStage::Extraction,
                ..
            }
        ));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn stage_one_reply_with_explanation_is_malformed() {
        let service = Scripted::replying(&[
            "Metric: revenue\nThe user wants total sales.",
            "Metric: revenue\nGroupBys: \nFilters: ",
        ]);
        let ctx = context(service.clone(), ResolverConfig::default()).await;

        let err = ctx.resolve("revenue?", None).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MalformedCompletionResponse {
                stage: PromptStage::Extraction,
                ..
            }
        ));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn two_line_stage_two_reply_is_malformed() {
        let service = Scripted::replying(&["Metric: revenue", "Metric: revenue\nGroupBys: region"]);
        let ctx = context(service, ResolverConfig::default()).await;

        let err = ctx.resolve("revenue by region", None).await.unwrap_err();
        assert!(matches!(
            err,
            ResolveError::MalformedCompletionResponse {
                stage: PromptStage::Shaping,
                ..
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn always_rate_limited_exhausts_configured_retries() {
        let service = Scripted::new(Vec::new());
        let config = ResolverConfig::default().with_completion("gpt-3.5-turbo", 3);
        let ctx = context(service.clone(), config).await;

        let err = ctx.resolve("revenue", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::RateLimitExhausted { attempts: 3 }));
        assert_eq!(service.calls(), 3);
    }

    #[tokio::test]
    async fn service_failure_is_not_retried() {
        let service = Scripted::new(vec![Err(CompletionError::Service("HTTP error 500".into()))]);
        let ctx = context(service.clone(), ResolverConfig::default()).await;

        let err = ctx.resolve("revenue", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::ServiceUnavailable(_)));
        assert_eq!(service.calls(), 1);
    }

    #[tokio::test]
    async fn empty_stage_two_metric_is_rejected() {
        let service = Scripted::replying(&["Metric: revenue", "Metric:\nGroupBys: region\nFilters: "]);
        let ctx = context(service, ResolverConfig::default()).await;

        let err = ctx.resolve("revenue", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::EmptyMetricSelection));
    }

    #[tokio::test]
    async fn permissive_mode_accepts_unlisted_metric() {
        let service = Scripted::replying(&["Metric: revenue", "Metric: profit\nGroupBys: \nFilters: "]);
        let ctx = context(service, ResolverConfig::default()).await;

        let resolution = ctx.resolve("profit", None).await.unwrap();
        assert_eq!(resolution.descriptor.metric, "profit");
    }

    #[tokio::test]
    async fn strict_mode_rejects_unlisted_metric() {
        let service = Scripted::replying(&["Metric: revenue", "Metric: profit\nGroupBys: \nFilters: "]);
        let config = ResolverConfig::default().with_strict_candidates(true);
        let ctx = context(service, config).await;

        let err = ctx.resolve("profit", None).await.unwrap_err();
        assert!(matches!(err, ResolveError::UnknownMetricSelection(m) if m == "profit"));
    }

    #[tokio::test]
    async fn invalid_config_rejected_at_construction() {
        let embedder = Embedder::new(SemanticConfig::stub()).unwrap();
        let index = CatalogIndex::build(snapshot(), &embedder).await.unwrap();
        let completion = CompletionClient::new(Scripted::new(Vec::new()), Duration::from_secs(1));
        let config = ResolverConfig::default().with_top_k(0);

        assert!(matches!(
            ResolverContext::new(Arc::new(index), embedder, completion, config),
            Err(ResolveError::InvalidConfig(_))
        ));
    }

    #[test]
    fn state_names() {
        assert_eq!(ResolveState::CandidatesRanked.to_string(), "candidates_ranked");
        assert_eq!(ResolveState::Failed.to_string(), "failed");
    }
}
