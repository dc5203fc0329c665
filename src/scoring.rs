//! Political-leaning scoring.
//!
//! Each article is wrapped in a fixed instruction prompt, sent to a
//! [`LanguageModel`], and the reply is parsed for the first `[int, int]` pair:
//! the economic mark (left −10 … right 10) and the democracy mark
//! (libertarian −10 … authoritarian 10). Marks are not clamped.
//!
//! Articles that fail for any per-item reason are skipped, never retried, and
//! at most `cap` articles per newspaper are scored in one run.

use crate::api::LanguageModel;
use crate::error::{PipelineError, Result};
use crate::models::{ArticleRecord, BatchReport, Evaluation};
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

const INSTRUCTIONS: &str = "Instructions: Economic Scale from -10 to 10, where -10 is Economic Left and \
10 Economic Right. Scale Democracy Scale from -10 to 10, where -10 is Libertarian \
and 10 is Authoritarian. I provide a newspaper article. \
Output only the political position of the author in the format \
[mark for Economic Scale, mark for Democracy Scale]. \
NEVER WRITE ANY TEXT BEFORE OR AFTER THE RESULT. \
ALWAYS provide the result, even if you are not fully sure.\n\
Article: ";

static MARKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(-?\d+), (-?\d+)\]").expect("static regex"));

/// Instruction template followed by the article body.
pub fn build_prompt(article: &str) -> String {
    format!("{INSTRUCTIONS}{article}")
}

/// The first `[int, int]` pair in `text`.
///
/// Text around the pair is ignored; no pair, or an integer that does not fit
/// in `i64`, is a [`PipelineError::Parse`].
pub fn parse_marks(text: &str) -> Result<(i64, i64)> {
    let caps = MARKS.captures(text).ok_or_else(|| {
        PipelineError::parse(format!(
            "no [int, int] pair in reply: {}",
            truncate_for_log(text, 120)
        ))
    })?;
    let economic = caps[1]
        .parse::<i64>()
        .map_err(|e| PipelineError::parse(format!("economic mark {}: {e}", &caps[1])))?;
    let democracy = caps[2]
        .parse::<i64>()
        .map_err(|e| PipelineError::parse(format!("democracy mark {}: {e}", &caps[2])))?;
    Ok((economic, democracy))
}

/// Scores articles with a borrowed [`LanguageModel`].
///
/// At most `cap` articles per newspaper are scored successfully. Articles
/// whose query or reply fails are skipped and do not count towards the cap.
pub struct ScoringEngine<'a, M> {
    model: &'a M,
    cap: usize,
}

impl<'a, M: LanguageModel> ScoringEngine<'a, M> {
    /// Create an engine.
    ///
    /// # Arguments
    ///
    /// * `model` - the backend every prompt is sent to
    /// * `cap` - successful evaluations kept per newspaper
    pub fn new(model: &'a M, cap: usize) -> Self {
        Self { model, cap }
    }

    /// Score one article body.
    ///
    /// # Returns
    ///
    /// The `(socioeconomic, democracy)` marks, or the backend's error, or a
    /// [`PipelineError::Parse`] when the reply holds no `[int, int]` pair.
    pub async fn score(&self, article: &str) -> Result<(i64, i64)> {
        let reply = self.model.query(&build_prompt(article)).await?;
        debug!(reply = %truncate_for_log(&reply, 200), "Model reply");
        parse_marks(&reply)
    }

    /// Score one newspaper's articles in order until `cap` succeed.
    #[instrument(level = "info", skip_all, fields(model = %self.model.name(), articles = articles.len()))]
    pub async fn score_newspaper(&self, articles: &[&ArticleRecord]) -> BatchReport<Evaluation> {
        let mut report = BatchReport::default();
        for article in articles {
            if report.succeeded.len() >= self.cap {
                break;
            }
            match self.score(&article.article_content).await {
                Ok(marks) => {
                    info!(url = %article.article_url, economic = marks.0, democracy = marks.1, "Scored article");
                    report.push_ok(Evaluation::new(article, marks));
                }
                Err(e) => {
                    warn!(url = %article.article_url, error = %e, "Skipping article");
                    report.push_skip(&article.article_url, e);
                }
            }
        }
        report
    }

    /// Score a unit's articles, newspaper by newspaper in first-appearance
    /// order, concatenating each newspaper's capped list.
    #[instrument(level = "info", skip_all, fields(model = %self.model.name(), rows = articles.len()))]
    pub async fn score_unit(&self, articles: &[ArticleRecord]) -> BatchReport<Evaluation> {
        let mut newspapers: Vec<&str> = Vec::new();
        for article in articles {
            if !newspapers.contains(&article.newspaper.as_str()) {
                newspapers.push(&article.newspaper);
            }
        }

        let mut report = BatchReport::default();
        for newspaper in newspapers {
            info!(%newspaper, "Scoring newspaper");
            let group: Vec<&ArticleRecord> = articles
                .iter()
                .filter(|a| a.newspaper == newspaper)
                .collect();
            report.extend(self.score_newspaper(&group).await);
        }
        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    /// Replays canned replies in order; an `Err` entry simulates a backend fault.
    pub(crate) struct ScriptedModel {
        replies: RefCell<VecDeque<Result<String>>>,
        pub(crate) prompts: RefCell<Vec<String>>,
    }

    impl ScriptedModel {
        pub(crate) fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: RefCell::new(replies.into()),
                prompts: RefCell::new(Vec::new()),
            }
        }

        pub(crate) fn always(reply: &str, n: usize) -> Self {
            Self::new((0..n).map(|_| Ok(reply.to_string())).collect())
        }
    }

    impl LanguageModel for ScriptedModel {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn query(&self, prompt: &str) -> Result<String> {
            self.prompts.borrow_mut().push(prompt.to_string());
            self.replies
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(PipelineError::model("scripted", "script exhausted")))
        }
    }

    fn article(newspaper: &str, n: usize) -> ArticleRecord {
        ArticleRecord {
            newspaper: newspaper.to_string(),
            article_url: format!("{newspaper}/{n}"),
            article_content: format!("Body {n}"),
        }
    }

    #[test]
    fn test_parse_marks() {
        assert_eq!(parse_marks("[3, -7]").unwrap(), (3, -7));
        assert_eq!(parse_marks("[3, -7] extra").unwrap(), (3, -7));
        assert_eq!(parse_marks("Result: [-10, 10] and [1, 1]").unwrap(), (-10, 10));
        // Out-of-range marks are trusted as returned.
        assert_eq!(parse_marks("[42, -99]").unwrap(), (42, -99));
    }

    #[test]
    fn test_parse_marks_rejects_other_shapes() {
        for text in ["no brackets here", "[3,-7]", "[3, 7, 1", "[a, b]", ""] {
            assert!(
                matches!(parse_marks(text), Err(PipelineError::Parse { .. })),
                "{text:?} should not parse"
            );
        }
    }

    #[test]
    fn test_parse_marks_overflow_is_parse_error() {
        assert!(matches!(
            parse_marks("[99999999999999999999, 1]"),
            Err(PipelineError::Parse { .. })
        ));
    }

    #[test]
    fn test_prompt_ends_with_article() {
        let prompt = build_prompt("The article body.");
        assert!(prompt.starts_with("Instructions: Economic Scale from -10 to 10"));
        assert!(prompt.contains("NEVER WRITE ANY TEXT BEFORE OR AFTER THE RESULT."));
        assert!(prompt.ends_with("Article: The article body."));
    }

    #[tokio::test]
    async fn test_score_sends_prompt_and_parses() {
        let model = ScriptedModel::always("[1, 2]", 1);
        let engine = ScoringEngine::new(&model, 5);
        assert_eq!(engine.score("Body").await.unwrap(), (1, 2));
        assert_eq!(model.prompts.borrow()[0], build_prompt("Body"));
    }

    #[tokio::test]
    async fn test_newspaper_cap_stops_after_five_successes() {
        let model = ScriptedModel::always("[1, 1]", 10);
        let engine = ScoringEngine::new(&model, 5);
        let articles: Vec<ArticleRecord> = (0..8).map(|i| article("X", i)).collect();
        let refs: Vec<&ArticleRecord> = articles.iter().collect();

        let report = engine.score_newspaper(&refs).await;
        assert_eq!(report.succeeded.len(), 5);
        assert_eq!(model.prompts.borrow().len(), 5);
    }

    #[tokio::test]
    async fn test_failures_are_skipped_and_do_not_count_toward_cap() {
        let model = ScriptedModel::new(vec![
            Ok("[1, 1]".to_string()),
            Ok("I refuse".to_string()),
            Err(PipelineError::model("scripted", "500")),
            Ok("[2, 2]".to_string()),
            Ok("[3, 3]".to_string()),
            Ok("[4, 4]".to_string()),
            Ok("[5, 5]".to_string()),
            Ok("[6, 6]".to_string()),
        ]);
        let engine = ScoringEngine::new(&model, 5);
        let articles: Vec<ArticleRecord> = (0..8).map(|i| article("X", i)).collect();
        let refs: Vec<&ArticleRecord> = articles.iter().collect();

        let report = engine.score_newspaper(&refs).await;
        let marks: Vec<i64> = report.succeeded.iter().map(|e| e.mark_socioeconomic).collect();
        assert_eq!(marks, vec![1, 2, 3, 4, 5]);
        let skipped: Vec<&str> = report.skipped.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(skipped, vec!["X/1", "X/2"]);
        assert_eq!(model.prompts.borrow().len(), 7);
    }

    #[tokio::test]
    async fn test_unit_groups_by_first_appearance_and_caps_each() {
        let model = ScriptedModel::always("[0, 0]", 100);
        let engine = ScoringEngine::new(&model, 5);
        let mut articles = Vec::new();
        for i in 0..7 {
            articles.push(article("B", i));
            articles.push(article("A", i));
        }

        let report = engine.score_unit(&articles).await;
        assert_eq!(report.succeeded.len(), 10);
        let papers: Vec<&str> = report.succeeded.iter().map(|e| e.newspaper.as_str()).collect();
        assert_eq!(&papers[..5], &["B"; 5]);
        assert_eq!(&papers[5..], &["A"; 5]);
    }
}
