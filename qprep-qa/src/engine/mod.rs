//! Quiz assembly engine
//!
//! One request flows through a fixed pipeline: plan per-type targets,
//! select candidates type by type (passage types through the grouper so
//! passages stay whole, the rest by uniform random sampling), escalate
//! through the fallback cascade when a type under-fills, arrange the
//! result, fire the quota update, and format for delivery. Corpus
//! scarcity shrinks the quiz; it never fails the request.

pub mod arrange;
pub mod cascade;
pub mod format;
pub mod grouper;
pub mod plan;
pub mod validity;

pub use format::{Quiz, QuizQuestion};

use crate::quota::QuotaLedger;
use crate::repo::{CandidateFilter, QuestionRepository};
use crate::settings::EngineSettings;
use cascade::FallbackStage;
use qprep_common::db::models::{Category, Difficulty, Question, QuestionType};
use qprep_common::{Error, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One quiz assembly request.
///
/// `type` and `types` are alternate spellings of the same constraint;
/// the engine folds them into one list before planning.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizRequest {
    /// Desired number of questions, must be positive
    pub count: i64,

    /// Suggested duration in minutes; passed through to the quiz untouched
    #[serde(default)]
    pub time_limit: i64,

    /// Single-type shorthand for `types`
    #[serde(default, rename = "type")]
    pub question_type: Option<QuestionType>,

    /// Restrict the quiz to these types; omitted means the default mix
    #[serde(default)]
    pub types: Option<Vec<QuestionType>>,

    /// Narrow candidates to one subject category
    #[serde(default)]
    pub category: Option<Category>,

    /// Narrow candidates to one difficulty band
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
}

impl QuizRequest {
    fn validated_count(&self) -> Result<usize> {
        if self.count <= 0 {
            return Err(Error::InvalidInput(format!(
                "Question count must be positive, got {}",
                self.count
            )));
        }
        Ok(self.count as usize)
    }

    /// Fold the `type` shorthand into `types` so the rest of the engine
    /// deals with exactly one representation.
    fn normalized(&self) -> Result<QuizRequest> {
        let types = match (&self.types, self.question_type) {
            (Some(list), single) => {
                let mut types = list.clone();
                if let Some(qt) = single {
                    if !types.contains(&qt) {
                        types.push(qt);
                    }
                }
                if types.is_empty() {
                    return Err(Error::InvalidInput(
                        "types must name at least one question type".to_string(),
                    ));
                }
                Some(types)
            }
            (None, Some(qt)) => Some(vec![qt]),
            (None, None) => None,
        };

        Ok(QuizRequest {
            question_type: None,
            types,
            ..self.clone()
        })
    }
}

/// The resolved identity behind one request.
#[derive(Debug, Clone, Copy)]
pub struct Requester {
    /// Account identity, if the caller presented one
    pub user_id: Option<Uuid>,
    /// Unlimited plans are never charged quota
    pub unlimited: bool,
}

impl Requester {
    /// Callers with no identity get quizzes without quota accounting.
    pub fn anonymous() -> Self {
        Self {
            user_id: None,
            unlimited: true,
        }
    }
}

/// The assembly engine. Stateless between requests; cheap to share.
pub struct QuizAssembler {
    repo: Arc<dyn QuestionRepository>,
    ledger: Arc<dyn QuotaLedger>,
    settings: EngineSettings,
}

impl QuizAssembler {
    pub fn new(
        repo: Arc<dyn QuestionRepository>,
        ledger: Arc<dyn QuotaLedger>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            repo,
            ledger,
            settings,
        }
    }

    /// Assemble one quiz.
    ///
    /// The result may hold fewer than `count` questions, down to zero,
    /// when the corpus runs dry. Only invalid requests and repository
    /// failures surface as errors; quota-ledger failures are logged and
    /// swallowed.
    pub async fn assemble(&self, request: &QuizRequest, requester: &Requester) -> Result<Quiz> {
        let count = request.validated_count()?;
        let request = request.normalized()?;

        let targets = plan::plan_targets(count, request.types.as_deref());
        let deadline = Instant::now() + self.settings.assembly_deadline();

        let mut chosen: Vec<Question> = Vec::with_capacity(count);
        let mut chosen_ids: HashSet<Uuid> = HashSet::with_capacity(count);

        for target in &targets {
            let room = count - chosen.len();
            if room == 0 {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    delivered = chosen.len(),
                    requested = count,
                    "Assembly deadline reached, returning partial quiz"
                );
                break;
            }

            let goal = target.target.min(room);
            let picked = self
                .pick(
                    target.question_type,
                    goal,
                    room,
                    &request,
                    &chosen_ids,
                    deadline,
                )
                .await?;
            for question in picked {
                chosen_ids.insert(question.id);
                chosen.push(question);
            }
        }

        if chosen.len() < count {
            info!(
                requested = count,
                delivered = chosen.len(),
                "Corpus could not fill the full request"
            );
        }

        let arranged = arrange::arrange(chosen, &mut rand::thread_rng());
        self.spawn_quota_update(requester, arranged.len());

        let quiz = format::format_quiz(arranged, request.time_limit);
        info!(
            quiz_id = %quiz.quiz_id,
            requested = count,
            delivered = quiz.question_count,
            "Assembled quiz"
        );
        Ok(quiz)
    }

    /// Select up to `goal` questions of one type, escalating through the
    /// fallback cascade on shortfall. `hard_cap` is the room left in the
    /// whole quiz: a whole passage group may overshoot `goal`, but never
    /// `hard_cap`.
    async fn pick(
        &self,
        question_type: QuestionType,
        goal: usize,
        hard_cap: usize,
        request: &QuizRequest,
        exclude: &HashSet<Uuid>,
        deadline: Instant,
    ) -> Result<Vec<Question>> {
        let filter = cascade::first_pass_filter(question_type, request);
        let mut picked = self.select(&filter, goal, hard_cap, exclude).await?;

        for stage in FallbackStage::ORDER {
            if picked.len() >= goal {
                break;
            }
            if Instant::now() >= deadline {
                warn!(
                    question_type = %question_type,
                    stage = stage.label(),
                    "Assembly deadline reached mid-cascade"
                );
                break;
            }
            let Some(filter) = cascade::stage_filter(stage, question_type, request) else {
                continue;
            };

            // Every stage must see what earlier stages already took
            let mut seen: HashSet<Uuid> = exclude.iter().copied().collect();
            seen.extend(picked.iter().map(|q| q.id));

            let shortfall = goal - picked.len();
            let more = self
                .select(&filter, shortfall, hard_cap - picked.len(), &seen)
                .await?;
            if !more.is_empty() {
                debug!(
                    question_type = %question_type,
                    stage = stage.label(),
                    filled = more.len(),
                    shortfall,
                    "Fallback stage filled part of a shortfall"
                );
            }
            picked.extend(more);
        }

        Ok(picked)
    }

    /// One selection pass under one filter. Filters pinned to a
    /// passage-grouped type go through the grouper so passages stay
    /// whole; everything else is a uniform random sample.
    async fn select(
        &self,
        filter: &CandidateFilter,
        goal: usize,
        hard_cap: usize,
        exclude: &HashSet<Uuid>,
    ) -> Result<Vec<Question>> {
        let grouped = filter
            .question_type
            .is_some_and(|qt| qt.is_passage_grouped());

        if grouped {
            let candidates = self.repo.group_candidates(filter, exclude).await?;
            let groups = grouper::build_groups(candidates, self.settings.min_passage_group_size);
            Ok(grouper::select_from_groups(
                &groups,
                goal,
                hard_cap,
                self.settings.max_questions_per_passage,
            ))
        } else {
            self.repo.sample(filter, exclude, goal.min(hard_cap)).await
        }
    }

    /// Fire-and-forget quota consumption. Failures are logged, never
    /// surfaced: the quiz has already been assembled and is delivered
    /// regardless.
    fn spawn_quota_update(&self, requester: &Requester, delivered: usize) {
        if requester.unlimited || delivered == 0 {
            return;
        }
        let Some(user_id) = requester.user_id else {
            return;
        };

        let ledger = Arc::clone(&self.ledger);
        tokio::spawn(async move {
            if let Err(e) = ledger.record_usage(user_id).await {
                warn!(user_id = %user_id, error = %e, "Quota update failed after delivery");
            }
        });
    }
}
