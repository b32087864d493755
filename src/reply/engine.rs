// Reply engine: one drafting pass over a group's recent threads.
//
// Style is learned once per pass. Each thread goes through the eligibility
// rules; eligible ones get a generated draft, then the engine sleeps a
// random reply delay before looking at the next thread, whether or not
// generation succeeded.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::rules::{check_eligibility, clean_reply, Eligibility};
use crate::config::ReplyConfig;
use crate::db::models::{now_local, Thread};
use crate::db::Database;
use crate::fetch::Pacer;
use crate::llm::Generator;
use crate::style::{build_system_prompt, build_user_prompt, StyleAnalysis, StyleLearner};

/// Threads considered per pass, newest first.
const CANDIDATE_LIMIT: u32 = 50;

/// A drafted reply for one thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub post_id: String,
    pub title: String,
    pub text: String,
}

/// Summary of one drafting pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplyReport {
    pub considered: usize,
    pub eligible: usize,
    pub failed: usize,
    pub drafts: Vec<Draft>,
}

pub struct ReplyEngine {
    db: Arc<dyn Database>,
    generator: Arc<dyn Generator>,
    pacer: Arc<Pacer>,
    config: ReplyConfig,
}

impl ReplyEngine {
    pub fn new(
        db: Arc<dyn Database>,
        generator: Arc<dyn Generator>,
        pacer: Arc<Pacer>,
        config: ReplyConfig,
    ) -> Self {
        Self {
            db,
            generator,
            pacer,
            config,
        }
    }

    /// Draft replies for the eligible threads of one group.
    ///
    /// Errors only when the group itself can't be loaded; per-thread
    /// failures are logged and counted.
    pub async fn process_group(&self, group_id: &str) -> Result<ReplyReport> {
        let mut report = ReplyReport::default();
        if !self.config.enabled {
            return Ok(report);
        }

        let group = self
            .db
            .get_group(group_id)
            .await?
            .with_context(|| format!("Group {group_id} is not stored"))?;

        let analysis = self.learn_style(group_id).await;
        let system_prompt = build_system_prompt(&group.name, &analysis);

        let threads = self
            .db
            .list_threads_by_group(group_id, CANDIDATE_LIMIT)
            .await
            .with_context(|| format!("Failed to list threads for group {group_id}"))?;

        let now = now_local();
        for thread in &threads {
            report.considered += 1;

            let comments = match self.db.list_comments_by_thread(&thread.post_id).await {
                Ok(comments) => comments,
                Err(e) => {
                    warn!(post_id = thread.post_id.as_str(), error = %e, "Failed to load comments, skipping");
                    continue;
                }
            };

            let eligibility =
                check_eligibility(thread, comments.len(), now, &self.config.reply_keywords);
            if eligibility != Eligibility::Eligible {
                debug!(post_id = thread.post_id.as_str(), ?eligibility, "Not a reply candidate");
                continue;
            }
            report.eligible += 1;

            match self.draft(&system_prompt, thread).await {
                Ok(draft) => {
                    info!(
                        group_id,
                        post_id = draft.post_id.as_str(),
                        reply = draft.text.as_str(),
                        "Drafted reply"
                    );
                    report.drafts.push(draft);
                }
                Err(e) => {
                    warn!(post_id = thread.post_id.as_str(), error = %e, "Reply generation failed");
                    report.failed += 1;
                }
            }

            self.pacer.pace(self.config.reply_delay).await;
        }

        info!(
            group_id,
            considered = report.considered,
            eligible = report.eligible,
            drafted = report.drafts.len(),
            failed = report.failed,
            "Reply pass complete"
        );
        Ok(report)
    }

    /// Draft a reply for one stored thread, skipping the eligibility rules.
    pub async fn draft_for_thread(&self, post_id: &str) -> Result<Draft> {
        let thread = self
            .db
            .get_thread(post_id)
            .await?
            .with_context(|| format!("Thread {post_id} is not stored"))?;
        let group = self
            .db
            .get_group(&thread.group_id)
            .await?
            .with_context(|| format!("Group {} is not stored", thread.group_id))?;

        let analysis = self.learn_style(&thread.group_id).await;
        let system_prompt = build_system_prompt(&group.name, &analysis);
        self.draft(&system_prompt, &thread).await
    }

    /// Learn the group's style, falling back to the neutral default.
    async fn learn_style(&self, group_id: &str) -> StyleAnalysis {
        let learner = StyleLearner::new(self.db.clone());
        match learner
            .learn(
                group_id,
                self.config.max_history_posts,
                self.config.max_history_comments,
            )
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(group_id, error = %e, "Style learning failed, using defaults");
                StyleAnalysis::default()
            }
        }
    }

    async fn draft(&self, system_prompt: &str, thread: &Thread) -> Result<Draft> {
        let user_prompt = build_user_prompt(&thread.title, &thread.content);
        let raw = self
            .generator
            .generate(system_prompt, &user_prompt)
            .await
            .with_context(|| format!("Failed to generate reply for thread {}", thread.post_id))?;
        Ok(Draft {
            post_id: thread.post_id.clone(),
            title: thread.title.clone(),
            text: clean_reply(&raw),
        })
    }
}
