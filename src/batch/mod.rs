//! Daily notification run: one suggested workout per subscribed user.
//!
//! Every recipient is processed in isolation. Whatever goes wrong for one
//! of them (store lookup, model call, malformed output, mail delivery, log
//! write) becomes a failed outcome in the report and the run moves on. Only
//! failures that prevent the run from starting are returned as errors.
//!
//! There is no duplicate-send guard: running the job twice on the same day
//! emails every recipient twice.

use chrono::Utc;
use futures::{stream, FutureExt, StreamExt};
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::errors::CoachError;
use crate::generate::GenerationService;
use crate::mail::{render, Mailer, OutboundEmail};
use crate::store::Store;
use crate::wire::{
    BatchMode, BatchReport, NotificationLogEntry, Recipient, RecipientOutcome, SkippedRecipient,
    UserProfile,
};

pub struct DailyJob<'a> {
    store: &'a dyn Store,
    generator: &'a GenerationService,
    mailer: &'a dyn Mailer,
    cfg: &'a Config,
}

enum Outcome {
    Done(RecipientOutcome),
    Skipped(SkippedRecipient),
    Cancelled(String),
}

impl<'a> DailyJob<'a> {
    pub fn new(
        store: &'a dyn Store,
        generator: &'a GenerationService,
        mailer: &'a dyn Mailer,
        cfg: &'a Config,
    ) -> Self {
        Self { store, generator, mailer, cfg }
    }

    #[tracing::instrument(skip(self, cancel), fields(test_mode = mode.is_test()))]
    pub async fn run(&self, mode: &BatchMode, cancel: CancellationToken) -> Result<BatchReport, CoachError> {
        let profiles = self.collect(mode).await?;
        tracing::info!(count = profiles.len(), "processing users for daily workout emails");

        let token = cancel.child_token();
        let deadline = self.cfg.batch.timeout_secs.map(|secs| {
            let t = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(secs)).await;
                tracing::warn!(timeout_secs = secs, "daily run timed out, cancelling remaining recipients");
                t.cancel();
            })
        });

        let outcomes: Vec<Outcome> = stream::iter(profiles)
            .map(|profile| self.isolated(profile, mode, &token))
            .buffer_unordered(self.cfg.batch.concurrency.max(1))
            .collect()
            .await;

        if let Some(handle) = deadline {
            handle.abort();
        }

        let mut report = BatchReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Done(r) => report.results.push(r),
                Outcome::Skipped(s) => report.skipped.push(s),
                Outcome::Cancelled(id) => report.cancelled.push(id),
            }
        }
        report.processed = report.results.len();

        tracing::info!(
            processed = report.processed,
            succeeded = report.succeeded(),
            failed = report.failed(),
            skipped = report.skipped.len(),
            cancelled = report.cancelled.len(),
            "daily run finished"
        );
        Ok(report)
    }

    async fn collect(&self, mode: &BatchMode) -> Result<Vec<UserProfile>, CoachError> {
        match mode {
            BatchMode::Production => self.store.notification_subscribers().await,
            BatchMode::Test { user_id, .. } => match self.store.profile(user_id).await? {
                Some(p) => Ok(vec![p]),
                None => Err(CoachError::UnknownUser(user_id.clone())),
            },
        }
    }

    /// Panics inside one recipient are contained like any other failure.
    async fn isolated(&self, profile: UserProfile, mode: &BatchMode, cancel: &CancellationToken) -> Outcome {
        let user_id = profile.id.clone();
        if cancel.is_cancelled() {
            return Outcome::Cancelled(user_id);
        }
        let work = AssertUnwindSafe(self.process(profile, mode)).catch_unwind();
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::warn!(user_id = %user_id, "recipient abandoned by cancellation");
                Outcome::Cancelled(user_id)
            }
            res = work => match res {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::error!(user_id = %user_id, "recipient processing panicked");
                    Outcome::Done(RecipientOutcome {
                        user_id,
                        target: String::new(),
                        success: false,
                        error: Some("internal error while processing recipient".into()),
                    })
                }
            }
        }
    }

    async fn process(&self, profile: UserProfile, mode: &BatchMode) -> Outcome {
        let user_id = profile.id.clone();

        let target = match self.resolve_email(&profile, mode).await {
            Ok(Some(t)) => t,
            Ok(None) => {
                tracing::info!(user_id = %user_id, "no email for user, skipping");
                return Outcome::Skipped(SkippedRecipient {
                    user_id: user_id.clone(),
                    reason: CoachError::MissingEmail(user_id).to_string(),
                });
            }
            Err(e) => return Outcome::Done(failed(user_id, String::new(), &e)),
        };

        match self.deliver(&profile, &target, mode).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, to = %target, "daily workout sent");
                Outcome::Done(RecipientOutcome { user_id, target, success: true, error: None })
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, kind = ?e.kind(), error = %e, "daily workout failed");
                Outcome::Done(failed(user_id, target, &e))
            }
        }
    }

    /// Test runs go to the override address; otherwise the profile's
    /// notification address beats the account address.
    async fn resolve_email(&self, profile: &UserProfile, mode: &BatchMode) -> Result<Option<String>, CoachError> {
        if let BatchMode::Test { test_email, .. } = mode {
            return Ok(non_blank(Some(test_email.as_str())));
        }
        if let Some(email) = non_blank(profile.notification_email.as_deref()) {
            return Ok(Some(email));
        }
        let account = self.store.account_email(&profile.id).await?;
        Ok(non_blank(account.as_deref()))
    }

    async fn build_context(&self, profile: &UserProfile, target: &str) -> Result<Recipient, CoachError> {
        let equipment = self.store.equipment(&profile.id).await?;
        let recent = self
            .store
            .recent_workouts(&profile.id, self.cfg.batch.recent_workouts, false)
            .await?;
        Ok(Recipient {
            user_id: profile.id.clone(),
            target_email: target.to_string(),
            goal: profile.goal(),
            weight_kg: profile.weight_kg,
            birth_year: profile.birth_year,
            gender: profile.gender.clone(),
            equipment,
            recent_workout_types: recent.into_iter().map(|w| w.workout_type).collect(),
        })
    }

    async fn deliver(&self, profile: &UserProfile, target: &str, mode: &BatchMode) -> Result<(), CoachError> {
        let recipient = self.build_context(profile, target).await?;
        let workout = self.generator.generate_daily(&recipient).await?;

        let email = OutboundEmail {
            user_id: recipient.user_id.clone(),
            from: self.cfg.mail.from.clone(),
            to: recipient.target_email.clone(),
            subject: render::subject(&workout),
            html: render::html(&workout, &self.cfg.mail.app_url),
        };
        self.mailer.send(&email).await?;

        if mode.is_test() {
            return Ok(());
        }

        let entry = NotificationLogEntry {
            id: Uuid::new_v4(),
            user_id: recipient.user_id,
            email_sent_to: recipient.target_email,
            workout_data: workout,
            sent_at: Utc::now(),
        };
        self.store
            .append_notification_log(entry)
            .await
            .map_err(|e| CoachError::Store(format!("email sent but delivery log write failed: {e}")))
    }
}

fn failed(user_id: String, target: String, err: &CoachError) -> RecipientOutcome {
    RecipientOutcome { user_id, target, success: false, error: Some(err.to_string()) }
}

fn non_blank(s: Option<&str>) -> Option<String> {
    s.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
