//! Post-quiz assessment.
//!
//! A local result is always drawn from the tier's pre-authored pool. When a
//! remote generator is configured its fields override the local ones, and
//! the whole call takes at least `min_delay` so the "grading" screen never
//! flashes past.

use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::FutureExt;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, instrument, warn};

use crate::model::{AssessmentResult, Tier};
use crate::phrases::assessment_pool;
use crate::traits::{AssessmentProvider, AssessmentRequest, RemoteAssessment};

/// Default floor on how long an assessment takes to appear.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(2);

/// Draw a local assessment for a finished session. `total` must be non-zero.
pub fn local_assessment<R: Rng + ?Sized>(score: u32, total: u32, rng: &mut R) -> AssessmentResult {
    let tier = Tier::from_score(score, total);
    let pool = assessment_pool(tier);
    let entry = pool[rng.gen_range(0..pool.len())];
    entry.to_result(tier)
}

/// Overlay remote fields onto a fallback result.
///
/// Missing or blank remote fields keep the fallback value, and so does an
/// assessment level that is not one of the known tiers.
pub fn merge(fallback: AssessmentResult, remote: RemoteAssessment) -> AssessmentResult {
    fn pick(remote: Option<String>, fallback: String) -> String {
        remote
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(fallback)
    }

    let level = remote
        .assessment_level
        .as_deref()
        .and_then(|l| l.parse::<Tier>().ok())
        .unwrap_or(fallback.level);

    AssessmentResult {
        message: pick(remote.message, fallback.message),
        teacher_comment: pick(remote.teacher_comment, fallback.teacher_comment),
        level,
        reward_emoji: pick(remote.reward_emoji, fallback.reward_emoji),
        reward_name: pick(remote.reward_name, fallback.reward_name),
    }
}

/// Produces the assessment shown at the end of a session.
pub struct AssessmentGenerator {
    remote: Option<Arc<dyn AssessmentProvider>>,
    min_delay: Duration,
    rng: Mutex<StdRng>,
}

impl AssessmentGenerator {
    pub fn new(remote: Option<Arc<dyn AssessmentProvider>>) -> Self {
        Self {
            remote,
            min_delay: DEFAULT_MIN_DELAY,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn with_min_delay(mut self, min_delay: Duration) -> Self {
        self.min_delay = min_delay;
        self
    }

    /// Make pool draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    /// The local result alone, without the remote call or delay.
    pub fn local(&self, score: u32, total: u32) -> AssessmentResult {
        let mut rng = self.rng.lock().unwrap_or_else(|p| p.into_inner());
        local_assessment(score, total, &mut *rng)
    }

    /// Assess a finished session. Never fails.
    #[instrument(skip(self, topic))]
    pub async fn assess(&self, score: u32, total: u32, topic: &str) -> AssessmentResult {
        let fallback = self.local(score, total);
        let request = AssessmentRequest {
            topic: topic.to_string(),
            score,
            total,
        };

        let remote = async {
            let provider = self.remote.as_ref()?;
            match AssertUnwindSafe(provider.assess(&request))
                .catch_unwind()
                .await
            {
                Ok(Ok(result)) => {
                    info!(provider = provider.name(), "remote assessment received");
                    Some(result)
                }
                Ok(Err(e)) => {
                    warn!(
                        provider = provider.name(),
                        "remote assessment failed, using local pool: {e:#}"
                    );
                    None
                }
                Err(_) => {
                    warn!(
                        provider = provider.name(),
                        "remote assessment panicked, using local pool"
                    );
                    None
                }
            }
        };

        let (remote, ()) =
            futures::future::join(remote, tokio::time::sleep(self.min_delay)).await;

        match remote {
            Some(remote) => merge(fallback, remote),
            None => fallback,
        }
    }
}

/// Check whether `result` is exactly one of the tier's pool entries.
pub fn is_from_pool(result: &AssessmentResult) -> bool {
    assessment_pool(result.level)
        .iter()
        .any(|entry| entry.to_result(result.level) == *result)
}

/// Every local result of a tier, in pool order.
pub fn pool_results(tier: Tier) -> Vec<AssessmentResult> {
    assessment_pool(tier)
        .iter()
        .map(|entry| entry.to_result(tier))
        .collect()
}
