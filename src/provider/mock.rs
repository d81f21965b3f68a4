use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::errors::CoachError;
use crate::wire::Instruction;
use super::Provider;

type Reply = Result<String, CoachError>;

/// Scripted provider for tests.
///
/// Replies are registered against a marker that must appear in the user
/// instruction; multiple replies for one marker are returned in FIFO order.
/// Calls are recorded so tests can assert on the prompts that were sent.
#[derive(Clone, Default)]
pub struct MockProvider {
    replies: Arc<Mutex<Vec<(String, Vec<Reply>)>>>,
    calls: Arc<Mutex<Vec<Instruction>>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_reply(&self, marker: &str, reply: Reply) {
        let mut replies = self.replies.lock();
        match replies.iter_mut().find(|(m, _)| m == marker) {
            Some((_, queue)) => queue.push(reply),
            None => replies.push((marker.to_string(), vec![reply])),
        }
    }

    pub fn calls(&self) -> Vec<Instruction> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(&self, ins: &Instruction) -> Result<String, CoachError> {
        self.calls.lock().push(ins.clone());
        let mut replies = self.replies.lock();
        let queue = replies
            .iter_mut()
            .find(|(marker, queue)| !queue.is_empty() && ins.user.contains(marker.as_str()))
            .map(|(_, queue)| queue);
        match queue {
            Some(q) => q.remove(0),
            None => Err(CoachError::Upstream("no mock reply configured".into())),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

/// A complete workout body as a model would return it.
pub fn workout_json(title: &str, with_rationale: bool) -> String {
    let mut v = serde_json::json!({
        "title": title,
        "type": "HIIT",
        "duration_minutes": 30,
        "sections": [
            {"title": "Warm-up", "exercises": [{"name": "Jumping jacks", "details": "2 min", "category": "cardio", "muscle_group": "full body"}]},
            {"title": "Main Workout", "exercises": [{"name": "Burpees", "details": "4x12", "category": "plyometric", "muscle_group": "legs"}]}
        ]
    });
    if with_rationale {
        v["rationale"] = serde_json::json!("Your last sessions were strength-heavy, so today raises your heart rate.");
    }
    v.to_string()
}

