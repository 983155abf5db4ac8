//! Backend that replays canned completions.

use std::collections::VecDeque;
use std::sync::Mutex;

use super::TextBackend;
use crate::{Error, Result};

/// Completion returned once the script runs out.
pub const FALLBACK_COMPLETION: &str = "Mocked response";

enum Step {
    Reply(String),
    Fail(String),
}

/// Replays a fixed sequence of completions.
///
/// Useful for offline runs and for exercising the resolver without a model.
/// A backend built with [`ScriptedBackend::new`] also records every prompt it
/// sees; [`ScriptedBackend::default`] keeps nothing.
#[derive(Default)]
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    prompts: Option<Mutex<Vec<String>>>,
}

impl ScriptedBackend {
    pub fn new(replies: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let backend = Self {
            steps: Mutex::default(),
            prompts: Some(Mutex::default()),
        };
        for reply in replies {
            backend.push_reply(reply);
        }
        backend
    }

    /// Queue a completion.
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock(&self.steps).push_back(Step::Reply(reply.into()));
    }

    /// Queue a backend failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        lock(&self.steps).push_back(Step::Fail(message.into()));
    }

    /// Every prompt received so far, oldest first. Empty unless recording.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .as_ref()
            .map(|prompts| lock(prompts).clone())
            .unwrap_or_default()
    }

    pub fn remaining(&self) -> usize {
        lock(&self.steps).len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TextBackend for ScriptedBackend {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if let Some(prompts) = &self.prompts {
            lock(prompts).push(prompt.to_string());
        }
        let step = lock(&self.steps).pop_front();
        match step {
            Some(Step::Reply(reply)) => Ok(reply),
            Some(Step::Fail(message)) => Err(Error::Api(message)),
            None => Ok(FALLBACK_COMPLETION.to_string()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
