use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use ninja_regen::errors::Result;
use ninja_regen::exec::{CommandExecutor, EdgeRequest};

type Effect = Box<dyn FnMut(&EdgeRequest) + Send>;

/// A fake executor that:
/// - records every edge request it receives
/// - pops a scripted exit code per run (default `0`)
/// - optionally applies a side effect per run, so tests can mutate the mock
///   filesystem the way a real regeneration command would.
pub struct FakeExecutor {
    pub ran: Arc<Mutex<Vec<EdgeRequest>>>,
    exit_codes: VecDeque<i32>,
    effect: Option<Effect>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self {
            ran: Arc::new(Mutex::new(Vec::new())),
            exit_codes: VecDeque::new(),
            effect: None,
        }
    }

    /// Exit codes for successive runs; once exhausted, runs succeed.
    pub fn with_exit_codes(mut self, codes: impl IntoIterator<Item = i32>) -> Self {
        self.exit_codes = codes.into_iter().collect();
        self
    }

    /// Side effect applied on every run, before the exit code is reported.
    pub fn with_effect(mut self, effect: impl FnMut(&EdgeRequest) + Send + 'static) -> Self {
        self.effect = Some(Box::new(effect));
        self
    }

    pub fn run_count(&self) -> usize {
        self.ran.lock().unwrap().len()
    }

    pub fn descriptions(&self) -> Vec<String> {
        self.ran
            .lock()
            .unwrap()
            .iter()
            .filter_map(|r| r.description.clone())
            .collect()
    }
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandExecutor for FakeExecutor {
    fn run_edge(
        &mut self,
        request: EdgeRequest,
    ) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        self.ran.lock().unwrap().push(request.clone());
        if let Some(effect) = self.effect.as_mut() {
            effect(&request);
        }
        let code = self.exit_codes.pop_front().unwrap_or(0);

        Box::pin(async move { Ok(code) })
    }
}
