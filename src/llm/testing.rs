//! In-process model doubles for unit tests.

use super::{CompletionRequest, LlmClient, LlmClientError};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

enum Script {
    Sequence(Vec<String>),
    Routed {
        routes: Vec<(String, String)>,
        fallback: Option<String>,
    },
}

/// Model double that answers from a script and records every request.
pub(crate) struct ScriptedLlm {
    script: Mutex<Script>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    /// Reply with `replies` in order; fail once they run out.
    pub(crate) fn sequence(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::Sequence(
                replies.iter().rev().map(|reply| reply.to_string()).collect(),
            )),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Reply with the first route whose needle occurs in the prompt, else `fallback`.
    pub(crate) fn routed(routes: &[(&str, &str)], fallback: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(Script::Routed {
                routes: routes
                    .iter()
                    .map(|(needle, reply)| (needle.to_string(), reply.to_string()))
                    .collect(),
                fallback: fallback.map(str::to_string),
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Requests received so far.
    pub(crate) fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmClientError> {
        let reply = {
            let mut script = self.script.lock().expect("script lock");
            match &mut *script {
                Script::Sequence(replies) => replies.pop(),
                Script::Routed { routes, fallback } => routes
                    .iter()
                    .find(|(needle, _)| request.prompt.contains(needle.as_str()))
                    .map(|(_, reply)| reply.clone())
                    .or_else(|| fallback.clone()),
            }
        };
        self.requests.lock().expect("requests lock").push(request);
        reply.ok_or_else(|| LlmClientError::GenerationFailed("script exhausted".into()))
    }
}
