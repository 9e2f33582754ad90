//! Runs completion calls for a [`Conversation`] without blocking the caller.
//!
//! The call is spawned on the tokio runtime and its handle is polled from the
//! UI loop, so all transcript mutation stays on the caller's task.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::{JoinError, JoinHandle};

use crate::ai::CompletionClient;
use crate::conversation::{Conversation, InputBuffer, Outcome, PendingRequest, RequestId};
use crate::error::{CompletionError, FailureKind};
use crate::persona::QuickAsk;

struct InFlight {
    id: RequestId,
    handle: JoinHandle<Result<String, CompletionError>>,
}

pub struct ChatController {
    conversation: Conversation,
    persona: String,
    client: Arc<dyn CompletionClient>,
    timeout: Option<Duration>,
    task: Option<InFlight>,
}

impl ChatController {
    pub fn new(client: Arc<dyn CompletionClient>, persona: &str, timeout: Option<Duration>) -> Self {
        Self {
            conversation: Conversation::new(persona),
            persona: persona.to_string(),
            client,
            timeout,
            task: None,
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn input_mut(&mut self) -> &mut InputBuffer {
        self.conversation.input_mut()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn is_busy(&self) -> bool {
        self.conversation.is_request_in_flight()
    }

    /// Returns `false` when the submission was ignored.
    pub fn submit(&mut self, text: &str) -> bool {
        let request = self.conversation.submit(text);
        self.dispatch(request)
    }

    pub fn submit_input(&mut self) -> bool {
        let request = self.conversation.submit_input();
        self.dispatch(request)
    }

    pub fn quick_ask(&mut self, ask: QuickAsk) -> bool {
        let request = self.conversation.quick_ask(ask);
        self.dispatch(request)
    }

    fn dispatch(&mut self, request: Option<PendingRequest>) -> bool {
        let Some(PendingRequest { id, prompt }) = request else {
            return false;
        };

        tracing::info!(model = %self.client.model(), "dispatching completion request");
        let client = Arc::clone(&self.client);
        let timeout = self.timeout;
        let handle = tokio::spawn(async move { complete_with_timeout(client, prompt, timeout).await });

        self.task = Some(InFlight { id, handle });
        true
    }

    /// Apply the reply if the outstanding call has finished.
    ///
    /// Never waits; returns whether the transcript changed.
    pub async fn poll(&mut self) -> bool {
        let finished = matches!(&self.task, Some(t) if t.handle.is_finished());
        if !finished {
            return false;
        }
        let Some(in_flight) = self.task.take() else {
            return false;
        };
        let joined = in_flight.handle.await;
        self.settle(in_flight.id, joined)
    }

    /// Wait for the outstanding call, if any, and apply it.
    pub async fn wait(&mut self) -> bool {
        let Some(in_flight) = self.task.take() else {
            return false;
        };
        let joined = in_flight.handle.await;
        self.settle(in_flight.id, joined)
    }

    /// Drop the transcript and any outstanding call, starting over.
    pub fn reset(&mut self) {
        if let Some(in_flight) = self.task.take() {
            tracing::info!("aborting in-flight completion");
            in_flight.handle.abort();
        }
        self.conversation = Conversation::new(self.persona.as_str());
    }

    fn settle(
        &mut self,
        id: RequestId,
        joined: Result<Result<String, CompletionError>, JoinError>,
    ) -> bool {
        let outcome = match joined {
            Ok(Ok(reply)) => {
                tracing::debug!(chars = reply.chars().count(), "completion succeeded");
                Outcome::Reply(reply)
            }
            Ok(Err(err)) => {
                let kind = FailureKind::classify(&err);
                tracing::error!(error = %err, ?kind, "completion failed");
                Outcome::Failed(kind)
            }
            Err(err) => {
                tracing::error!(error = %err, "completion task did not finish");
                Outcome::Failed(FailureKind::Generic)
            }
        };
        self.conversation.resolve(id, outcome)
    }
}

async fn complete_with_timeout(
    client: Arc<dyn CompletionClient>,
    prompt: String,
    timeout: Option<Duration>,
) -> Result<String, CompletionError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, client.complete(&prompt))
            .await
            .map_err(|_| CompletionError::Timeout(limit))?,
        None => client.complete(&prompt).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ChatEntry, PENDING_TEXT};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tokio::sync::Notify;

    enum Behaviour {
        Reply(&'static str),
        Fail(&'static str),
        Hang,
        Panic,
    }

    struct MockClient {
        behaviour: Behaviour,
        gate: Option<Arc<Notify>>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn new(behaviour: Behaviour) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                gate: None,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn gated(behaviour: Behaviour, gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                behaviour,
                gate: Some(gate),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for MockClient {
        async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            match self.behaviour {
                Behaviour::Reply(text) => Ok(text.to_string()),
                Behaviour::Fail(msg) => Err(CompletionError::Provider(msg.to_string())),
                Behaviour::Hang => std::future::pending().await,
                Behaviour::Panic => panic!("mock client blew up"),
            }
        }

        fn model(&self) -> &str {
            "mock-model"
        }
    }

    fn controller(client: Arc<MockClient>) -> ChatController {
        ChatController::new(client, "BIO", Some(Duration::from_secs(5)))
    }

    fn last_text(controller: &ChatController) -> &str {
        controller.conversation().entries().last().map(|e| e.text()).unwrap_or("")
    }

    #[tokio::test]
    async fn test_success_replaces_pending_entry() {
        let client = MockClient::new(Behaviour::Reply("Bachelors in CS"));
        let mut chat = controller(client.clone());

        assert!(chat.submit("Tell me about your education"));
        assert!(chat.is_busy());
        assert_eq!(last_text(&chat), PENDING_TEXT);

        assert!(chat.wait().await);
        assert!(!chat.is_busy());
        assert_eq!(
            chat.conversation().entries(),
            &[
                ChatEntry::User {
                    text: "Tell me about your education".to_string()
                },
                ChatEntry::Assistant {
                    text: "Bachelors in CS".to_string(),
                    pending: false
                },
            ]
        );
        assert_eq!(
            client.prompts.lock().unwrap().as_slice(),
            &["BIO\n\nUser: Tell me about your education".to_string()]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_error_shows_quota_message() {
        let mut chat = controller(MockClient::new(Behaviour::Fail("Error: 429 Too Many Requests")));

        chat.submit("hi");
        chat.wait().await;

        assert_eq!(last_text(&chat), FailureKind::Quota.message());
        assert!(!chat.is_busy());
    }

    #[tokio::test]
    async fn test_other_error_shows_generic_message() {
        let mut chat = controller(MockClient::new(Behaviour::Fail("dns lookup failed")));

        chat.submit("hi");
        chat.wait().await;

        assert_eq!(last_text(&chat), FailureKind::Generic.message());
        assert!(!chat.is_busy());
    }

    #[tokio::test]
    async fn test_panicking_client_is_generic_failure() {
        let mut chat = controller(MockClient::new(Behaviour::Panic));

        chat.submit("hi");
        chat.wait().await;

        assert_eq!(last_text(&chat), FailureKind::Generic.message());
        assert!(!chat.is_busy());
    }

    #[tokio::test]
    async fn test_second_quick_ask_is_rejected_while_in_flight() {
        let gate = Arc::new(Notify::new());
        let client = MockClient::gated(Behaviour::Reply("Projects list"), gate.clone());
        let mut chat = controller(client.clone());

        assert!(chat.quick_ask(QuickAsk::Projects));
        assert!(!chat.quick_ask(QuickAsk::Projects));
        assert!(!chat.submit("something else"));
        assert_eq!(chat.conversation().entries().len(), 2);

        gate.notify_one();
        chat.wait().await;

        assert_eq!(client.calls.load(Ordering::SeqCst), 1);
        let users = chat
            .conversation()
            .entries()
            .iter()
            .filter(|e| matches!(e, ChatEntry::User { .. }))
            .count();
        assert_eq!(users, 1);
        assert_eq!(last_text(&chat), "Projects list");
    }

    #[tokio::test]
    async fn test_poll_does_not_wait() {
        let gate = Arc::new(Notify::new());
        let mut chat = controller(MockClient::gated(Behaviour::Reply("done"), gate.clone()));

        chat.submit("hi");
        assert!(!chat.poll().await);
        assert!(chat.is_busy());

        gate.notify_one();
        let mut applied = false;
        for _ in 0..100 {
            if chat.poll().await {
                applied = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(applied);
        assert_eq!(last_text(&chat), "done");
    }

    #[tokio::test]
    async fn test_timeout_frees_the_conversation() {
        let mut chat = ChatController::new(
            MockClient::new(Behaviour::Hang),
            "BIO",
            Some(Duration::from_millis(20)),
        );

        chat.submit("hello?");
        chat.wait().await;

        assert_eq!(last_text(&chat), FailureKind::Timeout.message());
        assert!(!chat.is_busy());
        assert!(chat.submit("again"));
    }

    #[tokio::test]
    async fn test_reset_aborts_and_starts_over() {
        let mut chat = controller(MockClient::new(Behaviour::Hang));

        chat.submit("hi");
        chat.reset();

        assert!(!chat.is_busy());
        assert!(!chat.conversation().has_started());
        assert!(chat.conversation().entries().is_empty());
        assert!(!chat.poll().await);
        assert!(!chat.wait().await);
    }

    #[tokio::test]
    async fn test_blank_input_spawns_nothing() {
        let client = MockClient::new(Behaviour::Reply("x"));
        let mut chat = controller(client.clone());

        assert!(!chat.submit("   "));
        assert!(!chat.submit_input());
        assert!(!chat.wait().await);
        assert_eq!(client.calls.load(Ordering::SeqCst), 0);
        assert_eq!(chat.model(), "mock-model");
    }
}
