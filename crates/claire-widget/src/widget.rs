//! The widget instance: owns all session state and accepts user intents

use std::{sync::Arc, time::Duration};

use claire_api::ServiceApi;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    attachments::{AttachmentStager, FileRef},
    connectivity::{ConnectivityMonitor, ConnectivityState, DEFAULT_HEALTH_INTERVAL, MonitorHandle},
    conversation::{ConversationStore, MessageTexts},
    error::{Error, Result},
    events::WidgetEvent,
    transport::{PendingExchange, TransportClient},
    types::{AssistantReply, AttachmentKind, AttachmentRef, Message},
    window::{Transition, WindowController, WindowIntent, WindowState},
};

/// Identifier sent with every chat request unless configured otherwise
pub const DEFAULT_SESSION_ID: &str = "bpi-user-123";

/// Widget configuration
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    /// Fixed per-instance session identifier sent to the service
    pub session_id: String,
    /// Time between health probes
    pub health_interval: Duration,
    /// Greeting, apology, and attachment-only texts
    pub texts: MessageTexts,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            session_id: DEFAULT_SESSION_ID.to_string(),
            health_interval: DEFAULT_HEALTH_INTERVAL,
            texts: MessageTexts::default(),
        }
    }
}

/// Everything the user can ask the widget to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    Open,
    Minimize,
    ToggleMaximize,
    Close,
    StageFiles {
        files: Vec<FileRef>,
        kind: AttachmentKind,
    },
    UnstageFile(Uuid),
    UpdateDraftText(String),
    Send,
}

/// Read-only projection handed to the renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WidgetSnapshot {
    pub window: WindowState,
    pub messages: Vec<Message>,
    pub reachable: bool,
    pub staged: Vec<AttachmentRef>,
    pub outstanding_request: bool,
    pub draft: String,
    /// Whether the send control should be enabled
    pub can_send: bool,
}

/// One embedded chat widget.
///
/// All methods take `&self`, so a host can keep interacting (toggle the
/// window, stage files) while a [`Widget::send`] is suspended.
pub struct Widget {
    window: Mutex<WindowController>,
    conversation: Arc<Mutex<ConversationStore>>,
    stager: Mutex<AttachmentStager>,
    draft: Mutex<String>,
    connectivity: ConnectivityState,
    transport: TransportClient,
    monitor: ConnectivityMonitor,
    monitor_task: Mutex<Option<MonitorHandle>>,
    event_tx: broadcast::Sender<WidgetEvent>,
}

impl Widget {
    /// Create a widget. Nothing is probed until [`Widget::mount`].
    pub fn new(config: WidgetConfig, api: Arc<dyn ServiceApi>) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        let connectivity = ConnectivityState::default();
        let conversation = Arc::new(Mutex::new(ConversationStore::new(config.texts)));

        let transport = TransportClient::new(
            Arc::clone(&api),
            config.session_id,
            connectivity.clone(),
            Arc::clone(&conversation),
            event_tx.clone(),
        );
        let monitor = ConnectivityMonitor::new(
            api,
            connectivity.clone(),
            config.health_interval,
            event_tx.clone(),
        );

        Self {
            window: Mutex::new(WindowController::new()),
            conversation,
            stager: Mutex::new(AttachmentStager::new()),
            draft: Mutex::new(String::new()),
            connectivity,
            transport,
            monitor,
            monitor_task: Mutex::new(None),
            event_tx,
        }
    }

    /// Start the connectivity monitor: one probe now, then one per interval.
    /// Calling it again while mounted does nothing.
    pub fn mount(&self) {
        let mut task = self.monitor_task.lock();
        if task.is_none() {
            tracing::debug!("Mounting widget, interval {:?}", self.monitor.period());
            *task = Some(self.monitor.spawn());
        }
    }

    /// Stop the connectivity monitor and wait for it to exit
    pub async fn shutdown(&self) {
        let task = self.monitor_task.lock().take();
        if let Some(task) = task {
            task.shutdown().await;
        }
    }

    /// Run a health probe right away, outside the schedule
    pub async fn probe_now(&self) -> bool {
        self.monitor.probe().await
    }

    /// Subscribe to state-change events
    pub fn subscribe(&self) -> broadcast::Receiver<WidgetEvent> {
        self.event_tx.subscribe()
    }

    pub fn window_state(&self) -> WindowState {
        self.window.lock().state()
    }

    pub fn is_reachable(&self) -> bool {
        self.connectivity.is_reachable()
    }

    pub fn connectivity(&self) -> &ConnectivityState {
        &self.connectivity
    }

    pub fn session_id(&self) -> &str {
        self.transport.session_id()
    }

    /// Copy of the history
    pub fn messages(&self) -> Vec<Message> {
        self.conversation.lock().history().to_vec()
    }

    pub fn welcome_injected(&self) -> bool {
        self.conversation.lock().welcome_injected()
    }

    pub fn outstanding_request(&self) -> bool {
        self.conversation.lock().outstanding_request()
    }

    pub fn staged(&self) -> Vec<AttachmentRef> {
        self.stager.lock().staged().to_vec()
    }

    pub fn draft(&self) -> String {
        self.draft.lock().clone()
    }

    /// Build the projection for one render
    pub fn snapshot(&self) -> WidgetSnapshot {
        let window = self.window_state();
        let reachable = self.is_reachable();
        let staged = self.staged();
        let draft = self.draft();
        let (messages, outstanding_request, can_send) = {
            let conversation = self.conversation.lock();
            (
                conversation.history().to_vec(),
                conversation.outstanding_request(),
                conversation
                    .check_send(&draft, staged.len(), reachable)
                    .is_ok(),
            )
        };

        WidgetSnapshot {
            window,
            messages,
            reachable,
            staged,
            outstanding_request,
            draft,
            can_send,
        }
    }

    /// Apply one intent. Ignored window intents and guard-rejected sends are
    /// reported as `Ok(())` / `Err(Error::Rejected)` respectively; neither
    /// changes any state.
    pub async fn dispatch(&self, intent: Intent) -> Result<()> {
        match intent {
            Intent::Open => {
                self.open();
            }
            Intent::Minimize => {
                self.minimize();
            }
            Intent::ToggleMaximize => {
                self.toggle_maximize();
            }
            Intent::Close => {
                self.close();
            }
            Intent::StageFiles { files, kind } => {
                self.stage_files(files, kind);
            }
            Intent::UnstageFile(id) => {
                self.unstage_file(id);
            }
            Intent::UpdateDraftText(text) => self.update_draft(text),
            Intent::Send => {
                self.send().await?;
            }
        }
        Ok(())
    }

    fn transition(&self, intent: WindowIntent) -> Option<Transition> {
        let transition = self.window.lock().apply(intent);
        match transition {
            Some(t) => {
                let _ = self.event_tx.send(WidgetEvent::WindowChanged {
                    from: t.from,
                    to: t.to,
                });
            }
            None => {
                tracing::debug!("Ignoring {:?} in state {:?}", intent, self.window_state());
            }
        }
        transition
    }

    /// Mini → Expanded. Injects the greeting on a fresh session.
    pub fn open(&self) -> Option<Transition> {
        let transition = self.transition(WindowIntent::Open)?;
        self.after_transition(&transition);
        Some(transition)
    }

    /// Expanded ↔ Maximized
    pub fn toggle_maximize(&self) -> Option<Transition> {
        let transition = self.transition(WindowIntent::ToggleMaximize)?;
        self.after_transition(&transition);
        Some(transition)
    }

    /// Back to the bubble, keeping the conversation
    pub fn minimize(&self) -> Option<Transition> {
        self.transition(WindowIntent::Minimize)
    }

    /// Back to the bubble, clearing the conversation
    pub fn close(&self) -> Option<Transition> {
        let transition = self.transition(WindowIntent::Close)?;
        self.conversation.lock().reset();
        tracing::info!("Session closed");
        let _ = self.event_tx.send(WidgetEvent::SessionReset);
        Some(transition)
    }

    fn after_transition(&self, transition: &Transition) {
        if !transition.enters_expanded() {
            return;
        }
        let welcome = self.conversation.lock().inject_welcome();
        if let Some(message) = welcome {
            tracing::info!("Session opened");
            let _ = self.event_tx.send(WidgetEvent::MessageAppended { message });
        }
    }

    /// Stage files for the next send
    pub fn stage_files(&self, files: Vec<FileRef>, kind: AttachmentKind) -> Vec<AttachmentRef> {
        let (added, count) = {
            let mut stager = self.stager.lock();
            let added = stager.stage(files, kind);
            (added, stager.len())
        };
        if !added.is_empty() {
            let _ = self.event_tx.send(WidgetEvent::AttachmentsChanged { count });
        }
        added
    }

    /// Remove a staged file. Unknown ids are ignored.
    pub fn unstage_file(&self, id: Uuid) -> Option<AttachmentRef> {
        let (removed, count) = {
            let mut stager = self.stager.lock();
            let removed = stager.unstage(id);
            (removed, stager.len())
        };
        if removed.is_some() {
            let _ = self.event_tx.send(WidgetEvent::AttachmentsChanged { count });
        }
        removed
    }

    /// Replace the draft text
    pub fn update_draft(&self, text: impl Into<String>) {
        *self.draft.lock() = text.into();
    }

    /// Send the draft and staged attachments.
    ///
    /// Rejected sends return `Err(Error::Rejected)` and leave the draft,
    /// attachments, and history as they were. Accepted sends clear the draft
    /// and the stager before the service is contacted.
    pub async fn send(&self) -> Result<AssistantReply> {
        let pending = self.begin_send()?;
        pending.run().await.map_err(Error::from)
    }

    /// Replace the draft with `text` and start sending it in one step.
    ///
    /// No other draft update can land between the two, so hosts that accept
    /// input while an exchange runs should use this and then drive the
    /// returned exchange themselves.
    pub fn submit(&self, text: impl Into<String>) -> Result<PendingExchange> {
        let mut draft = self.draft.lock();
        *draft = text.into();
        self.start_exchange(&mut draft)
    }

    /// Start sending the current draft without awaiting the reply
    pub fn begin_send(&self) -> Result<PendingExchange> {
        let mut draft = self.draft.lock();
        self.start_exchange(&mut draft)
    }

    // Lock order: draft, stager, conversation
    fn start_exchange(&self, draft: &mut String) -> Result<PendingExchange> {
        let mut stager = self.stager.lock();
        let pending = match self.transport.start(draft, stager.staged().to_vec()) {
            Ok(pending) => pending,
            Err(rejected) => {
                tracing::debug!("Send ignored: {}", rejected.reason);
                return Err(rejected.into());
            }
        };

        let sent = stager.drain();
        draft.clear();
        if !sent.is_empty() {
            let _ = self.event_tx.send(WidgetEvent::AttachmentsChanged { count: 0 });
        }
        Ok(pending)
    }
}

impl Drop for Widget {
    fn drop(&mut self) {
        if let Some(task) = self.monitor_task.get_mut().take() {
            task.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{ERROR_MESSAGE, WELCOME_MESSAGE};
    use crate::error::GuardRejection;
    use async_trait::async_trait;
    use claire_api::{ChatRequest, ChatResponse, HealthResponse};
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
    use tokio::sync::Notify;

    /// Service stand-in with a switchable health status and chat outcome
    struct MockService {
        healthy: AtomicBool,
        fail_chat: AtomicBool,
        gate: Option<Arc<Notify>>,
        chat_calls: AtomicU32,
        questions: Mutex<Vec<String>>,
    }

    impl MockService {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(true),
                fail_chat: AtomicBool::new(false),
                gate: None,
                chat_calls: AtomicU32::new(0),
                questions: Mutex::new(Vec::new()),
            })
        }

        fn gated(gate: Arc<Notify>) -> Arc<Self> {
            Arc::new(Self {
                healthy: AtomicBool::new(true),
                fail_chat: AtomicBool::new(false),
                gate: Some(gate),
                chat_calls: AtomicU32::new(0),
                questions: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ServiceApi for MockService {
        async fn health(&self) -> claire_api::Result<HealthResponse> {
            let status = if self.healthy.load(Ordering::SeqCst) {
                "healthy"
            } else {
                "unhealthy"
            };
            Ok(HealthResponse {
                status: status.to_string(),
                models_loaded: Default::default(),
                vector_db_ready: true,
                ocr_available: false,
            })
        }

        async fn chat(&self, request: &ChatRequest) -> claire_api::Result<ChatResponse> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.questions.lock().push(request.question.clone());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            if self.fail_chat.load(Ordering::SeqCst) {
                return Err(claire_api::Error::status(502, "bad gateway"));
            }
            Ok(ChatResponse {
                answer: format!("Answer to: {}", request.question),
                language: Some(claire_api::LanguageDetection {
                    language: "english".into(),
                    confidence: 0.99,
                }),
                emotion: None,
                processing_time: Some(0.8),
                contexts: None,
                has_attachment: false,
            })
        }
    }

    async fn connected_widget(service: Arc<MockService>) -> Widget {
        let widget = Widget::new(WidgetConfig::default(), service);
        assert!(widget.probe_now().await);
        widget
    }

    #[tokio::test]
    async fn test_scenario_a_healthy_probe_enables_send() {
        let widget = Widget::new(WidgetConfig::default(), MockService::new());
        widget.update_draft("hi");
        assert!(!widget.snapshot().can_send);

        widget.probe_now().await;
        let snap = widget.snapshot();
        assert!(snap.reachable);
        assert!(snap.can_send);
    }

    #[tokio::test]
    async fn test_scenario_b_open_injects_single_greeting() {
        let widget = Widget::new(WidgetConfig::default(), MockService::new());
        widget.open();
        let messages = widget.messages();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_assistant());
        assert_eq!(messages[0].content, WELCOME_MESSAGE);
        assert!(widget.welcome_injected());
    }

    #[tokio::test]
    async fn test_scenario_c_successful_send() {
        let widget = connected_widget(MockService::new()).await;
        widget.open();
        let initial = widget.messages().len();

        widget.update_draft("What are your hours?");
        let reply = widget.send().await.unwrap();
        assert_eq!(reply.answer, "Answer to: What are your hours?");

        let messages = widget.messages();
        assert_eq!(messages.len(), initial + 2);
        assert!(messages[initial].is_user());
        assert_eq!(messages[initial].content, "What are your hours?");
        assert!(messages[initial].attachments.is_empty());
        let answer = &messages[initial + 1];
        assert!(answer.is_assistant());
        assert!(!answer.is_thinking);
        assert_eq!(answer.content, "Answer to: What are your hours?");
        assert_eq!(
            answer.metadata.as_ref().unwrap().language.as_deref(),
            Some("english")
        );
        assert!(messages.iter().all(|m| !m.is_thinking));
        assert!(widget.draft().is_empty());
    }

    #[tokio::test]
    async fn test_scenario_d_failed_send() {
        let service = MockService::new();
        service.fail_chat.store(true, Ordering::SeqCst);
        let widget = connected_widget(service).await;
        widget.open();
        let mut events = widget.subscribe();

        widget.update_draft("hello");
        let err = widget.send().await.unwrap_err();
        assert!(matches!(err, Error::Api(_)));
        assert!(!err.is_rejection());

        let messages = widget.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[1].is_user());
        assert!(messages[2].is_error);
        assert_eq!(messages[2].content, ERROR_MESSAGE);
        assert!(!widget.outstanding_request());

        // The transient placeholder was visible to subscribers
        let mut saw_placeholder = false;
        while let Ok(event) = events.try_recv() {
            if let WidgetEvent::MessageAppended { message } = event {
                saw_placeholder |= message.is_thinking;
            }
        }
        assert!(saw_placeholder);
    }

    #[tokio::test]
    async fn test_scenario_e_attachments_travel_in_staging_order() {
        let widget = connected_widget(MockService::new()).await;
        widget.open();
        let staged = widget.stage_files(
            vec![FileRef::new("id-front.jpg", 2048)],
            AttachmentKind::Image,
        );
        let staged2 = widget.stage_files(
            vec![FileRef::new("statement.pdf", 4096)],
            AttachmentKind::File,
        );

        widget.update_draft("Please check these");
        let pending_send = widget.send();
        let reply = pending_send.await.unwrap();
        assert!(reply.answer.contains("Please check these"));

        let user = widget
            .messages()
            .into_iter()
            .find(|m| m.is_user())
            .unwrap();
        let ids: Vec<Uuid> = user.attachments.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![staged[0].id, staged2[0].id]);
        assert!(widget.staged().is_empty());
    }

    #[tokio::test]
    async fn test_attachment_only_send_uses_placeholder_question() {
        let service = MockService::new();
        let widget = connected_widget(service.clone()).await;
        widget.stage_files(vec![FileRef::new("a.png", 1)], AttachmentKind::Image);

        widget.send().await.unwrap();
        assert_eq!(
            service.questions.lock().as_slice(),
            [crate::conversation::ATTACHMENT_PLACEHOLDER]
        );
    }

    #[tokio::test]
    async fn test_rejected_sends_never_mutate() {
        let service = MockService::new();
        let widget = Widget::new(WidgetConfig::default(), service.clone());
        widget.open();
        widget.stage_files(vec![FileRef::new("a.pdf", 10)], AttachmentKind::File);
        widget.update_draft("hello");

        // Disconnected
        let before = widget.messages();
        let err = widget.send().await.unwrap_err();
        assert!(matches!(err, Error::Rejected(GuardRejection::Disconnected)));
        assert_eq!(widget.messages(), before);
        assert_eq!(widget.staged().len(), 1);
        assert_eq!(widget.draft(), "hello");

        // Empty
        widget.probe_now().await;
        let id = widget.staged()[0].id;
        widget.unstage_file(id);
        widget.update_draft("   ");
        let err = widget.send().await.unwrap_err();
        assert!(matches!(err, Error::Rejected(GuardRejection::EmptyMessage)));
        assert_eq!(widget.messages(), before);
        assert_eq!(service.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_send_while_in_flight_is_rejected_but_ui_stays_live() {
        let gate = Arc::new(Notify::new());
        let service = MockService::gated(gate.clone());
        let widget = connected_widget(service.clone()).await;
        widget.open();

        widget.update_draft("first");
        let first = widget.send();
        let others = async {
            tokio::task::yield_now().await;
            assert!(widget.outstanding_request());
            assert_eq!(
                widget.messages().iter().filter(|m| m.is_thinking).count(),
                1
            );

            // Window and stager still respond
            widget.toggle_maximize();
            assert_eq!(widget.window_state(), WindowState::Maximized);
            widget.stage_files(vec![FileRef::new("later.pdf", 5)], AttachmentKind::File);

            widget.update_draft("second");
            let len = widget.messages().len();
            let err = widget.send().await.unwrap_err();
            assert!(matches!(err, Error::Rejected(GuardRejection::RequestInFlight)));
            assert_eq!(widget.messages().len(), len);

            gate.notify_one();
        };
        let (first, ()) = futures::join!(first, others);
        first.unwrap();

        assert!(!widget.outstanding_request());
        assert_eq!(service.chat_calls.load(Ordering::SeqCst), 1);
        // Files staged mid-flight were not swept into the first send
        assert_eq!(widget.staged().len(), 1);
        assert_eq!(widget.draft(), "second");
    }

    #[tokio::test]
    async fn test_welcome_once_per_session() {
        let widget = Widget::new(WidgetConfig::default(), MockService::new());
        widget.open();
        widget.toggle_maximize();
        widget.toggle_maximize();
        widget.minimize();
        widget.open();
        assert_eq!(widget.messages().len(), 1);

        widget.close();
        assert!(widget.messages().is_empty());
        assert!(!widget.welcome_injected());

        widget.open();
        assert_eq!(widget.messages().len(), 1);
        assert!(widget.welcome_injected());
    }

    #[tokio::test]
    async fn test_close_always_empties_history() {
        let widget = connected_widget(MockService::new()).await;
        widget.open();
        for i in 0..3 {
            widget.update_draft(format!("question {i}"));
            widget.send().await.unwrap();
        }
        assert_eq!(widget.messages().len(), 7);

        widget.toggle_maximize();
        widget.close();
        assert_eq!(widget.window_state(), WindowState::Mini);
        assert!(widget.messages().is_empty());
        assert!(!widget.welcome_injected());
    }

    #[tokio::test]
    async fn test_ignored_intents_from_mini() {
        let widget = Widget::new(WidgetConfig::default(), MockService::new());
        assert!(widget.close().is_none());
        assert!(widget.minimize().is_none());
        assert!(widget.toggle_maximize().is_none());
        assert_eq!(widget.window_state(), WindowState::Mini);
        assert!(widget.messages().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_drives_intents() {
        let widget = connected_widget(MockService::new()).await;
        widget.dispatch(Intent::Open).await.unwrap();
        widget
            .dispatch(Intent::StageFiles {
                files: vec![FileRef::new("a.txt", 3)],
                kind: AttachmentKind::File,
            })
            .await
            .unwrap();
        widget
            .dispatch(Intent::UpdateDraftText("hi".into()))
            .await
            .unwrap();
        widget.dispatch(Intent::Send).await.unwrap();

        let snap = widget.snapshot();
        assert_eq!(snap.window, WindowState::Expanded);
        assert_eq!(snap.messages.len(), 3);
        assert!(snap.staged.is_empty());
        assert!(!snap.outstanding_request);

        widget.dispatch(Intent::Close).await.unwrap();
        assert!(widget.snapshot().messages.is_empty());

        let err = widget.dispatch(Intent::Send).await.unwrap_err();
        assert!(err.is_rejection());
    }

    #[tokio::test]
    async fn test_unhealthy_probe_disables_send() {
        let service = MockService::new();
        let widget = connected_widget(service.clone()).await;
        widget.update_draft("hello");
        assert!(widget.snapshot().can_send);

        service.healthy.store(false, Ordering::SeqCst);
        assert!(!widget.probe_now().await);
        assert!(!widget.snapshot().can_send);
    }

    #[tokio::test]
    async fn test_back_to_back_submissions_keep_first_text() {
        let gate = Arc::new(Notify::new());
        let service = MockService::gated(gate.clone());
        let widget = connected_widget(service.clone()).await;
        widget.open();

        let first = widget.submit("first question").unwrap();
        let running = tokio::spawn(first.run());

        let Err(err) = widget.submit("second question") else {
            panic!("second submission should be rejected while the first runs");
        };
        assert!(matches!(err, Error::Rejected(GuardRejection::RequestInFlight)));

        gate.notify_one();
        let reply = running.await.unwrap().unwrap();
        assert_eq!(reply.answer, "Answer to: first question");

        assert_eq!(service.questions.lock().as_slice(), ["first question"]);
        let user_texts: Vec<String> = widget
            .messages()
            .into_iter()
            .filter(|m| m.is_user())
            .map(|m| m.content)
            .collect();
        assert_eq!(user_texts, ["first question"]);
        // The rejected text stays in the draft for another try
        assert_eq!(widget.draft(), "second question");
    }

    #[tokio::test]
    async fn test_failed_probe_does_not_disturb_exchange_in_flight() {
        let gate = Arc::new(Notify::new());
        let service = MockService::gated(gate.clone());
        let widget = connected_widget(service.clone()).await;
        widget.open();

        let pending = widget.submit("Is my card blocked?").unwrap();
        let running = tokio::spawn(pending.run());
        tokio::task::yield_now().await;

        service.healthy.store(false, Ordering::SeqCst);
        assert!(!widget.probe_now().await);
        assert!(widget.outstanding_request());

        gate.notify_one();
        let reply = running.await.unwrap().unwrap();
        assert_eq!(reply.answer, "Answer to: Is my card blocked?");

        assert!(!widget.outstanding_request());
        let last = widget.messages().pop().unwrap();
        assert!(!last.is_error);
        assert!(!last.is_thinking);
        assert_eq!(last.content, "Answer to: Is my card blocked?");
        // The probe still took effect for the next send
        assert!(!widget.is_reachable());
    }

    #[test]
    fn test_welcome_at_most_once_for_every_window_sequence() {
        let intents = [
            WindowIntent::Open,
            WindowIntent::ToggleMaximize,
            WindowIntent::Minimize,
            WindowIntent::Close,
        ];

        for len in 1..=4u32 {
            for seq in 0..intents.len().pow(len) {
                let widget = Widget::new(WidgetConfig::default(), MockService::new());
                let mut code = seq;
                let mut walked = Vec::new();

                for _ in 0..len {
                    let intent = intents[code % intents.len()];
                    code /= intents.len();
                    walked.push(intent);

                    let transition = match intent {
                        WindowIntent::Open => widget.open(),
                        WindowIntent::ToggleMaximize => widget.toggle_maximize(),
                        WindowIntent::Minimize => widget.minimize(),
                        WindowIntent::Close => widget.close(),
                    };

                    let greetings = widget
                        .messages()
                        .iter()
                        .filter(|m| m.content == WELCOME_MESSAGE)
                        .count();
                    assert!(greetings <= 1, "{walked:?}: {greetings} greetings");
                    assert_eq!(greetings == 1, widget.welcome_injected(), "{walked:?}");
                    if widget.window_state().is_open() {
                        assert_eq!(greetings, 1, "{walked:?}");
                    }
                    if intent == WindowIntent::Close && transition.is_some() {
                        assert!(widget.messages().is_empty(), "{walked:?}");
                        assert!(!widget.welcome_injected(), "{walked:?}");
                    }
                }
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_mount_probes_and_shutdown_stops() {
        let widget = Widget::new(WidgetConfig::default(), MockService::new());
        widget.mount();
        widget.mount();
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert!(widget.is_reachable());
        widget.shutdown().await;
    }
}
