//! The capture session: a polling state machine over one page.
//!
//! A session binds a [`PageSource`] to a store for the lifetime of one
//! browser page. It detects the platform once, then re-extracts the
//! whole conversation on a schedule (and on demand), replacing the
//! conversation's turns wholesale each pass and handing successful
//! captures to a background persister task.

use std::sync::Arc;
use std::time::Duration;

use scraper::Html;
use tokio::sync::{mpsc, watch};
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::dedupe::{dedupe_by_fingerprint, dedupe_pass};
use crate::pipeline::detect::detect_platform;
use crate::pipeline::extract::{extract_messages, extract_model};
use crate::pipeline::merge::spawn_persister;
use crate::pipeline::profiles::profile;
use crate::traits::{ConversationStore, PageSource};
use crate::types::{CaptureSettings, Conversation, Platform};

/// Queued commands waiting on the session loop.
const COMMAND_QUEUE_DEPTH: usize = 8;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Not on a supported chat page
    Idle,
    /// Waiting for the next scheduled or requested capture
    Armed,
    /// An extraction pass is in progress
    Capturing,
    /// The page navigated or a new chat started; settling before re-binding
    Resetting,
}

/// Commands a host can send into a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Run an extraction pass immediately
    CaptureNow,
    /// The user started a new chat; drop the current conversation shell
    NewChat,
}

/// Tunables that are not user settings.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long to wait after a reset before re-reading the page, so the
    /// app has re-rendered the new chat
    pub reset_settle: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            reset_settle: Duration::from_millis(500),
        }
    }
}

/// Handle for sending commands into a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Request an immediate extraction pass.
    pub async fn capture_now(&self) {
        self.send(SessionCommand::CaptureNow).await;
    }

    /// Tell the session the user started a new chat.
    pub async fn new_chat(&self) {
        self.send(SessionCommand::NewChat).await;
    }

    async fn send(&self, command: SessionCommand) {
        if self.command_tx.send(command).await.is_err() {
            debug!(?command, "session has shut down, command dropped");
        }
    }
}

/// A capture session bound to one page and one store.
pub struct CaptureSession<P, S> {
    page: P,
    store: Arc<S>,
    settings_rx: watch::Receiver<CaptureSettings>,
    command_rx: mpsc::Receiver<SessionCommand>,
    config: SessionConfig,
}

impl<P, S> CaptureSession<P, S>
where
    P: PageSource,
    S: ConversationStore + 'static,
{
    /// Create a session and the handle used to command it.
    pub fn new(
        page: P,
        store: Arc<S>,
        settings_rx: watch::Receiver<CaptureSettings>,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let session = Self {
            page,
            store,
            settings_rx,
            command_rx,
            config,
        };
        (session, SessionHandle { command_tx })
    }

    /// Drive the session until cancelled.
    ///
    /// Detects the platform from the first snapshot; on an unsupported
    /// page the session stays idle until cancellation rather than
    /// erroring, since the host attaches it to every page. The schedule
    /// fires immediately once armed, then at the configured frequency,
    /// and is re-armed whenever settings change.
    pub async fn run(self, cancel: CancellationToken) -> Result<()> {
        let Self {
            page,
            store,
            mut settings_rx,
            mut command_rx,
            config,
        } = self;

        let first = page.snapshot().await?;
        let Some(mut platform) = detect_platform(&first.url) else {
            info!(url = %first.url, "not a supported chat page, session idle");
            cancel.cancelled().await;
            return Ok(());
        };
        info!(platform = %platform, url = %first.url, "capture session armed");

        let (persist_tx, persist_handle) = spawn_persister(store);
        let mut conversation = Conversation::shell(platform, &first.url);
        let mut state = SessionState::Armed;
        let mut settings = settings_rx.borrow().clone();
        let mut schedule = arm_schedule(&settings, platform);

        let mut settings_open = true;
        let mut commands_open = true;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                changed = settings_rx.changed(), if settings_open => {
                    if changed.is_err() {
                        settings_open = false;
                        continue;
                    }
                    settings = settings_rx.borrow_and_update().clone();
                    debug!(?settings, "settings changed, re-arming schedule");
                    schedule = arm_schedule(&settings, platform);
                }

                command = command_rx.recv(), if commands_open => match command {
                    Some(SessionCommand::CaptureNow) => {
                        capture_once(
                            &page,
                            config.reset_settle,
                            &mut state,
                            &mut platform,
                            &mut conversation,
                            &persist_tx,
                        )
                        .await;
                    }
                    Some(SessionCommand::NewChat) => {
                        reset_for_new_chat(
                            &page,
                            config.reset_settle,
                            &mut state,
                            &mut platform,
                            &mut conversation,
                        )
                        .await;
                    }
                    None => commands_open = false,
                },

                _ = next_tick(&mut schedule) => {
                    capture_once(
                        &page,
                        config.reset_settle,
                        &mut state,
                        &mut platform,
                        &mut conversation,
                        &persist_tx,
                    )
                    .await;
                }
            }
        }

        // Let queued captures finish before reporting shutdown.
        drop(persist_tx);
        let _ = persist_handle.await;
        info!("capture session stopped");
        Ok(())
    }
}

/// Run one full extraction pass over a serialized page.
///
/// Parses the markup, extracts and deduplicates utterances, and replaces
/// the conversation's turns wholesale. An empty extraction leaves the
/// conversation untouched. Returns the number of turns now held.
pub fn capture_pass(platform: Platform, html: &str, conversation: &mut Conversation) -> usize {
    let document = Html::parse_document(html);
    let profile = profile(platform);

    let extracted = extract_messages(profile, &document, &conversation.id);
    let deduped = dedupe_pass(extracted);
    if deduped.is_empty() {
        return 0;
    }

    conversation.interactions = dedupe_by_fingerprint(deduped);
    if let Some(model) = extract_model(profile, &document) {
        conversation.target_model_requested = Some(model);
    }
    conversation.interactions.len()
}

fn transition(state: &mut SessionState, next: SessionState) {
    if *state != next {
        debug!(from = ?state, to = ?next, "session state");
        *state = next;
    }
}

fn arm_schedule(settings: &CaptureSettings, platform: Platform) -> Option<Interval> {
    if !settings.auto_capture_enabled {
        debug!("automatic capture disabled");
        return None;
    }
    if !settings.platform_enabled(platform) {
        debug!(platform = %platform, "platform disabled in settings");
        return None;
    }
    let mut interval = tokio::time::interval(settings.frequency());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    Some(interval)
}

async fn next_tick(schedule: &mut Option<Interval>) {
    match schedule {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn capture_once<P: PageSource>(
    page: &P,
    settle: Duration,
    state: &mut SessionState,
    platform: &mut Platform,
    conversation: &mut Conversation,
    persist_tx: &mpsc::Sender<Conversation>,
) {
    transition(state, SessionState::Capturing);
    let snapshot = match page.snapshot().await {
        Ok(snapshot) => snapshot,
        Err(err) => {
            warn!(error = %err, "snapshot failed, skipping pass");
            transition(state, SessionState::Armed);
            return;
        }
    };

    // An in-page navigation means a different conversation; rebind to it
    // after giving the app a moment to render.
    let snapshot = if snapshot.url != conversation.conversation_url {
        transition(state, SessionState::Resetting);
        debug!(
            from = %conversation.conversation_url,
            to = %snapshot.url,
            "page url changed, starting a fresh conversation"
        );
        tokio::time::sleep(settle).await;
        let settled = match page.snapshot().await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(error = %err, "snapshot failed after navigation");
                transition(state, SessionState::Armed);
                return;
            }
        };
        match detect_platform(&settled.url) {
            Some(detected) => {
                *platform = detected;
                *conversation = Conversation::shell(detected, &settled.url);
                settled
            }
            None => {
                info!(url = %settled.url, "page left supported chat sites");
                transition(state, SessionState::Idle);
                return;
            }
        }
    } else {
        snapshot
    };

    let count = capture_pass(*platform, &snapshot.html, conversation);
    if count == 0 {
        debug!(url = %snapshot.url, "no utterances extracted");
        transition(state, SessionState::Armed);
        return;
    }

    debug!(count, url = %snapshot.url, "captured conversation turns");
    if let Err(err) = persist_tx.try_send(conversation.clone()) {
        warn!(error = %err, "persist queue full, capture dropped");
    }
    transition(state, SessionState::Armed);
}

async fn reset_for_new_chat<P: PageSource>(
    page: &P,
    settle: Duration,
    state: &mut SessionState,
    platform: &mut Platform,
    conversation: &mut Conversation,
) {
    transition(state, SessionState::Resetting);
    info!("new chat started, dropping conversation shell");
    tokio::time::sleep(settle).await;

    match page.snapshot().await {
        Ok(snapshot) => match detect_platform(&snapshot.url) {
            Some(detected) => {
                *platform = detected;
                *conversation = Conversation::shell(detected, &snapshot.url);
                transition(state, SessionState::Armed);
            }
            None => {
                info!(url = %snapshot.url, "page left supported chat sites");
                transition(state, SessionState::Idle);
            }
        },
        Err(err) => {
            // Keep the binding; the next pass will re-check the URL.
            warn!(error = %err, "snapshot failed after new chat");
            *conversation = Conversation::shell(*platform, &conversation.conversation_url);
            transition(state, SessionState::Armed);
        }
    }
}
