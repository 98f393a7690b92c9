// The coordinator: background-context equivalent. Owns the settings and
// the tab registry, validates and forwards analyze requests, broadcasts
// settings changes, and keeps the badge in step with result counts.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::page::PageMode;
use crate::protocol::{EngineEvent, Envelope, Request, Response, TabId};
use crate::session::{PageSession, SessionOptions};
use crate::settings::{Settings, SharedSettings};
use crate::stats::StatsProvider;
use crate::store::Store;

pub const BADGE_COLOR: &str = "#ff0000";

/// Shared engine state behind the host loop. One session per registered
/// tab; the settings handle is shared with every session so a save is
/// visible everywhere at once.
pub struct Coordinator {
    settings: SharedSettings,
    store: Arc<dyn Store>,
    provider: Arc<dyn StatsProvider>,
    sessions: RwLock<HashMap<TabId, PageSession>>,
    events: mpsc::UnboundedSender<EngineEvent>,
    options: SessionOptions,
}

impl Coordinator {
    /// Build the coordinator and the event stream the host loop drains.
    pub fn new(
        settings: Settings,
        store: Arc<dyn Store>,
        provider: Arc<dyn StatsProvider>,
        options: SessionOptions,
    ) -> (Arc<Self>, mpsc::UnboundedReceiver<EngineEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let coordinator = Arc::new(Self {
            settings: settings.shared(),
            store,
            provider,
            sessions: RwLock::new(HashMap::new()),
            events,
            options,
        });
        (coordinator, events_rx)
    }

    pub fn settings_handle(&self) -> SharedSettings {
        Arc::clone(&self.settings)
    }

    /// Route one framed request to the right handler.
    pub async fn handle(&self, envelope: Envelope) -> Response {
        let tab = envelope.tab_id;
        match envelope.request {
            Request::GetSettings => {
                Response::with_settings(self.settings.read().await.clone())
            }
            Request::SaveSettings { settings } => self.save_settings(settings).await,
            Request::Analyze => self.analyze(tab).await,
            Request::ResultsReady { count } => {
                self.emit(Self::badge_event(count));
                Response::ok()
            }
            Request::PageLoaded { url, dom } => {
                let session = self.session_for(tab).await;
                session
                    .handle(Request::PageLoaded { url, dom })
                    .await
            }
            request @ (Request::ClearRatios
            | Request::SettingsUpdated { .. }
            | Request::PageGrew { .. }) => match self.session(tab).await {
                Some(session) => session.handle(request).await,
                None => Response::error(
                    "Content script not found. Please refresh the page and try again.",
                ),
            },
            Request::GetResults => match self.store.get_results().await {
                Ok(results) => Response::with_results(results),
                Err(e) => Response::error(e.to_string()),
            },
        }
    }

    /// Companion frame for a session-emitted event: a results count also
    /// moves the badge.
    pub fn companion(event: &EngineEvent) -> Option<EngineEvent> {
        match event {
            EngineEvent::ResultsReady { count, .. } => Some(Self::badge_event(*count)),
            _ => None,
        }
    }

    /// The badge frame a result count maps to; zero clears the badge.
    pub fn badge_event(count: usize) -> EngineEvent {
        EngineEvent::BadgeUpdated {
            text: if count > 0 {
                count.to_string()
            } else {
                String::new()
            },
            color: BADGE_COLOR.to_string(),
        }
    }

    /// Validate, persist, adopt, and broadcast a settings save.
    async fn save_settings(&self, settings: Settings) -> Response {
        if let Err(e) = settings.validate() {
            return Response::error(e.to_string());
        }
        if let Err(e) = self.store.save_settings(&settings).await {
            warn!(error = %e, "Failed to persist settings");
            return Response::error(e.to_string());
        }
        *self.settings.write().await = settings.clone();
        info!(enabled = settings.enabled, "Settings saved");

        // every session on a supported page adopts the change
        let sessions = self.sessions.read().await;
        for (tab, session) in sessions.iter() {
            if session.mode().await == PageMode::Unsupported {
                continue;
            }
            debug!(tab = %tab, "Broadcasting settings update");
            let reply = session
                .handle(Request::SettingsUpdated {
                    settings: settings.clone(),
                })
                .await;
            if !reply.success {
                warn!(tab = %tab, error = ?reply.error, "Session rejected settings update");
            }
        }
        Response::ok()
    }

    /// Gatekeep and forward an analyze request to the tab's session.
    async fn analyze(&self, tab: TabId) -> Response {
        let settings = self.settings.read().await.clone();
        if settings.api_key.is_empty() {
            return Response::error(
                "No YouTube API key provided. Please add your API key in the extension settings.",
            );
        }
        if !settings.enabled {
            return Response::error("Extension is disabled. Please enable it in settings.");
        }
        match self.session(tab).await {
            Some(session) => session.start_scan().await,
            None => Response::error(
                "Content script not found. Please refresh the page and try again.",
            ),
        }
    }

    async fn session(&self, tab: TabId) -> Option<PageSession> {
        self.sessions.read().await.get(&tab).cloned()
    }

    /// Existing session for the tab, or a freshly registered one.
    async fn session_for(&self, tab: TabId) -> PageSession {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(tab)
            .or_insert_with(|| {
                debug!(tab = %tab, "Registering page session");
                PageSession::new(
                    tab,
                    Arc::clone(&self.settings),
                    Arc::clone(&self.provider),
                    Arc::clone(&self.store),
                    self.events.clone(),
                    self.options.clone(),
                )
            })
            .clone()
    }

    fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }
}
