// One page session per browser tab: the mirrored document, the per-page
// stat cache, the growth watcher, and the single-scan gate. The session
// owns no I/O of its own; passes run through the orchestrator and talk to
// the world via the stats provider, the store, and the event channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, Mutex, RwLock};
use tracing::{debug, error, info};
use url::Url;

use crate::page::dom::NodeId;
use crate::page::{annotate, classify, overlay, Document, PageMode, ScanSelectors, SnapshotNode};
use crate::protocol::{EngineEvent, Request, Response, TabId};
use crate::scan::orchestrator::{self, ScanKind, ScanSummary};
use crate::scan::MutationWatcher;
use crate::settings::{Settings, SharedSettings};
use crate::stats::{ResultCache, StatsProvider, VideoStat};
use crate::store::Store;

/// Tuning knobs that differ between the host loop and the CLI.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// How long a platform page gets to settle before the watcher arms.
    pub settle_delay: std::time::Duration,
    /// Lifetime of auto-hiding status messages.
    pub status_auto_hide: std::time::Duration,
    /// Draw a terminal progress bar during full passes.
    pub show_progress: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            settle_delay: std::time::Duration::from_secs(2),
            status_auto_hide: std::time::Duration::from_secs(3),
            show_progress: false,
        }
    }
}

/// Scan gate state, readable for status displays.
#[derive(Debug, Clone, Default)]
pub struct ScanStatus {
    pub running: bool,
    pub started_at: Option<DateTime<Utc>>,
    pub progress_message: Option<String>,
    pub last_error: Option<String>,
}

/// Everything a scan pass needs, shared between the session handle and the
/// spawned pass. Guards are never held across provider fetches.
pub struct SessionContext {
    pub(crate) tab: TabId,
    pub(crate) page_url: RwLock<Option<Url>>,
    pub(crate) mode: RwLock<PageMode>,
    pub(crate) doc: Mutex<Document>,
    pub(crate) cache: Mutex<ResultCache>,
    pub(crate) settings: SharedSettings,
    pub(crate) provider: Arc<dyn StatsProvider>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) selectors: ScanSelectors,
    pub(crate) scan_status: RwLock<ScanStatus>,
    pub(crate) watcher: Mutex<MutationWatcher>,
    pub(crate) events: mpsc::UnboundedSender<EngineEvent>,
    pub(crate) options: SessionOptions,
    status_epoch: AtomicU64,
}

impl SessionContext {
    pub(crate) fn emit(&self, event: EngineEvent) {
        let _ = self.events.send(event);
    }

    /// Show a status message and cancel any pending auto-hide.
    pub(crate) async fn set_status(&self, message: &str) {
        self.status_epoch.fetch_add(1, Ordering::SeqCst);
        let mut doc = self.doc.lock().await;
        overlay::show_status(&mut doc, message);
    }

    /// Update the text of the visible status without touching timers.
    pub(crate) async fn update_status_line(&self, message: &str) {
        let mut doc = self.doc.lock().await;
        overlay::update_status(&mut doc, message);
    }

    /// Show a message that hides itself after the configured delay, unless
    /// a newer status supersedes it first.
    pub(crate) async fn flash_status(self: &Arc<Self>, message: &str) {
        {
            let mut doc = self.doc.lock().await;
            overlay::show_status(&mut doc, message);
        }
        let epoch = self.status_epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let ctx = Arc::clone(self);
        tokio::spawn(async move {
            tokio::time::sleep(ctx.options.status_auto_hide).await;
            if ctx.status_epoch.load(Ordering::SeqCst) == epoch {
                let mut doc = ctx.doc.lock().await;
                overlay::hide_status(&mut doc);
            }
        });
    }

    pub(crate) async fn clear_status(&self) {
        self.status_epoch.fetch_add(1, Ordering::SeqCst);
        let mut doc = self.doc.lock().await;
        overlay::hide_status(&mut doc);
    }
}

/// Cheap cloneable handle to one tab's session.
#[derive(Clone)]
pub struct PageSession {
    ctx: Arc<SessionContext>,
}

impl PageSession {
    pub fn new(
        tab: TabId,
        settings: SharedSettings,
        provider: Arc<dyn StatsProvider>,
        store: Arc<dyn Store>,
        events: mpsc::UnboundedSender<EngineEvent>,
        options: SessionOptions,
    ) -> Self {
        Self {
            ctx: Arc::new(SessionContext {
                tab,
                page_url: RwLock::new(None),
                mode: RwLock::new(PageMode::Unsupported),
                doc: Mutex::new(Document::new()),
                cache: Mutex::new(ResultCache::new()),
                settings,
                provider,
                store,
                selectors: ScanSelectors::default(),
                scan_status: RwLock::new(ScanStatus::default()),
                watcher: Mutex::new(MutationWatcher::new()),
                events,
                options,
                status_epoch: AtomicU64::new(0),
            }),
        }
    }

    pub fn tab(&self) -> TabId {
        self.ctx.tab
    }

    /// Route one request. Coordinator-level actions are rejected here.
    pub async fn handle(&self, request: Request) -> Response {
        match request {
            Request::Analyze => self.start_scan().await,
            Request::ClearRatios => {
                self.clear().await;
                Response::ok()
            }
            Request::PageLoaded { url, dom } => self.page_loaded(&url, dom).await,
            Request::SettingsUpdated { settings } => self.apply_settings(settings).await,
            Request::PageGrew { nodes } => self.page_grew(nodes).await,
            Request::GetResults => Response::with_results(self.results().await),
            Request::GetSettings | Request::SaveSettings { .. } | Request::ResultsReady { .. } => {
                Response::error("Request must be handled by the coordinator")
            }
        }
    }

    /// Reclassify the session for a freshly loaded page and swap in its
    /// snapshot. Platform pages get the watcher re-armed after the settle
    /// delay; everything else disarms it.
    async fn page_loaded(&self, url: &str, dom: Option<SnapshotNode>) -> Response {
        let mode = classify::classify_str(url);
        {
            *self.ctx.page_url.write().await = Url::parse(url).ok();
            *self.ctx.mode.write().await = mode;
        }
        if let Some(snapshot) = dom {
            let mut doc = self.ctx.doc.lock().await;
            let generation = doc.generation() + 1;
            let mut next = Document::from_snapshot(&snapshot);
            next.set_generation(generation);
            *doc = next;
        }
        info!(tab = %self.ctx.tab, mode = %mode, "Page classified");

        if mode.is_platform() {
            let token = self.ctx.watcher.lock().await.schedule();
            let ctx = Arc::clone(&self.ctx);
            tokio::spawn(async move {
                tokio::time::sleep(ctx.options.settle_delay).await;
                if ctx.watcher.lock().await.arm(token) {
                    debug!(tab = %ctx.tab, "Mutation watcher armed");
                }
            });
        } else {
            self.ctx.watcher.lock().await.disarm();
        }
        Response::ok()
    }

    /// Kick off a full pass in the background. Replies immediately; a pass
    /// already in flight gets the soft `Already scanning` rejection.
    pub async fn start_scan(&self) -> Response {
        if !self.ctx.settings.read().await.enabled {
            return Response::error("Extension is disabled. Please enable it in settings.");
        }
        {
            let mut status = self.ctx.scan_status.write().await;
            if status.running {
                return Response::busy();
            }
            status.running = true;
            status.started_at = Some(Utc::now());
            status.progress_message = Some("Scan started".to_string());
            status.last_error = None;
        }
        self.launch(ScanKind::Full);
        Response::ok()
    }

    /// Run a full pass inline and return its summary. The CLI entry point.
    pub async fn scan_now(&self) -> Result<ScanSummary> {
        if !self.ctx.settings.read().await.enabled {
            bail!("Extension is disabled. Please enable it in settings.");
        }
        {
            let mut status = self.ctx.scan_status.write().await;
            if status.running {
                bail!("A scan pass is already running");
            }
            status.running = true;
            status.started_at = Some(Utc::now());
            status.last_error = None;
        }
        let result = orchestrator::run(&self.ctx, ScanKind::Full).await;
        let mut status = self.ctx.scan_status.write().await;
        status.running = false;
        if let Err(e) = &result {
            status.last_error = Some(e.to_string());
        }
        result
    }

    /// Adopt new settings. Disabling restores the page; staying enabled
    /// rebuilds annotations from cache under the new threshold, without
    /// refetching anything.
    async fn apply_settings(&self, settings: Settings) -> Response {
        let enabled = settings.enabled;
        *self.ctx.settings.write().await = settings;

        if !enabled {
            info!(tab = %self.ctx.tab, "Disabled, restoring titles");
            self.clear().await;
            return Response::ok();
        }

        {
            let mut status = self.ctx.scan_status.write().await;
            if status.running {
                // a live pass reads settings per candidate, so the new
                // threshold applies from here on anyway
                return Response::ok();
            }
            status.running = true;
            status.started_at = Some(Utc::now());
        }
        let result = orchestrator::run(&self.ctx, ScanKind::Reannotate).await;
        {
            let mut status = self.ctx.scan_status.write().await;
            status.running = false;
            if let Err(e) = &result {
                status.last_error = Some(e.to_string());
            }
        }
        match result {
            Ok(_) => Response::ok(),
            Err(e) => Response::error(e.to_string()),
        }
    }

    /// Restore every annotated title, drop the cache, clear the badge.
    pub async fn clear(&self) {
        let restored = {
            let mut doc = self.ctx.doc.lock().await;
            annotate::restore_all(&mut doc)
        };
        self.ctx.cache.lock().await.clear();
        self.ctx.clear_status().await;
        if let Err(e) = self.ctx.store.save_results(&[]).await {
            error!(tab = %self.ctx.tab, error = %e, "Failed to persist cleared results");
        }
        info!(tab = %self.ctx.tab, restored, "Cleared annotations");
        self.ctx.emit(EngineEvent::ResultsReady {
            tab_id: self.ctx.tab,
            count: 0,
        });
    }

    /// Graft appended subtrees into the mirror. When the watcher is armed
    /// and a batch carries video cards, an incremental pass starts, unless
    /// one is already running.
    async fn page_grew(&self, nodes: Vec<SnapshotNode>) -> Response {
        if nodes.is_empty() {
            return Response::ok();
        }
        let relevant = {
            let mut doc = self.ctx.doc.lock().await;
            let root = doc.root();
            let added: Vec<NodeId> = nodes
                .iter()
                .map(|node| doc.append_snapshot(root, node))
                .collect();
            let watcher = self.ctx.watcher.lock().await;
            watcher.is_armed()
                && MutationWatcher::batch_is_relevant(&doc, &added, &self.ctx.selectors)
        };
        if relevant {
            let should_launch = {
                let mut status = self.ctx.scan_status.write().await;
                if status.running {
                    false
                } else {
                    status.running = true;
                    status.started_at = Some(Utc::now());
                    true
                }
            };
            if should_launch {
                debug!(tab = %self.ctx.tab, "Launching incremental pass");
                self.launch(ScanKind::Incremental);
            }
        }
        Response::ok()
    }

    /// Spawn a pass. The caller has already flipped the running flag; the
    /// wrapper clears it and records any failure.
    fn launch(&self, kind: ScanKind) {
        let ctx = Arc::clone(&self.ctx);
        tokio::spawn(async move {
            let result = orchestrator::run(&ctx, kind).await;
            let mut status = ctx.scan_status.write().await;
            status.running = false;
            status.progress_message = None;
            match result {
                Ok(summary) => {
                    info!(
                        tab = %ctx.tab,
                        annotated = summary.annotated,
                        suppressed = summary.suppressed,
                        "Scan pass finished"
                    );
                }
                Err(e) => {
                    error!(tab = %ctx.tab, error = %e, "Scan pass failed");
                    status.last_error = Some(e.to_string());
                }
            }
        });
    }

    /// Live cache contents, in first-seen order.
    pub async fn results(&self) -> Vec<VideoStat> {
        self.ctx.cache.lock().await.stats()
    }

    pub async fn scan_status(&self) -> ScanStatus {
        self.ctx.scan_status.read().await.clone()
    }

    pub async fn mode(&self) -> PageMode {
        *self.ctx.mode.read().await
    }

    /// Block until no pass is running. Test and shutdown helper.
    pub async fn wait_idle(&self) {
        loop {
            if !self.ctx.scan_status.read().await.running {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }

    /// Read access to the mirrored document.
    pub async fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        let doc = self.ctx.doc.lock().await;
        f(&doc)
    }
}
