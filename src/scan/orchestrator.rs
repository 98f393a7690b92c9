// The scan pipeline: enumerate candidates, fetch stats, annotate titles.
//
// Candidates are processed strictly in locator order with at most one
// fetch in flight, so one videoId can never race itself into two requests.
// The single-flight gate lives in the session; by the time run() is called
// the running flag is already held.

use std::sync::Arc;

use anyhow::{bail, Result};
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use crate::page::{annotate, locate, Candidate, PageMode};
use crate::protocol::{AnnotationRecord, EngineEvent};
use crate::ratio;
use crate::session::SessionContext;
use crate::stats::VideoStat;

/// What a pass enumerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanKind {
    /// Every candidate the locator finds, capped at maxResults.
    Full,
    /// Only cards without a marker or overlay in their subtree.
    Incremental,
    /// Restore everything, then re-annotate from cache only. Runs after a
    /// settings change; never fetches.
    Reannotate,
}

/// What a finished pass reports.
#[derive(Debug, Clone, Default)]
pub struct ScanSummary {
    pub mode: PageMode,
    /// Candidates enumerated, after the maxResults cap.
    pub candidates: usize,
    pub annotated: usize,
    /// Clean stats whose ratio fell below the configured minimum.
    pub suppressed: usize,
    /// Per-candidate failures that were contained and logged.
    pub errors: usize,
    pub records: Vec<AnnotationRecord>,
}

/// Run one pass over the session's document.
pub async fn run(ctx: &Arc<SessionContext>, kind: ScanKind) -> Result<ScanSummary> {
    let mode = *ctx.mode.read().await;
    let max_results = ctx.settings.read().await.max_results as usize;

    let mut summary = ScanSummary {
        mode,
        ..Default::default()
    };

    if mode == PageMode::Unsupported {
        if kind == ScanKind::Full {
            bail!("This page type is not supported for scanning");
        }
        return Ok(summary);
    }

    if kind == ScanKind::Full {
        let message = match mode {
            PageMode::GoogleResults => "Scanning Google search results for YouTube videos...",
            _ => "Scanning videos for like ratios...",
        };
        ctx.set_status(message).await;
    }

    if kind == ScanKind::Reannotate {
        let mut doc = ctx.doc.lock().await;
        annotate::restore_all(&mut doc);
    }

    // Enumerate under one doc lock; the generation pins the tree the
    // NodeIds belong to.
    let (candidates, start_generation) = {
        let doc = ctx.doc.lock().await;
        let candidates: Vec<Candidate> = match mode {
            PageMode::GoogleResults => locate::google_candidates(&doc, &ctx.selectors),
            _ => {
                let cards = if kind == ScanKind::Incremental {
                    locate::new_platform_cards(&doc, &ctx.selectors)
                } else {
                    locate::platform_cards(&doc, &ctx.selectors)
                };
                cards
                    .into_iter()
                    .filter_map(|card| locate::candidate_for(&doc, card, &ctx.selectors))
                    // a card without a thumbnail link inside it is not a
                    // real listing; skip it before it costs a fetch
                    .filter(|c| locate::thumbnail_link(&doc, c.container, &ctx.selectors).is_some())
                    .collect()
            }
        };
        (candidates, doc.generation())
    };

    let mut candidates = candidates;
    if kind == ScanKind::Full {
        candidates.truncate(max_results);
    }
    summary.candidates = candidates.len();
    debug!(mode = %mode, count = candidates.len(), "Candidates enumerated");

    if candidates.is_empty() && mode == PageMode::GoogleResults && kind == ScanKind::Full {
        ctx.flash_status("No YouTube videos found in search results").await;
        return Ok(summary);
    }

    let progress = if ctx.options.show_progress && !candidates.is_empty() {
        let bar = ProgressBar::new(candidates.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("  Scanning [{bar:30}] {pos}/{len} ({eta})")
                .unwrap(),
        );
        Some(bar)
    } else {
        None
    };

    let total = candidates.len();
    let mut fetched = 0usize;

    for candidate in &candidates {
        let cached = ctx.cache.lock().await.get(&candidate.video_id).cloned();
        let stat = match cached {
            Some(stat) => stat,
            None if kind == ScanKind::Reannotate => {
                if let Some(bar) = &progress {
                    bar.inc(1);
                }
                continue;
            }
            None => {
                fetched += 1;
                if kind == ScanKind::Full {
                    ctx.update_status_line(&format!("Scanning {fetched} of {total} videos"))
                        .await;
                }
                let lookup = ctx.provider.fetch(&candidate.video_id).await;
                let stat = VideoStat::from_lookup(&candidate.video_id, &candidate.url, &lookup);
                ctx.cache.lock().await.insert(stat.clone());
                stat
            }
        };

        annotate_candidate(ctx, candidate, &stat, mode, start_generation, &mut summary).await;

        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }

    if let Some(bar) = progress {
        bar.finish_and_clear();
    }

    if kind == ScanKind::Full {
        match mode {
            PageMode::GoogleResults => {
                ctx.flash_status(&format!(
                    "Added like ratio to {fetched} YouTube videos in search results"
                ))
                .await;
            }
            _ => ctx.clear_status().await,
        }
    }

    finish(ctx, &mut summary).await?;
    Ok(summary)
}

/// Annotate one candidate from its stat. Failures are contained here: a
/// missing title or a replaced document never aborts the pass.
async fn annotate_candidate(
    ctx: &Arc<SessionContext>,
    candidate: &Candidate,
    stat: &VideoStat,
    mode: PageMode,
    start_generation: u64,
    summary: &mut ScanSummary,
) {
    // The gate re-reads settings so a mid-scan disable or threshold change
    // applies from the next candidate on.
    let settings = ctx.settings.read().await.clone();
    if !settings.enabled {
        return;
    }
    if ratio::below_threshold(stat, settings.min_ratio) {
        summary.suppressed += 1;
        return;
    }

    let display = ratio::display_for(stat);
    let tooltip = ratio::tooltip_for(stat);

    let mut doc = ctx.doc.lock().await;
    if doc.generation() != start_generation {
        // the page was replaced under us; these NodeIds belong to the old tree
        warn!(video_id = %candidate.video_id, "Document replaced mid-scan, skipping");
        summary.errors += 1;
        return;
    }

    let title = match mode {
        PageMode::GoogleResults => {
            annotate::find_title(&doc, candidate.container, &ctx.selectors.result_titles)
                .or(candidate.link)
        }
        _ => annotate::find_title(&doc, candidate.container, &ctx.selectors.title_candidates),
    };

    match title {
        Some(title) => {
            let original = doc.text_content(title);
            if annotate::annotate_title(&mut doc, title, &display, &tooltip) {
                summary.annotated += 1;
                summary.records.push(AnnotationRecord {
                    video_id: candidate.video_id.clone(),
                    prefix: display.prefix.clone(),
                    tier: display.tier.as_str().to_string(),
                    tooltip,
                    title_text: original,
                });
            }
        }
        None => {
            warn!(video_id = %candidate.video_id, "No title element found, skipping");
            summary.errors += 1;
        }
    }
}

/// Persist the cache snapshot and tell the coordinator how many results the
/// popup can show.
async fn finish(ctx: &Arc<SessionContext>, summary: &mut ScanSummary) -> Result<()> {
    let stats = ctx.cache.lock().await.stats();
    ctx.store.save_results(&stats).await?;
    ctx.store
        .set_scan_state(
            "last_scan_at",
            &Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        )
        .await?;

    ctx.emit(EngineEvent::ResultsReady {
        tab_id: ctx.tab,
        count: stats.len(),
    });
    if !summary.records.is_empty() {
        ctx.emit(EngineEvent::AnnotationsUpdated {
            tab_id: ctx.tab,
            annotations: summary.records.clone(),
        });
    }
    Ok(())
}
