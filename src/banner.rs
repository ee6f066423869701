//! Rotating banner: picks one recent or upcoming title per cycle.
//!
//! [`BannerSelector`] owns every piece of banner state (mode, previous
//! winner, published content) and is only mutated by its owner.
//! [`BannerRotation`] drives it from a single tokio task: timer ticks toggle
//! the mode and start cycles, cycles run concurrently, and finished cycles
//! are published in sequence order so a slow cycle can never overwrite a
//! newer one.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local, NaiveDate};
use futures::stream::{FuturesUnordered, StreamExt};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::catalog::{CatalogClient, ListEndpoint, Locale};
use crate::enrich::enrich_item;
use crate::media::{ApiError, ContentItem, MediaId};
use crate::normalize::{normalize_all_from, NormalizeMode};
use crate::settings::AppSettings;

pub const RECENT_WINDOW_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BannerMode {
    #[default]
    Upcoming,
    RecentlyReleased,
}

impl BannerMode {
    pub fn toggled(self) -> Self {
        match self {
            BannerMode::Upcoming => BannerMode::RecentlyReleased,
            BannerMode::RecentlyReleased => BannerMode::Upcoming,
        }
    }

    pub fn admits(self, date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            BannerMode::Upcoming => date > today,
            BannerMode::RecentlyReleased => {
                let window_start = today
                    .checked_sub_days(Days::new(RECENT_WINDOW_DAYS))
                    .unwrap_or(NaiveDate::MIN);
                date >= window_start && date <= today
            }
        }
    }
}

pub fn banner_endpoints() -> [ListEndpoint; 4] {
    [
        ListEndpoint::upcoming_movies(),
        ListEndpoint::tv_on_the_air(),
        ListEndpoint::documentaries(),
        ListEndpoint::tv_popular(),
    ]
}

/// Keeps items with a hero image whose effective date fits `mode`. The
/// first occurrence of a `(media type, id)` pair wins.
pub fn filter_candidates(
    items: Vec<ContentItem>,
    mode: BannerMode,
    today: NaiveDate,
) -> Vec<ContentItem> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| item.backdrop_path.is_some())
        .filter(|item| {
            item.release_date
                .is_some_and(|date| mode.admits(date, today))
        })
        .filter(|item| seen.insert((item.media_type, item.id.clone())))
        .collect()
}

/// Uniform pick that never repeats `previous` while another id is available.
pub fn pick_winner<'a, R: Rng + ?Sized>(
    candidates: &'a [ContentItem],
    previous: Option<&str>,
    rng: &mut R,
) -> Option<&'a ContentItem> {
    if candidates.is_empty() {
        return None;
    }
    if candidates.iter().all(|c| Some(c.id.as_str()) == previous) {
        return candidates.first();
    }
    loop {
        let pick = &candidates[rng.gen_range(0..candidates.len())];
        if Some(pick.id.as_str()) != previous {
            return Some(pick);
        }
    }
}

/// What the banner shows right now.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BannerState {
    pub current: Option<ContentItem>,
    /// Previous content, kept until the cross-fade finishes.
    pub outgoing: Option<ContentItem>,
    pub transitioning: bool,
    pub mode: BannerMode,
    pub paused: bool,
}

pub struct CycleRequest {
    pub seq: u64,
    pub mode: BannerMode,
    pub previous_id: Option<MediaId>,
    pub today: NaiveDate,
    rng: StdRng,
}

#[derive(Debug)]
pub struct CycleResult {
    pub seq: u64,
    pub outcome: Result<Option<ContentItem>, ApiError>,
}

async fn select_winner<C: CatalogClient + ?Sized>(
    client: &C,
    locale: &Locale,
    request: &mut CycleRequest,
) -> Result<Option<ContentItem>, ApiError> {
    let endpoints = banner_endpoints();
    let lists = futures::future::try_join_all(
        endpoints
            .iter()
            .map(|endpoint| client.list_by_endpoint(endpoint, &locale.language)),
    )
    .await?;

    let items: Vec<ContentItem> = endpoints
        .iter()
        .zip(&lists)
        .flat_map(|(endpoint, list)| {
            normalize_all_from(list, endpoint.media_type(), NormalizeMode::Lenient)
        })
        .collect();
    let candidates = filter_candidates(items, request.mode, request.today);
    debug!(
        seq = request.seq,
        mode = ?request.mode,
        candidates = candidates.len(),
        "banner candidates"
    );

    let Some(winner) =
        pick_winner(&candidates, request.previous_id.as_deref(), &mut request.rng).cloned()
    else {
        return Ok(None);
    };
    Ok(Some(enrich_item(client, winner, locale, request.today).await))
}

pub async fn execute_cycle<C: CatalogClient + ?Sized>(
    client: Arc<C>,
    locale: Locale,
    mut request: CycleRequest,
) -> CycleResult {
    let outcome = select_winner(client.as_ref(), &locale, &mut request).await;
    CycleResult {
        seq: request.seq,
        outcome,
    }
}

pub struct BannerSelector<C: ?Sized> {
    client: Arc<C>,
    locale: Locale,
    rng: StdRng,
    previous_id: Option<MediaId>,
    next_seq: u64,
    last_published_seq: u64,
    state: BannerState,
}

impl<C: CatalogClient + ?Sized + 'static> BannerSelector<C> {
    pub fn new(client: Arc<C>, locale: Locale) -> Self {
        Self::with_rng(client, locale, StdRng::from_entropy())
    }

    pub fn with_rng(client: Arc<C>, locale: Locale, rng: StdRng) -> Self {
        Self {
            client,
            locale,
            rng,
            previous_id: None,
            next_seq: 1,
            last_published_seq: 0,
            state: BannerState::default(),
        }
    }

    pub fn state(&self) -> &BannerState {
        &self.state
    }

    pub fn previous_id(&self) -> Option<&str> {
        self.previous_id.as_deref()
    }

    pub fn set_mode(&mut self, mode: BannerMode) {
        self.state.mode = mode;
    }

    pub fn set_paused(&mut self, paused: bool) {
        self.state.paused = paused;
    }

    /// Allocates the next sequence number and detaches everything the cycle
    /// needs, so several cycles can be in flight at once.
    pub fn start_cycle(
        &mut self,
        mode: BannerMode,
        today: NaiveDate,
    ) -> impl Future<Output = CycleResult> + Send + 'static {
        let seq = self.next_seq;
        self.next_seq += 1;
        let request = CycleRequest {
            seq,
            mode,
            previous_id: self.previous_id.clone(),
            today,
            rng: StdRng::seed_from_u64(self.rng.gen()),
        };
        execute_cycle(self.client.clone(), self.locale.clone(), request)
    }

    /// Makes `item` the current banner unless a newer cycle already won.
    pub fn publish(&mut self, seq: u64, item: ContentItem) -> bool {
        if seq <= self.last_published_seq {
            debug!(
                seq,
                last_published = self.last_published_seq,
                "dropping stale banner cycle"
            );
            return false;
        }
        info!(seq, id = %item.id, title = %item.title, kind = %item.kind, "banner published");
        self.last_published_seq = seq;
        self.previous_id = Some(item.id.clone());
        self.state.outgoing = self.state.current.take();
        self.state.transitioning = self.state.outgoing.is_some();
        self.state.current = Some(item);
        true
    }

    pub fn finish_transition(&mut self) {
        self.state.outgoing = None;
        self.state.transitioning = false;
    }

    /// Runs one cycle to completion and publishes its winner.
    pub async fn run_cycle(&mut self, mode: BannerMode, today: NaiveDate) -> Result<bool, ApiError> {
        self.set_mode(mode);
        let result = self.start_cycle(mode, today).await;
        match result.outcome? {
            Some(item) => Ok(self.publish(result.seq, item)),
            None => Ok(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerCommand {
    Pause,
    Resume,
    Shutdown,
}

#[derive(Debug, Clone)]
pub struct BannerHandle {
    commands: mpsc::UnboundedSender<BannerCommand>,
    state: watch::Receiver<BannerState>,
}

impl BannerHandle {
    /// Stops the timer from advancing, e.g. while a detail modal is open.
    /// Cycles already in flight still complete.
    pub fn pause(&self) {
        let _ = self.commands.send(BannerCommand::Pause);
    }

    pub fn resume(&self) {
        let _ = self.commands.send(BannerCommand::Resume);
    }

    pub fn shutdown(&self) {
        let _ = self.commands.send(BannerCommand::Shutdown);
    }

    pub fn subscribe(&self) -> watch::Receiver<BannerState> {
        self.state.clone()
    }

    pub fn current(&self) -> BannerState {
        self.state.borrow().clone()
    }
}

pub struct BannerRotation<C: ?Sized> {
    selector: BannerSelector<C>,
    interval: Duration,
    transition_delay: Duration,
    transition: Duration,
    today: fn() -> NaiveDate,
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

impl<C: CatalogClient + ?Sized + 'static> BannerRotation<C> {
    pub fn new(selector: BannerSelector<C>, settings: &AppSettings) -> Self {
        Self {
            selector,
            interval: settings.banner_interval(),
            transition_delay: settings.transition_delay(),
            transition: settings.transition(),
            today: local_today,
        }
    }

    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn spawn(self) -> (BannerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(self.selector.state().clone());
        let task = tokio::spawn(self.run(command_rx, state_tx));
        (
            BannerHandle {
                commands: command_tx,
                state: state_rx,
            },
            task,
        )
    }

    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<BannerCommand>,
        state_tx: watch::Sender<BannerState>,
    ) {
        let mut mode = BannerMode::Upcoming;
        let mut in_flight = FuturesUnordered::new();
        let mut pending: Option<(u64, ContentItem, Instant)> = None;
        let mut transition_ends: Option<Instant> = None;

        self.selector.set_mode(mode);
        in_flight.push(self.selector.start_cycle(mode, (self.today)()));

        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let pending_at = pending.as_ref().map_or_else(Instant::now, |p| p.2);
            let transition_at = transition_ends.unwrap_or_else(Instant::now);

            tokio::select! {
                _ = ticker.tick() => {
                    if self.selector.state().paused {
                        continue;
                    }
                    mode = mode.toggled();
                    self.selector.set_mode(mode);
                    in_flight.push(self.selector.start_cycle(mode, (self.today)()));
                    state_tx.send_replace(self.selector.state().clone());
                }
                command = commands.recv() => match command {
                    Some(BannerCommand::Pause) => {
                        self.selector.set_paused(true);
                        state_tx.send_replace(self.selector.state().clone());
                    }
                    Some(BannerCommand::Resume) => {
                        self.selector.set_paused(false);
                        state_tx.send_replace(self.selector.state().clone());
                    }
                    Some(BannerCommand::Shutdown) | None => break,
                },
                Some(result) = in_flight.next(), if !in_flight.is_empty() => {
                    match result.outcome {
                        Ok(Some(item)) => {
                            let newer_pending = pending.as_ref().is_some_and(|p| p.0 > result.seq);
                            if !newer_pending {
                                pending = Some((result.seq, item, Instant::now() + self.transition_delay));
                            } else {
                                debug!(seq = result.seq, "dropping stale banner cycle");
                            }
                        }
                        Ok(None) => debug!(seq = result.seq, "no banner candidates this cycle"),
                        Err(e) => warn!(seq = result.seq, error = %e, "banner cycle failed"),
                    }
                }
                _ = tokio::time::sleep_until(pending_at), if pending.is_some() => {
                    if let Some((seq, item, _)) = pending.take() {
                        if self.selector.publish(seq, item) {
                            transition_ends = Some(Instant::now() + self.transition);
                            state_tx.send_replace(self.selector.state().clone());
                        }
                    }
                }
                _ = tokio::time::sleep_until(transition_at), if transition_ends.is_some() => {
                    transition_ends = None;
                    self.selector.finish_transition();
                    state_tx.send_replace(self.selector.state().clone());
                }
            }
        }
        debug!("banner rotation stopped");
    }
}
