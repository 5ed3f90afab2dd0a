//! Polling controller for the explorer view.
//!
//! One controller owns one view. A background task checks the chain height
//! every `poll_interval`, sleeping only after the previous cycle finished, and
//! panel requests (`pin`, `select`) run between cycles. Both take the same
//! lock for their whole duration, so the cache and the view state only ever
//! see one writer.

use crate::{
    cache::BlockCache,
    error::RemoteError,
    messages::ViewRequest,
    sink::RenderSink,
    source::ChainSource,
    types::{Block, ViewState, UNSET},
    window,
};
use futures::{stream, StreamExt, TryStreamExt};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;

#[derive(Clone, Debug)]
pub struct TrackerOptions {
    pub poll_interval: Duration,
    pub page_size: usize,
    pub pagination_distance: u64,
    pub cache_capacity: usize,
    pub fetch_timeout: Duration,
    pub fetch_concurrency: usize,
    pub panel_title: String,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(3000),
            page_size: 50,
            pagination_distance: 15,
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            fetch_timeout: Duration::from_millis(10000),
            fetch_concurrency: 8,
            panel_title: "Block Explorer".into(),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Polling,
    Closed,
}

impl ControllerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ControllerState::Idle,
            1 => ControllerState::Polling,
            _ => ControllerState::Closed,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ControllerState::Idle => 0,
            ControllerState::Polling => 1,
            ControllerState::Closed => 2,
        }
    }
}

/// What a single polling cycle did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Height did not advance.
    Unchanged { height: u64 },
    /// Height advanced and a new snapshot was emitted.
    Advanced { height: u64 },
    /// The height check or the block batch failed; the view is untouched.
    Failed(RemoteError),
    /// The controller was closed; nothing was done or emitted.
    Closed,
}

pub struct TrackerController {
    source: Arc<dyn ChainSource>,
    sink: Arc<dyn RenderSink>,
    opts: TrackerOptions,
    // held for a whole cycle or request
    cache: Mutex<BlockCache>,
    snapshot: watch::Sender<Arc<ViewState>>,
    state: AtomicU8,
    last_cycle_ok: AtomicBool,
    wake: Notify,
}

impl TrackerController {
    pub fn new(
        source: Arc<dyn ChainSource>,
        sink: Arc<dyn RenderSink>,
        opts: TrackerOptions,
    ) -> Arc<Self> {
        let initial = Arc::new(ViewState::initial(
            opts.panel_title.clone(),
            opts.pagination_distance,
        ));
        let (snapshot, _) = watch::channel(initial);
        Arc::new(Self {
            source,
            sink,
            cache: Mutex::new(BlockCache::new(opts.cache_capacity)),
            opts,
            snapshot,
            state: AtomicU8::new(ControllerState::Idle.as_u8()),
            last_cycle_ok: AtomicBool::new(true),
            wake: Notify::new(),
        })
    }

    /// Build a controller and start polling right away.
    pub fn spawn(
        source: Arc<dyn ChainSource>,
        sink: Arc<dyn RenderSink>,
        opts: TrackerOptions,
    ) -> TrackerHandle {
        let controller = Self::new(source, sink, opts);
        let task = controller.start();
        TrackerHandle { controller, task }
    }

    /// Move from `Idle` to `Polling` and run the loop on the current runtime.
    /// Returns `None` if the controller was already started or closed.
    pub fn start(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        self.state
            .compare_exchange(
                ControllerState::Idle.as_u8(),
                ControllerState::Polling.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .ok()?;
        let this = Arc::clone(self);
        Some(tokio::spawn(async move { this.run_loop().await }))
    }

    pub fn state(&self) -> ControllerState {
        ControllerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn is_closed(&self) -> bool {
        self.state() == ControllerState::Closed
    }

    /// Terminal. In-flight fetches finish but their results are dropped.
    pub fn close(&self) {
        let prev = self
            .state
            .swap(ControllerState::Closed.as_u8(), Ordering::SeqCst);
        if ControllerState::from_u8(prev) != ControllerState::Closed {
            log::info!("tracker closed");
        }
        self.wake.notify_one();
    }

    /// Last emitted snapshot (the initial empty view before the first one).
    pub fn view(&self) -> Arc<ViewState> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.snapshot.subscribe()
    }

    /// Whether the most recent polling cycle reached the node and applied its
    /// result.
    pub fn last_cycle_ok(&self) -> bool {
        self.last_cycle_ok.load(Ordering::SeqCst)
    }

    async fn run_loop(self: Arc<Self>) {
        log::info!(
            "🚀 tracker polling started - interval: {}ms",
            self.opts.poll_interval.as_millis()
        );
        loop {
            if self.is_closed() {
                break;
            }
            self.poll_once().await;
            if self.is_closed() {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.opts.poll_interval) => {}
                _ = self.wake.notified() => {}
            }
        }
        log::info!("tracker polling stopped");
    }

    /// One height check, plus a window refresh if the chain advanced.
    pub async fn poll_once(&self) -> CycleOutcome {
        if self.is_closed() {
            return CycleOutcome::Closed;
        }
        let mut cache = self.cache.lock().await;
        if self.is_closed() {
            return CycleOutcome::Closed;
        }

        let height = match self.fetch_height().await {
            Ok(h) => h,
            Err(e) => {
                log::warn!("height check failed: {e}");
                self.last_cycle_ok.store(false, Ordering::SeqCst);
                return CycleOutcome::Failed(e);
            }
        };
        if self.is_closed() {
            return CycleOutcome::Closed;
        }

        let current = self.view();
        if height <= current.block_height {
            log::debug!("💤 No new blocks (height: {height})");
            self.last_cycle_ok.store(true, Ordering::SeqCst);
            return CycleOutcome::Unchanged { height };
        }
        log::info!("🔔 New block available {height}");

        let next = if current.is_pinned() {
            // browsing history: keep the window where the operator left it
            let next = ViewState {
                block_height: height,
                ..(*current).clone()
            };
            if let Some(head) = next.head_index() {
                cache.set_head(head);
            }
            next
        } else {
            let blocks = match self.resolve_window(&mut cache, UNSET, height).await {
                Ok(blocks) => blocks,
                Err(e) => {
                    log::warn!("block batch at height {height} failed: {e}");
                    self.last_cycle_ok.store(false, Ordering::SeqCst);
                    return CycleOutcome::Failed(e);
                }
            };
            if self.is_closed() {
                return CycleOutcome::Closed;
            }
            ViewState {
                block_height: height,
                blocks,
                ..(*current).clone()
            }
        };

        self.last_cycle_ok.store(true, Ordering::SeqCst);
        self.publish(next);
        CycleOutcome::Advanced { height }
    }

    /// Pin the window at `start` (negative unpins) and refresh it.
    pub async fn pin(&self, start: i64) -> Result<(), RemoteError> {
        self.repin(|_| start).await
    }

    /// Move the window `paginationDistance` blocks back in history.
    pub async fn page_older(&self) -> Result<(), RemoteError> {
        self.repin(|v| {
            window::older_page_start(v.start_at_block, v.block_height, v.pagination_distance)
        })
        .await
    }

    /// Move the window `paginationDistance` blocks towards the head; reaching
    /// it unpins the view.
    pub async fn page_newer(&self) -> Result<(), RemoteError> {
        self.repin(|v| {
            window::newer_page_start(v.start_at_block, v.block_height, v.pagination_distance)
        })
        .await
    }

    async fn repin<F>(&self, start_for: F) -> Result<(), RemoteError>
    where
        F: FnOnce(&ViewState) -> i64 + Send,
    {
        if self.is_closed() {
            return Ok(());
        }
        let mut cache = self.cache.lock().await;
        if self.is_closed() {
            return Ok(());
        }
        let current = self.view();
        let start = window::clamp_start(start_for(current.as_ref()), current.block_height);
        let blocks = self
            .resolve_window(&mut cache, start, current.block_height)
            .await?;
        if self.is_closed() {
            return Ok(());
        }
        self.publish(ViewState {
            start_at_block: start,
            blocks,
            ..(*current).clone()
        });
        Ok(())
    }

    /// Select `index` and pin the window so it shows with two newer blocks
    /// above it. A negative index clears the selection and keeps the pin.
    pub async fn select(&self, index: i64) -> Result<(), RemoteError> {
        if self.is_closed() {
            return Ok(());
        }
        let mut cache = self.cache.lock().await;
        if self.is_closed() {
            return Ok(());
        }
        let current = self.view();
        let (selected, start) = if index < 0 {
            (UNSET, current.start_at_block)
        } else {
            (index, window::select_start(index, current.block_height))
        };
        let blocks = self
            .resolve_window(&mut cache, start, current.block_height)
            .await?;
        if self.is_closed() {
            return Ok(());
        }
        self.publish(ViewState {
            selected_block: selected,
            start_at_block: start,
            blocks,
            ..(*current).clone()
        });
        Ok(())
    }

    /// Re-send the current snapshot to the sink.
    pub async fn retrieve_view_state(&self) {
        if self.is_closed() {
            return;
        }
        let _guard = self.cache.lock().await;
        if !self.is_closed() {
            self.sink.render(self.view());
        }
    }

    /// Apply a panel request in panel order: snapshot resend, pin, select.
    pub async fn handle_request(&self, request: ViewRequest) -> Result<(), RemoteError> {
        log::debug!("📬 {request:?}");
        if request.retrieve_view_state {
            self.retrieve_view_state().await;
        }
        if let Some(typed) = request.typed_request {
            if let Some(start) = typed.set_start_at_block {
                self.pin(start).await?;
            }
            if let Some(index) = typed.select_block {
                self.select(index).await?;
            }
        }
        Ok(())
    }

    fn publish(&self, view: ViewState) {
        let view = Arc::new(view);
        log::debug!(
            "📤 height={} start={} selected={} blocks={}",
            view.block_height,
            view.start_at_block,
            view.selected_block,
            view.blocks.len()
        );
        self.snapshot.send_replace(Arc::clone(&view));
        self.sink.render(view);
    }

    /// Blocks for the window at (`start`, `height`), cache first. Misses are
    /// fetched as one batch; any failure fails the whole window and nothing
    /// from the batch is cached.
    async fn resolve_window(
        &self,
        cache: &mut BlockCache,
        start: i64,
        height: u64,
    ) -> Result<Vec<Arc<Block>>, RemoteError> {
        let range = window::compute_range(start, height, self.opts.page_size);
        if let Some(head) = height.checked_sub(1) {
            cache.set_head(head);
        }

        let mut slots: Vec<Option<Arc<Block>>> = range.iter().map(|&i| cache.get(i)).collect();
        let misses: Vec<u64> = range
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(&i, _)| i)
            .collect();

        if !misses.is_empty() {
            log::debug!(
                "Retrieving {} blocks ({} cached, cache {}/{})",
                misses.len(),
                range.len() - misses.len(),
                cache.len(),
                cache.capacity()
            );
            let fetched: Vec<Block> = stream::iter(misses)
                .map(|index| self.fetch_block(index))
                .buffered(self.opts.fetch_concurrency.max(1))
                .try_collect()
                .await?;

            let mut fetched = fetched.into_iter().map(Arc::new);
            for slot in slots.iter_mut().filter(|s| s.is_none()) {
                if let Some(block) = fetched.next() {
                    cache.put(block.index, Arc::clone(&block));
                    *slot = Some(block);
                }
            }
        }

        Ok(slots.into_iter().flatten().collect())
    }

    async fn fetch_height(&self) -> Result<u64, RemoteError> {
        let limit = self.opts.fetch_timeout;
        match tokio::time::timeout(limit, self.source.fetch_height()).await {
            Ok(res) => res,
            Err(_) => Err(RemoteError::Timeout {
                what: "height check".into(),
                after_ms: limit.as_millis() as u64,
            }),
        }
    }

    async fn fetch_block(&self, index: u64) -> Result<Block, RemoteError> {
        let limit = self.opts.fetch_timeout;
        match tokio::time::timeout(limit, self.source.fetch_block(index)).await {
            Ok(Ok(block)) if block.index == index => Ok(block),
            Ok(Ok(block)) => Err(RemoteError::Malformed(format!(
                "asked for block #{index}, node returned #{}",
                block.index
            ))),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(RemoteError::Timeout {
                what: format!("block #{index}"),
                after_ms: limit.as_millis() as u64,
            }),
        }
    }
}

/// Caller-held handle to a running controller. Dropping it closes the
/// controller.
pub struct TrackerHandle {
    controller: Arc<TrackerController>,
    task: Option<JoinHandle<()>>,
}

impl TrackerHandle {
    pub fn controller(&self) -> &Arc<TrackerController> {
        &self.controller
    }

    pub async fn pin(&self, start: i64) -> Result<(), RemoteError> {
        self.controller.pin(start).await
    }

    pub async fn select(&self, index: i64) -> Result<(), RemoteError> {
        self.controller.select(index).await
    }

    pub async fn page_older(&self) -> Result<(), RemoteError> {
        self.controller.page_older().await
    }

    pub async fn page_newer(&self) -> Result<(), RemoteError> {
        self.controller.page_newer().await
    }

    pub async fn handle_request(&self, request: ViewRequest) -> Result<(), RemoteError> {
        self.controller.handle_request(request).await
    }

    pub fn view(&self) -> Arc<ViewState> {
        self.controller.view()
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<ViewState>> {
        self.controller.subscribe()
    }

    pub fn state(&self) -> ControllerState {
        self.controller.state()
    }

    pub fn last_cycle_ok(&self) -> bool {
        self.controller.last_cycle_ok()
    }

    pub fn close(&self) {
        self.controller.close();
    }

    /// Close and wait for the polling task to exit.
    pub async fn shutdown(mut self) {
        self.controller.close();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("tracker task ended abnormally: {e}");
            }
        }
    }
}

impl Drop for TrackerHandle {
    fn drop(&mut self) {
        self.controller.close();
    }
}
