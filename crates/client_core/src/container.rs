//! Generic paginated, filterable, sortable record container.
//!
//! A [`RecordContainer`] owns one [`FilterState`], turns widget events into
//! filter merges, and queries the record service through its
//! [`EntityStrategy`]. Results are published to subscribers as
//! [`ContainerSnapshot`]s.

use std::sync::Arc;

use shared::{
    domain::{FilterName, RecordView},
    protocol::{
        EntityFilter, EntityFilterDelta, FilterDefinition, GeneralFilter, GeneralFilterDelta,
        QueryPayload, RecordLimitOption, WidgetEvent,
    },
};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, error, info, warn};

use crate::{
    config::ContainerConfig,
    definitions::DefinitionCache,
    error::ContainerError,
    filter_state::FilterState,
    pagination::Paginator,
    selection::{selection_of, SelectionSet},
    sort::SortController,
    strategy::EntityStrategy,
    FilterDefinitionService,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerPhase {
    Uninitialized,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The page replaced the visible records.
    Applied,
    /// A newer response was already applied; this one was dropped.
    Stale,
    /// The query failed; the previous page stays visible.
    Failed,
    /// Nothing was sent.
    Skipped,
}

/// Everything list, paginator and cart widgets render from.
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSnapshot {
    pub records: Vec<RecordView>,
    pub total_record_count: u64,
    pub record_limit: u32,
    pub current_page: u32,
    pub is_loading: bool,
    pub record_limit_options: Vec<RecordLimitOption>,
}

impl ContainerSnapshot {
    pub fn paginator(&self) -> Paginator {
        let mut paginator = Paginator::new(self.total_record_count, self.record_limit);
        paginator.set_current_page(self.current_page);
        paginator
    }
}

#[derive(Debug, Clone)]
pub enum ContainerEvent {
    LoadingChanged(bool),
    RecordsUpdated(ContainerSnapshot),
    FetchFailed(String),
}

struct Session {
    definition: FilterDefinition,
    sort: SortController,
    filters: FilterState,
    record_limit_options: Vec<RecordLimitOption>,
}

struct ContainerState {
    session: Option<Session>,
    records: Vec<RecordView>,
    total_record_count: u64,
    is_loading: bool,
    issued_seq: u64,
    /// Newest query that has returned, applied or failed.
    completed_seq: u64,
    selection: SelectionSet,
}

impl ContainerState {
    fn session_mut(&mut self) -> Result<&mut Session, ContainerError> {
        self.session.as_mut().ok_or(ContainerError::NotInitialized)
    }

    fn snapshot(&self) -> ContainerSnapshot {
        let general = self.session.as_ref().map(|session| session.filters.general());
        ContainerSnapshot {
            records: self.records.clone(),
            total_record_count: self.total_record_count,
            record_limit: general.map_or(0, |general| general.record_limit),
            current_page: general.map_or(0, |general| general.record_offset.saturating_add(1)),
            is_loading: self.is_loading,
            record_limit_options: self
                .session
                .as_ref()
                .map(|session| session.record_limit_options.clone())
                .unwrap_or_default(),
        }
    }
}

struct FetchTicket {
    seq: u64,
    payload: QueryPayload,
}

pub struct RecordContainer<S: EntityStrategy> {
    strategy: S,
    definitions: Arc<dyn FilterDefinitionService>,
    cache: Arc<DefinitionCache>,
    config: ContainerConfig,
    inner: Mutex<ContainerState>,
    events: broadcast::Sender<ContainerEvent>,
}

impl<S: EntityStrategy> RecordContainer<S> {
    pub fn new(
        strategy: S,
        definitions: Arc<dyn FilterDefinitionService>,
        cache: Arc<DefinitionCache>,
        config: ContainerConfig,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Arc::new(Self {
            strategy,
            definitions,
            cache,
            config,
            inner: Mutex::new(ContainerState {
                session: None,
                records: Vec::new(),
                total_record_count: 0,
                is_loading: false,
                issued_seq: 0,
                completed_seq: 0,
                selection: SelectionSet::new(),
            }),
            events,
        })
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ContainerEvent> {
        self.events.subscribe()
    }

    /// Loads the default filters (cached per process), seeds this
    /// container's own copy and issues the first query.
    ///
    /// On a definition failure the container stays uninitialized.
    pub async fn initialize(&self) -> Result<FetchOutcome, ContainerError> {
        let kind = self.strategy.kind();
        let definition = self
            .cache
            .general(self.definitions.as_ref())
            .await
            .map_err(|source| ContainerError::Definition { source })?;

        let mut entity_filters = Vec::new();
        for &name in self.strategy.filter_names() {
            let filter = self
                .cache
                .entity(name, self.definitions.as_ref())
                .await
                .map_err(|source| ContainerError::Definition { source })?;
            entity_filters.push(filter);
        }

        let sort = SortController::new(
            self.strategy.order_by_fields(),
            self.config.recency_field.clone(),
            definition.directions.clone(),
        );
        let filters = FilterState::new(&definition.general_filter, &sort, entity_filters);
        let record_limit_options = RecordLimitOption::from_limits(&definition.limits);

        let ticket = {
            let mut guard = self.inner.lock().await;
            guard.session = Some(Session {
                definition,
                sort,
                filters,
                record_limit_options,
            });
            self.begin_fetch(&mut guard)
        };
        info!(kind = %kind, "container: initialized");
        Ok(self.finish(ticket).await)
    }

    /// Queries with the current filters. Safe to call repeatedly.
    pub async fn fetch(&self) -> FetchOutcome {
        let ticket = {
            let mut guard = self.inner.lock().await;
            self.begin_fetch(&mut guard)
        };
        self.finish(ticket).await
    }

    pub async fn on_specific_filter_change(
        &self,
        filter_name: FilterName,
        delta: EntityFilterDelta,
    ) -> Result<FetchOutcome, ContainerError> {
        self.handle_event(WidgetEvent::UniqueFilterChange { filter_name, delta })
            .await
    }

    pub async fn on_general_filter_change(
        &self,
        delta: GeneralFilterDelta,
    ) -> Result<FetchOutcome, ContainerError> {
        self.handle_event(WidgetEvent::GeneralFilterChange { delta })
            .await
    }

    pub async fn on_sort_change(&self, column_index: usize) -> Result<FetchOutcome, ContainerError> {
        self.handle_event(WidgetEvent::SortChange { column_index })
            .await
    }

    pub async fn on_page_turn(&self, current_page: u32) -> Result<FetchOutcome, ContainerError> {
        self.handle_event(WidgetEvent::PageTurn { current_page })
            .await
    }

    /// Starts a fresh browse: every other criterion goes back to its default.
    pub async fn on_record_limit_change(&self, limit: u32) -> Result<FetchOutcome, ContainerError> {
        self.handle_event(WidgetEvent::RecordLimitChange { limit })
            .await
    }

    /// Replaces the selection and re-marks the visible page.
    pub async fn set_selected_records(&self, records: &[RecordView]) {
        let mut guard = self.inner.lock().await;
        guard.selection = selection_of(records);
        self.remark_selection(&mut guard);
    }

    pub async fn handle_event(&self, event: WidgetEvent) -> Result<FetchOutcome, ContainerError> {
        let ticket = self.apply_event(event).await?;
        Ok(self.finish(ticket).await)
    }

    /// Processes events in arrival order. Each query completes on its own
    /// task, so a slow response never holds up the next event.
    pub fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<WidgetEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match self.apply_event(event).await {
                    Ok(Some(ticket)) => {
                        let container = Arc::clone(&self);
                        tokio::spawn(async move {
                            container.complete_fetch(ticket).await;
                        });
                    }
                    Ok(None) => {}
                    Err(err) => warn!(kind = %self.strategy.kind(), "container: event rejected: {err}"),
                }
            }
            debug!(kind = %self.strategy.kind(), "container: event stream closed");
        })
    }

    pub async fn phase(&self) -> ContainerPhase {
        let guard = self.inner.lock().await;
        match (&guard.session, guard.is_loading) {
            (None, _) => ContainerPhase::Uninitialized,
            (Some(_), true) => ContainerPhase::Loading,
            (Some(_), false) => ContainerPhase::Ready,
        }
    }

    pub async fn snapshot(&self) -> ContainerSnapshot {
        self.inner.lock().await.snapshot()
    }

    pub async fn general_filter(&self) -> Option<GeneralFilter> {
        let guard = self.inner.lock().await;
        guard
            .session
            .as_ref()
            .map(|session| session.filters.general().clone())
    }

    pub async fn entity_filter(&self, name: FilterName) -> Option<EntityFilter> {
        let guard = self.inner.lock().await;
        guard
            .session
            .as_ref()
            .and_then(|session| session.filters.entity(name).cloned())
    }

    async fn apply_event(&self, event: WidgetEvent) -> Result<Option<FetchTicket>, ContainerError> {
        if carries_unsearchable_text(&event) {
            debug!(kind = %self.strategy.kind(), "container: dropping single-character search");
            return Ok(None);
        }

        let mut guard = self.inner.lock().await;
        match event {
            WidgetEvent::UniqueFilterChange { filter_name, delta } => {
                let filters = &mut guard.session_mut()?.filters;
                filters.merge_entity(filter_name, delta)?;
                filters.merge_general(GeneralFilterDelta::offset(0));
            }
            WidgetEvent::GeneralFilterChange { delta } => {
                guard.session_mut()?.filters.merge_general(delta);
            }
            WidgetEvent::SortChange { column_index } => {
                let session = guard.session_mut()?;
                let delta = session
                    .sort
                    .handle_column_click(column_index, session.filters.general())?;
                session.filters.merge_general(delta);
            }
            WidgetEvent::PageTurn { current_page } => {
                let offset = current_page.saturating_sub(1);
                guard
                    .session_mut()?
                    .filters
                    .merge_general(GeneralFilterDelta::offset(offset));
            }
            WidgetEvent::RecordLimitChange { limit } => {
                if limit == 0 {
                    return Err(ContainerError::InvalidRecordLimit);
                }
                let Session {
                    definition,
                    sort,
                    filters,
                    ..
                } = guard.session_mut()?;
                filters.reset(&definition.general_filter, sort);
                filters.merge_general(GeneralFilterDelta {
                    record_limit: Some(limit),
                    ..GeneralFilterDelta::default()
                });
            }
            WidgetEvent::SelectionAdded { records } => {
                guard
                    .selection
                    .extend(records.iter().filter_map(RecordView::id));
                self.remark_selection(&mut guard);
                return Ok(None);
            }
            WidgetEvent::SelectionRemoved { ids } => {
                guard.selection.retain(|id| !ids.contains(id));
                self.remark_selection(&mut guard);
                return Ok(None);
            }
        }
        Ok(self.begin_fetch(&mut guard))
    }

    fn remark_selection(&self, state: &mut ContainerState) {
        let ContainerState {
            records, selection, ..
        } = &mut *state;
        self.strategy.apply_selection(records, selection);
        let _ = self
            .events
            .send(ContainerEvent::RecordsUpdated(state.snapshot()));
    }

    fn begin_fetch(&self, state: &mut ContainerState) -> Option<FetchTicket> {
        let kind = self.strategy.kind();
        let Some(session) = state.session.as_ref() else {
            warn!(kind = %kind, "container: fetch requested before initialization");
            return None;
        };
        let entity = session.filters.entity_filters();
        if !self.strategy.is_ready(entity) {
            debug!(kind = %kind, "container: entity filter incomplete; skipping fetch");
            return None;
        }
        let payload = self
            .strategy
            .build_payload(session.filters.general(), entity);

        state.issued_seq += 1;
        if !state.is_loading {
            state.is_loading = true;
            let _ = self.events.send(ContainerEvent::LoadingChanged(true));
        }
        debug!(kind = %kind, seq = state.issued_seq, "container: query issued");
        Some(FetchTicket {
            seq: state.issued_seq,
            payload,
        })
    }

    async fn finish(&self, ticket: Option<FetchTicket>) -> FetchOutcome {
        match ticket {
            Some(ticket) => self.complete_fetch(ticket).await,
            None => FetchOutcome::Skipped,
        }
    }

    async fn complete_fetch(&self, ticket: FetchTicket) -> FetchOutcome {
        let kind = self.strategy.kind();
        let result = self.strategy.fetch(ticket.payload).await;

        let mut guard = self.inner.lock().await;
        let latest = ticket.seq == guard.issued_seq;
        if latest {
            guard.is_loading = false;
        }

        let outcome = match result {
            Ok(_) if ticket.seq <= guard.completed_seq => {
                debug!(
                    kind = %kind,
                    seq = ticket.seq,
                    completed = guard.completed_seq,
                    "container: dropping stale response"
                );
                FetchOutcome::Stale
            }
            Ok(mut page) => {
                self.strategy
                    .post_process(&mut page.records, &guard.selection);
                guard.records = page.records;
                guard.total_record_count = page.total_record_count;
                guard.completed_seq = ticket.seq;
                info!(
                    kind = %kind,
                    seq = ticket.seq,
                    records = guard.records.len(),
                    total = guard.total_record_count,
                    "container: page applied"
                );
                let _ = self
                    .events
                    .send(ContainerEvent::RecordsUpdated(guard.snapshot()));
                FetchOutcome::Applied
            }
            Err(err) => {
                guard.completed_seq = guard.completed_seq.max(ticket.seq);
                error!(kind = %kind, seq = ticket.seq, "container: record query failed: {err:#}");
                let _ = self.events.send(ContainerEvent::FetchFailed(err.to_string()));
                FetchOutcome::Failed
            }
        };

        if latest {
            let _ = self.events.send(ContainerEvent::LoadingChanged(false));
        }
        outcome
    }
}

fn carries_unsearchable_text(event: &WidgetEvent) -> bool {
    match event {
        WidgetEvent::GeneralFilterChange { delta } => delta.has_unsearchable_text(),
        WidgetEvent::UniqueFilterChange { delta, .. } => delta.has_unsearchable_text(),
        _ => false,
    }
}

#[cfg(test)]
#[path = "tests/container_tests.rs"]
mod tests;
