//! Credential panel state.
//!
//! [`CredentialPanel`] owns one credential list and its usage stats, and
//! exposes the derived view, selection, and enable/disable mutations.
//! State is shared behind `Arc<RwLock<_>>`; no lock is held while a backend
//! call is in flight. Subscribers are told about every change through a
//! `watch` channel carrying a version counter.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tracing::{debug, info, warn};

use keydeck_core::{
    filter, normalize, to_chart_series, ChartConfig, ChartSeries, CredentialBackend,
    CredentialRecord, FilterState, NormalizeOptions, Notifier, PersistMode, SelectionSet,
    Severity, Translator, UsageSource, UsageStats,
};

use crate::error::StoreError;
use crate::i18n::keys;
use crate::optimistic::Optimistic;

// ============================================================================
// Context and Options
// ============================================================================

/// Connection state of the management backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Reachable and authenticated.
    Connected,
    /// Connection attempt in progress.
    Connecting,
    /// Not reachable.
    #[default]
    Disconnected,
}

/// Collaborators shared by every panel.
#[derive(Clone)]
pub struct PanelContext {
    /// Shows toasts.
    pub notifier: Arc<dyn Notifier>,
    /// Localizes toast text.
    pub translator: Arc<dyn Translator>,
    /// Current connection state; mutations are skipped unless connected.
    pub connection: watch::Receiver<ConnectionStatus>,
}

impl PanelContext {
    /// Creates a context.
    pub fn new(
        notifier: Arc<dyn Notifier>,
        translator: Arc<dyn Translator>,
        connection: watch::Receiver<ConnectionStatus>,
    ) -> Self {
        Self {
            notifier,
            translator,
            connection,
        }
    }

    /// Creates a context whose connection is permanently `Connected`.
    pub fn connected(notifier: Arc<dyn Notifier>, translator: Arc<dyn Translator>) -> Self {
        let (_, connection) = watch::channel(ConnectionStatus::Connected);
        Self::new(notifier, translator, connection)
    }

    fn is_connected(&self) -> bool {
        *self.connection.borrow() == ConnectionStatus::Connected
    }

    fn notify(&self, severity: Severity, key: &str, args: &[(&str, String)]) {
        let message = self.translator.text(key, args);
        self.notifier.show(&message, severity);
    }
}

impl std::fmt::Debug for PanelContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelContext")
            .field("connection", &*self.connection.borrow())
            .finish_non_exhaustive()
    }
}

/// When the selection is cleared after a batch mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionClear {
    /// After every batch, even one that was rolled back.
    Always,
    /// Only after a batch that was committed.
    OnSuccess,
}

impl SelectionClear {
    /// Default policy for a persist mode.
    pub fn default_for(mode: PersistMode) -> Self {
        match mode {
            PersistMode::PerItem => SelectionClear::Always,
            PersistMode::WholeList => SelectionClear::OnSuccess,
        }
    }
}

/// Per-panel behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelOptions {
    /// How usage stats are joined onto records.
    pub normalize: NormalizeOptions,
    /// Chart cap and label strategy.
    pub chart: ChartConfig,
    /// Selection clearing after batches.
    pub selection_clear: SelectionClear,
}

impl PanelOptions {
    /// Defaults for a persist mode: auth files for per-item, API keys for
    /// whole-list.
    pub fn for_mode(mode: PersistMode) -> Self {
        let (normalize, chart) = match mode {
            PersistMode::PerItem => (NormalizeOptions::auth_files(), ChartConfig::auth_files()),
            PersistMode::WholeList => (NormalizeOptions::api_keys(), ChartConfig::api_keys()),
        };
        Self {
            normalize,
            chart,
            selection_clear: SelectionClear::default_for(mode),
        }
    }

    /// Overrides the selection clearing policy.
    pub fn with_selection_clear(mut self, policy: SelectionClear) -> Self {
        self.selection_clear = policy;
        self
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// Why a mutation did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The backend is not connected.
    Disconnected,
    /// Another save has not settled yet.
    SaveInFlight,
    /// No record matched.
    NotFound,
}

/// How a mutation settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    /// Nothing was attempted.
    Skipped {
        /// Reason.
        reason: SkipReason,
    },
    /// The change was persisted.
    Committed,
    /// The change failed and the list was restored.
    RolledBack {
        /// Underlying error message.
        reason: String,
    },
    /// A batch settled.
    Batch {
        /// Records persisted.
        success: usize,
        /// Records that failed.
        fail: usize,
        /// Whether the whole batch was restored.
        rolled_back: bool,
    },
}

impl MutationOutcome {
    fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// Returns true if the change is now persisted and kept.
    pub fn is_committed(&self) -> bool {
        match self {
            Self::Committed => true,
            Self::Batch { rolled_back, .. } => !rolled_back,
            _ => false,
        }
    }
}

// ============================================================================
// Inner State
// ============================================================================

#[derive(Debug, Default)]
struct PanelInner {
    /// Records as listed, plus any optimistic changes.
    records: Vec<CredentialRecord>,
    stats: UsageStats,
    loading: bool,
    /// Id of the most recently started refresh.
    refresh_generation: u64,
    refreshes_in_flight: usize,
    error: Option<String>,
    saving: bool,
    mounted: bool,
    filter: FilterState,
    selection: SelectionSet,
    last_refresh: Option<DateTime<Utc>>,
}

// ============================================================================
// Credential Panel
// ============================================================================

/// State and mutations for one credential list.
pub struct CredentialPanel {
    backend: Arc<dyn CredentialBackend>,
    usage: Arc<dyn UsageSource>,
    context: PanelContext,
    options: PanelOptions,
    inner: Arc<RwLock<PanelInner>>,
    notify: watch::Sender<u64>,
}

impl std::fmt::Debug for CredentialPanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialPanel")
            .field("backend", &self.backend.name())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl CredentialPanel {
    /// Creates a panel with the default options for the backend's persist mode.
    pub fn new(
        backend: Arc<dyn CredentialBackend>,
        usage: Arc<dyn UsageSource>,
        context: PanelContext,
    ) -> Self {
        let options = PanelOptions::for_mode(backend.persist_mode());
        Self::with_options(backend, usage, context, options)
    }

    /// Creates a panel with explicit options.
    pub fn with_options(
        backend: Arc<dyn CredentialBackend>,
        usage: Arc<dyn UsageSource>,
        context: PanelContext,
        options: PanelOptions,
    ) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            backend,
            usage,
            context,
            options,
            inner: Arc::new(RwLock::new(PanelInner::default())),
            notify,
        }
    }

    /// Returns the panel options.
    pub fn options(&self) -> &PanelOptions {
        &self.options
    }

    /// Subscribes to change notifications.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    fn notify_change(&self) {
        self.notify.send_modify(|version| *version += 1);
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Loads the list and stats the first time the panel is shown.
    ///
    /// Returns false if the panel was already mounted.
    pub async fn mount(&self) -> bool {
        {
            let mut inner = self.inner.write().await;
            if inner.mounted {
                return false;
            }
            inner.mounted = true;
        }
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Initial load failed");
        }
        true
    }

    /// Fetches the credential list.
    pub async fn load(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        self.backend
            .list()
            .await
            .map_err(|e| StoreError::Load(e.to_string()))
    }

    /// Fetches usage stats.
    pub async fn load_stats(&self) -> Result<UsageStats, StoreError> {
        self.usage
            .usage()
            .await
            .map(|blob| UsageStats::from_blob(&blob))
            .map_err(|e| StoreError::Stats(e.to_string()))
    }

    /// Reloads the list and stats concurrently.
    ///
    /// A stats failure leaves stats empty. A list failure keeps the previous
    /// list and sets the page-level error. When refreshes overlap only the
    /// most recently started one is applied, and `loading` stays set until
    /// all of them settle.
    pub async fn refresh(&self) -> Result<(), StoreError> {
        let generation = {
            let mut inner = self.inner.write().await;
            inner.refresh_generation += 1;
            inner.refreshes_in_flight += 1;
            inner.loading = true;
            inner.refresh_generation
        };
        self.notify_change();

        let (list, stats) = futures::join!(self.load(), self.load_stats());

        let stats = stats.unwrap_or_else(|e| {
            debug!(backend = %self.backend.name(), error = %e, "Usage stats unavailable");
            UsageStats::default()
        });

        let result = {
            let mut inner = self.inner.write().await;
            inner.refreshes_in_flight = inner.refreshes_in_flight.saturating_sub(1);
            inner.loading = inner.refreshes_in_flight > 0;
            if generation != inner.refresh_generation {
                debug!(
                    backend = %self.backend.name(),
                    generation,
                    latest = inner.refresh_generation,
                    "Discarding superseded refresh"
                );
                drop(inner);
                self.notify_change();
                return list.map(|_| ());
            }
            inner.stats = stats;
            match list {
                Ok(records) => {
                    debug!(backend = %self.backend.name(), count = records.len(), "Credentials loaded");
                    inner.records = records;
                    inner.error = None;
                    inner.last_refresh = Some(Utc::now());
                    Ok(())
                }
                Err(e) => {
                    let message = match &e {
                        StoreError::Load(message) => message.clone(),
                        other => other.to_string(),
                    };
                    warn!(backend = %self.backend.name(), error = %message, "Failed to load credentials");
                    inner.error = Some(
                        self.context
                            .translator
                            .text(keys::LOAD_FAILED, &[("message", message)]),
                    );
                    Err(e)
                }
            }
        };
        self.notify_change();
        result
    }

    // ========================================================================
    // Derived State
    // ========================================================================

    /// Normalized records, unfiltered.
    pub async fn records(&self) -> Vec<CredentialRecord> {
        let inner = self.inner.read().await;
        normalize(inner.records.clone(), &inner.stats, &self.options.normalize)
    }

    /// Normalized records narrowed by the current filter.
    pub async fn view(&self) -> Vec<CredentialRecord> {
        let inner = self.inner.read().await;
        let records = normalize(inner.records.clone(), &inner.stats, &self.options.normalize);
        filter(&records, &inner.filter)
    }

    /// Chart series over every normalized record.
    pub async fn chart(&self) -> ChartSeries {
        to_chart_series(&self.records().await, &self.options.chart)
    }

    /// Current usage stats.
    pub async fn stats(&self) -> UsageStats {
        self.inner.read().await.stats.clone()
    }

    /// Returns true while a refresh is running.
    pub async fn is_loading(&self) -> bool {
        self.inner.read().await.loading
    }

    /// Returns true while a mutation is in flight.
    pub async fn is_saving(&self) -> bool {
        self.inner.read().await.saving
    }

    /// Page-level error from the last refresh.
    pub async fn error(&self) -> Option<String> {
        self.inner.read().await.error.clone()
    }

    /// Time of the last successful list load.
    pub async fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.inner.read().await.last_refresh
    }

    /// Returns true if mutations would currently be attempted.
    pub async fn controls_enabled(&self) -> bool {
        self.context.is_connected() && !self.inner.read().await.saving
    }

    // ========================================================================
    // Filter and Selection
    // ========================================================================

    /// Current filter.
    pub async fn filter_state(&self) -> FilterState {
        self.inner.read().await.filter.clone()
    }

    /// Replaces the filter. The selection is left as is.
    pub async fn set_filter(&self, state: FilterState) {
        self.inner.write().await.filter = state;
        self.notify_change();
    }

    /// Current selection.
    pub async fn selection(&self) -> SelectionSet {
        self.inner.read().await.selection.clone()
    }

    /// Toggles one id. Returns true if it is now selected.
    pub async fn toggle_selection(&self, id: &str) -> bool {
        let selected = self.inner.write().await.selection.toggle(id);
        self.notify_change();
        selected
    }

    /// Toggles every record in the filtered view.
    pub async fn toggle_all(&self) {
        let visible = self.view().await;
        self.inner.write().await.selection.toggle_all(&visible);
        self.notify_change();
    }

    /// Clears the selection.
    pub async fn clear_selection(&self) {
        self.inner.write().await.selection.clear();
        self.notify_change();
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Enables or disables one record.
    ///
    /// The record is flipped locally first; a failed save restores the list
    /// exactly as it was.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> MutationOutcome {
        if !self.context.is_connected() {
            return MutationOutcome::skipped(SkipReason::Disconnected);
        }

        let (change, name, to_save) = {
            let mut inner = self.inner.write().await;
            if inner.saving {
                return MutationOutcome::skipped(SkipReason::SaveInFlight);
            }
            let Some(pos) = inner.records.iter().position(|r| r.id == id) else {
                return MutationOutcome::skipped(SkipReason::NotFound);
            };
            inner.saving = true;
            let name = inner.records[pos].display_name();
            let change = Optimistic::apply(&mut inner.records, |records| {
                records[pos].set_enabled(enabled);
            });
            (change, name, self.whole_list(&inner.records))
        };
        self.notify_change();

        let result = match to_save {
            Some(records) => self.backend.save(&records).await,
            None => self.backend.set_status(id, !enabled).await,
        };

        let outcome = {
            let mut inner = self.inner.write().await;
            inner.saving = false;
            match result {
                Ok(()) => {
                    change.commit();
                    MutationOutcome::Committed
                }
                Err(e) => {
                    change.rollback(&mut inner.records);
                    MutationOutcome::RolledBack {
                        reason: e.to_string(),
                    }
                }
            }
        };
        self.notify_change();

        match &outcome {
            MutationOutcome::RolledBack { reason } => {
                warn!(id = %id, enabled, error = %reason, "Toggle rolled back");
                self.context.notify(
                    Severity::Error,
                    keys::TOGGLE_FAILED,
                    &[("name", name), ("message", reason.clone())],
                );
            }
            _ => {
                info!(id = %id, enabled, "Toggle committed");
                let key = if enabled { keys::ENABLED } else { keys::DISABLED };
                self.context.notify(Severity::Success, key, &[("name", name)]);
            }
        }
        outcome
    }

    /// Enables or disables every listed id that exists.
    ///
    /// Per-item backends persist one record at a time and any failure rolls
    /// back the whole batch. Whole-list backends persist once.
    pub async fn set_enabled_batch(&self, ids: &[String], enabled: bool) -> MutationOutcome {
        if !self.context.is_connected() {
            return MutationOutcome::skipped(SkipReason::Disconnected);
        }

        let wanted: HashSet<&str> = ids.iter().map(String::as_str).collect();
        let (change, targets, to_save) = {
            let mut inner = self.inner.write().await;
            if inner.saving {
                return MutationOutcome::skipped(SkipReason::SaveInFlight);
            }
            let targets: Vec<String> = inner
                .records
                .iter()
                .filter(|r| wanted.contains(r.id.as_str()))
                .map(|r| r.id.clone())
                .collect();
            if targets.is_empty() {
                return MutationOutcome::skipped(SkipReason::NotFound);
            }
            inner.saving = true;
            let change = Optimistic::apply(&mut inner.records, |records| {
                records
                    .iter_mut()
                    .filter(|r| wanted.contains(r.id.as_str()))
                    .for_each(|r| r.set_enabled(enabled));
            });
            (change, targets, self.whole_list(&inner.records))
        };
        self.notify_change();

        let (success, fail, error) = match to_save {
            Some(records) => match self.backend.save(&records).await {
                Ok(()) => (targets.len(), 0, None),
                Err(e) => (0, targets.len(), Some(e.to_string())),
            },
            None => {
                let mut success = 0;
                let mut fail = 0;
                let mut error = None;
                for id in &targets {
                    match self.backend.set_status(id, !enabled).await {
                        Ok(()) => success += 1,
                        Err(e) => {
                            warn!(id = %id, error = %e, "Batch item failed");
                            fail += 1;
                            error = Some(e.to_string());
                        }
                    }
                }
                (success, fail, error)
            }
        };
        let rolled_back = fail > 0;

        {
            let mut inner = self.inner.write().await;
            inner.saving = false;
            if rolled_back {
                change.rollback(&mut inner.records);
            } else {
                change.commit();
            }
            if !rolled_back || self.options.selection_clear == SelectionClear::Always {
                inner.selection.clear();
            }
        }
        self.notify_change();

        info!(success, fail, rolled_back, enabled, "Batch settled");
        if !rolled_back {
            let key = if enabled {
                keys::BATCH_ENABLED
            } else {
                keys::BATCH_DISABLED
            };
            self.context
                .notify(Severity::Success, key, &[("count", success.to_string())]);
        } else if self.backend.persist_mode() == PersistMode::PerItem {
            self.context.notify(
                Severity::Warning,
                keys::BATCH_PARTIAL,
                &[("success", success.to_string()), ("failed", fail.to_string())],
            );
        } else {
            self.context.notify(
                Severity::Error,
                keys::BATCH_FAILED,
                &[
                    ("count", fail.to_string()),
                    ("message", error.unwrap_or_default()),
                ],
            );
        }

        MutationOutcome::Batch {
            success,
            fail,
            rolled_back,
        }
    }

    /// Enables or disables the current selection.
    pub async fn set_enabled_selected(&self, enabled: bool) -> MutationOutcome {
        let ids = self.selection().await.ids();
        self.set_enabled_batch(&ids, enabled).await
    }

    /// The full list to save, for whole-list backends.
    fn whole_list(&self, records: &[CredentialRecord]) -> Option<Vec<CredentialRecord>> {
        match self.backend.persist_mode() {
            PersistMode::WholeList => Some(records.to_vec()),
            PersistMode::PerItem => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use keydeck_core::{ApiKeyProvider, CoreError, StatusFilter, UsageBlob};
    use serde_json::json;
    use tokio::sync::Notify;

    use crate::i18n::{Catalog, Language};
    use crate::notify::MemoryNotifier;

    // ========================================================================
    // Test Collaborators
    // ========================================================================

    #[derive(Default)]
    struct MockBackend {
        mode: Option<PersistMode>,
        records: Mutex<Vec<CredentialRecord>>,
        list_gate: Mutex<Option<Arc<Notify>>>,
        fail_list: AtomicBool,
        fail_ids: HashSet<String>,
        fail_save: bool,
        gate: Option<Arc<Notify>>,
        status_calls: Mutex<Vec<(String, bool)>>,
        saves: Mutex<Vec<Vec<CredentialRecord>>>,
    }

    impl MockBackend {
        fn per_item(records: Vec<CredentialRecord>) -> Self {
            Self {
                mode: Some(PersistMode::PerItem),
                records: Mutex::new(records),
                ..Default::default()
            }
        }

        fn whole_list(records: Vec<CredentialRecord>) -> Self {
            Self {
                mode: Some(PersistMode::WholeList),
                records: Mutex::new(records),
                ..Default::default()
            }
        }

        fn failing(mut self, id: &str) -> Self {
            self.fail_ids.insert(id.to_string());
            self
        }
    }

    #[async_trait]
    impl CredentialBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        fn persist_mode(&self) -> PersistMode {
            self.mode.unwrap_or(PersistMode::PerItem)
        }

        async fn list(&self) -> Result<Vec<CredentialRecord>, CoreError> {
            let records = self.records.lock().unwrap().clone();
            let gate = self.list_gate.lock().unwrap().take();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.fail_list.load(Ordering::SeqCst) {
                return Err(CoreError::Unavailable("connection refused".into()));
            }
            Ok(records)
        }

        async fn set_status(&self, id: &str, disabled: bool) -> Result<(), CoreError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.status_calls
                .lock()
                .unwrap()
                .push((id.to_string(), disabled));
            if self.fail_ids.contains(id) {
                return Err(CoreError::Backend(format!("cannot update {id}")));
            }
            Ok(())
        }

        async fn save(&self, records: &[CredentialRecord]) -> Result<(), CoreError> {
            self.saves.lock().unwrap().push(records.to_vec());
            if self.fail_save {
                return Err(CoreError::Backend("config locked".into()));
            }
            Ok(())
        }
    }

    struct MockUsage(Option<serde_json::Value>);

    #[async_trait]
    impl UsageSource for MockUsage {
        async fn usage(&self) -> Result<UsageBlob, CoreError> {
            match &self.0 {
                Some(value) => Ok(serde_json::from_value(value.clone())?),
                None => Err(CoreError::Unavailable("usage disabled".into())),
            }
        }
    }

    /// Usage source whose response waits for a gate.
    struct GatedUsage {
        blob: serde_json::Value,
        gate: Arc<Notify>,
    }

    #[async_trait]
    impl UsageSource for GatedUsage {
        async fn usage(&self) -> Result<UsageBlob, CoreError> {
            self.gate.notified().await;
            Ok(serde_json::from_value(self.blob.clone())?)
        }
    }

    fn usage_blob() -> serde_json::Value {
        json!({"usage": {"apis": {"client": {"models": {"gemini-pro": {"details": [
            {"auth_index": 1, "failed": false},
            {"auth_index": 1, "failed": true},
            {"auth_index": "2", "failed": false}
        ]}}}}}})
    }

    fn auth_files() -> Vec<CredentialRecord> {
        vec![
            CredentialRecord::auth_file("a.json").with_join_key("1"),
            CredentialRecord::auth_file("b.json")
                .with_join_key("2")
                .with_disabled(true),
            CredentialRecord::auth_file("c.json").with_join_key("3"),
        ]
    }

    fn api_keys() -> Vec<CredentialRecord> {
        vec![
            CredentialRecord::api_key(ApiKeyProvider::Gemini, 0, "sk-aaaaaaaa1111"),
            CredentialRecord::api_key(ApiKeyProvider::Gemini, 1, "sk-bbbbbbbb2222")
                .with_excluded_models(vec!["*".into()]),
        ]
    }

    struct Harness {
        panel: Arc<CredentialPanel>,
        backend: Arc<MockBackend>,
        notifier: Arc<MemoryNotifier>,
        connection: watch::Sender<ConnectionStatus>,
    }

    async fn harness(backend: MockBackend, usage: Option<serde_json::Value>) -> Harness {
        let backend = Arc::new(backend);
        let notifier = Arc::new(MemoryNotifier::new());
        let (connection, receiver) = watch::channel(ConnectionStatus::Connected);
        let context = PanelContext::new(
            notifier.clone(),
            Arc::new(Catalog::new(Language::En)),
            receiver,
        );
        let panel = Arc::new(CredentialPanel::new(
            backend.clone(),
            Arc::new(MockUsage(usage)),
            context,
        ));
        assert!(panel.mount().await);
        Harness {
            panel,
            backend,
            notifier,
            connection,
        }
    }

    fn disabled_ids(records: &[CredentialRecord]) -> Vec<&str> {
        records
            .iter()
            .filter(|r| r.disabled)
            .map(|r| r.id.as_str())
            .collect()
    }

    // ========================================================================
    // Loading
    // ========================================================================

    #[tokio::test]
    async fn test_mount_loads_once() {
        let h = harness(MockBackend::per_item(auth_files()), Some(usage_blob())).await;
        assert!(!h.panel.mount().await);

        let records = h.panel.records().await;
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].stats.success, 1);
        assert_eq!(records[0].stats.failure, 1);
        assert_eq!(records[1].stats.success, 1);
        assert!(records[2].stats.is_empty());
        assert!(!h.panel.is_loading().await);
        assert!(h.panel.last_refresh().await.is_some());
    }

    #[tokio::test]
    async fn test_stats_failure_is_swallowed() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        assert!(h.panel.error().await.is_none());
        assert!(h.panel.stats().await.is_empty());
        assert_eq!(h.panel.view().await.len(), 3);
    }

    #[tokio::test]
    async fn test_list_failure_sets_error_and_keeps_list() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        h.backend.fail_list.store(true, Ordering::SeqCst);

        let err = h.panel.refresh().await.unwrap_err();
        assert!(matches!(err, StoreError::Load(_)));
        let message = h.panel.error().await.unwrap();
        assert!(message.starts_with("Failed to load credentials"));
        assert!(message.contains("connection refused"));
        assert_eq!(h.panel.records().await.len(), 3);
        assert!(!h.panel.is_loading().await);

        h.backend.fail_list.store(false, Ordering::SeqCst);
        h.panel.refresh().await.unwrap();
        assert!(h.panel.error().await.is_none());
    }

    fn record_ids(records: &[CredentialRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_overlapping_refresh_keeps_latest() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        let gate = Arc::new(Notify::new());
        *h.backend.records.lock().unwrap() = vec![CredentialRecord::auth_file("old.json")];
        *h.backend.list_gate.lock().unwrap() = Some(gate.clone());

        let panel = h.panel.clone();
        let slow = tokio::spawn(async move { panel.refresh().await });
        while h.backend.list_gate.lock().unwrap().is_some() {
            tokio::task::yield_now().await;
        }

        *h.backend.records.lock().unwrap() = vec![CredentialRecord::auth_file("new.json")];
        h.panel.refresh().await.unwrap();
        assert!(h.panel.is_loading().await);
        assert_eq!(record_ids(&h.panel.records().await), vec!["new.json"]);

        gate.notify_one();
        slow.await.unwrap().unwrap();
        assert!(!h.panel.is_loading().await);
        assert_eq!(record_ids(&h.panel.records().await), vec!["new.json"]);
    }

    async fn list_failure_with_stats(list_first: bool) {
        let list_gate = Arc::new(Notify::new());
        let stats_gate = Arc::new(Notify::new());
        let backend = MockBackend {
            list_gate: Mutex::new(Some(list_gate.clone())),
            fail_list: AtomicBool::new(true),
            ..MockBackend::per_item(auth_files())
        };
        let panel = Arc::new(CredentialPanel::new(
            Arc::new(backend),
            Arc::new(GatedUsage {
                blob: usage_blob(),
                gate: stats_gate.clone(),
            }),
            PanelContext::connected(Arc::new(MemoryNotifier::new()), Arc::new(Catalog::default())),
        ));

        let task = {
            let panel = panel.clone();
            tokio::spawn(async move { panel.refresh().await })
        };
        while !panel.is_loading().await {
            tokio::task::yield_now().await;
        }

        let (first, second) = if list_first {
            (list_gate, stats_gate)
        } else {
            (stats_gate, list_gate)
        };
        first.notify_one();
        tokio::task::yield_now().await;
        second.notify_one();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, StoreError::Load(_)));
        assert!(panel.error().await.is_some());
        assert!(!panel.stats().await.is_empty());
        assert!(panel.records().await.is_empty());
        assert!(!panel.is_loading().await);
    }

    #[tokio::test]
    async fn test_list_failure_keeps_stats_when_list_settles_first() {
        list_failure_with_stats(true).await;
    }

    #[tokio::test]
    async fn test_list_failure_keeps_stats_when_stats_settle_first() {
        list_failure_with_stats(false).await;
    }

    // ========================================================================
    // Filter and Selection
    // ========================================================================

    #[tokio::test]
    async fn test_active_filter_and_toggle_all() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        h.panel
            .set_filter(FilterState::default().with_status(StatusFilter::Active))
            .await;

        let ids: Vec<_> = h.panel.view().await.into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec!["a.json", "c.json"]);

        h.panel.toggle_selection("b.json").await;
        h.panel.toggle_all().await;
        assert_eq!(h.panel.selection().await.ids(), vec!["a.json", "c.json"]);

        h.panel.toggle_all().await;
        assert!(h.panel.selection().await.is_empty());
    }

    // ========================================================================
    // Single Mutations
    // ========================================================================

    #[tokio::test]
    async fn test_toggle_success_flips_only_target() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;

        let outcome = h.panel.set_enabled("a.json", false).await;
        assert_eq!(outcome, MutationOutcome::Committed);

        let records = h.panel.records().await;
        assert_eq!(disabled_ids(&records), vec!["a.json", "b.json"]);
        assert_eq!(
            *h.backend.status_calls.lock().unwrap(),
            vec![("a.json".to_string(), true)]
        );
        assert_eq!(
            h.notifier.take(),
            vec![("a.json disabled".to_string(), Severity::Success)]
        );
        assert!(!h.panel.is_saving().await);
    }

    #[tokio::test]
    async fn test_toggle_failure_restores_list() {
        let h = harness(
            MockBackend::per_item(auth_files()).failing("b.json"),
            None,
        )
        .await;
        let before = h.panel.records().await;

        let outcome = h.panel.set_enabled("b.json", true).await;
        assert_eq!(
            outcome,
            MutationOutcome::RolledBack {
                reason: "Backend error: cannot update b.json".into()
            }
        );
        assert_eq!(h.panel.records().await, before);

        let messages = h.notifier.take();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1, Severity::Error);
        assert!(messages[0].0.contains("cannot update b.json"));
    }

    #[tokio::test]
    async fn test_toggle_skipped_when_disconnected() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        h.connection.send(ConnectionStatus::Disconnected).unwrap();

        let outcome = h.panel.set_enabled("a.json", false).await;
        assert_eq!(
            outcome,
            MutationOutcome::Skipped {
                reason: SkipReason::Disconnected
            }
        );
        assert!(h.backend.status_calls.lock().unwrap().is_empty());
        assert!(!h.panel.controls_enabled().await);
    }

    #[tokio::test]
    async fn test_toggle_unknown_id_is_skipped() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        let outcome = h.panel.set_enabled("missing.json", false).await;
        assert!(matches!(
            outcome,
            MutationOutcome::Skipped {
                reason: SkipReason::NotFound
            }
        ));
    }

    #[tokio::test]
    async fn test_second_toggle_rejected_while_saving() {
        let gate = Arc::new(Notify::new());
        let backend = MockBackend {
            gate: Some(gate.clone()),
            ..MockBackend::per_item(auth_files())
        };
        let h = harness(backend, None).await;

        let panel = h.panel.clone();
        let first = tokio::spawn(async move { panel.set_enabled("a.json", false).await });
        while !h.panel.is_saving().await {
            tokio::task::yield_now().await;
        }

        let second = h.panel.set_enabled("c.json", false).await;
        assert_eq!(
            second,
            MutationOutcome::Skipped {
                reason: SkipReason::SaveInFlight
            }
        );

        gate.notify_one();
        assert_eq!(first.await.unwrap(), MutationOutcome::Committed);
        assert_eq!(h.backend.status_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_batch_rejected_while_toggle_saving() {
        let gate = Arc::new(Notify::new());
        let backend = MockBackend {
            gate: Some(gate.clone()),
            ..MockBackend::per_item(auth_files())
        };
        let h = harness(backend, None).await;

        let panel = h.panel.clone();
        let first = tokio::spawn(async move { panel.set_enabled("a.json", false).await });
        while !h.panel.is_saving().await {
            tokio::task::yield_now().await;
        }

        let ids = vec!["b.json".to_string(), "c.json".to_string()];
        assert_eq!(
            h.panel.set_enabled_batch(&ids, true).await,
            MutationOutcome::Skipped {
                reason: SkipReason::SaveInFlight
            }
        );

        gate.notify_one();
        assert_eq!(first.await.unwrap(), MutationOutcome::Committed);
        assert_eq!(
            *h.backend.status_calls.lock().unwrap(),
            vec![("a.json".to_string(), true)]
        );
    }

    #[tokio::test]
    async fn test_whole_list_toggle_failure_restores_marker() {
        let backend = MockBackend {
            fail_save: true,
            ..MockBackend::whole_list(api_keys())
        };
        let h = harness(backend, None).await;
        let before = h.panel.records().await;

        let outcome = h.panel.set_enabled("1", true).await;
        assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));

        // The attempted save dropped the marker; the rollback puts it back.
        let saves = h.backend.saves.lock().unwrap().clone();
        assert!(!saves[0][1].has_disable_all_marker());
        let records = h.panel.records().await;
        assert_eq!(records, before);
        assert!(records[1].has_disable_all_marker());
        assert_eq!(records[1].excluded_models, vec!["*".to_string()]);
        assert!(records[1].disabled);
        assert_eq!(h.notifier.take()[0].1, Severity::Error);
    }

    // ========================================================================
    // Batch Mutations
    // ========================================================================

    #[tokio::test]
    async fn test_batch_partial_failure_rolls_back_everything() {
        let h = harness(
            MockBackend::per_item(auth_files()).failing("c.json"),
            None,
        )
        .await;
        let before = h.panel.records().await;
        h.panel.toggle_selection("a.json").await;
        h.panel.toggle_selection("c.json").await;

        let outcome = h.panel.set_enabled_selected(false).await;
        assert_eq!(
            outcome,
            MutationOutcome::Batch {
                success: 1,
                fail: 1,
                rolled_back: true
            }
        );
        assert_eq!(h.panel.records().await, before);
        // Per-item batches clear the selection even after a failure.
        assert!(h.panel.selection().await.is_empty());
        assert_eq!(
            h.notifier.take(),
            vec![("1 updated, 1 failed".to_string(), Severity::Warning)]
        );
    }

    #[tokio::test]
    async fn test_batch_success_commits() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        let ids = vec!["a.json".to_string(), "c.json".to_string(), "zzz".to_string()];

        let outcome = h.panel.set_enabled_batch(&ids, false).await;
        assert!(outcome.is_committed());
        assert_eq!(
            outcome,
            MutationOutcome::Batch {
                success: 2,
                fail: 0,
                rolled_back: false
            }
        );
        assert_eq!(disabled_ids(&h.panel.records().await).len(), 3);
        assert_eq!(h.notifier.take()[0].0, "Disabled 2 credentials");
    }

    #[tokio::test]
    async fn test_batch_clear_policy_override() {
        let backend = Arc::new(MockBackend::per_item(auth_files()).failing("a.json"));
        let options = PanelOptions::for_mode(PersistMode::PerItem)
            .with_selection_clear(SelectionClear::OnSuccess);
        let panel = CredentialPanel::with_options(
            backend,
            Arc::new(MockUsage(None)),
            PanelContext::connected(Arc::new(MemoryNotifier::new()), Arc::new(Catalog::default())),
            options,
        );
        panel.mount().await;
        panel.toggle_selection("a.json").await;

        let outcome = panel.set_enabled_selected(false).await;
        assert!(!outcome.is_committed());
        assert!(panel.selection().await.contains("a.json"));
    }

    #[tokio::test]
    async fn test_whole_list_toggle_saves_marker() {
        let h = harness(MockBackend::whole_list(api_keys()), None).await;

        let outcome = h.panel.set_enabled("0", false).await;
        assert_eq!(outcome, MutationOutcome::Committed);

        let saves = h.backend.saves.lock().unwrap().clone();
        assert_eq!(saves.len(), 1);
        assert_eq!(saves[0].len(), 2);
        assert!(saves[0][0].has_disable_all_marker());
        assert!(h.backend.status_calls.lock().unwrap().is_empty());
        assert_eq!(disabled_ids(&h.panel.records().await), vec!["0", "1"]);
    }

    #[tokio::test]
    async fn test_whole_list_failure_keeps_selection() {
        let backend = MockBackend {
            fail_save: true,
            ..MockBackend::whole_list(api_keys())
        };
        let h = harness(backend, None).await;
        let before = h.panel.records().await;
        h.panel.toggle_all().await;

        let outcome = h.panel.set_enabled_selected(true).await;
        assert_eq!(
            outcome,
            MutationOutcome::Batch {
                success: 0,
                fail: 2,
                rolled_back: true
            }
        );
        assert_eq!(h.panel.records().await, before);
        assert_eq!(h.panel.selection().await.len(), 2);

        let messages = h.notifier.take();
        assert_eq!(messages[0].1, Severity::Error);
        assert!(messages[0].0.contains("config locked"));
    }

    #[tokio::test]
    async fn test_whole_list_success_clears_selection() {
        let h = harness(MockBackend::whole_list(api_keys()), None).await;
        h.panel.toggle_all().await;

        let outcome = h.panel.set_enabled_selected(true).await;
        assert!(outcome.is_committed());
        assert!(h.panel.selection().await.is_empty());
        assert!(disabled_ids(&h.panel.records().await).is_empty());
    }

    #[tokio::test]
    async fn test_change_notifications() {
        let h = harness(MockBackend::per_item(auth_files()), None).await;
        let mut rx = h.panel.subscribe();
        let before = *rx.borrow_and_update();

        h.panel.set_enabled("a.json", false).await;
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow() > before);
    }
}
