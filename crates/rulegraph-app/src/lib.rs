use parking_lot::RwLock;
use rulegraph_core::{CatalogError, GroupCatalog, LayoutConfig, RuleId, Ruleset};
use rulegraph_events::telemetry::{
    CMD_LOAD_RULESET, CMD_RECOMPUTE_GRAPH, CMD_REFRESH_CATALOG, command_failure, command_start,
    command_success, command_superseded,
};
use rulegraph_events::{Event, EventBus, RecomputeReason};
use rulegraph_graph::{
    ComponentsGraphView, GroupRanking, Layouter, PyramidLayouter, RenderAdapter, RuleDetails,
    RuleGraph, select,
};
use std::sync::Arc;
use std::time::Instant;

pub mod preferences;
pub mod request;
pub mod sources;

pub use preferences::{FilePreferenceStore, MemoryPreferenceStore, PreferenceStore, Preferences};
pub use request::{RequestTicket, RequestTracker};
pub use sources::{
    GroupCatalogSource, InMemoryRulesets, JsonGroupCatalogFile, JsonRulesetDirectory,
    RulesetSource, StaticGroupCatalog,
};

/// What happened to a ruleset response handed to the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// A newer request was issued first; the response was dropped.
    Superseded,
    Failed,
}

struct ControllerState {
    requested_ruleset: Option<String>,
    ruleset: Option<Ruleset>,
    catalog: GroupCatalog,
    catalog_issue: Option<CatalogError>,
    graph: RuleGraph,
    view: ComponentsGraphView,
    selected: Option<RuleId>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            requested_ruleset: None,
            ruleset: None,
            catalog: GroupCatalog::fallback(),
            catalog_issue: None,
            graph: RuleGraph::new(),
            view: ComponentsGraphView::default(),
            selected: None,
        }
    }
}

/// Keeps the components graph in sync with the selected ruleset and the
/// group catalog. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ComponentsGraphController {
    state: Arc<RwLock<ControllerState>>,
    tracker: Arc<RequestTracker>,
    rulesets: Arc<dyn RulesetSource>,
    catalog_source: Arc<dyn GroupCatalogSource>,
    preferences: Arc<dyn PreferenceStore>,
    config: LayoutConfig,
    events: EventBus,
}

impl ComponentsGraphController {
    pub fn new(
        rulesets: Arc<dyn RulesetSource>,
        catalog_source: Arc<dyn GroupCatalogSource>,
        preferences: Arc<dyn PreferenceStore>,
        config: LayoutConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        Ok(Self {
            state: Arc::new(RwLock::new(ControllerState::default())),
            tracker: Arc::new(RequestTracker::new()),
            rulesets,
            catalog_source,
            preferences,
            config,
            events: EventBus::new(),
        })
    }

    pub fn events(&self) -> EventBus {
        self.events.clone()
    }

    pub fn tracker(&self) -> Arc<RequestTracker> {
        Arc::clone(&self.tracker)
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Load the catalog, then reopen the ruleset from the previous session.
    pub fn initialize(&self) -> anyhow::Result<Option<ApplyOutcome>> {
        self.refresh_catalog();
        self.restore_last_selection()
    }

    /// Record a new selection and issue the ticket its response must carry.
    /// Any response still in flight for an earlier selection becomes stale.
    pub fn begin_ruleset_request(&self, ruleset_id: &str) -> RequestTicket {
        let ticket = {
            let mut state = self.state.write();
            state.requested_ruleset = Some(ruleset_id.to_string());
            self.tracker.begin(ruleset_id)
        };

        if let Err(err) = self.preferences.set_last_ruleset(ruleset_id) {
            tracing::warn!("Failed to persist last ruleset {ruleset_id}: {err:#}");
            self.events.publish(Event::PreferenceSaveFailed {
                error: format!("{err:#}"),
            });
        }

        command_start(CMD_LOAD_RULESET, ticket.id);
        self.events.publish(Event::RulesetSelected {
            ruleset_id: ruleset_id.to_string(),
            request: ticket.id,
        });
        ticket
    }

    pub fn apply_ruleset(
        &self,
        ticket: &RequestTicket,
        result: anyhow::Result<Ruleset>,
    ) -> ApplyOutcome {
        self.apply_with_reason(ticket, result, RecomputeReason::RulesetChanged)
    }

    /// Select, fetch and apply in one step.
    pub fn select_ruleset(&self, ruleset_id: &str) -> ApplyOutcome {
        let ticket = self.begin_ruleset_request(ruleset_id);
        let result = self.rulesets.fetch_ruleset(ruleset_id);
        self.apply_ruleset(&ticket, result)
    }

    pub fn restore_last_selection(&self) -> anyhow::Result<Option<ApplyOutcome>> {
        let Some(ruleset_id) = self.preferences.last_ruleset()? else {
            return Ok(None);
        };
        Ok(Some(self.select_ruleset(&ruleset_id)))
    }

    /// Re-fetch the group catalog, falling back to the default list when the
    /// collaborator fails. Rule data for the current selection is fetched
    /// again afterwards and any response still in flight is dropped.
    pub fn refresh_catalog(&self) -> Option<CatalogError> {
        let request = self.tracker.invalidate();
        let started = Instant::now();
        command_start(CMD_REFRESH_CATALOG, request);

        let (catalog, issue) = GroupCatalog::resolve(self.catalog_source.fetch_groups());
        match &issue {
            Some(reason) => {
                command_failure(CMD_REFRESH_CATALOG, request, Some(reason.to_string()));
                self.events.publish(Event::GroupCatalogFallback {
                    reason: reason.to_string(),
                });
            }
            None => {
                command_success(
                    CMD_REFRESH_CATALOG,
                    request,
                    Some(started.elapsed().as_millis()),
                );
            }
        }
        self.events.publish(Event::GroupCatalogChanged {
            group_count: catalog.len(),
        });

        let refetch = {
            let mut state = self.state.write();
            state.catalog = catalog;
            state.catalog_issue = issue.clone();
            state
                .requested_ruleset
                .as_deref()
                .map(|ruleset_id| self.tracker.begin(ruleset_id))
        };

        match refetch {
            Some(ticket) => {
                command_start(CMD_LOAD_RULESET, ticket.id);
                let result = self.rulesets.fetch_ruleset(&ticket.ruleset_id);
                self.apply_with_reason(&ticket, result, RecomputeReason::CatalogChanged);
            }
            None => {
                let mut state = self.state.write();
                self.recompute(&mut state, RecomputeReason::CatalogChanged);
            }
        }
        issue
    }

    pub fn view(&self) -> ComponentsGraphView {
        self.state.read().view.clone()
    }

    pub fn catalog(&self) -> GroupCatalog {
        self.state.read().catalog.clone()
    }

    /// Why the catalog in use is the fallback list, if it is.
    pub fn catalog_issue(&self) -> Option<CatalogError> {
        self.state.read().catalog_issue.clone()
    }

    pub fn requested_ruleset(&self) -> Option<String> {
        self.state.read().requested_ruleset.clone()
    }

    pub fn active_ruleset_id(&self) -> Option<String> {
        self.state.read().ruleset.as_ref().map(|r| r.id.clone())
    }

    /// Select a node for the detail panel. Unknown ids leave the current
    /// selection untouched.
    pub fn select_node(&self, id: &str) -> Option<RuleDetails> {
        let mut state = self.state.write();
        let rules = state.ruleset.as_ref().map(|r| r.rules.as_slice())?;
        let details = select(rules, &state.graph, id)?;
        let rule_id = RuleId::from(id);
        state.selected = Some(rule_id.clone());
        self.events.publish(Event::NodeSelected { id: rule_id });
        Some(details)
    }

    pub fn clear_selection(&self) {
        let mut state = self.state.write();
        if state.selected.take().is_some() {
            self.events.publish(Event::SelectionCleared);
        }
    }

    pub fn selected_details(&self) -> Option<RuleDetails> {
        let state = self.state.read();
        let id = state.selected.as_ref()?;
        let rules = state.ruleset.as_ref().map(|r| r.rules.as_slice())?;
        select(rules, &state.graph, id.as_str())
    }

    fn apply_with_reason(
        &self,
        ticket: &RequestTicket,
        result: anyhow::Result<Ruleset>,
        reason: RecomputeReason,
    ) -> ApplyOutcome {
        let mut state = self.state.write();

        if !self.tracker.is_current(ticket) {
            let latest = self.tracker.latest();
            command_superseded(CMD_LOAD_RULESET, ticket.id, latest);
            self.events.publish(Event::StaleResponseDiscarded {
                ruleset_id: ticket.ruleset_id.clone(),
                request: ticket.id,
                latest,
            });
            return ApplyOutcome::Superseded;
        }

        let outcome = match result {
            Ok(ruleset) => {
                command_success(
                    CMD_LOAD_RULESET,
                    ticket.id,
                    Some(ticket.issued_at.elapsed().as_millis()),
                );
                self.events.publish(Event::RulesetLoaded {
                    ruleset_id: ticket.ruleset_id.clone(),
                    request: ticket.id,
                    rule_count: ruleset.rules.len(),
                });
                state.ruleset = Some(ruleset);
                ApplyOutcome::Applied
            }
            Err(err) => {
                let error = format!("{err:#}");
                command_failure(CMD_LOAD_RULESET, ticket.id, Some(error.clone()));
                self.events.publish(Event::RulesetLoadFailed {
                    ruleset_id: ticket.ruleset_id.clone(),
                    request: ticket.id,
                    error,
                });
                state.ruleset = None;
                ApplyOutcome::Failed
            }
        };

        self.recompute(&mut state, reason);
        outcome
    }

    /// Rebuild graph and layout from scratch; earlier positions are not reused.
    fn recompute(&self, state: &mut ControllerState, reason: RecomputeReason) {
        let request = self.tracker.latest();
        let started = Instant::now();
        command_start(CMD_RECOMPUTE_GRAPH, request);

        let rules = state.ruleset.as_ref().map(|r| r.rules.as_slice()).unwrap_or(&[]);
        let graph = RuleGraph::from_rules(rules);
        let ranking = GroupRanking::from_groups(&state.catalog.groups);
        let layout = PyramidLayouter::new(self.config.clone()).execute(graph.nodes(), &ranking);
        let view = RenderAdapter::new(&graph, &layout, &state.catalog, &self.config).view();

        tracing::info!(
            ?reason,
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            layers = view.layers.len(),
            "components graph recomputed"
        );
        self.events.publish(Event::GraphRecomputed {
            reason,
            node_count: view.nodes.len(),
            edge_count: view.edges.len(),
            layer_count: view.layers.len(),
        });
        if !view.cycles.is_empty() {
            self.events.publish(Event::DependencyCyclesDetected {
                cycles: view.cycles.clone(),
            });
        }

        let selection_gone = state
            .selected
            .as_ref()
            .is_some_and(|id| !graph.contains(id.as_str()));
        if selection_gone {
            state.selected = None;
            self.events.publish(Event::SelectionCleared);
        }

        state.graph = graph;
        state.view = view;
        command_success(
            CMD_RECOMPUTE_GRAPH,
            request,
            Some(started.elapsed().as_millis()),
        );
    }
}
