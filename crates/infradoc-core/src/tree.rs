//! Option tree model
//!
//! Holds one flattened, depth-ordered option list per scope level. Regions and
//! instances are flat (every node at depth 0); compartments form a tree that is
//! stored in pre-order so that each node follows all of its ancestors.
//!
//! Every level carries a generation counter. A reload is started with
//! [`OptionTree::begin_reload`] and finished with
//! [`OptionTree::complete_reload`]; a response whose ticket predates the last
//! invalidation of that level is dropped.

use crate::error::{CoreError, Result};
use crate::filter::{FilterResult, apply_filter};
use crate::model::{OptionId, OptionKind, OptionNode, RawOption};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Lifecycle states under which an instance may be picked
const OFFERED_INSTANCE_STATES: [&str; 2] = ["RUNNING", "STOPPED"];

/// Level of the cascading scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionLevel {
    Region,
    Compartment,
    Instance,
}

impl OptionLevel {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionLevel::Region => OptionKind::Region,
            OptionLevel::Compartment => OptionKind::Compartment,
            OptionLevel::Instance => OptionKind::Instance,
        }
    }

    /// Levels that depend on this one, nearest first
    pub fn downstream(&self) -> &'static [OptionLevel] {
        match self {
            OptionLevel::Region => &[OptionLevel::Compartment, OptionLevel::Instance],
            OptionLevel::Compartment => &[OptionLevel::Instance],
            OptionLevel::Instance => &[],
        }
    }

    fn index(&self) -> usize {
        match self {
            OptionLevel::Region => 0,
            OptionLevel::Compartment => 1,
            OptionLevel::Instance => 2,
        }
    }
}

impl fmt::Display for OptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionLevel::Region => write!(f, "region"),
            OptionLevel::Compartment => write!(f, "compartment"),
            OptionLevel::Instance => write!(f, "instance"),
        }
    }
}

/// Proof that a reload was requested at a given generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadTicket {
    pub level: OptionLevel,
    generation: u64,
}

#[derive(Debug, Default)]
struct LevelState {
    nodes: Vec<OptionNode>,
    generation: u64,
    error: Option<String>,
    pending: bool,
}

/// Per-level option lists
#[derive(Debug, Default)]
pub struct OptionTree {
    levels: [LevelState; 3],
}

impl OptionTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// The flattened, depth-ordered list currently loaded for `level`
    pub fn flatten(&self, level: OptionLevel) -> &[OptionNode] {
        &self.state(level).nodes
    }

    pub fn find(&self, level: OptionLevel, id: &OptionId) -> Option<&OptionNode> {
        self.state(level).nodes.iter().find(|n| &n.id == id)
    }

    /// Last load error for `level`, cleared by the next reload
    pub fn error(&self, level: OptionLevel) -> Option<&str> {
        self.state(level).error.as_deref()
    }

    pub fn is_pending(&self, level: OptionLevel) -> bool {
        self.state(level).pending
    }

    pub fn generation(&self, level: OptionLevel) -> u64 {
        self.state(level).generation
    }

    /// Empty `level` and orphan any reload in flight for it
    pub fn invalidate(&mut self, level: OptionLevel) {
        let state = self.state_mut(level);
        state.nodes.clear();
        state.error = None;
        state.pending = false;
        state.generation += 1;
        tracing::debug!(
            "Invalidated {} options (generation {})",
            level,
            state.generation
        );
    }

    /// Start a reload; any ticket issued earlier for the same level goes stale
    pub fn begin_reload(&mut self, level: OptionLevel) -> ReloadTicket {
        self.invalidate(level);
        let state = self.state_mut(level);
        state.pending = true;
        ReloadTicket {
            level,
            generation: state.generation,
        }
    }

    /// Finish a reload started with [`OptionTree::begin_reload`].
    ///
    /// Returns `Ok(false)` when the ticket is stale and the response was
    /// discarded. A failed fetch or a list that breaks the depth order leaves
    /// the level empty and is reported as [`CoreError::ScopeLoad`].
    pub fn complete_reload(
        &mut self,
        ticket: ReloadTicket,
        outcome: std::result::Result<Vec<OptionNode>, String>,
    ) -> Result<bool> {
        let level = ticket.level;
        if self.state(level).generation != ticket.generation {
            tracing::warn!(
                "Discarding stale {} response (generation {}, current {})",
                level,
                ticket.generation,
                self.state(level).generation
            );
            return Ok(false);
        }

        let checked = outcome.and_then(|nodes| check_depth_order(&nodes).map(|_| nodes));
        let state = self.state_mut(level);
        state.pending = false;
        match checked {
            Ok(nodes) => {
                tracing::debug!("Loaded {} {} options", nodes.len(), level);
                state.nodes = nodes;
                state.error = None;
                Ok(true)
            }
            Err(message) => {
                state.nodes.clear();
                state.error = Some(message.clone());
                Err(CoreError::scope_load(level, message))
            }
        }
    }

    /// Replace `level` with `nodes` in one step
    pub fn load(&mut self, level: OptionLevel, nodes: Vec<OptionNode>) -> Result<()> {
        let ticket = self.begin_reload(level);
        self.complete_reload(ticket, Ok(nodes)).map(|_| ())
    }

    /// Visible subset of `level` for `query`
    pub fn filter(&self, level: OptionLevel, query: &str) -> FilterResult {
        apply_filter(query, self.flatten(level))
    }

    fn state(&self, level: OptionLevel) -> &LevelState {
        &self.levels[level.index()]
    }

    fn state_mut(&mut self, level: OptionLevel) -> &mut LevelState {
        &mut self.levels[level.index()]
    }
}

/// Normalize raw service entries for `level`.
///
/// Instances outside the offered lifecycle states are dropped here.
pub fn normalize_options(level: OptionLevel, raw: Vec<RawOption>) -> Result<Vec<OptionNode>> {
    let kind = level.kind();
    let mut nodes = Vec::with_capacity(raw.len());
    for (index, entry) in raw.into_iter().enumerate() {
        let node = entry
            .normalize(kind)
            .map_err(|e| CoreError::scope_load(level, format!("entry {}: {}", index, e)))?;
        if level == OptionLevel::Instance {
            if let Some(status) = node.detail.as_deref() {
                if !OFFERED_INSTANCE_STATES.contains(&status) {
                    continue;
                }
            }
        }
        nodes.push(node);
    }
    Ok(nodes)
}

/// Check that a list can be walked backwards to find ancestors
pub fn check_depth_order(nodes: &[OptionNode]) -> std::result::Result<(), String> {
    let mut previous: Option<u32> = None;
    for node in nodes {
        let allowed = previous.map(|d| d + 1).unwrap_or(0);
        if node.depth > allowed {
            return Err(format!(
                "{} '{}' at depth {} has no parent at depth {}",
                node.kind,
                node.display_name,
                node.depth,
                node.depth.saturating_sub(1)
            ));
        }
        previous = Some(node.depth);
    }
    Ok(())
}

/// Compartment entry linked to its parent by id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// Build a pre-ordered compartment list from parent links.
///
/// The root comes first at depth 0. Children are sorted by name and placed
/// depth-first at parent depth + 1. Entries with an unknown parent hang off
/// the root.
pub fn flatten_hierarchy(root_id: &str, root_name: &str, entries: &[HierarchyEntry]) -> Vec<OptionNode> {
    let known: HashSet<&str> = entries.iter().map(|e| e.id.as_str()).collect();
    let mut children: HashMap<&str, Vec<&HierarchyEntry>> = HashMap::new();
    for entry in entries {
        if entry.id == root_id {
            continue;
        }
        let parent = match entry.parent_id.as_deref() {
            Some(p) if p == root_id || known.contains(p) => p,
            _ => root_id,
        };
        children.entry(parent).or_default().push(entry);
    }
    for list in children.values_mut() {
        list.sort_by(|a, b| a.name.cmp(&b.name));
    }

    let mut out = vec![OptionNode::new(root_id, root_name, OptionKind::Compartment)];
    let mut visited: HashSet<&str> = HashSet::from([root_id]);
    // (entry, depth), popped in pre-order
    let mut stack: Vec<(&HierarchyEntry, u32)> = children
        .get(root_id)
        .map(|c| c.iter().rev().map(|e| (*e, 1)).collect())
        .unwrap_or_default();

    while let Some((entry, depth)) = stack.pop() {
        if !visited.insert(entry.id.as_str()) {
            continue;
        }
        out.push(
            OptionNode::new(entry.id.as_str(), entry.name.as_str(), OptionKind::Compartment)
                .at_depth(depth),
        );
        if let Some(kids) = children.get(entry.id.as_str()) {
            stack.extend(kids.iter().rev().map(|e| (*e, depth + 1)));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compartment(id: &str, depth: u32) -> OptionNode {
        OptionNode::new(id, id, OptionKind::Compartment).at_depth(depth)
    }

    fn entry(id: &str, name: &str, parent: Option<&str>) -> HierarchyEntry {
        HierarchyEntry {
            id: id.to_string(),
            name: name.to_string(),
            parent_id: parent.map(str::to_string),
        }
    }

    #[test]
    fn test_load_replaces_previous_nodes() {
        let mut tree = OptionTree::new();
        tree.load(OptionLevel::Compartment, vec![compartment("a", 0)])
            .unwrap();
        tree.load(
            OptionLevel::Compartment,
            vec![compartment("b", 0), compartment("c", 1)],
        )
        .unwrap();

        let ids: Vec<&str> = tree
            .flatten(OptionLevel::Compartment)
            .iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_stale_reload_is_discarded() {
        let mut tree = OptionTree::new();
        let first = tree.begin_reload(OptionLevel::Compartment);
        let second = tree.begin_reload(OptionLevel::Compartment);

        let applied = tree
            .complete_reload(second, Ok(vec![compartment("fresh", 0)]))
            .unwrap();
        assert!(applied);

        let applied = tree
            .complete_reload(first, Ok(vec![compartment("late", 0)]))
            .unwrap();
        assert!(!applied);
        assert_eq!(tree.flatten(OptionLevel::Compartment)[0].id.as_str(), "fresh");
    }

    #[test]
    fn test_invalidate_orphans_pending_reload() {
        let mut tree = OptionTree::new();
        let ticket = tree.begin_reload(OptionLevel::Instance);
        assert!(tree.is_pending(OptionLevel::Instance));

        tree.invalidate(OptionLevel::Instance);
        assert!(!tree.is_pending(OptionLevel::Instance));

        let applied = tree.complete_reload(ticket, Ok(vec![])).unwrap();
        assert!(!applied);
    }

    #[test]
    fn test_failed_reload_leaves_level_empty() {
        let mut tree = OptionTree::new();
        tree.load(OptionLevel::Region, vec![OptionNode::new("r1", "r1", OptionKind::Region)])
            .unwrap();

        let ticket = tree.begin_reload(OptionLevel::Region);
        let err = tree
            .complete_reload(ticket, Err("connection refused".to_string()))
            .unwrap_err();

        assert!(matches!(
            err,
            CoreError::ScopeLoad {
                level: OptionLevel::Region,
                ..
            }
        ));
        assert!(tree.flatten(OptionLevel::Region).is_empty());
        assert_eq!(tree.error(OptionLevel::Region), Some("connection refused"));
    }

    #[test]
    fn test_depth_jump_is_rejected() {
        let mut tree = OptionTree::new();
        let err = tree
            .load(
                OptionLevel::Compartment,
                vec![compartment("root", 0), compartment("grandchild", 2)],
            )
            .unwrap_err();
        assert!(matches!(err, CoreError::ScopeLoad { .. }));
        assert!(tree.flatten(OptionLevel::Compartment).is_empty());

        assert!(check_depth_order(&[compartment("child", 1)]).is_err());
    }

    #[test]
    fn test_normalize_drops_terminated_instances() {
        let raw = vec![
            RawOption {
                id: Some("i1".into()),
                display_name: Some("web".into()),
                status: Some("RUNNING".into()),
                ..Default::default()
            },
            RawOption {
                id: Some("i2".into()),
                display_name: Some("old".into()),
                status: Some("TERMINATED".into()),
                ..Default::default()
            },
            RawOption {
                id: Some("i3".into()),
                display_name: Some("db".into()),
                status: Some("STOPPED".into()),
                ..Default::default()
            },
        ];
        let nodes = normalize_options(OptionLevel::Instance, raw).unwrap();
        let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["i1", "i3"]);
    }

    #[test]
    fn test_normalize_reports_entry_index() {
        let raw = vec![RawOption::default()];
        let err = normalize_options(OptionLevel::Compartment, raw).unwrap_err();
        assert!(err.to_string().contains("entry 0"));
    }

    #[test]
    fn test_flatten_hierarchy_preorder_sorted() {
        let entries = vec![
            entry("prod", "Prod", Some("tenancy")),
            entry("dev", "Dev", Some("tenancy")),
            entry("prod-db", "Database", Some("prod")),
            entry("prod-app", "App", Some("prod")),
            entry("lost", "Lost", Some("ocid1.unknown")),
        ];
        let nodes = flatten_hierarchy("tenancy", "Root (Tenancy)", &entries);
        let layout: Vec<(&str, u32)> = nodes.iter().map(|n| (n.id.as_str(), n.depth)).collect();
        assert_eq!(
            layout,
            vec![
                ("tenancy", 0),
                ("dev", 1),
                ("lost", 1),
                ("prod", 1),
                ("prod-app", 2),
                ("prod-db", 2),
            ]
        );
        assert!(check_depth_order(&nodes).is_ok());
    }

    #[test]
    fn test_flatten_hierarchy_survives_cycles() {
        let entries = vec![entry("a", "A", Some("b")), entry("b", "B", Some("a"))];
        let nodes = flatten_hierarchy("root", "Root", &entries);
        // Neither a nor b is reachable from the root.
        assert_eq!(nodes.len(), 1);
    }
}
