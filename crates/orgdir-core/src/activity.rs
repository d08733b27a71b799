//! The activity hierarchy: a bounded-depth forest of named categories.
//!
//! Parent/child links are plain id references. Nothing here owns a pointer to
//! another node; trees are assembled on demand from flat records by
//! [`build_tree`], and descendant sets are computed over an [`ActivityIndex`]
//! built from one bulk fetch.

use std::collections::{BTreeSet, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default bound on the depth of the activity forest.
pub const DEFAULT_MAX_DEPTH: u8 = 3;

// ─── Records ─────────────────────────────────────────────────────────────────

/// A single node of the activity forest, as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
  pub id:         i64,
  /// Globally unique.
  pub name:       String,
  /// Absent only for roots.
  pub parent_id:  Option<i64>,
  /// 1 for roots, `parent.level + 1` otherwise.
  pub level:      u8,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// Input to [`crate::store::DirectoryStore::create_activity`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewActivity {
  pub name:      String,
  pub parent_id: Option<i64>,
}

impl NewActivity {
  pub fn root(name: impl Into<String>) -> Self {
    Self { name: name.into(), parent_id: None }
  }

  pub fn child(name: impl Into<String>, parent_id: i64) -> Self {
    Self { name: name.into(), parent_id: Some(parent_id) }
  }

  pub fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() {
      return Err(Error::Validation("activity name must not be empty".into()));
    }
    Ok(())
  }
}

/// An activity together with its nested children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityNode {
  #[serde(flatten)]
  pub activity: Activity,
  /// Never null; empty for leaves.
  #[serde(default)]
  pub children: Vec<ActivityNode>,
}

impl ActivityNode {
  pub fn leaf(activity: Activity) -> Self {
    Self { activity, children: Vec::new() }
  }
}

// ─── Level computation ───────────────────────────────────────────────────────

/// Level of a new node given its parent's level (`None` for a root).
///
/// Fails with [`Error::DepthExceeded`] when the result would be deeper than
/// `max_depth`.
pub fn child_level(parent_level: Option<u8>, max_depth: u8) -> Result<u8> {
  let level = match parent_level {
    None => 1,
    Some(l) => l.saturating_add(1),
  };
  if level > max_depth {
    return Err(Error::DepthExceeded { level, max: max_depth });
  }
  Ok(level)
}

// ─── Tree assembly ───────────────────────────────────────────────────────────

/// Assemble a forest from flat activity records.
///
/// Roots are the records with no parent, plus records whose parent is not part
/// of `activities`; the latter is what lets a closed subtree be rebuilt
/// rooted at its top node. Children are attached in input order, so callers
/// that want deterministic output should sort by `(level, name)` first.
/// Records whose id was already seen are ignored.
pub fn build_tree(activities: &[Activity]) -> Vec<ActivityNode> {
  let mut position: HashMap<i64, usize> = HashMap::with_capacity(activities.len());
  let mut unique: Vec<&Activity> = Vec::with_capacity(activities.len());
  for activity in activities {
    if !position.contains_key(&activity.id) {
      position.insert(activity.id, unique.len());
      unique.push(activity);
    }
  }

  let mut children: Vec<Vec<usize>> = vec![Vec::new(); unique.len()];
  let mut roots: Vec<usize> = Vec::new();
  for (idx, activity) in unique.iter().enumerate() {
    match activity.parent_id.and_then(|p| position.get(&p)) {
      Some(&parent_idx) if parent_idx != idx => children[parent_idx].push(idx),
      _ => roots.push(idx),
    }
  }

  roots
    .into_iter()
    .map(|idx| assemble(idx, &unique, &children))
    .collect()
}

fn assemble(idx: usize, records: &[&Activity], children: &[Vec<usize>]) -> ActivityNode {
  ActivityNode {
    activity: records[idx].clone(),
    children: children[idx]
      .iter()
      .map(|&child| assemble(child, records, children))
      .collect(),
  }
}

/// Pre-order flattening of a forest; the inverse of [`build_tree`].
pub fn flatten_tree(forest: &[ActivityNode]) -> Vec<Activity> {
  let mut out = Vec::new();
  let mut stack: Vec<&ActivityNode> = forest.iter().rev().collect();
  while let Some(node) = stack.pop() {
    out.push(node.activity.clone());
    stack.extend(node.children.iter().rev());
  }
  out
}

// ─── Descendant expansion ────────────────────────────────────────────────────

/// Parent → children adjacency over activity ids.
#[derive(Debug, Clone, Default)]
pub struct ActivityIndex {
  children: HashMap<i64, Vec<i64>>,
}

impl ActivityIndex {
  /// Build the index from `(id, parent_id)` pairs.
  pub fn from_links(links: impl IntoIterator<Item = (i64, Option<i64>)>) -> Self {
    let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
    for (id, parent_id) in links {
      if let Some(parent_id) = parent_id {
        children.entry(parent_id).or_default().push(id);
      }
    }
    Self { children }
  }

  pub fn children_of(&self, id: i64) -> &[i64] {
    self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
  }

  /// `root` plus every id reachable through child links.
  ///
  /// Breadth-first until the frontier is empty; no depth is assumed.
  pub fn descendant_ids(&self, root: i64) -> BTreeSet<i64> {
    let mut seen = BTreeSet::from([root]);
    let mut frontier = VecDeque::from([root]);
    while let Some(id) = frontier.pop_front() {
      for &child in self.children_of(id) {
        if seen.insert(child) {
          frontier.push_back(child);
        }
      }
    }
    seen
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone as _;

  use super::*;

  fn act(id: i64, name: &str, parent_id: Option<i64>, level: u8) -> Activity {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    Activity {
      id,
      name: name.into(),
      parent_id,
      level,
      created_at: at,
      updated_at: at,
    }
  }

  fn sample() -> Vec<Activity> {
    vec![
      act(1, "Cars", None, 1),
      act(2, "Food", None, 1),
      act(3, "Dairy", Some(2), 2),
      act(4, "Meat", Some(2), 2),
      act(5, "Beef", Some(4), 3),
    ]
  }

  #[test]
  fn root_level_is_one() {
    assert_eq!(child_level(None, DEFAULT_MAX_DEPTH).unwrap(), 1);
  }

  #[test]
  fn child_level_is_parent_plus_one() {
    assert_eq!(child_level(Some(1), 3).unwrap(), 2);
    assert_eq!(child_level(Some(2), 3).unwrap(), 3);
  }

  #[test]
  fn child_level_rejects_past_max_depth() {
    let err = child_level(Some(3), 3).unwrap_err();
    assert!(matches!(err, Error::DepthExceeded { level: 4, max: 3 }));
  }

  #[test]
  fn child_level_follows_configured_bound() {
    assert_eq!(child_level(Some(3), 5).unwrap(), 4);
    assert!(child_level(Some(1), 1).is_err());
  }

  #[test]
  fn build_tree_nests_children_in_input_order() {
    let forest = build_tree(&sample());
    assert_eq!(forest.len(), 2);
    assert_eq!(forest[0].activity.name, "Cars");
    assert!(forest[0].children.is_empty());

    let food = &forest[1];
    let names: Vec<_> = food.children.iter().map(|c| c.activity.name.as_str()).collect();
    assert_eq!(names, ["Dairy", "Meat"]);
    assert_eq!(food.children[1].children[0].activity.name, "Beef");
  }

  #[test]
  fn build_tree_reroots_nodes_with_absent_parent() {
    let subset: Vec<_> = sample().into_iter().filter(|a| a.id >= 4).collect();
    let forest = build_tree(&subset);
    assert_eq!(forest.len(), 1);
    assert_eq!(forest[0].activity.id, 4);
    assert_eq!(forest[0].children[0].activity.id, 5);
  }

  #[test]
  fn build_tree_empty_input() {
    assert!(build_tree(&[]).is_empty());
  }

  #[test]
  fn build_tree_is_idempotent_through_flatten() {
    let forest = build_tree(&sample());
    let rebuilt = build_tree(&flatten_tree(&forest));
    assert_eq!(rebuilt, forest);
    assert_eq!(build_tree(&sample()), forest);
  }

  #[test]
  fn flatten_is_preorder() {
    let ids: Vec<_> = flatten_tree(&build_tree(&sample())).iter().map(|a| a.id).collect();
    assert_eq!(ids, [1, 2, 3, 4, 5]);
  }

  #[test]
  fn node_serializes_flat_with_children() {
    let node = ActivityNode::leaf(act(7, "Tyres", Some(1), 2));
    let json = serde_json::to_value(&node).unwrap();
    assert_eq!(json["id"], 7);
    assert_eq!(json["parent_id"], 1);
    assert_eq!(json["children"], serde_json::json!([]));
  }

  fn index() -> ActivityIndex {
    ActivityIndex::from_links(sample().iter().map(|a| (a.id, a.parent_id)))
  }

  #[test]
  fn descendants_include_self_and_all_levels() {
    assert_eq!(index().descendant_ids(2), BTreeSet::from([2, 3, 4, 5]));
  }

  #[test]
  fn descendants_of_leaf_is_self() {
    assert_eq!(index().descendant_ids(5), BTreeSet::from([5]));
    assert_eq!(index().descendant_ids(1), BTreeSet::from([1]));
  }

  #[test]
  fn descendants_walk_past_three_levels() {
    let links = (1..=6).map(|id| (id, if id == 1 { None } else { Some(id - 1) }));
    let ids = ActivityIndex::from_links(links).descendant_ids(1);
    assert_eq!(ids, (1..=6).collect::<BTreeSet<_>>());
  }

  #[test]
  fn new_activity_rejects_blank_name() {
    assert!(NewActivity::root("  ").validate().is_err());
    assert!(NewActivity::child("Meat", 1).validate().is_ok());
  }
}
