//! Resolver dependency graph: reference checks, cycle detection, topological order.
//!
//! Built once when the resolver initializes. Edges run from a dependency to its
//! dependent, and from a failover connector to the connector it stands in for,
//! so a topological order always resolves inputs first.

use std::collections::HashMap;
use std::fmt;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, instrument};

use crate::error::ComponentError;
use crate::plugin::{AttributeDefinition, DataConnector};
use crate::types::DependencyKind;

/// Identifies one plugin within a resolver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluginRef {
  Definition(String),
  Connector(String),
}

impl PluginRef {
  pub fn id(&self) -> &str {
    match self {
      PluginRef::Definition(id) | PluginRef::Connector(id) => id,
    }
  }

  fn of_kind(kind: DependencyKind, id: &str) -> Self {
    match kind {
      DependencyKind::AttributeDefinition => PluginRef::Definition(id.to_string()),
      DependencyKind::DataConnector => PluginRef::Connector(id.to_string()),
    }
  }
}

impl fmt::Display for PluginRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PluginRef::Definition(id) => write!(f, "attribute definition '{}'", id),
      PluginRef::Connector(id) => write!(f, "data connector '{}'", id),
    }
  }
}

/// Validated plugin graph of one resolver.
#[derive(Debug, Clone)]
pub struct DependencyGraph {
  order: Vec<PluginRef>,
}

impl DependencyGraph {
  /// Checks references and acyclicity. `resolver_id` names the component in errors.
  #[instrument(level = "trace", skip(definitions, connectors))]
  pub fn build(
    resolver_id: &str,
    definitions: &[Box<dyn AttributeDefinition>],
    connectors: &[Box<dyn DataConnector>],
  ) -> Result<Self, ComponentError> {
    let mut graph: DiGraph<PluginRef, ()> = DiGraph::new();
    let mut index: HashMap<PluginRef, NodeIndex> = HashMap::new();

    let declared = definitions
      .iter()
      .map(|d| PluginRef::Definition(d.id().to_string()))
      .chain(connectors.iter().map(|c| PluginRef::Connector(c.id().to_string())));
    for plugin in declared {
      if index.contains_key(&plugin) {
        return Err(ComponentError::initialization(
          resolver_id,
          format!("{} is declared more than once", plugin),
        ));
      }
      let node = graph.add_node(plugin.clone());
      index.insert(plugin, node);
    }

    let lookup = |from: &PluginRef, target: PluginRef| -> Result<NodeIndex, ComponentError> {
      if let Some(node) = index.get(&target) {
        return Ok(*node);
      }
      let other_kind = match &target {
        PluginRef::Definition(id) => PluginRef::Connector(id.clone()),
        PluginRef::Connector(id) => PluginRef::Definition(id.clone()),
      };
      let reason = if index.contains_key(&other_kind) {
        format!("{} depends on {}, but only {} is declared", from, target, other_kind)
      } else {
        format!("{} depends on undeclared {}", from, target)
      };
      Err(ComponentError::initialization(resolver_id, reason))
    };

    let mut edges = Vec::new();
    let plugins = definitions
      .iter()
      .map(|d| (PluginRef::Definition(d.id().to_string()), d.dependencies(), None::<&str>))
      .chain(connectors.iter().map(|c| {
        (
          PluginRef::Connector(c.id().to_string()),
          c.dependencies(),
          c.failover_connector_id(),
        )
      }));
    for (plugin, dependencies, failover) in plugins {
      let to = index[&plugin];
      for dependency in dependencies {
        let from = lookup(&plugin, PluginRef::of_kind(dependency.kind(), dependency.plugin_id()))?;
        edges.push((from, to));
      }
      if let Some(failover) = failover {
        let from = lookup(&plugin, PluginRef::Connector(failover.to_string()))?;
        edges.push((from, to));
      }
    }
    for (from, to) in edges {
      graph.update_edge(from, to, ());
    }

    let order = toposort(&graph, None).map_err(|cycle| {
      ComponentError::initialization(
        resolver_id,
        format!("dependency cycle through {}", graph[cycle.node_id()]),
      )
    })?;
    let order: Vec<PluginRef> = order.into_iter().map(|n| graph[n].clone()).collect();
    debug!(plugins = order.len(), "dependency graph validated");
    Ok(Self { order })
  }

  /// Every plugin, dependencies before dependents.
  pub fn resolution_order(&self) -> &[PluginRef] {
    &self.order
  }

  /// Attribute definition ids in resolution order.
  pub fn definition_order(&self) -> impl Iterator<Item = &str> {
    self.order.iter().filter_map(|p| match p {
      PluginRef::Definition(id) => Some(id.as_str()),
      PluginRef::Connector(_) => None,
    })
  }
}
