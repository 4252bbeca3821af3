//! Resource graph.
//!
//! Descriptors are nodes; every reference field becomes an edge pointing from
//! the referenced resource to the one that references it, so a topological
//! walk yields a valid deployment order. This enables:
//!
//! - Reference checking at declaration time (dangling ids, wrong kinds)
//! - Deployment ordering
//! - Impact queries (what depends on a resource)
//! - DOT export for visualization

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use serde::Serialize;

use super::{
    BootScript, ComputeInstanceDescriptor, LogicalId, NetworkDescriptor, Resource, ResourceKind,
    ResourceRef, SecurityGroupDescriptor,
};
use crate::error::{Error, Result};

/// A declared resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceNode {
    /// Logical id
    pub id: LogicalId,
    /// Descriptor
    #[serde(flatten)]
    pub resource: Resource,
}

/// Edge weight: the field that carries the reference.
#[derive(Debug, Clone, PartialEq, Eq)]
struct ReferenceEdge {
    field: &'static str,
}

/// A reference between two declared resources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reference {
    /// Referencing resource
    pub from: LogicalId,
    /// Referenced resource
    pub to: LogicalId,
    /// Field on the referencing descriptor
    pub field: &'static str,
}

/// The set of resource descriptors of one stack plus their references.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    graph: DiGraph<ResourceNode, ReferenceEdge>,
    node_indices: HashMap<LogicalId, NodeIndex>,
}

impl ResourceGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a resource.
    ///
    /// Fails without modifying the graph if the id is taken, the descriptor is
    /// invalid, or a reference does not resolve to an already declared
    /// resource of the expected kind.
    pub fn add(
        &mut self,
        id: impl Into<LogicalId>,
        resource: impl Into<Resource>,
    ) -> Result<ResourceRef> {
        let id = id.into();
        let resource = resource.into();

        if self.node_indices.contains_key(&id) {
            return Err(Error::DuplicateResource(id.to_string()));
        }

        resource.validate(&id)?;

        let mut edges = Vec::new();
        for field_ref in resource.references() {
            let target = &field_ref.target.id;
            let &target_idx =
                self.node_indices
                    .get(target)
                    .ok_or_else(|| Error::DanglingReference {
                        from: id.to_string(),
                        to: target.to_string(),
                    })?;

            let found = self.graph[target_idx].resource.kind();
            if found != field_ref.expected || found != field_ref.target.kind {
                return Err(Error::ReferenceKind {
                    from: id.to_string(),
                    to: target.to_string(),
                    expected: field_ref.expected.to_string(),
                    found: found.to_string(),
                });
            }
            self.check_rule_set(&id, target_idx)?;
            edges.push((target_idx, field_ref.field));
        }

        let kind = resource.kind();
        let idx = self.graph.add_node(ResourceNode {
            id: id.clone(),
            resource,
        });
        for (target_idx, field) in edges {
            self.graph.add_edge(target_idx, idx, ReferenceEdge { field });
        }
        self.node_indices.insert(id.clone(), idx);

        tracing::debug!("Declared {} '{}'", kind, id);
        Ok(ResourceRef::new(id, kind))
    }

    /// Look up a resource.
    pub fn get(&self, id: &LogicalId) -> Option<&Resource> {
        self.node_indices
            .get(id)
            .and_then(|idx| self.graph.node_weight(*idx))
            .map(|n| &n.resource)
    }

    /// All nodes in declaration order.
    pub fn nodes(&self) -> impl Iterator<Item = &ResourceNode> {
        self.graph
            .node_indices()
            .filter_map(move |idx| self.graph.node_weight(idx))
    }

    /// All references, ordered by referencing resource then field.
    pub fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<(NodeIndex, Reference)> = self
            .graph
            .edge_references()
            .map(|edge| {
                (
                    edge.target(),
                    Reference {
                        from: self.graph[edge.target()].id.clone(),
                        to: self.graph[edge.source()].id.clone(),
                        field: edge.weight().field,
                    },
                )
            })
            .collect();
        refs.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.field.cmp(b.1.field)));
        refs.into_iter().map(|(_, r)| r).collect()
    }

    /// Nodes of one kind, in declaration order.
    pub fn resources_of_kind(&self, kind: ResourceKind) -> Vec<&ResourceNode> {
        self.nodes().filter(|n| n.resource.kind() == kind).collect()
    }

    /// Declared networks.
    pub fn networks(&self) -> Vec<(&LogicalId, &NetworkDescriptor)> {
        self.nodes()
            .filter_map(|n| n.resource.as_network().map(|r| (&n.id, r)))
            .collect()
    }

    /// Declared security groups.
    pub fn security_groups(&self) -> Vec<(&LogicalId, &SecurityGroupDescriptor)> {
        self.nodes()
            .filter_map(|n| n.resource.as_security_group().map(|r| (&n.id, r)))
            .collect()
    }

    /// Declared boot scripts.
    pub fn boot_scripts(&self) -> Vec<(&LogicalId, &BootScript)> {
        self.nodes()
            .filter_map(|n| n.resource.as_boot_script().map(|r| (&n.id, r)))
            .collect()
    }

    /// Declared instances.
    pub fn instances(&self) -> Vec<(&LogicalId, &ComputeInstanceDescriptor)> {
        self.nodes()
            .filter_map(|n| n.resource.as_instance().map(|r| (&n.id, r)))
            .collect()
    }

    /// Check for reference cycles
    pub fn has_cycles(&self) -> bool {
        tarjan_scc(&self.graph).iter().any(|scc| scc.len() > 1)
    }

    /// Re-check every descriptor and the acyclicity of the graph.
    pub fn validate(&self) -> Result<()> {
        for node in self.nodes() {
            node.resource.validate(&node.id)?;
        }
        for edge in self.graph.edge_references() {
            self.check_rule_set(&self.graph[edge.target()].id, edge.source())?;
        }
        if self.has_cycles() {
            let cycles: Vec<String> = tarjan_scc(&self.graph)
                .into_iter()
                .filter(|scc| scc.len() > 1)
                .map(|scc| {
                    scc.into_iter()
                        .map(|idx| self.graph[idx].id.to_string())
                        .collect::<Vec<_>>()
                        .join(" -> ")
                })
                .collect();
            return Err(Error::DependencyCycle(cycles.join("; ")));
        }
        Ok(())
    }

    /// A security group must carry at least one rule before anything references it.
    fn check_rule_set(&self, from: &LogicalId, target_idx: NodeIndex) -> Result<()> {
        let target = &self.graph[target_idx];
        match target.resource.as_security_group() {
            Some(sg) if sg.ingress.is_empty() => Err(Error::invalid_descriptor(
                from.as_str(),
                format!("security group '{}' has no ingress rules", target.id),
            )),
            _ => Ok(()),
        }
    }

    /// Resources in an order where every dependency precedes its dependents.
    pub fn deployment_order(&self) -> Result<Vec<LogicalId>> {
        match toposort(&self.graph, None) {
            Ok(order) => Ok(order
                .into_iter()
                .map(|idx| self.graph[idx].id.clone())
                .collect()),
            Err(cycle) => Err(Error::DependencyCycle(format!(
                "cannot order resources: cycle through '{}'",
                self.graph[cycle.node_id()].id
            ))),
        }
    }

    /// Everything `id` depends on, directly or transitively.
    pub fn dependencies_of(&self, id: &LogicalId) -> Vec<LogicalId> {
        self.walk(id, Direction::Incoming)
    }

    /// Everything that depends on `id`, directly or transitively.
    pub fn dependents_of(&self, id: &LogicalId) -> Vec<LogicalId> {
        self.walk(id, Direction::Outgoing)
    }

    fn walk(&self, id: &LogicalId, direction: Direction) -> Vec<LogicalId> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();

        if let Some(&start) = self.node_indices.get(id) {
            queue.push_back(start);
            while let Some(current) = queue.pop_front() {
                for neighbor in self.graph.neighbors_directed(current, direction) {
                    if seen.insert(neighbor) {
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        let mut found: Vec<NodeIndex> = seen.into_iter().collect();
        found.sort();
        found
            .into_iter()
            .map(|idx| self.graph[idx].id.clone())
            .collect()
    }

    /// Number of resources.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True when nothing was declared.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of references.
    pub fn reference_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Generate a DOT format representation for visualization
    pub fn to_dot(&self, name: &str) -> String {
        let mut output = String::new();
        output.push_str(&format!("digraph \"{name}\" {{\n"));
        output.push_str("  rankdir=LR;\n");
        output.push_str("  node [shape=box];\n\n");

        for node in self.nodes() {
            output.push_str(&format!(
                "  \"{}\" [label=\"{}\\n({})\"];\n",
                node.id,
                node.id,
                node.resource.kind()
            ));
        }

        output.push('\n');

        // dependent -> dependency, the way references read
        for reference in self.references() {
            output.push_str(&format!(
                "  \"{}\" -> \"{}\" [label=\"{}\"];\n",
                reference.from, reference.to, reference.field
            ));
        }

        output.push_str("}\n");
        output
    }
}

impl PartialEq for ResourceGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes().eq(other.nodes()) && self.references() == other.references()
    }
}

impl Eq for ResourceGraph {}

impl Serialize for ResourceGraph {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeStruct;

        let resources: Vec<&ResourceNode> = self.nodes().collect();
        let mut state = serializer.serialize_struct("ResourceGraph", 2)?;
        state.serialize_field("resources", &resources)?;
        state.serialize_field("references", &self.references())?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::{
        IngressRule, InstanceClass, InstanceSize, InstanceType, Ipv4Cidr, MachineImage,
    };

    fn ssh_group(network: ResourceRef) -> SecurityGroupDescriptor {
        let mut sg = SecurityGroupDescriptor::new(network, "sg");
        let peer: Ipv4Cidr = "10.0.0.0/8".parse().unwrap();
        sg.add_ingress_rule(IngressRule::tcp(peer, 22, "ssh"));
        sg
    }

    fn instance(
        network: ResourceRef,
        security_group: ResourceRef,
        boot_script: ResourceRef,
    ) -> ComputeInstanceDescriptor {
        ComputeInstanceDescriptor {
            instance_type: InstanceType::of(InstanceClass::T2, InstanceSize::Micro),
            machine_image: MachineImage::AmazonLinux2,
            network,
            security_group,
            boot_script,
        }
    }

    fn sample() -> ResourceGraph {
        let mut graph = ResourceGraph::new();
        let vpc = graph.add("Vpc", NetworkDescriptor::default()).unwrap();
        let sg = graph.add("Sg", ssh_group(vpc.clone())).unwrap();
        let script = graph.add("UserData", BootScript::for_linux()).unwrap();
        graph.add("Instance", instance(vpc, sg, script)).unwrap();
        graph
    }

    #[test]
    fn test_graph_creation() {
        let graph = ResourceGraph::new();
        assert!(graph.is_empty());
        assert_eq!(graph.reference_count(), 0);
    }

    #[test]
    fn test_add_resources() {
        let graph = sample();
        assert_eq!(graph.len(), 4);
        // sg->vpc, instance->vpc, instance->sg, instance->script
        assert_eq!(graph.reference_count(), 4);
        assert_eq!(graph.networks().len(), 1);
        assert_eq!(graph.instances().len(), 1);
    }

    #[test]
    fn test_duplicate_id() {
        let mut graph = sample();
        let err = graph.add("Vpc", NetworkDescriptor::default()).unwrap_err();
        assert!(matches!(err, Error::DuplicateResource(_)));
        assert_eq!(graph.len(), 4);
    }

    #[test]
    fn test_dangling_reference() {
        let mut graph = ResourceGraph::new();
        let missing = ResourceRef::new("Nowhere", ResourceKind::Network);
        let err = graph
            .add("Sg", SecurityGroupDescriptor::new(missing, "sg"))
            .unwrap_err();
        assert!(matches!(err, Error::DanglingReference { .. }));
        assert!(graph.is_empty());
    }

    #[test]
    fn test_wrong_reference_kind() {
        let mut graph = ResourceGraph::new();
        let script = graph.add("UserData", BootScript::for_linux()).unwrap();
        let forged = ResourceRef::new(script.id, ResourceKind::Network);
        let err = graph
            .add("Sg", SecurityGroupDescriptor::new(forged, "sg"))
            .unwrap_err();
        assert!(matches!(err, Error::ReferenceKind { .. }));
    }

    #[test]
    fn test_instance_rejects_group_without_rules() {
        let mut graph = ResourceGraph::new();
        let vpc = graph.add("Vpc", NetworkDescriptor::default()).unwrap();
        let sg = graph
            .add("Sg", SecurityGroupDescriptor::new(vpc.clone(), "empty"))
            .unwrap();
        let script = graph.add("UserData", BootScript::for_linux()).unwrap();

        let err = graph
            .add("Instance", instance(vpc, sg, script))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
        assert!(err.to_string().contains("no ingress rules"));
        assert_eq!(graph.len(), 3);
        assert!(graph.instances().is_empty());
    }

    #[test]
    fn test_validate_catches_emptied_group() {
        let mut graph = sample();
        let idx = graph.node_indices[&LogicalId::from("Sg")];
        if let Resource::SecurityGroup(sg) = &mut graph.graph[idx].resource {
            sg.ingress.clear();
        }

        let err = graph.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_deployment_order() {
        let graph = sample();
        let order = graph.deployment_order().unwrap();
        let pos = |id: &str| order.iter().position(|o| o.as_str() == id).unwrap();

        assert!(pos("Vpc") < pos("Sg"));
        assert!(pos("Sg") < pos("Instance"));
        assert!(pos("UserData") < pos("Instance"));
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let graph = sample();
        let deps = graph.dependencies_of(&LogicalId::from("Instance"));
        assert_eq!(deps.len(), 3);

        let dependents = graph.dependents_of(&LogicalId::from("Vpc"));
        assert_eq!(
            dependents,
            vec![LogicalId::from("Sg"), LogicalId::from("Instance")]
        );
        assert!(graph.dependents_of(&LogicalId::from("Instance")).is_empty());
    }

    #[test]
    fn test_no_cycles() {
        let graph = sample();
        assert!(!graph.has_cycles());
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn test_references_ordered() {
        let graph = sample();
        let refs = graph.references();
        let fields: Vec<(&str, &str)> = refs
            .iter()
            .map(|r| (r.from.as_str(), r.field))
            .collect();
        assert_eq!(fields[0], ("Sg", "network"));
        assert_eq!(fields.len(), 4);
    }

    #[test]
    fn test_to_dot() {
        let dot = sample().to_dot("Test");
        assert!(dot.contains("digraph \"Test\""));
        assert!(dot.contains("\"Instance\" -> \"Sg\" [label=\"security_group\"]"));
    }

    #[test]
    fn test_structural_equality() {
        assert_eq!(sample(), sample());
    }
}
