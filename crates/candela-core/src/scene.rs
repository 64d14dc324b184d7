//! Scene Graph
//!
//! Retained hierarchy of scene nodes. Nodes optionally carry [`Geometry`]
//! describing a drawable mesh; the graph only stores the counts needed for
//! scene statistics.

use ahash::AHashMap;
use smallvec::SmallVec;

/// Scene node identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Raw id value
    pub fn index(&self) -> u32 {
        self.0
    }
}

/// Geometry buffer sizes of a drawable mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Number of vertices in the position attribute
    pub vertex_count: u32,
    /// Number of indices, for indexed geometry
    pub index_count: Option<u32>,
}

impl Geometry {
    /// Non-indexed geometry
    pub fn non_indexed(vertex_count: u32) -> Self {
        Self {
            vertex_count,
            index_count: None,
        }
    }

    /// Indexed geometry
    pub fn indexed(vertex_count: u32, index_count: u32) -> Self {
        Self {
            vertex_count,
            index_count: Some(index_count),
        }
    }

    /// Triangle count; may be fractional for malformed buffers
    pub fn triangles(&self) -> f64 {
        match self.index_count {
            Some(indices) => indices as f64 / 3.0,
            None => self.vertex_count as f64 / 3.0,
        }
    }
}

/// Scene graph node
#[derive(Debug, Clone)]
pub struct Node {
    /// Node id
    pub id: NodeId,
    /// Node name for identification
    pub name: String,
    /// Mesh geometry, if the node is drawable
    pub geometry: Option<Geometry>,
    /// Parent node
    pub parent: Option<NodeId>,
    /// Child nodes
    pub children: SmallVec<[NodeId; 8]>,
    /// Whether this node is visible
    pub visible: bool,
}

impl Node {
    fn new(id: NodeId, name: String, geometry: Option<Geometry>) -> Self {
        Self {
            id,
            name,
            geometry,
            parent: None,
            children: SmallVec::new(),
            visible: true,
        }
    }

    /// Check if the node is a mesh
    pub fn is_mesh(&self) -> bool {
        self.geometry.is_some()
    }
}

/// Scene graph managing the hierarchy of nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: AHashMap<NodeId, Node>,
    roots: Vec<NodeId>,
    next_id: u32,
}

impl SceneGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a grouping node with no geometry
    pub fn add_group(&mut self, name: impl Into<String>, parent: Option<NodeId>) -> NodeId {
        self.insert(name.into(), None, parent)
    }

    /// Add a drawable mesh node
    pub fn add_mesh(&mut self, name: impl Into<String>, geometry: Geometry, parent: Option<NodeId>) -> NodeId {
        self.insert(name.into(), Some(geometry), parent)
    }

    fn insert(&mut self, name: String, geometry: Option<Geometry>, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;

        let mut node = Node::new(id, name, geometry);
        match parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent_node) => {
                parent_node.children.push(id);
                node.parent = Some(parent_node.id);
            }
            None => self.roots.push(id),
        }

        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id)?;

        match node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            Some(parent) => parent.children.retain(|c| *c != id),
            None => self.roots.retain(|r| *r != id),
        }

        let mut pending: Vec<NodeId> = node.children.to_vec();
        while let Some(child) = pending.pop() {
            if let Some(removed) = self.nodes.remove(&child) {
                pending.extend(removed.children);
            }
        }

        Some(node)
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node by id
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Root nodes
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Find a node by name
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes.values().find(|node| node.name == name).map(|node| node.id)
    }

    /// Visit every node once, depth first from the roots.
    ///
    /// Invisible nodes are visited too; visibility does not affect scene statistics.
    pub fn traverse(&self, mut visit: impl FnMut(&Node)) {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(&id) else {
                continue;
            };
            visit(node);
            stack.extend(node.children.iter().rev().copied());
        }
    }

    /// Number of nodes in the scene
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clear all nodes
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.roots.clear();
    }
}
