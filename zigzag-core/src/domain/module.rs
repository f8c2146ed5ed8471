//! Module tree domain types
//!
//! qTest files test cases under a tree of modules. The tree is stored as an
//! arena: nodes refer to their parent by index, never by live reference.

use crate::dto::module::RemoteModule;
use crate::error::{Result, ZigZagError};

/// Index of a node inside a [`ModuleTree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

/// A position in the module hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleNode {
    pub name: String,
    /// Remote id, known only for modules that already exist in qTest
    pub remote_id: Option<u64>,
    /// `None` means the node hangs off the project root
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
}

impl ModuleNode {
    /// Whether the node still has to be created remotely
    pub fn is_pending(&self) -> bool {
        self.remote_id.is_none()
    }
}

/// Outcome of resolving a module path against the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Deepest node on the path that already existed, `None` for the project root
    pub existing: Option<NodeId>,
    /// Nodes appended for the rest of the path, root to leaf
    pub created: Vec<NodeId>,
}

impl Resolution {
    /// Node the path resolved to
    pub fn leaf(&self) -> Option<NodeId> {
        self.created.last().copied().or(self.existing)
    }
}

/// Arena holding every known module of a project
#[derive(Debug, Clone, Default)]
pub struct ModuleTree {
    nodes: Vec<ModuleNode>,
    roots: Vec<NodeId>,
}

impl ModuleTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the tree from the nested listing returned by the remote API
    pub fn from_remote(modules: Vec<RemoteModule>) -> Self {
        let mut tree = Self::new();
        let mut stack: Vec<(Option<NodeId>, RemoteModule)> =
            modules.into_iter().rev().map(|m| (None, m)).collect();

        while let Some((parent, module)) = stack.pop() {
            let id = tree.insert(parent, module.name, Some(module.id));
            stack.extend(module.children.into_iter().rev().map(|c| (Some(id), c)));
        }

        tree
    }

    /// Appends a node that does not exist remotely yet
    pub fn push_pending(&mut self, parent: Option<NodeId>, name: impl Into<String>) -> NodeId {
        self.insert(parent, name.into(), None)
    }

    fn insert(&mut self, parent: Option<NodeId>, name: String, remote_id: Option<u64>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ModuleNode {
            name,
            remote_id,
            parent,
            children: Vec::new(),
        });

        match parent {
            Some(parent) => self.nodes[parent.0].children.push(id),
            None => self.roots.push(id),
        }

        id
    }

    /// Resolves a path of module names, appending pending nodes for the missing tail
    ///
    /// Walks the longest prefix that is already known (remote or pending) and
    /// creates the remainder under it. Resolving the same path twice creates
    /// nothing the second time.
    pub fn resolve<S: AsRef<str>>(&mut self, path: &[S]) -> Result<Resolution> {
        if path.is_empty() {
            return Err(ZigZagError::required_property("module path is empty"));
        }

        if path.iter().any(|name| name.as_ref().trim().is_empty()) {
            return Err(ZigZagError::required_property(
                "module path contains an empty segment",
            ));
        }

        let mut current = None;
        let mut segments = path.iter().map(AsRef::as_ref).peekable();

        while let Some(child) = segments.peek().and_then(|name| self.find_child(current, name)) {
            current = Some(child);
            segments.next();
        }

        let existing = current;
        let mut created = Vec::new();
        for name in segments {
            let id = self.push_pending(current, name);
            created.push(id);
            current = Some(id);
        }

        Ok(Resolution { existing, created })
    }

    pub fn node(&self, id: NodeId) -> Option<&ModuleNode> {
        self.nodes.get(id.0)
    }

    /// Finds a direct child by exact, case-sensitive name
    ///
    /// When several siblings share a name the first one wins.
    pub fn find_child(&self, parent: Option<NodeId>, name: &str) -> Option<NodeId> {
        let children = match parent {
            Some(parent) => &self.node(parent)?.children,
            None => &self.roots,
        };

        children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Slash-joined path from the root down to `id`
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            let Some(node) = self.node(node_id) else {
                break;
            };
            segments.push(node.name.as_str());
            current = node.parent;
        }

        segments.reverse();
        segments.join("/")
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
