//! Arena-backed document tree for manifest files.
//!
//! Nodes are stored in a flat `Vec` owned by [`Document`] and addressed by
//! [`NodeId`]. Nodes are never removed, so an id handed out by a document
//! stays valid for that document's whole lifetime.

use crate::write::write;
use thiserror::Error;

/// Indent unit used by [`Document::render`].
pub const DEFAULT_INDENT: &str = "    ";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("node {0} is not an object")]
    NotAnObject(NodeId),
    #[error("node {0} is not a leaf")]
    NotALeaf(NodeId),
    #[error("leaf values must not be empty")]
    EmptyLeaf,
    #[error("field '{0}' already exists in this object")]
    DuplicateField(String),
}

/// Index of a node inside its owning [`Document`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A node is either a string leaf or an object with ordered fields, never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Leaf(String),
    Object(Vec<Field>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub value: NodeId,
}

/// What to put under a new field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewNode<'a> {
    Leaf(&'a str),
    Object,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create a document holding only an empty root object.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Object(Vec::new())],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes in the arena, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields(self.root()).is_empty()
    }

    /// Borrow a node.
    ///
    /// Panics if `id` was produced by a different document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Fields of an object node, or an empty slice for a leaf.
    pub fn fields(&self, id: NodeId) -> &[Field] {
        match self.node(id) {
            Node::Object(fields) => fields,
            Node::Leaf(_) => &[],
        }
    }

    pub fn is_object(&self, id: NodeId) -> bool {
        matches!(self.node(id), Node::Object(_))
    }

    pub fn leaf(&self, id: NodeId) -> Option<&str> {
        match self.node(id) {
            Node::Leaf(value) => Some(value),
            Node::Object(_) => None,
        }
    }

    /// Look up a direct child of `parent` by field name.
    pub fn field(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.fields(parent)
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value)
    }

    /// Follow a chain of field names starting at the root.
    pub fn lookup(&self, path: &[&str]) -> Option<NodeId> {
        path.iter()
            .try_fold(self.root(), |node, name| self.field(node, name))
    }

    /// Replace the value of an existing leaf.
    pub fn set_leaf(&mut self, id: NodeId, value: &str) -> Result<(), DocumentError> {
        if value.is_empty() {
            return Err(DocumentError::EmptyLeaf);
        }
        match &mut self.nodes[id.0] {
            Node::Leaf(current) => {
                value.clone_into(current);
                Ok(())
            }
            Node::Object(_) => Err(DocumentError::NotALeaf(id)),
        }
    }

    /// Append a field to `parent`.
    pub fn push_field(
        &mut self,
        parent: NodeId,
        name: &str,
        node: NewNode<'_>,
    ) -> Result<NodeId, DocumentError> {
        let position = self.fields(parent).len();
        self.insert_field(parent, position, name, node)
    }

    /// Insert a field at `position` among `parent`'s fields.
    ///
    /// `position` is clamped to the current field count. The document is left
    /// unchanged when an error is returned.
    pub fn insert_field(
        &mut self,
        parent: NodeId,
        position: usize,
        name: &str,
        node: NewNode<'_>,
    ) -> Result<NodeId, DocumentError> {
        match self.node(parent) {
            Node::Leaf(_) => return Err(DocumentError::NotAnObject(parent)),
            Node::Object(fields) => {
                if fields.iter().any(|f| f.name == name) {
                    return Err(DocumentError::DuplicateField(name.to_owned()));
                }
            }
        }
        let new = match node {
            NewNode::Leaf("") => return Err(DocumentError::EmptyLeaf),
            NewNode::Leaf(value) => Node::Leaf(value.to_owned()),
            NewNode::Object => Node::Object(Vec::new()),
        };

        let id = NodeId(self.nodes.len());
        self.nodes.push(new);
        if let Node::Object(fields) = &mut self.nodes[parent.0] {
            let position = position.min(fields.len());
            fields.insert(
                position,
                Field {
                    name: name.to_owned(),
                    value: id,
                },
            );
        }
        Ok(id)
    }

    /// Render the whole document as file contents (trailing newline included).
    pub fn render(&self) -> String {
        self.render_with_indent(DEFAULT_INDENT)
    }

    pub fn render_with_indent(&self, indent_unit: &str) -> String {
        let mut text = write(self, self.root(), indent_unit, "");
        text.push('\n');
        text
    }
}
