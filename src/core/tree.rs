//! Interval binary search tree
//!
//! Nodes are stored in a `Vec`-based arena owned by the tree and linked by
//! [`NodeId`] indices, so the parent back-reference never owns anything.
//!
//! # Balancing
//!
//! This is a plain, unbalanced binary search tree. Every node carries a
//! red/black [`Color`] tag and the tree offers [`IntervalTree::rotate_left`]
//! and [`IntervalTree::rotate_right`], but [`IntervalTree::insert`] never
//! rebalances: the tag is set to [`Color::Red`] and left alone. Tree depth
//! therefore depends on insertion order and is not bounded by `O(log n)`.
//!
//! # Ordering
//!
//! When a node is inserted, the descent compares it against each visited node:
//!
//! 1. `node.end <= current.start`: go left
//! 2. else `node.start >= current.end`: go right
//! 3. else (overlap) go left iff `node.center < current.center`
//!
//! # Search
//!
//! [`IntervalTree::search`] follows a single branch per level (left iff
//! `point < current.center`). Among overlapping stored intervals some can sit
//! on the side the descent does not take, so results are complete only when
//! the stored intervals are pairwise disjoint.

use crate::core::error::IntervalError;
use crate::core::interval::Interval;

/// Index into a tree's node arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Annotation level a node represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Leaf feature (exon, CDS, UTR, ...); never has a composition
    Element,
    /// Composition holds the transcript's elements
    Transcript,
    /// Composition holds the gene's transcripts
    Gene,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Element => write!(f, "element"),
            NodeKind::Transcript => write!(f, "transcript"),
            NodeKind::Gene => write!(f, "gene"),
        }
    }
}

/// Red-black balance tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    Red,
    #[default]
    Black,
}

/// Which child slot a descent step takes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// A node of an [`IntervalTree`]
///
/// Elements, transcripts and genes share this shape; they differ only in
/// [`NodeKind`] and in what the optional composition tree contains.
#[derive(Debug, Clone)]
pub struct IntervalNode {
    interval: Interval,
    center: u64,
    identity: String,
    kind: NodeKind,
    composition: Option<IntervalTree>,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

impl IntervalNode {
    /// Build a detached node
    ///
    /// Fails with [`IntervalError::InvalidRange`] when `start > end`.
    pub fn new(
        start: u64,
        end: u64,
        identity: impl Into<String>,
        kind: NodeKind,
        composition: Option<IntervalTree>,
    ) -> Result<Self, IntervalError> {
        let interval = Interval::new(start, end)?;
        Ok(Self::from_interval(interval, identity, kind, composition))
    }

    fn from_interval(
        interval: Interval,
        identity: impl Into<String>,
        kind: NodeKind,
        composition: Option<IntervalTree>,
    ) -> Self {
        Self {
            interval,
            center: interval.center(),
            identity: identity.into(),
            kind,
            composition,
            color: Color::default(),
            parent: None,
            left: None,
            right: None,
        }
    }

    /// Leaf node named after its feature kind
    pub fn element(interval: Interval, name: impl Into<String>) -> Self {
        Self::from_interval(interval, name, NodeKind::Element, None)
    }

    /// Transcript node owning the tree of its elements
    pub fn transcript(interval: Interval, transcript_id: impl Into<String>, elements: IntervalTree) -> Self {
        Self::from_interval(interval, transcript_id, NodeKind::Transcript, Some(elements))
    }

    /// Gene node owning the tree of its transcripts
    pub fn gene(interval: Interval, gene_id: impl Into<String>, transcripts: IntervalTree) -> Self {
        Self::from_interval(interval, gene_id, NodeKind::Gene, Some(transcripts))
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn start(&self) -> u64 {
        self.interval.start
    }

    pub fn end(&self) -> u64 {
        self.interval.end
    }

    pub fn center(&self) -> u64 {
        self.center
    }

    /// Element kind name, transcript id or gene id
    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Child tree (transcripts of a gene, elements of a transcript)
    pub fn composition(&self) -> Option<&IntervalTree> {
        self.composition.as_ref()
    }

    pub fn balance_tag(&self) -> Color {
        self.color
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn left(&self) -> Option<NodeId> {
        self.left
    }

    pub fn right(&self) -> Option<NodeId> {
        self.right
    }

    /// Inclusive containment of a point
    pub fn contains(&self, point: u64) -> bool {
        self.interval.contains(point)
    }

    /// Side of `current` that a descent inserting `self` takes
    fn side_of(&self, current: &IntervalNode) -> Side {
        if self.end() <= current.start() {
            Side::Left
        } else if self.start() >= current.end() {
            Side::Right
        } else if self.center < current.center {
            Side::Left
        } else {
            Side::Right
        }
    }
}

/// Unbalanced interval binary search tree
///
/// The tree exclusively owns every node reachable from its root; nested
/// trees live inside node compositions.
#[derive(Debug, Clone, Default)]
pub struct IntervalTree {
    nodes: Vec<IntervalNode>,
    root: Option<NodeId>,
}

impl IntervalTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert every node in order into a fresh tree
    pub fn from_nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = IntervalNode>,
    {
        let iter = nodes.into_iter();
        let mut tree = Self {
            nodes: Vec::with_capacity(iter.size_hint().0),
            root: None,
        };
        for node in iter {
            tree.insert(node);
        }
        tree
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Number of nodes in this tree (nested compositions not counted)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Node by id
    ///
    /// Panics if `id` did not come from this tree.
    pub fn node(&self, id: NodeId) -> &IntervalNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: NodeId) -> Option<&IntervalNode> {
        self.nodes.get(id.index())
    }

    fn node_mut(&mut self, id: NodeId) -> &mut IntervalNode {
        &mut self.nodes[id.index()]
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &IntervalNode> {
        self.nodes.iter()
    }

    /// Insert `node` following the ordering rule of this module
    ///
    /// Any links the node carried are discarded. No rebalancing is done.
    pub fn insert(&mut self, mut node: IntervalNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        node.parent = None;
        node.left = None;
        node.right = None;
        node.color = Color::Red;

        let mut attach: Option<(NodeId, Side)> = None;
        let mut cursor = self.root;
        while let Some(current) = cursor {
            let side = node.side_of(self.node(current));
            attach = Some((current, side));
            cursor = match side {
                Side::Left => self.node(current).left,
                Side::Right => self.node(current).right,
            };
        }

        match attach {
            None => self.root = Some(id),
            Some((parent, side)) => {
                node.parent = Some(parent);
                match side {
                    Side::Left => self.node_mut(parent).left = Some(id),
                    Side::Right => self.node_mut(parent).right = Some(id),
                }
            }
        }
        self.nodes.push(node);
        id
    }

    /// Left rotation around `id`
    ///
    /// Returns the node that took `id`'s place, or `None` (tree unchanged)
    /// when `id` has no right child.
    pub fn rotate_left(&mut self, id: NodeId) -> Option<NodeId> {
        let pivot = self.node(id).right?;

        let inner = self.node(pivot).left;
        self.node_mut(id).right = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(id);
        }

        self.replace_child(id, pivot);

        self.node_mut(pivot).left = Some(id);
        self.node_mut(id).parent = Some(pivot);
        Some(pivot)
    }

    /// Right rotation around `id`
    ///
    /// Returns the node that took `id`'s place, or `None` (tree unchanged)
    /// when `id` has no left child.
    pub fn rotate_right(&mut self, id: NodeId) -> Option<NodeId> {
        let pivot = self.node(id).left?;

        let inner = self.node(pivot).right;
        self.node_mut(id).left = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(id);
        }

        self.replace_child(id, pivot);

        self.node_mut(pivot).right = Some(id);
        self.node_mut(id).parent = Some(pivot);
        Some(pivot)
    }

    /// Point `old`'s parent (or the root) at `new`
    fn replace_child(&mut self, old: NodeId, new: NodeId) {
        let parent = self.node(old).parent;
        self.node_mut(new).parent = parent;
        match parent {
            None => self.root = Some(new),
            Some(p) => {
                if self.node(p).left == Some(old) {
                    self.node_mut(p).left = Some(new);
                } else {
                    self.node_mut(p).right = Some(new);
                }
            }
        }
    }

    /// Nodes whose interval contains `point`, searching from the root
    ///
    /// Single-branch descent; see the module docs for when this can miss
    /// overlapping intervals. An empty tree yields an empty result.
    pub fn search(&self, point: u64) -> Vec<&IntervalNode> {
        self.search_from(self.root, point)
    }

    /// Same as [`search`](Self::search) starting at an arbitrary subtree
    pub fn search_from(&self, start: Option<NodeId>, point: u64) -> Vec<&IntervalNode> {
        let mut hits = Vec::new();
        let mut cursor = start;
        while let Some(id) = cursor {
            let node = self.node(id);
            if node.contains(point) {
                hits.push(node);
            }
            cursor = if point < node.center {
                node.left
            } else {
                node.right
            };
        }
        hits
    }

    /// In-order traversal
    pub fn iter(&self) -> InOrder<'_> {
        InOrder {
            tree: self,
            stack: Vec::new(),
            cursor: self.root,
        }
    }

    /// Number of nodes on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(NodeId, usize)> = self.root.map(|r| (r, 1)).into_iter().collect();
        while let Some((id, level)) = stack.pop() {
            deepest = deepest.max(level);
            let node = self.node(id);
            if let Some(l) = node.left {
                stack.push((l, level + 1));
            }
            if let Some(r) = node.right {
                stack.push((r, level + 1));
            }
        }
        deepest
    }

    /// Check parent/child links and that every node sits on the side of each
    /// ancestor the insertion rule would pick
    ///
    /// Holds for trees built with [`insert`](Self::insert) alone; rotations
    /// keep in-order position but may break the overlap tie-break.
    pub fn is_consistent(&self) -> bool {
        for (idx, node) in self.nodes.iter().enumerate() {
            let id = NodeId(idx as u32);
            for child in [node.left, node.right].into_iter().flatten() {
                if self.node(child).parent != Some(id) {
                    return false;
                }
            }

            let mut child = id;
            while let Some(parent) = self.node(child).parent {
                let side = if self.node(parent).left == Some(child) {
                    Side::Left
                } else if self.node(parent).right == Some(child) {
                    Side::Right
                } else {
                    return false;
                };
                if node.side_of(self.node(parent)) != side {
                    return false;
                }
                child = parent;
            }
            if Some(child) != self.root {
                return false;
            }
        }
        true
    }
}

/// In-order iterator over an [`IntervalTree`]
pub struct InOrder<'a> {
    tree: &'a IntervalTree,
    stack: Vec<NodeId>,
    cursor: Option<NodeId>,
}

impl<'a> Iterator for InOrder<'a> {
    type Item = &'a IntervalNode;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(id) = self.cursor {
            self.stack.push(id);
            self.cursor = self.tree.node(id).left;
        }
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.cursor = node.right;
        Some(node)
    }
}
