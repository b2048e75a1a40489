//! Contents Tree, spec §3 "Contents Tree" and §9 "Cyclic graphs and parent
//! back-references": a rooted ordered tree stored as an arena of nodes
//! indexed by integer, with `parent` as an `Option<NodeIndex>` rather than an
//! owned back-reference. This keeps the whole tree in one allocation and
//! sidesteps ownership-cycle concerns entirely.

use chmweb_types::RootPath;
use serde::{Deserialize, Serialize};

pub type NodeIndex = usize;

pub const ROOT: NodeIndex = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Root,
    Folder {
        title: String,
    },
    Page {
        title: Option<String>,
        filename: RootPath,
        anchor: Option<String>,
    },
    ArchivePlaceholder {
        stem: String,
    },
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub parent: Option<NodeIndex>,
    pub children: Vec<NodeIndex>,
}

/// The rooted ordered tree, spec §3 invariants (a)-(d).
#[derive(Debug, Default)]
pub struct ContentsTree {
    nodes: Vec<Node>,
}

impl ContentsTree {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: NodeKind::Root,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    pub fn node(&self, idx: NodeIndex) -> &Node {
        &self.nodes[idx]
    }

    pub fn kind(&self, idx: NodeIndex) -> &NodeKind {
        &self.nodes[idx].kind
    }

    pub fn children(&self, idx: NodeIndex) -> &[NodeIndex] {
        &self.nodes[idx].children
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.nodes[idx].parent
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Appends `kind` as the last child of `parent`. The new node has no
    /// children yet; callers build subtrees top-down, appending each node's
    /// children right after creating it.
    pub fn append_child(&mut self, parent: NodeIndex, kind: NodeKind) -> NodeIndex {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            kind,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    /// The sequence of child indices from the root to `idx` — spec §3
    /// invariant (b). Unattached nodes (no parent, not root) have no path.
    pub fn path(&self, idx: NodeIndex) -> Option<Vec<usize>> {
        if idx == ROOT {
            return Some(Vec::new());
        }
        let parent = self.nodes[idx].parent?;
        let position = self.nodes[parent].children.iter().position(|&c| c == idx)?;
        let mut prefix = self.path(parent)?;
        prefix.push(position);
        Some(prefix)
    }

    /// Child-index lookup, the inverse of `path`: walks `path` down from the
    /// root. Used by tests and by the rewriter's contents-page expansion.
    pub fn node_at(&self, path: &[usize]) -> Option<NodeIndex> {
        let mut cur = ROOT;
        for &step in path {
            cur = *self.nodes[cur].children.get(step)?;
        }
        Some(cur)
    }

    /// Placeholder-replacement protocol, spec §4.6: every node in
    /// `new_roots` must be a freshly built, parentless subtree (built via
    /// `append_child` against a throwaway root, or produced by
    /// `take_detached`); all are spliced into the placeholder's former
    /// position, in order, and the placeholder itself is removed from its
    /// parent's child list (though its arena slot is left in place — other
    /// nodes' indices must never shift).
    pub fn replace(&mut self, placeholder: NodeIndex, new_roots: Vec<NodeIndex>) {
        let parent = self.nodes[placeholder]
            .parent
            .expect("placeholder must have a parent");
        let position = self.nodes[parent]
            .children
            .iter()
            .position(|&c| c == placeholder)
            .expect("placeholder must be a child of its recorded parent");

        self.nodes[parent].children.remove(position);
        for (offset, &root) in new_roots.iter().enumerate() {
            self.nodes[root].parent = Some(parent);
            self.nodes[parent].children.insert(position + offset, root);
        }
        self.nodes[placeholder].parent = None;
    }

    /// Builds a detached subtree in a scratch arena, for callers (the HHC
    /// parser) that need to construct a whole contents fragment before it
    /// has a parent to attach to. Returns the roots in order, renumbered
    /// into `self`'s arena.
    pub fn graft_subtree(&mut self, roots: Vec<DetachedNode>) -> Vec<NodeIndex> {
        roots.into_iter().map(|n| self.graft_one(n)).collect()
    }

    fn graft_one(&mut self, node: DetachedNode) -> NodeIndex {
        let idx = self.nodes.len();
        self.nodes.push(Node {
            kind: node.kind,
            parent: None,
            children: Vec::new(),
        });
        let children: Vec<NodeIndex> = node
            .children
            .into_iter()
            .map(|child| {
                let child_idx = self.graft_one(child);
                self.nodes[child_idx].parent = Some(idx);
                child_idx
            })
            .collect();
        self.nodes[idx].children = children;
        idx
    }

    pub fn walk(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        (0..self.nodes.len()).filter(move |&i| self.path(i).is_some())
    }
}

/// A not-yet-grafted subtree, built bottom-up by the HHC/COL parsers before
/// a real arena index exists for it. Serialisable so a worker process can
/// parse an HHC file and hand the result back across the pool boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetachedNode {
    pub kind: NodeKind,
    pub children: Vec<DetachedNode>,
}

impl DetachedNode {
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder(tree: &mut ContentsTree, parent: NodeIndex, title: &str) -> NodeIndex {
        tree.append_child(
            parent,
            NodeKind::Folder {
                title: title.to_string(),
            },
        )
    }

    fn page(tree: &mut ContentsTree, parent: NodeIndex, name: &str) -> NodeIndex {
        tree.append_child(
            parent,
            NodeKind::Page {
                title: Some(name.to_string()),
                filename: RootPath::new(format!("{name}.htm")),
                anchor: None,
            },
        )
    }

    #[test]
    fn path_reflects_insertion_order() {
        let mut tree = ContentsTree::new();
        let a = page(&mut tree, ROOT, "a");
        let b = page(&mut tree, ROOT, "b");
        assert_eq!(tree.path(a), Some(vec![0]));
        assert_eq!(tree.path(b), Some(vec![1]));
        assert_eq!(tree.node_at(&[1]), Some(b));
    }

    #[test]
    fn unattached_node_has_no_path() {
        let mut tree = ContentsTree::new();
        let detached = tree.graft_subtree(vec![DetachedNode::leaf(NodeKind::Folder {
            title: "orphan".into(),
        })]);
        // Grafted but never attached via `replace`: still parentless.
        assert_eq!(tree.parent(detached[0]), None);
        assert_eq!(tree.path(detached[0]), None);
    }

    #[test]
    fn placeholder_replacement_preserves_prior_sibling_paths() {
        let mut tree = ContentsTree::new();
        let page_a = page(&mut tree, ROOT, "a");
        let placeholder_b = tree.append_child(
            ROOT,
            NodeKind::ArchivePlaceholder {
                stem: "b".to_string(),
            },
        );
        let folder_c = folder(&mut tree, ROOT, "C");
        let c_child = page(&mut tree, folder_c, "c1");

        let folder_b1 = DetachedNode {
            kind: NodeKind::Folder {
                title: "FolderB1".into(),
            },
            children: vec![
                DetachedNode::leaf(NodeKind::Page {
                    title: Some("b1p1".into()),
                    filename: RootPath::new("b1p1.htm"),
                    anchor: None,
                }),
                DetachedNode::leaf(NodeKind::Page {
                    title: Some("b1p2".into()),
                    filename: RootPath::new("b1p2.htm"),
                    anchor: None,
                }),
            ],
        };
        let folder_b2 = DetachedNode::leaf(NodeKind::Folder {
            title: "FolderB2".into(),
        });

        let new_roots = tree.graft_subtree(vec![folder_b1, folder_b2]);
        tree.replace(placeholder_b, new_roots.clone());

        assert_eq!(tree.path(page_a), Some(vec![0]));
        assert_eq!(tree.path(new_roots[0]), Some(vec![1]));
        assert_eq!(tree.path(new_roots[1]), Some(vec![2]));
        assert_eq!(tree.path(folder_c), Some(vec![3]));
        assert_eq!(tree.path(c_child), Some(vec![3, 0]));

        assert_eq!(tree.children(ROOT).len(), 4);
        let b1_pages = tree.children(new_roots[0]);
        assert_eq!(b1_pages.len(), 2);
    }
}
