//! Traversal path tracking
//!
//! The shadow tree mirrors the path from the document root to the node a
//! transformer is visiting. It never owns nodes; a frame only records the
//! position and kind of the node at each level, plus the kind it replaced
//! when a transformer swapped it out.

use rstdok_ast::NodeKind;

/// One level of the traversal path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowFrame {
    /// Position in the parent's child list
    pub index: usize,
    /// Kind of the node currently at this position
    pub kind: NodeKind,
    /// Kind of the node this one replaced, if it was swapped
    pub replaced_from: Option<NodeKind>,
}

/// Stack of frames from the document root down to the visited node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShadowTree {
    frames: Vec<ShadowFrame>,
}

impl ShadowTree {
    /// Enter a child node
    pub fn push(&mut self, index: usize, kind: NodeKind) {
        self.frames.push(ShadowFrame {
            index,
            kind,
            replaced_from: None,
        });
    }

    /// Leave the current node (or drop it from the tree)
    pub fn pop(&mut self) -> Option<ShadowFrame> {
        self.frames.pop()
    }

    /// The visited node was replaced by a node of `kind`
    pub fn replace(&mut self, kind: NodeKind) {
        if let Some(frame) = self.frames.last_mut() {
            if frame.kind != kind {
                frame.replaced_from.get_or_insert(frame.kind);
                frame.kind = kind;
            }
        }
    }

    /// Frame of the visited node
    pub fn current(&self) -> Option<&ShadowFrame> {
        self.frames.last()
    }

    /// Number of ancestors plus the visited node
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Every frame from the root down
    pub fn path(&self) -> &[ShadowFrame] {
        &self.frames
    }

    /// Whether any ancestor of the visited node has the given kind
    pub fn within(&self, kind: NodeKind) -> bool {
        let ancestors = self.frames.len().saturating_sub(1);
        self.frames[..ancestors].iter().any(|f| f.kind == kind)
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}
