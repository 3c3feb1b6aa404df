// regparse_types.rs - AST node types, node flags, and parse environment.

use bitflags::bitflags;
use smallvec::SmallVec;

use crate::regint::*;

// === Node ===

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorType {
    /// `^`: start of the subject.
    Start,
    /// `$`: end of the subject.
    End,
    WordBoundary,
    NotWordBoundary,
}

/// Parsed pattern tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Node {
    /// Exactly one byte from the set.
    Bytes(BitSet),
    /// Concatenation; an empty list matches the empty string.
    List(Vec<Node>),
    /// Alternation, earlier branches preferred.
    Alt(Vec<Node>),
    Capture {
        group: u32,
        body: Box<Node>,
    },
    Quant {
        body: Box<Node>,
        lower: u32,
        /// `INFINITE_REPEAT` for no upper bound.
        upper: u32,
        greedy: bool,
    },
    Anchor(AnchorType),
    BackRef(u32),
    Look {
        negative: bool,
        body: Box<Node>,
    },
}

impl Node {
    pub fn empty() -> Node {
        Node::List(Vec::new())
    }

    pub fn byte(b: u8) -> Node {
        let mut bs = BITSET_EMPTY;
        bitset_set_bit(&mut bs, b as usize);
        Node::Bytes(bs)
    }

    pub fn is_empty_list(&self) -> bool {
        matches!(self, Node::List(items) if items.is_empty())
    }
}

// === Node flags ===

bitflags! {
    /// Summary of what a subtree contains.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u32 {
        const CAPTURE = 1 << 0;
        const BACKREF = 1 << 1;
        const ANCHOR = 1 << 2;
        const LOOK = 1 << 3;
        /// The subtree can succeed without consuming input.
        const MAY_BE_EMPTY = 1 << 4;
    }
}

impl NodeFlags {
    /// Constructs the search-only engine rejects.
    pub const NOT_REGULAR: NodeFlags = NodeFlags::CAPTURE
        .union(NodeFlags::BACKREF)
        .union(NodeFlags::ANCHOR)
        .union(NodeFlags::LOOK);
}

pub fn node_flags(node: &Node) -> NodeFlags {
    match node {
        Node::Bytes(_) => NodeFlags::empty(),
        Node::List(items) => {
            let mut flags = NodeFlags::MAY_BE_EMPTY;
            for item in items {
                let f = node_flags(item);
                if !f.contains(NodeFlags::MAY_BE_EMPTY) {
                    flags.remove(NodeFlags::MAY_BE_EMPTY);
                }
                flags |= f.difference(NodeFlags::MAY_BE_EMPTY);
            }
            flags
        }
        Node::Alt(branches) => {
            let mut flags = NodeFlags::empty();
            for b in branches {
                flags |= node_flags(b);
            }
            flags
        }
        Node::Capture { body, .. } => node_flags(body) | NodeFlags::CAPTURE,
        Node::Quant { body, lower, .. } => {
            let mut flags = node_flags(body);
            if *lower == 0 {
                flags |= NodeFlags::MAY_BE_EMPTY;
            }
            flags
        }
        Node::Anchor(_) => NodeFlags::ANCHOR | NodeFlags::MAY_BE_EMPTY,
        Node::BackRef(_) => NodeFlags::BACKREF | NodeFlags::MAY_BE_EMPTY,
        Node::Look { body, .. } => node_flags(body) | NodeFlags::LOOK | NodeFlags::MAY_BE_EMPTY,
    }
}

/// Group numbers captured inside `node`, in pattern order.
pub fn collect_groups(node: &Node, out: &mut Vec<u32>) {
    match node {
        Node::Bytes(_) | Node::Anchor(_) | Node::BackRef(_) => {}
        Node::List(items) | Node::Alt(items) => {
            for item in items {
                collect_groups(item, out);
            }
        }
        Node::Capture { group, body } => {
            out.push(*group);
            collect_groups(body, out);
        }
        Node::Quant { body, .. } | Node::Look { body, .. } => collect_groups(body, out),
    }
}

// === GroupSet (which capture groups are closed) ===

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GroupSet {
    words: SmallVec<[u64; 2]>,
}

impl GroupSet {
    pub fn new() -> Self {
        GroupSet::default()
    }

    pub fn on(&mut self, n: u32) {
        let w = (n / 64) as usize;
        if self.words.len() <= w {
            self.words.resize(w + 1, 0);
        }
        self.words[w] |= 1u64 << (n % 64);
    }

    pub fn at(&self, n: u32) -> bool {
        let w = (n / 64) as usize;
        self.words
            .get(w)
            .map_or(false, |word| word & (1u64 << (n % 64)) != 0)
    }

    pub fn union_with(&mut self, other: &GroupSet) {
        if self.words.len() < other.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        for (d, s) in self.words.iter_mut().zip(other.words.iter()) {
            *d |= *s;
        }
    }
}

// === Parse Environment ===

pub struct ParseEnv {
    /// Capture groups opened so far (group 0 excluded).
    pub num_captures: u32,
    /// Groups closed on every path reaching the current position.
    pub visible: GroupSet,
    pub parse_depth: u32,
    pub parse_depth_limit: u32,
    pub capture_limit: u32,
}

impl ParseEnv {
    pub fn new(parse_depth_limit: u32, capture_limit: u32) -> Self {
        ParseEnv {
            num_captures: 0,
            visible: GroupSet::new(),
            parse_depth: 0,
            parse_depth_limit,
            capture_limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_of_empty_list() {
        let f = node_flags(&Node::empty());
        assert_eq!(f, NodeFlags::MAY_BE_EMPTY);
    }

    #[test]
    fn flags_propagate() {
        let node = Node::List(vec![
            Node::byte(b'a'),
            Node::Capture {
                group: 1,
                body: Box::new(Node::Quant {
                    body: Box::new(Node::byte(b'b')),
                    lower: 0,
                    upper: INFINITE_REPEAT,
                    greedy: true,
                }),
            },
        ]);
        let f = node_flags(&node);
        assert!(f.contains(NodeFlags::CAPTURE));
        assert!(!f.contains(NodeFlags::MAY_BE_EMPTY));
        assert!(f.intersects(NodeFlags::NOT_REGULAR));
    }

    #[test]
    fn group_set_grows() {
        let mut set = GroupSet::new();
        assert!(!set.at(3));
        set.on(3);
        set.on(130);
        assert!(set.at(3));
        assert!(set.at(130));
        assert!(!set.at(129));
        let mut other = GroupSet::new();
        other.on(7);
        other.union_with(&set);
        assert!(other.at(7) && other.at(130));
    }

    #[test]
    fn collect_groups_in_order() {
        let node = Node::Alt(vec![
            Node::Capture {
                group: 1,
                body: Box::new(Node::Capture {
                    group: 2,
                    body: Box::new(Node::byte(b'a')),
                }),
            },
            Node::Capture {
                group: 3,
                body: Box::new(Node::byte(b'b')),
            },
        ]);
        let mut out = Vec::new();
        collect_groups(&node, &mut out);
        assert_eq!(out, vec![1, 2, 3]);
    }
}
