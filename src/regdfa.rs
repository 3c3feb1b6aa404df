// regdfa.rs - DFA construction for regular subtrees.
//
// Thompson NFA → byte-class partition → subset construction → merging of
// states whose 256-entry rows are identical. Acceptance is carried on the
// transition (`DFA_ACCEPT`), so a state is identified by its NFA byte
// states alone.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use log::debug;

use crate::regdef::*;
use crate::regint::*;
use crate::regparse_types::*;

const NFA_STATE_LIMIT: usize = 1 << 18;
const NFA_PLACEHOLDER: u32 = u32::MAX;

// ============================================================================
// NFA
// ============================================================================

#[derive(Clone, Copy, Debug)]
enum NfaState {
    Byte { set: u32, next: u32 },
    Split(u32, u32),
    Match,
}

struct Nfa {
    states: Vec<NfaState>,
    sets: Vec<BitSet>,
    set_ids: HashMap<BitSet, u32>,
}

impl Nfa {
    fn new() -> Self {
        Nfa {
            states: Vec::new(),
            sets: Vec::new(),
            set_ids: HashMap::new(),
        }
    }

    fn push(&mut self, s: NfaState) -> Result<u32, i32> {
        if self.states.len() >= NFA_STATE_LIMIT {
            return Err(ERR_TOO_COMPLEX);
        }
        self.states.push(s);
        Ok((self.states.len() - 1) as u32)
    }

    fn intern(&mut self, bs: &BitSet) -> u32 {
        match self.set_ids.entry(*bs) {
            Entry::Occupied(e) => *e.get(),
            Entry::Vacant(e) => {
                self.sets.push(*bs);
                *e.insert((self.sets.len() - 1) as u32)
            }
        }
    }

    /// Build `node` so that it continues into `next`; returns its entry.
    fn build(&mut self, node: &Node, next: u32) -> Result<u32, i32> {
        match node {
            Node::Bytes(bs) => {
                let set = self.intern(bs);
                self.push(NfaState::Byte { set, next })
            }
            Node::List(items) => {
                let mut cur = next;
                for item in items.iter().rev() {
                    cur = self.build(item, cur)?;
                }
                Ok(cur)
            }
            Node::Alt(branches) => {
                let Some((last, rest)) = branches.split_last() else {
                    return Ok(next);
                };
                let mut cur = self.build(last, next)?;
                for b in rest.iter().rev() {
                    let entry = self.build(b, next)?;
                    cur = self.push(NfaState::Split(entry, cur))?;
                }
                Ok(cur)
            }
            Node::Quant {
                body, lower, upper, ..
            } => {
                let mut cur = next;
                if is_infinite_repeat(*upper) {
                    let head = self.push(NfaState::Split(NFA_PLACEHOLDER, next))?;
                    let entry = self.build(body, head)?;
                    self.states[head as usize] = NfaState::Split(entry, next);
                    cur = head;
                } else {
                    for _ in 0..(*upper - *lower) {
                        let entry = self.build(body, cur)?;
                        cur = self.push(NfaState::Split(entry, next))?;
                    }
                }
                for _ in 0..*lower {
                    cur = self.build(body, cur)?;
                }
                Ok(cur)
            }
            Node::Capture { .. } | Node::Anchor(_) | Node::BackRef(_) | Node::Look { .. } => {
                Err(ERR_PARSER_BUG)
            }
        }
    }

    /// Byte states reachable from `starts` through splits, sorted, plus
    /// whether the match state is reachable.
    fn closure(&self, starts: &[u32], mark: &mut [u32], gen: u32, out: &mut Vec<u32>) -> bool {
        out.clear();
        let mut is_match = false;
        let mut stack: Vec<u32> = starts.to_vec();
        while let Some(s) = stack.pop() {
            if mark[s as usize] == gen {
                continue;
            }
            mark[s as usize] = gen;
            match self.states[s as usize] {
                NfaState::Byte { .. } => out.push(s),
                NfaState::Split(a, b) => {
                    stack.push(b);
                    stack.push(a);
                }
                NfaState::Match => is_match = true,
            }
        }
        out.sort_unstable();
        is_match
    }
}

// ============================================================================
// Byte classes
// ============================================================================

/// Partition of the byte values into classes no set distinguishes.
/// Returns the class of every byte and the number of classes.
pub fn byte_classes(sets: &[BitSet]) -> ([u8; CHAR_MAP_SIZE], usize) {
    let mut class = [0u8; CHAR_MAP_SIZE];
    let mut n = 1;
    for set in sets {
        let mut remap = [[u16::MAX; 2]; CHAR_MAP_SIZE];
        let mut count = 0usize;
        let mut refined = [0u8; CHAR_MAP_SIZE];
        for b in 0..CHAR_MAP_SIZE {
            let slot = &mut remap[class[b] as usize][bitset_at(set, b) as usize];
            if *slot == u16::MAX {
                *slot = count as u16;
                count += 1;
            }
            refined[b] = *slot as u8;
        }
        class = refined;
        n = count;
    }
    (class, n)
}

/// First byte of every class.
fn class_representatives(class: &[u8; CHAR_MAP_SIZE], n: usize) -> Vec<u8> {
    let mut reps = vec![0u8; n];
    let mut seen = vec![false; n];
    for b in 0..CHAR_MAP_SIZE {
        let c = class[b] as usize;
        if !seen[c] {
            seen[c] = true;
            reps[c] = b as u8;
        }
    }
    reps
}

/// Classes of bytes whose columns are identical in `dfa`.
pub fn dfa_byte_classes(dfa: &Dfa) -> ([u8; CHAR_MAP_SIZE], Vec<u8>) {
    let mut ids: HashMap<Vec<u32>, u8> = HashMap::new();
    let mut class = [0u8; CHAR_MAP_SIZE];
    for b in 0..CHAR_MAP_SIZE {
        let column: Vec<u32> = dfa.nodes.iter().map(|n| n.next[b]).collect();
        let next_id = ids.len() as u8;
        class[b] = *ids.entry(column).or_insert(next_id);
    }
    let reps = class_representatives(&class, ids.len());
    (class, reps)
}

// ============================================================================
// Subset construction
// ============================================================================

/// Compile a regular subtree (bytes, lists, alternations, quantifiers)
/// into a DFA with at most `state_limit` states.
pub fn reg_build_dfa(node: &Node, state_limit: usize) -> Result<Dfa, i32> {
    let mut nfa = Nfa::new();
    let accept = nfa.push(NfaState::Match)?;
    let start = nfa.build(node, accept)?;

    let (class, nclass) = byte_classes(&nfa.sets);
    let reps = class_representatives(&class, nclass);

    let mut mark = vec![0u32; nfa.states.len()];
    let mut gen = 1u32;
    let mut set_buf = Vec::new();
    let init_match = nfa.closure(&[start], &mut mark, gen, &mut set_buf);

    let mut ids: HashMap<Vec<u32>, u32> = HashMap::new();
    let mut keys: Vec<Vec<u32>> = vec![set_buf.clone()];
    ids.insert(set_buf.clone(), 0);
    let mut rows: Vec<Vec<u32>> = Vec::new();
    let mut targets: Vec<u32> = Vec::new();

    let mut i = 0;
    while i < keys.len() {
        let mut row = Vec::with_capacity(nclass);
        for &b in &reps {
            targets.clear();
            for &s in &keys[i] {
                if let NfaState::Byte { set, next } = nfa.states[s as usize] {
                    if bitset_at(&nfa.sets[set as usize], b as usize) {
                        targets.push(next);
                    }
                }
            }
            gen += 1;
            let is_match = nfa.closure(&targets, &mut mark, gen, &mut set_buf);
            let accept_bit = if is_match { DFA_ACCEPT } else { 0 };
            if set_buf.is_empty() {
                row.push(DFA_DEAD | accept_bit);
                continue;
            }
            let id = match ids.get(&set_buf) {
                Some(&id) => id,
                None => {
                    if keys.len() >= state_limit {
                        debug!("dfa: state limit {} reached", state_limit);
                        return Err(ERR_TOO_COMPLEX);
                    }
                    let id = keys.len() as u32;
                    ids.insert(set_buf.clone(), id);
                    keys.push(set_buf.clone());
                    id
                }
            };
            row.push(id | accept_bit);
        }
        rows.push(row);
        i += 1;
    }

    let mut nodes: Vec<DfaNode> = rows
        .iter()
        .map(|row| {
            let mut node = DfaNode::dead();
            for b in 0..CHAR_MAP_SIZE {
                node.next[b] = row[class[b] as usize];
            }
            node
        })
        .collect();
    let before = nodes.len();
    merge_identical_rows(&mut nodes);
    debug!(
        "dfa: {} nfa states, {} byte classes, {} dfa states ({} after merge)",
        nfa.states.len(),
        nclass,
        before,
        nodes.len()
    );

    Ok(Dfa {
        nodes,
        init_state: if init_match { DFA_ACCEPT } else { 0 },
    })
}

/// Merge states with identical transition rows until none remain.
/// State 0 always survives as the start state.
fn merge_identical_rows(nodes: &mut Vec<DfaNode>) {
    loop {
        let n = nodes.len();
        let mut canon: Vec<u32> = (0..n as u32).collect();
        let mut seen: HashMap<[u32; CHAR_MAP_SIZE], u32> = HashMap::with_capacity(n);
        let mut merged = false;
        for (i, node) in nodes.iter().enumerate() {
            match seen.entry(node.next) {
                Entry::Occupied(e) => {
                    canon[i] = *e.get();
                    merged = true;
                }
                Entry::Vacant(e) => {
                    e.insert(i as u32);
                }
            }
        }
        if !merged {
            return;
        }

        let mut new_index = vec![0u32; n];
        let mut kept = Vec::new();
        for i in 0..n {
            if canon[i] == i as u32 {
                new_index[i] = kept.len() as u32;
                kept.push(i);
            }
        }
        for i in 0..n {
            new_index[i] = new_index[canon[i] as usize];
        }

        let mut compact = Vec::with_capacity(kept.len());
        for &i in &kept {
            let mut node = nodes[i].clone();
            for v in node.next.iter_mut() {
                let target = *v & !DFA_ACCEPT;
                if target != DFA_DEAD {
                    *v = new_index[target as usize] | (*v & DFA_ACCEPT);
                }
            }
            compact.push(node);
        }
        *nodes = compact;
    }
}
