// regsearch.rs - Search-only engine.
//
// Patterns without anchors, captures, backreferences or lookaheads compile
// to a single table driven by one forward pass. A search state is the
// ordered list of base-DFA states of the start offsets still alive (earliest
// first, one entry per distinct base state) plus whether a later start has
// already matched. Each transition says which entries survive, whether one
// of them completed a match, and the next search state.
//
// The table holds at most `state_limit` states of at most `SEARCH_MAX_LIVE`
// entries. Transitions leaving it are marked `SEARCH_UNBUILT`; the scanner
// then steps the base DFA once per live start until it reaches a tabled
// state again, so the number of live starts is unbounded.

use std::collections::HashMap;

use log::debug;
use memchr::{memchr, memchr2, memchr3};
use smallvec::SmallVec;

use crate::regcomp::simplify;
use crate::regdef::*;
use crate::regdfa::{dfa_byte_classes, reg_build_dfa};
use crate::regint::*;
use crate::regparse::reg_parse;
use crate::regparse_types::*;

/// Keep-mask bit for the start offset beginning at the current byte.
pub const SEARCH_KEEP_FRESH: u32 = 1 << 31;
/// Most entries a tabled search state may hold.
pub const SEARCH_MAX_LIVE: usize = 31;
/// No match is pending.
pub const SEARCH_NO_MATCH: u8 = 255;
/// The match found earlier is still the best candidate.
pub const SEARCH_KEEP_MATCH: u8 = 254;
/// The start offset beginning at the current byte matched.
pub const SEARCH_FRESH_MATCH: u8 = 253;
/// The target state is not in the table.
pub const SEARCH_UNBUILT: u16 = u16::MAX;

/// One transition of the search table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchNext {
    /// Bit `r` set: entry `r` stays alive. `SEARCH_KEEP_FRESH`: the new
    /// start offset is appended.
    pub keep: u32,
    /// Rank of the entry whose match ends on this byte, or one of
    /// `SEARCH_NO_MATCH`, `SEARCH_KEEP_MATCH`, `SEARCH_FRESH_MATCH`.
    pub matched: u8,
    /// Next state, or `SEARCH_UNBUILT` (then `keep` and `matched` are unused).
    pub next: u16,
}

#[derive(Clone)]
pub struct SearchNode {
    pub next: [SearchNext; CHAR_MAP_SIZE],
    /// Base-DFA state of each live entry, earliest start first.
    pub states: SmallVec<[u32; 8]>,
    pub has_tail: bool,
}

pub(crate) type SearchKey = (SmallVec<[u32; 8]>, bool);

/// A compiled search-only pattern. Immutable, so it can be shared.
pub struct SearchType {
    pub nodes: Vec<SearchNode>,
    /// Anchored DFA of the pattern, stepped directly off the table.
    pub dfa: Dfa,
    pub(crate) ids: HashMap<SearchKey, u16>,
    /// The empty string matches, so every search succeeds at its start.
    pub accept_empty: bool,
    /// Bytes that can begin a match.
    pub first_bytes: Vec<u8>,
}

/// Advance the ranked entries `list` over `byte`. A fresh start (rank
/// `list.len()`) joins unless a match is pending. Survivors go to `out` as
/// (rank, base state); the return value is the rank whose match ends here.
fn advance(
    dfa: &Dfa,
    list: &[u32],
    pending: bool,
    byte: u8,
    out: &mut SmallVec<[(usize, u32); 8]>,
) -> Option<usize> {
    out.clear();
    let fresh = (!pending).then_some(0u32);
    for (rank, q) in list.iter().copied().chain(fresh).enumerate() {
        let t = dfa.step(q, byte);
        if t & DFA_ACCEPT != 0 {
            // Later entries can only produce later starts.
            return Some(rank);
        }
        let nq = t & !DFA_ACCEPT;
        if nq != DFA_DEAD && !out.iter().any(|&(_, s)| s == nq) {
            out.push((rank, nq));
        }
    }
    None
}

// ============================================================================
// Table construction
// ============================================================================

struct SearchBuilder<'a> {
    dfa: &'a Dfa,
    keys: Vec<SearchKey>,
    ids: HashMap<SearchKey, u16>,
    state_limit: usize,
}

const UNBUILT_NEXT: SearchNext = SearchNext {
    keep: 0,
    matched: SEARCH_NO_MATCH,
    next: SEARCH_UNBUILT,
};

impl<'a> SearchBuilder<'a> {
    fn intern(&mut self, key: SearchKey) -> Option<u16> {
        if let Some(&id) = self.ids.get(&key) {
            return Some(id);
        }
        if self.keys.len() >= self.state_limit {
            return None;
        }
        let id = self.keys.len() as u16;
        self.ids.insert(key.clone(), id);
        self.keys.push(key);
        Some(id)
    }

    fn transition(&mut self, state: usize, byte: u8) -> SearchNext {
        let (list, has_tail) = self.keys[state].clone();
        let mut survivors = SmallVec::new();
        let hit = advance(self.dfa, &list, has_tail, byte, &mut survivors);
        if survivors.len() > SEARCH_MAX_LIVE {
            return UNBUILT_NEXT;
        }

        let fresh = list.len();
        let keep = survivors.iter().fold(0u32, |keep, &(r, _)| {
            keep | if r == fresh { SEARCH_KEEP_FRESH } else { 1 << r }
        });
        let matched = match hit {
            Some(r) if r == fresh => SEARCH_FRESH_MATCH,
            Some(r) => r as u8,
            None if has_tail => SEARCH_KEEP_MATCH,
            None => SEARCH_NO_MATCH,
        };
        let next: SmallVec<[u32; 8]> = survivors.iter().map(|&(_, q)| q).collect();
        match self.intern((next, matched != SEARCH_NO_MATCH)) {
            Some(id) => SearchNext { keep, matched, next: id },
            None => UNBUILT_NEXT,
        }
    }
}

/// Build the search table for a regular tree.
fn build_search_table(dfa: &Dfa, state_limit: usize) -> (Vec<SearchNode>, HashMap<SearchKey, u16>) {
    let (class, reps) = dfa_byte_classes(dfa);
    let mut b = SearchBuilder {
        dfa,
        keys: Vec::new(),
        ids: HashMap::new(),
        state_limit: state_limit.clamp(1, SEARCH_UNBUILT as usize),
    };
    b.intern((SmallVec::new(), false));

    let mut nodes = Vec::new();
    let mut row = Vec::with_capacity(reps.len());
    let mut unbuilt = 0usize;
    let mut i = 0;
    while i < b.keys.len() {
        row.clear();
        for &rep in &reps {
            row.push(b.transition(i, rep));
        }
        unbuilt += row.iter().filter(|r| r.next == SEARCH_UNBUILT).count();
        let mut node = SearchNode {
            next: [UNBUILT_NEXT; CHAR_MAP_SIZE],
            states: b.keys[i].0.clone(),
            has_tail: b.keys[i].1,
        };
        for byte in 0..CHAR_MAP_SIZE {
            node.next[byte] = row[class[byte] as usize];
        }
        nodes.push(node);
        i += 1;
    }
    debug!(
        "search: {} base states, {} byte classes, {} search states, {} unbuilt transitions",
        dfa.num_states(),
        reps.len(),
        nodes.len(),
        unbuilt
    );
    (nodes, b.ids)
}

/// Error code for the first construct a search-only pattern cannot hold.
fn unsupported_code(flags: NodeFlags) -> Option<i32> {
    if !flags.intersects(NodeFlags::NOT_REGULAR) {
        None
    } else if flags.contains(NodeFlags::ANCHOR) {
        Some(ERR_UNSUPPORTED_ANCHOR)
    } else if flags.contains(NodeFlags::CAPTURE) {
        Some(ERR_UNSUPPORTED_CAPTURE)
    } else if flags.contains(NodeFlags::BACKREF) {
        Some(ERR_UNSUPPORTED_BACKREF)
    } else {
        Some(ERR_UNSUPPORTED_LOOKAROUND)
    }
}

/// Compile a search-only pattern. `state_limit` caps the base DFA (beyond
/// it the pattern is `ERR_TOO_COMPLEX`) and the precomputed search table
/// (beyond it the scanner steps the base DFA directly).
pub fn reg_search_new(pattern: &[u8], state_limit: usize) -> Result<SearchType, i32> {
    let (tree, _) = reg_parse(pattern)?;
    if let Some(code) = unsupported_code(node_flags(&tree)) {
        return Err(code);
    }
    let tree = simplify(tree);
    let dfa = reg_build_dfa(&tree, state_limit)?;

    let accept_empty = dfa.init_accepts();
    let first_bytes: Vec<u8> = (0..CHAR_MAP_SIZE)
        .filter(|&b| dfa.step(0, b as u8) != DFA_DEAD)
        .map(|b| b as u8)
        .collect();
    // Every search succeeds immediately, so no table is needed.
    let (nodes, ids) = if accept_empty {
        (Vec::new(), HashMap::new())
    } else {
        build_search_table(&dfa, state_limit)
    };

    Ok(SearchType {
        nodes,
        dfa,
        ids,
        accept_empty,
        first_bytes,
    })
}

// ============================================================================
// Scanner
// ============================================================================

/// Offset of the next byte in `hay` that can begin a match, when the set
/// of such bytes is small enough for memchr.
#[inline]
fn skip_to_first(first: &[u8], hay: &[u8]) -> Option<Option<usize>> {
    match *first {
        [] => Some(None),
        [a] => Some(memchr(a, hay)),
        [a, b] => Some(memchr2(a, b, hay)),
        [a, b, c] => Some(memchr3(a, b, c, hay)),
        _ => None,
    }
}

const OFF_TABLE: usize = usize::MAX;

/// Leftmost start offset in `from..to` of a match ending at or before `to`.
/// Returns the offset, `REG_MISMATCH`, or `ERR_INVALID_ARGUMENT` (range out
/// of bounds or ending past `REG_MAX_SUBJECT_LEN`).
pub fn reg_search_only(sreg: &SearchType, hay: &[u8], from: usize, to: usize) -> i32 {
    if !reg_valid_range(hay.len(), from, to) {
        return ERR_INVALID_ARGUMENT;
    }
    if from == to {
        return REG_MISMATCH;
    }
    if sreg.accept_empty {
        return from as i32;
    }

    let mut state = 0usize;
    let mut starts: SmallVec<[usize; 8]> = SmallVec::new();
    // Base states of `starts` while `state` is `OFF_TABLE`.
    let mut bases: SmallVec<[u32; 8]> = SmallVec::new();
    let mut survivors: SmallVec<[(usize, u32); 8]> = SmallVec::new();
    let mut candidate: Option<usize> = None;
    let mut i = from;
    while i < to {
        if state == 0 {
            if let Some(found) = skip_to_first(&sreg.first_bytes, &hay[i..to]) {
                match found {
                    Some(k) => i += k,
                    None => return REG_MISMATCH,
                }
            }
        }

        if state == OFF_TABLE {
            let hit = advance(&sreg.dfa, &bases, candidate.is_some(), hay[i], &mut survivors);
            let start_of = |r: usize| starts.get(r).copied().unwrap_or(i);
            if let Some(r) = hit {
                candidate = Some(start_of(r));
            }
            let next_starts: SmallVec<[usize; 8]> =
                survivors.iter().map(|&(r, _)| start_of(r)).collect();
            starts = next_starts;
            let key: SearchKey = (
                survivors.iter().map(|&(_, q)| q).collect(),
                candidate.is_some(),
            );
            if let Some(&id) = sreg.ids.get(&key) {
                state = id as usize;
            }
            bases = key.0;
        } else {
            let Some(node) = sreg.nodes.get(state) else {
                return ERR_UNDEFINED_INSN;
            };
            let rec = node.next[hay[i] as usize];
            if rec.next == SEARCH_UNBUILT {
                bases.clone_from(&node.states);
                state = OFF_TABLE;
                continue;
            }
            match rec.matched {
                SEARCH_NO_MATCH | SEARCH_KEEP_MATCH => {}
                SEARCH_FRESH_MATCH => candidate = Some(i),
                r => candidate = starts.get(r as usize).copied(),
            }

            let mut w = 0;
            for r in 0..starts.len() {
                if rec.keep & (1u32 << r) != 0 {
                    starts[w] = starts[r];
                    w += 1;
                }
            }
            starts.truncate(w);
            if rec.keep & SEARCH_KEEP_FRESH != 0 {
                starts.push(i);
            }
            state = rec.next as usize;
        }

        i += 1;
        if starts.is_empty() {
            if let Some(c) = candidate {
                return c as i32;
            }
        }
    }
    match candidate {
        Some(c) => c as i32,
        None => REG_MISMATCH,
    }
}
