// regint.rs - Internal types.
// Insn, BitSet, Dfa, the compiled program (RegexType).

use std::cell::RefCell;

use crate::regexec::MatchScratch;

// === Config Constants ===
pub const INIT_MATCH_STACK_SIZE: usize = 16;
pub const CHAR_MAP_SIZE: usize = 256;
pub const INFINITE_REPEAT: u32 = u32::MAX;

#[inline]
pub fn is_infinite_repeat(n: u32) -> bool {
    n == INFINITE_REPEAT
}

// === BitSet (256 bits, one per byte value) ===
pub const BITS_IN_ROOM: usize = 32;
pub const BITSET_REAL_SIZE: usize = CHAR_MAP_SIZE / BITS_IN_ROOM;
pub type Bits = u32;
pub type BitSet = [Bits; BITSET_REAL_SIZE];

pub const BITSET_EMPTY: BitSet = [0; BITSET_REAL_SIZE];
pub const BITSET_FULL: BitSet = [!0; BITSET_REAL_SIZE];

#[inline]
pub fn bs_room(pos: usize) -> usize {
    pos >> 5
}

#[inline]
pub fn bs_bit(pos: usize) -> u32 {
    1u32 << (pos & 0x1f)
}

#[inline]
pub fn bitset_at(bs: &BitSet, pos: usize) -> bool {
    (bs[bs_room(pos)] & bs_bit(pos)) != 0
}

#[inline]
pub fn bitset_set_bit(bs: &mut BitSet, pos: usize) {
    bs[bs_room(pos)] |= bs_bit(pos);
}

pub fn bitset_set_range(bs: &mut BitSet, from: u8, to: u8) {
    for b in from..=to {
        bitset_set_bit(bs, b as usize);
    }
}

pub fn bitset_invert(bs: &mut BitSet) {
    for room in bs.iter_mut() {
        *room = !*room;
    }
}

pub fn bitset_or(dest: &mut BitSet, bs: &BitSet) {
    for (d, s) in dest.iter_mut().zip(bs.iter()) {
        *d |= *s;
    }
}

pub fn bitset_is_empty(bs: &BitSet) -> bool {
    bs.iter().all(|&r| r == 0)
}

pub fn bitset_count(bs: &BitSet) -> u32 {
    bs.iter().map(|r| r.count_ones()).sum()
}

/// The only byte of a one-element set.
pub fn bitset_single(bs: &BitSet) -> Option<u8> {
    if bitset_count(bs) != 1 {
        return None;
    }
    bitset_iter(bs).next()
}

pub fn bitset_iter(bs: &BitSet) -> impl Iterator<Item = u8> + '_ {
    (0..CHAR_MAP_SIZE).filter(move |&b| bitset_at(bs, b)).map(|b| b as u8)
}

pub fn bitset_from_bytes(bytes: &[u8]) -> BitSet {
    let mut bs = BITSET_EMPTY;
    for &b in bytes {
        bitset_set_bit(&mut bs, b as usize);
    }
    bs
}

/// Inclusive byte ranges covered by the set, ascending.
pub fn bitset_ranges(bs: &BitSet) -> Vec<(u8, u8)> {
    let mut out: Vec<(u8, u8)> = Vec::new();
    for b in bitset_iter(bs) {
        match out.last_mut() {
            Some((_, hi)) if *hi as usize + 1 == b as usize => *hi = b,
            _ => out.push((b, b)),
        }
    }
    out
}

// === Byte classification ===

#[inline]
pub fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// `\s`: ASCII whitespace including vertical tab.
#[inline]
pub fn is_space_byte(b: u8) -> bool {
    matches!(b, b'\t' | b'\n' | 0x0b | 0x0c | b'\r' | b' ')
}

pub fn bitset_word() -> BitSet {
    let mut bs = BITSET_EMPTY;
    bitset_set_range(&mut bs, b'a', b'z');
    bitset_set_range(&mut bs, b'A', b'Z');
    bitset_set_range(&mut bs, b'0', b'9');
    bitset_set_bit(&mut bs, b'_' as usize);
    bs
}

pub fn bitset_digit() -> BitSet {
    let mut bs = BITSET_EMPTY;
    bitset_set_range(&mut bs, b'0', b'9');
    bs
}

pub fn bitset_space() -> BitSet {
    bitset_from_bytes(b"\t\n\x0b\x0c\r ")
}

/// `.`: everything except the line terminators.
pub fn bitset_anychar() -> BitSet {
    let mut bs = BITSET_FULL;
    bs[bs_room(b'\n' as usize)] &= !bs_bit(b'\n' as usize);
    bs[bs_room(b'\r' as usize)] &= !bs_bit(b'\r' as usize);
    bs
}

// === Instructions ===

/// One VM instruction. The operand, where present, is an instruction
/// index, a byte-class index, a DFA index, a group number or a loop slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Insn {
    /// Continue at the operand.
    Jump(u32),
    /// End of the whole match, or of a lookahead body.
    Accept,
    /// Try the operand first; on failure continue with the next instruction.
    AltFirst(u32),
    /// Try the next instruction first; on failure continue at the operand.
    AltSecond(u32),
    /// Consume one byte that is a member of byte class `operand`.
    Byte(u32),
    /// Run DFA `operand`, trying its accepting lengths shortest first.
    DfaShortest(u32),
    /// Run DFA `operand`, trying its accepting lengths longest first.
    DfaLongest(u32),
    CaptureStart(u32),
    CaptureEnd(u32),
    /// Mark group `operand` as not participating.
    CaptureDiscard(u32),
    BackRef(u32),
    AssertBoundary,
    AssertNotBoundary,
    AssertStart,
    AssertEnd,
    /// Lookahead; the body follows and ends in `Accept`, the operand is
    /// where matching resumes once the assertion holds.
    LookPositive(u32),
    LookNegative(u32),
    /// Remember the position in loop slot `operand`.
    LoopMark(u32),
    /// Fail if the position still equals loop slot `operand`.
    LoopCheck(u32),
}

impl Insn {
    /// Instruction-index operand, if this instruction has one.
    pub fn target(&self) -> Option<u32> {
        match *self {
            Insn::Jump(t)
            | Insn::AltFirst(t)
            | Insn::AltSecond(t)
            | Insn::LookPositive(t)
            | Insn::LookNegative(t) => Some(t),
            _ => None,
        }
    }

    pub fn with_target(self, t: u32) -> Insn {
        match self {
            Insn::Jump(_) => Insn::Jump(t),
            Insn::AltFirst(_) => Insn::AltFirst(t),
            Insn::AltSecond(_) => Insn::AltSecond(t),
            Insn::LookPositive(_) => Insn::LookPositive(t),
            Insn::LookNegative(_) => Insn::LookNegative(t),
            other => other,
        }
    }

    /// Whether control can fall through to the next instruction.
    pub fn falls_through(&self) -> bool {
        !matches!(self, Insn::Jump(_) | Insn::Accept)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Insn::Jump(_) => "jump",
            Insn::Accept => "accept",
            Insn::AltFirst(_) => "alt-first",
            Insn::AltSecond(_) => "alt-second",
            Insn::Byte(_) => "byte",
            Insn::DfaShortest(_) => "dfa-shortest",
            Insn::DfaLongest(_) => "dfa-longest",
            Insn::CaptureStart(_) => "capture-start",
            Insn::CaptureEnd(_) => "capture-end",
            Insn::CaptureDiscard(_) => "capture-discard",
            Insn::BackRef(_) => "backref",
            Insn::AssertBoundary => "assert-boundary",
            Insn::AssertNotBoundary => "assert-not-boundary",
            Insn::AssertStart => "assert-start",
            Insn::AssertEnd => "assert-end",
            Insn::LookPositive(_) => "lookahead",
            Insn::LookNegative(_) => "lookahead-not",
            Insn::LoopMark(_) => "loop-mark",
            Insn::LoopCheck(_) => "loop-check",
        }
    }
}

// === DFA tables ===

/// Transition flag: the state entered is accepting.
pub const DFA_ACCEPT: u32 = 0x8000_0000;
/// Transition value: no further match is possible.
pub const DFA_DEAD: u32 = 0x7FFF_FFFF;

#[derive(Clone)]
pub struct DfaNode {
    pub next: [u32; CHAR_MAP_SIZE],
}

impl DfaNode {
    pub fn dead() -> Self {
        DfaNode {
            next: [DFA_DEAD; CHAR_MAP_SIZE],
        }
    }
}

/// Deterministic automaton over bytes. State 0 is the start state;
/// `init_state` is `0` or `DFA_ACCEPT` when the empty string matches.
#[derive(Clone)]
pub struct Dfa {
    pub nodes: Vec<DfaNode>,
    pub init_state: u32,
}

impl Dfa {
    #[inline]
    pub fn init_accepts(&self) -> bool {
        self.init_state & DFA_ACCEPT != 0
    }

    #[inline]
    pub fn step(&self, state: u32, byte: u8) -> u32 {
        self.nodes[state as usize].next[byte as usize]
    }

    pub fn num_states(&self) -> usize {
        self.nodes.len()
    }
}

impl std::fmt::Debug for Dfa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dfa")
            .field("states", &self.nodes.len())
            .field("init_state", &self.init_state)
            .finish()
    }
}

// === Compiled program ===

/// A compiled pattern for the backtracking engine.
pub struct RegexType {
    pub insns: Vec<Insn>,
    pub bytes: Vec<BitSet>,
    pub dfas: Vec<Dfa>,
    /// Capture groups including group 0.
    pub num_captures: u32,
    pub num_loops: u32,
    pub required_substrs: Vec<Vec<u8>>,
    pub(crate) scratch: RefCell<MatchScratch>,
}

impl RegexType {
    pub fn new(
        insns: Vec<Insn>,
        bytes: Vec<BitSet>,
        dfas: Vec<Dfa>,
        num_captures: u32,
        num_loops: u32,
    ) -> Self {
        RegexType {
            insns,
            bytes,
            dfas,
            num_captures,
            num_loops,
            required_substrs: Vec::new(),
            scratch: RefCell::new(MatchScratch::new()),
        }
    }
}
