// regexec.rs - VM executor: match_at, reg_match, reg_search, reg_replace.
//
// Structure: scratch and checkpoint types → checkpoint operations →
// DFA helpers → match_at (instruction dispatch) → reg_match → reg_search →
// reg_replace.

use memchr::memmem;

use crate::regdef::*;
use crate::regint::*;

// ============================================================================
// Checkpoints and per-pattern scratch
// ============================================================================

/// Backtracking stack entry. Choice points resume execution; the `Set*`
/// records restore a slot when backtracking passes them.
#[derive(Clone, Copy, Debug)]
enum Checkpoint {
    /// Untried branch of an alternative.
    Alt { pc: usize, at: usize },
    /// Shortest-first DFA run that can still reach a longer accept.
    DfaShortest {
        pc: usize,
        dfa: u32,
        state: u32,
        at: usize,
    },
    /// Longest-first DFA run; the remaining accepting lengths are the bits
    /// below `len` in the accept arena starting at word `base`.
    DfaLongest {
        pc: usize,
        start: usize,
        len: usize,
        base: usize,
    },
    SetCaptureStart { group: u32, old: Option<usize> },
    SetCaptureEnd {
        group: u32,
        old: Option<(usize, usize)>,
    },
    SetLoop { slot: u32, old: Option<usize> },
    /// Active lookahead. Popping it means the body failed.
    Lookahead {
        negative: bool,
        at: usize,
        resume: usize,
        arena: usize,
    },
}

impl Checkpoint {
    #[inline]
    fn is_restore(&self) -> bool {
        matches!(
            self,
            Checkpoint::SetCaptureStart { .. }
                | Checkpoint::SetCaptureEnd { .. }
                | Checkpoint::SetLoop { .. }
        )
    }
}

/// Matcher state reused across calls on the same pattern.
#[derive(Debug, Default)]
pub struct MatchScratch {
    stack: Vec<Checkpoint>,
    /// Open capture starts.
    pending: Vec<Option<usize>>,
    /// Completed captures; slot 0 is the whole match.
    caps: Vec<Option<(usize, usize)>>,
    loops: Vec<Option<usize>>,
    /// Accepting lengths of longest-first DFA runs, one bit per length.
    dfa_matches: Vec<u64>,
}

impl MatchScratch {
    pub fn new() -> Self {
        MatchScratch {
            stack: Vec::with_capacity(INIT_MATCH_STACK_SIZE),
            ..MatchScratch::default()
        }
    }

    fn reset(&mut self, reg: &RegexType) {
        let n = reg.num_captures as usize;
        self.stack.clear();
        self.pending.clear();
        self.pending.resize(n, None);
        self.caps.clear();
        self.caps.resize(n, None);
        self.loops.clear();
        self.loops.resize(reg.num_loops as usize, None);
        self.dfa_matches.clear();
    }

    fn restore(&mut self, cp: Checkpoint) {
        match cp {
            Checkpoint::SetCaptureStart { group, old } => self.pending[group as usize] = old,
            Checkpoint::SetCaptureEnd { group, old } => self.caps[group as usize] = old,
            Checkpoint::SetLoop { slot, old } => self.loops[slot as usize] = old,
            _ => {}
        }
    }

    fn fill_region(&self, region: &mut Region) {
        for (dst, src) in region.groups.iter_mut().zip(self.caps.iter()) {
            *dst = *src;
        }
    }
}

fn with_scratch<R>(reg: &RegexType, f: impl FnOnce(&mut MatchScratch) -> R) -> R {
    match reg.scratch.try_borrow_mut() {
        Ok(mut ms) => f(&mut ms),
        Err(_) => f(&mut MatchScratch::new()),
    }
}

// ============================================================================
// DFA helpers
// ============================================================================

/// Run `dfa` from `state` at `at` up to its next accepting position.
/// Returns that position and the state to continue from when a longer
/// accept is still reachable.
fn dfa_next_accept(
    dfa: &Dfa,
    hay: &[u8],
    mut state: u32,
    mut at: usize,
    end: usize,
) -> Option<(usize, Option<u32>)> {
    while at < end {
        let t = dfa.step(state, hay[at]);
        at += 1;
        let next = t & !DFA_ACCEPT;
        let live = next != DFA_DEAD;
        if t & DFA_ACCEPT != 0 {
            return Some((at, live.then_some(next)));
        }
        if !live {
            return None;
        }
        state = next;
    }
    None
}

#[inline]
fn arena_set(arena: &mut Vec<u64>, base: usize, k: usize) {
    let w = base + k / 64;
    if arena.len() <= w {
        arena.resize(w + 1, 0);
    }
    arena[w] |= 1u64 << (k % 64);
}

/// Record every accepting length of `dfa` from `start` in the arena at
/// `base` and return the longest.
fn dfa_scan_longest(
    dfa: &Dfa,
    hay: &[u8],
    start: usize,
    end: usize,
    arena: &mut Vec<u64>,
    base: usize,
) -> Option<usize> {
    let mut longest = None;
    if dfa.init_accepts() {
        arena_set(arena, base, 0);
        longest = Some(0);
    }
    let mut state = 0u32;
    let mut at = start;
    while at < end {
        let t = dfa.step(state, hay[at]);
        at += 1;
        if t & DFA_ACCEPT != 0 {
            arena_set(arena, base, at - start);
            longest = Some(at - start);
        }
        state = t & !DFA_ACCEPT;
        if state == DFA_DEAD {
            break;
        }
    }
    longest
}

/// Highest recorded length strictly below `below`.
fn prev_accept(bits: &[u64], below: usize) -> Option<usize> {
    if below == 0 || bits.is_empty() {
        return None;
    }
    let last = below - 1;
    let mut w = last / 64;
    let mut word = if w < bits.len() {
        bits[w] & (u64::MAX >> (63 - last % 64))
    } else {
        w = bits.len() - 1;
        bits[w]
    };
    loop {
        if word != 0 {
            return Some(w * 64 + 63 - word.leading_zeros() as usize);
        }
        if w == 0 {
            return None;
        }
        w -= 1;
        word = bits[w];
    }
}

// ============================================================================
// Zero-width assertions
// ============================================================================

#[inline]
fn is_word_at(hay: &[u8], s: usize, end: usize) -> bool {
    s < end && is_word_byte(hay[s])
}

#[inline]
fn is_word_boundary(hay: &[u8], s: usize, end: usize) -> bool {
    let before = s > 0 && is_word_byte(hay[s - 1]);
    before != is_word_at(hay, s, end)
}

// ============================================================================
// Backtracking
// ============================================================================

/// Pop checkpoints until one yields a place to resume.
fn backtrack(
    reg: &RegexType,
    hay: &[u8],
    end: usize,
    ms: &mut MatchScratch,
    look_depth: &mut u32,
) -> Option<(usize, usize)> {
    while let Some(cp) = ms.stack.pop() {
        match cp {
            Checkpoint::Alt { pc, at } => return Some((pc, at)),
            Checkpoint::DfaShortest { pc, dfa, state, at } => {
                let dfa_ref = &reg.dfas[dfa as usize];
                if let Some((pos, resume)) = dfa_next_accept(dfa_ref, hay, state, at, end) {
                    if let Some(state) = resume {
                        ms.stack.push(Checkpoint::DfaShortest {
                            pc,
                            dfa,
                            state,
                            at: pos,
                        });
                    }
                    return Some((pc, pos));
                }
            }
            Checkpoint::DfaLongest {
                pc,
                start,
                len,
                base,
            } => match prev_accept(&ms.dfa_matches[base..], len) {
                Some(k) => {
                    ms.stack.push(Checkpoint::DfaLongest {
                        pc,
                        start,
                        len: k,
                        base,
                    });
                    return Some((pc, start + k));
                }
                None => ms.dfa_matches.truncate(base),
            },
            Checkpoint::Lookahead {
                negative,
                at,
                resume,
                arena,
            } => {
                *look_depth -= 1;
                ms.dfa_matches.truncate(arena);
                if negative {
                    return Some((resume, at));
                }
            }
            restore => ms.restore(restore),
        }
    }
    None
}

// ============================================================================
// match_at - the core VM executor
// ============================================================================

/// Run the program anchored at `sstart` with `end` as the subject end.
/// Returns the match length, `REG_MISMATCH`, or an internal error code.
/// Captures are left in `ms.caps`.
fn match_at(reg: &RegexType, hay: &[u8], end: usize, sstart: usize, ms: &mut MatchScratch) -> i32 {
    ms.reset(reg);
    let mut p: usize = 0;
    let mut s: usize = sstart;
    let mut look_depth: u32 = 0;

    loop {
        let Some(&insn) = reg.insns.get(p) else {
            return ERR_UNDEFINED_INSN;
        };
        let mut goto_fail = false;

        match insn {
            Insn::Jump(t) => p = t as usize,

            Insn::Accept => {
                if look_depth == 0 {
                    ms.caps[0] = Some((sstart, s));
                    return (s - sstart) as i32;
                }
                // End of a lookahead body: find its entry.
                let Some(m) = ms
                    .stack
                    .iter()
                    .rposition(|cp| matches!(cp, Checkpoint::Lookahead { .. }))
                else {
                    return ERR_STACK_BUG;
                };
                let Checkpoint::Lookahead {
                    negative,
                    at,
                    resume,
                    arena,
                } = ms.stack[m]
                else {
                    return ERR_STACK_BUG;
                };
                look_depth -= 1;
                if negative {
                    while ms.stack.len() > m {
                        if let Some(cp) = ms.stack.pop() {
                            ms.restore(cp);
                        }
                    }
                    ms.dfa_matches.truncate(arena);
                    goto_fail = true;
                } else {
                    // Keep captures made by the body but drop its choices.
                    let mut w = m;
                    for r in m + 1..ms.stack.len() {
                        if ms.stack[r].is_restore() {
                            ms.stack[w] = ms.stack[r];
                            w += 1;
                        }
                    }
                    ms.stack.truncate(w);
                    ms.dfa_matches.truncate(arena);
                    s = at;
                    p = resume;
                }
            }

            Insn::AltFirst(t) => {
                ms.stack.push(Checkpoint::Alt { pc: p + 1, at: s });
                p = t as usize;
            }

            Insn::AltSecond(t) => {
                ms.stack.push(Checkpoint::Alt {
                    pc: t as usize,
                    at: s,
                });
                p += 1;
            }

            Insn::Byte(i) => {
                if s < end && bitset_at(&reg.bytes[i as usize], hay[s] as usize) {
                    s += 1;
                    p += 1;
                } else {
                    goto_fail = true;
                }
            }

            Insn::DfaShortest(i) => {
                let dfa = &reg.dfas[i as usize];
                if dfa.init_accepts() {
                    ms.stack.push(Checkpoint::DfaShortest {
                        pc: p + 1,
                        dfa: i,
                        state: 0,
                        at: s,
                    });
                    p += 1;
                } else {
                    match dfa_next_accept(dfa, hay, 0, s, end) {
                        Some((pos, resume)) => {
                            if let Some(state) = resume {
                                ms.stack.push(Checkpoint::DfaShortest {
                                    pc: p + 1,
                                    dfa: i,
                                    state,
                                    at: pos,
                                });
                            }
                            s = pos;
                            p += 1;
                        }
                        None => goto_fail = true,
                    }
                }
            }

            Insn::DfaLongest(i) => {
                let dfa = &reg.dfas[i as usize];
                let base = ms.dfa_matches.len();
                match dfa_scan_longest(dfa, hay, s, end, &mut ms.dfa_matches, base) {
                    Some(len) => {
                        ms.stack.push(Checkpoint::DfaLongest {
                            pc: p + 1,
                            start: s,
                            len,
                            base,
                        });
                        s += len;
                        p += 1;
                    }
                    None => {
                        ms.dfa_matches.truncate(base);
                        goto_fail = true;
                    }
                }
            }

            Insn::CaptureStart(g) => {
                let slot = &mut ms.pending[g as usize];
                ms.stack.push(Checkpoint::SetCaptureStart {
                    group: g,
                    old: *slot,
                });
                *slot = Some(s);
                p += 1;
            }

            Insn::CaptureEnd(g) => {
                let Some(start) = ms.pending[g as usize] else {
                    return ERR_STACK_BUG;
                };
                let slot = &mut ms.caps[g as usize];
                ms.stack.push(Checkpoint::SetCaptureEnd {
                    group: g,
                    old: *slot,
                });
                *slot = Some((start, s));
                p += 1;
            }

            Insn::CaptureDiscard(g) => {
                let slot = &mut ms.caps[g as usize];
                if slot.is_some() {
                    ms.stack.push(Checkpoint::SetCaptureEnd {
                        group: g,
                        old: *slot,
                    });
                    *slot = None;
                }
                p += 1;
            }

            Insn::BackRef(g) => match ms.caps[g as usize] {
                // A group that did not participate matches the empty string.
                None => p += 1,
                Some((cs, ce)) => {
                    let len = ce - cs;
                    if end - s >= len && hay[cs..ce] == hay[s..s + len] {
                        s += len;
                        p += 1;
                    } else {
                        goto_fail = true;
                    }
                }
            },

            Insn::AssertBoundary => {
                if is_word_boundary(hay, s, end) {
                    p += 1;
                } else {
                    goto_fail = true;
                }
            }

            Insn::AssertNotBoundary => {
                if is_word_boundary(hay, s, end) {
                    goto_fail = true;
                } else {
                    p += 1;
                }
            }

            Insn::AssertStart => {
                if s == 0 {
                    p += 1;
                } else {
                    goto_fail = true;
                }
            }

            Insn::AssertEnd => {
                if s == end {
                    p += 1;
                } else {
                    goto_fail = true;
                }
            }

            Insn::LookPositive(t) | Insn::LookNegative(t) => {
                ms.stack.push(Checkpoint::Lookahead {
                    negative: matches!(insn, Insn::LookNegative(_)),
                    at: s,
                    resume: t as usize,
                    arena: ms.dfa_matches.len(),
                });
                look_depth += 1;
                p += 1;
            }

            Insn::LoopMark(slot) => {
                let cell = &mut ms.loops[slot as usize];
                ms.stack.push(Checkpoint::SetLoop { slot, old: *cell });
                *cell = Some(s);
                p += 1;
            }

            Insn::LoopCheck(slot) => {
                if ms.loops[slot as usize] == Some(s) {
                    goto_fail = true;
                } else {
                    p += 1;
                }
            }
        }

        if goto_fail {
            match backtrack(reg, hay, end, ms, &mut look_depth) {
                Some((pc, at)) => {
                    p = pc;
                    s = at;
                }
                None => return REG_MISMATCH,
            }
        }
    }
}

// ============================================================================
// reg_match - match anchored at a position
// ============================================================================

/// Match the pattern starting exactly at `from`, treating `to` as the end
/// of the subject. Returns the match length or `REG_MISMATCH`; captures are
/// written to `region`. `ERR_INVALID_ARGUMENT` when the range is out of
/// bounds or ends past `REG_MAX_SUBJECT_LEN`.
pub fn reg_match(reg: &RegexType, hay: &[u8], from: usize, to: usize, region: &mut Region) -> i32 {
    if !reg_valid_range(hay.len(), from, to) {
        return ERR_INVALID_ARGUMENT;
    }
    region.resize(reg.num_captures as usize);
    with_scratch(reg, |ms| {
        let r = match_at(reg, hay, to, from, ms);
        if r >= 0 {
            ms.fill_region(region);
        }
        r
    })
}

// ============================================================================
// reg_search - search for a match anywhere in a range
// ============================================================================

/// Whether every required substring occurs in `hay`.
pub fn required_substrs_present(reg: &RegexType, hay: &[u8]) -> bool {
    reg.required_substrs
        .iter()
        .all(|needle| memmem::find(hay, needle).is_some())
}

/// Try `reg_match` at `from, from + 1, ...` while the offset is below `to`.
/// Returns the start offset of the first match or `REG_MISMATCH`, with the
/// same range rules as `reg_match`.
pub fn reg_search(reg: &RegexType, hay: &[u8], from: usize, to: usize, region: &mut Region) -> i32 {
    if !reg_valid_range(hay.len(), from, to) {
        return ERR_INVALID_ARGUMENT;
    }
    region.resize(reg.num_captures as usize);
    if !required_substrs_present(reg, &hay[from..to]) {
        return REG_MISMATCH;
    }
    with_scratch(reg, |ms| {
        for at in from..to {
            let r = match_at(reg, hay, to, at, ms);
            if r >= 0 {
                ms.fill_region(region);
                return at as i32;
            }
            if r != REG_MISMATCH {
                return r;
            }
        }
        REG_MISMATCH
    })
}

// ============================================================================
// reg_replace - substitute every match
// ============================================================================

fn expand_template(template: &[u8], hay: &[u8], region: &Region, out: &mut Vec<u8>) {
    let mut i = 0;
    while i < template.len() {
        let c = template[i];
        if c == b'\\' && i + 1 < template.len() {
            let n = template[i + 1];
            if n.is_ascii_digit() {
                if let Some((s, e)) = region.get((n - b'0') as usize) {
                    out.extend_from_slice(&hay[s..e]);
                }
                i += 2;
                continue;
            }
            if n == b'\\' {
                out.push(b'\\');
                i += 2;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
}

/// Replace every non-overlapping match in `hay` by `template`, where
/// `\0`..`\9` insert a group and `\\` a backslash. Subjects longer than
/// `REG_MAX_SUBJECT_LEN` are returned unchanged.
pub fn reg_replace(reg: &RegexType, hay: &[u8], template: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(hay.len());
    let mut region = Region::new();
    let mut pos = 0;
    let mut last = 0;
    while pos < hay.len() {
        let r = reg_search(reg, hay, pos, hay.len(), &mut region);
        if r < 0 {
            break;
        }
        let Some((start, end)) = region.get(0) else {
            break;
        };
        out.extend_from_slice(&hay[last..start]);
        expand_template(template, hay, &region, &mut out);
        if end == start {
            if start < hay.len() {
                out.push(hay[start]);
            }
            pos = start + 1;
        } else {
            pos = end;
        }
        last = pos;
    }
    if last < hay.len() {
        out.extend_from_slice(&hay[last..]);
    }
    out
}
