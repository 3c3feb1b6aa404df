// regdump.rs - Human-readable dumps of compiled programs and tables.
// Diagnostic output only; the format is not stable.

use std::fmt::Write;

use crate::regint::*;
use crate::regsearch::*;

fn push_byte(out: &mut String, b: u8) {
    match b {
        b'-' | b'\\' | b']' | b'[' => {
            out.push('\\');
            out.push(b as char);
        }
        0x21..=0x7e => out.push(b as char),
        _ => {
            let _ = write!(out, "\\x{:02x}", b);
        }
    }
}

/// `[a-cx]` style rendering of a byte set.
pub fn bitset_to_string(bs: &BitSet) -> String {
    let mut out = String::from("[");
    for (lo, hi) in bitset_ranges(bs) {
        push_byte(&mut out, lo);
        if hi > lo {
            if hi > lo + 1 {
                out.push('-');
            }
            push_byte(&mut out, hi);
        }
    }
    out.push(']');
    out
}

/// Runs of bytes sharing one value, skipping those equal to `skip`.
fn byte_runs<T: Copy + PartialEq>(row: &[T; CHAR_MAP_SIZE], skip: T) -> Vec<(u8, u8, T)> {
    let mut runs: Vec<(u8, u8, T)> = Vec::new();
    for (b, &v) in row.iter().enumerate() {
        if v == skip {
            continue;
        }
        match runs.last_mut() {
            Some((_, hi, last)) if *last == v && *hi as usize + 1 == b => *hi = b as u8,
            _ => runs.push((b as u8, b as u8, v)),
        }
    }
    runs
}

fn push_range(out: &mut String, lo: u8, hi: u8) {
    let mut bs = BITSET_EMPTY;
    bitset_set_range(&mut bs, lo, hi);
    out.push_str(&bitset_to_string(&bs));
}

fn dump_dfa(out: &mut String, idx: usize, dfa: &Dfa) {
    let _ = writeln!(
        out,
        "dfa {}: {} states{}",
        idx,
        dfa.num_states(),
        if dfa.init_accepts() { ", accepts empty" } else { "" }
    );
    for (s, node) in dfa.nodes.iter().enumerate() {
        let _ = writeln!(out, "  state {}:", s);
        for (lo, hi, t) in byte_runs(&node.next, DFA_DEAD) {
            out.push_str("    ");
            push_range(out, lo, hi);
            let target = t & !DFA_ACCEPT;
            if target == DFA_DEAD {
                out.push_str(" -> stop");
            } else {
                let _ = write!(out, " -> {}", target);
            }
            if t & DFA_ACCEPT != 0 {
                out.push_str(" (accept)");
            }
            out.push('\n');
        }
    }
}

/// Instructions, byte classes and embedded DFAs of a compiled pattern.
pub fn reg_dump(reg: &RegexType) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "program: {} insns, {} groups, {} loops",
        reg.insns.len(),
        reg.num_captures,
        reg.num_loops
    );
    for (pc, insn) in reg.insns.iter().enumerate() {
        let _ = write!(out, "{:04} {}", pc, insn.name());
        match *insn {
            Insn::Byte(i) => {
                let _ = write!(out, " {}", bitset_to_string(&reg.bytes[i as usize]));
            }
            Insn::Jump(t)
            | Insn::AltFirst(t)
            | Insn::AltSecond(t)
            | Insn::LookPositive(t)
            | Insn::LookNegative(t)
            | Insn::DfaShortest(t)
            | Insn::DfaLongest(t)
            | Insn::CaptureStart(t)
            | Insn::CaptureEnd(t)
            | Insn::CaptureDiscard(t)
            | Insn::BackRef(t)
            | Insn::LoopMark(t)
            | Insn::LoopCheck(t) => {
                let _ = write!(out, " {}", t);
            }
            Insn::Accept
            | Insn::AssertBoundary
            | Insn::AssertNotBoundary
            | Insn::AssertStart
            | Insn::AssertEnd => {}
        }
        out.push('\n');
    }
    for (i, dfa) in reg.dfas.iter().enumerate() {
        dump_dfa(&mut out, i, dfa);
    }
    if !reg.required_substrs.is_empty() {
        out.push_str("required:");
        for s in &reg.required_substrs {
            let _ = write!(out, " {:?}", String::from_utf8_lossy(s));
        }
        out.push('\n');
    }
    out
}

/// Search table of a search-only pattern.
pub fn reg_search_dump(sreg: &SearchType) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "search: {} states{}",
        sreg.nodes.len(),
        if sreg.accept_empty { ", accepts empty" } else { "" }
    );
    out.push_str("first bytes: ");
    out.push_str(&bitset_to_string(&bitset_from_bytes(&sreg.first_bytes)));
    out.push('\n');
    let idle = SearchNext {
        keep: 0,
        matched: SEARCH_NO_MATCH,
        next: 0,
    };
    for (s, node) in sreg.nodes.iter().enumerate() {
        let _ = writeln!(
            out,
            "  state {}: {} live{}",
            s,
            node.states.len(),
            if node.has_tail { ", match pending" } else { "" }
        );
        for (lo, hi, rec) in byte_runs(&node.next, idle) {
            out.push_str("    ");
            push_range(&mut out, lo, hi);
            if rec.next == SEARCH_UNBUILT {
                out.push_str(" -> step directly\n");
                continue;
            }
            let _ = write!(out, " -> {} keep {:#x}", rec.next, rec.keep);
            match rec.matched {
                SEARCH_NO_MATCH => {}
                SEARCH_KEEP_MATCH => out.push_str(" (pending)"),
                SEARCH_FRESH_MATCH => out.push_str(" (match: new start)"),
                r => {
                    let _ = write!(out, " (match: entry {})", r);
                }
            }
            out.push('\n');
        }
    }
    out
}
