// regcomp.rs - Compiler: converts AST (Node trees) into VM programs.
//
// Structure: tree simplification → instruction management → DFA promotion →
// quantifier compilation → tree compilation → optimizer → verifier →
// entry point.

use std::collections::HashMap;

use log::{debug, trace};

use crate::regdef::*;
use crate::regdfa::reg_build_dfa;
use crate::regint::*;
use crate::regparse::reg_parse;
use crate::regparse_types::*;
use crate::regtrav::reg_required_substrs_tree;

const MAX_PROGRAM_SIZE: usize = 1 << 24;

// ============================================================================
// Compile options
// ============================================================================

/// Per-pattern compilation settings.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Replace runs of single-class repetitions with DFA instructions.
    pub dfa_promotion: bool,
    /// Run the peephole optimizer over the lowered program.
    pub optimize: bool,
    /// State cap for each embedded DFA; larger runs stay backtracking code.
    pub dfa_state_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            dfa_promotion: true,
            optimize: true,
            dfa_state_limit: REG_DEFAULT_DFA_STATE_LIMIT,
        }
    }
}

// ============================================================================
// Tree simplification
// ============================================================================

/// Normalize a parsed tree: flatten nested lists, drop empty items,
/// fold single-byte alternatives into one class, and remove repetitions
/// that can only match the empty string.
pub(crate) fn simplify(node: Node) -> Node {
    match node {
        Node::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                match simplify(item) {
                    Node::List(inner) => out.extend(inner),
                    other => out.push(other),
                }
            }
            if out.len() == 1 {
                return out.remove(0);
            }
            Node::List(out)
        }
        Node::Alt(branches) => {
            let mut out: Vec<Node> = Vec::with_capacity(branches.len());
            for b in branches {
                let b = simplify(b);
                if let (Some(Node::Bytes(prev)), Node::Bytes(bs)) = (out.last_mut(), &b) {
                    bitset_or(prev, bs);
                    continue;
                }
                out.push(b);
            }
            if out.len() == 1 {
                return out.remove(0);
            }
            Node::Alt(out)
        }
        Node::Capture { group, body } => Node::Capture {
            group,
            body: Box::new(simplify(*body)),
        },
        Node::Quant {
            body,
            lower,
            upper,
            greedy,
        } => {
            let body = simplify(*body);
            if upper == 0 || (body.is_empty_list()) {
                return Node::empty();
            }
            if lower == 1 && upper == 1 {
                return body;
            }
            Node::Quant {
                body: Box::new(body),
                lower,
                upper,
                greedy,
            }
        }
        Node::Look { negative, body } => Node::Look {
            negative,
            body: Box::new(simplify(*body)),
        },
        other => other,
    }
}

// ============================================================================
// Compiler state / instruction management
// ============================================================================

struct Compiler<'a> {
    opts: &'a CompileOptions,
    insns: Vec<Insn>,
    bytes: Vec<BitSet>,
    byte_ids: HashMap<BitSet, u32>,
    dfas: Vec<Dfa>,
    num_loops: u32,
}

impl<'a> Compiler<'a> {
    fn new(opts: &'a CompileOptions) -> Self {
        Compiler {
            opts,
            insns: Vec::new(),
            bytes: Vec::new(),
            byte_ids: HashMap::new(),
            dfas: Vec::new(),
            num_loops: 0,
        }
    }

    #[inline]
    fn pos(&self) -> u32 {
        self.insns.len() as u32
    }

    fn add_op(&mut self, insn: Insn) -> u32 {
        self.insns.push(insn);
        self.insns.len() as u32 - 1
    }

    /// Point the operand of instruction `at` to `target`.
    fn patch(&mut self, at: u32, target: u32) {
        let insn = &mut self.insns[at as usize];
        *insn = insn.with_target(target);
    }

    fn add_bytes(&mut self, bs: &BitSet) -> u32 {
        if let Some(&id) = self.byte_ids.get(bs) {
            return id;
        }
        let id = self.bytes.len() as u32;
        self.bytes.push(*bs);
        self.byte_ids.insert(*bs, id);
        id
    }

    fn check_size(&self) -> Result<(), i32> {
        if self.insns.len() > MAX_PROGRAM_SIZE {
            return Err(ERR_TOO_COMPLEX);
        }
        Ok(())
    }

    // ========================================================================
    // DFA promotion
    // ========================================================================

    /// Length and greediness of the promotable run at the head of `items`.
    fn promotable_run(items: &[Node]) -> Option<(usize, bool)> {
        let mut greedy: Option<bool> = None;
        let mut len = 0;
        for item in items {
            match item {
                Node::Bytes(_) => {}
                Node::Quant {
                    body,
                    lower,
                    upper,
                    greedy: g,
                } if matches!(**body, Node::Bytes(_)) => {
                    if lower != upper {
                        match greedy {
                            None => greedy = Some(*g),
                            Some(dir) if dir != *g => break,
                            Some(_) => {}
                        }
                    }
                }
                _ => break,
            }
            len += 1;
        }
        greedy.map(|g| (len, g))
    }

    /// Emit one DFA instruction for `items`. Returns `false` when the
    /// automaton exceeds the state limit and ordinary code is needed.
    fn compile_dfa_run(&mut self, items: &[Node], greedy: bool) -> Result<bool, i32> {
        let run = Node::List(items.to_vec());
        match reg_build_dfa(&run, self.opts.dfa_state_limit) {
            Ok(dfa) => {
                let idx = self.dfas.len() as u32;
                debug!(
                    "promoted {} item(s) to {} dfa {} ({} states)",
                    items.len(),
                    if greedy { "longest" } else { "shortest" },
                    idx,
                    dfa.num_states()
                );
                self.dfas.push(dfa);
                self.add_op(if greedy {
                    Insn::DfaLongest(idx)
                } else {
                    Insn::DfaShortest(idx)
                });
                Ok(true)
            }
            Err(ERR_TOO_COMPLEX) => {
                debug!("dfa promotion of {} item(s) fell back to backtracking", items.len());
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    // ========================================================================
    // Quantifier compilation
    // ========================================================================

    /// One iteration of a repeated body: reset its captures, and when the
    /// body can match empty, reject iterations that consume nothing.
    fn compile_iteration(&mut self, body: &Node, groups: &[u32], guard: Option<u32>) -> Result<(), i32> {
        if let Some(slot) = guard {
            self.add_op(Insn::LoopMark(slot));
        }
        for &g in groups {
            self.add_op(Insn::CaptureDiscard(g));
        }
        self.compile_tree(body)?;
        if let Some(slot) = guard {
            self.add_op(Insn::LoopCheck(slot));
        }
        self.check_size()
    }

    fn compile_quantifier_node(
        &mut self,
        body: &Node,
        lower: u32,
        upper: u32,
        greedy: bool,
    ) -> Result<(), i32> {
        let flags = node_flags(body);
        let mut groups = Vec::new();
        if flags.contains(NodeFlags::CAPTURE) {
            collect_groups(body, &mut groups);
        }
        let guard = if flags.contains(NodeFlags::MAY_BE_EMPTY) && lower != upper {
            self.num_loops += 1;
            Some(self.num_loops - 1)
        } else {
            None
        };

        for _ in 0..lower {
            self.compile_iteration(body, &groups, None)?;
        }

        if is_infinite_repeat(upper) {
            if greedy {
                // ALT_SECOND(exit) → body → JUMP back
                let head = self.add_op(Insn::AltSecond(0));
                self.compile_iteration(body, &groups, guard)?;
                self.add_op(Insn::Jump(head));
                let exit = self.pos();
                self.patch(head, exit);
            } else {
                // JUMP forward → body → ALT_SECOND back
                let jump = self.add_op(Insn::Jump(0));
                let body_start = self.pos();
                self.compile_iteration(body, &groups, guard)?;
                let tail = self.add_op(Insn::AltSecond(body_start));
                self.patch(jump, tail);
            }
            return Ok(());
        }

        let mut exits = Vec::new();
        for _ in lower..upper {
            exits.push(self.add_op(if greedy {
                Insn::AltSecond(0)
            } else {
                Insn::AltFirst(0)
            }));
            self.compile_iteration(body, &groups, guard)?;
        }
        let exit = self.pos();
        for at in exits {
            self.patch(at, exit);
        }
        Ok(())
    }

    // ========================================================================
    // Tree compilation
    // ========================================================================

    fn compile_seq(&mut self, items: &[Node]) -> Result<(), i32> {
        let mut i = 0;
        while i < items.len() {
            if self.opts.dfa_promotion {
                if let Some((len, greedy)) = Self::promotable_run(&items[i..]) {
                    if self.compile_dfa_run(&items[i..i + len], greedy)? {
                        i += len;
                        continue;
                    }
                }
            }
            match &items[i] {
                Node::Quant {
                    body,
                    lower,
                    upper,
                    greedy,
                } => self.compile_quantifier_node(body, *lower, *upper, *greedy)?,
                other => self.compile_tree(other)?,
            }
            i += 1;
        }
        Ok(())
    }

    fn compile_tree(&mut self, node: &Node) -> Result<(), i32> {
        match node {
            Node::Bytes(bs) => {
                let id = self.add_bytes(bs);
                self.add_op(Insn::Byte(id));
            }
            Node::List(items) => self.compile_seq(items)?,
            Node::Alt(branches) => {
                let mut end_jumps = Vec::with_capacity(branches.len());
                let last = branches.len().saturating_sub(1);
                for (i, b) in branches.iter().enumerate() {
                    if i < last {
                        let alt = self.add_op(Insn::AltSecond(0));
                        self.compile_tree(b)?;
                        end_jumps.push(self.add_op(Insn::Jump(0)));
                        let next = self.pos();
                        self.patch(alt, next);
                    } else {
                        self.compile_tree(b)?;
                    }
                }
                let end = self.pos();
                for at in end_jumps {
                    self.patch(at, end);
                }
            }
            Node::Capture { group, body } => {
                self.add_op(Insn::CaptureStart(*group));
                self.compile_tree(body)?;
                self.add_op(Insn::CaptureEnd(*group));
            }
            Node::Quant { .. } => self.compile_seq(std::slice::from_ref(node))?,
            Node::Anchor(a) => {
                self.add_op(match a {
                    AnchorType::Start => Insn::AssertStart,
                    AnchorType::End => Insn::AssertEnd,
                    AnchorType::WordBoundary => Insn::AssertBoundary,
                    AnchorType::NotWordBoundary => Insn::AssertNotBoundary,
                });
            }
            Node::BackRef(g) => {
                self.add_op(Insn::BackRef(*g));
            }
            Node::Look { negative, body } => {
                let at = self.add_op(if *negative {
                    Insn::LookNegative(0)
                } else {
                    Insn::LookPositive(0)
                });
                self.compile_tree(body)?;
                self.add_op(Insn::Accept);
                let resume = self.pos();
                self.patch(at, resume);
            }
        }
        self.check_size()
    }
}

// ============================================================================
// Optimizer
// ============================================================================

/// Peephole pass over a lowered program: thread jump chains, drop jumps and
/// alternatives whose both paths lead to the next instruction, remove
/// unreachable code, then renumber and drop unused byte classes and DFAs.
/// Returns the number of removed instructions.
pub fn optimize(reg: &mut RegexType) -> usize {
    let n = reg.insns.len();
    if n == 0 {
        return 0;
    }

    // jump threading
    for i in 0..n {
        if let Some(mut t) = reg.insns[i].target() {
            let mut hops = 0;
            while let Insn::Jump(u) = reg.insns[t as usize] {
                if u == t || hops > n {
                    break;
                }
                t = u;
                hops += 1;
            }
            reg.insns[i] = reg.insns[i].with_target(t);
        }
    }

    // instructions that continue at i+1 on every path
    let mut nop = vec![false; n];
    for (i, insn) in reg.insns.iter().enumerate() {
        nop[i] = matches!(insn, Insn::Jump(t) | Insn::AltFirst(t) | Insn::AltSecond(t)
            if *t as usize == i + 1);
    }

    // reachability
    let mut reachable = vec![false; n];
    let mut work = vec![0usize];
    while let Some(i) = work.pop() {
        if i >= n || reachable[i] {
            continue;
        }
        reachable[i] = true;
        let insn = reg.insns[i];
        if insn.falls_through() {
            work.push(i + 1);
        }
        if let Some(t) = insn.target() {
            work.push(t as usize);
        }
    }

    let keep: Vec<bool> = (0..n).map(|i| reachable[i] && !nop[i]).collect();
    let removed = keep.iter().filter(|&&k| !k).count();
    if removed == 0 {
        return 0;
    }

    // old index → index of the first kept instruction at or after it
    let mut new_index = vec![0u32; n + 1];
    let mut count = keep.iter().filter(|&&k| k).count() as u32;
    new_index[n] = count;
    for i in (0..n).rev() {
        if keep[i] {
            count -= 1;
        }
        new_index[i] = count;
    }

    let mut insns = Vec::with_capacity(n - removed);
    for i in 0..n {
        if keep[i] {
            let insn = reg.insns[i];
            insns.push(match insn.target() {
                Some(t) => insn.with_target(new_index[t as usize]),
                None => insn,
            });
        }
    }
    reg.insns = insns;
    compact_tables(reg);
    trace!("optimize: removed {} of {} instructions", removed, n);
    removed
}

/// Drop byte classes and DFAs no instruction refers to.
fn compact_tables(reg: &mut RegexType) {
    let mut byte_map = vec![u32::MAX; reg.bytes.len()];
    let mut dfa_map = vec![u32::MAX; reg.dfas.len()];
    let mut bytes = Vec::new();
    let mut dfas = Vec::new();
    for insn in reg.insns.iter_mut() {
        match insn {
            Insn::Byte(i) => {
                let slot = &mut byte_map[*i as usize];
                if *slot == u32::MAX {
                    *slot = bytes.len() as u32;
                    bytes.push(reg.bytes[*i as usize]);
                }
                *i = *slot;
            }
            Insn::DfaShortest(i) | Insn::DfaLongest(i) => {
                let slot = &mut dfa_map[*i as usize];
                if *slot == u32::MAX {
                    *slot = dfas.len() as u32;
                    dfas.push(reg.dfas[*i as usize].clone());
                }
                *i = *slot;
            }
            _ => {}
        }
    }
    reg.bytes = bytes;
    reg.dfas = dfas;
}

// ============================================================================
// Verifier
// ============================================================================

/// Check that every operand of the program is in range.
pub fn reg_verify(reg: &RegexType) -> Result<(), i32> {
    let n = reg.insns.len() as u32;
    if !matches!(reg.insns.last(), Some(Insn::Accept)) {
        return Err(ERR_UNDEFINED_INSN);
    }
    for insn in &reg.insns {
        let ok = match *insn {
            Insn::Jump(t)
            | Insn::AltFirst(t)
            | Insn::AltSecond(t)
            | Insn::LookPositive(t)
            | Insn::LookNegative(t) => t < n,
            Insn::Byte(i) => (i as usize) < reg.bytes.len(),
            Insn::DfaShortest(i) | Insn::DfaLongest(i) => (i as usize) < reg.dfas.len(),
            Insn::CaptureStart(g)
            | Insn::CaptureEnd(g)
            | Insn::CaptureDiscard(g)
            | Insn::BackRef(g) => g > 0 && g < reg.num_captures,
            Insn::LoopMark(s) | Insn::LoopCheck(s) => s < reg.num_loops,
            Insn::Accept
            | Insn::AssertBoundary
            | Insn::AssertNotBoundary
            | Insn::AssertStart
            | Insn::AssertEnd => true,
        };
        if !ok {
            return Err(ERR_UNDEFINED_INSN);
        }
    }
    Ok(())
}

// ============================================================================
// Entry point
// ============================================================================

/// Compile a tree into a program.
pub fn reg_compile(tree: &Node, num_groups: u32, opts: &CompileOptions) -> Result<RegexType, i32> {
    let mut c = Compiler::new(opts);
    c.compile_tree(tree)?;
    c.add_op(Insn::Accept);

    let mut reg = RegexType::new(c.insns, c.bytes, c.dfas, num_groups + 1, c.num_loops);
    if opts.optimize {
        optimize(&mut reg);
    }
    reg_verify(&reg)?;
    Ok(reg)
}

/// Parse and compile a pattern.
pub fn reg_new(pattern: &[u8], opts: &CompileOptions) -> Result<RegexType, i32> {
    let (tree, num_groups) = reg_parse(pattern)?;
    let required = reg_required_substrs_tree(&tree);
    let tree = simplify(tree);
    let mut reg = reg_compile(&tree, num_groups, opts)?;
    reg.required_substrs = required;
    debug!(
        "compiled {} byte pattern: {} insns, {} byte classes, {} dfas",
        pattern.len(),
        reg.insns.len(),
        reg.bytes.len(),
        reg.dfas.len()
    );
    Ok(reg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pattern: &str) -> RegexType {
        reg_new(pattern.as_bytes(), &CompileOptions::default()).unwrap()
    }

    fn compile_plain(pattern: &str) -> RegexType {
        let opts = CompileOptions {
            dfa_promotion: false,
            optimize: false,
            ..CompileOptions::default()
        };
        reg_new(pattern.as_bytes(), &opts).unwrap()
    }

    #[test]
    fn literal_program() {
        let reg = compile("ab");
        assert_eq!(reg.insns, vec![Insn::Byte(0), Insn::Byte(1), Insn::Accept]);
        assert_eq!(reg.num_captures, 1);
    }

    #[test]
    fn greedy_star_layout() {
        let reg = compile_plain("a*");
        assert_eq!(
            reg.insns,
            vec![Insn::AltSecond(3), Insn::Byte(0), Insn::Jump(0), Insn::Accept]
        );
    }

    #[test]
    fn lazy_star_layout() {
        let reg = compile_plain("a*?");
        assert_eq!(
            reg.insns,
            vec![Insn::Jump(2), Insn::Byte(0), Insn::AltSecond(1), Insn::Accept]
        );
    }

    #[test]
    fn single_byte_alternatives_fold() {
        let reg = compile_plain("a|b|cd");
        assert_eq!(reg.bytes.len(), 3);
        assert_eq!(reg.insns[0], Insn::AltSecond(3));
    }

    #[test]
    fn empty_repeat_is_deleted() {
        let reg = compile("(?:)+e");
        assert_eq!(reg.insns, vec![Insn::Byte(0), Insn::Accept]);
    }

    #[test]
    fn promotion_emits_dfa() {
        let reg = compile("a+a+a+");
        assert_eq!(reg.insns, vec![Insn::DfaLongest(0), Insn::Accept]);
        let reg = compile("x[0-9]*?y");
        assert_eq!(reg.insns, vec![Insn::DfaShortest(0), Insn::Accept]);
        let reg = compile("a+b*?");
        assert_eq!(
            reg.insns,
            vec![Insn::DfaLongest(0), Insn::DfaShortest(1), Insn::Accept]
        );
    }

    #[test]
    fn captures_block_promotion() {
        let reg = compile("(a)+");
        assert!(reg.dfas.is_empty());
        assert!(reg.insns.contains(&Insn::CaptureDiscard(1)));
    }

    #[test]
    fn nullable_loop_gets_guard() {
        let reg = compile("(a?)*");
        assert_eq!(reg.num_loops, 1);
        assert!(reg.insns.contains(&Insn::LoopMark(0)));
        assert!(reg.insns.contains(&Insn::LoopCheck(0)));
    }

    #[test]
    fn lookahead_layout() {
        let reg = compile_plain("(?=a)b");
        assert_eq!(
            reg.insns,
            vec![
                Insn::LookPositive(3),
                Insn::Byte(0),
                Insn::Accept,
                Insn::Byte(1),
                Insn::Accept
            ]
        );
    }

    #[test]
    fn optimizer_threads_and_removes() {
        let mut reg = RegexType::new(
            vec![
                Insn::Jump(1),
                Insn::AltSecond(3),
                Insn::Jump(4),
                Insn::Jump(4),
                Insn::Accept,
            ],
            Vec::new(),
            Vec::new(),
            1,
            0,
        );
        let removed = optimize(&mut reg);
        assert!(removed >= 2);
        assert!(reg_verify(&reg).is_ok());
        assert_eq!(reg.insns.last(), Some(&Insn::Accept));
    }

    #[test]
    fn every_program_verifies() {
        for p in [
            "a|b||c",
            "((a)|(b))+",
            r"(?:(a)|b)\1",
            r"\b.\b.\B",
            "(?!(?!(a)))",
            "a{2,5}?b{3}",
            "(?:aa)+(?:aaa)+",
            "^(?:a|ab)*$",
        ] {
            let reg = compile(p);
            assert!(reg_verify(&reg).is_ok(), "{}", p);
            let reg = compile_plain(p);
            assert!(reg_verify(&reg).is_ok(), "{}", p);
        }
    }

    #[test]
    fn required_substrs_are_recorded() {
        let reg = compile("abc(def)ghi");
        assert_eq!(
            reg.required_substrs,
            vec![b"abc".to_vec(), b"def".to_vec(), b"ghi".to_vec()]
        );
    }
}
