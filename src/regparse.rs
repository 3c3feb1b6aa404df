// regparse.rs - Parser: converts patterns (byte strings) into AST (Node trees).
//
// ECMAScript-style syntax over bytes. Structure: limits → escapes →
// character classes → intervals → atoms → branches → alternations.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::regdef::*;
use crate::regint::*;
use crate::regparse_types::*;

// ============================================================================
// Global State
// ============================================================================

static MAX_CAPTURE_NUM: AtomicU32 = AtomicU32::new(REG_DEFAULT_MAX_CAPTURE_NUM);
static PARSE_DEPTH_LIMIT: AtomicU32 = AtomicU32::new(REG_DEFAULT_PARSE_DEPTH_LIMIT);

pub fn reg_set_capture_num_limit(num: u32) -> i32 {
    if num == 0 {
        return ERR_INVALID_ARGUMENT;
    }
    MAX_CAPTURE_NUM.store(num, Ordering::Relaxed);
    REG_NORMAL
}

pub fn reg_get_capture_num_limit() -> u32 {
    MAX_CAPTURE_NUM.load(Ordering::Relaxed)
}

pub fn reg_get_parse_depth_limit() -> u32 {
    PARSE_DEPTH_LIMIT.load(Ordering::Relaxed)
}

/// Set the nesting limit; `0` restores the default. Compiling patterns
/// nested deeper than the default needs a correspondingly larger stack.
pub fn reg_set_parse_depth_limit(depth: u32) -> i32 {
    if depth == 0 {
        PARSE_DEPTH_LIMIT.store(REG_DEFAULT_PARSE_DEPTH_LIMIT, Ordering::Relaxed);
    } else {
        PARSE_DEPTH_LIMIT.store(depth, Ordering::Relaxed);
    }
    REG_NORMAL
}

// ============================================================================
// Helpers
// ============================================================================

#[inline]
fn peek(p: usize, pattern: &[u8]) -> Option<u8> {
    pattern.get(p).copied()
}

fn xdigitval(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Decimal number at `p`; `None` when no digit is present.
fn scan_number(p: &mut usize, pattern: &[u8]) -> Result<Option<u32>, i32> {
    let start = *p;
    let mut n: u64 = 0;
    while let Some(c) = peek(*p, pattern) {
        if !c.is_ascii_digit() {
            break;
        }
        n = n * 10 + (c - b'0') as u64;
        if n > u32::MAX as u64 {
            return Err(ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE);
        }
        *p += 1;
    }
    if *p == start {
        Ok(None)
    } else {
        Ok(Some(n as u32))
    }
}

// ============================================================================
// Escapes
// ============================================================================

/// Set named by a class escape letter (`\d \D \w \W \s \S`).
fn ctype_escape(c: u8) -> Option<BitSet> {
    let (mut bs, negate) = match c {
        b'd' => (bitset_digit(), false),
        b'D' => (bitset_digit(), true),
        b'w' => (bitset_word(), false),
        b'W' => (bitset_word(), true),
        b's' => (bitset_space(), false),
        b'S' => (bitset_space(), true),
        _ => return None,
    };
    if negate {
        bitset_invert(&mut bs);
    }
    Some(bs)
}

/// Single-byte escape; `c` has been consumed, `p` points past it.
fn fetch_escaped_value(c: u8, p: &mut usize, pattern: &[u8]) -> Result<u8, i32> {
    match c {
        b'f' => Ok(0x0c),
        b'n' => Ok(b'\n'),
        b'r' => Ok(b'\r'),
        b't' => Ok(b'\t'),
        b'v' => Ok(0x0b),
        b'0' => match peek(*p, pattern) {
            Some(d) if d.is_ascii_digit() => Err(ERR_INVALID_BACKREF),
            _ => Ok(0),
        },
        b'x' => {
            let hi = peek(*p, pattern).and_then(xdigitval);
            let lo = peek(*p + 1, pattern).and_then(xdigitval);
            match (hi, lo) {
                (Some(hi), Some(lo)) => {
                    *p += 2;
                    Ok(hi * 16 + lo)
                }
                _ => Err(ERR_TOO_SHORT_HEX_ESCAPE),
            }
        }
        b'c' => match peek(*p, pattern) {
            Some(l @ b'A'..=b'Z') => {
                *p += 1;
                Ok(l - b'A')
            }
            Some(l @ b'a'..=b'z') => {
                *p += 1;
                Ok(l - b'a')
            }
            _ => Err(ERR_CONTROL_CODE_SYNTAX),
        },
        c if c.is_ascii_alphanumeric() => Err(ERR_INVALID_ESCAPE),
        c => Ok(c),
    }
}

/// Escape outside a class; `p` points past the backslash.
fn prs_escape(p: &mut usize, pattern: &[u8], env: &mut ParseEnv) -> Result<Node, i32> {
    let c = peek(*p, pattern).ok_or(ERR_END_PATTERN_AT_ESCAPE)?;
    *p += 1;
    match c {
        b'b' => Ok(Node::Anchor(AnchorType::WordBoundary)),
        b'B' => Ok(Node::Anchor(AnchorType::NotWordBoundary)),
        b'1'..=b'9' => {
            *p -= 1;
            let n = scan_number(p, pattern)
                .map_err(|_| ERR_INVALID_BACKREF)?
                .ok_or(ERR_PARSER_BUG)?;
            if n > env.num_captures || !env.visible.at(n) {
                return Err(ERR_INVALID_BACKREF);
            }
            Ok(Node::BackRef(n))
        }
        _ => {
            if let Some(bs) = ctype_escape(c) {
                return Ok(Node::Bytes(bs));
            }
            let b = fetch_escaped_value(c, p, pattern)?;
            Ok(Node::byte(b))
        }
    }
}

// ============================================================================
// Character class parser: prs_cc
// ============================================================================

enum CcAtom {
    Byte(u8),
    Set(BitSet),
}

fn prs_cc_atom(p: &mut usize, pattern: &[u8]) -> Result<CcAtom, i32> {
    let c = peek(*p, pattern).ok_or(ERR_PREMATURE_END_OF_CHAR_CLASS)?;
    *p += 1;
    if c != b'\\' {
        return Ok(CcAtom::Byte(c));
    }
    let e = peek(*p, pattern).ok_or(ERR_END_PATTERN_AT_ESCAPE)?;
    *p += 1;
    if let Some(bs) = ctype_escape(e) {
        return Ok(CcAtom::Set(bs));
    }
    match e {
        b'b' => Ok(CcAtom::Byte(0x08)),
        b'1'..=b'9' | b'B' => Err(ERR_INVALID_ESCAPE),
        _ => fetch_escaped_value(e, p, pattern).map(CcAtom::Byte),
    }
}

/// `[...]`; `p` points past the opening bracket.
fn prs_cc(p: &mut usize, pattern: &[u8]) -> Result<Node, i32> {
    let mut neg = false;
    if peek(*p, pattern) == Some(b'^') {
        neg = true;
        *p += 1;
    }

    let mut bs = BITSET_EMPTY;
    loop {
        let c = peek(*p, pattern).ok_or(ERR_PREMATURE_END_OF_CHAR_CLASS)?;
        if c == b']' {
            *p += 1;
            break;
        }
        let first = prs_cc_atom(p, pattern)?;
        let is_range = peek(*p, pattern) == Some(b'-')
            && matches!(peek(*p + 1, pattern), Some(n) if n != b']');
        if !is_range {
            match first {
                CcAtom::Byte(b) => bitset_set_bit(&mut bs, b as usize),
                CcAtom::Set(set) => bitset_or(&mut bs, &set),
            }
            continue;
        }

        *p += 1; // '-'
        let last = prs_cc_atom(p, pattern)?;
        match (first, last) {
            (CcAtom::Byte(from), CcAtom::Byte(to)) => {
                if from > to {
                    return Err(ERR_EMPTY_RANGE_IN_CHAR_CLASS);
                }
                bitset_set_range(&mut bs, from, to);
            }
            (CcAtom::Set(_), _) => return Err(ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE),
            (_, CcAtom::Set(_)) => return Err(ERR_CHAR_CLASS_VALUE_AT_END_OF_RANGE),
        }
    }

    if neg {
        bitset_invert(&mut bs);
    }
    Ok(Node::Bytes(bs))
}

// ============================================================================
// Interval and quantifier parser
// ============================================================================

/// `{lower,upper}`; `p` points at the brace.
fn fetch_interval(p: &mut usize, pattern: &[u8]) -> Result<(u32, u32), i32> {
    *p += 1;
    if *p >= pattern.len() {
        return Err(ERR_END_PATTERN_AT_LEFT_BRACE);
    }
    let lower = scan_number(p, pattern)?;
    let (lower, upper) = if peek(*p, pattern) == Some(b',') {
        *p += 1;
        let upper = scan_number(p, pattern)?;
        match (lower, upper) {
            (None, None) => return Err(ERR_INVALID_REPEAT_RANGE_PATTERN),
            (lo, up) => (lo.unwrap_or(0), up.unwrap_or(INFINITE_REPEAT)),
        }
    } else {
        match lower {
            Some(n) => (n, n),
            None => return Err(ERR_INVALID_REPEAT_RANGE_PATTERN),
        }
    };
    match peek(*p, pattern) {
        Some(b'}') => *p += 1,
        None => return Err(ERR_END_PATTERN_AT_LEFT_BRACE),
        Some(_) => return Err(ERR_INVALID_REPEAT_RANGE_PATTERN),
    }
    if lower > REG_MAX_REPEAT_NUM
        || (!is_infinite_repeat(upper) && upper > REG_MAX_REPEAT_NUM)
    {
        return Err(ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE);
    }
    if !is_infinite_repeat(upper) && upper < lower {
        return Err(ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE);
    }
    Ok((lower, upper))
}

#[inline]
fn is_quantifier_start(c: Option<u8>) -> bool {
    matches!(c, Some(b'*' | b'+' | b'?' | b'{'))
}

/// Quantifier at `p`, if any: `(lower, upper, greedy)`.
fn fetch_quantifier(p: &mut usize, pattern: &[u8]) -> Result<Option<(u32, u32, bool)>, i32> {
    let (lower, upper) = match peek(*p, pattern) {
        Some(b'*') => {
            *p += 1;
            (0, INFINITE_REPEAT)
        }
        Some(b'+') => {
            *p += 1;
            (1, INFINITE_REPEAT)
        }
        Some(b'?') => {
            *p += 1;
            (0, 1)
        }
        Some(b'{') => fetch_interval(p, pattern)?,
        _ => return Ok(None),
    };
    let mut greedy = true;
    if peek(*p, pattern) == Some(b'?') {
        greedy = false;
        *p += 1;
    }
    Ok(Some((lower, upper, greedy)))
}

// ============================================================================
// Expression parser: prs_exp → prs_branch → prs_alts → prs_regexp
// ============================================================================

/// `(...)`; `p` points past the opening parenthesis.
fn prs_group(p: &mut usize, pattern: &[u8], env: &mut ParseEnv) -> Result<Node, i32> {
    if peek(*p, pattern) == Some(b'?') {
        *p += 1;
        let kind = peek(*p, pattern).ok_or(ERR_END_PATTERN_IN_GROUP)?;
        *p += 1;
        let node = match kind {
            b':' => prs_alts(p, pattern, env, true)?,
            b'=' => {
                let body = prs_alts(p, pattern, env, true)?;
                Node::Look {
                    negative: false,
                    body: Box::new(body),
                }
            }
            b'!' => {
                let saved = env.visible.clone();
                let body = prs_alts(p, pattern, env, true)?;
                env.visible = saved;
                Node::Look {
                    negative: true,
                    body: Box::new(body),
                }
            }
            _ => return Err(ERR_UNDEFINED_GROUP_OPTION),
        };
        expect_close(p, pattern)?;
        return Ok(node);
    }

    if env.num_captures >= env.capture_limit {
        return Err(ERR_TOO_MANY_CAPTURES);
    }
    env.num_captures += 1;
    let group = env.num_captures;
    let body = prs_alts(p, pattern, env, true)?;
    expect_close(p, pattern)?;
    env.visible.on(group);
    Ok(Node::Capture {
        group,
        body: Box::new(body),
    })
}

fn expect_close(p: &mut usize, pattern: &[u8]) -> Result<(), i32> {
    match peek(*p, pattern) {
        Some(b')') => {
            *p += 1;
            Ok(())
        }
        _ => Err(ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS),
    }
}

/// One atom and its optional quantifier.
fn prs_exp(p: &mut usize, pattern: &[u8], env: &mut ParseEnv) -> Result<Node, i32> {
    let c = peek(*p, pattern).ok_or(ERR_PARSER_BUG)?;
    *p += 1;
    let node = match c {
        b'(' => prs_group(p, pattern, env)?,
        b'[' => prs_cc(p, pattern)?,
        b'.' => Node::Bytes(bitset_anychar()),
        b'^' => Node::Anchor(AnchorType::Start),
        b'$' => Node::Anchor(AnchorType::End),
        b'\\' => prs_escape(p, pattern, env)?,
        b'*' | b'+' | b'?' | b'{' => return Err(ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED),
        b']' | b'}' => return Err(ERR_UNESCAPED_META_CHARACTER),
        b => Node::byte(b),
    };

    let Some((lower, upper, greedy)) = fetch_quantifier(p, pattern)? else {
        return Ok(node);
    };
    if matches!(node, Node::Anchor(_) | Node::Look { .. }) {
        return Err(ERR_TARGET_OF_REPEAT_OPERATOR_INVALID);
    }
    if is_quantifier_start(peek(*p, pattern)) {
        return Err(ERR_NESTED_REPEAT_OPERATOR);
    }
    Ok(Node::Quant {
        body: Box::new(node),
        lower,
        upper,
        greedy,
    })
}

fn prs_branch(p: &mut usize, pattern: &[u8], env: &mut ParseEnv) -> Result<Node, i32> {
    let mut items = Vec::new();
    while let Some(c) = peek(*p, pattern) {
        if c == b'|' || c == b')' {
            break;
        }
        items.push(prs_exp(p, pattern, env)?);
    }
    if items.len() == 1 {
        return items.pop().ok_or(ERR_PARSER_BUG);
    }
    Ok(Node::List(items))
}

/// Alternation up to `)` or the end of the pattern; the closing
/// parenthesis is left for the caller.
fn prs_alts(
    p: &mut usize,
    pattern: &[u8],
    env: &mut ParseEnv,
    in_group: bool,
) -> Result<Node, i32> {
    env.parse_depth += 1;
    if env.parse_depth > env.parse_depth_limit {
        return Err(ERR_PARSE_DEPTH_LIMIT_OVER);
    }

    let entry = env.visible.clone();
    let mut closed = GroupSet::new();
    let mut branches = Vec::new();
    loop {
        branches.push(prs_branch(p, pattern, env)?);
        closed.union_with(&env.visible);
        if peek(*p, pattern) == Some(b'|') {
            *p += 1;
            env.visible = entry.clone();
            continue;
        }
        break;
    }

    match peek(*p, pattern) {
        Some(b')') if !in_group => return Err(ERR_UNMATCHED_CLOSE_PARENTHESIS),
        None if in_group => return Err(ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS),
        _ => {}
    }

    env.visible = closed;
    env.parse_depth -= 1;
    if branches.len() == 1 {
        return branches.pop().ok_or(ERR_PARSER_BUG);
    }
    Ok(Node::Alt(branches))
}

/// Parse a whole pattern; `env.num_captures` holds the group count after.
pub fn reg_parse_tree(pattern: &[u8], env: &mut ParseEnv) -> Result<Node, i32> {
    let mut p = 0;
    let node = prs_alts(&mut p, pattern, env, false)?;
    if p != pattern.len() {
        return Err(ERR_PARSER_BUG);
    }
    Ok(node)
}

/// Parse with the process-wide limits. Returns the tree and the capture
/// count (group 0 excluded).
pub fn reg_parse(pattern: &[u8]) -> Result<(Node, u32), i32> {
    let mut env = ParseEnv::new(reg_get_parse_depth_limit(), reg_get_capture_num_limit());
    let node = reg_parse_tree(pattern, &mut env)?;
    Ok((node, env.num_captures))
}
