// regtrav.rs - Tree traversal for required substrings.
// Literal runs every match must contain, used to prefilter input.

use crate::regparse::reg_parse;
use crate::regparse_types::*;
use crate::regint::bitset_single;

fn flush(cur: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
    if !cur.is_empty() {
        out.push(std::mem::take(cur));
    }
}

/// Walk a concatenation, extending the current literal run with single-byte
/// nodes. Capture groups contribute their own runs; any construct that can
/// repeat, branch or match without consuming ends the run.
fn required_walk(node: &Node, cur: &mut Vec<u8>, out: &mut Vec<Vec<u8>>) {
    match node {
        Node::Bytes(bs) => match bitset_single(bs) {
            Some(b) => cur.push(b),
            None => flush(cur, out),
        },
        Node::List(items) => {
            for item in items {
                required_walk(item, cur, out);
            }
        }
        Node::Capture { body, .. } => {
            flush(cur, out);
            required_walk(body, cur, out);
            flush(cur, out);
        }
        Node::Alt(_)
        | Node::Quant { .. }
        | Node::Anchor(_)
        | Node::BackRef(_)
        | Node::Look { .. } => flush(cur, out),
    }
}

/// Required substrings of a parsed tree, in pattern order.
pub fn reg_required_substrs_tree(node: &Node) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut cur = Vec::new();
    required_walk(node, &mut cur, &mut out);
    flush(&mut cur, &mut out);
    out
}

/// Parse `pattern` and return the literal substrings any match contains.
pub fn reg_required_substrs(pattern: &[u8]) -> Result<Vec<Vec<u8>>, i32> {
    let (tree, _) = reg_parse(pattern)?;
    Ok(reg_required_substrs_tree(&tree))
}
