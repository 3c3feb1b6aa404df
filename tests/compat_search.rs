// compat_search.rs - Behavior table for the search-only engine.
//
//   s(pattern, input, start)   -> leftmost match starting at `start`
//   ns(pattern, input)         -> no match
//   unsupported(pattern, code) -> rejected with the given error
//
// Every table entry is cross-checked against the start offset reported by
// the backtracking engine.

use brex::regcomp::{reg_new, CompileOptions};
use brex::regdef::*;
use brex::regexec::reg_search;
use brex::regsearch::{reg_search_new, reg_search_only};

fn lossy(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn search_only(pattern: &[u8], input: &[u8]) -> i32 {
    let sreg = reg_search_new(pattern, REG_DEFAULT_SEARCH_STATE_LIMIT)
        .unwrap_or_else(|e| panic!("compile failed for {:?}: error {}", lossy(pattern), e));
    reg_search_only(&sreg, input, 0, input.len())
}

fn backtracking_start(pattern: &[u8], input: &[u8]) -> i32 {
    let reg = reg_new(pattern, &CompileOptions::default())
        .unwrap_or_else(|e| panic!("compile failed for {:?}: error {}", lossy(pattern), e));
    let mut region = Region::new();
    reg_search(&reg, input, 0, input.len(), &mut region)
}

fn s(pattern: &[u8], input: &[u8], start: i32) {
    let r = search_only(pattern, input);
    assert_eq!(
        r,
        start,
        "s: {:?} against {:?}",
        lossy(pattern),
        lossy(input)
    );
    assert_eq!(
        backtracking_start(pattern, input),
        start,
        "s: backtracking engine disagrees for {:?} against {:?}",
        lossy(pattern),
        lossy(input)
    );
}

fn ns(pattern: &[u8], input: &[u8]) {
    s(pattern, input, REG_MISMATCH);
}

fn unsupported(pattern: &[u8], code: i32) {
    match reg_search_new(pattern, REG_DEFAULT_SEARCH_STATE_LIMIT) {
        Ok(_) => panic!("unsupported: {:?} compiled", lossy(pattern)),
        Err(e) => assert_eq!(e, code, "unsupported: {:?}", lossy(pattern)),
    }
}

#[test]
fn literal_and_class_search() {
    s(b"a", b"walrus", 1);
    s(b"[abc]", b"walrus", 1);
    s(b"bcd", b"abcdefg", 1);
    ns(b"xyz", b"abcdefg");
    s(b"bb", b"bababababababababababb", 20);
    s(b"", b"walrus", 0);
}

#[test]
fn alternatives_report_earliest_start() {
    s(b"b|bcd|bc", b"abcdefg", 1);
    s(b"bcd|bc|b", b"abcdefg", 1);
    s(b"bcde|cd[^]*", b"abcdefg", 1);
    s(b"bcde|cd[^]*", b"abcdZfg", 2);
    ns(b"bcde|cd[^]*", b"abcZefg");
    s(b"abc|[^]*", b"b", 0);
    s(b"b|abc", b"abc", 0);
    s(b"b|abc", b"abd", 1);
}

#[test]
fn repetition_restarts() {
    s(b"a+a+a+", b"abaabaaabaaaa", 5);
    s(b"a*a*", b"abaabaaabaaaa", 0);
    s(b"a*a*a*bc*c*c*d*e*e*e*", b"abaabaaabaaaac", 0);
    s(b"a(?:b*b*c*c*|d*d*e*e*|f*f*g*g*|)*h", b"haccededh", 1);
    s(b"(?:a*a*b*)*c", b"abaabaaabaaaac", 0);
    s(b"x{3}", b"xxaxxxa", 3);
    ns(b"x{3}", b"xxaxxa");
}

#[test]
fn classes_with_escapes() {
    ns(
        br"[^0-9A-Za-z\s\x80-\xBF\xC3-\xFF]|\n\n| {2,}\n|\w+:\S",
        b"k",
    );
    s(
        br"[^0-9A-Za-z\s\x80-\xBF\xC3-\xFF]|\n\n| {2,}\n|\w+:\S",
        b"key:value",
        0,
    );
    s(
        br"[^0-9A-Za-z\s\x80-\xBF\xC3-\xFF]|\n\n| {2,}\n|\w+:\S",
        b"ab  \ncd",
        2,
    );
}

#[test]
fn long_counted_gaps() {
    let gap = b"c".repeat(40);
    let hay = [&b"a"[..], &gap, b"b"].concat();
    s(b"a.{40}b", &hay, 0);
    s(b"a.{40}b", &[&b"xa"[..], &hay].concat(), 2);
    ns(b"a.{40}b", &hay[..41]);
    s(b"a.{40}b", &[&b"a".repeat(80)[..], b"b"].concat(), 39);
    s(b"a[^x]{31}b", &[&b"a".repeat(40)[..], b"b"].concat(), 8);
    ns(b"a[^x]{31}b", &[&b"a".repeat(31)[..], b"xb"].concat());
    s(b"a[^x]{31}b", &[&b"a".repeat(31)[..], b"xb", &b"a".repeat(32), b"b"].concat(), 33);
}

#[test]
fn search_range() {
    let sreg = reg_search_new(b"ab", REG_DEFAULT_SEARCH_STATE_LIMIT).unwrap();
    assert_eq!(reg_search_only(&sreg, b"abxab", 1, 5), 3);
    assert_eq!(reg_search_only(&sreg, b"abxab", 1, 4), REG_MISMATCH);
    assert_eq!(reg_search_only(&sreg, b"abxab", 4, 2), ERR_INVALID_ARGUMENT);
}

#[test]
fn unsupported_constructs() {
    unsupported(b"^", ERR_UNSUPPORTED_ANCHOR);
    unsupported(b"a$", ERR_UNSUPPORTED_ANCHOR);
    unsupported(b"(a)", ERR_UNSUPPORTED_CAPTURE);
    unsupported(br"(a)\1", ERR_UNSUPPORTED_CAPTURE);
    unsupported(b"(?=a)", ERR_UNSUPPORTED_LOOKAROUND);
    unsupported(br"\ba", ERR_UNSUPPORTED_ANCHOR);
    assert!(reg_search_new(b"(?:ab)+", REG_DEFAULT_SEARCH_STATE_LIMIT).is_ok());
}

#[test]
fn state_limit_is_enforced() {
    assert_eq!(
        reg_search_new(b"(?:a|b)*a(?:a|b){8}", 4).err(),
        Some(ERR_TOO_COMPLEX)
    );
    assert!(reg_search_new(b"(?:a|b)*a(?:a|b){8}", REG_DEFAULT_SEARCH_STATE_LIMIT).is_ok());
}
