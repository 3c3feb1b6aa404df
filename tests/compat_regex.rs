// compat_regex.rs - Behavior table for the backtracking engine.
//
// Uses the same shape throughout:
//   x(pattern, input, groups)   -> anchored match at offset 0, expect every
//                                  capture pair (None = did not participate,
//                                  all None = no match)
//   fail(pattern)               -> compilation must fail
//
// Every case is checked both with DFA promotion and optimizer enabled and
// with the pure backtracking lowering.

use brex::regcomp::{reg_new, CompileOptions};
use brex::regdef::*;
use brex::regexec::{reg_match, reg_replace, reg_search};
use brex::regint::RegexType;

fn lossy(b: &[u8]) -> String {
    String::from_utf8_lossy(b).into_owned()
}

fn compile_with(pattern: &[u8], opts: &CompileOptions) -> RegexType {
    reg_new(pattern, opts).unwrap_or_else(|e| {
        panic!("compile failed for {:?}: error {}", lossy(pattern), e)
    })
}

fn all_options() -> [CompileOptions; 3] {
    [
        CompileOptions::default(),
        CompileOptions {
            dfa_promotion: false,
            optimize: false,
            ..CompileOptions::default()
        },
        CompileOptions {
            dfa_promotion: true,
            optimize: false,
            dfa_state_limit: 2,
        },
    ]
}

fn x(pattern: &[u8], input: &[u8], expected: &[Option<&str>]) {
    for opts in all_options() {
        let reg = compile_with(pattern, &opts);
        let mut region = Region::with_capacity(5);
        let r = reg_match(&reg, input, 0, input.len(), &mut region);
        assert!(
            r >= 0 || r == REG_MISMATCH,
            "x: error {} for {:?} against {:?}",
            r,
            lossy(pattern),
            lossy(input)
        );
        let actual: Vec<Option<String>> = region
            .iter()
            .map(|g| g.map(|(s, e)| lossy(&input[s..e])))
            .collect();
        let expected: Vec<Option<String>> =
            expected.iter().map(|g| g.map(|s| s.to_string())).collect();
        assert_eq!(
            actual,
            expected,
            "x: wrong captures for {:?} against {:?} ({:?})",
            lossy(pattern),
            lossy(input),
            opts
        );
    }
}

fn fail(pattern: &[u8]) {
    assert!(
        reg_new(pattern, &CompileOptions::default()).is_err(),
        "fail: {:?} compiled",
        lossy(pattern)
    );
}

#[test]
fn literals_and_classes() {
    x(b"abc", b"abc", &[Some("abc")]);
    x(b"abc", b"abcd", &[Some("abc")]);
    x(b"(ab)c", b"abc", &[Some("abc"), Some("ab")]);
    x(b"abc", b"def", &[None]);
    x(b"[Aa]", b"A", &[Some("A")]);
    x(b"[Aa][Bb][Cc]", b"Abc", &[Some("Abc")]);
    x(b"[Aa][Bb][Cc]", b"bcd", &[None]);
    x(b"[abc-]", b"b", &[Some("b")]);
    x(b"[a-b-c-d]", b"c", &[Some("c")]);
    x(b"[a-b-c-d]", b"-", &[Some("-")]);
    x(b"[]", b"a", &[None]);
    x(b"[^]", b"a", &[Some("a")]);
    x(b"\xC3[\xB8\x98]", "ø".as_bytes(), &[Some("ø")]);
    x(br"\xC3\xB8", "ø".as_bytes(), &[Some("ø")]);
    x(b"a[abc]c", b"abc", &[Some("abc")]);
    x(b"a[a-z]c", b"abc", &[Some("abc")]);
    x(b"a[a-zA-Z]c", b"aBc", &[Some("aBc")]);
    x(br"a[\w]c", b"abc", &[Some("abc")]);
    x(br"a\wc", b"abc", &[Some("abc")]);
    x(b"[abc]@[def]", b"b@d", &[Some("b@d")]);
    x(br"[abc]\?[def]", b"b?d", &[Some("b?d")]);
}

#[test]
fn escapes() {
    x(br"a\nb", b"a\nb", &[Some("a\nb")]);
    x(b"a\nb", b"a\nb", &[Some("a\nb")]);
    x(b"a[\n]b", b"a\nb", &[Some("a\nb")]);
    x(br"a\sb", b"a\nb", &[Some("a\nb")]);
    x(br"a\Db", b"a\nb", &[Some("a\nb")]);
    x(br"a\x62c", b"abc", &[Some("abc")]);
    x(br"\cB", b"\x01", &[Some("\x01")]);
    x(br"a.b", b"a\rb", &[None]);
    x(br"\d\D\s\S\w\W", b"1x 1_%", &[Some("1x 1_%")]);
}

#[test]
fn alternation_is_leftmost_first() {
    x(b"(abc|def)", b"abcx", &[Some("abc"), Some("abc")]);
    x(b"(abc|def)", b"defx", &[Some("def"), Some("def")]);
    x(b"(abc|def)", b"ghix", &[None, None]);
    x(b"(abc|abcd)de", b"abcde", &[Some("abcde"), Some("abc")]);
    x(b"(abc|abcd)de", b"abcdde", &[Some("abcdde"), Some("abcd")]);
    x(b"(abcd|abc)de", b"abcde", &[Some("abcde"), Some("abc")]);
    x(b"(abcd|abc)de", b"abcdde", &[Some("abcdde"), Some("abcd")]);
    x(b"(abc|def)(ghi|jkl)", b"abcghix", &[Some("abcghi"), Some("abc"), Some("ghi")]);
    x(b"(abc|def)(ghi|jkl)", b"abcjklx", &[Some("abcjkl"), Some("abc"), Some("jkl")]);
    x(b"(abc|def)(ghi|jkl)", b"defghix", &[Some("defghi"), Some("def"), Some("ghi")]);
    x(b"(abc|def)(ghi|jkl)", b"defjklx", &[Some("defjkl"), Some("def"), Some("jkl")]);
    x(b"(abc|def)(ghi|jkl)", b"abcdef", &[None, None, None]);
    x(b"(abc|def)(ghi|jkl)", b"abcgkl", &[None, None, None]);
    x(b"a|b|cd", b"b", &[Some("b")]);
    x(b"a|b|cd", b"cd", &[Some("cd")]);
    x(b"a|b||c", b"b", &[Some("b")]);
    x(b"(?:a|b||c)d", b"bd", &[Some("bd")]);
    x(b"a|", b"abc", &[Some("a")]);
    x(b"|a", b"abc", &[Some("")]);
    x(b"aa|a|aaa", b"aaa", &[Some("aa")]);
    x(b"a(?:aa)*|(?:aa)*", b"aaaa", &[Some("aaa")]);
    x(b"a||cd", b"cd", &[Some("")]);
    x(b"a(?:a||cd)b", b"acdb", &[Some("acdb")]);
    x(b"q(?:a|b|cd?e?f+g)h", b"qcdfffgh", &[Some("qcdfffgh")]);
    x(b"(?:q^|a|b|cd|e|$)", b"cd", &[Some("cd")]);
    x(b"(?:a^|b|(?:c|d?e|(?:f|g|hi)j+k)l|mn|o|$)", b"gjkl", &[Some("gjkl")]);
    x(b"a*(?:auth|axolotl|axe)", b"aaaxolotl", &[Some("aaaxolotl")]);
    x(b"(?:ab?c?)*(?:auth|author|axolotl|axe)", b"abaabcaxolotl", &[Some("abaabcaxolotl")]);
    x(br"<(@[&!]?\d+|#\d+)>", b"<@12345>", &[Some("<@12345>"), Some("@12345")]);
}

#[test]
fn backreferences() {
    x(br"(abc)?\1", b"", &[Some(""), None]);
    x(br"(abc)?\1", b"abc", &[Some(""), None]);
    x(br"(abc)?\1", b"abcabc", &[Some("abcabc"), Some("abc")]);
    x(br"((.)\2){3}", b"aabbccddeeff", &[Some("aabbcc"), Some("cc"), Some("c")]);
    x(br"((.)\2){2,4}", b"aabbcc", &[Some("aabbcc"), Some("cc"), Some("c")]);
    x(br"((.)\2){2,4}?", b"aabbcc", &[Some("aabb"), Some("bb"), Some("b")]);
    x(br"(ab){3}\1", b"ababababa", &[Some("abababab"), Some("ab")]);
    x(br"(a)b\1", b"aba", &[Some("aba"), Some("a")]);
    x(br"(?:(a)|b)\1", b"cd", &[None, None]);
    x(br"(?:(a)|b)\1", b"b", &[Some("b"), None]);
    x(br"(?:(a)b|aa)\1", b"aaa", &[Some("aa"), None]);
    x(br"(?:|(a?){0,2})\1b", b"a", &[None, None]);
    x(br"((a)\2|(b)\3){2}", b"aabb", &[Some("aabb"), Some("bb"), None, Some("b")]);
    x(br"((a)\2|(b)\3){2}", b"bbaa", &[Some("bbaa"), Some("aa"), Some("a"), None]);
}

#[test]
fn invalid_backreferences() {
    fail(br"(a)|\4");
    fail(br"(a)|\1");
    fail(br"(?!(a))\1");
    fail(br"\1(a)");
    fail(br"(a\1)");
    fail(br"\0a\1");
}

#[test]
fn quantified_captures() {
    x(b"(a){5}", b"aaaaaa", &[Some("aaaaa"), Some("a")]);
    x(b"([ab])*", b"ab", &[Some("ab"), Some("b")]);
    x(b"([ab])*", b"a", &[Some("a"), Some("a")]);
    x(b"([ab])*", b"", &[Some(""), None]);
    x(b"([ab])+?c", b"abc", &[Some("abc"), Some("b")]);
    x(b"((.)..)+", b"12345678", &[Some("123456"), Some("456"), Some("4")]);
    x(b"((.)..)+...", b"12345678", &[Some("123456"), Some("123"), Some("1")]);
    x(b"((.)..){1,5}", b"12345678", &[Some("123456"), Some("456"), Some("4")]);
    x(b"((.)..){1,5}...", b"12345678", &[Some("123456"), Some("123"), Some("1")]);
    x(b"((a)|(b))+", b"ab", &[Some("ab"), Some("b"), None, Some("b")]);
    x(b"((a)|(b))+", b"ba", &[Some("ba"), Some("a"), Some("a"), None]);
    x(b"((a)|(b)){2}", b"ab", &[Some("ab"), Some("b"), None, Some("b")]);
    x(b"((a)|(b)){2}", b"ba", &[Some("ba"), Some("a"), Some("a"), None]);
    x(b"(ab)*", b"ababababa", &[Some("abababab"), Some("ab")]);
    x(b"(ab){3}", b"ababababa", &[Some("ababab"), Some("ab")]);
}

#[test]
fn lookaheads() {
    x(b"((?=(.b)))a", b"ab", &[Some("a"), Some(""), Some("ab")]);
    x(b"((?!(.b)))a", b"ab", &[None, None, None]);
    x(b"((?=(.b)))a", b"ac", &[None, None, None]);
    x(b"((?!(.b)))a", b"ac", &[Some("a"), Some(""), None]);
    x(br"(?!(.)\1)a", b"ab", &[Some("a"), None]);
    x(br"(?!(.)\1)a", b"aa", &[None, None]);
    x(b"(?!(?!(a)))", b"a", &[Some(""), None]);
    x(b"(?!(?!(a)))", b"b", &[None, None]);
}

#[test]
fn word_boundaries() {
    x(br"\b.\b.\B", b"a+", &[Some("a+")]);
    x(br"\B.\b.\b", b"+a", &[Some("+a")]);
    x(br".\b.", b"++", &[None]);
    x(br".\b.", b"aa", &[None]);
    x(br"\b.", b"+", &[None]);
    x(br"\B.", b"a", &[None]);
    x(br".\b", b"+", &[None]);
    x(br".\B", b"a", &[None]);
    x(br"\b", b"a", &[Some("")]);
    x(br"\B", b"a", &[None]);
    x(br"\b", b"%", &[None]);
    x(br"\B", b"%", &[Some("")]);
    x(br"\b", b"", &[None]);
    x(br"\B", b"", &[Some("")]);
    x(br".\b.", b"a%", &[Some("a%")]);
    x(br".\B.", b"ab", &[Some("ab")]);
    x(br".\b.", b"ab", &[None]);
    x(br".\B.", b"a%", &[None]);
}

#[test]
fn backtracking_through_repetition() {
    x(b"^(?:a|ab)*", b"aabababaaaabab", &[Some("aa")]);
    x(b"^(?:a|ab)*$", b"aabababaaaabab", &[Some("aabababaaaabab")]);
    x(b"^(?:ab|a)*", b"aabababaaaabab", &[Some("aabababaaaabab")]);
    x(b"(?:aa)+(?:aaa)+", b"aaaaaaaaaa", &[Some("aaaaaaaaa")]);
    x(b"a?a?(?:aa)?", b"aaa", &[Some("aa")]);
    x(b"(?:a*)a", b"aa", &[Some("aa")]);
    x(b"(?:a*)b", b"ab", &[Some("ab")]);
    x(b"(?:ab)*ab", b"abab", &[Some("abab")]);
    x(b"(?:ab)*aab", b"abaab", &[Some("abaab")]);
    x(b"a*b+c?d", b"abcd", &[Some("abcd")]);
    x(b"ab*c", b"abbc", &[Some("abbc")]);
    x(b"aaabc", b"aaabcd", &[Some("aaabc")]);
    x(b"cd?e?f+g*hi", b"cdfffghi", &[Some("cdfffghi")]);
}

#[test]
fn counted_repetition() {
    x(b"a?a?a?a?a?bc", b"aaabcd", &[Some("aaabc")]);
    x(b"a?a?a?a?a?bc", b"aaaaaabcd", &[None]);
    x(b"a?a?a?a?a?", b"aaaaaabcd", &[Some("aaaaa")]);
    x(b"a??a??a??a??a??", b"aaaaaabcd", &[Some("")]);
    x(b"a*b*c*", b"aaabcccd", &[Some("aaabccc")]);
    x(b"a*b*c*?", b"aaabcccd", &[Some("aaab")]);
    x(b"a+b+c+", b"aaabcccd", &[Some("aaabccc")]);
    x(b"a+b+c+?", b"aaabcccd", &[Some("aaabc")]);
    x(b"a{2,5}bc", b"aaaabcd", &[Some("aaaabc")]);
    x(b"a{2,5}", b"aaaabcd", &[Some("aaaa")]);
    x(b"a{2,5}?", b"aaaabcd", &[Some("aa")]);
    x(b"a{2,5}?b", b"aaaabcd", &[Some("aaaab")]);
    x(b"a{2,5}?b", b"aaaaaabcd", &[None]);
    x(b"a{5}", b"aaaaaabcd", &[Some("aaaaa")]);
    x(b"a{5}?", b"aaaaaabcd", &[Some("aaaaa")]);
    x(b"a{1}?", b"aaaaaabcd", &[Some("a")]);
    x(b"a{,5}", b"aaa", &[Some("aaa")]);
    x(b"a{,5}", b"aaabc", &[Some("aaa")]);
    x(b"a{,5}?", b"aaa", &[Some("")]);
    x(b"a{,5}?", b"aaabc", &[Some("")]);
    x(b"a{,5}bc", b"aaa", &[None]);
    x(b"a{,5}bc", b"aaabc", &[Some("aaabc")]);
    x(b"a{,5}?bc", b"aaa", &[None]);
    x(b"a{,5}?bc", b"aaabc", &[Some("aaabc")]);
    x(b"a{3,}?", b"aaaaa", &[Some("aaa")]);
    x(b"a{3,}", b"aaaaa", &[Some("aaaaa")]);
    x(b"ax{0}bc", b"abc", &[Some("abc")]);
    x(b"a?", b"aaa", &[Some("a")]);
    x(b"a??", b"aaa", &[Some("")]);
    x(b"a+", b"aaa", &[Some("aaa")]);
    x(b"a+?", b"aaa", &[Some("a")]);
    x(b"a*", b"aaa", &[Some("aaa")]);
    x(b"a*?", b"aaa", &[Some("")]);
}

#[test]
fn zero_width_repetition_terminates() {
    x(b"(?:)+e", b"e", &[Some("e")]);
    x(b"()+e", b"e", &[Some("e"), Some("")]);
    x(b"(?:a?)*b", b"aab", &[Some("aab")]);
    x(b"(a|)*b", b"aab", &[Some("aab"), Some("a")]);
    x(b"(?:(?=a)a?)*b", b"aab", &[Some("aab")]);
}

#[test]
fn syntax_errors() {
    fail(b"a[A-]]c");
    fail(b"(?:");
    fail(b"(a");
    fail(b"a)");
    fail(b"a**");
    fail(b"*a");
    fail(b"a{3,2}");
    fail(br"\q");
    fail(br"\x4");
    fail(b"^*");
    fail(b"(?=a)+");
    assert!(reg_new(b"(?:)", &CompileOptions::default()).is_ok());
    assert!(reg_new(b"", &CompileOptions::default()).is_ok());
}

#[test]
fn search_finds_leftmost_match() {
    let reg = compile_with(b"bc", &CompileOptions::default());
    let mut region = Region::new();
    assert_eq!(reg_search(&reg, b"abc", 0, 3, &mut region), 1);
    assert_eq!(region.get(0), Some((1, 3)));

    let reg = compile_with(b"(abc) (123)", &CompileOptions::default());
    let text = b"abc 123".to_vec();
    assert_eq!(reg_match(&reg, &text, 0, text.len(), &mut region), 7);
    assert_eq!(region.get(1), Some((0, 3)));
    assert_eq!(region.get(2), Some((4, 7)));
}

#[test]
fn replace_substitutes_groups() {
    let reg = compile_with(b"f(oo)", &CompileOptions::default());
    assert_eq!(reg_replace(&reg, b"foofoobarfoo", br"\1"), b"oooobaroo".to_vec());
    assert_eq!(reg_replace(&reg, b"xyz", br"\1"), b"xyz".to_vec());
}

#[test]
fn region_capacity_limits_groups() {
    let reg = compile_with(b"(a)(b)(c)(d)(e)(f)", &CompileOptions::default());
    let mut region = Region::with_capacity(3);
    assert_eq!(reg_match(&reg, b"abcdef", 0, 6, &mut region), 6);
    assert_eq!(region.len(), 3);
    assert_eq!(region.get(2), Some((1, 2)));

    let mut region = Region::new();
    assert_eq!(reg_match(&reg, b"abcdef", 0, 6, &mut region), 6);
    assert_eq!(region.len(), 7);
    assert!(region.spilled());
    assert_eq!(region.get(6), Some((5, 6)));
}
