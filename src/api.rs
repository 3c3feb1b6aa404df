// api.rs - Idiomatic Rust API for brex.
//
// Wraps the C-style internals (reg_new, reg_search, reg_search_only, etc.)
// with Rust-native types: Regex, RegexBuilder, SearchRegex, Match,
// Captures, FindIter, Split.

use std::ops::Range;

use crate::error::RegexError;
use crate::regcomp::{reg_new, CompileOptions};
use crate::regdef::*;
use crate::regdump::{reg_dump, reg_search_dump};
use crate::regexec::{reg_match, reg_replace, reg_search};
use crate::regint::RegexType;
use crate::regsearch::{reg_search_new, reg_search_only, SearchType};
use crate::regtrav::reg_required_substrs;

/// A compiled regular expression.
///
/// Matching reuses scratch space stored in the pattern, so a `Regex` can
/// move between threads but not be shared by them; compile one per thread.
///
/// # Examples
///
/// ```
/// use brex::api::Regex;
///
/// let re = Regex::new(r"\d+").unwrap();
/// assert!(re.is_match("hello 42"));
///
/// let m = re.find("hello 42").unwrap();
/// assert_eq!(m.as_str(), "42");
/// assert_eq!(m.start(), 6);
/// assert_eq!(m.end(), 8);
/// ```
pub struct Regex {
    inner: RegexType,
}

impl Regex {
    /// Compile a pattern using default options.
    pub fn new(pattern: &str) -> Result<Regex, RegexError> {
        Self::new_bytes(pattern.as_bytes())
    }

    /// Compile a pattern from raw bytes using default options.
    pub fn new_bytes(pattern: &[u8]) -> Result<Regex, RegexError> {
        let inner = reg_new(pattern, &CompileOptions::default())?;
        Ok(Regex { inner })
    }

    /// Create a [`RegexBuilder`] for fine-grained control over compilation.
    pub fn builder(pattern: &str) -> RegexBuilder {
        RegexBuilder::new(pattern)
    }

    /// Return the first match in `text`, or `None` if no match.
    pub fn find<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.find_bytes(text.as_bytes())
    }

    /// Return the first match in `text` (as bytes), or `None` if no match.
    pub fn find_bytes<'t>(&self, text: &'t [u8]) -> Option<Match<'t>> {
        self.find_at(text, 0)
    }

    /// Return the first match starting at or after `start`.
    pub fn find_at<'t>(&self, text: &'t [u8], start: usize) -> Option<Match<'t>> {
        if start > text.len() {
            return None;
        }
        let mut region = Region::with_capacity(1);
        let result = reg_search(&self.inner, text, start, text.len(), &mut region);
        if result < 0 {
            return None;
        }
        let (start, end) = region.get(0)?;
        Some(Match { text, start, end })
    }

    /// Check whether `text` matches the pattern anywhere.
    pub fn is_match(&self, text: &str) -> bool {
        self.is_match_bytes(text.as_bytes())
    }

    /// Check whether `text` (as bytes) matches the pattern anywhere.
    pub fn is_match_bytes(&self, text: &[u8]) -> bool {
        let mut region = Region::with_capacity(0);
        reg_search(&self.inner, text, 0, text.len(), &mut region) >= 0
    }

    /// Return the first match with all capture groups, or `None`.
    pub fn captures<'t>(&self, text: &'t str) -> Option<Captures<'t>> {
        self.captures_bytes(text.as_bytes())
    }

    /// Return the first match with all capture groups (bytes), or `None`.
    pub fn captures_bytes<'t>(&self, text: &'t [u8]) -> Option<Captures<'t>> {
        self.search_at(text, 0, text.len())
    }

    /// Match anchored at `from`, with `to` as the end of the subject.
    /// `^` still refers to offset 0 of `text`.
    pub fn match_at<'t>(&self, text: &'t [u8], from: usize, to: usize) -> Option<Captures<'t>> {
        let mut region = Region::new();
        if reg_match(&self.inner, text, from, to, &mut region) < 0 {
            return None;
        }
        Some(Captures { text, region })
    }

    /// First match starting in `from..to` and ending at or before `to`.
    pub fn search_at<'t>(&self, text: &'t [u8], from: usize, to: usize) -> Option<Captures<'t>> {
        let mut region = Region::new();
        if reg_search(&self.inner, text, from, to, &mut region) < 0 {
            return None;
        }
        Some(Captures { text, region })
    }

    /// Replace every non-overlapping match with `template`, in which
    /// `\0`..`\9` insert a capture group and `\\` a backslash.
    ///
    /// ```
    /// use brex::api::Regex;
    ///
    /// let re = Regex::new("f(oo)").unwrap();
    /// assert_eq!(re.replace(b"foofoobarfoo", br"\1"), b"oooobaroo");
    /// ```
    pub fn replace(&self, text: &[u8], template: &[u8]) -> Vec<u8> {
        reg_replace(&self.inner, text, template)
    }

    /// Split `text` at every match. An empty match at the start of a piece
    /// does not split.
    pub fn split<'r, 't>(&'r self, text: &'t str) -> Split<'r, 't> {
        self.split_bytes(text.as_bytes())
    }

    /// Split `text` (as bytes) at every match.
    pub fn split_bytes<'r, 't>(&'r self, text: &'t [u8]) -> Split<'r, 't> {
        Split {
            regex: self,
            text,
            piece_start: 0,
            search_pos: 0,
            limit: None,
            finished: false,
        }
    }

    /// Split into at most `limit` pieces; the last piece holds the rest.
    pub fn splitn<'r, 't>(&'r self, text: &'t str, limit: usize) -> Split<'r, 't> {
        self.splitn_bytes(text.as_bytes(), limit)
    }

    /// Split `text` (as bytes) into at most `limit` pieces.
    pub fn splitn_bytes<'r, 't>(&'r self, text: &'t [u8], limit: usize) -> Split<'r, 't> {
        Split {
            limit: Some(limit),
            ..self.split_bytes(text)
        }
    }

    /// Iterate over all non-overlapping matches in `text`.
    pub fn find_iter<'r, 't>(&'r self, text: &'t str) -> FindIter<'r, 't> {
        self.find_iter_bytes(text.as_bytes())
    }

    /// Iterate over all non-overlapping matches in `text` (as bytes).
    pub fn find_iter_bytes<'r, 't>(&'r self, text: &'t [u8]) -> FindIter<'r, 't> {
        FindIter {
            regex: self,
            text,
            pos: 0,
        }
    }

    /// Return the number of capture groups in the pattern (excluding group 0).
    pub fn captures_len(&self) -> usize {
        self.inner.num_captures as usize - 1
    }

    /// Literal substrings every match contains.
    pub fn required_substrs(&self) -> &[Vec<u8>] {
        &self.inner.required_substrs
    }

    /// Human-readable listing of the compiled program.
    pub fn dump(&self) -> String {
        reg_dump(&self.inner)
    }

    /// Access the underlying `RegexType` for advanced / C-style usage.
    pub fn as_raw(&self) -> &RegexType {
        &self.inner
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regex")
            .field("insns", &self.inner.insns.len())
            .field("dfas", &self.inner.dfas.len())
            .finish_non_exhaustive()
    }
}

/// Literal substrings any match of `pattern` contains, without compiling
/// the pattern.
///
/// ```
/// let subs = brex::api::required_substrs("abc.def").unwrap();
/// assert_eq!(subs, vec![b"abc".to_vec(), b"def".to_vec()]);
/// ```
pub fn required_substrs(pattern: &str) -> Result<Vec<Vec<u8>>, RegexError> {
    Ok(reg_required_substrs(pattern.as_bytes())?)
}

// === RegexBuilder ===

/// Builder for compiling a [`Regex`] with custom options.
///
/// # Examples
///
/// ```
/// use brex::api::Regex;
///
/// let re = Regex::builder(r"a+a+a+b")
///     .dfa_promotion(false)
///     .build()
///     .unwrap();
/// assert!(re.is_match("aaab"));
/// ```
pub struct RegexBuilder {
    pattern: Vec<u8>,
    options: CompileOptions,
}

impl RegexBuilder {
    /// Create a new builder for the given pattern.
    pub fn new(pattern: &str) -> Self {
        Self::new_bytes(pattern.as_bytes())
    }

    pub fn new_bytes(pattern: &[u8]) -> Self {
        RegexBuilder {
            pattern: pattern.to_vec(),
            options: CompileOptions::default(),
        }
    }

    /// Enable or disable replacing byte-only repetitions with DFAs.
    pub fn dfa_promotion(mut self, yes: bool) -> Self {
        self.options.dfa_promotion = yes;
        self
    }

    /// Enable or disable the peephole optimizer.
    pub fn optimize(mut self, yes: bool) -> Self {
        self.options.optimize = yes;
        self
    }

    /// Cap the states of each embedded DFA. Runs needing more are compiled
    /// to backtracking code instead.
    pub fn dfa_state_limit(mut self, limit: usize) -> Self {
        self.options.dfa_state_limit = limit;
        self
    }

    /// Compile the pattern into a [`Regex`].
    pub fn build(self) -> Result<Regex, RegexError> {
        let inner = reg_new(&self.pattern, &self.options)?;
        Ok(Regex { inner })
    }
}

// === SearchRegex ===

/// A pattern compiled for search only: reports the leftmost start offset
/// of a match in a single pass, without captures or the match length.
///
/// Anchors, capture groups, backreferences and lookaheads are rejected with
/// [`RegexError::Unsupported`]. A `SearchRegex` is immutable and may be
/// shared between threads.
///
/// ```
/// use brex::api::SearchRegex;
///
/// let re = SearchRegex::new("b|abc").unwrap();
/// assert_eq!(re.find("xabc"), Some(1));
/// assert!(SearchRegex::new("(a)").is_err());
/// ```
pub struct SearchRegex {
    inner: SearchType,
}

impl SearchRegex {
    pub fn new(pattern: &str) -> Result<SearchRegex, RegexError> {
        Self::new_bytes(pattern.as_bytes())
    }

    pub fn new_bytes(pattern: &[u8]) -> Result<SearchRegex, RegexError> {
        SearchRegexBuilder::new_bytes(pattern).build()
    }

    pub fn builder(pattern: &str) -> SearchRegexBuilder {
        SearchRegexBuilder::new_bytes(pattern.as_bytes())
    }

    /// Start offset of the leftmost match in `text`.
    pub fn find(&self, text: &str) -> Option<usize> {
        self.find_bytes(text.as_bytes())
    }

    pub fn find_bytes(&self, text: &[u8]) -> Option<usize> {
        self.find_at(text, 0, text.len())
    }

    /// Leftmost start in `from..to` of a match ending at or before `to`.
    pub fn find_at(&self, text: &[u8], from: usize, to: usize) -> Option<usize> {
        let r = reg_search_only(&self.inner, text, from, to);
        (r >= 0).then_some(r as usize)
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.find(text).is_some()
    }

    pub fn is_match_bytes(&self, text: &[u8]) -> bool {
        self.find_bytes(text).is_some()
    }

    /// Human-readable listing of the search table.
    pub fn dump(&self) -> String {
        reg_search_dump(&self.inner)
    }

    pub fn as_raw(&self) -> &SearchType {
        &self.inner
    }
}

impl std::fmt::Debug for SearchRegex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchRegex")
            .field("states", &self.inner.nodes.len())
            .finish_non_exhaustive()
    }
}

/// Builder for a [`SearchRegex`].
pub struct SearchRegexBuilder {
    pattern: Vec<u8>,
    state_limit: usize,
}

impl SearchRegexBuilder {
    pub fn new_bytes(pattern: &[u8]) -> Self {
        SearchRegexBuilder {
            pattern: pattern.to_vec(),
            state_limit: REG_DEFAULT_SEARCH_STATE_LIMIT,
        }
    }

    /// Cap the automaton sizes. A pattern whose base DFA needs more states
    /// fails with [`RegexError::TooComplex`]; search states past the cap are
    /// computed while scanning instead of stored.
    pub fn state_limit(mut self, limit: usize) -> Self {
        self.state_limit = limit;
        self
    }

    pub fn build(self) -> Result<SearchRegex, RegexError> {
        let inner = reg_search_new(&self.pattern, self.state_limit)?;
        Ok(SearchRegex { inner })
    }
}

// === Match ===

/// A single match result referencing the original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t [u8],
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the match (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    /// Byte range of the match.
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The matched text as a byte slice.
    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }

    /// The matched text as a `&str`.
    ///
    /// # Panics
    ///
    /// Panics if the matched bytes are not valid UTF-8.
    pub fn as_str(&self) -> &'t str {
        std::str::from_utf8(self.as_bytes()).expect("match is not valid UTF-8")
    }

    /// Returns the length of the match in bytes.
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the match is empty (zero-length).
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// === Captures ===

/// All capture groups from a single match.
///
/// Group 0 is the entire match. Groups 1..N correspond to `(...)` in the pattern.
pub struct Captures<'t> {
    text: &'t [u8],
    region: Region,
}

impl<'t> Captures<'t> {
    /// Get capture group `i`, or `None` if the group did not participate.
    ///
    /// Group 0 is the entire match.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let (start, end) = self.region.get(i)?;
        Some(Match {
            text: self.text,
            start,
            end,
        })
    }

    /// Number of capture groups (including group 0).
    pub fn len(&self) -> usize {
        self.region.len()
    }

    /// Returns `true` if there are no capture groups (should never happen for a valid match).
    pub fn is_empty(&self) -> bool {
        self.region.is_empty()
    }

    /// Iterate over all capture groups.
    pub fn iter(&self) -> CapturesIter<'_, 't> {
        CapturesIter {
            captures: self,
            index: 0,
        }
    }

    /// The raw capture pairs.
    pub fn region(&self) -> &Region {
        &self.region
    }
}

impl std::fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.len() {
            list.entry(&self.get(i).map(|m| String::from_utf8_lossy(m.as_bytes())));
        }
        list.finish()
    }
}

// === CapturesIter ===

/// Iterator over capture groups in a [`Captures`].
pub struct CapturesIter<'c, 't> {
    captures: &'c Captures<'t>,
    index: usize,
}

impl<'c, 't> Iterator for CapturesIter<'c, 't> {
    type Item = Option<Match<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.captures.len() {
            return None;
        }
        let m = self.captures.get(self.index);
        self.index += 1;
        Some(m)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.captures.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CapturesIter<'_, '_> {}

// === FindIter ===

/// Iterator over all non-overlapping matches in a text.
pub struct FindIter<'r, 't> {
    regex: &'r Regex,
    text: &'t [u8],
    pos: usize,
}

impl<'r, 't> Iterator for FindIter<'r, 't> {
    type Item = Match<'t>;

    fn next(&mut self) -> Option<Match<'t>> {
        if self.pos >= self.text.len() {
            return None;
        }
        let m = self.regex.find_at(self.text, self.pos)?;
        // Step past empty matches so the next search makes progress.
        self.pos = if m.is_empty() { m.end + 1 } else { m.end };
        Some(m)
    }
}

// === Split ===

/// Iterator over the pieces of a text between matches.
pub struct Split<'r, 't> {
    regex: &'r Regex,
    text: &'t [u8],
    piece_start: usize,
    search_pos: usize,
    limit: Option<usize>,
    finished: bool,
}

impl<'r, 't> Split<'r, 't> {
    fn rest(&mut self) -> &'t [u8] {
        self.finished = true;
        &self.text[self.piece_start..]
    }
}

impl<'r, 't> Iterator for Split<'r, 't> {
    type Item = &'t [u8];

    fn next(&mut self) -> Option<&'t [u8]> {
        if self.finished {
            return None;
        }
        match self.limit {
            Some(0) => {
                self.finished = true;
                return None;
            }
            Some(1) => return Some(self.rest()),
            _ => {}
        }
        loop {
            let Some(m) = self.regex.find_at(self.text, self.search_pos) else {
                return Some(self.rest());
            };
            if m.is_empty() && m.start == self.piece_start {
                self.search_pos = m.start + 1;
                continue;
            }
            let piece = &self.text[self.piece_start..m.start];
            self.piece_start = m.end;
            self.search_pos = m.end;
            if let Some(n) = self.limit.as_mut() {
                *n -= 1;
            }
            return Some(piece);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pieces<'t>(re: &Regex, text: &'t str) -> Vec<&'t str> {
        re.split(text)
            .map(|p| std::str::from_utf8(p).unwrap())
            .collect()
    }

    #[test]
    fn match_accessors() {
        let re = Regex::new(r"x+").unwrap();
        let m = re.find("abxxxc").unwrap();
        assert_eq!((m.start(), m.end(), m.len()), (2, 5, 3));
        assert_eq!(m.range(), 2..5);
        assert_eq!(m.as_bytes(), b"xxx");
        assert!(!m.is_empty());
    }

    #[test]
    fn byte_haystacks() {
        let re = Regex::new(r"\xFF+").unwrap();
        let m = re.find_bytes(b"\x00\xFF\xFF\x01").unwrap();
        assert_eq!(m.range(), 1..3);
        assert!(re.is_match_bytes(b"\xFF"));
        assert!(!re.is_match_bytes(b"\xFE"));
    }

    #[test]
    fn captures_keep_last_iteration() {
        let re = Regex::new(r"(?:(\d)-)+").unwrap();
        let caps = re.captures("1-2-3-x").unwrap();
        assert_eq!(caps.get(0).unwrap().as_str(), "1-2-3-");
        assert_eq!(caps.get(1).unwrap().as_str(), "3");
        assert_eq!(re.captures_len(), 1);
    }

    #[test]
    fn unset_groups_iterate_as_none() {
        let re = Regex::new(r"(a)(b)?").unwrap();
        let caps = re.captures("a").unwrap();
        let set: Vec<bool> = caps.iter().map(|m| m.is_some()).collect();
        assert_eq!(set, vec![true, true, false]);
    }

    #[test]
    fn builder_without_promotion() {
        let re = Regex::builder(r"a+a+a+b")
            .dfa_promotion(false)
            .optimize(false)
            .build()
            .unwrap();
        assert!(re.as_raw().dfas.is_empty());
        assert_eq!(re.find("xaaab").unwrap().range(), 1..5);
        let promoted = Regex::new(r"a+a+a+b").unwrap();
        assert_eq!(promoted.as_raw().dfas.len(), 1);
    }

    #[test]
    fn invalid_pattern_code() {
        let err = Regex::new(r"a{2,1}").unwrap_err();
        assert_eq!(err.code(), ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE);
    }

    #[test]
    fn find_iter_steps_over_empty_matches() {
        let re = Regex::new(r"b*").unwrap();
        let spans: Vec<_> = re.find_iter("abba").map(|m| m.range()).collect();
        assert_eq!(spans, vec![0..0, 1..3, 3..3]);
    }

    #[test]
    fn match_at_is_anchored() {
        let re = Regex::new(r"b+").unwrap();
        assert!(re.match_at(b"abb", 0, 3).is_none());
        let caps = re.match_at(b"abb", 1, 3).unwrap();
        assert_eq!(caps.get(0).unwrap().range(), 1..3);
        let caps = re.match_at(b"abb", 1, 2).unwrap();
        assert_eq!(caps.get(0).unwrap().range(), 1..2);
    }

    #[test]
    fn split_pieces() {
        let re = Regex::new(r"\b|a").unwrap();
        assert_eq!(pieces(&re, "foo bar baz"), vec!["foo", " ", "b", "r", " ", "b", "z"]);
        let re = Regex::new("a").unwrap();
        assert_eq!(pieces(&re, "aabcaada"), vec!["", "", "bc", "", "d", ""]);
        assert_eq!(pieces(&re, ""), vec![""]);
    }

    #[test]
    fn splitn_keeps_rest() {
        let re = Regex::new(",").unwrap();
        let parts: Vec<_> = re.splitn("a,b,c", 2).collect();
        assert_eq!(parts, vec![&b"a"[..], &b"b,c"[..]]);
        assert_eq!(re.splitn("a,b", 0).count(), 0);
    }

    #[test]
    fn replace_every_match() {
        let re = Regex::new("f(oo)").unwrap();
        assert_eq!(re.replace(b"foofoobarfoo", br"\1"), b"oooobaroo".to_vec());
    }

    #[test]
    fn search_regex_agrees() {
        let re = SearchRegex::new("a+b").unwrap();
        assert_eq!(re.find("xxaab"), Some(2));
        assert!(!re.is_match("xxaa"));
        let err = SearchRegex::new("^a").unwrap_err();
        assert!(matches!(err, RegexError::Unsupported { .. }));
        let err = SearchRegex::builder("[ab]*a[ab]{7}")
            .state_limit(32)
            .build()
            .unwrap_err();
        assert_eq!(err, RegexError::TooComplex);
    }

    #[test]
    fn required_substrs_helpers() {
        let re = Regex::new("abc+").unwrap();
        assert_eq!(re.required_substrs(), &[b"ab".to_vec()]);
        assert!(required_substrs("(a").is_err());
    }
}
