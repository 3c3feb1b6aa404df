// regdef.rs - Public types and constants.
// Result codes, limits, and the Region (capture-pair) match result.

use smallvec::SmallVec;

// === Result Codes ===
pub const REG_NORMAL: i32 = 0;
pub const REG_MISMATCH: i32 = -1;

// internal errors
pub const ERR_PARSE_DEPTH_LIMIT_OVER: i32 = -16;
pub const ERR_PARSER_BUG: i32 = -11;
pub const ERR_STACK_BUG: i32 = -12;
pub const ERR_UNDEFINED_INSN: i32 = -13;
pub const ERR_INVALID_ARGUMENT: i32 = -30;

// syntax errors
pub const ERR_END_PATTERN_AT_LEFT_BRACE: i32 = -100;
pub const ERR_PREMATURE_END_OF_CHAR_CLASS: i32 = -104;
pub const ERR_END_PATTERN_AT_ESCAPE: i32 = -105;
pub const ERR_CONTROL_CODE_SYNTAX: i32 = -109;
pub const ERR_CHAR_CLASS_VALUE_AT_END_OF_RANGE: i32 = -110;
pub const ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE: i32 = -111;
pub const ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED: i32 = -113;
pub const ERR_TARGET_OF_REPEAT_OPERATOR_INVALID: i32 = -114;
pub const ERR_NESTED_REPEAT_OPERATOR: i32 = -115;
pub const ERR_UNMATCHED_CLOSE_PARENTHESIS: i32 = -116;
pub const ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS: i32 = -117;
pub const ERR_END_PATTERN_IN_GROUP: i32 = -118;
pub const ERR_UNDEFINED_GROUP_OPTION: i32 = -119;
pub const ERR_UNESCAPED_META_CHARACTER: i32 = -120;
pub const ERR_INVALID_ESCAPE: i32 = -121;
pub const ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE: i32 = -200;
pub const ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE: i32 = -201;
pub const ERR_INVALID_REPEAT_RANGE_PATTERN: i32 = -202;
pub const ERR_EMPTY_RANGE_IN_CHAR_CLASS: i32 = -203;
pub const ERR_TOO_MANY_CAPTURES: i32 = -210;
pub const ERR_INVALID_BACKREF: i32 = -208;
pub const ERR_TOO_SHORT_HEX_ESCAPE: i32 = -212;

// search-only engine restrictions
pub const ERR_UNSUPPORTED_ANCHOR: i32 = -300;
pub const ERR_UNSUPPORTED_CAPTURE: i32 = -301;
pub const ERR_UNSUPPORTED_BACKREF: i32 = -302;
pub const ERR_UNSUPPORTED_LOOKAROUND: i32 = -303;
pub const ERR_TOO_COMPLEX: i32 = -310;

#[inline]
pub fn reg_is_pattern_error(ecode: i32) -> bool {
    ecode <= -100 && ecode > -300
}

/// Whether `from..to` is a searchable range of a `len`-byte subject.
#[inline]
pub fn reg_valid_range(len: usize, from: usize, to: usize) -> bool {
    from <= to && to <= len && to <= REG_MAX_SUBJECT_LEN
}

#[inline]
pub fn reg_is_unsupported_error(ecode: i32) -> bool {
    ecode <= -300 && ecode > ERR_TOO_COMPLEX
}

// === Limits ===
pub const REG_MAX_REPEAT_NUM: u32 = 100_000;
pub const REG_DEFAULT_MAX_CAPTURE_NUM: u32 = 32767;
/// Group nesting accepted by default. Later passes recurse once per tree
/// level, so this stays small enough for a 2 MiB thread stack.
pub const REG_DEFAULT_PARSE_DEPTH_LIMIT: u32 = 128;
/// Offsets are returned as `i32`, so a search range may not end past this.
pub const REG_MAX_SUBJECT_LEN: usize = i32::MAX as usize;
pub const REG_DEFAULT_DFA_STATE_LIMIT: usize = 4096;
pub const REG_DEFAULT_SEARCH_STATE_LIMIT: usize = 8192;

/// Number of capture pairs a [`Region`] keeps inline before spilling
/// to the heap (group 0 plus four groups).
pub const REGION_INLINE_GROUPS: usize = 5;

// === Region (match result) ===

/// Capture pairs of one match. Entry 0 is the whole match; an entry is
/// `None` when its group did not participate.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Region {
    pub(crate) groups: SmallVec<[Option<(usize, usize)>; REGION_INLINE_GROUPS]>,
    /// Requested capacity; `None` means "every group of the pattern".
    pub(crate) capacity: Option<usize>,
}

impl Region {
    pub fn new() -> Self {
        Region {
            groups: SmallVec::new(),
            capacity: None,
        }
    }

    /// A region that records at most `n` pairs (group 0 included).
    pub fn with_capacity(n: usize) -> Self {
        Region {
            groups: SmallVec::new(),
            capacity: Some(n),
        }
    }

    pub fn clear(&mut self) {
        for g in self.groups.iter_mut() {
            *g = None;
        }
    }

    /// Size the region for a pattern with `num_groups` pairs.
    pub(crate) fn resize(&mut self, num_groups: usize) {
        let n = match self.capacity {
            Some(cap) => cap.min(num_groups),
            None => num_groups,
        };
        self.groups.clear();
        self.groups.resize(n, None);
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Start and end of pair `i`.
    pub fn get(&self, i: usize) -> Option<(usize, usize)> {
        self.groups.get(i).copied().flatten()
    }

    /// True when the pairs no longer fit inline.
    pub fn spilled(&self) -> bool {
        self.groups.spilled()
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<(usize, usize)>> + '_ {
        self.groups.iter().copied()
    }
}
