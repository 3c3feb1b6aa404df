//! # brex
//!
//! Byte-oriented regular expressions: a backtracking matcher with
//! captures, backreferences and lookaheads whose byte-only repetitions run
//! on embedded DFAs, plus a search-only engine that compiles capture-free
//! patterns into one table and finds the leftmost match in a single pass.
//!
//! ## Quick Start
//!
//! ```rust
//! use brex::prelude::*;
//!
//! let re = Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap();
//! let m = re.find("Date: 2026-02-12").unwrap();
//! assert_eq!(m.as_bytes(), b"2026-02-12");
//! assert_eq!(m.start(), 6);
//! ```
//!
//! Captures and backreferences:
//!
//! ```rust
//! use brex::prelude::*;
//!
//! let re = Regex::new(r"(abc|abcd)de").unwrap();
//! let caps = re.captures("abcdde").unwrap();
//! assert_eq!(caps.get(1).unwrap().as_str(), "abcd");
//!
//! let re = Regex::new(r"(abc)?\1").unwrap();
//! let caps = re.match_at(b"", 0, 0).unwrap();
//! assert!(caps.get(1).is_none());
//! ```
//!
//! When only the start of the match is needed:
//!
//! ```rust
//! use brex::prelude::*;
//!
//! let re = SearchRegex::new("[0-9]+px").unwrap();
//! assert_eq!(re.find("width: 120px"), Some(7));
//! ```
//!
//! ## Low-Level C-Style API
//!
//! The engine entry points return `i32` result codes (`>= 0` on success,
//! [`regdef::REG_MISMATCH`] for no match, other negatives for errors).
//! Because offsets travel in an `i32`, a search range may not end past
//! [`regdef::REG_MAX_SUBJECT_LEN`]:
//!
//! ```rust
//! use brex::regcomp::{reg_new, CompileOptions};
//! use brex::regdef::Region;
//! use brex::regexec::reg_search;
//!
//! let reg = reg_new(b"b+", &CompileOptions::default()).unwrap();
//! let mut region = Region::new();
//! let input = b"aabbb";
//! let result = reg_search(&reg, input, 0, input.len(), &mut region);
//! assert_eq!(result, 2); // match starts at byte 2
//! assert_eq!(region.get(0), Some((2, 5)));
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`api`] | `Regex`, `SearchRegex`, builders, matches, iterators |
//! | [`error`] | `RegexError` |
//! | [`regparse`] | Pattern parser |
//! | [`regparse_types`] | Tree nodes, node flags, parse environment |
//! | [`regcomp`] | Tree simplification, lowering, DFA promotion, optimizer |
//! | [`regdfa`] | NFA construction, byte classes, subset construction |
//! | [`regexec`] | Backtracking VM, search and replace |
//! | [`regsearch`] | Search-only engine |
//! | [`regtrav`] | Required substrings |
//! | [`regdump`] | Program and table dumps |
//! | [`regint`] | Instructions, byte sets, DFA tables |
//! | [`regdef`] | Result codes, limits, capture regions |
//! | [`regerror`] | Error messages |

pub mod api;
pub mod error;
pub mod prelude;
pub mod regcomp;
pub mod regdef;
pub mod regdfa;
pub mod regdump;
pub mod regerror;
pub mod regexec;
pub mod regint;
pub mod regparse;
pub mod regparse_types;
pub mod regsearch;
pub mod regtrav;
