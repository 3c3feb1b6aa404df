// prelude.rs - Convenient re-exports for the idiomatic API.
//
//! # Prelude
//!
//! ```
//! use brex::prelude::*;
//!
//! let re = Regex::new(r"\d+").unwrap();
//! let m = re.find("answer: 42").unwrap();
//! assert_eq!(m.as_str(), "42");
//! ```

pub use crate::api::{
    required_substrs, Captures, CapturesIter, FindIter, Match, Regex, RegexBuilder, SearchRegex,
    SearchRegexBuilder, Split,
};
pub use crate::error::RegexError;
pub use crate::regdef::Region;
