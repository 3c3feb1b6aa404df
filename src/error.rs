// error.rs - Idiomatic Rust error type for brex.
//
// Groups the i32 result codes into semantic variants while keeping the
// numeric result code available through `code()`.

use std::fmt;

use crate::regdef::*;
use crate::regerror::reg_error_code_to_format;

/// Error type for pattern compilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegexError {
    /// Parse depth limit exceeded.
    ParseDepthLimitOver,
    /// Syntax error in the pattern.
    Syntax { code: i32, message: String },
    /// Construct the search-only engine cannot express.
    Unsupported { code: i32, message: String },
    /// Automaton state limit exceeded.
    TooComplex,
    /// Invalid argument passed to a function.
    InvalidArgument,
    /// Internal engine bug (should not occur in correct usage).
    InternalBug { code: i32, message: String },
    /// Other error not covered by specific variants.
    Other(i32),
}

impl fmt::Display for RegexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegexError::ParseDepthLimitOver => write!(f, "parse depth limit over"),
            RegexError::Syntax { message, .. } => write!(f, "syntax error: {}", message),
            RegexError::Unsupported { message, .. } => write!(f, "unsupported: {}", message),
            RegexError::TooComplex => write!(f, "pattern too complex"),
            RegexError::InvalidArgument => write!(f, "invalid argument"),
            RegexError::InternalBug { message, .. } => write!(f, "internal error: {}", message),
            RegexError::Other(code) => write!(f, "error code {}", code),
        }
    }
}

impl std::error::Error for RegexError {}

impl From<i32> for RegexError {
    fn from(code: i32) -> Self {
        match code {
            ERR_PARSE_DEPTH_LIMIT_OVER => RegexError::ParseDepthLimitOver,
            ERR_TOO_COMPLEX => RegexError::TooComplex,
            ERR_INVALID_ARGUMENT => RegexError::InvalidArgument,

            ERR_PARSER_BUG | ERR_STACK_BUG | ERR_UNDEFINED_INSN => RegexError::InternalBug {
                code,
                message: reg_error_code_to_format(code).to_string(),
            },

            c if reg_is_unsupported_error(c) => RegexError::Unsupported {
                code: c,
                message: reg_error_code_to_format(c).to_string(),
            },

            c if reg_is_pattern_error(c) => RegexError::Syntax {
                code: c,
                message: reg_error_code_to_format(c).to_string(),
            },

            _ => RegexError::Other(code),
        }
    }
}

impl RegexError {
    /// Returns the underlying result code.
    pub fn code(&self) -> i32 {
        match self {
            RegexError::ParseDepthLimitOver => ERR_PARSE_DEPTH_LIMIT_OVER,
            RegexError::TooComplex => ERR_TOO_COMPLEX,
            RegexError::InvalidArgument => ERR_INVALID_ARGUMENT,
            RegexError::Syntax { code, .. } => *code,
            RegexError::Unsupported { code, .. } => *code,
            RegexError::InternalBug { code, .. } => *code,
            RegexError::Other(code) => *code,
        }
    }
}
