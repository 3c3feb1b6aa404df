// regerror.rs - Error code to string conversion.
// Maps result codes to human-readable messages.

use crate::regdef::*;

/// Message for a result code.
pub fn reg_error_code_to_format(code: i32) -> &'static str {
    match code {
        REG_NORMAL => "success",
        REG_MISMATCH => "mismatch",
        ERR_PARSE_DEPTH_LIMIT_OVER => "parse depth limit over",
        ERR_PARSER_BUG => "internal parser error (bug)",
        ERR_STACK_BUG => "checkpoint stack error (bug)",
        ERR_UNDEFINED_INSN => "undefined instruction (bug)",
        ERR_INVALID_ARGUMENT => "invalid argument",
        ERR_END_PATTERN_AT_LEFT_BRACE => "end pattern at left brace",
        ERR_PREMATURE_END_OF_CHAR_CLASS => "premature end of char-class",
        ERR_END_PATTERN_AT_ESCAPE => "end pattern at escape",
        ERR_CONTROL_CODE_SYNTAX => "invalid control-code syntax",
        ERR_CHAR_CLASS_VALUE_AT_END_OF_RANGE => "char-class value at end of range",
        ERR_CHAR_CLASS_VALUE_AT_START_OF_RANGE => "char-class value at start of range",
        ERR_TARGET_OF_REPEAT_OPERATOR_NOT_SPECIFIED => {
            "target of repeat operator is not specified"
        }
        ERR_TARGET_OF_REPEAT_OPERATOR_INVALID => "target of repeat operator is invalid",
        ERR_NESTED_REPEAT_OPERATOR => "nested repeat operator",
        ERR_UNMATCHED_CLOSE_PARENTHESIS => "unmatched close parenthesis",
        ERR_END_PATTERN_WITH_UNMATCHED_PARENTHESIS => "end pattern with unmatched parenthesis",
        ERR_END_PATTERN_IN_GROUP => "end pattern in group",
        ERR_UNDEFINED_GROUP_OPTION => "undefined group option",
        ERR_UNESCAPED_META_CHARACTER => "unescaped meta character",
        ERR_INVALID_ESCAPE => "invalid escape sequence",
        ERR_TOO_BIG_NUMBER_FOR_REPEAT_RANGE => "too big number for repeat range",
        ERR_UPPER_SMALLER_THAN_LOWER_IN_REPEAT_RANGE => {
            "upper is smaller than lower in repeat range"
        }
        ERR_INVALID_REPEAT_RANGE_PATTERN => "invalid repeat range {lower,upper}",
        ERR_EMPTY_RANGE_IN_CHAR_CLASS => "empty range in char class",
        ERR_TOO_MANY_CAPTURES => "too many captures",
        ERR_INVALID_BACKREF => "invalid backref number/name",
        ERR_TOO_SHORT_HEX_ESCAPE => "too short hexadecimal escape",
        ERR_UNSUPPORTED_ANCHOR => "anchors are not supported by the search-only engine",
        ERR_UNSUPPORTED_CAPTURE => "capture groups are not supported by the search-only engine",
        ERR_UNSUPPORTED_BACKREF => "backreferences are not supported by the search-only engine",
        ERR_UNSUPPORTED_LOOKAROUND => "lookarounds are not supported by the search-only engine",
        ERR_TOO_COMPLEX => "pattern too complex (state limit over)",
        _ => "undefined error code",
    }
}
