//! Error code registry with descriptions, help text and categories
//!
//! Codes are stable, self-describing identifiers. Clients key quick fixes on
//! them, so a code is never renamed once published.

use crate::diagnostic::Category;

// === Variables ===
pub const UNDEFINED_VARIABLE: &str = "UNDEFINED_VARIABLE";
pub const DUPLICATE_DECLARATION: &str = "DUPLICATE_DECLARATION";
pub const UNUSED_VARIABLE: &str = "UNUSED_VARIABLE";

// === Arrays ===
pub const ARRAY_SIZE_OVERFLOW: &str = "ARRAY_SIZE_OVERFLOW";

// === Functions ===
pub const UNDEFINED_FUNCTION: &str = "UNDEFINED_FUNCTION";
pub const DUPLICATE_FUNCTION: &str = "DUPLICATE_FUNCTION";
pub const PARAMETER_MISMATCH: &str = "PARAMETER_MISMATCH";
pub const MISSING_RETURN: &str = "MISSING_RETURN";
pub const EMPTY_RETURN: &str = "EMPTY_RETURN";
pub const VOID_RETURN_VALUE: &str = "VOID_RETURN_VALUE";

// === Types ===
pub const VOID_ASSIGNMENT: &str = "VOID_ASSIGNMENT";
pub const TYPE_MISMATCH: &str = "TYPE_MISMATCH";

// === Control flow ===
pub const INVALID_BREAK_CONTINUE: &str = "INVALID_BREAK_CONTINUE";

// === Syntax ===
pub const MISSING_SEMICOLON: &str = "MISSING_SEMICOLON";
pub const UNMATCHED_BRACKETS: &str = "UNMATCHED_BRACKETS";
pub const SYNTAX_ERROR: &str = "SYNTAX_ERROR";

/// Error code descriptor
#[derive(Debug, Clone)]
pub struct ErrorCodeInfo {
    pub code: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Optional contextual help text
    pub help: Option<&'static str>,
    pub category: Category,
}

/// Get info for an error code, if known
pub fn lookup(code: &str) -> Option<ErrorCodeInfo> {
    ERROR_CODES.iter().find(|e| e.code == code).cloned()
}

/// Get help text for an error code
pub fn help_for(code: &str) -> Option<&'static str> {
    lookup(code).and_then(|e| e.help)
}

/// Get the category of an error code
pub fn category_for(code: &str) -> Option<Category> {
    lookup(code).map(|e| e.category)
}

/// All known error codes
pub static ERROR_CODES: &[ErrorCodeInfo] = &[
    ErrorCodeInfo {
        code: UNDEFINED_VARIABLE,
        description: "Undefined variable",
        help: Some("Declare the variable before using it, or check the spelling."),
        category: Category::Variable,
    },
    ErrorCodeInfo {
        code: DUPLICATE_DECLARATION,
        description: "Duplicate declaration",
        help: Some("Each name can only be declared once in a declaration. Rename one of them."),
        category: Category::Variable,
    },
    ErrorCodeInfo {
        code: UNUSED_VARIABLE,
        description: "Unused variable",
        help: Some("Remove the variable, or prefix its name with '_' to mark it as intentionally unused."),
        category: Category::Variable,
    },
    ErrorCodeInfo {
        code: ARRAY_SIZE_OVERFLOW,
        description: "Too many array initializers",
        help: Some("Increase the array size or remove extra initializer elements."),
        category: Category::Array,
    },
    ErrorCodeInfo {
        code: UNDEFINED_FUNCTION,
        description: "Undefined function",
        help: Some("Define the function before calling it, or check the spelling."),
        category: Category::Function,
    },
    ErrorCodeInfo {
        code: DUPLICATE_FUNCTION,
        description: "Duplicate function",
        help: Some("A function can only be defined once. Rename or remove one definition."),
        category: Category::Function,
    },
    ErrorCodeInfo {
        code: PARAMETER_MISMATCH,
        description: "Wrong number of arguments",
        help: Some("Check the function definition for the number of parameters it takes."),
        category: Category::Function,
    },
    ErrorCodeInfo {
        code: MISSING_RETURN,
        description: "Missing return statement",
        help: Some("Add a return statement at the end of the function body."),
        category: Category::Function,
    },
    ErrorCodeInfo {
        code: EMPTY_RETURN,
        description: "Return without a value",
        help: Some("Return a value that matches the function's return type."),
        category: Category::Function,
    },
    ErrorCodeInfo {
        code: VOID_RETURN_VALUE,
        description: "Void function returns a value",
        help: Some("Remove the returned value, or change the return type."),
        category: Category::Function,
    },
    ErrorCodeInfo {
        code: VOID_ASSIGNMENT,
        description: "Void value used in an expression",
        help: Some("Call the function as a statement on its own line."),
        category: Category::Type,
    },
    ErrorCodeInfo {
        code: TYPE_MISMATCH,
        description: "Type mismatch",
        help: Some("Make sure the value matches the declared type."),
        category: Category::Type,
    },
    ErrorCodeInfo {
        code: INVALID_BREAK_CONTINUE,
        description: "break or continue outside a loop",
        help: Some("Only use 'break' and 'continue' inside a while loop."),
        category: Category::Control,
    },
    ErrorCodeInfo {
        code: MISSING_SEMICOLON,
        description: "Missing semicolon",
        help: Some("Statements end with ';'."),
        category: Category::Other,
    },
    ErrorCodeInfo {
        code: UNMATCHED_BRACKETS,
        description: "Unmatched bracket",
        help: Some("Every '(', '[' and '{' needs a matching closing bracket."),
        category: Category::Other,
    },
    ErrorCodeInfo {
        code: SYNTAX_ERROR,
        description: "Syntax error",
        help: None,
        category: Category::Other,
    },
];
