use std::fmt;

use colored::Colorize;

use crate::tokens::Span;

/// The four compile-time error kinds from spec §7. `compiler error` covers
/// internal failures to reduce an expression tree; it unwinds identically
/// to the others so callers rarely need to distinguish it from the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParsingErrorKind {
    Parsing,
    Syntax,
    Semantic,
    Compiler,
}

impl fmt::Display for ParsingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            ParsingErrorKind::Parsing => write!(f, "Parsing error"),
            ParsingErrorKind::Syntax => write!(f, "Syntax error"),
            ParsingErrorKind::Semantic => write!(f, "Semantic error"),
            ParsingErrorKind::Compiler => write!(f, "Compiler error"),
        };
    }
}

/// A compile-time error: malformed tokens, grammar violations, and type
/// errors all flow through this one structure so the host can report a
/// single kind of thing regardless of which stage raised it.
#[derive(Clone, Debug)]
pub struct ParsingError {
    pub kind: ParsingErrorKind,
    pub message: String,
    pub span: Span,
}

impl ParsingError {
    pub fn new(kind: ParsingErrorKind, message: impl Into<String>, span: Span) -> Self {
        return Self { kind, message: message.into(), span };
    }

    pub fn parsing(message: impl Into<String>, span: Span) -> Self {
        return Self::new(ParsingErrorKind::Parsing, message, span);
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        return Self::new(ParsingErrorKind::Syntax, message, span);
    }

    pub fn semantic(message: impl Into<String>, span: Span) -> Self {
        return Self::new(ParsingErrorKind::Semantic, message, span);
    }

    pub fn compiler(message: impl Into<String>, span: Span) -> Self {
        return Self::new(ParsingErrorKind::Compiler, message, span);
    }

    pub fn unexpected(found: impl fmt::Display, span: Span) -> Self {
        return Self::parsing(format!("Unexpected '{}'", found), span);
    }

    /// Renders `(line+1) message`, the offending source line, and a caret
    /// column indicator, exactly the format described in spec §6/§7.
    pub fn format_with_source(&self, source: &str) -> String {
        return format_diagnostic(&self.kind.to_string(), &self.message, self.span, source);
    }
}

impl fmt::Display for ParsingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "({}) {}: {}", self.span.display_line(), self.kind, self.message);
    }
}

impl std::error::Error for ParsingError {}

fn format_diagnostic(kind: &str, message: &str, span: Span, source: &str) -> String {
    let line_text = source.lines().nth(span.start_line as usize).unwrap_or("");
    let header = format!("({}) {}: {}", span.display_line(), kind, message);
    let caret_width = (span.end_offset.saturating_sub(span.start_offset)).max(1);
    let caret_line = format!("{}{}", " ".repeat(span.start_char as usize), "^".repeat(caret_width));

    return format!("{}\n{}\n{}", header.bright_red(), line_text, caret_line.bright_red());
}

/// A runtime error (spec §7): negative index, calling an uninitialized
/// function, reading an uninitialized global, or a failed assertion.
#[derive(Clone, Debug, thiserror::Error)]
#[error("Runtime error: {message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        return Self { message: message.into() };
    }

    /// Mirrors `runtimeAssertion` in the original: raises unless `ok`.
    pub fn assert(ok: bool, message: impl Into<String>) -> Result<(), RuntimeError> {
        if ok {
            return Ok(());
        }
        return Err(RuntimeError::new(message));
    }
}

/// Everything `Module::try_load` can report: file-not-found, a compile-time
/// error (parsing/syntax/semantic/compiler, all folded together since they
/// unwind identically), or a runtime error raised while running global
/// initializers.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("'{0}' not found")]
    FileNotFound(String),
    #[error(transparent)]
    Compile(#[from] ParsingError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl LoadError {
    /// Formats the error the way `try_load` writes to its diagnostic sink:
    /// compile errors get the source excerpt and caret, the others are
    /// printed as plain messages.
    pub fn format_with_source(&self, source: &str) -> String {
        return match self {
            LoadError::FileNotFound(path) => format!("'{}' not found", path),
            LoadError::Compile(err) => err.format_with_source(source),
            LoadError::Runtime(err) => err.to_string(),
        };
    }
}
