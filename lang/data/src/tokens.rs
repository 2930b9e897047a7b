use std::fmt;

/// A range in the source file, expressed in zero-based line/column
/// coordinates plus byte offsets so diagnostics can slice the offending
/// line without re-scanning the file from the start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub start_line: u32,
    pub start_char: u32,
    pub start_offset: usize,
    pub end_line: u32,
    pub end_char: u32,
    pub end_offset: usize,
}

impl Span {
    pub fn point(line: u32, char_index: u32, offset: usize) -> Self {
        return Self {
            start_line: line,
            start_char: char_index,
            start_offset: offset,
            end_line: line,
            end_char: char_index,
            end_offset: offset,
        };
    }

    /// Combines two spans into one covering both, used when a node's
    /// coordinates must span several tokens (e.g. a call expression).
    pub fn merge(self, other: Span) -> Span {
        return Span { start_line: self.start_line, start_char: self.start_char, start_offset: self.start_offset, ..other };
    }

    /// User-facing line number; internal tracking is zero-based.
    pub fn display_line(&self) -> u32 {
        return self.start_line + 1;
    }
}

impl Default for Span {
    fn default() -> Self {
        return Span::point(0, 0, 0);
    }
}

/// Reserved words. `sizeof` and `toString` are prefix pseudo-operators but
/// are still recognized here, alongside control-flow and declaration
/// keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Keyword {
    If,
    Elif,
    Else,
    Switch,
    Case,
    Default,
    For,
    While,
    Do,
    Break,
    Continue,
    Return,
    Function,
    Public,
    Void,
    Number,
    String,
    Sizeof,
    ToString,
}

impl Keyword {
    /// All reserved words, in no particular order; used by the tokenizer's
    /// keyword lookup.
    pub const ALL: &'static [(&'static str, Keyword)] = &[
        ("if", Keyword::If),
        ("elif", Keyword::Elif),
        ("else", Keyword::Else),
        ("switch", Keyword::Switch),
        ("case", Keyword::Case),
        ("default", Keyword::Default),
        ("for", Keyword::For),
        ("while", Keyword::While),
        ("do", Keyword::Do),
        ("break", Keyword::Break),
        ("continue", Keyword::Continue),
        ("return", Keyword::Return),
        ("function", Keyword::Function),
        ("public", Keyword::Public),
        ("void", Keyword::Void),
        ("number", Keyword::Number),
        ("string", Keyword::String),
        ("sizeof", Keyword::Sizeof),
        ("toString", Keyword::ToString),
    ];

    pub fn lookup(word: &str) -> Option<Keyword> {
        return Keyword::ALL.iter().find(|(spelling, _)| *spelling == word).map(|(_, kw)| *kw);
    }
}

/// Operators and punctuation. The bitwise-and and by-reference-argument
/// marker share a single token (`&`); the parser distinguishes them by
/// position, exactly as the `&` in front of a call argument is
/// distinguished from the binary bitwise-and operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Inc,
    Dec,
    Add,
    Sub,
    Concat,
    Mul,
    Div,
    Idiv,
    Mod,
    BitwiseNot,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    Shiftl,
    Shiftr,
    Assign,
    Dot,
    AddAssign,
    SubAssign,
    ConcatAssign,
    MulAssign,
    DivAssign,
    IdivAssign,
    ModAssign,
    AndAssign,
    OrAssign,
    XorAssign,
    ShiftlAssign,
    ShiftrAssign,
    LogicalNot,
    LogicalAnd,
    LogicalOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    Question,
    Colon,
    Comma,
    Semicolon,
    OpenRound,
    CloseRound,
    OpenCurly,
    CloseCurly,
    OpenSquare,
    CloseSquare,
}

impl Operator {
    /// Operator spellings ordered longest-first within each starting
    /// character so maximal munch (spec §4.2) never needs backtracking
    /// across lengths: the tokenizer narrows by first character, then
    /// picks the longest exact match.
    pub const ALL: &'static [(&'static str, Operator)] = &[
        ("++", Operator::Inc),
        ("--", Operator::Dec),
        ("+=", Operator::AddAssign),
        ("+", Operator::Add),
        ("-=", Operator::SubAssign),
        ("-", Operator::Sub),
        ("..=", Operator::ConcatAssign),
        ("..", Operator::Concat),
        ("*=", Operator::MulAssign),
        ("*", Operator::Mul),
        ("/=", Operator::DivAssign),
        ("/", Operator::Div),
        ("\\=", Operator::IdivAssign),
        ("\\", Operator::Idiv),
        ("%=", Operator::ModAssign),
        ("%", Operator::Mod),
        ("~", Operator::BitwiseNot),
        ("&&", Operator::LogicalAnd),
        ("&=", Operator::AndAssign),
        ("&", Operator::BitwiseAnd),
        ("||", Operator::LogicalOr),
        ("|=", Operator::OrAssign),
        ("|", Operator::BitwiseOr),
        ("^=", Operator::XorAssign),
        ("^", Operator::BitwiseXor),
        ("<<=", Operator::ShiftlAssign),
        ("<<", Operator::Shiftl),
        ("<=", Operator::Le),
        ("<", Operator::Lt),
        (">>=", Operator::ShiftrAssign),
        (">>", Operator::Shiftr),
        (">=", Operator::Ge),
        (">", Operator::Gt),
        ("==", Operator::Eq),
        ("=", Operator::Assign),
        ("!=", Operator::Ne),
        ("!", Operator::LogicalNot),
        ("?", Operator::Question),
        (":", Operator::Colon),
        (",", Operator::Comma),
        (";", Operator::Semicolon),
        ("(", Operator::OpenRound),
        (")", Operator::CloseRound),
        ("{", Operator::OpenCurly),
        ("}", Operator::CloseCurly),
        ("[", Operator::OpenSquare),
        ("]", Operator::CloseSquare),
        (".", Operator::Dot),
    ];
}

/// The payload of a single token.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenValue {
    Keyword(Keyword),
    Operator(Operator),
    Identifier(String),
    Number(f64),
    Str(String),
    Eof,
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return match self {
            TokenValue::Keyword(_) => write!(f, "keyword"),
            TokenValue::Operator(op) => write!(f, "{}", Operator::ALL.iter().find(|(_, o)| o == op).map(|(s, _)| *s).unwrap_or("?")),
            TokenValue::Identifier(name) => write!(f, "{}", name),
            TokenValue::Number(n) => write!(f, "{}", n),
            TokenValue::Str(s) => write!(f, "\"{}\"", s),
            TokenValue::Eof => write!(f, "end of input"),
        };
    }
}

/// A single lexical token: its value plus the span it occupies.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub value: TokenValue,
    pub span: Span,
}

impl Token {
    pub fn new(value: TokenValue, span: Span) -> Self {
        return Self { value, span };
    }

    pub fn is_eof(&self) -> bool {
        return matches!(self.value, TokenValue::Eof);
    }
}
