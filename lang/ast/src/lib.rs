//! The generic, typed expression tree the shunting-yard parser builds
//! (spec §4.5), before the typed expression builder lowers it into
//! evaluators.

use sl_data::Span;
use sl_types::TypeHandle;

/// Where a name resolves to, assigned by the compiler context at parse
/// time (spec §3 "Identifiers").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Local,
    Function,
}

/// A resolved name: its type, the index used to address it at runtime,
/// and which table that index addresses.
#[derive(Clone, Debug, PartialEq)]
pub struct IdentifierInfo {
    pub name: String,
    pub type_handle: TypeHandle,
    /// Global/function table index, or a local's offset from the return
    /// slot (negative for parameters, positive for other locals).
    pub index: i32,
    pub scope: ScopeKind,
}

/// Every expression-tree operation. Binary/unary arithmetic, bitwise,
/// comparison, and logical operators are represented directly; `Param`
/// is the node the parser wraps a by-value call argument in (spec §4.5);
/// a by-reference argument is passed as its bare lvalue child with no
/// `Param` wrapper, which is how the typed expression builder tells the
/// two apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Add,
    Sub,
    Mul,
    Div,
    Idiv,
    Mod,
    BitwiseAnd,
    BitwiseOr,
    BitwiseXor,
    BitwiseNot,
    Shiftl,
    Shiftr,
    Concat,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LogicalAnd,
    LogicalOr,
    LogicalNot,
    Negate,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
    Assign,
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
    Comma,
    Ternary,
    Index,
    Call,
    /// Boxes an rvalue argument into a temporary lvalue at evaluation time.
    Param,
    Sizeof,
    ToString,
    InitList,
}

impl Operation {
    /// Whether this operation rebinds its left (or only, for inc/dec)
    /// operand in place rather than merely reading it.
    pub fn is_assignment(self) -> bool {
        return matches!(
            self,
            Operation::Assign
                | Operation::AddAssign
                | Operation::SubAssign
                | Operation::ConcatAssign
                | Operation::MulAssign
                | Operation::DivAssign
                | Operation::IdivAssign
                | Operation::ModAssign
                | Operation::AndAssign
                | Operation::OrAssign
                | Operation::XorAssign
                | Operation::ShiftlAssign
                | Operation::ShiftrAssign
                | Operation::PreInc
                | Operation::PreDec
        );
    }
}

/// What a node fundamentally is.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeValue {
    Operation(Operation),
    NumberLiteral(f64),
    StringLiteral(String),
    Identifier(IdentifierInfo),
}

/// A node in the typed expression tree. `type_handle` and `lvalue` are
/// fixed the moment the node is constructed and never change afterward
/// (spec §3 invariant); children are owned exclusively by their parent.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub value: NodeValue,
    pub children: Vec<Node>,
    pub type_handle: TypeHandle,
    pub lvalue: bool,
    pub span: Span,
}

impl Node {
    pub fn new(value: NodeValue, children: Vec<Node>, type_handle: TypeHandle, lvalue: bool, span: Span) -> Self {
        return Self { value, children, type_handle, lvalue, span };
    }
}
