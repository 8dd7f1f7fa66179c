use crate::value::ValueType;

/// A reference to a variable, already mangled to its storage key.
#[derive(Debug, Clone, PartialEq)]
pub struct VarRef {
    pub key: String,
    pub ty: ValueType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Pow,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
        )
    }
}

/// Built-in functions the snippet compiler knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Abs,
    Int,
    Fix,
    Sgn,
    Sqr,
    Sin,
    Cos,
    Tan,
    Atn,
    Exp,
    Log,
    Len,
    Asc,
    Val,
    Chr,
    Str,
    Left,
    Right,
    Mid,
    Upper,
    Lower,
    Min,
    Max,
}

impl Builtin {
    /// Looks up a function by its lower-cased name, sigil included.
    pub fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "abs" => Builtin::Abs,
            "int" => Builtin::Int,
            "fix" => Builtin::Fix,
            "sgn" => Builtin::Sgn,
            "sqr" => Builtin::Sqr,
            "sin" => Builtin::Sin,
            "cos" => Builtin::Cos,
            "tan" => Builtin::Tan,
            "atn" => Builtin::Atn,
            "exp" => Builtin::Exp,
            "log" => Builtin::Log,
            "len" => Builtin::Len,
            "asc" => Builtin::Asc,
            "val" => Builtin::Val,
            "chr$" => Builtin::Chr,
            "str$" => Builtin::Str,
            "left$" => Builtin::Left,
            "right$" => Builtin::Right,
            "mid$" => Builtin::Mid,
            "upper$" => Builtin::Upper,
            "lower$" => Builtin::Lower,
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            _ => return None,
        };
        Some(builtin)
    }

    /// Argument types, in order. Variadic functions repeat their last type.
    pub fn params(self) -> &'static [ValueType] {
        use ValueType::{Number as N, Str as S};
        match self {
            Builtin::Len | Builtin::Asc | Builtin::Val | Builtin::Upper | Builtin::Lower => &[S],
            Builtin::Left | Builtin::Right => &[S, N],
            Builtin::Mid => &[S, N, N],
            _ => &[N],
        }
    }

    /// Minimum and maximum argument count; `None` means unbounded.
    pub fn arity(self) -> (usize, Option<usize>) {
        match self {
            Builtin::Left | Builtin::Right => (2, Some(2)),
            Builtin::Mid => (2, Some(3)),
            Builtin::Min | Builtin::Max => (1, None),
            _ => (1, Some(1)),
        }
    }

    pub fn return_type(self) -> ValueType {
        match self {
            Builtin::Chr
            | Builtin::Str
            | Builtin::Left
            | Builtin::Right
            | Builtin::Mid
            | Builtin::Upper
            | Builtin::Lower => ValueType::Str,
            _ => ValueType::Number,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Str(String),
    Var(VarRef),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Call {
        func: Builtin,
        args: Vec<Expr>,
    },
}

impl Expr {
    pub fn value_type(&self) -> ValueType {
        match self {
            Expr::Number(_) | Expr::Unary { .. } => ValueType::Number,
            Expr::Str(_) => ValueType::Str,
            Expr::Var(var) => var.ty,
            Expr::Binary { op, lhs, .. } => {
                if *op == BinaryOp::Add && lhs.value_type() == ValueType::Str {
                    ValueType::Str
                } else {
                    ValueType::Number
                }
            }
            Expr::Call { func, .. } => func.return_type(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PrintItem {
    Expr(Expr),
    /// `;` keeps the cursor where it is.
    Joined,
    /// `,` advances to the next print zone.
    NextZone,
}

/// Target of an `IF` branch.
#[derive(Debug, Clone, PartialEq)]
pub enum Branch {
    Line(u32),
    Statements(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Let { target: VarRef, value: Expr },
    Print(Vec<PrintItem>),
    If {
        cond: Expr,
        then: Branch,
        otherwise: Option<Branch>,
    },
    Goto(u32),
    Gosub(u32),
    Return,
    End,
    Stop,
    Error(Expr),
    Clear,
    Rem,
}

/// One compiled source line: the executable unit the evaluator runs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledLine {
    pub number: Option<u32>,
    pub statements: Vec<Stmt>,
}
