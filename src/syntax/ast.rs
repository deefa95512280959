//! Typed syntax tree for Go source files.
//!
//! Every node carries the [`TextRange`] it was parsed from. Identifiers are
//! the unit the semantic tables are keyed on, so [`Ident`] keeps its own
//! range separately from the enclosing expression.

use smol_str::SmolStr;
use text_size::TextRange;

use super::lexer::TokenKind;

/// A parsed Go source file.
#[derive(Clone, Debug)]
pub struct File {
    /// Name from the package clause (`None` if the clause was missing).
    pub package: Option<Ident>,
    pub imports: Vec<ImportSpec>,
    pub decls: Vec<Decl>,
    pub range: TextRange,
}

impl File {
    /// The import spec whose range contains `offset`, end inclusive.
    pub fn import_at(&self, offset: text_size::TextSize) -> Option<&ImportSpec> {
        self.imports
            .iter()
            .find(|spec| spec.range.start() <= offset && offset <= spec.range.end())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ident {
    pub name: SmolStr,
    pub range: TextRange,
}

impl Ident {
    pub fn new(name: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Go's export rule: the first character is an upper-case letter.
    pub fn is_exported(&self) -> bool {
        is_exported(&self.name)
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Clone, Debug)]
pub struct ImportSpec {
    /// Local alias, `.` or `_` when present.
    pub name: Option<Ident>,
    /// Raw (quoted) path literal.
    pub path: BasicLit,
    pub range: TextRange,
}

impl ImportSpec {
    /// The unquoted import path, or `None` for a malformed literal.
    pub fn path_value(&self) -> Option<String> {
        unquote(&self.path.value)
    }
}

/// Remove Go string quoting from a literal.
///
/// Handles raw strings and the common escapes; anything else is kept
/// verbatim.
pub fn unquote(raw: &str) -> Option<String> {
    if raw.len() < 2 {
        return None;
    }
    let (first, last) = (raw.as_bytes()[0], raw.as_bytes()[raw.len() - 1]);
    let body = &raw[1..raw.len() - 1];
    match (first, last) {
        (b'`', b'`') => Some(body.to_string()),
        (b'"', b'"') => {
            let mut out = String::with_capacity(body.len());
            let mut chars = body.chars();
            while let Some(c) = chars.next() {
                if c != '\\' {
                    out.push(c);
                    continue;
                }
                match chars.next()? {
                    'n' => out.push('\n'),
                    't' => out.push('\t'),
                    'r' => out.push('\r'),
                    '\\' => out.push('\\'),
                    '"' => out.push('"'),
                    '\'' => out.push('\''),
                    other => {
                        out.push('\\');
                        out.push(other);
                    }
                }
            }
            Some(out)
        }
        _ => None,
    }
}

#[derive(Clone, Debug)]
pub struct BasicLit {
    pub kind: TokenKind,
    pub value: SmolStr,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub enum Decl {
    Gen(GenDecl),
    Func(FuncDecl),
    Bad(TextRange),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GenKind {
    Const,
    Var,
    Type,
}

#[derive(Clone, Debug)]
pub struct GenDecl {
    pub kind: GenKind,
    pub specs: Vec<Spec>,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub enum Spec {
    Value(ValueSpec),
    Type(TypeSpec),
}

/// `a, b T = x, y` inside a const or var declaration.
#[derive(Clone, Debug)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    /// Position inside a const group (the value of `iota`).
    pub iota: u64,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub struct TypeSpec {
    pub name: Ident,
    /// `type A = B`
    pub alias: bool,
    pub ty: Expr,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub struct FuncDecl {
    pub recv: Option<FieldList>,
    pub name: Ident,
    pub ty: FuncType,
    pub body: Option<Block>,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub struct FuncType {
    pub params: FieldList,
    pub results: FieldList,
    pub range: TextRange,
}

#[derive(Clone, Debug, Default)]
pub struct FieldList {
    pub fields: Vec<Field>,
    pub range: TextRange,
}

impl FieldList {
    /// Number of entries once grouped names are expanded.
    pub fn len(&self) -> usize {
        self.fields.iter().map(|f| f.names.len().max(1)).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A struct field, parameter, result or interface element.
///
/// `names` is empty for embedded fields, unnamed parameters and embedded
/// interfaces.
#[derive(Clone, Debug)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Expr,
    pub tag: Option<BasicLit>,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub struct Expr {
    pub kind: ExprKind,
    pub range: TextRange,
}

impl Expr {
    pub fn new(kind: ExprKind, range: TextRange) -> Self {
        Self { kind, range }
    }

    pub fn bad(range: TextRange) -> Self {
        Self::new(ExprKind::Bad, range)
    }

    pub fn as_ident(&self) -> Option<&Ident> {
        match &self.kind {
            ExprKind::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.unparen(),
            _ => self,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug)]
pub enum ExprKind {
    Ident(Ident),
    BasicLit(BasicLit),
    CompositeLit {
        ty: Option<Box<Expr>>,
        elts: Vec<Expr>,
    },
    FuncLit {
        ty: FuncType,
        body: Block,
    },
    Paren(Box<Expr>),
    Selector {
        x: Box<Expr>,
        sel: Ident,
    },
    Index {
        x: Box<Expr>,
        index: Box<Expr>,
    },
    Slice {
        x: Box<Expr>,
        lo: Option<Box<Expr>>,
        hi: Option<Box<Expr>>,
        max: Option<Box<Expr>>,
    },
    /// `x.(T)`; `ty` is `None` for the `x.(type)` switch guard.
    TypeAssert {
        x: Box<Expr>,
        ty: Option<Box<Expr>>,
    },
    Call {
        fun: Box<Expr>,
        args: Vec<Expr>,
        ellipsis: bool,
    },
    /// `*x`: dereference or pointer type.
    Star(Box<Expr>),
    Unary {
        op: TokenKind,
        x: Box<Expr>,
    },
    Binary {
        op: TokenKind,
        x: Box<Expr>,
        y: Box<Expr>,
    },
    KeyValue {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    /// `[N]T`, `[...]T` (len is an `Ellipsis`), or `[]T` (no len).
    ArrayType {
        len: Option<Box<Expr>>,
        elem: Box<Expr>,
    },
    StructType(FieldList),
    FuncType(FuncType),
    /// Methods are fields whose type is a `FuncType`; embedded
    /// interfaces are fields without names.
    InterfaceType(FieldList),
    MapType {
        key: Box<Expr>,
        value: Box<Expr>,
    },
    ChanType {
        dir: ChanDir,
        value: Box<Expr>,
    },
    /// `...T` in a parameter list or `[...]` array length.
    Ellipsis(Option<Box<Expr>>),
    Bad,
}

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub range: TextRange,
}

#[derive(Clone, Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub range: TextRange,
}

impl Stmt {
    pub fn new(kind: StmtKind, range: TextRange) -> Self {
        Self { kind, range }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

#[derive(Clone, Debug)]
pub enum StmtKind {
    Decl(GenDecl),
    Labeled {
        label: Ident,
        stmt: Box<Stmt>,
    },
    Expr(Expr),
    Send {
        chan: Expr,
        value: Expr,
    },
    IncDec {
        x: Expr,
        inc: bool,
    },
    /// `tok` is `Assign`, `Define` or an `op=` token.
    Assign {
        lhs: Vec<Expr>,
        tok: TokenKind,
        rhs: Vec<Expr>,
    },
    Go(Expr),
    Defer(Expr),
    Return(Vec<Expr>),
    Branch {
        kind: BranchKind,
        label: Option<Ident>,
    },
    Block(Block),
    If {
        init: Option<Box<Stmt>>,
        cond: Expr,
        then: Block,
        els: Option<Box<Stmt>>,
    },
    Switch {
        init: Option<Box<Stmt>>,
        tag: Option<Expr>,
        clauses: Vec<CaseClause>,
    },
    /// `switch [init;] [x :=] y.(type) { ... }`
    TypeSwitch {
        init: Option<Box<Stmt>>,
        binding: Option<Ident>,
        x: Expr,
        clauses: Vec<CaseClause>,
    },
    Select(Vec<CommClause>),
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        post: Option<Box<Stmt>>,
        body: Block,
    },
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        x: Expr,
        body: Block,
    },
    Empty,
    Bad,
}

/// A `case`/`default` clause; `list` is `None` for `default`.
#[derive(Clone, Debug)]
pub struct CaseClause {
    pub list: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

/// A `select` clause; `comm` is `None` for `default`.
#[derive(Clone, Debug)]
pub struct CommClause {
    pub comm: Option<Box<Stmt>>,
    pub body: Vec<Stmt>,
    pub range: TextRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote() {
        assert_eq!(unquote("\"encoding/json\"").as_deref(), Some("encoding/json"));
        assert_eq!(unquote("`raw\\n`").as_deref(), Some("raw\\n"));
        assert_eq!(unquote("\"a\\tb\"").as_deref(), Some("a\tb"));
        assert_eq!(unquote("x"), None);
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Foo"));
        assert!(!is_exported("foo"));
        assert!(!is_exported("_"));
    }
}
