//! Abstract Syntax Tree types consumed by the engine
//!
//! The tree is produced by an external front end (or assembled with
//! [`crate::builder`]). Statement lists and function nodes carry lazily
//! computed declaration analysis so each list is only walked once.

use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

use crate::hoist::{FunctionScope, ListAnalysis, SwitchScope};
use crate::value::JsString;

/// Source position of a node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A complete script
#[derive(Debug, Clone)]
pub struct Program {
    pub body: StatementList,
    /// Set when the script starts with a "use strict" directive
    pub strict: bool,
    pub span: Span,
    pub(crate) scope: OnceCell<Rc<FunctionScope>>,
}

impl Program {
    pub fn new(body: Vec<Statement>, strict: bool) -> Self {
        Self {
            body: StatementList::new(body),
            strict,
            span: Span::default(),
            scope: OnceCell::new(),
        }
    }
}

/// An ordered sequence of statements with cached analysis
#[derive(Debug, Clone, Default)]
pub struct StatementList {
    pub statements: Vec<Statement>,
    pub(crate) analysis: OnceCell<Rc<ListAnalysis>>,
}

impl StatementList {
    pub fn new(statements: Vec<Statement>) -> Self {
        Self {
            statements,
            analysis: OnceCell::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

// ============ STATEMENTS ============

#[derive(Debug, Clone)]
pub enum Statement {
    // Declarations
    VariableDeclaration(VariableDeclaration),
    FunctionDeclaration(Rc<FunctionNode>),
    ClassDeclaration(Rc<ClassNode>),

    // Control Flow
    Block(BlockStatement),
    If(IfStatement),
    Switch(SwitchStatement),
    For(ForStatement),
    While(WhileStatement),
    DoWhile(DoWhileStatement),
    Try(TryStatement),
    With(WithStatement),

    // Jump
    Return(ReturnStatement),
    Break(BreakStatement),
    Continue(ContinueStatement),
    Throw(ThrowStatement),

    // Other
    Expression(ExpressionStatement),
    Labeled(LabeledStatement),
    Empty(Span),
    Debugger(Span),
}

impl Statement {
    pub fn span(&self) -> Span {
        match self {
            Statement::VariableDeclaration(s) => s.span,
            Statement::FunctionDeclaration(f) => f.span,
            Statement::ClassDeclaration(c) => c.span,
            Statement::Block(s) => s.span,
            Statement::If(s) => s.span,
            Statement::Switch(s) => s.span,
            Statement::For(s) => s.span,
            Statement::While(s) => s.span,
            Statement::DoWhile(s) => s.span,
            Statement::Try(s) => s.span,
            Statement::With(s) => s.span,
            Statement::Return(s) => s.span,
            Statement::Break(s) => s.span,
            Statement::Continue(s) => s.span,
            Statement::Throw(s) => s.span,
            Statement::Expression(s) => s.span,
            Statement::Labeled(s) => s.span,
            Statement::Empty(span) | Statement::Debugger(span) => *span,
        }
    }

    /// Replace the statement's own span (children keep theirs)
    pub fn with_span(mut self, span: Span) -> Self {
        match &mut self {
            Statement::VariableDeclaration(s) => s.span = span,
            Statement::FunctionDeclaration(f) => {
                let mut node = (**f).clone();
                node.span = span;
                *f = Rc::new(node);
            }
            Statement::ClassDeclaration(c) => {
                let mut node = (**c).clone();
                node.span = span;
                *c = Rc::new(node);
            }
            Statement::Block(s) => s.span = span,
            Statement::If(s) => s.span = span,
            Statement::Switch(s) => s.span = span,
            Statement::For(s) => s.span = span,
            Statement::While(s) => s.span = span,
            Statement::DoWhile(s) => s.span = span,
            Statement::Try(s) => s.span = span,
            Statement::With(s) => s.span = span,
            Statement::Return(s) => s.span = span,
            Statement::Break(s) => s.span = span,
            Statement::Continue(s) => s.span = span,
            Statement::Throw(s) => s.span = span,
            Statement::Expression(s) => s.span = span,
            Statement::Labeled(s) => s.span = span,
            Statement::Empty(s) | Statement::Debugger(s) => *s = span,
        }
        self
    }
}

#[derive(Debug, Clone)]
pub struct ExpressionStatement {
    pub expression: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BlockStatement {
    pub body: StatementList,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct VariableDeclaration {
    pub kind: VariableKind,
    pub declarations: Vec<VariableDeclarator>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableKind {
    Var,
    Let,
    Const,
}

#[derive(Debug, Clone)]
pub struct VariableDeclarator {
    pub id: Identifier,
    pub init: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub test: Expression,
    pub consequent: Box<Statement>,
    pub alternate: Option<Box<Statement>>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
    pub span: Span,
    pub(crate) scope: OnceCell<Rc<SwitchScope>>,
}

#[derive(Debug, Clone)]
pub struct SwitchCase {
    /// `None` for the `default` clause
    pub test: Option<Expression>,
    pub consequent: StatementList,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Option<Expression>,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expression(Expression),
}

#[derive(Debug, Clone)]
pub struct WhileStatement {
    pub test: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct DoWhileStatement {
    pub body: Box<Statement>,
    pub test: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct TryStatement {
    pub block: BlockStatement,
    pub handler: Option<CatchClause>,
    pub finalizer: Option<BlockStatement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct CatchClause {
    pub param: Option<Identifier>,
    pub body: BlockStatement,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct WithStatement {
    pub object: Expression,
    pub body: Box<Statement>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub argument: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BreakStatement {
    pub label: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ContinueStatement {
    pub label: Option<Identifier>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ThrowStatement {
    pub argument: Expression,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LabeledStatement {
    pub label: Identifier,
    pub body: Box<Statement>,
    pub span: Span,
}

// ============ FUNCTIONS & CLASSES ============

/// Shared node for function declarations, expressions, arrows, methods and
/// generator functions
#[derive(Debug, Clone)]
pub struct FunctionNode {
    pub id: Option<Identifier>,
    pub params: Vec<FunctionParam>,
    pub body: FunctionBody,
    pub arrow: bool,
    pub generator: bool,
    /// Body carries a "use strict" directive
    pub strict: bool,
    pub span: Span,
    pub(crate) scope: OnceCell<Rc<FunctionScope>>,
}

impl FunctionNode {
    pub fn new(
        id: Option<Identifier>,
        params: Vec<FunctionParam>,
        body: FunctionBody,
        span: Span,
    ) -> Self {
        Self {
            id,
            params,
            body,
            arrow: false,
            generator: false,
            strict: false,
            span,
            scope: OnceCell::new(),
        }
    }

    /// Name from the node itself, if any
    pub fn name(&self) -> Option<&JsString> {
        self.id.as_ref().map(|id| &id.name)
    }

    /// Number of parameters before the first one with a default value
    pub fn expected_argument_count(&self) -> usize {
        self.params
            .iter()
            .take_while(|p| p.default.is_none())
            .count()
    }
}

#[derive(Debug, Clone)]
pub enum FunctionBody {
    Block(StatementList),
    /// Concise arrow body
    Expression(Box<Expression>),
}

#[derive(Debug, Clone)]
pub struct FunctionParam {
    pub name: Identifier,
    pub default: Option<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassNode {
    pub id: Option<Identifier>,
    pub super_class: Option<Box<Expression>>,
    pub constructor: Option<Rc<FunctionNode>>,
    pub methods: Vec<ClassMethod>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ClassMethod {
    pub key: JsString,
    pub value: Rc<FunctionNode>,
    pub static_: bool,
    pub span: Span,
}

// ============ EXPRESSIONS ============

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(LiteralExpression),
    Identifier(Identifier),
    This(Span),
    Object(ObjectExpression),
    Function(Rc<FunctionNode>),
    Class(Rc<ClassNode>),
    Unary(UnaryExpression),
    Binary(BinaryExpression),
    Logical(LogicalExpression),
    Conditional(ConditionalExpression),
    Assignment(AssignmentExpression),
    Update(UpdateExpression),
    Sequence(SequenceExpression),
    Member(MemberExpression),
    Call(CallExpression),
    New(NewExpression),
    SuperCall(SuperCallExpression),
    SuperMember(SuperMemberExpression),
    Yield(YieldExpression),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Literal(e) => e.span,
            Expression::Identifier(e) => e.span,
            Expression::This(span) => *span,
            Expression::Object(e) => e.span,
            Expression::Function(f) => f.span,
            Expression::Class(c) => c.span,
            Expression::Unary(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Logical(e) => e.span,
            Expression::Conditional(e) => e.span,
            Expression::Assignment(e) => e.span,
            Expression::Update(e) => e.span,
            Expression::Sequence(e) => e.span,
            Expression::Member(e) => e.span,
            Expression::Call(e) => e.span,
            Expression::New(e) => e.span,
            Expression::SuperCall(e) => e.span,
            Expression::SuperMember(e) => e.span,
            Expression::Yield(e) => e.span,
        }
    }

    /// Anonymous function and class expressions take their name from the
    /// binding they are assigned to
    pub fn is_anonymous_function_definition(&self) -> bool {
        match self {
            Expression::Function(f) => f.id.is_none(),
            Expression::Class(c) => c.id.is_none(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identifier {
    pub name: JsString,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct LiteralExpression {
    pub value: LiteralValue,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum LiteralValue {
    Undefined,
    Null,
    Boolean(bool),
    Number(f64),
    String(JsString),
}

#[derive(Debug, Clone)]
pub struct ObjectExpression {
    pub properties: Vec<ObjectProperty>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct ObjectProperty {
    pub key: PropertyName,
    pub value: Expression,
    /// Method shorthand (`m() {}`): gets the object as home object
    pub method: bool,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum PropertyName {
    Identifier(JsString),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone)]
pub struct UnaryExpression {
    pub op: UnaryOp,
    pub argument: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Not,
    Minus,
    Plus,
    Typeof,
    Void,
    Delete,
}

#[derive(Debug, Clone)]
pub struct BinaryExpression {
    pub op: BinaryOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Instanceof,
    In,
}

#[derive(Debug, Clone)]
pub struct LogicalExpression {
    pub op: LogicalOp,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    And,
    Or,
    NullishCoalescing,
}

#[derive(Debug, Clone)]
pub struct ConditionalExpression {
    pub test: Box<Expression>,
    pub consequent: Box<Expression>,
    pub alternate: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct AssignmentExpression {
    pub op: AssignmentOp,
    pub target: AssignmentTarget,
    pub value: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
}

#[derive(Debug, Clone)]
pub enum AssignmentTarget {
    Identifier(Identifier),
    Member(MemberExpression),
}

#[derive(Debug, Clone)]
pub struct UpdateExpression {
    pub op: UpdateOp,
    pub prefix: bool,
    pub target: AssignmentTarget,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Debug, Clone)]
pub struct SequenceExpression {
    pub expressions: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct MemberExpression {
    pub object: Box<Expression>,
    pub property: MemberProperty,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum MemberProperty {
    Identifier(JsString),
    Computed(Box<Expression>),
}

#[derive(Debug, Clone)]
pub struct CallExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct NewExpression {
    pub callee: Box<Expression>,
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SuperCallExpression {
    pub arguments: Vec<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct SuperMemberExpression {
    pub property: MemberProperty,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct YieldExpression {
    pub argument: Option<Box<Expression>>,
    pub span: Span,
}
