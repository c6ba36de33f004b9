//! Helpers for assembling syntax trees without a parser
//!
//! Every node gets `Span::default()`; use [`Statement::with_span`] where a
//! location matters.

use std::rc::Rc;

use crate::ast::*;
use crate::value::JsString;

fn span() -> Span {
    Span::default()
}

pub fn identifier(name: &str) -> Identifier {
    Identifier {
        name: JsString::from(name),
        span: span(),
    }
}

// ============ PROGRAMS ============

pub fn program(body: Vec<Statement>) -> Program {
    Program::new(body, false)
}

pub fn strict_program(body: Vec<Statement>) -> Program {
    Program::new(body, true)
}

// ============ EXPRESSIONS ============

fn literal(value: LiteralValue) -> Expression {
    Expression::Literal(LiteralExpression {
        value,
        span: span(),
    })
}

pub fn num(n: f64) -> Expression {
    literal(LiteralValue::Number(n))
}

pub fn str_(s: &str) -> Expression {
    literal(LiteralValue::String(JsString::from(s)))
}

pub fn bool_(b: bool) -> Expression {
    literal(LiteralValue::Boolean(b))
}

pub fn null() -> Expression {
    literal(LiteralValue::Null)
}

pub fn undefined() -> Expression {
    literal(LiteralValue::Undefined)
}

pub fn ident(name: &str) -> Expression {
    Expression::Identifier(identifier(name))
}

pub fn this() -> Expression {
    Expression::This(span())
}

pub fn object(properties: Vec<ObjectProperty>) -> Expression {
    Expression::Object(ObjectExpression {
        properties,
        span: span(),
    })
}

pub fn prop(name: &str, value: Expression) -> ObjectProperty {
    ObjectProperty {
        key: PropertyName::Identifier(JsString::from(name)),
        value,
        method: false,
        span: span(),
    }
}

/// Method shorthand `name() { ... }`
pub fn method(name: &str, function: Rc<FunctionNode>) -> ObjectProperty {
    ObjectProperty {
        key: PropertyName::Identifier(JsString::from(name)),
        value: Expression::Function(function),
        method: true,
        span: span(),
    }
}

pub fn param(name: &str) -> FunctionParam {
    FunctionParam {
        name: identifier(name),
        default: None,
        span: span(),
    }
}

pub fn param_default(name: &str, default: Expression) -> FunctionParam {
    FunctionParam {
        name: identifier(name),
        default: Some(default),
        span: span(),
    }
}

/// `function name(params) { body }`
pub fn function(
    name: Option<&str>,
    params: Vec<FunctionParam>,
    body: Vec<Statement>,
) -> Rc<FunctionNode> {
    Rc::new(FunctionNode::new(
        name.map(identifier),
        params,
        FunctionBody::Block(StatementList::new(body)),
        span(),
    ))
}

/// Function whose body starts with "use strict"
pub fn strict_function(
    name: Option<&str>,
    params: Vec<FunctionParam>,
    body: Vec<Statement>,
) -> Rc<FunctionNode> {
    let mut node = FunctionNode::new(
        name.map(identifier),
        params,
        FunctionBody::Block(StatementList::new(body)),
        span(),
    );
    node.strict = true;
    Rc::new(node)
}

/// `function* name(params) { body }`
pub fn generator(
    name: Option<&str>,
    params: Vec<FunctionParam>,
    body: Vec<Statement>,
) -> Rc<FunctionNode> {
    let mut node = FunctionNode::new(
        name.map(identifier),
        params,
        FunctionBody::Block(StatementList::new(body)),
        span(),
    );
    node.generator = true;
    Rc::new(node)
}

/// `(params) => { body }`
pub fn arrow(params: Vec<FunctionParam>, body: Vec<Statement>) -> Rc<FunctionNode> {
    let mut node = FunctionNode::new(
        None,
        params,
        FunctionBody::Block(StatementList::new(body)),
        span(),
    );
    node.arrow = true;
    Rc::new(node)
}

/// `(params) => expr`
pub fn arrow_expr(params: Vec<FunctionParam>, body: Expression) -> Rc<FunctionNode> {
    let mut node = FunctionNode::new(
        None,
        params,
        FunctionBody::Expression(Box::new(body)),
        span(),
    );
    node.arrow = true;
    Rc::new(node)
}

pub fn func_expr(function: Rc<FunctionNode>) -> Expression {
    Expression::Function(function)
}

pub fn class(
    name: Option<&str>,
    super_class: Option<Expression>,
    constructor: Option<Rc<FunctionNode>>,
    methods: Vec<ClassMethod>,
) -> Rc<ClassNode> {
    Rc::new(ClassNode {
        id: name.map(identifier),
        super_class: super_class.map(Box::new),
        constructor,
        methods,
        span: span(),
    })
}

pub fn class_method(name: &str, function: Rc<FunctionNode>) -> ClassMethod {
    ClassMethod {
        key: JsString::from(name),
        value: function,
        static_: false,
        span: span(),
    }
}

pub fn static_method(name: &str, function: Rc<FunctionNode>) -> ClassMethod {
    ClassMethod {
        key: JsString::from(name),
        value: function,
        static_: true,
        span: span(),
    }
}

pub fn class_expr(class: Rc<ClassNode>) -> Expression {
    Expression::Class(class)
}

pub fn call(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::Call(CallExpression {
        callee: Box::new(callee),
        arguments,
        span: span(),
    })
}

pub fn new_(callee: Expression, arguments: Vec<Expression>) -> Expression {
    Expression::New(NewExpression {
        callee: Box::new(callee),
        arguments,
        span: span(),
    })
}

fn member_expression(object: Expression, property: MemberProperty) -> MemberExpression {
    MemberExpression {
        object: Box::new(object),
        property,
        span: span(),
    }
}

/// `object.name`
pub fn member(object: Expression, name: &str) -> Expression {
    Expression::Member(member_expression(
        object,
        MemberProperty::Identifier(JsString::from(name)),
    ))
}

/// `object[key]`
pub fn index(object: Expression, key: Expression) -> Expression {
    Expression::Member(member_expression(object, MemberProperty::Computed(Box::new(key))))
}

/// `object.name(args)`
pub fn call_method(object: Expression, name: &str, arguments: Vec<Expression>) -> Expression {
    call(member(object, name), arguments)
}

pub fn super_call(arguments: Vec<Expression>) -> Expression {
    Expression::SuperCall(SuperCallExpression {
        arguments,
        span: span(),
    })
}

pub fn super_member(name: &str) -> Expression {
    Expression::SuperMember(SuperMemberExpression {
        property: MemberProperty::Identifier(JsString::from(name)),
        span: span(),
    })
}

pub fn unary(op: UnaryOp, argument: Expression) -> Expression {
    Expression::Unary(UnaryExpression {
        op,
        argument: Box::new(argument),
        span: span(),
    })
}

pub fn not(argument: Expression) -> Expression {
    unary(UnaryOp::Not, argument)
}

pub fn typeof_(argument: Expression) -> Expression {
    unary(UnaryOp::Typeof, argument)
}

pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
    Expression::Binary(BinaryExpression {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: span(),
    })
}

pub fn add(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Add, left, right)
}

pub fn sub(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Sub, left, right)
}

pub fn mul(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Mul, left, right)
}

pub fn lt(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Lt, left, right)
}

pub fn gt(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Gt, left, right)
}

pub fn strict_eq(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::StrictEq, left, right)
}

pub fn instanceof(left: Expression, right: Expression) -> Expression {
    binary(BinaryOp::Instanceof, left, right)
}

pub fn logical(op: LogicalOp, left: Expression, right: Expression) -> Expression {
    Expression::Logical(LogicalExpression {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span: span(),
    })
}

pub fn cond(test: Expression, consequent: Expression, alternate: Expression) -> Expression {
    Expression::Conditional(ConditionalExpression {
        test: Box::new(test),
        consequent: Box::new(consequent),
        alternate: Box::new(alternate),
        span: span(),
    })
}

pub fn sequence(expressions: Vec<Expression>) -> Expression {
    Expression::Sequence(SequenceExpression {
        expressions,
        span: span(),
    })
}

/// Assignment target for a plain name
pub fn target(name: &str) -> AssignmentTarget {
    AssignmentTarget::Identifier(identifier(name))
}

/// Assignment target `object.name`
pub fn member_target(object: Expression, name: &str) -> AssignmentTarget {
    AssignmentTarget::Member(member_expression(
        object,
        MemberProperty::Identifier(JsString::from(name)),
    ))
}

pub fn assign_op(op: AssignmentOp, target: AssignmentTarget, value: Expression) -> Expression {
    Expression::Assignment(AssignmentExpression {
        op,
        target,
        value: Box::new(value),
        span: span(),
    })
}

/// `name = value`
pub fn assign(name: &str, value: Expression) -> Expression {
    assign_op(AssignmentOp::Assign, target(name), value)
}

/// `object.name = value`
pub fn assign_member(object: Expression, name: &str, value: Expression) -> Expression {
    assign_op(AssignmentOp::Assign, member_target(object, name), value)
}

/// `name += value`
pub fn add_assign(name: &str, value: Expression) -> Expression {
    assign_op(AssignmentOp::AddAssign, target(name), value)
}

/// `name++`
pub fn increment(name: &str) -> Expression {
    Expression::Update(UpdateExpression {
        op: UpdateOp::Increment,
        prefix: false,
        target: target(name),
        span: span(),
    })
}

pub fn yield_(argument: Expression) -> Expression {
    Expression::Yield(YieldExpression {
        argument: Some(Box::new(argument)),
        span: span(),
    })
}

/// Bare `yield`
pub fn yield_none() -> Expression {
    Expression::Yield(YieldExpression {
        argument: None,
        span: span(),
    })
}

// ============ STATEMENTS ============

pub fn expr_stmt(expression: Expression) -> Statement {
    Statement::Expression(ExpressionStatement {
        expression,
        span: span(),
    })
}

fn declaration(kind: VariableKind, name: &str, init: Option<Expression>) -> VariableDeclaration {
    VariableDeclaration {
        kind,
        declarations: vec![VariableDeclarator {
            id: identifier(name),
            init,
            span: span(),
        }],
        span: span(),
    }
}

pub fn var_(name: &str, init: Option<Expression>) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Var, name, init))
}

pub fn let_(name: &str, init: Option<Expression>) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Let, name, init))
}

pub fn const_(name: &str, init: Expression) -> Statement {
    Statement::VariableDeclaration(declaration(VariableKind::Const, name, Some(init)))
}

pub fn fn_decl(function: Rc<FunctionNode>) -> Statement {
    Statement::FunctionDeclaration(function)
}

pub fn class_decl(class: Rc<ClassNode>) -> Statement {
    Statement::ClassDeclaration(class)
}

fn block_statement(body: Vec<Statement>) -> BlockStatement {
    BlockStatement {
        body: StatementList::new(body),
        span: span(),
    }
}

pub fn block(body: Vec<Statement>) -> Statement {
    Statement::Block(block_statement(body))
}

pub fn empty() -> Statement {
    Statement::Empty(span())
}

pub fn if_(test: Expression, consequent: Statement, alternate: Option<Statement>) -> Statement {
    Statement::If(IfStatement {
        test,
        consequent: Box::new(consequent),
        alternate: alternate.map(Box::new),
        span: span(),
    })
}

pub fn while_(test: Expression, body: Statement) -> Statement {
    Statement::While(WhileStatement {
        test,
        body: Box::new(body),
        span: span(),
    })
}

pub fn do_while(body: Statement, test: Expression) -> Statement {
    Statement::DoWhile(DoWhileStatement {
        body: Box::new(body),
        test,
        span: span(),
    })
}

pub fn for_var(name: &str, init: Expression) -> ForInit {
    ForInit::Variable(declaration(VariableKind::Var, name, Some(init)))
}

pub fn for_let(name: &str, init: Expression) -> ForInit {
    ForInit::Variable(declaration(VariableKind::Let, name, Some(init)))
}

pub fn for_(
    init: Option<ForInit>,
    test: Option<Expression>,
    update: Option<Expression>,
    body: Statement,
) -> Statement {
    Statement::For(ForStatement {
        init,
        test,
        update,
        body: Box::new(body),
        span: span(),
    })
}

pub fn labeled(label: &str, body: Statement) -> Statement {
    Statement::Labeled(LabeledStatement {
        label: identifier(label),
        body: Box::new(body),
        span: span(),
    })
}

pub fn break_() -> Statement {
    Statement::Break(BreakStatement {
        label: None,
        span: span(),
    })
}

pub fn break_label(label: &str) -> Statement {
    Statement::Break(BreakStatement {
        label: Some(identifier(label)),
        span: span(),
    })
}

pub fn continue_() -> Statement {
    Statement::Continue(ContinueStatement {
        label: None,
        span: span(),
    })
}

pub fn continue_label(label: &str) -> Statement {
    Statement::Continue(ContinueStatement {
        label: Some(identifier(label)),
        span: span(),
    })
}

pub fn return_(argument: Option<Expression>) -> Statement {
    Statement::Return(ReturnStatement {
        argument,
        span: span(),
    })
}

pub fn throw_(argument: Expression) -> Statement {
    Statement::Throw(ThrowStatement {
        argument,
        span: span(),
    })
}

fn try_statement(
    block: Vec<Statement>,
    handler: Option<(Option<&str>, Vec<Statement>)>,
    finalizer: Option<Vec<Statement>>,
) -> Statement {
    Statement::Try(TryStatement {
        block: block_statement(block),
        handler: handler.map(|(param, body)| CatchClause {
            param: param.map(identifier),
            body: block_statement(body),
            span: span(),
        }),
        finalizer: finalizer.map(block_statement),
        span: span(),
    })
}

/// `try { block } catch (param) { handler }`
pub fn try_catch(block: Vec<Statement>, param: Option<&str>, handler: Vec<Statement>) -> Statement {
    try_statement(block, Some((param, handler)), None)
}

/// `try { block } finally { finalizer }`
pub fn try_finally(block: Vec<Statement>, finalizer: Vec<Statement>) -> Statement {
    try_statement(block, None, Some(finalizer))
}

pub fn try_catch_finally(
    block: Vec<Statement>,
    param: Option<&str>,
    handler: Vec<Statement>,
    finalizer: Vec<Statement>,
) -> Statement {
    try_statement(block, Some((param, handler)), Some(finalizer))
}

pub fn case(test: Expression, consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: Some(test),
        consequent: StatementList::new(consequent),
        span: span(),
    }
}

pub fn default_case(consequent: Vec<Statement>) -> SwitchCase {
    SwitchCase {
        test: None,
        consequent: StatementList::new(consequent),
        span: span(),
    }
}

pub fn switch_(discriminant: Expression, cases: Vec<SwitchCase>) -> Statement {
    Statement::Switch(SwitchStatement {
        discriminant,
        cases,
        span: span(),
        scope: Default::default(),
    })
}

pub fn with_(object: Expression, body: Statement) -> Statement {
    Statement::With(WithStatement {
        object,
        body: Box::new(body),
        span: span(),
    })
}
