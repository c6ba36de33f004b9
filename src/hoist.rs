//! Declaration analysis for statement lists and function bodies
//!
//! `var` declarations hoist to the enclosing function scope, function
//! declarations at the top of a body are var-scoped, and `let`/`const`/
//! `class` (plus function declarations inside blocks) are instantiated into
//! the block's own environment before any statement runs. The results are
//! computed once per node and cached in its `OnceCell`.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::ast::{
    Expression, ForInit, FunctionBody, FunctionNode, LiteralValue, Program, Statement,
    StatementList, SwitchStatement, VariableDeclaration, VariableKind,
};
use crate::value::{CheapClone, JsString, JsValue};

/// A `let`, `const` or `class` binding created uninitialized at scope entry
#[derive(Debug, Clone)]
pub struct LexicalBinding {
    pub name: JsString,
    pub constant: bool,
}

/// Statements whose completion is known without evaluating anything
#[derive(Debug, Clone)]
pub enum FastPath {
    /// Empty statement or a declaration with no runtime effect
    Empty,
    /// Literal expression statement
    Value(JsValue),
    /// `return <literal>`
    Return(JsValue),
}

/// Analysis of one statement list
#[derive(Debug, Default)]
pub struct ListAnalysis {
    pub lexical: Vec<LexicalBinding>,
    /// Function declarations directly in this list
    pub functions: Vec<Rc<FunctionNode>>,
    /// Per-statement precomputed completions
    pub fast: Vec<Option<FastPath>>,
}

/// Analysis of a function body or a script
#[derive(Debug, Default)]
pub struct FunctionScope {
    /// Hoisted `var` names, first occurrence order, no duplicates
    pub var_names: Vec<JsString>,
    /// Top-level function declarations to initialize on entry (last wins)
    pub functions: Vec<Rc<FunctionNode>>,
    pub lexical: Vec<LexicalBinding>,
    pub parameter_names: Vec<JsString>,
    pub has_parameter_expressions: bool,
}

/// Lexical declarations shared by every clause of a `switch`
#[derive(Debug, Default)]
pub struct SwitchScope {
    pub lexical: Vec<LexicalBinding>,
    pub functions: Vec<Rc<FunctionNode>>,
}

pub fn analyze_list(list: &StatementList) -> Rc<ListAnalysis> {
    list.analysis
        .get_or_init(|| Rc::new(build_list_analysis(&list.statements)))
        .clone()
}

pub fn function_scope(node: &FunctionNode) -> Rc<FunctionScope> {
    node.scope
        .get_or_init(|| {
            let mut scope = match &node.body {
                FunctionBody::Block(list) => body_scope(list),
                FunctionBody::Expression(_) => FunctionScope::default(),
            };
            scope.parameter_names = node.params.iter().map(|p| p.name.name.cheap_clone()).collect();
            scope.has_parameter_expressions = node.params.iter().any(|p| p.default.is_some());
            Rc::new(scope)
        })
        .clone()
}

pub fn program_scope(program: &Program) -> Rc<FunctionScope> {
    program
        .scope
        .get_or_init(|| Rc::new(body_scope(&program.body)))
        .clone()
}

pub fn switch_scope(stmt: &SwitchStatement) -> Rc<SwitchScope> {
    stmt.scope
        .get_or_init(|| {
            let mut scope = SwitchScope::default();
            for case in &stmt.cases {
                let analysis = analyze_list(&case.consequent);
                scope.lexical.extend(analysis.lexical.iter().cloned());
                scope.functions.extend(analysis.functions.iter().cloned());
            }
            Rc::new(scope)
        })
        .clone()
}

fn build_list_analysis(statements: &[Statement]) -> ListAnalysis {
    let mut analysis = ListAnalysis::default();
    for stmt in statements {
        match stmt {
            Statement::VariableDeclaration(decl) if decl.kind != VariableKind::Var => {
                let constant = decl.kind == VariableKind::Const;
                for d in &decl.declarations {
                    analysis.lexical.push(LexicalBinding {
                        name: d.id.name.cheap_clone(),
                        constant,
                    });
                }
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    analysis.lexical.push(LexicalBinding {
                        name: id.name.cheap_clone(),
                        constant: false,
                    });
                }
            }
            Statement::FunctionDeclaration(func) => {
                analysis.functions.push(func.cheap_clone());
            }
            _ => {}
        }
        analysis.fast.push(fast_path(stmt));
    }
    analysis
}

fn fast_path(stmt: &Statement) -> Option<FastPath> {
    match stmt {
        Statement::Empty(_) | Statement::Debugger(_) | Statement::FunctionDeclaration(_) => {
            Some(FastPath::Empty)
        }
        Statement::Expression(e) => literal_value(&e.expression).map(FastPath::Value),
        Statement::Return(r) => match &r.argument {
            None => Some(FastPath::Return(JsValue::Undefined)),
            Some(arg) => literal_value(arg).map(FastPath::Return),
        },
        _ => None,
    }
}

fn literal_value(expr: &Expression) -> Option<JsValue> {
    match expr {
        Expression::Literal(lit) => Some(match &lit.value {
            LiteralValue::Undefined => JsValue::Undefined,
            LiteralValue::Null => JsValue::Null,
            LiteralValue::Boolean(b) => JsValue::Boolean(*b),
            LiteralValue::Number(n) => JsValue::Number(*n),
            LiteralValue::String(s) => JsValue::String(s.cheap_clone()),
        }),
        _ => None,
    }
}

fn body_scope(list: &StatementList) -> FunctionScope {
    let analysis = analyze_list(list);

    let mut var_names = Vec::new();
    let mut seen = FxHashSet::default();
    collect_hoisted_vars(&list.statements, &mut var_names, &mut seen);

    // Later declarations of the same name win
    let mut declared = FxHashSet::default();
    let mut functions: Vec<Rc<FunctionNode>> = analysis
        .functions
        .iter()
        .rev()
        .filter(|f| match f.name() {
            Some(name) => declared.insert(name.cheap_clone()),
            None => false,
        })
        .cloned()
        .collect();
    functions.reverse();

    FunctionScope {
        var_names,
        functions,
        lexical: analysis.lexical.clone(),
        parameter_names: Vec::new(),
        has_parameter_expressions: false,
    }
}

/// Recursively collect all var declaration names from statements.
/// Does not descend into function bodies (which create new scopes).
fn collect_hoisted_vars(
    statements: &[Statement],
    names: &mut Vec<JsString>,
    seen: &mut FxHashSet<JsString>,
) {
    for stmt in statements {
        collect_hoisted_vars_stmt(stmt, names, seen);
    }
}

fn collect_hoisted_vars_stmt(
    stmt: &Statement,
    names: &mut Vec<JsString>,
    seen: &mut FxHashSet<JsString>,
) {
    match stmt {
        Statement::VariableDeclaration(decl) => collect_hoisted_vars_decl(decl, names, seen),
        Statement::Block(block) => collect_hoisted_vars(&block.body.statements, names, seen),
        Statement::If(if_stmt) => {
            collect_hoisted_vars_stmt(&if_stmt.consequent, names, seen);
            if let Some(alt) = &if_stmt.alternate {
                collect_hoisted_vars_stmt(alt, names, seen);
            }
        }
        Statement::For(for_stmt) => {
            if let Some(ForInit::Variable(decl)) = &for_stmt.init {
                collect_hoisted_vars_decl(decl, names, seen);
            }
            collect_hoisted_vars_stmt(&for_stmt.body, names, seen);
        }
        Statement::While(s) => collect_hoisted_vars_stmt(&s.body, names, seen),
        Statement::DoWhile(s) => collect_hoisted_vars_stmt(&s.body, names, seen),
        Statement::With(s) => collect_hoisted_vars_stmt(&s.body, names, seen),
        Statement::Labeled(s) => collect_hoisted_vars_stmt(&s.body, names, seen),
        Statement::Try(try_stmt) => {
            collect_hoisted_vars(&try_stmt.block.body.statements, names, seen);
            if let Some(handler) = &try_stmt.handler {
                collect_hoisted_vars(&handler.body.body.statements, names, seen);
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                collect_hoisted_vars(&finalizer.body.statements, names, seen);
            }
        }
        Statement::Switch(switch) => {
            for case in &switch.cases {
                collect_hoisted_vars(&case.consequent.statements, names, seen);
            }
        }
        _ => {}
    }
}

fn collect_hoisted_vars_decl(
    decl: &VariableDeclaration,
    names: &mut Vec<JsString>,
    seen: &mut FxHashSet<JsString>,
) {
    if decl.kind != VariableKind::Var {
        return;
    }
    for d in &decl.declarations {
        if seen.insert(d.id.name.cheap_clone()) {
            names.push(d.id.name.cheap_clone());
        }
    }
}
