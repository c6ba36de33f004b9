//! Statement evaluation
//!
//! Statements produce [`Completion`]s. Script-visible faults raised while
//! evaluating a statement are converted into Throw completions at the
//! statement list boundary; host aborts and the generator suspension marker
//! pass through untouched.
//!
//! Generator bodies suspend by unwinding with `JsError::GeneratorYield`.
//! Every construct the marker passes through records where it was (list
//! index, chosen branch, scope environment, try phase...) on the
//! generator's resume stack, innermost first. Resuming replays the body from
//! the top: each construct pops its own record on entry and jumps straight
//! back to where it left off, outermost first.

use std::rc::Rc;

use super::Interpreter;
use super::completion::{Completion, CompletionType};
use super::environment::{EnvRef, Environment};
use super::generator::Resumption;
use crate::ast::{
    AssignmentOp, BlockStatement, CatchClause, ClassNode, DoWhileStatement, Expression,
    ExpressionStatement, ForInit, ForStatement, IfStatement, ReturnStatement, Span, Statement,
    StatementList, SwitchStatement, TryStatement, VariableDeclaration, VariableKind,
    WhileStatement, WithStatement, YieldExpression,
};
use crate::error::JsError;
use crate::hoist::{FastPath, LexicalBinding, analyze_list, switch_scope};
use crate::value::{CheapClone, JsString, JsValue};

/// Where a suspended construct continues
#[derive(Debug, Clone)]
pub(crate) enum ResumePoint {
    /// Statement list: index of the suspended statement and the last value
    List {
        index: usize,
        last_value: Option<JsValue>,
    },
    /// Block, `with` body: the environment the body ran in
    Scope { env: Option<EnvRef> },
    /// `if`: which branch was taken
    Branch { consequent: bool },
    /// Iteration statements: value so far and the iteration environment
    Loop { value: JsValue, env: Option<EnvRef> },
    Switch {
        case: usize,
        value: JsValue,
        env: Option<EnvRef>,
    },
    Try { phase: TryPhase },
    /// The suspended `yield` itself; `slot` picks the declarator
    Yield { slot: usize },
}

#[derive(Debug, Clone)]
pub(crate) enum TryPhase {
    Block,
    Catch { env: Option<EnvRef> },
    /// Completion of the try/catch part waiting for the finalizer
    Finally { pending: Completion },
}

/// Result of a `yield` once the generator is resumed
pub(crate) enum YieldResult {
    Value(JsValue),
    /// `return(v)` was injected at the suspension point
    Return(JsValue),
}

fn unexpected_resume_point(point: ResumePoint) -> JsError {
    JsError::internal_error(format!("mismatched generator resume point: {:?}", point))
}

fn is_suspension<T>(result: &Result<T, JsError>) -> bool {
    matches!(result, Err(e) if e.is_suspension())
}

/// Unlabelled `break` ends the innermost breakable statement normally
fn exit_breakable(completion: Completion) -> Completion {
    if completion.is_unlabelled_break() {
        Completion::normal_opt(completion.value)
    } else {
        completion
    }
}

impl FastPath {
    fn completion(&self) -> Completion {
        match self {
            FastPath::Empty => Completion::empty(),
            FastPath::Value(v) => Completion::normal(v.cheap_clone()),
            FastPath::Return(v) => Completion::return_(v.cheap_clone()),
        }
    }
}

impl Interpreter {
    // ============ RESUME STACK ============

    /// Pop the innermost-pending resume record of the running generator
    pub(crate) fn take_resume_point(&self) -> Option<ResumePoint> {
        let generator = self.current_generator()?;
        let point = generator.borrow_mut().resume_points.pop();
        point
    }

    pub(crate) fn push_resume_point(&self, point: ResumePoint) {
        if let Some(generator) = self.current_generator() {
            generator.borrow_mut().resume_points.push(point);
        }
    }

    // ============ STATEMENT LISTS ============

    /// Execute statements in order, stopping at the first abrupt completion
    pub(crate) fn execute_statement_list(
        &mut self,
        list: &StatementList,
    ) -> Result<Completion, JsError> {
        let analysis = analyze_list(list);
        let (start, mut last_value) = match self.take_resume_point() {
            Some(ResumePoint::List { index, last_value }) => (index, last_value),
            Some(other) => return Err(unexpected_resume_point(other)),
            None => (0, None),
        };

        for (index, stmt) in list.statements.iter().enumerate().skip(start) {
            self.check_constraints()?;
            let result = match analysis.fast.get(index).and_then(Option::as_ref) {
                Some(fast) => Ok(fast.completion()),
                None => self.execute_statement(stmt),
            };
            let completion = match result {
                Ok(completion) => completion,
                Err(e) if e.is_suspension() => {
                    self.push_resume_point(ResumePoint::List { index, last_value });
                    return Err(e);
                }
                Err(e) if e.is_host_abort() => return Err(e),
                Err(e) => {
                    let location = e.location().unwrap_or_else(|| stmt.span());
                    let value = self.error_to_value(e);
                    Completion::throw(value, location)
                }
            };
            if completion.is_abrupt() {
                return Ok(completion.update_empty(last_value));
            }
            if completion.value.is_some() {
                last_value = completion.value;
            }
        }
        Ok(Completion::normal_opt(last_value))
    }

    // ============ STATEMENTS ============

    pub(crate) fn execute_statement(&mut self, stmt: &Statement) -> Result<Completion, JsError> {
        self.execute_labelled(stmt, &[])
    }

    /// LabelledEvaluation: `labels` is the label set of the enclosing
    /// labelled statements
    fn execute_labelled(
        &mut self,
        stmt: &Statement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        match stmt {
            Statement::Labeled(labeled) => {
                let mut label_set = labels.to_vec();
                label_set.push(labeled.label.name.cheap_clone());
                let completion = self.execute_labelled(&labeled.body, &label_set)?;
                if completion.kind == CompletionType::Break
                    && completion.label.as_ref() == Some(&labeled.label.name)
                {
                    Ok(Completion::normal_opt(completion.value))
                } else {
                    Ok(completion)
                }
            }
            Statement::While(s) => self.execute_while(s, labels),
            Statement::DoWhile(s) => self.execute_do_while(s, labels),
            Statement::For(s) => self.execute_for(s, labels),
            Statement::Switch(s) => self.execute_switch(s),
            _ => self.execute_simple(stmt),
        }
    }

    fn execute_simple(&mut self, stmt: &Statement) -> Result<Completion, JsError> {
        match stmt {
            Statement::Expression(s) => self.execute_expression_statement(s),
            Statement::VariableDeclaration(decl) => self.execute_variable_declaration(decl, true),
            Statement::FunctionDeclaration(_) | Statement::Empty(_) | Statement::Debugger(_) => {
                Ok(Completion::empty())
            }
            Statement::ClassDeclaration(class) => self.execute_class_declaration(class),
            Statement::Block(block) => self.execute_block(block),
            Statement::If(s) => self.execute_if(s),
            Statement::Try(s) => self.execute_try(s),
            Statement::With(s) => self.execute_with(s),
            Statement::Return(s) => self.execute_return(s),
            Statement::Throw(s) => {
                let value = self.evaluate(&s.argument)?;
                Ok(Completion::throw(value, s.span))
            }
            Statement::Break(s) => Ok(Completion::break_(
                s.label.as_ref().map(|l| l.name.cheap_clone()),
                s.span,
            )),
            Statement::Continue(s) => Ok(Completion::continue_(
                s.label.as_ref().map(|l| l.name.cheap_clone()),
                s.span,
            )),
            Statement::Labeled(_)
            | Statement::While(_)
            | Statement::DoWhile(_)
            | Statement::For(_)
            | Statement::Switch(_) => self.execute_labelled(stmt, &[]),
        }
    }

    // ============ YIELD ============

    /// Whether the running generator is resuming at a `yield` record
    fn resuming_yield(&self) -> Result<Option<usize>, JsError> {
        match self.take_resume_point() {
            Some(ResumePoint::Yield { slot }) => Ok(Some(slot)),
            Some(other) => Err(unexpected_resume_point(other)),
            None => Ok(None),
        }
    }

    /// Suspend the running generator with the value of `expr`
    fn yield_value(&mut self, expr: &YieldExpression, slot: usize) -> Result<YieldResult, JsError> {
        let Some(generator) = self.current_generator() else {
            return Err(JsError::SyntaxError {
                message: "yield is only valid in generator functions".to_string(),
                location: Some(expr.span),
            });
        };
        let value = match &expr.argument {
            Some(argument) => self.evaluate(argument)?,
            None => JsValue::Undefined,
        };
        generator
            .borrow_mut()
            .resume_points
            .push(ResumePoint::Yield { slot });
        Err(JsError::GeneratorYield { value })
    }

    /// Deliver the resumption value at the `yield` the generator stopped on
    fn yield_resumed(&mut self, span: Span) -> Result<YieldResult, JsError> {
        let resumption = self
            .current_generator()
            .and_then(|g| g.borrow_mut().resumption.take());
        match resumption {
            None => Ok(YieldResult::Value(JsValue::Undefined)),
            Some(Resumption::Next(value)) => Ok(YieldResult::Value(value)),
            Some(Resumption::Return(value)) => Ok(YieldResult::Return(value)),
            Some(Resumption::Throw(value)) => Err(JsError::Thrown {
                value,
                location: Some(span),
            }),
        }
    }

    fn yield_at(
        &mut self,
        expr: &YieldExpression,
        slot: usize,
        resume: Option<usize>,
    ) -> Result<YieldResult, JsError> {
        if resume == Some(slot) {
            self.yield_resumed(expr.span)
        } else {
            self.yield_value(expr, slot)
        }
    }

    // ============ SIMPLE STATEMENTS ============

    fn execute_expression_statement(
        &mut self,
        stmt: &ExpressionStatement,
    ) -> Result<Completion, JsError> {
        match &stmt.expression {
            Expression::Yield(y) => {
                let resume = self.resuming_yield()?;
                match self.yield_at(y, 0, resume)? {
                    YieldResult::Value(value) => Ok(Completion::normal(value)),
                    YieldResult::Return(value) => Ok(Completion::return_(value)),
                }
            }
            Expression::Assignment(assign) => match (assign.op, assign.value.as_ref()) {
                (AssignmentOp::Assign, Expression::Yield(y)) => {
                    let resume = self.resuming_yield()?;
                    match self.yield_at(y, 0, resume)? {
                        YieldResult::Value(value) => {
                            let value = self.assign_to_target(&assign.target, value)?;
                            Ok(Completion::normal(value))
                        }
                        YieldResult::Return(value) => Ok(Completion::return_(value)),
                    }
                }
                _ => Ok(Completion::normal(self.evaluate(&stmt.expression)?)),
            },
            expr => Ok(Completion::normal(self.evaluate(expr)?)),
        }
    }

    fn execute_return(&mut self, stmt: &ReturnStatement) -> Result<Completion, JsError> {
        match &stmt.argument {
            None => Ok(Completion::return_(JsValue::Undefined)),
            Some(Expression::Yield(y)) => {
                let resume = self.resuming_yield()?;
                match self.yield_at(y, 0, resume)? {
                    YieldResult::Value(value) | YieldResult::Return(value) => {
                        Ok(Completion::return_(value))
                    }
                }
            }
            Some(argument) => Ok(Completion::return_(self.evaluate(argument)?)),
        }
    }

    /// `var`/`let`/`const`. `allow_yield` is false for `for` heads.
    pub(crate) fn execute_variable_declaration(
        &mut self,
        decl: &VariableDeclaration,
        allow_yield: bool,
    ) -> Result<Completion, JsError> {
        let has_yield = allow_yield
            && decl
                .declarations
                .iter()
                .any(|d| matches!(d.init, Some(Expression::Yield(_))));
        let resume = if has_yield { self.resuming_yield()? } else { None };

        for (slot, declarator) in decl.declarations.iter().enumerate() {
            if resume.is_some_and(|r| slot < r) {
                continue;
            }
            let name = &declarator.id.name;
            let value = match &declarator.init {
                Some(Expression::Yield(y)) if allow_yield => {
                    match self.yield_at(y, slot, resume)? {
                        YieldResult::Value(value) => Some(value),
                        YieldResult::Return(value) => return Ok(Completion::return_(value)),
                    }
                }
                Some(init) => Some(self.evaluate_named(init, name)?),
                None => None,
            };

            match decl.kind {
                VariableKind::Var => {
                    if let Some(value) = value {
                        let reference = self.resolve_binding(name);
                        self.put_value(&reference, value)?;
                    }
                }
                VariableKind::Let | VariableKind::Const => {
                    let env = self.lexical_environment();
                    let mut env = env.borrow_mut();
                    if !env.has_binding(name) {
                        if decl.kind == VariableKind::Const {
                            env.create_immutable_binding(name.cheap_clone(), true)?;
                        } else {
                            env.create_mutable_binding(name.cheap_clone(), false)?;
                        }
                    }
                    env.initialize_binding(name, value.unwrap_or_default())?;
                }
            }
        }
        Ok(Completion::empty())
    }

    fn execute_class_declaration(&mut self, class: &ClassNode) -> Result<Completion, JsError> {
        let constructor = self.evaluate_class(class, None)?;
        if let Some(id) = &class.id {
            let env = self.lexical_environment();
            let mut env = env.borrow_mut();
            if !env.has_binding(&id.name) {
                env.create_mutable_binding(id.name.cheap_clone(), false)?;
            }
            env.initialize_binding(&id.name, JsValue::Object(constructor))?;
        }
        Ok(Completion::empty())
    }

    // ============ SCOPES ============

    /// Instantiate the lexical declarations of a list into a fresh
    /// environment. `None` when the list declares nothing block-scoped.
    pub(crate) fn block_declaration_instantiation(
        &mut self,
        bindings: &[LexicalBinding],
        functions: &[Rc<crate::ast::FunctionNode>],
        outer: &EnvRef,
    ) -> Result<Option<EnvRef>, JsError> {
        if bindings.is_empty() && functions.is_empty() {
            return Ok(None);
        }
        let env = Environment::new_declarative(Some(outer.cheap_clone()));
        {
            let mut e = env.borrow_mut();
            for binding in bindings {
                if binding.constant {
                    e.create_immutable_binding(binding.name.cheap_clone(), true)?;
                } else {
                    e.create_mutable_binding(binding.name.cheap_clone(), false)?;
                }
            }
            for function in functions {
                if let Some(name) = function.name() {
                    if !e.has_binding(name) {
                        e.create_mutable_binding(name.cheap_clone(), false)?;
                    }
                }
            }
        }
        for function in functions {
            if let Some(name) = function.name() {
                let object = self.instantiate_function_object(function, env.cheap_clone());
                env.borrow_mut()
                    .initialize_binding(name, JsValue::Object(object))?;
            }
        }
        Ok(Some(env))
    }

    pub(crate) fn execute_block(&mut self, block: &BlockStatement) -> Result<Completion, JsError> {
        let old = self.lexical_environment();
        let env = match self.take_resume_point() {
            Some(ResumePoint::Scope { env }) => env,
            Some(other) => return Err(unexpected_resume_point(other)),
            None => {
                let analysis = analyze_list(&block.body);
                self.block_declaration_instantiation(&analysis.lexical, &analysis.functions, &old)?
            }
        };
        if let Some(env) = &env {
            self.set_lexical_environment(env.cheap_clone());
        }
        let result = self.execute_statement_list(&block.body);
        self.set_lexical_environment(old);
        if is_suspension(&result) {
            self.push_resume_point(ResumePoint::Scope { env });
        }
        result
    }

    fn execute_with(&mut self, stmt: &WithStatement) -> Result<Completion, JsError> {
        if self.is_strict() {
            return Err(JsError::SyntaxError {
                message: "Strict mode code may not include a with statement".to_string(),
                location: Some(stmt.span),
            });
        }
        let old = self.lexical_environment();
        let env = match self.take_resume_point() {
            Some(ResumePoint::Scope { env }) => env,
            Some(other) => return Err(unexpected_resume_point(other)),
            None => {
                let value = self.evaluate(&stmt.object)?;
                let object = self.to_object(&value)?;
                Some(Environment::new_object(object, true, old.cheap_clone()))
            }
        };
        if let Some(env) = &env {
            self.set_lexical_environment(env.cheap_clone());
        }
        let result = self.execute_statement(&stmt.body);
        self.set_lexical_environment(old);
        if is_suspension(&result) {
            self.push_resume_point(ResumePoint::Scope { env });
        }
        result
    }

    // ============ CONTROL FLOW ============

    fn execute_if(&mut self, stmt: &IfStatement) -> Result<Completion, JsError> {
        let consequent = match self.take_resume_point() {
            Some(ResumePoint::Branch { consequent }) => consequent,
            Some(other) => return Err(unexpected_resume_point(other)),
            None => self.evaluate(&stmt.test)?.to_boolean(),
        };
        let branch = if consequent {
            Some(stmt.consequent.as_ref())
        } else {
            stmt.alternate.as_deref()
        };
        let Some(branch) = branch else {
            return Ok(Completion::normal(JsValue::Undefined));
        };
        let result = self.execute_statement(branch);
        if is_suspension(&result) {
            self.push_resume_point(ResumePoint::Branch { consequent });
        }
        // An empty value stays empty so the enclosing list keeps its last value
        result
    }

    fn resume_loop(&self) -> Result<Option<(JsValue, Option<EnvRef>)>, JsError> {
        match self.take_resume_point() {
            Some(ResumePoint::Loop { value, env }) => Ok(Some((value, env))),
            Some(other) => Err(unexpected_resume_point(other)),
            None => Ok(None),
        }
    }

    fn execute_while(
        &mut self,
        stmt: &WhileStatement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        let (mut value, mut resuming) = match self.resume_loop()? {
            Some((value, _)) => (value, true),
            None => (JsValue::Undefined, false),
        };
        loop {
            if !resuming && !self.evaluate(&stmt.test)?.to_boolean() {
                return Ok(Completion::normal(value));
            }
            resuming = false;
            let completion = match self.execute_statement(&stmt.body) {
                Err(e) if e.is_suspension() => {
                    self.push_resume_point(ResumePoint::Loop { value, env: None });
                    return Err(e);
                }
                other => other?,
            };
            if !completion.loop_continues(labels) {
                return Ok(exit_breakable(completion.update_empty(Some(value))));
            }
            if let Some(v) = completion.value {
                value = v;
            }
        }
    }

    fn execute_do_while(
        &mut self,
        stmt: &DoWhileStatement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        let mut value = match self.resume_loop()? {
            Some((value, _)) => value,
            None => JsValue::Undefined,
        };
        loop {
            let completion = match self.execute_statement(&stmt.body) {
                Err(e) if e.is_suspension() => {
                    self.push_resume_point(ResumePoint::Loop { value, env: None });
                    return Err(e);
                }
                other => other?,
            };
            if !completion.loop_continues(labels) {
                return Ok(exit_breakable(completion.update_empty(Some(value))));
            }
            if let Some(v) = completion.value {
                value = v;
            }
            if !self.evaluate(&stmt.test)?.to_boolean() {
                return Ok(Completion::normal(value));
            }
        }
    }

    fn execute_for(
        &mut self,
        stmt: &ForStatement,
        labels: &[JsString],
    ) -> Result<Completion, JsError> {
        let old = self.lexical_environment();
        let result = self.execute_for_body(stmt, labels, &old);
        self.set_lexical_environment(old);
        result
    }

    /// Names copied into a fresh environment for every iteration
    fn per_iteration_bindings(stmt: &ForStatement) -> Vec<JsString> {
        match &stmt.init {
            Some(ForInit::Variable(decl)) if decl.kind == VariableKind::Let => decl
                .declarations
                .iter()
                .map(|d| d.id.name.cheap_clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    fn execute_for_body(
        &mut self,
        stmt: &ForStatement,
        labels: &[JsString],
        old: &EnvRef,
    ) -> Result<Completion, JsError> {
        let per_iteration = Self::per_iteration_bindings(stmt);
        let (mut value, mut resuming) = match self.resume_loop()? {
            Some((value, env)) => {
                if let Some(env) = env {
                    self.set_lexical_environment(env);
                }
                (value, true)
            }
            None => {
                self.execute_for_init(stmt, old)?;
                self.create_per_iteration_environment(&per_iteration)?;
                (JsValue::Undefined, false)
            }
        };

        loop {
            if !resuming {
                if let Some(test) = &stmt.test {
                    if !self.evaluate(test)?.to_boolean() {
                        return Ok(Completion::normal(value));
                    }
                }
            }
            resuming = false;
            let completion = match self.execute_statement(&stmt.body) {
                Err(e) if e.is_suspension() => {
                    let env = self.lexical_environment();
                    let env = (!Rc::ptr_eq(&env, old)).then_some(env);
                    self.push_resume_point(ResumePoint::Loop { value, env });
                    return Err(e);
                }
                other => other?,
            };
            if !completion.loop_continues(labels) {
                return Ok(exit_breakable(completion.update_empty(Some(value))));
            }
            if let Some(v) = completion.value {
                value = v;
            }
            self.create_per_iteration_environment(&per_iteration)?;
            if let Some(update) = &stmt.update {
                self.evaluate(update)?;
            }
        }
    }

    fn execute_for_init(&mut self, stmt: &ForStatement, old: &EnvRef) -> Result<(), JsError> {
        match &stmt.init {
            None => {}
            Some(ForInit::Expression(expr)) => {
                self.evaluate(expr)?;
            }
            Some(ForInit::Variable(decl)) if decl.kind == VariableKind::Var => {
                self.execute_variable_declaration(decl, false)?;
            }
            Some(ForInit::Variable(decl)) => {
                let loop_env = Environment::new_declarative(Some(old.cheap_clone()));
                {
                    let mut env = loop_env.borrow_mut();
                    for d in &decl.declarations {
                        if decl.kind == VariableKind::Const {
                            env.create_immutable_binding(d.id.name.cheap_clone(), true)?;
                        } else {
                            env.create_mutable_binding(d.id.name.cheap_clone(), false)?;
                        }
                    }
                }
                self.set_lexical_environment(loop_env);
                self.execute_variable_declaration(decl, false)?;
            }
        }
        Ok(())
    }

    /// Copy the loop's `let` bindings into a new environment so closures
    /// created in one iteration keep that iteration's values
    fn create_per_iteration_environment(&mut self, names: &[JsString]) -> Result<(), JsError> {
        if names.is_empty() {
            return Ok(());
        }
        let last = self.lexical_environment();
        let outer = last.borrow().outer.clone();
        let this_iteration = Environment::new_declarative(outer);
        for name in names {
            let value = last.borrow().get_binding_value(name, true)?;
            let mut env = this_iteration.borrow_mut();
            env.create_mutable_binding(name.cheap_clone(), false)?;
            env.initialize_binding(name, value)?;
        }
        self.set_lexical_environment(this_iteration);
        Ok(())
    }

    fn execute_switch(&mut self, stmt: &SwitchStatement) -> Result<Completion, JsError> {
        let old = self.lexical_environment();
        let (start, value, env) = match self.take_resume_point() {
            Some(ResumePoint::Switch { case, value, env }) => (case, value, env),
            Some(other) => return Err(unexpected_resume_point(other)),
            None => {
                let discriminant = self.evaluate(&stmt.discriminant)?;
                let scope = switch_scope(stmt);
                let env =
                    self.block_declaration_instantiation(&scope.lexical, &scope.functions, &old)?;
                if let Some(env) = &env {
                    self.set_lexical_environment(env.cheap_clone());
                }
                let selected = self.select_case(stmt, &discriminant);
                let start = match selected {
                    Ok(Some(start)) => start,
                    Ok(None) => {
                        self.set_lexical_environment(old);
                        return Ok(Completion::normal(JsValue::Undefined));
                    }
                    Err(e) => {
                        self.set_lexical_environment(old);
                        return Err(e);
                    }
                };
                (start, JsValue::Undefined, env)
            }
        };
        if let Some(env) = &env {
            self.set_lexical_environment(env.cheap_clone());
        }
        let result = self.execute_cases(stmt, start, value, &env);
        self.set_lexical_environment(old);
        result
    }

    /// Index of the first matching clause, falling back to `default`
    fn select_case(
        &mut self,
        stmt: &SwitchStatement,
        discriminant: &JsValue,
    ) -> Result<Option<usize>, JsError> {
        for (index, case) in stmt.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let value = self.evaluate(test)?;
                if value.strict_equals(discriminant) {
                    return Ok(Some(index));
                }
            }
        }
        Ok(stmt.cases.iter().position(|case| case.test.is_none()))
    }

    fn execute_cases(
        &mut self,
        stmt: &SwitchStatement,
        start: usize,
        mut value: JsValue,
        env: &Option<EnvRef>,
    ) -> Result<Completion, JsError> {
        for (index, case) in stmt.cases.iter().enumerate().skip(start) {
            let completion = match self.execute_statement_list(&case.consequent) {
                Err(e) if e.is_suspension() => {
                    self.push_resume_point(ResumePoint::Switch {
                        case: index,
                        value,
                        env: env.clone(),
                    });
                    return Err(e);
                }
                other => other?,
            };
            if let Some(v) = &completion.value {
                value = v.cheap_clone();
            }
            if completion.is_abrupt() {
                return Ok(exit_breakable(completion.update_empty(Some(value))));
            }
        }
        Ok(Completion::normal(value))
    }

    // ============ TRY ============

    fn execute_try(&mut self, stmt: &TryStatement) -> Result<Completion, JsError> {
        let resumed = match self.take_resume_point() {
            Some(ResumePoint::Try { phase }) => Some(phase),
            Some(other) => return Err(unexpected_resume_point(other)),
            None => None,
        };

        let completion = match resumed {
            Some(TryPhase::Finally { pending }) => return self.execute_finally(stmt, pending),
            Some(TryPhase::Catch { env }) => self.execute_catch(stmt, CatchEntry::Resume(env))?,
            Some(TryPhase::Block) | None => {
                let completion = match self.execute_block(&stmt.block) {
                    Err(e) if e.is_suspension() => {
                        self.push_resume_point(ResumePoint::Try {
                            phase: TryPhase::Block,
                        });
                        return Err(e);
                    }
                    other => other?,
                };
                if completion.kind == CompletionType::Throw && stmt.handler.is_some() {
                    let thrown = completion.value_or_undefined();
                    self.execute_catch(stmt, CatchEntry::Thrown(thrown))?
                } else {
                    completion
                }
            }
        };
        self.execute_finally(stmt, completion)
    }

    fn execute_catch(
        &mut self,
        stmt: &TryStatement,
        entry: CatchEntry,
    ) -> Result<Completion, JsError> {
        let Some(handler) = &stmt.handler else {
            return Err(JsError::internal_error("try statement has no catch clause"));
        };
        let old = self.lexical_environment();
        let env = match entry {
            CatchEntry::Resume(env) => env,
            CatchEntry::Thrown(thrown) => Some(self.catch_environment(handler, thrown, &old)?),
        };
        if let Some(env) = &env {
            self.set_lexical_environment(env.cheap_clone());
        }
        let result = self.execute_block(&handler.body);
        self.set_lexical_environment(old);
        if is_suspension(&result) {
            self.push_resume_point(ResumePoint::Try {
                phase: TryPhase::Catch { env },
            });
        }
        result
    }

    fn catch_environment(
        &mut self,
        handler: &CatchClause,
        thrown: JsValue,
        outer: &EnvRef,
    ) -> Result<EnvRef, JsError> {
        let env = Environment::new_declarative(Some(outer.cheap_clone()));
        if let Some(param) = &handler.param {
            let mut e = env.borrow_mut();
            e.create_mutable_binding(param.name.cheap_clone(), false)?;
            e.initialize_binding(&param.name, thrown)?;
        }
        Ok(env)
    }

    /// Run the finalizer; its own abrupt completion overrides `pending`
    fn execute_finally(
        &mut self,
        stmt: &TryStatement,
        pending: Completion,
    ) -> Result<Completion, JsError> {
        let Some(finalizer) = &stmt.finalizer else {
            return Ok(pending);
        };
        let result = match self.execute_block(finalizer) {
            Err(e) if e.is_suspension() => {
                self.push_resume_point(ResumePoint::Try {
                    phase: TryPhase::Finally { pending },
                });
                return Err(e);
            }
            other => other?,
        };
        if result.kind == CompletionType::Normal {
            Ok(pending)
        } else {
            Ok(result)
        }
    }
}

enum CatchEntry {
    Thrown(JsValue),
    Resume(Option<EnvRef>),
}
