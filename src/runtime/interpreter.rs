//! The AST walker: statement execution, expression evaluation, control
//! flow, and the member/assignment machinery that destructuring and call
//! binding build on.

use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{self, Expression, Pattern, Statement};
use crate::error::{messages, Error, ErrorKind, Result};
use crate::runtime::call::ExecMode;
use crate::runtime::destructure::{bind_pattern, AssignBinder, DeclareBinder};
use crate::runtime::environment::{BindingKind, Environment};
use crate::runtime::generator::{GeneratorHandle, YieldOutcome};
use crate::runtime::security;
use crate::runtime::value::{ArrayData, HostFunction, ObjectData, SandboxFunction, Value};
use crate::runtime::Interpreter;

/// How a block of statements finished. Threaded up through nested
/// blocks/loops so `break`/`continue`/`return` can unwind to the statement
/// that handles them without relying on Rust-level panics.
pub enum Completion {
    Normal(Value),
    Return(Value),
    Break(Option<String>),
    Continue(Option<String>),
}

/// The assignment target resolved once, before the right-hand side runs, so a
/// member expression's object subexpression is evaluated exactly once even
/// under compound assignment (`obj.x += f()`) or destructuring.
pub enum AssignRef {
    Identifier(String),
    Member { object: Value, key: String },
}

/// Lazy cursor over an iterable source, advanced one item at a time by
/// [`Interpreter::next_iter_item`].
pub enum IterCursor {
    Vec(std::vec::IntoIter<Value>),
    Generator(GeneratorHandle),
    Protocol { receiver: Value, next_fn: Value },
}

impl Interpreter {
    // ---- statement execution -------------------------------------------------

    /// Executes a block's statements in `env`, hoisting `var` declarations
    /// and function declarations to the top first.
    /// Does not descend into nested function bodies while hoisting.
    pub fn exec_block_statements(&mut self, env: &Environment, stmts: &[Statement]) -> Result<Completion> {
        self.hoist(env, stmts)?;
        for stmt in stmts {
            match self.exec_statement(env, stmt)? {
                Completion::Normal(_) => {}
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    fn hoist(&mut self, env: &Environment, stmts: &[Statement]) -> Result<()> {
        for stmt in stmts {
            match stmt {
                Statement::VariableDeclaration(decl) if decl.kind == ast::VariableKind::Var => {
                    for declarator in &decl.declarations {
                        for name in declarator.id.bound_names() {
                            if !env.has(&name.name) {
                                env.define(&name.name, BindingKind::Var, Value::Undefined)?;
                            }
                        }
                    }
                }
                Statement::FunctionDeclaration(func) => {
                    if let Some(id) = &func.id {
                        let value = self.make_function(env, func, false);
                        env.define(&id.name, BindingKind::Var, value)?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn exec_statement(&mut self, env: &Environment, stmt: &Statement) -> Result<Completion> {
        match stmt {
            Statement::Block(block) => {
                let child = env.child();
                self.exec_block_statements(&child, &block.body)
            }
            Statement::Empty(_) => Ok(Completion::Normal(Value::Undefined)),
            Statement::Expression(expr_stmt) => {
                let v = self.eval_expression(env, &expr_stmt.expression)?;
                Ok(Completion::Normal(v))
            }
            Statement::If(if_stmt) => {
                if self.eval_expression(env, &if_stmt.test)?.is_truthy() {
                    self.exec_statement(env, &if_stmt.consequent)
                } else if let Some(alt) = &if_stmt.alternate {
                    self.exec_statement(env, alt)
                } else {
                    Ok(Completion::Normal(Value::Undefined))
                }
            }
            Statement::While(w) => self.exec_loop(None, || Ok(()), |interp| {
                if !interp.eval_expression(env, &w.test)?.is_truthy() {
                    return Ok(LoopStep::Stop);
                }
                Ok(LoopStep::Body(env.child()))
            }, |_| Ok(()), &w.body),
            Statement::DoWhile(d) => self.exec_do_while(env, d),
            Statement::For(f) => self.exec_for(env, f),
            Statement::ForIn(f) => self.exec_for_in(env, f),
            Statement::ForOf(f) => self.exec_for_of(env, f),
            Statement::Switch(s) => self.exec_switch(env, s),
            Statement::Break(b) => Ok(Completion::Break(b.label.as_ref().map(|l| l.name.clone()))),
            Statement::Continue(c) => Ok(Completion::Continue(c.label.as_ref().map(|l| l.name.clone()))),
            Statement::Return(r) => {
                let v = match &r.argument {
                    Some(expr) => self.eval_expression(env, expr)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(v))
            }
            Statement::Throw(t) => {
                let v = self.eval_expression(env, &t.argument)?;
                Err(Error::Thrown(v))
            }
            Statement::Try(t) => self.exec_try(env, t),
            Statement::Labeled(l) => self.exec_labeled(env, l),
            Statement::VariableDeclaration(decl) => self.exec_variable_declaration(env, decl),
            Statement::FunctionDeclaration(_) => Ok(Completion::Normal(Value::Undefined)),
        }
    }

    fn exec_variable_declaration(&mut self, env: &Environment, decl: &ast::VariableDeclaration) -> Result<Completion> {
        let kind = match decl.kind {
            ast::VariableKind::Var => BindingKind::Var,
            ast::VariableKind::Let => BindingKind::Let,
            ast::VariableKind::Const => BindingKind::Const,
        };
        for declarator in &decl.declarations {
            let value = match &declarator.init {
                Some(expr) => self.eval_expression(env, expr)?,
                None => Value::Undefined,
            };
            if kind == BindingKind::Var {
                // Slot already exists from hoisting; this is a plain assign,
                // except `var` may legally appear inside a block nested under
                // the function frame it hoisted into.
                bind_pattern(self, env, &declarator.id, value, &mut AssignBinder)?;
            } else {
                bind_pattern(self, env, &declarator.id, value, &mut DeclareBinder(kind))?;
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    fn exec_labeled(&mut self, env: &Environment, l: &ast::LabeledStatement) -> Result<Completion> {
        match self.exec_labeled_body(env, &l.label.name, &l.body)? {
            Completion::Break(Some(label)) if label == l.label.name => Ok(Completion::Normal(Value::Undefined)),
            other => Ok(other),
        }
    }

    /// Runs a (possibly loop) statement with `label` as its innermost label,
    /// so `continue label;` inside its body is recognized as targeting this
    /// loop rather than escaping further out.
    fn exec_labeled_body(&mut self, env: &Environment, label: &str, body: &Statement) -> Result<Completion> {
        match body {
            Statement::While(w) => self.exec_loop(Some(label), || Ok(()), |interp| {
                if !interp.eval_expression(env, &w.test)?.is_truthy() {
                    return Ok(LoopStep::Stop);
                }
                Ok(LoopStep::Body(env.child()))
            }, |_| Ok(()), &w.body),
            Statement::For(f) => self.exec_for_labeled(env, f, Some(label)),
            Statement::ForIn(f) => self.exec_for_in_labeled(env, f, Some(label)),
            Statement::ForOf(f) => self.exec_for_of_labeled(env, f, Some(label)),
            Statement::DoWhile(d) => self.exec_do_while_labeled(env, d, Some(label)),
            Statement::Labeled(inner) => {
                // Nested labels on the same loop: `outer: inner: for (...)`.
                match self.exec_labeled_body(env, &inner.label.name, &inner.body)? {
                    Completion::Break(Some(l)) if l == inner.label.name => Ok(Completion::Normal(Value::Undefined)),
                    other => Ok(other),
                }
            }
            other => self.exec_statement(env, other),
        }
    }

    fn exec_try(&mut self, env: &Environment, t: &ast::TryStatement) -> Result<Completion> {
        let try_result = self.exec_block_statements(&env.child(), &t.block.body);

        let after_catch = match try_result {
            Err(err) => match &t.handler {
                Some(handler) => match catchable_value(err) {
                    Ok(value) => {
                        let catch_env = env.child();
                        if let Some(param) = &handler.param {
                            bind_pattern(self, &catch_env, param, value, &mut DeclareBinder(BindingKind::Let))?;
                        }
                        self.exec_block_statements(&catch_env, &handler.body.body)
                    }
                    Err(fatal) => Err(fatal),
                },
                None => Err(err),
            },
            ok => ok,
        };

        match &t.finalizer {
            Some(finalizer) => {
                let finally_result = self.exec_block_statements(&env.child(), &finalizer.body)?;
                match finally_result {
                    Completion::Normal(_) => after_catch,
                    // A completion from `finally` overrides whatever the
                    // try/catch produced, including a pending throw.
                    overriding => Ok(overriding),
                }
            }
            None => after_catch,
        }
    }

    // ---- loops -----------------------------------------------------------

    fn exec_do_while(&mut self, env: &Environment, d: &ast::DoWhileStatement) -> Result<Completion> {
        self.exec_do_while_labeled(env, d, None)
    }

    fn exec_do_while_labeled(&mut self, env: &Environment, d: &ast::DoWhileStatement, label: Option<&str>) -> Result<Completion> {
        let mut iterations: u64 = 0;
        loop {
            self.meter.check_loop_iteration(iterations)?;
            self.check_abort()?;
            iterations += 1;
            match self.exec_statement(&env.child(), &d.body)? {
                Completion::Normal(_) => {}
                Completion::Continue(None) => {}
                Completion::Continue(Some(l)) if Some(l.as_str()) == label => {}
                Completion::Break(None) => break,
                Completion::Break(Some(l)) if Some(l.as_str()) == label => break,
                other => return Ok(other),
            }
            if !self.eval_expression(env, &d.test)?.is_truthy() {
                break;
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    fn exec_for(&mut self, env: &Environment, f: &ast::ForStatement) -> Result<Completion> {
        self.exec_for_labeled(env, f, None)
    }

    fn exec_for_labeled(&mut self, env: &Environment, f: &ast::ForStatement, label: Option<&str>) -> Result<Completion> {
        let loop_env = env.child();
        if let Some(init) = &f.init {
            match init {
                ast::ForInit::Declaration(decl) => {
                    self.exec_variable_declaration(&loop_env, decl)?;
                }
                ast::ForInit::Expression(expr) => {
                    self.eval_expression(&loop_env, expr)?;
                }
            }
        }
        let mut iterations: u64 = 0;
        loop {
            self.meter.check_loop_iteration(iterations)?;
            self.check_abort()?;
            iterations += 1;
            if let Some(test) = &f.test {
                if !self.eval_expression(&loop_env, test)?.is_truthy() {
                    break;
                }
            }
            let body_env = loop_env.child();
            match self.exec_statement(&body_env, &f.body)? {
                Completion::Normal(_) => {}
                Completion::Continue(None) => {}
                Completion::Continue(Some(l)) if Some(l.as_str()) == label => {}
                Completion::Break(None) => break,
                Completion::Break(Some(l)) if Some(l.as_str()) == label => break,
                other => return Ok(other),
            }
            if let Some(update) = &f.update {
                self.eval_expression(&loop_env, update)?;
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    fn exec_for_in(&mut self, env: &Environment, f: &ast::ForInStatement) -> Result<Completion> {
        self.exec_for_in_labeled(env, f, None)
    }

    fn exec_for_in_labeled(&mut self, env: &Environment, f: &ast::ForInStatement, label: Option<&str>) -> Result<Completion> {
        let target = self.eval_expression(env, &f.right)?;
        let keys: Vec<String> = match &target {
            Value::Object(obj) => obj.borrow().keys().into_iter().map(|k| k.to_string()).collect(),
            Value::Array(arr) => arr.borrow().defined_indices().into_iter().map(|i| i.to_string()).collect(),
            Value::Undefined | Value::Null => {
                return Err(Error::type_error(messages::for_in_requires_object(target.type_of())));
            }
            _ => Vec::new(),
        };

        let mut iterations: u64 = 0;
        for key in keys {
            self.meter.check_loop_iteration(iterations)?;
            self.check_abort()?;
            iterations += 1;
            let body_env = env.child();
            self.bind_for_left(&body_env, &f.left, Value::string(key))?;
            match self.exec_statement(&body_env, &f.body)? {
                Completion::Normal(_) => {}
                Completion::Continue(None) => {}
                Completion::Continue(Some(l)) if Some(l.as_str()) == label => {}
                Completion::Break(None) => break,
                Completion::Break(Some(l)) if Some(l.as_str()) == label => break,
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    fn exec_for_of(&mut self, env: &Environment, f: &ast::ForOfStatement) -> Result<Completion> {
        self.exec_for_of_labeled(env, f, None)
    }

    fn exec_for_of_labeled(&mut self, env: &Environment, f: &ast::ForOfStatement, label: Option<&str>) -> Result<Completion> {
        let iterable = self.eval_expression(env, &f.right)?;
        let mut cursor = self.make_iter_cursor(&iterable)?;

        let mut iterations: u64 = 0;
        loop {
            self.meter.check_loop_iteration(iterations)?;
            self.check_abort()?;
            iterations += 1;
            let item = match self.next_iter_item(&mut cursor)? {
                Some(item) => item,
                None => break,
            };
            let body_env = env.child();
            self.bind_for_left(&body_env, &f.left, item)?;
            match self.exec_statement(&body_env, &f.body)? {
                Completion::Normal(_) => {}
                Completion::Continue(None) => {}
                Completion::Continue(Some(l)) if Some(l.as_str()) == label => {}
                Completion::Break(None) => break,
                Completion::Break(Some(l)) if Some(l.as_str()) == label => break,
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    fn bind_for_left(&mut self, env: &Environment, left: &ast::ForInLeft, value: Value) -> Result<()> {
        match left {
            ast::ForInLeft::Declaration(decl) => {
                let kind = match decl.kind {
                    ast::VariableKind::Var => BindingKind::Var,
                    ast::VariableKind::Let => BindingKind::Let,
                    ast::VariableKind::Const => BindingKind::Const,
                };
                let pattern = &decl.declarations[0].id;
                bind_pattern(self, env, pattern, value, &mut DeclareBinder(kind))
            }
            ast::ForInLeft::Pattern(pattern) => bind_pattern(self, env, pattern, value, &mut AssignBinder),
            ast::ForInLeft::Expression(expr) => {
                let target = self.eval_assignment_target_expr(env, expr)?;
                self.write_simple_target(env, &target, value)
            }
        }
    }

    fn exec_switch(&mut self, env: &Environment, s: &ast::SwitchStatement) -> Result<Completion> {
        let discriminant = self.eval_expression(env, &s.discriminant)?;
        let switch_env = env.child();

        let mut matched_index: Option<usize> = None;
        for (i, case) in s.cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let test_value = self.eval_expression(&switch_env, test)?;
                if test_value.strict_eq(&discriminant) {
                    matched_index = Some(i);
                    break;
                }
            }
        }
        if matched_index.is_none() {
            matched_index = s.cases.iter().position(|c| c.test.is_none());
        }
        let start = match matched_index {
            Some(i) => i,
            None => return Ok(Completion::Normal(Value::Undefined)),
        };

        for case in &s.cases[start..] {
            self.hoist(&switch_env, &case.consequent)?;
            for stmt in &case.consequent {
                match self.exec_statement(&switch_env, stmt)? {
                    Completion::Normal(_) => {}
                    Completion::Break(None) => return Ok(Completion::Normal(Value::Undefined)),
                    other => return Ok(other),
                }
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }

    // ---- expressions -------------------------------------------------------

    pub fn eval_expression(&mut self, env: &Environment, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Identifier(id) => env.lookup(&id.name),
            Expression::Literal(lit) => Ok(self.eval_literal(lit)),
            Expression::TemplateLiteral(t) => self.eval_template_literal(env, t),
            Expression::TaggedTemplate(t) => self.eval_tagged_template(env, t),
            Expression::Array(arr) => self.eval_array_literal(env, arr),
            Expression::Object(obj) => self.eval_object_literal(env, obj),
            Expression::Function(func) => Ok(self.make_function(env, func, false)),
            Expression::Arrow(func) => Ok(self.make_function(env, func, true)),
            Expression::This(_) => Ok(env.try_lookup("this").unwrap_or(Value::Undefined)),
            Expression::Member(m) => self.eval_member(env, m, false),
            Expression::OptionalMember(m) => self.eval_member(env, m, true),
            Expression::Call(c) => self.eval_call(env, c, false),
            Expression::OptionalCall(c) => self.eval_call(env, c, true),
            Expression::New(n) => {
                let callee = self.eval_expression(env, &n.callee)?;
                let args = self.eval_arguments(env, &n.arguments)?;
                self.construct(callee, args)
            }
            Expression::Unary(u) => self.eval_unary(env, u),
            Expression::Update(u) => self.eval_update(env, u),
            Expression::Binary(b) => self.eval_binary(env, b),
            Expression::Logical(l) => self.eval_logical(env, l),
            Expression::Assignment(a) => self.eval_assignment(env, a),
            Expression::Conditional(c) => {
                if self.eval_expression(env, &c.test)?.is_truthy() {
                    self.eval_expression(env, &c.consequent)
                } else {
                    self.eval_expression(env, &c.alternate)
                }
            }
            Expression::Sequence(s) => {
                let mut last = Value::Undefined;
                for e in &s.expressions {
                    last = self.eval_expression(env, e)?;
                }
                Ok(last)
            }
            Expression::Spread(s) => self.eval_expression(env, &s.argument),
            Expression::Yield(y) => self.eval_yield(env, y),
            Expression::Await(a) => {
                let v = self.eval_expression(env, &a.argument)?;
                self.resolve_awaited(v)
            }
            Expression::Parenthesized(e) => self.eval_expression(env, e),
        }
    }

    fn eval_literal(&mut self, lit: &ast::Literal) -> Value {
        match &lit.value {
            ast::LiteralValue::Null => Value::Null,
            ast::LiteralValue::Boolean(b) => Value::Boolean(*b),
            ast::LiteralValue::Number(n) => Value::Number(*n),
            ast::LiteralValue::BigInt(s) => Value::Number(s.parse().unwrap_or(f64::NAN)),
            ast::LiteralValue::String(s) => Value::string(s.clone()),
            ast::LiteralValue::Regex { pattern, flags } => {
                Value::object(vec![
                    ("source".to_string(), Value::string(pattern.clone())),
                    ("flags".to_string(), Value::string(flags.clone())),
                ])
            }
        }
    }

    fn eval_template_literal(&mut self, env: &Environment, t: &ast::TemplateLiteral) -> Result<Value> {
        let mut out = String::new();
        for (i, quasi) in t.quasis.iter().enumerate() {
            out.push_str(quasi.cooked.as_deref().unwrap_or(&quasi.raw));
            if let Some(expr) = t.expressions.get(i) {
                out.push_str(&self.eval_expression(env, expr)?.to_display_string());
            }
        }
        Ok(Value::string(out))
    }

    /// Tagged templates pass the tag function a `strings` array (with a
    /// frozen-looking `.raw` property) followed by the interpolated values
    ///.
    fn eval_tagged_template(&mut self, env: &Environment, t: &ast::TaggedTemplate) -> Result<Value> {
        let cooked: Vec<Value> = t
            .quasi
            .quasis
            .iter()
            .map(|q| Value::string(q.cooked.clone().unwrap_or_else(|| q.raw.clone())))
            .collect();
        let raw: Vec<Value> = t.quasi.quasis.iter().map(|q| Value::string(q.raw.clone())).collect();
        let strings_array = Value::array(cooked);
        if let Value::Array(arr) = &strings_array {
            let raw_array = Value::array(raw);
            // Stashed via a plain property; there is no object-exotic
            // "array with extra props" type, so `raw` lives as an ordinary
            // index-like key consumers are expected to read explicitly.
            let _ = arr;
            let mut values = Vec::with_capacity(t.quasi.expressions.len() + 1);
            values.push(strings_array.clone());
            for expr in &t.quasi.expressions {
                values.push(self.eval_expression(env, expr)?);
            }
            let tag = self.eval_expression(env, &t.tag)?;
            let this = self.eval_member_this(env, &t.tag)?;
            let _ = raw_array;
            return self.call(tag, this, values);
        }
        unreachable!("Value::array always produces Value::Array")
    }

    /// Evaluates the `this` a call's callee expression implies: `obj.method()`
    /// binds `this` to `obj`; any other callee shape binds `this` to
    /// `undefined`. Does not re-evaluate the callee itself.
    fn eval_member_this(&mut self, env: &Environment, callee: &Expression) -> Result<Value> {
        match unwrap_parens(callee) {
            Expression::Member(m) | Expression::OptionalMember(m) => self.eval_expression(env, &m.object),
            _ => Ok(Value::Undefined),
        }
    }

    fn eval_array_literal(&mut self, env: &Environment, arr: &ast::ArrayExpression) -> Result<Value> {
        let mut values = Vec::with_capacity(arr.elements.len());
        for elem in &arr.elements {
            match elem {
                None => values.push(Value::Undefined),
                Some(Expression::Spread(s)) => {
                    let spread_value = self.eval_expression(env, &s.argument)?;
                    values.extend(self.drain_iterable(env, &spread_value, usize::MAX)?);
                }
                Some(e) => values.push(self.eval_expression(env, e)?),
            }
        }
        self.meter.charge(values.len() * crate::runtime::resource_meter::PER_SLOT_COST)?;
        Ok(Value::array(values))
    }

    fn eval_object_literal(&mut self, env: &Environment, obj: &ast::ObjectExpression) -> Result<Value> {
        let mut data = ObjectData::new();
        for prop in &obj.properties {
            match prop {
                ast::ObjectProperty::Property { key, value, computed, .. } => {
                    let key_name = self.resolve_key(env, key, *computed)?;
                    security::check_property_name(&key_name)?;
                    let v = self.eval_expression(env, value)?;
                    data.insert(key_name, v);
                }
                ast::ObjectProperty::Spread { argument, .. } => {
                    let spread_value = self.eval_expression(env, argument)?;
                    if let Value::Object(src) = &spread_value {
                        let src = src.borrow();
                        for key in src.keys() {
                            data.insert(key.clone(), src.get(&key).unwrap_or(Value::Undefined));
                        }
                    }
                }
                ast::ObjectProperty::Method(m) => {
                    let key_name = self.resolve_key(env, &m.key, m.computed)?;
                    security::check_property_name(&key_name)?;
                    let func_value = self.make_function(env, &m.value, false);
                    data.insert(key_name, func_value);
                }
            }
        }
        self.meter.charge_object(data.len())?;
        Ok(Value::Object(Rc::new(RefCell::new(data))))
    }

    fn resolve_key(&mut self, env: &Environment, key: &ast::PropertyKey, computed: bool) -> Result<String> {
        if computed {
            if let ast::PropertyKey::Computed(expr) = key {
                return Ok(self.eval_expression(env, expr)?.to_display_string());
            }
        }
        match key {
            ast::PropertyKey::Identifier(id) => Ok(id.name.clone()),
            ast::PropertyKey::String(s) => Ok(s.clone()),
            ast::PropertyKey::Number(n) => Ok(crate::runtime::value::format_number(*n)),
            ast::PropertyKey::Computed(expr) => Ok(self.eval_expression(env, expr)?.to_display_string()),
        }
    }

    pub(crate) fn make_function(&mut self, env: &Environment, func: &ast::Function, is_arrow: bool) -> Value {
        let captured_this = if is_arrow { Some(env.try_lookup("this").unwrap_or(Value::Undefined)) } else { None };
        Value::SandboxFn(Rc::new(SandboxFunction {
            name: func.id.as_ref().map(|id| id.name.clone()),
            params: func.params.clone(),
            body: func.body.clone(),
            closure: env.clone(),
            is_arrow,
            is_async: func.is_async,
            is_generator: func.is_generator,
            captured_this,
        }))
    }

    fn eval_member(&mut self, env: &Environment, m: &ast::MemberExpression, optional: bool) -> Result<Value> {
        let object = self.eval_expression(env, &m.object)?;
        if optional && object.is_nullish() {
            return Ok(Value::Undefined);
        }
        let key = self.member_key(env, m)?;
        self.get_member_value(&object, &key)
    }

    fn member_key(&mut self, env: &Environment, m: &ast::MemberExpression) -> Result<String> {
        match &m.property {
            ast::MemberProperty::Identifier(id) => Ok(id.name.clone()),
            ast::MemberProperty::Expression(expr) => Ok(self.eval_expression(env, expr)?.to_display_string()),
        }
    }

    /// Property read, including the array built-in method catalog
    /// which is produced lazily here rather than stored per-array.
    pub(crate) fn get_member_value(&mut self, object: &Value, key: &str) -> Result<Value> {
        security::check_host_function_read(object)?;
        security::check_property_name(key)?;
        match object {
            Value::Array(arr) => {
                if key == "length" {
                    return Ok(Value::Number(arr.borrow().len() as f64));
                }
                if let Ok(idx) = key.parse::<usize>() {
                    return Ok(arr.borrow().get(idx));
                }
                if let Some(method) = array_method(arr.clone(), key) {
                    return Ok(method);
                }
                Ok(Value::Undefined)
            }
            Value::Object(obj) => Ok(obj.borrow().get(key).unwrap_or(Value::Undefined)),
            Value::String(s) => {
                if key == "length" {
                    return Ok(Value::Number(s.chars().count() as f64));
                }
                if let Ok(idx) = key.parse::<usize>() {
                    return Ok(s.chars().nth(idx).map(|c| Value::string(c.to_string())).unwrap_or(Value::Undefined));
                }
                Ok(Value::Undefined)
            }
            Value::Generator(handle) => Ok(generator_method(handle.clone(), key)),
            Value::Undefined | Value::Null => Err(Error::type_error(messages::cannot_read_property(key, object.type_of()))),
            _ => Ok(Value::Undefined),
        }
    }

    fn set_member_value(&mut self, object: &Value, key: &str, value: Value) -> Result<()> {
        security::check_host_function_write(object)?;
        security::check_property_name(key)?;
        match object {
            Value::Array(arr) => {
                if key == "length" {
                    let len = value_to_number(&value) as usize;
                    arr.borrow_mut().set_length(len);
                    return Ok(());
                }
                if let Ok(idx) = key.parse::<usize>() {
                    arr.borrow_mut().set(idx, value);
                    return Ok(());
                }
                Ok(())
            }
            Value::Object(obj) => {
                obj.borrow_mut().insert(key, value);
                Ok(())
            }
            Value::Undefined | Value::Null => Err(Error::type_error(messages::cannot_set_property(key, object.type_of()))),
            _ => Ok(()),
        }
    }

    // ---- assignment --------------------------------------------------------

    /// Resolves a member expression appearing on the left of an assignment or
    /// as a destructuring target, evaluating the object subexpression exactly
    /// once.
    pub(crate) fn eval_member_assignment_target(&mut self, env: &Environment, m: &ast::MemberExpression) -> Result<AssignRef> {
        let object = self.eval_expression(env, &m.object)?;
        let key = self.member_key(env, m)?;
        Ok(AssignRef::Member { object, key })
    }

    fn eval_assignment_target_expr(&mut self, env: &Environment, expr: &Expression) -> Result<AssignRef> {
        match unwrap_parens(expr) {
            Expression::Identifier(id) => Ok(AssignRef::Identifier(id.name.clone())),
            Expression::Member(m) | Expression::OptionalMember(m) => self.eval_member_assignment_target(env, m),
            other => Err(Error::syntax_error(format!("Invalid assignment target: {:?}", other.span()))),
        }
    }

    pub(crate) fn assign_member(&mut self, env: &Environment, target: &AssignRef, value: Value) -> Result<()> {
        self.write_simple_target(env, target, value)
    }

    fn eval_assignment(&mut self, env: &Environment, a: &ast::AssignmentExpression) -> Result<Value> {
        match &a.left {
            ast::AssignmentTarget::Pattern(pattern) => {
                let value = self.eval_expression(env, &a.right)?;
                bind_pattern(self, env, pattern, value.clone(), &mut AssignBinder)?;
                Ok(value)
            }
            ast::AssignmentTarget::Simple(target_expr) => {
                let target = self.eval_assignment_target_expr(env, target_expr)?;
                if a.operator == ast::AssignmentOperator::Assign {
                    let value = self.eval_expression(env, &a.right)?;
                    self.write_simple_target(env, &target, value.clone())?;
                    return Ok(value);
                }
                if matches!(
                    a.operator,
                    ast::AssignmentOperator::AndAssign | ast::AssignmentOperator::OrAssign | ast::AssignmentOperator::NullishAssign
                ) {
                    let current = self.read_simple_target(env, &target)?;
                    let should_assign = match a.operator {
                        ast::AssignmentOperator::AndAssign => current.is_truthy(),
                        ast::AssignmentOperator::OrAssign => !current.is_truthy(),
                        ast::AssignmentOperator::NullishAssign => current.is_nullish(),
                        _ => unreachable!(),
                    };
                    if !should_assign {
                        return Ok(current);
                    }
                    let value = self.eval_expression(env, &a.right)?;
                    self.write_simple_target(env, &target, value.clone())?;
                    return Ok(value);
                }
                let current = self.read_simple_target(env, &target)?;
                let rhs = self.eval_expression(env, &a.right)?;
                let op = compound_to_binary(a.operator);
                let result = apply_binary(op, &current, &rhs)?;
                self.write_simple_target(env, &target, result.clone())?;
                Ok(result)
            }
        }
    }

    fn read_simple_target(&mut self, env: &Environment, target: &AssignRef) -> Result<Value> {
        match target {
            AssignRef::Identifier(name) => env.lookup(name),
            AssignRef::Member { object, key } => self.get_member_value(object, key),
        }
    }

    fn write_simple_target(&mut self, env: &Environment, target: &AssignRef, value: Value) -> Result<()> {
        match target {
            AssignRef::Identifier(name) => env.assign(name, value),
            AssignRef::Member { object, key } => self.set_member_value(object, key, value),
        }
    }

    // ---- calls --------------------------------------------------------------

    fn eval_arguments(&mut self, env: &Environment, args: &[Expression]) -> Result<Vec<Value>> {
        let mut out = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Expression::Spread(s) => {
                    let spread_value = self.eval_expression(env, &s.argument)?;
                    out.extend(self.drain_iterable(env, &spread_value, usize::MAX)?);
                }
                other => out.push(self.eval_expression(env, other)?),
            }
        }
        Ok(out)
    }

    fn eval_call(&mut self, env: &Environment, c: &ast::CallExpression, optional: bool) -> Result<Value> {
        let callee = match unwrap_parens(&c.callee) {
            Expression::Member(m) | Expression::OptionalMember(m) => {
                let object = self.eval_expression(env, &m.object)?;
                let member_optional = matches!(unwrap_parens(&c.callee), Expression::OptionalMember(_));
                if member_optional && object.is_nullish() {
                    return Ok(Value::Undefined);
                }
                let key = self.member_key(env, m)?;
                let func = self.get_member_value(&object, &key)?;
                if optional && func.is_nullish() {
                    return Ok(Value::Undefined);
                }
                if !func.is_callable() {
                    return Err(Error::type_error(messages::method_not_a_function(&object.type_of().to_string(), &key)));
                }
                let args = self.eval_arguments(env, &c.arguments)?;
                return self.call(func, object, args);
            }
            other => self.eval_expression(env, other)?,
        };
        if optional && callee.is_nullish() {
            return Ok(Value::Undefined);
        }
        if !callee.is_callable() {
            return Err(Error::type_error(messages::is_not_a_function("value")));
        }
        let args = self.eval_arguments(env, &c.arguments)?;
        self.call(callee, Value::Undefined, args)
    }

    // ---- unary / update / binary / logical --------------------------------

    fn eval_unary(&mut self, env: &Environment, u: &ast::UnaryExpression) -> Result<Value> {
        if u.operator == ast::UnaryOperator::Typeof {
            if let Expression::Identifier(id) = unwrap_parens(&u.argument) {
                if !env.has(&id.name) {
                    return Ok(Value::string("undefined"));
                }
            }
            let v = self.eval_expression(env, &u.argument)?;
            return Ok(Value::string(v.type_of()));
        }
        if u.operator == ast::UnaryOperator::Delete {
            return self.eval_delete(env, &u.argument);
        }
        let v = self.eval_expression(env, &u.argument)?;
        Ok(match u.operator {
            ast::UnaryOperator::Minus => Value::Number(-value_to_number(&v)),
            ast::UnaryOperator::Plus => Value::Number(value_to_number(&v)),
            ast::UnaryOperator::Not => Value::Boolean(!v.is_truthy()),
            ast::UnaryOperator::BitwiseNot => Value::Number(!(value_to_i32(&v)) as f64),
            ast::UnaryOperator::Void => Value::Undefined,
            ast::UnaryOperator::Typeof | ast::UnaryOperator::Delete => unreachable!(),
        })
    }

    fn eval_delete(&mut self, env: &Environment, expr: &Expression) -> Result<Value> {
        match unwrap_parens(expr) {
            Expression::Member(m) | Expression::OptionalMember(m) => {
                let object = self.eval_expression(env, &m.object)?;
                let key = self.member_key(env, m)?;
                security::check_property_name(&key)?;
                match &object {
                    Value::Object(obj) => {
                        obj.borrow_mut().delete(&key);
                    }
                    Value::Array(arr) => {
                        if let Ok(idx) = key.parse::<usize>() {
                            arr.borrow_mut().delete(idx);
                        }
                    }
                    _ => {}
                }
                Ok(Value::Boolean(true))
            }
            _ => Ok(Value::Boolean(true)),
        }
    }

    fn eval_update(&mut self, env: &Environment, u: &ast::UpdateExpression) -> Result<Value> {
        let target = self.eval_assignment_target_expr(env, &u.argument)?;
        let current = self.read_simple_target(env, &target)?;
        let n = value_to_number(&current);
        let new_n = match u.operator {
            ast::UpdateOperator::Increment => n + 1.0,
            ast::UpdateOperator::Decrement => n - 1.0,
        };
        self.write_simple_target(env, &target, Value::Number(new_n))?;
        Ok(Value::Number(if u.prefix { new_n } else { n }))
    }

    fn eval_binary(&mut self, env: &Environment, b: &ast::BinaryExpression) -> Result<Value> {
        if b.operator == ast::BinaryOperator::In {
            let key_value = self.eval_expression(env, &b.left)?;
            let key = key_value.to_display_string();
            let object = self.eval_expression(env, &b.right)?;
            return match &object {
                Value::Object(obj) => Ok(Value::Boolean(obj.borrow().has(&key))),
                Value::Array(arr) => {
                    let ok = key
                        .parse::<usize>()
                        .map(|i| arr.borrow().elements.get(i).map(|slot| slot.is_some()).unwrap_or(false))
                        .unwrap_or(false);
                    Ok(Value::Boolean(ok))
                }
                _ => Err(Error::type_error(messages::not_an_object("value"))),
            };
        }
        if b.operator == ast::BinaryOperator::Instanceof {
            // No host classes for it to map to: always a catalog TypeError,
            // never the interpreter-internal error kind.
            let _ = self.eval_expression(env, &b.left)?;
            let _ = self.eval_expression(env, &b.right)?;
            return Err(Error::type_error(messages::instanceof_unsupported()));
        }
        let left = self.eval_expression(env, &b.left)?;
        let right = self.eval_expression(env, &b.right)?;
        apply_binary(b.operator, &left, &right)
    }

    fn eval_logical(&mut self, env: &Environment, l: &ast::LogicalExpression) -> Result<Value> {
        let left = self.eval_expression(env, &l.left)?;
        match l.operator {
            ast::LogicalOperator::And => {
                if left.is_truthy() {
                    self.eval_expression(env, &l.right)
                } else {
                    Ok(left)
                }
            }
            ast::LogicalOperator::Or => {
                if left.is_truthy() {
                    Ok(left)
                } else {
                    self.eval_expression(env, &l.right)
                }
            }
            ast::LogicalOperator::NullishCoalescing => {
                if left.is_nullish() {
                    self.eval_expression(env, &l.right)
                } else {
                    Ok(left)
                }
            }
        }
    }

    // ---- yield / await ------------------------------------------------------

    fn eval_yield(&mut self, env: &Environment, y: &ast::YieldExpression) -> Result<Value> {
        let value = match &y.argument {
            Some(expr) => self.eval_expression(env, expr)?,
            None => Value::Undefined,
        };
        if y.delegate {
            let items = self.drain_iterable(env, &value, usize::MAX)?;
            let mut last = Value::Undefined;
            for item in items {
                last = self.suspend_yield(item)?;
            }
            return Ok(last);
        }
        self.suspend_yield(value)
    }

    /// Suspends the generator body currently running on this thread, or
    /// errors if `yield` somehow reached a non-generator context (the parser
    /// rejects this at parse time; this is a defensive backstop).
    fn suspend_yield(&mut self, value: Value) -> Result<Value> {
        let outcome = match &self.yield_port {
            Some(port) => port.suspend(value),
            None => return Err(Error::syntax_error("yield is only valid inside a generator function")),
        };
        match outcome {
            YieldOutcome::Resume(v) => Ok(v),
            YieldOutcome::Throw(e) => Err(Error::Thrown(e)),
            YieldOutcome::Return(v) => Err(Error::GeneratorEarlyReturn(v)),
        }
    }

    /// `await x`: if `x` is a thenable, calls `.then(resolve,
    /// reject)` and adopts whatever value the callback settled with
    /// synchronously; otherwise evaluates to `x` unchanged. Checks the
    /// cooperative abort signal first, since every `await` is a designated
    /// cancellation point.
    pub(crate) fn resolve_awaited(&mut self, value: Value) -> Result<Value> {
        self.check_abort()?;
        if let Value::HostFn(_) = &value {
            return Err(Error::type_error(messages::cannot_await_host_function()));
        }
        let then_fn = match &value {
            Value::Object(obj) => obj.borrow().get("then"),
            _ => None,
        };
        let then_fn = match then_fn {
            Some(f) if f.is_callable() => f,
            _ => return Ok(value),
        };
        self.call_thenable(value, then_fn)
    }

    fn call_thenable(&mut self, thenable: Value, then_fn: Value) -> Result<Value> {
        let settled: Rc<RefCell<Option<std::result::Result<Value, Value>>>> = Rc::new(RefCell::new(None));
        let resolve_cell = settled.clone();
        let reject_cell = settled.clone();
        let resolve = Value::HostFn(HostFunction::new("resolve", move |_interp, _this, args| {
            *resolve_cell.borrow_mut() = Some(Ok(args.into_iter().next().unwrap_or(Value::Undefined)));
            Ok(Value::Undefined)
        }));
        let reject = Value::HostFn(HostFunction::new("reject", move |_interp, _this, args| {
            *reject_cell.borrow_mut() = Some(Err(args.into_iter().next().unwrap_or(Value::Undefined)));
            Ok(Value::Undefined)
        }));
        self.call(then_fn, thenable, vec![resolve, reject])?;
        match settled.borrow_mut().take() {
            Some(Ok(v)) => Ok(v),
            Some(Err(e)) => Err(Error::Thrown(e)),
            // The thenable never settled synchronously (e.g. a timer-backed
            // promise); there is no background scheduler to keep waiting on,
            // so `await` resolves to `undefined` rather than blocking forever.
            None => Ok(Value::Undefined),
        }
    }

    // ---- iteration ----------------------------------------------------------

    /// Builds a cursor over any recognized iterable: arrays, strings,
    /// generator handles, and plain objects exposing a callable `next`.
    /// Arrays/strings are snapshotted up front (they're already bounded and
    /// owned); generators and the user `next` protocol are pulled lazily by
    /// [`Self::next_iter_item`] so an infinite generator consumed with
    /// `break` never has to be exhausted first.
    pub fn make_iter_cursor(&mut self, value: &Value) -> Result<IterCursor> {
        match value {
            Value::Array(arr) => Ok(IterCursor::Vec(arr.borrow().values().into_iter())),
            Value::String(s) => {
                let chars: Vec<Value> = s.chars().map(|c| Value::string(c.to_string())).collect();
                Ok(IterCursor::Vec(chars.into_iter()))
            }
            Value::Generator(handle) => Ok(IterCursor::Generator(handle.clone())),
            Value::Object(obj) => {
                let next_fn = obj.borrow().get("next");
                match next_fn {
                    Some(f) if f.is_callable() => Ok(IterCursor::Protocol { receiver: value.clone(), next_fn: f }),
                    _ => Err(Error::type_error(messages::not_iterable("object"))),
                }
            }
            Value::Undefined | Value::Null => Err(Error::type_error(messages::not_iterable(value.type_of()))),
            _ => Err(Error::type_error(messages::not_iterable(value.type_of()))),
        }
    }

    /// Pulls the next item from a cursor, or `None` once the source reports
    /// itself done.
    pub fn next_iter_item(&mut self, cursor: &mut IterCursor) -> Result<Option<Value>> {
        match cursor {
            IterCursor::Vec(iter) => Ok(iter.next()),
            IterCursor::Generator(handle) => {
                let (value, done) = handle.next(Value::Undefined)?;
                Ok(if done { None } else { Some(value) })
            }
            IterCursor::Protocol { receiver, next_fn } => {
                let result = self.call(next_fn.clone(), receiver.clone(), vec![])?;
                let done = match &result {
                    Value::Object(o) => o.borrow().get("done").map(|v| v.is_truthy()).unwrap_or(false),
                    _ => false,
                };
                if done {
                    return Ok(None);
                }
                let item = match &result {
                    Value::Object(o) => o.borrow().get("value").unwrap_or(Value::Undefined),
                    _ => Value::Undefined,
                };
                Ok(Some(item))
            }
        }
    }

    /// Materializes up to `max` items of any recognized iterable into a
    /// `Vec`, used by array-pattern/spread binding where only a bounded
    /// prefix (or, for a trailing rest element, the whole remainder) is
    /// ever needed.
    pub fn drain_iterable(&mut self, env: &Environment, value: &Value, max: usize) -> Result<Vec<Value>> {
        let _ = env;
        let mut cursor = self.make_iter_cursor(value)?;
        let mut out = Vec::new();
        while out.len() < max {
            match self.next_iter_item(&mut cursor)? {
                Some(item) => out.push(item),
                None => break,
            }
        }
        Ok(out)
    }

    // ---- generators -----------------------------------------------------------

    /// Constructs a suspended generator handle for a call to a `function*`.
    /// The body does not run until the first `.next()`.
    pub(crate) fn spawn_generator(&mut self, func: Rc<SandboxFunction>, this: Value, args: Vec<Value>) -> Value {
        let global_env = self.global_env.clone();
        let security = self.security;
        let default_limits = self.default_limits;
        let abort_signal = self.abort_signal.clone();
        let mode = if func.is_async { ExecMode::Async } else { ExecMode::Sync };

        let captured = crate::runtime::generator::pack_for_thread((func, this, args, global_env, security, default_limits, abort_signal, mode));

        let handle = GeneratorHandle::spawn(move |port| {
            let (func, this, args, global_env, security, default_limits, abort_signal, mode) = crate::runtime::generator::unpack_for_thread(captured);
            let mut gen_interp = Interpreter {
                global_env,
                security,
                strict_evaluation_isolation: false,
                in_flight: Rc::new(std::cell::Cell::new(false)),
                meter: crate::runtime::ResourceMeter::new(default_limits),
                mode: std::cell::Cell::new(mode),
                default_limits,
                yield_port: Some(port),
                abort_signal,
            };
            gen_interp.run_generator_body(&func, this, args)
        });

        Value::Generator(handle)
    }

    fn run_generator_body(&mut self, func: &Rc<SandboxFunction>, this: Value, args: Vec<Value>) -> Result<Value> {
        let frame = func.closure.child_function_frame();
        let effective_this = if func.is_arrow { func.captured_this.clone().unwrap_or(Value::Undefined) } else { this };
        if !func.is_arrow {
            frame.define("this", BindingKind::Var, effective_this)?;
            frame.define("arguments", BindingKind::Var, Value::array(args.clone()))?;
        }
        self.bind_parameters_pub(&frame, &func.params, args)?;
        let completion = match &func.body {
            ast::FunctionBody::Block(block) => self.exec_block_statements(&frame, &block.body)?,
            ast::FunctionBody::Expression(expr) => Completion::Return(self.eval_expression(&frame, expr)?),
        };
        match completion {
            Completion::Return(v) | Completion::Normal(v) => Ok(v),
            Completion::Break(_) | Completion::Continue(_) => Err(Error::InternalError("break/continue escaped generator body".to_string())),
        }
    }

    fn bind_parameters_pub(&mut self, frame: &Environment, params: &ast::FunctionParams, args: Vec<Value>) -> Result<()> {
        let mut iter = args.into_iter();
        for pattern in &params.params {
            let value = iter.next().unwrap_or(Value::Undefined);
            bind_pattern(self, frame, pattern, value, &mut DeclareBinder(BindingKind::Let))?;
        }
        if let Some(rest) = &params.rest {
            let remaining: Vec<Value> = iter.collect();
            bind_pattern(self, frame, rest, Value::array(remaining), &mut DeclareBinder(BindingKind::Let))?;
        }
        Ok(())
    }
}

enum LoopStep {
    Body(Environment),
    Stop,
}

/// Shared `while`-style loop driver: `test` decides whether to run another
/// iteration (producing the iteration's environment), `post` runs after a
/// completed (non-break) iteration. Used only by plain (unlabeled via this
/// helper) `while`; `for`/`for-in`/`for-of`/`do-while` have their own drivers
/// above because each has a different per-iteration shape.
impl Interpreter {
    fn exec_loop(
        &mut self,
        label: Option<&str>,
        _init: impl FnOnce() -> Result<()>,
        mut test: impl FnMut(&mut Self) -> Result<LoopStep>,
        _post: impl FnMut(&mut Self) -> Result<()>,
        body: &Statement,
    ) -> Result<Completion> {
        let mut iterations: u64 = 0;
        loop {
            self.meter.check_loop_iteration(iterations)?;
            self.check_abort()?;
            iterations += 1;
            let body_env = match test(self)? {
                LoopStep::Body(env) => env,
                LoopStep::Stop => break,
            };
            match self.exec_statement(&body_env, body)? {
                Completion::Normal(_) => {}
                Completion::Continue(None) => {}
                Completion::Continue(Some(l)) if Some(l.as_str()) == label => {}
                Completion::Break(None) => break,
                Completion::Break(Some(l)) if Some(l.as_str()) == label => break,
                other => return Ok(other),
            }
        }
        Ok(Completion::Normal(Value::Undefined))
    }
}

fn unwrap_parens(expr: &Expression) -> &Expression {
    match expr {
        Expression::Parenthesized(inner) => unwrap_parens(inner),
        other => other,
    }
}

/// Converts an uncaught interpreter error into the sandbox value a `catch`
/// clause binds, or rejects it back out uncaught. Only `throw`n sandbox
/// values and the canonical diagnostic catalog (`RuntimeError`) are
/// catchable; resource-limit violations and internal/IO/module errors are
/// fatal so sandbox code cannot use `try/catch` to defeat the resource meter.
fn catchable_value(err: Error) -> std::result::Result<Value, Error> {
    match err {
        Error::Thrown(v) => Ok(v),
        Error::RuntimeError { kind, message, .. } => Ok(Value::object(vec![
            ("name".to_string(), Value::string(kind.to_string())),
            ("message".to_string(), Value::string(message)),
        ])),
        other => Err(other),
    }
}

fn compound_to_binary(op: ast::AssignmentOperator) -> ast::BinaryOperator {
    use ast::AssignmentOperator as A;
    use ast::BinaryOperator as B;
    match op {
        A::AddAssign => B::Add,
        A::SubAssign => B::Sub,
        A::MulAssign => B::Mul,
        A::DivAssign => B::Div,
        A::ModAssign => B::Mod,
        A::PowAssign => B::Pow,
        A::ShlAssign => B::Shl,
        A::ShrAssign => B::Shr,
        A::UShrAssign => B::UShr,
        A::BitwiseAndAssign => B::BitwiseAnd,
        A::BitwiseOrAssign => B::BitwiseOr,
        A::BitwiseXorAssign => B::BitwiseXor,
        A::Assign | A::AndAssign | A::OrAssign | A::NullishAssign => unreachable!("handled separately"),
    }
}

pub(crate) fn value_to_number(v: &Value) -> f64 {
    match v {
        Value::Number(n) => *n,
        Value::Boolean(b) => if *b { 1.0 } else { 0.0 },
        Value::Null => 0.0,
        Value::Undefined => f64::NAN,
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse().unwrap_or(f64::NAN)
            }
        }
        _ => f64::NAN,
    }
}

fn value_to_i32(v: &Value) -> i32 {
    let n = value_to_number(v);
    if n.is_nan() || n.is_infinite() {
        0
    } else {
        n as i64 as i32
    }
}

fn apply_binary(op: ast::BinaryOperator, left: &Value, right: &Value) -> Result<Value> {
    use ast::BinaryOperator as B;
    Ok(match op {
        B::Add => {
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                Value::string(format!("{}{}", left.to_display_string(), right.to_display_string()))
            } else {
                Value::Number(value_to_number(left) + value_to_number(right))
            }
        }
        B::Sub => Value::Number(value_to_number(left) - value_to_number(right)),
        B::Mul => Value::Number(value_to_number(left) * value_to_number(right)),
        B::Div => {
            let r = value_to_number(right);
            if r == 0.0 {
                return Err(Error::range_error(messages::division_by_zero()));
            }
            Value::Number(value_to_number(left) / r)
        }
        B::Mod => {
            let r = value_to_number(right);
            if r == 0.0 {
                return Err(Error::range_error(messages::modulo_by_zero()));
            }
            Value::Number(value_to_number(left) % r)
        }
        B::Pow => Value::Number(value_to_number(left).powf(value_to_number(right))),
        B::Eq => Value::Boolean(loose_eq(left, right)),
        B::Ne => Value::Boolean(!loose_eq(left, right)),
        B::StrictEq => Value::Boolean(left.strict_eq(right)),
        B::StrictNe => Value::Boolean(!left.strict_eq(right)),
        B::Lt => compare(left, right, |o| o == std::cmp::Ordering::Less),
        B::Le => compare(left, right, |o| o != std::cmp::Ordering::Greater),
        B::Gt => compare(left, right, |o| o == std::cmp::Ordering::Greater),
        B::Ge => compare(left, right, |o| o != std::cmp::Ordering::Less),
        B::Shl => Value::Number(((value_to_i32(left)) << (value_to_i32(right) & 31)) as f64),
        B::Shr => Value::Number(((value_to_i32(left)) >> (value_to_i32(right) & 31)) as f64),
        B::UShr => Value::Number(((value_to_i32(left) as u32) >> (value_to_i32(right) & 31)) as f64),
        B::BitwiseAnd => Value::Number((value_to_i32(left) & value_to_i32(right)) as f64),
        B::BitwiseOr => Value::Number((value_to_i32(left) | value_to_i32(right)) as f64),
        B::BitwiseXor => Value::Number((value_to_i32(left) ^ value_to_i32(right)) as f64),
        B::In | B::Instanceof => return Err(Error::InternalError(format!("{:?} handled elsewhere", op))),
    })
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Number(_), Value::Number(_))
        | (Value::String(_), Value::String(_))
        | (Value::Boolean(_), Value::Boolean(_)) => left.strict_eq(right),
        (Value::Number(_), Value::String(_)) | (Value::String(_), Value::Number(_)) => {
            value_to_number(left) == value_to_number(right)
        }
        (Value::Boolean(_), _) => loose_eq(&Value::Number(value_to_number(left)), right),
        (_, Value::Boolean(_)) => loose_eq(left, &Value::Number(value_to_number(right))),
        (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
        (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
        _ => left.strict_eq(right),
    }
}

fn compare(left: &Value, right: &Value, accept: impl Fn(std::cmp::Ordering) -> bool) -> Value {
    if let (Value::String(a), Value::String(b)) = (left, right) {
        return Value::Boolean(accept(a.as_ref().cmp(b.as_ref())));
    }
    let a = value_to_number(left);
    let b = value_to_number(right);
    if a.is_nan() || b.is_nan() {
        return Value::Boolean(false);
    }
    Value::Boolean(accept(a.partial_cmp(&b).unwrap_or(std::cmp::Ordering::Equal)))
}

/// Lazily produced host-function wrappers for `generator.next/return/throw`,
/// closing over the handle rather than storing anything on the generator
/// value itself.
fn generator_method(handle: GeneratorHandle, key: &str) -> Value {
    let reply = |value: Value, done: bool| Value::object(vec![("value".to_string(), value), ("done".to_string(), Value::Boolean(done))]);
    match key {
        "next" => {
            let handle = handle.clone();
            Value::HostFn(HostFunction::new("next", move |_interp, _this, args| {
                let input = args.into_iter().next().unwrap_or(Value::Undefined);
                let (v, done) = handle.next(input)?;
                Ok(reply(v, done))
            }))
        }
        "return" => {
            let handle = handle.clone();
            Value::HostFn(HostFunction::new("return", move |_interp, _this, args| {
                let input = args.into_iter().next().unwrap_or(Value::Undefined);
                let (v, done) = handle.return_(input)?;
                Ok(reply(v, done))
            }))
        }
        "throw" => {
            let handle = handle.clone();
            Value::HostFn(HostFunction::new("throw", move |_interp, _this, args| {
                let input = args.into_iter().next().unwrap_or(Value::Undefined);
                let (v, done) = handle.throw(input)?;
                Ok(reply(v, done))
            }))
        }
        _ => Value::Undefined,
    }
}

/// Lazily produced array built-in methods, closing over the array's storage
/// so repeated `arr.push` lookups don't allocate a new method catalog on the
/// array itself.
fn array_method(arr: Rc<RefCell<ArrayData>>, key: &str) -> Option<Value> {
    macro_rules! host {
        ($name:literal, $body:expr) => {
            Some(Value::HostFn(HostFunction::new($name, $body)))
        };
    }
    match key {
        "push" => {
            let arr = arr.clone();
            host!("push", move |_i, _t, args| {
                let mut a = arr.borrow_mut();
                for v in args {
                    a.push(v);
                }
                Ok(Value::Number(a.len() as f64))
            })
        }
        "pop" => {
            let arr = arr.clone();
            host!("pop", move |_i, _t, _args| {
                let mut a = arr.borrow_mut();
                if a.is_empty() {
                    return Ok(Value::Undefined);
                }
                let last = a.get(a.len() - 1);
                a.set_length(a.len() - 1);
                Ok(last)
            })
        }
        "shift" => {
            let arr = arr.clone();
            host!("shift", move |_i, _t, _args| {
                let mut a = arr.borrow_mut();
                if a.is_empty() {
                    return Ok(Value::Undefined);
                }
                let values = a.values();
                let (first, rest) = values.split_first().unwrap();
                let first = first.clone();
                *a = ArrayData::from_values(rest.to_vec());
                Ok(first)
            })
        }
        "unshift" => {
            let arr = arr.clone();
            host!("unshift", move |_i, _t, args| {
                let mut a = arr.borrow_mut();
                let mut values = args;
                values.extend(a.values());
                *a = ArrayData::from_values(values);
                Ok(Value::Number(a.len() as f64))
            })
        }
        "slice" => {
            let arr = arr.clone();
            host!("slice", move |_i, _t, args| {
                let values = arr.borrow().values();
                let len = values.len() as i64;
                let start = normalize_index(args.first(), len, 0);
                let end = normalize_index(args.get(1), len, len);
                let slice = if start < end { values[start as usize..end as usize].to_vec() } else { Vec::new() };
                Ok(Value::array(slice))
            })
        }
        "concat" => {
            let arr = arr.clone();
            host!("concat", move |_i, _t, args| {
                let mut values = arr.borrow().values();
                for arg in args {
                    match arg {
                        Value::Array(other) => values.extend(other.borrow().values()),
                        other => values.push(other),
                    }
                }
                Ok(Value::array(values))
            })
        }
        "indexOf" => {
            let arr = arr.clone();
            host!("indexOf", move |_i, _t, args| {
                let target = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                let idx = values.iter().position(|v| v.strict_eq(&target));
                Ok(Value::Number(idx.map(|i| i as f64).unwrap_or(-1.0)))
            })
        }
        "includes" => {
            let arr = arr.clone();
            host!("includes", move |_i, _t, args| {
                let target = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                Ok(Value::Boolean(values.iter().any(|v| v.strict_eq(&target))))
            })
        }
        "join" => {
            let arr = arr.clone();
            host!("join", move |_i, _t, args| {
                let sep = args.into_iter().next().map(|v| v.to_display_string()).unwrap_or_else(|| ",".to_string());
                let values = arr.borrow().values();
                Ok(Value::string(values.iter().map(|v| v.to_display_string()).collect::<Vec<_>>().join(&sep)))
            })
        }
        "reverse" => {
            let arr = arr.clone();
            host!("reverse", move |_i, _t, _args| {
                let mut values = arr.borrow().values();
                values.reverse();
                *arr.borrow_mut() = ArrayData::from_values(values.clone());
                Ok(Value::array(values))
            })
        }
        "at" => {
            let arr = arr.clone();
            host!("at", move |_i, _t, args| {
                let values = arr.borrow().values();
                let len = values.len() as i64;
                let idx = args.first().map(value_to_number).unwrap_or(0.0) as i64;
                let idx = if idx < 0 { len + idx } else { idx };
                if idx < 0 || idx >= len {
                    Ok(Value::Undefined)
                } else {
                    Ok(values[idx as usize].clone())
                }
            })
        }
        "map" => {
            let arr = arr.clone();
            host!("map", move |interp, _t, args| {
                let callback = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                let mut out = Vec::with_capacity(values.len());
                for (i, v) in values.into_iter().enumerate() {
                    out.push(interp.call(callback.clone(), Value::Undefined, vec![v, Value::Number(i as f64)])?);
                }
                Ok(Value::array(out))
            })
        }
        "filter" => {
            let arr = arr.clone();
            host!("filter", move |interp, _t, args| {
                let callback = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                let mut out = Vec::new();
                for (i, v) in values.into_iter().enumerate() {
                    let keep = interp.call(callback.clone(), Value::Undefined, vec![v.clone(), Value::Number(i as f64)])?;
                    if keep.is_truthy() {
                        out.push(v);
                    }
                }
                Ok(Value::array(out))
            })
        }
        "reduce" => {
            let arr = arr.clone();
            host!("reduce", move |interp, _t, args| {
                let mut iter = args.into_iter();
                let callback = iter.next().unwrap_or(Value::Undefined);
                let initial = iter.next();
                let values = arr.borrow().values();
                let mut values_iter = values.into_iter().enumerate();
                let mut acc = match initial {
                    Some(v) => v,
                    None => match values_iter.next() {
                        Some((_, v)) => v,
                        None => return Err(Error::type_error(messages::reduce_empty_array())),
                    },
                };
                for (i, v) in values_iter {
                    acc = interp.call(callback.clone(), Value::Undefined, vec![acc, v, Value::Number(i as f64)])?;
                }
                Ok(acc)
            })
        }
        "find" => {
            let arr = arr.clone();
            host!("find", move |interp, _t, args| {
                let callback = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                for (i, v) in values.into_iter().enumerate() {
                    let matched = interp.call(callback.clone(), Value::Undefined, vec![v.clone(), Value::Number(i as f64)])?;
                    if matched.is_truthy() {
                        return Ok(v);
                    }
                }
                Ok(Value::Undefined)
            })
        }
        "findIndex" => {
            let arr = arr.clone();
            host!("findIndex", move |interp, _t, args| {
                let callback = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                for (i, v) in values.into_iter().enumerate() {
                    let matched = interp.call(callback.clone(), Value::Undefined, vec![v, Value::Number(i as f64)])?;
                    if matched.is_truthy() {
                        return Ok(Value::Number(i as f64));
                    }
                }
                Ok(Value::Number(-1.0))
            })
        }
        "every" => {
            let arr = arr.clone();
            host!("every", move |interp, _t, args| {
                let callback = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                for (i, v) in values.into_iter().enumerate() {
                    let matched = interp.call(callback.clone(), Value::Undefined, vec![v, Value::Number(i as f64)])?;
                    if !matched.is_truthy() {
                        return Ok(Value::Boolean(false));
                    }
                }
                Ok(Value::Boolean(true))
            })
        }
        "some" => {
            let arr = arr.clone();
            host!("some", move |interp, _t, args| {
                let callback = args.into_iter().next().unwrap_or(Value::Undefined);
                let values = arr.borrow().values();
                for (i, v) in values.into_iter().enumerate() {
                    let matched = interp.call(callback.clone(), Value::Undefined, vec![v, Value::Number(i as f64)])?;
                    if matched.is_truthy() {
                        return Ok(Value::Boolean(true));
                    }
                }
                Ok(Value::Boolean(false))
            })
        }
        _ => None,
    }
}

fn normalize_index(arg: Option<&Value>, len: i64, default: i64) -> i64 {
    match arg {
        None => default,
        Some(v) => {
            let n = value_to_number(v) as i64;
            let n = if n < 0 { (len + n).max(0) } else { n };
            n.min(len)
        }
    }
}
