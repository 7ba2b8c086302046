//! Rust front end built on `syn`.
//!
//! Emits a declaration for every function or method with a body and one call
//! event per call expression inside it, in pre-order (an outer call before the
//! calls nested in its arguments).

use std::collections::HashSet;

use syn::spanned::Spanned;
use syn::visit::{self, Visit};
use syn::{Expr, ExprCall, ExprMethodCall, FnArg, ImplItemFn, ItemFn, Local, Pat, Signature, TraitItemFn, UnOp};

use crate::domain::events::{CalleeExpr, FrontEndEvent};
use crate::domain::source_kind::is_user_code_path;
use crate::error::{Error, Result};
use crate::ports::FrontEnd;

pub struct SynFrontEnd;

impl FrontEnd for SynFrontEnd {
    fn extract(&self, path: &str, source: &str) -> Result<Vec<FrontEndEvent>> {
        let file = syn::parse_file(source).map_err(|e| Error::parse(path, e))?;

        let mut collector = EventCollector {
            path,
            is_user_code: is_user_code_path(path),
            scopes: Vec::new(),
            events: Vec::new(),
        };
        collector.visit_file(&file);
        Ok(collector.events)
    }
}

/// The function whose body is being visited, and the local names that may
/// hold callables (parameters and `let` bindings).
struct Scope {
    function: String,
    locals: HashSet<String>,
}

struct EventCollector<'p> {
    path: &'p str,
    is_user_code: bool,
    scopes: Vec<Scope>,
    events: Vec<FrontEndEvent>,
}

impl<'p> EventCollector<'p> {
    fn enter_function(&mut self, sig: &Signature) {
        let function = sig.ident.to_string();
        let mut locals = HashSet::new();
        for input in &sig.inputs {
            if let FnArg::Typed(arg) = input {
                collect_bindings(&arg.pat, &mut locals);
            }
        }

        self.events.push(FrontEndEvent::DeclareFunction {
            name: function.clone(),
            source_file: Some(self.path.to_string()),
            is_user_code: self.is_user_code,
        });
        self.scopes.push(Scope { function, locals });
    }

    fn leave_function(&mut self) {
        self.scopes.pop();
    }

    fn record(&mut self, callee: Option<String>, callee_expr: Option<CalleeExpr>, line: usize) {
        let Some(scope) = self.scopes.last() else {
            return;
        };
        self.events.push(FrontEndEvent::CallSite {
            caller: scope.function.clone(),
            callee,
            callee_expr,
            line: Some(line),
        });
    }

    fn is_local(&self, name: &str) -> bool {
        self.scopes
            .last()
            .map(|s| s.locals.contains(name))
            .unwrap_or(false)
    }

    /// Resolve a call's function expression to a callee name or an
    /// unresolved expression shape. `None` for tuple-struct and variant
    /// constructors.
    fn resolve(&self, func: &Expr) -> Option<(Option<String>, Option<CalleeExpr>)> {
        match func {
            Expr::Paren(p) => self.resolve(&p.expr),
            Expr::Group(g) => self.resolve(&g.expr),
            Expr::Path(p) if p.qself.is_none() => {
                let ident = p.path.segments.last()?.ident.to_string();
                if ident.starts_with(|c: char| c.is_ascii_uppercase()) {
                    return None;
                }
                if p.path.segments.len() == 1 && self.is_local(&ident) {
                    Some((None, Some(CalleeExpr::Reference(ident))))
                } else {
                    Some((Some(ident), None))
                }
            }
            Expr::Unary(u) if matches!(u.op, UnOp::Deref(_)) => {
                Some((None, Some(CalleeExpr::Deref(Box::new(shape(&u.expr))))))
            }
            other => Some((None, Some(shape(other)))),
        }
    }
}

/// Shape of an unresolved callee expression, for hint extraction.
fn shape(expr: &Expr) -> CalleeExpr {
    match expr {
        Expr::Paren(p) => shape(&p.expr),
        Expr::Group(g) => shape(&g.expr),
        Expr::Path(p) if p.qself.is_none() && p.path.segments.len() == 1 => {
            CalleeExpr::Reference(p.path.segments[0].ident.to_string())
        }
        Expr::Unary(u) if matches!(u.op, UnOp::Deref(_)) => CalleeExpr::Deref(Box::new(shape(&u.expr))),
        _ => CalleeExpr::Other,
    }
}

fn collect_bindings(pat: &Pat, out: &mut HashSet<String>) {
    match pat {
        Pat::Ident(p) => {
            out.insert(p.ident.to_string());
        }
        Pat::Type(t) => collect_bindings(&t.pat, out),
        Pat::Reference(r) => collect_bindings(&r.pat, out),
        Pat::Tuple(t) => t.elems.iter().for_each(|p| collect_bindings(p, out)),
        _ => {}
    }
}

impl<'ast, 'p> Visit<'ast> for EventCollector<'p> {
    fn visit_item_fn(&mut self, f: &'ast ItemFn) {
        self.enter_function(&f.sig);
        visit::visit_item_fn(self, f);
        self.leave_function();
    }

    fn visit_impl_item_fn(&mut self, f: &'ast ImplItemFn) {
        self.enter_function(&f.sig);
        visit::visit_impl_item_fn(self, f);
        self.leave_function();
    }

    fn visit_trait_item_fn(&mut self, f: &'ast TraitItemFn) {
        // Only provided methods have a body.
        if f.default.is_none() {
            return;
        }
        self.enter_function(&f.sig);
        visit::visit_trait_item_fn(self, f);
        self.leave_function();
    }

    fn visit_local(&mut self, local: &'ast Local) {
        if let Some(scope) = self.scopes.last_mut() {
            collect_bindings(&local.pat, &mut scope.locals);
        }
        visit::visit_local(self, local);
    }

    fn visit_expr_call(&mut self, call: &'ast ExprCall) {
        if let Some((callee, callee_expr)) = self.resolve(&call.func) {
            self.record(callee, callee_expr, call.span().start().line);
        }
        visit::visit_expr_call(self, call);
    }

    fn visit_expr_method_call(&mut self, call: &'ast ExprMethodCall) {
        self.record(
            Some(call.method.to_string()),
            None,
            call.method.span().start().line,
        );
        visit::visit_expr_method_call(self, call);
    }
}
