//! Control flow: conditional, block, loop, goto/label, switch, try,
//! debug markers and runtime-variable capture.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::tree::{
    BlockNode, CatchBlock, ConditionalNode, DebugInfoNode, Expr, ExprKind, GotoKind, GotoNode,
    LabelNode, LabelTarget, LoopNode, NodeType, RuntimeVariablesNode, SwitchCase, SwitchNode,
    SymbolDocument, TryNode,
};
use crate::types::{self, Method, Type};

use super::{require_readable, require_readable_all};

/// Scope variables: parameters, pairwise distinct by identity, not by-ref.
pub(crate) fn validate_variables(variables: &[Expr]) -> Result<()> {
    let mut seen = HashSet::new();
    for v in variables {
        let Some(p) = v.as_parameter() else {
            return Err(Error::ArgumentMustBeParameter(v.node_type()));
        };
        if p.is_by_ref {
            return Err(Error::VariableMustNotBeByRef {
                name: p.name.as_deref().unwrap_or("").to_string(),
                ty: v.ty().clone(),
            });
        }
        if !seen.insert(v.clone()) {
            return Err(Error::DuplicateVariable(
                p.name.as_deref().unwrap_or("").to_string(),
            ));
        }
    }
    Ok(())
}

/// A jump value must fit the label's type; void labels take none.
fn validate_goto(target: &LabelTarget, value: Option<&Expr>) -> Result<()> {
    match value {
        None if !target.ty().is_void() => {
            Err(Error::LabelMustBeVoidOrHaveExpression(target.ty().clone()))
        }
        None => Ok(()),
        Some(v) => {
            require_readable(v)?;
            let expected = target.ty();
            if !expected.is_void() && !types::are_reference_assignable(expected, v.ty()) {
                return Err(Error::ExpressionTypeDoesNotMatchLabel {
                    expression: v.ty().clone(),
                    label: expected.clone(),
                });
            }
            Ok(())
        }
    }
}

fn validate_switch_case_type(body: &Expr, custom_type: bool, result: &Type) -> Result<()> {
    if custom_type {
        if !result.is_void() && !types::are_reference_assignable(result, body.ty()) {
            return Err(Error::ArgumentTypesMustMatch);
        }
    } else if !types::are_equivalent(result, body.ty()) {
        return Err(Error::AllCaseBodiesMustHaveSameType);
    }
    Ok(())
}

fn validate_try_and_catch_types(
    ty: Option<&Type>,
    body: &Expr,
    handlers: &[CatchBlock],
) -> Result<()> {
    match ty {
        Some(ty) if ty.is_void() => Ok(()),
        Some(ty) => {
            let all = std::iter::once(body.ty()).chain(handlers.iter().map(|h| h.body().ty()));
            for t in all {
                if !types::are_reference_assignable(ty, t) {
                    return Err(Error::ArgumentTypesMustMatch);
                }
            }
            Ok(())
        }
        None => {
            if handlers
                .iter()
                .any(|h| !types::are_equivalent(h.body().ty(), body.ty()))
            {
                return Err(Error::BodyOfCatchMustHaveSameTypeAsBodyOfTry);
            }
            Ok(())
        }
    }
}

fn validate_test(test: &Expr, if_true: &Expr, if_false: &Expr) -> Result<()> {
    require_readable(test)?;
    require_readable(if_true)?;
    require_readable(if_false)?;
    if *test.ty() != Type::bool() {
        return Err(Error::ArgumentMustBeBoolean(test.ty().clone()));
    }
    Ok(())
}

fn conditional(test: &Expr, if_true: &Expr, if_false: &Expr, ty: Type) -> Expr {
    Expr::new(
        ty,
        ExprKind::Conditional(ConditionalNode {
            test: test.clone(),
            if_true: if_true.clone(),
            if_false: if_false.clone(),
        }),
    )
}

impl Expr {
    // ── Conditional ──

    /// `test ? if_true : if_false`; both arms must have the same type.
    pub fn condition(test: &Expr, if_true: &Expr, if_false: &Expr) -> Result<Expr> {
        validate_test(test, if_true, if_false)?;
        if !types::are_equivalent(if_true.ty(), if_false.ty()) {
            return Err(Error::ArgumentTypesMustMatch);
        }
        Ok(conditional(test, if_true, if_false, if_true.ty().clone()))
    }

    /// Conditional with an explicit result type. Unless `ty` is void, both
    /// arms must be reference-assignable to it.
    pub fn condition_typed(test: &Expr, if_true: &Expr, if_false: &Expr, ty: &Type) -> Result<Expr> {
        validate_test(test, if_true, if_false)?;
        if !ty.is_void()
            && (!types::are_reference_assignable(ty, if_true.ty())
                || !types::are_reference_assignable(ty, if_false.ty()))
        {
            return Err(Error::ArgumentTypesMustMatch);
        }
        Ok(conditional(test, if_true, if_false, ty.clone()))
    }

    pub fn if_then(test: &Expr, if_true: &Expr) -> Result<Expr> {
        Expr::condition_typed(test, if_true, &Expr::empty(), &Type::void())
    }

    pub fn if_then_else(test: &Expr, if_true: &Expr, if_false: &Expr) -> Result<Expr> {
        Expr::condition_typed(test, if_true, if_false, &Type::void())
    }

    // ── Block ──

    pub fn block(expressions: &[Expr]) -> Result<Expr> {
        Expr::make_block(None, &[], expressions)
    }

    /// Block declaring scoped `variables`.
    pub fn block_with(variables: &[Expr], expressions: &[Expr]) -> Result<Expr> {
        Expr::make_block(None, variables, expressions)
    }

    /// Block whose type is `ty` rather than its last expression's type;
    /// `ty` must be void or a supertype of that type.
    pub fn block_typed(ty: &Type, variables: &[Expr], expressions: &[Expr]) -> Result<Expr> {
        Expr::make_block(Some(ty), variables, expressions)
    }

    pub(crate) fn make_block(
        ty: Option<&Type>,
        variables: &[Expr],
        expressions: &[Expr],
    ) -> Result<Expr> {
        let Some(last) = expressions.last() else {
            return Err(Error::EmptyBlock);
        };
        require_readable_all(expressions)?;
        validate_variables(variables)?;
        let ty = match ty {
            Some(ty) => {
                if !ty.is_void() && !types::are_reference_assignable(ty, last.ty()) {
                    return Err(Error::ArgumentTypesMustMatch);
                }
                ty.clone()
            }
            None => last.ty().clone(),
        };
        Ok(Expr::new(
            ty,
            ExprKind::Block(BlockNode {
                variables: variables.to_vec().into(),
                expressions: expressions.to_vec().into(),
            }),
        ))
    }

    // ── Loop ──

    /// Infinite loop exited by jumping to `break_label`; the loop's type is
    /// the break label's type (void without one).
    pub fn make_loop(
        body: &Expr,
        break_label: Option<&LabelTarget>,
        continue_label: Option<&LabelTarget>,
    ) -> Result<Expr> {
        require_readable(body)?;
        if continue_label.is_some_and(|c| !c.ty().is_void()) {
            return Err(Error::LabelTypeMustBeVoid);
        }
        let ty = break_label.map_or_else(Type::void, |b| b.ty().clone());
        Ok(Expr::new(
            ty,
            ExprKind::Loop(LoopNode {
                body: body.clone(),
                break_label: break_label.cloned(),
                continue_label: continue_label.cloned(),
            }),
        ))
    }

    // ── Goto / label ──

    pub fn make_goto(
        kind: GotoKind,
        target: &LabelTarget,
        value: Option<&Expr>,
        ty: &Type,
    ) -> Result<Expr> {
        validate_goto(target, value)?;
        Ok(Expr::new(
            ty.clone(),
            ExprKind::Goto(GotoNode {
                kind,
                target: target.clone(),
                value: value.cloned(),
            }),
        ))
    }

    pub fn goto(target: &LabelTarget) -> Result<Expr> {
        Expr::make_goto(GotoKind::Goto, target, None, &Type::void())
    }

    pub fn return_to(target: &LabelTarget, value: Option<&Expr>) -> Result<Expr> {
        Expr::make_goto(GotoKind::Return, target, value, &Type::void())
    }

    pub fn break_to(target: &LabelTarget, value: Option<&Expr>) -> Result<Expr> {
        Expr::make_goto(GotoKind::Break, target, value, &Type::void())
    }

    pub fn continue_to(target: &LabelTarget) -> Result<Expr> {
        Expr::make_goto(GotoKind::Continue, target, None, &Type::void())
    }

    /// Jump site for `target`; `default_value` is the value when control
    /// falls through instead of jumping.
    pub fn label(target: &LabelTarget, default_value: Option<&Expr>) -> Result<Expr> {
        validate_goto(target, default_value)?;
        Ok(Expr::new(
            target.ty().clone(),
            ExprKind::Label(LabelNode {
                target: target.clone(),
                default_value: default_value.cloned(),
            }),
        ))
    }

    // ── Switch ──

    pub fn switch_case(body: &Expr, test_values: &[Expr]) -> Result<SwitchCase> {
        if test_values.is_empty() {
            return Err(Error::SwitchCaseWithoutTestValues);
        }
        require_readable_all(test_values)?;
        Ok(SwitchCase::new(body.clone(), test_values.to_vec().into()))
    }

    /// Multi-way branch. Without a `comparison` method all test values share
    /// one type and are compared with `==`; with one, each test value must
    /// fit its second parameter.
    pub fn switch(
        ty: Option<&Type>,
        switch_value: &Expr,
        default_body: Option<&Expr>,
        comparison: Option<&Method>,
        cases: &[SwitchCase],
    ) -> Result<Expr> {
        require_readable(switch_value)?;
        let value_ty = switch_value.ty();
        if value_ty.is_void() {
            return Err(Error::ArgumentCannotBeOfTypeVoid);
        }
        let result = match (ty, cases.first(), default_body) {
            (Some(ty), _, _) => ty.clone(),
            (None, Some(c), _) => c.body().ty().clone(),
            (None, None, Some(d)) => d.ty().clone(),
            (None, None, None) => Type::void(),
        };
        let custom_type = ty.is_some();

        let comparison = match comparison {
            Some(cmp) => {
                let params = cmp.params();
                if params.len() != 2 {
                    return Err(Error::IncorrectNumberOfMethodCallArguments(
                        cmp.name().to_string(),
                    ));
                }
                let mut lifted = false;
                if !types::parameter_is_assignable(&params[0], value_ty) {
                    lifted = types::parameter_is_assignable(&params[0], &value_ty.non_nullable());
                    if !lifted {
                        return Err(Error::SwitchValueTypeDoesNotMatchComparisonMethodParameter(
                            value_ty.clone(),
                        ));
                    }
                }
                for c in cases {
                    validate_switch_case_type(c.body(), custom_type, &result)?;
                    for test in c.test_values().iter() {
                        let mut operand = test.ty().clone();
                        if lifted {
                            if !operand.is_nullable() {
                                return Err(
                                    Error::TestValueTypeDoesNotMatchComparisonMethodParameter(
                                        operand,
                                    ),
                                );
                            }
                            operand = operand.non_nullable();
                        }
                        if !types::parameter_is_assignable(&params[1], &operand) {
                            return Err(Error::TestValueTypeDoesNotMatchComparisonMethodParameter(
                                operand,
                            ));
                        }
                    }
                }
                if *cmp.return_type() != Type::bool() {
                    return Err(Error::EqualityMustReturnBoolean(cmp.name().to_string()));
                }
                Some(cmp.clone())
            }
            None => match cases.first() {
                Some(first) => {
                    let first_value = &first.test_values()[0];
                    for c in cases {
                        validate_switch_case_type(c.body(), custom_type, &result)?;
                        if c
                            .test_values()
                            .iter()
                            .any(|t| !types::are_equivalent(first_value.ty(), t.ty()))
                        {
                            return Err(Error::AllTestValuesMustHaveSameType);
                        }
                    }
                    // The switch value must be comparable with `==`.
                    let equal = Expr::comparison(NodeType::Equal, switch_value, first_value, false, None)?;
                    equal.as_binary().and_then(|b| b.method.clone())
                }
                None => None,
            },
        };

        match default_body {
            None if !result.is_void() => return Err(Error::DefaultBodyMustBeSupplied(result)),
            None => {}
            Some(d) => validate_switch_case_type(d, custom_type, &result)?,
        }
        Ok(Expr::new(
            result,
            ExprKind::Switch(SwitchNode {
                switch_value: switch_value.clone(),
                cases: cases.to_vec().into(),
                default_body: default_body.cloned(),
                comparison,
            }),
        ))
    }

    // ── Try ──

    /// Handler for exceptions of type `test`, optionally binding the
    /// exception to `variable` and guarded by a boolean `filter`.
    pub fn catch(
        test: &Type,
        variable: Option<&Expr>,
        body: &Expr,
        filter: Option<&Expr>,
    ) -> Result<CatchBlock> {
        if let Some(v) = variable {
            let Some(p) = v.as_parameter() else {
                return Err(Error::ArgumentMustBeParameter(v.node_type()));
            };
            if !types::are_equivalent(v.ty(), test) {
                return Err(Error::CatchVariableTypeMismatch {
                    variable: v.ty().clone(),
                    caught: test.clone(),
                });
            }
            if p.is_by_ref {
                return Err(Error::VariableMustNotBeByRef {
                    name: p.name.as_deref().unwrap_or("").to_string(),
                    ty: v.ty().clone(),
                });
            }
        }
        require_readable(body)?;
        if let Some(f) = filter {
            require_readable(f)?;
            if *f.ty() != Type::bool() {
                return Err(Error::ArgumentMustBeBoolean(f.ty().clone()));
            }
        }
        Ok(CatchBlock::new(
            test.clone(),
            variable.cloned(),
            body.clone(),
            filter.cloned(),
        ))
    }

    /// Protected region with catch handlers, a finally block, or a fault
    /// block (which excludes both).
    pub fn make_try(
        ty: Option<&Type>,
        body: &Expr,
        finally: Option<&Expr>,
        fault: Option<&Expr>,
        handlers: &[CatchBlock],
    ) -> Result<Expr> {
        require_readable(body)?;
        validate_try_and_catch_types(ty, body, handlers)?;
        match (fault, finally) {
            (Some(_), Some(_)) => return Err(Error::FaultCannotHaveCatchOrFinally),
            (Some(f), None) => {
                if !handlers.is_empty() {
                    return Err(Error::FaultCannotHaveCatchOrFinally);
                }
                require_readable(f)?;
            }
            (None, Some(f)) => require_readable(f)?,
            (None, None) if handlers.is_empty() => {
                return Err(Error::TryMustHaveCatchFinallyOrFault)
            }
            (None, None) => {}
        }
        Ok(Expr::new(
            ty.unwrap_or(body.ty()).clone(),
            ExprKind::Try(TryNode {
                body: body.clone(),
                handlers: handlers.to_vec().into(),
                finally: finally.cloned(),
                fault: fault.cloned(),
            }),
        ))
    }

    pub fn try_catch(body: &Expr, handlers: &[CatchBlock]) -> Result<Expr> {
        Expr::make_try(None, body, None, None, handlers)
    }

    pub fn try_finally(body: &Expr, finally: &Expr) -> Result<Expr> {
        Expr::make_try(None, body, Some(finally), None, &[])
    }

    pub fn try_fault(body: &Expr, fault: &Expr) -> Result<Expr> {
        Expr::make_try(None, body, None, Some(fault), &[])
    }

    // ── Debug markers ──

    /// Sequence point covering `start_line:start_column` to
    /// `end_line:end_column`, 1-based and ordered.
    pub fn debug_info(
        document: &SymbolDocument,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Result<Expr> {
        let clear = DebugInfoNode::CLEAR_LINE;
        if !(start_line == clear && start_column == 0 && end_line == clear && end_column == 0) {
            for (what, value) in [
                ("start line", start_line),
                ("start column", start_column),
                ("end line", end_line),
                ("end column", end_column),
            ] {
                if value < 1 {
                    return Err(Error::DebugInfoOutOfRange { what, value });
                }
            }
            if start_line > end_line || (start_line == end_line && start_column > end_column) {
                return Err(Error::StartEndMustBeOrdered);
            }
        }
        Ok(Expr::new(
            Type::void(),
            ExprKind::DebugInfo(DebugInfoNode {
                document: document.clone(),
                start_line,
                start_column,
                end_line,
                end_column,
            }),
        ))
    }

    /// Marker that clears the current sequence point.
    pub fn clear_debug_info(document: &SymbolDocument) -> Expr {
        let clear = DebugInfoNode::CLEAR_LINE;
        Expr::new(
            Type::void(),
            ExprKind::DebugInfo(DebugInfoNode {
                document: document.clone(),
                start_line: clear,
                start_column: 0,
                end_line: clear,
                end_column: 0,
            }),
        )
    }

    // ── Runtime variables ──

    /// Capture of live variables for read/write access at run time.
    pub fn runtime_variables(variables: &[Expr]) -> Result<Expr> {
        if let Some(v) = variables.iter().find(|v| !v.is_parameter()) {
            return Err(Error::ArgumentMustBeParameter(v.node_type()));
        }
        Ok(Expr::new(
            Type::runtime_variables(),
            ExprKind::RuntimeVariables(RuntimeVariablesNode {
                variables: variables.to_vec().into(),
            }),
        ))
    }
}
