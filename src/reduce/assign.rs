//! Compound assignment, `target op= value`.

use crate::error::{Error, Result};
use crate::tree::{BinaryNode, Expr, ExprKind};

/// A writable location whose receiver and index arguments have been
/// evaluated into temporaries.
pub(super) struct Spilled {
    /// Block variables introduced for the spill.
    pub temps: Vec<Expr>,
    /// Assignments that fill `temps`, in evaluation order.
    pub body: Vec<Expr>,
    /// The location, addressed through the temporaries.
    pub location: Expr,
}

/// Evaluate everything `target` depends on once, up front. Variables and
/// static members need no temporaries.
pub(super) fn spill(target: &Expr) -> Result<Spilled> {
    let mut temps = Vec::new();
    let mut body = Vec::new();
    let location = match target.kind() {
        ExprKind::Member(m) => match &m.expression {
            Some(receiver) => {
                let obj = Expr::temp(receiver.ty());
                body.push(Expr::assign(&obj, receiver)?);
                temps.push(obj.clone());
                Expr::make_member_access(Some(&obj), &m.member)?
            }
            None => target.clone(),
        },
        ExprKind::Index(i) => {
            let obj = Expr::temp(i.object.ty());
            body.push(Expr::assign(&obj, &i.object)?);
            temps.push(obj.clone());
            let mut args = Vec::with_capacity(i.arguments.len());
            for arg in &i.arguments {
                let t = Expr::temp(arg.ty());
                body.push(Expr::assign(&t, arg)?);
                temps.push(t.clone());
                args.push(t);
            }
            Expr::make_index(&obj, i.indexer.as_ref(), &args)?
        }
        ExprKind::Parameter(_) => target.clone(),
        _ => return Err(Error::ExpressionMustBeWritable),
    };
    Ok(Spilled {
        temps,
        body,
        location,
    })
}

/// `x op= y` becomes `x = x op y` for a variable. For a member or indexer
/// the receiver and arguments are spilled first and the new value is kept
/// in a temporary that the block yields.
pub(super) fn lower(b: &BinaryNode) -> Result<Expr> {
    let base = b
        .op
        .op_assignment_base()
        .ok_or(Error::UnhandledBinary(b.op))?;
    let apply = |current: &Expr| -> Result<Expr> {
        let value = Expr::make_binary(base, current, &b.right, false, b.method.as_ref(), None)?;
        match &b.conversion {
            Some(conversion) => Expr::invoke(conversion, &[value]),
            None => Ok(value),
        }
    };

    let Spilled {
        mut temps,
        mut body,
        location,
    } = spill(&b.left)?;
    if temps.is_empty() {
        return Expr::assign(&location, &apply(&location)?);
    }
    let value = apply(&location)?;
    let result = Expr::temp(value.ty());
    body.push(Expr::assign(&result, &value)?);
    body.push(Expr::assign(&location, &result)?);
    body.push(result.clone());
    temps.push(result);
    Expr::block_with(&temps, &body)
}
