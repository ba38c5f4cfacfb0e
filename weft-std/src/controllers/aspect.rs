//! Aspect weaving.
//!
//! A woven call runs, in order:
//!
//! 1. `Before`
//! 2. `Around`, each wrapping the rest of the call
//! 3. the underlying method
//! 4. `Extend`, whenever the underlying method was called
//! 5. `After`
//! 6. `AfterReturning` on success, or `AfterThrowing` on a fault
//!
//! `Around` handlers nest in registration order, the first one outermost.
//! One runs the rest of the call with [`JoinPoint::proceed`] and sees its
//! outcome. A handler that returns without proceeding has the rest run
//! after it returns. An `Around` handler that swallows the fault of the
//! call it wraps turns the call into a success.
//!
//! A fault anywhere before `After` skips it. Any fault up to and including
//! `After` is handed to every `AfterThrowing` handler and then returned to
//! the caller.
//! `AfterThrowing` handlers cannot suppress it; their own faults are logged.
//!
//! Handlers are looked up for the instance type and every capability it
//! declares, then run in registration order across that whole set.

use crate::{
    code_info::AspectKey,
    table::{Delivery, DispatchStats, DispatchTable, Entry},
};
use std::{any::Any, cell::Cell};
use weft_core::{
    AccessType, BoxError, CutPoint, DispatchError, Invocation, Invoker, JoinPoint, Proceed,
    TypeKey,
};

/// Owns the aspect table and weaves calls through it.
#[derive(Default)]
pub struct AspectController {
    pub(super) table: DispatchTable<AspectKey>,
    stats: DispatchStats,
}

impl AspectController {
    /// The installed advice.
    pub fn table(&self) -> &DispatchTable<AspectKey> {
        &self.table
    }

    /// Call counters.
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Handlers for one slot, merged across `applicable` in registration order.
    fn handlers(
        &self,
        applicable: &[TypeKey],
        cut: &CutPoint,
        access: AccessType,
    ) -> Vec<&Entry> {
        let mut handlers: Vec<&Entry> = applicable
            .iter()
            .flat_map(|target| {
                self.table.get(&AspectKey {
                    target: *target,
                    cut: cut.clone(),
                    access,
                })
            })
            .collect();
        handlers.sort_by_key(|entry| entry.order());
        handlers
    }

    /// Weave a call to `cut` on `instance`.
    ///
    /// `target` is the instance's runtime type and `applicable` the types
    /// whose advice applies (the target first, then its capabilities).
    /// `underlying` is the instance's own method for `cut`, if it has one.
    pub fn weave(
        &self,
        target: TypeKey,
        applicable: &[TypeKey],
        cut: &CutPoint,
        instance: &mut dyn Any,
        underlying: Option<&Invoker>,
        args: &[&dyn Any],
    ) -> Result<Delivery, DispatchError> {
        let before = self.handlers(applicable, cut, AccessType::Before);
        let around = self.handlers(applicable, cut, AccessType::Around);
        let extend = self.handlers(applicable, cut, AccessType::Extend);
        let after = self.handlers(applicable, cut, AccessType::After);
        let returning = self.handlers(applicable, cut, AccessType::AfterReturning);
        let throwing = self.handlers(applicable, cut, AccessType::AfterThrowing);

        let advice = [&before, &around, &extend, &after, &returning, &throwing]
            .iter()
            .map(|handlers| handlers.len())
            .sum::<usize>();
        if underlying.is_none() && advice == 0 {
            self.stats.record_dropped();
            tracing::debug!(ty = %target, %cut, "no method or advice, nothing to call");
            return Ok(Delivery::Dropped);
        }

        let point = move |access: AccessType| JoinPoint {
            target,
            cut,
            access,
            fault: None,
            next: None,
        };

        let fired = Cell::new(false);
        let call = |instance: &mut dyn Any| -> Result<(), BoxError> {
            fired.set(true);
            match underlying {
                Some(underlying) => underlying.invoke(&mut Invocation::new(Some(instance), args)),
                None => Ok(()),
            }
        };

        let mut outcome = run(&before, &mut *instance, args, point(AccessType::Before))
            .and_then(|()| wrap(&around, &mut *instance, args, point(AccessType::Around), &call));
        if fired.get() {
            let extended = run(&extend, &mut *instance, args, point(AccessType::Extend));
            outcome = match (outcome, extended) {
                (Ok(()), extended) => extended,
                (Err(fault), Ok(())) => Err(fault),
                (Err(fault), Err(err)) => {
                    tracing::warn!(
                        ty = %target,
                        %cut,
                        error = %err,
                        "extend faulted after a fault"
                    );
                    Err(fault)
                }
            };
        }
        let outcome =
            outcome.and_then(|()| run(&after, &mut *instance, args, point(AccessType::After)));

        let fault = match outcome {
            Ok(()) => match run(&returning, instance, args, point(AccessType::AfterReturning)) {
                Ok(()) => {
                    self.stats.record_delivered();
                    let calls = advice - throwing.len() + usize::from(underlying.is_some());
                    return Ok(Delivery::Handled(calls));
                }
                Err(fault) => fault,
            },
            Err(fault) => {
                let throwing_point = JoinPoint {
                    fault: Some(fault.as_ref()),
                    ..point(AccessType::AfterThrowing)
                };
                for entry in &throwing {
                    let mut invocation =
                        Invocation::new(Some(&mut *instance), args).at(throwing_point);
                    if let Err(err) = entry.invoker().invoke(&mut invocation) {
                        tracing::warn!(
                            ty = %target,
                            %cut,
                            function = entry.function(),
                            error = %err,
                            "after-throwing handler faulted"
                        );
                    }
                }
                fault
            }
        };

        self.stats.record_faulted();
        Err(DispatchError::Invocation {
            target: target.name(),
            cut: cut.to_string(),
            source: fault,
        })
    }
}

fn run(
    handlers: &[&Entry],
    instance: &mut dyn Any,
    args: &[&dyn Any],
    point: JoinPoint<'_>,
) -> Result<(), BoxError> {
    for entry in handlers {
        tracing::debug!(
            access = %point.access,
            cut = %point.cut,
            function = entry.function(),
            "advice"
        );
        entry
            .invoker()
            .invoke(&mut Invocation::new(Some(&mut *instance), args).at(point))?;
    }
    Ok(())
}

/// Run `around` nested around `call`, the first handler outermost.
fn wrap(
    around: &[&Entry],
    instance: &mut dyn Any,
    args: &[&dyn Any],
    point: JoinPoint<'_>,
    call: &dyn Fn(&mut dyn Any) -> Result<(), BoxError>,
) -> Result<(), BoxError> {
    let Some((entry, inner)) = around.split_first() else {
        return call(instance);
    };

    let proceeded = Cell::new(false);
    let next = |instance: &mut dyn Any| -> Result<(), BoxError> {
        if proceeded.replace(true) {
            return Ok(());
        }
        wrap(inner, instance, args, point, call)
    };

    tracing::debug!(
        access = %point.access,
        cut = %point.cut,
        function = entry.function(),
        "advice"
    );
    let point = JoinPoint {
        next: Some(Proceed::new(&next)),
        ..point
    };
    entry
        .invoker()
        .invoke(&mut Invocation::new(Some(&mut *instance), args).at(point))?;
    next(instance)
}
