//! Type-erased invocable handles.
//!
//! Every tagged method carries an [`Invoker`]: a shared closure that takes
//! an [`Invocation`] (optional receiver, positional arguments, and for
//! aspect advice a [`JoinPoint`]) and downcasts them to the concrete types
//! it was built for.
//!
//! # Usage Patterns
//!
//! 1. **Instance method**: `Invoker::method(|p: &mut Player| p.hp += 1)`
//! 2. **Static handler**: `Invoker::function_with(|e: &Damage| log(e))`
//! 3. **Advice**: `Invoker::advice(|p: &mut Player, jp| ...)`
//! 4. **Raw**: `Invoker::new(|inv| ...)` for anything else

use crate::{
    error::{BoxError, InvokeError},
    key::TypeKey,
    tag::{AccessType, CutPoint},
};
use std::{any::Any, any::type_name, fmt, sync::Arc};

/// Trait for converting a handler's return value into an outcome.
///
/// # Default Implementations
///
/// - `()` → success
/// - `Result<T, E>` → delegates to `T` or propagates `E`
pub trait IntoOutcome {
    /// Convert into success or a boxed fault.
    fn into_outcome(self) -> Result<(), BoxError>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<T, E> IntoOutcome for Result<T, E>
where
    T: IntoOutcome,
    E: Into<BoxError>,
{
    fn into_outcome(self) -> Result<(), BoxError> {
        match self {
            Ok(t) => t.into_outcome(),
            Err(e) => Err(e.into()),
        }
    }
}

/// The rest of a woven call, handed to `Around` handlers.
///
/// Runs the inner `Around` handlers and the underlying method, and returns
/// their outcome. The rest of the call runs at most once.
#[derive(Clone, Copy)]
pub struct Proceed<'a>(&'a (dyn Fn(&mut dyn Any) -> Result<(), BoxError> + 'a));

impl<'a> Proceed<'a> {
    /// Wrap a continuation.
    pub fn new(next: &'a (dyn Fn(&mut dyn Any) -> Result<(), BoxError> + 'a)) -> Self {
        Self(next)
    }

    /// Run the rest of the call on `instance`.
    pub fn call(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        (self.0)(instance)
    }
}

impl fmt::Debug for Proceed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Proceed(..)")
    }
}

/// Where in a woven call an aspect handler is running.
#[derive(Debug, Clone, Copy)]
pub struct JoinPoint<'a> {
    /// Runtime type of the instance.
    pub target: TypeKey,
    /// Behaviour or method being woven.
    pub cut: &'a CutPoint,
    /// Slot the current handler was registered for.
    pub access: AccessType,
    /// The fault, for `AfterThrowing` handlers.
    pub fault: Option<&'a (dyn std::error::Error + Send + Sync + 'static)>,
    /// The rest of the call, for `Around` handlers.
    pub next: Option<Proceed<'a>>,
}

impl JoinPoint<'_> {
    /// Run the rest of the call from an `Around` handler and return its
    /// outcome.
    ///
    /// A handler that returns without proceeding has the rest of the call
    /// run after it returns. A second call is a no-op.
    pub fn proceed(&self, instance: &mut dyn Any) -> Result<(), BoxError> {
        match self.next {
            Some(next) => next.call(instance),
            None => Err(InvokeError::NotAround.into()),
        }
    }
}

/// The inputs of one call through an [`Invoker`].
pub struct Invocation<'a> {
    receiver: Option<&'a mut dyn Any>,
    args: &'a [&'a dyn Any],
    point: Option<JoinPoint<'a>>,
}

impl<'a> Invocation<'a> {
    /// A call with an optional receiver and positional arguments.
    pub fn new(receiver: Option<&'a mut dyn Any>, args: &'a [&'a dyn Any]) -> Self {
        Self {
            receiver,
            args,
            point: None,
        }
    }

    /// A call without receiver.
    pub fn with_args(args: &'a [&'a dyn Any]) -> Self {
        Self::new(None, args)
    }

    /// Attach the join point of a woven call.
    pub fn at(mut self, point: JoinPoint<'a>) -> Self {
        self.point = Some(point);
        self
    }

    /// The join point, when called as aspect advice.
    pub fn point(&self) -> Option<JoinPoint<'a>> {
        self.point
    }

    /// The positional arguments.
    pub fn args(&self) -> &'a [&'a dyn Any] {
        self.args
    }

    /// Argument `index` as an `A`.
    pub fn arg<A: Any>(&self, index: usize) -> Result<&'a A, InvokeError> {
        let args: &'a [&'a dyn Any] = self.args;
        let arg: &'a dyn Any = *args.get(index).ok_or(InvokeError::MissingArgument {
            index,
            expected: type_name::<A>(),
        })?;
        arg.downcast_ref::<A>().ok_or(InvokeError::ArgumentMismatch {
            index,
            expected: type_name::<A>(),
        })
    }

    /// Whether a receiver was supplied.
    pub fn has_receiver(&self) -> bool {
        self.receiver.is_some()
    }

    /// The receiver, type-erased.
    pub fn receiver_any(&mut self) -> Result<&mut dyn Any, InvokeError> {
        match self.receiver.as_deref_mut() {
            Some(receiver) => Ok(receiver),
            None => Err(InvokeError::MissingReceiver { expected: "dyn Any" }),
        }
    }

    /// The receiver as a `T`.
    pub fn receiver_mut<T: Any>(&mut self) -> Result<&mut T, InvokeError> {
        let receiver = self
            .receiver
            .as_deref_mut()
            .ok_or(InvokeError::MissingReceiver {
                expected: type_name::<T>(),
            })?;
        receiver
            .downcast_mut::<T>()
            .ok_or(InvokeError::ReceiverMismatch {
                expected: type_name::<T>(),
            })
    }
}

type InvokeFn = dyn Fn(&mut Invocation<'_>) -> Result<(), BoxError> + Send + Sync + 'static;

/// A shared, type-erased invocable handle.
#[derive(Clone)]
pub struct Invoker(Arc<InvokeFn>);

impl Invoker {
    /// Wrap a raw invocation closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut Invocation<'_>) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// An instance method taking no arguments.
    pub fn method<T, R, F>(f: F) -> Self
    where
        T: Any,
        R: IntoOutcome,
        F: Fn(&mut T) -> R + Send + Sync + 'static,
    {
        Self::new(move |inv| f(inv.receiver_mut::<T>()?).into_outcome())
    }

    /// An instance method taking one argument.
    pub fn method_with<T, A, R, F>(f: F) -> Self
    where
        T: Any,
        A: Any,
        R: IntoOutcome,
        F: Fn(&mut T, &A) -> R + Send + Sync + 'static,
    {
        Self::new(move |inv| {
            let arg = inv.arg::<A>(0)?;
            f(inv.receiver_mut::<T>()?, arg).into_outcome()
        })
    }

    /// A static function taking no arguments.
    pub fn function<R, F>(f: F) -> Self
    where
        R: IntoOutcome,
        F: Fn() -> R + Send + Sync + 'static,
    {
        Self::new(move |_| f().into_outcome())
    }

    /// A static function taking one argument (typically a payload).
    pub fn function_with<A, R, F>(f: F) -> Self
    where
        A: Any,
        R: IntoOutcome,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self::new(move |inv| f(inv.arg::<A>(0)?).into_outcome())
    }

    /// Aspect advice on a concrete target type.
    pub fn advice<T, R, F>(f: F) -> Self
    where
        T: Any,
        R: IntoOutcome,
        F: Fn(&mut T, &JoinPoint<'_>) -> R + Send + Sync + 'static,
    {
        Self::new(move |inv| {
            let point = inv.point().ok_or(InvokeError::MissingJoinPoint)?;
            f(inv.receiver_mut::<T>()?, &point).into_outcome()
        })
    }

    /// Aspect advice on a capability, receiving the instance type-erased.
    pub fn advice_any<R, F>(f: F) -> Self
    where
        R: IntoOutcome,
        F: Fn(&mut dyn Any, &JoinPoint<'_>) -> R + Send + Sync + 'static,
    {
        Self::new(move |inv| {
            let point = inv.point().ok_or(InvokeError::MissingJoinPoint)?;
            f(inv.receiver_any()?, &point).into_outcome()
        })
    }

    /// Call the handle.
    pub fn invoke(&self, invocation: &mut Invocation<'_>) -> Result<(), BoxError> {
        (self.0)(invocation)
    }

    /// Whether two handles share the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Invoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Invoker(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::Behaviour;

    struct Counter(u32);

    #[test]
    fn test_method_downcasts_receiver() {
        let bump = Invoker::method(|c: &mut Counter| c.0 += 1);
        let mut counter = Counter(0);
        bump.invoke(&mut Invocation::new(Some(&mut counter), &[]))
            .unwrap();
        assert_eq!(counter.0, 1);
    }

    #[test]
    fn test_method_with_reads_argument() {
        let add = Invoker::method_with(|c: &mut Counter, n: &u32| c.0 += *n);
        let mut counter = Counter(1);
        let n = 41u32;
        add.invoke(&mut Invocation::new(Some(&mut counter), &[&n]))
            .unwrap();
        assert_eq!(counter.0, 42);
    }

    #[test]
    fn test_mismatches_are_reported() {
        let bump = Invoker::method(|c: &mut Counter| c.0 += 1);
        let mut wrong = 5u8;
        let err = bump
            .invoke(&mut Invocation::new(Some(&mut wrong), &[]))
            .unwrap_err();
        assert!(err.to_string().contains("receiver is not"));

        let err = bump.invoke(&mut Invocation::with_args(&[])).unwrap_err();
        assert!(err.to_string().contains("missing receiver"));

        let read = Invoker::function_with(|_: &String| ());
        let err = read.invoke(&mut Invocation::with_args(&[])).unwrap_err();
        assert!(err.to_string().contains("missing argument 0"));
    }

    #[test]
    fn test_result_outcome_propagates() {
        let fail = Invoker::function(|| Err::<(), _>("boom"));
        let err = fail.invoke(&mut Invocation::with_args(&[])).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_advice_needs_join_point() {
        let advice = Invoker::advice(|c: &mut Counter, jp: &JoinPoint<'_>| {
            assert_eq!(jp.access, AccessType::Before);
            c.0 += 10;
        });
        let mut counter = Counter(0);
        let cut = CutPoint::from(Behaviour::Update);
        let point = JoinPoint {
            target: TypeKey::of::<Counter>(),
            cut: &cut,
            access: AccessType::Before,
            fault: None,
            next: None,
        };
        advice
            .invoke(&mut Invocation::new(Some(&mut counter), &[]).at(point))
            .unwrap();
        assert_eq!(counter.0, 10);

        let err = advice
            .invoke(&mut Invocation::new(Some(&mut counter), &[]))
            .unwrap_err();
        assert!(err.to_string().contains("join point"));
    }

    #[test]
    fn test_proceed_outside_around() {
        let cut = CutPoint::from(Behaviour::Update);
        let point = JoinPoint {
            target: TypeKey::of::<Counter>(),
            cut: &cut,
            access: AccessType::Before,
            fault: None,
            next: None,
        };
        let err = point.proceed(&mut Counter(0)).unwrap_err();
        assert!(err.to_string().contains("outside an `Around`"));
    }

    #[test]
    fn test_proceed_runs_the_continuation() {
        let bump = |instance: &mut dyn Any| -> Result<(), BoxError> {
            instance.downcast_mut::<Counter>().ok_or("not a counter")?.0 += 1;
            Ok(())
        };
        let cut = CutPoint::from(Behaviour::Update);
        let point = JoinPoint {
            target: TypeKey::of::<Counter>(),
            cut: &cut,
            access: AccessType::Around,
            fault: None,
            next: Some(Proceed::new(&bump)),
        };
        let mut counter = Counter(0);
        point.proceed(&mut counter).unwrap();
        assert_eq!(counter.0, 1);
    }
}
