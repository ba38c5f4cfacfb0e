//! # Code Info
//!
//! Per-domain descriptors built from a [`ClassSymbol`].
//!
//! A Code Info is one type's declared bindings for one domain: a list of
//! `(function, key, invoker)` triples for the handler domains, or the
//! activation policy for injection. Descriptors are built by
//! [`Describe::describe`], stored by the domain's processor, and handed
//! back unchanged by `lookup`.
//!
//! # Scan errors
//!
//! A malformed method is logged and skipped; the rest of the class is still
//! described. With `strict` set, the first method-level error fails the
//! whole class instead.

use std::{any::Any, borrow::Borrow, borrow::Cow, sync::Arc};
use weft_core::{
    AccessType, ApiTag, AspectTag, Attributed, Behaviour, ClassSymbol, CutPoint, DomainMarker,
    EventTag, InjectTag, InputCode, InputOp, InputTag, Invoker, MessageTag, MethodSymbol,
    PoolAction, PoolTag, ScanError, TagKind, TypeKey,
};

// ============================================================================
// Keys
// ============================================================================

/// Aspect binding key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AspectKey {
    /// Type or capability the advice applies to.
    pub target: TypeKey,
    /// Behaviour or custom method.
    pub cut: CutPoint,
    /// Slot in the woven call.
    pub access: AccessType,
}

/// Event binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Numeric event id.
    Id(i32),
    /// Payload type.
    Type(TypeKey),
}

/// Message binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    /// Protocol opcode.
    Opcode(u32),
    /// Message type.
    Type(TypeKey),
}

/// Input binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKey {
    /// One operation on one input code.
    Code(InputCode, InputOp),
    /// Payload type.
    Type(TypeKey),
}

/// Pool binding key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolKey {
    /// Pooled type.
    pub target: TypeKey,
    /// Pool step.
    pub action: PoolAction,
}

/// Exported function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApiKey(pub Cow<'static, str>);

impl Borrow<str> for ApiKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ============================================================================
// Descriptors
// ============================================================================

/// One binding of one method.
#[derive(Debug, Clone)]
pub struct BindingInfo<K> {
    /// Declaring method.
    pub function: Cow<'static, str>,
    /// Dispatch key.
    pub key: K,
    /// Handle of the method.
    pub invoker: Invoker,
}

/// Every binding one type declares in one handler domain.
#[derive(Debug, Clone)]
pub struct BindingSet<K> {
    /// Declaring type.
    pub class: TypeKey,
    /// Bindings, in method declaration order.
    pub bindings: Vec<BindingInfo<K>>,
}

impl<K> BindingSet<K> {
    /// The keys of every binding.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.bindings.iter().map(|b| &b.key)
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the type declares no binding.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Aspect Code Info.
pub type AspectCodeInfo = BindingSet<AspectKey>;
/// Event Code Info.
pub type EventCodeInfo = BindingSet<EventKey>;
/// Message Code Info.
pub type MessageCodeInfo = BindingSet<MessageKey>;
/// Input Code Info.
pub type InputCodeInfo = BindingSet<InputKey>;
/// Pool Code Info.
pub type PoolCodeInfo = BindingSet<PoolKey>;
/// Api Code Info.
pub type ApiCodeInfo = BindingSet<ApiKey>;

/// Injection Code Info.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectCodeInfo {
    /// Injected type.
    pub class: TypeKey,
    /// Behaviour at which dependencies are populated.
    pub policy: Behaviour,
    /// Bean name.
    pub bean_name: Cow<'static, str>,
}

/// A Code Info of any domain, as returned by `lookup`.
#[derive(Debug, Clone)]
pub enum CodeInfo {
    /// Aspect bindings.
    Aspect(Arc<AspectCodeInfo>),
    /// Event bindings.
    Event(Arc<EventCodeInfo>),
    /// Message bindings.
    Message(Arc<MessageCodeInfo>),
    /// Input bindings.
    Input(Arc<InputCodeInfo>),
    /// Injection policy.
    Inject(Arc<InjectCodeInfo>),
    /// Pool bindings.
    Pool(Arc<PoolCodeInfo>),
    /// Api bindings.
    Api(Arc<ApiCodeInfo>),
    /// A descriptor owned by a custom domain.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl CodeInfo {
    /// Downcast a custom descriptor.
    pub fn custom<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            CodeInfo::Custom(info) => info.downcast_ref::<T>(),
            _ => None,
        }
    }
}

// ============================================================================
// Describe
// ============================================================================

/// A descriptor buildable from a symbol.
pub trait Describe: Sized + Send + Sync + 'static {
    /// Domain the descriptor belongs to.
    const MARKER: DomainMarker;

    /// Describe `symbol`.
    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError>;

    /// Wrap a stored descriptor for `lookup`.
    fn into_code_info(info: Arc<Self>) -> CodeInfo;
}

/// Collect the bindings of every method carrying a `T` tag.
///
/// `extract` turns the method's tags into keys. Handler methods must be
/// static and carry an invoker.
fn scan_methods<T, K, F>(
    symbol: &ClassSymbol,
    domain: DomainMarker,
    strict: bool,
    mut extract: F,
) -> Result<Vec<BindingInfo<K>>, ScanError>
where
    T: TagKind,
    F: FnMut(&MethodSymbol, &[&T]) -> Result<Vec<K>, ScanError>,
{
    let owner = symbol.key().short_name();
    let mut bindings = Vec::new();

    for method in symbol.methods() {
        let tags = method.attributes::<T>(true);
        if tags.is_empty() {
            continue;
        }

        let described = check_handler(owner, method, domain)
            .and_then(|invoker| Ok((invoker, extract(method, &tags)?)));

        match described {
            Ok((invoker, keys)) => {
                for key in keys {
                    bindings.push(BindingInfo {
                        function: Cow::Owned(method.name().to_owned()),
                        key,
                        invoker: invoker.clone(),
                    });
                }
            }
            Err(err) if strict => return Err(err),
            Err(err) => {
                tracing::warn!(%domain, ty = %symbol.key(), error = %err, "skipping method");
            }
        }
    }

    Ok(bindings)
}

fn check_handler(
    owner: &'static str,
    method: &MethodSymbol,
    domain: DomainMarker,
) -> Result<Invoker, ScanError> {
    if !method.is_static() {
        return Err(ScanError::NotStatic {
            owner,
            member: method.name().to_owned(),
            domain,
        });
    }
    method.invoker().cloned().ok_or_else(|| ScanError::MissingInvoker {
        owner,
        member: method.name().to_owned(),
    })
}

fn missing(owner: &'static str, method: &MethodSymbol, parameter: &'static str) -> ScanError {
    ScanError::MissingParameter {
        owner,
        member: method.name().to_owned(),
        parameter,
    }
}

fn malformed(owner: &'static str, method: &MethodSymbol, reason: impl Into<String>) -> ScanError {
    ScanError::Malformed {
        owner,
        member: method.name().to_owned(),
        reason: reason.into(),
    }
}

impl Describe for AspectCodeInfo {
    const MARKER: DomainMarker = DomainMarker::ASPECT;

    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError> {
        let owner = symbol.key().short_name();
        let bindings = scan_methods(symbol, Self::MARKER, strict, |method, tags: &[&AspectTag]| {
            let mut seen = Vec::with_capacity(tags.len());
            for tag in tags {
                if seen.contains(&tag.access) {
                    return Err(ScanError::Repeated {
                        owner,
                        member: method.name().to_owned(),
                        tag: format!("aspect tag for {}", tag.access),
                    });
                }
                seen.push(tag.access);
                if matches!(&tag.cut, CutPoint::Method(name) if name.is_empty()) {
                    return Err(malformed(owner, method, "empty cut point method name"));
                }
            }
            Ok(tags
                .iter()
                .map(|tag| AspectKey {
                    target: tag.target,
                    cut: tag.cut.clone(),
                    access: tag.access,
                })
                .collect())
        })?;
        Ok(Self {
            class: symbol.key(),
            bindings,
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Aspect(info)
    }
}

impl Describe for EventCodeInfo {
    const MARKER: DomainMarker = DomainMarker::EVENT;

    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError> {
        let owner = symbol.key().short_name();
        let bindings = scan_methods(symbol, Self::MARKER, strict, |method, tags: &[&EventTag]| {
            let mut keys = Vec::new();
            for tag in tags {
                if tag.id.is_none() && tag.payload.is_none() {
                    return Err(missing(owner, method, "id or payload"));
                }
                keys.extend(tag.id.map(EventKey::Id));
                keys.extend(tag.payload.map(EventKey::Type));
            }
            Ok(keys)
        })?;
        Ok(Self {
            class: symbol.key(),
            bindings,
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Event(info)
    }
}

impl Describe for MessageCodeInfo {
    const MARKER: DomainMarker = DomainMarker::MESSAGE;

    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError> {
        let owner = symbol.key().short_name();
        let bindings =
            scan_methods(symbol, Self::MARKER, strict, |method, tags: &[&MessageTag]| {
                let mut keys = Vec::new();
                for tag in tags {
                    if tag.opcode.is_none() && tag.message.is_none() {
                        return Err(missing(owner, method, "opcode or message"));
                    }
                    keys.extend(tag.opcode.map(MessageKey::Opcode));
                    keys.extend(tag.message.map(MessageKey::Type));
                }
                Ok(keys)
            })?;
        Ok(Self {
            class: symbol.key(),
            bindings,
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Message(info)
    }
}

impl Describe for InputCodeInfo {
    const MARKER: DomainMarker = DomainMarker::INPUT;

    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError> {
        let owner = symbol.key().short_name();
        let bindings = scan_methods(symbol, Self::MARKER, strict, |method, tags: &[&InputTag]| {
            let mut keys = Vec::new();
            for tag in tags {
                match tag.code {
                    Some(_) if tag.ops.is_empty() => {
                        return Err(missing(owner, method, "ops"));
                    }
                    None if !tag.ops.is_empty() => {
                        let reason = "operation mask without an input code";
                        return Err(malformed(owner, method, reason));
                    }
                    None if tag.payload.is_none() => {
                        return Err(missing(owner, method, "code or payload"));
                    }
                    Some(code) => keys.extend(tag.ops.ops().map(|op| InputKey::Code(code, op))),
                    None => {}
                }
                keys.extend(tag.payload.map(InputKey::Type));
            }
            Ok(keys)
        })?;
        Ok(Self {
            class: symbol.key(),
            bindings,
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Input(info)
    }
}

impl Describe for PoolCodeInfo {
    const MARKER: DomainMarker = DomainMarker::POOL;

    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError> {
        let bindings = scan_methods(symbol, Self::MARKER, strict, |_, tags: &[&PoolTag]| {
            Ok(tags
                .iter()
                .map(|tag| PoolKey {
                    target: tag.target,
                    action: tag.action,
                })
                .collect())
        })?;
        Ok(Self {
            class: symbol.key(),
            bindings,
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Pool(info)
    }
}

impl Describe for ApiCodeInfo {
    const MARKER: DomainMarker = DomainMarker::API;

    fn describe(symbol: &ClassSymbol, strict: bool) -> Result<Self, ScanError> {
        let owner = symbol.key().short_name();
        let bindings = scan_methods(symbol, Self::MARKER, strict, |method, tags: &[&ApiTag]| {
            let [tag] = tags else {
                return Err(ScanError::Repeated {
                    owner,
                    member: method.name().to_owned(),
                    tag: "api tag".to_owned(),
                });
            };
            let name = match tag.name {
                Some("") => return Err(malformed(owner, method, "empty exported name")),
                Some(name) => Cow::Borrowed(name),
                None => Cow::Owned(method.name().to_owned()),
            };
            Ok(vec![ApiKey(name)])
        })?;
        Ok(Self {
            class: symbol.key(),
            bindings,
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Api(info)
    }
}

impl Describe for InjectCodeInfo {
    const MARKER: DomainMarker = DomainMarker::INJECT;

    fn describe(symbol: &ClassSymbol, _strict: bool) -> Result<Self, ScanError> {
        let owner = symbol.key().short_name();
        let member = || "<class>".to_owned();
        let tag = match symbol.attributes::<InjectTag>(true).as_slice() {
            [] => {
                return Err(ScanError::MissingParameter {
                    owner,
                    member: member(),
                    parameter: "policy",
                });
            }
            [tag] => (*tag).clone(),
            _ => {
                return Err(ScanError::Repeated {
                    owner,
                    member: member(),
                    tag: "inject tag".to_owned(),
                });
            }
        };
        if !symbol.is_instantiable() {
            return Err(ScanError::Malformed {
                owner,
                member: member(),
                reason: "injection target must be instantiable".to_owned(),
            });
        }
        Ok(Self {
            class: symbol.key(),
            policy: tag.policy,
            bean_name: Cow::Borrowed(tag.name.unwrap_or(owner)),
        })
    }

    fn into_code_info(info: Arc<Self>) -> CodeInfo {
        CodeInfo::Inject(info)
    }
}
