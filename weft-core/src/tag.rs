//! Metadata tags.
//!
//! Tags are the declarative records attached to classes and methods. Each
//! binding domain reads its own tag kind; [`TagKind`] lets callers ask a
//! member for "all tags of kind `T`" without matching on [`Tag`] by hand.

use crate::key::{DomainMarker, TypeKey};
use bitflags::bitflags;
use std::{borrow::Cow, fmt};

/// A named lifecycle phase fired by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Behaviour {
    /// Module-level initialisation.
    Initialize,
    /// Module-level startup, after every module initialised.
    Startup,
    /// The object was created.
    Awake,
    /// The object is about to receive its first update.
    Start,
    /// Fixed-step update.
    FixedUpdate,
    /// Per-frame update.
    Update,
    /// Per-frame update after every `Update`.
    LateUpdate,
    /// The object is being destroyed.
    Destroy,
    /// Module-level shutdown.
    Shutdown,
    /// Module-level cleanup, after every module shut down.
    Cleanup,
}

impl Behaviour {
    /// Every behaviour, in lifecycle order.
    pub const ALL: [Behaviour; 10] = [
        Behaviour::Initialize,
        Behaviour::Startup,
        Behaviour::Awake,
        Behaviour::Start,
        Behaviour::FixedUpdate,
        Behaviour::Update,
        Behaviour::LateUpdate,
        Behaviour::Destroy,
        Behaviour::Shutdown,
        Behaviour::Cleanup,
    ];

    /// Name of the method implementing this behaviour on a target type.
    pub const fn method_name(self) -> &'static str {
        match self {
            Behaviour::Initialize => "initialize",
            Behaviour::Startup => "startup",
            Behaviour::Awake => "awake",
            Behaviour::Start => "start",
            Behaviour::FixedUpdate => "fixed_update",
            Behaviour::Update => "update",
            Behaviour::LateUpdate => "late_update",
            Behaviour::Destroy => "destroy",
            Behaviour::Shutdown => "shutdown",
            Behaviour::Cleanup => "cleanup",
        }
    }
}

impl fmt::Display for Behaviour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// Temporal relation of an aspect handler to the woven call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccessType {
    /// Before everything else.
    Before,
    /// Immediately around the underlying call.
    Around,
    /// After the underlying call, whatever its outcome.
    After,
    /// After `After`, only when nothing faulted.
    AfterReturning,
    /// After a fault, with the fault attached.
    AfterThrowing,
    /// Fires whenever the behaviour fires, alongside the underlying call.
    Extend,
}

impl AccessType {
    /// Every access type.
    pub const ALL: [AccessType; 6] = [
        AccessType::Before,
        AccessType::Around,
        AccessType::After,
        AccessType::AfterReturning,
        AccessType::AfterThrowing,
        AccessType::Extend,
    ];
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The point of a target type an aspect attaches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CutPoint {
    /// A lifecycle behaviour.
    Behaviour(Behaviour),
    /// A custom method, by name.
    Method(Cow<'static, str>),
}

impl CutPoint {
    /// A custom method cut point.
    pub fn method(name: impl Into<Cow<'static, str>>) -> Self {
        CutPoint::Method(name.into())
    }

    /// Name of the method implementing this cut point on the target.
    pub fn method_name(&self) -> &str {
        match self {
            CutPoint::Behaviour(behaviour) => behaviour.method_name(),
            CutPoint::Method(name) => name,
        }
    }
}

impl From<Behaviour> for CutPoint {
    fn from(behaviour: Behaviour) -> Self {
        CutPoint::Behaviour(behaviour)
    }
}

impl fmt::Display for CutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}

/// A host input code (key, button, axis).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InputCode(pub u32);

impl fmt::Display for InputCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single input operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InputOp {
    /// Went down this frame.
    Pressed,
    /// Went up this frame.
    Released,
    /// Still down.
    Held,
    /// Analogue value changed.
    Changed,
}

impl InputOp {
    /// The mask bit of this operation.
    pub const fn flag(self) -> InputOps {
        match self {
            InputOp::Pressed => InputOps::PRESSED,
            InputOp::Released => InputOps::RELEASED,
            InputOp::Held => InputOps::HELD,
            InputOp::Changed => InputOps::CHANGED,
        }
    }
}

bitflags! {
    /// Set of input operations an input tag listens for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct InputOps: u8 {
        /// [`InputOp::Pressed`].
        const PRESSED = 1 << 0;
        /// [`InputOp::Released`].
        const RELEASED = 1 << 1;
        /// [`InputOp::Held`].
        const HELD = 1 << 2;
        /// [`InputOp::Changed`].
        const CHANGED = 1 << 3;
    }
}

impl InputOps {
    /// The individual operations in this mask.
    pub fn ops(self) -> impl Iterator<Item = InputOp> {
        [
            InputOp::Pressed,
            InputOp::Released,
            InputOp::Held,
            InputOp::Changed,
        ]
        .into_iter()
        .filter(move |op| self.contains(op.flag()))
    }
}

/// Object pool lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PoolAction {
    /// A fresh object was allocated for the pool.
    Create,
    /// An object left the pool.
    Acquire,
    /// An object returned to the pool.
    Release,
    /// The pool dropped an object for good.
    Destroy,
}

impl fmt::Display for PoolAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Binds a static method as advice on a target type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AspectTag {
    /// Type (or capability) the advice applies to.
    pub target: TypeKey,
    /// Behaviour or custom method the advice attaches to.
    pub cut: CutPoint,
    /// When the advice runs relative to the call.
    pub access: AccessType,
}

impl AspectTag {
    /// Advice on `T` at `cut`.
    pub fn new<T: ?Sized + 'static>(cut: impl Into<CutPoint>, access: AccessType) -> Self {
        Self {
            target: TypeKey::of::<T>(),
            cut: cut.into(),
            access,
        }
    }
}

/// Subscribes a static method to an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventTag {
    /// Numeric event id.
    pub id: Option<i32>,
    /// Payload type, used when no id is given or none matches.
    pub payload: Option<TypeKey>,
}

impl EventTag {
    /// Subscribe by id.
    pub fn id(id: i32) -> Self {
        Self {
            id: Some(id),
            payload: None,
        }
    }

    /// Subscribe by payload type.
    pub fn payload<P: 'static>() -> Self {
        Self {
            id: None,
            payload: Some(TypeKey::of::<P>()),
        }
    }
}

/// Binds a static method to a message opcode or type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageTag {
    /// Protocol opcode.
    pub opcode: Option<u32>,
    /// Message type, used when no opcode is given or none matches.
    pub message: Option<TypeKey>,
}

impl MessageTag {
    /// Handle an opcode.
    pub fn opcode(opcode: u32) -> Self {
        Self {
            opcode: Some(opcode),
            message: None,
        }
    }

    /// Handle a message type.
    pub fn message<M: 'static>() -> Self {
        Self {
            opcode: None,
            message: Some(TypeKey::of::<M>()),
        }
    }
}

/// Binds a static method to an input code or payload type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputTag {
    /// Input code.
    pub code: Option<InputCode>,
    /// Operations of `code` to listen for.
    pub ops: InputOps,
    /// Payload type, used when no code is given or none matches.
    pub payload: Option<TypeKey>,
}

impl InputTag {
    /// Listen for `ops` on `code`.
    pub fn code(code: u32, ops: InputOps) -> Self {
        Self {
            code: Some(InputCode(code)),
            ops,
            payload: None,
        }
    }

    /// Listen for a payload type.
    pub fn payload<P: 'static>() -> Self {
        Self {
            code: None,
            ops: InputOps::empty(),
            payload: Some(TypeKey::of::<P>()),
        }
    }
}

/// Declares the injection activation policy of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectTag {
    /// Behaviour at which dependencies are populated.
    pub policy: Behaviour,
    /// Bean name; defaults to the type's short name.
    pub name: Option<&'static str>,
}

impl InjectTag {
    /// Populate dependencies at `policy`.
    pub fn new(policy: Behaviour) -> Self {
        Self { policy, name: None }
    }

    /// Name the bean.
    pub fn named(mut self, name: &'static str) -> Self {
        self.name = Some(name);
        self
    }
}

/// Binds a static method as a pool callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolTag {
    /// Pooled object type.
    pub target: TypeKey,
    /// Pool step the callback runs at.
    pub action: PoolAction,
}

impl PoolTag {
    /// Callback for `action` on pooled `T`.
    pub fn new<T: 'static>(action: PoolAction) -> Self {
        Self {
            target: TypeKey::of::<T>(),
            action,
        }
    }
}

/// Exports a static method through the generic API domain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiTag {
    /// Exported name; defaults to the method name.
    pub name: Option<&'static str>,
}

impl ApiTag {
    /// Export under a different name.
    pub fn named(name: &'static str) -> Self {
        Self { name: Some(name) }
    }
}

/// A metadata tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Aspect advice.
    Aspect(AspectTag),
    /// Event subscription.
    Event(EventTag),
    /// Message handler.
    Message(MessageTag),
    /// Input handler.
    Input(InputTag),
    /// Injection policy.
    Inject(InjectTag),
    /// Pool callback.
    Pool(PoolTag),
    /// Exported function.
    Api(ApiTag),
    /// Free-form annotation, carried through untouched.
    Note(&'static str),
}

impl Tag {
    /// The domain this tag belongs to, if any.
    pub fn domain(&self) -> Option<DomainMarker> {
        match self {
            Tag::Aspect(_) => Some(DomainMarker::ASPECT),
            Tag::Event(_) => Some(DomainMarker::EVENT),
            Tag::Message(_) => Some(DomainMarker::MESSAGE),
            Tag::Input(_) => Some(DomainMarker::INPUT),
            Tag::Inject(_) => Some(DomainMarker::INJECT),
            Tag::Pool(_) => Some(DomainMarker::POOL),
            Tag::Api(_) => Some(DomainMarker::API),
            Tag::Note(_) => None,
        }
    }
}

/// A tag kind that can be picked out of a [`Tag`].
pub trait TagKind: Sized + 'static {
    /// Borrow the tag as `Self` if it is of this kind.
    fn from_tag(tag: &Tag) -> Option<&Self>;
}

macro_rules! tag_kind {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl TagKind for $ty {
                fn from_tag(tag: &Tag) -> Option<&Self> {
                    match tag {
                        Tag::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }

            impl From<$ty> for Tag {
                fn from(tag: $ty) -> Self {
                    Tag::$variant(tag)
                }
            }
        )*
    };
}

tag_kind! {
    Aspect => AspectTag,
    Event => EventTag,
    Message => MessageTag,
    Input => InputTag,
    Inject => InjectTag,
    Pool => PoolTag,
    Api => ApiTag,
}

impl TagKind for &'static str {
    fn from_tag(tag: &Tag) -> Option<&Self> {
        match tag {
            Tag::Note(note) => Some(note),
            _ => None,
        }
    }
}
