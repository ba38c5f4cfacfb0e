#![allow(dead_code)]

use weft::{
    AccessType, AspectTag, BoxError, ClassSymbol, CutPoint, DomainMarker, EventTag, Invoker,
    MessageTag, MethodSymbol, testing::Journal,
};

// ============================================================================
// Test Targets
// ============================================================================

pub trait Living {}

pub struct Player {
    pub hp: i32,
    pub journal: Journal,
}

impl Player {
    pub fn new(journal: &Journal) -> Self {
        Self {
            hp: 10,
            journal: journal.clone(),
        }
    }
}

pub fn player_symbol() -> ClassSymbol {
    ClassSymbol::builder::<Player>()
        .capability::<dyn Living>()
        .method(MethodSymbol::instance(
            "update",
            Invoker::method(|player: &mut Player| player.journal.record("update")),
        ))
        .method(MethodSymbol::instance(
            "heal",
            Invoker::method_with(|player: &mut Player, amount: &i32| {
                player.journal.record("heal");
                player.hp += amount;
            }),
        ))
        .build()
}

pub struct Bomb {
    pub journal: Journal,
}

pub fn bomb_symbol() -> ClassSymbol {
    ClassSymbol::builder::<Bomb>()
        .method(MethodSymbol::instance(
            "update",
            Invoker::method(|bomb: &mut Bomb| -> Result<(), BoxError> {
                bomb.journal.record("update");
                Err("boom".into())
            }),
        ))
        .build()
}

// ============================================================================
// Advice Holders
// ============================================================================

/// A static class advising `T` at `cut` once per access type, each advice
/// recording its access name.
pub fn advice_symbol<H, T>(
    journal: &Journal,
    cut: CutPoint,
    accesses: &[AccessType],
) -> ClassSymbol
where
    H: 'static,
    T: ?Sized + 'static,
{
    let mut builder = ClassSymbol::builder::<H>()
        .static_class()
        .marker(DomainMarker::ASPECT);
    for access in accesses {
        builder = builder.method(
            MethodSymbol::function(
                format!("on_{}", access.to_string().to_lowercase()),
                journal.recorder(access.to_string()),
            )
            .tag(AspectTag::new::<T>(cut.clone(), *access)),
        );
    }
    builder.build()
}

// ============================================================================
// Handler Holders
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Damage {
    pub amount: i32,
}

#[derive(Debug)]
pub struct Ping;

/// Event handlers for id 1 and for `Damage` payloads.
pub fn event_symbol<H: 'static>(journal: &Journal) -> ClassSymbol {
    let by_id = journal.clone();
    let by_type = journal.clone();
    ClassSymbol::builder::<H>()
        .static_class()
        .marker(DomainMarker::EVENT)
        .method(
            MethodSymbol::function(
                "on_spawned",
                Invoker::function(move || by_id.record("spawned")),
            )
            .tag(EventTag::id(1)),
        )
        .method(
            MethodSymbol::function(
                "on_damage",
                Invoker::function_with(move |damage: &Damage| {
                    by_type.record(format!("damage {}", damage.amount))
                }),
            )
            .tag(EventTag::payload::<Damage>()),
        )
        .build()
}

/// Message handlers for the given opcodes.
pub fn message_symbol<H: 'static>(journal: &Journal, opcodes: &[u32]) -> ClassSymbol {
    let mut method = MethodSymbol::function("on_message", journal.recorder("message"));
    for opcode in opcodes {
        method = method.tag(MessageTag::opcode(*opcode));
    }
    ClassSymbol::builder::<H>()
        .static_class()
        .marker(DomainMarker::MESSAGE)
        .method(method)
        .build()
}
