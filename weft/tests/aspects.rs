//! Aspect weaving through the runtime.

use std::any::Any;
use weft::{
    AccessType, AspectTag, Behaviour, ClassSymbol, CutPoint, Delivery, DispatchError,
    DomainMarker, Invoker, JoinPoint, MethodSymbol, Runtime, TypeKey, testing::Journal,
};

mod common;
use common::{Bomb, Living, Player, advice_symbol, bomb_symbol, player_symbol};

struct PlayerAdvice;
struct BombAdvice;
struct LivingAdvice;
struct HealAdvice;

fn update() -> CutPoint {
    Behaviour::Update.into()
}

#[test]
fn test_success_runs_every_slot_in_order() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Player, _>(player_symbol);
    let advice = journal.clone();
    runtime.register::<PlayerAdvice, _>(move || {
        advice_symbol::<PlayerAdvice, Player>(&advice, update(), &AccessType::ALL)
    });
    assert!(runtime.load_all().is_clean());

    let mut player = Player::new(&journal);
    let delivery = runtime.dispatch(Behaviour::Update, &mut player).unwrap();

    assert_eq!(delivery, Delivery::Handled(6));
    assert_eq!(
        journal.entries(),
        vec!["Before", "Around", "update", "Extend", "After", "AfterReturning"]
    );
    assert_eq!(runtime.controllers().aspects.stats().delivered(), 1);
}

#[test]
fn test_fault_skips_after_and_reaches_after_throwing() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Bomb, _>(bomb_symbol);
    let advice = journal.clone();
    runtime.register::<BombAdvice, _>(move || {
        advice_symbol::<BombAdvice, Bomb>(&advice, update(), &AccessType::ALL)
    });
    assert!(runtime.load_all().is_clean());

    let mut bomb = Bomb {
        journal: journal.clone(),
    };
    let err = runtime.dispatch(Behaviour::Update, &mut bomb).unwrap_err();

    assert!(matches!(err, DispatchError::Invocation { ref cut, .. } if cut == "update"));
    assert_eq!(err.fault().to_string(), "boom");
    assert_eq!(
        journal.entries(),
        vec!["Before", "Around", "update", "Extend", "AfterThrowing"]
    );
    assert_eq!(runtime.controllers().aspects.stats().faulted(), 1);
}

#[test]
fn test_after_throwing_sees_the_fault() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Bomb, _>(bomb_symbol);
    let seen = journal.clone();
    runtime.register::<BombAdvice, _>(move || {
        let seen = seen.clone();
        ClassSymbol::builder::<BombAdvice>()
            .static_class()
            .marker(DomainMarker::ASPECT)
            .method(
                MethodSymbol::function(
                    "on_fault",
                    Invoker::advice(move |_: &mut Bomb, point| {
                        let fault = point.fault.map(|fault| fault.to_string());
                        seen.record(format!("{} saw {fault:?}", point.access));
                    }),
                )
                .tag(AspectTag::new::<Bomb>(Behaviour::Update, AccessType::AfterThrowing)),
            )
            .build()
    });
    assert!(runtime.load_all().is_clean());

    let mut bomb = Bomb {
        journal: journal.clone(),
    };
    assert!(runtime.dispatch(Behaviour::Update, &mut bomb).is_err());
    assert_eq!(
        journal.entries(),
        vec!["update", "AfterThrowing saw Some(\"boom\")"]
    );
}

#[test]
fn test_extend_runs_when_the_behaviour_faults() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Bomb, _>(bomb_symbol);
    let advice = journal.clone();
    runtime.register::<BombAdvice, _>(move || {
        advice_symbol::<BombAdvice, Bomb>(
            &advice,
            update(),
            &[AccessType::Extend, AccessType::After, AccessType::AfterThrowing],
        )
    });
    assert!(runtime.load_all().is_clean());

    let mut bomb = Bomb {
        journal: journal.clone(),
    };
    let err = runtime.dispatch(Behaviour::Update, &mut bomb).unwrap_err();

    assert_eq!(err.fault().to_string(), "boom");
    assert_eq!(journal.entries(), vec!["update", "Extend", "AfterThrowing"]);
}

#[test]
fn test_around_wraps_the_behaviour() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Player, _>(player_symbol);
    let seen = journal.clone();
    runtime.register::<PlayerAdvice, _>(move || {
        let seen = seen.clone();
        ClassSymbol::builder::<PlayerAdvice>()
            .static_class()
            .marker(DomainMarker::ASPECT)
            .method(
                MethodSymbol::function(
                    "around_update",
                    Invoker::advice(move |player: &mut Player, point: &JoinPoint<'_>| {
                        seen.record("enter");
                        let outcome = point.proceed(&mut *player);
                        seen.record(format!("exit hp={} ok={}", player.hp, outcome.is_ok()));
                        outcome
                    }),
                )
                .tag(AspectTag::new::<Player>(Behaviour::Update, AccessType::Around)),
            )
            .build()
    });
    assert!(runtime.load_all().is_clean());

    let mut player = Player::new(&journal);
    let delivery = runtime.dispatch(Behaviour::Update, &mut player).unwrap();

    assert_eq!(delivery, Delivery::Handled(2));
    assert_eq!(journal.entries(), vec!["enter", "update", "exit hp=10 ok=true"]);
}

#[test]
fn test_capability_advice_applies_to_implementors() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Player, _>(player_symbol);
    let living = journal.clone();
    runtime.register::<LivingAdvice, _>(move || {
        advice_symbol::<LivingAdvice, dyn Living>(&living, update(), &[AccessType::Before])
    });
    let own = journal.clone();
    runtime.register::<PlayerAdvice, _>(move || {
        advice_symbol::<PlayerAdvice, Player>(&own, update(), &[AccessType::Before])
    });
    assert!(runtime.load_all().is_clean());

    let mut player = Player::new(&journal);
    runtime.dispatch(Behaviour::Update, &mut player).unwrap();

    assert_eq!(journal.entries(), vec!["Before", "Before", "update"]);
    assert_eq!(
        runtime.symbols().applicable_types(TypeKey::of::<Player>()),
        vec![TypeKey::of::<Player>(), TypeKey::of::<dyn Living>()]
    );
}

#[test]
fn test_custom_method_is_woven_with_arguments() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    runtime.register::<Player, _>(player_symbol);
    let advice = journal.clone();
    runtime.register::<HealAdvice, _>(move || {
        advice_symbol::<HealAdvice, Player>(
            &advice,
            CutPoint::method("heal"),
            &[AccessType::Before, AccessType::After],
        )
    });
    assert!(runtime.load_all().is_clean());

    let mut player = Player::new(&journal);
    let delivery = runtime
        .call_function(&mut player, "heal", &[&5i32 as &dyn Any])
        .unwrap();

    assert_eq!(delivery, Delivery::Handled(3));
    assert_eq!(player.hp, 15);
    assert_eq!(journal.entries(), vec!["Before", "heal", "After"]);
}

#[test]
fn test_dispatch_without_method_or_advice_is_dropped() {
    struct Rock;

    let runtime = Runtime::new();
    let delivery = runtime.dispatch(Behaviour::Start, &mut Rock).unwrap();

    assert_eq!(delivery, Delivery::Dropped);
    assert_eq!(runtime.controllers().aspects.stats().dropped(), 1);
}
