//! Scanning, reloading and unloading through the runtime.

use std::sync::{Arc, Mutex};
use weft::{
    ApiTag, ClassSymbol, Delivery, DomainMarker, EventTag, Invoker, LoadError, MessageTag,
    MethodSymbol, Runtime, RuntimeConfig, ScanError, TypeKey,
    code_info::{CodeInfo, MessageKey},
    testing::Journal,
};

mod common;
use common::{Damage, event_symbol, message_symbol};

struct NetHandlers;
struct GameEvents;
struct Broken;

const NOTES: DomainMarker = DomainMarker::new("notes");

fn opcodes(info: &CodeInfo) -> Vec<u32> {
    let CodeInfo::Message(info) = info else {
        panic!("expected message code info, got {info:?}");
    };
    info.keys()
        .filter_map(|key| match key {
            MessageKey::Opcode(opcode) => Some(*opcode),
            MessageKey::Type(_) => None,
        })
        .collect()
}

#[test]
fn test_lookup_returns_declared_bindings() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    let handlers = journal.clone();
    runtime.register::<NetHandlers, _>(move || message_symbol::<NetHandlers>(&handlers, &[1, 2]));
    assert!(runtime.load_all().is_clean());

    let ty = TypeKey::of::<NetHandlers>();
    let info = runtime.lookup(DomainMarker::MESSAGE, ty).unwrap();
    assert_eq!(opcodes(&info), vec![1, 2]);
    assert!(runtime.lookup(DomainMarker::EVENT, ty).is_none());
    assert_eq!(runtime.loader().loaded_domains(ty), &[DomainMarker::MESSAGE]);
}

#[test]
fn test_reload_replaces_keys() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    let handlers = journal.clone();
    runtime.register::<NetHandlers, _>(move || message_symbol::<NetHandlers>(&handlers, &[1, 2]));
    assert!(runtime.load_all().is_clean());

    let handlers = journal.clone();
    let report = runtime
        .replace::<NetHandlers, _>(move || message_symbol::<NetHandlers>(&handlers, &[2, 3]));
    assert!(report.is_clean());

    assert_eq!(runtime.send_message(1, &()).unwrap(), Delivery::Dropped);
    assert_eq!(runtime.send_message(2, &()).unwrap(), Delivery::Handled(1));
    assert_eq!(runtime.send_message(3, &()).unwrap(), Delivery::Handled(1));
    assert_eq!(runtime.controllers().messages.table().len(), 2);

    let info = runtime
        .lookup(DomainMarker::MESSAGE, TypeKey::of::<NetHandlers>())
        .unwrap();
    assert_eq!(opcodes(&info), vec![2, 3]);
}

#[test]
fn test_reload_unloads_dropped_markers() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    let handlers = journal.clone();
    runtime.register::<GameEvents, _>(move || event_symbol::<GameEvents>(&handlers));
    assert!(runtime.load_all().is_clean());
    assert!(runtime.publish_event(1, &()).unwrap().is_handled());

    let report = runtime.replace::<GameEvents, _>(|| ClassSymbol::builder::<GameEvents>().build());
    assert!(report.is_clean());

    assert_eq!(runtime.publish_event(1, &()).unwrap(), Delivery::Dropped);
    assert!(runtime.controllers().events.table().is_empty());
    assert!(!runtime.loader().is_loaded(TypeKey::of::<GameEvents>(), DomainMarker::EVENT));
}

#[test]
fn test_rejected_reload_leaves_the_type_unloaded() {
    struct Commands;
    struct Tools;

    fn exports<T: 'static>(name: &'static str) -> ClassSymbol {
        ClassSymbol::builder::<T>()
            .static_class()
            .marker(DomainMarker::API)
            .method(MethodSymbol::function(name, Invoker::function(|| ())).tag(ApiTag::default()))
            .build()
    }

    let mut runtime = Runtime::new();
    runtime.register::<Commands, _>(|| exports::<Commands>("spawn"));
    runtime.register::<Tools, _>(|| exports::<Tools>("reset"));
    assert!(runtime.load_all().is_clean());

    let tools = TypeKey::of::<Tools>();
    let report = runtime.replace::<Tools, _>(|| exports::<Tools>("spawn"));
    assert!(matches!(report.failures[0].error, LoadError::Rejected { .. }));

    assert!(!runtime.loader().is_loaded(tools, DomainMarker::API));
    assert!(runtime.lookup(DomainMarker::API, tools).is_none());
    assert_eq!(runtime.call_api("reset", &[]).unwrap(), Delivery::Dropped);
    assert!(runtime.call_api("spawn", &[]).unwrap().is_handled());
}

#[test]
fn test_duplicate_load_is_rejected_and_first_kept() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    let handlers = journal.clone();
    runtime.register::<NetHandlers, _>(move || message_symbol::<NetHandlers>(&handlers, &[1]));
    let ty = TypeKey::of::<NetHandlers>();
    assert!(runtime.scan_and_load([ty]).is_clean());

    let report = runtime.scan_and_load([ty]);
    assert_eq!(report.failures.len(), 1);
    assert!(matches!(
        report.failures[0].error,
        LoadError::Duplicate {
            domain: DomainMarker::MESSAGE,
            ..
        }
    ));

    assert_eq!(runtime.send_message(1, &()).unwrap(), Delivery::Handled(1));
    assert_eq!(journal.entries(), vec!["message"]);
}

#[test]
fn test_scan_continues_past_a_bad_type() {
    let journal = Journal::new();
    let mut runtime = Runtime::with_config(RuntimeConfig::default().with_strict_scan(true));
    runtime.register::<Broken, _>(|| {
        ClassSymbol::builder::<Broken>()
            .marker(DomainMarker::EVENT)
            .method(
                MethodSymbol::instance("on_event", Invoker::function(|| ()))
                    .tag(EventTag::id(5)),
            )
            .build()
    });
    let handlers = journal.clone();
    runtime.register::<GameEvents, _>(move || event_symbol::<GameEvents>(&handlers));

    let report = runtime.load_all();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].ty, TypeKey::of::<Broken>());
    assert!(matches!(
        report.failures[0].error,
        LoadError::Scan(ScanError::NotStatic { .. })
    ));
    assert_eq!(report.loaded, vec![(TypeKey::of::<GameEvents>(), DomainMarker::EVENT)]);

    assert_eq!(runtime.publish_event(5, &()).unwrap(), Delivery::Dropped);
    runtime.publish(&Damage { amount: 3 }).unwrap();
    assert_eq!(journal.entries(), vec!["damage 3"]);
}

#[test]
fn test_lenient_scan_skips_only_the_bad_method() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    let good = journal.recorder("good");
    runtime.register::<Broken, _>(move || {
        ClassSymbol::builder::<Broken>()
            .marker(DomainMarker::MESSAGE)
            .method(
                MethodSymbol::instance("on_bad", Invoker::function(|| ()))
                    .tag(MessageTag::opcode(1)),
            )
            .method(MethodSymbol::function("on_good", good.clone()).tag(MessageTag::opcode(2)))
            .build()
    });
    assert!(runtime.load_all().is_clean());

    assert_eq!(runtime.send_message(1, &()).unwrap(), Delivery::Dropped);
    assert_eq!(runtime.send_message(2, &()).unwrap(), Delivery::Handled(1));
    assert_eq!(journal.entries(), vec!["good"]);
}

#[test]
fn test_missing_domain_and_unknown_type_are_reported() {
    struct Annotated;
    struct Unregistered;

    let mut runtime = Runtime::new();
    runtime.register::<Annotated, _>(|| ClassSymbol::builder::<Annotated>().marker(NOTES).build());

    let report = runtime.scan_and_load([TypeKey::of::<Annotated>(), TypeKey::of::<Unregistered>()]);
    let errors: Vec<_> = report.failures.iter().map(|f| f.error.clone()).collect();
    assert_eq!(
        errors,
        vec![
            LoadError::MissingDomain(NOTES),
            LoadError::UnknownType(TypeKey::of::<Unregistered>().name()),
        ]
    );
}

#[test]
fn test_custom_domain_from_callbacks() {
    struct Annotated;

    let loaded = Arc::new(Mutex::new(Vec::new()));
    let mut runtime = Runtime::new();
    let sink = loaded.clone();
    runtime
        .register_callbacks(
            NOTES,
            move |_, symbol, reload| {
                sink.lock().unwrap().push((symbol.key(), reload));
                Ok(())
            },
            |_| {},
            |symbol| Some(CodeInfo::Custom(Arc::new(symbol.key().short_name()))),
        )
        .unwrap();
    assert!(matches!(
        runtime.register_callbacks(NOTES, |_, _, _| Ok(()), |_| {}, |_| None),
        Err(LoadError::DomainExists(NOTES))
    ));

    runtime.register::<Annotated, _>(|| ClassSymbol::builder::<Annotated>().marker(NOTES).build());
    assert!(runtime.load_all().is_clean());
    assert!(runtime.reload(TypeKey::of::<Annotated>()).is_clean());

    let ty = TypeKey::of::<Annotated>();
    assert_eq!(*loaded.lock().unwrap(), vec![(ty, false), (ty, true)]);
    let info = runtime.lookup(NOTES, ty).unwrap();
    assert_eq!(info.custom::<&'static str>(), Some(&"Annotated"));
}

#[test]
fn test_unload_removes_every_binding() {
    let journal = Journal::new();
    let mut runtime = Runtime::new();
    let handlers = journal.clone();
    runtime.register::<GameEvents, _>(move || event_symbol::<GameEvents>(&handlers));
    assert!(runtime.load_all().is_clean());

    assert_eq!(runtime.unload(TypeKey::of::<GameEvents>()), 1);
    assert_eq!(runtime.unload(TypeKey::of::<GameEvents>()), 0);
    assert_eq!(runtime.publish_event(1, &()).unwrap(), Delivery::Dropped);
    assert!(runtime.lookup(DomainMarker::EVENT, TypeKey::of::<GameEvents>()).is_none());

    // Reloadable after an unload.
    assert!(runtime.scan_and_load([TypeKey::of::<GameEvents>()]).is_clean());
    assert!(runtime.publish_event(1, &()).unwrap().is_handled());
}

#[test]
fn test_unload_all_on_an_empty_runtime() {
    let mut runtime = Runtime::new();
    runtime.unload_all();
    assert!(runtime.controllers().events.table().is_empty());
    assert_eq!(
        runtime.loader().domains().collect::<Vec<_>>(),
        vec![
            DomainMarker::ASPECT,
            DomainMarker::EVENT,
            DomainMarker::MESSAGE,
            DomainMarker::INPUT,
            DomainMarker::INJECT,
            DomainMarker::POOL,
            DomainMarker::API,
        ]
    );
}
