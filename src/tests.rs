use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use tracing_subscriber::EnvFilter;

use super::*;

#[derive(Default)]
struct Person {
    name: String,
    age: u32,
    height: f64,
    active: bool,
    initial: char,
    address: Option<Shared<Address>>,
    friend: Option<Shared<Person>>,
}

#[derive(Default)]
struct Address {
    city: String,
    number: i64,
    zip: u16,
    owner: Option<Shared<Person>>,
}

struct Broken;

static TRACING: Lazy<()> = Lazy::new(|| {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
});

static TYPES: Lazy<Arc<TypeRegistry>> = Lazy::new(|| {
    let mut types = TypeRegistry::new();
    types.add(
        TypeDescriptor::<Person>::with_default("Person")
            .value("name", |p: &mut Person, v: String| p.name = v)
            .value("age", |p: &mut Person, v: u32| p.age = v)
            .value("height", |p: &mut Person, v: f64| p.height = v)
            .value("active", |p: &mut Person, v: bool| p.active = v)
            .value("initial", |p: &mut Person, v: char| p.initial = v)
            .reference("address", |p: &mut Person, a: Shared<Address>| p.address = Some(a))
            .reference("friend", |p: &mut Person, f: Shared<Person>| p.friend = Some(f)),
    );
    bean_type!(types, "Address" => Address {
        value city: String,
        value number: i64,
        value zip as "zipCode": u16,
        reference owner: Person,
    });
    types.add(TypeDescriptor::<Broken>::with_factory("Broken", || {
        Err("out of order".into())
    }));
    Arc::new(types)
});

fn context(definitions: Vec<BeanDefinition>) -> ApplicationContext {
    Lazy::force(&TRACING);
    ApplicationContext::new(TYPES.clone(), StaticDefinitionReader::new(definitions))
}

fn started(definitions: Vec<BeanDefinition>) -> ApplicationContext {
    let mut context = context(definitions);
    context.start().unwrap();
    context
}

fn build_error(definitions: Vec<BeanDefinition>) -> BuildError {
    match context(definitions).start() {
        Err(ContextError::Build(e)) => e,
        Err(e) => panic!("unexpected error: {e}"),
        Ok(()) => panic!("the build should fail"),
    }
}

fn person(id: &str) -> BeanDefinition {
    BeanDefinition::new(id, "Person")
}

#[test]
fn declared_beans_are_retrievable() {
    let context = started(vec![
        person("alice"),
        person("bob"),
        BeanDefinition::new("home", "Address"),
    ]);

    let mut ids = context.bean_ids().unwrap();
    ids.sort_unstable();
    assert_eq!(ids, ["alice", "bob", "home"]);

    assert!(context.get_bean("alice").unwrap().is::<Person>());
    assert!(context.get_bean("home").unwrap().is::<Address>());
    assert!(context.get_bean_as::<Address>("home").is_ok());
}

#[test]
fn literals_are_coerced_to_the_setter_type() {
    let context = started(vec![
        person("alice")
            .with_property("age", "42")
            .with_property("height", "1.68")
            .with_property("active", "true")
            .with_property("initial", "A"),
        BeanDefinition::new("home", "Address")
            .with_property("number", "-42")
            .with_property("zipCode", "42"),
    ]);

    let alice = context.get_bean_as::<Person>("alice").unwrap();
    let alice = alice.read();
    assert_eq!(alice.age, 42);
    assert_eq!(alice.height, 1.68);
    assert!(alice.active);
    assert_eq!(alice.initial, 'A');

    let home = context.get_bean_as::<Address>("home").unwrap();
    assert_eq!(home.read().number, -42);
    assert_eq!(home.read().zip, 42);
}

#[test]
fn text_literals_are_passed_unchanged() {
    let context = started(vec![
        person("alice").with_property("name", " 42 "),
        BeanDefinition::new("home", "Address").with_property("city", "Lyon"),
    ]);

    let alice = context.get_bean_as::<Person>("alice").unwrap();
    assert_eq!(alice.read().name, " 42 ");
    let home = context.get_bean_as::<Address>("home").unwrap();
    assert_eq!(home.read().city, "Lyon");
}

#[test]
fn invalid_literal_fails_the_build() {
    let err = build_error(vec![person("alice").with_property("age", "abc")]);
    match err {
        BuildError::PropertyCoercion { id, property, source } => {
            assert_eq!(id, "alice");
            assert_eq!(property, "age");
            assert_eq!(source.target, TypeTag::U32);
        }
        other => panic!("unexpected error: {other}"),
    }

    let err = build_error(vec![BeanDefinition::new("home", "Address").with_property("zipCode", "70000")]);
    assert!(matches!(err, BuildError::PropertyCoercion { .. }));
}

#[test]
fn references_share_the_registered_instance() {
    let context = started(vec![
        person("alice").with_reference("address", "home"),
        BeanDefinition::new("home", "Address").with_property("city", "Lyon"),
    ]);

    let alice = context.get_bean_as::<Person>("alice").unwrap();
    let home = context.get_bean_as::<Address>("home").unwrap();
    let injected = alice.read().address.clone().unwrap();
    assert!(Arc::ptr_eq(&injected, &home));
    assert_eq!(injected.read().city, "Lyon");
}

#[test]
fn cyclic_references_are_wired() {
    let context = started(vec![
        person("alice")
            .with_property("name", "Alice")
            .with_reference("address", "home")
            .with_reference("friend", "alice"),
        BeanDefinition::new("home", "Address").with_reference("owner", "alice"),
    ]);

    let alice = context.get_bean_as::<Person>("alice").unwrap();
    let alice_ref = alice.read();
    let friend = alice_ref.friend.as_ref().unwrap();
    assert!(Arc::ptr_eq(friend, &alice));

    let home = alice_ref.address.as_ref().unwrap();
    let owner = home.read().owner.clone().unwrap();
    assert!(Arc::ptr_eq(&owner, &alice));
}

#[test]
fn unresolved_reference_fails_the_build() {
    let mut context = context(vec![person("alice").with_reference("friend", "ghost")]);
    let err = context.start().unwrap_err();
    assert!(matches!(
        err,
        ContextError::Build(BuildError::UnresolvedReference { ref id, ref property, ref reference })
            if id == "alice" && property == "friend" && reference == "ghost"
    ));

    assert!(!context.is_started());
    assert!(matches!(context.get_bean("alice"), Err(ContextError::NotInitialized)));
}

#[test]
fn unknown_type_fails_the_build() {
    let err = build_error(vec![BeanDefinition::new("alice", "com.example.Person")]);
    assert!(matches!(
        err,
        BuildError::TypeResolution { ref type_name, .. } if type_name == "com.example.Person"
    ));
}

#[test]
fn failing_factory_fails_the_build() {
    let err = build_error(vec![person("alice"), BeanDefinition::new("broken", "Broken")]);
    match err {
        BuildError::Instantiation { id, source, .. } => {
            assert_eq!(id, "broken");
            assert_eq!(source.to_string(), "out of order");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mismatched_arguments_fail_the_build() {
    // A literal for a reference setter
    let err = build_error(vec![person("alice").with_property("friend", "bob")]);
    assert!(matches!(
        err,
        BuildError::Invocation { source: InvocationError::ArgumentMismatch { .. }, .. }
    ));

    // A reference to a bean of the wrong type
    let err = build_error(vec![
        person("alice").with_reference("address", "bob"),
        person("bob"),
    ]);
    match err {
        BuildError::Invocation { property, source, .. } => {
            assert_eq!(property, "address");
            assert!(matches!(source, InvocationError::ArgumentMismatch { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_setters_are_skipped_by_default() {
    let context = started(vec![
        person("alice")
            .with_property("nickname", "Al")
            .with_property("age", "7")
            .with_reference("spouse", "bob"),
        person("bob"),
    ]);

    let alice = context.get_bean_as::<Person>("alice").unwrap();
    assert_eq!(alice.read().age, 7);
}

#[test]
fn reference_without_setter_must_still_resolve() {
    let err = build_error(vec![person("alice").with_reference("spouse", "nobody")]);
    assert!(matches!(
        err,
        BuildError::UnresolvedReference { ref property, ref reference, .. }
            if property == "spouse" && reference == "nobody"
    ));
}

#[test]
fn strict_mode_rejects_missing_setters() {
    let mut context = context(vec![person("alice").with_property("nickname", "Al")])
        .with_config(ContainerConfig::strict());
    let err = context.start().unwrap_err();
    assert!(matches!(
        err,
        ContextError::Build(BuildError::MissingSetter { ref setter, .. }) if setter == "setNickname"
    ));
}

#[test]
fn duplicate_ids_keep_the_last_declaration() {
    let context = started(vec![
        person("x").with_property("age", "1"),
        BeanDefinition::new("x", "Address").with_property("city", "Lyon"),
    ]);

    assert_eq!(context.bean_ids().unwrap().len(), 1);
    let x = context.get_bean_as::<Address>("x").unwrap();
    assert_eq!(x.read().city, "Lyon");

    let mut strict = self::context(vec![person("x"), person("x")])
        .with_config(ContainerConfig::strict());
    assert!(matches!(
        strict.start(),
        Err(ContextError::Build(BuildError::DuplicateBean { ref id })) if id == "x"
    ));
}

#[test]
fn lookup_by_wrong_type_is_a_mismatch() {
    let context = started(vec![person("alice")]);

    assert!(context.get_bean("alice").is_ok());
    assert!(matches!(
        context.get_bean_as::<Address>("alice"),
        Err(ContextError::TypeMismatch { ref id, .. }) if id == "alice"
    ));
    assert!(matches!(
        context.get_bean("bob"),
        Err(ContextError::NotFound { ref id }) if id == "bob"
    ));
}

#[test]
fn lookups_fail_before_start() {
    let context = context(vec![person("alice")]);
    assert!(matches!(context.get_bean("alice"), Err(ContextError::NotInitialized)));
    assert!(matches!(
        context.get_bean_as::<Person>("alice"),
        Err(ContextError::NotInitialized)
    ));
    assert!(matches!(context.bean_ids(), Err(ContextError::NotInitialized)));
}

#[test]
fn new_instance_is_fresh_and_outside_the_registry() {
    let unstarted = context(vec![]);
    assert_eq!(unstarted.new_instance::<Person>().unwrap().age, 0);

    let context = started(vec![person("alice").with_property("age", "42")]);
    let mut first = context.new_instance::<Person>().unwrap();
    let second = context.new_instance::<Person>().unwrap();
    first.age = 9;
    assert_eq!(second.age, 0);

    assert_eq!(context.bean_ids().unwrap(), ["alice"]);
    let alice = context.get_bean_as::<Person>("alice").unwrap();
    assert_eq!(alice.read().age, 42);

    assert!(matches!(
        context.new_instance::<String>(),
        Err(ContextError::TypeNotRegistered { .. })
    ));
    assert!(matches!(
        context.new_instance::<Broken>(),
        Err(ContextError::Instantiation { .. })
    ));
}

struct CountingReader {
    calls: Arc<AtomicUsize>,
    definitions: Vec<BeanDefinition>,
}

impl BeanDefinitionReader for CountingReader {
    fn bean_definitions(&self) -> Result<Vec<BeanDefinition>, ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.definitions.clone())
    }
}

#[test]
fn restart_rebuilds_from_scratch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut context = context(vec![]);
    context.set_bean_definition_reader(CountingReader {
        calls: calls.clone(),
        definitions: vec![person("alice").with_property("age", "1"), person("bob")],
    });

    context.start().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    let before = context.get_bean_as::<Person>("alice").unwrap();
    before.write().age = 99;

    context.set_bean_definition_reader(StaticDefinitionReader::new(vec![
        person("alice").with_property("age", "2"),
    ]));
    context.start().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let after = context.get_bean_as::<Person>("alice").unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(after.read().age, 2);
    assert!(matches!(context.get_bean("bob"), Err(ContextError::NotFound { .. })));
}

#[test]
fn failed_restart_leaves_the_context_unstarted() {
    let mut context = started(vec![person("alice")]);
    context.set_bean_definition_reader(StaticDefinitionReader::new(vec![
        person("alice").with_property("age", "old"),
    ]));

    assert!(context.start().is_err());
    assert!(!context.is_started());
    assert!(matches!(context.get_bean("alice"), Err(ContextError::NotInitialized)));
}

#[test]
fn json_declarations() {
    Lazy::force(&TRACING);
    let reader = JsonDefinitionReader::new(
        r#"{ "beans": [
            { "id": "alice", "class": "Person",
              "properties": { "name": "Alice", "age": "42" },
              "references": { "address": "home" } },
            { "id": "home", "class": "Address",
              "properties": { "zipCode": "65001" } }
        ] }"#,
    );
    let context = ApplicationContext::started(TYPES.clone(), reader).unwrap();

    let alice = context.get_bean_as::<Person>("alice").unwrap();
    assert_eq!(alice.read().name, "Alice");
    assert_eq!(alice.read().age, 42);
    let home = alice.read().address.clone().unwrap();
    assert_eq!(home.read().zip, 65001);

    let bare = JsonDefinitionReader::new(r#"[{ "id": "bob", "class": "Person" }]"#);
    assert_eq!(bare.bean_definitions().unwrap(), vec![person("bob")]);

    let mut broken = ApplicationContext::new(TYPES.clone(), JsonDefinitionReader::new("{ beans"));
    assert!(matches!(broken.start(), Err(ContextError::Read(_))));
}

#[test]
fn started_context_is_shared_between_threads() {
    let context = started(vec![
        person("alice").with_reference("address", "home"),
        BeanDefinition::new("home", "Address"),
    ]);

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let alice = context.get_bean_as::<Person>("alice").unwrap();
                let home = context.get_bean_as::<Address>("home").unwrap();
                assert!(Arc::ptr_eq(alice.read().address.as_ref().unwrap(), &home));
            });
        }
    });
}

#[test]
fn graph_builder_alone() {
    let types = TYPES.clone();
    let builder = GraphBuilder::new(&types, ContainerConfig::default());
    let registry = builder
        .build(&[person("alice"), BeanDefinition::new("home", "Address")])
        .unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(registry.get("home").unwrap().id, "home");
    assert!(registry.get("ghost").is_none());
}
