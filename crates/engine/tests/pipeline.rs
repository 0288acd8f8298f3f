//! Integration tests for the invocation pipeline.
//!
//! These tests configure whole contracts with the standard collaborators and
//! drive them through `Missive::invoke`, checking what reaches the template
//! source, the composer and the sender.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use missive_core::{
    Arguments, BoxError, ConfigError, ContractDescriptor, Error, MethodDescriptor, MissingTemplate,
    ParamDescriptor, ReplacementMap, ResolutionOutcome, ResolveContext, Returns, TypeGraph, TypeKey,
    Typed, Value, VariableResolver,
};
use missive_engine::{InterfacesFirst, Missive, Reply, SuperclassFirst};
use missive_standard::{
    Catalog, CollectingSender, FixedViewerLocator, MarkedParameterLocator, StringComposer,
    VIEWER_MARKER, identity_resolver, typed_resolver,
};

type Notices = Missive<String, String, String, String>;

const NOTICE: &str = "Pling! You have a new mail from %author%! Title: %title%. Body: %body%";

// ── Fixtures ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Mail {
    author: String,
    title: String,
    body: String,
}

impl Typed for Mail {
    fn type_key() -> TypeKey {
        TypeKey::from_static("mail")
    }
}

fn mail() -> Mail {
    Mail {
        author: "Ada".into(),
        title: "Engines".into(),
        body: "Numbers all the way down".into(),
    }
}

fn mail_params(method: MethodDescriptor) -> MethodDescriptor {
    method
        .param(ParamDescriptor::new("to", "string").marker(VIEWER_MARKER))
        .param(ParamDescriptor::new("mail", "mail").template())
}

fn notices() -> ContractDescriptor {
    ContractDescriptor::new("Notices")
        .method(mail_params(MethodDescriptor::new("notify").key("notice")))
        .method(mail_params(
            MethodDescriptor::new("preview")
                .key("notice")
                .returns(Returns::Message),
        ))
        .method(MethodDescriptor::new("configuration").returns(Returns::Configuration))
}

/// Splits a mail into three string continuations.
fn mail_resolver() -> impl VariableResolver<String, String> {
    typed_resolver(|_name: &str, mail: &Mail, _cx: &ResolveContext<'_, String>| {
        Ok(Some(
            ResolutionOutcome::new()
                .continue_typed("author", mail.author.clone())
                .continue_typed("title", mail.title.clone())
                .continue_typed("body", mail.body.clone()),
        ))
    })
}

fn catalog() -> Catalog<String> {
    Catalog::new()
        .with_template("notice", NOTICE)
        .with_viewer_template("pirate".to_string(), "notice", "Ahoy! %author% sent ye '%title%'")
}

fn notices_with(sender: &CollectingSender<String, String>) -> Notices {
    Notices::builder(notices())
        .locator_resolver(10, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(sender.clone())
        .resolver("mail", 0, mail_resolver())
        .resolver("string", i32::MIN, identity_resolver::<String, String>())
        .freeze()
        .unwrap()
}

fn notify_args(viewer: &str) -> Arguments {
    Arguments::new().with(viewer).with(mail())
}

// ── End-to-end: mail notice ──────────────────────────────────────────────

#[test]
fn e2e_notify_sends_the_composed_mail_notice() {
    let sender = CollectingSender::new();
    let missive = notices_with(&sender);

    let reply = missive.invoke("notify", notify_args("ada")).unwrap();

    assert!(reply.is_sent());
    assert_eq!(
        sender.deliveries(),
        [(
            "ada".to_string(),
            "Pling! You have a new mail from Ada! Title: Engines. Body: Numbers all the way down"
                .to_string()
        )]
    );
}

#[test]
fn e2e_viewer_specific_template_is_used() {
    let sender = CollectingSender::new();
    let missive = notices_with(&sender);

    missive.invoke("notify", notify_args("pirate")).unwrap();
    assert_eq!(sender.messages(), ["Ahoy! Ada sent ye 'Engines'"]);
}

#[test]
fn e2e_message_returning_method_does_not_send() {
    let sender = CollectingSender::new();
    let missive = notices_with(&sender);

    let message = missive
        .invoke("preview", notify_args("ada"))
        .unwrap()
        .into_message()
        .unwrap();

    assert!(message.starts_with("Pling! You have a new mail from Ada!"));
    assert!(sender.is_empty());
}

#[test]
fn e2e_render_and_send_adapters() {
    let sender = CollectingSender::new();
    let missive = notices_with(&sender);

    let rendered = missive.render("notify", notify_args("ada")).unwrap();
    assert!(sender.is_empty());

    missive.send("preview", notify_args("ada")).unwrap();
    assert_eq!(sender.messages(), [rendered]);
}

#[test]
fn e2e_prepare_exposes_the_replacement_map() {
    let missive = notices_with(&CollectingSender::new());

    let prepared = missive.prepare("notify", &notify_args("ada")).unwrap();
    assert_eq!(prepared.viewer, "ada");
    assert_eq!(prepared.template, NOTICE);

    let names: Vec<_> = prepared.replacements.keys().map(String::as_str).collect();
    assert_eq!(names, ["author", "title", "body"]);
    assert_eq!(prepared.replacements["author"], "Ada");
}

#[test]
fn e2e_repeated_calls_resolve_identically() {
    let missive = notices_with(&CollectingSender::new());

    let first = missive.prepare("notify", &notify_args("ada")).unwrap();
    let second = missive.prepare("notify", &notify_args("ada")).unwrap();
    assert_eq!(first.replacements, second.replacements);
}

// ── Configuration methods and identity ───────────────────────────────────

#[test]
fn configuration_method_returns_the_frozen_configuration() {
    let missive = notices_with(&CollectingSender::new());

    let configuration = missive
        .invoke("configuration", Arguments::new())
        .unwrap()
        .into_configuration()
        .unwrap();

    assert!(Arc::ptr_eq(&configuration, missive.configuration()));
    assert!(missive == *configuration);
    assert_eq!(configuration.bound("notify").unwrap().message_key, "notice");
    assert!(configuration.bound("configuration").is_none());
}

#[test]
fn handles_compare_by_configuration_identity() {
    let sender = CollectingSender::new();
    let first = notices_with(&sender);
    let again = first.clone();
    let other = notices_with(&sender);

    assert_eq!(first, again);
    assert_ne!(first, other);

    let label = first.to_string();
    assert!(label.starts_with("Notices@"));
    assert_eq!(label, again.to_string());
    assert_ne!(label, other.to_string());

    let set: HashSet<_> = [first.clone(), again, other].into_iter().collect();
    assert_eq!(set.len(), 2);
}

// ── Default methods ──────────────────────────────────────────────────────

type Defaults = Missive<(), String, String, String>;

#[test]
fn default_methods_delegate_to_templated_methods() {
    let keys = Arc::new(Mutex::new(Vec::new()));
    let sender = CollectingSender::new();

    let contract = ContractDescriptor::new("DefaultMethods")
        .method(
            MethodDescriptor::new("method")
                .key("test")
                .param(ParamDescriptor::new("value", "string").template()),
        )
        .method(MethodDescriptor::new("empty").with_default_body())
        .method(
            MethodDescriptor::new("with_parameter")
                .with_default_body()
                .param(ParamDescriptor::new("value", "string")),
        );

    let seen = Arc::clone(&keys);
    let missive = Defaults::builder(contract)
        .locator_resolver(0, FixedViewerLocator::new(()))
        .template_source(move |_: &(), key: &str| -> Result<String, MissingTemplate> {
            seen.lock().unwrap().push(key.to_string());
            Ok("Hello, %value%!".to_string())
        })
        .composer(StringComposer::new())
        .sender(sender.clone())
        .resolver("string", 1, identity_resolver::<(), String>())
        .default_body("empty", |missive: &Defaults, _args: &Arguments| {
            missive.invoke("method", Arguments::new().with("placeholder value"))
        })
        .default_body("with_parameter", |missive: &Defaults, args: &Arguments| {
            missive.invoke("method", args.clone())
        })
        .freeze()
        .unwrap();

    assert!(missive.invoke("empty", Arguments::new()).unwrap().is_sent());
    assert!(
        missive
            .invoke("with_parameter", Arguments::new().with("you"))
            .unwrap()
            .is_sent()
    );

    assert_eq!(*keys.lock().unwrap(), ["test", "test"]);
    assert_eq!(sender.messages(), ["Hello, placeholder value!", "Hello, you!"]);
    assert_eq!(missive.configuration().default_methods(), ["empty", "with_parameter"]);
}

#[test]
fn empty_contract_freezes() {
    let missive = Defaults::builder(ContractDescriptor::new("Empty"))
        .locator_resolver(2, FixedViewerLocator::new(()))
        .template_source(|_: &(), _: &str| -> Result<String, MissingTemplate> { Ok(String::new()) })
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .freeze()
        .unwrap();

    assert_eq!(missive.configuration().bound_methods().count(), 0);
}

#[test]
fn composer_receives_an_empty_map_without_template_arguments() {
    let received: Arc<Mutex<Vec<ReplacementMap<String>>>> = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&received);
    let contract = ContractDescriptor::new("Greetings").method(
        MethodDescriptor::new("greet")
            .key("greeting")
            .param(ParamDescriptor::new("to", "string"))
            .returns(Returns::Message),
    );
    let missive = Notices::builder(contract)
        .locator_resolver(0, FixedViewerLocator::new("ada".to_string()))
        .template_source(Catalog::new().with_template("greeting", "Hello!"))
        .composer(
            move |_: &String, template: &String, map: &ReplacementMap<String>, _: &MethodDescriptor, _: &TypeKey| {
                log.lock().unwrap().push(map.clone());
                template.clone()
            },
        )
        .sender(CollectingSender::new())
        .freeze()
        .unwrap();

    let message = missive.render("greet", Arguments::new().with("grace")).unwrap();

    assert_eq!(message, "Hello!");
    let received = received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert!(received[0].is_empty());
}

// ── Per-call failures ────────────────────────────────────────────────────

#[test]
fn unresolved_placeholder_aborts_before_composition() {
    let composed = Arc::new(AtomicUsize::new(0));
    let sender = CollectingSender::new();

    let counter = Arc::clone(&composed);
    let missive = Notices::builder(notices())
        .locator_resolver(0, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(
            move |_: &String, template: &String, _: &ReplacementMap<String>, _: &MethodDescriptor, _: &TypeKey| {
                counter.fetch_add(1, Ordering::SeqCst);
                template.clone()
            },
        )
        .sender(sender.clone())
        .freeze()
        .unwrap();

    let err = missive.invoke("notify", notify_args("ada")).unwrap_err();
    match err {
        Error::Unresolved { placeholder, value, .. } => {
            assert_eq!(placeholder, "mail");
            assert!(value.contains("Ada"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(composed.load(Ordering::SeqCst), 0);
    assert!(sender.is_empty());
}

#[test]
fn failed_calls_leave_the_instance_usable() {
    let sender = CollectingSender::new();
    let missive = notices_with(&sender);

    let err = missive
        .invoke("notify", Arguments::new().with_null().with(mail()))
        .unwrap_err();
    assert!(matches!(err, Error::ViewerNotFound { .. }));

    let err = missive.invoke("notify", Arguments::new().with(3_i64).with(mail())).unwrap_err();
    assert!(matches!(err, Error::ViewerNotFound { .. }));

    missive.invoke("notify", notify_args("ada")).unwrap();
    assert_eq!(sender.len(), 1);
}

#[test]
fn missing_template_is_a_per_call_error() {
    let missive = Notices::builder(notices())
        .locator_resolver(0, MarkedParameterLocator::new())
        .template_source(Catalog::new().with_viewer_template("pirate".to_string(), "notice", "Ahoy"))
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .resolver("mail", 0, mail_resolver())
        .resolver("string", 0, identity_resolver::<String, String>())
        .freeze()
        .unwrap();

    let err = missive.invoke("notify", notify_args("ada")).unwrap_err();
    match err {
        Error::MissingTemplate { source, .. } => assert_eq!(source.key, "notice"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(missive.invoke("notify", notify_args("pirate")).is_ok());
}

#[test]
fn unknown_method_is_unmapped() {
    let missive = notices_with(&CollectingSender::new());
    let err = missive.invoke("shout", Arguments::new()).unwrap_err();
    assert!(matches!(err, Error::UnmappedMethod { method, .. } if method == "shout"));

    let err = missive.render("configuration", Arguments::new()).unwrap_err();
    assert!(matches!(err, Error::UnmappedMethod { .. }));
}

#[test]
fn sender_errors_surface_unmodified() {
    let missive = Notices::builder(notices())
        .locator_resolver(0, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(|_: &String, _: String| -> Result<(), BoxError> {
            Err(std::io::Error::other("mailbox full").into())
        })
        .resolver("mail", 0, mail_resolver())
        .resolver("string", 0, identity_resolver::<String, String>())
        .freeze()
        .unwrap();

    let err = missive.invoke("notify", notify_args("ada")).unwrap_err();
    assert!(matches!(err, Error::Collaborator(_)));
    assert_eq!(err.to_string(), "mailbox full");
}

// ── Configuration failures ───────────────────────────────────────────────

#[test]
fn missing_message_key_aborts_freeze() {
    let contract = ContractDescriptor::new("Broken").method(MethodDescriptor::new("notify"));
    let err = Notices::builder(contract)
        .locator_resolver(0, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .freeze()
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Config(ConfigError::MissingMessageKey { method, .. }) if method == "notify"
    ));
}

#[test]
fn method_without_viewer_parameter_needs_a_fallback_locator() {
    let contract = ContractDescriptor::new("Broadcasts")
        .method(MethodDescriptor::new("announce").key("announce"));

    let err = Notices::builder(contract.clone())
        .locator_resolver(10, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .freeze()
        .unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::NoViewerLocator { .. })));

    let missive = Notices::builder(contract)
        .locator_resolver(10, MarkedParameterLocator::new())
        .locator_resolver(-1, FixedViewerLocator::new("everyone".to_string()))
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .freeze()
        .unwrap();
    assert_eq!(missive.configuration().bound("announce").unwrap().locator_priority, -1);
}

#[test]
fn missing_collaborators_abort_freeze() {
    let err = Notices::builder(notices())
        .locator_resolver(0, MarkedParameterLocator::new())
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .freeze()
        .unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::MissingComponent("template source"))));
}

#[test]
fn duplicate_registration_is_reported_at_freeze() {
    let resolver: Arc<dyn VariableResolver<String, String>> = Arc::new(identity_resolver::<String, String>());
    let err = Notices::builder(notices())
        .locator_resolver(0, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .resolver_arc("string", 5, Arc::clone(&resolver))
        .resolver_arc("string", 5, resolver)
        .freeze()
        .unwrap_err();
    assert!(matches!(err, Error::Config(ConfigError::DuplicateEntry { priority: 5 })));
}

#[test]
fn distinct_resolvers_at_equal_priority_are_both_kept() {
    let missive = Notices::builder(notices())
        .locator_resolver(0, MarkedParameterLocator::new())
        .template_source(catalog())
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .resolver("string", 5, identity_resolver::<String, String>())
        .resolver("string", 5, identity_resolver::<String, String>())
        .freeze()
        .unwrap();

    let string = TypeKey::from_static("string");
    assert_eq!(missive.configuration().resolvers().entries_for(&string).count(), 2);
}

// ── Supertype policy ─────────────────────────────────────────────────────

fn policy_missive(strategy: impl missive_core::SupertypeStrategy + 'static) -> Notices {
    let conclude = |text: &'static str| {
        move |name: &str, _: &Value, _: &ResolveContext<'_, String>| -> Result<Option<ResolutionOutcome<String>>, BoxError> {
            Ok(Some(ResolutionOutcome::new().conclude(name, text.to_string())))
        }
    };

    let contract = ContractDescriptor::new("Letters").method(
        MethodDescriptor::new("deliver")
            .key("letter")
            .returns(Returns::Message)
            .param(ParamDescriptor::new("letter", "message").template()),
    );

    Notices::builder(contract)
        .locator_resolver(0, FixedViewerLocator::new("ada".to_string()))
        .template_source(Catalog::new().with_template("letter", "%letter%"))
        .composer(StringComposer::new())
        .sender(CollectingSender::new())
        .supertypes(strategy)
        .resolver("message", 0, conclude("via superclass"))
        .resolver("examinable", 0, conclude("via interface"))
        .freeze()
        .unwrap()
}

#[test]
fn supertype_policy_decides_the_fallback() {
    let mut graph = TypeGraph::new();
    graph
        .declare("email", Some(TypeKey::from_static("message")), [TypeKey::from_static("examinable")])
        .unwrap();
    let graph = Arc::new(graph);
    let email = || Arguments::new().with(Value::tagged("email", ()));

    let superclass_first = policy_missive(SuperclassFirst::new(Arc::clone(&graph)));
    let interfaces_first = policy_missive(InterfacesFirst::new(graph));

    assert_eq!(superclass_first.render("deliver", email()).unwrap(), "via superclass");
    assert_eq!(interfaces_first.render("deliver", email()).unwrap(), "via interface");
}

// ── Concurrency ──────────────────────────────────────────────────────────

#[test]
fn concurrent_invocations_are_independent() {
    let sender = CollectingSender::new();
    let missive = notices_with(&sender);

    std::thread::scope(|scope| {
        for i in 0..8 {
            let missive = &missive;
            scope.spawn(move || {
                for _ in 0..25 {
                    let viewer = format!("viewer-{i}");
                    missive.invoke("notify", notify_args(&viewer)).unwrap();
                }
            });
        }
    });

    let deliveries = sender.deliveries();
    assert_eq!(deliveries.len(), 200);
    assert!(deliveries.iter().all(|(_, m)| m.contains("from Ada!")));
}
