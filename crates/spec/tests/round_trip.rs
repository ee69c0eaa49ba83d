use oasgen_har::{Content, Entry, Header, Peer, Request, Response, TaggedEntry};
use oasgen_spec::{GeneratorConfig, Method, OpenApi, SpecGenerator};
use pretty_assertions::assert_eq;

fn entry(method: &str, url: &str, status: i64, second: u32) -> TaggedEntry {
    TaggedEntry::new(Entry {
        started_date_time: format!("2021-02-03T07:48:{second:02}.500+00:00"),
        time: 12.0,
        request: Request {
            method: method.to_string(),
            url: url.to_string(),
            headers: vec![Header::new("X-Client", "web")],
            ..Request::default()
        },
        response: Response {
            status,
            headers: vec![Header::new("X-Page", "1")],
            content: Content {
                size: 8,
                mime_type: "application/json".to_string(),
                encoding: None,
                text: Some(r#"{"n":1}"#.to_string()),
            },
            ..Response::default()
        },
    })
    .with_source(Peer::address("10.0.0.1", "5432"))
    .with_sample_id(format!("{second:024}"))
}

fn populated() -> SpecGenerator {
    let generator = SpecGenerator::with_config(
        "http://svc",
        GeneratorConfig {
            compaction_min_siblings: 3,
            ..GeneratorConfig::default()
        },
    );
    let feed = [
        ("GET", "http://svc/users/alice", 200),
        ("GET", "http://svc/users/bob", 200),
        ("GET", "http://svc/users/carol?verbose=1", 200),
        ("GET", "http://svc/users/carol", 404),
        ("POST", "http://svc/users", 201),
        ("GET", "http://svc/orders/550e8400-e29b-41d4-a716-446655440000", 200),
        ("GET", "http://svc/health", 200),
    ];
    for (second, (method, url, status)) in (1u32..).zip(feed) {
        generator.feed_entry(&entry(method, url, status, second));
    }
    generator
}

fn without_last_seen(mut spec: OpenApi) -> OpenApi {
    for item in spec.paths.values_mut() {
        for (_, op) in item.operations_mut() {
            op.last_seen_ts = 0.0;
        }
    }
    spec
}

#[test]
fn reloaded_spec_matches_original() {
    let original = populated().get_spec().unwrap();
    assert!(original.paths.contains_key("/users/{p1}"));

    let reloaded = SpecGenerator::new("http://svc");
    reloaded.load_from_spec(original.clone());
    let again = reloaded.get_spec().unwrap();

    assert_eq!(without_last_seen(again.clone()), without_last_seen(original));
    for (_, _, op) in again.operations() {
        assert_eq!(op.last_seen_ts, 0.0);
    }
}

#[test]
fn reloaded_generator_keeps_counting() {
    let original = populated().get_spec().unwrap();
    let before = original.paths["/health"]
        .operation(Method::Get)
        .unwrap()
        .clone();

    let reloaded = SpecGenerator::new("http://svc");
    reloaded.load_from_spec(original);
    assert!(reloaded.has_content());
    assert_eq!(reloaded.admitted_entries(), 0);

    let id = reloaded.feed_entry(&entry("GET", "http://svc/health", 200, 59));
    assert_eq!(id.as_deref(), Some(before.operation_id.as_str()));

    let spec = reloaded.get_spec().unwrap();
    let after = spec.paths["/health"].operation(Method::Get).unwrap();
    assert_eq!(after.counters_total.entries, before.counters_total.entries + 1);
    // Gap restarts after a reload.
    assert_eq!(
        after.counters_total.sum_duration,
        before.counters_total.sum_duration
    );
}

#[test]
fn reload_keeps_declared_parameter_names() {
    let spec: OpenApi = serde_json::from_value(serde_json::json!({
        "openapi": "3.1.0",
        "info": {"title": "petstore", "version": "1.0.0", "description": "Pets"},
        "paths": {
            "/pets/{petId}": {
                "parameters": [{"name": "petId", "in": "path", "required": true}],
                "get": {"operationId": "showPet", "responses": {}}
            }
        }
    }))
    .unwrap();

    let generator = SpecGenerator::new("http://petstore");
    generator.load_from_spec(spec);
    let id = generator.feed_entry(&entry("GET", "http://petstore/pets/1554507871", 200, 1));
    assert_eq!(id.as_deref(), Some("showPet"));

    let spec = generator.get_spec().unwrap();
    assert_eq!(spec.info.title, "petstore");
    assert_eq!(spec.info.description.as_deref(), Some("Pets"));
    let item = &spec.paths["/pets/{petId}"];
    assert_eq!(item.parameters[0].name, "petId");
    assert_eq!(item.parameters[0].examples.len(), 1);
}
