use std::sync::Arc;

use gqlbind::Arguments;
use gqlbind::Context;
use gqlbind::Engine;
use gqlbind::EngineOptions;
use gqlbind::FieldDecl;
use gqlbind::FieldNaming;
use gqlbind::Fields;
use gqlbind::Object;
use gqlbind::OperationType;
use gqlbind::ResolveParams;
use gqlbind::json_ext::Value;
use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde::Serialize;
use serde_json_bytes::json;
use test_log::test;

use crate::common::Author;
use crate::common::Book;
use crate::common::Locale;
use crate::common::Viewer;
use crate::common::catalog;
use crate::common::library;
use crate::common::with_args;

#[test]
fn a_returned_error_drops_the_value_and_the_context_mutation() {
    let schema = library(EngineOptions::default()).build().unwrap();
    let resolver = schema.mutation_resolver("signIn").unwrap();

    let resolved = resolver.resolve(with_args(json!({
        "name": "ann",
        "password": "open sesame"
    })));
    assert_eq!(resolved.value, json!("welcome ann"));
    assert_eq!(
        resolved.context.get::<Viewer>(),
        Some(Viewer {
            name: "ann".to_string()
        })
    );
    assert!(resolved.error.is_none());

    let resolved = resolver.resolve(with_args(json!({
        "name": "ann",
        "password": "guess"
    })));
    assert_eq!(resolved.value, Value::Null);
    assert!(!resolved.context.contains::<Viewer>());
    let error = resolved.error.unwrap();
    assert_eq!(error.message, "wrong password");
    assert_eq!(error.code(), Some("UNAUTHENTICATED"));
}

#[test]
fn result_errors_are_field_errors() {
    let schema = library(EngineOptions::default()).build().unwrap();
    let resolved = schema
        .resolve_root(
            OperationType::Query,
            "book",
            with_args(json!({ "isbn": "978-0-00-000002-8" })),
        )
        .unwrap();
    assert_eq!(
        resolved.into_result().unwrap(),
        json!({
            "isbn": "978-0-00-000002-8",
            "title": "Small Hours",
            "genre": "POETRY",
            "year": 2004
        })
    );

    let resolved = schema
        .resolve_root(
            OperationType::Query,
            "book",
            with_args(json!({ "isbn": "0" })),
        )
        .unwrap();
    let error = resolved.into_result().unwrap_err();
    assert_eq!(error.message, "no book with ISBN 0");
    assert_eq!(error.code(), Some("NOT_FOUND"));
}

#[test]
fn coerced_arguments_reach_the_resolver() {
    let schema = library(EngineOptions::default()).build().unwrap();
    let resolver = schema.query_resolver("books").unwrap();
    let args = schema
        .coerce_arguments(
            resolver.argument_config(),
            json!({ "filter": { "genre": "FICTION", "published": { "from": 2020, "to": 2000 } } })
                .as_object()
                .unwrap(),
        )
        .unwrap();
    let resolved = resolver.resolve(ResolveParams::builder().args(args).build());
    assert_eq!(
        resolved.into_result().unwrap(),
        json!([{
            "isbn": "978-0-00-000003-5",
            "title": "Harbour Lights",
            "genre": "FICTION",
            "year": 2012
        }])
    );

    let resolved = resolver.resolve(with_args(json!({ "filter": { "genre": 1 } })));
    assert_eq!(
        resolved.into_result().unwrap_err().code(),
        Some("MALFORMED_VALUE")
    );
}

#[test]
fn context_parameters() {
    let schema = library(EngineOptions::default()).build().unwrap();

    let anonymous = schema
        .resolve_root(OperationType::Query, "me", ResolveParams::default())
        .unwrap();
    assert_eq!(anonymous.into_result().unwrap(), Value::Null);

    let context = Context::new()
        .with(Viewer {
            name: "bo".to_string(),
        })
        .with(Locale("fr".to_string()));
    let me = schema
        .resolve_root(
            OperationType::Query,
            "me",
            ResolveParams::builder().context(context.clone()).build(),
        )
        .unwrap();
    assert_eq!(me.into_result().unwrap(), json!("bo"));

    let locale = schema
        .resolve_root(
            OperationType::Query,
            "locale",
            ResolveParams::builder().context(context.clone()).build(),
        )
        .unwrap();
    assert_eq!(locale.into_result().unwrap(), json!("fr"));

    let greeting = schema
        .resolve_field(
            "Author",
            "greeting",
            ResolveParams::builder()
                .context(context)
                .source(json!({ "name": "Bo Park" }))
                .build(),
        )
        .unwrap();
    assert_eq!(greeting.into_result().unwrap(), json!("bonjour Bo Park"));
}

#[test]
fn field_resolvers_receive_their_parent() {
    let schema = library(EngineOptions::default()).build().unwrap();
    let resolved = schema
        .resolve_field(
            "Book",
            "author",
            ResolveParams::builder()
                .source(json!({
                    "isbn": "978-0-00-000001-1",
                    "title": "The Long Road",
                    "genre": "FICTION",
                    "year": 1999
                }))
                .build(),
        )
        .unwrap();
    assert_eq!(
        resolved.into_result().unwrap(),
        json!({ "name": "Ann Lee", "books": [] })
    );

    let missing = schema
        .resolve_field("Book", "author", ResolveParams::default())
        .unwrap();
    assert_eq!(
        missing.into_result().unwrap_err().code(),
        Some("MISSING_SOURCE")
    );
}

#[test]
fn batch_resolvers_resolve_every_parent_at_once() {
    let schema = library(EngineOptions::default()).build().unwrap();
    let resolver = schema.field_resolver("Author", "books").unwrap();
    assert!(resolver.is_batch());

    let resolved = resolver.resolve(
        ResolveParams::builder()
            .source(json!([{ "name": "Ann Lee" }, { "name": "Bo Park" }, { "name": "Cy" }]))
            .build(),
    );
    let titles: Vec<Vec<String>> = resolved
        .into_result()
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|books| {
            books
                .as_array()
                .unwrap()
                .iter()
                .map(|book| book["title"].as_str().unwrap().to_string())
                .collect()
        })
        .collect();
    assert_eq!(
        titles,
        vec![
            vec!["The Long Road".to_string(), "Small Hours".to_string()],
            vec!["Harbour Lights".to_string()],
            vec![],
        ]
    );
}

#[test]
fn batch_resolvers_may_return_one_element_of_a_list_field_per_parent() {
    let mut engine = Engine::default();
    engine.field("books", |authors: Vec<Author>| -> Vec<Book> {
        authors.iter().map(|_| catalog().remove(0)).collect()
    });
    let schema = engine.build().unwrap();
    let resolver = schema.field_resolver("Author", "books").unwrap();
    assert_eq!(resolver.output().to_string(), "[Book!]!");

    let resolved = resolver.resolve(
        ResolveParams::builder()
            .source(json!([{ "name": "Ann Lee" }, { "name": "Bo Park" }]))
            .build(),
    );
    let book = json!({
        "isbn": "978-0-00-000001-1",
        "title": "The Long Road",
        "genre": "FICTION",
        "year": 1999
    });
    assert_eq!(
        resolved.into_result().unwrap(),
        json!([[book.clone()], [book]])
    );
}

#[derive(Debug, Serialize, Deserialize)]
struct ListingArgs {
    page_size: i32,
    first: i32,
}

impl Fields for ListingArgs {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<i32>("page_size"),
            FieldDecl::new::<i32>("first").rename("limit").default_value("1"),
        ]
    }
}

impl Arguments for ListingArgs {}
gqlbind::reflect!(ListingArgs: arguments);

#[derive(Debug, Serialize, Deserialize)]
struct Listing {
    page_size: i32,
    has_next_page: bool,
}

impl Fields for Listing {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<i32>("page_size"),
            FieldDecl::new::<bool>("has_next_page").rename("more"),
        ]
    }
}

impl Object for Listing {}
gqlbind::reflect!(Listing: object);

#[test]
fn values_use_exposed_names() {
    let mut engine = Engine::new(
        EngineOptions::builder()
            .field_naming(FieldNaming::CamelCase)
            .build(),
    );
    engine
        .query("listing", |args: ListingArgs| Listing {
            page_size: args.page_size,
            has_next_page: args.first < args.page_size,
        })
        .field("summary", |listing: Listing| {
            format!("{} per page, more: {}", listing.page_size, listing.has_next_page)
        });
    let schema = engine.build().unwrap();

    let listing = schema.query_resolver("listing").unwrap();
    assert_eq!(
        listing.argument_config().keys().collect::<Vec<_>>(),
        vec!["pageSize", "limit"]
    );
    let resolved = listing.resolve(with_args(json!({ "pageSize": 5, "limit": 2 })));
    assert_eq!(
        resolved.into_result().unwrap(),
        json!({ "pageSize": 5, "more": true })
    );
    let resolved = listing.resolve(with_args(json!({ "pageSize": 1 })));
    assert_eq!(
        resolved.into_result().unwrap(),
        json!({ "pageSize": 1, "more": false })
    );

    let summary = schema
        .resolve_field(
            "Listing",
            "summary",
            ResolveParams::builder()
                .source(json!({ "pageSize": 5, "more": true }))
                .build(),
        )
        .unwrap();
    assert_eq!(
        summary.into_result().unwrap(),
        json!("5 per page, more: true")
    );
}

#[test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn concurrent_resolutions_are_independent() {
    let schema = Arc::new(library(EngineOptions::default()).build().unwrap());
    let resolve = schema.query_resolver("me").unwrap().resolve_fn();

    let tasks: Vec<_> = (0..64)
        .map(|index| {
            let resolve = resolve.clone();
            tokio::spawn(async move {
                let context = Context::new().with(Viewer {
                    name: format!("viewer {index}"),
                });
                let resolved = resolve(ResolveParams::builder().context(context).build());
                (index, resolved.into_result())
            })
        })
        .collect();

    for task in tasks {
        let (index, result) = task.await.unwrap();
        assert_eq!(result.unwrap(), json!(format!("viewer {index}")));
    }

    let sign_in = schema.mutation_resolver("signIn").unwrap().resolve_fn();
    let handles: Vec<_> = ["open sesame", "guess"]
        .into_iter()
        .map(|password| {
            let sign_in = sign_in.clone();
            tokio::task::spawn_blocking(move || {
                sign_in(with_args(json!({ "name": "ann", "password": password })))
            })
        })
        .collect();
    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await.unwrap().error.is_none());
    }
    assert_eq!(outcomes, vec![true, false]);
}
