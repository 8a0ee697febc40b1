use gqlbind::BuildError;
use gqlbind::Engine;
use gqlbind::EngineOptions;
use gqlbind::ErrorMode;
use gqlbind::FieldError;
use gqlbind::ResultRole;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::Author;
use crate::common::Book;
use crate::common::BooksArgs;
use crate::common::ByIsbn;
use crate::common::Viewer;
use crate::common::catalog;

fn first_error(engine: &Engine) -> BuildError {
    engine
        .build()
        .unwrap_err()
        .into_iter()
        .next()
        .unwrap()
}

#[test_log::test]
fn one_context_mutation_and_two_errors_build() {
    let mut engine = Engine::default();
    engine.mutation(
        "touch",
        || -> (String, Viewer, Option<FieldError>, Option<FieldError>) {
            (
                "ok".to_string(),
                Viewer {
                    name: "ann".to_string(),
                },
                None,
                None,
            )
        },
    );
    let schema = engine.build().unwrap();
    let roles: Vec<_> = schema
        .mutation_resolver("touch")
        .unwrap()
        .results()
        .iter()
        .map(|slot| slot.role)
        .collect();
    assert_eq!(
        roles,
        vec![
            ResultRole::Primary,
            ResultRole::ContextMutation,
            ResultRole::Error,
            ResultRole::Error
        ]
    );
}

#[test_log::test]
fn two_argument_bundles() {
    let mut engine = Engine::default();
    engine.query("books", |_: BooksArgs, _: ByIsbn| catalog());
    assert_eq!(
        first_error(&engine).to_string(),
        "more than one 'arguments' parameter [1]: 'ByIsbn'"
    );
}

#[test_log::test]
fn two_sources() {
    let mut engine = Engine::default();
    engine.field("author", |_: Book, _: Vec<Book>| -> Option<Author> { None });
    assert!(matches!(
        first_error(&engine),
        BuildError::MultipleSources { position: 1, .. }
    ));
}

#[test_log::test]
fn two_primary_results() {
    let mut engine = Engine::default();
    engine.query("pair", || ("a".to_string(), 1));
    assert!(matches!(
        first_error(&engine),
        BuildError::MultipleResults { position: 1, .. }
    ));
}

#[test_log::test]
fn batch_resolvers_return_sequences() {
    let mut engine = Engine::default();
    engine.field("books", |_: Vec<Author>| catalog().len() as i32);
    assert_eq!(
        first_error(&engine).to_string(),
        "expect a sequence of results, but 'i32' in result [0]"
    );

    let mut engine = Engine::default();
    engine.field("author", |books: Vec<Book>| -> Vec<Vec<Author>> {
        books.iter().map(|_| Vec::new()).collect()
    });
    let error = first_error(&engine);
    assert!(matches!(error, BuildError::ResultTypeMismatch { .. }), "{error}");
}

#[rstest]
#[case::single_book_for_a_list_field(
    |mut engine: Engine| {
        engine.field("books", |_: Author| -> Book { catalog().remove(0) });
        engine
    },
    "result type 'Book' does not match type 'Vec<Book>' of field 'Author.books'"
)]
#[case::list_for_an_object_field(
    |mut engine: Engine| {
        engine.field("author", |_: Book| -> Vec<Author> { Vec::new() });
        engine
    },
    "result type 'Vec<Author>' does not match type 'Option<Author>' of field 'Book.author'"
)]
#[case::unresolved_field(
    |mut engine: Engine| {
        engine.field("title", |book: Book| book.title);
        engine
    },
    "field 'title' of 'Book' is not marked as resolved"
)]
#[case::source_on_a_root_field(
    |mut engine: Engine| {
        engine.query("book", |book: Book| book);
        engine
    },
    "root operation 'book' cannot take a source parameter 'Book'"
)]
#[case::plain_parameter(
    |mut engine: Engine| {
        engine.query("echo", |text: String| text);
        engine
    },
    "unsupported argument type [0]: 'String'"
)]
fn declaration_errors(#[case] declare: fn(Engine) -> Engine, #[case] expected: &str) {
    let engine = declare(Engine::default());
    assert_eq!(first_error(&engine).to_string(), expected);
}

#[test_log::test]
fn operation_names_are_graphql_names() {
    let mut engine = Engine::default();
    engine.query("0books", catalog);
    assert!(matches!(
        first_error(&engine),
        BuildError::InvalidName { name, .. } if name == "0books"
    ));
}

#[test_log::test]
fn collected_errors_keep_declaration_order() {
    let mut engine = Engine::new(
        EngineOptions::builder()
            .errors(ErrorMode::Collect)
            .build(),
    );
    engine
        .query("echo", |text: String| text)
        .query("books", catalog)
        .query("pair", || ("a".to_string(), 1))
        .field("title", |book: Book| book.title);
    let errors = engine.build().unwrap_err();
    let kinds: Vec<_> = errors
        .iter()
        .map(|error| match error {
            BuildError::UnsupportedArgumentType { .. } => "argument",
            BuildError::MultipleResults { .. } => "results",
            BuildError::FieldNotResolvable { .. } => "field",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["argument", "results", "field"]);
}
