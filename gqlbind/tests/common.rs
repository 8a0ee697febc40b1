//! A small library catalog, declared the way an API author would.

use gqlbind::Arguments;
use gqlbind::Context;
use gqlbind::ContextValue;
use gqlbind::Engine;
use gqlbind::EngineOptions;
use gqlbind::EnumValueDecl;
use gqlbind::Enumeration;
use gqlbind::FieldDecl;
use gqlbind::FieldError;
use gqlbind::Fields;
use gqlbind::InputObject;
use gqlbind::Object;
use gqlbind::ParseInputFn;
use gqlbind::ResolveParams;
use gqlbind::Scalar;
use gqlbind::json_ext;
use serde::Deserialize;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum Genre {
    #[default]
    Fiction,
    Poetry,
}

impl Enumeration for Genre {
    fn values() -> Vec<EnumValueDecl> {
        vec![
            EnumValueDecl::new("FICTION"),
            EnumValueDecl::new("POETRY").description("Verse"),
        ]
    }

    fn description() -> Option<&'static str> {
        Some("Literary genre")
    }
}
gqlbind::reflect!(Genre: enumeration);

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Isbn(pub(crate) String);

impl Scalar for Isbn {
    fn name() -> &'static str {
        "ISBN"
    }

    fn description() -> Option<&'static str> {
        Some("International Standard Book Number")
    }
}
gqlbind::reflect!(Isbn: scalar);

/// Publication years; bounds given in the wrong order are swapped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct YearRange {
    pub(crate) from: i32,
    pub(crate) to: i32,
}

impl Fields for YearRange {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<i32>("from"),
            FieldDecl::new::<i32>("to").default_value("2100"),
        ]
    }
}

impl InputObject for YearRange {
    fn input_name(&self) -> Option<&str> {
        Some("Years")
    }

    fn parse_value(&self) -> Option<ParseInputFn<Self>> {
        Some(ordered_years)
    }
}
gqlbind::reflect!(YearRange: input);

fn ordered_years(object: &json_ext::Object) -> Result<YearRange, FieldError> {
    let range: YearRange = serde_json_bytes::from_value(json_ext::Value::Object(object.clone()))
        .map_err(|err| FieldError::from(err.to_string()))?;
    Ok(YearRange {
        from: range.from.min(range.to),
        to: range.from.max(range.to),
    })
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct BookFilter {
    pub(crate) genre: Option<Genre>,
    pub(crate) published: Option<YearRange>,
    pub(crate) first: i32,
}

impl Fields for BookFilter {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<Option<Genre>>("genre").description("Only books of this genre"),
            FieldDecl::new::<Option<YearRange>>("published"),
            FieldDecl::new::<i32>("first").default_value("10"),
        ]
    }
}

impl InputObject for BookFilter {
    fn description(&self) -> Option<&str> {
        Some("Narrows down a book listing")
    }
}
gqlbind::reflect!(BookFilter: input);

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct BooksArgs {
    pub(crate) filter: Option<BookFilter>,
}

impl Fields for BooksArgs {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<Option<BookFilter>>("filter")
                .description("Criteria for the listing"),
        ]
    }
}

impl Arguments for BooksArgs {}
gqlbind::reflect!(BooksArgs: arguments);

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ByIsbn {
    pub(crate) isbn: Isbn,
}

impl Fields for ByIsbn {
    fn fields() -> Vec<FieldDecl> {
        vec![FieldDecl::new::<Isbn>("isbn")]
    }
}

impl Arguments for ByIsbn {}
gqlbind::reflect!(ByIsbn: arguments);

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SignIn {
    pub(crate) name: String,
    pub(crate) password: String,
}

impl Fields for SignIn {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<String>("name"),
            FieldDecl::new::<String>("password"),
        ]
    }
}

impl Arguments for SignIn {}
gqlbind::reflect!(SignIn: arguments);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Book {
    pub(crate) isbn: Isbn,
    pub(crate) title: String,
    pub(crate) genre: Genre,
    pub(crate) year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) author: Option<Author>,
}

impl Fields for Book {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<Isbn>("isbn"),
            FieldDecl::new::<String>("title"),
            FieldDecl::new::<Genre>("genre"),
            FieldDecl::new::<i32>("year"),
            FieldDecl::new::<Option<Author>>("author").resolved(),
        ]
    }
}

impl Object for Book {}
gqlbind::reflect!(Book: object);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Author {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) books: Vec<Book>,
}

impl Fields for Author {
    fn fields() -> Vec<FieldDecl> {
        vec![
            FieldDecl::new::<String>("name"),
            FieldDecl::new::<Vec<Book>>("books").resolved(),
        ]
    }
}

impl Object for Author {
    fn description() -> Option<&'static str> {
        Some("Somebody who writes books")
    }
}
gqlbind::reflect!(Author: object);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Viewer {
    pub(crate) name: String,
}

impl ContextValue for Viewer {}
gqlbind::reflect!(Viewer: context);

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Locale(pub(crate) String);

impl ContextValue for Locale {}
gqlbind::reflect!(Locale: context);

const CATALOG: &[(&str, &str, Genre, i32, &str)] = &[
    ("978-0-00-000001-1", "The Long Road", Genre::Fiction, 1999, "Ann Lee"),
    ("978-0-00-000002-8", "Small Hours", Genre::Poetry, 2004, "Ann Lee"),
    ("978-0-00-000003-5", "Harbour Lights", Genre::Fiction, 2012, "Bo Park"),
];

pub(crate) fn catalog() -> Vec<Book> {
    CATALOG
        .iter()
        .map(|(isbn, title, genre, year, _)| Book {
            isbn: Isbn(isbn.to_string()),
            title: title.to_string(),
            genre: *genre,
            year: *year,
            author: None,
        })
        .collect()
}

fn author_of(isbn: &Isbn) -> Option<Author> {
    CATALOG
        .iter()
        .find(|(candidate, ..)| *candidate == isbn.0)
        .map(|(.., name)| Author {
            name: name.to_string(),
            books: Vec::new(),
        })
}

fn books_by(author: &Author) -> Vec<Book> {
    catalog()
        .into_iter()
        .filter(|book| author_of(&book.isbn).is_some_and(|a| a.name == author.name))
        .collect()
}

fn list_books(args: BooksArgs) -> Vec<Book> {
    let Some(filter) = args.filter else {
        return catalog();
    };
    catalog()
        .into_iter()
        .filter(|book| filter.genre.is_none_or(|genre| genre == book.genre))
        .filter(|book| {
            filter
                .published
                .as_ref()
                .is_none_or(|range| (range.from..=range.to).contains(&book.year))
        })
        .take(usize::try_from(filter.first).unwrap_or_default())
        .collect()
}

/// The catalog API.
pub(crate) fn library(options: EngineOptions) -> Engine {
    let mut engine = Engine::new(options);
    engine
        .query("books", list_books)
        .query("book", |args: ByIsbn| -> Result<Book, FieldError> {
            catalog()
                .into_iter()
                .find(|book| book.isbn == args.isbn)
                .ok_or_else(|| {
                    FieldError::builder()
                        .message(format!("no book with ISBN {}", args.isbn.0))
                        .extension_code("NOT_FOUND")
                        .build()
                })
        })
        .query("me", |viewer: Option<Viewer>| viewer.map(|viewer| viewer.name))
        .query("locale", |context: Context| {
            context
                .get::<Locale>()
                .map_or_else(|| "en".to_string(), |locale| locale.0)
        })
        .mutation(
            "signIn",
            |args: SignIn| -> (String, Viewer, Option<FieldError>) {
                let viewer = Viewer {
                    name: args.name.clone(),
                };
                if args.password == "open sesame" {
                    (format!("welcome {}", args.name), viewer, None)
                } else {
                    (
                        String::new(),
                        viewer,
                        Some(
                            FieldError::builder()
                                .message("wrong password")
                                .extension_code("UNAUTHENTICATED")
                                .build(),
                        ),
                    )
                }
            },
        )
        .field("author", |book: Book| author_of(&book.isbn))
        .field("books", |authors: Vec<Author>| -> Vec<Vec<Book>> {
            authors.iter().map(books_by).collect()
        })
        .field("greeting", |author: Author, locale: Option<Locale>| {
            match locale.as_ref().map(|locale| locale.0.as_str()) {
                Some("fr") => format!("bonjour {}", author.name),
                _ => format!("hello {}", author.name),
            }
        });
    engine
}

/// Parameters carrying `args`, a JSON object.
pub(crate) fn with_args(args: json_ext::Value) -> ResolveParams {
    ResolveParams::builder()
        .args(args.as_object().cloned().unwrap_or_default())
        .build()
}
