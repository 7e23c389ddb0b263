//! Fixed catalogue rows inserted after the schema is created.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::schema::Table;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publisher {
    pub publisher_id: i32,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub author_id: i32,
    pub first_name: &'static str,
    pub middle_name: Option<&'static str>,
    pub last_name: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    pub book_id: i32,
    pub title: &'static str,
    pub total_pages: Option<i32>,
    /// Stored as `DECIMAL(4, 2)`
    pub rating: Option<Decimal>,
    pub isbn: Option<&'static str>,
    pub published_date: Option<NaiveDate>,
    pub publisher_id: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookAuthor {
    pub book_id: i32,
    pub author_id: i32,
}

/// A dangling or duplicated reference found by [`SeedSet::check_references`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedIssue {
    pub table: Table,
    pub detail: String,
}

/// Rows for every table, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SeedSet {
    pub publishers: Vec<Publisher>,
    pub authors: Vec<Author>,
    pub books: Vec<Book>,
    pub book_authors: Vec<BookAuthor>,
}

impl SeedSet {
    /// The catalogue shipped with bookseed.
    pub fn catalogue() -> Self {
        Self {
            publishers: vec![
                publisher(1, "O Reilly Media"),
                publisher(2, "A Book Apart"),
                publisher(3, "A K PETERS"),
                publisher(4, "Academic Press"),
                publisher(5, "Addison Wesley"),
                publisher(6, "Albert&Sweigart"),
                publisher(7, "Alfred A. Knopf"),
            ],
            authors: vec![
                author(1, "Merritt", None, "Eric"),
                author(2, "Linda", None, "Mui"),
                author(3, "Alecos", None, "Papadatos"),
                author(4, "Anthony", None, "Molinaro"),
                author(5, "David", None, "Cronin"),
                author(6, "Richard", None, "Blum"),
                author(7, "Yuval", Some("Noah"), "Harari"),
                author(8, "Paul", None, "Albitz"),
            ],
            books: vec![
                book(1, "Lean Software Development: An Agile Toolkit", 240, 417, Some("9780320000000"), (2003, 5, 18), 5),
                book(2, "Facing the Intelligence Explosion", 91, 387, None, (2013, 2, 1), 7),
                book(3, "Scala in Action", 419, 374, Some("9781940000000"), (2013, 4, 10), 1),
                book(4, "Patterns of Software: Tales from the Software Community", 256, 384, Some("9780200000000"), (1996, 8, 15), 1),
                book(5, "Anatomy Of LISP", 446, 443, Some("9780070000000"), (1978, 1, 1), 3),
                book(6, "Computing machinery and intelligence", 24, 417, None, (2009, 3, 22), 4),
                book(7, "XML: Visual QuickStart Guide", 269, 366, Some("9780320000000"), (2009, 1, 1), 5),
                book(8, "SQL Cookbook", 595, 395, Some("9780600000000"), (2005, 12, 1), 7),
                book(9, "The Apollo Guidance Computer: Architecture And Operation (Springer Praxis Books / Space Exploration)", 439, 429, Some("9781440000000"), (2010, 7, 1), 6),
                book(10, "Minds and Computers: An Introduction to the Philosophy of Artificial Intelligence", 222, 354, Some("9780750000000"), (2007, 2, 13), 7),
            ],
            book_authors: [(1, 1), (2, 8), (3, 7), (4, 6), (5, 5), (6, 4), (7, 3), (8, 2), (9, 4), (10, 1)]
                .into_iter()
                .map(|(book_id, author_id)| BookAuthor { book_id, author_id })
                .collect(),
        }
    }

    /// Row count for one table.
    pub fn len(&self, table: Table) -> usize {
        match table {
            Table::Publishers => self.publishers.len(),
            Table::Authors => self.authors.len(),
            Table::Books => self.books.len(),
            Table::BookAuthors => self.book_authors.len(),
        }
    }

    /// Check keys and foreign keys without touching a database.
    ///
    /// Mirrors the constraints declared in the schema: unique primary
    /// keys, every non-null `books.publisher_id` present in `publishers`,
    /// and both sides of every `book_authors` row present.
    pub fn check_references(&self) -> Vec<SeedIssue> {
        let mut issues = Vec::new();

        let publisher_ids = unique_ids(
            Table::Publishers,
            self.publishers.iter().map(|p| p.publisher_id),
            &mut issues,
        );
        let author_ids = unique_ids(
            Table::Authors,
            self.authors.iter().map(|a| a.author_id),
            &mut issues,
        );
        let book_ids = unique_ids(
            Table::Books,
            self.books.iter().map(|b| b.book_id),
            &mut issues,
        );

        for book in &self.books {
            if let Some(publisher_id) = book.publisher_id {
                if !publisher_ids.contains(&publisher_id) {
                    issues.push(SeedIssue {
                        table: Table::Books,
                        detail: format!(
                            "book {} references missing publisher {}",
                            book.book_id, publisher_id
                        ),
                    });
                }
            }
        }

        let mut links = HashSet::new();
        for link in &self.book_authors {
            if !links.insert(*link) {
                issues.push(SeedIssue {
                    table: Table::BookAuthors,
                    detail: format!("duplicate link ({}, {})", link.book_id, link.author_id),
                });
            }
            if !book_ids.contains(&link.book_id) {
                issues.push(SeedIssue {
                    table: Table::BookAuthors,
                    detail: format!("link references missing book {}", link.book_id),
                });
            }
            if !author_ids.contains(&link.author_id) {
                issues.push(SeedIssue {
                    table: Table::BookAuthors,
                    detail: format!("link references missing author {}", link.author_id),
                });
            }
        }

        issues
    }
}

fn unique_ids(
    table: Table,
    ids: impl Iterator<Item = i32>,
    issues: &mut Vec<SeedIssue>,
) -> HashSet<i32> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            issues.push(SeedIssue {
                table,
                detail: format!("duplicate primary key {}", id),
            });
        }
    }
    seen
}

fn publisher(publisher_id: i32, name: &'static str) -> Publisher {
    Publisher { publisher_id, name }
}

fn author(
    author_id: i32,
    first_name: &'static str,
    middle_name: Option<&'static str>,
    last_name: &'static str,
) -> Author {
    Author {
        author_id,
        first_name,
        middle_name,
        last_name: Some(last_name),
    }
}

/// `rating_hundredths` is the rating scaled by 100, e.g. 417 for 4.17.
fn book(
    book_id: i32,
    title: &'static str,
    total_pages: i32,
    rating_hundredths: i64,
    isbn: Option<&'static str>,
    (year, month, day): (i32, u32, u32),
    publisher_id: i32,
) -> Book {
    Book {
        book_id,
        title,
        total_pages: Some(total_pages),
        rating: Some(Decimal::new(rating_hundredths, 2)),
        isbn,
        published_date: NaiveDate::from_ymd_opt(year, month, day),
        publisher_id: Some(publisher_id),
    }
}
