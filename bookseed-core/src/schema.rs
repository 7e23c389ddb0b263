//! Table definitions for the catalogue schema
//!
//! The DDL is fixed. Tables are created without `IF NOT EXISTS`, so a
//! second run against a provisioned database fails on the first table.

use std::fmt;

use serde::Serialize;

/// The four catalogue tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Publishers,
    Authors,
    Books,
    BookAuthors,
}

/// Creation order. Referenced tables come before the tables that point
/// at them.
pub const CREATION_ORDER: [Table; 4] = [
    Table::Publishers,
    Table::Authors,
    Table::Books,
    Table::BookAuthors,
];

const CREATE_PUBLISHERS: &str = r#"
CREATE TABLE publishers(
    publisher_id INT NOT NULL,
    name VARCHAR(255) NOT NULL,
    PRIMARY KEY(publisher_id)
)
"#;

const CREATE_AUTHORS: &str = r#"
CREATE TABLE authors(
    author_id INT NOT NULL,
    first_name VARCHAR(100) NOT NULL,
    middle_name VARCHAR(50) NULL,
    last_name VARCHAR(100) NULL,
    PRIMARY KEY(author_id)
)
"#;

const CREATE_BOOKS: &str = r#"
CREATE TABLE books(
    book_id INT NOT NULL,
    title VARCHAR(255) NOT NULL,
    total_pages INT NULL,
    rating DECIMAL(4, 2) NULL,
    isbn VARCHAR(13) NULL,
    published_date DATE,
    publisher_id INT NULL,
    PRIMARY KEY(book_id),
    CONSTRAINT fk_publisher FOREIGN KEY(publisher_id) REFERENCES publishers(publisher_id)
)
"#;

const CREATE_BOOK_AUTHORS: &str = r#"
CREATE TABLE book_authors(
    book_id INT NOT NULL,
    author_id INT NOT NULL,
    PRIMARY KEY(book_id, author_id),
    CONSTRAINT fk_book FOREIGN KEY(book_id) REFERENCES books(book_id) ON DELETE CASCADE,
    CONSTRAINT fk_author FOREIGN KEY(author_id) REFERENCES authors(author_id) ON DELETE CASCADE
)
"#;

impl Table {
    /// SQL table name
    pub fn name(self) -> &'static str {
        match self {
            Self::Publishers => "publishers",
            Self::Authors => "authors",
            Self::Books => "books",
            Self::BookAuthors => "book_authors",
        }
    }

    /// `CREATE TABLE` statement for this table
    pub fn create_sql(self) -> &'static str {
        match self {
            Self::Publishers => CREATE_PUBLISHERS,
            Self::Authors => CREATE_AUTHORS,
            Self::Books => CREATE_BOOKS,
            Self::BookAuthors => CREATE_BOOK_AUTHORS,
        }
    }

    /// Tables this one holds foreign keys to.
    pub fn references(self) -> &'static [Table] {
        match self {
            Self::Publishers | Self::Authors => &[],
            Self::Books => &[Table::Publishers],
            Self::BookAuthors => &[Table::Books, Table::Authors],
        }
    }

    /// Column names, in declaration order.
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Publishers => &["publisher_id", "name"],
            Self::Authors => &["author_id", "first_name", "middle_name", "last_name"],
            Self::Books => &[
                "book_id",
                "title",
                "total_pages",
                "rating",
                "isbn",
                "published_date",
                "publisher_id",
            ],
            Self::BookAuthors => &["book_id", "author_id"],
        }
    }

    /// `SELECT *` for this table, ordered by primary key.
    pub fn select_all_sql(self) -> String {
        let order = match self {
            Self::Publishers => "publisher_id",
            Self::Authors => "author_id",
            Self::Books => "book_id",
            Self::BookAuthors => "book_id, author_id",
        };
        format!("SELECT * FROM {} ORDER BY {}", self.name(), order)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
