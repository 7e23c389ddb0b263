//! Schema-and-seed procedure
//!
//! One connection, statements issued strictly in order:
//! 1. connect
//! 2-5. `CREATE TABLE` in [`CREATION_ORDER`]
//! 6-9. insert publishers, authors, books, book/author links
//! 10. read one table back
//!
//! The first failure aborts the run. Nothing is retried.

use sqlx::mysql::MySqlConnection;
use sqlx::{Connection, Executor, MySql, Transaction};
use tracing::{debug, info, instrument, warn};

use crate::config::DbConfig;
use crate::error::{ProvisionError, Result};
use crate::render::Frame;
use crate::schema::{Table, CREATION_ORDER};
use crate::seed::SeedSet;

const INSERT_PUBLISHER: &str = "INSERT INTO publishers (publisher_id, name) VALUES (?, ?)";
const INSERT_AUTHOR: &str =
    "INSERT INTO authors (author_id, first_name, middle_name, last_name) VALUES (?, ?, ?, ?)";
const INSERT_BOOK: &str = "INSERT INTO books (book_id, title, total_pages, rating, isbn, published_date, publisher_id) \
                           VALUES (?, ?, ?, ?, ?, ?, ?)";
const INSERT_BOOK_AUTHOR: &str = "INSERT INTO book_authors (book_id, author_id) VALUES (?, ?)";

/// Transaction boundary for the insert phase.
///
/// `CREATE TABLE` always commits on its own in MySQL, so only the inserts
/// can be grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionMode {
    /// Every statement commits individually. A failure leaves earlier rows
    /// in place.
    #[default]
    AutoCommit,
    /// All inserts run in one transaction, rolled back on the first
    /// failure.
    AtomicSeed,
}

/// Rows inserted per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub publishers: u64,
    pub authors: u64,
    pub books: u64,
    pub book_authors: u64,
}

impl SeedReport {
    pub fn total(&self) -> u64 {
        self.publishers + self.authors + self.books + self.book_authors
    }
}

/// Owns the single connection used for a provisioning run.
pub struct Provisioner {
    conn: MySqlConnection,
    mode: TransactionMode,
}

impl Provisioner {
    /// Open the connection described by `config`.
    #[instrument(skip_all, fields(db = %config))]
    pub async fn connect(config: &DbConfig) -> Result<Self> {
        let conn = MySqlConnection::connect_with(&config.connect_options())
            .await
            .map_err(|source| ProvisionError::Connect {
                target: config.redacted_url(),
                source,
            })?;
        info!("connected");

        Ok(Self {
            conn,
            mode: TransactionMode::default(),
        })
    }

    pub fn with_mode(mut self, mode: TransactionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> TransactionMode {
        self.mode
    }

    /// Create the four tables. Fails on the first table that already
    /// exists.
    pub async fn create_schema(&mut self) -> Result<()> {
        info!("creating schema");
        for table in CREATION_ORDER {
            debug!(%table, "CREATE TABLE");
            self.conn
                .execute(table.create_sql())
                .await
                .map_err(|source| ProvisionError::Schema { table, source })?;
        }
        Ok(())
    }

    /// Insert every row of `seed`, parents before children.
    pub async fn seed(&mut self, seed: &SeedSet) -> Result<SeedReport> {
        info!(mode = ?self.mode, "seeding catalogue");
        let report = match self.mode {
            TransactionMode::AutoCommit => insert_all(&mut self.conn, seed).await?,
            TransactionMode::AtomicSeed => {
                let mut tx: Transaction<'_, MySql> =
                    self.conn.begin().await.map_err(|source| {
                        ProvisionError::Transaction {
                            action: "begin",
                            source,
                        }
                    })?;
                let report = match insert_all(&mut tx, seed).await {
                    Ok(report) => report,
                    Err(err) => {
                        if let Err(e) = tx.rollback().await {
                            let e = ProvisionError::Transaction {
                                action: "roll back",
                                source: e,
                            };
                            warn!("{}", e);
                        }
                        return Err(err);
                    }
                };
                tx.commit()
                    .await
                    .map_err(|source| ProvisionError::Transaction {
                        action: "commit",
                        source,
                    })?;
                report
            }
        };

        info!(
            publishers = report.publishers,
            authors = report.authors,
            books = report.books,
            book_authors = report.book_authors,
            "seeded {} rows",
            report.total()
        );
        Ok(report)
    }

    /// `SELECT *` from `table`, ordered by primary key.
    pub async fn fetch_table(&mut self, table: Table) -> Result<Frame> {
        let sql = table.select_all_sql();
        debug!(%table, "{}", sql);

        let rows = sqlx::query(&sql)
            .fetch_all(&mut self.conn)
            .await
            .map_err(|source| ProvisionError::Query { table, source })?;

        Frame::from_rows(&rows, table.columns())
            .map_err(|source| ProvisionError::Query { table, source })
    }

    /// Create the schema, seed it, and read `show` back.
    pub async fn run(&mut self, seed: &SeedSet, show: Table) -> Result<Frame> {
        self.create_schema().await?;
        self.seed(seed).await?;
        self.fetch_table(show).await
    }

    /// Close the connection cleanly.
    pub async fn close(self) -> Result<()> {
        self.conn
            .close()
            .await
            .map_err(|source| ProvisionError::Disconnect { source })
    }
}

async fn insert_all(conn: &mut MySqlConnection, seed: &SeedSet) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    for p in &seed.publishers {
        report.publishers += sqlx::query(INSERT_PUBLISHER)
            .bind(p.publisher_id)
            .bind(p.name)
            .execute(&mut *conn)
            .await
            .map_err(|e| ProvisionError::from_insert(Table::Publishers, e))?
            .rows_affected();
    }

    for a in &seed.authors {
        report.authors += sqlx::query(INSERT_AUTHOR)
            .bind(a.author_id)
            .bind(a.first_name)
            .bind(a.middle_name)
            .bind(a.last_name)
            .execute(&mut *conn)
            .await
            .map_err(|e| ProvisionError::from_insert(Table::Authors, e))?
            .rows_affected();
    }

    for b in &seed.books {
        report.books += sqlx::query(INSERT_BOOK)
            .bind(b.book_id)
            .bind(b.title)
            .bind(b.total_pages)
            .bind(b.rating)
            .bind(b.isbn)
            .bind(b.published_date)
            .bind(b.publisher_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| ProvisionError::from_insert(Table::Books, e))?
            .rows_affected();
    }

    for link in &seed.book_authors {
        report.book_authors += sqlx::query(INSERT_BOOK_AUTHOR)
            .bind(link.book_id)
            .bind(link.author_id)
            .execute(&mut *conn)
            .await
            .map_err(|e| ProvisionError::from_insert(Table::BookAuthors, e))?
            .rows_affected();
    }

    Ok(report)
}
