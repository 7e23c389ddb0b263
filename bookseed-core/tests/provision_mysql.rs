//! Provisioning against a live MySQL server
//!
//! These tests drop and recreate the catalogue tables. Point the DB_*
//! variables at a disposable database and run with:
//!
//!   cargo test -p bookseed-core -- --ignored

use bookseed_core::{
    load_dotenv, Cell, DbConfig, ErrorClass, ProvisionError, Provisioner, SeedSet, Table,
    TransactionMode,
};
use sqlx::mysql::MySqlConnection;
use sqlx::{Connection, Executor};
use tokio::sync::Mutex;

// Every test rebuilds the same tables
static DB_LOCK: Mutex<()> = Mutex::const_new(());

fn config() -> DbConfig {
    load_dotenv(None).expect("dotenv");
    DbConfig::from_env().expect("DB_* variables required")
}

async fn raw_connection(config: &DbConfig) -> MySqlConnection {
    MySqlConnection::connect_with(&config.connect_options())
        .await
        .expect("connect")
}

async fn reset(config: &DbConfig) {
    let mut conn = raw_connection(config).await;
    conn.execute("DROP TABLE IF EXISTS book_authors, books, authors, publishers")
        .await
        .expect("drop tables");
}

async fn count(conn: &mut MySqlConnection, table: Table) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    let (n,): (i64,) = sqlx::query_as(&sql)
        .fetch_one(&mut *conn)
        .await
        .expect("count");
    n
}

async fn provision_fresh(config: &DbConfig) {
    reset(config).await;
    let mut provisioner = Provisioner::connect(config).await.expect("connect");
    provisioner
        .run(&SeedSet::catalogue(), Table::Authors)
        .await
        .expect("provision");
    provisioner.close().await.expect("close");
}

#[tokio::test]
#[ignore = "requires database"]
async fn provisions_expected_row_counts() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    provision_fresh(&config).await;

    let mut conn = raw_connection(&config).await;
    assert_eq!(count(&mut conn, Table::Publishers).await, 7);
    assert_eq!(count(&mut conn, Table::Authors).await, 8);
    assert_eq!(count(&mut conn, Table::Books).await, 10);
    assert_eq!(count(&mut conn, Table::BookAuthors).await, 10);
}

#[tokio::test]
#[ignore = "requires database"]
async fn references_resolve() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    provision_fresh(&config).await;

    let mut conn = raw_connection(&config).await;
    let (orphan_books,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM books b LEFT JOIN publishers p ON p.publisher_id = b.publisher_id \
         WHERE b.publisher_id IS NOT NULL AND p.publisher_id IS NULL",
    )
    .fetch_one(&mut conn)
    .await
    .unwrap();
    assert_eq!(orphan_books, 0);

    let (orphan_links,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM book_authors ba \
         LEFT JOIN books b ON b.book_id = ba.book_id \
         LEFT JOIN authors a ON a.author_id = ba.author_id \
         WHERE b.book_id IS NULL OR a.author_id IS NULL",
    )
    .fetch_one(&mut conn)
    .await
    .unwrap();
    assert_eq!(orphan_links, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn authors_read_back_includes_harari() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    reset(&config).await;

    let mut provisioner = Provisioner::connect(&config).await.unwrap();
    let frame = provisioner
        .run(&SeedSet::catalogue(), Table::Authors)
        .await
        .unwrap();

    assert_eq!(frame.len(), 8);
    assert_eq!(
        frame.columns,
        vec!["author_id", "first_name", "middle_name", "last_name"]
    );

    let harari = (0..frame.len())
        .find(|&i| frame.get(i, "author_id") == Some(&Cell::Int(7)))
        .expect("author 7");
    assert_eq!(frame.get(harari, "first_name"), Some(&Cell::Text("Yuval".into())));
    assert_eq!(frame.get(harari, "middle_name"), Some(&Cell::Text("Noah".into())));
    assert_eq!(frame.get(harari, "last_name"), Some(&Cell::Text("Harari".into())));
    assert_eq!(frame.get(0, "middle_name"), Some(&Cell::Null));

    let books = provisioner.fetch_table(Table::Books).await.unwrap();
    assert_eq!(books.len(), 10);
    assert_eq!(books.get(1, "isbn"), Some(&Cell::Null));
    assert_eq!(books.get(0, "rating").map(|c| c.to_string()), Some("4.17".into()));
    assert_eq!(
        books.get(0, "published_date").map(|c| c.to_string()),
        Some("2003-05-18".into())
    );
}

#[tokio::test]
#[ignore = "requires database"]
async fn deletes_cascade_to_links() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    provision_fresh(&config).await;

    let mut conn = raw_connection(&config).await;

    // Book 3 has a single link (to author 7)
    conn.execute("DELETE FROM books WHERE book_id = 3").await.unwrap();
    let (links,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM book_authors WHERE book_id = 3")
        .fetch_one(&mut conn)
        .await
        .unwrap();
    assert_eq!(links, 0);

    // Author 4 is linked to books 6 and 9
    conn.execute("DELETE FROM authors WHERE author_id = 4").await.unwrap();
    let (links,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM book_authors WHERE author_id = 4")
            .fetch_one(&mut conn)
            .await
            .unwrap();
    assert_eq!(links, 0);
    assert_eq!(count(&mut conn, Table::BookAuthors).await, 7);
    assert_eq!(count(&mut conn, Table::Books).await, 9);
}

#[tokio::test]
#[ignore = "requires database"]
async fn deleting_referenced_publisher_fails() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    provision_fresh(&config).await;

    let mut conn = raw_connection(&config).await;
    let err = conn
        .execute("DELETE FROM publishers WHERE publisher_id = 7")
        .await
        .expect_err("publisher 7 is referenced by books");
    let kind = err.as_database_error().map(|db| db.kind());
    assert!(matches!(kind, Some(sqlx::error::ErrorKind::ForeignKeyViolation)));

    // Publisher 2 has no books
    conn.execute("DELETE FROM publishers WHERE publisher_id = 2")
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires database"]
async fn second_run_fails_on_first_table() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    provision_fresh(&config).await;

    let mut provisioner = Provisioner::connect(&config).await.unwrap();
    let err = provisioner
        .run(&SeedSet::catalogue(), Table::Authors)
        .await
        .expect_err("tables already exist");

    assert_eq!(err.class(), ErrorClass::Schema);
    assert_eq!(err.table(), Some(Table::Publishers));
}

#[tokio::test]
#[ignore = "requires database"]
async fn dangling_book_reference_is_constraint_error() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    reset(&config).await;

    let mut seed = SeedSet::catalogue();
    seed.books[4].publisher_id = Some(42);

    let mut provisioner = Provisioner::connect(&config).await.unwrap();
    provisioner.create_schema().await.unwrap();
    let err = provisioner.seed(&seed).await.expect_err("publisher 42 missing");
    assert!(matches!(
        err,
        ProvisionError::Constraint {
            table: Table::Books,
            ..
        }
    ));

    // Autocommit: everything before the bad row stays
    let mut conn = raw_connection(&config).await;
    assert_eq!(count(&mut conn, Table::Publishers).await, 7);
    assert_eq!(count(&mut conn, Table::Authors).await, 8);
    assert_eq!(count(&mut conn, Table::Books).await, 4);
}

#[tokio::test]
#[ignore = "requires database"]
async fn atomic_seed_rolls_back_on_failure() {
    let _guard = DB_LOCK.lock().await;
    let config = config();
    reset(&config).await;

    let mut seed = SeedSet::catalogue();
    seed.book_authors[9].author_id = 99;

    let mut provisioner = Provisioner::connect(&config)
        .await
        .unwrap()
        .with_mode(TransactionMode::AtomicSeed);
    assert_eq!(provisioner.mode(), TransactionMode::AtomicSeed);
    provisioner.create_schema().await.unwrap();
    let err = provisioner.seed(&seed).await.expect_err("author 99 missing");
    assert_eq!(err.class(), ErrorClass::Constraint);
    assert_eq!(err.table(), Some(Table::BookAuthors));

    // Schema stays, rows do not
    let mut conn = raw_connection(&config).await;
    assert_eq!(count(&mut conn, Table::Publishers).await, 0);
    assert_eq!(count(&mut conn, Table::Authors).await, 0);
    assert_eq!(count(&mut conn, Table::Books).await, 0);
    assert_eq!(count(&mut conn, Table::BookAuthors).await, 0);
}

#[tokio::test]
#[ignore = "requires database"]
async fn unreachable_server_is_connection_error() {
    let mut config = config();
    config.host = "127.0.0.1".to_string();
    config.port = 1;

    let err = match Provisioner::connect(&config).await {
        Ok(_) => panic!("port 1 should refuse connections"),
        Err(err) => err,
    };
    assert_eq!(err.class(), ErrorClass::Connection);
    assert!(err.to_string().contains(":***@127.0.0.1:1/"));
}
