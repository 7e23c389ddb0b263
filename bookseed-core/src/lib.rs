//! bookseed-core: provision a MySQL catalogue database
//!
//! Creates the `publishers`, `authors`, `books` and `book_authors` tables,
//! inserts a fixed catalogue, and reads one table back as a [`Frame`].

pub mod config;
pub mod error;
pub mod provision;
pub mod render;
pub mod schema;
pub mod seed;

pub use config::{load_dotenv, DbConfig};
pub use error::{ErrorClass, ProvisionError, Result};
pub use provision::{Provisioner, SeedReport, TransactionMode};
pub use render::{Cell, Frame, OutputFormat};
pub use schema::{Table, CREATION_ORDER};
pub use seed::SeedSet;
