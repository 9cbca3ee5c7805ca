//! Single-statement access to the `books` table.
//!
//! Identifiers arrive as path text and are bound unchanged; SQLite applies the
//! column's integer affinity when comparing, so `"4"` matches row 4 and
//! non-numeric text simply matches nothing.

use bookshelf_db::{Database, DbError, Migration};
use rusqlite::{params, OptionalExtension, Row};

use super::models::{Book, BookPayload};

const CREATE_BOOKS: &str = r#"
    CREATE TABLE IF NOT EXISTS books (
        id      INTEGER PRIMARY KEY,
        name    TEXT,
        img     TEXT,
        summary TEXT
    );
"#;

const SEED_BOOKS: &str = r#"
    INSERT INTO books (name, img, summary) VALUES (
        'Harry Potter and the Order of the Phoenix',
        'https://bit.ly/2IcnSwz',
        'Harry Potter and Dumbledore''s warning about the return of Lord Voldemort is not heeded by the wizard authorities who, in turn, look to undermine Dumbledore''s authority at Hogwarts and discredit Harry.'
    );
    INSERT INTO books (name, img, summary) VALUES (
        'The Lord of the Rings: The Fellowship of the Ring',
        'https://bit.ly/2tC1Lcg',
        'A young hobbit, Frodo, who has found the One Ring that belongs to the Dark Lord Sauron, begins his journey with eight companions to Mount Doom, the only place where it can be destroyed.'
    );
    INSERT INTO books (name, img, summary) VALUES (
        'Avengers: Endgame',
        'https://bit.ly/2Pzczlb',
        'Adrift in space with no food or water, Tony Stark sends a message to Pepper Potts as his oxygen supply starts to dwindle. Meanwhile, the remaining Avengers -- Thor, Black Widow, Captain America, and Bruce Banner -- must figure out a way to bring back their vanquished allies for an epic showdown with Thanos -- the evil demigod who decimated the planet and the universe.'
    );
"#;

/// Schema and seed migrations for the books table.
pub fn migrations() -> Vec<Migration> {
    vec![
        Migration {
            id: "001_create_books",
            up: CREATE_BOOKS,
        },
        Migration {
            id: "002_seed_books",
            up: SEED_BOOKS,
        },
    ]
}

/// Books repository over the shared database handle.
#[derive(Clone)]
pub struct BookRepository {
    db: Database,
}

impl BookRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// All books in storage order.
    pub async fn list(&self) -> Result<Vec<Book>, DbError> {
        self.db
            .call(|conn| {
                let mut stmt = conn.prepare("SELECT id, name, img, summary FROM books")?;
                let books = stmt
                    .query_map([], book_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(books)
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Book>, DbError> {
        let id = id.to_string();
        self.db
            .call(move |conn| {
                conn.query_row(
                    "SELECT id, name, img, summary FROM books WHERE id = ?1",
                    params![id],
                    book_from_row,
                )
                .optional()
            })
            .await
    }

    /// Insert a book and return its new id.
    pub async fn create(&self, payload: BookPayload) -> Result<i64, DbError> {
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO books (name, img, summary) VALUES (?1, ?2, ?3)",
                    params![payload.name, payload.img, payload.summary],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await
    }

    /// Overwrite all three fields. Returns `false` when no row has `id`.
    pub async fn update(&self, id: &str, payload: BookPayload) -> Result<bool, DbError> {
        let id = id.to_string();
        let changed = self
            .db
            .call(move |conn| {
                conn.execute(
                    "UPDATE books SET name = ?1, img = ?2, summary = ?3 WHERE id = ?4",
                    params![payload.name, payload.img, payload.summary, id],
                )
            })
            .await?;
        Ok(changed > 0)
    }

    /// Returns `false` when no row has `id`.
    pub async fn delete(&self, id: &str) -> Result<bool, DbError> {
        let id = id.to_string();
        let changed = self
            .db
            .call(move |conn| conn.execute("DELETE FROM books WHERE id = ?1", params![id]))
            .await?;
        Ok(changed > 0)
    }

    /// Check the storage connection is still answering.
    pub async fn ping(&self) -> Result<(), DbError> {
        self.db.ping().await
    }

    pub async fn count(&self) -> Result<i64, DbError> {
        self.db
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM books", [], |row| row.get(0)))
            .await
    }
}

fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    Ok(Book {
        id: row.get(0)?,
        name: row.get(1)?,
        img: row.get(2)?,
        summary: row.get(3)?,
    })
}
