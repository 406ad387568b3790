//! End-to-end walkthrough against a SQLite database.
//!
//! Run with: cargo run --example walkthrough
//! Pass --db some/path.db to work against a file instead of memory.

use clap::Parser;
use tagsql::prelude::*;

#[derive(Parser, Debug)]
#[command(about = "Tagged-parameter query engine walkthrough")]
struct Args {
    /// Database path; the default stays in memory.
    #[arg(long, default_value = ":memory:")]
    db: String,

    /// Tracing filter, e.g. "tagsql=debug".
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&args.log))
        .init();

    let mut config = DbConfig::default();
    config.set(ConfigField::Dbname, &args.db);
    let mut session = SqlSession::new(SqliteConnector, config);

    println!("Creating tables...");
    session.run(
        "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT, age INT, balance REAL)",
        ParamDescriptor::none(),
    )?;
    session.run(
        "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INT, title TEXT)",
        ParamDescriptor::none(),
    )?;

    // Tags drive the coercion: 'i' extracts a leading integer even from
    // text, 'd' a float, 's' escapes text for storage.
    println!("Inserting one user from stringly-typed input...");
    let outcome = session.run(
        "INSERT INTO users (name, age, balance) VALUES (?, ?, ?)",
        ParamDescriptor::row(
            "sid",
            vec![
                FieldValue::Text("Alice O'Brien".into()),
                FieldValue::Text("28 years".into()),
                FieldValue::Text("1250.50".into()),
            ],
        ),
    )?;
    let alice = outcome.as_insert_id().unwrap_or_default();
    println!("  new user id: {alice}");

    println!("Batch-inserting posts...");
    let outcome = session.run_multi_insert(
        "INSERT INTO posts (user_id, title) VALUES (?, ?)",
        "is",
        vec![
            vec![FieldValue::Int(alice as i64), FieldValue::Text("First post".into())],
            vec![FieldValue::Int(alice as i64), FieldValue::Text("\"Quotes\" work".into())],
        ],
    )?;
    if let Some(entries) = outcome.as_batch() {
        for (i, entry) in entries.iter().enumerate() {
            match entry {
                Ok(id) => println!("  row {}: id {id}", i + 1),
                Err(e) => println!("  row {}: {e}", i + 1),
            }
        }
    }

    println!("Joining; the duplicate id column is renamed...");
    let outcome = session.run(
        "SELECT users.id, users.name, posts.id, posts.title FROM users \
         JOIN posts ON posts.user_id = users.id ORDER BY posts.id",
        ParamDescriptor::none(),
    )?;
    if let Some(rows) = outcome.as_rows() {
        println!("  columns: {:?}", rows.labels());
        for row in rows {
            println!(
                "  {} wrote {:?} (post {})",
                row.get("name").and_then(|v| v.as_text()).unwrap_or("?"),
                row.get("title").and_then(|v| v.as_text()).unwrap_or("?"),
                row.get("id_2").and_then(|v| v.as_int()).copied().unwrap_or(0),
            );
        }
    }

    println!("Catalog listings...");
    println!("  tables: {:?}", session.show_tables()?);
    println!("  users columns: {:?}", session.show_columns_from("users")?);

    // A bad descriptor fails locally; the driver never sees it, and the
    // session keeps working.
    println!("Provoking an arity error...");
    let err = session
        .run(
            "INSERT INTO posts (user_id, title) VALUES (?, ?)",
            ParamDescriptor::row("i", vec![FieldValue::Int(1)]),
        )
        .unwrap_err();
    println!("  rejected: {err}");

    let t = session.telemetry();
    println!("Telemetry of the last call:");
    println!("  sql:        {}", t.last_sql);
    println!("  params:     {}", t.last_param_count);
    println!("  duration:   {}us", t.last_duration_micros);

    Ok(())
}
