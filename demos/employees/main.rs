//! foliodb demo - employee directory.
//!
//! Seeds a handful of employee records through the flat-file backend,
//! reads them back, then runs the same data through the embedded backend
//! and queries it with a filter.
//!
//! Run with: cargo run -p employees

use folio_core::{Config, EmbeddedStore, FlatFileStore, Record};
use serde_json::json;
use tracing::info;

fn record(value: serde_json::Value) -> Record {
    value.as_object().expect("demo records are objects").clone()
}

fn employees() -> Vec<Record> {
    vec![
        record(json!({
            "Name": "Karn", "Age": "23", "Company": "Myrl Tech",
            "Address": {"City": "Bangkok", "Country": "Thailand", "Pincode": "410013"}
        })),
        record(json!({
            "Name": "Naphob", "Age": "25", "Company": "Google",
            "Address": {"City": "Chantaburi", "Country": "Thailand", "Pincode": "410013"}
        })),
        record(json!({
            "Name": "Thanakarn", "Age": "27", "Company": "Microsoft",
            "Address": {"City": "Lop Buri", "Country": "Thailand", "Pincode": "410013"}
        })),
        record(json!({
            "Name": "Pawn", "Age": "29", "Company": "Facebook",
            "Address": {"City": "Tak", "Country": "Thailand", "Pincode": "410013"}
        })),
    ]
}

fn run_flat_file() -> Result<(), Box<dyn std::error::Error>> {
    let store = FlatFileStore::open("./data", Config::default())?;

    for employee in employees() {
        let name = employee["Name"].as_str().unwrap_or_default().to_lowercase();
        store.write("users", &name, &employee)?;
    }

    let karn = store.read("users", "karn")?;
    info!(name = %karn["Name"], "read back record");

    let all = store.read_all("users")?;
    info!(count = all.len(), "flat-file collection seeded");
    Ok(())
}

fn run_embedded() -> Result<(), Box<dyn std::error::Error>> {
    let store = EmbeddedStore::open(Config::default().db_name("employees"))?;

    for employee in employees() {
        let id = store.coll("users").insert(&employee)?;
        info!(id, name = %employee["Name"], "inserted record");
    }

    let from_google = store
        .coll("users")
        .eq(record(json!({"Company": "Google"})))
        .find()?;
    info!(count = from_google.len(), "matched records at Google");

    let promoted = store
        .coll("users")
        .eq(record(json!({"Name": "Karn"})))
        .update(&record(json!({"Company": "Remote-Teams"})))?;
    info!(count = promoted.len(), "updated records");

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run_flat_file() {
        eprintln!("flat-file demo failed: {e}");
        std::process::exit(1);
    }
    if let Err(e) = run_embedded() {
        eprintln!("embedded demo failed: {e}");
        std::process::exit(1);
    }
}
