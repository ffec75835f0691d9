//! Toy host application.
//!
//! Registers two steps against an in-process schema and hands control to the
//! migration CLI:
//!
//! ```text
//! cargo run --example schema_demo -- --from null --to user_table_add_column --user alice
//! cargo run --example schema_demo -- --list
//! ```

use std::collections::BTreeMap;

use rustmigrate::cli::migrate_main;
use rustmigrate::{Registry, Step};

/// Table name -> column names
type Schema = BTreeMap<String, Vec<String>>;

fn main() {
    let mut registry: Registry<Schema> = Registry::new();

    let steps = [
        Step::new("user_table_start")
            .with_level("mig0001")
            .with_forward(|db: &mut Schema| {
                db.insert("users".into(), vec!["id".into()]);
                Ok(())
            })
            .with_backward(|db: &mut Schema| {
                db.remove("users");
                Ok(())
            }),
        Step::new("user_table_add_column")
            .with_level("mig0002")
            .with_forward(|db: &mut Schema| {
                let columns = db.get_mut("users").ok_or("table users does not exist")?;
                columns.push("email".into());
                Ok(())
            })
            .with_backward(|db: &mut Schema| {
                let columns = db.get_mut("users").ok_or("table users does not exist")?;
                columns.retain(|c| c != "email");
                Ok(())
            }),
    ];

    for step in steps {
        if let Err(err) = registry.register(step) {
            eprintln!("✗ {}", err);
            std::process::exit(1);
        }
    }

    let mut schema = Schema::new();
    migrate_main(&registry, &mut schema);
}
