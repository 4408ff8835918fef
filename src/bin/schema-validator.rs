//! Checks SCIM schema files the way [`SchemaRegistry`] loads them.
//!
//! ```bash
//! cargo run --bin schema-validator schemas/User.json
//! cargo run --bin schema-validator ./schemas/
//! ```
//!
//! Each schema file is checked on its own and its write and response
//! characteristics are listed. For a directory, the whole directory (with an
//! optional `ResourceTypes.json`) is then loaded as a registry and the
//! composed resource types are printed. Exits with status 1 on any failure.

use scim_core::error::SchemaResult;
use scim_core::schema::registry::{RESOURCE_TYPES_FILE, load_schema_from_file, validate_schema};
use scim_core::schema::{
    AttributeDefinition, Mutability, Returned, Schema, SchemaRegistry, Uniqueness,
};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

fn main() {
    let Some(target) = env::args().nth(1) else {
        eprintln!("usage: schema-validator <schema-file-or-directory>");
        process::exit(1);
    };
    let target = Path::new(&target);

    let files = if target.is_dir() {
        match schema_files(target) {
            Ok(files) => files,
            Err(e) => fail(&format!("cannot read {}: {}", target.display(), e)),
        }
    } else {
        vec![target.to_path_buf()]
    };

    let failures = files.iter().filter(|file| !check_file(file)).count();
    println!("\n{} of {} schema files valid", files.len() - failures, files.len());
    if failures > 0 {
        process::exit(1);
    }

    if target.is_dir() {
        check_registry(target);
    }
}

fn fail(message: &str) -> ! {
    eprintln!("error: {}", message);
    process::exit(1);
}

/// Schema JSON files in a directory, sorted, without the resource type file.
fn schema_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .filter(|path| path.file_name().and_then(|name| name.to_str()) != Some(RESOURCE_TYPES_FILE))
        .collect();
    paths.sort();
    Ok(paths)
}

fn load(path: &Path) -> SchemaResult<Schema> {
    let schema = load_schema_from_file(path)?;
    validate_schema(&schema)?;
    Ok(schema)
}

fn check_file(path: &Path) -> bool {
    match load(path) {
        Ok(schema) => {
            println!("ok   {} -> {} ({})", path.display(), schema.id, schema.name);
            describe(&schema);
            true
        }
        Err(e) => {
            eprintln!("FAIL {}: {}", path.display(), e);
            false
        }
    }
}

/// Attribute names by the characteristics the write and read paths act on.
fn describe(schema: &Schema) {
    let names = |keep: fn(&AttributeDefinition) -> bool| -> String {
        let names: Vec<&str> = schema
            .attributes
            .iter()
            .filter(|attr| keep(attr))
            .map(|attr| attr.name.as_str())
            .collect();
        if names.is_empty() { "-".to_string() } else { names.join(", ") }
    };

    println!("       required:   {}", names(|a| a.required));
    println!("       readOnly:   {}", names(|a| a.mutability == Mutability::ReadOnly));
    println!("       immutable:  {}", names(|a| a.mutability == Mutability::Immutable));
    println!("       never returned: {}", names(|a| a.returned == Returned::Never));
    println!("       unique:     {}", names(|a| a.uniqueness != Uniqueness::None));
}

fn check_registry(dir: &Path) {
    let registry = match SchemaRegistry::from_schema_dir(dir) {
        Ok(registry) => registry,
        Err(e) => fail(&format!("registry load failed: {}", e)),
    };

    for resource in registry.resource_schemas() {
        println!(
            "type {} at {} -> {}",
            resource.name(),
            resource.resource_type().endpoint,
            resource.id()
        );
        for extension in resource.extensions() {
            let marker = if extension.required { " (required)" } else { "" };
            println!("       + {}{}", extension.schema.id, marker);
        }
    }
}
