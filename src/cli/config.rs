//! Configuration commands

use crate::audit::Whitelist;
use crate::config::{AuditPaths, Settings, SourceSettings};
use crate::error::AuditResult;

/// Handle the init command
///
/// Writes a default `config.json` unless a settings file already exists.
pub fn handle_init_command(paths: &AuditPaths, settings: &Settings) -> AuditResult<()> {
    if paths.is_initialized() {
        println!("Already initialized at: {}", paths.base_dir().display());
        return Ok(());
    }

    settings.save(paths)?;
    println!("Initialized audit-stash at: {}", paths.base_dir().display());
    println!("Edit {} to configure tracked sources.", paths.settings_file().display());

    Ok(())
}

/// Handle the config command
pub fn handle_config_command(paths: &AuditPaths, settings: &Settings) -> AuditResult<()> {
    println!("audit-stash Configuration");
    println!("=========================");
    println!();
    println!("Base directory: {}", paths.base_dir().display());
    println!("Settings file:  {}", paths.settings_file().display());
    println!("Audit log:      {}", settings.audit_log_path(paths).display());
    println!();
    println!("Default policy:");
    print!("{}", describe_source(&settings.default));

    if settings.sources.is_empty() {
        println!();
        println!("No sources configured.");
    }
    for (name, source) in &settings.sources {
        println!();
        println!("Source '{}':", name);
        print!("{}", describe_source(source));
    }

    if !settings.meta.is_empty() {
        println!();
        println!("Meta:");
        for (key, value) in &settings.meta {
            println!("  {}: {}", key, value);
        }
    }

    Ok(())
}

fn describe_source(source: &SourceSettings) -> String {
    let whitelist = match &source.whitelist {
        Whitelist::Unset => "(schema, else all fields)".to_string(),
        Whitelist::UseSchema => "(schema)".to_string(),
        Whitelist::Explicit(fields) => fields.join(", "),
    };
    let blacklist = if source.blacklist.is_empty() {
        "(none)".to_string()
    } else {
        source.blacklist.join(", ")
    };

    let mut output = format!("  Whitelist: {}\n  Blacklist: {}\n", whitelist, blacklist);
    if let Some(schema) = &source.schema {
        output.push_str(&format!("  Schema:    {}\n", schema.join(", ")));
    }
    output
}
