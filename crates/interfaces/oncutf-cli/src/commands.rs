use anyhow::{bail, Context, Result};
use humansize::{format_size, DECIMAL};
use oncutf_core::ConflictResolution;
use oncutf_engine::{ConflictCallback, PostTransform, RenameModule};
use oncutf_services::CoreServices;

use crate::parse_modules_json;

fn load_modules(modules_json: Option<&str>) -> Result<Vec<Box<dyn RenameModule>>> {
    match modules_json {
        Some(json) => parse_modules_json(json),
        None => Ok(Vec::new()),
    }
}

fn load_post_transform(post_transform_json: Option<&str>) -> Result<PostTransform> {
    match post_transform_json {
        Some(json) => serde_json::from_str(json).context("--post-transform is not valid JSON"),
        None => Ok(PostTransform::default()),
    }
}

/// Always resolves collisions by overwriting the existing file, for `rename --overwrite`.
struct AlwaysOverwrite;

impl ConflictCallback for AlwaysOverwrite {
    fn resolve(&self, _old_name: &str, _new_name: &str) -> ConflictResolution {
        ConflictResolution::Overwrite
    }
}

pub fn cmd_preview(
    services: &CoreServices,
    files: Vec<String>,
    modules_json: Option<&str>,
    post_transform_json: Option<&str>,
) -> Result<()> {
    let modules = load_modules(modules_json)?;
    let post_transform = load_post_transform(post_transform_json)?;

    services.rename_engine.select_files(files);
    let preview = services.rename_engine.preview(&modules, &post_transform);
    let validation = services.rename_engine.validate();

    for (pair, item) in preview.name_pairs.iter().zip(validation.items.iter()) {
        let mut markers = Vec::new();
        if item.is_duplicate {
            markers.push("DUPLICATE".to_string());
        }
        if !item.is_valid {
            markers.push(format!("INVALID: {}", item.error_message.as_deref().unwrap_or("unsafe filename")));
        }
        if item.is_unchanged {
            markers.push("unchanged".to_string());
        }
        let suffix = if markers.is_empty() { String::new() } else { format!("  [{}]", markers.join(", ")) };
        println!("{} -> {}{}", pair.old_name, pair.new_name, suffix);
    }

    for error in &preview.errors {
        println!("error: {error}");
    }

    Ok(())
}

pub fn cmd_rename(
    services: &CoreServices,
    files: Vec<String>,
    modules_json: Option<&str>,
    post_transform_json: Option<&str>,
    dry_run: bool,
    overwrite: bool,
) -> Result<()> {
    let modules = load_modules(modules_json)?;
    let post_transform = load_post_transform(post_transform_json)?;

    services.rename_engine.select_files(files.clone());
    let preview = services.rename_engine.preview(&modules, &post_transform);
    let validation = services.rename_engine.validate();

    if validation.has_errors {
        println!("refusing to rename: preview has invalid or duplicate names, run `preview` to inspect");
        return Ok(());
    }

    if dry_run {
        println!("dry run, {} file(s) would be renamed:", preview.name_pairs.len());
        for pair in &preview.name_pairs {
            println!("  {} -> {}", pair.old_name, pair.new_name);
        }
        return Ok(());
    }

    let new_names: Vec<String> = preview.name_pairs.iter().map(|p| p.new_name.clone()).collect();
    let callback: Option<&dyn ConflictCallback> = if overwrite { Some(&AlwaysOverwrite) } else { None };
    let result = services.rename_engine.execute(&files, &new_names, callback, None);

    let renames: Vec<(String, String)> = result
        .items
        .iter()
        .filter(|item| item.success)
        .map(|item| (item.old_path.clone(), item.new_path.clone()))
        .collect();

    if !renames.is_empty() {
        let modules_json_str = serde_json::to_string(&modules.iter().map(|m| m.config_json()).collect::<Vec<_>>())?;
        let post_transform_json_str = serde_json::to_string(&post_transform)?;
        let operation_id =
            services.history.record_batch(&renames, Some(&modules_json_str), Some(&post_transform_json_str))?;
        println!("renamed {} file(s), recorded as operation {operation_id}", renames.len());
    } else {
        println!("no files were renamed");
    }

    for item in &result.items {
        if !item.success {
            let reason = item.error_message.as_deref().or(item.skip_reason.as_deref()).unwrap_or("unknown");
            println!("  skipped {}: {reason}", item.old_path);
        }
    }

    Ok(())
}

pub fn cmd_undo(services: &CoreServices, operation_id: Option<String>, last: bool) -> Result<()> {
    let operation_id = resolve_operation_id(services, operation_id, last)?;
    let (success, message, _files) = services.history.undo(&operation_id)?;
    println!("{message}");
    if !success {
        bail!("undo did not fully succeed");
    }
    Ok(())
}

fn resolve_operation_id(services: &CoreServices, operation_id: Option<String>, last: bool) -> Result<String> {
    if let Some(id) = operation_id {
        return Ok(id);
    }
    if last {
        let recent = services.history.recent_operations(1)?;
        let (summary, _) = recent.into_iter().next().context("no rename operations recorded yet")?;
        return Ok(summary.operation_id);
    }
    bail!("either an operation id or --last is required")
}

pub fn cmd_history(services: &CoreServices, limit: usize) -> Result<()> {
    let recent = services.history.recent_operations(limit)?;
    if recent.is_empty() {
        println!("no rename operations recorded yet");
        return Ok(());
    }
    for (summary, display_text) in recent {
        println!("{}  {display_text}", summary.operation_id);
    }
    Ok(())
}

pub fn cmd_stats(services: &CoreServices) -> Result<()> {
    let stats = services.metadata_cache.stats()?;
    println!("store:");
    println!("  paths:          {}", stats.store_stats.paths);
    println!("  metadata rows:  {}", stats.store_stats.metadata);
    println!("  hash rows:      {}", stats.store_stats.hashes);
    println!("  rename entries: {}", stats.store_stats.rename_entries);
    println!("metadata cache:");
    println!("  hot entries:    {}", stats.hot_size);
    println!("  hit rate:       {:.1}%", stats.hit_rate * 100.0);
    println!("  hits/misses:    {}/{}", stats.hits, stats.misses);

    if let Ok(metadata) = std::fs::metadata(services.store_path()) {
        println!("store file size: {}", format_size(metadata.len(), DECIMAL));
    }
    Ok(())
}

pub fn cmd_snapshot_create(services: &CoreServices, reason: &str) -> Result<()> {
    match services.snapshots.create(reason)? {
        Some(path) => println!("wrote snapshot: {path}"),
        None => println!("no store file to snapshot yet"),
    }
    Ok(())
}

pub fn cmd_snapshot_list(services: &CoreServices) -> Result<()> {
    let backups = services.snapshots.list_backups();
    if backups.is_empty() {
        println!("no snapshots yet");
        return Ok(());
    }
    for path in backups {
        println!("{path}");
    }
    Ok(())
}

pub fn cmd_snapshot_rotate(services: &CoreServices) -> Result<()> {
    services.snapshots.rotate_now();
    let status = services.snapshots.status();
    println!("rotated; {} snapshot(s) retained", status.backup_count);
    Ok(())
}

pub fn cmd_cleanup_orphans(services: &CoreServices) -> Result<()> {
    let removed = services.metadata_cache.cleanup_orphans()?;
    println!("removed {removed} orphaned record(s)");
    Ok(())
}
