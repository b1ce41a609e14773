//! Parses the `--modules` flag's JSON array into the rename engine's module chain.
//! Mirrors each module's own `config_json()` output shape (`{"kind": ..., ...}`), so
//! a preview's recorded `modules_json` can be fed straight back in.

use anyhow::{bail, Context, Result};
use oncutf_engine::{CounterModule, HashFieldModule, MetadataFieldModule, RenameModule, TextModule};
use serde_json::Value;

pub fn parse_modules_json(json: &str) -> Result<Vec<Box<dyn RenameModule>>> {
    let value: Value = serde_json::from_str(json).context("--modules is not valid JSON")?;
    let Value::Array(items) = value else {
        bail!("--modules must be a JSON array of module objects");
    };

    items.iter().map(parse_module).collect()
}

fn parse_module(value: &Value) -> Result<Box<dyn RenameModule>> {
    let kind = value.get("kind").and_then(Value::as_str).context("module object is missing a \"kind\" field")?;

    let module: Box<dyn RenameModule> = match kind {
        "text" => Box::new(TextModule {
            find: value.get("find").and_then(Value::as_str).map(str::to_string),
            replace: value.get("replace").and_then(Value::as_str).unwrap_or_default().to_string(),
        }),
        "counter" => Box::new(CounterModule {
            start: value.get("start").and_then(Value::as_i64).unwrap_or(1),
            step: value.get("step").and_then(Value::as_i64).unwrap_or(1),
            padding: value.get("padding").and_then(Value::as_u64).unwrap_or(0) as usize,
            separator: value.get("separator").and_then(Value::as_str).unwrap_or("_").to_string(),
        }),
        "metadata_field" => Box::new(MetadataFieldModule {
            key: value.get("key").and_then(Value::as_str).context("metadata_field module requires \"key\"")?.to_string(),
            separator: value.get("separator").and_then(Value::as_str).unwrap_or("_").to_string(),
        }),
        "hash_field" => Box::new(HashFieldModule {
            separator: value.get("separator").and_then(Value::as_str).unwrap_or("_").to_string(),
        }),
        other => bail!("unknown module kind: {other}"),
    };

    Ok(module)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_mixed_module_chain() {
        let json = r#"[
            {"kind": "text", "find": "a", "replace": "b"},
            {"kind": "counter", "start": 1, "step": 1, "padding": 3, "separator": "_"}
        ]"#;
        let modules = parse_modules_json(json).unwrap();
        assert_eq!(modules.len(), 2);
    }

    #[test]
    fn rejects_an_unknown_kind() {
        let json = r#"[{"kind": "bogus"}]"#;
        assert!(parse_modules_json(json).is_err());
    }

    #[test]
    fn rejects_non_array_input() {
        assert!(parse_modules_json(r#"{"kind": "text"}"#).is_err());
    }
}
