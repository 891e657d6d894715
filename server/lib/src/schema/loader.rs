//! Load attribute definitions from JSON.
//!
//! A schema source is a document of the form `{ "attrs": [ ... ] }`. Sources can
//! be given as strings, single files, or a directory, in which case every
//! `*.json` file is read in name order. Problems are collected across every
//! source and reported together when the loader is finished, so a broken schema
//! shows all of its faults in one pass.

use std::collections::BTreeSet;
use std::convert::TryFrom;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde::Deserialize;

use super::{AttributeInfo, AttributeSchema, ValueBounds, Version};
use crate::prelude::*;
use crate::value::{parse_duration_ms, AttributeCardinality, AttributeFlag, AttributeType, EntryClass};

/// `min` and `max` can be written as JSON numbers or strings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum BoundValue {
    Number(i64),
    Text(String),
}

impl BoundValue {
    fn as_string(&self) -> String {
        match self {
            BoundValue::Number(n) => n.to_string(),
            BoundValue::Text(s) => s.trim().to_string(),
        }
    }
}

/// One attribute definition as written in a schema source.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: Option<String>,
    pub cardinality: Option<String>,
    pub min: Option<BoundValue>,
    pub max: Option<BoundValue>,
    /// Allowed values for `enum`, or the pattern for `regex`.
    pub value: Option<String>,
    #[serde(default)]
    pub immutable: bool,
    #[serde(default)]
    pub required_in: Vec<String>,
    #[serde(default)]
    pub optional_in: Vec<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    pub callback: Option<String>,
    /// Comma separated, one version per release line.
    pub since: Option<String>,
    pub deprecated_since: Option<String>,
    pub deprecate_desc: Option<String>,
    pub desc: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDocument {
    attrs: Vec<AttributeDefinition>,
}

#[derive(Debug, Default)]
pub struct SchemaLoader {
    schema: AttributeSchema,
    errors: Vec<SchemaError>,
}

impl SchemaLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Problems recorded so far.
    pub fn errors(&self) -> &[SchemaError] {
        &self.errors
    }

    fn record(&mut self, source: &str, err: SchemaError) {
        schema_error!(%source, %err, "rejected schema definition");
        self.errors.push(err);
    }

    #[instrument(level = "debug", skip(self, src))]
    pub fn load_str(&mut self, src: &str, source: &str) {
        let doc: SchemaDocument = match serde_json::from_str(src) {
            Ok(doc) => doc,
            Err(e) => {
                self.record(
                    source,
                    SchemaError::invalid_definition(source, format!("unparseable source: {}", e)),
                );
                return;
            }
        };

        let count = doc.attrs.len();
        for def in doc.attrs {
            self.load_definition(def, source);
        }
        schema_info!(%source, count, "loaded attribute definitions");
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), OperationError> {
        let contents = fs::read_to_string(path).map_err(|e| {
            admin_error!(?e, path = %path.display(), "unable to read schema file");
            OperationError::FsError
        })?;
        self.load_str(&contents, &path.display().to_string());
        Ok(())
    }

    /// Load every `*.json` file in `path`, sorted by file name.
    pub fn load_dir(&mut self, path: &Path) -> Result<(), OperationError> {
        let read_dir = fs::read_dir(path).map_err(|e| {
            admin_error!(?e, path = %path.display(), "unable to read schema directory");
            OperationError::FsError
        })?;

        let mut files: Vec<PathBuf> = read_dir
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file() && p.extension().map(|e| e == "json").unwrap_or(false))
            .collect();
        files.sort();

        if files.is_empty() {
            schema_warn!(path = %path.display(), "no schema files found");
        }

        files.iter().try_for_each(|f| self.load_file(f))
    }

    /// Consume the loader, yielding the schema if every definition was valid.
    pub fn finish(self) -> Result<AttributeSchema, OperationError> {
        if self.errors.is_empty() {
            schema_info!(attrs = self.schema.len(), "schema loaded");
            Ok(self.schema)
        } else {
            let summary = self
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            Err(OperationError::InvalidSchemaState(format!(
                "{} error(s): {}",
                self.errors.len(),
                summary
            )))
        }
    }

    fn load_definition(&mut self, def: AttributeDefinition, source: &str) {
        match build_info(def) {
            Ok(info) => {
                if let Err(e) = self.schema.insert(info) {
                    self.record(source, e);
                }
            }
            Err(errs) => {
                for e in errs {
                    self.record(source, e);
                }
            }
        }
    }
}

fn build_info(def: AttributeDefinition) -> Result<AttributeInfo, Vec<SchemaError>> {
    let name = def.name.trim().to_string();
    let mut errs = Vec::new();
    let mut fail = |reason: String| errs.push(SchemaError::invalid_definition(&name, reason));

    if name.is_empty() {
        fail("attribute name is empty".to_string());
    }

    let attr_type = match def.attr_type.as_deref() {
        Some(t) => match AttributeType::try_from(t) {
            Ok(at) => Some(at),
            Err(_) => {
                schema_warn!(attr = %name, attr_type = %t, "unknown attribute type, values will not be checked");
                None
            }
        },
        None => {
            schema_warn!(attr = %name, "attribute has no type, values will not be checked");
            None
        }
    };

    let mut info = AttributeInfo::new(&name, attr_type);
    info.description = def.desc;
    info.immutable = def.immutable;
    info.callback = def.callback.as_deref().map(AttrString::from);

    match def.cardinality.as_deref().map(AttributeCardinality::try_from) {
        Some(Ok(c)) => info.cardinality = c,
        Some(Err(_)) => fail(format!(
            "invalid cardinality {}",
            def.cardinality.as_deref().unwrap_or_default()
        )),
        None => {}
    }

    let min = def.min.as_ref().map(BoundValue::as_string);
    let max = def.max.as_ref().map(BoundValue::as_string);
    match parse_bounds(attr_type, min.as_deref(), max.as_deref()) {
        Ok(Some(bounds)) => info.bounds = bounds,
        Ok(None) => {}
        Err(reason) => fail(reason),
    }

    match (attr_type, def.value) {
        (Some(AttributeType::Enum), Some(v)) => {
            info.enum_values = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
            if info.enum_values.is_empty() {
                fail("enum attribute has an empty value list".to_string());
            }
        }
        (Some(AttributeType::Enum), None) => {
            fail("enum attribute requires a value list".to_string())
        }
        (Some(AttributeType::Regex), Some(v)) => match Regex::new(&format!("^(?:{})$", v)) {
            Ok(re) => info.regex = Some(re),
            Err(e) => fail(format!("invalid regex {}: {}", v, e)),
        },
        (Some(AttributeType::Regex), None) => {
            fail("regex attribute requires a pattern".to_string())
        }
        (_, Some(_)) => fail("value is only allowed for enum and regex types".to_string()),
        (_, None) => {}
    }

    info.required_in = parse_classes(&def.required_in, &mut fail);
    info.optional_in = parse_classes(&def.optional_in, &mut fail);

    for raw in def.flags.iter() {
        match AttributeFlag::try_from(raw.as_str()) {
            Ok(flag) => {
                info.flags.insert(flag);
                if flag == AttributeFlag::AccountCosDomainInherited {
                    info.flags.insert(AttributeFlag::AccountInherited);
                }
            }
            Err(_) => fail(format!("unknown flag {}", raw)),
        }
    }
    for flag in info.flags.iter() {
        for class in flag.required_classes() {
            if !info.required_in.contains(class) && !info.optional_in.contains(class) {
                fail(format!(
                    "flag {} requires the attribute to be in class {}",
                    flag, class
                ));
            }
        }
    }

    if let Some(since) = def.since.as_deref() {
        for v in since.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match v.parse::<Version>() {
                Ok(v) => info.since.push(v),
                Err(e) => fail(format!("since: {}", e)),
            }
        }
        info.since.sort();
    }

    match (def.deprecated_since.as_deref(), def.deprecate_desc) {
        (Some(v), Some(desc)) => {
            match v.parse::<Version>() {
                Ok(v) => info.deprecated_since = Some(v),
                Err(e) => fail(format!("deprecatedSince: {}", e)),
            }
            info.deprecate_desc = Some(desc);
        }
        (None, None) => {}
        _ => fail("deprecatedSince and deprecateDesc must be set together".to_string()),
    }

    if errs.is_empty() {
        Ok(info)
    } else {
        Err(errs)
    }
}

fn parse_classes(raw: &[String], fail: &mut impl FnMut(String)) -> BTreeSet<EntryClass> {
    raw.iter()
        .filter_map(|c| match EntryClass::try_from(c.as_str()) {
            Ok(class) => Some(class),
            Err(_) => {
                fail(format!("unknown class {}", c));
                None
            }
        })
        .collect()
}

/// Work out the bounds for a definition. `Ok(None)` keeps the type default.
fn parse_bounds(
    attr_type: Option<AttributeType>,
    min: Option<&str>,
    max: Option<&str>,
) -> Result<Option<ValueBounds>, String> {
    if min.is_none() && max.is_none() {
        return Ok(None);
    }
    let Some(attr_type) = attr_type else {
        return Ok(None);
    };

    if attr_type.is_length_bounded() {
        if min.is_some() {
            return Err(format!("min is not supported for type {}", attr_type));
        }
        return match max.map(str::parse::<usize>) {
            Some(Ok(max)) => Ok(Some(ValueBounds::Length { max })),
            _ => Err(format!("invalid max length {}", max.unwrap_or_default())),
        };
    }

    let ValueBounds::Numeric {
        min: type_min,
        max: type_max,
    } = AttributeInfo::default_bounds(attr_type)
    else {
        return Err(format!("min/max are not supported for type {}", attr_type));
    };

    let parse = |raw: &str| -> Result<i64, String> {
        let v = if attr_type == AttributeType::Duration {
            parse_duration_ms(raw)
        } else {
            raw.parse::<i64>().ok()
        };
        match v {
            Some(v) if (type_min..=type_max).contains(&v) => Ok(v),
            _ => Err(format!("invalid bound {} for type {}", raw, attr_type)),
        }
    };

    let min = min.map(parse).transpose()?.unwrap_or(type_min);
    let max = max.map(parse).transpose()?.unwrap_or(type_max);
    if min > max {
        return Err(format!("min {} is greater than max {}", min, max));
    }
    Ok(Some(ValueBounds::Numeric { min, max }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load(src: &str) -> Result<AttributeSchema, OperationError> {
        let mut loader = SchemaLoader::new();
        loader.load_str(src, "test");
        loader.finish()
    }

    fn load_errors(src: &str) -> Vec<SchemaError> {
        let mut loader = SchemaLoader::new();
        loader.load_str(src, "test");
        loader.errors().to_vec()
    }

    #[test]
    fn test_load_minimal_definition() {
        sketching::test_init();
        let s = load(r#"{ "attrs": [ { "name": "description", "type": "string" } ] }"#)
            .expect("failed to load");
        let ai = s.get_attribute_info("description").expect("missing");
        assert_eq!(ai.cardinality, AttributeCardinality::Single);
        assert_eq!(ai.bounds, ValueBounds::Unbounded);
        assert!(!ai.immutable);
        assert!(ai.since.is_empty());
    }

    #[test]
    fn test_duplicate_definition_is_case_folded() {
        let errs = load_errors(
            r#"{ "attrs": [
                { "name": "mailHost", "type": "string" },
                { "name": "MAILHOST", "type": "string" }
            ] }"#,
        );
        assert_eq!(errs, vec![SchemaError::DuplicateDefinition("MAILHOST".to_string())]);
    }

    #[test]
    fn test_all_errors_are_reported() {
        let r = load(
            r#"{ "attrs": [
                { "name": "a", "type": "integer", "min": "10", "max": "5" },
                { "name": "b", "type": "string", "deprecatedSince": "8.0.0" },
                { "name": "c", "type": "string", "flags": ["domainInherited"], "optionalIn": ["domain"] },
                { "name": "d", "type": "enum" },
                { "name": "e", "type": "string", "requiredIn": ["group"] },
                { "name": "f", "type": "regex", "value": "(" },
                { "name": "g", "type": "string", "since": "8.x" },
                { "name": "", "type": "string" }
            ] }"#,
        );
        match r {
            Err(OperationError::InvalidSchemaState(msg)) => {
                assert!(msg.starts_with("8 error(s)"), "{}", msg);
                assert!(msg.contains("requires the attribute to be in class globalConfig"));
            }
            r => panic!("unexpected {:?}", r),
        }
    }

    #[test]
    fn test_unknown_type_is_accepted() {
        let s = load(r#"{ "attrs": [ { "name": "blob", "type": "binary" }, { "name": "raw" } ] }"#)
            .expect("failed to load");
        assert_eq!(s.get_attribute_type("blob"), None);
        assert_eq!(s.get_attribute_type("raw"), None);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_unparseable_source() {
        let errs = load_errors(r#"{ "attrs": [ { "name": "a", "bogus": true } ] }"#);
        assert_eq!(errs.len(), 1);
        let errs = load_errors("not json");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn test_bounds_by_type() {
        let s = load(
            r#"{ "attrs": [
                { "name": "i", "type": "integer", "min": 1 },
                { "name": "d", "type": "duration", "min": "1m", "max": "1h" },
                { "name": "s", "type": "string", "max": "32" },
                { "name": "p", "type": "port", "min": "1024" }
            ] }"#,
        )
        .expect("failed to load");
        let bounds = |n: &str| s.get_attribute_info(n).expect("missing").bounds;
        assert_eq!(
            bounds("i"),
            ValueBounds::Numeric {
                min: 1,
                max: i32::MAX as i64
            }
        );
        assert_eq!(
            bounds("d"),
            ValueBounds::Numeric {
                min: 60_000,
                max: 3_600_000
            }
        );
        assert_eq!(bounds("s"), ValueBounds::Length { max: 32 });
        assert_eq!(
            bounds("p"),
            ValueBounds::Numeric {
                min: 1024,
                max: 65535
            }
        );

        assert_eq!(
            load_errors(r#"{ "attrs": [ { "name": "i", "type": "integer", "max": "3000000000" } ] }"#)
                .len(),
            1
        );
        assert_eq!(
            load_errors(r#"{ "attrs": [ { "name": "b", "type": "boolean", "max": "1" } ] }"#).len(),
            1
        );
    }

    #[test]
    fn test_flags_and_versions() {
        let s = load(
            r#"{ "attrs": [
                { "name": "prefSkin", "type": "string",
                  "optionalIn": ["account", "cos", "domain"],
                  "flags": ["accountCosDomainInherited"],
                  "since": "9.0.0, 8.5.1",
                  "deprecatedSince": "10.0", "deprecateDesc": "use prefTheme" }
            ] }"#,
        )
        .expect("failed to load");
        assert!(s.is_account_cos_domain_inherited("prefSkin"));
        assert!(s.is_account_inherited("prefSkin"));
        let ai = s.get_attribute_info("prefskin").expect("missing");
        assert_eq!(ai.since, vec![Version::new(8, 5, 1), Version::new(9, 0, 0)]);
        assert!(ai.is_deprecated());
        assert_eq!(ai.deprecate_desc.as_deref(), Some("use prefTheme"));
    }

    #[test]
    fn test_load_dir_in_name_order() {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        let write = |name: &str, body: &str| {
            let mut f = fs::File::create(dir.path().join(name)).expect("failed to create file");
            f.write_all(body.as_bytes()).expect("failed to write");
        };
        write("20-second.json", r#"{ "attrs": [ { "name": "dup", "type": "integer" } ] }"#);
        write("10-first.json", r#"{ "attrs": [ { "name": "dup", "type": "string" } ] }"#);
        write("README.txt", "not a schema");

        let mut loader = SchemaLoader::new();
        loader.load_dir(dir.path()).expect("failed to read dir");
        assert_eq!(
            loader.errors(),
            &[SchemaError::DuplicateDefinition("dup".to_string())]
        );

        let mut loader = SchemaLoader::new();
        assert_eq!(
            loader.load_dir(&dir.path().join("missing")),
            Err(OperationError::FsError)
        );
    }
}
