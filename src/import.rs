//! Ingestion pipeline: raw JSON/CSV/TSV in, validated capability forest out.
//!
//! JSON path: parse -> unwrap -> detect schema -> detect fields ->
//! normalize -> validate -> summarize. CSV/TSV path: parse rows -> detect
//! fields -> infer hierarchy from a level column when no parent column
//! exists -> normalize as flat or simple.

use crate::envelope::Warning;
use crate::error::AppError;
use crate::model::{summarize, CapabilityNode, ModelSummary, PropertyValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::Read;
use std::path::Path;

type Record = Map<String, Value>;

const INFERRED_PARENT_FIELD: &str = "__inferred_parent";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    Json,
    Csv,
    Tsv,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    /// Items embed their children in an array field.
    Nested,
    /// Items reference a parent by name or id.
    Flat,
    /// Plain list, no hierarchy signals.
    Simple,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetectedFields {
    pub name: Option<String>,
    pub description: Option<String>,
    pub children: Option<String>,
    pub parent: Option<String>,
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportOptions {
    pub name_field: Option<String>,
    pub desc_field: Option<String>,
    pub children_field: Option<String>,
    pub parent_field: Option<String>,
    pub id_field: Option<String>,
    pub level_field: Option<String>,
    pub unwrap: Option<String>,
    pub format: Option<InputFormat>,
    pub roots: Vec<String>,
}

#[derive(Debug)]
pub struct ImportResult {
    pub roots: Vec<CapabilityNode>,
    pub schema: SchemaType,
    pub fields: DetectedFields,
    pub summary: ModelSummary,
    pub warnings: Vec<Warning>,
}

// ---------------------------------------------------------------------------
// Input reading and format detection
// ---------------------------------------------------------------------------

pub fn read_input(path: Option<&Path>) -> Result<String, AppError> {
    match path {
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(AppError::Stdin)?;
            if buf.trim().is_empty() {
                return Err(AppError::EmptyInput {
                    message: "no data received on stdin".to_string(),
                });
            }
            Ok(buf)
        }
        Some(path) => {
            if !path.exists() {
                return Err(AppError::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            std::fs::read_to_string(path).map_err(|source| AppError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Format from the file extension; stdin and unknown extensions read as JSON.
pub fn detect_format(path: Option<&Path>) -> InputFormat {
    let Some(ext) = path.and_then(|p| p.extension()).and_then(|e| e.to_str()) else {
        return InputFormat::Json;
    };
    match ext.to_ascii_lowercase().as_str() {
        "csv" => InputFormat::Csv,
        "tsv" | "tab" => InputFormat::Tsv,
        _ => InputFormat::Json,
    }
}

// ---------------------------------------------------------------------------
// Field detection heuristics
// ---------------------------------------------------------------------------

const NAME_CANDIDATES: &[&str] = &[
    "name",
    "title",
    "label",
    "capability",
    "capabilityName",
    "capability_name",
];

const DESC_CANDIDATES: &[&str] = &[
    "description",
    "desc",
    "documentation",
    "doc",
    "summary",
    "details",
    "text",
];

const CHILDREN_CANDIDATES: &[&str] = &[
    "children",
    "subCapabilities",
    "sub_capabilities",
    "subcapabilities",
    "capabilities",
    "items",
    "nodes",
    "subs",
    "sub",
];

const PARENT_CANDIDATES: &[&str] = &[
    "parent",
    "parentName",
    "parent_name",
    "parentId",
    "parent_id",
    "parentCapability",
    "parent_capability",
];

const ID_CANDIDATES: &[&str] = &["id", "ID", "key", "code", "identifier"];

const LEVEL_CANDIDATES: &[&str] = &["level", "depth", "tier", "lvl"];

fn first_matching_key(obj: &Record, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find(|c| obj.contains_key(**c))
        .map(|c| c.to_string())
}

/// Name field: well-known candidates, else the first string-valued field.
pub fn find_name_field(obj: &Record, explicit: Option<&str>) -> Option<String> {
    if let Some(field) = explicit {
        return Some(field.to_string());
    }
    first_matching_key(obj, NAME_CANDIDATES)
        .or_else(|| obj.iter().find(|(_, v)| v.is_string()).map(|(k, _)| k.clone()))
}

pub fn find_desc_field(obj: &Record, explicit: Option<&str>) -> Option<String> {
    if let Some(field) = explicit {
        return Some(field.to_string());
    }
    first_matching_key(obj, DESC_CANDIDATES)
}

/// Children field: well-known candidates, else the first field holding an
/// array of objects.
pub fn find_children_field(obj: &Record, explicit: Option<&str>) -> Option<String> {
    if let Some(field) = explicit {
        return Some(field.to_string());
    }
    first_matching_key(obj, CHILDREN_CANDIDATES).or_else(|| {
        obj.iter()
            .find(|(_, v)| {
                v.as_array()
                    .is_some_and(|arr| !arr.is_empty() && arr[0].is_object())
            })
            .map(|(k, _)| k.clone())
    })
}

pub fn find_parent_field(obj: &Record, explicit: Option<&str>) -> Option<String> {
    if let Some(field) = explicit {
        return Some(field.to_string());
    }
    first_matching_key(obj, PARENT_CANDIDATES)
}

pub fn find_id_field(obj: &Record, explicit: Option<&str>) -> Option<String> {
    if let Some(field) = explicit {
        return Some(field.to_string());
    }
    first_matching_key(obj, ID_CANDIDATES)
}

pub fn find_level_field(obj: &Record, explicit: Option<&str>) -> Option<String> {
    if let Some(field) = explicit {
        return Some(field.to_string());
    }
    first_matching_key(obj, LEVEL_CANDIDATES)
}

// ---------------------------------------------------------------------------
// Unwrapping and schema detection
// ---------------------------------------------------------------------------

fn object_items(values: &[Value]) -> Vec<Record> {
    values
        .iter()
        .filter_map(|v| v.as_object().cloned())
        .collect()
}

/// Peel raw parsed JSON down to a list of record objects: a top-level
/// array, a single root node, a wrapper object around a children array, or
/// (as a guess) the first array-of-objects property.
pub fn unwrap_data(
    data: &Value,
    explicit: Option<&str>,
) -> Result<(Vec<Record>, Vec<Warning>), AppError> {
    let mut warnings = Vec::new();

    if let Some(property) = explicit {
        let Some(obj) = data.as_object() else {
            return Err(AppError::EmptyInput {
                message: format!("cannot unwrap property \"{property}\" from non-object data"),
            });
        };
        return match obj.get(property) {
            None => Err(AppError::EmptyInput {
                message: format!("property \"{property}\" not found in data"),
            }),
            Some(Value::Array(items)) => Ok((object_items(items), warnings)),
            Some(Value::Object(single)) => Ok((vec![single.clone()], warnings)),
            Some(_) => Err(AppError::EmptyInput {
                message: format!("property \"{property}\" is not an array or object"),
            }),
        };
    }

    if let Some(items) = data.as_array() {
        if items.is_empty() {
            return Err(AppError::EmptyInput {
                message: "input array is empty".to_string(),
            });
        }
        return Ok((object_items(items), warnings));
    }

    if let Some(obj) = data.as_object() {
        let name_field = find_name_field(obj, None);
        let children_field = find_children_field(obj, None);

        match (&name_field, &children_field) {
            // single root node, or a single childless capability
            (Some(_), _) => return Ok((vec![obj.clone()], warnings)),
            (None, Some(children_key)) => {
                if let Some(children) = obj.get(children_key).and_then(Value::as_array)
                    && !children.is_empty()
                {
                    warnings.push(Warning::new(
                        "WARN_UNWRAP_WRAPPER",
                        format!(
                            "data appears to be a wrapper object; unwrapping \"{children_key}\""
                        ),
                    ));
                    return Ok((object_items(children), warnings));
                }
            }
            (None, None) => {}
        }

        // last resort: first array property containing objects
        for (key, value) in obj {
            if let Some(items) = value.as_array()
                && !items.is_empty()
                && items[0].is_object()
            {
                warnings.push(Warning::new(
                    "WARN_UNWRAP_GUESSED",
                    format!("no obvious structure detected; unwrapping first array property \"{key}\""),
                ));
                return Ok((object_items(items), warnings));
            }
        }
    }

    Err(AppError::EmptyInput {
        message: "could not find capability data in input".to_string(),
    })
}

/// Nested when the sample embeds children; flat when any of the first five
/// items carries a parent reference; simple otherwise.
pub fn detect_schema(items: &[Record]) -> Option<SchemaType> {
    let sample = items.first()?;
    if find_children_field(sample, None).is_some() {
        return Some(SchemaType::Nested);
    }
    if items
        .iter()
        .take(5)
        .any(|item| find_parent_field(item, None).is_some())
    {
        return Some(SchemaType::Flat);
    }
    Some(SchemaType::Simple)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

static SLUG_STRIP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

fn slugify(text: &str) -> String {
    SLUG_STRIP
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Deterministic node id: slug of the name under the parent path, with the
/// sibling index to guarantee uniqueness.
fn make_id(name: &str, parent_path: &str, index: usize) -> String {
    let slug = slugify(name);
    if parent_path.is_empty() {
        format!("{slug}_{index}")
    } else {
        format!("{parent_path}/{slug}_{index}")
    }
}

fn display_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn node_name(obj: &Record, name_field: Option<&str>) -> String {
    let raw = name_field
        .and_then(|f| obj.get(f))
        .map(display_string)
        .unwrap_or_default();
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "-- unnamed --".to_string()
    } else {
        trimmed.to_string()
    }
}

fn node_description(obj: &Record, desc_field: Option<&str>) -> Option<String> {
    desc_field
        .and_then(|f| obj.get(f))
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn collect_properties(obj: &Record, skip: &HashSet<&str>) -> BTreeMap<String, PropertyValue> {
    let mut props = BTreeMap::new();
    for (key, value) in obj {
        if skip.contains(key.as_str()) {
            continue;
        }
        let prop = match value {
            Value::String(s) => PropertyValue::Text(s.clone()),
            Value::Number(n) => match n.as_f64() {
                Some(f) => PropertyValue::Number(f),
                None => continue,
            },
            Value::Bool(b) => PropertyValue::Flag(*b),
            _ => continue,
        };
        props.insert(key.clone(), prop);
    }
    props
}

/// Recursively normalize one nested-schema object. Each child re-detects
/// its fields with the parent's choices as the preferred answer, so mildly
/// heterogeneous trees still resolve.
fn normalize_node(
    obj: &Record,
    name_field: Option<&str>,
    desc_field: Option<&str>,
    children_field: Option<&str>,
    parent_path: &str,
    index: usize,
) -> CapabilityNode {
    let name = node_name(obj, name_field);
    let description = node_description(obj, desc_field);
    let id = make_id(&name, parent_path, index);
    let current_path = if parent_path.is_empty() {
        slugify(&name)
    } else {
        format!("{parent_path}/{}", slugify(&name))
    };

    let mut skip: HashSet<&str> = HashSet::new();
    skip.extend(name_field);
    skip.extend(desc_field);
    skip.extend(children_field);
    let properties = collect_properties(obj, &skip);

    let mut children = Vec::new();
    if let Some(raw_children) = children_field
        .and_then(|f| obj.get(f))
        .and_then(Value::as_array)
    {
        for (i, raw_child) in raw_children.iter().enumerate() {
            if let Some(child) = raw_child.as_object() {
                children.push(normalize_node(
                    child,
                    find_name_field(child, name_field).as_deref(),
                    find_desc_field(child, desc_field).as_deref(),
                    find_children_field(child, children_field).as_deref(),
                    &current_path,
                    i,
                ));
            }
        }
    }

    CapabilityNode {
        id,
        name,
        description,
        properties,
        children,
    }
}

/// Build a forest from a flat list with parent references. Two passes:
/// create all entries, then wire children to parents by id or name.
/// Cycles are detected on the index graph before any wiring, because an
/// ownership tree cannot represent them.
fn build_tree_from_flat(
    items: &[Record],
    name_field: Option<&str>,
    desc_field: Option<&str>,
    parent_field: Option<&str>,
    id_field: Option<&str>,
) -> Result<(Vec<CapabilityNode>, Vec<Warning>), AppError> {
    let mut warnings = Vec::new();

    let mut skip: HashSet<&str> = HashSet::new();
    skip.extend(name_field);
    skip.extend(desc_field);
    skip.extend(parent_field);
    skip.extend(id_field);

    struct FlatEntry {
        node: CapabilityNode,
        parent_ref: Option<String>,
    }

    let mut entries: Vec<FlatEntry> = Vec::with_capacity(items.len());
    // original id or name -> entry index; later rows win lookups
    let mut ref_map: HashMap<String, usize> = HashMap::new();

    for (i, obj) in items.iter().enumerate() {
        let name = node_name(obj, name_field);
        let description = node_description(obj, desc_field);

        let original_id = id_field
            .and_then(|f| obj.get(f))
            .map(display_string)
            .unwrap_or_default();
        let id = if original_id.is_empty() {
            make_id(&name, "", i)
        } else {
            format!("{}_{i}", slugify(&original_id))
        };

        let parent_ref = parent_field
            .and_then(|f| obj.get(f))
            .map(display_string)
            .filter(|r| !r.trim().is_empty());

        entries.push(FlatEntry {
            node: CapabilityNode {
                id,
                name: name.clone(),
                description,
                properties: collect_properties(obj, &skip),
                children: Vec::new(),
            },
            parent_ref,
        });

        if !original_id.is_empty() {
            ref_map.insert(original_id, i);
        }
        ref_map.insert(name, i);
    }

    // resolve parent indices, then walk chains to reject cycles up front
    let parent_idx: Vec<Option<usize>> = entries
        .iter()
        .map(|e| e.parent_ref.as_ref().and_then(|r| ref_map.get(r)).copied())
        .collect();

    let mut confirmed = vec![false; entries.len()];
    for start in 0..entries.len() {
        if confirmed[start] {
            continue;
        }
        let mut chain: Vec<usize> = Vec::new();
        let mut in_chain: HashSet<usize> = HashSet::new();
        let mut cursor = Some(start);
        while let Some(i) = cursor {
            if confirmed[i] || in_chain.contains(&i) {
                break;
            }
            chain.push(i);
            in_chain.insert(i);
            cursor = parent_idx[i];
        }
        if let Some(repeat) = cursor
            && in_chain.contains(&repeat)
        {
            let cycle_start = chain.iter().position(|&i| i == repeat).unwrap_or(0);
            let mut names: Vec<&str> = chain[cycle_start..]
                .iter()
                .map(|&i| entries[i].node.name.as_str())
                .collect();
            names.push(entries[repeat].node.name.as_str());
            return Err(AppError::Cycle {
                path: names.join(" -> "),
            });
        }
        for &i in &chain {
            confirmed[i] = true;
        }
    }

    // wire children by index, then materialize the ownership tree
    let mut children_idx: Vec<Vec<usize>> = vec![Vec::new(); entries.len()];
    let mut root_idx: Vec<usize> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        match &entry.parent_ref {
            None => root_idx.push(i),
            Some(parent_ref) => match parent_idx[i] {
                Some(p) => children_idx[p].push(i),
                None => {
                    warnings.push(Warning::new(
                        "WARN_UNRESOLVED_PARENT",
                        format!(
                            "parent \"{parent_ref}\" not found for \"{}\"; promoted to root",
                            entry.node.name
                        ),
                    ));
                    root_idx.push(i);
                }
            },
        }
    }

    fn materialize(
        index: usize,
        entries: &[FlatEntry],
        children_idx: &[Vec<usize>],
    ) -> CapabilityNode {
        let mut node = entries[index].node.clone();
        node.children = children_idx[index]
            .iter()
            .map(|&child| materialize(child, entries, children_idx))
            .collect();
        node
    }

    let roots = root_idx
        .iter()
        .map(|&i| materialize(i, &entries, &children_idx))
        .collect();

    Ok((roots, warnings))
}

fn normalize_simple(
    items: &[Record],
    name_field: Option<&str>,
    desc_field: Option<&str>,
) -> Vec<CapabilityNode> {
    let mut skip: HashSet<&str> = HashSet::new();
    skip.extend(name_field);
    skip.extend(desc_field);

    items
        .iter()
        .enumerate()
        .map(|(i, obj)| {
            let name = node_name(obj, name_field);
            CapabilityNode {
                id: make_id(&name, "", i),
                name,
                description: node_description(obj, desc_field),
                properties: collect_properties(obj, &skip),
                children: Vec::new(),
            }
        })
        .collect()
}

pub fn normalize_items(
    items: &[Record],
    schema: SchemaType,
    fields: &DetectedFields,
) -> Result<(Vec<CapabilityNode>, Vec<Warning>), AppError> {
    let mut warnings = Vec::new();

    if let Some(id_field) = &fields.id {
        let mut seen: HashMap<String, usize> = HashMap::new();
        for (i, item) in items.iter().enumerate() {
            let original_id = item.get(id_field).map(display_string).unwrap_or_default();
            if original_id.is_empty() {
                continue;
            }
            if seen.contains_key(&original_id) {
                warnings.push(Warning::new(
                    "WARN_DUPLICATE_ORIGINAL_ID",
                    format!("duplicate id \"{original_id}\" at index {i}"),
                ));
            } else {
                seen.insert(original_id, i);
            }
        }
    }

    let roots = match schema {
        SchemaType::Nested => items
            .iter()
            .enumerate()
            .map(|(i, obj)| {
                normalize_node(
                    obj,
                    fields.name.as_deref(),
                    fields.description.as_deref(),
                    fields.children.as_deref(),
                    "",
                    i,
                )
            })
            .collect(),
        SchemaType::Flat => {
            let (roots, flat_warnings) = build_tree_from_flat(
                items,
                fields.name.as_deref(),
                fields.description.as_deref(),
                fields.parent.as_deref(),
                fields.id.as_deref(),
            )?;
            warnings.extend(flat_warnings);
            roots
        }
        SchemaType::Simple => {
            normalize_simple(items, fields.name.as_deref(), fields.description.as_deref())
        }
    };

    Ok((roots, warnings))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Reject duplicate generated ids. Cycles cannot survive normalization
/// (flat wiring detects them; the ownership tree cannot hold one), so the
/// id sweep is the only remaining structural check.
pub fn validate_forest(roots: &[CapabilityNode]) -> Result<(), AppError> {
    fn walk<'a>(node: &'a CapabilityNode, seen: &mut HashSet<&'a str>) -> Result<(), AppError> {
        if !seen.insert(&node.id) {
            return Err(AppError::DuplicateId {
                id: node.id.clone(),
            });
        }
        for child in &node.children {
            walk(child, seen)?;
        }
        Ok(())
    }

    let mut seen = HashSet::new();
    for root in roots {
        walk(root, &mut seen)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// CSV / TSV
// ---------------------------------------------------------------------------

static NUMERIC_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").unwrap());

/// Numeric strings become numbers, boolean strings become booleans,
/// everything else stays text.
fn coerce_value(value: &str) -> Value {
    if value.is_empty() {
        return Value::String(String::new());
    }
    match value.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if NUMERIC_VALUE.is_match(value)
        && let Ok(num) = value.parse::<f64>()
        && num.is_finite()
        && let Some(json_num) = serde_json::Number::from_f64(num)
    {
        return Value::Number(json_num);
    }
    Value::String(value.to_string())
}

/// Parse delimited text into header-keyed records: trimmed headers,
/// duplicate-header rejection, blank-row skipping, scalar coercion.
fn parse_delimited(raw: &str, delimiter: u8) -> Result<Vec<Record>, AppError> {
    let input = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|err| AppError::CsvParse {
            message: format!("CSV input is empty or unreadable: {err}"),
        })?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(String::is_empty) {
        return Err(AppError::CsvParse {
            message: "CSV headers are empty".to_string(),
        });
    }
    let mut seen = HashSet::new();
    for header in headers.iter().filter(|h| !h.is_empty()) {
        if !seen.insert(header.as_str()) {
            return Err(AppError::CsvParse {
                message: format!("duplicate CSV header: \"{header}\""),
            });
        }
    }

    let mut records: Vec<Record> = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|err| AppError::CsvParse {
            message: format!("malformed CSV row: {err}"),
        })?;
        if row.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut obj = Record::new();
        for (j, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let cell = row.get(j).unwrap_or("").trim();
            obj.insert(header.clone(), coerce_value(cell));
        }
        records.push(obj);
    }

    if records.is_empty() {
        return Err(AppError::CsvParse {
            message: "CSV input contains headers but no data rows".to_string(),
        });
    }
    Ok(records)
}

static LEVEL_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[Ll](\d+)$").unwrap());

/// Accepts numeric levels (1, 2, 3) and prefixed ones (L1, L2, L3).
fn parse_level_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as i64),
        Value::String(s) => {
            let s = s.trim();
            if let Some(caps) = LEVEL_PREFIX.captures(s) {
                return caps[1].parse().ok();
            }
            s.parse::<i64>().ok().filter(|n| *n > 0)
        }
        _ => None,
    }
}

/// Turn a level column into synthetic parent references: each row's parent
/// is the most recent row one level up. Deeper stack entries are cleared as
/// the walk moves back up.
pub fn infer_parents_from_levels(
    rows: &mut [Record],
    level_field: &str,
    name_field: &str,
    id_field: Option<&str>,
) {
    let mut stack: BTreeMap<i64, String> = BTreeMap::new();

    for row in rows.iter_mut() {
        let Some(level) = row.get(level_field).and_then(parse_level_value) else {
            continue;
        };

        let node_ref = id_field
            .and_then(|f| row.get(f))
            .map(display_string)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| row.get(name_field).map(display_string).unwrap_or_default());

        if level > 1
            && let Some(parent) = stack.get(&(level - 1))
        {
            row.insert(
                INFERRED_PARENT_FIELD.to_string(),
                Value::String(parent.clone()),
            );
        }

        stack.insert(level, node_ref);
        stack.retain(|&key, _| key <= level);
    }
}

// ---------------------------------------------------------------------------
// Pipelines
// ---------------------------------------------------------------------------

pub fn import_json(raw: &str, options: &ImportOptions) -> Result<ImportResult, AppError> {
    let data: Value = serde_json::from_str(raw).map_err(|err| AppError::JsonParse {
        message: format!("JSON parse error: {err}"),
    })?;

    let (items, mut warnings) = unwrap_data(&data, options.unwrap.as_deref())?;
    if items.is_empty() {
        return Err(AppError::EmptyInput {
            message: "no capability items found after unwrapping".to_string(),
        });
    }

    let schema = detect_schema(&items).ok_or(AppError::SchemaDetect)?;

    let sample = &items[0];
    let fields = DetectedFields {
        name: find_name_field(sample, options.name_field.as_deref()),
        description: find_desc_field(sample, options.desc_field.as_deref()),
        children: find_children_field(sample, options.children_field.as_deref()),
        parent: find_parent_field(sample, options.parent_field.as_deref()),
        id: find_id_field(sample, options.id_field.as_deref()),
        level: None,
    };
    if fields.name.is_none() {
        return Err(AppError::NoNameField);
    }

    let (roots, normalize_warnings) = normalize_items(&items, schema, &fields)?;
    warnings.extend(normalize_warnings);

    validate_forest(&roots)?;

    let summary = summarize(&roots);
    Ok(ImportResult {
        roots,
        schema,
        fields,
        summary,
        warnings,
    })
}

fn import_csv(
    raw: &str,
    options: &ImportOptions,
    delimiter: u8,
) -> Result<ImportResult, AppError> {
    let mut items = parse_delimited(raw, delimiter)?;

    let sample = &items[0];
    let mut fields = DetectedFields {
        name: find_name_field(sample, options.name_field.as_deref()),
        description: find_desc_field(sample, options.desc_field.as_deref()),
        // rows never embed children
        children: None,
        parent: find_parent_field(sample, options.parent_field.as_deref()),
        id: find_id_field(sample, options.id_field.as_deref()),
        level: find_level_field(sample, options.level_field.as_deref()),
    };
    let Some(name_field) = fields.name.clone() else {
        return Err(AppError::NoNameField);
    };

    if fields.parent.is_none()
        && let Some(level_field) = fields.level.clone()
    {
        infer_parents_from_levels(&mut items, &level_field, &name_field, fields.id.as_deref());
        fields.parent = Some(INFERRED_PARENT_FIELD.to_string());
    }

    let schema = if fields.parent.is_some() {
        SchemaType::Flat
    } else {
        SchemaType::Simple
    };

    let (roots, warnings) = normalize_items(&items, schema, &fields)?;
    validate_forest(&roots)?;

    let summary = summarize(&roots);
    Ok(ImportResult {
        roots,
        schema,
        fields,
        summary,
        warnings,
    })
}

/// Unified entry: format from options, else from the file extension.
pub fn import_data(
    raw: &str,
    options: &ImportOptions,
    path: Option<&Path>,
) -> Result<ImportResult, AppError> {
    match options.format.unwrap_or_else(|| detect_format(path)) {
        InputFormat::Json => import_json(raw, options),
        InputFormat::Csv => import_csv(raw, options, b','),
        InputFormat::Tsv => import_csv(raw, options, b'\t'),
    }
}

// ---------------------------------------------------------------------------
// Root filtering
// ---------------------------------------------------------------------------

/// Keep only roots matching a selector by name or id; selectors that match
/// nothing produce warnings instead of errors.
pub fn filter_roots(
    roots: Vec<CapabilityNode>,
    selectors: &[String],
) -> (Vec<CapabilityNode>, Vec<Warning>) {
    let mut warnings = Vec::new();
    let mut matched_selectors: HashSet<&str> = HashSet::new();
    let mut filtered = Vec::new();

    for root in roots {
        if let Some(selector) = selectors
            .iter()
            .find(|sel| root.name == **sel || root.id == **sel)
        {
            matched_selectors.insert(selector.as_str());
            filtered.push(root);
        }
    }

    for selector in selectors {
        if !matched_selectors.contains(selector.as_str()) {
            warnings.push(Warning::new(
                "WARN_ROOT_NOT_FOUND",
                format!("root selector \"{selector}\" did not match any root node"),
            ));
        }
    }

    (filtered, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ImportOptions {
        ImportOptions::default()
    }

    #[test]
    fn nested_schema_detected_and_normalized() {
        let raw = r#"[
            {"name": "Sales", "children": [
                {"name": "Pricing"},
                {"name": "Quoting", "description": "build quotes"}
            ]},
            {"name": "Finance", "children": []}
        ]"#;
        let result = import_json(raw, &options()).unwrap();
        assert_eq!(result.schema, SchemaType::Nested);
        assert_eq!(result.summary.roots, 2);
        assert_eq!(result.summary.nodes, 4);
        assert_eq!(result.roots[0].children[1].description.as_deref(), Some("build quotes"));
        assert_eq!(result.roots[0].children[0].id, "sales/pricing_0");
    }

    #[test]
    fn flat_schema_wires_parents() {
        let raw = r#"[
            {"name": "Root", "parent": ""},
            {"name": "Child A", "parent": "Root"},
            {"name": "Child B", "parent": "Root"},
            {"name": "Grand", "parent": "Child A"}
        ]"#;
        let result = import_json(raw, &options()).unwrap();
        assert_eq!(result.schema, SchemaType::Flat);
        assert_eq!(result.summary.roots, 1);
        assert_eq!(result.summary.max_depth, 2);
        assert_eq!(result.roots[0].children.len(), 2);
    }

    #[test]
    fn unresolved_parent_promotes_to_root_with_warning() {
        let raw = r#"[
            {"name": "A", "parent": "Nowhere"},
            {"name": "B", "parent": ""}
        ]"#;
        let result = import_json(raw, &options()).unwrap();
        assert_eq!(result.summary.roots, 2);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == "WARN_UNRESOLVED_PARENT"));
    }

    #[test]
    fn parent_cycle_is_rejected() {
        let raw = r#"[
            {"name": "A", "parent": "B"},
            {"name": "B", "parent": "A"}
        ]"#;
        let err = import_json(raw, &options()).unwrap_err();
        assert_eq!(err.code(), "ERR_VALIDATION_CYCLE");
    }

    #[test]
    fn wrapper_object_unwraps_with_warning() {
        let raw = r#"{"capabilities": [{"name": "One"}, {"name": "Two"}]}"#;
        let result = import_json(raw, &options()).unwrap();
        assert_eq!(result.summary.roots, 2);
        assert!(result.warnings.iter().any(|w| w.code == "WARN_UNWRAP_WRAPPER"));
    }

    #[test]
    fn single_root_object_imports_directly() {
        let raw = r#"{"name": "Root", "children": [{"name": "Kid"}]}"#;
        let result = import_json(raw, &options()).unwrap();
        assert_eq!(result.schema, SchemaType::Nested);
        assert_eq!(result.summary.roots, 1);
        assert_eq!(result.summary.nodes, 2);
    }

    #[test]
    fn duplicate_original_ids_warn() {
        let raw = r#"[
            {"id": "x", "name": "One"},
            {"id": "x", "name": "Two"}
        ]"#;
        let result = import_json(raw, &options()).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| w.code == "WARN_DUPLICATE_ORIGINAL_ID"));
        // generated ids stay unique
        assert_ne!(result.roots[0].id, result.roots[1].id);
    }

    #[test]
    fn name_field_override_wins() {
        let raw = r#"[{"title": "Ignored", "alias": "Used"}]"#;
        let mut opts = options();
        opts.name_field = Some("alias".to_string());
        let result = import_json(raw, &opts).unwrap();
        assert_eq!(result.roots[0].name, "Used");
    }

    #[test]
    fn missing_name_field_errors() {
        let raw = r#"[{"count": 3}]"#;
        let err = import_json(raw, &options()).unwrap_err();
        assert_eq!(err.code(), "ERR_VALIDATION_NO_NAME_FIELD");
    }

    #[test]
    fn invalid_json_reports_parse_error() {
        let err = import_json("{not json", &options()).unwrap_err();
        assert_eq!(err.code(), "ERR_VALIDATION_JSON_PARSE");
    }

    #[test]
    fn csv_with_level_column_infers_hierarchy() {
        let raw = "name,level\nEnterprise,L1\nSales,L2\nPricing,L3\nFinance,L2\n";
        let mut opts = options();
        opts.format = Some(InputFormat::Csv);
        let result = import_data(raw, &opts, None).unwrap();
        assert_eq!(result.schema, SchemaType::Flat);
        assert_eq!(result.summary.roots, 1);
        assert_eq!(result.summary.max_depth, 2);
        let enterprise = &result.roots[0];
        assert_eq!(enterprise.name, "Enterprise");
        assert_eq!(enterprise.children.len(), 2);
        assert_eq!(enterprise.children[0].children[0].name, "Pricing");
    }

    #[test]
    fn csv_numeric_levels_work_too() {
        let raw = "name,level\nTop,1\nMid,2\nDeep,3\n";
        let mut opts = options();
        opts.format = Some(InputFormat::Csv);
        let result = import_data(raw, &opts, None).unwrap();
        assert_eq!(result.summary.max_depth, 2);
    }

    #[test]
    fn tsv_parses_with_tab_delimiter() {
        let raw = "name\tparent\nRoot\t\nKid\tRoot\n";
        let mut opts = options();
        opts.format = Some(InputFormat::Tsv);
        let result = import_data(raw, &opts, None).unwrap();
        assert_eq!(result.summary.roots, 1);
        assert_eq!(result.roots[0].children[0].name, "Kid");
    }

    #[test]
    fn csv_values_are_coerced() {
        let raw = "name,headcount,active\nOps,42,true\n";
        let mut opts = options();
        opts.format = Some(InputFormat::Csv);
        let result = import_data(raw, &opts, None).unwrap();
        let props = &result.roots[0].properties;
        assert_eq!(props.get("headcount"), Some(&PropertyValue::Number(42.0)));
        assert_eq!(props.get("active"), Some(&PropertyValue::Flag(true)));
    }

    #[test]
    fn duplicate_csv_headers_error() {
        let raw = "name,name\nA,B\n";
        let mut opts = options();
        opts.format = Some(InputFormat::Csv);
        let err = import_data(raw, &opts, None).unwrap_err();
        assert_eq!(err.code(), "ERR_VALIDATION_CSV_PARSE");
    }

    #[test]
    fn csv_without_rows_errors() {
        let raw = "name,level\n";
        let mut opts = options();
        opts.format = Some(InputFormat::Csv);
        let err = import_data(raw, &opts, None).unwrap_err();
        assert_eq!(err.code(), "ERR_VALIDATION_CSV_PARSE");
    }

    #[test]
    fn format_detection_uses_extension() {
        assert_eq!(detect_format(Some(Path::new("x.CSV"))), InputFormat::Csv);
        assert_eq!(detect_format(Some(Path::new("x.tab"))), InputFormat::Tsv);
        assert_eq!(detect_format(Some(Path::new("x.json"))), InputFormat::Json);
        assert_eq!(detect_format(None), InputFormat::Json);
    }

    #[test]
    fn filter_roots_warns_on_missing_selector() {
        let roots = vec![
            CapabilityNode::new("a_0", "Alpha"),
            CapabilityNode::new("b_1", "Beta"),
        ];
        let (filtered, warnings) =
            filter_roots(roots, &["Alpha".to_string(), "Gamma".to_string()]);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Alpha");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, "WARN_ROOT_NOT_FOUND");
    }

    #[test]
    fn slugify_collapses_punctuation() {
        assert_eq!(slugify("Customer & Partner Mgmt!"), "customer-partner-mgmt");
        assert_eq!(slugify("  Fin/Ops  "), "fin-ops");
    }

    #[test]
    fn blank_names_get_placeholder() {
        let raw = r#"[{"name": "   "}]"#;
        let result = import_json(raw, &options()).unwrap();
        assert_eq!(result.roots[0].name, "-- unnamed --");
    }
}
