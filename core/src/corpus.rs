//! Reading corpora from disk for hosts that seed the index from files.
//!
//! Supported inputs, chosen by extension:
//! - `.json`: an array of strings, an array of objects, or a single object
//! - `.jsonl`: one string or object per line
//! - anything else: one document per non-empty line
//!
//! Objects contribute their `text`, `body` or `document` field (first one present).

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const TEXT_FIELDS: [&str; 3] = ["text", "body", "document"];

/// Read every document under `path` (a file, or a directory walked recursively in path order).
pub fn read_corpus<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let mut files: Vec<PathBuf> = Vec::new();
    if path.is_dir() {
        for entry in WalkDir::new(path).sort_by_file_name().into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }
    } else if path.is_file() {
        files.push(path.to_path_buf());
    } else {
        bail!("corpus path {} does not exist", path.display());
    }

    let mut documents = Vec::new();
    for file in files {
        let before = documents.len();
        let read = match file.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => read_jsonl(&file, &mut documents),
            Some("json") => read_json(&file, &mut documents),
            _ => read_lines(&file, &mut documents),
        };
        read.with_context(|| format!("reading corpus file {}", file.display()))?;
        tracing::debug!(file = %file.display(), docs = documents.len() - before, "read corpus file");
    }
    Ok(documents)
}

fn read_jsonl(file: &Path, out: &mut Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() { continue; }
        let value: Value = serde_json::from_str(&line).with_context(|| format!("line {}", lineno + 1))?;
        out.push(document_text(&value).with_context(|| format!("line {}", lineno + 1))?);
    }
    Ok(())
}

fn read_json(file: &Path, out: &mut Vec<String>) -> Result<()> {
    let reader = BufReader::new(File::open(file)?);
    let json: Value = serde_json::from_reader(reader)?;
    match json {
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                out.push(document_text(v).with_context(|| format!("entry {i}"))?);
            }
        }
        other => out.push(document_text(&other)?),
    }
    Ok(())
}

fn read_lines(file: &Path, out: &mut Vec<String>) -> Result<()> {
    let text = fs::read_to_string(file)?;
    out.extend(text.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string));
    Ok(())
}

/// Extract document text from one JSON entry. Anything but a string or an object carrying a
/// string text field is rejected.
pub fn document_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Object(map) => TEXT_FIELDS
            .iter()
            .find_map(|k| map.get(*k))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| anyhow!("object has no string field among {:?}", TEXT_FIELDS)),
        other => Err(anyhow!("expected a string document, found {}", json_kind(other))),
    }
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
