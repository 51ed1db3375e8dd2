use std::collections::HashMap;

use crate::error::{EngineError, Result};

/// Ordered column names plus a case-folded lookup table.
///
/// Built once per query from the input's first line; read-only from every
/// worker thread onward.
#[derive(Debug, Clone)]
pub struct Header {
    names: Vec<String>,
    index: ColumnIndex,
}

impl Header {
    /// Parse a header line (already stripped of its trailing `\n`/`\r`).
    pub fn parse(line: &[u8]) -> Result<Header> {
        if line.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let names: Vec<String> = line
            .split(|&b| b == b',')
            .map(|f| String::from_utf8_lossy(f).into_owned())
            .collect();
        let index = ColumnIndex::build(&names);
        Ok(Header { names, index })
    }

    /// Build a header directly from already-split field bytes, e.g. from
    /// the RFC-4180 reader's owned fields. `fields` must be non-empty.
    pub fn from_fields(fields: &[Vec<u8>]) -> Result<Header> {
        if fields.is_empty() || (fields.len() == 1 && fields[0].is_empty()) {
            return Err(EngineError::EmptyInput);
        }
        let names: Vec<String> =
            fields.iter().map(|f| String::from_utf8_lossy(f).into_owned()).collect();
        let index = ColumnIndex::build(&names);
        Ok(Header { names, index })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn index(&self) -> &ColumnIndex {
        &self.index
    }

    /// Resolve a case-insensitive column name to its zero-based position.
    pub fn resolve(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .ok_or_else(|| EngineError::ColumnNotFound(name.to_string()))
    }
}

/// Case-folded name → zero-based row position. ASCII lowercasing only, per
/// the engine's declared collation scope.
#[derive(Debug, Clone)]
pub struct ColumnIndex {
    map: HashMap<String, usize>,
}

impl ColumnIndex {
    fn build(names: &[String]) -> ColumnIndex {
        let mut map = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            map.insert(fold(name), i);
        }
        ColumnIndex { map }
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.map.get(&fold(name)).copied()
    }
}

/// ASCII-only case fold, matching the header's own case-folding rule.
fn fold(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_ascii() { c.to_ascii_lowercase() } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_case_insensitively() {
        let h = Header::parse(b"Id,Name,Value").unwrap();
        assert_eq!(h.resolve("id").unwrap(), 0);
        assert_eq!(h.resolve("NAME").unwrap(), 1);
        assert_eq!(h.resolve("value").unwrap(), 2);
    }

    #[test]
    fn unknown_column_errors() {
        let h = Header::parse(b"a,b").unwrap();
        assert!(matches!(h.resolve("c"), Err(EngineError::ColumnNotFound(_))));
    }

    #[test]
    fn empty_header_errors() {
        assert!(matches!(Header::parse(b""), Err(EngineError::EmptyInput)));
    }
}
