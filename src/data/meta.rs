//! Database Metadata
//!
//! Flags and statistics written once when a database is built. The index
//! flags say which secondary indexes exist; `stale_index` overrides all of
//! them, since an update after building invalidates every index at once.

use chrono::DateTime;

/// Metadata of one database
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaData {
    /// Database name
    pub name: String,
    /// Path of the ingested input (empty for in-memory input)
    pub source: String,
    /// Size of the ingested input in bytes
    pub file_size: u64,
    /// Approximate in-memory size of the database in bytes
    pub db_size: u64,
    /// Creation time, milliseconds since the Unix epoch
    pub time: i64,
    /// Input encoding
    pub encoding: String,
    /// Number of documents
    pub ndocs: usize,
    /// Number of nodes
    pub size: usize,
    /// Maximum node depth
    pub height: usize,
    /// Whitespace-only text was dropped
    pub chop: bool,
    /// Entity references were expanded
    pub entity: bool,
    pub path_index: bool,
    pub text_index: bool,
    pub attr_index: bool,
    pub ft_index: bool,
    /// Full-text index supports fuzzy lookups (meaningful with `ft_index`)
    pub ft_fuzzy: bool,
    /// Indexes are out of date; no other index flag can be trusted
    pub stale_index: bool,
}

impl MetaData {
    /// Create metadata for a database called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            encoding: "UTF-8".to_owned(),
            ..Self::default()
        }
    }

    /// Path summary is available
    pub fn has_path_index(&self) -> bool {
        self.path_index && !self.stale_index
    }

    /// Text value index is available
    pub fn has_text_index(&self) -> bool {
        self.text_index && !self.stale_index
    }

    /// Attribute value index is available
    pub fn has_attr_index(&self) -> bool {
        self.attr_index && !self.stale_index
    }

    /// Full-text index is available
    pub fn has_ft_index(&self) -> bool {
        self.ft_index && !self.stale_index
    }

    /// Fuzzy full-text lookups are available
    pub fn has_fuzzy_index(&self) -> bool {
        self.has_ft_index() && self.ft_fuzzy
    }

    /// Human-readable report of the database properties
    pub fn info(&self) -> String {
        let mut out = String::new();
        out.push_str("Database Properties\n");
        entry(&mut out, "Name", &self.name);
        entry(&mut out, "Database Size", &format_bytes(self.db_size));
        entry(&mut out, "Nodes", &self.size.to_string());
        entry(&mut out, "Height", &self.height.to_string());

        out.push_str("\nDatabase Creation\n");
        entry(&mut out, "Input Path", &self.source);
        entry(&mut out, "Time Stamp", &format_time(self.time));
        entry(&mut out, "Input Size", &format_bytes(self.file_size));
        entry(&mut out, "Encoding", &self.encoding);
        entry(&mut out, "Documents", &self.ndocs.to_string());
        entry(&mut out, "Chop Whitespaces", flag(self.chop));
        entry(&mut out, "Entities", flag(self.entity));

        out.push_str("\nIndexes\n");
        if self.stale_index {
            out.push_str(" Indexes are out of date.\n");
        } else {
            entry(&mut out, "Path Summary", flag(self.path_index));
            entry(&mut out, "Text Index", flag(self.text_index));
            entry(&mut out, "Attribute Index", flag(self.attr_index));
            let ft = if self.ft_index && self.ft_fuzzy {
                format!("{} (Fuzzy)", flag(true))
            } else {
                flag(self.ft_index).to_owned()
            };
            entry(&mut out, "Full-Text Index", &ft);
        }
        out
    }
}

fn entry(out: &mut String, key: &str, value: &str) {
    out.push_str(&format!(" {}: {}\n", key, value));
}

fn flag(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

/// Format a timestamp as `dd.mm.yyyy HH:MM:SS` (UTC)
pub fn format_time(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|t| t.format("%d.%m.%Y %H:%M:%S").to_string())
        .unwrap_or_default()
}

/// Format a byte count with a binary unit, rounded to the nearest unit
pub fn format_bytes(size: u64) -> String {
    const KB: u64 = 1 << 10;
    const MB: u64 = 1 << 20;
    const GB: u64 = 1 << 30;
    if size > GB {
        format!("{} GB", (size + GB / 2) >> 30)
    } else if size > MB {
        format!("{} MB", (size + MB / 2) >> 20)
    } else if size > KB {
        format!("{} KB", (size + KB / 2) >> 10)
    } else {
        format!("{} Bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> MetaData {
        MetaData {
            size: 12,
            height: 3,
            ndocs: 1,
            time: 86_400_000 + 3_723_000,
            file_size: 2048,
            path_index: true,
            ft_index: true,
            ..MetaData::new("books")
        }
    }

    #[test]
    fn test_info_report() {
        let info = meta().info();
        assert!(info.starts_with("Database Properties\n Name: books\n"));
        assert!(info.contains(" Nodes: 12\n"));
        assert!(info.contains(" Time Stamp: 02.01.1970 01:02:03\n"));
        assert!(info.contains(" Input Size: 2 KB\n"));
        assert!(info.contains(" Path Summary: ON\n"));
        assert!(info.contains(" Text Index: OFF\n"));
        assert!(info.ends_with(" Full-Text Index: ON\n"));
    }

    #[test]
    fn test_fuzzy_marker_only_with_full_text() {
        let mut meta = meta();
        meta.ft_fuzzy = true;
        assert!(meta.info().contains(" Full-Text Index: ON (Fuzzy)\n"));

        meta.ft_index = false;
        assert!(meta.info().contains(" Full-Text Index: OFF\n"));
        assert!(!meta.has_fuzzy_index());
    }

    #[test]
    fn test_stale_hides_index_flags() {
        let mut meta = meta();
        meta.stale_index = true;
        let info = meta.info();
        assert!(info.contains(" Indexes are out of date.\n"));
        assert!(!info.contains("Path Summary"));
        assert!(!meta.has_path_index());
        assert!(!meta.has_ft_index());
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(0), "0 Bytes");
        assert_eq!(format_bytes(1024), "1024 Bytes");
        assert_eq!(format_bytes(1536), "2 KB");
        assert_eq!(format_bytes(5 << 20), "5 MB");
        assert_eq!(format_bytes(3 << 30 | 1), "3 GB");
    }
}
