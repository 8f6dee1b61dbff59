use unicode_width::UnicodeWidthStr;

use kubelist_types::{DisplayRecord, NamespaceScope};

use crate::summary::{format_age, format_images};

/// Printed instead of a table when there is nothing to show
pub const NO_RECORDS: &str = "No deployments found.";

/// Spaces between columns
const COLUMN_PADDING: usize = 2;

const NAMESPACE_HEADER: &str = "NAMESPACE";
const HEADERS: [&str; 6] = ["NAME", "READY", "UP-TO-DATE", "AVAILABLE", "AGE", "IMAGES"];

pub struct TableFormatter;

impl TableFormatter {
    pub fn format(records: &[DisplayRecord], scope: NamespaceScope) -> String {
        if records.is_empty() {
            return format!("{NO_RECORDS}\n");
        }

        let with_namespace = scope == NamespaceScope::All;

        let mut rows: Vec<Vec<String>> = Vec::with_capacity(records.len() + 1);
        rows.push(header(with_namespace));
        rows.extend(records.iter().map(|r| row(r, with_namespace)));

        align(&rows)
    }
}

fn header(with_namespace: bool) -> Vec<String> {
    with_namespace
        .then_some(NAMESPACE_HEADER)
        .into_iter()
        .chain(HEADERS)
        .map(str::to_string)
        .collect()
}

fn row(record: &DisplayRecord, with_namespace: bool) -> Vec<String> {
    let mut cells = Vec::with_capacity(HEADERS.len() + 1);
    if with_namespace {
        cells.push(record.namespace.clone());
    }
    cells.extend([
        record.name.clone(),
        record.replicas.ready_status(),
        record.replicas.updated.to_string(),
        record.replicas.available.to_string(),
        format_age(record.age),
        format_images(&record.images),
    ]);
    cells
}

/// Pad every cell but the last of each line to its column's display width
/// plus padding, the way a tabwriter with minwidth 0 and padding 2 does.
fn align(rows: &[Vec<String>]) -> String {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.width());
        }
    }

    let mut out = String::new();
    for row in rows {
        let last = row.len().saturating_sub(1);
        for (i, cell) in row.iter().enumerate() {
            out.push_str(cell);
            if i < last {
                let pad = widths[i] - cell.width() + COLUMN_PADDING;
                out.extend(std::iter::repeat_n(' ', pad));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::record;

    #[test]
    fn test_empty_records() {
        assert_eq!(
            TableFormatter::format(&[], NamespaceScope::All),
            "No deployments found.\n"
        );
    }

    #[test]
    fn test_all_namespaces_table() {
        let records = vec![
            record("web", "default", &["nginx:1.21"]),
            record("coredns", "kube-system", &["coredns:1.11", "busybox"]),
        ];
        let out = TableFormatter::format(&records, NamespaceScope::All);
        let lines: Vec<&str> = out.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "NAMESPACE    NAME     READY  UP-TO-DATE  AVAILABLE  AGE  IMAGES"
        );
        assert_eq!(
            lines[1],
            "default      web      3/3    3           3          2d   nginx:1.21"
        );
        assert_eq!(
            lines[2],
            "kube-system  coredns  3/3    3           3          2d   coredns:1.11,busybox"
        );
    }

    #[test]
    fn test_header_follows_request_scope() {
        // Same namespace on every record, but the request was cluster-wide
        let records = vec![
            record("a", "default", &[]),
            record("b", "default", &[]),
        ];

        let all = TableFormatter::format(&records, NamespaceScope::All);
        assert!(all.starts_with("NAMESPACE"));

        let single = TableFormatter::format(&records, NamespaceScope::Single);
        assert!(single.starts_with("NAME  "));
        assert!(!single.contains("NAMESPACE"));
        assert!(!single.contains("default"));
    }

    #[test]
    fn test_columns_show_replica_counts() {
        let mut rec = record("api", "prod", &[]);
        rec.replicas.desired = 5;
        rec.replicas.ready = 2;
        rec.replicas.updated = 4;
        rec.replicas.available = 1;

        let out = TableFormatter::format(&[rec], NamespaceScope::Single);
        let cells: Vec<&str> = out.lines().nth(1).unwrap().split_whitespace().collect();
        assert_eq!(cells, vec!["api", "2/5", "4", "1", "2d", "<none>"]);
    }

    #[test]
    fn test_alignment_uses_display_width() {
        let rows = vec![
            vec!["名前".to_string(), "x".to_string()],
            vec!["ab".to_string(), "y".to_string()],
        ];
        let out = align(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "名前  x");
        assert_eq!(lines[1], "ab    y");
    }
}
