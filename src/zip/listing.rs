//! Human-readable member table, in the style of `unzip -v`.

use std::io::{self, Write};

use super::structures::ZipFileEntry;

const RULE_WIDTH: usize = 60;

/// Write a header, one row per member and a totals line.
///
/// The total counts uncompressed bytes of files only; directories still
/// count as members.
pub fn write_member_table<W: Write>(entries: &[ZipFileEntry], out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "{:>10}  {:>10}  {:>10}  {:>5}  Name",
        "Length", "Size", "Date", "Time"
    )?;
    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;

    let mut total = 0u64;
    for entry in entries {
        let (year, month, day) = entry.mod_date();
        let (hour, minute, _second) = entry.mod_time();
        writeln!(
            out,
            "{:>10}  {:>10}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
            entry.uncompressed_size,
            entry.compressed_size,
            year,
            month,
            day,
            hour,
            minute,
            entry.file_name
        )?;
        if !entry.is_directory {
            total += entry.uncompressed_size;
        }
    }

    writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "{:>10}  {} members", total, entries.len())?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryReader;
    use crate::zip::ZipExtractor;
    use crate::zip::fixture::ZipBuilder;
    use std::sync::Arc;

    #[tokio::test]
    async fn table_lists_rows_and_totals() {
        let data = ZipBuilder::new()
            .stored("kokoro/", b"")
            .stored("kokoro/a.txt", b"abcd")
            .deflated("kokoro/b.txt", &[b'x'; 100])
            .finish();
        let entries = ZipExtractor::new(Arc::new(MemoryReader::new(data)))
            .list_files()
            .await
            .unwrap();

        let mut out = Vec::new();
        write_member_table(&entries, &mut out).unwrap();
        let table = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 7);
        assert_eq!(lines[0], "    Length        Size        Date   Time  Name");
        assert_eq!(lines[1], "-".repeat(60));
        assert_eq!(lines[2], "         0           0  2025-01-01  12:00  kokoro/");
        assert_eq!(lines[3], "         4           4  2025-01-01  12:00  kokoro/a.txt");
        assert!(lines[4].starts_with("       100  "));
        assert!(lines[4].ends_with("  2025-01-01  12:00  kokoro/b.txt"));
        assert_eq!(lines[5], "-".repeat(60));
        assert_eq!(lines[6], "       104  3 members");
    }

    #[test]
    fn empty_archive_has_zero_total() {
        let mut out = Vec::new();
        write_member_table(&[], &mut out).unwrap();
        let table = String::from_utf8(out).unwrap();
        assert_eq!(table.lines().last(), Some("         0  0 members"));
    }
}
