use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::aggregate::{Summary, calendar_date};
use crate::fiscal::FiscalCalendar;
use crate::types::NormalizedRecord;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Optional columns of the article export.
#[derive(Debug, Clone, Copy, Default)]
pub struct Columns<'a> {
    /// Adds `MONTH_GROUP`, the fiscal month of each dated record.
    pub month_group: Option<&'a FiscalCalendar>,
    /// Adds `FOUND_VIA`, the search term that surfaced the record.
    pub found_via: bool,
}

pub fn write_records_csv<W: Write>(
    writer: W,
    records: &[NormalizedRecord],
    columns: Columns<'_>,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["TITLE", "DATE_NORMALIZED", "DATE_RAW", "URL"];
    if columns.month_group.is_some() {
        header.push("MONTH_GROUP");
    }
    if columns.found_via {
        header.push("FOUND_VIA");
    }
    csv.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.title.clone(),
            record.normalized_date.clone(),
            record.raw_date.clone(),
            record.url.clone(),
        ];
        if let Some(calendar) = columns.month_group {
            let month = calendar_date(&record.normalized_date)
                .map(|date| calendar.bucket_for(date).to_string())
                .unwrap_or_default();
            row.push(month);
        }
        if columns.found_via {
            row.push(record.found_via.clone());
        }
        csv.write_record(&row)?;
    }

    csv.flush()?;
    Ok(())
}

pub fn write_summary_csv<W: Write>(writer: W, summary: &Summary) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["MONTH_GROUP", "COUNT"])?;
    for row in &summary.rows {
        csv.write_record([row.bucket.to_string(), row.count.to_string()])?;
    }
    csv.flush()?;
    Ok(())
}

/// `lavoz_<term>`, lowercased. Anything but letters, digits and `-` becomes
/// `_`, so the name never contains a path separator or `..`.
pub fn base_filename(search_term: &str) -> String {
    let term: String = search_term
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("lavoz_{}", term.to_lowercase())
}

/// Writes `<base>_articles.csv` and `<base>_summary.csv` into `dir`.
pub fn export_to_dir(
    dir: &Path,
    search_term: &str,
    records: &[NormalizedRecord],
    summary: &Summary,
    columns: Columns<'_>,
) -> Result<(PathBuf, PathBuf), ExportError> {
    std::fs::create_dir_all(dir)?;
    let base = base_filename(search_term);

    let articles_path = dir.join(format!("{base}_articles.csv"));
    write_records_csv(File::create(&articles_path)?, records, columns)?;
    log::info!("CSV file generated: {}", articles_path.display());

    let summary_path = dir.join(format!("{base}_summary.csv"));
    write_summary_csv(File::create(&summary_path)?, summary)?;
    log::info!("Summary file generated: {}", summary_path.display());

    Ok((articles_path, summary_path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::summarize;
    use crate::types::RawRecord;

    fn records() -> Vec<NormalizedRecord> {
        vec![
            NormalizedRecord::from_raw(
                RawRecord::new(
                    "Zapater, en el pleno",
                    "https://www.lavozdegalicia.es/noticia/1.htm",
                    "18 de julio de 2025",
                ),
                "2025-07-18".to_string(),
                "CLAUDIA ZAPATER",
            ),
            NormalizedRecord::from_raw(
                RawRecord::new("Sin fecha", "https://www.lavozdegalicia.es/noticia/2.htm", "?"),
                "?".to_string(),
                "ZAPATER",
            ),
        ]
    }

    fn to_string(f: impl FnOnce(&mut Vec<u8>) -> Result<(), ExportError>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_minimum_columns() {
        let out = to_string(|buf| write_records_csv(buf, &records(), Columns::default()));
        let mut lines = out.lines();
        assert_eq!(lines.next(), Some("TITLE,DATE_NORMALIZED,DATE_RAW,URL"));
        assert_eq!(
            lines.next(),
            Some(
                "\"Zapater, en el pleno\",2025-07-18,18 de julio de 2025,https://www.lavozdegalicia.es/noticia/1.htm"
            )
        );
    }

    #[test]
    fn test_optional_columns() {
        let calendar = FiscalCalendar::default();
        let columns = Columns {
            month_group: Some(&calendar),
            found_via: true,
        };
        let out = to_string(|buf| write_records_csv(buf, &records(), columns));
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(
            lines[0],
            "TITLE,DATE_NORMALIZED,DATE_RAW,URL,MONTH_GROUP,FOUND_VIA"
        );
        assert!(lines[1].ends_with(",2025-08,CLAUDIA ZAPATER"));
        assert!(lines[2].ends_with(",,ZAPATER"));
    }

    #[test]
    fn test_summary_csv() {
        let summary = summarize(&records(), &FiscalCalendar::default());
        let out = to_string(|buf| write_summary_csv(buf, &summary));
        assert_eq!(out, "MONTH_GROUP,COUNT\n2025-08,1\n");
    }

    #[test]
    fn test_base_filename() {
        assert_eq!(base_filename("CLAUDIA ZAPATER"), "lavoz_claudia_zapater");
        assert_eq!(base_filename("Pontón-Mondelo"), "lavoz_pontón-mondelo");
    }

    #[test]
    fn test_base_filename_strips_path_characters() {
        assert_eq!(base_filename("AC/DC"), "lavoz_ac_dc");
        assert_eq!(base_filename("a\\b"), "lavoz_a_b");
        let escaped = base_filename("x /../../escaped");
        assert!(!escaped.contains('/') && !escaped.contains(".."));
    }

    #[test]
    fn test_export_to_dir_with_slash_in_term() {
        let tmp = tempfile::tempdir().unwrap();
        let records = records();
        let summary = summarize(&records, &FiscalCalendar::default());

        for term in ["AC/DC", "x /../../escaped"] {
            let (articles, summary_path) =
                export_to_dir(tmp.path(), term, &records, &summary, Columns::default()).unwrap();
            assert_eq!(articles.parent(), Some(tmp.path()));
            assert_eq!(summary_path.parent(), Some(tmp.path()));
            assert!(articles.exists());
        }
    }

    #[test]
    fn test_export_to_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("out");
        let records = records();
        let summary = summarize(&records, &FiscalCalendar::default());

        let (articles, summary_path) =
            export_to_dir(&dir, "CLAUDIA ZAPATER", &records, &summary, Columns::default())
                .unwrap();

        assert!(articles.ends_with("lavoz_claudia_zapater_articles.csv"));
        assert_eq!(
            std::fs::read_to_string(&summary_path).unwrap(),
            "MONTH_GROUP,COUNT\n2025-08,1\n"
        );
    }
}
