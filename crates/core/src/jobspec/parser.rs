//! Job-list parser.
//!
//! The job list is delimited text: one job per line, `#` starts a comment
//! (inline or whole-line), fields comma-separated in fixed order
//! `kind, locator, album-artist, album-name, track-title, track-artist,
//! genre, year, cover-image`. Fields are trimmed and stripped of
//! surrounding double quotes; the cover field may be empty or absent.
//!
//! Validation is exhaustive: every malformed row is collected so a batch
//! run reports all defects in one pass.

use std::collections::HashMap;
use std::path::Path;

use super::error::{ParseError, ParseWarning, RowError};
use super::types::{JobKind, JobSpec};

/// Number of columns including the optional trailing cover column.
const COLUMNS: usize = 9;

/// Outcome of parsing a job list: valid jobs plus every row defect found.
#[derive(Debug, Default)]
pub struct ParsedJobs {
    pub jobs: Vec<JobSpec>,
    pub row_errors: Vec<RowError>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedJobs {
    pub fn is_clean(&self) -> bool {
        self.row_errors.is_empty()
    }
}

/// Reads and parses a job list file.
pub fn parse_job_list(path: &Path, cover_dir: &Path) -> Result<ParsedJobs, ParseError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_job_list_str(&raw, cover_dir))
}

/// Parses job-list text. Infallible at the file level; all defects are
/// reported per row.
pub fn parse_job_list_str(input: &str, cover_dir: &Path) -> ParsedJobs {
    let mut parsed = ParsedJobs::default();
    let mut seen: HashMap<(String, JobKind), usize> = HashMap::new();
    let mut next_index = 0usize;

    for (line_idx, raw_line) in input.lines().enumerate() {
        let line_no = line_idx + 1;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        match parse_row(line_no, line, next_index, cover_dir) {
            Ok(spec) => {
                let key = (spec.source_locator.clone(), spec.kind);
                if let Some(first_line) = seen.get(&key) {
                    tracing::warn!(
                        line = line_no,
                        first_line,
                        locator = %spec.source_locator,
                        "duplicate source locator and kind; both rows will run"
                    );
                    parsed.warnings.push(ParseWarning {
                        line: line_no,
                        message: format!(
                            "duplicate of row {} (same locator, same kind)",
                            first_line
                        ),
                    });
                } else {
                    seen.insert(key, line_no);
                }
                parsed.jobs.push(spec);
                next_index += 1;
            }
            Err(err) => parsed.row_errors.push(err),
        }
    }

    parsed
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Trims whitespace and surrounding double quotes from a field.
fn clean_field(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

fn parse_row(
    line: usize,
    content: &str,
    index: usize,
    cover_dir: &Path,
) -> Result<JobSpec, RowError> {
    let fields: Vec<&str> = content.split(',').map(clean_field).collect();
    if fields.len() < COLUMNS - 1 || fields.len() > COLUMNS {
        return Err(RowError::new(
            line,
            format!(
                "expected {} or {} fields, found {}",
                COLUMNS - 1,
                COLUMNS,
                fields.len()
            ),
        ));
    }

    let kind = JobKind::parse_column(fields[0])
        .ok_or_else(|| RowError::new(line, format!("unknown kind {:?}", fields[0])))?;

    let required = |pos: usize, name: &str| -> Result<String, RowError> {
        let value = fields[pos];
        if value.is_empty() {
            Err(RowError::new(line, format!("empty {name} field")))
        } else {
            Ok(value.to_string())
        }
    };

    let source_locator = required(1, "source locator")?;
    let album_artist = required(2, "album artist")?;
    let album_name = required(3, "album name")?;
    let track_title = required(4, "track title")?;
    let track_artist = required(5, "track artist")?;
    let genre = required(6, "genre")?;

    let year: i32 = fields[7]
        .parse()
        .map_err(|_| RowError::new(line, format!("invalid year {:?}", fields[7])))?;

    let cover_image = match fields.get(8).copied().unwrap_or_default() {
        "" => None,
        name => {
            let path = cover_dir.join(name);
            if !path.is_file() {
                return Err(RowError::new(
                    line,
                    format!("cover image not found: {}", path.display()),
                ));
            }
            Some(path)
        }
    };

    Ok(JobSpec {
        index,
        kind,
        source_locator,
        album_artist,
        album_name,
        track_title,
        track_artist,
        genre,
        year,
        cover_image,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cover_dir_with(names: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for name in names {
            std::fs::write(dir.path().join(name), b"img").unwrap();
        }
        dir
    }

    #[test]
    fn test_parse_valid_row() {
        let covers = cover_dir_with(&["front.jpg"]);
        let input = r#"a, https://example.com/watch?v=abc, "Queen Singer", Immortal Songs, Every Night, Queen Singer, Pop, 1999, front.jpg"#;

        let parsed = parse_job_list_str(input, covers.path());
        assert!(parsed.is_clean());
        assert_eq!(parsed.jobs.len(), 1);

        let job = &parsed.jobs[0];
        assert_eq!(job.kind, JobKind::AudioOnly);
        assert_eq!(job.album_artist, "Queen Singer");
        assert_eq!(job.track_title, "Every Night");
        assert_eq!(job.year, 1999);
        assert!(job.cover_image.as_ref().unwrap().ends_with("front.jpg"));
    }

    #[test]
    fn test_comments_and_blank_lines() {
        let covers = cover_dir_with(&[]);
        let input = "\n# full comment line\nav, loc1, AA, AN, TT, TA, G, 2001,  # trailing comment\n   \n";

        let parsed = parse_job_list_str(input, covers.path());
        assert!(parsed.is_clean());
        assert_eq!(parsed.jobs.len(), 1);
        assert_eq!(parsed.jobs[0].kind, JobKind::AudioAndVideo);
        assert!(parsed.jobs[0].cover_image.is_none());
    }

    #[test]
    fn test_cover_column_may_be_absent() {
        let covers = cover_dir_with(&[]);
        let parsed = parse_job_list_str("v, loc1, AA, AN, TT, TA, G, 2001", covers.path());
        assert!(parsed.is_clean());
        assert!(parsed.jobs[0].cover_image.is_none());
    }

    #[test]
    fn test_all_row_errors_collected() {
        let covers = cover_dir_with(&[]);
        let input = "\
x, loc1, AA, AN, TT, TA, G, 2001
a, loc2, AA, AN, TT, TA, G, not-a-year
a, loc3, , AN, TT, TA, G, 2001
a, loc4";

        let parsed = parse_job_list_str(input, covers.path());
        assert_eq!(parsed.jobs.len(), 0);
        assert_eq!(parsed.row_errors.len(), 4);
        assert_eq!(parsed.row_errors[0].line, 1);
        assert!(parsed.row_errors[1].reason.contains("year"));
        assert!(parsed.row_errors[2].reason.contains("album artist"));
        assert!(parsed.row_errors[3].reason.contains("fields"));
    }

    #[test]
    fn test_bad_row_does_not_abort_batch() {
        let covers = cover_dir_with(&[]);
        let input = "bogus row\na, loc1, AA, AN, TT, TA, G, 2001,";

        let parsed = parse_job_list_str(input, covers.path());
        assert_eq!(parsed.jobs.len(), 1);
        assert_eq!(parsed.row_errors.len(), 1);
        assert_eq!(parsed.jobs[0].index, 0);
    }

    #[test]
    fn test_missing_cover_is_row_error() {
        let covers = cover_dir_with(&[]);
        let input = "a, loc1, AA, AN, TT, TA, G, 2001, nope.jpg";

        let parsed = parse_job_list_str(input, covers.path());
        assert!(parsed.jobs.is_empty());
        assert!(parsed.row_errors[0].reason.contains("cover image"));
    }

    #[test]
    fn test_duplicate_locator_and_kind_is_warning() {
        let covers = cover_dir_with(&[]);
        let input = "\
a, loc1, AA, AN, T1, TA, G, 2001,
a, loc1, AA, AN, T2, TA, G, 2001,
v, loc1, AA, AN, T3, TA, G, 2001,";

        let parsed = parse_job_list_str(input, covers.path());
        assert!(parsed.is_clean());
        assert_eq!(parsed.jobs.len(), 3);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].line, 2);
    }

    #[test]
    fn test_indices_follow_valid_rows() {
        let covers = cover_dir_with(&[]);
        let input = "\
a, loc1, AA, AN, T1, TA, G, 2001,
broken
a, loc2, AA, AN, T2, TA, G, 2001,";

        let parsed = parse_job_list_str(input, covers.path());
        assert_eq!(parsed.jobs[0].index, 0);
        assert_eq!(parsed.jobs[1].index, 1);
    }
}
