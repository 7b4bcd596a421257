/// State marker: the last successfully processed block date.
///
/// A single-line `YYYY-MM-DD` file written after every successful block
/// assembly and consulted (at Penzance only) to decide which block a new
/// request should process. Writes are plain truncating writes —
/// concurrent writers race last-writer-wins, which is accepted for the
/// current single-process deployment.

use std::path::Path;

use chrono::NaiveDate;

use crate::model::{TwinError, TwinResult};

/// Layout of the marker line.
const MARKER_FORMAT: &str = "%Y-%m-%d";

/// Reads the marker, if one exists. A missing file is a normal first-run
/// condition; unparsable content is an error.
pub fn read_marker(path: &Path) -> TwinResult<Option<NaiveDate>> {
    if !path.exists() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path)?;
    let date = NaiveDate::parse_from_str(text.trim(), MARKER_FORMAT)
        .map_err(|e| TwinError::Parse(format!("state marker: {}", e)))?;
    Ok(Some(date))
}

/// Records `date` as the last processed block.
pub fn write_marker(path: &Path, date: NaiveDate) -> TwinResult<()> {
    std::fs::write(path, format!("{}", date.format(MARKER_FORMAT)))?;
    Ok(())
}

/// Decides which block date to process given a request for `requested`.
///
/// When the marker holds a date strictly earlier than the request, the
/// request wins; otherwise processing resumes from the marker. Note the
/// comparison direction: a marker that is *not* older than the request
/// (including one equal to it, or ahead of it) takes precedence. This
/// matches the deployed behaviour exactly and is pinned by a regression
/// test — do not "fix" the inequality without revalidating both sites.
pub fn resume_block_date(path: &Path, requested: NaiveDate) -> TwinResult<NaiveDate> {
    match read_marker(path)? {
        Some(last) if last < requested => Ok(requested),
        Some(last) => Ok(last),
        None => Ok(requested),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 11, day).unwrap()
    }

    #[test]
    fn test_marker_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        write_marker(&path, date(5)).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "2024-11-05",
            "marker is a single bare date line"
        );
        assert_eq!(read_marker(&path).unwrap(), Some(date(5)));
    }

    #[test]
    fn test_missing_marker_reads_as_none() {
        let dir = TempDir::new().unwrap();
        assert_eq!(read_marker(&dir.path().join("absent")).unwrap(), None);
    }

    #[test]
    fn test_garbage_marker_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        std::fs::write(&path, "yesterday-ish").unwrap();
        assert!(matches!(
            read_marker(&path).unwrap_err(),
            TwinError::Parse(_)
        ));
    }

    #[test]
    fn test_resume_without_marker_processes_request() {
        let dir = TempDir::new().unwrap();
        let decided = resume_block_date(&dir.path().join("absent"), date(6)).unwrap();
        assert_eq!(decided, date(6));
    }

    #[test]
    fn test_resume_with_older_marker_processes_request() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        write_marker(&path, date(4)).unwrap();
        assert_eq!(resume_block_date(&path, date(6)).unwrap(), date(6));
    }

    // Regression pins for the deployed comparison direction: a marker not
    // older than the request wins, even when it is ahead of the request.

    #[test]
    fn test_resume_with_equal_marker_resumes_from_marker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        write_marker(&path, date(6)).unwrap();
        assert_eq!(resume_block_date(&path, date(6)).unwrap(), date(6));
    }

    #[test]
    fn test_resume_with_future_marker_resumes_from_marker() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.txt");
        write_marker(&path, date(9)).unwrap();
        assert_eq!(
            resume_block_date(&path, date(6)).unwrap(),
            date(9),
            "a marker ahead of the request takes precedence — deployed behaviour, kept as-is"
        );
    }
}
