use anyhow::{Context, Result};
use linkmerge::v1::TreeSnapshot;
use std::path::PathBuf;

pub fn read_snapshot(path: &PathBuf) -> Result<TreeSnapshot> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    TreeSnapshot::from_json(&content).with_context(|| format!("Invalid snapshot {:?}", path))
}

fn summary(snapshot: &TreeSnapshot) -> String {
    format!(
        "Valid: {} tree \"{}\" ({} links)",
        snapshot.origin(),
        snapshot.source_label(),
        snapshot.root().link_count()
    )
}

pub fn run(input: PathBuf) -> Result<()> {
    let snapshot = read_snapshot(&input)?;
    println!("{}", summary(&snapshot));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "{}", content).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn test_summary() {
        let snapshot = TreeSnapshot::from_json(
            r#"{"origin": "loaded", "source_label": "arm.csv",
                "root": {"name": "base", "children": [{"name": "arm1"}]}}"#,
        )
        .unwrap();
        assert_eq!(summary(&snapshot), "Valid: loaded tree \"arm.csv\" (2 links)");
    }

    #[test]
    fn test_run_valid() {
        let f = write_temp(
            r#"{"origin": "existing", "source_label": "arm", "root": {"name": "base"}}"#,
        );
        assert!(run(f.path().to_path_buf()).is_ok());
    }

    #[test]
    fn test_run_duplicate_siblings() {
        let f = write_temp(
            r#"{"origin": "existing", "source_label": "arm",
                "root": {"name": "base", "children": [{"name": "a"}, {"name": "a"}]}}"#,
        );
        let err = run(f.path().to_path_buf()).unwrap_err();
        assert!(format!("{:#}", err).contains("already exists"));
    }

    #[test]
    fn test_run_missing_file() {
        assert!(run(PathBuf::from("/nonexistent/tree.json")).is_err());
    }
}
