use anyhow::Result;
use linkmerge::v1::{TreeSnapshot, labels, query};
use std::path::PathBuf;

use crate::cmd_validate::read_snapshot;

fn outline(snapshot: &TreeSnapshot) -> String {
    let heading = format!(
        "{}{}",
        labels::tree_heading(snapshot.origin()),
        labels::shorten_label(snapshot.source_label(), labels::HEADING_WIDTH)
    );
    let mut out = heading;
    out.push('\n');
    for (path, node) in query::walk(snapshot.root()) {
        let indent = "  ".repeat(path.depth() - 1);
        out.push_str(&indent);
        out.push_str(node.name());
        if !node.link().is_empty() {
            out.push_str(" *");
        }
        out.push('\n');
    }
    out
}

pub fn run(input: PathBuf) -> Result<()> {
    let snapshot = read_snapshot(&input)?;
    print!("{}", outline(&snapshot));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkmerge::v1::{LinkData, LinkNode, Origin};
    use std::io::Write;

    #[test]
    fn test_outline() {
        let snapshot = TreeSnapshot::new(
            Origin::Existing,
            "arm",
            LinkNode::new("base")
                .with_child(
                    LinkNode::new("shoulder")
                        .with_link(LinkData::new(serde_json::json!({"mass": 2.0})))
                        .with_child(LinkNode::new("elbow")),
                )
                .with_child(LinkNode::new("camera")),
        )
        .unwrap();

        assert_eq!(
            outline(&snapshot),
            "Configuration from Assembly: arm\nbase\n  shoulder *\n    elbow\n  camera\n"
        );
    }

    #[test]
    fn test_run_show() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(
            f,
            r#"{{"origin": "loaded", "source_label": "arm.csv", "root": {{"name": "base"}}}}"#
        )
        .unwrap();
        f.flush().unwrap();
        assert!(run(f.path().to_path_buf()).is_ok());
    }
}
