//! Plain-text opcode dumps
//!
//! One `<method> <opcode>` pair per line, the format written by the
//! on-device analyzer. Methods keep the order in which they first appear.

use super::{ExtractError, MethodOpcodes};
use std::path::Path;

/// Parse dump text, keeping at most `max_total_ops` opcodes
pub fn parse(content: &str, max_total_ops: usize) -> MethodOpcodes {
    let mut out = MethodOpcodes::new();
    let mut used = 0usize;

    for line in content.lines() {
        if used >= max_total_ops {
            break;
        }
        let mut parts = line.split_whitespace();
        let (Some(method), Some(op), None) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };
        out.entry(method.to_string()).or_default().push(op.to_string());
        used += 1;
    }
    out
}

pub fn extract(path: &Path, max_total_ops: usize) -> Result<MethodOpcodes, ExtractError> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse(&content, max_total_ops))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_groups_by_first_appearance() {
        let map = parse(
            "onCreate invoke-virtual\nrun const/4\nonCreate return-void\n",
            100,
        );
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["onCreate", "run"]);
        assert_eq!(map["onCreate"], vec!["invoke-virtual", "return-void"]);
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let map = parse("\n   \nlonely\na b c\nm nop\n", 100);
        assert_eq!(map.len(), 1);
        assert_eq!(map["m"], vec!["nop"]);
    }

    #[test]
    fn test_parse_budget() {
        let map = parse("a x\na y\nb z\n", 2);
        assert_eq!(map.len(), 1);
        assert_eq!(map["a"], vec!["x", "y"]);
        assert!(parse("a x\n", 0).is_empty());
    }
}
