//! APK container handling
//!
//! An APK is a ZIP archive; its bytecode lives in `classes.dex`,
//! `classes2.dex`, `classes3.dex`, ... which are read in that numeric order.

use super::{dex, ExtractError, MethodOpcodes};
use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;
use tracing::debug;

/// Dex entries above this size are skipped
pub const MAX_DEX_ENTRY_BYTES: u64 = 32 * 1024 * 1024;

/// Position of a `classes*.dex` entry in load order, or `None` for other names
fn dex_rank(name: &str) -> Option<u32> {
    let middle = name.strip_prefix("classes")?.strip_suffix(".dex")?;
    if middle.is_empty() {
        return Some(1);
    }
    middle.parse::<u32>().ok().filter(|&n| n >= 2)
}

/// Read every `classes*.dex` entry, in load order
pub fn read_dex_entries<R: Read + Seek>(reader: R) -> Result<Vec<(String, Vec<u8>)>, ExtractError> {
    let mut archive = zip::ZipArchive::new(reader)?;

    let mut ranked: Vec<(u32, usize, String)> = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        if let Some(rank) = dex_rank(entry.name()) {
            ranked.push((rank, i, entry.name().to_string()));
        }
    }
    ranked.sort();

    let mut out = Vec::with_capacity(ranked.len());
    for (_, i, name) in ranked {
        let mut entry = archive.by_index(i)?;
        if entry.size() == 0 || entry.size() > MAX_DEX_ENTRY_BYTES {
            debug!("Skipping dex entry {} ({} bytes)", name, entry.size());
            continue;
        }
        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;
        out.push((name, bytes));
    }
    Ok(out)
}

/// Opcodes of every dex in the APK at `path`, within `max_total_ops`
pub fn extract(path: &Path, max_total_ops: usize) -> Result<MethodOpcodes, ExtractError> {
    let entries = read_dex_entries(File::open(path)?)?;
    if entries.is_empty() {
        return Err(ExtractError::NoBytecode);
    }

    let mut out = MethodOpcodes::new();
    let mut budget = max_total_ops;
    for (name, bytes) in entries {
        if budget == 0 {
            break;
        }
        match dex::collect_opcodes(&bytes, &mut out, &mut budget) {
            Ok(true) => break,
            Ok(false) => {}
            Err(e) => debug!("Skipping {} in {}: {}", name, path.display(), e),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::super::dex::fixture::{build, Class};
    use super::*;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn dex_with(descriptor: &str, op: u16) -> Vec<u8> {
        build(&[Class {
            descriptor,
            direct: vec![("run", vec![op, 0x000e])],
            virtual_methods: vec![],
        }])
    }

    fn write_apk(path: &Path, entries: &[(&str, Vec<u8>)]) {
        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, bytes) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(bytes).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_dex_rank() {
        assert_eq!(dex_rank("classes.dex"), Some(1));
        assert_eq!(dex_rank("classes2.dex"), Some(2));
        assert_eq!(dex_rank("classes10.dex"), Some(10));
        assert_eq!(dex_rank("classes1.dex"), None);
        assert_eq!(dex_rank("assets/classes.dex.bak"), None);
        assert_eq!(dex_rank("lib/classes.dex"), None);
    }

    #[test]
    fn test_entries_in_numeric_order() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("app.apk");
        write_apk(
            &apk,
            &[
                ("classes10.dex", dex_with("LTen;", 0x0012)),
                ("AndroidManifest.xml", b"<manifest/>".to_vec()),
                ("classes2.dex", dex_with("LTwo;", 0x0012)),
                ("classes.dex", dex_with("LOne;", 0x0012)),
            ],
        );
        let map = extract(&apk, 100).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["LOne;->run", "LTwo;->run", "LTen;->run"]);
    }

    #[test]
    fn test_budget_spans_dex_files() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("app.apk");
        write_apk(
            &apk,
            &[
                ("classes.dex", dex_with("LOne;", 0x0012)),
                ("classes2.dex", dex_with("LTwo;", 0x0012)),
            ],
        );
        let map = extract(&apk, 3).unwrap();
        assert_eq!(map["LOne;->run"], vec!["const/4", "return-void"]);
        assert_eq!(map["LTwo;->run"], vec!["const/4"]);
    }

    #[test]
    fn test_apk_without_dex() {
        let dir = tempfile::tempdir().unwrap();
        let apk = dir.path().join("empty.apk");
        write_apk(&apk, &[("AndroidManifest.xml", b"<manifest/>".to_vec())]);
        assert!(matches!(extract(&apk, 10), Err(ExtractError::NoBytecode)));
    }

    #[test]
    fn test_not_a_zip() {
        let cursor = Cursor::new(b"definitely not a zip".to_vec());
        assert!(matches!(read_dex_entries(cursor), Err(ExtractError::Zip(_))));
    }
}
