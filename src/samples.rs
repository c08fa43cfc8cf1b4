//! Sample directory listing and selection

use ignore::WalkBuilder;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::io;
use std::path::{Path, PathBuf};

/// Sample files directly inside `dir`, sorted by file name.
///
/// Extensions match case-insensitively; subdirectories are not entered.
pub fn list_samples(dir: &Path, extensions: &[String]) -> io::Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        ));
    }

    let walker = WalkBuilder::new(dir)
        .standard_filters(false)
        .max_depth(Some(1))
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        })
        .collect();
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Positional benign/malicious pairs, at most `max_apps` of them
pub fn paired(benign: &[PathBuf], malicious: &[PathBuf], max_apps: usize) -> Vec<(PathBuf, PathBuf)> {
    benign
        .iter()
        .cloned()
        .zip(malicious.iter().cloned())
        .take(max_apps)
        .collect()
}

/// Seeded random pick of `count` files from the last `tail_length`.
///
/// `tail_length == 0` draws from the whole list.
pub fn tail_sample(files: &[PathBuf], tail_length: usize, count: usize, seed: u64) -> Vec<PathBuf> {
    let start = if tail_length == 0 {
        0
    } else {
        files.len().saturating_sub(tail_length)
    };
    let mut tail = files[start..].to_vec();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    tail.shuffle(&mut rng);
    tail.truncate(count);
    tail
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exts() -> Vec<String> {
        vec!["apk".into(), "opcodes".into()]
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_list_samples_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.apk", "a.APK", "c.opcodes", "notes.txt", ".hidden.apk"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.apk")).unwrap();
        fs::write(dir.path().join("nested.apk/inner.apk"), b"x").unwrap();
        fs::write(dir.path().join(".gitignore"), "*.apk\n").unwrap();

        let files = list_samples(dir.path(), &exts()).unwrap();
        assert_eq!(names(&files), vec![".hidden.apk", "a.APK", "b.apk", "c.opcodes"]);
    }

    #[test]
    fn test_list_samples_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_samples(&dir.path().join("nope"), &exts()).is_err());
    }

    #[test]
    fn test_paired_bounded_by_smaller_side() {
        let b: Vec<PathBuf> = (0..5).map(|i| PathBuf::from(format!("b{i}"))).collect();
        let m: Vec<PathBuf> = (0..3).map(|i| PathBuf::from(format!("m{i}"))).collect();
        assert_eq!(paired(&b, &m, 10).len(), 3);
        let two = paired(&b, &m, 2);
        assert_eq!(two, vec![
            (PathBuf::from("b0"), PathBuf::from("m0")),
            (PathBuf::from("b1"), PathBuf::from("m1")),
        ]);
        assert!(paired(&b, &m, 0).is_empty());
    }

    #[test]
    fn test_tail_sample() {
        let files: Vec<PathBuf> = (0..20).map(|i| PathBuf::from(format!("f{i:02}"))).collect();

        let picked = tail_sample(&files, 5, 3, 43);
        assert_eq!(picked.len(), 3);
        assert!(picked.iter().all(|p| files[15..].contains(p)));
        assert_eq!(picked, tail_sample(&files, 5, 3, 43));

        let mut all = tail_sample(&files, 0, 100, 7);
        assert_eq!(all.len(), 20);
        all.sort();
        assert_eq!(all, files);

        assert!(tail_sample(&[], 5, 3, 43).is_empty());
    }
}
