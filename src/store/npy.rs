//! Minimal NumPy `.npy` codec for 1-D `int8` arrays
//!
//! Layout: `\x93NUMPY`, major/minor version, little-endian header length,
//! a Python dict literal header padded with spaces to a 64-byte boundary
//! and terminated by `\n`, then the raw bytes.

use crate::error::{HdcError, HdcResult};
use crate::hdc::Hypervector;
use std::path::Path;

const MAGIC: &[u8; 6] = b"\x93NUMPY";
const ALIGN: usize = 64;
const INT8_DESCRS: [&str; 3] = ["|i1", "<i1", "i1"];

/// Serialize a hypervector as a version 1.0 `.npy` image
pub fn encode(hv: &Hypervector) -> Vec<u8> {
    let dict = format!(
        "{{'descr': '|i1', 'fortran_order': False, 'shape': ({},), }}",
        hv.dim()
    );
    // magic + version + u16 length + dict + '\n'
    let unpadded = MAGIC.len() + 2 + 2 + dict.len() + 1;
    let padding = (ALIGN - unpadded % ALIGN) % ALIGN;
    let header_len = dict.len() + padding + 1;

    let mut out = Vec::with_capacity(unpadded + padding + hv.dim());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[1, 0]);
    out.extend_from_slice(&(header_len as u16).to_le_bytes());
    out.extend_from_slice(dict.as_bytes());
    out.extend(std::iter::repeat_n(b' ', padding));
    out.push(b'\n');
    out.extend(hv.as_slice().iter().map(|&v| v as u8));
    out
}

/// Parse a `.npy` image; `path` is only used in error messages
pub fn decode(bytes: &[u8], path: &Path) -> HdcResult<Hypervector> {
    let invalid = |reason: String| HdcError::InvalidArtifact {
        path: path.to_path_buf(),
        reason,
    };

    if bytes.len() < MAGIC.len() + 4 || &bytes[..MAGIC.len()] != MAGIC {
        return Err(invalid("not an .npy file".into()));
    }
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(invalid("truncated header".into()));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        v => return Err(invalid(format!("unsupported format version {v}"))),
    };
    let data_start = header_start + header_len;
    let header = bytes
        .get(header_start..data_start)
        .ok_or_else(|| invalid("truncated header".into()))?;
    let header = std::str::from_utf8(header).map_err(|_| invalid("header is not text".into()))?;

    let descr = dict_value(header, "descr").ok_or_else(|| invalid("missing descr".into()))?;
    let descr = descr.trim_matches(|c| c == '\'' || c == '"');
    if !INT8_DESCRS.contains(&descr) {
        return Err(invalid(format!("dtype {descr} is not int8")));
    }
    if dict_value(header, "fortran_order") != Some("False") {
        return Err(invalid("fortran order is not supported".into()));
    }
    let shape = dict_value(header, "shape").ok_or_else(|| invalid("missing shape".into()))?;
    let dims: Vec<&str> = shape
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();
    let [dim] = dims.as_slice() else {
        return Err(invalid(format!("shape {shape} is not one-dimensional")));
    };
    let dim: usize = dim
        .parse()
        .map_err(|_| invalid(format!("bad shape {shape}")))?;

    let data = &bytes[data_start..];
    if data.len() != dim {
        return Err(invalid(format!(
            "expected {dim} values, found {} bytes",
            data.len()
        )));
    }
    Hypervector::from_bipolar(data.iter().map(|&b| b as i8).collect())
        .map_err(|e| invalid(e.to_string()))
}

pub fn write(path: &Path, hv: &Hypervector) -> HdcResult<()> {
    std::fs::write(path, encode(hv))?;
    Ok(())
}

pub fn read(path: &Path) -> HdcResult<Hypervector> {
    let bytes = std::fs::read(path)?;
    decode(&bytes, path)
}

/// Raw text of `key`'s value in a Python dict literal
fn dict_value<'h>(header: &'h str, key: &str) -> Option<&'h str> {
    let at = header
        .find(&format!("'{key}'"))
        .or_else(|| header.find(&format!("\"{key}\"")))?;
    let rest = &header[at + key.len() + 2..];
    let rest = rest.trim_start().strip_prefix(':')?.trim_start();
    let end = match rest.chars().next()? {
        '(' => rest.find(')')? + 1,
        q @ ('\'' | '"') => rest[1..].find(q)? + 2,
        _ => rest.find([',', '}']).unwrap_or(rest.len()),
    };
    Some(rest[..end].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdc::{generate, Namespace};

    fn p() -> &'static Path {
        Path::new("test.npy")
    }

    #[test]
    fn test_header_alignment() {
        for dim in [1, 8, 100, 2048, 70_000] {
            let hv = Hypervector::ones(dim).unwrap();
            let bytes = encode(&hv);
            let header_len = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
            assert_eq!((10 + header_len) % 64, 0);
            assert_eq!(bytes[10 + header_len - 1], b'\n');
            assert_eq!(bytes.len(), 10 + header_len + dim);
        }
    }

    #[test]
    fn test_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("v.npy");
        let hv = generate(Namespace::Method, "round-trip", 2048).unwrap();
        write(&path, &hv).unwrap();
        assert_eq!(read(&path).unwrap(), hv);
    }

    #[test]
    fn test_reads_numpy_style_header() {
        // Header exactly as numpy.save writes it for an int8 vector
        let dict = "{'descr': '|i1', 'fortran_order': False, 'shape': (4,), }";
        let mut header = dict.to_string();
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&(header.len() as u16).to_le_bytes());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&[1, 0xff, 0xff, 1]);
        assert_eq!(decode(&bytes, p()).unwrap().as_slice(), &[1, -1, -1, 1]);
    }

    fn with_header(dict: &str, data: &[u8]) -> Vec<u8> {
        let mut bytes = b"\x93NUMPY\x01\x00".to_vec();
        bytes.extend_from_slice(&((dict.len() + 1) as u16).to_le_bytes());
        bytes.extend_from_slice(dict.as_bytes());
        bytes.push(b'\n');
        bytes.extend_from_slice(data);
        bytes
    }

    #[test]
    fn test_rejects_bad_artifacts() {
        let cases = [
            with_header("{'descr': '<f4', 'fortran_order': False, 'shape': (1,), }", &[0; 4]),
            with_header("{'descr': '|i1', 'fortran_order': True, 'shape': (2,), }", &[1, 1]),
            with_header("{'descr': '|i1', 'fortran_order': False, 'shape': (1, 2), }", &[1, 1]),
            with_header("{'descr': '|i1', 'fortran_order': False, 'shape': (4,), }", &[1, 1]),
            with_header("{'descr': '|i1', 'fortran_order': False, 'shape': (2,), }", &[1, 0]),
            b"PK\x03\x04 definitely a zip".to_vec(),
        ];
        for bytes in cases {
            assert!(matches!(
                decode(&bytes, p()),
                Err(HdcError::InvalidArtifact { .. })
            ));
        }
    }

    #[test]
    fn test_dict_value() {
        let h = "{'descr': '<i1', 'fortran_order': False, 'shape': (12,), }";
        assert_eq!(dict_value(h, "descr"), Some("'<i1'"));
        assert_eq!(dict_value(h, "fortran_order"), Some("False"));
        assert_eq!(dict_value(h, "shape"), Some("(12,)"));
        assert_eq!(dict_value(h, "missing"), None);
    }
}
