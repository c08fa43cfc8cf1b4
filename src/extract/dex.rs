//! Dalvik executable (`.dex`) reader
//!
//! Reads only what opcode extraction needs: the string, type and method-id
//! tables, class definitions, `class_data_item`s and `code_item`s. Methods
//! are yielded class by class in file order, direct methods before virtual
//! ones. All reads are bounds-checked; nothing here panics on hostile input.

use super::opcodes;
use super::{ExtractError, MethodOpcodes};
use tracing::debug;

const HEADER_SIZE: usize = 0x70;
const ENDIAN_CONSTANT: u32 = 0x1234_5678;
const CLASS_DEF_SIZE: usize = 32;
const METHOD_ID_SIZE: usize = 8;

/// A method with code, in discovery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DexMethod {
    /// `<class descriptor>-><name>`
    pub id: String,
    pub code_off: usize,
}

/// Parsed view over the bytes of one dex file
pub struct DexFile<'a> {
    data: &'a [u8],
    string_ids: Table,
    type_ids: Table,
    method_ids: Table,
    class_defs: Table,
}

#[derive(Debug, Clone, Copy)]
struct Table {
    size: usize,
    off: usize,
}

impl<'a> DexFile<'a> {
    /// Validate the header and locate the id tables
    pub fn parse(data: &'a [u8]) -> Result<Self, ExtractError> {
        if data.len() < HEADER_SIZE {
            return Err(dex_err(0, "file shorter than dex header"));
        }
        let magic = &data[..8];
        if &magic[..4] != b"dex\n" || magic[7] != 0 || !magic[4..7].iter().all(u8::is_ascii_digit)
        {
            return Err(dex_err(0, "bad magic"));
        }

        let mut dex = Self {
            data,
            string_ids: Table { size: 0, off: 0 },
            type_ids: Table { size: 0, off: 0 },
            method_ids: Table { size: 0, off: 0 },
            class_defs: Table { size: 0, off: 0 },
        };
        if dex.u32_at(0x28)? != ENDIAN_CONSTANT {
            return Err(dex_err(0x28, "unsupported endian tag"));
        }
        dex.string_ids = dex.table(0x38)?;
        dex.type_ids = dex.table(0x40)?;
        dex.method_ids = dex.table(0x58)?;
        dex.class_defs = dex.table(0x60)?;
        Ok(dex)
    }

    fn table(&self, at: usize) -> Result<Table, ExtractError> {
        Ok(Table {
            size: self.u32_at(at)? as usize,
            off: self.u32_at(at + 4)? as usize,
        })
    }

    fn u16_at(&self, off: usize) -> Result<u16, ExtractError> {
        self.data
            .get(off..off + 2)
            .map(|b| u16::from_le_bytes([b[0], b[1]]))
            .ok_or_else(|| dex_err(off, "read past end"))
    }

    fn u32_at(&self, off: usize) -> Result<u32, ExtractError> {
        self.data
            .get(off..off + 4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .ok_or_else(|| dex_err(off, "read past end"))
    }

    fn entry(&self, table: Table, idx: usize, width: usize) -> Result<usize, ExtractError> {
        if idx >= table.size {
            return Err(dex_err(table.off, "index out of range"));
        }
        Ok(table.off + idx * width)
    }

    /// Decode a string by id (MUTF-8, lossily for non-ASCII)
    pub fn string(&self, idx: usize) -> Result<String, ExtractError> {
        let data_off = self.u32_at(self.entry(self.string_ids, idx, 4)?)? as usize;
        let mut cursor = data_off;
        read_uleb128(self.data, &mut cursor)?; // utf16 length, unused
        let rest = self
            .data
            .get(cursor..)
            .ok_or_else(|| dex_err(cursor, "string data past end"))?;
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| dex_err(cursor, "unterminated string"))?;
        Ok(String::from_utf8_lossy(&rest[..len]).into_owned())
    }

    pub fn type_descriptor(&self, idx: usize) -> Result<String, ExtractError> {
        let descriptor_idx = self.u32_at(self.entry(self.type_ids, idx, 4)?)? as usize;
        self.string(descriptor_idx)
    }

    /// `<class descriptor>-><name>` for a method id
    pub fn method_id(&self, idx: usize) -> Result<String, ExtractError> {
        let off = self.entry(self.method_ids, idx, METHOD_ID_SIZE)?;
        let class_idx = self.u16_at(off)? as usize;
        let name_idx = self.u32_at(off + 4)? as usize;
        Ok(format!(
            "{}->{}",
            self.type_descriptor(class_idx)?,
            self.string(name_idx)?
        ))
    }

    /// Methods carrying code, class by class in file order.
    ///
    /// A class whose data cannot be read is skipped with a debug log.
    pub fn methods(&self) -> Vec<DexMethod> {
        let mut out = Vec::new();
        for class in 0..self.class_defs.size {
            if let Err(e) = self.class_methods(class, &mut out) {
                debug!("Skipping class #{}: {}", class, e);
            }
        }
        out
    }

    fn class_methods(&self, class: usize, out: &mut Vec<DexMethod>) -> Result<(), ExtractError> {
        let def = self.entry(self.class_defs, class, CLASS_DEF_SIZE)?;
        let class_data_off = self.u32_at(def + 24)? as usize;
        if class_data_off == 0 {
            return Ok(());
        }

        let mut cursor = class_data_off;
        let static_fields = read_uleb128(self.data, &mut cursor)?;
        let instance_fields = read_uleb128(self.data, &mut cursor)?;
        let direct_methods = read_uleb128(self.data, &mut cursor)?;
        let virtual_methods = read_uleb128(self.data, &mut cursor)?;

        // encoded_field: field_idx_diff, access_flags
        for _ in 0..(static_fields as u64 + instance_fields as u64) * 2 {
            read_uleb128(self.data, &mut cursor)?;
        }

        for count in [direct_methods, virtual_methods] {
            // method_idx restarts for each list
            let mut method_idx = 0usize;
            for _ in 0..count {
                method_idx += read_uleb128(self.data, &mut cursor)? as usize;
                let _access_flags = read_uleb128(self.data, &mut cursor)?;
                let code_off = read_uleb128(self.data, &mut cursor)? as usize;
                if code_off == 0 {
                    continue; // abstract or native
                }
                match self.method_id(method_idx) {
                    Ok(id) => out.push(DexMethod { id, code_off }),
                    Err(e) => debug!("Skipping method #{}: {}", method_idx, e),
                }
            }
        }
        Ok(())
    }

    /// Opcode mnemonics of the code item at `code_off`, in order
    pub fn opcodes(&self, code_off: usize) -> Result<Vec<&'static str>, ExtractError> {
        let insns_size = self.u32_at(code_off + 12)? as usize;
        let start = code_off + 16;
        let end = insns_size
            .checked_mul(2)
            .and_then(|n| n.checked_add(start))
            .ok_or_else(|| dex_err(code_off, "code item size overflow"))?;
        let bytes = self
            .data
            .get(start..end)
            .ok_or_else(|| dex_err(start, "code item past end"))?;
        let insns: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect();

        let mut ops = Vec::new();
        let mut pc = 0;
        while pc < insns.len() {
            let (name, width) = opcodes::decode(&insns, pc)
                .ok_or_else(|| dex_err(start + pc * 2, "instruction overruns code item"))?;
            ops.push(name);
            pc += width;
        }
        Ok(ops)
    }
}

/// Append the opcodes of one dex file to `out`, spending from `budget`.
///
/// Returns `Ok(true)` once the budget is exhausted. Methods that fail to
/// decode are skipped; only a bad header fails the whole file.
pub fn collect_opcodes(
    data: &[u8],
    out: &mut MethodOpcodes,
    budget: &mut usize,
) -> Result<bool, ExtractError> {
    let dex = DexFile::parse(data)?;
    for method in dex.methods() {
        if *budget == 0 {
            return Ok(true);
        }
        let ops = match dex.opcodes(method.code_off) {
            Ok(ops) if !ops.is_empty() => ops,
            Ok(_) => continue,
            Err(e) => {
                debug!("Skipping method {}: {}", method.id, e);
                continue;
            }
        };
        let take = ops.len().min(*budget);
        out.entry(method.id)
            .or_default()
            .extend(ops[..take].iter().map(|s| s.to_string()));
        *budget -= take;
    }
    Ok(*budget == 0)
}

fn read_uleb128(data: &[u8], cursor: &mut usize) -> Result<u32, ExtractError> {
    let mut result: u32 = 0;
    for i in 0..5 {
        let byte = *data
            .get(*cursor)
            .ok_or_else(|| dex_err(*cursor, "uleb128 past end"))?;
        *cursor += 1;
        result |= ((byte & 0x7f) as u32) << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(dex_err(*cursor, "uleb128 longer than five bytes"))
}

fn dex_err(offset: usize, reason: &str) -> ExtractError {
    ExtractError::Dex {
        offset,
        reason: reason.to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::fixture::{build, Class};
    use super::*;

    // const/4 v0 ; return-void
    const SHORT: [u16; 2] = [0x0012, 0x000e];
    // invoke-virtual {}, meth@0 ; move-result-object v0 ; return-object v0
    const CALL: [u16; 5] = [0x006e, 0x0000, 0x0000, 0x000c, 0x0011];

    fn sample() -> Vec<u8> {
        build(&[
            Class {
                descriptor: "Lcom/example/Main;",
                direct: vec![("<init>", SHORT.to_vec())],
                virtual_methods: vec![("onCreate", CALL.to_vec())],
            },
            Class {
                descriptor: "Lcom/example/Util;",
                direct: vec![("helper", SHORT.to_vec())],
                virtual_methods: vec![],
            },
        ])
    }

    #[test]
    fn test_methods_in_discovery_order() {
        let bytes = sample();
        let dex = DexFile::parse(&bytes).unwrap();
        let ids: Vec<String> = dex.methods().into_iter().map(|m| m.id).collect();
        assert_eq!(
            ids,
            vec![
                "Lcom/example/Main;-><init>",
                "Lcom/example/Main;->onCreate",
                "Lcom/example/Util;->helper",
            ]
        );
    }

    #[test]
    fn test_collect_opcodes() {
        let mut out = MethodOpcodes::new();
        let mut budget = 100;
        let exhausted = collect_opcodes(&sample(), &mut out, &mut budget).unwrap();
        assert!(!exhausted);
        assert_eq!(budget, 100 - 7);
        assert_eq!(
            out["Lcom/example/Main;->onCreate"],
            vec!["invoke-virtual", "move-result-object", "return-object"]
        );
        assert_eq!(out["Lcom/example/Util;->helper"], vec!["const/4", "return-void"]);
    }

    #[test]
    fn test_collect_respects_budget() {
        let mut out = MethodOpcodes::new();
        let mut budget = 3;
        assert!(collect_opcodes(&sample(), &mut out, &mut budget).unwrap());
        assert_eq!(out.len(), 2);
        assert_eq!(out["Lcom/example/Main;->onCreate"], vec!["invoke-virtual"]);
    }

    #[test]
    fn test_truncated_method_is_skipped() {
        // const-wide needs five units but only two are present
        let bytes = build(&[Class {
            descriptor: "LBad;",
            direct: vec![("broken", vec![0x0018, 0x0000]), ("fine", SHORT.to_vec())],
            virtual_methods: vec![],
        }]);
        let mut out = MethodOpcodes::new();
        let mut budget = 10;
        collect_opcodes(&bytes, &mut out, &mut budget).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["LBad;->fine"]);
    }

    #[test]
    fn test_bad_header_rejected() {
        assert!(DexFile::parse(b"not a dex file").is_err());
        let mut bytes = sample();
        bytes[0] = b'x';
        assert!(DexFile::parse(&bytes).is_err());
    }

    #[test]
    fn test_uleb128() {
        let data = [0xe5, 0x8e, 0x26, 0x7f];
        let mut cursor = 0;
        assert_eq!(read_uleb128(&data, &mut cursor).unwrap(), 624_485);
        assert_eq!(cursor, 3);
        assert_eq!(read_uleb128(&data, &mut cursor).unwrap(), 0x7f);
        assert!(read_uleb128(&data, &mut cursor).is_err());
    }
}
