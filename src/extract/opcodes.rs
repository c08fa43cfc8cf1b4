//! Dalvik opcode table
//!
//! Mnemonics and code-unit widths for every one-byte opcode, plus the three
//! payload pseudo-instructions that share opcode `0x00` with `nop`.

/// Mnemonic and width (in 16-bit code units) of one opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opcode {
    pub name: &'static str,
    pub units: u8,
}

pub const PACKED_SWITCH_PAYLOAD: &str = "packed-switch-payload";
pub const SPARSE_SWITCH_PAYLOAD: &str = "sparse-switch-payload";
pub const FILL_ARRAY_DATA_PAYLOAD: &str = "fill-array-data-payload";

/// Payload identifiers (full first code unit)
const PACKED_SWITCH_IDENT: u16 = 0x0100;
const SPARSE_SWITCH_IDENT: u16 = 0x0200;
const FILL_ARRAY_DATA_IDENT: u16 = 0x0300;

/// Decode the instruction starting at `insns[pc]`.
///
/// Returns the mnemonic and the number of code units it occupies, or `None`
/// when the instruction (or its payload header) runs past the end.
pub fn decode(insns: &[u16], pc: usize) -> Option<(&'static str, usize)> {
    let unit = *insns.get(pc)?;
    let (name, width) = match unit {
        PACKED_SWITCH_IDENT => {
            // ident, size, first_key (2 units), targets (2 units each)
            let size = *insns.get(pc + 1)? as usize;
            (PACKED_SWITCH_PAYLOAD, 4 + size * 2)
        }
        SPARSE_SWITCH_IDENT => {
            // ident, size, keys (2 units each), targets (2 units each)
            let size = *insns.get(pc + 1)? as usize;
            (SPARSE_SWITCH_PAYLOAD, 2 + size * 4)
        }
        FILL_ARRAY_DATA_IDENT => {
            // ident, element_width, size (2 units), data rounded up to whole units
            let element_width = *insns.get(pc + 1)? as usize;
            let lo = *insns.get(pc + 2)? as usize;
            let hi = *insns.get(pc + 3)? as usize;
            let size = lo | (hi << 16);
            (FILL_ARRAY_DATA_PAYLOAD, 4 + (size * element_width + 1) / 2)
        }
        _ => {
            let op = OPCODES[(unit & 0xff) as usize];
            (op.name, op.units as usize)
        }
    };
    if pc + width > insns.len() {
        return None;
    }
    Some((name, width))
}

pub static OPCODES: [Opcode; 256] = [
    Opcode { name: "nop", units: 1 }, // 0x00
    Opcode { name: "move", units: 1 }, // 0x01
    Opcode { name: "move/from16", units: 2 }, // 0x02
    Opcode { name: "move/16", units: 3 }, // 0x03
    Opcode { name: "move-wide", units: 1 }, // 0x04
    Opcode { name: "move-wide/from16", units: 2 }, // 0x05
    Opcode { name: "move-wide/16", units: 3 }, // 0x06
    Opcode { name: "move-object", units: 1 }, // 0x07
    Opcode { name: "move-object/from16", units: 2 }, // 0x08
    Opcode { name: "move-object/16", units: 3 }, // 0x09
    Opcode { name: "move-result", units: 1 }, // 0x0a
    Opcode { name: "move-result-wide", units: 1 }, // 0x0b
    Opcode { name: "move-result-object", units: 1 }, // 0x0c
    Opcode { name: "move-exception", units: 1 }, // 0x0d
    Opcode { name: "return-void", units: 1 }, // 0x0e
    Opcode { name: "return", units: 1 }, // 0x0f
    Opcode { name: "return-wide", units: 1 }, // 0x10
    Opcode { name: "return-object", units: 1 }, // 0x11
    Opcode { name: "const/4", units: 1 }, // 0x12
    Opcode { name: "const/16", units: 2 }, // 0x13
    Opcode { name: "const", units: 3 }, // 0x14
    Opcode { name: "const/high16", units: 2 }, // 0x15
    Opcode { name: "const-wide/16", units: 2 }, // 0x16
    Opcode { name: "const-wide/32", units: 3 }, // 0x17
    Opcode { name: "const-wide", units: 5 }, // 0x18
    Opcode { name: "const-wide/high16", units: 2 }, // 0x19
    Opcode { name: "const-string", units: 2 }, // 0x1a
    Opcode { name: "const-string/jumbo", units: 3 }, // 0x1b
    Opcode { name: "const-class", units: 2 }, // 0x1c
    Opcode { name: "monitor-enter", units: 1 }, // 0x1d
    Opcode { name: "monitor-exit", units: 1 }, // 0x1e
    Opcode { name: "check-cast", units: 2 }, // 0x1f
    Opcode { name: "instance-of", units: 2 }, // 0x20
    Opcode { name: "array-length", units: 1 }, // 0x21
    Opcode { name: "new-instance", units: 2 }, // 0x22
    Opcode { name: "new-array", units: 2 }, // 0x23
    Opcode { name: "filled-new-array", units: 3 }, // 0x24
    Opcode { name: "filled-new-array/range", units: 3 }, // 0x25
    Opcode { name: "fill-array-data", units: 3 }, // 0x26
    Opcode { name: "throw", units: 1 }, // 0x27
    Opcode { name: "goto", units: 1 }, // 0x28
    Opcode { name: "goto/16", units: 2 }, // 0x29
    Opcode { name: "goto/32", units: 3 }, // 0x2a
    Opcode { name: "packed-switch", units: 3 }, // 0x2b
    Opcode { name: "sparse-switch", units: 3 }, // 0x2c
    Opcode { name: "cmpl-float", units: 2 }, // 0x2d
    Opcode { name: "cmpg-float", units: 2 }, // 0x2e
    Opcode { name: "cmpl-double", units: 2 }, // 0x2f
    Opcode { name: "cmpg-double", units: 2 }, // 0x30
    Opcode { name: "cmp-long", units: 2 }, // 0x31
    Opcode { name: "if-eq", units: 2 }, // 0x32
    Opcode { name: "if-ne", units: 2 }, // 0x33
    Opcode { name: "if-lt", units: 2 }, // 0x34
    Opcode { name: "if-ge", units: 2 }, // 0x35
    Opcode { name: "if-gt", units: 2 }, // 0x36
    Opcode { name: "if-le", units: 2 }, // 0x37
    Opcode { name: "if-eqz", units: 2 }, // 0x38
    Opcode { name: "if-nez", units: 2 }, // 0x39
    Opcode { name: "if-ltz", units: 2 }, // 0x3a
    Opcode { name: "if-gez", units: 2 }, // 0x3b
    Opcode { name: "if-gtz", units: 2 }, // 0x3c
    Opcode { name: "if-lez", units: 2 }, // 0x3d
    Opcode { name: "unused-3e", units: 1 }, // 0x3e
    Opcode { name: "unused-3f", units: 1 }, // 0x3f
    Opcode { name: "unused-40", units: 1 }, // 0x40
    Opcode { name: "unused-41", units: 1 }, // 0x41
    Opcode { name: "unused-42", units: 1 }, // 0x42
    Opcode { name: "unused-43", units: 1 }, // 0x43
    Opcode { name: "aget", units: 2 }, // 0x44
    Opcode { name: "aget-wide", units: 2 }, // 0x45
    Opcode { name: "aget-object", units: 2 }, // 0x46
    Opcode { name: "aget-boolean", units: 2 }, // 0x47
    Opcode { name: "aget-byte", units: 2 }, // 0x48
    Opcode { name: "aget-char", units: 2 }, // 0x49
    Opcode { name: "aget-short", units: 2 }, // 0x4a
    Opcode { name: "aput", units: 2 }, // 0x4b
    Opcode { name: "aput-wide", units: 2 }, // 0x4c
    Opcode { name: "aput-object", units: 2 }, // 0x4d
    Opcode { name: "aput-boolean", units: 2 }, // 0x4e
    Opcode { name: "aput-byte", units: 2 }, // 0x4f
    Opcode { name: "aput-char", units: 2 }, // 0x50
    Opcode { name: "aput-short", units: 2 }, // 0x51
    Opcode { name: "iget", units: 2 }, // 0x52
    Opcode { name: "iget-wide", units: 2 }, // 0x53
    Opcode { name: "iget-object", units: 2 }, // 0x54
    Opcode { name: "iget-boolean", units: 2 }, // 0x55
    Opcode { name: "iget-byte", units: 2 }, // 0x56
    Opcode { name: "iget-char", units: 2 }, // 0x57
    Opcode { name: "iget-short", units: 2 }, // 0x58
    Opcode { name: "iput", units: 2 }, // 0x59
    Opcode { name: "iput-wide", units: 2 }, // 0x5a
    Opcode { name: "iput-object", units: 2 }, // 0x5b
    Opcode { name: "iput-boolean", units: 2 }, // 0x5c
    Opcode { name: "iput-byte", units: 2 }, // 0x5d
    Opcode { name: "iput-char", units: 2 }, // 0x5e
    Opcode { name: "iput-short", units: 2 }, // 0x5f
    Opcode { name: "sget", units: 2 }, // 0x60
    Opcode { name: "sget-wide", units: 2 }, // 0x61
    Opcode { name: "sget-object", units: 2 }, // 0x62
    Opcode { name: "sget-boolean", units: 2 }, // 0x63
    Opcode { name: "sget-byte", units: 2 }, // 0x64
    Opcode { name: "sget-char", units: 2 }, // 0x65
    Opcode { name: "sget-short", units: 2 }, // 0x66
    Opcode { name: "sput", units: 2 }, // 0x67
    Opcode { name: "sput-wide", units: 2 }, // 0x68
    Opcode { name: "sput-object", units: 2 }, // 0x69
    Opcode { name: "sput-boolean", units: 2 }, // 0x6a
    Opcode { name: "sput-byte", units: 2 }, // 0x6b
    Opcode { name: "sput-char", units: 2 }, // 0x6c
    Opcode { name: "sput-short", units: 2 }, // 0x6d
    Opcode { name: "invoke-virtual", units: 3 }, // 0x6e
    Opcode { name: "invoke-super", units: 3 }, // 0x6f
    Opcode { name: "invoke-direct", units: 3 }, // 0x70
    Opcode { name: "invoke-static", units: 3 }, // 0x71
    Opcode { name: "invoke-interface", units: 3 }, // 0x72
    Opcode { name: "unused-73", units: 1 }, // 0x73
    Opcode { name: "invoke-virtual/range", units: 3 }, // 0x74
    Opcode { name: "invoke-super/range", units: 3 }, // 0x75
    Opcode { name: "invoke-direct/range", units: 3 }, // 0x76
    Opcode { name: "invoke-static/range", units: 3 }, // 0x77
    Opcode { name: "invoke-interface/range", units: 3 }, // 0x78
    Opcode { name: "unused-79", units: 1 }, // 0x79
    Opcode { name: "unused-7a", units: 1 }, // 0x7a
    Opcode { name: "neg-int", units: 1 }, // 0x7b
    Opcode { name: "not-int", units: 1 }, // 0x7c
    Opcode { name: "neg-long", units: 1 }, // 0x7d
    Opcode { name: "not-long", units: 1 }, // 0x7e
    Opcode { name: "neg-float", units: 1 }, // 0x7f
    Opcode { name: "neg-double", units: 1 }, // 0x80
    Opcode { name: "int-to-long", units: 1 }, // 0x81
    Opcode { name: "int-to-float", units: 1 }, // 0x82
    Opcode { name: "int-to-double", units: 1 }, // 0x83
    Opcode { name: "long-to-int", units: 1 }, // 0x84
    Opcode { name: "long-to-float", units: 1 }, // 0x85
    Opcode { name: "long-to-double", units: 1 }, // 0x86
    Opcode { name: "float-to-int", units: 1 }, // 0x87
    Opcode { name: "float-to-long", units: 1 }, // 0x88
    Opcode { name: "float-to-double", units: 1 }, // 0x89
    Opcode { name: "double-to-int", units: 1 }, // 0x8a
    Opcode { name: "double-to-long", units: 1 }, // 0x8b
    Opcode { name: "double-to-float", units: 1 }, // 0x8c
    Opcode { name: "int-to-byte", units: 1 }, // 0x8d
    Opcode { name: "int-to-char", units: 1 }, // 0x8e
    Opcode { name: "int-to-short", units: 1 }, // 0x8f
    Opcode { name: "add-int", units: 2 }, // 0x90
    Opcode { name: "sub-int", units: 2 }, // 0x91
    Opcode { name: "mul-int", units: 2 }, // 0x92
    Opcode { name: "div-int", units: 2 }, // 0x93
    Opcode { name: "rem-int", units: 2 }, // 0x94
    Opcode { name: "and-int", units: 2 }, // 0x95
    Opcode { name: "or-int", units: 2 }, // 0x96
    Opcode { name: "xor-int", units: 2 }, // 0x97
    Opcode { name: "shl-int", units: 2 }, // 0x98
    Opcode { name: "shr-int", units: 2 }, // 0x99
    Opcode { name: "ushr-int", units: 2 }, // 0x9a
    Opcode { name: "add-long", units: 2 }, // 0x9b
    Opcode { name: "sub-long", units: 2 }, // 0x9c
    Opcode { name: "mul-long", units: 2 }, // 0x9d
    Opcode { name: "div-long", units: 2 }, // 0x9e
    Opcode { name: "rem-long", units: 2 }, // 0x9f
    Opcode { name: "and-long", units: 2 }, // 0xa0
    Opcode { name: "or-long", units: 2 }, // 0xa1
    Opcode { name: "xor-long", units: 2 }, // 0xa2
    Opcode { name: "shl-long", units: 2 }, // 0xa3
    Opcode { name: "shr-long", units: 2 }, // 0xa4
    Opcode { name: "ushr-long", units: 2 }, // 0xa5
    Opcode { name: "add-float", units: 2 }, // 0xa6
    Opcode { name: "sub-float", units: 2 }, // 0xa7
    Opcode { name: "mul-float", units: 2 }, // 0xa8
    Opcode { name: "div-float", units: 2 }, // 0xa9
    Opcode { name: "rem-float", units: 2 }, // 0xaa
    Opcode { name: "add-double", units: 2 }, // 0xab
    Opcode { name: "sub-double", units: 2 }, // 0xac
    Opcode { name: "mul-double", units: 2 }, // 0xad
    Opcode { name: "div-double", units: 2 }, // 0xae
    Opcode { name: "rem-double", units: 2 }, // 0xaf
    Opcode { name: "add-int/2addr", units: 1 }, // 0xb0
    Opcode { name: "sub-int/2addr", units: 1 }, // 0xb1
    Opcode { name: "mul-int/2addr", units: 1 }, // 0xb2
    Opcode { name: "div-int/2addr", units: 1 }, // 0xb3
    Opcode { name: "rem-int/2addr", units: 1 }, // 0xb4
    Opcode { name: "and-int/2addr", units: 1 }, // 0xb5
    Opcode { name: "or-int/2addr", units: 1 }, // 0xb6
    Opcode { name: "xor-int/2addr", units: 1 }, // 0xb7
    Opcode { name: "shl-int/2addr", units: 1 }, // 0xb8
    Opcode { name: "shr-int/2addr", units: 1 }, // 0xb9
    Opcode { name: "ushr-int/2addr", units: 1 }, // 0xba
    Opcode { name: "add-long/2addr", units: 1 }, // 0xbb
    Opcode { name: "sub-long/2addr", units: 1 }, // 0xbc
    Opcode { name: "mul-long/2addr", units: 1 }, // 0xbd
    Opcode { name: "div-long/2addr", units: 1 }, // 0xbe
    Opcode { name: "rem-long/2addr", units: 1 }, // 0xbf
    Opcode { name: "and-long/2addr", units: 1 }, // 0xc0
    Opcode { name: "or-long/2addr", units: 1 }, // 0xc1
    Opcode { name: "xor-long/2addr", units: 1 }, // 0xc2
    Opcode { name: "shl-long/2addr", units: 1 }, // 0xc3
    Opcode { name: "shr-long/2addr", units: 1 }, // 0xc4
    Opcode { name: "ushr-long/2addr", units: 1 }, // 0xc5
    Opcode { name: "add-float/2addr", units: 1 }, // 0xc6
    Opcode { name: "sub-float/2addr", units: 1 }, // 0xc7
    Opcode { name: "mul-float/2addr", units: 1 }, // 0xc8
    Opcode { name: "div-float/2addr", units: 1 }, // 0xc9
    Opcode { name: "rem-float/2addr", units: 1 }, // 0xca
    Opcode { name: "add-double/2addr", units: 1 }, // 0xcb
    Opcode { name: "sub-double/2addr", units: 1 }, // 0xcc
    Opcode { name: "mul-double/2addr", units: 1 }, // 0xcd
    Opcode { name: "div-double/2addr", units: 1 }, // 0xce
    Opcode { name: "rem-double/2addr", units: 1 }, // 0xcf
    Opcode { name: "add-int/lit16", units: 2 }, // 0xd0
    Opcode { name: "rsub-int", units: 2 }, // 0xd1
    Opcode { name: "mul-int/lit16", units: 2 }, // 0xd2
    Opcode { name: "div-int/lit16", units: 2 }, // 0xd3
    Opcode { name: "rem-int/lit16", units: 2 }, // 0xd4
    Opcode { name: "and-int/lit16", units: 2 }, // 0xd5
    Opcode { name: "or-int/lit16", units: 2 }, // 0xd6
    Opcode { name: "xor-int/lit16", units: 2 }, // 0xd7
    Opcode { name: "add-int/lit8", units: 2 }, // 0xd8
    Opcode { name: "rsub-int/lit8", units: 2 }, // 0xd9
    Opcode { name: "mul-int/lit8", units: 2 }, // 0xda
    Opcode { name: "div-int/lit8", units: 2 }, // 0xdb
    Opcode { name: "rem-int/lit8", units: 2 }, // 0xdc
    Opcode { name: "and-int/lit8", units: 2 }, // 0xdd
    Opcode { name: "or-int/lit8", units: 2 }, // 0xde
    Opcode { name: "xor-int/lit8", units: 2 }, // 0xdf
    Opcode { name: "shl-int/lit8", units: 2 }, // 0xe0
    Opcode { name: "shr-int/lit8", units: 2 }, // 0xe1
    Opcode { name: "ushr-int/lit8", units: 2 }, // 0xe2
    Opcode { name: "unused-e3", units: 1 }, // 0xe3
    Opcode { name: "unused-e4", units: 1 }, // 0xe4
    Opcode { name: "unused-e5", units: 1 }, // 0xe5
    Opcode { name: "unused-e6", units: 1 }, // 0xe6
    Opcode { name: "unused-e7", units: 1 }, // 0xe7
    Opcode { name: "unused-e8", units: 1 }, // 0xe8
    Opcode { name: "unused-e9", units: 1 }, // 0xe9
    Opcode { name: "unused-ea", units: 1 }, // 0xea
    Opcode { name: "unused-eb", units: 1 }, // 0xeb
    Opcode { name: "unused-ec", units: 1 }, // 0xec
    Opcode { name: "unused-ed", units: 1 }, // 0xed
    Opcode { name: "unused-ee", units: 1 }, // 0xee
    Opcode { name: "unused-ef", units: 1 }, // 0xef
    Opcode { name: "unused-f0", units: 1 }, // 0xf0
    Opcode { name: "unused-f1", units: 1 }, // 0xf1
    Opcode { name: "unused-f2", units: 1 }, // 0xf2
    Opcode { name: "unused-f3", units: 1 }, // 0xf3
    Opcode { name: "unused-f4", units: 1 }, // 0xf4
    Opcode { name: "unused-f5", units: 1 }, // 0xf5
    Opcode { name: "unused-f6", units: 1 }, // 0xf6
    Opcode { name: "unused-f7", units: 1 }, // 0xf7
    Opcode { name: "unused-f8", units: 1 }, // 0xf8
    Opcode { name: "unused-f9", units: 1 }, // 0xf9
    Opcode { name: "invoke-polymorphic", units: 4 }, // 0xfa
    Opcode { name: "invoke-polymorphic/range", units: 4 }, // 0xfb
    Opcode { name: "invoke-custom", units: 3 }, // 0xfc
    Opcode { name: "invoke-custom/range", units: 3 }, // 0xfd
    Opcode { name: "const-method-handle", units: 2 }, // 0xfe
    Opcode { name: "const-method-type", units: 2 }, // 0xff
];
