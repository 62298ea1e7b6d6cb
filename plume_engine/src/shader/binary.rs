/// ShaderBinary - SPIR-V word container and instruction stream

use std::fmt;
use crate::error::Result;
use crate::shader::spirv::{HEADER_WORDS, MAGIC};

const SOURCE: &str = "plume::shader";

/// SPIR-V version declared in a module header
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpirvVersion {
    /// Major version (always 1 for supported modules)
    pub major: u8,
    /// Minor version
    pub minor: u8,
}

impl SpirvVersion {
    pub const V1_0: SpirvVersion = SpirvVersion::new(1, 0);
    pub const V1_1: SpirvVersion = SpirvVersion::new(1, 1);
    pub const V1_2: SpirvVersion = SpirvVersion::new(1, 2);
    pub const V1_3: SpirvVersion = SpirvVersion::new(1, 3);
    pub const V1_4: SpirvVersion = SpirvVersion::new(1, 4);
    pub const V1_5: SpirvVersion = SpirvVersion::new(1, 5);
    pub const V1_6: SpirvVersion = SpirvVersion::new(1, 6);

    /// Create a version from its components
    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Decode the header version word (`0x00MMmm00`)
    pub fn from_word(word: u32) -> Self {
        Self {
            major: ((word >> 16) & 0xff) as u8,
            minor: ((word >> 8) & 0xff) as u8,
        }
    }

    /// Encode as a header version word
    pub fn to_word(self) -> u32 {
        ((self.major as u32) << 16) | ((self.minor as u32) << 8)
    }
}

impl fmt::Display for SpirvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Decoded module header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    /// Declared SPIR-V version
    pub version: SpirvVersion,
    /// Generator magic (tool that produced the module)
    pub generator: u32,
    /// Every result id in the module is strictly below this bound
    pub bound: u32,
    /// Reserved instruction schema (always 0)
    pub schema: u32,
}

/// A compiled shader in SPIR-V form
///
/// Construction validates the header; the instruction stream itself is
/// checked by the reflector. The supplied words are kept exactly as given,
/// so the driver receives the same binary that was reflected. A module whose
/// magic number appears byte-swapped is additionally decoded through a
/// host-order copy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShaderBinary {
    /// Words as supplied by the caller
    words: Vec<u32>,
    /// Host-order copy, present only for opposite-endian input
    swapped: Option<Vec<u32>>,
}

impl ShaderBinary {
    /// Wrap SPIR-V words of either endianness
    pub fn from_words(words: Vec<u32>) -> Result<Self> {
        if words.len() < HEADER_WORDS {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "binary has {} words, the header alone needs {}", words.len(), HEADER_WORDS);
        }
        let swapped = (words[0] == MAGIC.swap_bytes())
            .then(|| words.iter().map(|word| word.swap_bytes()).collect::<Vec<u32>>());
        let binary = Self { words, swapped };
        binary.validate_header()?;
        Ok(binary)
    }

    fn validate_header(&self) -> Result<()> {
        let words = self.host_words();
        if words[0] != MAGIC {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "bad magic number {:#010x} (expected {:#010x})", words[0], MAGIC);
        }

        let version = SpirvVersion::from_word(words[1]);
        if words[1] & 0xff00_00ff != 0
            || version < SpirvVersion::V1_0
            || version > SpirvVersion::V1_6
        {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "unsupported SPIR-V version word {:#010x}", words[1]);
        }
        if words[3] == 0 {
            crate::plume_bail!(SOURCE, MalformedBinary, "id bound is zero");
        }
        if words[4] != 0 {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "reserved schema word is {:#x}, expected 0", words[4]);
        }
        Ok(())
    }

    /// Decode little-endian SPIR-V bytes (as stored in a `.spv` file)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() % 4 != 0 {
            crate::plume_bail!(SOURCE, MalformedBinary,
                "binary size {} is not a multiple of 4 bytes", bytes.len());
        }
        let words = bytes
            .chunks_exact(4)
            .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_words(words)
    }

    /// Words exactly as supplied, for native shader-module creation
    ///
    /// Opposite-endian input is returned unchanged; only reflection reads the
    /// host-order copy.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    /// Whether the module was supplied in the opposite byte order
    pub fn is_byte_swapped(&self) -> bool {
        self.swapped.is_some()
    }

    /// Words in host order, as the instruction decoder reads them
    fn host_words(&self) -> &[u32] {
        self.swapped.as_deref().unwrap_or(&self.words)
    }

    /// Take back ownership of the words
    pub fn into_words(self) -> Vec<u32> {
        self.words
    }

    /// Size of the binary in bytes
    pub fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }

    /// Decoded header
    pub fn header(&self) -> Header {
        let words = self.host_words();
        Header {
            version: SpirvVersion::from_word(words[1]),
            generator: words[2],
            bound: words[3],
            schema: words[4],
        }
    }

    /// Iterate over the instructions following the header
    pub(crate) fn instructions(&self) -> Instructions<'_> {
        Instructions {
            words: self.host_words(),
            position: HEADER_WORDS,
        }
    }
}

/// One decoded instruction
#[derive(Debug, Clone, Copy)]
pub(crate) struct Instruction<'a> {
    pub opcode: u32,
    /// Word offset of the instruction within the binary (for diagnostics)
    pub offset: usize,
    pub operands: &'a [u32],
}

impl<'a> Instruction<'a> {
    /// Operand `index`, or MalformedBinary if the instruction is too short
    pub fn word(&self, index: usize) -> Result<u32> {
        match self.operands.get(index) {
            Some(&word) => Ok(word),
            None => Err(crate::plume_err!(SOURCE, MalformedBinary,
                "instruction with opcode {} at word {} is missing operand {}",
                self.opcode, self.offset, index)),
        }
    }

    /// Operands from `index` to the end (empty if past the end)
    pub fn rest(&self, index: usize) -> &'a [u32] {
        self.operands.get(index..).unwrap_or(&[])
    }

    /// Decode the literal string starting at operand `index`
    ///
    /// Returns the string and the index of the first operand after it.
    pub fn string(&self, index: usize) -> Result<(String, usize)> {
        let mut bytes = Vec::new();
        for (i, word) in self.rest(index).iter().enumerate() {
            for byte in word.to_le_bytes() {
                if byte == 0 {
                    let text = String::from_utf8(bytes).map_err(|_| crate::plume_err!(SOURCE,
                        MalformedBinary, "string literal at word {} is not valid UTF-8",
                        self.offset))?;
                    return Ok((text, index + i + 1));
                }
                bytes.push(byte);
            }
        }
        Err(crate::plume_err!(SOURCE, MalformedBinary,
            "unterminated string literal in instruction at word {}", self.offset))
    }
}

/// Iterator over a module's instruction stream
///
/// Yields an error and stops at the first truncated instruction.
pub(crate) struct Instructions<'a> {
    words: &'a [u32],
    position: usize,
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Result<Instruction<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.position >= self.words.len() {
            return None;
        }
        let offset = self.position;
        let first = self.words[offset];
        let word_count = (first >> 16) as usize;
        let opcode = first & 0xffff;

        if word_count == 0 || offset + word_count > self.words.len() {
            self.position = self.words.len();
            return Some(Err(crate::plume_err!(SOURCE, MalformedBinary,
                "truncated instruction stream: opcode {} at word {} declares {} words, {} remain",
                opcode, offset, word_count, self.words.len() - offset)));
        }

        self.position += word_count;
        Some(Ok(Instruction {
            opcode,
            offset,
            operands: &self.words[offset + 1..offset + word_count],
        }))
    }
}

#[cfg(test)]
#[path = "binary_tests.rs"]
mod tests;
