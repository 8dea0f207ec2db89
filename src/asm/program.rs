//! Program file format.
//!
//! A program is plain text: whitespace-separated pairs of hexadecimal
//! tokens, `<address> <word>`. Newlines carry no meaning, and an optional
//! `0x` prefix is accepted on either token.
//!
//! ```text
//! 00000000 E3A00005
//! 00000004 EF000000
//! ```
//!
//! Reading stops at the first incomplete pair or the first token that is
//! not a 32-bit hex number; whatever follows is ignored.

use std::path::Path;
use thiserror::Error;

/// A loaded program: `(address, word)` pairs in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    words: Vec<(u32, u32)>,
}

impl Program {
    /// Create a program from `(address, word)` pairs.
    pub fn new(words: Vec<(u32, u32)>) -> Self {
        Self { words }
    }

    /// The pairs, in file order.
    pub fn words(&self) -> &[(u32, u32)] {
        &self.words
    }

    /// Address of the first pair; this is where execution starts.
    pub fn entry(&self) -> Option<u32> {
        self.words.first().map(|&(addr, _)| addr)
    }

    /// Get the number of words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn parse_hex(token: &[u8]) -> Option<u32> {
    let token = std::str::from_utf8(token).ok()?;
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u32::from_str_radix(digits, 16).ok()
}

/// Parse program text. Never fails: malformed input just ends the program.
pub fn parse_program(text: &str) -> Program {
    parse_program_bytes(text.as_bytes())
}

/// Parse raw file contents. A token that is not valid UTF-8 counts as
/// malformed and ends the program like any other.
pub fn parse_program_bytes(bytes: &[u8]) -> Program {
    let mut words = Vec::new();
    let mut tokens = bytes
        .split(u8::is_ascii_whitespace)
        .filter(|token| !token.is_empty());

    while let Some(addr) = tokens.next() {
        let Some(addr) = parse_hex(addr) else { break };
        let Some(word) = tokens.next().and_then(parse_hex) else { break };
        words.push((addr, word));
    }

    Program::new(words)
}

/// Read and parse a program file.
///
/// Only a file that cannot be read is an error. A file with no readable
/// pairs yields an empty program.
pub fn load_program<P: AsRef<Path>>(path: P) -> Result<Program, ProgramError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ProgramError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    Ok(parse_program_bytes(&bytes))
}

/// Errors that can occur while loading a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pairs() {
        let program = parse_program("00000000 E3A00005\n00000004 EF000000\n");
        assert_eq!(program.words(), &[(0, 0xE3A0_0005), (4, 0xEF00_0000)]);
        assert_eq!(program.entry(), Some(0));
    }

    #[test]
    fn test_entry_is_first_pair_not_lowest() {
        let program = parse_program("100 E3A00005 0 EF000000");
        assert_eq!(program.entry(), Some(0x100));
    }

    #[test]
    fn test_free_form_whitespace_and_prefix() {
        let program = parse_program("  0x10\tE3A00001   14\n\n\n0XEF000000 ");
        assert_eq!(program.words(), &[(0x10, 0xE3A0_0001), (0x14, 0xEF00_0000)]);
    }

    #[test]
    fn test_incomplete_pair_ends_input() {
        let program = parse_program("0 E3A00005 4");
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn test_malformed_token_ends_input() {
        let program = parse_program("0 E3A00005 4 nothex 8 EF000000");
        assert_eq!(program.words(), &[(0, 0xE3A0_0005)]);

        let program = parse_program("0 E3A00005 ; comment 8 EF000000");
        assert_eq!(program.len(), 1);
    }

    #[test]
    fn test_oversized_token_ends_input() {
        let program = parse_program("0 1FFFFFFFF");
        assert!(program.is_empty());
    }

    #[test]
    fn test_empty_text() {
        let program = parse_program("");
        assert!(program.is_empty());
        assert_eq!(program.entry(), None);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_program("/definitely/not/here.emu").unwrap_err();
        assert!(matches!(err, ProgramError::Io { .. }));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir().join(format!("arm-emu-load-{}.emu", std::process::id()));
        std::fs::write(&path, "00000000 E3A00005\n00000004 EF000000\n").unwrap();
        let program = load_program(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(program.len(), 2);
    }

    #[test]
    fn test_load_file_without_pairs() {
        let path = std::env::temp_dir().join(format!("arm-emu-empty-{}.emu", std::process::id()));
        std::fs::write(&path, "garbage").unwrap();
        let program = load_program(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(program.is_empty());
    }

    #[test]
    fn test_load_stops_at_non_utf8_token() {
        let path = std::env::temp_dir().join(format!("arm-emu-latin1-{}.emu", std::process::id()));
        std::fs::write(&path, b"00000000 E3A00005\n00000004 EF000000\n; caf\xE9").unwrap();
        let program = load_program(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(program.words(), &[(0, 0xE3A0_0005), (4, 0xEF00_0000)]);
    }

    #[test]
    fn test_non_utf8_inside_pair_ends_input() {
        let program = parse_program_bytes(b"0 E3A00005 4 EF\xFF0000 8 EF000000");
        assert_eq!(program.words(), &[(0, 0xE3A0_0005)]);
    }
}
