//! SPIR-V assembly adapter
//!
//! Thin boundary around the external `glslangValidator` assembler: write
//! the GLSL to a temporary file, run the subprocess, then read back and
//! validate the little-endian word stream.

use crate::ast::ShaderStage;
use crate::error::{CompilerError, Result};
use log::debug;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};

/// First word of every SPIR-V module.
pub const SPIRV_MAGIC: u32 = 0x0723_0203;

static TEMP_FILE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temp file scoped to a single assembly; removed on drop, so both files
/// disappear on every exit path.
struct TempFile {
    path: PathBuf,
}

impl TempFile {
    fn new(extension: &str) -> Self {
        let n = TEMP_FILE_COUNTER.fetch_add(1, Ordering::Relaxed);
        let name = format!("shader_{}_{}.{}", std::process::id(), n, extension);
        TempFile {
            path: std::env::temp_dir().join(name),
        }
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Assemble GLSL into SPIR-V words by invoking
/// `glslangValidator -V <input> -o <output>`. The input suffix (`.vert` or
/// `.frag`) tells the assembler which stage it is compiling.
pub fn assemble(glsl: &str, stage: ShaderStage) -> Result<Vec<u32>> {
    let input = TempFile::new(stage.file_extension());
    let output = TempFile::new("spv");

    fs::write(&input.path, glsl)?;

    debug!("invoking glslangValidator on {}", input.path.display());
    let result = Command::new("glslangValidator")
        .arg("-V")
        .arg(&input.path)
        .arg("-o")
        .arg(&output.path)
        .output()
        .map_err(|e| {
            CompilerError::CodeGenError(format!("Failed to execute glslangValidator: {}", e))
        })?;

    if !result.status.success() {
        let mut message = String::from("GLSL compilation failed\n");
        message.push_str("Output:\n");
        message.push_str(&String::from_utf8_lossy(&result.stdout));
        message.push_str(&String::from_utf8_lossy(&result.stderr));
        message.push_str("Generated GLSL:\n");
        message.push_str(glsl);
        return Err(CompilerError::CodeGenError(message));
    }

    if !output.path.exists() {
        return Err(CompilerError::CodeGenError(format!(
            "SPIR-V output file was not created: {}",
            output.path.display()
        )));
    }

    let bytes = fs::read(&output.path)?;
    words_from_bytes(&bytes)
}

/// Decode and validate a little-endian SPIR-V byte stream.
pub fn words_from_bytes(bytes: &[u8]) -> Result<Vec<u32>> {
    if bytes.len() % 4 != 0 {
        return Err(CompilerError::CodeGenError(
            "Invalid SPIR-V: size is not a multiple of 4 bytes".to_string(),
        ));
    }

    let words: Vec<u32> = bytes
        .chunks_exact(4)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect();

    if words.first() != Some(&SPIRV_MAGIC) {
        return Err(CompilerError::CodeGenError(
            "Invalid SPIR-V: incorrect magic number".to_string(),
        ));
    }

    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn le_bytes(words: &[u32]) -> Vec<u8> {
        words.iter().flat_map(|w| w.to_le_bytes()).collect()
    }

    #[test]
    fn test_words_round_trip() {
        let bytes = le_bytes(&[SPIRV_MAGIC, 0x0001_0000, 42, 0]);
        let words = words_from_bytes(&bytes).unwrap();
        assert_eq!(words, vec![SPIRV_MAGIC, 0x0001_0000, 42, 0]);
    }

    #[test]
    fn test_truncated_stream_rejected() {
        let mut bytes = le_bytes(&[SPIRV_MAGIC, 7]);
        bytes.pop();
        let err = words_from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CompilerError::CodeGenError(_)));
    }

    #[test]
    fn test_bad_magic_rejected() {
        let bytes = le_bytes(&[0xdead_beef, 7]);
        let err = words_from_bytes(&bytes).unwrap_err();
        match err {
            CompilerError::CodeGenError(message) => {
                assert!(message.contains("magic"), "{}", message);
            }
            other => panic!("expected CodeGenError, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_stream_rejected() {
        assert!(words_from_bytes(&[]).is_err());
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let a = TempFile::new("vert");
        let b = TempFile::new("vert");
        assert_ne!(a.path, b.path);
    }
}
