use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::TransferError;
use crate::plan::ChunkPlan;

/// Cuts a file into numbered part files.
///
/// Implementations write parts `1..=N` into `out_dir`, named after their
/// part number, overwriting any same-named files left from a previous
/// file. Returns `N`.
pub trait FileSplitter: Send + Sync {
    fn split(&self, path: &Path, chunk_size: u64, out_dir: &Path) -> Result<u32, TransferError>;
}

/// Returns the location of part `part_number` inside `chunk_dir`.
pub fn part_path(chunk_dir: &Path, part_number: u32) -> PathBuf {
    chunk_dir.join(part_number.to_string())
}

/// Splits files on the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskSplitter;

impl FileSplitter for DiskSplitter {
    fn split(&self, path: &Path, chunk_size: u64, out_dir: &Path) -> Result<u32, TransferError> {
        let plan = ChunkPlan::for_file(path, chunk_size)?;
        std::fs::create_dir_all(out_dir)?;

        let mut reader = BufReader::new(File::open(path)?);
        for part in plan.parts() {
            let target = part_path(out_dir, part.part_number);
            let mut writer = BufWriter::new(File::create(&target)?);
            let copied = std::io::copy(&mut (&mut reader).take(part.length), &mut writer)?;
            if copied != part.length {
                return Err(TransferError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "file shrank while splitting: part {} got {copied} of {} bytes",
                        part.part_number, part.length
                    ),
                )));
            }
            writer.flush()?;
        }

        debug!(
            path = %path.display(),
            parts = plan.number_of_parts(),
            chunk_size,
            "file split"
        );
        Ok(plan.number_of_parts())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(data).unwrap();
        path
    }

    #[test]
    fn splits_into_numbered_parts() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "src.bin", b"AABBCCDDEE");
        let out = dir.path().join("chunks");

        let parts = DiskSplitter.split(&src, 4, &out).unwrap();
        assert_eq!(parts, 3);
        assert_eq!(std::fs::read(part_path(&out, 1)).unwrap(), b"AABB");
        assert_eq!(std::fs::read(part_path(&out, 2)).unwrap(), b"CCDD");
        assert_eq!(std::fs::read(part_path(&out, 3)).unwrap(), b"EE");
    }

    #[test]
    fn overwrites_parts_from_previous_file() {
        let dir = TempDir::new().unwrap();
        let first = create_test_file(dir.path(), "first.bin", b"0123456789");
        let second = create_test_file(dir.path(), "second.bin", b"xy");
        let out = dir.path().join("chunks");

        DiskSplitter.split(&first, 8, &out).unwrap();
        assert_eq!(std::fs::read(part_path(&out, 1)).unwrap(), b"01234567");

        let parts = DiskSplitter.split(&second, 8, &out).unwrap();
        assert_eq!(parts, 1);
        assert_eq!(std::fs::read(part_path(&out, 1)).unwrap(), b"xy");
    }

    #[test]
    fn single_chunk_when_file_smaller_than_chunk() {
        let dir = TempDir::new().unwrap();
        let src = create_test_file(dir.path(), "small.bin", b"hello");
        let out = dir.path().join("chunks");

        assert_eq!(DiskSplitter.split(&src, 1024, &out).unwrap(), 1);
        assert_eq!(std::fs::read(part_path(&out, 1)).unwrap(), b"hello");
        assert!(!part_path(&out, 2).exists());
    }

    #[test]
    fn missing_file_is_invalid() {
        let dir = TempDir::new().unwrap();
        let err = DiskSplitter
            .split(&dir.path().join("missing"), 4, dir.path())
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidFile(_)));
    }

    #[test]
    fn part_path_uses_number_as_name() {
        let p = part_path(Path::new("/tmp/chunks"), 12);
        assert_eq!(p, PathBuf::from("/tmp/chunks/12"));
    }
}
