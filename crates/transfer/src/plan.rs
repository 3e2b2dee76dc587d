use std::path::Path;

use crate::TransferError;

/// One byte range of a planned file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPart {
    /// 1-based part number.
    pub part_number: u32,
    /// Byte offset within the file.
    pub offset: u64,
    /// Length of this part in bytes.
    pub length: u64,
}

/// Returns `ceil(file_size / chunk_size)`, or 0 when `chunk_size` is 0.
pub fn number_of_parts(file_size: u64, chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        return 0;
    }
    file_size.div_ceil(chunk_size)
}

/// Ordered part layout for a file of known size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    parts: Vec<ChunkPart>,
}

impl ChunkPlan {
    /// Plans the parts of a `file_size`-byte file.
    ///
    /// Fails with [`TransferError::InvalidFile`] for an empty file and with
    /// [`TransferError::InvalidChunkSize`] for a zero chunk size.
    pub fn new(file_size: u64, chunk_size: u64) -> Result<Self, TransferError> {
        if chunk_size == 0 {
            return Err(TransferError::InvalidChunkSize(chunk_size));
        }
        if file_size == 0 {
            return Err(TransferError::InvalidFile("file is empty".into()));
        }

        let count = u32::try_from(number_of_parts(file_size, chunk_size))
            .map_err(|_| TransferError::InvalidChunkSize(chunk_size))?;

        let parts = (1..=count)
            .map(|part_number| {
                let offset = u64::from(part_number - 1) * chunk_size;
                ChunkPart {
                    part_number,
                    offset,
                    length: chunk_size.min(file_size - offset),
                }
            })
            .collect();

        Ok(Self { parts })
    }

    /// Plans the parts of the file at `path`.
    pub fn for_file(path: &Path, chunk_size: u64) -> Result<Self, TransferError> {
        let meta = std::fs::metadata(path).map_err(|e| {
            TransferError::InvalidFile(format!("{}: {e}", path.display()))
        })?;
        if !meta.is_file() {
            return Err(TransferError::InvalidFile(format!(
                "{}: not a regular file",
                path.display()
            )));
        }
        if meta.len() == 0 {
            return Err(TransferError::InvalidFile(format!(
                "{}: file is empty",
                path.display()
            )));
        }
        Self::new(meta.len(), chunk_size)
    }

    pub fn number_of_parts(&self) -> u32 {
        self.parts.len() as u32
    }

    pub fn parts(&self) -> &[ChunkPart] {
        &self.parts
    }

}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_multiple() {
        let plan = ChunkPlan::new(12, 4).unwrap();
        assert_eq!(plan.number_of_parts(), 3);
        assert!(plan.parts().iter().all(|p| p.length == 4));
        assert_eq!(plan.parts()[2].offset, 8);
    }

    #[test]
    fn last_part_is_remainder() {
        let plan = ChunkPlan::new(10, 4).unwrap();
        let lengths: Vec<u64> = plan.parts().iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![4, 4, 2]);
        assert_eq!(plan.parts()[2].offset, 8);
    }

    #[test]
    fn smaller_than_one_chunk() {
        let plan = ChunkPlan::new(1_000_000, 6_291_456).unwrap();
        assert_eq!(plan.number_of_parts(), 1);
        assert_eq!(plan.parts()[0].length, 1_000_000);
    }

    #[test]
    fn two_parts_for_nine_megabytes() {
        let plan = ChunkPlan::new(9_000_000, 6_291_456).unwrap();
        assert_eq!(plan.number_of_parts(), 2);
        assert_eq!(plan.parts()[1].length, 9_000_000 - 6_291_456);
    }

    #[test]
    fn part_lengths_sum_to_file_size() {
        for size in [1u64, 2, 7, 63, 64, 65, 1000, 4097] {
            for chunk in [1u64, 3, 64, 4096] {
                let plan = ChunkPlan::new(size, chunk).unwrap();
                let total: u64 = plan.parts().iter().map(|p| p.length).sum();
                assert_eq!(total, size, "size={size} chunk={chunk}");
                assert_eq!(
                    u64::from(plan.number_of_parts()),
                    size.div_ceil(chunk),
                    "size={size} chunk={chunk}"
                );
                let (last, rest) = plan.parts().split_last().unwrap();
                assert!(rest.iter().all(|p| p.length == chunk));
                assert!(last.length > 0 && last.length <= chunk);
            }
        }
    }

    #[test]
    fn part_numbers_are_one_based_and_ascending() {
        let plan = ChunkPlan::new(10, 3).unwrap();
        let numbers: Vec<u32> = plan.parts().iter().map(|p| p.part_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4]);
    }

    #[test]
    fn zero_size_is_invalid_file() {
        assert!(matches!(
            ChunkPlan::new(0, 4),
            Err(TransferError::InvalidFile(_))
        ));
    }

    #[test]
    fn zero_chunk_size_rejected() {
        assert!(matches!(
            ChunkPlan::new(10, 0),
            Err(TransferError::InvalidChunkSize(0))
        ));
        assert_eq!(number_of_parts(10, 0), 0);
    }

    #[test]
    fn for_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = ChunkPlan::for_file(&dir.path().join("nope.bin"), 4).unwrap_err();
        assert!(matches!(err, TransferError::InvalidFile(_)));
    }

    #[test]
    fn for_file_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.bin");
        std::fs::write(&path, b"").unwrap();
        let err = ChunkPlan::for_file(&path, 4).unwrap_err();
        assert!(matches!(err, TransferError::InvalidFile(_)));
    }

    #[test]
    fn for_file_reads_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();
        let plan = ChunkPlan::for_file(&path, 4).unwrap();
        assert_eq!(plan.number_of_parts(), 3);
        let total: u64 = plan.parts().iter().map(|p| p.length).sum();
        assert_eq!(total, 10);
    }
}
