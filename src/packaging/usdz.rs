//! # USDZ 容器
//!
//! USDZ 是受限的 zip：条目不压缩（stored），数据起始偏移按 64 字节对齐，
//! 第一个条目是默认场景层。
//!
//! ## 依赖关系
//! - 被 `packaging/native.rs` 使用
//! - 使用 `zip` crate

use crate::error::{CrystalError, Result};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 条目数据对齐字节数
pub const USDZ_ALIGNMENT: u16 = 64;

fn zip_error(path: &Path, e: zip::result::ZipError) -> CrystalError {
    CrystalError::FileWriteError {
        path: path.display().to_string(),
        source: io::Error::new(io::ErrorKind::Other, e.to_string()),
    }
}

/// 按给定顺序写出 USDZ；调用方保证第一个条目是场景层
pub fn write_usdz(path: &Path, entries: &[(&str, &[u8])]) -> Result<()> {
    if entries.is_empty() {
        return Err(CrystalError::InvalidArgument(
            "a USDZ package needs at least one layer".to_string(),
        ));
    }

    let file = File::create(path).map_err(|e| CrystalError::FileWriteError {
        path: path.display().to_string(),
        source: e,
    })?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, data) in entries {
        zip.start_file_aligned(*name, options, USDZ_ALIGNMENT)
            .map_err(|e| zip_error(path, e))?;
        zip.write_all(data).map_err(|e| CrystalError::FileWriteError {
            path: path.display().to_string(),
            source: e,
        })?;
    }
    zip.finish().map_err(|e| zip_error(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use zip::ZipArchive;

    #[test]
    fn test_entries_are_stored_aligned_and_ordered() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.usdz");
        let layer: &[u8] = b"#usda 1.0\n";
        let extra = [7u8; 33];
        write_usdz(&path, &[("scene.usda", layer), ("textures/a.bin", &extra[..])]).unwrap();

        let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
        for i in 0..archive.len() {
            let entry = archive.by_index(i).unwrap();
            assert_eq!(entry.compression(), CompressionMethod::Stored);
            assert_eq!(entry.data_start() % USDZ_ALIGNMENT as u64, 0);
        }

        let mut first = archive.by_index(0).unwrap();
        assert_eq!(first.name(), "scene.usda");
        let mut text = String::new();
        first.read_to_string(&mut text).unwrap();
        assert_eq!(text, "#usda 1.0\n");
    }

    #[test]
    fn test_empty_package_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_usdz(&dir.path().join("x.usdz"), &[]).is_err());
    }
}
