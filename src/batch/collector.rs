//! # 文件收集器
//!
//! 根据输入路径和模式收集待转换的结构文件。
//!
//! ## 功能
//! - 支持单文件和目录输入
//! - glob 模式匹配（逗号分隔多个模式，如 `*.cif,POSCAR*`）
//! - 递归目录搜索
//!
//! ## 依赖关系
//! - 被 `commands/convert.rs` 调用
//! - 使用 `walkdir` 遍历目录、`glob` 匹配文件名

use crate::error::{CrystalError, Result};
use glob::Pattern;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认匹配的结构文件
pub const DEFAULT_PATTERN: &str = "*.cif";

/// 文件收集器
#[derive(Debug, Clone)]
pub struct FileCollector {
    /// 输入路径
    input: PathBuf,
    /// 匹配模式列表
    patterns: Vec<Pattern>,
    /// 是否递归
    recursive: bool,
}

impl FileCollector {
    /// 创建新的文件收集器（默认模式 `*.cif`）
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            patterns: Pattern::new(DEFAULT_PATTERN).into_iter().collect(),
            recursive: false,
        }
    }

    /// 设置匹配模式（逗号分隔的多模式）
    pub fn with_pattern(mut self, pattern: &str) -> Result<Self> {
        let patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                Pattern::new(s).map_err(|e| {
                    CrystalError::InvalidArgument(format!("Invalid pattern '{}': {}", s, e))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        Ok(self)
    }

    /// 设置是否递归搜索
    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// 检查输入是否为单文件
    pub fn is_single_file(&self) -> bool {
        self.input.is_file()
    }

    /// 收集所有匹配的文件（按路径排序）
    ///
    /// 单文件输入不做模式匹配，直接返回。
    pub fn collect(&self) -> Result<Vec<PathBuf>> {
        if self.input.is_file() {
            return Ok(vec![self.input.clone()]);
        }
        if !self.input.is_dir() {
            return Err(CrystalError::DirectoryNotFound {
                path: self.input.display().to_string(),
            });
        }

        let max_depth = if self.recursive { usize::MAX } else { 1 };

        let mut files: Vec<PathBuf> = WalkDir::new(&self.input)
            .max_depth(max_depth)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|entry| self.matches_patterns(entry.path()))
            .map(|e| e.path().to_path_buf())
            .collect();

        files.sort();
        Ok(files)
    }

    /// 检查文件是否匹配任一模式
    fn matches_patterns(&self, path: &Path) -> bool {
        match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => self.patterns.iter().any(|p| p.matches(name)),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.cif"), "data_b").unwrap();
        fs::write(dir.path().join("a.cif"), "data_a").unwrap();
        fs::write(dir.path().join("POSCAR_1"), "x").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("c.cif"), "data_c").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_pattern_sorted() {
        let dir = tree();
        let files = FileCollector::new(dir.path()).collect().unwrap();
        assert_eq!(names(&files), vec!["a.cif", "b.cif"]);
    }

    #[test]
    fn test_multiple_patterns_and_recursion() {
        let dir = tree();
        let files = FileCollector::new(dir.path())
            .with_pattern("*.cif, POSCAR*")
            .unwrap()
            .recursive(true)
            .collect()
            .unwrap();
        assert_eq!(files.len(), 4);
        assert!(names(&files).contains(&"c.cif".to_string()));
        assert!(names(&files).contains(&"POSCAR_1".to_string()));
    }

    #[test]
    fn test_single_file_and_errors() {
        let dir = tree();
        let single = FileCollector::new(dir.path().join("notes.txt"));
        assert!(single.is_single_file());
        assert_eq!(single.collect().unwrap().len(), 1);

        assert!(FileCollector::new(dir.path()).with_pattern("[").is_err());
        let missing = FileCollector::new(dir.path().join("missing")).collect();
        assert!(matches!(missing, Err(CrystalError::DirectoryNotFound { .. })));
    }
}
