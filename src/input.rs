// 该文件是 Shanan （山南西风） 项目的一部分。
// src/input.rs - 图像目录输入
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{debug, info};

use crate::record::{InvalidImageId, parse_image_id};

#[derive(Error, Debug)]
pub enum InputError {
  #[error("无法读取图像目录 {path}: {source}")]
  ListDirectory {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("无法打开图像文件 {path}: {source}")]
  OpenImage {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("无法解码图像文件 {path}: {source}")]
  DecodeImage {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },
}

/// 解码后的一帧图像
#[derive(Debug, Clone)]
pub struct ImageFrame {
  pub image: RgbImage,
  /// 源文件名（含扩展名）
  pub file_name: String,
  /// 在目录列表中的序号（1 起始）
  pub index: usize,
}

/// 图像目录中的一个条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
  path: PathBuf,
  file_name: String,
  index: usize,
}

impl ImageEntry {
  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn file_name(&self) -> &str {
    &self.file_name
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn image_id(&self) -> Result<u64, InvalidImageId> {
    parse_image_id(&self.file_name)
  }

  pub fn decode(&self) -> Result<ImageFrame, InputError> {
    let image = ImageReader::open(&self.path)
      .map_err(|source| InputError::OpenImage {
        path: self.path.clone(),
        source,
      })?
      .decode()
      .map_err(|source| InputError::DecodeImage {
        path: self.path.clone(),
        source,
      })?
      .to_rgb8();
    debug!(
      "图像解码完成: {} ({}x{})",
      self.file_name,
      image.width(),
      image.height()
    );

    Ok(ImageFrame {
      image,
      file_name: self.file_name.clone(),
      index: self.index,
    })
  }
}

/// 图像目录输入
///
/// 打开时一次性列出目录中的全部条目，迭代顺序即文件系统的列表顺序，
/// 不做任何排序；需要确定顺序时显式调用 [`ImageDirInput::sorted`]。
#[derive(Debug, Clone)]
pub struct ImageDirInput {
  entries: Vec<ImageEntry>,
}

impl ImageDirInput {
  pub fn open(directory: impl AsRef<Path>) -> Result<Self, InputError> {
    let directory = directory.as_ref();
    let list_error = |source| InputError::ListDirectory {
      path: directory.to_path_buf(),
      source,
    };

    let mut entries = Vec::new();
    for entry in std::fs::read_dir(directory).map_err(list_error)? {
      let entry = entry.map_err(list_error)?;
      entries.push(ImageEntry {
        path: entry.path(),
        file_name: entry.file_name().to_string_lossy().into_owned(),
        index: entries.len() + 1,
      });
    }
    info!(
      "图像目录 {} 共 {} 个条目",
      directory.display(),
      entries.len()
    );

    Ok(Self { entries })
  }

  /// 按文件名排序，序号随之重排
  pub fn sorted(mut self) -> Self {
    self
      .entries
      .sort_by(|a, b| a.file_name.cmp(&b.file_name));
    for (i, entry) in self.entries.iter_mut().enumerate() {
      entry.index = i + 1;
    }
    self
  }

  pub fn entries(&self) -> &[ImageEntry] {
    &self.entries
  }
}

impl IntoIterator for ImageDirInput {
  type Item = ImageEntry;
  type IntoIter = std::vec::IntoIter<ImageEntry>;

  fn into_iter(self) -> Self::IntoIter {
    self.entries.into_iter()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn lists_every_entry_in_read_dir_order() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["3.jpg", "1.jpg", "2.jpg"] {
      RgbImage::new(2, 2).save(dir.path().join(name)).unwrap();
    }

    let expected: Vec<String> = std::fs::read_dir(dir.path())
      .unwrap()
      .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
      .collect();

    let input = ImageDirInput::open(dir.path()).unwrap();
    let names: Vec<&str> = input.entries().iter().map(|e| e.file_name()).collect();
    assert_eq!(names, expected);
    let indices: Vec<usize> = input.entries().iter().map(|e| e.index()).collect();
    assert_eq!(indices, vec![1, 2, 3]);
  }

  #[test]
  fn sorted_orders_by_file_name() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["3.jpg", "1.jpg", "2.jpg"] {
      RgbImage::new(2, 2).save(dir.path().join(name)).unwrap();
    }

    let input = ImageDirInput::open(dir.path()).unwrap().sorted();
    let names: Vec<&str> = input.entries().iter().map(|e| e.file_name()).collect();
    assert_eq!(names, vec!["1.jpg", "2.jpg", "3.jpg"]);
    assert_eq!(input.entries()[2].index(), 3);
  }

  #[test]
  fn decodes_image_into_rgb_frame() {
    let dir = tempfile::tempdir().unwrap();
    RgbImage::new(8, 6).save(dir.path().join("42.png")).unwrap();

    let input = ImageDirInput::open(dir.path()).unwrap();
    let entry = &input.entries()[0];
    assert_eq!(entry.image_id().unwrap(), 42);
    let frame = entry.decode().unwrap();
    assert_eq!(frame.image.dimensions(), (8, 6));
    assert_eq!(frame.file_name, "42.png");
  }

  #[test]
  fn corrupt_image_reports_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("7.jpg"), b"not a jpeg").unwrap();

    let input = ImageDirInput::open(dir.path()).unwrap();
    match input.entries()[0].decode() {
      Err(InputError::DecodeImage { path, .. }) => assert!(path.ends_with("7.jpg")),
      other => panic!("unexpected result: {:?}", other),
    }
  }

  #[test]
  fn missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ImageDirInput::open(dir.path().join("missing"));
    assert!(matches!(result, Err(InputError::ListDirectory { .. })));
  }
}
