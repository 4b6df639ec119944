// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/result_dir.rs - 结果图像目录
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

use thiserror::Error;
use tracing::info;

/// `<base>_<n>` 中 n 的取值上限（不含）
pub const MAX_RESULT_DIRS: u32 = 9999;

#[derive(Error, Debug)]
pub enum ResultDirError {
  #[error("没有可用的输出目录: {base}_0 至 {base}_{last} 均已存在")]
  NoAvailableDirectory { base: String, last: u32 },
  #[error("无法创建输出目录 {path}: {source}")]
  IoError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}

/// 每次评估使用一个新的编号目录，不覆盖之前的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultDirectory {
  path: PathBuf,
}

impl ResultDirectory {
  /// 依次尝试 `<base>_0`、`<base>_1` ...，创建第一个不存在的目录
  pub fn create_next(base: &str, max_slots: u32) -> Result<Self, ResultDirError> {
    for n in 0..max_slots {
      let path = PathBuf::from(format!("{}_{}", base, n));
      if path.exists() {
        continue;
      }

      std::fs::create_dir_all(&path).map_err(|source| ResultDirError::IoError {
        path: path.clone(),
        source,
      })?;
      info!("结果图像目录创建成功: \"{}\"", path.display());
      return Ok(Self { path });
    }

    Err(ResultDirError::NoAvailableDirectory {
      base: base.to_string(),
      last: max_slots.saturating_sub(1),
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// 结果图像路径：`<dir>/<文件名去扩展名>_result.jpg`
  pub fn result_path(&self, file_name: &str) -> PathBuf {
    let stem = Path::new(file_name)
      .file_stem()
      .map(|stem| stem.to_string_lossy())
      .unwrap_or_default();
    self.path.join(format!("{}_result.jpg", stem))
  }
}
