// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output.rs - 输出定义
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
use tracing::{debug, info};

use crate::{detector::Detection, input::ImageFrame, label::class_name};

pub mod draw;
mod result_dir;

pub use self::draw::Visualizer;
pub use self::result_dir::{MAX_RESULT_DIRS, ResultDirError, ResultDirectory};

pub trait Render<Frame, Output: ?Sized> {
  type Error;
  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error>;
}

/// 未开启可视化时不做任何事
impl<Frame, Output: ?Sized, R: Render<Frame, Output>> Render<Frame, Output> for Option<R> {
  type Error = R::Error;

  fn render_result(&self, frame: &Frame, result: &Output) -> Result<(), Self::Error> {
    match self {
      Some(render) => render.render_result(frame, result),
      None => Ok(()),
    }
  }
}

#[derive(Error, Debug)]
pub enum OutputError {
  #[error("结果图像目录错误: {0}")]
  ResultDirError(#[from] ResultDirError),
  #[error("字体加载错误: {0}")]
  FontError(#[from] ab_glyph::InvalidFont),
  #[error("无法保存结果图像 {path}: {source}")]
  SaveImageError {
    path: PathBuf,
    #[source]
    source: image::ImageError,
  },
}

/// 结果图像的写出时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DumpMode {
  /// 画完一张图像的全部检测后写出一次；没有检测的图像不写出
  #[default]
  PerImage,
  /// 每画一个检测就把累积结果重新写到同一路径
  PerDetection,
}

/// 将检测结果画到原图上并保存到结果目录
pub struct ImageDump {
  directory: ResultDirectory,
  visualizer: Visualizer,
  mode: DumpMode,
}

impl ImageDump {
  pub fn new(directory: ResultDirectory, mode: DumpMode) -> Result<Self, OutputError> {
    Ok(Self {
      directory,
      visualizer: Visualizer::new()?,
      mode,
    })
  }

  /// 在 `<base>_<n>`（`n < max_slots`）中选择第一个空闲目录并创建
  pub fn create(base: &str, max_slots: u32, mode: DumpMode) -> Result<Self, OutputError> {
    let directory = ResultDirectory::create_next(base, max_slots)?;
    Self::new(directory, mode)
  }

  pub fn directory(&self) -> &Path {
    self.directory.path()
  }

  fn save(&self, image: &image::RgbImage, path: &Path) -> Result<(), OutputError> {
    image.save(path).map_err(|source| OutputError::SaveImageError {
      path: path.to_path_buf(),
      source,
    })?;
    info!("结果图像已保存: \"{}\"", path.display());
    Ok(())
  }
}

impl Render<ImageFrame, [Detection]> for ImageDump {
  type Error = OutputError;

  fn render_result(&self, frame: &ImageFrame, result: &[Detection]) -> Result<(), Self::Error> {
    if result.is_empty() {
      return Ok(());
    }

    let path = self.directory.result_path(&frame.file_name);
    let mut image = frame.image.clone();
    for detection in result {
      let [x1, y1, x2, y2] = detection.bbox;
      debug!(
        "({:.0}, {:.0}, {:.0}, {:.0}) -> {}: {:.2}",
        x1,
        y1,
        x2,
        y2,
        class_name(detection.class_id),
        detection.score
      );
      self.visualizer.draw_detection(&mut image, detection);
      if self.mode == DumpMode::PerDetection {
        self.save(&image, &path)?;
      }
    }

    if self.mode == DumpMode::PerImage {
      self.save(&image, &path)?;
    }
    Ok(())
  }
}
