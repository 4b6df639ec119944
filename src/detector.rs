// 该文件是 Shanan （山南西风） 项目的一部分。
// src/detector.rs - 检测器接口
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

use serde::Deserialize;

use crate::input::ImageFrame;

/// 单个检测结果
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Detection {
  /// 类别索引（0 起始）
  pub class_id: u32,
  /// 置信度
  pub score: f64,
  /// 像素坐标 [x_min, y_min, x_max, y_max]
  pub bbox: [f64; 4],
}

impl Detection {
  pub fn new(class_id: u32, score: f64, bbox: [f64; 4]) -> Self {
    Self {
      class_id,
      score,
      bbox,
    }
  }

  pub fn width(&self) -> f64 {
    (self.bbox[2] - self.bbox[0]).max(0.0)
  }

  pub fn height(&self) -> f64 {
    (self.bbox[3] - self.bbox[1]).max(0.0)
  }

  pub fn area(&self) -> f64 {
    self.width() * self.height()
  }

  /// 两个检测框的 IoU
  pub fn iou(&self, other: &Detection) -> f64 {
    let x1 = self.bbox[0].max(other.bbox[0]);
    let y1 = self.bbox[1].max(other.bbox[1]);
    let x2 = self.bbox[2].min(other.bbox[2]);
    let y2 = self.bbox[3].min(other.bbox[3]);

    let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = self.area() + other.area() - intersection;

    if union > 0.0 {
      intersection / union
    } else {
      0.0
    }
  }
}

/// 检测器参数
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
  /// 类别数量
  pub classes_num: u32,
  /// DFL 回归层数，仅对解码原始网络输出的检测器有意义
  pub reg: u32,
  /// NMS IoU 阈值
  pub iou_thres: f64,
  /// 置信度阈值
  pub conf_thres: f64,
}

impl Default for DetectorConfig {
  fn default() -> Self {
    Self {
      classes_num: 80,
      reg: 16,
      iou_thres: 0.45,
      conf_thres: 0.25,
    }
  }
}

/// 检测能力：输入一帧图像，输出按序排列的检测结果
pub trait Detector {
  type Error: std::error::Error + Send + Sync + 'static;

  fn detect(&self, frame: &ImageFrame) -> Result<Vec<Detection>, Self::Error>;
}

impl<D: Detector + ?Sized> Detector for &D {
  type Error = D::Error;

  fn detect(&self, frame: &ImageFrame) -> Result<Vec<Detection>, Self::Error> {
    (**self).detect(frame)
  }
}

mod replay;
pub use self::replay::{ReplayDetector, ReplayDetectorBuilder, ReplayError};
