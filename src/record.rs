// 该文件是 Shanan （山南西风） 项目的一部分。
// src/record.rs - COCO 预测记录
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

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::detector::Detection;

/// pycocotools 预测结果中的一条记录，字段顺序即输出顺序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
  pub area: f64,
  /// [x, y, width, height]
  pub bbox: [f64; 4],
  /// 1 起始的类别编号
  pub category_id: u32,
  /// 图像内的检测序号（0 起始）
  pub id: u64,
  pub score: f64,
  pub image_id: u64,
}

impl PredictionRecord {
  pub fn from_detection(detection: &Detection, image_id: u64, id: u64) -> Self {
    let [x1, y1, _, _] = detection.bbox;
    let width = detection.width();
    let height = detection.height();

    Self {
      area: width * height,
      bbox: [x1, y1, width, height],
      category_id: detection.class_id + 1,
      id,
      score: detection.score,
      image_id,
    }
  }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无效的图像 ID，文件名不是纯数字: {0}")]
pub struct InvalidImageId(pub String);

/// 去掉扩展名后将文件名解析为图像 ID，例如 `000000001000.jpg` -> 1000
pub fn parse_image_id(file_name: &str) -> Result<u64, InvalidImageId> {
  Path::new(file_name)
    .file_stem()
    .and_then(|stem| stem.to_str())
    .and_then(|stem| stem.parse().ok())
    .ok_or_else(|| InvalidImageId(file_name.to_string()))
}

mod set;
pub use self::set::PredictionSet;
