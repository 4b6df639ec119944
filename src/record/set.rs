// 该文件是 Shanan （山南西风） 项目的一部分。
// src/record/set.rs - 预测结果汇总
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

use crate::{detector::Detection, record::PredictionRecord};

/// 只追加的预测记录序列，顺序为图像处理顺序、图像内检测顺序
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionSet {
  records: Vec<PredictionRecord>,
}

impl PredictionSet {
  pub fn new() -> Self {
    Self::default()
  }

  /// 追加一张图像的全部检测，图像内序号从 0 开始；返回追加的记录数
  pub fn push_image(&mut self, image_id: u64, detections: &[Detection]) -> usize {
    self.records.extend(
      detections
        .iter()
        .zip(0u64..)
        .map(|(det, id)| PredictionRecord::from_detection(det, image_id, id)),
    );
    detections.len()
  }

  pub fn records(&self) -> &[PredictionRecord] {
    &self.records
  }

  pub fn len(&self) -> usize {
    self.records.len()
  }

  pub fn is_empty(&self) -> bool {
    self.records.is_empty()
  }
}
