// 该文件是 Shanan （山南西风） 项目的一部分。
// src/detector/replay.rs - 回放检测器
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

//! 回放预先记录的原始检测结果。
//!
//! 记录文件为 JSON 对象，键为图像文件名，值为该图像的候选检测列表：
//!
//! ```json
//! { "000000001000.jpg": [ { "class_id": 0, "score": 0.9, "bbox": [10, 20, 50, 80] } ] }
//! ```
//!
//! 回放时按照 [`DetectorConfig`] 执行类别过滤、置信度过滤与按类别的 NMS。

use std::collections::HashMap;
use std::convert::Infallible;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  detector::{Detection, Detector, DetectorConfig},
  input::ImageFrame,
};

#[derive(Error, Debug)]
pub enum ReplayError {
  #[error("检测记录读取错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测记录解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("检测记录路径解码错误: {0}")]
  PathDecodeError(#[from] std::string::FromUtf8Error),
  #[error("URI 方案不匹配: 期望 '{expected}', 实际 '{found}'")]
  SchemeMismatch {
    expected: &'static str,
    found: String,
  },
}

pub struct ReplayDetectorBuilder {
  path: PathBuf,
  config: DetectorConfig,
}

impl FromUrlWithScheme for ReplayDetectorBuilder {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayDetectorBuilder {
  type Error = ReplayError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayError::SchemeMismatch {
        expected: Self::SCHEME,
        found: url.scheme().to_string(),
      });
    }

    // URL 路径经过百分号编码，空格与中文目录名需要先还原
    let path = urlencoding::decode(url.path())?;

    Ok(ReplayDetectorBuilder {
      path: PathBuf::from(path.as_ref()),
      config: DetectorConfig::default(),
    })
  }
}

impl ReplayDetectorBuilder {
  pub fn config(mut self, config: DetectorConfig) -> Self {
    self.config = config;
    self
  }

  pub fn build(self) -> Result<ReplayDetector, ReplayError> {
    info!("加载检测记录: {}", self.path.display());
    let data = std::fs::read(&self.path)?;
    let records: HashMap<String, Vec<Detection>> = serde_json::from_slice(&data)?;
    info!("检测记录加载完成，共 {} 张图像", records.len());
    debug!(
      "检测参数: 类别数 {}, reg {}, IoU 阈值 {}, 置信度阈值 {}",
      self.config.classes_num, self.config.reg, self.config.iou_thres, self.config.conf_thres
    );

    Ok(ReplayDetector::new(records, self.config))
  }
}

pub struct ReplayDetector {
  records: HashMap<String, Vec<Detection>>,
  config: DetectorConfig,
}

impl ReplayDetector {
  pub fn new(records: HashMap<String, Vec<Detection>>, config: DetectorConfig) -> Self {
    Self { records, config }
  }

  fn postprocess(&self, candidates: &[Detection]) -> Vec<Detection> {
    let detections = candidates
      .iter()
      .filter(|det| {
        if det.class_id >= self.config.classes_num {
          warn!(
            "类别索引 {} 超出类别数量 {}，已丢弃",
            det.class_id, self.config.classes_num
          );
          return false;
        }
        det.score >= self.config.conf_thres
      })
      .cloned()
      .collect();

    self.nms(detections)
  }

  /// 按类别的非极大值抑制，结果按置信度降序排列
  fn nms(&self, mut detections: Vec<Detection>) -> Vec<Detection> {
    detections.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut result = Vec::with_capacity(detections.len());
    while !detections.is_empty() {
      let best = detections.remove(0);

      detections.retain(|det| {
        if det.class_id != best.class_id {
          return true;
        }
        det.iou(&best) < self.config.iou_thres
      });
      result.push(best);
    }

    result
  }
}

impl Detector for ReplayDetector {
  type Error = Infallible;

  fn detect(&self, frame: &ImageFrame) -> Result<Vec<Detection>, Self::Error> {
    let detections = match self.records.get(&frame.file_name) {
      Some(candidates) => self.postprocess(candidates),
      None => {
        debug!("图像 {} 没有检测记录", frame.file_name);
        Vec::new()
      }
    };
    Ok(detections)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::RgbImage;

  fn frame(name: &str) -> ImageFrame {
    ImageFrame {
      image: RgbImage::new(4, 4),
      file_name: name.to_string(),
      index: 1,
    }
  }

  fn detector(candidates: Vec<Detection>) -> ReplayDetector {
    let mut records = HashMap::new();
    records.insert("1.jpg".to_string(), candidates);
    ReplayDetector::new(records, DetectorConfig::default())
  }

  #[test]
  fn missing_image_yields_no_detections() {
    let detector = detector(vec![Detection::new(0, 0.9, [0.0, 0.0, 1.0, 1.0])]);
    assert!(detector.detect(&frame("2.jpg")).unwrap().is_empty());
  }

  #[test]
  fn drops_low_scores_and_unknown_classes() {
    let detector = detector(vec![
      Detection::new(0, 0.1, [0.0, 0.0, 10.0, 10.0]),
      Detection::new(80, 0.9, [0.0, 0.0, 10.0, 10.0]),
      Detection::new(3, 0.25, [20.0, 20.0, 30.0, 30.0]),
    ]);
    let detections = detector.detect(&frame("1.jpg")).unwrap();
    assert_eq!(detections, vec![Detection::new(3, 0.25, [20.0, 20.0, 30.0, 30.0])]);
  }

  #[test]
  fn suppresses_overlapping_boxes_of_same_class() {
    let detector = detector(vec![
      Detection::new(0, 0.6, [1.0, 1.0, 11.0, 11.0]),
      Detection::new(0, 0.9, [0.0, 0.0, 10.0, 10.0]),
      Detection::new(1, 0.7, [0.0, 0.0, 10.0, 10.0]),
      Detection::new(0, 0.5, [50.0, 50.0, 60.0, 60.0]),
    ]);
    let detections = detector.detect(&frame("1.jpg")).unwrap();
    let scores: Vec<f64> = detections.iter().map(|det| det.score).collect();
    assert_eq!(scores, vec![0.9, 0.7, 0.5]);
    assert_eq!(detections[1].class_id, 1);
  }

  #[test]
  fn builds_from_replay_url() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dets.json");
    std::fs::write(
      &path,
      r#"{"000000001000.jpg": [{"class_id": 0, "score": 0.9, "bbox": [10, 20, 50, 80]}]}"#,
    )
    .unwrap();

    let url = Url::parse(&format!("replay://{}", path.display())).unwrap();
    let detector = ReplayDetectorBuilder::from_url(&url).unwrap().build().unwrap();

    let detections = detector.detect(&frame("000000001000.jpg")).unwrap();
    assert_eq!(detections, vec![Detection::new(0, 0.9, [10.0, 20.0, 50.0, 80.0])]);
  }

  #[test]
  fn decodes_escaped_characters_in_path() {
    let dir = tempfile::tempdir().unwrap();
    let nested = dir.path().join("my dets").join("验证集");
    std::fs::create_dir_all(&nested).unwrap();
    let path = nested.join("dets.json");
    std::fs::write(
      &path,
      r#"{"7.jpg": [{"class_id": 1, "score": 0.8, "bbox": [0, 0, 4, 4]}]}"#,
    )
    .unwrap();

    let url = Url::parse(&format!("replay://{}", path.display())).unwrap();
    assert!(url.path().contains("my%20dets"));
    let detector = ReplayDetectorBuilder::from_url(&url).unwrap().build().unwrap();

    let detections = detector.detect(&frame("7.jpg")).unwrap();
    assert_eq!(detections, vec![Detection::new(1, 0.8, [0.0, 0.0, 4.0, 4.0])]);
  }

  #[test]
  fn rejects_other_schemes() {
    let url = Url::parse("yolo26:///model.rknn").unwrap();
    assert!(matches!(
      ReplayDetectorBuilder::from_url(&url),
      Err(ReplayError::SchemeMismatch { .. })
    ));
  }
}
