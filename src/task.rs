// 该文件是 Shanan （山南西风） 项目的一部分。
// src/task.rs - 评估任务
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

use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  detector::{Detection, Detector},
  input::{ImageEntry, ImageFrame, InputError},
  label::class_name,
  output::{OutputError, Render},
  record::{InvalidImageId, PredictionSet},
};

pub trait Task<I, M, O>: Sized {
  type Output;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error>;
}

#[derive(Error, Debug)]
pub enum EvalError {
  #[error(transparent)]
  InvalidImageId(#[from] InvalidImageId),
  #[error("图像读取失败: {0}")]
  ImageDecodeFailure(#[from] InputError),
  #[error("检测失败 {path}: {source}")]
  DetectorFailure {
    path: PathBuf,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
  #[error("可视化失败: {0}")]
  Visualization(#[from] OutputError),
}

/// 单张图像处理失败后的策略，不做重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FailurePolicy {
  /// 立即终止整个评估
  #[default]
  Abort,
  /// 记录警告并跳过该图像
  Skip,
}

/// 处理数量预算，每尝试一张图像（无论成败）消耗一次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingBudget {
  remaining: usize,
}

impl ProcessingBudget {
  pub fn new(max_num: usize) -> Self {
    Self { remaining: max_num }
  }

  pub fn remaining(&self) -> usize {
    self.remaining
  }

  pub fn is_exhausted(&self) -> bool {
    self.remaining == 0
  }

  /// 预算未耗尽时消耗一次并返回 true
  pub fn try_consume(&mut self) -> bool {
    if self.remaining == 0 {
      return false;
    }
    self.remaining -= 1;
    true
  }
}

/// 评估统计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EvalStats {
  pub attempted: usize,
  pub skipped: usize,
  pub records: usize,
}

/// 评估结果：汇总的预测记录与统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalOutcome {
  pub predictions: PredictionSet,
  pub stats: EvalStats,
}

/// 逐张图像顺序推理，生成 COCO 预测记录
#[derive(Debug, Clone)]
pub struct EvalTask {
  max_num: usize,
  policy: FailurePolicy,
}

impl EvalTask {
  pub fn new(max_num: usize) -> Self {
    Self {
      max_num,
      policy: FailurePolicy::default(),
    }
  }

  pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
    self.policy = policy;
    self
  }

  fn process_image<M, O>(
    entry: &ImageEntry,
    model: &M,
    output: &O,
  ) -> Result<(u64, Vec<Detection>), EvalError>
  where
    M: Detector,
    O: Render<ImageFrame, [Detection], Error = OutputError>,
  {
    let image_id = entry.image_id()?;
    let frame = entry.decode()?;

    let now = std::time::Instant::now();
    let detections = model
      .detect(&frame)
      .map_err(|e| EvalError::DetectorFailure {
        path: entry.path().to_path_buf(),
        source: Box::new(e),
      })?;
    debug!(
      "推理完成，耗时: {:.2?}，检测到 {} 个对象",
      now.elapsed(),
      detections.len()
    );
    for det in &detections {
      let [x1, y1, x2, y2] = det.bbox;
      debug!(
        "  - {}: {:.2} at ({:.0}, {:.0}, {:.0}, {:.0})",
        class_name(det.class_id),
        det.score,
        x1,
        y1,
        x2,
        y2
      );
    }

    output.render_result(&frame, detections.as_slice())?;
    Ok((image_id, detections))
  }
}

impl<I, M, O> Task<I, M, O> for EvalTask
where
  I: IntoIterator<Item = ImageEntry>,
  I::IntoIter: ExactSizeIterator,
  M: Detector,
  O: Render<ImageFrame, [Detection], Error = OutputError>,
{
  type Output = EvalOutcome;
  type Error = EvalError;

  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Output, Self::Error> {
    let entries = input.into_iter();
    let total = entries.len();
    let mut budget = ProcessingBudget::new(self.max_num);
    let mut outcome = EvalOutcome::default();

    info!("开始评估，共 {} 张图像，最多处理 {} 张", total, self.max_num);
    for entry in entries {
      if !budget.try_consume() {
        info!("达到最大处理数量 {}，停止评估", self.max_num);
        break;
      }
      outcome.stats.attempted += 1;

      info!(
        "[{}/{}] 处理图像: \"{}\"",
        entry.index(),
        total,
        entry.file_name()
      );
      match Self::process_image(&entry, &model, &output) {
        Ok((image_id, detections)) => {
          outcome.stats.records += outcome.predictions.push_image(image_id, &detections);
        }
        Err(e) if self.policy == FailurePolicy::Skip => {
          warn!("跳过图像 \"{}\": {}", entry.file_name(), e);
          outcome.stats.skipped += 1;
        }
        Err(e) => return Err(e),
      }
    }

    info!(
      "评估完成: 处理 {} 张，跳过 {} 张，共 {} 条预测记录",
      outcome.stats.attempted, outcome.stats.skipped, outcome.stats.records
    );
    Ok(outcome)
  }
}
