// 该文件是 Shanan （山南西风） 项目的一部分。
// src/args.rs - 项目参数配置
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

use clap::Parser;
use url::Url;

use shanan_eval::{detector::DetectorConfig, output::DumpMode, task::FailurePolicy};

/// 在 COCO2017 验证集上推理并生成 pycocotools 预测结果文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测器地址，例如 replay:///data/yolov8n_val2017.json
  #[arg(long, value_name = "MODEL")]
  pub model_path: Url,

  /// 类别数量
  #[arg(long, default_value_t = 80, value_name = "NUM")]
  pub classes_num: u32,

  /// DFL 回归层数
  #[arg(long, default_value_t = 16, value_name = "NUM")]
  pub reg: u32,

  /// NMS IoU 阈值
  #[arg(long, default_value_t = 0.45, value_name = "THRESHOLD")]
  pub iou_thres: f64,

  /// 置信度阈值
  #[arg(long, default_value_t = 0.25, value_name = "THRESHOLD")]
  pub conf_thres: f64,

  /// COCO2017 验证集图像目录
  #[arg(
    long,
    default_value = "../../../resource/DataSets/COCO2017_Val/val2017",
    value_name = "DIR"
  )]
  pub image_path: PathBuf,

  /// 是否保存渲染后的结果图像
  #[arg(long)]
  pub result_image_dump: bool,

  /// 结果图像目录前缀，实际目录为 `<前缀>_<n>`
  #[arg(long, default_value = "coco2017_image_result", value_name = "DIR")]
  pub result_image_path: String,

  /// 结果图像写出模式
  #[arg(long, value_enum, default_value = "per-image", value_name = "MODE")]
  pub dump_mode: DumpMode,

  /// 预测结果 JSON 保存路径
  #[arg(long, default_value = "coco2017_val_predict.json", value_name = "FILE")]
  pub json_path: PathBuf,

  /// 最多处理的图像数量
  #[arg(long, default_value_t = 50000, value_name = "COUNT")]
  pub max_num: usize,

  /// 单张图像失败时的处理方式
  #[arg(long, value_enum, default_value = "abort", value_name = "POLICY")]
  pub on_error: FailurePolicy,

  /// 按文件名排序后再处理，默认保持目录列表顺序
  #[arg(long)]
  pub sorted: bool,

  /// 日志级别: trace / debug / info / warn / error
  #[arg(long, default_value = "info", value_name = "LEVEL")]
  pub log_level: tracing::Level,
}

impl Args {
  pub fn detector_config(&self) -> DetectorConfig {
    DetectorConfig {
      classes_num: self.classes_num,
      reg: self.reg,
      iou_thres: self.iou_thres,
      conf_thres: self.conf_thres,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use clap::CommandFactory;

  #[test]
  fn command_is_well_formed() {
    Args::command().debug_assert();
  }

  #[test]
  fn defaults_follow_eval_script() {
    let args = Args::try_parse_from(["shanan-eval", "--model-path", "replay:///dets.json"]).unwrap();
    assert_eq!(args.detector_config(), DetectorConfig::default());
    assert_eq!(args.max_num, 50000);
    assert!(!args.result_image_dump);
    assert_eq!(args.dump_mode, DumpMode::PerImage);
    assert_eq!(args.on_error, FailurePolicy::Abort);
    assert_eq!(args.log_level, tracing::Level::INFO);
  }

  #[test]
  fn parses_explicit_options() {
    let args = Args::try_parse_from([
      "shanan-eval",
      "--model-path",
      "replay:///dets.json",
      "--max-num",
      "3",
      "--result-image-dump",
      "--dump-mode",
      "per-detection",
      "--on-error",
      "skip",
      "--sorted",
    ])
    .unwrap();
    assert_eq!(args.max_num, 3);
    assert!(args.result_image_dump);
    assert_eq!(args.dump_mode, DumpMode::PerDetection);
    assert_eq!(args.on_error, FailurePolicy::Skip);
    assert!(args.sorted);
  }

  #[test]
  fn rejects_unknown_choices_and_lists_them_in_help() {
    let result = Args::try_parse_from([
      "shanan-eval",
      "--model-path",
      "replay:///dets.json",
      "--dump-mode",
      "always",
    ]);
    assert!(result.is_err());

    let help = Args::command().render_help().to_string();
    assert!(help.contains("per-image"));
    assert!(help.contains("per-detection"));
    assert!(help.contains("abort"));
    assert!(help.contains("skip"));
  }
}
