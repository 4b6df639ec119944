// 该文件是 Shanan （山南西风） 项目的一部分。
// src/main.rs - 评估程序主入口
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

mod args;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use shanan_eval::{
  FromUrl,
  detector::ReplayDetectorBuilder,
  input::ImageDirInput,
  output::{ImageDump, MAX_RESULT_DIRS},
  report::ReportWriter,
  task::{EvalTask, Task},
};

fn main() -> Result<()> {
  let args = args::Args::parse();

  let subscriber = tracing_subscriber::fmt()
    .with_max_level(args.log_level)
    .with_target(false)
    .finish();

  tracing::subscriber::with_default(subscriber, || run(&args))
}

fn run(args: &args::Args) -> Result<()> {
  info!("检测器地址: {}", args.model_path);
  info!(
    "类别数量: {}, reg: {}, IoU 阈值: {}, 置信度阈值: {}",
    args.classes_num, args.reg, args.iou_thres, args.conf_thres
  );
  info!("图像目录: {}", args.image_path.display());
  info!("结果文件: {}", args.json_path.display());
  info!("最多处理数量: {}", args.max_num);

  let detector = ReplayDetectorBuilder::from_url(&args.model_path)?
    .config(args.detector_config())
    .build()
    .with_context(|| format!("无法加载检测器: {}", args.model_path))?;

  let mut input = ImageDirInput::open(&args.image_path)?;
  if args.sorted {
    info!("按文件名排序处理");
    input = input.sorted();
  }

  let output = if args.result_image_dump {
    Some(ImageDump::create(
      &args.result_image_path,
      MAX_RESULT_DIRS,
      args.dump_mode,
    )?)
  } else {
    None
  };

  let outcome = EvalTask::new(args.max_num)
    .with_policy(args.on_error)
    .run_task(input, &detector, output)?;

  ReportWriter::new(&args.json_path).write(outcome.predictions.records())?;

  Ok(())
}
