// 该文件是 Shanan （山南西风） 项目的一部分。
// src/report.rs - 预测结果 JSON 输出
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

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use thiserror::Error;
use tracing::info;

use crate::record::PredictionRecord;

const REPORT_INDENT: &[u8] = b" ";

#[derive(Error, Debug)]
pub enum ReportError {
  #[error("无法写入结果文件 {path}: {source}")]
  IoError {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
  #[error("结果序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
  #[error("结果编码错误: {0}")]
  EncodingError(#[from] std::string::FromUtf8Error),
}

/// 将预测记录写为 pycocotools 可读取的 JSON 数组
pub struct ReportWriter {
  path: PathBuf,
}

impl ReportWriter {
  pub fn new(path: impl AsRef<Path>) -> Self {
    Self {
      path: path.as_ref().to_path_buf(),
    }
  }

  /// 以单空格缩进输出，非 ASCII 字符原样保留，末尾不带换行
  pub fn to_writer<W: Write>(writer: W, records: &[PredictionRecord]) -> Result<(), ReportError> {
    let formatter = PrettyFormatter::with_indent(REPORT_INDENT);
    let mut serializer = Serializer::with_formatter(writer, formatter);
    records.serialize(&mut serializer)?;
    Ok(())
  }

  pub fn to_string(records: &[PredictionRecord]) -> Result<String, ReportError> {
    let mut buffer = Vec::new();
    Self::to_writer(&mut buffer, records)?;
    Ok(String::from_utf8(buffer)?)
  }

  pub fn write(&self, records: &[PredictionRecord]) -> Result<(), ReportError> {
    let io_error = |source| ReportError::IoError {
      path: self.path.clone(),
      source,
    };

    let file = File::create(&self.path).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    Self::to_writer(&mut writer, records)?;
    writer.flush().map_err(io_error)?;

    info!(
      "预测结果已保存: \"{}\" ({} 条记录)",
      self.path.display(),
      records.len()
    );
    Ok(())
  }
}
