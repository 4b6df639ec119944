// 该文件是 Shanan （山南西风） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
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

use ab_glyph::{FontArc, InvalidFont, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::{detector::Detection, label::class_name};

const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET: i32 = 20;
const PALETTE_SIZE: usize = 80;

/// 可视化工具
pub struct Visualizer {
  /// 字体
  font: FontArc,
  /// 字体大小
  font_scale: PxScale,
  /// 边界框颜色映射
  colors: Vec<Rgb<u8>>,
}

impl Visualizer {
  pub fn new() -> Result<Self, InvalidFont> {
    let font = FontArc::try_from_slice(FONT_DATA)?;

    // 每个 COCO 类别一种颜色
    let colors = (0..PALETTE_SIZE)
      .map(|i| {
        let hue = (i as f32 / PALETTE_SIZE as f32) * 360.0;
        Self::hsv_to_rgb(hue, 0.8, 0.9)
      })
      .collect();

    Ok(Self {
      font,
      font_scale: PxScale::from(LABEL_FONT_SIZE),
      colors,
    })
  }

  fn hsv_to_rgb(h: f32, s: f32, v: f32) -> Rgb<u8> {
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;

    let (r, g, b) = if h < 60.0 {
      (c, x, 0.0)
    } else if h < 120.0 {
      (x, c, 0.0)
    } else if h < 180.0 {
      (0.0, c, x)
    } else if h < 240.0 {
      (0.0, x, c)
    } else if h < 300.0 {
      (x, 0.0, c)
    } else {
      (c, 0.0, x)
    };

    Rgb([
      ((r + m) * 255.0) as u8,
      ((g + m) * 255.0) as u8,
      ((b + m) * 255.0) as u8,
    ])
  }

  pub fn color_of(&self, class_id: u32) -> Rgb<u8> {
    self.colors[class_id as usize % self.colors.len()]
  }

  /// 在图像上绘制单个检测框及 `类别: 置信度` 标签
  pub fn draw_detection(&self, image: &mut RgbImage, detection: &Detection) {
    let color = self.color_of(detection.class_id);
    let [x1, y1, x2, y2] = detection.bbox;

    let x = x1.max(0.0);
    let y = y1.max(0.0);
    let width = (x2.min(image.width() as f64) - x).max(0.0) as u32;
    let height = (y2.min(image.height() as f64) - y).max(0.0) as u32;
    let (x, y) = (x as i32, y as i32);

    if width > 0 && height > 0 {
      draw_hollow_rect_mut(image, Rect::at(x, y).of_size(width, height), color);

      // 内侧再画一圈，加粗边框
      if width > 2 && height > 2 {
        let inner_rect = Rect::at(x + 1, y + 1).of_size(width - 2, height - 2);
        draw_hollow_rect_mut(image, inner_rect, color);
      }
    }

    let label = format!("{}: {:.2}", class_name(detection.class_id), detection.score);
    let text_y = (y - LABEL_OFFSET).max(0);
    draw_text_mut(image, color, x, text_y, self.font_scale, &self.font, &label);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn draws_box_outline_only() {
    let visualizer = Visualizer::new().unwrap();
    let mut image = RgbImage::new(100, 100);
    let detection = Detection::new(0, 0.9, [10.0, 20.0, 50.0, 80.0]);

    visualizer.draw_detection(&mut image, &detection);

    let color = visualizer.color_of(0);
    assert_eq!(*image.get_pixel(10, 20), color);
    assert_eq!(*image.get_pixel(49, 79), color);
    assert_eq!(*image.get_pixel(11, 21), color);
    assert_eq!(*image.get_pixel(30, 50), Rgb([0, 0, 0]));
  }

  #[test]
  fn classes_get_distinct_colors() {
    let visualizer = Visualizer::new().unwrap();
    assert_ne!(visualizer.color_of(0), visualizer.color_of(40));
    assert_eq!(visualizer.color_of(3), visualizer.color_of(83));
  }

  #[test]
  fn degenerate_and_out_of_frame_boxes_do_not_panic() {
    let visualizer = Visualizer::new().unwrap();
    let mut image = RgbImage::new(32, 32);
    for bbox in [
      [5.0, 5.0, 5.0, 5.0],
      [20.0, 20.0, 10.0, 10.0],
      [-40.0, -40.0, -10.0, -10.0],
      [30.0, 30.0, 500.0, 500.0],
      [0.0, 0.0, 2.0, 2.0],
    ] {
      visualizer.draw_detection(&mut image, &Detection::new(1, 0.5, bbox));
    }
  }
}
