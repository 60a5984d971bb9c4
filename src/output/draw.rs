// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/output/draw.rs - 目标检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use ab_glyph::FontArc;
use thiserror::Error;
use tracing::info;

use crate::{
  model::{DetectItem, DetectResult},
  surface::{Color, Point, RenderSurface, Stroke},
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_OFFSET_ABOVE: f64 = 5.0;
const LABEL_OFFSET_BELOW: f64 = 15.0;
const LABEL_MIN_TOP: f64 = 10.0; // 框顶离画面顶部太近时标签改画在框内
const BOX_WIDTH: f64 = 3.0;
const BOX_COLOR: Color = Color::LIME;

#[derive(Error, Debug)]
pub enum FontError {
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("无法解析字体文件: {0}")]
  InvalidFont(#[from] ab_glyph::InvalidFont),
}

/// 从 TTF/OTF 文件加载字体
pub fn load_font(path: impl AsRef<Path>) -> Result<FontArc, FontError> {
  let path = path.as_ref();
  info!("加载字体文件: {}", path.display());
  let data = std::fs::read(path)?;
  Ok(FontArc::try_from_vec(data)?)
}

/// 在叠加层上绘制被追踪类别的检测框与标签
pub struct DetectionOverlay {
  tracked_class: String,
  font_size: f32,
  color: Color,
  box_width: f64,
}

impl DetectionOverlay {
  pub fn new(tracked_class: impl Into<String>) -> Self {
    Self {
      tracked_class: tracked_class.into(),
      font_size: LABEL_FONT_SIZE,
      color: BOX_COLOR,
      box_width: BOX_WIDTH,
    }
  }

  pub fn tracked_class(&self) -> &str {
    &self.tracked_class
  }

  fn label_position(item: &DetectItem) -> Point {
    let x = item.bbox.x as f64;
    let y = item.bbox.y as f64;
    if y > LABEL_MIN_TOP {
      Point::new(x, y - LABEL_OFFSET_ABOVE)
    } else {
      Point::new(x, y + LABEL_OFFSET_BELOW)
    }
  }

  /// 绘制检测结果，返回绘制的检测框数量
  pub fn draw<S: RenderSurface + ?Sized>(&self, surface: &mut S, result: &DetectResult) -> usize {
    let stroke = Stroke::solid(self.box_width, self.color);
    surface.set_glow(None);
    let mut drawn = 0;
    for item in result.with_label(&self.tracked_class) {
      let bbox = &item.bbox;
      surface.stroke_rect(
        bbox.x as f64,
        bbox.y as f64,
        bbox.width as f64,
        bbox.height as f64,
        &stroke,
      );
      surface.fill_text(
        &item.label,
        Self::label_position(item),
        self.font_size,
        self.color,
      );
      drawn += 1;
    }
    drawn
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    model::BoundingBox,
    surface::{DrawCommand, RecordingSurface},
  };

  #[test]
  fn draws_only_tracked_class() {
    let result = DetectResult::from(vec![
      DetectItem::new("bird", 0.9, BoundingBox::new(100.0, 40.0, 50.0, 30.0)),
      DetectItem::new("kite", 0.9, BoundingBox::new(10.0, 10.0, 5.0, 5.0)),
    ]);
    let mut surface = RecordingSurface::new(640, 480);
    assert_eq!(DetectionOverlay::new("bird").draw(&mut surface, &result), 1);

    let rects = surface
      .commands()
      .iter()
      .filter(|c| matches!(c, DrawCommand::Rect { .. }))
      .count();
    assert_eq!(rects, 1);
    assert!(surface.commands().contains(&DrawCommand::Text {
      text: "bird".to_string(),
      at: Point::new(100.0, 35.0),
      size: 16.0,
      color: Color::LIME,
    }));
  }

  #[test]
  fn label_moves_inside_near_top_edge() {
    let item = DetectItem::new("bird", 0.9, BoundingBox::new(3.0, 8.0, 5.0, 5.0));
    assert_eq!(DetectionOverlay::label_position(&item), Point::new(3.0, 23.0));
  }

  #[test]
  fn missing_font_file_is_an_error() {
    assert!(matches!(
      load_font("/definitely/not/here.ttf"),
      Err(FontError::IoError(_))
    ));
  }
}
