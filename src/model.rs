// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/model.rs - 检测模型
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use serde::{Deserialize, Serialize};

use crate::surface::Point;

/// 目标检测模型
///
/// 检测器对本库而言是黑盒：不重试，也不校验检测质量。
pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

/// 像素坐标下的包围框 `[x, y, width, height]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 4]", into = "[f32; 4]")]
pub struct BoundingBox {
  pub x: f32,
  pub y: f32,
  pub width: f32,
  pub height: f32,
}

impl BoundingBox {
  pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
    Self {
      x,
      y,
      width,
      height,
    }
  }

  /// 几何中心
  pub fn center(&self) -> Point {
    Point::new(
      self.x as f64 + self.width as f64 / 2.0,
      self.y as f64 + self.height as f64 / 2.0,
    )
  }
}

impl From<[f32; 4]> for BoundingBox {
  fn from([x, y, width, height]: [f32; 4]) -> Self {
    Self::new(x, y, width, height)
  }
}

impl From<BoundingBox> for [f32; 4] {
  fn from(bbox: BoundingBox) -> Self {
    [bbox.x, bbox.y, bbox.width, bbox.height]
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectItem {
  pub label: String,
  #[serde(default = "DetectItem::default_score")]
  pub score: f32,
  pub bbox: BoundingBox,
}

impl DetectItem {
  pub fn new(label: impl Into<String>, score: f32, bbox: BoundingBox) -> Self {
    Self {
      label: label.into(),
      score,
      bbox,
    }
  }

  fn default_score() -> f32 {
    1.0
  }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectResult {
  pub items: Box<[DetectItem]>,
}

impl DetectResult {
  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  /// 标签与 `label` 相同的检测项
  pub fn with_label<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a DetectItem> + 'a {
    self.items.iter().filter(move |item| item.label == label)
  }
}

impl From<Vec<DetectItem>> for DetectResult {
  fn from(items: Vec<DetectItem>) -> Self {
    Self {
      items: items.into_boxed_slice(),
    }
  }
}

mod replay;
pub use self::replay::{ReplayDetector, ReplayDetectorError};

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn center_is_box_midpoint() {
    let bbox = BoundingBox::new(100.0, 40.0, 50.0, 30.0);
    assert_eq!(bbox.center(), Point::new(125.0, 55.0));
  }

  #[test]
  fn filters_by_label() {
    let result = DetectResult::from(vec![
      DetectItem::new("bird", 0.9, BoundingBox::new(0.0, 0.0, 2.0, 2.0)),
      DetectItem::new("person", 0.8, BoundingBox::new(0.0, 0.0, 2.0, 2.0)),
      DetectItem::new("bird", 0.7, BoundingBox::new(4.0, 4.0, 2.0, 2.0)),
    ]);
    assert_eq!(result.with_label("bird").count(), 2);
    assert_eq!(result.with_label("cat").count(), 0);
  }

  #[test]
  fn item_parses_from_json_array_box() {
    let item: DetectItem =
      serde_json::from_str(r#"{"label": "bird", "bbox": [10, 20, 30, 40]}"#).unwrap();
    assert_eq!(item.bbox, BoundingBox::new(10.0, 20.0, 30.0, 40.0));
    assert_eq!(item.score, 1.0);
  }
}
