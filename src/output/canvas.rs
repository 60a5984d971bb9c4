// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/output/canvas.rs - 基于 RGBA 图像的绘制表面
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

use ab_glyph::{FontArc, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{Blend, draw_line_segment_mut, draw_text_mut};
use tracing::debug;

use crate::surface::{Color, Glow, Paint, Point, RenderSurface, Stroke};

// 渐变描边拆分的小段数量
const GRADIENT_SEGMENTS: usize = 16;
// 辉光层：(额外宽度占 blur 的比例, 透明度系数)
const GLOW_LAYERS: [(f64, f64); 2] = [(1.0, 0.12), (0.5, 0.25)];

/// 透明的 RGBA 叠加层，按 alpha 混合绘制
pub struct ImageCanvas {
  canvas: Blend<RgbaImage>,
  glow: Option<Glow>,
  font: Option<FontArc>,
}

impl ImageCanvas {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      canvas: Blend(RgbaImage::new(width, height)),
      glow: None,
      font: None,
    }
  }

  pub fn with_font(mut self, font: Option<FontArc>) -> Self {
    self.font = font;
    self
  }

  pub fn image(&self) -> &RgbaImage {
    &self.canvas.0
  }

  pub fn into_image(self) -> RgbaImage {
    self.canvas.0
  }

  fn pixel(color: Color) -> Rgba<u8> {
    Rgba(color.to_rgba8())
  }

  /// 由若干条平行的单像素线段组成的粗线
  fn thick_segment(&mut self, from: Point, to: Point, width: f64, color: Rgba<u8>) {
    if color[3] == 0 {
      return;
    }
    let d = to - from;
    let length = from.distance(to);
    let normal = if length > f64::EPSILON {
      Point::new(-d.y / length, d.x / length)
    } else {
      Point::new(0.0, 1.0)
    };
    let passes = width.round().max(1.0) as usize;
    let center = (passes - 1) as f64 / 2.0;
    for i in 0..passes {
      let offset = normal * (i as f64 - center);
      let (a, b) = (from + offset, to + offset);
      draw_line_segment_mut(
        &mut self.canvas,
        (a.x as f32, a.y as f32),
        (b.x as f32, b.y as f32),
        color,
      );
    }
  }

  fn paint_segment(&mut self, from: Point, to: Point, width: f64, paint: &Paint, alpha: f64) {
    match paint {
      Paint::Solid(color) => {
        let color = color.with_alpha(color.a * alpha);
        self.thick_segment(from, to, width, Self::pixel(color));
      }
      Paint::Gradient(_) => {
        for k in 0..GRADIENT_SEGMENTS {
          let t0 = k as f64 / GRADIENT_SEGMENTS as f64;
          let t1 = (k + 1) as f64 / GRADIENT_SEGMENTS as f64;
          let (a, b) = (from.lerp(to, t0), from.lerp(to, t1));
          let color = paint.color_at_point(a.lerp(b, 0.5));
          let color = color.with_alpha(color.a * alpha);
          self.thick_segment(a, b, width, Self::pixel(color));
        }
      }
    }
  }

  fn glow_segment(&mut self, from: Point, to: Point, stroke: &Stroke) {
    let Some(glow) = self.glow else {
      return;
    };
    if glow.blur <= 0.0 {
      return;
    }
    // 辉光跟随描边自身的透明度衰减
    let strength = stroke.paint.color_at_point(from).a;
    for (spread, factor) in GLOW_LAYERS {
      let width = stroke.width + glow.blur * spread;
      let color = glow.color.with_alpha(glow.color.a * factor * strength);
      self.thick_segment(from, to, width, Self::pixel(color));
    }
  }
}

impl RenderSurface for ImageCanvas {
  fn size(&self) -> (u32, u32) {
    self.canvas.0.dimensions()
  }

  fn resize(&mut self, width: u32, height: u32) {
    if self.size() != (width, height) {
      debug!("画布尺寸调整为 {}x{}", width, height);
      self.canvas.0 = RgbaImage::new(width, height);
    }
  }

  fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
    let (w, h) = self.size();
    let x0 = x.max(0.0).floor() as u32;
    let y0 = y.max(0.0).floor() as u32;
    let x1 = ((x + width).ceil().max(0.0) as u32).min(w);
    let y1 = ((y + height).ceil().max(0.0) as u32).min(h);
    for py in y0..y1 {
      for px in x0..x1 {
        self.canvas.0.put_pixel(px, py, Rgba([0, 0, 0, 0]));
      }
    }
  }

  fn set_glow(&mut self, glow: Option<Glow>) {
    self.glow = glow;
  }

  fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
    self.glow_segment(from, to, stroke);
    self.paint_segment(from, to, stroke.width, &stroke.paint, 1.0);
  }

  fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: &Stroke) {
    let corners = [
      Point::new(x, y),
      Point::new(x + width, y),
      Point::new(x + width, y + height),
      Point::new(x, y + height),
    ];
    for i in 0..corners.len() {
      let (a, b) = (corners[i], corners[(i + 1) % corners.len()]);
      self.glow_segment(a, b, stroke);
      self.paint_segment(a, b, stroke.width, &stroke.paint, 1.0);
    }
  }

  fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Color) {
    let Some(font) = &self.font else {
      return;
    };
    // 文本基线位于 `at`，imageproc 以左上角定位
    let top = at.y - size as f64;
    draw_text_mut(
      &mut self.canvas,
      Self::pixel(color),
      at.x.round() as i32,
      top.round() as i32,
      PxScale::from(size),
      font,
      text,
    );
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::surface::LinearGradient;

  fn opaque_pixels(canvas: &ImageCanvas) -> usize {
    canvas.image().pixels().filter(|p| p[3] > 0).count()
  }

  #[test]
  fn solid_line_covers_its_pixels() {
    let mut canvas = ImageCanvas::new(20, 20);
    canvas.stroke_line(
      Point::new(2.0, 10.0),
      Point::new(17.0, 10.0),
      &Stroke::solid(1.0, Color::LIME),
    );
    assert_eq!(*canvas.image().get_pixel(10, 10), Rgba([0, 255, 0, 255]));
    assert_eq!(canvas.image().get_pixel(10, 2)[3], 0);
  }

  #[test]
  fn thick_line_is_wider_than_thin_line() {
    let mut thin = ImageCanvas::new(40, 40);
    let mut thick = ImageCanvas::new(40, 40);
    let (a, b) = (Point::new(5.0, 20.0), Point::new(35.0, 20.0));
    thin.stroke_line(a, b, &Stroke::solid(1.0, Color::LIME));
    thick.stroke_line(a, b, &Stroke::solid(5.0, Color::LIME));
    assert!(opaque_pixels(&thick) >= 4 * opaque_pixels(&thin));
  }

  #[test]
  fn gradient_fades_along_the_line() {
    let (a, b) = (Point::new(0.0, 5.0), Point::new(63.0, 5.0));
    let gradient = LinearGradient::new(a, b)
      .with_stop(0.0, Color::rgba(0, 255, 0, 1.0))
      .with_stop(1.0, Color::rgba(255, 255, 255, 0.5));
    let mut canvas = ImageCanvas::new(64, 10);
    canvas.stroke_line(a, b, &Stroke::gradient(1.0, gradient));
    let root = canvas.image().get_pixel(1, 5);
    let tip = canvas.image().get_pixel(62, 5);
    assert!(root[3] > tip[3]);
    assert!(root[0] < tip[0]);
  }

  #[test]
  fn glow_spreads_beyond_the_stroke() {
    let (a, b) = (Point::new(5.0, 20.0), Point::new(35.0, 20.0));
    let mut plain = ImageCanvas::new(40, 40);
    plain.stroke_line(a, b, &Stroke::solid(1.0, Color::LIME));
    let mut glowing = ImageCanvas::new(40, 40);
    glowing.set_glow(Some(Glow {
      color: Color::LIME,
      blur: 10.0,
    }));
    glowing.stroke_line(a, b, &Stroke::solid(1.0, Color::LIME));
    assert!(opaque_pixels(&glowing) > opaque_pixels(&plain));
    assert_eq!(glowing.image().get_pixel(20, 20)[1], 255);
  }

  #[test]
  fn clear_rect_is_clamped_to_canvas() {
    let mut canvas = ImageCanvas::new(10, 10);
    canvas.stroke_rect(1.0, 1.0, 8.0, 8.0, &Stroke::solid(1.0, Color::WHITE));
    assert!(opaque_pixels(&canvas) > 0);
    canvas.clear_rect(-5.0, -5.0, 100.0, 100.0);
    assert_eq!(opaque_pixels(&canvas), 0);
  }

  #[test]
  fn resize_reallocates_only_on_change() {
    let mut canvas = ImageCanvas::new(4, 4);
    canvas.stroke_line(
      Point::new(0.0, 0.0),
      Point::new(3.0, 3.0),
      &Stroke::solid(1.0, Color::LIME),
    );
    canvas.resize(4, 4);
    assert!(opaque_pixels(&canvas) > 0);
    canvas.resize(8, 6);
    assert_eq!(canvas.size(), (8, 6));
    assert_eq!(opaque_pixels(&canvas), 0);
  }

  #[test]
  fn text_without_font_is_skipped() {
    let mut canvas = ImageCanvas::new(32, 32);
    canvas.fill_text("bird", Point::new(2.0, 20.0), 16.0, Color::LIME);
    assert_eq!(opaque_pixels(&canvas), 0);
  }
}
