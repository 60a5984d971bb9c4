// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/surface.rs - 绘制表面定义
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

use std::ops::{Add, Mul, Sub};

/// 画布坐标，单位为像素，原点在左上角
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
  pub x: f64,
  pub y: f64,
}

impl Point {
  pub const fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  /// 线性插值：`t = 0` 得到 `self`，`t = 1` 得到 `other`
  pub fn lerp(self, other: Point, t: f64) -> Point {
    self + (other - self) * t
  }

  pub fn distance(self, other: Point) -> f64 {
    (other.x - self.x).hypot(other.y - self.y)
  }
}

impl Add for Point {
  type Output = Point;
  fn add(self, rhs: Point) -> Point {
    Point::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for Point {
  type Output = Point;
  fn sub(self, rhs: Point) -> Point {
    Point::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl Mul<f64> for Point {
  type Output = Point;
  fn mul(self, rhs: f64) -> Point {
    Point::new(self.x * rhs, self.y * rhs)
  }
}

/// RGBA 颜色，透明度取值 `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: f64,
}

impl Color {
  pub const LIME: Color = Color::rgb(0, 255, 0);
  pub const WHITE: Color = Color::rgb(255, 255, 255);
  pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0.0);

  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 1.0 }
  }

  pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
    Self { r, g, b, a }
  }

  pub fn with_alpha(self, a: f64) -> Self {
    Self { a, ..self }
  }

  /// 透明度截断到 `[0, 1]` 后转为 8 位
  pub fn to_rgba8(self) -> [u8; 4] {
    let a = (self.a.clamp(0.0, 1.0) * 255.0).round() as u8;
    [self.r, self.g, self.b, a]
  }

  fn mix(self, other: Color, t: f64) -> Color {
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    Color {
      r: channel(self.r, other.r),
      g: channel(self.g, other.g),
      b: channel(self.b, other.b),
      a: self.a + (other.a - self.a) * t,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
  pub offset: f64,
  pub color: Color,
}

/// 沿 `from -> to` 方向的线性渐变
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
  pub from: Point,
  pub to: Point,
  stops: Vec<ColorStop>,
}

impl LinearGradient {
  pub fn new(from: Point, to: Point) -> Self {
    Self {
      from,
      to,
      stops: Vec::new(),
    }
  }

  pub fn with_stop(mut self, offset: f64, color: Color) -> Self {
    let offset = offset.clamp(0.0, 1.0);
    let at = self.stops.partition_point(|s| s.offset <= offset);
    self.stops.insert(at, ColorStop { offset, color });
    self
  }

  pub fn stops(&self) -> &[ColorStop] {
    &self.stops
  }

  /// 点 `p` 在渐变方向上的投影参数，`from` 为 0，`to` 为 1
  pub fn offset_of(&self, p: Point) -> f64 {
    let axis = self.to - self.from;
    let length2 = axis.x * axis.x + axis.y * axis.y;
    if length2 <= f64::EPSILON {
      return 0.0;
    }
    let rel = p - self.from;
    (rel.x * axis.x + rel.y * axis.y) / length2
  }

  /// 取渐变在 `t ∈ [0, 1]` 处的颜色，两端之外取端点颜色
  pub fn color_at(&self, t: f64) -> Color {
    let Some(first) = self.stops.first() else {
      return Color::TRANSPARENT;
    };
    if t <= first.offset {
      return first.color;
    }
    for pair in self.stops.windows(2) {
      let (lo, hi) = (pair[0], pair[1]);
      if t <= hi.offset {
        let span = hi.offset - lo.offset;
        if span <= f64::EPSILON {
          return hi.color;
        }
        return lo.color.mix(hi.color, (t - lo.offset) / span);
      }
    }
    self.stops[self.stops.len() - 1].color
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
  Solid(Color),
  Gradient(LinearGradient),
}

impl Paint {
  /// 点 `p` 处的颜色
  pub fn color_at_point(&self, p: Point) -> Color {
    match self {
      Paint::Solid(color) => *color,
      Paint::Gradient(gradient) => gradient.color_at(gradient.offset_of(p)),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
  pub width: f64,
  pub paint: Paint,
}

impl Stroke {
  pub fn solid(width: f64, color: Color) -> Self {
    Self {
      width,
      paint: Paint::Solid(color),
    }
  }

  pub fn gradient(width: f64, gradient: LinearGradient) -> Self {
    Self {
      width,
      paint: Paint::Gradient(gradient),
    }
  }
}

/// 辉光（阴影）参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glow {
  pub color: Color,
  pub blur: f64,
}

/// 二维绘制表面
///
/// 绘制调用都是幂等的命令，表面从不回读像素。
pub trait RenderSurface {
  fn size(&self) -> (u32, u32);

  /// 调整表面大小，尺寸不变时不做任何事
  fn resize(&mut self, width: u32, height: u32);

  fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64);

  /// 之后的描边使用的辉光，`None` 关闭辉光
  fn set_glow(&mut self, glow: Option<Glow>);

  fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke);

  fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: &Stroke);

  fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Color);

  fn clear(&mut self) {
    let (width, height) = self.size();
    self.clear_rect(0.0, 0.0, width as f64, height as f64);
  }
}

/// 记录下来的绘制命令
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
  Resize {
    width: u32,
    height: u32,
  },
  Clear {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
  },
  Glow(Option<Glow>),
  Line {
    from: Point,
    to: Point,
    stroke: Stroke,
  },
  Rect {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    stroke: Stroke,
  },
  Text {
    text: String,
    at: Point,
    size: f32,
    color: Color,
  },
}

/// 只记录命令、不产生像素的表面，用于无头运行与测试
#[derive(Debug, Default)]
pub struct RecordingSurface {
  width: u32,
  height: u32,
  commands: Vec<DrawCommand>,
}

impl RecordingSurface {
  pub fn new(width: u32, height: u32) -> Self {
    Self {
      width,
      height,
      commands: Vec::new(),
    }
  }

  pub fn commands(&self) -> &[DrawCommand] {
    &self.commands
  }

  pub fn take_commands(&mut self) -> Vec<DrawCommand> {
    std::mem::take(&mut self.commands)
  }

  pub fn lines(&self) -> impl Iterator<Item = (&Point, &Point, &Stroke)> {
    self.commands.iter().filter_map(|c| match c {
      DrawCommand::Line { from, to, stroke } => Some((from, to, stroke)),
      _ => None,
    })
  }
}

impl RenderSurface for RecordingSurface {
  fn size(&self) -> (u32, u32) {
    (self.width, self.height)
  }

  fn resize(&mut self, width: u32, height: u32) {
    if (width, height) != (self.width, self.height) {
      self.width = width;
      self.height = height;
      self.commands.push(DrawCommand::Resize { width, height });
    }
  }

  fn clear_rect(&mut self, x: f64, y: f64, width: f64, height: f64) {
    self.commands.push(DrawCommand::Clear {
      x,
      y,
      width,
      height,
    });
  }

  fn set_glow(&mut self, glow: Option<Glow>) {
    self.commands.push(DrawCommand::Glow(glow));
  }

  fn stroke_line(&mut self, from: Point, to: Point, stroke: &Stroke) {
    self.commands.push(DrawCommand::Line {
      from,
      to,
      stroke: stroke.clone(),
    });
  }

  fn stroke_rect(&mut self, x: f64, y: f64, width: f64, height: f64, stroke: &Stroke) {
    self.commands.push(DrawCommand::Rect {
      x,
      y,
      width,
      height,
      stroke: stroke.clone(),
    });
  }

  fn fill_text(&mut self, text: &str, at: Point, size: f32, color: Color) {
    self.commands.push(DrawCommand::Text {
      text: text.to_string(),
      at,
      size,
      color,
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use approx::assert_abs_diff_eq;

  fn three_stop() -> LinearGradient {
    LinearGradient::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0))
      .with_stop(0.0, Color::rgba(0, 255, 0, 1.0))
      .with_stop(0.5, Color::rgba(100, 255, 100, 0.8))
      .with_stop(1.0, Color::rgba(255, 255, 255, 0.5))
  }

  #[test]
  fn gradient_hits_stops_exactly() {
    let g = three_stop();
    assert_eq!(g.color_at(0.0), Color::rgba(0, 255, 0, 1.0));
    assert_eq!(g.color_at(0.5), Color::rgba(100, 255, 100, 0.8));
    assert_eq!(g.color_at(1.0), Color::rgba(255, 255, 255, 0.5));
  }

  #[test]
  fn gradient_interpolates_between_stops() {
    let c = three_stop().color_at(0.25);
    assert_eq!((c.r, c.g, c.b), (50, 255, 50));
    assert_abs_diff_eq!(c.a, 0.9, epsilon = 1e-12);
  }

  #[test]
  fn gradient_clamps_outside_range() {
    let g = three_stop();
    assert_eq!(g.color_at(-1.0), g.color_at(0.0));
    assert_eq!(g.color_at(2.0), g.color_at(1.0));
  }

  #[test]
  fn paint_projects_points_onto_gradient_axis() {
    let paint = Paint::Gradient(three_stop());
    assert_eq!(paint.color_at_point(Point::new(5.0, 7.0)), three_stop().color_at(0.5));
    assert_eq!(paint.color_at_point(Point::new(-3.0, 0.0)), three_stop().color_at(0.0));
    let solid = Paint::Solid(Color::LIME);
    assert_eq!(solid.color_at_point(Point::new(1.0, 1.0)), Color::LIME);
  }

  #[test]
  fn stops_stay_sorted() {
    let g = LinearGradient::new(Point::default(), Point::new(1.0, 1.0))
      .with_stop(1.0, Color::WHITE)
      .with_stop(0.0, Color::LIME);
    let offsets: Vec<_> = g.stops().iter().map(|s| s.offset).collect();
    assert_eq!(offsets, vec![0.0, 1.0]);
  }

  #[test]
  fn lerp_follows_segment() {
    let p = Point::new(320.0, 480.0).lerp(Point::new(200.0, 100.0), 0.5);
    assert_eq!(p, Point::new(260.0, 290.0));
  }

  #[test]
  fn alpha_is_clamped_when_quantized() {
    assert_eq!(Color::LIME.with_alpha(1.5).to_rgba8(), [0, 255, 0, 255]);
    assert_eq!(Color::LIME.with_alpha(-0.2).to_rgba8(), [0, 255, 0, 0]);
  }

  #[test]
  fn recording_surface_ignores_same_size_resize() {
    let mut surface = RecordingSurface::new(4, 4);
    surface.resize(4, 4);
    assert!(surface.commands().is_empty());
    surface.resize(8, 2);
    surface.clear();
    assert_eq!(
      surface.commands(),
      &[
        DrawCommand::Resize {
          width: 8,
          height: 2
        },
        DrawCommand::Clear {
          x: 0.0,
          y: 0.0,
          width: 8.0,
          height: 2.0
        }
      ]
    );
  }
}
