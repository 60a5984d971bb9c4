// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/laser/burst.rs - 命中火花
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

use std::f64::consts::TAU;

use rand::Rng;

use crate::surface::{Color, Glow, Point, RenderSurface, Stroke};

const SPARK_COUNT: usize = 8;
const SPARK_MIN_LENGTH: f64 = 8.0;
const SPARK_MAX_LENGTH: f64 = 16.0;
const SPARK_WIDTH: f64 = 2.0;
const SPARK_GLOW_BLUR: f64 = 10.0;
const SPARK_COLOR: Color = Color::rgba(0, 255, 0, 0.6);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstParams {
  pub min_length: f64,
  pub max_length: f64,
  pub width: f64,
  pub glow_blur: f64,
  pub color: Color,
}

impl Default for BurstParams {
  fn default() -> Self {
    Self {
      min_length: SPARK_MIN_LENGTH,
      max_length: SPARK_MAX_LENGTH,
      width: SPARK_WIDTH,
      glow_blur: SPARK_GLOW_BLUR,
      color: SPARK_COLOR,
    }
  }
}

/// 一条火花线段
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spark {
  /// 方向角，`[0, 2π)`
  pub angle: f64,
  pub length: f64,
}

impl Spark {
  pub fn end(&self, from: Point) -> Point {
    Point::new(
      from.x + self.angle.cos() * self.length,
      from.y + self.angle.sin() * self.length,
    )
  }
}

/// 命中时的一次性放射状火花，不跨帧保留任何状态
#[derive(Debug, Clone, Copy, Default)]
pub struct Burst {
  params: BurstParams,
}

impl Burst {
  pub fn new(params: BurstParams) -> Self {
    Self { params }
  }

  pub fn params(&self) -> &BurstParams {
    &self.params
  }

  pub fn sparks<R: Rng + ?Sized>(&self, rng: &mut R) -> [Spark; SPARK_COUNT] {
    std::array::from_fn(|_| Spark {
      angle: rng.random_range(0.0..TAU),
      length: if self.params.max_length > self.params.min_length {
        rng.random_range(self.params.min_length..self.params.max_length)
      } else {
        self.params.min_length
      },
    })
  }

  pub fn render<S: RenderSurface + ?Sized>(&self, surface: &mut S, at: Point, sparks: &[Spark]) {
    let stroke = Stroke::solid(self.params.width, self.params.color);
    surface.set_glow(Some(Glow {
      color: Color::LIME,
      blur: self.params.glow_blur,
    }));
    for spark in sparks {
      surface.stroke_line(at, spark.end(at), &stroke);
    }
  }

  /// 在 `at` 处生成并绘制一组火花
  pub fn burst<S, R>(&self, surface: &mut S, rng: &mut R, at: Point) -> [Spark; SPARK_COUNT]
  where
    S: RenderSurface + ?Sized,
    R: Rng + ?Sized,
  {
    let sparks = self.sparks(rng);
    self.render(surface, at, &sparks);
    sparks
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::surface::RecordingSurface;
  use approx::assert_abs_diff_eq;
  use rand::{SeedableRng, rngs::StdRng};

  #[test]
  fn burst_draws_eight_sparks_from_hit_point() {
    let burst = Burst::default();
    let mut surface = RecordingSurface::new(100, 100);
    let mut rng = StdRng::seed_from_u64(42);
    let at = Point::new(40.0, 60.0);
    let sparks = burst.burst(&mut surface, &mut rng, at);

    assert_eq!(sparks.len(), 8);
    let lines: Vec<_> = surface.lines().collect();
    assert_eq!(lines.len(), 8);
    for ((from, to, stroke), spark) in lines.iter().zip(sparks.iter()) {
      assert_eq!(**from, at);
      assert_abs_diff_eq!(from.distance(**to), spark.length, epsilon = 1e-9);
      assert_eq!(**stroke, Stroke::solid(2.0, Color::rgba(0, 255, 0, 0.6)));
    }
  }

  #[test]
  fn sparks_stay_within_ranges() {
    let burst = Burst::default();
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..2_000 {
      for spark in burst.sparks(&mut rng) {
        assert!((0.0..TAU).contains(&spark.angle));
        assert!((8.0..16.0).contains(&spark.length));
      }
    }
  }

  #[test]
  fn sparks_are_spread_uniformly() {
    let burst = Burst::default();
    let mut rng = StdRng::seed_from_u64(2026);
    let mut quadrants = [0usize; 4];
    let mut length_sum = 0.0;
    let rounds = 5_000;
    for _ in 0..rounds {
      for spark in burst.sparks(&mut rng) {
        quadrants[((spark.angle / (TAU / 4.0)) as usize).min(3)] += 1;
        length_sum += spark.length;
      }
    }
    let total = (rounds * SPARK_COUNT) as f64;
    for count in quadrants {
      let share = count as f64 / total;
      assert!((share - 0.25).abs() < 0.02, "quadrant share {share}");
    }
    assert!((length_sum / total - 12.0).abs() < 0.1);
  }

  #[test]
  fn consecutive_bursts_are_independent() {
    let burst = Burst::default();
    let mut rng = StdRng::seed_from_u64(5);
    let a = burst.sparks(&mut rng);
    let b = burst.sparks(&mut rng);
    assert_ne!(a, b);
  }
}
