// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/laser/beam.rs - 激光束与激光束登记表
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

use rand::Rng;
use tracing::debug;

use crate::{
  laser::burst::Burst,
  surface::{Color, Glow, LinearGradient, Point, RenderSurface, Stroke},
};

// 动画常量
const PROGRESS_STEP: f64 = 0.04; // 25 帧到达目标
const PULSE_STEP: f64 = 0.3;
const BASE_WIDTH: f64 = 3.0;
const PULSE_AMPLITUDE: f64 = 2.0;
const GLOW_BLUR: f64 = 20.0;

const STOP_ROOT: Color = Color::rgb(0, 255, 0);
const STOP_MIDDLE: Color = Color::rgb(100, 255, 100);
const STOP_TIP: Color = Color::WHITE;
const MIDDLE_ALPHA: f64 = 0.8;
const TIP_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamParams {
  pub progress_step: f64,
  pub pulse_step: f64,
  pub base_width: f64,
  pub pulse_amplitude: f64,
  pub glow_blur: f64,
}

impl Default for BeamParams {
  fn default() -> Self {
    Self {
      progress_step: PROGRESS_STEP,
      pulse_step: PULSE_STEP,
      base_width: BASE_WIDTH,
      pulse_amplitude: PULSE_AMPLITUDE,
      glow_blur: GLOW_BLUR,
    }
  }
}

/// 一束飞行中的激光
#[derive(Debug, Clone, PartialEq)]
pub struct Beam {
  origin: Point,
  target: Point,
  progress: f64,
  pulse: f64,
}

impl Beam {
  fn new(origin: Point, target: Point) -> Self {
    Self {
      origin,
      target,
      progress: 0.0,
      pulse: 0.0,
    }
  }

  pub fn origin(&self) -> Point {
    self.origin
  }

  pub fn target(&self) -> Point {
    self.target
  }

  pub fn progress(&self) -> f64 {
    self.progress
  }

  pub fn pulse(&self) -> f64 {
    self.pulse
  }

  /// 当前弹头位置
  pub fn position(&self) -> Point {
    self.origin.lerp(self.target, self.progress)
  }

  pub fn opacity(&self) -> f64 {
    1.0 - self.progress
  }

  pub fn width(&self, params: &BeamParams) -> f64 {
    params.base_width + params.pulse_amplitude * self.pulse.sin()
  }

  pub fn has_arrived(&self) -> bool {
    self.progress >= 1.0
  }

  fn advance(&mut self, params: &BeamParams) {
    self.progress += params.progress_step;
    self.pulse += params.pulse_step;
  }

  fn snapshot(&self, params: &BeamParams) -> BeamSnapshot {
    BeamSnapshot {
      origin: self.origin,
      tip: self.position(),
      progress: self.progress,
      opacity: self.opacity(),
      width: self.width(params),
      arrived: self.has_arrived(),
    }
  }
}

/// 单束激光在某一帧推进之后的绘制参数
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeamSnapshot {
  pub origin: Point,
  pub tip: Point,
  pub progress: f64,
  pub opacity: f64,
  pub width: f64,
  /// 本帧命中目标，绘制后即被移除
  pub arrived: bool,
}

impl BeamSnapshot {
  /// 根部绿色、中段浅绿、尖端白色的渐变描边
  pub fn stroke(&self) -> Stroke {
    let gradient = LinearGradient::new(self.origin, self.tip)
      .with_stop(0.0, STOP_ROOT.with_alpha(self.opacity))
      .with_stop(0.5, STOP_MIDDLE.with_alpha(self.opacity * MIDDLE_ALPHA))
      .with_stop(1.0, STOP_TIP.with_alpha(self.opacity * TIP_ALPHA));
    Stroke::gradient(self.width, gradient)
  }
}

/// 激光束登记表，唯一持有所有激光束
#[derive(Debug, Default)]
pub struct BeamRegistry {
  beams: Vec<Beam>,
  params: BeamParams,
  burst: Burst,
}

impl BeamRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_params(mut self, params: BeamParams) -> Self {
    self.params = params;
    self
  }

  pub fn with_burst(mut self, burst: Burst) -> Self {
    self.burst = burst;
    self
  }

  pub fn params(&self) -> &BeamParams {
    &self.params
  }

  /// 追加一束 progress = 0、pulse = 0 的激光
  pub fn spawn(&mut self, origin: Point, target: Point) {
    debug!(
      "生成激光: ({:.1}, {:.1}) -> ({:.1}, {:.1})",
      origin.x, origin.y, target.x, target.y
    );
    self.beams.push(Beam::new(origin, target));
  }

  pub fn count(&self) -> usize {
    self.beams.len()
  }

  pub fn is_empty(&self) -> bool {
    self.beams.is_empty()
  }

  pub fn beams(&self) -> &[Beam] {
    &self.beams
  }

  /// 按登记顺序推进每束激光恰好一次，并移除已到达的激光
  ///
  /// 返回的快照与处理顺序一致，已到达的激光也包含在内（`arrived = true`）。
  /// 移除在同一次遍历中通过 `retain_mut` 压缩完成，
  /// 因此不会跳过或重复处理后续的激光。
  pub fn step(&mut self) -> Vec<BeamSnapshot> {
    let params = self.params;
    let mut snapshots = Vec::with_capacity(self.beams.len());
    self.beams.retain_mut(|beam| {
      beam.advance(&params);
      let snapshot = beam.snapshot(&params);
      snapshots.push(snapshot);
      !snapshot.arrived
    });
    snapshots
  }

  /// 推进并绘制所有激光；命中的激光在其当前位置绘制火花后被移除
  ///
  /// 返回本帧命中的激光数量。
  pub fn advance_and_render<S, R>(&mut self, surface: &mut S, rng: &mut R) -> usize
  where
    S: RenderSurface + ?Sized,
    R: Rng + ?Sized,
  {
    let snapshots = self.step();
    let glow = Some(Glow {
      color: Color::LIME,
      blur: self.params.glow_blur,
    });

    let mut hits = 0;
    for snapshot in &snapshots {
      surface.set_glow(glow);
      surface.stroke_line(snapshot.origin, snapshot.tip, &snapshot.stroke());
      if snapshot.arrived {
        hits += 1;
        self.burst.burst(surface, rng, snapshot.tip);
      }
    }
    surface.set_glow(None);

    if hits > 0 {
      debug!("{} 束激光命中，剩余 {} 束", hits, self.beams.len());
    }
    hits
  }
}
