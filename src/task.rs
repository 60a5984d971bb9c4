// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/task.rs - 渲染循环任务
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

use std::{
  fmt::Display,
  sync::{Arc, mpsc},
  thread,
  time::{Duration, Instant},
};

use ab_glyph::FontArc;
use tracing::{debug, info, warn};

use crate::{
  fire::{FireTrigger, ScheduledFire},
  frame::Frame,
  laser::{BeamParams, BeamRegistry, TriggerController},
  model::{DetectResult, Model},
  output::{DetectionOverlay, ImageCanvas, Overlay, Render},
  surface::RenderSurface,
};

const DEFAULT_TRACKED_CLASS: &str = "bird";

pub trait Task<I, M, O>: Sized {
  type Report;
  type Error;
  fn run_task(self, input: I, model: M, output: O) -> Result<Self::Report, Self::Error>;
}

/// 任务结束时的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskReport {
  pub ticks: u64,
  pub shots: usize,
  pub spawned: usize,
  pub hits: usize,
  pub detection_failures: usize,
}

/// 逐帧驱动的激光渲染循环
///
/// 每帧：收取已完成的开火检测结果 → 清空画布 → 检测并绘制检测框
/// → 处理开火事件 → 推进并绘制所有激光 → 输出。
pub struct LaserTask {
  frame_number: Option<usize>,
  tick_interval: Option<Duration>,
  tracked_class: String,
  params: BeamParams,
  font: Option<FontArc>,
  trigger: Box<dyn FireTrigger + Send>,
  interruptible: bool,
}

impl Default for LaserTask {
  fn default() -> Self {
    Self {
      frame_number: None,
      tick_interval: None,
      tracked_class: DEFAULT_TRACKED_CLASS.to_string(),
      params: BeamParams::default(),
      font: None,
      trigger: Box::new(ScheduledFire::default()),
      interruptible: false,
    }
  }
}

impl LaserTask {
  pub fn with_frame_number(mut self, frame_number: Option<usize>) -> Self {
    self.frame_number = frame_number;
    self
  }

  /// 按固定帧率节流，`None` 时尽快处理
  pub fn with_fps(mut self, fps: Option<f64>) -> Self {
    self.tick_interval = fps
      .filter(|fps| *fps > 0.0)
      .map(|fps| Duration::from_secs_f64(1.0 / fps));
    self
  }

  pub fn with_tracked_class(mut self, tracked_class: impl Into<String>) -> Self {
    self.tracked_class = tracked_class.into();
    self
  }

  pub fn with_params(mut self, params: BeamParams) -> Self {
    self.params = params;
    self
  }

  pub fn with_font(mut self, font: Option<FontArc>) -> Self {
    self.font = font;
    self
  }

  pub fn with_trigger(mut self, trigger: Box<dyn FireTrigger + Send>) -> Self {
    self.trigger = trigger;
    self
  }

  /// 响应 Ctrl-C 退出循环；每个进程只能启用一次
  pub fn interruptible(mut self, interruptible: bool) -> Self {
    self.interruptible = interruptible;
    self
  }

  fn install_interrupt(&self) -> anyhow::Result<Option<mpsc::Receiver<()>>> {
    if !self.interruptible {
      return Ok(None);
    }
    let (tx, rx) = mpsc::channel();
    ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    })?;
    Ok(Some(rx))
  }
}

impl<I, M, O> Task<I, M, O> for LaserTask
where
  I: Iterator<Item = Frame>,
  M: Model<Input = Frame, Output = DetectResult> + Send + Sync + 'static,
  M::Error: Display,
  O: Render<Frame>,
  O::Error: std::error::Error + Send + Sync + 'static,
{
  type Report = TaskReport;
  type Error = anyhow::Error;

  fn run_task(self, input: I, model: M, output: O) -> Result<TaskReport, Self::Error> {
    info!("开始任务，追踪类别: {}", self.tracked_class);
    let stop = self.install_interrupt()?;

    let model = Arc::new(model);
    let mut controller = TriggerController::new(Arc::clone(&model), self.tracked_class.clone())?;
    let overlay = DetectionOverlay::new(self.tracked_class.clone());
    let mut registry = BeamRegistry::new().with_params(self.params);
    let mut canvas = ImageCanvas::new(0, 0).with_font(self.font);
    let mut trigger = self.trigger;
    let mut rng = rand::rng();
    let mut report = TaskReport::default();

    for frame in input {
      let started = Instant::now();
      report.ticks += 1;
      let tick = report.ticks;
      let frame = Arc::new(frame);

      canvas.resize(frame.width(), frame.height());
      report.spawned += controller.collect(&mut registry);
      canvas.clear();

      let mut detections = 0;
      if frame.is_ready() {
        match model.infer(&*frame) {
          Ok(result) => detections = overlay.draw(&mut canvas, &result),
          Err(e) => {
            report.detection_failures += 1;
            warn!("第 {} 帧检测失败: {}", tick, e);
          }
        }
      }

      let shots = trigger.poll(tick);
      for _ in 0..shots {
        controller.fire(Arc::clone(&frame));
      }
      report.shots += shots;

      let hits = registry.advance_and_render(&mut canvas, &mut rng);
      report.hits += hits;

      output.render_result(
        &*frame,
        &Overlay {
          image: canvas.image(),
          tick,
          beams: registry.count(),
          hits,
          detections,
        },
      )?;
      debug!(
        "第 {} 帧完成: 检测框 {}, 激光 {}, 耗时 {:.2?}",
        tick,
        detections,
        registry.count(),
        started.elapsed()
      );

      if self.frame_number.is_some_and(|n| tick >= n as u64) {
        info!("达到指定帧数 {}, 退出任务循环", tick);
        break;
      }
      if stop.as_ref().is_some_and(|rx| rx.try_recv().is_ok()) {
        warn!("中断信号接收，退出任务循环");
        break;
      }
      if let Some(interval) = self.tick_interval {
        thread::sleep(interval.saturating_sub(started.elapsed()));
      }
    }

    if controller.pending() > 0 {
      warn!("仍有 {} 次开火检测未完成", controller.pending());
    }
    info!(
      "任务完成，共 {} 帧，开火 {} 次，生成激光 {} 束，命中 {} 次",
      report.ticks, report.shots, report.spawned, report.hits
    );
    Ok(report)
  }
}
