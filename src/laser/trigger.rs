// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/laser/trigger.rs - 开火控制
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
  sync::{
    Arc,
    mpsc::{self, Receiver, RecvTimeoutError, Sender},
  },
  thread::{self, JoinHandle},
  time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
  frame::Frame,
  laser::BeamRegistry,
  model::{DetectResult, Model},
  surface::Point,
};

/// 激光发射点：画面底部中央
pub fn muzzle_point(width: u32, height: u32) -> Point {
  Point::new(width as f64 / 2.0, height as f64)
}

/// 为 `result` 中每个标签为 `tracked` 的目标生成一束激光，返回生成数量
pub fn spawn_at_targets(
  registry: &mut BeamRegistry,
  result: &DetectResult,
  tracked: &str,
  origin: Point,
) -> usize {
  let mut spawned = 0;
  for item in result.with_label(tracked) {
    registry.spawn(origin, item.bbox.center());
    spawned += 1;
  }
  spawned
}

enum Outcome {
  Targets { origin: Point, targets: Vec<Point> },
  Failed,
}

/// 开火控制器
///
/// 每次开火把当前帧交给后台检测线程，检测完成后结果进入队列；
/// 渲染循环在下一帧开始时调用 [`TriggerController::collect`] 生成激光。
/// 因此激光只会出现在检测完成之后的帧上，登记表也始终只在渲染线程中修改。
pub struct TriggerController {
  requests: Option<Sender<Arc<Frame>>>,
  outcomes: Receiver<Outcome>,
  pending: usize,
  worker: Option<JoinHandle<()>>,
}

impl TriggerController {
  pub fn new<M>(model: Arc<M>, tracked_class: impl Into<String>) -> std::io::Result<Self>
  where
    M: Model<Input = Frame, Output = DetectResult> + Send + Sync + 'static,
    M::Error: Display,
  {
    let tracked_class = tracked_class.into();
    let (request_tx, request_rx) = mpsc::channel::<Arc<Frame>>();
    let (outcome_tx, outcome_rx) = mpsc::channel();

    let worker = thread::Builder::new()
      .name("trigger-detect".to_string())
      .spawn(move || Self::detect_loop(model, tracked_class, request_rx, outcome_tx))?;

    Ok(Self {
      requests: Some(request_tx),
      outcomes: outcome_rx,
      pending: 0,
      worker: Some(worker),
    })
  }

  fn detect_loop<M>(
    model: Arc<M>,
    tracked_class: String,
    requests: Receiver<Arc<Frame>>,
    outcomes: Sender<Outcome>,
  ) where
    M: Model<Input = Frame, Output = DetectResult>,
    M::Error: Display,
  {
    info!("开火检测线程启动，追踪类别: {}", tracked_class);
    for frame in requests {
      let outcome = match model.infer(&*frame) {
        Ok(result) => {
          let origin = muzzle_point(frame.width(), frame.height());
          let targets: Vec<Point> = result
            .with_label(&tracked_class)
            .map(|item| item.bbox.center())
            .collect();
          debug!("第 {} 帧开火检测到 {} 个目标", frame.index(), targets.len());
          Outcome::Targets { origin, targets }
        }
        Err(e) => {
          warn!("第 {} 帧开火检测失败: {}", frame.index(), e);
          Outcome::Failed
        }
      };
      if outcomes.send(outcome).is_err() {
        break;
      }
    }
    info!("开火检测线程退出");
  }

  /// 对当前帧发起一次开火；不做去抖，也不限制频率
  pub fn fire(&mut self, frame: Arc<Frame>) {
    let Some(requests) = &self.requests else {
      return;
    };
    debug!("第 {} 帧开火", frame.index());
    match requests.send(frame) {
      Ok(()) => self.pending += 1,
      Err(_) => warn!("开火检测线程已退出，忽略本次开火"),
    }
  }

  /// 尚未返回结果的开火次数
  pub fn pending(&self) -> usize {
    self.pending
  }

  /// 取走所有已完成的检测结果并生成激光，不阻塞；返回生成的激光数量
  pub fn collect(&mut self, registry: &mut BeamRegistry) -> usize {
    let mut spawned = 0;
    while let Ok(outcome) = self.outcomes.try_recv() {
      spawned += self.apply(outcome, registry);
    }
    spawned
  }

  /// 等待所有未完成的开火，最多等待 `timeout`；返回生成的激光数量
  pub fn wait(&mut self, registry: &mut BeamRegistry, timeout: Duration) -> usize {
    let deadline = Instant::now() + timeout;
    let mut spawned = 0;
    while self.pending > 0 {
      let remaining = deadline.saturating_duration_since(Instant::now());
      match self.outcomes.recv_timeout(remaining) {
        Ok(outcome) => spawned += self.apply(outcome, registry),
        Err(RecvTimeoutError::Timeout) => {
          warn!("等待开火检测超时，仍有 {} 次未完成", self.pending);
          break;
        }
        Err(RecvTimeoutError::Disconnected) => break,
      }
    }
    spawned
  }

  fn apply(&mut self, outcome: Outcome, registry: &mut BeamRegistry) -> usize {
    self.pending = self.pending.saturating_sub(1);
    match outcome {
      Outcome::Targets { origin, targets } => {
        for target in &targets {
          registry.spawn(origin, *target);
        }
        targets.len()
      }
      Outcome::Failed => 0,
    }
  }
}

impl Drop for TriggerController {
  fn drop(&mut self) {
    // 关闭请求通道后检测线程自然退出
    self.requests.take();
    if let Some(worker) = self.worker.take()
      && worker.join().is_err()
    {
      warn!("开火检测线程异常退出");
    }
  }
}
