// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/bin/laser_overlay.rs - 激光叠加层主程序
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use tracing::info;
use zhuque::{
  FromUrl,
  fire::{FireTrigger, ScheduledFire, StdinFire},
  input::InputWrapper,
  model::ReplayDetector,
  output::{OutputWrapper, load_font},
  task::{LaserTask, Task},
};

/// Zhuque 激光叠加层参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 检测结果来源，例如 replay:///path/to/detections.json?loop
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入来源，例如 image:///path/to/still.png?repeat=60、folder:///path/to/frames
  /// 或 v4l:///dev/video0?width=640&height=480（需要 v4l_input 特性）
  #[arg(long, value_name = "SOURCE")]
  pub input: Url,
  /// 输出路径，例如 image:///tmp/overlay.png 或 folder:///tmp/record?always
  #[arg(long, value_name = "OUTPUT")]
  pub output: Url,

  #[arg(long, value_name = "FRAME_NUMBER")]
  pub frame_number: Option<usize>,

  /// 在指定帧开火，逗号分隔，例如 3,10,10
  #[arg(long, value_name = "TICKS")]
  pub fire_at: Option<ScheduledFire>,

  /// 从标准输入读取开火指令，每行一次
  #[arg(long)]
  pub stdin_fire: bool,

  /// 追踪类别
  #[arg(long, default_value = "bird", value_name = "CLASS")]
  pub tracked_class: String,

  /// 检测框标签字体（TTF/OTF），不指定时不绘制标签
  #[arg(long, value_name = "FONT")]
  pub font: Option<PathBuf>,

  /// 帧率上限，不指定时尽快处理
  #[arg(long, value_name = "FPS")]
  pub fps: Option<f64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("检测结果来源: {}", args.model);
  info!("输入来源: {}", args.input);
  info!("输出路径: {}", args.output);

  let input = InputWrapper::from_url(&args.input)?;
  let model = ReplayDetector::from_url(&args.model)?;
  let output = OutputWrapper::from_url(&args.output)?;
  let font = args.font.as_ref().map(load_font).transpose()?;

  let mut triggers: Vec<Box<dyn FireTrigger + Send>> = Vec::new();
  if let Some(schedule) = args.fire_at {
    triggers.push(Box::new(schedule));
  }
  if args.stdin_fire {
    triggers.push(Box::new(StdinFire::spawn()?));
  }

  let report = LaserTask::default()
    .with_frame_number(args.frame_number)
    .with_fps(args.fps)
    .with_tracked_class(args.tracked_class)
    .with_font(font)
    .with_trigger(Box::new(triggers))
    .interruptible(true)
    .run_task(input, model, output)?;

  info!("统计: {:?}", report);
  Ok(())
}
