// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/laser.rs - 激光动画
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

//! # 激光动画模块
//!
//! - [`BeamRegistry`] 持有所有飞行中的激光束，每一帧推进并绘制一次；
//! - [`Burst`] 在激光束命中时绘制一次性的放射状火花；
//! - [`TriggerController`] 在开火事件到来时对当前帧做检测，
//!   为每个目标生成一束激光。

mod beam;
mod burst;
mod trigger;

pub use self::beam::{Beam, BeamParams, BeamRegistry, BeamSnapshot};
pub use self::burst::{Burst, BurstParams, Spark};
pub use self::trigger::{TriggerController, muzzle_point, spawn_at_targets};
