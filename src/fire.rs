// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/fire.rs - 开火事件来源
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
  collections::BTreeMap,
  io::{BufRead, BufReader},
  num::ParseIntError,
  str::FromStr,
  sync::mpsc::{self, Receiver},
  thread,
};

use tracing::{info, warn};

/// 离散的开火事件来源
pub trait FireTrigger {
  /// 第 `tick` 帧到来的开火事件数量，每个事件对应一次开火
  fn poll(&mut self, tick: u64) -> usize;
}

/// 在指定帧开火，同一帧重复出现即开火多次
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduledFire {
  schedule: BTreeMap<u64, usize>,
}

impl ScheduledFire {
  pub fn new(ticks: impl IntoIterator<Item = u64>) -> Self {
    let mut schedule = BTreeMap::new();
    for tick in ticks {
      *schedule.entry(tick).or_insert(0) += 1;
    }
    Self { schedule }
  }

  pub fn is_empty(&self) -> bool {
    self.schedule.is_empty()
  }
}

impl FromStr for ScheduledFire {
  type Err = ParseIntError;

  /// 逗号分隔的帧序号，例如 `3,10,10`
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let ticks = s
      .split(',')
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(u64::from_str)
      .collect::<Result<Vec<_>, _>>()?;
    Ok(Self::new(ticks))
  }
}

impl FireTrigger for ScheduledFire {
  fn poll(&mut self, tick: u64) -> usize {
    self.schedule.remove(&tick).unwrap_or(0)
  }
}

/// 从标准输入读取开火事件，每读到一行就开火一次
pub struct StdinFire {
  events: Receiver<()>,
}

impl StdinFire {
  pub fn spawn() -> std::io::Result<Self> {
    Self::from_reader(BufReader::new(std::io::stdin()))
  }

  pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> std::io::Result<Self> {
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
      .name("stdin-fire".to_string())
      .spawn(move || {
        info!("等待标准输入的开火指令，每行一次");
        for line in reader.lines() {
          match line {
            Ok(_) => {
              if tx.send(()).is_err() {
                break;
              }
            }
            Err(e) => {
              warn!("读取开火指令失败: {}", e);
              break;
            }
          }
        }
      })?;
    Ok(Self { events: rx })
  }
}

impl FireTrigger for StdinFire {
  fn poll(&mut self, _tick: u64) -> usize {
    self.events.try_iter().count()
  }
}

impl FireTrigger for Vec<Box<dyn FireTrigger + Send>> {
  fn poll(&mut self, tick: u64) -> usize {
    self.iter_mut().map(|trigger| trigger.poll(tick)).sum()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::time::{Duration, Instant};

  #[test]
  fn schedule_fires_once_per_occurrence() {
    let mut fire: ScheduledFire = "3, 10,10".parse().unwrap();
    assert_eq!(fire.poll(1), 0);
    assert_eq!(fire.poll(3), 1);
    assert_eq!(fire.poll(3), 0);
    assert_eq!(fire.poll(10), 2);
    assert!(fire.is_empty());
  }

  #[test]
  fn schedule_rejects_garbage() {
    assert!("3,x".parse::<ScheduledFire>().is_err());
    assert!("".parse::<ScheduledFire>().unwrap().is_empty());
  }

  #[test]
  fn every_line_is_one_event() {
    let input = std::io::Cursor::new("fire\n\nfire\n");
    let mut fire = StdinFire::from_reader(input).unwrap();
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut total = 0;
    while total < 3 && Instant::now() < deadline {
      total += fire.poll(0);
      thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(total, 3);
  }

  #[test]
  fn combined_triggers_add_up() {
    let mut triggers: Vec<Box<dyn FireTrigger + Send>> = vec![
      Box::new(ScheduledFire::new([2])),
      Box::new(ScheduledFire::new([2, 5])),
    ];
    assert_eq!(triggers.poll(2), 2);
    assert_eq!(triggers.poll(5), 1);
  }
}
