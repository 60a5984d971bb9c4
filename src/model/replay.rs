// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/model/replay.rs - 回放检测结果的检测器
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

//! 从 JSON 文件回放事先记录的检测结果，按帧索引取用。
//!
//! ```json
//! {
//!   "frames": [
//!     [{ "label": "bird", "score": 0.91, "bbox": [120, 80, 40, 32] }],
//!     [],
//!     null
//!   ]
//! }
//! ```
//!
//! `null` 表示该帧检测失败，用于模拟检测器的瞬时错误。

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  model::{DetectItem, DetectResult, Model},
};

#[derive(Error, Debug)]
pub enum ReplayDetectorError {
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("检测记录解析错误: {0}")]
  ParseError(#[from] serde_json::Error),
  #[error("第 {0} 帧检测失败")]
  Unavailable(u64),
}

#[derive(Debug, Deserialize)]
struct ReplayFile {
  frames: Vec<Option<Vec<DetectItem>>>,
}

#[derive(Debug, Clone)]
pub struct ReplayDetector {
  frames: Vec<Option<DetectResult>>,
  looping: bool,
}

impl FromUrlWithScheme for ReplayDetector {
  const SCHEME: &'static str = "replay";
}

impl FromUrl for ReplayDetector {
  type Error = ReplayDetectorError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(ReplayDetectorError::SchemeMismatch(format!(
        "期望 '{}', 实际 '{}'",
        Self::SCHEME,
        url.scheme()
      )));
    }

    info!("加载检测记录: {}", url.path());
    let data = std::fs::read_to_string(url.path())?;
    let looping = url.query_pairs().any(|(k, _)| k == "loop");
    let detector = Self::from_json(&data)?.looping(looping);
    info!("检测记录共 {} 帧", detector.frames.len());
    Ok(detector)
  }
}

impl ReplayDetector {
  pub fn from_json(data: &str) -> Result<Self, ReplayDetectorError> {
    let file: ReplayFile = serde_json::from_str(data)?;
    let frames = file
      .frames
      .into_iter()
      .map(|items| items.map(DetectResult::from))
      .collect();
    Ok(Self {
      frames,
      looping: false,
    })
  }

  pub fn from_frames(frames: Vec<Option<DetectResult>>) -> Self {
    Self {
      frames,
      looping: false,
    }
  }

  /// 帧索引超出记录时从头循环
  pub fn looping(mut self, looping: bool) -> Self {
    self.looping = looping;
    self
  }

  fn lookup(&self, index: u64) -> Option<&Option<DetectResult>> {
    if self.frames.is_empty() {
      return None;
    }
    let slot = if self.looping {
      index % self.frames.len() as u64
    } else {
      index
    };
    self.frames.get(slot as usize)
  }
}

impl Model for ReplayDetector {
  type Input = Frame;
  type Output = DetectResult;
  type Error = ReplayDetectorError;

  fn infer(&self, input: &Frame) -> Result<DetectResult, ReplayDetectorError> {
    match self.lookup(input.index()) {
      Some(Some(result)) => {
        debug!("第 {} 帧回放 {} 个检测结果", input.index(), result.len());
        Ok(result.clone())
      }
      Some(None) => Err(ReplayDetectorError::Unavailable(input.index())),
      None => Ok(DetectResult::default()),
    }
  }
}
