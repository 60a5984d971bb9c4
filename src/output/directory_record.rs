// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/output/directory_record.rs - 目录记录输出
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use chrono::{Datelike, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU16, Ordering};
use thiserror::Error;
use tracing::debug;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  output::{Overlay, Render},
};

#[derive(Error, Debug)]
pub enum DirectoryRecordOutputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("图像错误: {0}")]
  ImageError(#[from] image::ImageError),
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("记录序列化错误: {0}")]
  SerializeError(#[from] serde_json::Error),
}

/// 与画面同名的 JSON 旁注
#[derive(Debug, Serialize)]
struct Record {
  tick: u64,
  frame: u64,
  beams: usize,
  hits: usize,
  detections: usize,
}

impl Record {
  fn save(&self, path: &Path) -> Result<(), DirectoryRecordOutputError> {
    let data = serde_json::to_string_pretty(self)?;
    std::fs::write(path.with_extension("json"), data)?;
    Ok(())
  }
}

/// 按日期分目录保存画面：`<dir>/YYYY/MM/DD/HH-MM-SS-XXXX.png`
///
/// 默认只保存有激光在飞行或命中的帧，`always` 时保存每一帧；
/// `record` 时额外写入 JSON 旁注。
pub struct DirectoryRecordOutput {
  directory: PathBuf,
  frame_counter: AtomicU16,
  always: bool,
  record: bool,
}

impl FromUrlWithScheme for DirectoryRecordOutput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn from_url(uri: &url::Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(DirectoryRecordOutputError::SchemeMismatch);
    }

    let always = uri.query_pairs().any(|(k, _)| k == "always");
    let record = uri.query_pairs().any(|(k, _)| k == "record");

    Ok(DirectoryRecordOutput {
      directory: PathBuf::from(uri.path()),
      frame_counter: AtomicU16::new(0),
      always,
      record,
    })
  }
}

impl DirectoryRecordOutput {
  fn frame_id(&self) -> u16 {
    self.frame_counter.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
  }

  fn frame_path(&self) -> Result<PathBuf, DirectoryRecordOutputError> {
    let now = Utc::now();
    let directory = self
      .directory
      .join(now.year().to_string())
      .join(format!("{:02}", now.month()))
      .join(format!("{:02}", now.day()));
    if !directory.exists() {
      std::fs::create_dir_all(&directory)?;
    }

    Ok(directory.join(format!(
      "{}-{:04X}.png",
      now.format("%H-%M-%S"),
      self.frame_id()
    )))
  }
}

impl Render<Frame> for DirectoryRecordOutput {
  type Error = DirectoryRecordOutputError;

  fn render_result(&self, frame: &Frame, overlay: &Overlay<'_>) -> Result<(), Self::Error> {
    // 命中帧上的激光已被移除，但仍绘制了最后一笔与火花
    if !self.always && overlay.beams == 0 && overlay.hits == 0 {
      return Ok(());
    }

    let path = self.frame_path()?;
    overlay.compose(frame).save(&path)?;
    if self.record {
      Record {
        tick: overlay.tick,
        frame: frame.index(),
        beams: overlay.beams,
        hits: overlay.hits,
        detections: overlay.detections,
      }
      .save(&path)?;
    }
    debug!("记录第 {} 帧到: {}", overlay.tick, path.display());
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{RgbImage, RgbaImage};
  use url::Url;

  fn files_with_extension(root: &Path, ext: &str) -> usize {
    let mut count = 0;
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
      for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
          stack.push(path);
        } else if path.extension().is_some_and(|e| e == ext) {
          count += 1;
        }
      }
    }
    count
  }

  fn render(output: &DirectoryRecordOutput, beams: usize) {
    render_hits(output, beams, 0);
  }

  fn render_hits(output: &DirectoryRecordOutput, beams: usize, hits: usize) {
    let frame = Frame::new(RgbImage::new(4, 4), 0);
    let layer = RgbaImage::new(4, 4);
    let overlay = Overlay {
      image: &layer,
      tick: 1,
      beams,
      hits,
      detections: 0,
    };
    output.render_result(&frame, &overlay).unwrap();
  }

  #[test]
  fn skips_idle_frames_unless_always() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    render(&output, 0);
    assert_eq!(files_with_extension(dir.path(), "png"), 0);
    render(&output, 2);
    assert_eq!(files_with_extension(dir.path(), "png"), 1);

    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}?always", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    render(&output, 0);
    render(&output, 0);
    assert_eq!(files_with_extension(dir.path(), "png"), 2);
  }

  #[test]
  fn saves_the_frame_where_the_last_beam_hits() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}?record", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    render_hits(&output, 0, 1);
    assert_eq!(files_with_extension(dir.path(), "png"), 1);
    render_hits(&output, 0, 0);
    assert_eq!(files_with_extension(dir.path(), "png"), 1);
  }

  #[test]
  fn record_writes_json_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let url = Url::parse(&format!("folder://{}?record", dir.path().display())).unwrap();
    let output = DirectoryRecordOutput::from_url(&url).unwrap();
    render(&output, 3);
    assert_eq!(files_with_extension(dir.path(), "png"), 1);
    assert_eq!(files_with_extension(dir.path(), "json"), 1);
  }
}
