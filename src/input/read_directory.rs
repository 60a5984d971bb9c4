// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/input/read_directory.rs - 图像目录输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use crate::{FromUrl, FromUrlWithScheme, frame::Frame};

const IMAGE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "webp"];

#[derive(Error, Debug)]
pub enum DirectoryInputError {
  #[error("URI 方案不匹配")]
  SchemeMismatch,
  #[error("I/O 错误: {0}")]
  IoError(#[from] std::io::Error),
  #[error("目录中没有图像文件: {0}")]
  Empty(String),
  #[error("目录中没有可解码的图像: {0}")]
  Undecodable(String),
}

/// 按文件名顺序把目录中的图像作为连续帧输出
///
/// `folder:///path/to/frames?loop` 时播放完后从头开始。
/// 无法解码的文件输出一个未就绪的帧，尺寸沿用上一帧。
pub struct DirectoryInput {
  files: Vec<PathBuf>,
  looping: bool,
  cursor: usize,
  index: u64,
  last_size: (u32, u32),
}

impl FromUrlWithScheme for DirectoryInput {
  const SCHEME: &'static str = "folder";
}

impl FromUrl for DirectoryInput {
  type Error = DirectoryInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      return Err(DirectoryInputError::SchemeMismatch);
    }
    let looping = url.query_pairs().any(|(k, _)| k == "loop");
    Self::open(url.path(), looping)
  }
}

fn is_image(path: &Path) -> bool {
  path
    .extension()
    .and_then(|e| e.to_str())
    .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
    .unwrap_or(false)
}

impl DirectoryInput {
  pub fn open(directory: impl AsRef<Path>, looping: bool) -> Result<Self, DirectoryInputError> {
    let directory = directory.as_ref();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(directory)? {
      let path = entry?.path();
      if path.is_file() && is_image(&path) {
        files.push(path);
      }
    }
    if files.is_empty() {
      return Err(DirectoryInputError::Empty(directory.display().to_string()));
    }
    files.sort();
    info!("目录 {} 中共 {} 帧图像", directory.display(), files.len());

    // 未就绪帧沿用上一帧的尺寸，开头的坏文件则使用第一张可读图像的尺寸
    let last_size = files
      .iter()
      .find_map(|path| image::image_dimensions(path).ok())
      .ok_or_else(|| DirectoryInputError::Undecodable(directory.display().to_string()))?;

    Ok(Self {
      files,
      looping,
      cursor: 0,
      index: 0,
      last_size,
    })
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  fn load(&mut self, path: &Path) -> Frame {
    let decoded = ImageReader::open(path)
      .map_err(image::ImageError::IoError)
      .and_then(|reader| reader.with_guessed_format().map_err(image::ImageError::IoError))
      .and_then(|reader| reader.decode());
    match decoded {
      Ok(image) => {
        let image = image.into_rgb8();
        self.last_size = image.dimensions();
        Frame::new(image, self.index)
      }
      Err(e) => {
        warn!("无法读取帧 {}: {}", path.display(), e);
        let (width, height) = self.last_size;
        Frame::pending(width, height, self.index)
      }
    }
  }
}

impl Iterator for DirectoryInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    if self.cursor >= self.files.len() {
      if !self.looping {
        return None;
      }
      self.cursor = 0;
    }
    let path = self.files[self.cursor].clone();
    self.cursor += 1;
    let frame = self.load(&path);
    self.index += 1;
    Some(frame)
  }
}
