// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/input/read_image_file.rs - 图像文件输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use crate::{FromUrl, FromUrlWithScheme, frame::Frame};

use image::{ImageReader, RgbImage};
use thiserror::Error;
use tracing::{error, info};
use url::Url;

#[derive(Error, Debug)]
pub enum ImageFileInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Image loading error: {0}")]
  ImageLoadError(#[from] image::ImageError),
  #[error("Invalid repeat count: {0}")]
  InvalidRepeat(String),
}

/// 一张静态图片，按需重复作为连续的帧输出
///
/// `image:///path/to/still.png?repeat=60`，不指定 `repeat` 时无限重复。
pub struct ImageFileInput {
  image: RgbImage,
  repeat: Option<u64>,
  index: u64,
}

impl FromUrlWithScheme for ImageFileInput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for ImageFileInput {
  type Error = ImageFileInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(ImageFileInputError::SchemaMismatch);
    }

    let repeat = match url.query_pairs().find(|(k, _)| k == "repeat") {
      Some((_, v)) => Some(
        v.parse::<u64>()
          .map_err(|_| ImageFileInputError::InvalidRepeat(v.to_string()))?,
      ),
      None => None,
    };

    let path = url.path();
    let image = ImageReader::open(path)?.decode()?.into_rgb8();
    info!(
      "读取图像 {}: {}x{}",
      path,
      image.width(),
      image.height()
    );

    Ok(Self::new(image, repeat))
  }
}

impl ImageFileInput {
  pub fn new(image: RgbImage, repeat: Option<u64>) -> Self {
    Self {
      image,
      repeat,
      index: 0,
    }
  }
}

impl Iterator for ImageFileInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    if self.repeat.is_some_and(|n| self.index >= n) {
      return None;
    }
    let frame = Frame::new(self.image.clone(), self.index);
    self.index += 1;
    Some(frame)
  }
}
