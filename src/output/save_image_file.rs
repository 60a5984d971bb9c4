// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::Path;

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
  FromUrl, FromUrlWithScheme,
  frame::Frame,
  output::{Overlay, Render},
};

/// 每一帧都覆盖写入同一个文件，文件内容始终是最新画面
pub struct SaveImageFileOutput {
  path: String,
}

#[derive(Error, Debug)]
pub enum SaveImageFileError {
  #[error("I/O 错误: {0}")]
  IoError(std::io::Error),
  #[error("图像错误: {0}")]
  ImageError(image::ImageError),
  #[error("URI 方案不匹配: {0}")]
  SchemeMismatch(String),
}

impl FromUrlWithScheme for SaveImageFileOutput {
  const SCHEME: &'static str = "image";
}

impl FromUrl for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn from_url(uri: &Url) -> Result<Self, Self::Error> {
    if uri.scheme() != Self::SCHEME {
      return Err(SaveImageFileError::SchemeMismatch(format!(
        "期望保存方式 '{}', 实际保存方式 '{}'",
        Self::SCHEME,
        uri.scheme()
      )));
    }

    Ok(SaveImageFileOutput {
      path: uri.path().to_string(),
    })
  }
}

impl SaveImageFileOutput {
  pub fn path(&self) -> &str {
    &self.path
  }

  fn save_image(&self, image: image::RgbImage) -> Result<(), SaveImageFileError> {
    if let Some(parent) = Path::new(&self.path).parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent).map_err(SaveImageFileError::IoError)?;
    }

    image
      .save(&self.path)
      .map_err(SaveImageFileError::ImageError)?;

    debug!("保存图像到文件: {}", self.path);

    Ok(())
  }
}

impl Render<Frame> for SaveImageFileOutput {
  type Error = SaveImageFileError;

  fn render_result(&self, frame: &Frame, overlay: &Overlay<'_>) -> Result<(), Self::Error> {
    self.save_image(overlay.compose(frame))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage, RgbaImage};

  #[test]
  fn writes_composited_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("latest.png");
    let url = Url::parse(&format!("image://{}", path.display())).unwrap();
    let output = SaveImageFileOutput::from_url(&url).unwrap();

    let frame = Frame::new(RgbImage::from_pixel(8, 6, Rgb([1, 2, 3])), 0);
    let layer = RgbaImage::new(8, 6);
    let overlay = Overlay {
      image: &layer,
      tick: 1,
      beams: 0,
      hits: 0,
      detections: 0,
    };
    output.render_result(&frame, &overlay).unwrap();

    let saved = image::open(&path).unwrap().to_rgb8();
    assert_eq!(saved.dimensions(), (8, 6));
    assert_eq!(*saved.get_pixel(3, 3), Rgb([1, 2, 3]));
  }
}
