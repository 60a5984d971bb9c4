// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/output.rs - 输出定义
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use crate::FromUrl;
#[cfg(any(feature = "save_image_file", feature = "directory_record"))]
use crate::FromUrlWithScheme;
use crate::frame::Frame;
use image::{DynamicImage, RgbImage, RgbaImage, imageops};
use thiserror::Error;
use url::Url;

/// 一帧渲染完成的叠加层
#[derive(Debug, Clone, Copy)]
pub struct Overlay<'a> {
  pub image: &'a RgbaImage,
  pub tick: u64,
  /// 绘制后仍在飞行中的激光数量
  pub beams: usize,
  /// 本帧命中目标的激光数量，这些激光在本帧绘制后已被移除
  pub hits: usize,
  /// 本帧绘制的检测框数量
  pub detections: usize,
}

impl Overlay<'_> {
  /// 将叠加层按 alpha 混合到帧画面上
  pub fn compose(&self, frame: &Frame) -> RgbImage {
    let mut base = DynamicImage::ImageRgb8(frame.image().clone()).to_rgba8();
    imageops::overlay(&mut base, self.image, 0, 0);
    DynamicImage::ImageRgba8(base).to_rgb8()
  }
}

pub trait Render<Frame>: Sized {
  type Error;
  fn render_result(&self, frame: &Frame, overlay: &Overlay<'_>) -> Result<(), Self::Error>;
}

pub mod canvas;
pub mod draw;

pub use self::canvas::ImageCanvas;
pub use self::draw::{DetectionOverlay, FontError, load_font};

#[cfg(feature = "save_image_file")]
mod save_image_file;
#[cfg(feature = "save_image_file")]
pub use self::save_image_file::{SaveImageFileError, SaveImageFileOutput};

#[cfg(feature = "directory_record")]
mod directory_record;
#[cfg(feature = "directory_record")]
pub use self::directory_record::{DirectoryRecordOutput, DirectoryRecordOutputError};

#[derive(Error, Debug)]
pub enum OutputError {
  #[cfg(feature = "save_image_file")]
  #[error("保存图像文件错误: {0}")]
  SaveImageFileError(#[from] SaveImageFileError),
  #[cfg(feature = "directory_record")]
  #[error("目录记录输出错误: {0}")]
  DirectoryRecordOutputError(#[from] DirectoryRecordOutputError),
  #[error("URI 方案不匹配")]
  SchemeMismatch,
}

pub enum OutputWrapper {
  #[cfg(feature = "save_image_file")]
  SaveImageFileOutput(SaveImageFileOutput),
  #[cfg(feature = "directory_record")]
  DirectoryRecordOutput(DirectoryRecordOutput),
}

impl FromUrl for OutputWrapper {
  type Error = OutputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    match url.scheme() {
      #[cfg(feature = "save_image_file")]
      SaveImageFileOutput::SCHEME => {
        let output = SaveImageFileOutput::from_url(url)?;
        Ok(OutputWrapper::SaveImageFileOutput(output))
      }
      #[cfg(feature = "directory_record")]
      DirectoryRecordOutput::SCHEME => {
        let output = DirectoryRecordOutput::from_url(url)?;
        Ok(OutputWrapper::DirectoryRecordOutput(output))
      }
      _ => Err(OutputError::SchemeMismatch),
    }
  }
}

impl Render<Frame> for OutputWrapper {
  type Error = OutputError;

  fn render_result(&self, frame: &Frame, overlay: &Overlay<'_>) -> Result<(), Self::Error> {
    match *self {
      #[cfg(feature = "save_image_file")]
      OutputWrapper::SaveImageFileOutput(ref output) => output
        .render_result(frame, overlay)
        .map_err(OutputError::from),
      #[cfg(feature = "directory_record")]
      OutputWrapper::DirectoryRecordOutput(ref output) => output
        .render_result(frame, overlay)
        .map_err(OutputError::from),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, Rgba};

  #[test]
  fn compose_blends_overlay_onto_frame() {
    let frame = Frame::new(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])), 0);
    let mut layer = RgbaImage::new(4, 4);
    layer.put_pixel(1, 1, Rgba([0, 255, 0, 255]));
    let overlay = Overlay {
      image: &layer,
      tick: 1,
      beams: 0,
      hits: 0,
      detections: 0,
    };
    let composed = overlay.compose(&frame);
    assert_eq!(*composed.get_pixel(1, 1), Rgb([0, 255, 0]));
    assert_eq!(*composed.get_pixel(0, 0), Rgb([10, 20, 30]));
  }

  #[test]
  fn unknown_scheme_is_rejected() {
    let url = Url::parse("rtsp://camera/stream").unwrap();
    assert!(matches!(
      OutputWrapper::from_url(&url),
      Err(OutputError::SchemeMismatch)
    ));
  }
}
