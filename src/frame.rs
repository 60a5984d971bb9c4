// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/frame.rs - 视频帧定义
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

use image::RgbImage;

/// 一帧画面
///
/// `ready` 为 `false` 时表示该帧尚不可用于检测（例如解码失败），
/// 但它的尺寸仍然有效，动画照常推进。
#[derive(Debug, Clone)]
pub struct Frame {
  image: RgbImage,
  index: u64,
  ready: bool,
}

impl Frame {
  pub fn new(image: RgbImage, index: u64) -> Self {
    Self {
      image,
      index,
      ready: true,
    }
  }

  /// 构造一个尚未就绪的空白帧
  pub fn pending(width: u32, height: u32, index: u64) -> Self {
    Self {
      image: RgbImage::new(width, height),
      index,
      ready: false,
    }
  }

  pub fn image(&self) -> &RgbImage {
    &self.image
  }

  pub fn index(&self) -> u64 {
    self.index
  }

  pub fn width(&self) -> u32 {
    self.image.width()
  }

  pub fn height(&self) -> u32 {
    self.image.height()
  }

  pub fn dimensions(&self) -> (u32, u32) {
    self.image.dimensions()
  }

  pub fn is_ready(&self) -> bool {
    self.ready && self.width() > 0 && self.height() > 0
  }
}

impl From<RgbImage> for Frame {
  fn from(image: RgbImage) -> Self {
    Frame::new(image, 0)
  }
}
