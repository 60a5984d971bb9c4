// 该文件是 Zhuque （朱雀） 项目的一部分。
// src/input/v4l_input.rs - V4L 摄像头输入
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use image::{ImageFormat, RgbImage};
use thiserror::Error;
use tracing::{error, info, warn};
use url::Url;
use v4l::{
  Device, FourCC,
  buffer::Type,
  io::{mmap::Stream, traits::CaptureStream},
  video::Capture,
};

use crate::{FromUrl, FromUrlWithScheme, frame::Frame};

const DEFAULT_DEVICE: &str = "/dev/video0";
const DEFAULT_WIDTH: u32 = 640;
const DEFAULT_HEIGHT: u32 = 480;
const BUFFER_COUNT: u32 = 4;

#[derive(Error, Debug)]
pub enum V4lInputError {
  #[error("URI schema mismatch")]
  SchemaMismatch,
  #[error("V4L error: {0}")]
  V4lError(#[from] std::io::Error),
  #[error("Invalid query parameter {0}: {1}")]
  InvalidParameter(&'static str, String),
  #[error("Unsupported pixel format: {0}")]
  UnsupportedPixelFormat(String),
}

/// 摄像头输出的像素格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
  Yuyv,
  Rgb3,
  Mjpg,
}

impl PixelFormat {
  fn from_fourcc(fourcc: FourCC) -> Option<Self> {
    match &fourcc.repr {
      b"YUYV" => Some(PixelFormat::Yuyv),
      b"RGB3" => Some(PixelFormat::Rgb3),
      b"MJPG" => Some(PixelFormat::Mjpg),
      _ => None,
    }
  }

  fn fourcc(self) -> FourCC {
    match self {
      PixelFormat::Yuyv => FourCC::new(b"YUYV"),
      PixelFormat::Rgb3 => FourCC::new(b"RGB3"),
      PixelFormat::Mjpg => FourCC::new(b"MJPG"),
    }
  }

  /// 把一帧原始数据转换为 RGB 图像，数据不完整时返回 `None`
  pub fn decode(self, data: &[u8], width: u32, height: u32) -> Option<RgbImage> {
    match self {
      PixelFormat::Yuyv => RgbImage::from_raw(width, height, yuyv_to_rgb(data, width, height)),
      PixelFormat::Rgb3 => {
        let len = (width * height * 3) as usize;
        RgbImage::from_raw(width, height, data.get(..len)?.to_vec())
      }
      PixelFormat::Mjpg => image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .ok()
        .map(|image| image.into_rgb8()),
    }
  }
}

impl std::str::FromStr for PixelFormat {
  type Err = V4lInputError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_uppercase().as_str() {
      "YUYV" => Ok(PixelFormat::Yuyv),
      "RGB3" => Ok(PixelFormat::Rgb3),
      "MJPG" => Ok(PixelFormat::Mjpg),
      other => Err(V4lInputError::UnsupportedPixelFormat(other.to_string())),
    }
  }
}

/// YUYV 4:2:2 转 RGB，每 4 字节对应两个像素
fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Vec<u8> {
  let pixels = (width * height) as usize;
  let mut rgb = Vec::with_capacity(pixels * 3);
  for chunk in yuyv.chunks_exact(4).take(pixels / 2) {
    let u = chunk[1] as f32 - 128.0;
    let v = chunk[3] as f32 - 128.0;
    for y in [chunk[0] as f32, chunk[2] as f32] {
      let r = (y + 1.402 * v).clamp(0.0, 255.0) as u8;
      let g = (y - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
      let b = (y + 1.772 * u).clamp(0.0, 255.0) as u8;
      rgb.extend_from_slice(&[r, g, b]);
    }
  }
  rgb
}

/// 请求的采集参数：`v4l:///dev/video0?width=640&height=480&format=YUYV`
#[derive(Debug, Clone, PartialEq)]
struct CaptureRequest {
  device: String,
  width: u32,
  height: u32,
  format: PixelFormat,
}

impl CaptureRequest {
  fn from_url(url: &Url) -> Result<Self, V4lInputError> {
    let device = match url.path() {
      "" | "/" => DEFAULT_DEVICE.to_string(),
      path => path.to_string(),
    };
    let mut request = Self {
      device,
      width: DEFAULT_WIDTH,
      height: DEFAULT_HEIGHT,
      format: PixelFormat::Yuyv,
    };
    for (key, value) in url.query_pairs() {
      match key.as_ref() {
        "width" => {
          request.width = value
            .parse()
            .map_err(|_| V4lInputError::InvalidParameter("width", value.to_string()))?
        }
        "height" => {
          request.height = value
            .parse()
            .map_err(|_| V4lInputError::InvalidParameter("height", value.to_string()))?
        }
        "format" => request.format = value.parse()?,
        _ => warn!("忽略未知参数: {}={}", key, value),
      }
    }
    Ok(request)
  }
}

/// V4L 摄像头，每次迭代采集一帧
///
/// 无法转换的缓冲区输出未就绪的帧；采集流出错（例如设备被拔出）时结束迭代。
pub struct V4lInput {
  stream: Stream<'static>,
  format: PixelFormat,
  width: u32,
  height: u32,
  index: u64,
}

impl FromUrlWithScheme for V4lInput {
  const SCHEME: &'static str = "v4l";
}

impl FromUrl for V4lInput {
  type Error = V4lInputError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != Self::SCHEME {
      error!(
        "URI scheme mismatch: expected '{}', found '{}'",
        Self::SCHEME,
        url.scheme()
      );
      return Err(V4lInputError::SchemaMismatch);
    }

    let request = CaptureRequest::from_url(url)?;
    let device = Device::with_path(&request.device)?;

    let mut format = device.format()?;
    format.width = request.width;
    format.height = request.height;
    format.fourcc = request.format.fourcc();
    let format = device.set_format(&format)?;
    let pixel_format = PixelFormat::from_fourcc(format.fourcc)
      .ok_or_else(|| V4lInputError::UnsupportedPixelFormat(format.fourcc.to_string()))?;

    let stream = Stream::with_buffers(&device, Type::VideoCapture, BUFFER_COUNT)?;
    info!(
      "打开摄像头 {}: {}x{} {}",
      request.device, format.width, format.height, format.fourcc
    );

    Ok(Self {
      stream,
      format: pixel_format,
      width: format.width,
      height: format.height,
      index: 0,
    })
  }
}

impl Iterator for V4lInput {
  type Item = Frame;

  fn next(&mut self) -> Option<Self::Item> {
    let (buffer, meta) = match self.stream.next() {
      Ok(captured) => captured,
      Err(e) => {
        error!("Failed to capture frame: {}", e);
        return None;
      }
    };
    let used = (meta.bytesused as usize).min(buffer.len());
    let frame = match self.format.decode(&buffer[..used], self.width, self.height) {
      Some(image) => Frame::new(image, self.index),
      None => {
        warn!("第 {} 帧缓冲区无法转换", self.index);
        Frame::pending(self.width, self.height, self.index)
      }
    };
    self.index += 1;
    Some(frame)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn yuyv_grey_maps_to_grey() {
    // Y = 128, U = V = 128 即中性灰
    let data = [128u8, 128, 128, 128].repeat(4);
    let image = PixelFormat::Yuyv.decode(&data, 4, 2).unwrap();
    assert!(image.pixels().all(|p| p.0 == [128, 128, 128]));
  }

  #[test]
  fn short_buffer_is_not_a_frame() {
    assert!(PixelFormat::Yuyv.decode(&[0u8; 6], 4, 2).is_none());
    assert!(PixelFormat::Rgb3.decode(&[0u8; 10], 2, 2).is_none());
    assert!(PixelFormat::Mjpg.decode(b"garbage", 2, 2).is_none());
    assert!(PixelFormat::Rgb3.decode(&[7u8; 12], 2, 2).is_some());
  }

  #[test]
  fn request_defaults_and_overrides() {
    let url = Url::parse("v4l://").unwrap();
    let request = CaptureRequest::from_url(&url).unwrap();
    assert_eq!(request.device, DEFAULT_DEVICE);
    assert_eq!((request.width, request.height), (640, 480));
    assert_eq!(request.format, PixelFormat::Yuyv);

    let url = Url::parse("v4l:///dev/video2?width=1280&height=720&format=mjpg").unwrap();
    let request = CaptureRequest::from_url(&url).unwrap();
    assert_eq!(request.device, "/dev/video2");
    assert_eq!((request.width, request.height), (1280, 720));
    assert_eq!(request.format, PixelFormat::Mjpg);
  }

  #[test]
  fn bad_parameters_are_rejected() {
    let url = Url::parse("v4l:///dev/video0?width=wide").unwrap();
    assert!(matches!(
      CaptureRequest::from_url(&url),
      Err(V4lInputError::InvalidParameter("width", _))
    ));
    let url = Url::parse("v4l:///dev/video0?format=NV12").unwrap();
    assert!(matches!(
      CaptureRequest::from_url(&url),
      Err(V4lInputError::UnsupportedPixelFormat(_))
    ));
  }

  #[test]
  fn other_schemes_are_rejected() {
    let url = Url::parse("image:///tmp/still.png").unwrap();
    assert!(matches!(
      V4lInput::from_url(&url),
      Err(V4lInputError::SchemaMismatch)
    ));
  }
}
