//! 页面栅格化 - 基础设施层
//!
//! 把一份扫描版 PDF 变成按文档顺序排列的页面图像序列。
//!
//! 扫描件的每一页都是一张整页图片（XObject Image），这里直接取出每页面积
//! 最大的那张图片并解码，不做矢量渲染。
//!
//! - 解析 PDF 结构在 `load` 时完成，失败即 `DocumentError::Corrupt`
//! - 图像解码是惰性的：`pages()` 每次调用都从头开始，迭代到哪页才解码哪页
//! - 单页解码失败只影响该页（`DocumentError::PageDecode`）

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::DocumentError;

/// 一页栅格化后的图像
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 页码（从 1 开始）
    pub number: usize,
    pub image: DynamicImage,
}

impl PageImage {
    /// 截取页面顶部 `fraction` 比例的区域（身份信息所在的页眉）
    pub fn header_region(&self, fraction: f32) -> DynamicImage {
        let width = self.image.width();
        let height = self.image.height();
        let header_height = ((height as f32) * fraction.clamp(0.0, 1.0)).round() as u32;
        self.image.crop_imm(0, 0, width, header_height.clamp(1, height.max(1)))
    }
}

/// 页面中提取出的原始图像数据
#[derive(Debug, Clone)]
enum ImagePayload {
    Jpeg(Vec<u8>),
    Raw {
        width: u32,
        height: u32,
        channels: u8,
        pixels: Vec<u8>,
    },
}

#[derive(Debug, Clone)]
struct PageSource {
    number: usize,
    payload: Result<ImagePayload, String>,
}

/// 已解析的 PDF 文档
#[derive(Debug, Clone)]
pub struct RasterizedDocument {
    pages: Vec<PageSource>,
}

impl RasterizedDocument {
    /// 解析 PDF 字节
    ///
    /// 不是 PDF 时返回 `DocumentError::Corrupt`；页数为 0 的文档是合法的
    pub fn load(bytes: &[u8]) -> Result<Self, DocumentError> {
        let document = Document::load_mem(bytes).map_err(|source| DocumentError::Corrupt { source })?;

        let pages = document
            .get_pages()
            .into_iter()
            .enumerate()
            .map(|(idx, (_, page_id))| PageSource {
                number: idx + 1,
                payload: extract_page_payload(&document, page_id),
            })
            .collect();

        Ok(Self { pages })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// 惰性页面序列，可重复调用
    pub fn pages(&self) -> Pages<'_> {
        Pages {
            inner: self.pages.iter(),
        }
    }
}

/// 按文档顺序逐页解码的迭代器
pub struct Pages<'a> {
    inner: std::slice::Iter<'a, PageSource>,
}

impl<'a> Iterator for Pages<'a> {
    type Item = Result<PageImage, DocumentError>;

    fn next(&mut self) -> Option<Self::Item> {
        let source = self.inner.next()?;
        Some(decode_page(source))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for Pages<'_> {}

fn decode_page(source: &PageSource) -> Result<PageImage, DocumentError> {
    let page_error = |reason: String| DocumentError::PageDecode {
        page: source.number,
        reason,
    };

    let payload = source.payload.as_ref().map_err(|reason| page_error(reason.clone()))?;
    let image = decode_payload(payload).map_err(page_error)?;

    Ok(PageImage {
        number: source.number,
        image,
    })
}

fn decode_payload(payload: &ImagePayload) -> Result<DynamicImage, String> {
    match payload {
        ImagePayload::Jpeg(bytes) => {
            image::load_from_memory_with_format(bytes, image::ImageFormat::Jpeg)
                .map_err(|e| format!("JPEG 解码失败: {}", e))
        }
        ImagePayload::Raw {
            width,
            height,
            channels,
            pixels,
        } => match channels {
            1 => GrayImage::from_raw(*width, *height, pixels.clone())
                .map(DynamicImage::ImageLuma8)
                .ok_or_else(|| format!("灰度像素数量与尺寸 {}x{} 不符", width, height)),
            3 => RgbImage::from_raw(*width, *height, pixels.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(|| format!("RGB 像素数量与尺寸 {}x{} 不符", width, height)),
            other => Err(format!("不支持的通道数: {}", other)),
        },
    }
}

// ========== PDF 结构遍历 ==========

fn resolve<'a>(document: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => document.get_object(*id).ok(),
        other => Some(other),
    }
}

/// 取页面的 XObject 字典中面积最大的图片，并整理为可解码的数据
fn extract_page_payload(document: &Document, page_id: ObjectId) -> Result<ImagePayload, String> {
    let stream = largest_page_image(document, page_id).ok_or_else(|| "页面中没有扫描图像".to_string())?;
    stream_to_payload(stream)
}

fn largest_page_image(document: &Document, page_id: ObjectId) -> Option<&Stream> {
    let mut node_id = page_id;
    // Resources 可以从父节点继承
    for _ in 0..32 {
        let node = document.get_dictionary(node_id).ok()?;

        if let Some(resources) = node
            .get(b"Resources")
            .ok()
            .and_then(|r| resolve(document, r))
            .and_then(|r| r.as_dict().ok())
        {
            let xobjects = resources
                .get(b"XObject")
                .ok()
                .and_then(|x| resolve(document, x))
                .and_then(|x| x.as_dict().ok())?;

            return xobjects
                .iter()
                .filter_map(|(_, obj)| resolve(document, obj))
                .filter_map(|obj| obj.as_stream().ok())
                .filter(|stream| {
                    stream
                        .dict
                        .get(b"Subtype")
                        .ok()
                        .and_then(|s| s.as_name().ok())
                        == Some(b"Image".as_slice())
                })
                .max_by_key(|stream| {
                    let (w, h) = image_dimensions(stream).unwrap_or((0, 0));
                    u64::from(w) * u64::from(h)
                });
        }

        node_id = node.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn image_dimensions(stream: &Stream) -> Option<(u32, u32)> {
    let width = stream.dict.get(b"Width").ok()?.as_i64().ok()?;
    let height = stream.dict.get(b"Height").ok()?.as_i64().ok()?;
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

fn stream_filters(stream: &Stream) -> Vec<Vec<u8>> {
    match stream.dict.get(b"Filter") {
        Ok(Object::Name(name)) => vec![name.clone()],
        Ok(Object::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_name().ok().map(|n| n.to_vec()))
            .collect(),
        _ => Vec::new(),
    }
}

/// 逐层解开 FlateDecode
fn inflate(bytes: &[u8], layers: usize) -> Result<Vec<u8>, String> {
    let mut data = bytes.to_vec();
    for _ in 0..layers {
        data = Stream::new(dictionary! { "Filter" => "FlateDecode" }, data)
            .decompressed_content()
            .map_err(|e| format!("FlateDecode 解压失败: {}", e))?;
    }
    Ok(data)
}

fn unsupported_filters(filters: &[Vec<u8>]) -> String {
    let names: Vec<String> = filters.iter().map(|f| String::from_utf8_lossy(f).to_string()).collect();
    format!("不支持的图像编码: {}", names.join(", "))
}

fn stream_to_payload(stream: &Stream) -> Result<ImagePayload, String> {
    let filters = stream_filters(stream);
    let is_flate = |f: &Vec<u8>| f.as_slice() == b"FlateDecode";

    // DCTDecode 只能在最后一层，前面只接受 FlateDecode
    if let Some((last, outer)) = filters.split_last() {
        if last.as_slice() == b"DCTDecode" {
            if !outer.iter().all(is_flate) {
                return Err(unsupported_filters(&filters));
            }
            return Ok(ImagePayload::Jpeg(inflate(&stream.content, outer.len())?));
        }
    }

    if !filters.iter().all(is_flate) {
        return Err(unsupported_filters(&filters));
    }
    let pixels = inflate(&stream.content, filters.len())?;

    let (width, height) = image_dimensions(stream).ok_or_else(|| "图像缺少宽高".to_string())?;

    let bits = stream
        .dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|b| b.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        return Err(format!("不支持的位深: {}", bits));
    }

    let channels = match stream.dict.get(b"ColorSpace").ok().and_then(|c| c.as_name().ok()) {
        Some(b"DeviceGray") => 1,
        Some(b"DeviceRGB") => 3,
        Some(other) => return Err(format!("不支持的色彩空间: {}", String::from_utf8_lossy(other))),
        None => return Err("图像缺少色彩空间".to_string()),
    };

    Ok(ImagePayload::Raw {
        width,
        height,
        channels,
        pixels,
    })
}
