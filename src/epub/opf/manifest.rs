//! 清单模块
//!
//! 提供EPUB包中文件清单的结构定义，以及等待写入归档的内容描述。

use crate::epub::error::{EpubError, Result};
use crate::epub::markup::Element;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// EPUB 3.0核心媒体类型，其他类型必须提供fallback
pub const CORE_MEDIA_TYPES: &[&str] = &[
    "image/gif",
    "image/jpeg",
    "image/png",
    "image/svg+xml",
    "application/xhtml+xml",
    "application/x-dtbncx+xml",
    "application/vnd.ms-opentype",
    "application/font-woff",
    "application/smil+xml",
    "application/pls+xml",
    "audio/mpeg",
    "audio/mp4",
    "text/css",
    "text/javascript",
];

/// 检查媒体类型是否为核心媒体类型
pub fn is_core_media_type(media_type: &str) -> bool {
    CORE_MEDIA_TYPES.contains(&media_type)
}

/// 清单项属性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemProperty {
    CoverImage,
    Mathml,
    Nav,
    RemoteResources,
    Scripted,
    Svg,
    Switch,
}

impl ItemProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemProperty::CoverImage => "cover-image",
            ItemProperty::Mathml => "mathml",
            ItemProperty::Nav => "nav",
            ItemProperty::RemoteResources => "remote-resources",
            ItemProperty::Scripted => "scripted",
            ItemProperty::Svg => "svg",
            ItemProperty::Switch => "switch",
        }
    }
}

impl FromStr for ItemProperty {
    type Err = EpubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cover-image" => Ok(ItemProperty::CoverImage),
            "mathml" => Ok(ItemProperty::Mathml),
            "nav" => Ok(ItemProperty::Nav),
            "remote-resources" => Ok(ItemProperty::RemoteResources),
            "scripted" => Ok(ItemProperty::Scripted),
            "svg" => Ok(ItemProperty::Svg),
            "switch" => Ok(ItemProperty::Switch),
            other => Err(EpubError::invalid_attribute("properties", other, "不是允许的清单项属性")),
        }
    }
}

impl fmt::Display for ItemProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 清单项的待写入内容
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// 内联字节
    Inline(Vec<u8>),
    /// 磁盘上的源文件路径
    File(PathBuf),
}

impl Content {
    /// 由文本创建内联内容
    pub fn inline(text: impl Into<String>) -> Self {
        Content::Inline(text.into().into_bytes())
    }

    /// 由路径创建文件内容
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Content::File(path.into())
    }
}

/// 清单项信息
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestItem {
    /// 项目ID
    pub id: String,
    /// 文件路径(相对于OPF文件)
    pub href: String,
    /// 媒体类型
    pub media_type: String,
    /// 非核心媒体类型的替代项ID
    pub fallback: Option<String>,
    /// 属性(如nav、cover-image等)
    pub properties: Vec<ItemProperty>,
}

impl ManifestItem {
    /// 创建新的清单项
    pub fn new(id: impl Into<String>, href: impl Into<String>, media_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            href: href.into(),
            media_type: media_type.into(),
            fallback: None,
            properties: Vec::new(),
        }
    }

    /// 设置fallback
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    /// 设置属性列表
    pub fn with_properties(mut self, properties: Vec<ItemProperty>) -> Self {
        self.properties = properties;
        self
    }

    /// 检查是否包含指定属性
    pub fn has_property(&self, property: ItemProperty) -> bool {
        self.properties.contains(&property)
    }

    /// 检查是否为导航文档
    pub fn is_nav(&self) -> bool {
        self.has_property(ItemProperty::Nav)
    }

    /// 检查是否为核心媒体类型
    pub fn is_core_media_type(&self) -> bool {
        is_core_media_type(&self.media_type)
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("item")
            .with_attr("id", &self.id)
            .with_attr("href", &self.href)
            .with_attr("media-type", &self.media_type);
        if let Some(fallback) = &self.fallback {
            element.set_attr("fallback", fallback);
        }
        if !self.properties.is_empty() {
            let properties: Vec<&str> = self.properties.iter().map(|p| p.as_str()).collect();
            element.set_attr("properties", properties.join(" "));
        }
        element
    }
}
