//! 元数据模块
//!
//! 提供包文档元数据条目的结构定义。DCMES标签、属性和文字方向都是封闭枚举，
//! 字符串输入通过 `FromStr` 解析并在解析时报告错误。

use crate::epub::error::{EpubError, Result};
use crate::epub::markup::Element;
use std::fmt;
use std::str::FromStr;

/// Dublin Core元素命名空间
pub const DC_NAMESPACE: &str = "http://purl.org/dc/elements/1.1/";

/// 文字方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// 从左到右
    Ltr,
    /// 从右到左
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl FromStr for Direction {
    type Err = EpubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ltr" => Ok(Direction::Ltr),
            "rtl" => Ok(Direction::Rtl),
            other => Err(EpubError::invalid_attribute("dir", other, "只允许ltr或rtl")),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 允许的DCMES标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DcTag {
    Identifier,
    Title,
    Language,
    Contributor,
    Coverage,
    Creator,
    Date,
    Description,
    Format,
    Publisher,
    Relation,
    Rights,
    Source,
    Subject,
    Type,
}

/// 元数据属性种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Id,
    Lang,
    Dir,
}

impl AttributeKind {
    pub fn name(&self) -> &'static str {
        match self {
            AttributeKind::Id => "id",
            AttributeKind::Lang => "xml:lang",
            AttributeKind::Dir => "dir",
        }
    }
}

const ID_ONLY: &[AttributeKind] = &[AttributeKind::Id];
const ALL_ATTRIBUTES: &[AttributeKind] = &[AttributeKind::Id, AttributeKind::Lang, AttributeKind::Dir];

impl DcTag {
    /// 全部标签
    pub const ALL: [DcTag; 15] = [
        DcTag::Identifier,
        DcTag::Title,
        DcTag::Language,
        DcTag::Contributor,
        DcTag::Coverage,
        DcTag::Creator,
        DcTag::Date,
        DcTag::Description,
        DcTag::Format,
        DcTag::Publisher,
        DcTag::Relation,
        DcTag::Rights,
        DcTag::Source,
        DcTag::Subject,
        DcTag::Type,
    ];

    /// 带 `dc:` 前缀的元素名
    pub fn name(&self) -> &'static str {
        match self {
            DcTag::Identifier => "dc:identifier",
            DcTag::Title => "dc:title",
            DcTag::Language => "dc:language",
            DcTag::Contributor => "dc:contributor",
            DcTag::Coverage => "dc:coverage",
            DcTag::Creator => "dc:creator",
            DcTag::Date => "dc:date",
            DcTag::Description => "dc:description",
            DcTag::Format => "dc:format",
            DcTag::Publisher => "dc:publisher",
            DcTag::Relation => "dc:relation",
            DcTag::Rights => "dc:rights",
            DcTag::Source => "dc:source",
            DcTag::Subject => "dc:subject",
            DcTag::Type => "dc:type",
        }
    }

    /// 必需标签的基数为1或多个，其他为0、1或多个
    pub fn is_required(&self) -> bool {
        matches!(self, DcTag::Identifier | DcTag::Title | DcTag::Language)
    }

    /// 此标签允许的属性
    pub fn allowed_attributes(&self) -> &'static [AttributeKind] {
        match self {
            DcTag::Identifier | DcTag::Language => ID_ONLY,
            _ => ALL_ATTRIBUTES,
        }
    }
}

impl FromStr for DcTag {
    type Err = EpubError;

    /// 接受带或不带 `dc:` 前缀的名称
    fn from_str(s: &str) -> Result<Self> {
        let local = s.strip_prefix("dc:").unwrap_or(s);
        DcTag::ALL
            .iter()
            .copied()
            .find(|tag| &tag.name()[3..] == local)
            .ok_or_else(|| EpubError::UnknownTag(s.to_string()))
    }
}

impl fmt::Display for DcTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// DCMES元素的属性
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaAttribute {
    Id(String),
    Lang(String),
    Dir(Direction),
}

impl MetaAttribute {
    /// 从属性名和值解析，`dir` 的值会被校验
    pub fn parse(name: &str, value: &str) -> Result<Self> {
        match name {
            "id" => Ok(MetaAttribute::Id(value.to_string())),
            "xml:lang" => Ok(MetaAttribute::Lang(value.to_string())),
            "dir" => Ok(MetaAttribute::Dir(value.parse()?)),
            other => Err(EpubError::invalid_attribute(other, value, "未知的元数据属性")),
        }
    }

    pub fn kind(&self) -> AttributeKind {
        match self {
            MetaAttribute::Id(_) => AttributeKind::Id,
            MetaAttribute::Lang(_) => AttributeKind::Lang,
            MetaAttribute::Dir(_) => AttributeKind::Dir,
        }
    }

    fn value(&self) -> &str {
        match self {
            MetaAttribute::Id(v) | MetaAttribute::Lang(v) => v,
            MetaAttribute::Dir(d) => d.as_str(),
        }
    }
}

/// Dublin Core元数据元素
#[derive(Debug, Clone, PartialEq)]
pub struct DcElement {
    /// 标签
    pub tag: DcTag,
    /// 元素内容
    pub value: String,
    /// 元素ID
    pub id: Option<String>,
    /// 语言覆盖
    pub lang: Option<String>,
    /// 方向覆盖
    pub dir: Option<Direction>,
}

impl DcElement {
    /// 校验属性是否被标签允许，然后构造元素
    pub fn new(tag: DcTag, value: impl Into<String>, attributes: &[MetaAttribute]) -> Result<Self> {
        let mut element = Self {
            tag,
            value: value.into(),
            id: None,
            lang: None,
            dir: None,
        };

        for attribute in attributes {
            if !tag.allowed_attributes().contains(&attribute.kind()) {
                return Err(EpubError::invalid_attribute(
                    attribute.kind().name(),
                    attribute.value(),
                    format!("标签 {} 不允许此属性", tag),
                ));
            }
            match attribute {
                MetaAttribute::Id(id) => element.id = Some(id.clone()),
                MetaAttribute::Lang(lang) => element.lang = Some(lang.clone()),
                MetaAttribute::Dir(dir) => element.dir = Some(*dir),
            }
        }

        Ok(element)
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new(self.tag.name());
        if let Some(id) = &self.id {
            element.set_attr("id", id);
        }
        if let Some(lang) = &self.lang {
            element.set_attr("xml:lang", lang);
        }
        if let Some(dir) = self.dir {
            element.set_attr("dir", dir.as_str());
        }
        element.append_text(&self.value);
        element
    }
}

/// 基于property属性的meta元素，如 <meta property="dcterms:modified">2025-06-05T11:24:01Z</meta>
#[derive(Debug, Clone, PartialEq)]
pub struct MetaProperty {
    /// property属性值
    pub property: String,
    /// 标签内容
    pub value: String,
}

impl MetaProperty {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        Element::new("meta")
            .with_attr("property", &self.property)
            .with_text(&self.value)
    }
}

/// 元数据条目
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataEntry {
    /// Dublin Core元素
    DublinCore(DcElement),
    /// meta元素
    Meta(MetaProperty),
}

impl MetadataEntry {
    /// 如果是DC元素则返回引用
    pub fn as_dublin_core(&self) -> Option<&DcElement> {
        match self {
            MetadataEntry::DublinCore(element) => Some(element),
            MetadataEntry::Meta(_) => None,
        }
    }

    pub(crate) fn to_element(&self) -> Element {
        match self {
            MetadataEntry::DublinCore(element) => element.to_element(),
            MetadataEntry::Meta(meta) => meta.to_element(),
        }
    }
}
