//! 脊柱模块
//!
//! 提供EPUB包中阅读顺序（脊柱）的结构定义。

use crate::epub::error::{EpubError, Result};
use crate::epub::markup::Element;
use std::fmt;
use std::str::FromStr;

/// 脊柱项属性，左右跨页互斥
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadProperty {
    PageSpreadLeft,
    PageSpreadRight,
}

impl SpreadProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpreadProperty::PageSpreadLeft => "page-spread-left",
            SpreadProperty::PageSpreadRight => "page-spread-right",
        }
    }
}

impl FromStr for SpreadProperty {
    type Err = EpubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "page-spread-left" => Ok(SpreadProperty::PageSpreadLeft),
            "page-spread-right" => Ok(SpreadProperty::PageSpreadRight),
            other => Err(EpubError::invalid_attribute("properties", other, "不是允许的脊柱项属性")),
        }
    }
}

impl fmt::Display for SpreadProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 脊柱项信息(阅读顺序)
#[derive(Debug, Clone, PartialEq)]
pub struct SpineItemref {
    /// 引用的清单项ID
    pub idref: String,
    /// 是否线性阅读
    pub linear: bool,
    /// 元素ID
    pub id: Option<String>,
    /// 跨页属性
    pub properties: Vec<SpreadProperty>,
}

impl SpineItemref {
    /// 创建新的脊柱项
    pub fn new(idref: impl Into<String>) -> Self {
        Self {
            idref: idref.into(),
            linear: true,
            id: None,
            properties: Vec::new(),
        }
    }

    /// 创建非线性的脊柱项
    pub fn new_non_linear(idref: impl Into<String>) -> Self {
        Self::new(idref).with_linear(false)
    }

    /// 指定线性属性
    pub fn with_linear(mut self, linear: bool) -> Self {
        self.linear = linear;
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_properties(mut self, properties: Vec<SpreadProperty>) -> Self {
        self.properties = properties;
        self
    }

    /// 检查是否为线性阅读
    pub fn is_linear(&self) -> bool {
        self.linear
    }

    /// 检查本次请求的属性是否同时包含左右跨页
    pub(crate) fn check_spread_conflict(&self) -> Result<()> {
        let left = self.properties.contains(&SpreadProperty::PageSpreadLeft);
        let right = self.properties.contains(&SpreadProperty::PageSpreadRight);
        if left && right {
            return Err(EpubError::ConflictingProperties(format!(
                "脊柱项 {} 不能同时设置page-spread-left和page-spread-right",
                self.idref
            )));
        }
        Ok(())
    }

    pub(crate) fn to_element(&self) -> Element {
        let mut element = Element::new("itemref")
            .with_attr("idref", &self.idref)
            .with_attr("linear", if self.linear { "yes" } else { "no" });
        if let Some(id) = &self.id {
            element.set_attr("id", id);
        }
        if !self.properties.is_empty() {
            let properties: Vec<&str> = self.properties.iter().map(|p| p.as_str()).collect();
            element.set_attr("properties", properties.join(" "));
        }
        element
    }
}
