//! 包文档模块
//!
//! `Package` 持有一个EPUB 3.0包文档的全部状态：package属性、元数据、清单、脊柱，
//! 以及以href为键的待写入内容表。所有修改都是同步的本地操作。

use crate::epub::error::{EpubError, Result};
use crate::epub::markup::Element;
use crate::epub::opf::manifest::{Content, ManifestItem};
use crate::epub::opf::metadata::{
    DC_NAMESPACE, DcElement, DcTag, Direction, MetaAttribute, MetaProperty, MetadataEntry,
};
use crate::epub::opf::spine::SpineItemref;
use crate::epub::opf::validator;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Component, Path};
use tracing::debug;

/// OPF命名空间
pub const OPF_NAMESPACE: &str = "http://www.idpf.org/2007/opf";
/// 默认唯一标识符元素ID
pub const DEFAULT_UNIQUE_IDENTIFIER: &str = "pub-id";
/// 包文档版本
pub const DEFAULT_VERSION: &str = "3.0";
/// 默认语言
pub const DEFAULT_LANGUAGE: &str = "en";
/// 默认标题
pub const DEFAULT_TITLE: &str = "Default Title";
/// 最后修改时间的meta property
pub const MODIFIED_PROPERTY: &str = "dcterms:modified";

/// 包文档模型
#[derive(Debug, Clone)]
pub struct Package {
    version: String,
    language: String,
    direction: Option<Direction>,
    unique_identifier: String,
    prefix: Option<String>,
    metadata: Vec<MetadataEntry>,
    manifest: Vec<ManifestItem>,
    spine: Vec<SpineItemref>,
    spine_toc: Option<String>,
    /// 待写入内容表，键为清单项href
    pending: HashMap<String, Content>,
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

impl Package {
    /// 创建带默认标识符、标题、语言和修改时间的包文档
    pub fn new() -> Self {
        let identifier = DcElement {
            tag: DcTag::Identifier,
            value: format!("urn:uuid:{}", uuid::Uuid::new_v4()),
            id: Some(DEFAULT_UNIQUE_IDENTIFIER.to_string()),
            lang: None,
            dir: None,
        };
        let title = DcElement {
            tag: DcTag::Title,
            value: DEFAULT_TITLE.to_string(),
            id: None,
            lang: None,
            dir: None,
        };
        let language = DcElement {
            tag: DcTag::Language,
            value: DEFAULT_LANGUAGE.to_string(),
            id: None,
            lang: None,
            dir: None,
        };

        Self {
            version: DEFAULT_VERSION.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            direction: None,
            unique_identifier: DEFAULT_UNIQUE_IDENTIFIER.to_string(),
            prefix: None,
            metadata: vec![
                MetadataEntry::DublinCore(identifier),
                MetadataEntry::Meta(MetaProperty::new(MODIFIED_PROPERTY, format_timestamp(Utc::now()))),
                MetadataEntry::DublinCore(title),
                MetadataEntry::DublinCore(language),
            ],
            manifest: Vec::new(),
            spine: Vec::new(),
            spine_toc: None,
            pending: HashMap::new(),
        }
    }

    // === package元素 ===

    pub fn version(&self) -> &str {
        &self.version
    }

    /// 设置包文档版本
    pub fn set_version(&mut self, version: &str) -> Result<()> {
        require_non_empty("version", version)?;
        self.version = version.to_string();
        Ok(())
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// 设置package的xml:lang
    pub fn set_language(&mut self, language: &str) -> Result<()> {
        require_non_empty("xml:lang", language)?;
        self.language = language.to_string();
        Ok(())
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = Some(direction);
    }

    pub fn clear_direction(&mut self) {
        self.direction = None;
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// 设置额外的前缀映射，如 "foaf: http://xmlns.com/foaf/spec/"
    pub fn set_prefix(&mut self, prefix: &str) {
        self.prefix = Some(prefix.to_string());
    }

    pub fn clear_prefix(&mut self) {
        self.prefix = None;
    }

    pub fn unique_identifier(&self) -> &str {
        &self.unique_identifier
    }

    /// 设置唯一标识符引用，并同步修改当前持有该ID的元数据元素
    pub fn set_unique_identifier(&mut self, identifier: &str) -> Result<()> {
        require_non_empty("unique-identifier", identifier)?;

        let current = self.unique_identifier.clone();
        if let Some(element) = self
            .dublin_core_mut()
            .find(|e| e.id.as_deref() == Some(current.as_str()))
        {
            element.id = Some(identifier.to_string());
        }

        debug!(from = %current, to = %identifier, "更新unique-identifier");
        self.unique_identifier = identifier.to_string();
        Ok(())
    }

    // === 元数据 ===

    /// 添加DCMES元素，允许同一标签出现多次
    pub fn add_metadata(
        &mut self,
        tag: DcTag,
        value: &str,
        attributes: &[MetaAttribute],
    ) -> Result<&DcElement> {
        let element = DcElement::new(tag, value, attributes)?;
        debug!(tag = %tag, value, "添加元数据");
        self.metadata.push(MetadataEntry::DublinCore(element));
        Ok(self.last_dublin_core())
    }

    /// 设置DCMES元素
    ///
    /// 对必需标签保证之后恰好存在一个实例：原位替换第一个，不存在时追加。
    /// `dc:identifier` 的id总是被强制为当前的唯一标识符引用。
    ///
    /// 注意：对于非必需标签，此方法退化为 [`Package::add_metadata`]，
    /// 不会删除已有的同名元素。
    pub fn set_metadata(
        &mut self,
        tag: DcTag,
        value: &str,
        attributes: &[MetaAttribute],
    ) -> Result<&DcElement> {
        let mut attributes = attributes.to_vec();
        if tag == DcTag::Identifier {
            attributes.retain(|a| !matches!(a, MetaAttribute::Id(_)));
            attributes.push(MetaAttribute::Id(self.unique_identifier.clone()));
        }

        if !tag.is_required() {
            return self.add_metadata(tag, value, &attributes);
        }

        let element = DcElement::new(tag, value, &attributes)?;
        self.remove_metadata_by_tag(tag);

        debug!(tag = %tag, value, "设置元数据");
        match self.position_of_tag(tag) {
            Some(index) => {
                self.metadata[index] = MetadataEntry::DublinCore(element);
                match &self.metadata[index] {
                    MetadataEntry::DublinCore(element) => Ok(element),
                    MetadataEntry::Meta(_) => unreachable!("刚写入的是DC元素"),
                }
            }
            None => {
                self.metadata.push(MetadataEntry::DublinCore(element));
                Ok(self.last_dublin_core())
            }
        }
    }

    /// 删除指定标签的所有元素，必需标签保留第一个
    pub fn remove_metadata_by_tag(&mut self, tag: DcTag) -> Vec<DcElement> {
        let keep = if tag.is_required() { 1 } else { 0 };
        let mut seen = 0;
        let mut removed = Vec::new();

        let entries = std::mem::take(&mut self.metadata);
        for entry in entries {
            match entry {
                MetadataEntry::DublinCore(element) if element.tag == tag => {
                    seen += 1;
                    if seen > keep {
                        removed.push(element);
                    } else {
                        self.metadata.push(MetadataEntry::DublinCore(element));
                    }
                }
                other => self.metadata.push(other),
            }
        }

        if !removed.is_empty() {
            debug!(tag = %tag, count = removed.len(), "删除元数据");
        }
        removed
    }

    /// 按ID删除元数据元素
    ///
    /// 唯一标识符元素受保护；ID不存在或不唯一时返回 `Ok(None)`。
    pub fn remove_metadata_by_id(&mut self, id: &str) -> Result<Option<DcElement>> {
        if id == self.unique_identifier {
            return Err(EpubError::ProtectedIdentifier(id.to_string()));
        }

        let matches: Vec<usize> = self
            .metadata
            .iter()
            .enumerate()
            .filter(|(_, entry)| {
                entry
                    .as_dublin_core()
                    .is_some_and(|e| e.id.as_deref() == Some(id))
            })
            .map(|(index, _)| index)
            .collect();

        if matches.len() != 1 {
            return Ok(None);
        }

        match self.metadata.remove(matches[0]) {
            MetadataEntry::DublinCore(element) => {
                debug!(id, tag = %element.tag, "按ID删除元数据");
                Ok(Some(element))
            }
            MetadataEntry::Meta(_) => Ok(None),
        }
    }

    /// 获取指定标签的全部元素
    pub fn metadata_by_tag(&self, tag: DcTag) -> Vec<&DcElement> {
        self.dublin_core().filter(|e| e.tag == tag).collect()
    }

    /// 按ID获取元数据元素，只有恰好一个匹配时才返回
    pub fn metadata_by_id(&self, id: &str) -> Option<&DcElement> {
        let mut matches = self.dublin_core().filter(|e| e.id.as_deref() == Some(id));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first)
    }

    /// 将指定标签的所有元素值用分隔符连接
    pub fn metadata_string(&self, tag: DcTag, separator: &str) -> String {
        self.metadata_by_tag(tag)
            .iter()
            .map(|e| e.value.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// 全部元数据条目（文档顺序）
    pub fn metadata(&self) -> &[MetadataEntry] {
        &self.metadata
    }

    /// dcterms:modified的值
    pub fn modified(&self) -> Option<&str> {
        self.metadata.iter().find_map(|entry| match entry {
            MetadataEntry::Meta(meta) if meta.property == MODIFIED_PROPERTY => Some(meta.value.as_str()),
            _ => None,
        })
    }

    /// 更新dcterms:modified，格式为CCYY-MM-DDThh:mm:ssZ
    pub fn set_modified(&mut self, timestamp: DateTime<Utc>) {
        let value = format_timestamp(timestamp);
        let existing = self.metadata.iter_mut().find_map(|entry| match entry {
            MetadataEntry::Meta(meta) if meta.property == MODIFIED_PROPERTY => Some(meta),
            _ => None,
        });
        match existing {
            Some(meta) => meta.value = value,
            None => self
                .metadata
                .push(MetadataEntry::Meta(MetaProperty::new(MODIFIED_PROPERTY, value))),
        }
    }

    fn dublin_core(&self) -> impl Iterator<Item = &DcElement> {
        self.metadata.iter().filter_map(MetadataEntry::as_dublin_core)
    }

    fn dublin_core_mut(&mut self) -> impl Iterator<Item = &mut DcElement> {
        self.metadata.iter_mut().filter_map(|entry| match entry {
            MetadataEntry::DublinCore(element) => Some(element),
            MetadataEntry::Meta(_) => None,
        })
    }

    fn position_of_tag(&self, tag: DcTag) -> Option<usize> {
        self.metadata
            .iter()
            .position(|entry| entry.as_dublin_core().is_some_and(|e| e.tag == tag))
    }

    fn last_dublin_core(&self) -> &DcElement {
        match self.metadata.last() {
            Some(MetadataEntry::DublinCore(element)) => element,
            _ => unreachable!("刚追加的是DC元素"),
        }
    }

    // === 清单 ===

    /// 添加清单项并在待写入内容表中记录其内容
    ///
    /// 任何校验失败都不会修改清单。
    pub fn add_manifest_item(&mut self, item: ManifestItem, content: Content) -> Result<&ManifestItem> {
        require_non_empty("id", &item.id)?;
        require_non_empty("href", &item.href)?;
        require_relative_href(&item.href)?;
        require_non_empty("media-type", &item.media_type)?;

        if self.manifest_item(&item.id).is_some() {
            return Err(EpubError::invalid_attribute("id", &item.id, "清单项ID已存在"));
        }
        if self.manifest.iter().any(|existing| existing.href == item.href) {
            return Err(EpubError::invalid_attribute("href", &item.href, "清单项href已存在"));
        }

        match &item.fallback {
            None if !item.is_core_media_type() => {
                return Err(EpubError::UnknownFallback {
                    item: item.id.clone(),
                    fallback: None,
                });
            }
            Some(fallback) if self.manifest_item(fallback).is_none() => {
                return Err(EpubError::UnknownFallback {
                    item: item.id.clone(),
                    fallback: Some(fallback.clone()),
                });
            }
            _ => {}
        }

        if let Content::File(path) = &content {
            if !path.is_file() {
                return Err(EpubError::SourceFileMissing(path.clone()));
            }
        }

        debug!(id = %item.id, href = %item.href, media_type = %item.media_type, "添加清单项");
        self.pending.insert(item.href.clone(), content);
        self.manifest.push(item);
        Ok(&self.manifest[self.manifest.len() - 1])
    }

    /// 按ID删除清单项，待写入内容表中的记录保留
    pub fn remove_manifest_item(&mut self, id: &str) -> Option<ManifestItem> {
        let index = self.manifest.iter().position(|item| item.id == id)?;
        debug!(id, "删除清单项");
        Some(self.manifest.remove(index))
    }

    /// 全部清单项
    pub fn manifest_items(&self) -> &[ManifestItem] {
        &self.manifest
    }

    /// 根据ID获取清单项
    pub fn manifest_item(&self, id: &str) -> Option<&ManifestItem> {
        self.manifest.iter().find(|item| item.id == id)
    }

    /// 获取href对应的待写入内容
    pub fn pending_content(&self, href: &str) -> Option<&Content> {
        self.pending.get(href)
    }

    // === 脊柱 ===

    /// 添加脊柱项
    ///
    /// 左右跨页互斥只针对本次请求的属性列表检查，不会与其他脊柱项比较。
    pub fn add_spine_itemref(&mut self, itemref: SpineItemref) -> Result<&SpineItemref> {
        if self.manifest_item(&itemref.idref).is_none() {
            return Err(EpubError::UnknownIdref(itemref.idref.clone()));
        }
        itemref.check_spread_conflict()?;

        debug!(idref = %itemref.idref, linear = itemref.linear, "添加脊柱项");
        self.spine.push(itemref);
        Ok(&self.spine[self.spine.len() - 1])
    }

    /// 全部脊柱项（阅读顺序）
    pub fn spine_itemrefs(&self) -> &[SpineItemref] {
        &self.spine
    }

    /// 脊柱的toc属性
    pub fn spine_toc(&self) -> Option<&str> {
        self.spine_toc.as_deref()
    }

    pub(crate) fn set_spine_toc(&mut self, toc: &str) {
        self.spine_toc = Some(toc.to_string());
    }

    // === 校验与序列化 ===

    /// 校验包文档结构，遇到第一个违规即返回
    pub fn validate(&self) -> Result<()> {
        validator::validate(self)
    }

    /// 构建包文档的标记树
    pub fn to_element(&self) -> Element {
        let mut package = Element::new("package")
            .with_attr("xmlns", OPF_NAMESPACE)
            .with_attr("id", "package")
            .with_attr("version", &self.version)
            .with_attr("xml:lang", &self.language)
            .with_attr("unique-identifier", &self.unique_identifier);
        if let Some(dir) = self.direction {
            package.set_attr("dir", dir.as_str());
        }
        if let Some(prefix) = &self.prefix {
            package.set_attr("prefix", prefix);
        }

        let mut metadata = Element::new("metadata")
            .with_attr("xmlns:dc", DC_NAMESPACE)
            .with_attr("id", "metadata");
        for entry in &self.metadata {
            metadata.append(entry.to_element());
        }

        let mut manifest = Element::new("manifest").with_attr("id", "manifest");
        for item in &self.manifest {
            manifest.append(item.to_element());
        }

        let mut spine = Element::new("spine").with_attr("id", "spine");
        if let Some(toc) = &self.spine_toc {
            spine.set_attr("toc", toc);
        }
        for itemref in &self.spine {
            spine.append(itemref.to_element());
        }

        package.append(metadata);
        package.append(manifest);
        package.append(spine);
        package
    }

    /// 序列化包文档
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        self.to_element().to_xml()
    }
}

fn require_non_empty(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(EpubError::invalid_attribute(name, value, "不能为空"));
    }
    Ok(())
}

/// href必须是内容目录下的相对路径，不能是绝对路径或包含 `..`
fn require_relative_href(href: &str) -> Result<()> {
    let escapes = Path::new(href)
        .components()
        .any(|c| matches!(c, Component::ParentDir | Component::RootDir | Component::Prefix(_)));
    if escapes {
        return Err(EpubError::invalid_attribute("href", href, "href必须是内容目录下的相对路径"));
    }
    Ok(())
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::opf::manifest::ItemProperty;
    use crate::epub::opf::spine::SpreadProperty;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn xhtml(title: &str) -> Content {
        Content::inline(format!(
            "<html xmlns=\"http://www.w3.org/1999/xhtml\"><head><title>{}</title></head><body/></html>",
            title
        ))
    }

    #[test]
    fn test_new_package_defaults() {
        let package = Package::new();

        assert_eq!(package.version(), "3.0");
        assert_eq!(package.language(), "en");
        assert_eq!(package.unique_identifier(), "pub-id");
        assert_eq!(package.metadata_string(DcTag::Title, " "), "Default Title");

        let identifier = package.metadata_by_id("pub-id").unwrap();
        assert_eq!(identifier.tag, DcTag::Identifier);
        assert!(identifier.value.starts_with("urn:uuid:"));

        let modified = package.modified().unwrap();
        assert_eq!(modified.len(), "2012-01-01T00:00:00Z".len());
        assert!(modified.ends_with('Z'));
    }

    #[test]
    fn test_invalid_direction_string() {
        let result = "sideways".parse::<Direction>();
        assert!(matches!(result, Err(EpubError::InvalidAttribute { .. })));

        let mut package = Package::new();
        package.set_direction("rtl".parse().unwrap());
        assert_eq!(package.direction(), Some(Direction::Rtl));
        assert_eq!(package.to_element().attr("dir"), Some("rtl"));
    }

    #[test]
    fn test_empty_package_attributes_rejected() {
        let mut package = Package::new();
        assert!(matches!(package.set_version(""), Err(EpubError::InvalidAttribute { .. })));
        assert!(matches!(package.set_language(" "), Err(EpubError::InvalidAttribute { .. })));
        assert!(matches!(package.set_unique_identifier(""), Err(EpubError::InvalidAttribute { .. })));
        assert_eq!(package.version(), "3.0");
    }

    #[test]
    fn test_prefix_roundtrip() {
        let mut package = Package::new();
        package.set_prefix("foaf: http://xmlns.com/foaf/spec/");
        assert_eq!(package.to_element().attr("prefix"), Some("foaf: http://xmlns.com/foaf/spec/"));
        package.clear_prefix();
        assert_eq!(package.prefix(), None);
    }

    #[test]
    fn test_set_unique_identifier_renames_identifier_element() {
        let mut package = Package::new();
        package.set_unique_identifier("book-id").unwrap();

        assert_eq!(package.unique_identifier(), "book-id");
        assert!(package.metadata_by_id("pub-id").is_none());
        assert_eq!(package.metadata_by_id("book-id").unwrap().tag, DcTag::Identifier);
    }

    #[test]
    fn test_set_identifier_forces_unique_id() {
        let mut package = Package::new();
        let element = package
            .set_metadata(DcTag::Identifier, "doc-1", &[MetaAttribute::Id("other".to_string())])
            .unwrap();
        assert_eq!(element.id.as_deref(), Some("pub-id"));
        assert_eq!(element.value, "doc-1");
        assert_eq!(package.metadata_by_tag(DcTag::Identifier).len(), 1);
    }

    #[test]
    fn test_set_required_tag_leaves_exactly_one() {
        let mut package = Package::new();
        for tag in [DcTag::Identifier, DcTag::Title, DcTag::Language] {
            package.add_metadata(tag, "extra-1", &[]).unwrap();
            package.add_metadata(tag, "extra-2", &[]).unwrap();
            package.set_metadata(tag, "final", &[]).unwrap();

            let elements = package.metadata_by_tag(tag);
            assert_eq!(elements.len(), 1, "{} 应该只剩一个", tag);
            assert_eq!(elements[0].value, "final");
        }
    }

    #[test]
    fn test_set_required_tag_replaces_in_place() {
        let mut package = Package::new();
        let before = package
            .metadata()
            .iter()
            .position(|e| e.as_dublin_core().is_some_and(|d| d.tag == DcTag::Title))
            .unwrap();

        package.set_metadata(DcTag::Title, "T", &[]).unwrap();
        let after = package
            .metadata()
            .iter()
            .position(|e| e.as_dublin_core().is_some_and(|d| d.tag == DcTag::Title))
            .unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn test_set_optional_tag_degrades_to_add() {
        let mut package = Package::new();
        package.set_metadata(DcTag::Creator, "A", &[]).unwrap();
        package.set_metadata(DcTag::Creator, "B", &[]).unwrap();

        // 非必需标签的set不保证唯一
        assert_eq!(package.metadata_string(DcTag::Creator, ", "), "A, B");
    }

    #[test]
    fn test_add_metadata_rejects_disallowed_attribute() {
        let mut package = Package::new();
        let result = package.add_metadata(
            DcTag::Identifier,
            "isbn",
            &[MetaAttribute::Dir(Direction::Rtl)],
        );
        assert!(matches!(result, Err(EpubError::InvalidAttribute { .. })));
        assert_eq!(package.metadata_by_tag(DcTag::Identifier).len(), 1);
    }

    #[test]
    fn test_remove_by_tag() {
        let mut package = Package::new();
        package.add_metadata(DcTag::Subject, "a", &[]).unwrap();
        package.add_metadata(DcTag::Subject, "b", &[]).unwrap();
        package.add_metadata(DcTag::Title, "Second", &[]).unwrap();

        let removed = package.remove_metadata_by_tag(DcTag::Subject);
        assert_eq!(removed.len(), 2);
        assert!(package.metadata_by_tag(DcTag::Subject).is_empty());

        let removed = package.remove_metadata_by_tag(DcTag::Title);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].value, "Second");
        assert_eq!(package.metadata_string(DcTag::Title, " "), "Default Title");
    }

    #[test]
    fn test_remove_protected_identifier() {
        // 场景D
        let mut package = Package::new();
        let before = package.metadata().to_vec();

        let result = package.remove_metadata_by_id("pub-id");
        assert!(matches!(result, Err(EpubError::ProtectedIdentifier(id)) if id == "pub-id"));
        assert_eq!(package.metadata(), before.as_slice());
    }

    #[test]
    fn test_remove_and_get_by_id() {
        let mut package = Package::new();
        package
            .add_metadata(DcTag::Creator, "Jeff", &[MetaAttribute::Id("creator".to_string())])
            .unwrap();
        assert_eq!(package.metadata_by_id("creator").unwrap().value, "Jeff");

        assert_eq!(package.remove_metadata_by_id("missing").unwrap(), None);
        let removed = package.remove_metadata_by_id("creator").unwrap().unwrap();
        assert_eq!(removed.value, "Jeff");
        assert!(package.metadata_by_tag(DcTag::Creator).is_empty());
    }

    #[test]
    fn test_ambiguous_id_is_not_found() {
        let mut package = Package::new();
        package
            .add_metadata(DcTag::Subject, "a", &[MetaAttribute::Id("dup".to_string())])
            .unwrap();
        package
            .add_metadata(DcTag::Subject, "b", &[MetaAttribute::Id("dup".to_string())])
            .unwrap();

        assert!(package.metadata_by_id("dup").is_none());
        assert_eq!(package.remove_metadata_by_id("dup").unwrap(), None);
        assert_eq!(package.metadata_by_tag(DcTag::Subject).len(), 2);
    }

    #[test]
    fn test_set_modified() {
        let mut package = Package::new();
        package.set_modified(Utc.with_ymd_and_hms(2012, 4, 2, 10, 30, 0).unwrap());
        assert_eq!(package.modified(), Some("2012-04-02T10:30:00Z"));
    }

    #[test]
    fn test_add_manifest_item_records_pending_content() {
        let mut package = Package::new();
        package
            .add_manifest_item(ManifestItem::new("p1", "x.html", "application/xhtml+xml"), xhtml("One"))
            .unwrap();

        assert_eq!(package.manifest_items().len(), 1);
        assert!(matches!(package.pending_content("x.html"), Some(Content::Inline(_))));
    }

    #[test]
    fn test_non_core_media_type_without_fallback() {
        // 场景C
        let mut package = Package::new();
        let result = package.add_manifest_item(
            ManifestItem::new("doc", "doc.pdf", "application/pdf"),
            Content::Inline(b"%PDF".to_vec()),
        );

        assert!(matches!(result, Err(EpubError::UnknownFallback { fallback: None, .. })));
        assert!(package.manifest_items().is_empty());
        assert!(package.manifest_item("doc").is_none());
        assert!(package.pending_content("doc.pdf").is_none());
    }

    #[test]
    fn test_fallback_must_exist() {
        let mut package = Package::new();
        let result = package.add_manifest_item(
            ManifestItem::new("doc", "doc.pdf", "application/pdf").with_fallback("html"),
            Content::Inline(Vec::new()),
        );
        assert!(matches!(result, Err(EpubError::UnknownFallback { fallback: Some(f), .. }) if f == "html"));

        package
            .add_manifest_item(ManifestItem::new("html", "doc.html", "application/xhtml+xml"), xhtml("Doc"))
            .unwrap();
        package
            .add_manifest_item(
                ManifestItem::new("doc", "doc.pdf", "application/pdf").with_fallback("html"),
                Content::Inline(Vec::new()),
            )
            .unwrap();
        assert_eq!(package.manifest_item("doc").unwrap().fallback.as_deref(), Some("html"));
    }

    #[test]
    fn test_duplicate_id_or_href_rejected() {
        let mut package = Package::new();
        package
            .add_manifest_item(ManifestItem::new("p1", "x.html", "application/xhtml+xml"), xhtml("A"))
            .unwrap();

        let same_id = package.add_manifest_item(ManifestItem::new("p1", "y.html", "application/xhtml+xml"), xhtml("B"));
        assert!(matches!(same_id, Err(EpubError::InvalidAttribute { name, .. }) if name == "id"));

        let same_href = package.add_manifest_item(ManifestItem::new("p2", "x.html", "application/xhtml+xml"), xhtml("B"));
        assert!(matches!(same_href, Err(EpubError::InvalidAttribute { name, .. }) if name == "href"));
        assert_eq!(package.manifest_items().len(), 1);
    }

    #[test]
    fn test_href_must_stay_under_content_dir() {
        let mut package = Package::new();
        for href in ["../escape.css", "a/../../escape.css", "/tmp/escape.css"] {
            let result = package.add_manifest_item(ManifestItem::new("css", href, "text/css"), Content::inline("p {}"));
            assert!(matches!(result, Err(EpubError::InvalidAttribute { name, value, .. }) if name == "href" && value == href));
        }
        assert!(package.manifest_items().is_empty());
        assert!(package.pending_content("../escape.css").is_none());

        package
            .add_manifest_item(ManifestItem::new("css", "css/style.css", "text/css"), Content::inline("p {}"))
            .unwrap();
    }

    #[test]
    fn test_missing_source_file() {
        let dir = TempDir::new().unwrap();
        let mut package = Package::new();

        let missing = dir.path().join("missing.css");
        let result = package.add_manifest_item(ManifestItem::new("css", "style.css", "text/css"), Content::file(&missing));
        assert!(matches!(result, Err(EpubError::SourceFileMissing(path)) if path == missing));
        assert!(package.manifest_items().is_empty());

        let present = dir.path().join("style.css");
        fs::write(&present, "body { margin: 0 }").unwrap();
        package
            .add_manifest_item(ManifestItem::new("css", "style.css", "text/css"), Content::file(&present))
            .unwrap();
        assert_eq!(package.pending_content("style.css"), Some(&Content::File(present)));
    }

    #[test]
    fn test_invalid_item_property_string() {
        let properties: Result<Vec<ItemProperty>> = ["nav", "bogus"].iter().map(|p| p.parse()).collect();
        assert!(matches!(properties, Err(EpubError::InvalidAttribute { .. })));
    }

    #[test]
    fn test_remove_manifest_item_keeps_pending_content() {
        let mut package = Package::new();
        package
            .add_manifest_item(ManifestItem::new("p1", "x.html", "application/xhtml+xml"), xhtml("A"))
            .unwrap();

        let removed = package.remove_manifest_item("p1").unwrap();
        assert_eq!(removed.href, "x.html");
        assert!(package.manifest_items().is_empty());
        assert!(package.pending_content("x.html").is_some());
        assert!(package.remove_manifest_item("p1").is_none());
    }

    #[test]
    fn test_spine_unknown_idref() {
        let mut package = Package::new();
        let result = package.add_spine_itemref(SpineItemref::new("nope"));
        assert!(matches!(result, Err(EpubError::UnknownIdref(id)) if id == "nope"));
        assert!(package.spine_itemrefs().is_empty());
    }

    #[test]
    fn test_spine_conflicting_spread_leaves_spine_unchanged() {
        let mut package = Package::new();
        package
            .add_manifest_item(ManifestItem::new("p1", "x.html", "application/xhtml+xml"), xhtml("A"))
            .unwrap();

        let result = package.add_spine_itemref(
            SpineItemref::new("p1")
                .with_properties(vec![SpreadProperty::PageSpreadLeft, SpreadProperty::PageSpreadRight]),
        );
        assert!(matches!(result, Err(EpubError::ConflictingProperties(_))));
        assert!(package.spine_itemrefs().is_empty());
    }

    #[test]
    fn test_spread_check_is_per_itemref() {
        // 互斥检查只针对单个脊柱项，跨脊柱项的冲突意图不会被拒绝
        let mut package = Package::new();
        package
            .add_manifest_item(ManifestItem::new("p1", "x.html", "application/xhtml+xml"), xhtml("A"))
            .unwrap();

        package
            .add_spine_itemref(SpineItemref::new("p1").with_properties(vec![SpreadProperty::PageSpreadLeft]))
            .unwrap();
        package
            .add_spine_itemref(SpineItemref::new("p1").with_properties(vec![SpreadProperty::PageSpreadRight]))
            .unwrap();
        assert_eq!(package.spine_itemrefs().len(), 2);
    }

    #[test]
    fn test_package_serialization_order() {
        let mut package = Package::new();
        package
            .add_manifest_item(ManifestItem::new("p1", "x.html", "application/xhtml+xml"), xhtml("A"))
            .unwrap();
        package.add_spine_itemref(SpineItemref::new("p1")).unwrap();

        let root = package.to_element();
        let names: Vec<&str> = root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["metadata", "manifest", "spine"]);
        assert_eq!(root.attr("unique-identifier"), Some("pub-id"));
        assert_eq!(root.attr("xml:lang"), Some("en"));

        let xml = String::from_utf8(package.to_xml().unwrap()).unwrap();
        assert!(xml.contains("<dc:title>Default Title</dc:title>"));
        assert!(xml.contains("<item id=\"p1\" href=\"x.html\" media-type=\"application/xhtml+xml\"/>"));
        assert!(xml.contains("<itemref idref=\"p1\" linear=\"yes\"/>"));
    }
}
