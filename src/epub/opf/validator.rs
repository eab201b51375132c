//! 包文档校验模块
//!
//! 在生成导航和打包之前检查包文档结构。校验只读、无副作用，
//! 遇到第一个违规即返回。

use crate::epub::error::{EpubError, Result};
use crate::epub::markup::Element;
use crate::epub::opf::manifest::is_core_media_type;
use crate::epub::opf::metadata::DcTag;
use crate::epub::opf::package::Package;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use thiserror::Error;

/// 包根元素要求的子元素顺序
const PACKAGE_SECTIONS: [&str; 3] = ["metadata", "manifest", "spine"];

/// 被违反的校验规则
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationRule {
    #[error("未设置unique-identifier")]
    MissingUniqueIdentifier,

    #[error("unique-identifier {id} 应当恰好匹配一个id, 实际匹配 {matches} 个")]
    UnresolvedUniqueIdentifier { id: String, matches: usize },

    #[error("未设置version")]
    MissingVersion,

    #[error("package的子元素顺序应为 metadata, manifest, spine, 实际为 {}", .0.join(", "))]
    SectionOrder(Vec<String>),

    #[error("缺少必需的元数据 {0}")]
    MissingMetadata(DcTag),

    #[error("清单中没有任何项目")]
    EmptyManifest,

    #[error("第 {position} 个清单项缺少 {attribute} 属性")]
    IncompleteManifestItem { position: usize, attribute: &'static str },

    #[error("清单项 {id} 的媒体类型 {media_type} 不是核心媒体类型且没有fallback")]
    MissingFallback { id: String, media_type: String },

    #[error("序列化文档中的第三个顶层元素不是spine: {}", .0.as_deref().unwrap_or("(缺失)"))]
    SpineNotThird(Option<String>),
}

impl From<ValidationRule> for EpubError {
    fn from(rule: ValidationRule) -> Self {
        EpubError::Validation(rule)
    }
}

/// 校验包文档
pub fn validate(package: &Package) -> Result<()> {
    let root = package.to_element();
    let xml = root.to_xml()?;
    validate_document(&root, &xml)
}

/// 依次检查标记树和它的序列化文本
pub(crate) fn validate_document(root: &Element, xml: &[u8]) -> Result<()> {
    check_unique_identifier(root)?;
    check_version(root)?;
    check_section_order(root)?;
    check_required_metadata(root)?;
    check_manifest(root)?;
    check_serialized_spine(xml)?;
    Ok(())
}

fn check_unique_identifier(root: &Element) -> Result<()> {
    let id = match root.attr("unique-identifier") {
        Some(id) if !id.is_empty() => id,
        _ => return Err(ValidationRule::MissingUniqueIdentifier.into()),
    };

    let matches = root.find_all(|e| e.attr("id") == Some(id)).len();
    if matches != 1 {
        return Err(ValidationRule::UnresolvedUniqueIdentifier {
            id: id.to_string(),
            matches,
        }
        .into());
    }
    Ok(())
}

fn check_version(root: &Element) -> Result<()> {
    match root.attr("version") {
        Some(version) if !version.is_empty() => Ok(()),
        _ => Err(ValidationRule::MissingVersion.into()),
    }
}

fn check_section_order(root: &Element) -> Result<()> {
    let names: Vec<String> = root.child_elements().map(|e| e.name.clone()).collect();
    if names != PACKAGE_SECTIONS {
        return Err(ValidationRule::SectionOrder(names).into());
    }
    Ok(())
}

fn check_required_metadata(root: &Element) -> Result<()> {
    let metadata = root
        .child("metadata")
        .ok_or_else(|| ValidationRule::SectionOrder(Vec::new()))?;

    for tag in [DcTag::Identifier, DcTag::Title, DcTag::Language] {
        if metadata.child(tag.name()).is_none() {
            return Err(ValidationRule::MissingMetadata(tag).into());
        }
    }
    Ok(())
}

fn check_manifest(root: &Element) -> Result<()> {
    let manifest = root
        .child("manifest")
        .ok_or_else(|| ValidationRule::SectionOrder(Vec::new()))?;

    let items: Vec<&Element> = manifest.child_elements().filter(|e| e.name == "item").collect();
    if items.is_empty() {
        return Err(ValidationRule::EmptyManifest.into());
    }

    for (index, item) in items.iter().enumerate() {
        for attribute in ["id", "href", "media-type"] {
            if item.attr(attribute).is_none_or(str::is_empty) {
                return Err(ValidationRule::IncompleteManifestItem {
                    position: index + 1,
                    attribute,
                }
                .into());
            }
        }

        // fallback链是否最终指向核心媒体类型不做检查
        let media_type = item.attr("media-type").unwrap_or_default();
        if !is_core_media_type(media_type) && item.attr("fallback").is_none() {
            return Err(ValidationRule::MissingFallback {
                id: item.attr("id").unwrap_or_default().to_string(),
                media_type: media_type.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// 重新读取序列化文本，确认第三个顶层元素是spine
fn check_serialized_spine(xml: &[u8]) -> Result<()> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut top_level = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(ref e) => {
                if depth == 1 {
                    top_level += 1;
                    if top_level == 3 {
                        return third_is_spine(e.name().as_ref());
                    }
                }
                depth += 1;
            }
            Event::Empty(ref e) => {
                if depth == 1 {
                    top_level += 1;
                    if top_level == 3 {
                        return third_is_spine(e.name().as_ref());
                    }
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Err(ValidationRule::SpineNotThird(None).into())
}

fn third_is_spine(name: &[u8]) -> Result<()> {
    if name == b"spine" {
        Ok(())
    } else {
        Err(ValidationRule::SpineNotThird(Some(String::from_utf8_lossy(name).into_owned())).into())
    }
}
