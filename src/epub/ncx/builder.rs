//! NCX生成模块
//!
//! 根据当前脊柱顺序生成兼容旧阅读器的NCX目录，并把它登记到包文档的清单中。

use crate::epub::config::EpubConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::ncx::navigation::{
    DocAuthor, DocTitle, NavContent, NavLabel, NavMap, NavPoint, Ncx, NcxMetadata,
};
use crate::epub::opf::{Content, DcTag, ManifestItem, Package};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info};

/// NCX清单项ID
pub const NCX_ID: &str = "ncx";
/// NCX清单项href
pub const NCX_HREF: &str = "toc.ncx";
/// NCX媒体类型
pub const NCX_MEDIA_TYPE: &str = "application/x-dtbncx+xml";
/// 写入epub-creator的生成工具标识
pub const GENERATOR: &str = concat!("epubpack ", env!("CARGO_PKG_VERSION"));

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title是合法的CSS选择器"));

impl Package {
    /// 生成NCX并登记到清单，见 [`build_ncx`]
    pub fn build_ncx(&mut self, config: &EpubConfig) -> Result<Ncx> {
        build_ncx(self, config)
    }
}

/// 生成NCX文档
///
/// 先校验包文档；然后按脊柱顺序为每个线性脊柱项生成一个导航点，
/// 最后把NCX作为清单项 `ncx` 登记，并设置脊柱的 `toc` 属性。
/// 此前生成的 `ncx` 清单项会被替换，因此可以重复调用；
/// `ncx` 或 `toc.ncx` 被其他清单项占用时返回 [`EpubError::InvalidAttribute`]。
///
/// 任何脊柱项的idref为空或已无法解析时返回 [`EpubError::MalformedSpineItem`]，
/// 此时包文档不会被修改。
pub fn build_ncx(package: &mut Package, config: &EpubConfig) -> Result<Ncx> {
    package.validate()?;
    let replaces_previous = check_registration(package)?;

    let mut nav_map = NavMap::new();
    let mut n = 0u32;

    for (index, itemref) in package.spine_itemrefs().iter().enumerate() {
        let position = index + 1;
        if itemref.idref.is_empty() {
            return Err(EpubError::MalformedSpineItem {
                position,
                reason: "缺少idref".to_string(),
            });
        }

        let item = package
            .manifest_item(&itemref.idref)
            .ok_or_else(|| EpubError::MalformedSpineItem {
                position,
                reason: format!("idref {} 不在清单中", itemref.idref),
            })?;

        if !itemref.is_linear() {
            debug!(idref = %itemref.idref, "跳过非线性脊柱项");
            continue;
        }

        n += 1;
        let label = extract_title(package.pending_content(&item.href)).unwrap_or_else(|| config.generic_title(n));
        nav_map.add_nav_point(NavPoint::numbered(n, NavLabel::new(label), NavContent::new(&item.href)));
    }

    let ncx = Ncx {
        lang: package.language().to_string(),
        metadata: NcxMetadata::new(canonical_identifier(package), GENERATOR),
        doc_title: DocTitle::new(package.metadata_string(DcTag::Title, " ")),
        doc_author: DocAuthor::new(package.metadata_string(DcTag::Creator, " ")),
        nav_map,
    };
    let xml = ncx.to_xml()?;

    if replaces_previous {
        package.remove_manifest_item(NCX_ID);
    }
    package.add_manifest_item(ManifestItem::new(NCX_ID, NCX_HREF, NCX_MEDIA_TYPE), Content::Inline(xml))?;
    package.set_spine_toc(NCX_ID);

    info!(nav_points = ncx.nav_map.len(), "已生成NCX");
    Ok(ncx)
}

/// 确认NCX可以登记，返回是否需要替换此前生成的NCX清单项
///
/// 只有id为 `ncx`、href与媒体类型都与NCX一致的清单项才被视为此前生成的结果；
/// id或href被其他清单项占用时直接失败，包文档保持不变。
fn check_registration(package: &Package) -> Result<bool> {
    let previous = match package.manifest_item(NCX_ID) {
        None => false,
        Some(item) if item.href == NCX_HREF && item.media_type == NCX_MEDIA_TYPE => true,
        Some(_) => {
            return Err(EpubError::invalid_attribute("id", NCX_ID, "清单项ID已被其他项目占用"));
        }
    };

    let href_taken = package
        .manifest_items()
        .iter()
        .any(|item| item.href == NCX_HREF && item.id != NCX_ID);
    if href_taken {
        return Err(EpubError::invalid_attribute("href", NCX_HREF, "清单项href已被其他项目占用"));
    }

    Ok(previous)
}

/// 唯一标识符元素的值，不存在时退回第一个dc:identifier
fn canonical_identifier(package: &Package) -> String {
    package
        .metadata_by_id(package.unique_identifier())
        .or_else(|| package.metadata_by_tag(DcTag::Identifier).into_iter().next())
        .map(|element| element.value.clone())
        .unwrap_or_default()
}

/// 从内联内容中提取第一个非空的 `<title>` 文本
///
/// 使用宽松的HTML解析，内容不是内联的、无法解析或没有标题时返回 `None`。
pub fn extract_title(content: Option<&Content>) -> Option<String> {
    let Some(Content::Inline(bytes)) = content else {
        return None;
    };

    let document = Html::parse_document(&String::from_utf8_lossy(bytes));
    document
        .select(&TITLE_SELECTOR)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .find(|title| !title.is_empty())
}
