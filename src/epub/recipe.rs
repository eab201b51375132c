//! 构建说明模块
//!
//! 用YAML描述一本书：package属性、元数据、清单项（内联文本或相对说明文件的源文件）
//! 以及脊柱顺序。命令行工具通过它构建 [`Package`]。

use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{
    Content, DcTag, ItemProperty, ManifestItem, MetaAttribute, Package, SpineItemref, SpreadProperty,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// 构建说明
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Recipe {
    /// 唯一标识符元素ID
    pub unique_identifier: Option<String>,
    /// package的xml:lang
    pub language: Option<String>,
    /// ltr或rtl
    pub direction: Option<String>,
    /// 额外的前缀映射
    pub prefix: Option<String>,
    pub metadata: Vec<RecipeMetadata>,
    pub items: Vec<RecipeItem>,
    pub spine: Vec<RecipeItemref>,
}

/// 一条DCMES元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeMetadata {
    /// 标签名，可带或不带 `dc:` 前缀
    pub tag: String,
    pub value: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub dir: Option<String>,
}

/// 一个清单项，`text` 与 `file` 二选一
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItem {
    pub id: String,
    pub href: String,
    pub media_type: String,
    #[serde(default)]
    pub fallback: Option<String>,
    #[serde(default)]
    pub properties: Vec<String>,
    /// 内联文本内容
    #[serde(default)]
    pub text: Option<String>,
    /// 源文件路径，相对于说明文件所在目录
    #[serde(default)]
    pub file: Option<String>,
}

/// 一个脊柱项
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeItemref {
    pub idref: String,
    #[serde(default = "default_linear")]
    pub linear: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub properties: Vec<String>,
}

fn default_linear() -> bool {
    true
}

impl Recipe {
    /// 从YAML文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::ConfigError(format!("无法读取构建说明: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// 从YAML字符串解析
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yml::from_str(content).map_err(|e| EpubError::ConfigError(format!("构建说明格式错误: {}", e)))
    }

    /// 构建包文档，相对的源文件路径以 `base_dir` 为基准
    pub fn build(&self, base_dir: &Path) -> Result<Package> {
        let mut package = Package::new();

        if let Some(identifier) = &self.unique_identifier {
            package.set_unique_identifier(identifier)?;
        }
        if let Some(language) = &self.language {
            package.set_language(language)?;
        }
        if let Some(direction) = &self.direction {
            package.set_direction(direction.parse()?);
        }
        if let Some(prefix) = &self.prefix {
            package.set_prefix(prefix);
        }

        for entry in &self.metadata {
            let tag: DcTag = entry.tag.parse()?;
            let attributes = entry.attributes()?;
            if tag.is_required() {
                package.set_metadata(tag, &entry.value, &attributes)?;
            } else {
                package.add_metadata(tag, &entry.value, &attributes)?;
            }
        }

        for item in &self.items {
            let (manifest_item, content) = item.to_manifest_item(base_dir)?;
            package.add_manifest_item(manifest_item, content)?;
        }

        for itemref in &self.spine {
            package.add_spine_itemref(itemref.to_spine_itemref()?)?;
        }

        info!(
            items = package.manifest_items().len(),
            spine = package.spine_itemrefs().len(),
            "已根据构建说明创建包文档"
        );
        Ok(package)
    }
}

impl RecipeMetadata {
    fn attributes(&self) -> Result<Vec<MetaAttribute>> {
        let mut attributes = Vec::new();
        if let Some(id) = &self.id {
            attributes.push(MetaAttribute::Id(id.clone()));
        }
        if let Some(lang) = &self.lang {
            attributes.push(MetaAttribute::Lang(lang.clone()));
        }
        if let Some(dir) = &self.dir {
            attributes.push(MetaAttribute::Dir(dir.parse()?));
        }
        Ok(attributes)
    }
}

impl RecipeItem {
    fn to_manifest_item(&self, base_dir: &Path) -> Result<(ManifestItem, Content)> {
        let properties = self
            .properties
            .iter()
            .map(|p| p.parse::<ItemProperty>())
            .collect::<Result<Vec<_>>>()?;

        let mut item = ManifestItem::new(&self.id, &self.href, &self.media_type).with_properties(properties);
        if let Some(fallback) = &self.fallback {
            item = item.with_fallback(fallback);
        }

        let content = match (&self.text, &self.file) {
            (Some(text), None) => Content::inline(text.as_str()),
            (None, Some(file)) => Content::file(base_dir.join(file)),
            _ => {
                return Err(EpubError::ConfigError(format!(
                    "清单项 {} 必须且只能指定text或file之一",
                    self.id
                )));
            }
        };

        Ok((item, content))
    }
}

impl RecipeItemref {
    fn to_spine_itemref(&self) -> Result<SpineItemref> {
        let properties = self
            .properties
            .iter()
            .map(|p| p.parse::<SpreadProperty>())
            .collect::<Result<Vec<_>>>()?;

        let mut itemref = SpineItemref::new(&self.idref)
            .with_linear(self.linear)
            .with_properties(properties);
        if let Some(id) = &self.id {
            itemref = itemref.with_id(id);
        }
        Ok(itemref)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::epub::opf::Direction;
    use tempfile::TempDir;

    const RECIPE: &str = r#"
unique_identifier: book-id
language: fr
direction: rtl
metadata:
  - tag: identifier
    value: urn:isbn:9780000000000
  - tag: dc:title
    value: Le Livre
    lang: fr
  - tag: creator
    value: Ann
    id: creator-1
items:
  - id: p1
    href: x.html
    media_type: application/xhtml+xml
    text: "<html><head><title>Un</title></head><body/></html>"
  - id: css
    href: style.css
    media_type: text/css
    file: assets/style.css
spine:
  - idref: p1
    properties: [page-spread-right]
"#;

    #[test]
    fn test_build_from_recipe() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("assets")).unwrap();
        fs::write(dir.path().join("assets/style.css"), "p {}").unwrap();

        let package = Recipe::from_yaml(RECIPE).unwrap().build(dir.path()).unwrap();

        assert_eq!(package.unique_identifier(), "book-id");
        assert_eq!(package.language(), "fr");
        assert_eq!(package.direction(), Some(Direction::Rtl));
        assert_eq!(package.metadata_by_id("book-id").unwrap().value, "urn:isbn:9780000000000");
        assert_eq!(package.metadata_by_tag(DcTag::Identifier).len(), 1);
        assert_eq!(package.metadata_string(DcTag::Title, " "), "Le Livre");
        assert_eq!(package.metadata_by_id("creator-1").unwrap().value, "Ann");
        assert_eq!(
            package.pending_content("style.css"),
            Some(&Content::File(dir.path().join("assets/style.css")))
        );
        assert!(package.spine_itemrefs()[0].is_linear());
        assert!(package.validate().is_ok());
    }

    #[test]
    fn test_unknown_tag_in_recipe() {
        let recipe = Recipe::from_yaml("metadata:\n  - tag: author\n    value: Ann\n").unwrap();
        let result = recipe.build(Path::new("."));
        assert!(matches!(result, Err(EpubError::UnknownTag(t)) if t == "author"));
    }

    #[test]
    fn test_item_needs_exactly_one_source() {
        let recipe = Recipe::from_yaml(
            "items:\n  - id: a\n    href: a.html\n    media_type: application/xhtml+xml\n",
        )
        .unwrap();
        assert!(matches!(recipe.build(Path::new(".")), Err(EpubError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_spine_property() {
        let recipe = Recipe::from_yaml(
            "items:\n  - id: a\n    href: a.html\n    media_type: application/xhtml+xml\n    text: x\nspine:\n  - idref: a\n    properties: [nav]\n",
        )
        .unwrap();
        assert!(matches!(recipe.build(Path::new(".")), Err(EpubError::InvalidAttribute { .. })));
    }
}
