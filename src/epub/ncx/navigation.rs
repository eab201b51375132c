//! NCX导航元素数据结构定义
//!
//! 定义NCX文档中的各种导航元素，包括导航点、导航标签、内容引用等，
//! 以及将它们写成标记树的方法。

use crate::epub::error::Result;
use crate::epub::markup::Element;

/// NCX命名空间
pub const NCX_NAMESPACE: &str = "http://www.daisy.org/z3986/2005/ncx/";
/// NCX版本
pub const NCX_VERSION: &str = "2005-1";

/// NCX元数据信息
#[derive(Debug, Clone, PartialEq)]
pub struct NcxMetadata {
    /// 唯一标识符（dtb:uid）
    pub uid: String,
    /// 生成工具（epub-creator）
    pub generator: String,
    /// 导航深度（dtb:depth）
    pub depth: u32,
    /// 总页数（dtb:totalPageCount）
    pub total_page_count: u32,
    /// 最大页码（dtb:maxPageNumber）
    pub max_page_number: u32,
}

impl NcxMetadata {
    /// 创建新的NCX元数据，深度和页数字段使用固定值
    pub fn new(uid: impl Into<String>, generator: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            generator: generator.into(),
            depth: 2,
            total_page_count: 0,
            max_page_number: 0,
        }
    }

    fn to_element(&self) -> Element {
        let entries = [
            ("dtb:uid", self.uid.clone()),
            ("epub-creator", self.generator.clone()),
            ("dtb:depth", self.depth.to_string()),
            ("dtb:totalPageCount", self.total_page_count.to_string()),
            ("dtb:maxPageNumber", self.max_page_number.to_string()),
        ];

        let mut head = Element::new("head");
        for (name, content) in entries {
            head.append(Element::new("meta").with_attr("name", name).with_attr("content", content));
        }
        head
    }
}

/// 文档标题
#[derive(Debug, Clone, PartialEq)]
pub struct DocTitle {
    /// 标题文本
    pub text: String,
}

impl DocTitle {
    /// 创建新的文档标题
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 文档作者
#[derive(Debug, Clone, PartialEq)]
pub struct DocAuthor {
    /// 作者文本
    pub text: String,
}

impl DocAuthor {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 导航标签
#[derive(Debug, Clone, PartialEq)]
pub struct NavLabel {
    /// 标签文本
    pub text: String,
}

impl NavLabel {
    /// 创建新的导航标签
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// 导航内容引用
#[derive(Debug, Clone, PartialEq)]
pub struct NavContent {
    /// 源文件路径
    pub src: String,
}

impl NavContent {
    /// 创建新的导航内容引用
    pub fn new(src: impl Into<String>) -> Self {
        Self { src: src.into() }
    }
}

/// 导航点
#[derive(Debug, Clone, PartialEq)]
pub struct NavPoint {
    /// 唯一标识符
    pub id: String,
    /// 播放顺序
    pub play_order: u32,
    /// 导航标签
    pub nav_label: NavLabel,
    /// 内容引用
    pub content: NavContent,
}

impl NavPoint {
    /// 创建第n个导航点，id为 `navpoint-<n>`
    pub fn numbered(n: u32, nav_label: NavLabel, content: NavContent) -> Self {
        Self {
            id: format!("navpoint-{}", n),
            play_order: n,
            nav_label,
            content,
        }
    }

    fn to_element(&self) -> Element {
        Element::new("navPoint")
            .with_attr("id", &self.id)
            .with_attr("playOrder", self.play_order.to_string())
            .with_child(Element::new("navLabel").with_child(Element::new("text").with_text(&self.nav_label.text)))
            .with_child(Element::new("content").with_attr("src", &self.content.src))
    }
}

/// 导航地图
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NavMap {
    /// 导航点列表
    pub nav_points: Vec<NavPoint>,
}

impl NavMap {
    /// 创建新的导航地图
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加导航点
    pub fn add_nav_point(&mut self, nav_point: NavPoint) {
        self.nav_points.push(nav_point);
    }

    /// 根据ID查找导航点
    pub fn find_nav_point_by_id(&self, id: &str) -> Option<&NavPoint> {
        self.nav_points.iter().find(|point| point.id == id)
    }

    pub fn len(&self) -> usize {
        self.nav_points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nav_points.is_empty()
    }

    fn to_element(&self) -> Element {
        let mut nav_map = Element::new("navMap");
        for point in &self.nav_points {
            nav_map.append(point.to_element());
        }
        nav_map
    }
}

/// NCX文档
#[derive(Debug, Clone, PartialEq)]
pub struct Ncx {
    /// 文档语言（xml:lang）
    pub lang: String,
    /// 头部元数据
    pub metadata: NcxMetadata,
    /// 文档标题
    pub doc_title: DocTitle,
    /// 文档作者
    pub doc_author: DocAuthor,
    /// 导航地图
    pub nav_map: NavMap,
}

impl Ncx {
    /// 构建NCX文档的标记树
    pub fn to_element(&self) -> Element {
        let mut root = Element::new("ncx")
            .with_attr("xmlns", NCX_NAMESPACE)
            .with_attr("version", NCX_VERSION)
            .with_attr("xml:lang", &self.lang);

        root.append(self.metadata.to_element());
        root.append(Element::new("docTitle").with_child(Element::new("text").with_text(&self.doc_title.text)));
        root.append(Element::new("docAuthor").with_child(Element::new("text").with_text(&self.doc_author.text)));
        root.append(self.nav_map.to_element());
        root
    }

    /// 序列化NCX文档
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        self.to_element().to_xml()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_ncx() -> Ncx {
        let mut nav_map = NavMap::new();
        nav_map.add_nav_point(NavPoint::numbered(1, NavLabel::new("Intro"), NavContent::new("intro.html")));
        nav_map.add_nav_point(NavPoint::numbered(2, NavLabel::new("Page 2"), NavContent::new("b.html")));

        Ncx {
            lang: "en".to_string(),
            metadata: NcxMetadata::new("urn:uuid:1", "epubpack test"),
            doc_title: DocTitle::new("T"),
            doc_author: DocAuthor::new(""),
            nav_map,
        }
    }

    #[test]
    fn test_numbered_nav_point() {
        let point = NavPoint::numbered(3, NavLabel::new("C"), NavContent::new("c.html"));
        assert_eq!(point.id, "navpoint-3");
        assert_eq!(point.play_order, 3);
    }

    #[test]
    fn test_find_nav_point() {
        let ncx = sample_ncx();
        assert_eq!(ncx.nav_map.len(), 2);
        assert_eq!(ncx.nav_map.find_nav_point_by_id("navpoint-2").unwrap().content.src, "b.html");
        assert!(ncx.nav_map.find_nav_point_by_id("navpoint-9").is_none());
    }

    #[test]
    fn test_ncx_tree_layout() {
        let root = sample_ncx().to_element();
        assert_eq!(root.attr("xmlns"), Some(NCX_NAMESPACE));
        assert_eq!(root.attr("version"), Some("2005-1"));
        assert_eq!(root.attr("xml:lang"), Some("en"));

        let names: Vec<&str> = root.child_elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["head", "docTitle", "docAuthor", "navMap"]);

        let head = root.child("head").unwrap();
        let metas: Vec<(&str, &str)> = head
            .child_elements()
            .map(|m| (m.attr("name").unwrap(), m.attr("content").unwrap()))
            .collect();
        assert_eq!(
            metas,
            vec![
                ("dtb:uid", "urn:uuid:1"),
                ("epub-creator", "epubpack test"),
                ("dtb:depth", "2"),
                ("dtb:totalPageCount", "0"),
                ("dtb:maxPageNumber", "0"),
            ]
        );

        let first = root.child("navMap").unwrap().child("navPoint").unwrap();
        assert_eq!(first.attr("playOrder"), Some("1"));
        assert_eq!(first.child("navLabel").unwrap().text(), "Intro");
        assert_eq!(first.child("content").unwrap().attr("src"), Some("intro.html"));
    }

    #[test]
    fn test_ncx_serialization() {
        let xml = String::from_utf8(sample_ncx().to_xml().unwrap()).unwrap();
        assert!(xml.contains("<navPoint id=\"navpoint-1\" playOrder=\"1\">"));
        assert!(xml.contains("<docAuthor>"));
    }
}
