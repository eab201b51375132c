//! 标记树模块
//!
//! 提供一个最小的有序元素树，用于生成OPF、NCX和container.xml文档。
//! 元素名保留命名空间前缀（如 `dc:title`），属性按插入顺序保存。
//! 序列化通过 `quick_xml::Writer` 完成。

use crate::epub::error::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use std::io::Cursor;

/// 树中的节点
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// 子元素
    Element(Element),
    /// 文本内容
    Text(String),
}

/// 标记元素
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// 元素名（可包含前缀）
    pub name: String,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    /// 创建新的空元素
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// 链式设置属性
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// 链式追加文本
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.append_text(text);
        self
    }

    /// 链式追加子元素
    pub fn with_child(mut self, child: Element) -> Self {
        self.append(child);
        self
    }

    /// 设置属性，已存在时原位替换
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// 获取属性值
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 删除属性，返回旧值
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let index = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(index).1)
    }

    /// 所有属性
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// 追加子元素
    pub fn append(&mut self, child: Element) {
        self.children.push(Node::Element(child));
    }

    /// 追加文本节点
    pub fn append_text(&mut self, text: impl Into<String>) {
        self.children.push(Node::Text(text.into()));
    }

    /// 删除指定位置的子节点
    pub fn remove_child(&mut self, index: usize) -> Option<Node> {
        if index < self.children.len() {
            Some(self.children.remove(index))
        } else {
            None
        }
    }

    /// 所有子节点
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// 只返回子元素
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    /// 按名称查找第一个子元素
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.child_elements().find(|e| e.name == name)
    }

    /// 元素及其后代中的全部文本
    pub fn text(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, result: &mut String) {
        for node in &self.children {
            match node {
                Node::Text(text) => result.push_str(text),
                Node::Element(element) => element.collect_text(result),
            }
        }
    }

    /// 深度优先查询满足条件的元素（包含自身）
    pub fn find_all<F>(&self, predicate: F) -> Vec<&Element>
    where
        F: Fn(&Element) -> bool,
    {
        let mut found = Vec::new();
        self.find_into(&predicate, &mut found);
        found
    }

    fn find_into<'a, F>(&'a self, predicate: &F, found: &mut Vec<&'a Element>)
    where
        F: Fn(&Element) -> bool,
    {
        if predicate(self) {
            found.push(self);
        }
        for child in self.child_elements() {
            child.find_into(predicate, found);
        }
    }

    /// 序列化为带XML声明的UTF-8字节
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
        self.write_into(&mut writer)?;
        Ok(writer.into_inner().into_inner())
    }

    /// 序列化为字符串
    pub fn to_xml_string(&self) -> Result<String> {
        let bytes = self.to_xml()?;
        // 写入端只接受&str，输出必然是合法UTF-8
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn write_into(&self, writer: &mut Writer<Cursor<Vec<u8>>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (name, value) in &self.attributes {
            start.push_attribute((name.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        for node in &self.children {
            match node {
                Node::Element(element) => element.write_into(writer)?,
                Node::Text(text) => writer.write_event(Event::Text(BytesText::new(text)))?,
            }
        }
        writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        Ok(())
    }
}
