use crate::epub::config::EpubConfig;
use crate::epub::error::{EpubError, Result};
use crate::epub::markup::Element;
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// container.xml在归档中的路径
pub const CONTAINER_PATH: &str = "META-INF/container.xml";
/// container.xml命名空间
pub const CONTAINER_NAMESPACE: &str = "urn:oasis:names:tc:opendocument:xmlns:container";
/// 包文档媒体类型
pub const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";

/// Container.xml中的rootfile信息
#[derive(Debug, Clone, PartialEq)]
pub struct RootFile {
    pub full_path: String,
    pub media_type: String,
}

/// Container.xml描述的内容
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub rootfiles: Vec<RootFile>,
}

impl Container {
    /// 指向配置中包文档路径的container
    pub fn for_package(config: &EpubConfig) -> Self {
        Self {
            rootfiles: vec![RootFile {
                full_path: config.package_path(),
                media_type: PACKAGE_MEDIA_TYPE.to_string(),
            }],
        }
    }

    /// 构建container.xml的标记树
    pub fn to_element(&self) -> Element {
        let mut rootfiles = Element::new("rootfiles");
        for rootfile in &self.rootfiles {
            rootfiles.append(
                Element::new("rootfile")
                    .with_attr("full-path", &rootfile.full_path)
                    .with_attr("media-type", &rootfile.media_type),
            );
        }

        Element::new("container")
            .with_attr("xmlns", CONTAINER_NAMESPACE)
            .with_attr("version", "1.0")
            .with_child(rootfiles)
    }

    /// 序列化container.xml
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        self.to_element().to_xml()
    }

    /// 解析container.xml内容
    ///
    /// # 参数
    /// * `xml_content` - container.xml的文件内容
    ///
    /// # 返回值
    /// * `Result<Container, EpubError>` - 解析后的Container信息
    pub fn parse_xml(xml_content: &str) -> Result<Container> {
        let mut reader = Reader::from_str(xml_content);
        reader.config_mut().trim_text(true);

        let mut rootfiles = Vec::new();
        let mut buf = Vec::new();
        let mut in_rootfiles = false;

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) | Event::Empty(ref e) => match e.local_name().as_ref() {
                    b"rootfiles" => in_rootfiles = true,
                    b"rootfile" if in_rootfiles => {
                        let mut full_path = String::new();
                        let mut media_type = String::new();

                        for attr_result in e.attributes() {
                            let attr = attr_result.map_err(|e| EpubError::XmlError(quick_xml::Error::InvalidAttr(e)))?;
                            match attr.key.local_name().as_ref() {
                                b"full-path" => full_path = String::from_utf8_lossy(&attr.value).to_string(),
                                b"media-type" => media_type = String::from_utf8_lossy(&attr.value).to_string(),
                                _ => {}
                            }
                        }

                        if !full_path.is_empty() && !media_type.is_empty() {
                            rootfiles.push(RootFile { full_path, media_type });
                        }
                    }
                    _ => {}
                },
                Event::End(ref e) => {
                    if e.local_name().as_ref() == b"rootfiles" {
                        in_rootfiles = false;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        if rootfiles.is_empty() {
            return Err(EpubError::ContainerParseError("没有找到任何rootfile条目".to_string()));
        }

        Ok(Container { rootfiles })
    }

    /// 获取包文档路径
    ///
    /// 优先返回第一个 `application/oebps-package+xml` 类型的rootfile。
    pub fn package_path(&self) -> Option<&str> {
        self.rootfiles
            .iter()
            .find(|rootfile| rootfile.media_type == PACKAGE_MEDIA_TYPE)
            .or_else(|| self.rootfiles.first())
            .map(|rootfile| rootfile.full_path.as_str())
    }
}
