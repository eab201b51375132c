use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;
use zip::{CompressionMethod, ZipArchive};

use crate::epub::container::{Container, CONTAINER_PATH};
use crate::epub::error::{EpubError, Result};

/// mimetype条目名
pub const MIMETYPE_PATH: &str = "mimetype";
/// EPUB的mimetype内容
pub const EPUB_MIMETYPE: &str = "application/epub+zip";

/// 表示一个已打包的EPUB文件
pub struct Epub {
    archive: ZipArchive<File>,
}

impl Epub {
    /// 从文件路径打开Epub
    ///
    /// # 参数
    /// * `path` - epub文件的路径
    ///
    /// # 返回值
    /// * `Result<Epub, EpubError>` - mimetype校验通过返回Epub实例
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Epub> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;

        let mut epub = Epub { archive };
        epub.validate()?;

        Ok(epub)
    }

    /// 验证EPUB文件的合法性
    ///
    /// 检查步骤：
    /// 1. 检查是否存在mimetype文件
    /// 2. 验证mimetype文件的内容是否为"application/epub+zip"
    fn validate(&mut self) -> Result<()> {
        let mut file = match self.archive.by_name(MIMETYPE_PATH) {
            Ok(file) => file,
            Err(_) => return Err(EpubError::MissingMimetype),
        };

        let mut content = String::new();
        file.read_to_string(&mut content)?;

        let content = content.trim();
        if content != EPUB_MIMETYPE {
            return Err(EpubError::InvalidMimetype {
                expected: EPUB_MIMETYPE.to_string(),
                found: content.to_string(),
            });
        }

        debug!("mimetype校验通过");
        Ok(())
    }

    /// 检查mimetype是否为第一个条目且未压缩
    pub fn mimetype_is_leading_and_stored(&mut self) -> Result<bool> {
        if self.archive.is_empty() {
            return Ok(false);
        }
        let first = self.archive.by_index(0)?;
        Ok(first.name() == MIMETYPE_PATH && first.compression() == CompressionMethod::Stored)
    }

    /// 列出EPUB文件中的所有条目
    pub fn list_files(&mut self) -> Result<Vec<String>> {
        let mut files = Vec::new();

        for i in 0..self.archive.len() {
            let file = self.archive.by_index(i)?;
            if !file.is_dir() {
                files.push(file.name().to_string());
            }
        }

        Ok(files)
    }

    /// 提取指定文件的内容
    pub fn extract_file(&mut self, filename: &str) -> Result<String> {
        let mut file = self.archive.by_name(filename)?;
        let mut content = String::new();
        file.read_to_string(&mut content)?;
        Ok(content)
    }

    /// 提取指定文件的二进制内容
    pub fn extract_binary_file(&mut self, filename: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(filename)?;
        let mut buffer = Vec::new();
        file.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// 解析container.xml文件
    pub fn parse_container(&mut self) -> Result<Container> {
        let container_content = self.extract_file(CONTAINER_PATH)?;
        Container::parse_xml(&container_content)
    }

    /// 获取包文档路径
    pub fn package_path(&mut self) -> Result<String> {
        let container = self.parse_container()?;

        container
            .package_path()
            .map(str::to_string)
            .ok_or_else(|| EpubError::ContainerParseError("container.xml中没有找到有效的rootfile".to_string()))
    }

    /// 读取包文档原文
    pub fn package_document(&mut self) -> Result<String> {
        let path = self.package_path()?;
        self.extract_file(&path)
    }
}
