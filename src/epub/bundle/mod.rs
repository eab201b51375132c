//! 打包模块
//!
//! 把包文档和清单项内容写成EPUB归档。两种策略共享同一个归档布局：
//!
//! - [`LibraryBundler`] 使用 `zip` 库直接写归档
//! - [`ProcessBundler`] 在临时目录中展开布局，再调用外部zip命令

mod library;
mod process;

pub use library::LibraryBundler;
pub use process::ProcessBundler;

use crate::epub::config::EpubConfig;
use crate::epub::container::{Container, CONTAINER_PATH};
use crate::epub::error::{EpubError, Result};
use crate::epub::opf::{Content, Package};
use crate::epub::reader::{EPUB_MIMETYPE, MIMETYPE_PATH};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// 打包策略
pub trait Bundler {
    /// 把包文档打包到目标路径
    fn bundle(&self, package: &Package, target: &Path) -> Result<()>;
}

/// 命令行可选的打包方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BundleMethod {
    /// 使用zip库
    #[default]
    Library,
    /// 调用外部zip命令
    Process,
}

impl BundleMethod {
    /// 按配置创建对应的打包器
    pub fn bundler(self, config: EpubConfig) -> Box<dyn Bundler> {
        match self {
            BundleMethod::Library => Box::new(LibraryBundler::new(config)),
            BundleMethod::Process => Box::new(ProcessBundler::new(config)),
        }
    }
}

/// 归档条目的数据来源
#[derive(Debug, Clone, PartialEq)]
pub enum EntrySource {
    /// 内存中的字节
    Bytes(Vec<u8>),
    /// 磁盘上的源文件
    File(PathBuf),
}

/// 归档条目
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveEntry {
    /// 条目在归档中的路径
    pub name: String,
    /// 数据来源
    pub source: EntrySource,
}

impl ArchiveEntry {
    fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::Bytes(bytes),
        }
    }
}

/// 计算归档布局
///
/// 顺序固定为：mimetype、container.xml、包文档、按清单顺序的各清单项。
/// 包文档会先经过校验。
pub fn archive_entries(package: &Package, config: &EpubConfig) -> Result<Vec<ArchiveEntry>> {
    package.validate()?;

    let mut entries = vec![
        ArchiveEntry::bytes(MIMETYPE_PATH, EPUB_MIMETYPE.as_bytes().to_vec()),
        ArchiveEntry::bytes(CONTAINER_PATH, Container::for_package(config).to_xml()?),
        ArchiveEntry::bytes(config.package_path(), package.to_xml()?),
    ];

    for item in package.manifest_items() {
        let source = match package.pending_content(&item.href) {
            Some(Content::Inline(bytes)) => EntrySource::Bytes(bytes.clone()),
            Some(Content::File(path)) => EntrySource::File(path.clone()),
            None => return Err(EpubError::SourceFileMissing(PathBuf::from(&item.href))),
        };
        entries.push(ArchiveEntry {
            name: config.item_path(&item.href),
            source,
        });
    }

    Ok(entries)
}

/// 打开源文件，不存在时报告为 [`EpubError::SourceFileMissing`]
fn open_source(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => EpubError::SourceFileMissing(path.to_path_buf()),
        _ => EpubError::Io(e),
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::epub::opf::{DcTag, ManifestItem, SpineItemref};
    use crate::epub::reader::Epub;
    use std::fs;
    use tempfile::TempDir;

    pub(crate) const CHAPTER: &str = "<html xmlns=\"http://www.w3.org/1999/xhtml\"><head><title>Intro</title></head><body><p>Hi</p></body></html>";
    pub(crate) const STYLE: &str = "body { margin: 0 }\n";

    /// 带一个内联章节和一个文件样式表、已生成NCX的包文档
    pub(crate) fn sample_package(dir: &Path) -> Package {
        let style = dir.join("style.css");
        fs::write(&style, STYLE).unwrap();

        let mut package = Package::new();
        package.set_metadata(DcTag::Identifier, "doc-1", &[]).unwrap();
        package.set_metadata(DcTag::Title, "T", &[]).unwrap();
        package
            .add_manifest_item(
                ManifestItem::new("p1", "x.html", "application/xhtml+xml"),
                Content::inline(CHAPTER),
            )
            .unwrap();
        package
            .add_manifest_item(ManifestItem::new("css", "css/style.css", "text/css"), Content::file(&style))
            .unwrap();
        package.add_spine_itemref(SpineItemref::new("p1")).unwrap();
        package.build_ncx(&EpubConfig::default()).unwrap();
        package
    }

    pub(crate) fn read_all(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut epub = Epub::new(path).unwrap();
        let mut names = epub.list_files().unwrap();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let bytes = epub.extract_binary_file(&name).unwrap();
                (name, bytes)
            })
            .collect()
    }

    #[test]
    fn test_archive_layout() {
        let dir = TempDir::new().unwrap();
        let package = sample_package(dir.path());
        let entries = archive_entries(&package, &EpubConfig::default()).unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "mimetype",
                "META-INF/container.xml",
                "OEBPS/content.opf",
                "OEBPS/x.html",
                "OEBPS/css/style.css",
                "OEBPS/toc.ncx",
            ]
        );
        assert_eq!(entries[0].source, EntrySource::Bytes(b"application/epub+zip".to_vec()));
        assert_eq!(entries[4].source, EntrySource::File(dir.path().join("style.css")));
    }

    #[test]
    fn test_archive_entries_require_valid_package() {
        let result = archive_entries(&Package::new(), &EpubConfig::default());
        assert!(matches!(result, Err(EpubError::Validation(_))));
    }

    #[test]
    fn test_missing_source_reported() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.css");
        assert!(matches!(open_source(&missing), Err(EpubError::SourceFileMissing(p)) if p == missing));
    }

    #[test]
    fn test_bundle_method_selects_strategy() {
        let dir = TempDir::new().unwrap();
        let package = sample_package(dir.path());
        let target = dir.path().join("out.epub");

        let bundler = BundleMethod::default().bundler(EpubConfig::default());
        bundler.bundle(&package, &target).unwrap();
        assert!(Epub::new(&target).is_ok());
    }

    #[test]
    fn test_both_strategies_produce_same_contents() {
        // 场景E，需要系统中安装zip
        let config = EpubConfig::default();
        if !config.zip_executable.is_file() {
            return;
        }

        let dir = TempDir::new().unwrap();
        let package = sample_package(dir.path());
        let library_target = dir.path().join("library.epub");
        let process_target = dir.path().join("process.epub");

        LibraryBundler::new(config.clone()).bundle(&package, &library_target).unwrap();
        ProcessBundler::new(config).bundle(&package, &process_target).unwrap();

        let library_entries = read_all(&library_target);
        let process_entries = read_all(&process_target);
        assert_eq!(library_entries.len(), 6);
        assert_eq!(library_entries, process_entries);
    }
}
