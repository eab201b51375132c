use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::epub::opf::ValidationRule;

pub type Result<T> = std::result::Result<T, EpubError>;

/// Epub构建和打包相关的错误类型
#[derive(Error, Debug)]
pub enum EpubError {
    #[error("IO错误: {0}")]
    Io(#[from] io::Error),

    #[error("Zip文件错误: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML错误: {0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("无效的属性 {name}=\"{value}\": {reason}")]
    InvalidAttribute {
        name: String,
        value: String,
        reason: String,
    },

    #[error("未知的DCMES标签: {0}")]
    UnknownTag(String),

    #[error("清单中不存在idref指向的项目: {0}")]
    UnknownIdref(String),

    #[error("清单项 {item} 的fallback无效: {}", .fallback.as_deref().unwrap_or("(缺失)"))]
    UnknownFallback {
        item: String,
        fallback: Option<String>,
    },

    #[error("不允许删除唯一标识符元素: {0}")]
    ProtectedIdentifier(String),

    #[error("源文件不存在或不可读: {}", .0.display())]
    SourceFileMissing(PathBuf),

    #[error("属性互相冲突: {0}")]
    ConflictingProperties(String),

    #[error("包文档校验失败: {0}")]
    Validation(ValidationRule),

    #[error("无效的脊柱项 (位置 {position}): {reason}")]
    MalformedSpineItem { position: usize, reason: String },

    #[error("写入归档条目 {entry} 失败: {source}")]
    ArchiveWrite {
        entry: String,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("归档命令执行失败 ({command}), 退出码 {}: {output}", .status.map(|s| s.to_string()).unwrap_or_else(|| "无".to_string()))]
    ArchiveProcess {
        command: String,
        status: Option<i32>,
        output: String,
    },

    #[error("文件不是有效的EPUB格式: {0}")]
    InvalidEpub(String),

    #[error("缺少mimetype文件")]
    MissingMimetype,

    #[error("无效的mimetype: {expected}, 找到: {found}")]
    InvalidMimetype { expected: String, found: String },

    #[error("container.xml解析错误: {0}")]
    ContainerParseError(String),

    #[error("配置文件错误: {0}")]
    ConfigError(String),
}

impl EpubError {
    /// 构造属性错误
    pub(crate) fn invalid_attribute(
        name: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        EpubError::InvalidAttribute {
            name: name.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// 构造归档条目写入错误
    pub(crate) fn archive_write(entry: impl Into<String>, source: impl Into<zip::result::ZipError>) -> Self {
        EpubError::ArchiveWrite {
            entry: entry.into(),
            source: source.into(),
        }
    }
}
