//! 构建配置模块
//!
//! 提供内容目录、包文档文件名、通用标题模板和外部zip命令等配置项，
//! 支持从YAML文件加载配置。

use crate::epub::error::{EpubError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "epubpack.yaml";

/// 参数模板中被替换为归档路径的占位符
pub const FILENAME_PLACEHOLDER: &str = "!filename";

/// 通用标题模板中被替换为序号的占位符
pub const TITLE_PLACEHOLDER: &str = "{}";

/// EPUB构建与打包配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EpubConfig {
    /// 归档中存放清单项的目录
    pub content_dir: String,
    /// 包文档文件名
    pub package_filename: String,
    /// 无法从内容中提取标题时使用的模板，包含一个 `{}` 占位符
    pub title_pattern: String,
    /// 外部zip可执行文件路径
    pub zip_executable: PathBuf,
    /// 批量添加（除mimetype外）的参数模板
    pub zip_args: String,
    /// 以不压缩方式添加mimetype的参数模板
    pub zip_args_mimetype: String,
    /// 表示zip执行成功的退出码
    pub zip_success: i32,
}

impl Default for EpubConfig {
    fn default() -> Self {
        Self::default_config()
    }
}

impl EpubConfig {
    /// 获取默认配置
    pub fn default_config() -> Self {
        Self {
            content_dir: "OEBPS".to_string(),
            package_filename: "content.opf".to_string(),
            title_pattern: "Page {}".to_string(),
            zip_executable: PathBuf::from("/usr/bin/zip"),
            zip_args: "-X -D -UN=UTF8 -r !filename . -x mimetype".to_string(),
            zip_args_mimetype: "-X -0 -UN=UTF8 !filename mimetype".to_string(),
            zip_success: 0,
        }
    }

    /// 从YAML配置文件加载，未出现的字段使用默认值
    ///
    /// # 示例
    ///
    /// ```rust,no_run
    /// use epubpack::EpubConfig;
    /// let config = EpubConfig::from_file("epubpack.yaml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| EpubError::ConfigError(format!("无法读取配置文件: {}", e)))?;
        Self::from_yaml(&content)
    }

    /// 从YAML字符串解析并校验
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yml::from_str(content)
            .map_err(|e| EpubError::ConfigError(format!("配置文件格式错误: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 生成默认配置文件
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let yaml_content = serde_yml::to_string(&Self::default_config())
            .map_err(|e| EpubError::ConfigError(format!("序列化配置失败: {}", e)))?;

        let content_with_header = format!(
            "# epubpack 构建配置文件\n# title_pattern 中的 {{}} 会被替换为序号\n# zip参数中的 !filename 会被替换为归档路径\n\n{}",
            yaml_content
        );

        fs::write(path.as_ref(), content_with_header)
            .map_err(|e| EpubError::ConfigError(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }

    /// 校验模板和路径配置
    pub fn validate(&self) -> Result<()> {
        if self.content_dir.trim().is_empty() || self.content_dir.contains("..") {
            return Err(EpubError::ConfigError(format!("无效的content_dir: {:?}", self.content_dir)));
        }
        if self.package_filename.trim().is_empty() || self.package_filename.contains('/') {
            return Err(EpubError::ConfigError(format!(
                "无效的package_filename: {:?}",
                self.package_filename
            )));
        }
        if self.title_pattern.matches(TITLE_PLACEHOLDER).count() != 1 {
            return Err(EpubError::ConfigError(
                "title_pattern 必须且只能包含一个 {} 占位符".to_string(),
            ));
        }
        for (name, template) in [("zip_args", &self.zip_args), ("zip_args_mimetype", &self.zip_args_mimetype)] {
            if template.matches(FILENAME_PLACEHOLDER).count() != 1 {
                return Err(EpubError::ConfigError(format!(
                    "{} 必须且只能包含一个 !filename 占位符",
                    name
                )));
            }
        }
        Ok(())
    }

    /// 按模板生成通用标题
    pub fn generic_title(&self, index: u32) -> String {
        self.title_pattern.replacen(TITLE_PLACEHOLDER, &index.to_string(), 1)
    }

    /// 包文档在归档中的完整路径
    pub fn package_path(&self) -> String {
        format!("{}/{}", self.content_dir, self.package_filename)
    }

    /// 清单项在归档中的完整路径
    pub fn item_path(&self, href: &str) -> String {
        format!("{}/{}", self.content_dir, href)
    }
}
