//! NCX（Navigation Control file for XML）生成模块
//!
//! 此模块根据包文档的脊柱顺序生成NCX导航控制文件，供不支持EPUB 3导航文档的旧阅读器使用。

pub mod navigation;
pub mod builder;

// 重新导出公共类型
pub use navigation::{
    DocAuthor,
    DocTitle,
    NavContent,
    NavLabel,
    NavMap,
    NavPoint,
    Ncx,
    NcxMetadata,
    NCX_NAMESPACE,
    NCX_VERSION,
};
pub use builder::{build_ncx, extract_title, GENERATOR, NCX_HREF, NCX_ID, NCX_MEDIA_TYPE};
