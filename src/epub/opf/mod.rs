//! OPF（Open Packaging Format）包文档模块
//!
//! 此模块提供EPUB 3.0包文档的内存模型，包括元数据、清单、脊柱的修改操作，
//! 以及打包前的结构校验。

mod metadata;
mod manifest;
mod spine;
mod package;
pub mod validator;

// 重新导出公共类型
pub use metadata::{
    AttributeKind,
    DcElement,
    DcTag,
    Direction,
    MetaAttribute,
    MetaProperty,
    MetadataEntry,
    DC_NAMESPACE,
};
pub use manifest::{is_core_media_type, Content, ItemProperty, ManifestItem, CORE_MEDIA_TYPES};
pub use spine::{SpineItemref, SpreadProperty};
pub use package::{
    Package,
    DEFAULT_LANGUAGE,
    DEFAULT_TITLE,
    DEFAULT_UNIQUE_IDENTIFIER,
    DEFAULT_VERSION,
    MODIFIED_PROPERTY,
    OPF_NAMESPACE,
};
pub use validator::{validate, ValidationRule};
