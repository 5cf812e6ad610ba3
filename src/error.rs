use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// PDF 文档相关错误
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
    /// OCR 协作方错误
    #[error("OCR错误: {0}")]
    Ocr(#[from] OcrError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// PDF 文档错误
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 文件根本无法解析为 PDF（CorruptDocumentError）
    #[error("无法解析PDF文档: {source}")]
    Corrupt {
        #[source]
        source: lopdf::Error,
    },
    /// 单页图像解码失败，只影响该页
    #[error("第 {page} 页图像解码失败: {reason}")]
    PageDecode { page: usize, reason: String },
}

/// OCR 协作方错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// OCR 服务不可用（OcrUnavailableError）
    #[error("OCR服务不可用 ({engine}): {source}")]
    Unavailable {
        engine: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 单次调用超时
    #[error("OCR调用超时 ({engine}): 超过 {seconds} 秒")]
    Timeout { engine: String, seconds: u64 },
    /// 返回了无法使用的结果
    #[error("OCR返回无效结果 ({engine}): {message}")]
    BadResponse { engine: String, message: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 报告序列化失败
    #[error("JSON序列化失败 ({path}): {source}")]
    SerializeFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 考试配置不合法
    #[error("考试配置不合法: {reason}")]
    InvalidExam { reason: String },
    /// 学号正则无法编译
    #[error("学号正则 '{pattern}' 无效: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

// ========== 从常见错误类型转换 ==========

impl From<lopdf::Error> for AppError {
    fn from(err: lopdf::Error) -> Self {
        AppError::Document(DocumentError::Corrupt { source: err })
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建目录不存在错误
    pub fn directory_not_found(path: impl Into<String>) -> Self {
        AppError::File(FileError::DirectoryNotFound { path: path.into() })
    }

    /// 创建考试配置错误
    pub fn invalid_exam(reason: impl Into<String>) -> Self {
        AppError::Config(ConfigError::InvalidExam {
            reason: reason.into(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
