//! # error 模块说明
//!
//! ## 角色定位（Why）
//! - 为记录读取会话对外暴露的全部失败语义提供集中定义：配置错误、用法错误、记录处理故障与底层源故障；
//! - 每个变体都映射到稳定的点分错误码与 [`ErrorClass`]，便于日志与告警按类别聚合。
//!
//! ## 设计要求（What）
//! - 所有错误类型派生 `thiserror::Error`，可直接与 `?` 运算符协作；
//! - 只有 [`RecordFault`] 能被错误通道拦截，其余错误一律直达调用方；
//! - 记录处理故障与源故障若未被恢复，会令会话进入终止态（见 `reader` 模块）。

use std::{borrow::Cow, fmt, io};

use thiserror::Error;

/// 稳定错误码命名空间，遵循 `<域>.<类别>.<语义>` 约定。
pub mod codes {
    /// 构造参数或选项不合法。
    pub const CONFIG_INVALID: &str = "records.config.invalid";
    /// 会话已因未恢复的故障进入终止态。
    pub const USAGE_READING_WITH_ERRORS: &str = "records.usage.reading_with_errors";
    /// 尚未成功推进过任何记录。
    pub const USAGE_NO_CURRENT_RECORD: &str = "records.usage.no_current_record";
    /// 记录流已经耗尽。
    pub const USAGE_END_OF_STREAM: &str = "records.usage.end_of_stream";
    /// 既无表头、也无固定模式或选择器，模式无法确定。
    pub const USAGE_SCHEMA_NOT_DEFINED: &str = "records.usage.schema_not_defined";
    /// 分词器报告的原始语法错误。
    pub const FAULT_MALFORMED_SYNTAX: &str = "records.fault.malformed_syntax";
    /// 原始字段数不满足模式要求。
    pub const FAULT_WRONG_COLUMN_COUNT: &str = "records.fault.wrong_column_count";
    /// 模式驱动的类型转换失败。
    pub const FAULT_INVALID_CONVERSION: &str = "records.fault.invalid_conversion";
    /// 底层字符流读取失败。
    pub const SOURCE_IO: &str = "records.source.io";
}

/// `Result` 别名，默认错误类型为 [`ReaderError`]。
pub type Result<T, E = ReaderError> = core::result::Result<T, E>;

/// 底层原因的装箱形式，保持 `Send + Sync` 以便跨任务传递。
pub type FaultCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 错误的处置类别。
///
/// - `Configuration`：构造期即失败，会话从未建立；
/// - `Usage`：当前调用非法，不会额外锁定会话；
/// - `RecordProcessing`：可经错误通道恢复，未恢复时锁定会话；
/// - `Source`：字符流本身失败，会话直接锁定。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorClass {
    Configuration,
    Usage,
    RecordProcessing,
    Source,
}

/// 触发错误的公开操作。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Operation {
    /// 推进到下一条逻辑记录。
    Advance,
    /// 丢弃下一条物理行。
    Skip,
    /// 读取当前记录的值。
    CurrentValues,
    /// 查询已解析的模式。
    ResolvedSchema,
}

impl Operation {
    /// 操作的稳定名称，用于错误消息与日志字段。
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::Advance => "advance",
            Operation::Skip => "skip",
            Operation::CurrentValues => "current_values",
            Operation::ResolvedSchema => "resolved_schema",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用法错误的具体原因。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum UsageReason {
    /// 会话此前出现过未恢复的故障。
    ReadingWithErrors,
    /// 尚无成功推进的记录。
    NoCurrentRecord,
    /// 记录流已耗尽。
    EndOfStream,
    /// 模式无法确定。
    SchemaNotDefined,
}

impl UsageReason {
    /// 对应的稳定错误码。
    pub fn code(self) -> &'static str {
        match self {
            UsageReason::ReadingWithErrors => codes::USAGE_READING_WITH_ERRORS,
            UsageReason::NoCurrentRecord => codes::USAGE_NO_CURRENT_RECORD,
            UsageReason::EndOfStream => codes::USAGE_END_OF_STREAM,
            UsageReason::SchemaNotDefined => codes::USAGE_SCHEMA_NOT_DEFINED,
        }
    }
}

impl fmt::Display for UsageReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UsageReason::ReadingWithErrors => "the reader is reading with errors",
            UsageReason::NoCurrentRecord => "no record has been read yet",
            UsageReason::EndOfStream => "the end of the stream has been reached",
            UsageReason::SchemaNotDefined => "schema not defined",
        };
        f.write_str(text)
    }
}

/// 记录处理故障的原因分类。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum FaultReason {
    /// 分词器无法解析该物理行。
    MalformedSyntax,
    /// 原始字段数少于模式需要的物理列数。
    WrongColumnCount,
    /// 模式转换某个字段失败。
    InvalidConversion,
}

impl FaultReason {
    /// 对应的稳定错误码。
    pub fn code(self) -> &'static str {
        match self {
            FaultReason::MalformedSyntax => codes::FAULT_MALFORMED_SYNTAX,
            FaultReason::WrongColumnCount => codes::FAULT_WRONG_COLUMN_COUNT,
            FaultReason::InvalidConversion => codes::FAULT_INVALID_CONVERSION,
        }
    }
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FaultReason::MalformedSyntax => "malformed record syntax",
            FaultReason::WrongColumnCount => "wrong column count",
            FaultReason::InvalidConversion => "invalid conversion",
        };
        f.write_str(text)
    }
}

/// 记录处理故障：唯一可以被错误通道拦截并恢复的错误。
///
/// # 契约说明（What）
/// - `reason`：故障分类；
/// - `physical_record`：出错物理行的 1 基序号，与会话的物理行计数保持一致；
/// - `detail`：面向排障人员的描述；
/// - `cause`：可选底层原因（例如数字解析错误），通过 `source()` 暴露。
#[derive(Debug, Error)]
#[error("{reason} at physical record {physical_record}: {detail}")]
pub struct RecordFault {
    reason: FaultReason,
    physical_record: u64,
    detail: Cow<'static, str>,
    #[source]
    cause: Option<FaultCause>,
}

impl RecordFault {
    /// 构造不带底层原因的故障。
    pub fn new(
        reason: FaultReason,
        physical_record: u64,
        detail: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            reason,
            physical_record,
            detail: detail.into(),
            cause: None,
        }
    }

    /// 附带底层原因。
    pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// 故障分类。
    pub fn reason(&self) -> FaultReason {
        self.reason
    }

    /// 出错物理行的 1 基序号。
    pub fn physical_record(&self) -> u64 {
        self.physical_record
    }

    /// 描述文本。
    pub fn detail(&self) -> &str {
        &self.detail
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        self.reason.code()
    }
}

/// 记录读取会话的统一错误域。
///
/// # 教案式说明
/// - **契约 (What)**：
///   - `Configuration`：构造期参数非法，会话未建立；
///   - `Usage`：在非法会话状态下调用操作，携带 [`Operation`] 与 [`UsageReason`]；
///   - `Record`：未被错误通道恢复的 [`RecordFault`]；
///   - `Source`：底层字符流读取失败，携带已达到的物理行计数。
/// - **执行 (How)**：[`code`](Self::code) 与 [`class`](Self::class) 从变体推导稳定错误码与处置类别，
///   调用方无需解析消息文本。
#[derive(Debug, Error)]
pub enum ReaderError {
    /// 构造参数非法。
    #[error("invalid reader configuration: {detail}")]
    Configuration { detail: String },

    /// 在当前会话状态下不允许执行该操作。
    #[error("cannot perform `{operation}`: {reason}")]
    Usage {
        operation: Operation,
        reason: UsageReason,
    },

    /// 未恢复的记录处理故障。
    #[error(transparent)]
    Record(#[from] RecordFault),

    /// 底层字符流失败。
    #[error("record source failed after physical record {physical_record}: {source}")]
    Source {
        physical_record: u64,
        #[source]
        source: io::Error,
    },
}

impl ReaderError {
    /// 构造配置错误。
    pub fn configuration(detail: impl Into<String>) -> Self {
        ReaderError::Configuration {
            detail: detail.into(),
        }
    }

    /// 构造用法错误。
    pub fn usage(operation: Operation, reason: UsageReason) -> Self {
        ReaderError::Usage { operation, reason }
    }

    /// 稳定错误码。
    pub fn code(&self) -> &'static str {
        match self {
            ReaderError::Configuration { .. } => codes::CONFIG_INVALID,
            ReaderError::Usage { reason, .. } => reason.code(),
            ReaderError::Record(fault) => fault.code(),
            ReaderError::Source { .. } => codes::SOURCE_IO,
        }
    }

    /// 处置类别。
    pub fn class(&self) -> ErrorClass {
        match self {
            ReaderError::Configuration { .. } => ErrorClass::Configuration,
            ReaderError::Usage { .. } => ErrorClass::Usage,
            ReaderError::Record(_) => ErrorClass::RecordProcessing,
            ReaderError::Source { .. } => ErrorClass::Source,
        }
    }

    /// 若为记录处理故障则返回其引用。
    pub fn as_fault(&self) -> Option<&RecordFault> {
        match self {
            ReaderError::Record(fault) => Some(fault),
            _ => None,
        }
    }

    /// 该错误传播出协议后是否会锁定会话。
    pub fn latches_session(&self) -> bool {
        matches!(
            self.class(),
            ErrorClass::RecordProcessing | ErrorClass::Source
        )
    }
}
