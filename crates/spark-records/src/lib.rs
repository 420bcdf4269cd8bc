//! `spark-records` 提供分隔文本记录的读取编排层：把记录源交出的物理行逐条判定为表头、被过滤行、
//! 故障行或有效记录，并以原始字段或模式类型化值的形式交给调用方。
//!
//! # 教案背景（Why）
//! - 分词（引号、转义、流耗尽检测）与类型转换都是可替换的协作者，真正需要严格约束的是“每一行如何被处置”
//!   以及在这一串决策中保持一致的位置、错误与元数据状态；
//! - 同一会话需要同时服务阻塞调用方与异步调用方，两者必须观察到完全一致的状态迁移。
//!
//! # 使用概览（How）
//! - 以 [`ReaderOptions`] 描述分隔符与表头开关，可从 TOML 加载；
//! - 通过 [`RecordReader::new`]、[`RecordReader::with_schema`]、[`RecordReader::with_selector`] 或
//!   [`RecordReader::builder`] 构造会话，并绑定实现 [`RecordSource`] / [`AsyncRecordSource`] 的记录源；
//! - 调用 `advance` / `skip` / `current_values` / `resolved_schema`（或对应的 `*_async` 形态）驱动读取。
//!
//! # 合约说明（What）
//! - `physical_record_count` 统计从记录源消费的每一行，含表头、被过滤、被显式跳过与出错的行；
//! - `logical_record_count` 只统计成功推进返回的记录；
//! - 记录处理故障（语法、列数、转换）可经 [`ErrorChannel`] 恢复，未恢复时会话永久锁定。
//!
//! # 风险提示（Trade-offs）
//! - 会话是单游标、严格顺序的；不要在一次异步调用尚未完成时发起下一次调用；
//! - 锁定后无法解锁，只能丢弃会话，按已达到的物理行计数在剩余输入上重建。

pub mod error;
pub mod hooks;
pub mod metadata;
pub mod options;
pub mod reader;
pub mod schema;
pub mod source;
pub mod value;

mod protocol;

pub use crate::error::{
    ErrorClass, FaultReason, Operation, ReaderError, RecordFault, Result, UsageReason, codes,
};
pub use crate::hooks::{ErrorChannel, FaultDisposition, RawRow, SkipFilter};
pub use crate::metadata::RecordMetadata;
pub use crate::options::ReaderOptions;
pub use crate::reader::{RecordReader, RecordReaderBuilder, Records};
pub use crate::schema::{
    Column, ColumnKind, ColumnType, ParseContext, Schema, SchemaConfig, SchemaRef, SchemaSelector,
};
pub use crate::source::{AsyncRecordSource, MemorySource, Pulled, RecordSource, SourceError};
pub use crate::value::Value;
