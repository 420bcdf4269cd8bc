#![warn(missing_docs)]

//! `spark-codec-delimited` 把字符流切分为分隔文本记录，作为 `spark-records` 会话的记录源。
//!
//! # 教案背景（Why）
//! - 读取会话只关心“下一个物理行的字段列表”，引号、转义与跨行字段的处理交由本 crate 完成；
//! - 阻塞与异步两种输入共用同一个无 I/O 的 [`FieldSplitter`]，因此两者交出的记录逐字节一致。
//!
//! # 使用概览（How）
//! - 阻塞：`DelimitedTokenizer::new(reader, &options)`，其中 `reader: impl BufRead`；
//! - 异步（默认启用的 `runtime-tokio` 特性）：`AsyncDelimitedTokenizer::new(reader, &options)`，
//!   其中 `reader: impl tokio::io::AsyncBufRead`；
//! - 将分词器交给 `spark_records::RecordReader` 的任一构造函数即可。
//!
//! # 合约说明（What）
//! - 语法错误以 `SourceError::Syntax` 报告，并携带分词器自身统计的文本行号；报告后分词器从下一行重新开始；
//! - 底层读取失败以 `SourceError::Io` 报告，会话随即锁定。
//!
//! # 风险提示（Trade-offs）
//! - 记录分隔符必须是单个 ASCII 字符，以便按字节切行；
//! - 跨行引号字段会在内存中累积，超长字段没有上限保护。

mod split;
mod tokenizer;

#[cfg(feature = "runtime-tokio")]
mod async_tokenizer;

pub use crate::split::{FieldSplitter, Split};
pub use crate::tokenizer::DelimitedTokenizer;

#[cfg(feature = "runtime-tokio")]
pub use crate::async_tokenizer::AsyncDelimitedTokenizer;
