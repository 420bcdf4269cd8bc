//! # source 模块
//!
//! 记录源是协议的上游协作者：每次调用交出一个物理行的字段列表，或报告流已耗尽。
//!
//! - [`RecordSource`]：阻塞形态；
//! - [`AsyncRecordSource`]：可挂起形态，只在拉取物理行时让出执行权；
//! - [`MemorySource`]：已切分好的内存行，可同时充当两种形态，适合预分词数据与测试。
//!
//! 分词器需保证“安全重读”：报告语法错误后，下一次调用从下一个物理行重新开始。

use std::{collections::VecDeque, io};

use async_trait::async_trait;
use thiserror::Error;

/// 记录源失败。
///
/// - `Syntax`：当前物理行无法分词，可经错误通道恢复；
/// - `Io`：字符流本身失败，会话随即锁定。
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("syntax error on line {line}: {message}")]
    Syntax { line: u64, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl SourceError {
    /// 构造语法错误；`line` 为分词器自身统计的文本行号。
    pub fn syntax(line: u64, message: impl Into<String>) -> Self {
        SourceError::Syntax {
            line,
            message: message.into(),
        }
    }
}

/// 单次拉取的结果：字段、流结束或失败。
pub type Pulled = Result<Option<Vec<String>>, SourceError>;

/// 阻塞记录源。
pub trait RecordSource {
    /// 读取下一个物理行；`Ok(None)` 表示流已耗尽。
    fn read_record(&mut self) -> Pulled;

    /// 流是否已经耗尽。
    ///
    /// 仅供诊断：读取会话只以 `read_record` 返回 `Ok(None)` 判断流结束，不调用本方法。
    fn is_end_of_stream(&self) -> bool;
}

/// 可挂起记录源。
///
/// 与 [`RecordSource`] 契约一致，仅 `read_record` 允许在等待数据时挂起。
#[async_trait]
pub trait AsyncRecordSource: Send {
    /// 读取下一个物理行；`Ok(None)` 表示流已耗尽。
    async fn read_record(&mut self) -> Pulled;

    /// 流是否已经耗尽。
    ///
    /// 仅供诊断：读取会话只以 `read_record` 返回 `Ok(None)` 判断流结束，不调用本方法。
    fn is_end_of_stream(&self) -> bool;
}

impl<S: RecordSource + ?Sized> RecordSource for Box<S> {
    fn read_record(&mut self) -> Pulled {
        (**self).read_record()
    }

    fn is_end_of_stream(&self) -> bool {
        (**self).is_end_of_stream()
    }
}

#[async_trait]
impl<S: AsyncRecordSource + ?Sized> AsyncRecordSource for Box<S> {
    async fn read_record(&mut self) -> Pulled {
        (**self).read_record().await
    }

    fn is_end_of_stream(&self) -> bool {
        (**self).is_end_of_stream()
    }
}

/// 内存记录源：按顺序交出预先准备的行或失败。
#[derive(Debug, Default)]
pub struct MemorySource {
    items: VecDeque<Pulled>,
    exhausted: bool,
}

impl MemorySource {
    /// 由已切分的行构造。
    pub fn new<I, R, F>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = F>,
        F: Into<String>,
    {
        Self::from_results(
            rows.into_iter()
                .map(|row| Ok(row.into_iter().map(Into::into).collect())),
        )
    }

    /// 由逐条结果构造，可在任意位置插入语法错误或 I/O 失败。
    pub fn from_results<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Result<Vec<String>, SourceError>>,
    {
        Self {
            items: items.into_iter().map(|item| item.map(Some)).collect(),
            exhausted: false,
        }
    }

    /// 尚未交出的条目数。
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    fn next_item(&mut self) -> Pulled {
        match self.items.pop_front() {
            Some(item) => item,
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }
}

impl RecordSource for MemorySource {
    fn read_record(&mut self) -> Pulled {
        self.next_item()
    }

    fn is_end_of_stream(&self) -> bool {
        self.exhausted
    }
}

#[async_trait]
impl AsyncRecordSource for MemorySource {
    async fn read_record(&mut self) -> Pulled {
        self.next_item()
    }

    fn is_end_of_stream(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_source_replays_rows_then_reports_end() {
        let mut source = MemorySource::new([["a", "b"], ["c", "d"]]);
        assert_eq!(
            RecordSource::read_record(&mut source).expect("首行"),
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert!(!RecordSource::is_end_of_stream(&source));
        assert!(RecordSource::read_record(&mut source).expect("次行").is_some());
        assert!(RecordSource::read_record(&mut source).expect("结束").is_none());
        assert!(RecordSource::is_end_of_stream(&source));
    }

    #[test]
    fn memory_source_async_form_matches_blocking_form() {
        let mut source = MemorySource::from_results([
            Ok(vec!["x".to_owned()]),
            Err(SourceError::syntax(2, "unterminated quote")),
        ]);
        futures::executor::block_on(async {
            assert!(AsyncRecordSource::read_record(&mut source).await.expect("首行").is_some());
            let err = AsyncRecordSource::read_record(&mut source)
                .await
                .expect_err("第二条为语法错误");
            assert!(matches!(err, SourceError::Syntax { line: 2, .. }));
            assert!(AsyncRecordSource::read_record(&mut source).await.expect("结束").is_none());
        });
    }
}
