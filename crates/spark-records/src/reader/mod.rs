//! # reader 模块
//!
//! ## 角色定位（Why）
//! - [`RecordReader`] 是调用方唯一接触的会话对象：一个会话对应记录流中唯一的前向游标；
//! - 四个公开操作（推进、跳过、读取当前值、查询模式）各有阻塞与可挂起两种形态，契约完全一致。
//!
//! ## 结构（How）
//! - 状态与分支逻辑全部位于 `protocol` 中的 sans-I/O 状态机；
//! - 本模块的阻塞实现与 `nonblocking` 子模块的异步实现只负责“何时拉取一行”，因此两者唯一的区别是
//!   异步形态会在拉取物理行时让出执行权。
//!
//! ## 并发约束
//! - 会话不可被并发或重入调用；`&mut self` 接收者在类型层面保证这一点。

mod builder;
mod nonblocking;

use std::fmt;

use crate::{
    error::{Operation, Result},
    hooks::{ErrorChannel, SkipFilter},
    metadata::RecordMetadata,
    options::ReaderOptions,
    protocol::{AdvanceStep, Protocol},
    schema::{SchemaRef, SchemaSelector},
    source::RecordSource,
    value::Value,
};

pub use builder::RecordReaderBuilder;

/// 分隔文本记录读取会话。
///
/// # 契约说明（What）
/// - `S` 为记录源，实现 [`RecordSource`] 时提供阻塞接口，实现
///   [`AsyncRecordSource`](crate::source::AsyncRecordSource) 时提供 `*_async` 接口与 [`into_stream`](Self::into_stream)；
/// - 任一未恢复的故障都会锁定会话，此后所有操作返回 `reading with errors` 用法错误；
/// - [`current_values`](Self::current_values) 返回副本，调用方修改返回值不会影响会话。
///
/// # 示例
/// ```
/// use spark_records::{MemorySource, ReaderOptions, RecordReader, Value};
///
/// let source = MemorySource::new([["a", "b"], ["1", "2"]]);
/// let mut reader = RecordReader::new(source, ReaderOptions::default().with_header(true))?;
/// assert!(reader.advance()?);
/// assert_eq!(reader.current_values()?, vec![Value::from("1"), Value::from("2")]);
/// assert!(!reader.advance()?);
/// # Ok::<(), spark_records::ReaderError>(())
/// ```
pub struct RecordReader<S> {
    pub(crate) source: S,
    pub(crate) protocol: Protocol,
}

impl RecordReader<()> {
    /// 以给定选项开始构造会话。
    pub fn builder(options: ReaderOptions) -> RecordReaderBuilder {
        RecordReaderBuilder::new(options)
    }
}

impl<S> RecordReader<S> {
    /// 无模式会话；开启表头时由首行推断字符串模式。
    pub fn new(source: S, options: ReaderOptions) -> Result<Self> {
        RecordReaderBuilder::new(options).build(source)
    }

    /// 固定模式会话。
    pub fn with_schema(source: S, options: ReaderOptions, schema: SchemaRef) -> Result<Self> {
        RecordReaderBuilder::new(options).schema(schema).build(source)
    }

    /// 逐条选择模式的会话。
    pub fn with_selector(
        source: S,
        options: ReaderOptions,
        selector: impl SchemaSelector + 'static,
    ) -> Result<Self> {
        RecordReaderBuilder::new(options)
            .selector(selector)
            .build(source)
    }

    /// 替换跳过过滤器；传入 `None` 表示不再过滤。
    pub fn set_skip_filter(&mut self, filter: Option<Box<dyn SkipFilter>>) {
        self.protocol.set_skip_filter(filter);
    }

    /// 替换错误通道；传入 `None` 表示所有故障都向调用方传播。
    pub fn set_error_channel(&mut self, channel: Option<Box<dyn ErrorChannel>>) {
        self.protocol.set_error_channel(channel);
    }

    /// 计数器与已提交模式的只读视图。
    pub fn metadata(&self) -> &RecordMetadata {
        self.protocol.metadata()
    }

    /// 记录源是否已报告耗尽。
    pub fn end_of_file(&self) -> bool {
        self.protocol.end_of_file()
    }

    /// 会话是否已被未恢复的错误锁定。
    pub fn has_error(&self) -> bool {
        self.protocol.has_error()
    }

    /// 最近一次成功推进得到的值（副本）。
    ///
    /// 尚未成功推进、流已耗尽或会话已锁定时返回用法错误。
    pub fn current_values(&mut self) -> Result<Vec<Value>> {
        self.protocol.current_values()
    }

    /// 释放会话，取回记录源。
    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: RecordSource> RecordReader<S> {
    fn pull(&mut self) -> crate::source::Pulled {
        self.protocol.begin_pull();
        self.source.read_record()
    }

    fn resolve_header(&mut self, operation: Operation) -> Result<()> {
        if self.protocol.needs_header() {
            let pulled = self.pull();
            self.protocol.accept_header(operation, pulled)?;
        }
        Ok(())
    }

    /// 推进到下一条逻辑记录；返回 `false` 表示记录流已耗尽。
    ///
    /// # 逻辑（How）
    /// 1. 检查错误锁存，首次调用时解析表头；
    /// 2. 循环拉取物理行，被过滤或故障已处理的行不产出记录；
    /// 3. 产出记录或记录源耗尽时返回。
    pub fn advance(&mut self) -> Result<bool> {
        self.protocol.ensure_usable(Operation::Advance)?;
        self.resolve_header(Operation::Advance)?;
        while self.protocol.can_pull() {
            let pulled = self.pull();
            match self.protocol.accept_advance(pulled)? {
                AdvanceStep::Produced => return Ok(true),
                AdvanceStep::Continue => {}
                AdvanceStep::Exhausted => break,
            }
        }
        Ok(false)
    }

    /// 不经过滤与模式处理，直接丢弃下一条物理行；返回是否消费了一行。
    ///
    /// 当前记录缓冲保持不变。
    pub fn skip(&mut self) -> Result<bool> {
        self.protocol.ensure_usable(Operation::Skip)?;
        self.resolve_header(Operation::Skip)?;
        if !self.protocol.can_pull() {
            return Ok(false);
        }
        let pulled = self.pull();
        self.protocol.accept_skip(pulled)
    }

    /// 会话模式；首次调用可能消费表头行。
    ///
    /// 选择器会话返回 `Ok(None)`；既无表头、也无固定模式或选择器时返回 `schema not defined` 用法错误。
    pub fn resolved_schema(&mut self) -> Result<Option<SchemaRef>> {
        self.protocol.ensure_usable(Operation::ResolvedSchema)?;
        self.resolve_header(Operation::ResolvedSchema)?;
        self.protocol.resolved_schema()
    }

    /// 逐条产出记录的阻塞迭代器；遇到错误时产出该错误后结束。
    pub fn records(&mut self) -> Records<'_, S> {
        Records {
            reader: self,
            finished: false,
        }
    }
}

impl<S> fmt::Debug for RecordReader<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordReader")
            .field("metadata", self.protocol.metadata())
            .field("end_of_file", &self.protocol.end_of_file())
            .field("has_error", &self.protocol.has_error())
            .finish_non_exhaustive()
    }
}

/// [`RecordReader::records`] 返回的迭代器。
#[derive(Debug)]
pub struct Records<'a, S> {
    reader: &'a mut RecordReader<S>,
    finished: bool,
}

impl<S: RecordSource> Iterator for Records<'_, S> {
    type Item = Result<Vec<Value>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let item = match self.reader.advance() {
            Ok(true) => self.reader.current_values(),
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(err) => Err(err),
        };
        if item.is_err() {
            self.finished = true;
        }
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use crate::source::{MemorySource, SourceError};

    #[test]
    fn header_row_is_never_returned_as_data() {
        let source = MemorySource::new([["a", "b", "c"], ["1", "2", "3"], ["4", "5", "6"]]);
        let mut reader =
            RecordReader::new(source, ReaderOptions::default().with_header(true)).expect("构造");
        let rows = reader
            .records()
            .collect::<Result<Vec<_>>>()
            .expect("全部合法");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0][0], Value::from("1"));
        assert_eq!(reader.metadata().physical_record_count(), 3);
        assert_eq!(reader.metadata().logical_record_count(), 2);
    }

    #[test]
    fn records_iterator_stops_after_first_error() {
        let source = MemorySource::from_results([
            Ok(vec!["ok".to_owned()]),
            Err(SourceError::syntax(2, "unterminated quote")),
            Ok(vec!["never".to_owned()]),
        ]);
        let mut reader = RecordReader::new(source, ReaderOptions::default()).expect("构造");
        let items = reader.records().collect::<Vec<_>>();
        assert_eq!(items.len(), 2);
        let err = items[1].as_ref().expect_err("第二项为故障");
        assert_eq!(err.code(), codes::FAULT_MALFORMED_SYNTAX);
        assert!(reader.has_error());
    }

    #[test]
    fn skip_keeps_current_record_visible() {
        let source = MemorySource::new([["a"], ["b"], ["c"]]);
        let mut reader = RecordReader::new(source, ReaderOptions::default()).expect("构造");
        assert!(reader.advance().expect("首行"));
        assert!(reader.skip().expect("跳过"));
        assert_eq!(reader.current_values().expect("仍可见"), vec![Value::from("a")]);
        assert!(reader.advance().expect("第三行"));
        assert_eq!(reader.current_values().expect("当前"), vec![Value::from("c")]);
        assert_eq!(reader.metadata().physical_record_count(), 3);
    }

    #[test]
    fn advance_after_exhaustion_does_not_touch_source() {
        let mut reader =
            RecordReader::new(MemorySource::default(), ReaderOptions::default()).expect("构造");
        assert!(!reader.advance().expect("空流"));
        assert!(reader.end_of_file());
        assert!(!reader.advance().expect("再次推进"));
        assert!(!reader.skip().expect("跳过"));
        assert_eq!(reader.metadata().physical_record_count(), 0);
    }
}
