//! 会话计数器与模式快照。

use std::sync::Arc;

use crate::{options::ReaderOptions, schema::SchemaRef};

/// 会话元数据：计数器与当前已提交的模式。
///
/// # 契约说明（What）
/// - `physical_record_count`：已从记录源消费的物理行数，含表头、被跳过与出错的行；
/// - `logical_record_count`：经推进操作成功返回的记录数；
/// - 始终满足 `logical_record_count <= physical_record_count`；
/// - `schema` 仅在存在固定模式（调用方提供或表头推断）时为 `Some`。
#[derive(Clone, Debug)]
pub struct RecordMetadata {
    schema: Option<SchemaRef>,
    options: Arc<ReaderOptions>,
    physical_record_count: u64,
    logical_record_count: u64,
}

impl RecordMetadata {
    pub(crate) fn new(options: Arc<ReaderOptions>, schema: Option<SchemaRef>) -> Self {
        Self {
            schema,
            options,
            physical_record_count: 0,
            logical_record_count: 0,
        }
    }

    /// 已提交的会话模式；无模式或选择器会话为 `None`。
    pub fn schema(&self) -> Option<&SchemaRef> {
        self.schema.as_ref()
    }

    /// 会话选项。
    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// 已消费的物理行数。
    pub fn physical_record_count(&self) -> u64 {
        self.physical_record_count
    }

    /// 已返回的逻辑记录数。
    pub fn logical_record_count(&self) -> u64 {
        self.logical_record_count
    }

    pub(crate) fn set_schema(&mut self, schema: SchemaRef) {
        self.schema = Some(schema);
    }

    /// 记录一个物理行，返回其 1 基序号。
    pub(crate) fn count_physical(&mut self) -> u64 {
        self.physical_record_count += 1;
        self.physical_record_count
    }

    /// 记录一个成功返回的逻辑记录，返回其 1 基序号。
    pub(crate) fn count_logical(&mut self) -> u64 {
        self.logical_record_count += 1;
        debug_assert!(self.logical_record_count <= self.physical_record_count);
        self.logical_record_count
    }
}
