//! # 记录读取协议（sans-I/O 状态机）
//!
//! ## 意图（Why）
//! - 阻塞与可挂起两套公开接口必须产生完全一致的状态迁移；
//! - 因此协议本身不做任何 I/O：调用方负责“拉取一个物理行”，再把拉取结果交给 `accept_*` 系列方法，
//!   由协议决定计数、过滤、模式校验、故障路由与锁存。
//!
//! ## 逻辑（How）
//! - 外层驱动（见 `reader` 模块）的固定节奏：
//!   1. [`Protocol::ensure_usable`] 检查锁存；
//!   2. 若 [`Protocol::needs_header`] 为真，拉取一行并交给 [`Protocol::accept_header`]；
//!   3. 推进：循环“拉取 → [`Protocol::accept_advance`]”，直到得到 [`AdvanceStep::Produced`] 或
//!      [`AdvanceStep::Exhausted`]；跳过：拉取一次并交给 [`Protocol::accept_skip`]。
//! - 每次拉取前调用 [`Protocol::begin_pull`]，对应的 `accept_*` 结束该次拉取。若拉取中途被取消
//!   （例如异步 future 被丢弃），下一次操作会发现悬空的拉取并锁定会话。
//!
//! ## 契约（What）
//! - `end_of_file` 与 `has_error` 只会从 `false` 变为 `true`；
//! - 物理行计数在识别出故障之前递增，因此故障携带的序号就是出错行自身的 1 基序号；
//! - 跳过过滤器先于模式校验执行，被过滤的行永远不会触发列数故障。

use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::{
    error::{FaultReason, Operation, ReaderError, RecordFault, Result, UsageReason},
    hooks::{ErrorChannel, FaultDisposition, RawRow, SkipFilter},
    metadata::RecordMetadata,
    options::ReaderOptions,
    schema::{
        ParseContext, SchemaRef,
        binding::{HeaderAction, SchemaBinding},
    },
    source::{Pulled, SourceError},
    value::Value,
};

/// 单次推进拉取的结论。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum AdvanceStep {
    /// 产出一条逻辑记录。
    Produced,
    /// 该行被过滤或故障已被处理，需要继续拉取。
    Continue,
    /// 记录源已耗尽。
    Exhausted,
}

pub(crate) struct Protocol {
    binding: SchemaBinding,
    metadata: RecordMetadata,
    current: Option<Vec<Value>>,
    skip_filter: Option<Box<dyn SkipFilter>>,
    error_channel: Option<Box<dyn ErrorChannel>>,
    end_of_file: bool,
    has_error: bool,
    header_resolved: bool,
    pull_in_flight: bool,
}

impl Protocol {
    pub(crate) fn new(options: Arc<ReaderOptions>, binding: SchemaBinding) -> Self {
        let metadata = RecordMetadata::new(options, binding.committed().cloned());
        Self {
            binding,
            metadata,
            current: None,
            skip_filter: None,
            error_channel: None,
            end_of_file: false,
            has_error: false,
            header_resolved: false,
            pull_in_flight: false,
        }
    }

    pub(crate) fn set_skip_filter(&mut self, filter: Option<Box<dyn SkipFilter>>) {
        self.skip_filter = filter;
    }

    pub(crate) fn set_error_channel(&mut self, channel: Option<Box<dyn ErrorChannel>>) {
        self.error_channel = channel;
    }

    pub(crate) fn metadata(&self) -> &RecordMetadata {
        &self.metadata
    }

    pub(crate) fn end_of_file(&self) -> bool {
        self.end_of_file
    }

    pub(crate) fn has_error(&self) -> bool {
        self.has_error || self.pull_in_flight
    }

    /// 公开操作的前置检查：会话一旦锁定，所有操作立即失败。
    pub(crate) fn ensure_usable(&mut self, operation: Operation) -> Result<()> {
        if self.pull_in_flight && !self.has_error {
            self.latch(operation, "a previous pull was abandoned before completing");
        }
        if self.has_error {
            return Err(ReaderError::usage(operation, UsageReason::ReadingWithErrors));
        }
        Ok(())
    }

    /// 是否仍需从记录源消费表头行。
    ///
    /// 决策只做一次：无需表头时此处直接完成解析；需要时由 [`accept_header`](Self::accept_header) 完成。
    pub(crate) fn needs_header(&mut self) -> bool {
        if self.header_resolved {
            return false;
        }
        if self.end_of_file || self.header_action() == HeaderAction::None {
            self.header_resolved = true;
            return false;
        }
        true
    }

    fn header_action(&self) -> HeaderAction {
        self.binding.header_action(self.metadata.options().has_header)
    }

    /// 记录源的下一次拉取是否可以跳过：流已耗尽后不再访问记录源。
    pub(crate) fn can_pull(&self) -> bool {
        !self.end_of_file
    }

    pub(crate) fn begin_pull(&mut self) {
        self.pull_in_flight = true;
    }

    fn finish_pull(&mut self) {
        self.pull_in_flight = false;
    }

    /// 处理表头行的拉取结果。
    pub(crate) fn accept_header(&mut self, operation: Operation, pulled: Pulled) -> Result<()> {
        self.finish_pull();
        self.header_resolved = true;
        let action = self.header_action();
        match pulled {
            Ok(None) => {
                debug!(action = ?action, "record source is empty, no header row to consume");
                self.end_of_file = true;
                Ok(())
            }
            Ok(Some(fields)) => {
                let physical_record = self.metadata.count_physical();
                if action == HeaderAction::Infer {
                    let schema = self.binding.commit_header(&fields);
                    debug!(
                        physical_record,
                        columns = schema.column_count(),
                        "schema inferred from header row"
                    );
                    self.metadata.set_schema(schema);
                } else {
                    debug!(physical_record, "header row discarded");
                }
                Ok(())
            }
            Err(err) => self.accept_source_error(operation, err).map(drop),
        }
    }

    /// 处理推进循环中一次拉取的结果。
    pub(crate) fn accept_advance(&mut self, pulled: Pulled) -> Result<AdvanceStep> {
        self.finish_pull();
        let fields = match pulled {
            Ok(Some(fields)) => fields,
            Ok(None) => {
                self.end_of_file = true;
                self.current = None;
                trace!(
                    physical_records = self.metadata.physical_record_count(),
                    logical_records = self.metadata.logical_record_count(),
                    "record source exhausted"
                );
                return Ok(AdvanceStep::Exhausted);
            }
            Err(err) => {
                return self
                    .accept_source_error(Operation::Advance, err)
                    .map(|_| AdvanceStep::Continue);
            }
        };

        let physical_record = self.metadata.count_physical();
        if let Some(filter) = self.skip_filter.as_mut()
            && filter.should_skip(RawRow::new(physical_record, &fields))
        {
            trace!(physical_record, "row dropped by skip filter");
            return Ok(AdvanceStep::Continue);
        }

        let values = match self.binding.resolve(&fields) {
            None => fields.into_iter().map(Value::from).collect(),
            Some(schema) => match self.apply_schema(&schema, physical_record, &fields) {
                Ok(values) => values,
                Err(fault) => {
                    self.route_fault(Operation::Advance, fault)?;
                    return Ok(AdvanceStep::Continue);
                }
            },
        };

        self.current = Some(values);
        let logical_record = self.metadata.count_logical();
        trace!(physical_record, logical_record, "record produced");
        Ok(AdvanceStep::Produced)
    }

    fn apply_schema(
        &self,
        schema: &SchemaRef,
        physical_record: u64,
        fields: &[String],
    ) -> core::result::Result<Vec<Value>, RecordFault> {
        if schema.lacks_fields(fields.len()) {
            return Err(RecordFault::new(
                FaultReason::WrongColumnCount,
                physical_record,
                format!(
                    "expected at least {} raw fields, found {}",
                    schema.physical_column_count(),
                    fields.len()
                ),
            ));
        }
        let ctx = ParseContext {
            physical_record,
            logical_record: self.metadata.logical_record_count() + 1,
        };
        schema.parse_values(&ctx, fields).map_err(|err| {
            RecordFault::new(
                FaultReason::InvalidConversion,
                physical_record,
                format!("column `{}` rejected {:?}", err.column(), err.value()),
            )
            .with_cause(err)
        })
    }

    /// 处理显式跳过的拉取结果；返回是否消费了一行。
    pub(crate) fn accept_skip(&mut self, pulled: Pulled) -> Result<bool> {
        self.finish_pull();
        match pulled {
            Ok(Some(_)) => {
                let physical_record = self.metadata.count_physical();
                trace!(physical_record, "row skipped");
                Ok(true)
            }
            Ok(None) => {
                self.end_of_file = true;
                Ok(false)
            }
            Err(err) => self.accept_source_error(Operation::Skip, err),
        }
    }

    /// 记录源失败：语法错误按故障路由，被处理时视为已消费一行；I/O 错误直接锁定会话。
    ///
    /// 语法故障先递增物理行计数再构造，因此携带的是出错行自身的 1 基行号，与列数、转换故障一致。
    fn accept_source_error(&mut self, operation: Operation, err: SourceError) -> Result<bool> {
        match err {
            SourceError::Syntax { .. } => {
                let physical_record = self.metadata.count_physical();
                let fault = RecordFault::new(
                    FaultReason::MalformedSyntax,
                    physical_record,
                    "the record source could not tokenize this row",
                )
                .with_cause(err);
                self.route_fault(operation, fault)?;
                Ok(true)
            }
            SourceError::Io(source) => {
                let physical_record = self.metadata.physical_record_count();
                self.latch(operation, "record source failed");
                Err(ReaderError::Source {
                    physical_record,
                    source,
                })
            }
        }
    }

    /// 把故障交给错误通道；未被处理时锁定会话并原样返回。
    fn route_fault(&mut self, operation: Operation, fault: RecordFault) -> Result<()> {
        let disposition = match self.error_channel.as_mut() {
            Some(channel) => channel.on_fault(&fault),
            None => FaultDisposition::Propagate,
        };
        match disposition {
            FaultDisposition::Handled => {
                debug!(
                    physical_record = fault.physical_record(),
                    reason = fault.code(),
                    "record fault handled by error channel"
                );
                Ok(())
            }
            FaultDisposition::Propagate => {
                self.latch(operation, fault.code());
                Err(fault.into())
            }
        }
    }

    fn latch(&mut self, operation: Operation, reason: &str) {
        self.has_error = true;
        self.current = None;
        warn!(
            operation = operation.as_str(),
            reason,
            physical_record = self.metadata.physical_record_count(),
            "record reader latched after an unrecovered error"
        );
    }

    /// 当前记录的副本。
    pub(crate) fn current_values(&mut self) -> Result<Vec<Value>> {
        self.ensure_usable(Operation::CurrentValues)?;
        if self.end_of_file {
            return Err(ReaderError::usage(
                Operation::CurrentValues,
                UsageReason::EndOfStream,
            ));
        }
        self.current.clone().ok_or_else(|| {
            ReaderError::usage(Operation::CurrentValues, UsageReason::NoCurrentRecord)
        })
    }

    /// 表头解析完成后的会话模式；选择器模式返回 `None`。
    pub(crate) fn resolved_schema(&self) -> Result<Option<SchemaRef>> {
        match &self.binding {
            SchemaBinding::Committed(schema) => Ok(Some(Arc::clone(schema))),
            SchemaBinding::Selected(_) => Ok(None),
            SchemaBinding::Raw => Err(ReaderError::usage(
                Operation::ResolvedSchema,
                UsageReason::SchemaNotDefined,
            )),
        }
    }
}
