use std::sync::Arc;

use crate::{
    error::{ReaderError, Result},
    hooks::{ErrorChannel, SkipFilter},
    options::ReaderOptions,
    protocol::Protocol,
    schema::{SchemaRef, SchemaSelector, binding::SchemaBinding},
};

use super::RecordReader;

/// [`RecordReader`] 的构造器。
///
/// # 教案式说明
/// - **意图 (Why)**：把“选项校验 + 模式来源 + 钩子注册”集中在一处完成，保证任何非法组合都在读取第一行之前
///   以配置错误失败；
/// - **契约 (What)**：
///   - 固定模式与选择器互斥，同时提供即为配置错误；
///   - 固定模式至少包含一列；
///   - 选项需通过 [`ReaderOptions::validate`]；
/// - **风险提示 (Trade-offs)**：钩子以 trait 对象保存，每次调用一次虚分派；相对逐行 I/O 可以忽略。
pub struct RecordReaderBuilder {
    options: ReaderOptions,
    schema: Option<SchemaRef>,
    selector: Option<Arc<dyn SchemaSelector>>,
    skip_filter: Option<Box<dyn SkipFilter>>,
    error_channel: Option<Box<dyn ErrorChannel>>,
}

impl RecordReaderBuilder {
    pub(crate) fn new(options: ReaderOptions) -> Self {
        Self {
            options,
            schema: None,
            selector: None,
            skip_filter: None,
            error_channel: None,
        }
    }

    /// 使用固定模式。
    pub fn schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    /// 使用逐条记录的模式选择器。
    pub fn selector(mut self, selector: impl SchemaSelector + 'static) -> Self {
        self.selector = Some(Arc::new(selector));
        self
    }

    /// 注册跳过过滤器。
    pub fn skip_filter(mut self, filter: impl SkipFilter + 'static) -> Self {
        self.skip_filter = Some(Box::new(filter));
        self
    }

    /// 注册错误通道。
    pub fn error_channel(mut self, channel: impl ErrorChannel + 'static) -> Self {
        self.error_channel = Some(Box::new(channel));
        self
    }

    /// 校验配置并绑定记录源。
    pub fn build<S>(self, source: S) -> Result<RecordReader<S>> {
        self.options.validate()?;
        let binding = match (self.schema, self.selector) {
            (Some(_), Some(_)) => {
                return Err(ReaderError::configuration(
                    "a fixed schema and a schema selector are mutually exclusive",
                ));
            }
            (Some(schema), None) if schema.column_count() == 0 => {
                return Err(ReaderError::configuration("schema declares no columns"));
            }
            (Some(schema), None) => SchemaBinding::Committed(schema),
            (None, Some(selector)) => SchemaBinding::Selected(selector),
            (None, None) => SchemaBinding::Raw,
        };
        let mut protocol = Protocol::new(Arc::new(self.options), binding);
        protocol.set_skip_filter(self.skip_filter);
        protocol.set_error_channel(self.error_channel);
        Ok(RecordReader { source, protocol })
    }
}
