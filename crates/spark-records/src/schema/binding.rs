//! 模式解析策略。
//!
//! 会话构造时把调用方给出的模式来源收敛为 [`SchemaBinding`]；首次读取前再根据表头开关决定是否消费表头行、
//! 是否由表头推断模式。之后协议只通过 [`SchemaBinding::resolve`] 获取每一行的有效模式，不再关心来源。

use std::{fmt, sync::Arc};

use super::{Schema, SchemaRef, SchemaSelector};

/// 会话内部的模式能力。
#[derive(Clone)]
pub(crate) enum SchemaBinding {
    /// 无模式：原始字段直接作为记录。
    Raw,
    /// 固定模式（调用方提供或由表头推断）。
    Committed(SchemaRef),
    /// 逐条选择。
    Selected(Arc<dyn SchemaSelector>),
}

/// 首个物理行的处置方式，由表头开关与模式来源共同决定。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum HeaderAction {
    /// 无表头，不消费任何行。
    None,
    /// 消费并丢弃表头行（已有固定模式或选择器）。
    Discard,
    /// 消费表头行并据此推断字符串模式。
    Infer,
}

impl SchemaBinding {
    /// 依据表头开关给出首行处置方式。
    pub(crate) fn header_action(&self, has_header: bool) -> HeaderAction {
        match (has_header, self) {
            (false, _) => HeaderAction::None,
            (true, SchemaBinding::Raw) => HeaderAction::Infer,
            (true, SchemaBinding::Committed(_) | SchemaBinding::Selected(_)) => {
                HeaderAction::Discard
            }
        }
    }

    /// 以表头字段提交推断出的模式。
    pub(crate) fn commit_header(&mut self, fields: &[String]) -> SchemaRef {
        let schema = Schema::from_header(fields).into_ref();
        *self = SchemaBinding::Committed(Arc::clone(&schema));
        schema
    }

    /// 当前行的有效模式；`None` 表示原样透传。
    pub(crate) fn resolve(&self, fields: &[String]) -> Option<SchemaRef> {
        match self {
            SchemaBinding::Raw => None,
            SchemaBinding::Committed(schema) => Some(Arc::clone(schema)),
            SchemaBinding::Selected(selector) => Some(selector.select(fields)),
        }
    }

    /// 会话级的固定模式；选择器与无模式均返回 `None`。
    pub(crate) fn committed(&self) -> Option<&SchemaRef> {
        match self {
            SchemaBinding::Committed(schema) => Some(schema),
            _ => None,
        }
    }
}

impl fmt::Debug for SchemaBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaBinding::Raw => f.write_str("Raw"),
            SchemaBinding::Committed(schema) => f
                .debug_tuple("Committed")
                .field(&schema.column_names().collect::<Vec<_>>())
                .finish(),
            SchemaBinding::Selected(_) => f.write_str("Selected(..)"),
        }
    }
}
