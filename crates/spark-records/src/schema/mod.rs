//! # schema 模块
//!
//! ## 职责（What）
//! - [`Schema`]：有序、具名的列定义集合，区分物理列（来自原始字段）与元数据列（由读取上下文合成）；
//! - [`SchemaSelector`]：按原始字段逐条选择模式的回调；
//! - [`SchemaConfig`]：以 TOML 描述模式的配置形态；
//! - `binding`：会话内部把“无模式 / 固定模式 / 表头推断 / 选择器”四种来源收敛为单一解析能力。
//!
//! ## 约束
//! - 模式一经构造即不可变，会话之间通过 [`SchemaRef`] 共享；
//! - 校验原则：`字段数 + 元数据列数 < 总列数` 即视为列数不足。

mod column;
mod config;

pub(crate) mod binding;

use std::sync::Arc;

use crate::value::Value;

pub use column::{Column, ColumnKind, ColumnType, ConversionError, MetadataColumn};
pub use config::{ColumnConfig, SchemaConfig};

/// 共享模式引用。
pub type SchemaRef = Arc<Schema>;

/// 转换一行时可供元数据列引用的读取上下文。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ParseContext {
    /// 当前物理行的 1 基序号。
    pub physical_record: u64,
    /// 若该行转换成功，它将获得的逻辑记录序号（1 基）。
    pub logical_record: u64,
}

/// 有序列定义集合。
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    columns: Vec<Column>,
    metadata_columns: usize,
}

impl Schema {
    /// 由列定义构造模式。
    pub fn new(columns: Vec<Column>) -> Self {
        let metadata_columns = columns.iter().filter(|column| column.is_metadata()).count();
        Self {
            columns,
            metadata_columns,
        }
    }

    /// 以表头字段推断模式：每个字段对应一个非空字符串列，列名即字段值。
    pub fn from_header(fields: &[String]) -> Self {
        Self::new(
            fields
                .iter()
                .map(|name| Column::physical(name.clone(), ColumnType::String))
                .collect(),
        )
    }

    /// 包装为共享引用。
    pub fn into_ref(self) -> SchemaRef {
        Arc::new(self)
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// 全部列数（物理列 + 元数据列）。
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// 元数据列数。
    pub fn metadata_column_count(&self) -> usize {
        self.metadata_columns
    }

    /// 一行原始输入至少需要提供的字段数。
    pub fn physical_column_count(&self) -> usize {
        self.columns.len() - self.metadata_columns
    }

    /// 按名称查找列下标。
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column.name() == name)
    }

    /// 按名称查找列定义。
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name() == name)
    }

    /// 列名序列。
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(Column::name)
    }

    /// 原始字段数是否不足以填满物理列。
    pub fn lacks_fields(&self, field_count: usize) -> bool {
        field_count + self.metadata_columns < self.columns.len()
    }

    /// 将一行原始字段转换为有序值。
    ///
    /// # 契约说明（What）
    /// - 物理列按顺序消费字段，多余字段被忽略；
    /// - 元数据列由 `ctx` 合成，不消费字段；
    /// - **前置条件**：调用方已通过 [`lacks_fields`](Self::lacks_fields) 排除字段不足的行；
    ///   若仍出现不足，缺失字段按空文本处理并交由列类型判定。
    pub fn parse_values(
        &self,
        ctx: &ParseContext,
        fields: &[String],
    ) -> Result<Vec<Value>, ConversionError> {
        let mut values = Vec::with_capacity(self.columns.len());
        let mut raw = fields.iter();
        for column in &self.columns {
            let value = match column.kind() {
                ColumnKind::Metadata(metadata) => metadata.value(ctx),
                ColumnKind::Physical { .. } => {
                    let text = raw.next().map(String::as_str).unwrap_or_default();
                    column.convert(text)?
                }
            };
            values.push(value);
        }
        Ok(values)
    }
}

/// 逐条记录选择模式的回调。
///
/// 选择器必须是纯函数：相同字段总是得到相同模式。闭包 `Fn(&[String]) -> SchemaRef` 自动实现该 trait。
pub trait SchemaSelector: Send + Sync {
    /// 依据原始字段返回该记录适用的模式。
    fn select(&self, fields: &[String]) -> SchemaRef;
}

impl<F> SchemaSelector for F
where
    F: Fn(&[String]) -> SchemaRef + Send + Sync,
{
    fn select(&self, fields: &[String]) -> SchemaRef {
        self(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    #[test]
    fn header_schema_uses_field_values_as_names() {
        let schema = Schema::from_header(&fields(&["a", "b", "c"]));
        assert_eq!(schema.column_names().collect::<Vec<_>>(), ["a", "b", "c"]);
        assert!(
            schema
                .columns()
                .iter()
                .all(|column| column.column_type() == Some(ColumnType::String))
        );
        assert_eq!(schema.metadata_column_count(), 0);
    }

    #[test]
    fn metadata_columns_lower_required_field_count() {
        let schema = Schema::new(vec![
            Column::metadata("line", MetadataColumn::PhysicalRecordNumber),
            Column::physical("id", ColumnType::Int64),
            Column::physical("name", ColumnType::String),
        ]);
        assert_eq!(schema.column_count(), 3);
        assert_eq!(schema.physical_column_count(), 2);
        assert!(!schema.lacks_fields(2));
        assert!(schema.lacks_fields(1));

        let ctx = ParseContext {
            physical_record: 4,
            logical_record: 2,
        };
        let values = schema
            .parse_values(&ctx, &fields(&["17", "ada", "surplus"]))
            .expect("转换成功");
        assert_eq!(
            values,
            vec![Value::Int(4), Value::Int(17), Value::from("ada")]
        );
    }

    #[test]
    fn conversion_error_names_the_column() {
        let schema = Schema::new(vec![Column::physical("qty", ColumnType::Int64)]);
        let ctx = ParseContext {
            physical_record: 1,
            logical_record: 1,
        };
        let err = schema
            .parse_values(&ctx, &fields(&["many"]))
            .expect_err("非数字");
        assert_eq!(err.column(), "qty");
    }

    #[test]
    fn closure_acts_as_selector() {
        let narrow = Schema::from_header(&fields(&["x"])).into_ref();
        let wide = Schema::from_header(&fields(&["x", "y"])).into_ref();
        let selector = move |raw: &[String]| {
            if raw.len() > 1 {
                Arc::clone(&wide)
            } else {
                Arc::clone(&narrow)
            }
        };
        assert_eq!(selector.select(&fields(&["1", "2"])).column_count(), 2);
        assert_eq!(selector.select(&fields(&["1"])).column_count(), 1);
    }
}
