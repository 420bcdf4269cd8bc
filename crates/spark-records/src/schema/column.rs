use std::{borrow::Cow, fmt};

use thiserror::Error;

use super::ParseContext;
use crate::value::Value;

/// 物理列的目标类型。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ColumnType {
    String,
    Int64,
    Float64,
    Boolean,
}

impl ColumnType {
    /// 配置文件中使用的类型名。
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Boolean => "boolean",
        }
    }

    /// 解析配置中的类型名，大小写不敏感。
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Some(ColumnType::String),
            "int64" | "int" | "integer" | "i64" => Some(ColumnType::Int64),
            "float64" | "float" | "double" | "f64" => Some(ColumnType::Float64),
            "boolean" | "bool" => Some(ColumnType::Boolean),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 由读取上下文合成的元数据列。
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MetadataColumn {
    /// 当前物理行序号（含表头与被跳过的行）。
    PhysicalRecordNumber,
    /// 该行成功返回时对应的逻辑记录序号。
    LogicalRecordNumber,
}

impl MetadataColumn {
    pub fn as_str(self) -> &'static str {
        match self {
            MetadataColumn::PhysicalRecordNumber => "physical_record_number",
            MetadataColumn::LogicalRecordNumber => "logical_record_number",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "physical_record_number" | "line_number" => Some(MetadataColumn::PhysicalRecordNumber),
            "logical_record_number" | "record_number" => Some(MetadataColumn::LogicalRecordNumber),
            _ => None,
        }
    }

    pub(crate) fn value(self, ctx: &ParseContext) -> Value {
        let number = match self {
            MetadataColumn::PhysicalRecordNumber => ctx.physical_record,
            MetadataColumn::LogicalRecordNumber => ctx.logical_record,
        };
        // 计数超出 i64 时饱和，不会在实际输入中出现。
        Value::Int(i64::try_from(number).unwrap_or(i64::MAX))
    }
}

/// 列的来源。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ColumnKind {
    /// 来自原始字段。
    Physical { ty: ColumnType, nullable: bool },
    /// 由读取上下文合成，不消费原始字段。
    Metadata(MetadataColumn),
}

/// 具名列定义。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Column {
    name: Cow<'static, str>,
    kind: ColumnKind,
}

impl Column {
    /// 非空物理列。
    pub fn physical(name: impl Into<Cow<'static, str>>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Physical {
                ty,
                nullable: false,
            },
        }
    }

    /// 可空物理列：空文本转换为 [`Value::Null`]。
    pub fn nullable(name: impl Into<Cow<'static, str>>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Physical { ty, nullable: true },
        }
    }

    /// 元数据列。
    pub fn metadata(name: impl Into<Cow<'static, str>>, column: MetadataColumn) -> Self {
        Self {
            name: name.into(),
            kind: ColumnKind::Metadata(column),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ColumnKind {
        self.kind
    }

    pub fn is_metadata(&self) -> bool {
        matches!(self.kind, ColumnKind::Metadata(_))
    }

    /// 物理列的目标类型；元数据列返回 `None`。
    pub fn column_type(&self) -> Option<ColumnType> {
        match self.kind {
            ColumnKind::Physical { ty, .. } => Some(ty),
            ColumnKind::Metadata(_) => None,
        }
    }

    /// 将单个原始字段转换为该列的值。
    ///
    /// - 字符串列原样保留文本（空文本在可空列中为 `Null`）；
    /// - 数值与布尔列在转换前裁剪两端空白；
    /// - 非空列遇到空文本时，除字符串列外均报错。
    pub(crate) fn convert(&self, text: &str) -> Result<Value, ConversionError> {
        let (ty, nullable) = match self.kind {
            ColumnKind::Physical { ty, nullable } => (ty, nullable),
            ColumnKind::Metadata(_) => {
                return Err(self.error(text, "metadata columns are not read from input"));
            }
        };

        if text.is_empty() && nullable {
            return Ok(Value::Null);
        }

        match ty {
            ColumnType::String => Ok(Value::String(text.to_owned())),
            ColumnType::Int64 => {
                let trimmed = self.non_empty(text)?;
                trimmed
                    .parse::<i64>()
                    .map(Value::Int)
                    .map_err(|err| self.error(text, err.to_string()))
            }
            ColumnType::Float64 => {
                let trimmed = self.non_empty(text)?;
                trimmed
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|err| self.error(text, err.to_string()))
            }
            ColumnType::Boolean => {
                let trimmed = self.non_empty(text)?;
                parse_bool(trimmed)
                    .map(Value::Bool)
                    .ok_or_else(|| self.error(text, "expected true/false, yes/no or 1/0"))
            }
        }
    }

    fn non_empty<'t>(&self, text: &'t str) -> Result<&'t str, ConversionError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            Err(self.error(text, "empty value in a non-nullable column"))
        } else {
            Ok(trimmed)
        }
    }

    fn error(&self, text: &str, message: impl Into<String>) -> ConversionError {
        ConversionError {
            column: self.name.to_string(),
            value: text.to_owned(),
            message: message.into(),
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Some(true),
        "false" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

/// 单个字段转换失败。
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("column `{column}` cannot convert {value:?}: {message}")]
pub struct ConversionError {
    column: String,
    value: String,
    message: String,
}

impl ConversionError {
    /// 出错列名。
    pub fn column(&self) -> &str {
        &self.column
    }

    /// 出错的原始文本。
    pub fn value(&self) -> &str {
        &self.value
    }
}
