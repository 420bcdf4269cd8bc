use serde::Deserialize;

use super::{Column, ColumnType, MetadataColumn, Schema, SchemaRef};
use crate::error::{ReaderError, Result};

/// TOML 形式的模式描述。
///
/// ```toml
/// [[columns]]
/// name = "line"
/// metadata = "physical_record_number"
///
/// [[columns]]
/// name = "id"
/// type = "int64"
///
/// [[columns]]
/// name = "comment"
/// type = "string"
/// nullable = true
/// ```
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SchemaConfig {
    pub columns: Vec<ColumnConfig>,
}

/// 单列配置：`type` 与 `metadata` 二选一。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Option<String>,
    #[serde(default)]
    pub nullable: bool,
    pub metadata: Option<String>,
}

impl SchemaConfig {
    /// 解析 TOML 文本。
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw)
            .map_err(|err| ReaderError::configuration(format!("malformed schema config: {err}")))
    }

    /// 构造共享模式；空列表、未知类型或 `type`/`metadata` 冲突均为配置错误。
    pub fn build(&self) -> Result<SchemaRef> {
        if self.columns.is_empty() {
            return Err(ReaderError::configuration("schema config declares no columns"));
        }
        let columns = self
            .columns
            .iter()
            .map(ColumnConfig::build)
            .collect::<Result<Vec<_>>>()?;
        Ok(Schema::new(columns).into_ref())
    }
}

impl ColumnConfig {
    fn build(&self) -> Result<Column> {
        match (&self.ty, &self.metadata) {
            (Some(_), Some(_)) => Err(ReaderError::configuration(format!(
                "column `{}` sets both `type` and `metadata`",
                self.name
            ))),
            (None, Some(metadata)) => {
                let kind = MetadataColumn::parse(metadata).ok_or_else(|| {
                    ReaderError::configuration(format!(
                        "column `{}` has unknown metadata kind `{metadata}`",
                        self.name
                    ))
                })?;
                Ok(Column::metadata(self.name.clone(), kind))
            }
            (ty, None) => {
                let ty = match ty {
                    Some(name) => ColumnType::parse(name).ok_or_else(|| {
                        ReaderError::configuration(format!(
                            "column `{}` has unknown type `{name}`",
                            self.name
                        ))
                    })?,
                    None => ColumnType::String,
                };
                Ok(if self.nullable {
                    Column::nullable(self.name.clone(), ty)
                } else {
                    Column::physical(self.name.clone(), ty)
                })
            }
        }
    }
}
