//! 会话选项与配置加载。
//!
//! [`ReaderOptions`] 描述分隔符、记录分隔符、引号以及表头开关；既可直接构造，也可从 TOML 文本反序列化。
//! 选项在会话构造时经过 [`ReaderOptions::validate`] 校验，失败一律归类为配置错误。

use serde::Deserialize;

use crate::error::{ReaderError, Result};

const DEFAULT_SEPARATOR: char = ',';
const DEFAULT_RECORD_SEPARATOR: char = '\n';
const DEFAULT_QUOTE: char = '"';

/// 记录读取选项。
///
/// # 契约说明（What）
/// - `separator`：字段分隔符，默认 `,`；
/// - `record_separator`：记录分隔符，必须是单个 ASCII 字符，默认 `\n`；不支持多字符终止符，
///   `\r\n` 只能通过 `\n` 间接接受（分词器剥离行尾 `\r`），其他组合如 `\n\r` 无法表达；
/// - `quote`：引号字符，默认 `"`；
/// - `has_header`：首个物理行是否为表头；
/// - `trim`：是否裁剪未加引号字段两端的空白；
/// - `skip_blank_lines`：空行是否直接忽略（被忽略的空行不计入物理行）。
///
/// # 前置条件
/// - 分隔符、记录分隔符与引号两两不同，由 [`validate`](Self::validate) 检查。
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderOptions {
    pub separator: char,
    pub record_separator: char,
    pub quote: char,
    pub has_header: bool,
    pub trim: bool,
    pub skip_blank_lines: bool,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR,
            record_separator: DEFAULT_RECORD_SEPARATOR,
            quote: DEFAULT_QUOTE,
            has_header: false,
            trim: false,
            skip_blank_lines: false,
        }
    }
}

impl ReaderOptions {
    /// 以默认值为基础，仅设置表头开关。
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// 设置字段分隔符。
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// 设置记录分隔符。
    pub fn with_record_separator(mut self, record_separator: char) -> Self {
        self.record_separator = record_separator;
        self
    }

    /// 设置引号字符。
    pub fn with_quote(mut self, quote: char) -> Self {
        self.quote = quote;
        self
    }

    /// 开关未加引号字段的空白裁剪。
    pub fn with_trim(mut self, trim: bool) -> Self {
        self.trim = trim;
        self
    }

    /// 开关空行忽略。
    pub fn with_skip_blank_lines(mut self, skip: bool) -> Self {
        self.skip_blank_lines = skip;
        self
    }

    /// 从 TOML 文本解析并校验选项。
    ///
    /// 缺省字段回退到 [`Default`]；未知字段、类型不符或校验失败均返回
    /// [`ReaderError::Configuration`]。
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let options: ReaderOptions = toml::from_str(raw)
            .map_err(|err| ReaderError::configuration(format!("malformed reader options: {err}")))?;
        options.validate()?;
        Ok(options)
    }

    /// 记录分隔符对应的字节，供分词器按字节切行。
    ///
    /// 调用前应已通过 [`validate`](Self::validate)；非 ASCII 分隔符在此返回 `None`。
    pub fn record_terminator(&self) -> Option<u8> {
        u8::try_from(self.record_separator)
            .ok()
            .filter(u8::is_ascii)
    }

    /// 校验选项的结构性约束。
    pub fn validate(&self) -> Result<()> {
        if self.separator == self.record_separator {
            return Err(ReaderError::configuration(format!(
                "separator {:?} must differ from the record separator",
                self.separator
            )));
        }
        if self.separator == self.quote {
            return Err(ReaderError::configuration(format!(
                "separator {:?} must differ from the quote character",
                self.separator
            )));
        }
        if self.quote == self.record_separator {
            return Err(ReaderError::configuration(format!(
                "quote {:?} must differ from the record separator",
                self.quote
            )));
        }
        if self.record_terminator().is_none() {
            return Err(ReaderError::configuration(format!(
                "record separator {:?} must be a single ASCII character",
                self.record_separator
            )));
        }
        Ok(())
    }
}
