use spark_records::{ReaderOptions, Result as ReaderResult, SourceError};
use tracing::trace;

/// 单次喂入一个物理行后的切分结论。
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Split {
    /// 得到一条完整记录。
    Record(Vec<String>),
    /// 引号字段跨行，需要继续喂入下一行。
    NeedMore,
    /// 空行且开启了空行忽略；不构成物理行。
    Blank,
}

/// 无 I/O 的字段切分器。
///
/// # 教案式说明
/// - **意图 (Why)**：阻塞与异步分词器只在“如何取得下一段字节”上不同，切分规则必须只有一份实现，
///   以保证两者交出的记录逐字节一致；
/// - **逻辑 (How)**：调用方每次喂入以记录分隔符结尾的一段字节（流末尾的最后一段可以没有分隔符），
///   切分器逐字符推进引号状态机；引号字段未闭合时返回 [`Split::NeedMore`] 并把分隔符保留为字段内容；
/// - **契约 (What)**：
///   - 以引号开头的字段为引号字段，字段内两个连续引号表示一个字面引号；
///   - 未加引号字段中出现引号、闭合引号后紧跟非分隔符字符、流末尾仍未闭合的引号、非 UTF-8 字节均为语法错误；
///   - 报告语法错误后内部状态复位，下一次喂入从新记录开始；
///   - 记录分隔符为 `\n` 时剥离行尾 `\r`；若该行结束时仍处于引号内，`\r` 属于字段内容，原样保留。
#[derive(Debug)]
pub struct FieldSplitter {
    separator: char,
    quote: char,
    record_separator: char,
    terminator: u8,
    trim: bool,
    skip_blank_lines: bool,
    line: u64,
    pending: Pending,
}

#[derive(Debug, Default)]
struct Pending {
    fields: Vec<String>,
    field: String,
    quoted: bool,
    in_quotes: bool,
    after_quote: bool,
}

impl Pending {
    fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.field.is_empty() && !self.quoted
    }
}

impl FieldSplitter {
    /// 依据读取选项构造；选项非法时返回配置错误。
    pub fn new(options: &ReaderOptions) -> ReaderResult<Self> {
        options.validate()?;
        let terminator = options.record_terminator().ok_or_else(|| {
            spark_records::ReaderError::configuration("record separator must be ASCII")
        })?;
        Ok(Self {
            separator: options.separator,
            quote: options.quote,
            record_separator: options.record_separator,
            terminator,
            trim: options.trim,
            skip_blank_lines: options.skip_blank_lines,
            line: 0,
            pending: Pending::default(),
        })
    }

    /// 记录分隔符字节，供调用方按字节切行。
    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    /// 已喂入的文本行数。
    pub fn line(&self) -> u64 {
        self.line
    }

    /// 是否有跨行的引号字段尚未闭合。
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// 喂入一段字节：以记录分隔符结尾，或是流末尾的最后一段。
    pub fn feed(&mut self, raw: &[u8]) -> Result<Split, SourceError> {
        self.line += 1;
        let (body, terminated) = match raw.split_last() {
            Some((last, body)) if *last == self.terminator => (body, true),
            _ => (raw, false),
        };
        let (body, carriage) = match body.split_last() {
            Some((b'\r', rest)) if self.terminator == b'\n' => (rest, true),
            _ => (body, false),
        };
        let text = match std::str::from_utf8(body) {
            Ok(text) => text,
            Err(err) => return Err(self.fail(format!("invalid UTF-8: {err}"))),
        };

        if text.is_empty() && self.skip_blank_lines && self.pending.is_empty() {
            return Ok(Split::Blank);
        }

        let mut chars = text.chars().peekable();
        while let Some(ch) = chars.next() {
            let pending = &mut self.pending;
            if pending.in_quotes {
                if ch == self.quote {
                    if chars.peek() == Some(&self.quote) {
                        chars.next();
                        pending.field.push(ch);
                    } else {
                        pending.in_quotes = false;
                        pending.after_quote = true;
                    }
                } else {
                    pending.field.push(ch);
                }
            } else if ch == self.separator {
                self.finish_field();
            } else if pending.after_quote {
                if !(self.trim && ch.is_whitespace()) {
                    return Err(self.fail(format!(
                        "unexpected character {ch:?} after closing quote"
                    )));
                }
            } else if ch == self.quote {
                if pending.field.is_empty() || (self.trim && pending.field.trim().is_empty()) {
                    pending.field.clear();
                    pending.quoted = true;
                    pending.in_quotes = true;
                } else {
                    return Err(self.fail("quote character inside an unquoted field"));
                }
            } else {
                pending.field.push(ch);
            }
        }

        if self.pending.in_quotes {
            if !terminated {
                return Err(self.fail("unterminated quoted field at end of stream"));
            }
            if carriage {
                self.pending.field.push('\r');
            }
            self.pending.field.push(self.record_separator);
            return Ok(Split::NeedMore);
        }

        self.finish_field();
        Ok(Split::Record(std::mem::take(&mut self.pending.fields)))
    }

    /// 流已耗尽：若仍有未闭合的引号字段则报告语法错误。
    pub fn finish(&mut self) -> Result<(), SourceError> {
        if self.pending.in_quotes {
            return Err(self.fail("unterminated quoted field at end of stream"));
        }
        self.pending = Pending::default();
        Ok(())
    }

    fn finish_field(&mut self) {
        let pending = &mut self.pending;
        let field = std::mem::take(&mut pending.field);
        let value = if !pending.quoted && self.trim {
            field.trim().to_owned()
        } else {
            field
        };
        pending.fields.push(value);
        pending.quoted = false;
        pending.after_quote = false;
    }

    fn fail(&mut self, message: impl Into<String>) -> SourceError {
        let message = message.into();
        trace!(line = self.line, %message, "splitter reset after syntax error");
        self.pending = Pending::default();
        SourceError::syntax(self.line, message)
    }
}
