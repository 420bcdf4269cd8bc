use std::io::BufRead;

use spark_records::{Pulled, ReaderOptions, RecordSource, Result as ReaderResult};

use crate::split::{FieldSplitter, Split};

/// 基于 [`BufRead`] 的阻塞分词器。
///
/// 按记录分隔符逐段读取字节并交给 [`FieldSplitter`]；引号字段跨行时继续读取，直到得到完整记录或流耗尽。
#[derive(Debug)]
pub struct DelimitedTokenizer<R> {
    input: R,
    splitter: FieldSplitter,
    buf: Vec<u8>,
    exhausted: bool,
}

impl<R: BufRead> DelimitedTokenizer<R> {
    /// 绑定输入；选项非法时返回配置错误。
    pub fn new(input: R, options: &ReaderOptions) -> ReaderResult<Self> {
        Ok(Self {
            input,
            splitter: FieldSplitter::new(options)?,
            buf: Vec::new(),
            exhausted: false,
        })
    }

    /// 已读取的文本行数。
    pub fn line(&self) -> u64 {
        self.splitter.line()
    }

    /// 取回底层输入。
    pub fn into_inner(self) -> R {
        self.input
    }
}

impl<R: BufRead> RecordSource for DelimitedTokenizer<R> {
    fn read_record(&mut self) -> Pulled {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let read = self
                .input
                .read_until(self.splitter.terminator(), &mut self.buf)?;
            if read == 0 {
                self.splitter.finish()?;
                self.exhausted = true;
                return Ok(None);
            }
            match self.splitter.feed(&self.buf)? {
                Split::Record(fields) => return Ok(Some(fields)),
                Split::NeedMore | Split::Blank => {}
            }
        }
    }

    fn is_end_of_stream(&self) -> bool {
        self.exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spark_records::SourceError;
    use std::io::Cursor;

    fn tokenizer(text: &str) -> DelimitedTokenizer<Cursor<Vec<u8>>> {
        DelimitedTokenizer::new(Cursor::new(text.as_bytes().to_vec()), &ReaderOptions::default())
            .expect("合法选项")
    }

    #[test]
    fn last_line_without_terminator_is_a_record() {
        let mut tokenizer = tokenizer("a,b\nc,d");
        assert_eq!(
            tokenizer.read_record().expect("首行"),
            Some(vec!["a".to_owned(), "b".to_owned()])
        );
        assert_eq!(
            tokenizer.read_record().expect("末行"),
            Some(vec!["c".to_owned(), "d".to_owned()])
        );
        assert_eq!(tokenizer.read_record().expect("结束"), None);
        assert!(tokenizer.is_end_of_stream());
    }

    #[test]
    fn multi_line_field_is_one_record() {
        let mut tokenizer = tokenizer("\"x\ny\",z\nnext\n");
        assert_eq!(
            tokenizer.read_record().expect("跨行记录"),
            Some(vec!["x\ny".to_owned(), "z".to_owned()])
        );
        assert_eq!(tokenizer.line(), 2);
        assert!(tokenizer.read_record().expect("下一行").is_some());
    }

    #[test]
    fn syntax_error_then_resumes_on_next_line() {
        let mut tokenizer = tokenizer("ok\nba\"d\nfine\n");
        assert!(tokenizer.read_record().expect("首行").is_some());
        let err = tokenizer.read_record().expect_err("语法错误");
        assert!(matches!(err, SourceError::Syntax { line: 2, .. }));
        assert_eq!(
            tokenizer.read_record().expect("安全重读"),
            Some(vec!["fine".to_owned()])
        );
    }

    #[test]
    fn unterminated_quote_is_reported_once_then_ends() {
        let mut tokenizer = tokenizer("\"never closed\nstill open\n");
        assert!(tokenizer.read_record().is_err());
        assert_eq!(tokenizer.read_record().expect("随后结束"), None);
    }
}
