use async_trait::async_trait;
use spark_records::{AsyncRecordSource, Pulled, ReaderOptions, Result as ReaderResult};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::split::{FieldSplitter, Split};

/// 基于 tokio [`AsyncBufRead`] 的可挂起分词器。
///
/// 与 [`DelimitedTokenizer`](crate::DelimitedTokenizer) 共用 [`FieldSplitter`]，唯一的挂起点是
/// `read_until`。
#[derive(Debug)]
pub struct AsyncDelimitedTokenizer<R> {
    input: R,
    splitter: FieldSplitter,
    buf: Vec<u8>,
    exhausted: bool,
}

impl<R> AsyncDelimitedTokenizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
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

#[async_trait]
impl<R> AsyncRecordSource for AsyncDelimitedTokenizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn read_record(&mut self) -> Pulled {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            self.buf.clear();
            let terminator = self.splitter.terminator();
            let read = self.input.read_until(terminator, &mut self.buf).await?;
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
