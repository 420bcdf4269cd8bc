//! 可挂起形态的公开接口。
//!
//! 每个方法与阻塞形态逐行对应，只在 `read_record().await` 处让出执行权；状态迁移全部交给同一个协议对象。
//! 若 future 在拉取途中被丢弃，协议会在下一次操作时发现悬空拉取并锁定会话。

use futures::stream::{self, Stream};

use crate::{
    error::{Operation, Result},
    protocol::AdvanceStep,
    schema::SchemaRef,
    source::{AsyncRecordSource, Pulled},
    value::Value,
};

use super::RecordReader;

impl<S: AsyncRecordSource> RecordReader<S> {
    async fn pull_async(&mut self) -> Pulled {
        self.protocol.begin_pull();
        self.source.read_record().await
    }

    async fn resolve_header_async(&mut self, operation: Operation) -> Result<()> {
        if self.protocol.needs_header() {
            let pulled = self.pull_async().await;
            self.protocol.accept_header(operation, pulled)?;
        }
        Ok(())
    }

    /// [`advance`](RecordReader::advance) 的可挂起形态。
    pub async fn advance_async(&mut self) -> Result<bool> {
        self.protocol.ensure_usable(Operation::Advance)?;
        self.resolve_header_async(Operation::Advance).await?;
        while self.protocol.can_pull() {
            let pulled = self.pull_async().await;
            match self.protocol.accept_advance(pulled)? {
                AdvanceStep::Produced => return Ok(true),
                AdvanceStep::Continue => {}
                AdvanceStep::Exhausted => break,
            }
        }
        Ok(false)
    }

    /// [`skip`](RecordReader::skip) 的可挂起形态。
    pub async fn skip_async(&mut self) -> Result<bool> {
        self.protocol.ensure_usable(Operation::Skip)?;
        self.resolve_header_async(Operation::Skip).await?;
        if !self.protocol.can_pull() {
            return Ok(false);
        }
        let pulled = self.pull_async().await;
        self.protocol.accept_skip(pulled)
    }

    /// [`resolved_schema`](RecordReader::resolved_schema) 的可挂起形态。
    pub async fn resolved_schema_async(&mut self) -> Result<Option<SchemaRef>> {
        self.protocol.ensure_usable(Operation::ResolvedSchema)?;
        self.resolve_header_async(Operation::ResolvedSchema).await?;
        self.protocol.resolved_schema()
    }

    /// [`current_values`](RecordReader::current_values) 的可挂起形态；不会访问记录源，因此从不挂起。
    pub async fn current_values_async(&mut self) -> Result<Vec<Value>> {
        self.protocol.current_values()
    }

    /// 把会话转换为记录流；遇到错误时产出该错误后结束。
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<Value>>> {
        stream::unfold(Some(self), |state| async move {
            let mut reader = state?;
            let item = match reader.advance_async().await {
                Ok(true) => reader.protocol.current_values(),
                Ok(false) => return None,
                Err(err) => Err(err),
            };
            let next = item.is_ok().then_some(reader);
            Some((item, next))
        })
    }
}
