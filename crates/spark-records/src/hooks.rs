//! 调用方注册的两个同步钩子。
//!
//! - [`SkipFilter`]：在推进循环中逐行观察原始字段，可把该行标记为跳过；
//! - [`ErrorChannel`]：观察每个记录处理故障，可将其标记为已处理以继续读取。
//!
//! 两者都在推进或跳过调用内部同步执行，每个会话至多一个，可在构造时或之后通过 setter 替换。
//! 闭包自动实现对应 trait。

use crate::error::RecordFault;

/// 交给跳过过滤器的原始行视图。
#[derive(Clone, Copy, Debug)]
pub struct RawRow<'a> {
    physical_record: u64,
    fields: &'a [String],
}

impl<'a> RawRow<'a> {
    pub(crate) fn new(physical_record: u64, fields: &'a [String]) -> Self {
        Self {
            physical_record,
            fields,
        }
    }

    /// 该行的 1 基物理序号。
    pub fn physical_record(&self) -> u64 {
        self.physical_record
    }

    /// 原始字段。
    pub fn fields(&self) -> &'a [String] {
        self.fields
    }

    /// 是否有字段与 `value` 完全相等。
    pub fn contains(&self, value: &str) -> bool {
        self.fields.iter().any(|field| field == value)
    }
}

/// 行级跳过过滤器。
pub trait SkipFilter: Send {
    /// 返回 `true` 表示丢弃该行，且不计入逻辑记录。
    fn should_skip(&mut self, row: RawRow<'_>) -> bool;
}

impl<F> SkipFilter for F
where
    F: FnMut(RawRow<'_>) -> bool + Send,
{
    fn should_skip(&mut self, row: RawRow<'_>) -> bool {
        self(row)
    }
}

/// 错误通道对故障的处置结论。
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FaultDisposition {
    /// 已处理：跳过该行继续读取。
    Handled,
    /// 未处理：故障返回给调用方，会话锁定。
    Propagate,
}

impl From<bool> for FaultDisposition {
    fn from(handled: bool) -> Self {
        if handled {
            FaultDisposition::Handled
        } else {
            FaultDisposition::Propagate
        }
    }
}

/// 故障级错误通道。
pub trait ErrorChannel: Send {
    /// 返回 [`FaultDisposition::Handled`] 表示该故障已恢复，读取继续。
    fn on_fault(&mut self, fault: &RecordFault) -> FaultDisposition;
}

impl<F> ErrorChannel for F
where
    F: FnMut(&RecordFault) -> FaultDisposition + Send,
{
    fn on_fault(&mut self, fault: &RecordFault) -> FaultDisposition {
        self(fault)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FaultReason;

    #[test]
    fn closures_act_as_hooks() {
        let mut seen = 0u64;
        let mut filter = |row: RawRow<'_>| {
            seen = row.physical_record();
            row.contains("#")
        };
        let fields = vec!["#".to_owned(), "x".to_owned()];
        assert!(filter.should_skip(RawRow::new(9, &fields)));
        assert_eq!(seen, 9);

        let mut channel = |fault: &RecordFault| FaultDisposition::from(fault.physical_record() > 1);
        let early = RecordFault::new(FaultReason::WrongColumnCount, 1, "short row");
        let late = RecordFault::new(FaultReason::WrongColumnCount, 2, "short row");
        assert_eq!(channel.on_fault(&early), FaultDisposition::Propagate);
        assert_eq!(channel.on_fault(&late), FaultDisposition::Handled);
    }
}
