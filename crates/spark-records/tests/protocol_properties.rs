//! 读取协议的计数性质与双形态一致性
//!
//! # 教案级注释概览
//!
//! - **核心目标 (Why)**：对任意“行形态 + 操作序列”组合，验证
//!   1. `physical_record_count` 等于成功推进数、过滤行数、显式跳过数、已处理故障行数之和（开启表头时再加一）；
//!   2. `logical_record_count` 恰为成功推进数；
//!   3. 阻塞与可挂起两种形态产生完全相同的调用结果与最终计数。
//! - **设计手法 (How)**：以 Proptest 随机生成行形态（合法、带 SKIP 标记、列数不足、语法错误）与操作序列，
//!   错误通道一律处理故障，钩子内的原子计数器记录过滤与故障次数；期望值由不依赖生产代码的影子模型 `shadow` 推算。
//!
//! # 合同与边界 (What)
//! - 模式固定为两列字符串，列数不足的行只有一个字段；
//! - 操作序列只包含推进与跳过，二者交错出现。

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use futures::executor::block_on;
use proptest::prelude::*;
use spark_records::{
    Column, ColumnType, FaultDisposition, MemorySource, RawRow, ReaderOptions, RecordFault,
    RecordReader, Schema, SourceError,
};

/// 单个物理行的形态。
#[derive(Clone, Copy, Debug)]
enum RowShape {
    Good,
    Marked,
    Short,
    Syntax,
}

/// 公开操作。
#[derive(Clone, Copy, Debug)]
enum Op {
    Advance,
    Skip,
}

fn row_shape() -> impl Strategy<Value = RowShape> {
    prop_oneof![
        4 => Just(RowShape::Good),
        2 => Just(RowShape::Marked),
        1 => Just(RowShape::Short),
        1 => Just(RowShape::Syntax),
    ]
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![3 => Just(Op::Advance), 1 => Just(Op::Skip)]
}

fn materialize(shapes: &[RowShape], has_header: bool) -> MemorySource {
    let header = has_header.then(|| Ok(vec!["left".to_owned(), "right".to_owned()]));
    let rows = shapes.iter().enumerate().map(|(index, shape)| match shape {
        RowShape::Good => Ok(vec![format!("l{index}"), format!("r{index}")]),
        RowShape::Marked => Ok(vec!["SKIP".to_owned(), format!("r{index}")]),
        RowShape::Short => Ok(vec![format!("l{index}")]),
        RowShape::Syntax => Err(SourceError::syntax(index as u64, "stray quote")),
    });
    MemorySource::from_results(header.into_iter().chain(rows))
}

/// 一次完整会话的可观测结果。
#[derive(Debug, PartialEq, Eq)]
struct Transcript {
    outcomes: Vec<bool>,
    physical: u64,
    logical: u64,
    filtered: usize,
    faults: usize,
}

struct Harness {
    reader: RecordReader<MemorySource>,
    filtered: Arc<AtomicUsize>,
    faults: Arc<AtomicUsize>,
}

fn harness(shapes: &[RowShape], has_header: bool) -> Harness {
    let filtered = Arc::new(AtomicUsize::new(0));
    let faults = Arc::new(AtomicUsize::new(0));
    let filter_counter = Arc::clone(&filtered);
    let fault_counter = Arc::clone(&faults);
    let schema = Schema::new(vec![
        Column::physical("left", ColumnType::String),
        Column::physical("right", ColumnType::String),
    ])
    .into_ref();
    let reader = RecordReader::builder(ReaderOptions::default().with_header(has_header))
        .schema(schema)
        .skip_filter(move |row: RawRow<'_>| {
            let marked = row.contains("SKIP");
            if marked {
                filter_counter.fetch_add(1, Ordering::SeqCst);
            }
            marked
        })
        .error_channel(move |_: &RecordFault| {
            fault_counter.fetch_add(1, Ordering::SeqCst);
            FaultDisposition::Handled
        })
        .build(materialize(shapes, has_header))
        .expect("合法配置");
    Harness {
        reader,
        filtered,
        faults,
    }
}

impl Harness {
    fn finish(self, outcomes: Vec<bool>) -> Transcript {
        Transcript {
            outcomes,
            physical: self.reader.metadata().physical_record_count(),
            logical: self.reader.metadata().logical_record_count(),
            filtered: self.filtered.load(Ordering::SeqCst),
            faults: self.faults.load(Ordering::SeqCst),
        }
    }
}

fn run_blocking(shapes: &[RowShape], ops: &[Op], has_header: bool) -> Transcript {
    let mut harness = harness(shapes, has_header);
    let outcomes = ops
        .iter()
        .map(|op| match op {
            Op::Advance => harness.reader.advance(),
            Op::Skip => harness.reader.skip(),
        })
        .collect::<spark_records::Result<Vec<_>>>()
        .expect("故障全部被处理");
    harness.finish(outcomes)
}

fn run_async(shapes: &[RowShape], ops: &[Op], has_header: bool) -> Transcript {
    let mut harness = harness(shapes, has_header);
    let outcomes = block_on(async {
        let mut outcomes = Vec::with_capacity(ops.len());
        for op in ops {
            let outcome = match op {
                Op::Advance => harness.reader.advance_async().await,
                Op::Skip => harness.reader.skip_async().await,
            };
            outcomes.push(outcome.expect("故障全部被处理"));
        }
        outcomes
    });
    harness.finish(outcomes)
}

/// 影子模型：按行形态与操作序列直接推算期望的调用结果与计数。
fn shadow(shapes: &[RowShape], ops: &[Op], has_header: bool) -> Transcript {
    let mut cursor = 0usize;
    let mut transcript = Transcript {
        outcomes: Vec::with_capacity(ops.len()),
        physical: u64::from(has_header && !ops.is_empty()),
        logical: 0,
        filtered: 0,
        faults: 0,
    };
    for op in ops {
        let outcome = match op {
            Op::Skip => match shapes.get(cursor) {
                None => false,
                Some(shape) => {
                    cursor += 1;
                    transcript.physical += 1;
                    if matches!(shape, RowShape::Syntax) {
                        transcript.faults += 1;
                    }
                    true
                }
            },
            Op::Advance => loop {
                let Some(shape) = shapes.get(cursor) else {
                    break false;
                };
                cursor += 1;
                transcript.physical += 1;
                match shape {
                    RowShape::Good => {
                        transcript.logical += 1;
                        break true;
                    }
                    RowShape::Marked => transcript.filtered += 1,
                    RowShape::Short | RowShape::Syntax => transcript.faults += 1,
                }
            },
        };
        transcript.outcomes.push(outcome);
    }
    transcript
}

proptest! {
    #[test]
    fn prop_counts_follow_shadow_model(
        shapes in prop::collection::vec(row_shape(), 0..24),
        ops in prop::collection::vec(op(), 0..32),
        has_header in any::<bool>(),
    ) {
        let transcript = run_blocking(&shapes, &ops, has_header);
        let advances = ops
            .iter()
            .zip(&transcript.outcomes)
            .filter(|(op, produced)| matches!(op, Op::Advance) && **produced)
            .count() as u64;
        prop_assert_eq!(transcript.logical, advances);
        prop_assert!(transcript.logical <= transcript.physical);
        prop_assert_eq!(transcript, shadow(&shapes, &ops, has_header));
    }

    #[test]
    fn prop_blocking_and_async_transcripts_match(
        shapes in prop::collection::vec(row_shape(), 0..24),
        ops in prop::collection::vec(op(), 0..32),
        has_header in any::<bool>(),
    ) {
        prop_assert_eq!(
            run_blocking(&shapes, &ops, has_header),
            run_async(&shapes, &ops, has_header)
        );
    }
}
