use std::collections::HashSet;

/// 一次运行的汇总结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateReport {
    /// 含重复在内的 id 总数
    pub total: usize,
    /// 按首次出现顺序去重后的 id
    pub unique: Vec<String>,
    /// `total - unique.len()`
    pub duplicates: usize,
}

/// 按接收顺序合并各凭证的结果，并按首次出现去重。
#[derive(Debug, Default)]
pub struct Aggregator {
    total: usize,
    seen: HashSet<String>,
    unique: Vec<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push<I>(&mut self, ids: I)
    where
        I: IntoIterator<Item = String>,
    {
        for id in ids {
            self.total += 1;
            if self.seen.insert(id.clone()) {
                self.unique.push(id);
            }
        }
    }

    pub fn finish(self) -> AggregateReport {
        let duplicates = self.total - self.unique.len();
        AggregateReport {
            total: self.total,
            unique: self.unique,
            duplicates,
        }
    }
}

pub fn aggregate<R, I>(results: R) -> AggregateReport
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = String>,
{
    let mut aggregator = Aggregator::new();
    for ids in results {
        aggregator.push(ids);
    }
    aggregator.finish()
}
