use std::collections::HashMap;

use crate::ast::ArithOp;

/// Hands out generated labels. Counters are kept per context and live for
/// the whole run, so one allocator must be shared by every unit.
///
/// Every generated label has a digit right after its last `$`. User label
/// text cannot start with a digit, so `qualify` never produces one.
#[derive(Debug, Default)]
pub struct LabelAllocator {
    counters: HashMap<String, usize>,
}

impl LabelAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_index(&mut self, context: &str) -> usize {
        let counter = self.counters.entry(context.to_string()).or_insert(0);
        let tmp = *counter;
        *counter += 1;
        tmp
    }

    /// `__CMP$0.EQ`, `__CMP$1.EQ`, ...
    pub fn comparison(&mut self, op: ArithOp) -> String {
        let op = op.name().to_uppercase();
        let n = self.next_index(&op);
        format!("__CMP${}.{}", n, op)
    }

    /// Return point of the n-th call made from inside `function`:
    /// `Fn$0.ret`, `Fn$1.ret`, ...
    pub fn return_point(&mut self, function: &str) -> String {
        let n = self.next_index(&format!("{}$ret", function));
        format!("{}${}.ret", function, n)
    }
}

/// User labels are scoped to the enclosing function.
pub fn qualify(function: &str, label: &str) -> String {
    format!("{}${}", function, label)
}
