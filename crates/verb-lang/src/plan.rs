use crate::error::InnerError;
use crate::lexer::{NodeVisitor, Shape, walk};

/// Per-node slot counts of one input, in pre-order.
///
/// Computed by a side-effect free scan before evaluation, it decides how large the
/// frame buffer is and where each node's slots start inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotPlan {
    counts: Vec<usize>,
}

impl SlotPlan {
    #[allow(clippy::result_large_err)]
    pub(crate) fn compute(code: &str) -> Result<Self, InnerError> {
        let mut sizing = Sizing::default();
        walk(code, 0..code.len(), &mut sizing)?;
        tracing::trace!(counts = ?sizing.counts, "computed slot plan");
        Ok(Self {
            counts: sizing.counts,
        })
    }

    /// Number of nodes, the outermost included.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Total number of slots over every node.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Prefix sums of the counts: where each node's slots start in the frame.
    pub fn offsets(&self) -> Vec<usize> {
        self.counts
            .iter()
            .scan(0, |acc, count| {
                let offset = *acc;
                *acc += count;
                Some(offset)
            })
            .collect()
    }
}

#[derive(Default)]
struct Sizing {
    counts: Vec<usize>,
}

impl NodeVisitor for Sizing {
    type Output = ();

    fn begin(&mut self) -> usize {
        self.counts.push(0);
        self.counts.len() - 1
    }

    fn text(&mut self, _node: usize, _slot: usize, _text: String) {}

    fn nested(&mut self, _node: usize, _slot: usize, _output: ()) {}

    fn end(&mut self, node: usize, shape: Shape) -> Result<(), InnerError> {
        self.counts[node] = shape.slot_count();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::error::syntax::SyntaxError;

    #[rstest]
    #[case::empty("", vec![0])]
    #[case::single_token("time", vec![0])]
    #[case::two_tokens("print a", vec![2])]
    #[case::quoted("print \"a b\"", vec![2])]
    #[case::escaped("print a\\ b", vec![2])]
    #[case::nested("print (time ms)", vec![2, 2])]
    #[case::nested_single("print (time)", vec![2, 0])]
    #[case::siblings("a (b c) (d) e", vec![4, 2, 0])]
    #[case::pre_order("a (b (c d) e) (f g)", vec![3, 3, 2, 2])]
    #[case::paren_in_quotes("print \"(a b)\"", vec![2])]
    #[case::empty_nested("a ()", vec![2, 0])]
    fn test_compute(#[case] code: &str, #[case] expected: Vec<usize>) {
        let plan = SlotPlan::compute(code).unwrap();
        assert_eq!(plan.counts(), expected.as_slice());
    }

    #[test]
    fn test_offsets_and_total() {
        let plan = SlotPlan::compute("a (b (c d) e) (f g)").unwrap();
        assert_eq!(plan.offsets(), vec![0, 3, 6, 8]);
        assert_eq!(plan.total(), 10);
        assert_eq!(plan.len(), 4);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let code = "create team (print \"a (b)\" $x) 'c d'";
        assert_eq!(SlotPlan::compute(code), SlotPlan::compute(code));
    }

    #[test]
    fn test_compute_syntax_error() {
        assert_eq!(
            SlotPlan::compute("print \"abc"),
            Err(InnerError::Syntax(SyntaxError::UnterminatedQuote {
                quote: '"',
                offset: 6
            }))
        );
    }
}
