use crate::left_join::resolve_left_join;
use crate::options::ResolveOptions;
use crate::pairs::{PairBatch, ResultPair, bag_difference};
use crate::relation::{Categories, Links, Products};
use crate::union_anti::resolve_union_anti;
use linkage_result::{Error, Result as LinkageResult};
use std::fmt;
use std::str::FromStr;

/// Algorithm used to resolve pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// LEFT join products to links, then LEFT join to categories.
    #[default]
    LeftJoin,
    /// INNER join chain bag-unioned with anti-joined, null-extended products.
    UnionAnti,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::LeftJoin, Strategy::UnionAnti];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::LeftJoin => write!(f, "left-join"),
            Strategy::UnionAnti => write!(f, "union-anti"),
        }
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left-join" | "left_join" | "left" => Ok(Strategy::LeftJoin),
            "union-anti" | "union_anti" | "union" => Ok(Strategy::UnionAnti),
            other => Err(Error::InvalidArgumentError(format!(
                "unknown strategy '{other}' (expected 'left-join' or 'union-anti')"
            ))),
        }
    }
}

/// Resolve pairs with the chosen strategy.
pub fn resolve(
    strategy: Strategy,
    products: &Products,
    categories: &Categories,
    links: &Links,
    options: &ResolveOptions,
) -> LinkageResult<PairBatch> {
    match strategy {
        Strategy::LeftJoin => resolve_left_join(products, categories, links, options),
        Strategy::UnionAnti => resolve_union_anti(products, categories, links, options),
    }
}

/// Outcome of running both strategies over the same inputs.
#[derive(Clone, Debug)]
pub struct StrategyComparison {
    pub left_join: PairBatch,
    pub union_anti: PairBatch,
    /// Rows the left-join result has more often than the union result.
    pub missing_from_union: Vec<ResultPair>,
    /// Rows the union result has more often than the left-join result.
    pub extra_in_union: Vec<ResultPair>,
}

impl StrategyComparison {
    /// Whether the two results are equal as bags.
    pub fn is_equivalent(&self) -> bool {
        self.missing_from_union.is_empty() && self.extra_in_union.is_empty()
    }
}

/// Run both strategies concurrently and diff their results as bags.
///
/// Inputs are shared read-only between the two runs.
pub fn compare_strategies(
    products: &Products,
    categories: &Categories,
    links: &Links,
    options: &ResolveOptions,
) -> LinkageResult<StrategyComparison> {
    let (left_join, union_anti) = rayon::join(
        || resolve_left_join(products, categories, links, options),
        || resolve_union_anti(products, categories, links, options),
    );
    let (left_join, union_anti) = (left_join?, union_anti?);

    let diff = bag_difference(&left_join.pairs()?, &union_anti.pairs()?);

    if !diff.is_empty() {
        tracing::info!(
            missing_from_union = diff.only_left.len(),
            extra_in_union = diff.only_right.len(),
            dangling_policy = %options.dangling,
            "strategies disagree"
        );
    }

    Ok(StrategyComparison {
        left_join,
        union_anti,
        missing_from_union: diff.only_left,
        extra_in_union: diff.only_right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strategy_names_parse() {
        for strategy in Strategy::ALL {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
        assert_eq!("UNION".parse::<Strategy>().unwrap(), Strategy::UnionAnti);
        assert!(matches!(
            "cross".parse::<Strategy>(),
            Err(Error::InvalidArgumentError(_))
        ));
    }
}
