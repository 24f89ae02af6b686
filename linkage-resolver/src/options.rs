use linkage_join::{JoinOptions, JoinType};
use linkage_result::{Error, Result as LinkageResult};
use std::fmt;
use std::str::FromStr;

/// How the union/anti-join strategy treats links whose `category_id` has no
/// row in the categories relation.
///
/// The left-join strategy always null-extends such links and ignores this
/// setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum DanglingPolicy {
    /// Dangling links contribute nothing. A product whose only links are
    /// dangling disappears from the result, because the anti-join only catches
    /// products with no link rows at all.
    #[default]
    Drop,
    /// Every dangling link contributes one `(product_name, NULL)` row, which
    /// makes the union strategy bag-equal to the left-join strategy.
    NullExtend,
}

impl fmt::Display for DanglingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DanglingPolicy::Drop => write!(f, "drop"),
            DanglingPolicy::NullExtend => write!(f, "null-extend"),
        }
    }
}

impl FromStr for DanglingPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "drop" => Ok(DanglingPolicy::Drop),
            "null-extend" | "null_extend" | "nullextend" => Ok(DanglingPolicy::NullExtend),
            other => Err(Error::InvalidArgumentError(format!(
                "unknown dangling policy '{other}' (expected 'drop' or 'null-extend')"
            ))),
        }
    }
}

/// Options controlling pair resolution.
#[derive(Clone, Debug)]
pub struct ResolveOptions {
    /// Maximum rows per batch emitted by each join.
    pub batch_size: usize,
    /// Treatment of dangling category links in the union strategy.
    pub dangling: DanglingPolicy,
    /// Reject duplicate `product_id` / `category_id` values in the catalogs.
    pub validate_keys: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            batch_size: JoinOptions::default().batch_size,
            dangling: DanglingPolicy::default(),
            validate_keys: false,
        }
    }
}

impl ResolveOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dangling_policy(mut self, dangling: DanglingPolicy) -> Self {
        self.dangling = dangling;
        self
    }

    pub fn with_key_validation(mut self, validate_keys: bool) -> Self {
        self.validate_keys = validate_keys;
        self
    }

    pub fn validate(&self) -> LinkageResult<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidArgumentError(
                "resolve batch_size must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn join_options(&self, join_type: JoinType) -> JoinOptions {
        JoinOptions {
            join_type,
            batch_size: self.batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dangling_policy_round_trips_through_strings() {
        assert_eq!("drop".parse::<DanglingPolicy>().unwrap(), DanglingPolicy::Drop);
        assert_eq!(
            "Null-Extend".parse::<DanglingPolicy>().unwrap(),
            DanglingPolicy::NullExtend
        );
        assert_eq!(DanglingPolicy::NullExtend.to_string(), "null-extend");
        assert!("keep".parse::<DanglingPolicy>().is_err());
    }

    #[test]
    fn builders_and_validation() {
        let options = ResolveOptions::default()
            .with_batch_size(16)
            .with_dangling_policy(DanglingPolicy::NullExtend)
            .with_key_validation(true);
        assert_eq!(options.batch_size, 16);
        assert_eq!(options.dangling, DanglingPolicy::NullExtend);
        assert!(options.validate_keys);
        assert!(options.validate().is_ok());

        let join = options.join_options(JoinType::Anti);
        assert_eq!(join.join_type, JoinType::Anti);
        assert_eq!(join.batch_size, 16);

        assert!(ResolveOptions::default().with_batch_size(0).validate().is_err());
    }
}
