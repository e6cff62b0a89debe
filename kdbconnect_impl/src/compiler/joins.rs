//! Join builders: aj/lj/ij/wj (§4.K).
//!
//! Grounded on `query/joins.py`. Operates on bare table names rather
//! than Model classes, per the same model-layer-is-external rationale
//! as the other builders in this module.

/// As-of join: `aj[cols;left;right]`.
#[derive(Clone, Debug)]
pub struct AsOfJoin {
    pub left: String,
    pub right: String,
    pub on: Vec<String>,
}

#[must_use]
pub fn aj(on: impl IntoIterator<Item = String>, left: impl Into<String>, right: impl Into<String>) -> AsOfJoin {
    AsOfJoin {
        left: left.into(),
        right: right.into(),
        on: on.into_iter().collect(),
    }
}

impl AsOfJoin {
    #[must_use]
    pub fn compile(&self) -> String {
        let cols = backtick_join(&self.on);
        format!("aj[{cols};{};{}]", self.left, self.right)
    }

    #[must_use]
    pub fn explain(&self) -> String {
        format!("-- aj join: {} <-> {}\n{}", self.left, self.right, self.compile())
    }
}

/// Left join: `left lj `cols xkey right`.
#[derive(Clone, Debug)]
pub struct LeftJoin {
    pub left: String,
    pub right: String,
    pub on: Vec<String>,
}

#[must_use]
pub fn lj(on: impl IntoIterator<Item = String>, left: impl Into<String>, right: impl Into<String>) -> LeftJoin {
    LeftJoin {
        left: left.into(),
        right: right.into(),
        on: on.into_iter().collect(),
    }
}

impl LeftJoin {
    #[must_use]
    pub fn compile(&self) -> String {
        let cols = backtick_join(&self.on);
        format!("{} lj `{cols} xkey {}", self.left, self.right)
    }
}

/// Inner join: `left ij `cols xkey right`.
#[derive(Clone, Debug)]
pub struct InnerJoin {
    pub left: String,
    pub right: String,
    pub on: Vec<String>,
}

#[must_use]
pub fn ij(on: impl IntoIterator<Item = String>, left: impl Into<String>, right: impl Into<String>) -> InnerJoin {
    InnerJoin {
        left: left.into(),
        right: right.into(),
        on: on.into_iter().collect(),
    }
}

impl InnerJoin {
    #[must_use]
    pub fn compile(&self) -> String {
        let cols = backtick_join(&self.on);
        format!("{} ij `{cols} xkey {}", self.left, self.right)
    }
}

/// Window join: `wj[lo hi+left.time;cols;left;(right;aggs)]`. The last
/// `on` column is treated as the time column, matching the reference.
#[derive(Clone, Debug)]
pub struct WindowJoin {
    pub left: String,
    pub right: String,
    pub on: Vec<String>,
    pub window: (i64, i64),
    pub aggs: Vec<(String, String)>,
}

#[must_use]
pub fn wj(
    window: (i64, i64),
    on: impl IntoIterator<Item = String>,
    left: impl Into<String>,
    right: impl Into<String>,
    aggs: impl IntoIterator<Item = (String, String)>,
) -> WindowJoin {
    WindowJoin {
        left: left.into(),
        right: right.into(),
        on: on.into_iter().collect(),
        window,
        aggs: aggs.into_iter().collect(),
    }
}

impl WindowJoin {
    #[must_use]
    pub fn compile(&self) -> String {
        let cols = backtick_join(&self.on);
        let (lo, hi) = self.window;
        let time_col = self.on.last().cloned().unwrap_or_default();
        let agg_str: String = self
            .aggs
            .iter()
            .map(|(col, func)| format!("({func};`{col})"))
            .collect::<Vec<_>>()
            .join(";");
        format!(
            "wj[{lo} {hi}+{}.{time_col};{cols};{};({};{agg_str})]",
            self.left, self.left, self.right
        )
    }
}

fn backtick_join(cols: &[String]) -> String {
    cols.iter().map(|c| format!("`{c}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn as_of_join_compiles() {
        let j = aj(["sym".to_string(), "time".to_string()], "trade", "quote");
        assert_eq!(j.compile(), "aj[`sym`time;trade;quote]");
    }

    #[test]
    fn left_join_compiles() {
        let j = lj(["sym".to_string()], "trade", "quote");
        assert_eq!(j.compile(), "trade lj `sym xkey quote");
    }

    #[test]
    fn window_join_uses_last_on_column_as_time() {
        let j = wj(
            (-2_000_000_000, 0),
            ["sym".to_string(), "time".to_string()],
            "trade",
            "quote",
            [("bid".to_string(), "avg".to_string()), ("ask".to_string(), "avg".to_string())],
        );
        assert_eq!(
            j.compile(),
            "wj[-2000000000 0+trade.time;`sym`time;trade;(quote;(avg;`bid);(avg;`ask))]"
        );
    }
}
