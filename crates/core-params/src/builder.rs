//! Builder pattern for ergonomic parameter set construction

use crate::error::{ParamError, Result};
use crate::param::Param;
use crate::word::Word;
use crate::MAX_PARAMS_PER_SET;

/// Builder for raw parameter sets with a fluent API
///
/// Nodes are appended in order; node 0 is the entry point. [`build`]
/// checks that every logic node only points forward at existing nodes, so a
/// built set is acyclic.
///
/// [`build`]: ParamBuilder::build
///
/// # Examples
///
/// ```
/// use core_params::{Op, Param, ParamBuilder};
///
/// # fn example() -> Result<(), core_params::ParamError> {
/// // arg[0] == 5 AND timestamp < 2_000_000_000
/// let raw = ParamBuilder::new()
///     .node(Param::and(1, 2))
///     .node(Param::arg(0, Op::Eq, 5u64))
///     .node(Param::timestamp(Op::Lt, 2_000_000_000u64))
///     .build()?;
/// assert_eq!(raw.len(), 3);
///
/// // A dangling child is rejected
/// let err = ParamBuilder::new().node(Param::not(4)).build();
/// assert!(err.is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct ParamBuilder {
    nodes: Vec<Param>,
}

impl ParamBuilder {
    /// Create a new builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node
    #[must_use]
    pub fn node(mut self, param: Param) -> Self {
        self.nodes.push(param);
        self
    }

    /// Append several nodes
    #[must_use]
    pub fn nodes(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.nodes.extend(params);
        self
    }

    /// Index the next appended node will get
    #[must_use]
    pub fn next_index(&self) -> u32 {
        u32::try_from(self.nodes.len()).unwrap_or(u32::MAX)
    }

    /// Validate and encode into raw words
    ///
    /// # Errors
    ///
    /// * `ParamError::TooManyParams` - more than `MAX_PARAMS_PER_SET` nodes
    /// * `ParamError::DanglingChild` - a logic node points past the end
    /// * `ParamError::ChildNotForward` - a logic node points at itself or backwards
    pub fn build(self) -> Result<Vec<Word>> {
        validate(&self.nodes)?;
        Ok(self.nodes.iter().map(Param::encode).collect())
    }

    /// Decoded nodes, unvalidated
    #[must_use]
    pub fn into_nodes(self) -> Vec<Param> {
        self.nodes
    }
}

/// Check size and child references of a node sequence
///
/// # Errors
///
/// Same conditions as [`ParamBuilder::build`].
pub fn validate(nodes: &[Param]) -> Result<()> {
    if nodes.len() > MAX_PARAMS_PER_SET {
        return Err(ParamError::TooManyParams {
            max: MAX_PARAMS_PER_SET,
            attempted: nodes.len(),
        });
    }

    for (index, param) in nodes.iter().enumerate() {
        // Bounded by MAX_PARAMS_PER_SET above
        let node = index as u32;
        let children = param.children();
        for slot in param.used_children() {
            let child = children[*slot];
            if child as usize >= nodes.len() {
                return Err(ParamError::DanglingChild { node, child });
            }
            if child <= node {
                return Err(ParamError::ChildNotForward { node, child });
            }
        }
    }
    Ok(())
}
