//! Rules: the input to [`crate::build`].

use serde::{Deserialize, Serialize};

use crate::interval::Interval;

/// Maximum number of classification dimensions a rule may carry.
pub const MAX_DIM: usize = 5;

/// A single firewall-style rule over `D` classification dimensions.
///
/// `A` is the opaque action the caller attaches to the rule; the classifier
/// never inspects it, only hands back a reference to it on a match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule<const D: usize, A> {
    pub name: String,
    pub field: [Interval; D],
    /// Present only for bidirectional rules; the mirror interval used when
    /// this rule is evaluated in the reverse direction.
    pub inverse_field: Option<[Interval; D]>,
    /// Signed priority. Smaller magnitude is higher priority. A cost of 0
    /// marks an inactive rule; a negative cost marks a pseudo rule. Both are
    /// skipped by [`crate::build`].
    pub cost: i32,
    pub action: A,
}

impl<const D: usize, A> Rule<D, A> {
    pub fn new(name: &str, field: [Interval; D], cost: i32, action: A) -> Self {
        Self {
            name: name.into(),
            field,
            inverse_field: None,
            cost,
            action,
        }
    }

    pub fn bidirectional(
        name: &str,
        field: [Interval; D],
        inverse_field: [Interval; D],
        cost: i32,
        action: A,
    ) -> Self {
        Self {
            name: name.into(),
            field,
            inverse_field: Some(inverse_field),
            cost,
            action,
        }
    }

    pub fn is_bidirectional(&self) -> bool {
        self.inverse_field.is_some()
    }

    /// Active rules (those the builder projects) have strictly positive
    /// cost; zero marks inactive, negative marks a pseudo rule.
    pub fn is_active(&self) -> bool {
        self.cost > 0
    }
}

/// A projection handle: which field array of which rule a projected entry
/// draws from. Replaces the reference implementation's signed-integer
/// encoding (`i >= 0` => forward, `-(i+1)` => inverse) with a tagged variant,
/// per the REDESIGN FLAGS / §9 design notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Handle {
    Forward(usize),
    Inverse(usize),
}

impl Handle {
    pub(crate) fn rule_index(&self) -> usize {
        match self {
            Handle::Forward(i) | Handle::Inverse(i) => *i,
        }
    }

    pub(crate) fn field<'a, const D: usize, A>(
        &self,
        rules: &'a [std::sync::Arc<Rule<D, A>>],
        dim: usize,
    ) -> &'a Interval {
        match self {
            Handle::Forward(i) => &rules[*i].field[dim],
            Handle::Inverse(i) => rules[*i]
                .inverse_field
                .as_ref()
                .expect("inverse handle for a rule without an inverse_field")
                .get(dim)
                .expect("dimension in range"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_and_pseudo_rules_are_not_active() {
        let r = Rule::new("r0", [Interval::AnyToAny], 0, ());
        assert!(!r.is_active());
        let r = Rule::new("r1", [Interval::AnyToAny], -1, ());
        assert!(!r.is_active());
        let r = Rule::new("r2", [Interval::AnyToAny], 1, ());
        assert!(r.is_active());
    }

    #[test]
    fn rule_round_trips_through_json() {
        let original = Rule::bidirectional(
            "web",
            [Interval::make_range(80, 81)],
            [Interval::make_anytoany()],
            10,
            "allow".to_string(),
        );
        let encoded = serde_json::to_string(&original).unwrap();
        let decoded: Rule<1, String> = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded.name, original.name);
        assert_eq!(decoded.action, original.action);
        assert_eq!(decoded.cost, original.cost);
    }
}
