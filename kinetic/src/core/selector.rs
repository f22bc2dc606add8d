//! Deterministic budget-constrained selection.

/// Result of scanning priced candidates against a budget.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<K> {
    /// Cheapest eligible candidate and its cost, if any.
    pub chosen: Option<(K, f64)>,
    /// Lowest cost seen across all candidates, eligible or not.
    pub lowest_cost: Option<f64>,
    /// Number of candidates priced.
    pub evaluated: usize,
}

/// Pick the eligible candidate (`cost <= budget`) with strictly lowest cost.
///
/// `priced` must be in registration order: on equal cost the earlier entry
/// wins. NaN costs are never eligible and never lower the observed minimum.
pub fn select_within_budget<K, I>(priced: I, budget: f64) -> Selection<K>
where
    I: IntoIterator<Item = (K, f64)>,
{
    let mut selection = Selection {
        chosen: None,
        lowest_cost: None,
        evaluated: 0,
    };

    for (key, cost) in priced {
        selection.evaluated += 1;

        if selection.lowest_cost.is_none_or(|lowest| cost < lowest) && !cost.is_nan() {
            selection.lowest_cost = Some(cost);
        }

        let eligible = cost <= budget;
        let cheaper = selection
            .chosen
            .as_ref()
            .is_none_or(|(_, best)| cost < *best);
        if eligible && cheaper {
            selection.chosen = Some((key, cost));
        }
    }

    selection
}
