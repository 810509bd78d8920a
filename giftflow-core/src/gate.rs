//! Route gating.
//!
//! Every step owns exactly one canonical route. A visitor may revisit any route at
//! or below their current step but is sent back to their current step when asking
//! for anything further along. Routes without a step (admin, not-found, anything
//! unknown) are never gated.

use crate::step::Step;

pub const ENTRY_ROUTE: &str = "/";
pub const ADMIN_ROUTE: &str = "/admin";
pub const NOT_FOUND_ROUTE: &str = "/404";

const STEP_ROUTES: [(Step, &str); 6] = [
    (Step::Landing, ENTRY_ROUTE),
    (Step::Puzzle, "/puzzle"),
    (Step::Message, "/message"),
    (Step::Places, "/places"),
    (Step::Outfits, "/outfits"),
    (Step::Summary, "/summary"),
];

/// Strip a single trailing slash from anything longer than the root route.
#[must_use]
pub fn normalize(route: &str) -> &str {
    if route.len() > 1 {
        route.strip_suffix('/').unwrap_or(route)
    } else {
        route
    }
}

#[must_use]
pub fn step_for(route: &str) -> Option<Step> {
    let route = normalize(route);
    STEP_ROUTES
        .iter()
        .find(|(_, path)| *path == route)
        .map(|(step, _)| *step)
}

#[must_use]
pub const fn route_for(step: Step) -> &'static str {
    STEP_ROUTES[step.index() as usize].1
}

/// Decide whether `route` may render for a visitor currently at `step`.
///
/// Returns the route the caller must redirect to, or `None` when navigation is
/// allowed as requested.
#[must_use]
pub fn evaluate(route: &str, step: Step) -> Option<&'static str> {
    let requested = step_for(route)?;
    (requested > step).then(|| route_for(step))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_step_ordinal() {
        for (position, (step, _)) in STEP_ROUTES.iter().enumerate() {
            assert_eq!(usize::from(step.index()), position);
        }
    }

    #[test]
    fn every_step_has_a_route_including_the_final_one() {
        for step in Step::ALL {
            let route = route_for(step);
            assert!(route.starts_with('/'));
            assert_eq!(step_for(route), Some(step));
        }
        assert_eq!(route_for(Step::Summary), "/summary");
    }

    #[test]
    fn normalize_strips_single_trailing_slash() {
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize("/places/"), "/places");
        assert_eq!(normalize("/places"), "/places");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn ungated_routes_pass_through() {
        for step in Step::ALL {
            assert_eq!(evaluate(ADMIN_ROUTE, step), None);
            assert_eq!(evaluate(NOT_FOUND_ROUTE, step), None);
            assert_eq!(evaluate("/does-not-exist", step), None);
        }
    }

    #[test]
    fn skipping_ahead_redirects_to_current_step() {
        assert_eq!(evaluate("/places", Step::Puzzle), Some("/puzzle"));
        assert_eq!(evaluate("/summary/", Step::Landing), Some("/"));
    }

    #[test]
    fn backward_and_current_routes_are_allowed() {
        assert_eq!(evaluate("/puzzle", Step::Outfits), None);
        assert_eq!(evaluate("/outfits", Step::Outfits), None);
        assert_eq!(evaluate("/", Step::Summary), None);
    }
}
