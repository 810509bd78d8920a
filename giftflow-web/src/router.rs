use giftflow_core::Step;
use yew_router::prelude::*;

#[derive(Clone, Debug, Routable, PartialEq, Eq)]
pub enum Route {
    #[at("/")]
    Landing,
    #[at("/puzzle")]
    Puzzle,
    #[at("/message")]
    Message,
    #[at("/places")]
    Places,
    #[at("/outfits")]
    Outfits,
    #[at("/summary")]
    Summary,
    #[at("/admin")]
    Admin,
    #[at("/404")]
    #[not_found]
    NotFound,
}

impl Route {
    #[must_use]
    pub const fn from_step(step: Step) -> Self {
        match step {
            Step::Landing => Self::Landing,
            Step::Puzzle => Self::Puzzle,
            Step::Message => Self::Message,
            Step::Places => Self::Places,
            Step::Outfits => Self::Outfits,
            Step::Summary => Self::Summary,
        }
    }

    /// The step this route belongs to; `None` for routes outside the flow.
    #[must_use]
    pub const fn to_step(&self) -> Option<Step> {
        match self {
            Self::Landing => Some(Step::Landing),
            Self::Puzzle => Some(Step::Puzzle),
            Self::Message => Some(Step::Message),
            Self::Places => Some(Step::Places),
            Self::Outfits => Some(Step::Outfits),
            Self::Summary => Some(Step::Summary),
            Self::Admin | Self::NotFound => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Route;
    use giftflow_core::{Step, route_for};
    use yew_router::Routable;

    #[test]
    fn route_step_mappings_cover_every_step() {
        for step in Step::ALL {
            let route = Route::from_step(step);
            assert_eq!(route.to_step(), Some(step));
            assert_eq!(route.to_path(), route_for(step));
        }
        assert_eq!(Route::Admin.to_step(), None);
        assert_eq!(Route::NotFound.to_step(), None);
    }

    #[test]
    fn paths_are_recognized() {
        assert_eq!(Route::recognize("/admin"), Some(Route::Admin));
        assert_eq!(Route::recognize("/places"), Some(Route::Places));
        assert_eq!(Route::recognize("/"), Some(Route::Landing));
    }
}
